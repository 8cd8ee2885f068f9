//! Runs a program end to end: load, list code memory, execute with a trace, halt marker.

use std::io::{BufRead, Read, Write};

use tracing::{error, info};

use crate::bytecode::Program;
use crate::config::MachineConfig;
use crate::error::{ExecutionError, Result};
use crate::listing::{write_code_listing, write_halt, write_trace_header, write_trace_row};
use crate::loader::read_program;
use crate::machine::{Machine, Signal};

/// How a simulation ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report {
  /// Instructions executed, including one that faulted.
  pub steps : u64,
  /// The fault that stopped the machine, if it did not halt normally.
  pub fault : Option<ExecutionError>,
}

impl Report {
  pub fn halted(&self) -> bool {
    self.fault.is_none()
  }
}

/**
  Executes `program` on `machine`, writing one trace row per executed instruction to `trace`
  and the halt marker at the end. A fault stops the run; the faulting instruction still gets
  its row, and the fault is logged and returned in the report rather than as an error. Only a
  failure to write the trace is an `Err`.
*/
pub fn execute_traced<I, O, T>(
  machine : &mut Machine,
  program : &Program,
  vm_in   : &mut I,
  vm_out  : &mut O,
  trace   : &mut T,
) -> Result<Report>
  where I: BufRead, O: Write, T: Write
{
  write_trace_header(trace)?;

  let fault = loop {
    match machine.step(program, vm_in, vm_out) {

      Ok(step) => {
        if let Some(record) = program.record(step.index as usize) {
          write_trace_row(trace, step.index, record, machine)?;
        }
        if step.signal == Signal::Halt {
          info!(steps = machine.steps(), "machine halted");
          break None;
        }
      }

      Err(fault) => {
        if fault.executed {
          if let Some(record) = program.record(fault.index as usize) {
            write_trace_row(trace, fault.index, record, machine)?;
          }
        }
        error!(index = fault.index, "{}", fault);
        break Some(fault);
      }

    }
  };

  write_halt(trace)?;
  trace.flush()?;

  Ok(Report{ steps: machine.steps(), fault })
}

/**
  The whole pipeline: read the program from `program_in`, write the code listing and then the
  execution trace to `out`. The machine reads from `vm_in` and writes to `vm_out`.
*/
pub fn simulate<P, O, I, V>(
  config     : MachineConfig,
  program_in : &mut P,
  out        : &mut O,
  vm_in      : &mut I,
  vm_out     : &mut V,
) -> Result<(Machine, Report)>
  where P: Read, O: Write, I: BufRead, V: Write
{
  let program = read_program(program_in)?;
  write_code_listing(out, &program)?;

  let mut machine = Machine::new(config);
  let report      = execute_traced(&mut machine, &program, vm_in, vm_out, out)?;
  Ok((machine, report))
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::io::{self, empty, Cursor};
  use std::sync::{Arc, Mutex};

  use crate::error::{Error, Fault, LoadError};

  fn simulate_text(program: &str) -> (Report, String, String) {
    let mut program_in = program.as_bytes();
    let mut out        = Vec::new();
    let mut vm_out     = Vec::new();
    let (_, report) = simulate(
      MachineConfig::default(), &mut program_in, &mut out, &mut empty(), &mut vm_out
    ).unwrap();
    (report, String::from_utf8(out).unwrap(), String::from_utf8(vm_out).unwrap())
  }

  /// Trace rows, without the listing, banner, column header and halt marker.
  fn trace_rows(out: &str) -> Vec<String> {
    let execution = out.split("***Execution***\n").nth(1).unwrap();
    let lines: Vec<&str> = execution.lines().collect();
    assert_eq!(lines.last(), Some(&"HLT"));
    lines[1..lines.len() - 1].iter().map(|line| line.to_string()).collect()
  }

  #[test]
  fn add_and_write(){
    let (report, out, vm_out) = simulate_text("1 0 0 5\n1 1 0 3\n13 2 0 1\n9 2 0 1\n11 0 0 3\n");
    assert!(report.halted());
    assert_eq!(report.steps, 5);
    assert_eq!(vm_out.trim(), "8");

    let rows = trace_rows(&out);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0], "  0 lit   0   0   5   1   1   0   0 ");
    assert_eq!(rows[2], "  2 add   2   0   1   3   1   0   0 ");
    assert_eq!(rows[4], "  4 sio   0   0   3   5   1   0   0 ");
    assert!(out.starts_with("***Code Memory***\n"));
    assert!(out.ends_with("HLT\n"));
  }

  /// Collects formatted log lines for inspection.
  #[derive(Clone, Default)]
  struct LogBuffer(Arc<Mutex<Vec<u8>>>);

  impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.0.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn normal_halt_is_logged(){
    let logs       = LogBuffer::default();
    let writer     = logs.clone();
    let subscriber = tracing_subscriber::fmt()
                       .with_writer(move || writer.clone())
                       .with_ansi(false)
                       .with_max_level(tracing::Level::INFO)
                       .finish();

    let (report, _, _) =
      tracing::subscriber::with_default(subscriber, || simulate_text("1 0 0 2\n11 0 0 3\n"));
    assert!(report.halted());

    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(text.contains("machine halted"));
    assert!(text.contains("steps=2"));
  }

  #[test]
  fn nested_scopes_sample(){
    let (report, out, vm_out) = simulate_text(include_str!("../programs/nested_scopes.pm0"));
    assert!(report.halted());
    assert_eq!(report.steps, 12);
    assert_eq!(vm_out, "11 ");
    // Deepest point: three frames below the sentinel.
    assert!(trace_rows(&out).iter().any(|row| row.matches('|').count() == 3));
  }

  #[test]
  fn single_lit_then_halt(){
    let (report, out, _) = simulate_text("1 3 0 -4\n11 0 0 3\n");
    assert!(report.halted());
    assert_eq!(trace_rows(&out).len(), 2);
  }

  #[test]
  fn frame_appears_and_disappears(){
    let (report, out, _) = simulate_text(
      "6 0 0 4\n\
       5 0 0 3\n\
       11 0 0 3\n\
       6 0 0 2\n\
       1 0 0 9\n\
       2 0 0 0\n"
    );
    assert!(report.halted());

    let rows = trace_rows(&out);
    let separators: Vec<usize> = rows.iter().map(|row| row.matches('|').count()).collect();
    // inc, cal, inc 2, lit, rtn, halt
    assert_eq!(separators, vec![1, 1, 2, 2, 1, 1]);
    assert_eq!(rows[2], "  3 inc   0   0   2   4   5   6   0 |   0   0   0   0 |   0   1 ");
    assert_eq!(rows[4], "  5 rtn   0   0   0   2   1   4   0 |   0   0   0   0 ");
  }

  #[test]
  fn illegal_instruction_halts_after_one_row(){
    let (report, out, _) = simulate_text("0 0 0 0\n11 0 0 3\n");
    let fault = report.fault.unwrap();
    assert_eq!(fault.fault, Fault::IllegalInstruction(0));
    assert_eq!(fault.index, 0);
    let rows = trace_rows(&out);
    assert_eq!(rows, vec!["  0 illegal   0   0   0   1   1   0   0 ".to_string()]);
  }

  #[test]
  fn end_of_program_still_halts_trace(){
    let (report, out, _) = simulate_text("1 0 0 1\n");
    assert_eq!(report.fault.unwrap().fault, Fault::EndOfProgram(1));
    assert_eq!(trace_rows(&out).len(), 1);
  }

  #[test]
  fn load_errors_surface(){
    let mut out = Vec::<u8>::new();
    let result  = simulate(
      MachineConfig::default(), &mut "1 0 0".as_bytes(), &mut out, &mut empty(), &mut Vec::<u8>::new()
    );
    assert!(matches!(result, Err(Error::Load(LoadError::Incomplete{ line: 1, fields: 3 }))));
    assert!(out.is_empty());
  }

  #[test]
  fn machine_input_is_plumbed(){
    let config = MachineConfig::default().with_read_mode(crate::config::ReadMode::Input);
    let mut vm_in  = Cursor::new(b"21\n".to_vec());
    let mut vm_out = Vec::<u8>::new();
    let (machine, report) = simulate(
      config, &mut "10 0 0 2\n9 0 0 1\n11 0 0 3\n".as_bytes(), &mut Vec::<u8>::new(), &mut vm_in, &mut vm_out
    ).unwrap();
    assert!(report.halted());
    assert_eq!(machine.register(0), Ok(21));
    assert_eq!(vm_out, b"21 ");
  }

}
