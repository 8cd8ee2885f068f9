/*!
  Reads a program: whitespace-separated integer quadruples `op r l m`, normally one
  instruction per line. A record may span lines; only the order of the integers matters.
  Unknown opcodes are accepted here and fault when executed.
*/

use std::io::Read;

use nom::{
  branch::alt,
  bytes::complete::is_not,
  character::complete::{digit1, none_of, one_of, space0},
  combinator::{map, not, opt, recognize},
  multi::many0,
  sequence::{pair, preceded, terminated},
  IResult,
};
use tracing::debug;

use crate::bytecode::{Program, Record, Word};
use crate::error::{Error, LoadError};

/// Characters separating fields within a line.
const SEPARATORS: &str = " \t\r";

/// One whitespace-delimited token on a line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Field<'a> {
  Integer(&'a str),
  NotAnInteger(&'a str),
}

fn integer(input: &str) -> IResult<&str, &str> {
  recognize(pair(opt(one_of("+-")), digit1))(input)
}

fn field(input: &str) -> IResult<&str, Field> {
  preceded(
    space0,
    alt((
      // An integer only counts if the token ends right after it: `12ab` is not an integer.
      map(terminated(integer, not(none_of(SEPARATORS))), Field::Integer),
      map(is_not(SEPARATORS), Field::NotAnInteger),
    ))
  )(input)
}

fn line_fields(input: &str) -> IResult<&str, Vec<Field>> {
  terminated(many0(field), space0)(input)
}

/// Parses program text into code memory.
pub fn load_program(text: &str) -> Result<Program, LoadError> {
  // Every integer, with the line it came from.
  let mut words: Vec<(usize, Word)> = Vec::new();

  for (number, line) in text.lines().enumerate() {
    let line_number = number + 1;
    let found = match line_fields(line) {
      Ok((_rest, found)) => found,
      Err(_e) => {
        return Err(LoadError::NotAnInteger{ line: line_number, found: line.trim().to_string() });
      }
    };

    for token in found {
      match token {
        Field::Integer(digits) => {
          let value = digits.parse::<Word>().map_err(|_| LoadError::OutOfRange {
            line: line_number,
            text: digits.to_string()
          })?;
          words.push((line_number, value));
        }
        Field::NotAnInteger(junk) => {
          return Err(LoadError::NotAnInteger{ line: line_number, found: junk.to_string() });
        }
      }
    }
  }

  let mut quadruples = words.chunks_exact(4);
  let records: Vec<Record> =
    quadruples.by_ref()
              .map(|q| Record::new(q[0].1, q[1].1, q[2].1, q[3].1))
              .collect();

  let remainder = quadruples.remainder();
  if let Some(&(line, _)) = remainder.last() {
    return Err(LoadError::Incomplete{ line, fields: remainder.len() });
  }

  debug!(instructions = records.len(), "program loaded");
  Ok(Program::new(records))
}

/// Reads and parses a whole program from `reader`.
pub fn read_program<R: Read>(reader: &mut R) -> Result<Program, Error> {
  let mut text = String::new();
  reader.read_to_string(&mut text)?;
  Ok(load_program(&text)?)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens(){
    assert_eq!(
      line_fields("  7 -3\t+2 x1 "),
      Ok(("", vec![
        Field::Integer("7"),
        Field::Integer("-3"),
        Field::Integer("+2"),
        Field::NotAnInteger("x1"),
      ]))
    );
    assert_eq!(line_fields("12ab"), Ok(("", vec![Field::NotAnInteger("12ab")])));
    assert_eq!(line_fields(""), Ok(("", vec![])));
  }

  #[test]
  fn one_record_per_line(){
    let program = load_program("1 0 0 5\n1 1 0 3\n13 2 0 1\n9 2 0 1\n11 0 0 3\n").unwrap();
    assert_eq!(program.len(), 5);
    assert_eq!(program.records()[2], Record::new(13, 2, 0, 1));
  }

  #[test]
  fn layout_is_free(){
    let program = load_program("\n6 0 0\n  4\r\n\n7 0 0 -1 11 0 0 3").unwrap();
    assert_eq!(
      program.records(),
      &[Record::new(6, 0, 0, 4), Record::new(7, 0, 0, -1), Record::new(11, 0, 0, 3)]
    );
  }

  #[test]
  fn unknown_opcodes_load(){
    let program = load_program("0 0 0 0\n99 1 2 3").unwrap();
    assert_eq!(program.records()[1], Record::new(99, 1, 2, 3));
  }

  #[test]
  fn empty_program(){
    assert!(load_program("").unwrap().is_empty());
    assert!(load_program("  \n\t\n").unwrap().is_empty());
  }

  #[test]
  fn malformed(){
    assert_eq!(
      load_program("1 0 0 5\n1 0 zero 5\n"),
      Err(LoadError::NotAnInteger{ line: 2, found: "zero".to_string() })
    );
    assert_eq!(
      load_program("1 0 0 5\n11 0\n"),
      Err(LoadError::Incomplete{ line: 2, fields: 2 })
    );
    assert_eq!(
      load_program("1 0 0 99999999999\n"),
      Err(LoadError::OutOfRange{ line: 1, text: "99999999999".to_string() })
    );
  }

  #[test]
  fn read_from_reader(){
    let mut text = "11 0 0 3\n".as_bytes();
    let program  = read_program(&mut text).unwrap();
    assert_eq!(program.len(), 1);
  }

}
