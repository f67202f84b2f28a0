#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF file format.
//!
//! Comment lines start with 'c', the problem line with 'p'; both are
//! skipped (variable and clause counts are derived from the clauses
//! themselves). Each clause line holds whitespace-separated literals
//! terminated by '0'. A '%' line ends the data.

use crate::sat::cnf::Cnf;
use itertools::Itertools;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Parses DIMACS data from a buffered reader.
///
/// # Errors
/// Fails on I/O errors and on tokens that are not integers.
pub fn parse_dimacs<R: BufRead>(reader: R) -> io::Result<Cnf> {
    let mut clauses: Vec<Vec<i32>> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let mut parts = line.split_whitespace().peekable();

        match parts.peek() {
            Some(&"%") => break,
            None | Some(&"c" | &"p") => {}
            Some(_) => {
                let literals: Vec<i32> = parts
                    .map(|s| {
                        s.parse::<i32>().map_err(|e| {
                            io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!("bad literal {s:?}: {e}"),
                            )
                        })
                    })
                    .take_while(|r| !matches!(r, Ok(0)))
                    .try_collect()?;

                if !literals.is_empty() {
                    clauses.push(literals);
                }
            }
        }
    }

    Ok(Cnf::new(clauses))
}

/// Parses a DIMACS CNF file.
///
/// # Errors
/// Fails if the file cannot be opened or is not valid DIMACS.
pub fn parse_file<P: AsRef<Path>>(path: P) -> io::Result<Cnf> {
    let file = File::open(path)?;
    parse_dimacs(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let input = "c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n";
        let cnf = parse_dimacs(input.as_bytes()).unwrap();

        assert_eq!(cnf.len(), 2);
        assert_eq!(cnf.num_vars, 3);
        assert_eq!(cnf[0].len(), 2);
    }

    #[test]
    fn test_parse_stops_at_percent() {
        let input = "1 0\n%\n2 0\n";
        let cnf = parse_dimacs(input.as_bytes()).unwrap();
        assert_eq!(cnf.len(), 1);
    }

    #[test]
    fn test_parse_bad_token() {
        let input = "1 x 0\n";
        assert!(parse_dimacs(input.as_bytes()).is_err());
    }
}
