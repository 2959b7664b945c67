use crate::app::model::Test;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

const BOM: char = '\u{FEFF}';

#[derive(Debug, Error)]
pub enum TestListError {
    #[error("test file not found: {0}")]
    NotFound(String),
    #[error("invalid test line: {0}")]
    InvalidLine(String),
    #[error("no tests found")]
    Empty,
    #[error("cannot read tests: {0}")]
    Io(#[from] io::Error),
}

/// Loads the test list from `path`, or from standard input when there is none.
pub fn load(path: Option<&Path>) -> Result<Vec<Test>, TestListError> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(TestListError::NotFound(path.display().to_string()));
            }
            debug!("Reading tests from {}", path.display());
            parse(BufReader::new(File::open(path)?))
        }
        None => {
            debug!("Reading tests from standard input");
            parse(io::stdin().lock())
        }
    }
}

/// One test per line: `Suite.Test`, or `Suite` for a whole suite.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<Test>, TestListError> {
    let mut tests = vec![];
    for line in reader.lines() {
        let line = line?;
        let line = line.trim().trim_start_matches(BOM);
        if line.is_empty() {
            continue;
        }
        let pieces: Vec<&str> = line.split('.').collect();
        let test = match pieces.as_slice() {
            [suite] => Test::suite(*suite),
            [suite, name] => Test::new(*suite, *name),
            _ => return Err(TestListError::InvalidLine(line.to_owned())),
        };
        tests.push(test);
    }
    if tests.is_empty() {
        return Err(TestListError::Empty);
    }
    info!("Loaded {} tests", tests.len());
    Ok(tests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_suites_and_cases() {
        let input = "\u{FEFF}DemoSuite\n\n  DemoSuite.[test that foo fails]  \r\nOther.Case\n";

        let tests = parse(Cursor::new(input)).unwrap();

        let names: Vec<String> = tests.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            names,
            vec!["DemoSuite", "DemoSuite.[test that foo fails]", "Other.Case"]
        );
        assert!(tests[0].is_suite());
        assert_eq!(tests[1].name, "[test that foo fails]");
    }

    #[test]
    fn test_parse_rejects_too_many_dots() {
        let err = parse(Cursor::new("a.b.c\n")).unwrap_err();

        assert_eq!(err.to_string(), "invalid test line: a.b.c");
    }

    #[test]
    fn test_parse_rejects_empty_list() {
        let err = parse(Cursor::new("\n   \n")).unwrap_err();

        assert!(matches!(err, TestListError::Empty));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Some(Path::new("/definitely/not/here.txt"))).unwrap_err();

        assert_eq!(err.to_string(), "test file not found: /definitely/not/here.txt");
    }
}
