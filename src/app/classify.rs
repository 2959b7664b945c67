use crate::app::model::{Status, Test};
use lazy_static::*;
use regex::Regex;
use thiserror::Error;

pub const EXECUTION_SUMMARY: &str = "|Test Execution Summary|";
pub const CASE_SUMMARY: &str = "Test Case Summary:";

lazy_static! {
    static ref SUMMARY_REGEX: Regex = Regex::new(
        r"^Test Case Summary: (?P<total>\d+) test case\(s\) executed, (?P<succeeded>\d+) succeeded, (?P<skipped>\d+) skipped, (?P<failed>\d+) failed, (?P<errored>\d+) errored\."
    )
    .expect("Regex compilation error");
}

/// Final status of a run together with the lines worth showing for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: Status,
    pub lines: Vec<String>,
}

/// Classification could not reach a verdict. `status` is what the test should show.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ClassifyError {
    pub status: Status,
    pub message: String,
}

impl ClassifyError {
    fn new(status: Status, message: String) -> Self {
        Self { status, message }
    }
}

impl Outcome {
    fn new(status: Status, lines: Vec<String>) -> Self {
        Self { status, lines }
    }
}

struct Summary<'a> {
    line: &'a str,
    total: &'a str,
    succeeded: &'a str,
    skipped: &'a str,
    failed: &'a str,
    errored: &'a str,
}

impl<'a> Summary<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let caps = SUMMARY_REGEX.captures(line)?;
        Some(Self {
            line: caps.get(0)?.as_str(),
            total: caps.name("total")?.as_str(),
            succeeded: caps.name("succeeded")?.as_str(),
            skipped: caps.name("skipped")?.as_str(),
            failed: caps.name("failed")?.as_str(),
            errored: caps.name("errored")?.as_str(),
        })
    }
}

/// Decides the status of `test` from the lines captured during its run.
pub fn classify(test: &Test, lines: &[String]) -> Result<Outcome, ClassifyError> {
    if lines.is_empty() {
        let kind = if test.is_suite() { "suite" } else { "test" };
        return Err(ClassifyError::new(
            Status::Error,
            format!("no results for {}: {}", kind, test),
        ));
    }
    if test.is_suite() {
        Ok(classify_suite(lines))
    } else {
        classify_case(lines)
    }
}

/// Lines printed before the execution summary section starts.
fn output_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .take_while(|line| !line.contains(EXECUTION_SUMMARY))
        .cloned()
        .collect()
}

fn classify_suite(lines: &[String]) -> Outcome {
    let failures = output_lines(lines);
    if failures.is_empty() {
        Outcome::new(Status::Pass, lines.to_vec())
    } else {
        Outcome::new(Status::Fail, failures)
    }
}

fn classify_case(lines: &[String]) -> Result<Outcome, ClassifyError> {
    let summary_line = lines
        .iter()
        .rev()
        .find(|line| line.contains(CASE_SUMMARY))
        .ok_or_else(|| {
            ClassifyError::new(
                Status::Error,
                format!("Failed to find summary line: {}", CASE_SUMMARY),
            )
        })?;
    let summary = Summary::parse(summary_line).ok_or_else(|| {
        ClassifyError::new(
            Status::Unknown,
            format!("Failed to parse summary: {}", summary_line),
        )
    })?;
    trace!(
        "Summary: total={} succeeded={} skipped={} failed={} errored={}",
        summary.total,
        summary.succeeded,
        summary.skipped,
        summary.failed,
        summary.errored
    );

    let total = summary.total;
    let outcome = if total == "0" {
        Outcome::new(Status::Missing, output_lines(lines))
    } else if total == summary.succeeded {
        Outcome::new(Status::Pass, vec![])
    } else if total == summary.skipped {
        Outcome::new(Status::Missing, output_lines(lines))
    } else if total == summary.failed {
        Outcome::new(Status::Fail, output_lines(lines))
    } else if total == summary.errored {
        Outcome::new(Status::Error, output_lines(lines))
    } else {
        return Err(ClassifyError::new(
            Status::Unknown,
            format!("Unknown result: {}", summary.line),
        ));
    };
    Ok(outcome)
}
