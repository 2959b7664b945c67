use std::fmt;
use std::sync::{Arc, Mutex};

/// Shared reference to a test. The view owns the list, the execution task mutates
/// the test through the same handle.
pub type TestHandle = Arc<Mutex<Test>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Pending,
    Running,
    Pass,
    Fail,
    Error,
    /// No test case was executed, or every case was skipped.
    Missing,
    /// The diagnostic text had a shape the classifier does not recognise.
    Unknown,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Pending,
        Status::Running,
        Status::Pass,
        Status::Fail,
        Status::Error,
        Status::Missing,
        Status::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Running => "RUNNING",
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
            Status::Missing => "MISSING",
            Status::Unknown => "UNKNOWN",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Test {
    pub suite: String,
    /// Empty when the entry stands for a whole suite.
    pub name: String,
    pub status: Status,
    pub results: Vec<String>,
}

impl Test {
    pub fn new<S: Into<String>, N: Into<String>>(suite: S, name: N) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn suite<S: Into<String>>(suite: S) -> Self {
        Self::new(suite, String::new())
    }

    #[inline]
    pub fn is_suite(&self) -> bool {
        self.name.is_empty()
    }

    pub fn into_handle(self) -> TestHandle {
        Arc::new(Mutex::new(self))
    }
}

impl fmt::Display for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_suite() {
            write!(f, "{}", self.suite)
        } else {
            write!(f, "{}.{}", self.suite, self.name)
        }
    }
}
