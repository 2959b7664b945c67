use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Characters stripped from both ends of a diagnostic line before it is filed.
const PADDING: &[char] = &[' ', '\t', '\r', '\n', '-'];

/// Buckets of diagnostic lines, keyed by test display identity.
///
/// One instance lives as long as the database session. Clones share the same buckets,
/// so the driver hook and the execution task see the same state.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    inner: Arc<Mutex<Buckets>>,
}

#[derive(Debug, Default)]
struct Buckets {
    current: Option<String>,
    lines: HashMap<String, Vec<String>>,
}

/// Registration of the identity whose call is executing. Dropping it detaches the
/// identity, so lines arriving afterwards are discarded.
#[must_use = "the identity is detached as soon as the scope is dropped"]
#[derive(Debug)]
pub struct CaptureScope {
    capture: Capture,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `raw` under `identity`. Blank lines and `+` framing lines are dropped.
    pub fn record(&self, identity: &str, raw: &str) {
        let line = match clean(raw) {
            Some(line) => line,
            None => return,
        };
        let mut buckets = lock!(self.inner);
        buckets
            .lines
            .entry(identity.to_owned())
            .or_default()
            .push(line.to_owned());
    }

    /// Files `raw` under the identity attached by [`Capture::enter`], if any.
    pub fn record_current(&self, raw: &str) {
        let current = lock!(self.inner).current.clone();
        match current {
            Some(identity) => self.record(&identity, raw),
            None => trace!("Dropping diagnostic line outside of a test run: {}", raw.trim()),
        }
    }

    pub fn enter(&self, identity: &str) -> CaptureScope {
        let mut buckets = lock!(self.inner);
        if let Some(previous) = buckets.current.replace(identity.to_owned()) {
            warn!("Identity {} replaced {} before its scope ended", identity, previous);
        }
        CaptureScope {
            capture: self.clone(),
        }
    }

    /// Current lines for `identity`, or `None` when nothing was ever filed under it.
    pub fn retrieve(&self, identity: &str) -> Option<Vec<String>> {
        lock!(self.inner).lines.get(identity).cloned()
    }

    /// Empties the bucket for `identity` and hands back what was in it. The bucket itself
    /// survives, so a later [`Capture::retrieve`] still finds it.
    pub fn clear(&self, identity: &str) -> Option<Vec<String>> {
        lock!(self.inner)
            .lines
            .get_mut(identity)
            .map(std::mem::take)
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        lock!(self.capture.inner).current = None;
    }
}

fn clean(raw: &str) -> Option<&str> {
    let line = raw.trim_matches(PADDING);
    if line.is_empty() || line.starts_with('+') {
        None
    } else {
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_trims_padding() {
        let capture = Capture::new();
        capture.record("Suite.Test", "  -- [Suite].[Test] failed --\r\n");

        assert_eq!(
            capture.retrieve("Suite.Test"),
            Some(vec!["[Suite].[Test] failed".to_owned()])
        );
    }

    #[test]
    fn test_record_drops_framing_noise() {
        let capture = Capture::new();
        capture.record("Suite", "");
        capture.record("Suite", " --- ");
        capture.record("Suite", "+----------------------+");
        capture.record("Suite", "|Test Execution Summary|");

        assert_eq!(
            capture.retrieve("Suite"),
            Some(vec!["|Test Execution Summary|".to_owned()])
        );
    }

    #[test]
    fn test_record_current_without_identity_is_dropped() {
        let capture = Capture::new();
        capture.record_current("Changed database context to 'tests'.");

        assert!(lock!(capture.inner).lines.is_empty());
    }

    #[test]
    fn test_record_current_follows_scope() {
        let capture = Capture::new();
        {
            let _scope = capture.enter("Suite.First");
            capture.record_current("first line");
        }
        capture.record_current("stray line");
        {
            let _scope = capture.enter("Suite.Second");
            capture.record_current("second line");
        }

        assert_eq!(
            capture.retrieve("Suite.First"),
            Some(vec!["first line".to_owned()])
        );
        assert_eq!(
            capture.retrieve("Suite.Second"),
            Some(vec!["second line".to_owned()])
        );
    }

    #[test]
    fn test_clones_share_buckets() {
        let capture = Capture::new();
        let hook = capture.clone();
        let _scope = capture.enter("Suite");
        hook.record_current("from the hook");

        assert_eq!(capture.retrieve("Suite"), Some(vec!["from the hook".to_owned()]));
    }

    #[test]
    fn test_clear_returns_previous_lines_and_keeps_bucket() {
        let capture = Capture::new();
        capture.record("Suite", "one");
        capture.record("Suite", "two");

        let previous = capture.clear("Suite");

        assert_eq!(previous, Some(vec!["one".to_owned(), "two".to_owned()]));
        assert_eq!(capture.retrieve("Suite"), Some(vec![]));
    }

    #[test]
    fn test_clear_and_retrieve_unknown_identity() {
        let capture = Capture::new();

        assert!(capture.clear("Nothing").is_none());
        assert!(capture.retrieve("Nothing").is_none());
    }
}
