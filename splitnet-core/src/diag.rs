use std::fmt;

/// A non-fatal internal-consistency finding, reported alongside a result
/// instead of aborting the computation that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub context: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}

/// A computation result together with the anomalies observed on the way.
#[derive(Clone, Debug, PartialEq)]
pub struct Report<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Report<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Report { value, diagnostics }
    }

    pub fn clean(value: T) -> Self {
        Report {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Records an anomaly and mirrors it to the log so embedding applications
/// see it without extra plumbing.
pub(crate) fn record(diagnostics: &mut Vec<Diagnostic>, context: &'static str, message: String) {
    log::warn!("{}: {}", context, message);
    diagnostics.push(Diagnostic { context, message });
}
