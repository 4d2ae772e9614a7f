use std::fmt;

/// How serious a diagnostic record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational note; never affects the result.
    Info,
    /// Something degenerate was handled; the pipeline continued.
    Warning,
    /// The pipeline aborted without a result.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

/// A single severity-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Collects diagnostics from every pipeline stage.
///
/// Each record is also emitted as a `tracing` event, so a subscriber sees
/// them as they happen; callers decide what to do with the collected list.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.push(Severity::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.push(Severity::Warning, message);
    }

    pub fn fatal(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.push(Severity::Fatal, message);
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.records.push(Diagnostic { severity, message });
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Diagnostic> {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.records.iter().any(|d| d.severity == Severity::Fatal)
    }

    /// Records at warning severity.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Highest severity recorded so far.
    pub fn max_severity(&self) -> Option<Severity> {
        self.records.iter().map(|d| d.severity).max()
    }
}
