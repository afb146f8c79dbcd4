use error_stack::{Context, Report};
use thiserror::Error;
use tracing_error::SpanTrace;

use crate::types::ErrorKind;

mod impls;

pub mod ext;
pub use ext::*;

pub type Result<T> = std::result::Result<T, Error>;

/// Context every report is folded into once it reaches the HTTP layer.
#[derive(Debug, Error)]
#[error("failed to handle request")]
pub struct RequestFailed;

/// Error returned by every handler. The client only ever sees
/// `kind`; the report and span trace stay in the logs.
pub struct Error {
    kind: ErrorKind,
    report: Report<RequestFailed>,
    trace: SpanTrace,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        let report = Report::new(RequestFailed).attach_printable(kind.to_string());
        Self {
            kind,
            report,
            trace: SpanTrace::capture(),
        }
    }

    #[must_use]
    pub fn from_context(kind: ErrorKind, context: impl Context) -> Self {
        Self::from_report(kind, Report::new(context))
    }

    #[must_use]
    pub fn from_report(kind: ErrorKind, report: Report<impl Context>) -> Self {
        Self {
            kind,
            report: report.change_context(RequestFailed),
            trace: SpanTrace::capture(),
        }
    }

    #[must_use]
    pub fn not_found(what: &'static str) -> Self {
        Self::new(ErrorKind::NotFound(what))
    }

    #[must_use]
    pub fn conflict(what: &'static str) -> Self {
        Self::new(ErrorKind::Conflict(what))
    }

    #[must_use]
    pub fn forbidden(what: &'static str) -> Self {
        Self::new(ErrorKind::Forbidden(what))
    }
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn report(&self) -> &Report<RequestFailed> {
        &self.report
    }

    #[must_use]
    pub fn change_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn downcast_ref<F: Context>(&self) -> Option<&F> {
        self.report.downcast_ref::<F>()
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("report", &self.report)
            .field("trace", &self.trace)
            .finish()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", &self.kind)?;
        writeln!(f, "{:?}", self.report)?;
        std::fmt::Display::fmt(&self.trace, f)
    }
}
