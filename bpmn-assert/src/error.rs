use std::time::Duration;

/// The single error type for all bpmn-assert operations.
///
/// Verification and extraction methods return `bpmn_assert::Result<T>`
/// (alias for `Result<T, bpmn_assert::Error>`). A failed verification is an
/// [`Error::Assertion`] whose display text is the exact diagnostic message,
/// so tests can compare it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A verification computed a value or outcome different from the expected one.
    #[error("{0}")]
    Assertion(String),

    /// An extraction expected exactly one match.
    #[error("Expected to find one {subject} but found {found}: {keys:?}")]
    Cardinality {
        subject: String,
        found: usize,
        keys: Vec<i64>,
    },

    #[error("Expected a {expected} assertion but the response produced a {actual} assertion")]
    UnexpectedAssertion {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Record position {position} does not follow last position {last}")]
    PositionOutOfOrder { last: u64, position: u64 },

    #[error("No record position follows last position {last}")]
    PositionExhausted { last: u64 },

    #[error("settle_on condition not met within {0:?}: {1} records in log")]
    SettleTimeout(Duration, usize),
}

impl Error {
    pub(crate) fn assertion(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::debug!(%message, "assertion failed");
        Error::Assertion(message)
    }

    pub(crate) fn cardinality(subject: impl Into<String>, keys: Vec<i64>) -> Self {
        let subject = subject.into();
        tracing::debug!(%subject, found = keys.len(), "extraction did not resolve to one match");
        Error::Cardinality {
            subject,
            found: keys.len(),
            keys,
        }
    }

    /// Returns true if this error is a failed verification or extraction.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(self, Error::Assertion(_) | Error::Cardinality { .. })
    }
}
