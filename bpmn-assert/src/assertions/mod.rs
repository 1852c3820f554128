//! Chainable assertions, one per engine entity.
//!
//! Every verification method re-queries the record source when it is called
//! and returns `Result<&Self>`, so several checks on one subject chain with `?`:
//!
//! ```ignore
//! assert_that(&deployment, &source)
//!     .extracting_process_by_bpmn_process_id("looping-task")?
//!     .has_version(1)?
//!     .has_resource_name("looping-task.bpmn")?
//!     .has_no_instances()?;
//! ```
//!
//! A failed verification returns [`Error::Assertion`] with the diagnostic
//! message; an extraction that does not resolve to exactly one entity returns
//! [`Error::Cardinality`]. Neither is retried, and neither touches the source.

mod deployment;
mod job;
mod message;
mod process;
mod process_instance;

pub use deployment::DeploymentAssert;
pub use job::JobAssert;
pub use message::MessageAssert;
pub use process::ProcessAssert;
pub use process_instance::ProcessInstanceAssert;

use std::fmt;

use crate::{Error, Result};

pub(crate) fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result {
    if condition {
        Ok(())
    } else {
        Err(Error::assertion(message()))
    }
}

/// String fields are quoted and the sentence ends with a period.
pub(crate) fn expect_text(field: &str, expected: &str, actual: &str) -> Result {
    ensure(expected == actual, || {
        format!("Expected {field} to be '{expected}' but was '{actual}' instead.")
    })
}

/// Numeric fields are not quoted and the sentence has no period.
pub(crate) fn expect_number<N>(field: &str, expected: N, actual: N) -> Result
where
    N: PartialEq + fmt::Display,
{
    ensure(expected == actual, || {
        format!("Expected {field} to be {expected} but was {actual} instead")
    })
}

pub(crate) fn exactly_one<T>(
    matches: Vec<T>,
    key: impl Fn(&T) -> i64,
    subject: impl FnOnce() -> String,
) -> Result<T> {
    match <[T; 1]>::try_from(matches) {
        Ok([only]) => Ok(only),
        Err(matches) => Err(Error::cardinality(
            subject(),
            matches.iter().map(key).collect(),
        )),
    }
}
