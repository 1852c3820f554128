use std::{fmt, future::IntoFuture, time::Duration};

use tokio::time::Instant;

use crate::{Error, RecordLog, Result, Source};

/// A condition-based wait on a [`RecordLog`].
///
/// Created by [`RecordLog::settle_on`]. The condition runs against the live
/// source immediately and again after every append. When it returns `true`
/// the wait completes; if the timeout expires first, it fails with
/// [`Error::SettleTimeout`].
///
/// Waiting belongs to the code driving the engine. Assertions themselves
/// never wait: settle first, then assert.
///
/// # Example
///
/// ```ignore
/// // Wait until two instances of the process exist
/// log.settle_on(|source| {
///     StreamFilter::process_instance(source)
///         .with_bpmn_process_id("looping-task")
///         .with_bpmn_element_type(BpmnElementType::Process)
///         .with_intent(ProcessInstanceIntent::ElementActivating)
///         .count() >= 2
/// })
/// .within(Duration::from_secs(3))
/// .await?;
/// ```
pub struct Expectation<'a, F> {
    log: &'a RecordLog,
    condition: F,
    timeout: Duration,
}

impl<'a, F> Expectation<'a, F>
where
    F: Fn(&Source) -> bool,
{
    pub(crate) fn new(log: &'a RecordLog, condition: F) -> Self {
        Self {
            log,
            condition,
            timeout: log.config().settle_timeout(),
        }
    }

    /// Override the configured timeout.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(self) -> Result {
        let source = self.log.source();
        let mut appended = self.log.subscribe();
        // A timeout too large to represent waits without a deadline.
        let deadline = Instant::now().checked_add(self.timeout);

        loop {
            // Mark the current state as seen before checking, so an append
            // racing with the check wakes the next wait.
            appended.borrow_and_update();
            if (self.condition)(&source) {
                return Ok(());
            }

            let changed = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, appended.changed()).await,
                None => Ok(appended.changed().await),
            };
            match changed {
                Ok(Ok(())) => continue,
                // The sender lives as long as the log, so only the deadline ends the wait.
                Ok(Err(_)) | Err(_) => {
                    let recorded = self.log.len();
                    tracing::warn!(
                        timeout = ?self.timeout,
                        records = recorded,
                        "settle_on condition not met"
                    );
                    return Err(Error::SettleTimeout(self.timeout, recorded));
                }
            }
        }
    }
}

impl<'a, F> IntoFuture for Expectation<'a, F>
where
    F: Fn(&Source) -> bool + 'a,
{
    type Output = Result;
    type IntoFuture = std::pin::Pin<Box<dyn std::future::Future<Output = Self::Output> + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl<F> fmt::Debug for Expectation<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("log", &self.log)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
