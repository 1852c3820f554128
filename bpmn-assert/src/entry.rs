use std::sync::Arc;

use crate::{
    ActivatedJob, DeploymentAssert, DeploymentEvent, EngineResponse, Error, JobAssert,
    MessageAssert, ProcessInstanceAssert, ProcessInstanceEvent, PublishMessageResponse, Result,
    Source,
};

/// An engine response that can start an assertion chain.
///
/// Each response type names the assertion it produces, so the right
/// constructor is chosen at compile time. References to responses are
/// accepted too; the response is cloned into the assertion.
pub trait Assertable {
    type Assert;

    fn into_assert(self, source: &Source) -> Self::Assert;
}

/// Start an assertion chain on an engine response.
///
/// ```rust
/// use bpmn_assert::{PublishMessageResponse, RecordLog, assert_that};
///
/// let log = RecordLog::new();
/// let source = log.source();
/// let response = PublishMessageResponse { message_key: 42 };
///
/// let err = assert_that(response, &source).has_been_correlated().unwrap_err();
/// assert_eq!(err.to_string(), "Message with key 42 was not correlated");
/// ```
pub fn assert_that<R: Assertable>(response: R, source: &Source) -> R::Assert {
    response.into_assert(source)
}

/// Start an assertion chain on a response whose kind is only known at runtime.
pub fn assert_response(response: impl Into<EngineResponse>, source: &Source) -> Assertion {
    response.into().into_assert(source)
}

impl Assertable for DeploymentEvent {
    type Assert = DeploymentAssert;

    fn into_assert(self, source: &Source) -> DeploymentAssert {
        DeploymentAssert::new(self, Arc::clone(source))
    }
}

impl Assertable for PublishMessageResponse {
    type Assert = MessageAssert;

    fn into_assert(self, source: &Source) -> MessageAssert {
        MessageAssert::new(self, Arc::clone(source))
    }
}

impl Assertable for ProcessInstanceEvent {
    type Assert = ProcessInstanceAssert;

    fn into_assert(self, source: &Source) -> ProcessInstanceAssert {
        ProcessInstanceAssert::new(self.process_instance_key, Arc::clone(source))
    }
}

impl Assertable for ActivatedJob {
    type Assert = JobAssert;

    fn into_assert(self, source: &Source) -> JobAssert {
        JobAssert::new(self, Arc::clone(source))
    }
}

impl Assertable for EngineResponse {
    type Assert = Assertion;

    fn into_assert(self, source: &Source) -> Assertion {
        match self {
            EngineResponse::Deployment(r) => Assertion::Deployment(r.into_assert(source)),
            EngineResponse::PublishMessage(r) => Assertion::Message(r.into_assert(source)),
            EngineResponse::ProcessInstance(r) => Assertion::ProcessInstance(r.into_assert(source)),
            EngineResponse::ActivatedJob(r) => Assertion::Job(r.into_assert(source)),
        }
    }
}

impl<T> Assertable for &T
where
    T: Assertable + Clone,
{
    type Assert = T::Assert;

    fn into_assert(self, source: &Source) -> Self::Assert {
        self.clone().into_assert(source)
    }
}

/// Root assertion produced from an [`EngineResponse`].
#[derive(Debug, Clone)]
pub enum Assertion {
    Deployment(DeploymentAssert),
    Message(MessageAssert),
    ProcessInstance(ProcessInstanceAssert),
    Job(JobAssert),
}

impl Assertion {
    pub fn kind(&self) -> &'static str {
        match self {
            Assertion::Deployment(_) => "deployment",
            Assertion::Message(_) => "message",
            Assertion::ProcessInstance(_) => "process instance",
            Assertion::Job(_) => "job",
        }
    }

    fn unexpected(&self, expected: &'static str) -> Error {
        let actual = self.kind();
        tracing::debug!(expected, actual, "unexpected assertion kind");
        Error::UnexpectedAssertion { expected, actual }
    }

    pub fn into_deployment(self) -> Result<DeploymentAssert> {
        match self {
            Assertion::Deployment(a) => Ok(a),
            other => Err(other.unexpected("deployment")),
        }
    }

    pub fn into_message(self) -> Result<MessageAssert> {
        match self {
            Assertion::Message(a) => Ok(a),
            other => Err(other.unexpected("message")),
        }
    }

    pub fn into_process_instance(self) -> Result<ProcessInstanceAssert> {
        match self {
            Assertion::ProcessInstance(a) => Ok(a),
            other => Err(other.unexpected("process instance")),
        }
    }

    pub fn into_job(self) -> Result<JobAssert> {
        match self {
            Assertion::Job(a) => Ok(a),
            other => Err(other.unexpected("job")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordLog;

    #[test]
    fn dispatches_by_response_type() {
        let log = RecordLog::new();
        let source = log.source();

        let message = assert_that(PublishMessageResponse { message_key: 42 }, &source);
        assert_eq!(message.message_key(), 42);

        let event = ProcessInstanceEvent {
            process_instance_key: 7,
            ..Default::default()
        };
        assert_eq!(assert_that(&event, &source).process_instance_key(), 7);

        let job = ActivatedJob {
            key: 9,
            ..Default::default()
        };
        assert_eq!(assert_that(&job, &source).job().key, 9);
    }

    #[test]
    fn runtime_dispatch_matches_kind() {
        let log = RecordLog::new();
        let source = log.source();

        let assertion = assert_response(DeploymentEvent::default(), &source);
        assert_eq!(assertion.kind(), "deployment");
        assertion.into_deployment().unwrap();

        let job = assert_response(ActivatedJob::default(), &source)
            .into_job()
            .unwrap();
        job.has_not_been_completed().unwrap();
    }

    #[test]
    fn kind_mismatch_fails_fast() {
        let log = RecordLog::new();
        let source = log.source();

        let err = assert_response(PublishMessageResponse { message_key: 1 }, &source)
            .into_deployment()
            .unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedAssertion {
                expected: "deployment",
                actual: "message",
            }
        );
        assert_eq!(
            err.to_string(),
            "Expected a deployment assertion but the response produced a message assertion"
        );
    }
}
