use std::fmt;

use super::{ProcessInstanceAssert, ensure, exactly_one, expect_number, expect_text};
use crate::{
    ActivatedJob, BpmnElementType, JobIntent, ProcessInstanceIntent, RejectionType, Result,
    Source, StreamFilter,
};

/// Assertions on an activated job.
///
/// Field checks compare against the activation response; completion checks
/// query the record source.
#[derive(Clone)]
pub struct JobAssert {
    job: ActivatedJob,
    source: Source,
}

impl JobAssert {
    pub(crate) fn new(job: ActivatedJob, source: Source) -> Self {
        Self { job, source }
    }

    pub fn job(&self) -> &ActivatedJob {
        &self.job
    }

    fn completed(&self) -> bool {
        StreamFilter::job(&self.source)
            .with_key(self.job.key)
            .with_rejection_type(RejectionType::NullVal)
            .with_intent(JobIntent::Completed)
            .exists()
    }

    pub fn has_element_id(&self, expected: &str) -> Result<&Self> {
        expect_text("element ID", expected, &self.job.element_id)?;
        Ok(self)
    }

    pub fn has_bpmn_process_id(&self, expected: &str) -> Result<&Self> {
        expect_text("BPMN process ID", expected, &self.job.bpmn_process_id)?;
        Ok(self)
    }

    pub fn has_retries(&self, expected: i32) -> Result<&Self> {
        expect_number("retries", expected, self.job.retries)?;
        Ok(self)
    }

    pub fn has_been_completed(&self) -> Result<&Self> {
        ensure(self.completed(), || {
            format!("Job with key {} was not completed", self.job.key)
        })?;
        Ok(self)
    }

    pub fn has_not_been_completed(&self) -> Result<&Self> {
        ensure(!self.completed(), || {
            format!("Job with key {} was completed", self.job.key)
        })?;
        Ok(self)
    }

    /// Switch to the process instance the job belongs to.
    pub fn extracting_process_instance(&self) -> Result<ProcessInstanceAssert> {
        let job_key = self.job.key;
        let instance_key = self.job.process_instance_key;
        let keys = StreamFilter::process_instance(&self.source)
            .with_key(instance_key)
            .with_process_instance_key(instance_key)
            .with_bpmn_element_type(BpmnElementType::Process)
            .with_rejection_type(RejectionType::NullVal)
            .with_intent(ProcessInstanceIntent::ElementActivated)
            .keys();
        let process_instance_key = exactly_one(keys, |key| *key, || {
            format!("process instance for job key {job_key}")
        })?;
        Ok(ProcessInstanceAssert::new(
            process_instance_key,
            self.source.clone(),
        ))
    }
}

impl fmt::Debug for JobAssert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobAssert")
            .field("key", &self.job.key)
            .field("job_type", &self.job.job_type)
            .finish_non_exhaustive()
    }
}
