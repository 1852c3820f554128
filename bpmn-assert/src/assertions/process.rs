use std::fmt;

use super::{ensure, exactly_one, expect_number, expect_text};
use crate::{
    BpmnElementType, ProcessInstanceIntent, ProcessInstanceRecordValue, ProcessIntent,
    ProcessMetadata, ProcessRecordValue, RejectionType, Result, Source, StreamFilter, TypedRecord,
};

/// Assertions on one deployed process definition.
///
/// Obtained from [`DeploymentAssert`](crate::DeploymentAssert) extraction.
/// Field checks read the `Process` `CREATED` record keyed by the definition
/// key, not the deployment response.
#[derive(Clone)]
pub struct ProcessAssert {
    process: ProcessMetadata,
    source: Source,
}

impl ProcessAssert {
    pub(crate) fn new(process: ProcessMetadata, source: Source) -> Self {
        Self { process, source }
    }

    pub fn process(&self) -> &ProcessMetadata {
        &self.process
    }

    pub fn process_definition_key(&self) -> i64 {
        self.process.process_definition_key
    }

    fn definition(&self) -> Result<TypedRecord<ProcessRecordValue>> {
        let key = self.process_definition_key();
        let records = StreamFilter::process(&self.source)
            .with_key(key)
            .with_rejection_type(RejectionType::NullVal)
            .with_intent(ProcessIntent::Created)
            .collect();
        exactly_one(records, |r| r.key(), || {
            format!("process definition with key {key}")
        })
    }

    /// Instances are counted by the activation of their process element.
    fn instances(&self) -> StreamFilter<ProcessInstanceRecordValue> {
        StreamFilter::process_instance(&self.source)
            .with_rejection_type(RejectionType::NullVal)
            .with_process_definition_key(self.process_definition_key())
            .with_bpmn_element_type(BpmnElementType::Process)
            .with_intent(ProcessInstanceIntent::ElementActivating)
    }

    pub fn has_bpmn_process_id(&self, expected: &str) -> Result<&Self> {
        let definition = self.definition()?;
        expect_text("BPMN process ID", expected, &definition.value().bpmn_process_id)?;
        Ok(self)
    }

    pub fn has_version(&self, expected: i32) -> Result<&Self> {
        let definition = self.definition()?;
        expect_number("version", expected, definition.value().version)?;
        Ok(self)
    }

    pub fn has_resource_name(&self, expected: &str) -> Result<&Self> {
        let definition = self.definition()?;
        expect_text("resource name", expected, &definition.value().resource_name)?;
        Ok(self)
    }

    pub fn has_any_instances(&self) -> Result<&Self> {
        ensure(self.instances().exists(), || {
            "The process has no instances".to_string()
        })?;
        Ok(self)
    }

    pub fn has_no_instances(&self) -> Result<&Self> {
        ensure(self.instances().is_empty(), || {
            "The process does have instances".to_string()
        })?;
        Ok(self)
    }

    pub fn has_instances(&self, expected: usize) -> Result<&Self> {
        expect_number("number of instances", expected, self.instances().count())?;
        Ok(self)
    }
}

impl fmt::Debug for ProcessAssert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessAssert")
            .field("process", &self.process)
            .finish_non_exhaustive()
    }
}
