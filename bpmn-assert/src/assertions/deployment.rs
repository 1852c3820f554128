use std::fmt;

use super::{ProcessAssert, ensure, exactly_one};
use crate::{
    DeploymentEvent, ProcessIntent, ProcessMetadata, ProcessRecordValue, RejectionType, Result,
    Source, StreamFilter, TypedRecord,
};

/// Assertions on a deployment.
///
/// Only `Process` `CREATED` records whose key belongs to this deployment are
/// considered, so processes deployed elsewhere with the same BPMN process ID
/// never interfere.
#[derive(Clone)]
pub struct DeploymentAssert {
    deployment: DeploymentEvent,
    source: Source,
}

impl DeploymentAssert {
    pub(crate) fn new(deployment: DeploymentEvent, source: Source) -> Self {
        Self { deployment, source }
    }

    pub fn deployment(&self) -> &DeploymentEvent {
        &self.deployment
    }

    fn deployed_processes(&self) -> StreamFilter<ProcessRecordValue> {
        let keys = self.deployment.process_definition_keys();
        StreamFilter::process(&self.source)
            .with_rejection_type(RejectionType::NullVal)
            .with_intent(ProcessIntent::Created)
            .matching(move |record| keys.contains(&record.key()))
    }

    fn deployed<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(ProcessRecordValue) -> String,
    {
        self.deployed_processes()
            .stream()
            .map(|r| field(r.into_value()))
            .collect()
    }

    fn extract(
        &self,
        records: Vec<TypedRecord<ProcessRecordValue>>,
        subject: impl FnOnce() -> String,
    ) -> Result<ProcessAssert> {
        let record = exactly_one(records, |r| r.key(), subject)?;
        tracing::trace!(
            deployment = self.deployment.key,
            process_definition_key = record.key(),
            "extracted process"
        );
        Ok(ProcessAssert::new(
            ProcessMetadata::from(record.value()),
            self.source.clone(),
        ))
    }

    pub fn contains_processes_by_bpmn_process_id(
        &self,
        bpmn_process_ids: &[&str],
    ) -> Result<&Self> {
        let deployed = self.deployed(|value| value.bpmn_process_id);
        let missing = missing(bpmn_process_ids, &deployed);
        ensure(missing.is_empty(), || {
            format!(
                "Expected {missing:?} to be deployed but could not find them in deployment {}",
                self.deployment.key
            )
        })?;
        Ok(self)
    }

    pub fn contains_processes_by_resource_name(
        &self,
        resource_names: &[&str],
    ) -> Result<&Self> {
        let deployed = self.deployed(|value| value.resource_name);
        let missing = missing(resource_names, &deployed);
        ensure(missing.is_empty(), || {
            format!(
                "Expected {missing:?} to be deployed but could not find them in deployment {}",
                self.deployment.key
            )
        })?;
        Ok(self)
    }

    /// Switch to the single process in this deployment with the given id.
    pub fn extracting_process_by_bpmn_process_id(
        &self,
        bpmn_process_id: &str,
    ) -> Result<ProcessAssert> {
        let records = self
            .deployed_processes()
            .with_bpmn_process_id(bpmn_process_id)
            .collect();
        self.extract(records, || {
            format!(
                "process with BPMN process ID '{bpmn_process_id}' in deployment {}",
                self.deployment.key
            )
        })
    }

    /// Switch to the single process in this deployment from the given resource.
    pub fn extracting_process_by_resource_name(
        &self,
        resource_name: &str,
    ) -> Result<ProcessAssert> {
        let records = self
            .deployed_processes()
            .with_resource_name(resource_name)
            .collect();
        self.extract(records, || {
            format!(
                "process with resource name '{resource_name}' in deployment {}",
                self.deployment.key
            )
        })
    }
}

fn missing<'a>(expected: &[&'a str], deployed: &[String]) -> Vec<&'a str> {
    expected
        .iter()
        .copied()
        .filter(|e| !deployed.iter().any(|d| d == e))
        .collect()
}

impl fmt::Debug for DeploymentAssert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentAssert")
            .field("key", &self.deployment.key)
            .field("processes", &self.deployment.processes.len())
            .finish_non_exhaustive()
    }
}
