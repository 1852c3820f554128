//! Engine responses that assertions start from.
//!
//! These mirror what a client receives when it issues a command: they carry
//! the identifying fields of the entity the command produced, and nothing the
//! record stream cannot confirm later.

use crate::ProcessRecordValue;

/// Metadata of one process definition contained in a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessMetadata {
    pub bpmn_process_id: String,
    pub version: i32,
    pub process_definition_key: i64,
    pub resource_name: String,
}

impl From<&ProcessRecordValue> for ProcessMetadata {
    fn from(value: &ProcessRecordValue) -> Self {
        Self {
            bpmn_process_id: value.bpmn_process_id.clone(),
            version: value.version,
            process_definition_key: value.process_definition_key,
            resource_name: value.resource_name.clone(),
        }
    }
}

/// Result of deploying one or more resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeploymentEvent {
    pub key: i64,
    pub processes: Vec<ProcessMetadata>,
}

impl DeploymentEvent {
    pub fn process_definition_keys(&self) -> Vec<i64> {
        self.processes
            .iter()
            .map(|p| p.process_definition_key)
            .collect()
    }
}

/// Result of publishing a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PublishMessageResponse {
    pub message_key: i64,
}

/// Result of creating a process instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessInstanceEvent {
    pub process_instance_key: i64,
    pub process_definition_key: i64,
    pub bpmn_process_id: String,
    pub version: i32,
}

/// A job handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivatedJob {
    pub key: i64,
    pub job_type: String,
    pub process_instance_key: i64,
    pub element_id: String,
    pub element_instance_key: i64,
    pub bpmn_process_id: String,
    pub process_definition_key: i64,
    pub retries: i32,
    pub worker: String,
    pub deadline: i64,
}

/// Any response the entry point knows how to assert on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineResponse {
    Deployment(DeploymentEvent),
    PublishMessage(PublishMessageResponse),
    ProcessInstance(ProcessInstanceEvent),
    ActivatedJob(ActivatedJob),
}

impl EngineResponse {
    /// Short name of the response kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineResponse::Deployment(_) => "deployment",
            EngineResponse::PublishMessage(_) => "message",
            EngineResponse::ProcessInstance(_) => "process instance",
            EngineResponse::ActivatedJob(_) => "job",
        }
    }
}

impl From<DeploymentEvent> for EngineResponse {
    fn from(value: DeploymentEvent) -> Self {
        EngineResponse::Deployment(value)
    }
}

impl From<PublishMessageResponse> for EngineResponse {
    fn from(value: PublishMessageResponse) -> Self {
        EngineResponse::PublishMessage(value)
    }
}

impl From<ProcessInstanceEvent> for EngineResponse {
    fn from(value: ProcessInstanceEvent) -> Self {
        EngineResponse::ProcessInstance(value)
    }
}

impl From<ActivatedJob> for EngineResponse {
    fn from(value: ActivatedJob) -> Self {
        EngineResponse::ActivatedJob(value)
    }
}
