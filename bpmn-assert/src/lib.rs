#![cfg_attr(docsrs, feature(doc_cfg))]
//! # bpmn-assert
//!
//! Record-stream filtering and assertions for a BPMN process engine's event log.
//!
//! The engine emits an ordered stream of [`Record`]s: deployments, process
//! definitions, process instance element transitions, jobs, messages and
//! message subscriptions. This crate lets tests query that stream with
//! composable filters and state facts about engine entities with chainable
//! assertions that produce precise diagnostic messages.
//!
//! ## Quick Start
//!
//! ```rust
//! use bpmn_assert::*;
//!
//! # fn main() -> bpmn_assert::Result {
//! let log = RecordLog::new();
//! let source = log.source();
//!
//! // Normally written by the engine adapter
//! let process = ProcessRecordValue {
//!     bpmn_process_id: "looping-task".into(),
//!     version: 1,
//!     process_definition_key: 10,
//!     resource_name: "looping-task.bpmn".into(),
//! };
//! log.append(Record::new(10, ProcessIntent::Created, process.clone()))?;
//!
//! let deployment = DeploymentEvent {
//!     key: 1,
//!     processes: vec![ProcessMetadata::from(&process)],
//! };
//!
//! assert_that(&deployment, &source)
//!     .extracting_process_by_bpmn_process_id("looping-task")?
//!     .has_version(1)?
//!     .has_no_instances()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Record`] | One immutable entry of the engine's event log |
//! | [`RecordStreamSource`] | Capability to read the current history |
//! | [`RecordLog`] | In-memory, append-only source with change notification |
//! | [`StreamFilter`] | Composable, category-scoped query over a source |
//! | [`assert_that`] | Entry point from an engine response to its assertion |
//! | [`DeploymentAssert`], [`ProcessAssert`], [`ProcessInstanceAssert`], [`MessageAssert`], [`JobAssert`] | Chainable entity assertions |
//! | [`Error`] | Assertion failures and log errors |
//!
//! ## Waiting
//!
//! Assertions never wait. When the engine writes asynchronously, settle on
//! a condition first:
//!
//! ```rust,ignore
//! log.settle_on(|source| StreamFilter::message(source).with_key(key).exists())
//!     .within(Duration::from_secs(1))
//!     .await?;
//! ```
//!
//! ## Features
//!
//! - **`serde`** - `Serialize`/`Deserialize` for records, responses and
//!   [`Config`], plus `RecordLog::to_json()`

mod config;
mod entry;
mod error;
mod expectation;
mod filter;
mod record;
mod record_log;
mod record_value;
mod response;
mod source;

pub mod assertions;

pub use assertions::{
    DeploymentAssert, JobAssert, MessageAssert, ProcessAssert, ProcessInstanceAssert,
};
pub use config::Config;
pub use entry::{Assertable, Assertion, assert_response, assert_that};
pub use error::Error;
pub use expectation::Expectation;
pub use filter::{RecordStream, StreamFilter};
pub use record::{
    BpmnElementType, DeploymentIntent, DeploymentRecordValue, Intent, JobIntent, JobRecordValue,
    MessageIntent, MessageRecordValue, ProcessInstanceIntent, ProcessInstanceRecordValue,
    ProcessIntent, ProcessMessageSubscriptionIntent, ProcessMessageSubscriptionRecordValue,
    ProcessRecordValue, Record, RecordMetadata, RecordType, RecordValue, RejectionType, ValueType,
};
pub use record_log::RecordLog;
pub use record_value::{RecordValueKind, TypedRecord};
pub use response::{
    ActivatedJob, DeploymentEvent, EngineResponse, ProcessInstanceEvent, ProcessMetadata,
    PublishMessageResponse,
};
pub use source::{RecordStreamSource, Records, Source};

/// Convenience alias for `Result<T, bpmn_assert::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
