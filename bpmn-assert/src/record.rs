use std::{fmt, hash};

use crate::RecordValueKind;

/// Whether a record is a fact, a request, or a refused request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordType {
    #[default]
    Event,
    Command,
    CommandRejection,
}

/// Reason the engine refused the command behind a record.
///
/// [`RejectionType::NullVal`] means the command was accepted. Assertions about
/// accepted outcomes always filter on it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectionType {
    #[default]
    NullVal,
    InvalidArgument,
    NotFound,
    AlreadyExists,
    InvalidState,
    ProcessingError,
}

impl RejectionType {
    /// Returns true for every variant except [`RejectionType::NullVal`].
    pub fn is_rejection(&self) -> bool {
        !matches!(self, RejectionType::NullVal)
    }
}

impl fmt::Display for RejectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectionType::NullVal => "NULL_VAL",
            RejectionType::InvalidArgument => "INVALID_ARGUMENT",
            RejectionType::NotFound => "NOT_FOUND",
            RejectionType::AlreadyExists => "ALREADY_EXISTS",
            RejectionType::InvalidState => "INVALID_STATE",
            RejectionType::ProcessingError => "PROCESSING_ERROR",
        })
    }
}

/// Category of a record. Closed set: a new category means a new variant here,
/// a new payload type and a new [`Intent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    Deployment,
    Process,
    ProcessInstance,
    Job,
    Message,
    ProcessMessageSubscription,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Deployment => "DEPLOYMENT",
            ValueType::Process => "PROCESS",
            ValueType::ProcessInstance => "PROCESS_INSTANCE",
            ValueType::Job => "JOB",
            ValueType::Message => "MESSAGE",
            ValueType::ProcessMessageSubscription => "PROCESS_MESSAGE_SUBSCRIPTION",
        })
    }
}

macro_rules! intent_enum {
    ($(#[$attr:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, hash::Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $($variant),+
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $($name::$variant => $label),+
                })
            }
        }
    };
}

intent_enum!(
    /// Intents of [`ValueType::Deployment`] records.
    DeploymentIntent {
        Create => "CREATE",
        Created => "CREATED",
    }
);

intent_enum!(
    /// Intents of [`ValueType::Process`] records.
    ProcessIntent {
        Created => "CREATED",
    }
);

intent_enum!(
    /// Lifecycle of a single element instance within a process instance.
    ProcessInstanceIntent {
        ElementActivating => "ELEMENT_ACTIVATING",
        ElementActivated => "ELEMENT_ACTIVATED",
        ElementCompleting => "ELEMENT_COMPLETING",
        ElementCompleted => "ELEMENT_COMPLETED",
        ElementTerminating => "ELEMENT_TERMINATING",
        ElementTerminated => "ELEMENT_TERMINATED",
        SequenceFlowTaken => "SEQUENCE_FLOW_TAKEN",
    }
);

intent_enum!(
    /// Intents of [`ValueType::Job`] records.
    JobIntent {
        Created => "CREATED",
        Completed => "COMPLETED",
        Failed => "FAILED",
        TimedOut => "TIMED_OUT",
        Canceled => "CANCELED",
    }
);

intent_enum!(
    /// Intents of [`ValueType::Message`] records.
    MessageIntent {
        Publish => "PUBLISH",
        Published => "PUBLISHED",
        Expired => "EXPIRED",
    }
);

intent_enum!(
    /// Intents of [`ValueType::ProcessMessageSubscription`] records.
    ProcessMessageSubscriptionIntent {
        Creating => "CREATING",
        Created => "CREATED",
        Correlating => "CORRELATING",
        Correlated => "CORRELATED",
        Deleted => "DELETED",
    }
);

/// Sub-type tag of a record, scoped to its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Intent {
    Deployment(DeploymentIntent),
    Process(ProcessIntent),
    ProcessInstance(ProcessInstanceIntent),
    Job(JobIntent),
    Message(MessageIntent),
    ProcessMessageSubscription(ProcessMessageSubscriptionIntent),
}

impl Intent {
    /// The category this intent belongs to.
    pub fn value_type(&self) -> ValueType {
        match self {
            Intent::Deployment(_) => ValueType::Deployment,
            Intent::Process(_) => ValueType::Process,
            Intent::ProcessInstance(_) => ValueType::ProcessInstance,
            Intent::Job(_) => ValueType::Job,
            Intent::Message(_) => ValueType::Message,
            Intent::ProcessMessageSubscription(_) => ValueType::ProcessMessageSubscription,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Deployment(i) => i.fmt(f),
            Intent::Process(i) => i.fmt(f),
            Intent::ProcessInstance(i) => i.fmt(f),
            Intent::Job(i) => i.fmt(f),
            Intent::Message(i) => i.fmt(f),
            Intent::ProcessMessageSubscription(i) => i.fmt(f),
        }
    }
}

/// Kind of BPMN element a process instance record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BpmnElementType {
    #[default]
    Unspecified,
    Process,
    SubProcess,
    StartEvent,
    EndEvent,
    IntermediateCatchEvent,
    ServiceTask,
    ReceiveTask,
    UserTask,
    ExclusiveGateway,
    ParallelGateway,
    SequenceFlow,
}

#[derive(Debug, Clone, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeploymentRecordValue {
    pub resources: Vec<String>,
    pub process_keys: Vec<i64>,
}

/// A deployed process definition.
#[derive(Debug, Clone, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessRecordValue {
    pub bpmn_process_id: String,
    pub version: i32,
    pub process_definition_key: i64,
    pub resource_name: String,
}

/// One element instance of a running process instance.
///
/// The process instance itself is represented by records whose
/// `bpmn_element_type` is [`BpmnElementType::Process`] and whose record key
/// equals `process_instance_key`.
#[derive(Debug, Clone, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessInstanceRecordValue {
    pub bpmn_process_id: String,
    pub version: i32,
    pub process_definition_key: i64,
    pub process_instance_key: i64,
    pub element_id: String,
    pub bpmn_element_type: BpmnElementType,
    pub flow_scope_key: i64,
    pub parent_process_instance_key: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobRecordValue {
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

#[derive(Debug, Clone, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageRecordValue {
    pub name: String,
    pub correlation_key: String,
    pub message_id: String,
    pub time_to_live: i64,
}

/// Link between a published message and a waiting process instance.
#[derive(Debug, Clone, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessMessageSubscriptionRecordValue {
    pub process_instance_key: i64,
    pub element_instance_key: i64,
    pub message_key: i64,
    pub message_name: String,
    pub correlation_key: String,
    pub bpmn_process_id: String,
}

/// Category-specific payload of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordValue {
    Deployment(DeploymentRecordValue),
    Process(ProcessRecordValue),
    ProcessInstance(ProcessInstanceRecordValue),
    Job(JobRecordValue),
    Message(MessageRecordValue),
    ProcessMessageSubscription(ProcessMessageSubscriptionRecordValue),
}

impl RecordValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            RecordValue::Deployment(_) => ValueType::Deployment,
            RecordValue::Process(_) => ValueType::Process,
            RecordValue::ProcessInstance(_) => ValueType::ProcessInstance,
            RecordValue::Job(_) => ValueType::Job,
            RecordValue::Message(_) => ValueType::Message,
            RecordValue::ProcessMessageSubscription(_) => ValueType::ProcessMessageSubscription,
        }
    }
}

/// Header fields shared by every record, independent of its category.
#[derive(Debug, Clone, PartialEq, Eq, hash::Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordMetadata {
    position: u64,
    key: i64,
    timestamp: u64,
    record_type: RecordType,
    rejection_type: RejectionType,
    rejection_reason: String,
}

impl RecordMetadata {
    /// Position in the log. Strictly increasing in emission order.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Key of the subject entity, or [`Record::UNSET_KEY`].
    pub fn key(&self) -> i64 {
        self.key
    }

    /// Emission time in milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn rejection_type(&self) -> RejectionType {
        self.rejection_type
    }

    pub fn rejection_reason(&self) -> &str {
        &self.rejection_reason
    }
}

/// An immutable fact emitted by the engine.
///
/// Records are built with [`Record::new`], which ties the intent and the
/// payload to the same category at compile time, and then refined with the
/// `with_*` methods before being appended to a log.
///
/// # Example
///
/// ```rust
/// use bpmn_assert::{MessageIntent, MessageRecordValue, Record};
///
/// let record = Record::new(42, MessageIntent::Published, MessageRecordValue {
///     name: "payment-received".into(),
///     ..Default::default()
/// })
/// .with_position(7);
///
/// assert_eq!(record.key(), 42);
/// assert_eq!(record.position(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    metadata: RecordMetadata,
    intent: Intent,
    value: RecordValue,
}

impl Record {
    /// Key of records that are not yet tied to an entity.
    pub const UNSET_KEY: i64 = -1;

    /// Create an accepted event record with position and timestamp unset.
    pub fn new<V: RecordValueKind>(key: i64, intent: V::Intent, value: V) -> Self {
        Self {
            metadata: RecordMetadata {
                key,
                ..Default::default()
            },
            intent: intent.into(),
            value: value.into(),
        }
    }

    pub fn with_position(mut self, position: u64) -> Self {
        self.metadata.position = position;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.metadata.timestamp = timestamp;
        self
    }

    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.metadata.record_type = record_type;
        self
    }

    /// Mark this record as the engine's refusal of a command.
    pub fn rejected(mut self, rejection_type: RejectionType, reason: impl Into<String>) -> Self {
        self.metadata.record_type = RecordType::CommandRejection;
        self.metadata.rejection_type = rejection_type;
        self.metadata.rejection_reason = reason.into();
        self
    }

    #[inline]
    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.metadata.position
    }

    #[inline]
    pub fn key(&self) -> i64 {
        self.metadata.key
    }

    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.metadata.timestamp
    }

    #[inline]
    pub fn record_type(&self) -> RecordType {
        self.metadata.record_type
    }

    #[inline]
    pub fn rejection_type(&self) -> RejectionType {
        self.metadata.rejection_type
    }

    #[inline]
    pub fn intent(&self) -> Intent {
        self.intent
    }

    #[inline]
    pub fn value(&self) -> &RecordValue {
        &self.value
    }

    /// The category of this record, derived from its payload.
    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} key={}",
            self.position(),
            self.value_type(),
            self.intent,
            self.key()
        )?;
        if self.rejection_type().is_rejection() {
            write!(f, " rejected={}", self.rejection_type())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(key: i64) -> Record {
        Record::new(
            key,
            MessageIntent::Published,
            MessageRecordValue {
                name: "order-paid".into(),
                correlation_key: "order-1".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn new_record_is_accepted_event() {
        let record = message(5);
        assert_eq!(record.record_type(), RecordType::Event);
        assert_eq!(record.rejection_type(), RejectionType::NullVal);
        assert_eq!(record.position(), 0);
        assert_eq!(record.key(), 5);
    }

    #[test]
    fn intent_and_value_share_category() {
        let record = message(5);
        assert_eq!(record.value_type(), ValueType::Message);
        assert_eq!(record.intent().value_type(), ValueType::Message);
    }

    #[test]
    fn rejected_sets_record_type_and_reason() {
        let record = message(5).rejected(RejectionType::NotFound, "no such subscription");
        assert_eq!(record.record_type(), RecordType::CommandRejection);
        assert_eq!(record.rejection_type(), RejectionType::NotFound);
        assert_eq!(record.metadata().rejection_reason(), "no such subscription");
        assert!(record.rejection_type().is_rejection());
    }

    #[test]
    fn display_includes_rejection_only_when_rejected() {
        let accepted = message(5).with_position(3);
        assert_eq!(accepted.to_string(), "#3 MESSAGE PUBLISHED key=5");

        let rejected = accepted.rejected(RejectionType::InvalidState, "");
        assert_eq!(
            rejected.to_string(),
            "#3 MESSAGE PUBLISHED key=5 rejected=INVALID_STATE"
        );
    }

    #[test]
    fn unset_key_is_negative_one() {
        let record = Record::new(
            Record::UNSET_KEY,
            ProcessMessageSubscriptionIntent::Creating,
            ProcessMessageSubscriptionRecordValue::default(),
        );
        assert_eq!(record.key(), -1);
    }
}
