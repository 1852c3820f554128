use std::fmt;

use crate::{
    DeploymentIntent, DeploymentRecordValue, Intent, JobIntent, JobRecordValue, MessageIntent,
    MessageRecordValue, ProcessInstanceIntent, ProcessInstanceRecordValue, ProcessIntent,
    ProcessMessageSubscriptionIntent, ProcessMessageSubscriptionRecordValue, ProcessRecordValue,
    Record, RecordMetadata, RecordType, RecordValue, RejectionType, ValueType,
};

/// Binds a payload type to its record category and intent type.
///
/// This is what makes [`StreamFilter`](crate::StreamFilter) category-scoped:
/// a `StreamFilter<MessageRecordValue>` only ever yields message records and
/// only accepts [`MessageIntent`] in `with_intent`.
pub trait RecordValueKind:
    Clone + fmt::Debug + PartialEq + Send + Sync + Into<RecordValue> + 'static
{
    const VALUE_TYPE: ValueType;

    type Intent: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + Into<Intent> + 'static;

    /// Returns the typed intent and payload if the record belongs to this category.
    fn unpack(record: &Record) -> Option<(Self::Intent, &Self)>;
}

macro_rules! record_value_kind {
    ($value:ty, $variant:ident, $intent:ty) => {
        impl RecordValueKind for $value {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            type Intent = $intent;

            fn unpack(record: &Record) -> Option<(Self::Intent, &Self)> {
                match (record.intent(), record.value()) {
                    (Intent::$variant(intent), RecordValue::$variant(value)) => {
                        Some((intent, value))
                    }
                    _ => None,
                }
            }
        }

        impl From<$value> for RecordValue {
            fn from(value: $value) -> Self {
                RecordValue::$variant(value)
            }
        }

        impl From<$intent> for Intent {
            fn from(intent: $intent) -> Self {
                Intent::$variant(intent)
            }
        }
    };
}

record_value_kind!(DeploymentRecordValue, Deployment, DeploymentIntent);
record_value_kind!(ProcessRecordValue, Process, ProcessIntent);
record_value_kind!(
    ProcessInstanceRecordValue,
    ProcessInstance,
    ProcessInstanceIntent
);
record_value_kind!(JobRecordValue, Job, JobIntent);
record_value_kind!(MessageRecordValue, Message, MessageIntent);
record_value_kind!(
    ProcessMessageSubscriptionRecordValue,
    ProcessMessageSubscription,
    ProcessMessageSubscriptionIntent
);

/// A record whose category is known, with typed access to intent and payload.
///
/// Produced by [`RecordStream`](crate::RecordStream); owns a copy of the
/// matched record so it outlives the snapshot it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRecord<V: RecordValueKind> {
    metadata: RecordMetadata,
    intent: V::Intent,
    value: V,
}

impl<V: RecordValueKind> TypedRecord<V> {
    /// Returns `None` if the record is not of category `V`.
    pub fn from_record(record: &Record) -> Option<Self> {
        V::unpack(record).map(|(intent, value)| Self {
            metadata: record.metadata().clone(),
            intent,
            value: value.clone(),
        })
    }

    #[inline]
    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.metadata.position()
    }

    #[inline]
    pub fn key(&self) -> i64 {
        self.metadata.key()
    }

    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.metadata.timestamp()
    }

    #[inline]
    pub fn record_type(&self) -> RecordType {
        self.metadata.record_type()
    }

    #[inline]
    pub fn rejection_type(&self) -> RejectionType {
        self.metadata.rejection_type()
    }

    #[inline]
    pub fn intent(&self) -> V::Intent {
        self.intent
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }
}
