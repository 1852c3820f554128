use std::{fmt, sync::Arc};

use crate::{
    BpmnElementType, DeploymentRecordValue, Intent, JobRecordValue, MessageRecordValue,
    ProcessInstanceRecordValue, ProcessMessageSubscriptionRecordValue, ProcessRecordValue, Record,
    RecordType, RecordValueKind, Records, RejectionType, Source, TypedRecord,
};

type Clause<V> = Arc<dyn Fn(&Record, &V) -> bool + Send + Sync>;

/// A composable, category-scoped query over a record source.
///
/// Every `with_*` method returns a new filter with one more clause; all
/// clauses must hold for a record to match. Nothing is evaluated until
/// [`stream`](Self::stream) or a terminal operation runs, and each of those
/// reads the source afresh, so a filter kept around observes records appended
/// after it was built.
///
/// Which field clauses exist depends on the category: `with_message_key` is
/// only available on process message subscription filters, `with_version` only
/// on process filters, and so on.
///
/// # Example
///
/// ```ignore
/// let correlated = StreamFilter::process_message_subscription(&source)
///     .with_message_key(message_key)
///     .with_rejection_type(RejectionType::NullVal)
///     .with_intent(ProcessMessageSubscriptionIntent::Correlated)
///     .exists();
/// ```
pub struct StreamFilter<V: RecordValueKind> {
    source: Source,
    clauses: Vec<Clause<V>>,
}

impl<V: RecordValueKind> Clone for StreamFilter<V> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            clauses: self.clauses.clone(),
        }
    }
}

impl<V: RecordValueKind> fmt::Debug for StreamFilter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamFilter")
            .field("value_type", &V::VALUE_TYPE)
            .field("clauses", &self.clauses.len())
            .finish()
    }
}

impl StreamFilter<DeploymentRecordValue> {
    pub fn deployment(source: &Source) -> Self {
        Self::filter_for(source)
    }
}

impl StreamFilter<ProcessRecordValue> {
    pub fn process(source: &Source) -> Self {
        Self::filter_for(source)
    }
}

impl StreamFilter<ProcessInstanceRecordValue> {
    pub fn process_instance(source: &Source) -> Self {
        Self::filter_for(source)
    }
}

impl StreamFilter<JobRecordValue> {
    pub fn job(source: &Source) -> Self {
        Self::filter_for(source)
    }
}

impl StreamFilter<MessageRecordValue> {
    pub fn message(source: &Source) -> Self {
        Self::filter_for(source)
    }
}

impl StreamFilter<ProcessMessageSubscriptionRecordValue> {
    pub fn process_message_subscription(source: &Source) -> Self {
        Self::filter_for(source)
    }
}

impl<V: RecordValueKind> StreamFilter<V> {
    /// Start a filter that matches every record of category `V`.
    pub fn filter_for(source: &Source) -> Self {
        Self {
            source: Arc::clone(source),
            clauses: Vec::new(),
        }
    }

    fn with_clause<F>(mut self, clause: F) -> Self
    where
        F: Fn(&Record, &V) -> bool + Send + Sync + 'static,
    {
        self.clauses.push(Arc::new(clause));
        self
    }

    // ==================== Evaluation ====================

    /// Returns a lazy iterator over matching records in emission order.
    ///
    /// Reads the current history from the source; calling it again re-scans
    /// whatever the source holds by then.
    pub fn stream(&self) -> RecordStream<V> {
        RecordStream {
            records: self.source.records(),
            clauses: self.clauses.clone(),
            next: 0,
        }
    }

    /// Returns the number of matching records.
    pub fn count(&self) -> usize {
        self.stream().count()
    }

    /// Returns true if at least one record matches.
    pub fn exists(&self) -> bool {
        self.stream().next().is_some()
    }

    /// Returns true if no record matches.
    pub fn is_empty(&self) -> bool {
        !self.exists()
    }

    /// Returns the earliest matching record, if any.
    pub fn first(&self) -> Option<TypedRecord<V>> {
        self.stream().next()
    }

    /// Returns the latest matching record, if any.
    pub fn last(&self) -> Option<TypedRecord<V>> {
        self.stream().last()
    }

    /// Collects all matching records.
    pub fn collect(&self) -> Vec<TypedRecord<V>> {
        self.stream().collect()
    }

    /// Returns the record keys of all matches, in emission order.
    pub fn keys(&self) -> Vec<i64> {
        self.stream().map(|r| r.key()).collect()
    }

    // ==================== Common Clauses ====================

    /// Filter to records about the given entity key.
    pub fn with_key(self, key: i64) -> Self {
        self.with_clause(move |record, _| record.key() == key)
    }

    /// Filter to records with the given intent.
    pub fn with_intent(self, intent: V::Intent) -> Self {
        let intent: Intent = intent.into();
        self.with_clause(move |record, _| record.intent() == intent)
    }

    /// Filter to records whose intent is any of the given ones.
    ///
    /// An empty set matches nothing.
    pub fn with_intents(self, intents: impl IntoIterator<Item = V::Intent>) -> Self {
        let intents: Vec<Intent> = intents.into_iter().map(Into::into).collect();
        self.with_clause(move |record, _| intents.contains(&record.intent()))
    }

    /// Filter to records with the given rejection type.
    ///
    /// Use [`RejectionType::NullVal`] to keep only accepted outcomes.
    pub fn with_rejection_type(self, rejection_type: RejectionType) -> Self {
        self.with_clause(move |record, _| record.rejection_type() == rejection_type)
    }

    pub fn with_record_type(self, record_type: RecordType) -> Self {
        self.with_clause(move |record, _| record.record_type() == record_type)
    }

    /// Filter using a custom predicate on the record header.
    pub fn matching<F>(self, predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.with_clause(move |record, _| predicate(record))
    }

    /// Filter using a custom predicate on the typed payload.
    pub fn matching_value<F>(self, predicate: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        self.with_clause(move |_, value| predicate(value))
    }
}

// ==================== Category Clauses ====================

impl StreamFilter<ProcessRecordValue> {
    pub fn with_bpmn_process_id(self, bpmn_process_id: impl Into<String>) -> Self {
        let id = bpmn_process_id.into();
        self.matching_value(move |v| v.bpmn_process_id == id)
    }

    pub fn with_process_definition_key(self, key: i64) -> Self {
        self.matching_value(move |v| v.process_definition_key == key)
    }

    pub fn with_version(self, version: i32) -> Self {
        self.matching_value(move |v| v.version == version)
    }

    pub fn with_resource_name(self, resource_name: impl Into<String>) -> Self {
        let name = resource_name.into();
        self.matching_value(move |v| v.resource_name == name)
    }
}

impl StreamFilter<ProcessInstanceRecordValue> {
    pub fn with_process_instance_key(self, key: i64) -> Self {
        self.matching_value(move |v| v.process_instance_key == key)
    }

    pub fn with_process_definition_key(self, key: i64) -> Self {
        self.matching_value(move |v| v.process_definition_key == key)
    }

    pub fn with_bpmn_process_id(self, bpmn_process_id: impl Into<String>) -> Self {
        let id = bpmn_process_id.into();
        self.matching_value(move |v| v.bpmn_process_id == id)
    }

    pub fn with_element_id(self, element_id: impl Into<String>) -> Self {
        let id = element_id.into();
        self.matching_value(move |v| v.element_id == id)
    }

    pub fn with_bpmn_element_type(self, element_type: BpmnElementType) -> Self {
        self.matching_value(move |v| v.bpmn_element_type == element_type)
    }
}

impl StreamFilter<JobRecordValue> {
    pub fn with_process_instance_key(self, key: i64) -> Self {
        self.matching_value(move |v| v.process_instance_key == key)
    }

    pub fn with_job_type(self, job_type: impl Into<String>) -> Self {
        let job_type = job_type.into();
        self.matching_value(move |v| v.job_type == job_type)
    }

    pub fn with_element_id(self, element_id: impl Into<String>) -> Self {
        let id = element_id.into();
        self.matching_value(move |v| v.element_id == id)
    }
}

impl StreamFilter<MessageRecordValue> {
    pub fn with_message_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.matching_value(move |v| v.name == name)
    }

    pub fn with_correlation_key(self, correlation_key: impl Into<String>) -> Self {
        let correlation_key = correlation_key.into();
        self.matching_value(move |v| v.correlation_key == correlation_key)
    }
}

impl StreamFilter<ProcessMessageSubscriptionRecordValue> {
    pub fn with_message_key(self, key: i64) -> Self {
        self.matching_value(move |v| v.message_key == key)
    }

    pub fn with_process_instance_key(self, key: i64) -> Self {
        self.matching_value(move |v| v.process_instance_key == key)
    }

    pub fn with_message_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.matching_value(move |v| v.message_name == name)
    }
}

/// Lazy iterator over the records matched by a [`StreamFilter`].
///
/// Holds the snapshot taken when [`StreamFilter::stream`] was called; records
/// appended to the source afterwards are not visited.
pub struct RecordStream<V: RecordValueKind> {
    records: Records,
    clauses: Vec<Clause<V>>,
    next: usize,
}

impl<V: RecordValueKind> fmt::Debug for RecordStream<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStream")
            .field("value_type", &V::VALUE_TYPE)
            .field("records", &self.records.len())
            .field("next", &self.next)
            .finish()
    }
}

impl<V: RecordValueKind> Iterator for RecordStream<V> {
    type Item = TypedRecord<V>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(record) = self.records.get(self.next) {
            self.next += 1;
            let Some((_, value)) = V::unpack(record) else {
                continue;
            };
            if self.clauses.iter().all(|clause| clause(record, value)) {
                return TypedRecord::from_record(record);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.records.len().saturating_sub(self.next)))
    }
}
