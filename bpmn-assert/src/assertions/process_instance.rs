use std::{collections::BTreeMap, fmt};

use super::ensure;
use crate::{
    BpmnElementType, ProcessInstanceIntent, ProcessInstanceRecordValue,
    ProcessMessageSubscriptionIntent, RejectionType, Result, Source, StreamFilter,
};

/// Assertions on one process instance, identified by its key.
///
/// Lifecycle checks look at the records of the process element itself (whose
/// key equals the instance key). Element checks look at every element
/// instance within the process instance.
#[derive(Clone)]
pub struct ProcessInstanceAssert {
    process_instance_key: i64,
    source: Source,
}

impl ProcessInstanceAssert {
    pub(crate) fn new(process_instance_key: i64, source: Source) -> Self {
        Self {
            process_instance_key,
            source,
        }
    }

    pub fn process_instance_key(&self) -> i64 {
        self.process_instance_key
    }

    fn records(&self) -> StreamFilter<ProcessInstanceRecordValue> {
        StreamFilter::process_instance(&self.source)
            .with_process_instance_key(self.process_instance_key)
            .with_rejection_type(RejectionType::NullVal)
    }

    fn lifecycle(&self) -> StreamFilter<ProcessInstanceRecordValue> {
        self.records()
            .with_key(self.process_instance_key)
            .with_bpmn_element_type(BpmnElementType::Process)
    }

    fn reached(&self, intent: ProcessInstanceIntent) -> bool {
        self.lifecycle().with_intent(intent).exists()
    }

    /// Element ids whose latest record is `ELEMENT_ACTIVATED`, sorted.
    fn waiting_elements(&self) -> Vec<String> {
        let mut latest = BTreeMap::new();
        for record in self.records().stream() {
            if record.value().bpmn_element_type == BpmnElementType::Process {
                continue;
            }
            latest.insert(record.key(), record);
        }

        let mut waiting: Vec<String> = latest
            .into_values()
            .filter(|r| r.intent() == ProcessInstanceIntent::ElementActivated)
            .map(|r| r.into_value().element_id)
            .collect();
        waiting.sort();
        waiting.dedup();
        waiting
    }

    pub fn is_started(&self) -> Result<&Self> {
        ensure(self.reached(ProcessInstanceIntent::ElementActivated), || {
            format!("Process with key {} was not started", self.process_instance_key)
        })?;
        Ok(self)
    }

    /// Started and neither completed nor terminated.
    pub fn is_active(&self) -> Result<&Self> {
        let intents: Vec<_> = self.lifecycle().stream().map(|r| r.intent()).collect();
        let started = intents.contains(&ProcessInstanceIntent::ElementActivated);
        let ended = intents.iter().any(|intent| {
            matches!(
                intent,
                ProcessInstanceIntent::ElementCompleted | ProcessInstanceIntent::ElementTerminated
            )
        });
        ensure(started && !ended, || {
            format!("Process with key {} is not active", self.process_instance_key)
        })?;
        Ok(self)
    }

    pub fn is_completed(&self) -> Result<&Self> {
        ensure(self.reached(ProcessInstanceIntent::ElementCompleted), || {
            format!("Process with key {} was not completed", self.process_instance_key)
        })?;
        Ok(self)
    }

    pub fn is_not_completed(&self) -> Result<&Self> {
        ensure(!self.reached(ProcessInstanceIntent::ElementCompleted), || {
            format!("Process with key {} was completed", self.process_instance_key)
        })?;
        Ok(self)
    }

    pub fn is_terminated(&self) -> Result<&Self> {
        ensure(self.reached(ProcessInstanceIntent::ElementTerminated), || {
            format!("Process with key {} was not terminated", self.process_instance_key)
        })?;
        Ok(self)
    }

    pub fn is_not_terminated(&self) -> Result<&Self> {
        ensure(!self.reached(ProcessInstanceIntent::ElementTerminated), || {
            format!("Process with key {} was terminated", self.process_instance_key)
        })?;
        Ok(self)
    }

    /// Counts completions of the element; a loop passes it once per iteration.
    pub fn has_passed_element(&self, element_id: &str, times: usize) -> Result<&Self> {
        let actual = self
            .records()
            .with_element_id(element_id)
            .with_intent(ProcessInstanceIntent::ElementCompleted)
            .count();
        ensure(actual == times, || {
            format!(
                "Expected element with id '{element_id}' to be passed {times} times but was {actual} instead"
            )
        })?;
        Ok(self)
    }

    pub fn has_not_passed_element(&self, element_id: &str) -> Result<&Self> {
        self.has_passed_element(element_id, 0)
    }

    /// The given elements completed in exactly this order, ignoring any
    /// other elements in between.
    pub fn has_passed_elements_in_order(&self, element_ids: &[&str]) -> Result<&Self> {
        let expected: Vec<String> = element_ids.iter().map(|id| id.to_string()).collect();
        let wanted = expected.clone();
        let passed: Vec<String> = self
            .records()
            .with_intent(ProcessInstanceIntent::ElementCompleted)
            .matching_value(move |value| wanted.contains(&value.element_id))
            .stream()
            .map(|r| r.into_value().element_id)
            .collect();
        ensure(passed == expected, || {
            format!(
                "Expected elements {expected:?} to be passed in order but was {passed:?} instead"
            )
        })?;
        Ok(self)
    }

    pub fn is_waiting_at_elements(&self, element_ids: &[&str]) -> Result<&Self> {
        let waiting = self.waiting_elements();
        let missing: Vec<&str> = element_ids
            .iter()
            .copied()
            .filter(|id| !waiting.iter().any(|w| w == id))
            .collect();
        ensure(missing.is_empty(), || {
            format!(
                "Process with key {} is not waiting at elements {missing:?}, it is waiting at {waiting:?}",
                self.process_instance_key
            )
        })?;
        Ok(self)
    }

    pub fn is_not_waiting_at_elements(&self, element_ids: &[&str]) -> Result<&Self> {
        let waiting = self.waiting_elements();
        let present: Vec<&str> = element_ids
            .iter()
            .copied()
            .filter(|id| waiting.iter().any(|w| w == id))
            .collect();
        ensure(present.is_empty(), || {
            format!(
                "Process with key {} is waiting at elements {present:?}",
                self.process_instance_key
            )
        })?;
        Ok(self)
    }

    pub fn has_correlated_message_by_name(
        &self,
        message_name: &str,
        times: usize,
    ) -> Result<&Self> {
        let actual = StreamFilter::process_message_subscription(&self.source)
            .with_process_instance_key(self.process_instance_key)
            .with_message_name(message_name)
            .with_rejection_type(RejectionType::NullVal)
            .with_intent(ProcessMessageSubscriptionIntent::Correlated)
            .count();
        ensure(actual == times, || {
            format!(
                "Expected message with name '{message_name}' to be correlated {times} times but was {actual} instead"
            )
        })?;
        Ok(self)
    }
}

impl fmt::Debug for ProcessInstanceAssert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessInstanceAssert")
            .field("process_instance_key", &self.process_instance_key)
            .finish_non_exhaustive()
    }
}
