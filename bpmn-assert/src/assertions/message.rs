use std::fmt;

use super::{ProcessInstanceAssert, ensure, exactly_one};
use crate::{
    MessageIntent, ProcessMessageSubscriptionIntent, ProcessMessageSubscriptionRecordValue,
    PublishMessageResponse, RejectionType, Result, Source, StreamFilter,
};

/// Assertions on a published message.
#[derive(Clone)]
pub struct MessageAssert {
    message: PublishMessageResponse,
    source: Source,
}

impl MessageAssert {
    pub(crate) fn new(message: PublishMessageResponse, source: Source) -> Self {
        Self { message, source }
    }

    pub fn message_key(&self) -> i64 {
        self.message.message_key
    }

    fn correlations(&self) -> StreamFilter<ProcessMessageSubscriptionRecordValue> {
        StreamFilter::process_message_subscription(&self.source)
            .with_message_key(self.message_key())
            .with_rejection_type(RejectionType::NullVal)
            .with_intent(ProcessMessageSubscriptionIntent::Correlated)
    }

    fn expired(&self) -> bool {
        StreamFilter::message(&self.source)
            .with_key(self.message_key())
            .with_rejection_type(RejectionType::NullVal)
            .with_intent(MessageIntent::Expired)
            .exists()
    }

    pub fn has_been_correlated(&self) -> Result<&Self> {
        ensure(self.correlations().exists(), || {
            format!("Message with key {} was not correlated", self.message_key())
        })?;
        Ok(self)
    }

    pub fn has_not_been_correlated(&self) -> Result<&Self> {
        let correlation = self.correlations().first();
        ensure(correlation.is_none(), || {
            let process_instance_key = correlation
                .as_ref()
                .map_or(-1, |r| r.value().process_instance_key);
            format!(
                "Message with key {} was correlated to process instance {process_instance_key}",
                self.message_key()
            )
        })?;
        Ok(self)
    }

    pub fn has_expired(&self) -> Result<&Self> {
        ensure(self.expired(), || {
            format!("Message with key {} was not expired", self.message_key())
        })?;
        Ok(self)
    }

    pub fn has_not_expired(&self) -> Result<&Self> {
        ensure(!self.expired(), || {
            format!("Message with key {} was expired", self.message_key())
        })?;
        Ok(self)
    }

    /// Switch to the one process instance this message was correlated to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cardinality`](crate::Error::Cardinality) when the
    /// message has no correlation or more than one.
    pub fn extracting_process_instance(&self) -> Result<ProcessInstanceAssert> {
        let message_key = self.message_key();
        let instance_keys: Vec<i64> = self
            .correlations()
            .stream()
            .map(|r| r.value().process_instance_key)
            .collect();
        let process_instance_key = exactly_one(instance_keys, |key| *key, || {
            format!("correlated process instance for message key {message_key}")
        })?;
        tracing::trace!(message_key, process_instance_key, "extracted process instance");
        Ok(ProcessInstanceAssert::new(
            process_instance_key,
            self.source.clone(),
        ))
    }
}

impl fmt::Debug for MessageAssert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageAssert")
            .field("message_key", &self.message.message_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, MessageRecordValue, Record, RecordLog};

    const MESSAGE: i64 = 42;

    fn correlated(key: i64, process_instance_key: i64) -> Record {
        Record::new(
            key,
            ProcessMessageSubscriptionIntent::Correlated,
            ProcessMessageSubscriptionRecordValue {
                process_instance_key,
                message_key: MESSAGE,
                message_name: "order-paid".into(),
                ..Default::default()
            },
        )
    }

    fn published() -> (RecordLog, MessageAssert) {
        let log = RecordLog::new();
        log.append(Record::new(
            MESSAGE,
            MessageIntent::Published,
            MessageRecordValue {
                name: "order-paid".into(),
                correlation_key: "order-1".into(),
                ..Default::default()
            },
        ))
        .unwrap();
        let message = MessageAssert::new(
            PublishMessageResponse {
                message_key: MESSAGE,
            },
            log.source(),
        );
        (log, message)
    }

    #[test]
    fn uncorrelated_message() {
        let (_log, message) = published();
        message
            .has_not_been_correlated()
            .and_then(|m| m.has_not_expired())
            .unwrap();
        assert_eq!(
            message.has_been_correlated().unwrap_err().to_string(),
            "Message with key 42 was not correlated"
        );
        assert!(matches!(
            message.extracting_process_instance(),
            Err(Error::Cardinality { found: 0, .. })
        ));
    }

    #[test]
    fn correlated_message_names_the_instance() {
        let (log, message) = published();
        log.append(correlated(200, 7)).unwrap();

        message.has_been_correlated().unwrap();
        assert_eq!(
            message.has_not_been_correlated().unwrap_err().to_string(),
            "Message with key 42 was correlated to process instance 7"
        );
        let instance = message.extracting_process_instance().unwrap();
        assert_eq!(instance.process_instance_key(), 7);
    }

    #[test]
    fn rejected_correlation_does_not_count() {
        let (log, message) = published();
        log.append(correlated(200, 7).rejected(RejectionType::InvalidState, "closed")).unwrap();
        message.has_not_been_correlated().unwrap();
    }

    #[test]
    fn extraction_fails_on_several_correlations() {
        let (log, message) = published();
        log.append(correlated(200, 7)).unwrap();
        log.append(correlated(201, 8)).unwrap();
        let err = message.extracting_process_instance().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected to find one correlated process instance for message key 42 but found 2: [7, 8]"
        );
    }

    #[test]
    fn expiry() {
        let (log, message) = published();
        assert_eq!(
            message.has_expired().unwrap_err().to_string(),
            "Message with key 42 was not expired"
        );
        log.append(Record::new(
            MESSAGE,
            MessageIntent::Expired,
            MessageRecordValue::default(),
        ))
        .unwrap();
        message.has_expired().unwrap();
        assert_eq!(
            message.has_not_expired().unwrap_err().to_string(),
            "Message with key 42 was expired"
        );
    }
}
