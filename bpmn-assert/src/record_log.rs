use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockWriteGuard},
    time::{SystemTime, UNIX_EPOCH},
};

use tokio::sync::watch;

use crate::{Config, Error, Expectation, Record, RecordStreamSource, Records, Result, Source};

/// In-memory, append-only record history.
///
/// `RecordLog` is the adapter an engine (or a test double) writes into and
/// assertions read from. Cloning a log yields another handle to the same
/// history.
///
/// Reads hand out copy-on-write snapshots: a snapshot taken by a query is
/// never affected by records appended afterwards, and appending never blocks
/// on readers holding old snapshots.
///
/// # Example
///
/// ```rust
/// use bpmn_assert::{MessageIntent, MessageRecordValue, Record, RecordLog, StreamFilter};
///
/// # fn main() -> bpmn_assert::Result {
/// let log = RecordLog::new();
/// let source = log.source();
///
/// log.append(Record::new(42, MessageIntent::Published, MessageRecordValue::default()))?;
///
/// assert_eq!(StreamFilter::message(&source).with_key(42).count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RecordLog {
    inner: Arc<Inner>,
}

struct Inner {
    records: RwLock<Records>,
    appended: watch::Sender<usize>,
    config: Config,
}

impl Inner {
    fn snapshot(&self) -> Records {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&records)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, mut records: RwLockWriteGuard<'_, Records>, record: Record) -> Record {
        let record = if record.timestamp() == 0 {
            record.with_timestamp(now_millis())
        } else {
            record
        };
        Arc::make_mut(&mut *records).push(record.clone());
        let len = records.len();
        drop(records);

        tracing::trace!(
            position = record.position(),
            value_type = %record.value_type(),
            intent = %record.intent(),
            key = record.key(),
            "record appended"
        );
        self.appended.send_replace(len);
        record
    }
}

impl RecordStreamSource for Inner {
    fn records(&self) -> Records {
        self.snapshot()
    }
}

impl fmt::Debug for RecordLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordLog")
            .field("records", &self.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Default for RecordLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordLog {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let (appended, _) = watch::channel(0);
        let records = Arc::new(Vec::with_capacity(config.initial_capacity()));
        Self {
            inner: Arc::new(Inner {
                records: RwLock::new(records),
                appended,
                config,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns a shared source handle for filters and assertions.
    pub fn source(&self) -> Source {
        let source: Source = self.inner.clone();
        source
    }

    /// Returns the current history.
    pub fn snapshot(&self) -> Records {
        self.inner.snapshot()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Position of the most recent record, if any.
    pub fn last_position(&self) -> Option<u64> {
        self.snapshot().last().map(Record::position)
    }

    /// Append a record at the next position and return it as stored.
    ///
    /// Positions start at 1. A zero timestamp is replaced by the current
    /// wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionExhausted`] if the last record already sits
    /// at `u64::MAX`.
    pub fn append(&self, record: Record) -> Result<Record> {
        let records = self.inner.write();
        let position = match records.last() {
            None => 1,
            Some(last) => last
                .position()
                .checked_add(1)
                .ok_or(Error::PositionExhausted {
                    last: last.position(),
                })?,
        };
        Ok(self.inner.commit(records, record.with_position(position)))
    }

    /// Append a record that already carries its position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionOutOfOrder`] if the position does not exceed
    /// the last one in the log.
    pub fn push(&self, record: Record) -> Result<Record> {
        let records = self.inner.write();
        let last = records.last().map_or(0, Record::position);
        if record.position() <= last {
            return Err(Error::PositionOutOfOrder {
                last,
                position: record.position(),
            });
        }
        Ok(self.inner.commit(records, record))
    }

    /// Push several positioned records, stopping at the first out-of-order one.
    pub fn extend(&self, records: impl IntoIterator<Item = Record>) -> Result {
        for record in records {
            self.push(record)?;
        }
        Ok(())
    }

    /// Return a condition-based wait builder.
    ///
    /// The condition is evaluated against the live source now and after every
    /// append until it returns `true`. If the configured timeout expires first,
    /// the wait fails with [`Error::SettleTimeout`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// log.settle_on(|source| {
    ///     StreamFilter::process_instance(source)
    ///         .with_intent(ProcessInstanceIntent::ElementCompleted)
    ///         .with_bpmn_element_type(BpmnElementType::Process)
    ///         .exists()
    /// })
    /// .within(Duration::from_secs(3))
    /// .await?;
    /// ```
    pub fn settle_on<F>(&self, condition: F) -> Expectation<'_, F>
    where
        F: Fn(&Source) -> bool,
    {
        Expectation::new(self, condition)
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<usize> {
        self.inner.appended.subscribe()
    }

    /// Export the history as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns any serialization error produced by `serde_json`.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self.snapshot().as_slice())
    }
}

impl RecordStreamSource for RecordLog {
    fn records(&self) -> Records {
        self.snapshot()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
