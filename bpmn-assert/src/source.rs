use std::sync::Arc;

use crate::Record;

/// An immutable snapshot of the record history, in emission order.
pub type Records = Arc<Vec<Record>>;

/// Shared handle to a record source, as held by filters and assertions.
pub type Source = Arc<dyn RecordStreamSource>;

/// Capability to read the current record history of an engine.
///
/// Implementations return everything emitted so far. Calling `records` again
/// later may return more records, never fewer or reordered ones. Callers
/// never mutate what they receive.
///
/// Implement this for an adapter around a real engine; [`RecordLog`](crate::RecordLog)
/// is the in-memory implementation.
pub trait RecordStreamSource: Send + Sync {
    fn records(&self) -> Records;
}

/// A fixed history, useful for replaying captured records.
impl RecordStreamSource for Vec<Record> {
    fn records(&self) -> Records {
        Arc::new(self.clone())
    }
}

impl RecordStreamSource for Records {
    fn records(&self) -> Records {
        Arc::clone(self)
    }
}
