pub mod batch;
pub mod error;
pub mod keys;
pub mod read;
pub mod stats;

pub use batch::range::{Range, RangeIter};
pub use batch::{BatchContext, FamilyId, KeyEntry, INLINE_KEYS, MAX_BATCH_SIZE};
pub use error::{Error, Result};
pub use keys::{LookupKey, SeqNo, ValueKind, MAX_SEQNO};
pub use read::coordinator::ReadCoordinator;
pub use read::{CleanupFn, CompletionFn, IoStatus, ReadBackend, ReadRequest, SharedReadRequest};
pub use stats::{NoopStats, ReadStats, TracingStats};
