pub mod range;

use std::any::Any;
use std::cell::Cell;

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::keys::{LookupKey, SeqNo};
use self::range::Range;

/// Hard capacity bound for a batch: the width of the resolved mask.
/// Exceeding it is a contract violation, rejected at construction.
pub const MAX_BATCH_SIZE: usize = 64;

/// Lookup keys for batches up to this many keys are stored inline in the
/// context; larger batches spill the arena to a single heap region.
pub const INLINE_KEYS: usize = 32;

/// Column family a key belongs to.
pub type FamilyId = u32;

/// Per-key scratch record for one lookup in a batch. The caller owns the
/// array and its sort order; pipeline stages fill the fields in as the
/// key moves through memtable probe, filter check, and block fetch.
pub struct KeyEntry {
    /// Target user key.
    pub key: Vec<u8>,
    pub family: FamilyId,
    /// Merge fragments accumulated across data sources, newest first.
    pub merge_operands: Vec<Vec<u8>>,
    /// Sequence of the newest range deletion covering this key, if any.
    pub max_covering_tombstone_seq: SeqNo,
    pub key_exists: bool,
    /// Sequence the key resolved at.
    pub seq: SeqNo,
    /// Opaque argument a stage may thread through to its callbacks.
    pub stage_arg: Option<Box<dyn Any>>,
    /// Result slot.
    pub value: Option<Vec<u8>>,
    /// Status slot; a failure here never affects sibling keys.
    pub status: Option<Error>,
}

impl KeyEntry {
    pub fn new(key: Vec<u8>, family: FamilyId) -> Self {
        Self {
            key,
            family,
            merge_operands: Vec::new(),
            max_covering_tombstone_seq: 0,
            key_exists: false,
            seq: 0,
            stage_arg: None,
            value: None,
            status: None,
        }
    }
}

/// Shared state for one batched lookup: the derived lookup-key arena and
/// the batch-wide resolved mask. Pipeline stages work on the batch
/// through [`Range`] views; completions recorded by any view are
/// immediately visible to all of them.
///
/// The context addresses keys by their position in the caller's sorted
/// array. It copies each key into its derived lookup form at
/// construction and holds no references into the caller's array, so the
/// array stays free for stages to mutate by position.
pub struct BatchContext {
    // Inline for batches up to INLINE_KEYS, one heap region above that.
    // Dropped with the context.
    lookup_keys: SmallVec<[LookupKey; INLINE_KEYS]>,
    // One bit per batch position, set exactly once when the key's final
    // value is known, never cleared.
    resolved_mask: Cell<u64>,
    num_keys: usize,
}

impl BatchContext {
    /// Derives the lookup form of every key in the sorted batch for the
    /// given read point. Returns `Error::BatchTooLarge` for batches over
    /// [`MAX_BATCH_SIZE`] keys.
    pub fn new(sorted: &[KeyEntry], read_point: SeqNo) -> Result<Self> {
        if sorted.len() > MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge(sorted.len()));
        }
        debug_assert!(
            sorted.windows(2).all(|pair| pair[0].key <= pair[1].key),
            "batch keys must be sorted by the caller"
        );

        let mut lookup_keys = SmallVec::with_capacity(sorted.len());
        for entry in sorted {
            lookup_keys.push(LookupKey::new(&entry.key, read_point));
        }

        Ok(Self {
            lookup_keys,
            resolved_mask: Cell::new(0),
            num_keys: sorted.len(),
        })
    }

    pub fn num_keys(&self) -> usize {
        self.num_keys
    }

    /// The derived lookup form of the key at a batch position.
    pub fn lookup_key(&self, pos: usize) -> &LookupKey {
        &self.lookup_keys[pos]
    }

    /// A range spanning the whole batch with nothing skipped.
    pub fn full_range(&self) -> Range<'_> {
        Range::full(self)
    }

    pub(crate) fn is_resolved(&self, pos: usize) -> bool {
        self.resolved_mask.get() & (1u64 << pos) != 0
    }

    pub(crate) fn mark_resolved(&self, pos: usize) {
        self.resolved_mask.set(self.resolved_mask.get() | (1u64 << pos));
    }

    pub(crate) fn resolved_mask(&self) -> u64 {
        self.resolved_mask.get()
    }
}
