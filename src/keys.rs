use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use smallvec::SmallVec;

/// Sequence number assigned to every write; lookups carry the read-point
/// sequence they must not see past.
pub type SeqNo = u64;

/// Sequence numbers occupy the upper 56 bits of the 8-byte internal-key
/// trailer; the low byte holds the record kind.
pub const MAX_SEQNO: SeqNo = (1 << 56) - 1;

const TAG_LEN: usize = 8;

// Keys up to this length encode without touching the heap.
const INLINE_KEY_LEN: usize = 64;

/// Record kind carried in the internal-key trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Deletion = 0,
    Value = 1,
    Merge = 2,
}

impl ValueKind {
    /// The kind lookups seek with: the highest kind, so a lookup tag
    /// covers every record kind written at the same sequence.
    pub fn for_seek() -> Self {
        ValueKind::Merge
    }

    pub fn from_u8(kind: u8) -> Option<Self> {
        match kind {
            0 => Some(ValueKind::Deletion),
            1 => Some(ValueKind::Value),
            2 => Some(ValueKind::Merge),
            _ => None,
        }
    }
}

/// Packs a sequence number and record kind into the 8-byte trailer value.
pub fn pack_tag(seq: SeqNo, kind: ValueKind) -> u64 {
    debug_assert!(seq <= MAX_SEQNO, "sequence {} overflows the tag", seq);
    (seq << 8) | kind as u64
}

/// Splits a trailer value back into sequence number and record kind.
pub fn unpack_tag(tag: u64) -> (SeqNo, Option<ValueKind>) {
    (tag >> 8, ValueKind::from_u8((tag & 0xff) as u8))
}

/// The derived internal lookup form of one user key: the user key bytes
/// followed by the big-endian trailer for the read point. Owns its
/// buffer; short keys stay inline, longer ones spill to the heap.
#[derive(Debug)]
pub struct LookupKey {
    data: SmallVec<[u8; INLINE_KEY_LEN]>,
    user_len: usize,
}

impl LookupKey {
    pub fn new(user_key: &[u8], read_point: SeqNo) -> Self {
        let mut data = SmallVec::with_capacity(user_key.len() + TAG_LEN);
        data.extend_from_slice(user_key);
        data.write_u64::<BigEndian>(pack_tag(read_point, ValueKind::for_seek()))
            .unwrap();
        Self {
            data,
            user_len: user_key.len(),
        }
    }

    /// The user key portion.
    pub fn user_key(&self) -> &[u8] {
        &self.data[..self.user_len]
    }

    /// The full internal key: user key plus trailer.
    pub fn internal_key(&self) -> &[u8] {
        &self.data
    }

    /// The read-point sequence this lookup was derived for.
    pub fn sequence(&self) -> SeqNo {
        let mut trailer = &self.data[self.user_len..];
        trailer.read_u64::<BigEndian>().unwrap() >> 8
    }
}
