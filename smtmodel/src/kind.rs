use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs, FromRepr};

use crate::error::{ModelError, ModelResult};

/// Engine-side term identifier. Valid terms are non-negative.
pub type TermId = i32;

/// Engine-side type identifier. Valid types are non-negative.
pub type TypeId = i32;

/// Tag of a node in a model's value table.
///
/// Discriminants follow the engine's value tags. The single `Rational` tag covers
/// every arithmetic leaf: integers and non-integral rationals alike are decoded
/// through it. Tag 3 (algebraic numbers) is not carried and is rejected.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    FromRepr,
    Display,
    EnumIs,
    Serialize,
    Deserialize,
)]
#[repr(i32)]
pub enum ValueKind {
    Unknown = 0,
    Bool = 1,
    Rational = 2,
    Bitvector = 4,
    Scalar = 5,
    Tuple = 6,
    Function = 7,
    Mapping = 8,
}

impl ValueKind {
    /// Convert a raw tag, rejecting anything outside the fixed set.
    #[inline]
    pub fn from_tag(tag: i32) -> ModelResult<Self> {
        Self::from_repr(tag).ok_or(ModelError::InvalidTag(tag))
    }

    #[inline]
    pub const fn tag(self) -> i32 {
        self as i32
    }

    /// Tuple, function and mapping nodes have children; everything else is a leaf.
    #[inline]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Tuple | Self::Function | Self::Mapping)
    }
}

/// Validate a raw tag coming from a caller.
pub fn get_kind(tag: i32) -> ModelResult<ValueKind> {
    ValueKind::from_tag(tag)
}

/// Coordinate of a node inside a model: a kind tag plus an index.
///
/// A handle owns nothing. It stays meaningful only while the model it came from
/// is alive, and equality is purely structural on `(kind, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueHandle {
    pub kind: ValueKind,
    pub id: u32,
}

impl ValueHandle {
    /// Filler for output buffers before they are written.
    pub const PLACEHOLDER: Self = Self {
        kind: ValueKind::Unknown,
        id: 0,
    };

    #[inline]
    pub const fn new(kind: ValueKind, id: u32) -> Self {
        Self { kind, id }
    }

    /// Build from raw caller values; the tag is checked before anything else.
    pub fn from_raw(tag: i32, id: i32) -> ModelResult<Self> {
        let kind = ValueKind::from_tag(tag)?;
        let id = u32::try_from(id).map_err(|_| ModelError::InvalidHandle {
            kind,
            id: id as i64,
        })?;
        Ok(Self { kind, id })
    }

    #[inline]
    pub const fn tag(&self) -> i32 {
        self.kind.tag()
    }
}

impl std::fmt::Display for ValueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}: {}>", self.kind, self.id)
    }
}
