//! Strongly-typed identifiers
//!
//! Server ids are plain integers on the wire. Each kind gets its own newtype so a
//! token id can never be passed where a boundary id is expected.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw integer value
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| ModelError::InvalidId(s.to_string()))
            }
        }
    };
}

numeric_id!(
    /// Corpus unit (verse) id
    UnitId
);
numeric_id!(
    /// Token id, unique across the corpus token table
    TokenId
);
numeric_id!(
    /// Sentence boundary record id
    BoundaryId
);
numeric_id!(
    /// Server-side task id
    TaskId
);
numeric_id!(
    /// Annotation label id
    LabelId
);
numeric_id!(
    /// Annotator (user) id
    AnnotatorId
);

impl UnitId {
    /// Id of the following unit
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Key of a sentence grouping inside a unit
///
/// Serialized the way the server keys its `sentences` map: the boundary id as text,
/// or the literal `"extra"` for manually added tokens not yet assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PoolKey {
    /// A real sentence boundary
    Boundary(BoundaryId),
    /// The shared pool of manually added tokens
    Extra,
}

impl PoolKey {
    const EXTRA: &'static str = "extra";

    /// Boundary id, if this is not the extra pool
    #[inline]
    #[must_use]
    pub const fn boundary(self) -> Option<BoundaryId> {
        match self {
            Self::Boundary(id) => Some(id),
            Self::Extra => None,
        }
    }

    /// Whether this is the extra pool
    #[inline]
    #[must_use]
    pub const fn is_extra(self) -> bool {
        matches!(self, Self::Extra)
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boundary(id) => write!(f, "{id}"),
            Self::Extra => f.write_str(Self::EXTRA),
        }
    }
}

impl FromStr for PoolKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::EXTRA {
            Ok(Self::Extra)
        } else {
            s.parse().map(Self::Boundary)
        }
    }
}

impl TryFrom<String> for PoolKey {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PoolKey> for String {
    fn from(key: PoolKey) -> Self {
        key.to_string()
    }
}

impl From<BoundaryId> for PoolKey {
    #[inline]
    fn from(id: BoundaryId) -> Self {
        Self::Boundary(id)
    }
}
