//! Link directions and the direction transition table.
//!
//! A link is `TO`, `FROM`, or `BIDIRECTIONAL`. `TO` and `FROM` are each
//! other's inverse; `BIDIRECTIONAL` is its own mirror.
//!
//! Every direction-dependent decision the manager makes goes through
//! [`plan_create`] or [`plan_remove`]:
//!
//! ```text
//! create:  existing \ requested |  TO / FROM      | BIDIRECTIONAL
//!          ---------------------+-----------------+-------------------
//!          none                 |  Insert         | InvalidDirection
//!          BIDIRECTIONAL        |  Reaffirm       | InvalidDirection
//!          TO / FROM            |  Unchanged      | InvalidDirection
//!
//! remove:  stored \ requested   |  same single    | other single      | BIDIRECTIONAL
//!          ---------------------+-----------------+-------------------+--------------
//!          TO / FROM            |  RemoveBoth     | DirectionMismatch | RemoveBoth
//!          BIDIRECTIONAL        |  Split          | Split             | RemoveBoth
//! ```
//!
//! `TO` meeting `FROM` on create is left unchanged rather than merged into
//! `BIDIRECTIONAL`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, ValidationError};

/// Direction of a link, seen from the list that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// The root points at the target.
    To,
    /// The target points at the root.
    From,
    /// Both of the above.
    Bidirectional,
}

impl Direction {
    /// All directions, in storage-code order.
    pub const ALL: [Self; 3] = [Self::To, Self::From, Self::Bidirectional];

    /// The direction the mirror record holds.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::To => Self::From,
            Self::From => Self::To,
            Self::Bidirectional => Self::Bidirectional,
        }
    }

    /// Short code used in the storage encoding.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::To => 'T',
            Self::From => 'F',
            Self::Bidirectional => 'B',
        }
    }

    /// Inverse of [`Direction::code`].
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'T' => Some(Self::To),
            'F' => Some(Self::From),
            'B' => Some(Self::Bidirectional),
            _ => None,
        }
    }

    /// Returns true for `TO` and `FROM`.
    #[must_use]
    pub const fn is_single(self) -> bool {
        !matches!(self, Self::Bidirectional)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::To => write!(f, "TO"),
            Self::From => write!(f, "FROM"),
            Self::Bidirectional => write!(f, "BIDIRECTIONAL"),
        }
    }
}

impl FromStr for Direction {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("to") {
            Ok(Self::To)
        } else if s.eq_ignore_ascii_case("from") {
            Ok(Self::From)
        } else if s.eq_ignore_ascii_case("bidirectional") {
            Ok(Self::Bidirectional)
        } else {
            Err(CodecError::UnknownDirection {
                value: s.to_string(),
            })
        }
    }
}

/// What a single-sided create should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePlan {
    /// No record targets the entity yet; insert a fresh one.
    Insert,
    /// A `BIDIRECTIONAL` record exists; rewrite it as `BIDIRECTIONAL` and report no change.
    Reaffirm,
    /// A single-direction record exists; leave it alone and report no change.
    Unchanged,
}

/// What a two-sided removal should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovePlan {
    /// Delete the record on both endpoints.
    RemoveBoth,
    /// Keep the remaining half of a bidirectional link on both endpoints.
    Split {
        /// New direction of the root's record.
        local: Direction,
        /// New direction of the mirror record.
        mirror: Direction,
    },
}

/// Decides a single-sided create.
///
/// # Errors
/// Returns [`ValidationError::InvalidDirection`] when `requested` is
/// `BIDIRECTIONAL`; that state is never requested directly.
pub fn plan_create(
    existing: Option<Direction>,
    requested: Direction,
) -> Result<CreatePlan, ValidationError> {
    if requested == Direction::Bidirectional {
        return Err(ValidationError::InvalidDirection {
            direction: requested,
        });
    }

    Ok(match existing {
        None => CreatePlan::Insert,
        Some(Direction::Bidirectional) => CreatePlan::Reaffirm,
        Some(_) => CreatePlan::Unchanged,
    })
}

/// Decides a removal of `requested` from a record stored as `stored`.
///
/// # Errors
/// Returns [`ValidationError::DirectionMismatch`] when a single direction is
/// requested from a record holding only the other single direction.
pub fn plan_remove(stored: Direction, requested: Direction) -> Result<RemovePlan, ValidationError> {
    match (stored, requested) {
        (s, r) if s == r => Ok(RemovePlan::RemoveBoth),
        (_, Direction::Bidirectional) => Ok(RemovePlan::RemoveBoth),
        (Direction::Bidirectional, r) => Ok(RemovePlan::Split {
            local: r.inverse(),
            mirror: r,
        }),
        (s, r) => Err(ValidationError::DirectionMismatch {
            stored: s,
            requested: r,
        }),
    }
}
