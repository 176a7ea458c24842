//! Strongly typed, zero-cost identifier wrappers.
//!
//! Two flavours exist.  *Key* ids (`TaskId`, `CrewmanId`, `PhaseId`) are the
//! user-visible integers of the data set; they are signed because the engine
//! reserves negative task ids for its internal phase-duration tasks.  *Arena*
//! ids (`OccurrenceId`) index a `Vec` owned by the engine and expose
//! `.index()` for that purpose.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    // Arena index: adds `index()` and `usize` conversions.
    (arena $(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        typed_id!($(#[$attr])* $vis struct $name($inner););

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };

    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$inner> for $name {
            #[inline(always)]
            fn from(n: $inner) -> $name {
                $name(n)
            }
        }
    };
}

typed_id! {
    /// Identifier of a task definition, unique within one expanded task table.
    pub struct TaskId(i32);
}

typed_id! {
    /// Identifier of a crew member.
    pub struct CrewmanId(i32);
}

typed_id! {
    /// Identifier of a phase; assigned sequentially from 1 before the first run.
    pub struct PhaseId(i32);
}

typed_id! {
    arena
    /// Index of one task occurrence in the engine's per-replication arena.
    pub struct OccurrenceId(u32);
}

impl TaskId {
    /// Id of the synthetic task that holds `phase` open for its sampled duration.
    #[inline]
    pub fn phase_duration(phase: PhaseId) -> TaskId {
        TaskId(-phase.0)
    }

    /// `true` for ids the engine reserves for its own tasks.
    #[inline]
    pub fn is_internal(self) -> bool {
        self.0 < 0
    }
}
