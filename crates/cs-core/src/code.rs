//! Hierarchical type codes.
//!
//! Phase types and task types are plain integers organized like an
//! accounting plan: a code is a sub-code of every decimal prefix of itself,
//! so `314` is a sub-code of `31` and of `3` (and of `314`).  Zero and
//! negative codes are "unclassified" and match nothing.

use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeCode(pub i32);

impl TypeCode {
    pub const NONE: TypeCode = TypeCode(0);

    /// `true` if `parent` is a decimal prefix of `self`.
    pub fn is_sub_code_of(self, parent: TypeCode) -> bool {
        if self.0 <= 0 || parent.0 <= 0 {
            return false;
        }
        let mut c = self.0;
        while c > parent.0 {
            c /= 10;
        }
        c == parent.0
    }

    /// `true` if `self` is a sub-code of any of `parents`.
    pub fn matches_any<'a>(self, parents: impl IntoIterator<Item = &'a TypeCode>) -> bool {
        parents.into_iter().any(|p| self.is_sub_code_of(*p))
    }

    /// The leading `level` digits, e.g. `TypeCode(314).sub_code(1) == 3`.
    /// Returns 0 for unclassified codes.
    pub fn sub_code(self, level: u32) -> i32 {
        if self.0 <= 0 || level == 0 {
            return 0;
        }
        let mut c = self.0;
        let limit = 10_i32.saturating_pow(level);
        while c >= limit {
            c /= 10;
        }
        c
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for TypeCode {
    fn from(n: i32) -> Self {
        TypeCode(n)
    }
}
