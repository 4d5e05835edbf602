use rkyv::{Archive, Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize)]
        #[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        #[archive(check_bytes)]
        #[repr(transparent)] // Same layout as u32
        pub struct $name(pub u32);

        impl $name {
            pub const fn new(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(LexemeId, "Stable identifier of a vocabulary entry.");
define_id!(RuleId, "Identifier of a grammar rule.");
define_id!(SectionId, "Identifier of a practice section inside a chapter.");
define_id!(ChapterId, "Identifier of a curriculum chapter.");
define_id!(PackId, "Identifier of a supplementary vocabulary pack.");
define_id!(ExerciseId, "Identifier of a generated exercise, unique within a session.");

impl ExerciseId {
    /// Shifts the id out of the live-session range while keeping it traceable to its source.
    pub const fn offset(self, by: u32) -> Self {
        Self(self.0.wrapping_add(by))
    }
}
