// crates/reeldeck-core/src/ids.rs
//
// Typed id newtypes. The data model mixes ids for several unrelated entity
// kinds (media item, track, timeline item, project); a raw `Uuid` lets one
// slip into the wrong `HashMap` lookup without a compile error. Each newtype
// is `Copy` and serializes as the plain UUID string so the wire format
// (§6 — "ids are UUIDv4 strings") is unaffected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_id!(MediaId);
typed_id!(TrackId);
typed_id!(TimelineItemId);
typed_id!(ProjectId);
typed_id!(CommandId);
