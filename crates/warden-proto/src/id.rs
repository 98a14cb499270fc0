//! Strongly typed identifiers.
//!
//! Platforms hand out numeric ids for users, groups and messages. Wrapping
//! them keeps a user id from being passed where a group id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(
        $(#[$meta:meta])*
        $name:ident
    ),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub i64);

            impl $name {
                /// The raw numeric value.
                #[inline]
                pub fn get(self) -> i64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<i64> for $name {
                fn from(value: i64) -> Self {
                    Self(value)
                }
            }

            impl std::str::FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.trim().parse().map(Self)
                }
            }
        )*
    };
}

numeric_id! {
    /// A platform account.
    UserId,
    /// A group chat.
    GroupId,
    /// A single message, unique across groups.
    MessageId,
}
