//! Identifier newtypes
//!
//! Ids are opaque strings assigned by the persistence layer. Wrapping them keeps
//! a target id from being passed where an observation id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get reference to inner string
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Extract inner String, consuming self
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id!(
    /// Id of a single recorded observation
    ObservationId
);

string_id!(
    /// Id of a tracked target (behavior or skill)
    TargetId
);

string_id!(
    /// Id of the treatment program a target belongs to
    ProgramId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = TargetId::from("t-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t-1\"");

        let back: TargetId = serde_json::from_str("\"t-1\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(back, "t-1");
    }

    #[test]
    fn test_ids_order_by_string() {
        let mut ids = vec![ObservationId::from("b"), ObservationId::from("a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
    }
}
