//! Typed ID wrappers for type safety across imghost.
//!
//! IDs are short strings rather than UUIDs: the bootstrap admin is literally
//! `"admin"` and generated IDs appear in public file names.

use serde::{Deserialize, Serialize};

use crate::tokens::random_alphanumeric;

/// Length of generated user IDs.
pub const USER_ID_LEN: usize = 16;

/// Length of generated image IDs.
pub const IMAGE_ID_LEN: usize = 12;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a new random ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(random_alphanumeric($len))
            }

            /// Borrow the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a user.
    UserId,
    USER_ID_LEN
);

string_id!(
    /// Unique identifier for an uploaded image.
    ImageId,
    IMAGE_ID_LEN
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_lengths() {
        assert_eq!(UserId::generate().as_str().len(), USER_ID_LEN);
        assert_eq!(ImageId::generate().as_str().len(), IMAGE_ID_LEN);
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ImageId::generate(), ImageId::generate());
    }

    #[test]
    fn test_serde_transparent() {
        let id = UserId::from("admin");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"admin\"");
        let back: UserId = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display() {
        assert_eq!(ImageId::from("abc").to_string(), "abc");
    }
}
