//! Domain identifier types with validation
//!
//! Newtype wrappers for the server-assigned identifiers Registrar passes
//! around. They only guarantee non-emptiness; the registry owns the format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! registry_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", $label, " from a string")]
            ///
            /// Returns `Err` if the identifier is empty or whitespace.
            pub fn new(id: impl Into<String>) -> Result<Self, String> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(format!("{} cannot be empty", $label));
                }
                Ok(Self(id))
            }

            /// Returns the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes self and returns the inner String
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

registry_id!(
    /// Identifier of a blob, assigned when an upload starts
    ///
    /// # Examples
    ///
    /// ```
    /// use registrar::domain::ids::BlobId;
    ///
    /// let blob_id = BlobId::new("c33fe52d-fe6a-4c98-adcd-211bdf6778f7").unwrap();
    /// assert_eq!(blob_id.as_str(), "c33fe52d-fe6a-4c98-adcd-211bdf6778f7");
    /// ```
    BlobId,
    "Blob ID"
);

registry_id!(
    /// Handle of an asynchronous server-side task
    TaskId,
    "Task ID"
);

registry_id!(
    /// Identifier of a registry
    RegistryId,
    "Registry ID"
);

registry_id!(
    /// Identifier of an entity schema
    SchemaId,
    "Schema ID"
);

registry_id!(
    /// Identifier of a folder
    FolderId,
    "Folder ID"
);
