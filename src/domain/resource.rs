//! Remote resource representation
//!
//! The registry returns entities as JSON objects. Registrar never edits them;
//! a resource is only ever replaced by the mapping a later call returns.

use super::errors::{RegistrarError, RemoteError};
use super::result::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names that carry a registry identity, in lookup order
pub const REGISTRY_IDENTITY_FIELDS: [&str; 2] = ["entityRegistryId", "registryId"];

/// A server-side entity (blob, task, sequence, composite record)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteResource(Map<String, Value>);

impl RemoteResource {
    /// Wraps a JSON value, failing if it is not an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(RegistrarError::Remote(RemoteError::InvalidResponse(
                format!("expected a JSON object, got {other}"),
            ))),
        }
    }

    /// Server-assigned `id`, if present
    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    /// Server-assigned `id`, or an `InvalidResponse` error naming `context`
    pub fn require_id(&self, context: &str) -> Result<&str> {
        self.id().ok_or_else(|| {
            RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                "{context} response has no id"
            )))
        })
    }

    /// Name of the entity, if present
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Canonical registry identity, populated only once the entity is registered
    pub fn registry_identity(&self) -> Option<&str> {
        REGISTRY_IDENTITY_FIELDS
            .iter()
            .find_map(|field| self.str_field(field))
    }

    /// Registry identity read from one specific field
    pub fn registry_identity_in(&self, field: &str) -> Option<&str> {
        self.str_field(field)
    }

    /// True once the entity carries a non-null registry identity
    pub fn is_registered(&self) -> bool {
        self.registry_identity().is_some()
    }

    /// String value of a top-level field; null and non-strings read as `None`
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Raw value of a top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Consume into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Extract a list of resources stored under `key` in a response body
pub fn resources_under(body: &Value, key: &str) -> Result<Vec<RemoteResource>> {
    let items = body.get(key).and_then(Value::as_array).ok_or_else(|| {
        RegistrarError::Remote(RemoteError::InvalidResponse(format!(
            "response has no '{key}' array"
        )))
    })?;

    items.iter().cloned().map(RemoteResource::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registered_resource() {
        let res = RemoteResource::from_value(json!({
            "id": "prtn_1",
            "name": "Heavy Chain for AB-1",
            "entityRegistryId": "CHAIN001"
        }))
        .unwrap();

        assert_eq!(res.id(), Some("prtn_1"));
        assert_eq!(res.registry_identity(), Some("CHAIN001"));
        assert!(res.is_registered());
    }

    #[test]
    fn test_null_registry_identity_is_unregistered() {
        let res = RemoteResource::from_value(json!({
            "id": "prtn_2",
            "entityRegistryId": null
        }))
        .unwrap();

        assert!(!res.is_registered());
        assert_eq!(res.registry_identity(), None);
    }

    #[test]
    fn test_registry_id_field_fallback() {
        let res = RemoteResource::from_value(json!({"id": "x", "registryId": "REG1"})).unwrap();
        assert_eq!(res.registry_identity(), Some("REG1"));
        assert_eq!(res.registry_identity_in("entityRegistryId"), None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(RemoteResource::from_value(json!([1, 2])).is_err());
        assert!(RemoteResource::from_value(json!("id")).is_err());
    }

    #[test]
    fn test_require_id() {
        let res = RemoteResource::from_value(json!({"name": "n"})).unwrap();
        let err = res.require_id("create chain").unwrap_err();
        assert!(err.to_string().contains("create chain"));
    }

    #[test]
    fn test_resources_under() {
        let body = json!({"aaSequences": [{"id": "a"}, {"id": "b"}]});
        let list = resources_under(&body, "aaSequences").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].id(), Some("b"));

        assert!(resources_under(&body, "customEntities").is_err());
    }
}
