//! DID document composition.
//!
//! The projection materializes a document by folding a version chain forward
//! from its genesis: the create payload is the initial document content,
//! updates and recoveries carry JSON patches, and a delete strips the
//! document down to its identifier. The patch operator is deliberately
//! minimal: a JSON merge patch (RFC 7386 semantics, where objects merge
//! recursively, `null` removes a field, and anything else replaces).

use crate::operation::{OperationEnvelope, OperationType};
use crate::types::OperationHash;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A materialized DID document.
///
/// The document's `id` is `did:<method>:<unique-portion>` where the unique
/// portion is the hash of the genesis create operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DidDocument {
    fields: Map<String, Value>,
}

impl DidDocument {
    /// Materialize the genesis document from a create payload.
    ///
    /// Returns `None` if the payload is not a JSON object; the version is
    /// then unresolvable, matching the projection's fail-to-`None` policy.
    pub fn from_create_payload(
        payload: &[u8],
        did_method_name: &str,
        unique_portion: &OperationHash,
    ) -> Option<Self> {
        let value: Value = serde_json::from_slice(payload).ok()?;
        let Value::Object(mut fields) = value else {
            return None;
        };
        fields.insert(
            "id".to_string(),
            Value::String(format!("did:{}:{}", did_method_name, unique_portion)),
        );
        Some(Self { fields })
    }

    /// The document identifier, if present.
    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    /// A field of the document body.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether the document has been deactivated (every field except the
    /// identifier removed).
    pub fn is_deactivated(&self) -> bool {
        self.fields.len() == 1 && self.fields.contains_key("id")
    }

    /// Produce the successor document for a non-create operation.
    ///
    /// Returns `None` for an inapplicable operation (a create, or a payload
    /// that is not the JSON shape the type requires).
    pub fn apply(&self, operation: &OperationEnvelope) -> Option<DidDocument> {
        match operation.op_type {
            OperationType::Create => None,
            OperationType::Update => {
                let patch: Value = serde_json::from_slice(&operation.encoded_payload).ok()?;
                let mut next = self.clone();
                merge_patch(&mut next.fields, patch.as_object()?);
                next.restore_id(self);
                Some(next)
            }
            OperationType::Recover => {
                let value: Value = serde_json::from_slice(&operation.encoded_payload).ok()?;
                let Value::Object(fields) = value else {
                    return None;
                };
                let mut next = DidDocument { fields };
                next.restore_id(self);
                Some(next)
            }
            OperationType::Delete => {
                let mut fields = Map::new();
                if let Some(id) = self.fields.get("id") {
                    fields.insert("id".to_string(), id.clone());
                }
                Some(DidDocument { fields })
            }
        }
    }

    // The identifier is derived from the genesis operation and is not
    // patchable.
    fn restore_id(&mut self, prior: &DidDocument) {
        match prior.fields.get("id") {
            Some(id) => {
                self.fields.insert("id".to_string(), id.clone());
            }
            None => {
                self.fields.remove("id");
            }
        }
    }
}

impl fmt::Display for DidDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.fields.clone()))
    }
}

/// JSON merge patch: objects merge recursively, `null` removes, everything
/// else replaces.
fn merge_patch(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, patch_value) in patch {
        match patch_value {
            Value::Null => {
                target.remove(key);
            }
            Value::Object(patch_object) => match target.get_mut(key) {
                Some(Value::Object(existing)) => merge_patch(existing, patch_object),
                _ => {
                    target.insert(key.clone(), Value::Object(patch_object.clone()));
                }
            },
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn genesis() -> DidDocument {
        let payload = json!({
            "publicKey": [{"id": "#key1", "type": "Ed25519"}],
            "service": {"hub": {"endpoint": "https://hub.example"}}
        });
        DidDocument::from_create_payload(
            payload.to_string().as_bytes(),
            "strata",
            &OperationHash::from_encoded("QmGenesis"),
        )
        .unwrap()
    }

    fn update_op(patch: Value) -> OperationEnvelope {
        OperationEnvelope::extend(
            OperationType::Update,
            OperationHash::from_encoded("QmPrev"),
            patch.to_string().into_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_assigns_did() {
        let doc = genesis();
        assert_eq!(doc.id(), Some("did:strata:QmGenesis"));
        assert!(doc.get("publicKey").is_some());
    }

    #[test]
    fn test_create_rejects_non_object_payload() {
        assert!(DidDocument::from_create_payload(
            b"[1,2,3]",
            "strata",
            &OperationHash::from_encoded("QmGenesis"),
        )
        .is_none());
    }

    #[test]
    fn test_update_merges_and_removes() {
        let doc = genesis();
        let patched = doc
            .apply(&update_op(json!({
                "service": {"hub": {"endpoint": "https://hub2.example"}},
                "publicKey": null,
                "alsoKnownAs": "alice"
            })))
            .unwrap();

        assert_eq!(
            patched.get("service"),
            Some(&json!({"hub": {"endpoint": "https://hub2.example"}}))
        );
        assert!(patched.get("publicKey").is_none());
        assert_eq!(patched.get("alsoKnownAs"), Some(&json!("alice")));
        // Identifier survives patching.
        assert_eq!(patched.id(), doc.id());
    }

    #[test]
    fn test_update_cannot_rewrite_id() {
        let doc = genesis();
        let patched = doc
            .apply(&update_op(json!({"id": "did:strata:QmForged"})))
            .unwrap();
        assert_eq!(patched.id(), Some("did:strata:QmGenesis"));
    }

    #[test]
    fn test_recover_replaces_body() {
        let doc = genesis();
        let recover = OperationEnvelope::extend(
            OperationType::Recover,
            OperationHash::from_encoded("QmPrev"),
            json!({"publicKey": [{"id": "#key2", "type": "Ed25519"}]})
                .to_string()
                .into_bytes(),
        )
        .unwrap();

        let recovered = doc.apply(&recover).unwrap();
        assert_eq!(recovered.id(), doc.id());
        assert!(recovered.get("service").is_none());
        assert_eq!(
            recovered.get("publicKey"),
            Some(&json!([{"id": "#key2", "type": "Ed25519"}]))
        );
    }

    #[test]
    fn test_delete_strips_to_id() {
        let doc = genesis();
        let delete = OperationEnvelope::extend(
            OperationType::Delete,
            OperationHash::from_encoded("QmPrev"),
            vec![],
        )
        .unwrap();

        let deleted = doc.apply(&delete).unwrap();
        assert!(deleted.is_deactivated());
        assert_eq!(deleted.id(), doc.id());
    }
}
