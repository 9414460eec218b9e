//! Document identifiers.
//!
//! Every object document carries an `id` field equal to the final segment of
//! its key. On create the identifier is generated when absent; on replace it
//! is checked against (or injected from) the request address.

use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use lazyrest_store::{is_valid_segment, Document, Key};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{RestError, RestResult};

/// Name of the identifier field inside object documents.
pub const ID_FIELD: &str = "id";

/// Random bytes per generated identifier (14 base64 characters).
pub const ID_BYTES: usize = 10;

/// Generate a fresh identifier from the operating system's secure RNG.
pub fn generate_id() -> RestResult<String> {
    generate_id_with(&mut OsRng)
}

/// Generate an identifier from `rng`: URL-safe base64 without padding.
pub fn generate_id_with<R: RngCore + ?Sized>(rng: &mut R) -> RestResult<String> {
    let mut bytes = [0u8; ID_BYTES];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| RestError::Identifier(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Turn a create request body into the documents to store under
/// `collection`.
///
/// The body must be one object or an array of objects. Objects without an
/// `id` get a generated one. Nothing is returned unless every item is
/// usable, so a bad item aborts the whole batch before any write. Items that
/// share an `id` collapse into the last one.
pub fn prepare_batch(collection: &Key, body: &[u8]) -> RestResult<Vec<(Key, Document)>> {
    let parsed: Document = serde_json::from_slice(body).map_err(RestError::InvalidJson)?;
    let items = match parsed {
        Document::Array(items) => items,
        object @ Document::Object(_) => vec![object],
        other => {
            return Err(RestError::InvalidBatch(format!(
                "expected an object or an array of objects, got {}",
                kind(&other)
            )))
        }
    };

    let mut batch: Vec<(Key, Document)> = Vec::with_capacity(items.len());
    let mut positions: HashMap<Key, usize> = HashMap::new();

    for (index, item) in items.into_iter().enumerate() {
        let mut fields = match item {
            Document::Object(fields) => fields,
            other => {
                return Err(RestError::InvalidBatch(format!(
                    "item {index} is {}, expected an object",
                    kind(&other)
                )))
            }
        };

        let id = match fields.get(ID_FIELD) {
            None => {
                let id = generate_id()?;
                fields.insert(ID_FIELD.to_string(), Document::String(id.clone()));
                id
            }
            Some(Document::String(id)) if is_valid_segment(id) => id.clone(),
            Some(other) => {
                return Err(RestError::InvalidBatch(format!(
                    "item {index} has an unusable id {other}"
                )))
            }
        };

        let key = collection.child(&id);
        let document = Document::Object(fields);
        match positions.get(&key) {
            Some(&position) => batch[position].1 = document,
            None => {
                positions.insert(key.clone(), batch.len());
                batch.push((key, document));
            }
        }
    }

    Ok(batch)
}

/// Reconcile a replace body with the resource address `key`.
///
/// Object bodies must carry an `id` equal to the last key segment, or none
/// at all, in which case it is injected. Other JSON values pass through.
pub fn reconcile(key: &Key, body: Document) -> RestResult<Document> {
    let expected = key.last().ok_or(RestError::MissingIdentifier)?;

    match body {
        Document::Object(mut fields) => {
            match fields.get(ID_FIELD) {
                None => {
                    fields.insert(ID_FIELD.to_string(), Document::String(expected.to_string()));
                }
                Some(Document::String(id)) if id == expected => {}
                Some(other) => {
                    return Err(RestError::IdMismatch {
                        found: other.as_str().map_or_else(|| other.to_string(), str::to_string),
                        expected: expected.to_string(),
                    })
                }
            }
            Ok(Document::Object(fields))
        }
        other => Ok(other),
    }
}

fn kind(value: &Document) -> &'static str {
    match value {
        Document::Null => "null",
        Document::Bool(_) => "a boolean",
        Document::Number(_) => "a number",
        Document::String(_) => "a string",
        Document::Array(_) => "an array",
        Document::Object(_) => "an object",
    }
}
