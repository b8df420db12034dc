//! Wire-safe normalization.
//!
//! Store entities carry rich fields (timestamps, uuids, enumerations, nested
//! relations). [`to_primitive`] projects any serializable entity onto the
//! closed [`Value`] model: timestamps become canonical strings, uuids
//! hyphenated lower-case strings, enumerations their snake_case names, absent
//! optionals null.
//!
//! Because `Value` serializes to exactly the JSON it was read from,
//! normalizing an already-normalized value returns it unchanged.

use conductor_core::{json_to_value, Value};
use serde::Serialize;

use crate::{Error, Result};

/// Project an entity onto the wire value model.
pub fn to_primitive<T: Serialize + ?Sized>(entity: &T) -> Result<Value> {
    let json = serde_json::to_value(entity)
        .map_err(|e| Error::internal(format!("result is not serializable: {}", e)))?;
    json_to_value(&json).map_err(Error::internal)
}

/// Project each entity of a collection.
pub fn to_primitive_all<T: Serialize>(entities: &[T]) -> Result<Vec<Value>> {
    entities.iter().map(to_primitive).collect()
}
