//! Maps ATOM records into their SARR shape.

use serde_json::Value;

use crate::{EntityKind, Record};

/// Produces the SARR form of `atom`: every field is copied, except that the entity's singular
/// nested field is replaced by its plural field holding that one value as a one-element array.
///
/// The input is never modified. A record missing the singular field is copied unchanged.
pub fn to_sarr(atom: &Record, kind: EntityKind) -> Record {
    let mut sarr = atom.clone();
    if let Some(single) = sarr.remove(kind.singular_field()) {
        sarr.insert(kind.plural_field(), Value::Array(vec![single]));
    }
    sarr
}
