//! SQL++ statement text for the ShopALot workloads.
//!
//! Datasets live in the `ShopALot.ATOM` and `ShopALot.SARR` dataverses. Insert and upsert
//! batches go through a `<Dataset>Buffer` dataset first, so the timed statement only moves
//! records between datasets.

use std::fmt;

use itertools::Itertools;
use serde_json::Value;
use shopalot_datagen::{EntityKind, Record, Representation};

use crate::error::{Error, Result};

/// Fully qualified dataverse name, e.g. `ShopALot.ATOM`.
pub fn dataverse(representation: Representation) -> String {
    format!("ShopALot.{}", representation.dataverse())
}

fn dataset(kind: EntityKind, representation: Representation) -> String {
    format!("{}.{}", dataverse(representation), kind.dataset_name())
}

/// Secondary indexes a loaded `kind` dataset is expected to carry.
pub fn secondary_indexes(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::User => &["usersNumberIdx"],
        EntityKind::Store => &["storesCatIdx"],
        EntityKind::Order => &["ordersItemQtyProductIdx", "ordersProductItemQtyIdx"],
    }
}

/// Escapes `value` for use inside a double quoted string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

pub fn index_exists(index: &str, representation: Representation, kind: EntityKind) -> String {
    format!(
        "SELECT * FROM `Metadata`.`Index` WHERE IndexName = {} AND DataverseName = {} AND \
         DatasetName = {};",
        quote(index),
        quote(&dataverse(representation)),
        quote(kind.dataset_name()),
    )
}

pub fn buffer_insert(
    kind: EntityKind,
    representation: Representation,
    records: &[Record],
) -> Result<String> {
    let body: Vec<String> = records
        .iter()
        .map(Record::to_json_string)
        .collect::<shopalot_datagen::Result<_>>()?;
    Ok(format!(
        "INSERT INTO {}Buffer [\n{}\n];",
        dataset(kind, representation),
        body.iter().join(",\n")
    ))
}

/// How buffered records are moved into the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Insert,
    Upsert,
}

impl WriteOperation {
    pub fn phase(self) -> &'static str {
        match self {
            WriteOperation::Insert => "insert",
            WriteOperation::Upsert => "upsert",
        }
    }
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOperation::Insert => f.write_str("INSERT"),
            WriteOperation::Upsert => f.write_str("UPSERT"),
        }
    }
}

pub fn write_from_buffer(
    operation: WriteOperation,
    kind: EntityKind,
    representation: Representation,
) -> String {
    let target = dataset(kind, representation);
    format!("{operation} INTO {target} SELECT VALUE B FROM {target}Buffer B;")
}

pub fn clear_buffer(kind: EntityKind, representation: Representation) -> String {
    format!("DELETE FROM {}Buffer;", dataset(kind, representation))
}

pub fn delete_chunk(kind: EntityKind, representation: Representation, chunk_key: &str) -> String {
    format!(
        "DELETE FROM {} WHERE chunk_id = {};",
        dataset(kind, representation),
        quote(chunk_key)
    )
}

fn chunk_index(kind: EntityKind) -> String {
    format!("{}ChunkIdx", kind.dataset_name())
}

pub fn create_chunk_index(kind: EntityKind, representation: Representation) -> String {
    format!(
        "USE {}; CREATE INDEX {} ON {} (chunk_id : string ?);",
        dataverse(representation),
        chunk_index(kind),
        kind.dataset_name()
    )
}

pub fn drop_chunk_index(kind: EntityKind, representation: Representation) -> String {
    format!(
        "USE {}; DROP INDEX {}.{} IF EXISTS;",
        dataverse(representation),
        kind.dataset_name(),
        chunk_index(kind)
    )
}

pub fn set_index_only(enabled: bool) -> String {
    format!("SET `compiler.indexonly` \"{enabled}\";")
}

/// The shape of an equality-predicate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStyle {
    /// ATOM: a predicate on the nested field.
    Nested,
    /// SARR: unnest the array and filter its elements.
    Unnest,
    /// SARR: as [`Unnest`](Self::Unnest), deduplicating the matched records.
    UnnestDistinct,
    /// SARR: `SOME ... SATISFIES` over the array.
    Existential,
    /// SARR: `EVERY ... SATISFIES` over a non-empty array.
    Universal,
}

impl QueryStyle {
    pub fn for_representation(representation: Representation) -> &'static [QueryStyle] {
        match representation {
            Representation::Atom => &[QueryStyle::Nested],
            Representation::Sarr => &[
                QueryStyle::Unnest,
                QueryStyle::UnnestDistinct,
                QueryStyle::Existential,
                QueryStyle::Universal,
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QueryStyle::Nested => "nested",
            QueryStyle::Unnest => "unnest",
            QueryStyle::UnnestDistinct => "unnest-distinct",
            QueryStyle::Existential => "existential",
            QueryStyle::Universal => "universal",
        }
    }
}

/// The value an equality-predicate query looks a regenerated record up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    PhoneNumber(String),
    Category(String),
    Item { qty: u64, product_id: String },
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::PhoneNumber(n) => write!(f, "phone number {n}"),
            LookupKey::Category(c) => write!(f, "category {c}"),
            LookupKey::Item { qty, product_id } => {
                write!(f, "item qty {qty} and product {product_id}")
            }
        }
    }
}

impl LookupKey {
    /// Pulls the lookup value out of a record in either representation.
    pub fn from_record(
        kind: EntityKind,
        representation: Representation,
        record: &Record,
    ) -> Result<Self> {
        let nested = match representation {
            Representation::Atom => record.get(kind.singular_field()),
            Representation::Sarr => record
                .get(kind.plural_field())
                .and_then(|v| v.as_array())
                .and_then(|a| a.first()),
        }
        .ok_or_else(|| missing(kind, "nested field"))?;

        match kind {
            EntityKind::User => nested
                .get("number")
                .and_then(Value::as_str)
                .map(|n| LookupKey::PhoneNumber(n.to_owned()))
                .ok_or_else(|| missing(kind, "phone number")),
            EntityKind::Store => nested
                .as_str()
                .map(|c| LookupKey::Category(c.to_owned()))
                .ok_or_else(|| missing(kind, "category")),
            EntityKind::Order => {
                let qty = nested
                    .get("qty")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| missing(kind, "item quantity"))?;
                let product_id = nested
                    .get("product_id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| missing(kind, "item product"))?;
                Ok(LookupKey::Item {
                    qty,
                    product_id: product_id.to_owned(),
                })
            }
        }
    }

    /// The predicate over `var`, the bound name of the nested value.
    fn predicate(&self, var: &str) -> String {
        match self {
            LookupKey::PhoneNumber(n) => format!("{var}.number = {}", quote(n)),
            LookupKey::Category(c) => format!("{var} = {}", quote(c)),
            LookupKey::Item { qty, product_id } => {
                format!("{var}.qty = {qty} AND {var}.product_id = {}", quote(product_id))
            }
        }
    }
}

fn missing(kind: EntityKind, what: &str) -> Error {
    Error::InvalidWorkload(format!("generated {kind} record has no {what}"))
}

/// An equality-predicate lookup for `key` on the `kind` dataset.
///
/// Store and order lookups match many records and are capped at 10 results.
pub fn equality_query(
    kind: EntityKind,
    representation: Representation,
    style: QueryStyle,
    key: &LookupKey,
) -> String {
    let alias = match kind {
        EntityKind::User => "U",
        EntityKind::Store => "S",
        EntityKind::Order => "O",
    };
    let element = format!("{alias}I");
    let target = dataset(kind, representation);
    let limit = match kind {
        EntityKind::User => "",
        EntityKind::Store | EntityKind::Order => " LIMIT 10",
    };
    let plural = kind.plural_field();

    match style {
        QueryStyle::Nested => format!(
            "SELECT {alias} FROM {target} {alias} WHERE {}{limit};",
            key.predicate(&format!("{alias}.{}", kind.singular_field()))
        ),
        QueryStyle::Unnest | QueryStyle::UnnestDistinct => format!(
            "SELECT {}{alias} FROM {target} {alias} UNNEST {alias}.{plural} {element} WHERE {}{limit};",
            if style == QueryStyle::UnnestDistinct { "DISTINCT " } else { "" },
            key.predicate(&element)
        ),
        QueryStyle::Existential => format!(
            "SELECT {alias} FROM {target} {alias} WHERE (SOME {element} IN {alias}.{plural} \
             SATISFIES {}){limit};",
            key.predicate(&element)
        ),
        QueryStyle::Universal => format!(
            "SELECT {alias} FROM {target} {alias} WHERE LEN({alias}.{plural}) > 0 AND \
             (EVERY {element} IN {alias}.{plural} SATISFIES {}){limit};",
            key.predicate(&element)
        ),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn buffer_statements() {
        let mut r = Record::new();
        r.insert("user_id", "01");
        assert_eq!(
            buffer_insert(EntityKind::User, Representation::Atom, &[r.clone(), r]).unwrap(),
            "INSERT INTO ShopALot.ATOM.UsersBuffer [\n{\"user_id\":\"01\"},\n{\"user_id\":\"01\"}\n];"
        );
        assert_eq!(
            write_from_buffer(WriteOperation::Upsert, EntityKind::Order, Representation::Sarr),
            "UPSERT INTO ShopALot.SARR.Orders SELECT VALUE B FROM ShopALot.SARR.OrdersBuffer B;"
        );
        assert_eq!(
            clear_buffer(EntityKind::Store, Representation::Atom),
            "DELETE FROM ShopALot.ATOM.StoresBuffer;"
        );
    }

    #[test]
    fn chunk_statements() {
        assert_eq!(
            delete_chunk(EntityKind::User, Representation::Atom, "007"),
            "DELETE FROM ShopALot.ATOM.Users WHERE chunk_id = \"007\";"
        );
        assert_eq!(
            create_chunk_index(EntityKind::Order, Representation::Sarr),
            "USE ShopALot.SARR; CREATE INDEX OrdersChunkIdx ON Orders (chunk_id : string ?);"
        );
        assert_eq!(
            drop_chunk_index(EntityKind::Order, Representation::Sarr),
            "USE ShopALot.SARR; DROP INDEX Orders.OrdersChunkIdx IF EXISTS;"
        );
    }

    #[test]
    fn lookup_keys_from_both_representations() {
        let mut atom = Record::new();
        atom.insert("item", json!({"qty": 4, "product_id": "017", "price": 1.5}));
        let mut sarr = Record::new();
        sarr.insert("items", json!([{"qty": 4, "product_id": "017", "price": 1.5}]));

        let expected = LookupKey::Item {
            qty: 4,
            product_id: "017".into(),
        };
        assert_eq!(
            LookupKey::from_record(EntityKind::Order, Representation::Atom, &atom).unwrap(),
            expected
        );
        assert_eq!(
            LookupKey::from_record(EntityKind::Order, Representation::Sarr, &sarr).unwrap(),
            expected
        );
        assert!(LookupKey::from_record(EntityKind::Order, Representation::Sarr, &atom).is_err());
    }

    #[test]
    fn equality_queries() {
        let phone = LookupKey::PhoneNumber("555-0100".into());
        assert_eq!(
            equality_query(EntityKind::User, Representation::Atom, QueryStyle::Nested, &phone),
            "SELECT U FROM ShopALot.ATOM.Users U WHERE U.phone.number = \"555-0100\";"
        );
        assert_eq!(
            equality_query(EntityKind::User, Representation::Sarr, QueryStyle::Unnest, &phone),
            "SELECT U FROM ShopALot.SARR.Users U UNNEST U.phones UI WHERE UI.number = \"555-0100\";"
        );

        let category = LookupKey::Category("Grocery".into());
        assert_eq!(
            equality_query(
                EntityKind::Store,
                Representation::Sarr,
                QueryStyle::Existential,
                &category
            ),
            "SELECT S FROM ShopALot.SARR.Stores S WHERE (SOME SI IN S.categories SATISFIES \
             SI = \"Grocery\") LIMIT 10;"
        );

        let item = LookupKey::Item {
            qty: 2,
            product_id: "100".into(),
        };
        let universal =
            equality_query(EntityKind::Order, Representation::Sarr, QueryStyle::Universal, &item);
        assert!(universal.contains("LEN(O.items) > 0"));
        assert!(universal.contains("EVERY OI IN O.items SATISFIES OI.qty = 2 AND OI.product_id = \"100\""));
    }
}
