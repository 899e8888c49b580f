use std::fmt;

use serde::{Deserialize, Serialize};

/// The three ShopALot entity types. Every generated record belongs to exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[value(alias = "users")]
    User,
    #[value(alias = "stores")]
    Store,
    #[value(alias = "orders")]
    Order,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::User, EntityKind::Store, EntityKind::Order];

    /// Name of the field holding the zero-padded primary key.
    pub fn primary_key(self) -> &'static str {
        match self {
            EntityKind::User => "user_id",
            EntityKind::Store => "store_id",
            EntityKind::Order => "order_id",
        }
    }

    /// The field an ATOM record nests as a single value.
    pub fn singular_field(self) -> &'static str {
        match self {
            EntityKind::User => "phone",
            EntityKind::Store => "category",
            EntityKind::Order => "item",
        }
    }

    /// The field a SARR record carries as a one-element array in place of
    /// [`singular_field`](Self::singular_field).
    pub fn plural_field(self) -> &'static str {
        match self {
            EntityKind::User => "phones",
            EntityKind::Store => "categories",
            EntityKind::Order => "items",
        }
    }

    /// Dataset name used by the target databases.
    pub fn dataset_name(self) -> &'static str {
        match self {
            EntityKind::User => "Users",
            EntityKind::Store => "Stores",
            EntityKind::Order => "Orders",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => f.write_str("user"),
            EntityKind::Store => f.write_str("store"),
            EntityKind::Order => f.write_str("order"),
        }
    }
}

/// Which of the two record shapes a dataverse holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// One-to-many relationships modeled as a single nested value.
    Atom,
    /// The same relationships modeled as an array of nested values.
    Sarr,
}

impl Representation {
    pub fn dataverse(self) -> &'static str {
        match self {
            Representation::Atom => "ATOM",
            Representation::Sarr => "SARR",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Atom => f.write_str("atom"),
            Representation::Sarr => f.write_str("sarr"),
        }
    }
}
