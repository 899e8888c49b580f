//! Generator configuration, and the dataset config file it is usually derived from.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keys::{ChunkPartitioner, IdRange, KeyFormat};
use crate::EntityKind;

/// Start of the window order timestamps are drawn from when none is configured.
pub fn default_time_anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Everything a [`RecordGenerator`](crate::RecordGenerator) needs to map an id to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub id_range: IdRange,
    pub chunk_size: u64,
    pub key_format: KeyFormat,
    /// Range `user_id` is drawn from. Required for orders.
    pub user_range: Option<IdRange>,
    /// Range `store_id` is drawn from. Required for orders.
    pub store_range: Option<IdRange>,
    pub time_anchor: NaiveDateTime,
}

impl GeneratorConfig {
    /// A config for `id_range` with the key width taken from the range end.
    pub fn new(id_range: IdRange, chunk_size: u64) -> Self {
        Self {
            id_range,
            chunk_size,
            key_format: id_range.key_format(),
            user_range: None,
            store_range: None,
            time_anchor: default_time_anchor(),
        }
    }

    pub fn with_reference_ranges(mut self, users: IdRange, stores: IdRange) -> Self {
        self.user_range = Some(users);
        self.store_range = Some(stores);
        self
    }

    pub fn with_time_anchor(mut self, anchor: NaiveDateTime) -> Self {
        self.time_anchor = anchor;
        self
    }

    pub fn partitioner(&self) -> Result<ChunkPartitioner> {
        ChunkPartitioner::new(self.chunk_size, self.key_format)
    }

    /// Checks the config can generate `kind`.
    pub fn validate(&self, kind: EntityKind) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk size must be positive".into()));
        }
        if self.id_range.start > self.id_range.end {
            return Err(Error::InvalidConfig(format!(
                "id range start {} is past its end {}",
                self.id_range.start, self.id_range.end
            )));
        }
        if kind == EntityKind::Order {
            for (name, range) in [("user", self.user_range), ("store", self.store_range)] {
                match range {
                    None => {
                        return Err(Error::MissingReferenceRange {
                            kind,
                            missing: name,
                        })
                    }
                    Some(r) if r.is_empty() => {
                        return Err(Error::InvalidConfig(format!("the {name} id range is empty")))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}

/// Output file names for one representation of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFiles {
    pub full_filename: PathBuf,
    #[serde(default)]
    pub eighth_filename: Option<PathBuf>,
    #[serde(default)]
    pub sample_filename: Option<PathBuf>,
}

/// One entity section of the dataset config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetConfig {
    pub id_range: IdRange,
    pub chunk_size: u64,
    /// Number of leading records written to the sample files.
    #[serde(default = "default_sample_size")]
    pub sample_size: u64,
    pub atom_dataverse: OutputFiles,
    pub sarr_dataverse: OutputFiles,
}

fn default_sample_size() -> u64 {
    1000
}

/// The ShopALot dataset config file (`config/shopalot.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopALotConfig {
    pub users: DatasetConfig,
    pub stores: DatasetConfig,
    pub orders: DatasetConfig,
    #[serde(default = "default_time_anchor")]
    pub time_anchor: NaiveDateTime,
}

impl ShopALotConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot open {}: {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })
    }

    pub fn dataset(&self, kind: EntityKind) -> &DatasetConfig {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Store => &self.stores,
            EntityKind::Order => &self.orders,
        }
    }

    /// Generator config for materializing the full `kind` dataset. Orders reference the
    /// configured user and store ranges.
    pub fn generator_config(&self, kind: EntityKind) -> GeneratorConfig {
        let dataset = self.dataset(kind);
        let config = GeneratorConfig::new(dataset.id_range, dataset.chunk_size)
            .with_time_anchor(self.time_anchor);
        match kind {
            EntityKind::Order => {
                config.with_reference_ranges(self.users.id_range, self.stores.id_range)
            }
            _ => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "users": {
            "idRange": {"start": 0, "end": 1000},
            "chunkSize": 10,
            "atomDataverse": {"fullFilename": "UsersAtomFull.json", "eighthFilename": "UsersAtomEighth.json"},
            "sarrDataverse": {"fullFilename": "UsersSarrFull.json"}
        },
        "stores": {
            "idRange": {"start": 0, "end": 100},
            "chunkSize": 5,
            "sampleSize": 20,
            "atomDataverse": {"fullFilename": "StoresAtomFull.json"},
            "sarrDataverse": {"fullFilename": "StoresSarrFull.json"}
        },
        "orders": {
            "idRange": {"start": 0, "end": 50000},
            "chunkSize": 100,
            "atomDataverse": {"fullFilename": "OrdersAtomFull.json"},
            "sarrDataverse": {"fullFilename": "OrdersSarrFull.json"}
        }
    }"#;

    #[test]
    fn parses_dataset_config() {
        let config: ShopALotConfig = serde_json::from_str(CONFIG).unwrap();
        assert_eq!(config.users.chunk_size, 10);
        assert_eq!(config.users.sample_size, 1000);
        assert_eq!(config.stores.sample_size, 20);
        assert_eq!(
            config.users.atom_dataverse.eighth_filename,
            Some(PathBuf::from("UsersAtomEighth.json"))
        );
        assert_eq!(config.users.sarr_dataverse.eighth_filename, None);
        assert_eq!(config.time_anchor, default_time_anchor());
    }

    #[test]
    fn order_config_references_user_and_store_ranges() {
        let config: ShopALotConfig = serde_json::from_str(CONFIG).unwrap();
        let orders = config.generator_config(EntityKind::Order);
        assert_eq!(orders.key_format.width(), 5);
        assert_eq!(orders.user_range, Some(IdRange::new(0, 1000)));
        assert_eq!(orders.store_range, Some(IdRange::new(0, 100)));
        orders.validate(EntityKind::Order).unwrap();

        let users = config.generator_config(EntityKind::User);
        assert_eq!(users.user_range, None);
        assert!(users.validate(EntityKind::Order).is_err());
        users.validate(EntityKind::User).unwrap();
    }
}
