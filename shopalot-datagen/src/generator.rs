//! The deterministic record generator.
//!
//! Every record is produced from a fresh random source seeded with its numeric id, so a given
//! `(kind, id, config)` always maps to the same record no matter which ids were generated
//! before it or in which process. Nothing here touches a thread-local or global RNG.

use chrono::{Duration, NaiveDateTime};
use fake::faker::address::en::{BuildingNumber, CityName, StreetName, ZipCode};
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::json;

use crate::catalog::{
    MAX_LIST_PRICE, MAX_PHONE_NUMBER_LEN, MAX_PRODUCT_ID, MIN_PRICE, PHONE_TYPES,
    PRODUCT_CATEGORIES, PRODUCT_ID_WIDTH, STORE_NAMES,
};
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::keys::{IdRange, KeyFormat};
use crate::{EntityKind, Record};

/// Length of the window `time_placed` is drawn from, starting at the configured anchor.
const ORDER_WINDOW_DAYS: i64 = 30;
/// Upper bound for both the placed-to-pickup and the pickup-to-fulfilled delays.
const FULFILLMENT_STEP_HOURS: i64 = 6;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Maps `(entity kind, id)` pairs to ATOM records.
#[derive(Debug, Clone)]
pub struct RecordGenerator {
    config: GeneratorConfig,
    qty: Normal<f64>,
}

impl RecordGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let qty = Normal::new(1.0, 10.0)
            .map_err(|e| Error::InvalidConfig(format!("quantity distribution: {e}")))?;
        Ok(Self { config, qty })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn key_format(&self) -> KeyFormat {
        self.config.key_format
    }

    /// The random source for `id`. Two calls with the same id yield identical streams.
    pub fn rng_for(id: u64) -> StdRng {
        StdRng::seed_from_u64(id)
    }

    /// Generates the ATOM record for `id`. The record carries the zero-padded primary key but
    /// no `chunk_id`; stamping the chunk is the caller's job.
    pub fn generate(&self, kind: EntityKind, id: u64) -> Result<Record> {
        let key = self.config.key_format.format(id)?;
        let mut rng = Self::rng_for(id);
        let mut record = Record::new();
        record.insert(kind.primary_key(), key);

        match kind {
            EntityKind::User => self.fill_user(&mut record, &mut rng),
            EntityKind::Store => self.fill_store(&mut record, &mut rng),
            EntityKind::Order => self.fill_order(&mut record, &mut rng)?,
        }

        Ok(record)
    }

    fn fill_user(&self, record: &mut Record, rng: &mut StdRng) {
        let phone_type = pick(&PHONE_TYPES, rng);
        let number = phone_number(rng);
        let first: String = FirstName().fake_with_rng(rng);
        let last: String = LastName().fake_with_rng(rng);

        record.insert("name", json!({ "first": first, "last": last }));
        record.insert("phone", json!({ "type": phone_type, "number": number }));
    }

    fn fill_store(&self, record: &mut Record, rng: &mut StdRng) {
        let name = pick(&STORE_NAMES, rng);
        let category = pick(&PRODUCT_CATEGORIES, rng);
        let city: String = CityName().fake_with_rng(rng);
        let building: String = BuildingNumber().fake_with_rng(rng);
        let street: String = StreetName().fake_with_rng(rng);
        let zip: String = ZipCode().fake_with_rng(rng);
        let zip_code: String = zip.chars().take(5).collect::<String>();

        record.insert("name", name);
        record.insert(
            "address",
            json!({
                "city": city,
                "street": format!("{building} {street}"),
                "zip_code": zip_code.trim_start_matches('0'),
            }),
        );
        record.insert("phone", phone_number(rng));
        record.insert("category", category);
    }

    fn fill_order(&self, record: &mut Record, rng: &mut StdRng) -> Result<()> {
        let users = self.config.user_range.ok_or(Error::MissingReferenceRange {
            kind: EntityKind::Order,
            missing: "user",
        })?;
        let stores = self.config.store_range.ok_or(Error::MissingReferenceRange {
            kind: EntityKind::Order,
            missing: "store",
        })?;

        let product_id = rng.gen_range(0..=MAX_PRODUCT_ID);
        let list_price = f64::max(rng.gen::<f64>() * MAX_LIST_PRICE, MIN_PRICE);
        let price = f64::max(
            list_price + list_price * rng.gen::<f64>() - list_price / 2.0,
            MIN_PRICE,
        );
        let item_id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
        let qty = self.qty.sample(rng).abs().trunc() as u64;

        let time_placed = offset(self.config.time_anchor, Duration::days(ORDER_WINDOW_DAYS), rng)?;
        let pickup = offset(time_placed, Duration::hours(FULFILLMENT_STEP_HOURS), rng)?;
        let time_fulfilled = offset(pickup, Duration::hours(FULFILLMENT_STEP_HOURS), rng)?;

        let user_id = reference_key("user", users, rng)?;
        let store_id = reference_key("store", stores, rng)?;

        record.insert(
            "time_placed",
            time_placed.format(TIMESTAMP_FORMAT).to_string(),
        );
        record.insert(
            "time_fulfilled",
            time_fulfilled.format(TIMESTAMP_FORMAT).to_string(),
        );
        record.insert("user_id", user_id);
        record.insert("store_id", store_id);
        record.insert(
            "item",
            json!({
                "item_id": item_id.to_string(),
                "qty": qty,
                "price": round_cents(price),
                "product_id": format!("{product_id:0width$}", width = PRODUCT_ID_WIDTH),
            }),
        );
        Ok(())
    }
}

fn pick<'a>(pool: &[&'a str], rng: &mut StdRng) -> &'a str {
    // Pools are non-empty constants.
    pool.choose(rng).copied().unwrap_or_default()
}

fn phone_number(rng: &mut StdRng) -> String {
    let number: String = PhoneNumber().fake_with_rng(rng);
    number.chars().take(MAX_PHONE_NUMBER_LEN).collect()
}

/// A uniformly drawn instant in `[start, start + window]`, at second granularity.
fn offset(start: NaiveDateTime, window: Duration, rng: &mut StdRng) -> Result<NaiveDateTime> {
    let seconds = rng.gen_range(0..=window.num_seconds());
    start
        .checked_add_signed(Duration::seconds(seconds))
        .ok_or_else(|| Error::InvalidConfig(format!("timestamp overflow after {start}")))
}

/// A key drawn uniformly from `range`, padded to the width of the range end.
fn reference_key(name: &str, range: IdRange, rng: &mut StdRng) -> Result<String> {
    if range.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "the {name} id range {}..{} has no ids to reference",
            range.start, range.end
        )));
    }
    let id = rng.gen_range(range.start..range.end);
    range.key_format().format(id)
}

/// Rounds half-up to two decimal places.
pub(crate) fn round_cents(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn generator() -> RecordGenerator {
        RecordGenerator::new(
            GeneratorConfig::new(IdRange::new(0, 50_000), 100)
                .with_reference_ranges(IdRange::new(0, 1000), IdRange::new(0, 200)),
        )
        .unwrap()
    }

    #[test]
    fn same_id_same_record() {
        let g = generator();
        for kind in EntityKind::ALL {
            let a = g.generate(kind, 42).unwrap();
            let _ = g.generate(kind, 7).unwrap();
            let b = g.generate(kind, 42).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_ids_differ() {
        let g = generator();
        assert_ne!(
            g.generate(EntityKind::Order, 1).unwrap().get("item"),
            g.generate(EntityKind::Order, 2).unwrap().get("item")
        );
    }

    #[test]
    fn user_fields() {
        let user = generator().generate(EntityKind::User, 3).unwrap();
        assert_eq!(user.get_str("user_id"), Some("00003"));
        let phone_type = user.get_path("phone.type").and_then(Value::as_str).unwrap();
        assert!(PHONE_TYPES.contains(&phone_type));
        let number = user.get_path("phone.number").and_then(Value::as_str).unwrap();
        assert!(!number.is_empty());
        assert!(number.chars().count() <= MAX_PHONE_NUMBER_LEN);
        assert!(user.get_path("name.first").and_then(Value::as_str).is_some());
        assert!(user.get_path("name.last").and_then(Value::as_str).is_some());
        assert!(!user.contains("chunk_id"));
    }

    #[test]
    fn store_fields() {
        let store = generator().generate(EntityKind::Store, 11).unwrap();
        assert!(STORE_NAMES.contains(&store.get_str("name").unwrap()));
        assert!(PRODUCT_CATEGORIES.contains(&store.get_str("category").unwrap()));
        let zip = store.get_path("address.zip_code").and_then(Value::as_str).unwrap();
        assert!(zip.len() <= 5);
        assert!(!zip.starts_with('0'));
        assert!(store.get_path("address.city").is_some());
        assert!(store.get_path("address.street").is_some());
    }

    #[test]
    fn order_fields() {
        let g = generator();
        for id in 0..200 {
            let order = g.generate(EntityKind::Order, id).unwrap();

            let user_id = order.get_str("user_id").unwrap();
            assert_eq!(user_id.len(), 4);
            assert!(user_id.parse::<u64>().unwrap() < 1000);
            let store_id = order.get_str("store_id").unwrap();
            assert_eq!(store_id.len(), 3);
            assert!(store_id.parse::<u64>().unwrap() < 200);

            let price = order.get_path("item.price").and_then(Value::as_f64).unwrap();
            assert!(price >= MIN_PRICE);
            assert_eq!(round_cents(price), price);

            let product = order.get_path("item.product_id").and_then(Value::as_str).unwrap();
            assert_eq!(product.len(), 3);
            assert!(product.parse::<u32>().unwrap() <= MAX_PRODUCT_ID);

            assert!(order.get_path("item.qty").and_then(Value::as_u64).is_some());
            let item_id = order.get_path("item.item_id").and_then(Value::as_str).unwrap();
            assert!(uuid::Uuid::parse_str(item_id).is_ok());

            let placed = NaiveDateTime::parse_from_str(
                order.get_str("time_placed").unwrap(),
                TIMESTAMP_FORMAT,
            )
            .unwrap();
            let fulfilled = NaiveDateTime::parse_from_str(
                order.get_str("time_fulfilled").unwrap(),
                TIMESTAMP_FORMAT,
            )
            .unwrap();
            assert!(placed >= g.config().time_anchor);
            assert!(fulfilled >= placed);
            assert!(fulfilled - placed <= Duration::hours(2 * FULFILLMENT_STEP_HOURS));
            assert!(placed - g.config().time_anchor <= Duration::days(ORDER_WINDOW_DAYS));
        }
    }

    #[test]
    fn empty_reference_ranges_are_errors() {
        for (users, stores) in [
            (IdRange::new(0, 0), IdRange::new(0, 10)),
            (IdRange::new(0, 10), IdRange::new(7, 3)),
        ] {
            let g = RecordGenerator::new(
                GeneratorConfig::new(IdRange::new(0, 10), 2).with_reference_ranges(users, stores),
            )
            .unwrap();
            assert!(matches!(
                g.generate(EntityKind::Order, 1),
                Err(Error::InvalidConfig(_))
            ));
            // Other kinds don't reference anything.
            assert!(g.generate(EntityKind::User, 1).is_ok());
        }
    }

    #[test]
    fn orders_need_reference_ranges() {
        let g = RecordGenerator::new(GeneratorConfig::new(IdRange::new(0, 10), 2)).unwrap();
        assert!(matches!(
            g.generate(EntityKind::Order, 1),
            Err(Error::MissingReferenceRange { .. })
        ));
        assert!(g.generate(EntityKind::User, 1).is_ok());
    }

    #[test]
    fn out_of_domain_id_is_rejected() {
        let g = RecordGenerator::new(GeneratorConfig::new(IdRange::new(0, 5), 2)).unwrap();
        assert!(matches!(
            g.generate(EntityKind::User, 10),
            Err(Error::InvalidRange { id: 10, width: 1 })
        ));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(1.375), 1.38);
        assert_eq!(round_cents(2.344), 2.34);
        assert_eq!(round_cents(0.99), 0.99);
    }
}
