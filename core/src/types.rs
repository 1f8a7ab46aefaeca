//! Row shapes for the `todos` and `fruit_inventory` tables.
//!
//! # Design
//! Read types (`Todo`, `FruitInventory`) carry every column, including the
//! ones the backend assigns (`id`, `created_at`). Write payloads carry only
//! what a caller is allowed to send. Nothing here validates row contents;
//! in particular `total_amount` is taken as stored.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Backend timestamps: RFC 3339, or a bare `timestamp` column value
/// without an offset, which is taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}")))
    }
}

/// A row type bound to a backend table.
pub trait TableRow: DeserializeOwned {
    const TABLE: &'static str;
}

/// A single todo item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    /// `None` for unowned todos. A missing column and an explicit `null`
    /// read the same.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

impl TableRow for Todo {
    const TABLE: &'static str = "todos";
}

/// Insert payload for a todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            user_id: None,
        }
    }

    pub fn owned_by(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Update payload for a todo. Omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Direction of an inventory movement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Stock received.
    In,
    /// Stock dispensed.
    Out,
}

/// One stock movement for a fruit product. Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FruitInventory {
    pub id: Uuid,
    pub fruit_name: String,
    #[serde(rename = "type")]
    pub movement: MovementType,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub description: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl TableRow for FruitInventory {
    const TABLE: &'static str = "fruit_inventory";
}

/// Insert payload for an inventory movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewFruitInventory {
    pub fruit_name: String,
    #[serde(rename = "type")]
    pub movement: MovementType,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub description: String,
}

impl NewFruitInventory {
    /// Builds a movement with `total_amount = quantity * unit_price`.
    pub fn new(
        fruit_name: impl Into<String>,
        movement: MovementType,
        quantity: f64,
        unit_price: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            fruit_name: fruit_name.into(),
            movement,
            quantity,
            unit_price,
            total_amount: quantity * unit_price,
            description: description.into(),
        }
    }
}
