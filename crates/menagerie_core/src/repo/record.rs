//! Table mapping for persisted entities.
//!
//! # Responsibility
//! - Name each entity's table and data columns.
//! - Convert entities to bound values and rows back to entities.
//!
//! # Invariants
//! - Every table has `id`, `name`, `created_at` and `updated_at` columns.
//! - Decoded rows are validated; corrupt rows surface as `InvalidData`.

use crate::db::{StorageError, StorageResult};
use crate::model::animal::Animal;
use crate::model::entity::{Entity, EntityId, Timestamps};
use crate::model::owner::Owner;
use crate::model::toy::Toy;
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

/// An entity with a table behind it.
pub trait Record: Entity + Sized {
    const TABLE: &'static str;
    /// Data columns in bind order, excluding `id` and the timestamps.
    const COLUMNS: &'static [&'static str];

    /// Values for `COLUMNS`, in the same order.
    fn column_values(&self) -> Vec<Value>;

    /// Builds the entity from a row selected with [`select_sql`].
    fn from_row(row: &Row<'_>) -> StorageResult<Self>;
}

/// `SELECT` of every mapped column of `R`, without a `WHERE` clause.
pub(crate) fn select_sql<R: Record>() -> String {
    format!(
        "SELECT id, {}, created_at, updated_at FROM {}",
        R::COLUMNS.join(", "),
        R::TABLE
    )
}

impl Record for Toy {
    const TABLE: &'static str = "toys";
    const COLUMNS: &'static [&'static str] = &["name", "toy_type"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.category.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> StorageResult<Self> {
        let toy = Toy::from_parts(
            read_id(row, Self::TABLE, "id")?,
            row.get::<_, String>("name")?,
            row.get::<_, String>("toy_type")?,
            read_timestamps(row)?,
        );
        checked(toy)
    }
}

impl Record for Owner {
    const TABLE: &'static str = "owners";
    const COLUMNS: &'static [&'static str] = &["name", "contact_info"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.contact_info.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> StorageResult<Self> {
        let owner = Owner::from_parts(
            read_id(row, Self::TABLE, "id")?,
            row.get::<_, String>("name")?,
            row.get::<_, String>("contact_info")?,
            read_timestamps(row)?,
        );
        checked(owner)
    }
}

impl Record for Animal {
    const TABLE: &'static str = "animals";
    const COLUMNS: &'static [&'static str] = &["name", "age", "favorite_toy_id", "owner_id"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Integer(i64::from(self.age)),
            optional_id_value(self.favorite_toy_id),
            optional_id_value(self.owner_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> StorageResult<Self> {
        let raw_age: i64 = row.get("age")?;
        let age = u32::try_from(raw_age).map_err(|_| {
            StorageError::InvalidData(format!("invalid age `{raw_age}` in animals.age"))
        })?;

        let animal = Animal::from_parts(
            read_id(row, Self::TABLE, "id")?,
            row.get::<_, String>("name")?,
            age,
            read_optional_id(row, Self::TABLE, "favorite_toy_id")?,
            read_optional_id(row, Self::TABLE, "owner_id")?,
            read_timestamps(row)?,
        );
        checked(animal)
    }
}

pub(crate) fn id_value(id: EntityId) -> Value {
    Value::Text(id.to_string())
}

fn optional_id_value(id: Option<EntityId>) -> Value {
    id.map_or(Value::Null, id_value)
}

fn read_id(row: &Row<'_>, table: &str, column: &str) -> StorageResult<EntityId> {
    let text: String = row.get(column)?;
    parse_id(&text, table, column)
}

fn read_optional_id(row: &Row<'_>, table: &str, column: &str) -> StorageResult<Option<EntityId>> {
    row.get::<_, Option<String>>(column)?
        .map(|text| parse_id(&text, table, column))
        .transpose()
}

fn parse_id(text: &str, table: &str, column: &str) -> StorageResult<EntityId> {
    Uuid::parse_str(text).map_err(|_| {
        StorageError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

fn read_timestamps(row: &Row<'_>) -> StorageResult<Timestamps> {
    Ok(Timestamps::from_parts(
        row.get("created_at")?,
        row.get("updated_at")?,
    ))
}

fn checked<R: Record>(record: R) -> StorageResult<R> {
    record.validate().map_err(|err| {
        StorageError::InvalidData(format!(
            "{} row {} failed validation: {err}",
            R::TABLE,
            record.id()
        ))
    })?;
    Ok(record)
}
