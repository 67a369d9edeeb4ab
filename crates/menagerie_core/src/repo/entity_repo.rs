//! Generic repository contract and its SQLite implementation.
//!
//! # Responsibility
//! - Provide one CRUD surface for every `Record` type.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every mutation commits the borrowed session before returning; there is
//!   no batching across repository calls.
//! - Absence is `Ok(None)`, never an error.
//! - Write paths validate the entity before any SQL runs.

use crate::db::{Session, StorageResult};
use crate::model::entity::EntityId;
use crate::repo::record::{id_value, select_sql, Record};
use log::{debug, warn};
use rusqlite::params_from_iter;
use rusqlite::types::Value;

/// Create/read/update/delete over any mapped entity type.
///
/// The entity type is chosen per call, e.g. `repo.get_by_id::<Animal>(id)`.
pub trait Repository {
    /// Inserts `entity` and commits.
    ///
    /// Fails with `StorageError::Constraint` for a duplicate id or a
    /// reference to a missing row; nothing is persisted then.
    fn add<E: Record>(&self, entity: &E) -> StorageResult<()>;

    fn get_by_id<E: Record>(&self, id: EntityId) -> StorageResult<Option<E>>;

    /// Applies `patch` to the stored entity, refreshes `updated_at` and
    /// commits. Returns the updated entity, or `None` when `id` is unknown.
    fn update<E: Record>(&self, id: EntityId, patch: E::Patch) -> StorageResult<Option<E>>;

    /// Removes the entity and commits. Returns what was removed, or `None`
    /// when `id` is unknown.
    fn delete<E: Record>(&self, id: EntityId) -> StorageResult<Option<E>>;

    /// All entities of type `E`, oldest first.
    fn list<E: Record>(&self) -> StorageResult<Vec<E>>;

    /// First entity of type `E` (oldest first) whose name matches exactly.
    fn find_by_name<E: Record>(&self, name: &str) -> StorageResult<Option<E>>;
}

/// Repository bound to one borrowed `Session`.
pub struct SqliteRepository<'s> {
    session: &'s Session,
}

impl<'s> SqliteRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    fn query_first<E: Record>(&self, sql: &str, bind: Value) -> StorageResult<Option<E>> {
        let mut stmt = self.session.connection().prepare(sql)?;
        let mut rows = stmt.query([bind])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(E::from_row(row)?));
        }
        Ok(None)
    }
}

impl Repository for SqliteRepository<'_> {
    fn add<E: Record>(&self, entity: &E) -> StorageResult<()> {
        entity.validate()?;

        let columns = E::COLUMNS.join(", ");
        let placeholders = (1..=E::COLUMNS.len() + 3)
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} (id, {columns}, created_at, updated_at) VALUES ({placeholders});",
            E::TABLE
        );

        let mut values = Vec::with_capacity(E::COLUMNS.len() + 3);
        values.push(id_value(entity.id()));
        values.extend(entity.column_values());
        values.push(Value::Integer(entity.timestamps().created_at()));
        values.push(Value::Integer(entity.timestamps().updated_at()));

        let conn = self.session.begin_write()?;
        conn.execute(&sql, params_from_iter(values))?;
        self.session.commit()?;

        debug!(
            "event=repo_add module=repo status=ok kind={} id={}",
            E::KIND,
            entity.id()
        );
        Ok(())
    }

    fn get_by_id<E: Record>(&self, id: EntityId) -> StorageResult<Option<E>> {
        let sql = format!("{} WHERE id = ?1;", select_sql::<E>());
        self.query_first(&sql, id_value(id))
    }

    fn update<E: Record>(&self, id: EntityId, patch: E::Patch) -> StorageResult<Option<E>> {
        let Some(mut entity) = self.get_by_id::<E>(id)? else {
            warn!(
                "event=repo_not_found module=repo status=ok op=update kind={} id={id}",
                E::KIND
            );
            return Ok(None);
        };

        entity.apply(patch);
        entity.touch();
        entity.validate()?;

        let assignments = E::COLUMNS
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let updated_at_index = E::COLUMNS.len() + 1;
        let sql = format!(
            "UPDATE {} SET {assignments}, updated_at = ?{updated_at_index} WHERE id = ?{};",
            E::TABLE,
            updated_at_index + 1
        );

        let mut values = entity.column_values();
        values.push(Value::Integer(entity.timestamps().updated_at()));
        values.push(id_value(id));

        let conn = self.session.begin_write()?;
        let changed = conn.execute(&sql, params_from_iter(values))?;
        self.session.commit()?;

        if changed == 0 {
            warn!(
                "event=repo_not_found module=repo status=ok op=update kind={} id={id}",
                E::KIND
            );
            return Ok(None);
        }

        debug!(
            "event=repo_update module=repo status=ok kind={} id={id}",
            E::KIND
        );
        Ok(Some(entity))
    }

    fn delete<E: Record>(&self, id: EntityId) -> StorageResult<Option<E>> {
        let Some(entity) = self.get_by_id::<E>(id)? else {
            warn!(
                "event=repo_not_found module=repo status=ok op=delete kind={} id={id}",
                E::KIND
            );
            return Ok(None);
        };

        let conn = self.session.begin_write()?;
        let changed = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", E::TABLE),
            [id_value(id)],
        )?;
        self.session.commit()?;

        if changed == 0 {
            warn!(
                "event=repo_not_found module=repo status=ok op=delete kind={} id={id}",
                E::KIND
            );
            return Ok(None);
        }

        debug!(
            "event=repo_delete module=repo status=ok kind={} id={id}",
            E::KIND
        );
        Ok(Some(entity))
    }

    fn list<E: Record>(&self) -> StorageResult<Vec<E>> {
        let sql = format!("{} ORDER BY created_at ASC, id ASC;", select_sql::<E>());
        let mut stmt = self.session.connection().prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(E::from_row(row)?);
        }
        Ok(entities)
    }

    fn find_by_name<E: Record>(&self, name: &str) -> StorageResult<Option<E>> {
        let sql = format!(
            "{} WHERE name = ?1 ORDER BY created_at ASC, id ASC LIMIT 1;",
            select_sql::<E>()
        );
        self.query_first(&sql, Value::Text(name.to_string()))
    }
}
