//! SQLite implementation of the sequence store.
//!
//! # Responsibility
//! - Persist checklist items and their positions in `checklist_items`.
//! - Scope every call to the session owner's checklists.
//!
//! # Invariants
//! - Reads are deterministic: `sort_order ASC, created_seq ASC, item_uuid ASC`.
//! - A checklist owned by someone else is indistinguishable from a missing one.
//! - Payloads are validated before any write.
//! - SQLite failures surface as transient; missing rows as not-found.

use crate::db::{with_connection, DbError, SharedConnection};
use crate::model::checklist::OwnerId;
use crate::model::entry::{EntryId, EntryPayload, OrderedEntry};
use crate::repo::common::{
    bool_to_int, ensure_schema_ready, int_to_bool, parse_uuid, RepoError, RepoResult,
};
use crate::sequence::store::{SequenceId, SequenceStore, StoreError, StoreResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use uuid::Uuid;

/// Authenticated caller identity injected by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSession {
    pub owner: OwnerId,
}

impl StoreSession {
    pub fn new(owner: OwnerId) -> Self {
        Self { owner }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Transient(value.to_string())
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Transient(value.to_string())
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Transient(value.to_string())
    }
}

/// Owner-scoped `SequenceStore` over `checklist_items`.
pub struct SqliteSequenceStore {
    conn: SharedConnection,
    session: StoreSession,
}

impl SqliteSequenceStore {
    /// Creates the store from a migrated shared connection.
    pub fn try_new(conn: SharedConnection, session: StoreSession) -> RepoResult<Self> {
        with_connection(&conn, |guard| {
            ensure_schema_ready(
                guard,
                "checklist_items",
                &[
                    "item_uuid",
                    "checklist_uuid",
                    "content",
                    "sort_order",
                    "is_checked",
                    "created_seq",
                ],
            )
        })??;
        Ok(Self { conn, session })
    }

    pub fn session(&self) -> StoreSession {
        self.session
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        with_connection(&self.conn, f)?
    }

    fn ensure_visible(&self, conn: &Connection, sequence_id: SequenceId) -> StoreResult<()> {
        let visible: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM checklists
                WHERE checklist_uuid = ?1
                  AND owner_uuid = ?2
            );",
            params![sequence_id.to_string(), self.session.owner.to_string()],
            |row| row.get(0),
        )?;
        if visible != 1 {
            return Err(StoreError::sequence_not_found(sequence_id));
        }
        Ok(())
    }
}

#[async_trait]
impl SequenceStore for SqliteSequenceStore {
    async fn read_sequence(&self, sequence_id: SequenceId) -> StoreResult<Vec<OrderedEntry>> {
        self.with_conn(|conn| {
            self.ensure_visible(conn, sequence_id)?;
            Ok(load_entries(conn, sequence_id)?)
        })
    }

    async fn write_entry_position(
        &self,
        sequence_id: SequenceId,
        entry_id: EntryId,
        position: i64,
    ) -> StoreResult<()> {
        if position < 0 {
            return Err(StoreError::Validation(format!(
                "position must not be negative, got {position}"
            )));
        }
        self.with_conn(|conn| {
            self.ensure_visible(conn, sequence_id)?;
            let changed = conn.execute(
                "UPDATE checklist_items
                 SET sort_order = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE item_uuid = ?1
                   AND checklist_uuid = ?2;",
                params![entry_id.to_string(), sequence_id.to_string(), position],
            )?;
            if changed == 0 {
                return Err(StoreError::entry_not_found(sequence_id, entry_id));
            }
            Ok(())
        })
    }

    async fn write_entry_payload(
        &self,
        sequence_id: SequenceId,
        entry_id: EntryId,
        payload: &EntryPayload,
    ) -> StoreResult<()> {
        payload
            .validate()
            .map_err(|err| StoreError::Validation(err.to_string()))?;
        self.with_conn(|conn| {
            self.ensure_visible(conn, sequence_id)?;
            let changed = conn.execute(
                "UPDATE checklist_items
                 SET content = ?3,
                     is_checked = ?4,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE item_uuid = ?1
                   AND checklist_uuid = ?2;",
                params![
                    entry_id.to_string(),
                    sequence_id.to_string(),
                    payload.content,
                    bool_to_int(payload.is_checked),
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::entry_not_found(sequence_id, entry_id));
            }
            Ok(())
        })
    }

    async fn create_entry(
        &self,
        sequence_id: SequenceId,
        payload: &EntryPayload,
        position: i64,
    ) -> StoreResult<EntryId> {
        payload
            .validate()
            .map_err(|err| StoreError::Validation(err.to_string()))?;
        if position < 0 {
            return Err(StoreError::Validation(format!(
                "position must not be negative, got {position}"
            )));
        }
        self.with_conn(|conn| {
            self.ensure_visible(conn, sequence_id)?;
            let entry_id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO checklist_items (
                    item_uuid,
                    checklist_uuid,
                    content,
                    sort_order,
                    is_checked,
                    created_seq
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5,
                    (SELECT COALESCE(MAX(created_seq), 0) + 1
                     FROM checklist_items
                     WHERE checklist_uuid = ?2)
                );",
                params![
                    entry_id.to_string(),
                    sequence_id.to_string(),
                    payload.content,
                    position,
                    bool_to_int(payload.is_checked),
                ],
            )?;
            Ok(entry_id)
        })
    }

    async fn delete_entry(&self, sequence_id: SequenceId, entry_id: EntryId) -> StoreResult<()> {
        self.with_conn(|conn| {
            self.ensure_visible(conn, sequence_id)?;
            let changed = conn.execute(
                "DELETE FROM checklist_items
                 WHERE item_uuid = ?1
                   AND checklist_uuid = ?2;",
                params![entry_id.to_string(), sequence_id.to_string()],
            )?;
            if changed == 0 {
                return Err(StoreError::entry_not_found(sequence_id, entry_id));
            }
            Ok(())
        })
    }
}

/// Loads one checklist's items in display order without owner scoping.
///
/// Backs `ChecklistRepository::shared_view`, which has no owner session.
pub fn load_entries(conn: &Connection, sequence_id: SequenceId) -> RepoResult<Vec<OrderedEntry>> {
    let mut stmt = conn.prepare(
        "SELECT
            item_uuid,
            sort_order,
            content,
            is_checked
         FROM checklist_items
         WHERE checklist_uuid = ?1
         ORDER BY sort_order ASC, created_seq ASC, item_uuid ASC;",
    )?;
    let mut rows = stmt.query([sequence_id.to_string()])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("item_uuid")?;
        entries.push(OrderedEntry {
            id: parse_uuid(&id_text, "checklist_items.item_uuid")?,
            position: row.get("sort_order")?,
            payload: EntryPayload {
                content: row.get("content")?,
                is_checked: int_to_bool(row.get("is_checked")?, "checklist_items.is_checked")?,
            },
        });
    }
    Ok(entries)
}
