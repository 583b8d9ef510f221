//! Checklist metadata repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist checklist headers (title, description, specialty, publish state).
//! - Assemble the public shared view without an owner session.
//! - Keep SQL details and owner listing order inside repository boundary.
//!
//! # Invariants
//! - Owner listings are ordered `updated_at DESC, checklist_uuid ASC`.
//! - Mutations only touch rows of the given owner; other rows read as missing.
//! - Deleting a checklist removes its items through the FK cascade.

use crate::model::checklist::{
    Checklist, ChecklistDetails, ChecklistId, OwnerId, SharedChecklist,
};
use crate::repo::common::{
    bool_to_int, ensure_schema_ready, int_to_bool, parse_uuid, RepoError, RepoResult,
};
use crate::repo::sequence_store::load_entries;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const CHECKLIST_SELECT_SQL: &str = "SELECT
    checklist_uuid,
    owner_uuid,
    title,
    description,
    specialty_tag,
    is_published,
    created_at,
    updated_at
FROM checklists";

/// Repository interface for checklist headers.
pub trait ChecklistRepository {
    /// Creates one checklist for `owner`.
    fn create_checklist(
        &self,
        owner: OwnerId,
        details: &ChecklistDetails,
    ) -> RepoResult<Checklist>;
    /// Loads one checklist by id.
    fn get_checklist(&self, id: ChecklistId) -> RepoResult<Option<Checklist>>;
    /// Lists checklists of one owner, most recently updated first.
    fn list_for_owner(&self, owner: OwnerId) -> RepoResult<Vec<Checklist>>;
    /// Replaces header fields and refreshes `updated_at`.
    fn update_details(
        &self,
        owner: OwnerId,
        id: ChecklistId,
        details: &ChecklistDetails,
    ) -> RepoResult<()>;
    /// Sets publish state.
    fn set_published(&self, owner: OwnerId, id: ChecklistId, is_published: bool)
        -> RepoResult<()>;
    /// Deletes one checklist and its items.
    fn delete_checklist(&self, owner: OwnerId, id: ChecklistId) -> RepoResult<()>;
    /// Loads the public view of one checklist: header, author and items.
    fn shared_view(&self, id: ChecklistId) -> RepoResult<Option<SharedChecklist>>;
}

/// SQLite-backed checklist repository.
pub struct SqliteChecklistRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChecklistRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            "checklists",
            &[
                "checklist_uuid",
                "owner_uuid",
                "title",
                "description",
                "specialty_tag",
                "is_published",
                "created_at",
                "updated_at",
            ],
        )?;
        ensure_schema_ready(
            conn,
            "checklist_items",
            &["item_uuid", "checklist_uuid", "sort_order", "created_seq"],
        )?;
        ensure_schema_ready(conn, "profiles", &["owner_uuid", "full_name", "clinic_name"])?;
        Ok(Self { conn })
    }
}

impl ChecklistRepository for SqliteChecklistRepository<'_> {
    fn create_checklist(
        &self,
        owner: OwnerId,
        details: &ChecklistDetails,
    ) -> RepoResult<Checklist> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO checklists (
                checklist_uuid,
                owner_uuid,
                title,
                description,
                specialty_tag,
                is_published
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                id.to_string(),
                owner.to_string(),
                details.title,
                details.description,
                details.specialty_tag,
            ],
        )?;
        self.get_checklist(id)?.ok_or(RepoError::NotFound(id))
    }

    fn get_checklist(&self, id: ChecklistId) -> RepoResult<Option<Checklist>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHECKLIST_SELECT_SQL} WHERE checklist_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_checklist_row(row)?));
        }
        Ok(None)
    }

    fn list_for_owner(&self, owner: OwnerId) -> RepoResult<Vec<Checklist>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHECKLIST_SELECT_SQL}
             WHERE owner_uuid = ?1
             ORDER BY updated_at DESC, checklist_uuid ASC;"
        ))?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_checklist_row(row)?);
        }
        Ok(items)
    }

    fn update_details(
        &self,
        owner: OwnerId,
        id: ChecklistId,
        details: &ChecklistDetails,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE checklists
             SET title = ?3,
                 description = ?4,
                 specialty_tag = ?5,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE checklist_uuid = ?1
               AND owner_uuid = ?2;",
            params![
                id.to_string(),
                owner.to_string(),
                details.title,
                details.description,
                details.specialty_tag,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn set_published(
        &self,
        owner: OwnerId,
        id: ChecklistId,
        is_published: bool,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE checklists
             SET is_published = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE checklist_uuid = ?1
               AND owner_uuid = ?2;",
            params![id.to_string(), owner.to_string(), bool_to_int(is_published)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_checklist(&self, owner: OwnerId, id: ChecklistId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM checklists
             WHERE checklist_uuid = ?1
               AND owner_uuid = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn shared_view(&self, id: ChecklistId) -> RepoResult<Option<SharedChecklist>> {
        let header = self
            .conn
            .query_row(
                "SELECT
                    c.title,
                    c.description,
                    p.full_name,
                    p.clinic_name
                 FROM checklists c
                 LEFT JOIN profiles p ON p.owner_uuid = c.owner_uuid
                 WHERE c.checklist_uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((title, description, author_name, clinic_name)) = header else {
            return Ok(None);
        };
        Ok(Some(SharedChecklist {
            id,
            title,
            description: non_blank(description),
            author_name: non_blank(author_name),
            clinic_name: non_blank(clinic_name),
            entries: load_entries(self.conn, id)?,
        }))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn parse_checklist_row(row: &Row<'_>) -> RepoResult<Checklist> {
    let id_text: String = row.get("checklist_uuid")?;
    let owner_text: String = row.get("owner_uuid")?;
    Ok(Checklist {
        id: parse_uuid(&id_text, "checklists.checklist_uuid")?,
        owner: parse_uuid(&owner_text, "checklists.owner_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        specialty_tag: row.get("specialty_tag")?,
        is_published: int_to_bool(row.get("is_published")?, "checklists.is_published")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
