//! Clinician profile repository contracts and SQLite implementation.

use crate::model::checklist::OwnerId;
use crate::model::profile::ClinicianProfile;
use crate::repo::common::{ensure_schema_ready, parse_uuid, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for clinician profiles.
pub trait ProfileRepository {
    /// Loads the profile of `owner`, if one was saved.
    fn get_profile(&self, owner: OwnerId) -> RepoResult<Option<ClinicianProfile>>;
    /// Inserts or replaces the profile keyed by `profile.owner`.
    fn upsert_profile(&self, profile: &ClinicianProfile) -> RepoResult<()>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            "profiles",
            &[
                "owner_uuid",
                "full_name",
                "specialty",
                "clinic_name",
                "clinic_address",
                "clinic_phone",
                "signature",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn get_profile(&self, owner: OwnerId) -> RepoResult<Option<ClinicianProfile>> {
        let row = self
            .conn
            .query_row(
                "SELECT
                    owner_uuid,
                    full_name,
                    specialty,
                    clinic_name,
                    clinic_address,
                    clinic_phone,
                    signature
                 FROM profiles
                 WHERE owner_uuid = ?1;",
                [owner.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        ClinicianProfile {
                            owner,
                            full_name: row.get(1)?,
                            specialty: row.get(2)?,
                            clinic_name: row.get(3)?,
                            clinic_address: row.get(4)?,
                            clinic_phone: row.get(5)?,
                            signature: row.get(6)?,
                        },
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((owner_text, mut profile)) => {
                profile.owner = parse_uuid(&owner_text, "profiles.owner_uuid")?;
                Ok(Some(profile))
            }
        }
    }

    fn upsert_profile(&self, profile: &ClinicianProfile) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO profiles (
                owner_uuid,
                full_name,
                specialty,
                clinic_name,
                clinic_address,
                clinic_phone,
                signature
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(owner_uuid) DO UPDATE SET
                full_name = excluded.full_name,
                specialty = excluded.specialty,
                clinic_name = excluded.clinic_name,
                clinic_address = excluded.clinic_address,
                clinic_phone = excluded.clinic_phone,
                signature = excluded.signature,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                profile.owner.to_string(),
                profile.full_name,
                profile.specialty,
                profile.clinic_name,
                profile.clinic_address,
                profile.clinic_phone,
                profile.signature,
            ],
        )?;
        Ok(())
    }
}
