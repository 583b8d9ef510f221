//! Local checklist walkthrough.
//!
//! # Responsibility
//! - Exercise the core end to end against a real database file: create a
//!   checklist, add and reorder items, print the export document and the
//!   public shared view.
//! - Keep output deterministic apart from generated ids.
//!
//! Usage: `checklist_cli <db_path> [issued_on]`. Set `CHECKLIST_LOG_DIR` to
//! an absolute directory to enable file logging.

use checklist_core::db::{open_db, share, with_connection};
use checklist_core::{
    core_version, default_log_level, init_logging, share_link, ChecklistDetails,
    ChecklistService, ChecklistServiceError, ClinicianProfile, CoordinatorConfig, EntryPayload, ExportService, ProfileRepository,
    ReconciliationCoordinator, RetryPolicy, SqliteChecklistRepository, SqliteProfileRepository,
    SqliteSequenceStore, StoreSession,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use uuid::Uuid;

const USAGE: &str = "usage: checklist_cli <db_path> [issued_on]";
const SHARE_BASE_URL: &str = "https://checklist.example";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let db_path = args.next().ok_or(USAGE)?;
    let issued_on = args.next().unwrap_or_else(|| "undated".to_string());

    if let Ok(log_dir) = std::env::var("CHECKLIST_LOG_DIR") {
        init_logging(default_log_level(), &log_dir)?;
    }
    println!("checklist_core version={}", core_version());

    let conn = open_db(&db_path)?;
    let owner = Uuid::new_v4();
    let checklist = ChecklistService::new(SqliteChecklistRepository::try_new(&conn)?)
        .create_checklist(
            owner,
            ChecklistDetails::new("Before surgery")
                .with_description("Read the evening before")
                .with_specialty_tag("General surgery"),
        )?;

    let profile = ClinicianProfile {
        full_name: "Dr. Ada Moss".to_string(),
        specialty: "General surgery".to_string(),
        clinic_name: "North Clinic".to_string(),
        ..ClinicianProfile::empty(owner)
    };
    SqliteProfileRepository::try_new(&conn)?.upsert_profile(&profile)?;

    let conn = share(conn);
    let store = SqliteSequenceStore::try_new(conn.clone(), StoreSession::new(owner))?;
    let config = CoordinatorConfig::default().with_retry(RetryPolicy::standard());
    let coordinator = ReconciliationCoordinator::load(store, checklist.id, config).await?;

    for content in [
        "No food after midnight",
        "Bring current medication list",
        "Arrange a ride home",
    ] {
        coordinator.add_entry(EntryPayload::new(content)).await?;
    }
    coordinator.move_entry(2, 0).await?;
    info!(
        "event=cli_walkthrough module=cli status=ok checklist_id={} entries={}",
        checklist.id,
        coordinator.snapshot().len()
    );

    let document = ExportService::new().build_document(
        &checklist,
        &coordinator.snapshot(),
        Some(&profile),
        &issued_on,
    );
    println!("{}", document.to_json()?);
    println!("share_link={}", share_link(SHARE_BASE_URL, checklist.id));

    let shared = with_connection(&conn, |conn| -> Result<_, ChecklistServiceError> {
        ChecklistService::new(SqliteChecklistRepository::try_new(conn)?).shared_view(checklist.id)
    })??;
    println!(
        "shared_view title={:?} author={:?} clinic={:?}",
        shared.title, shared.author_name, shared.clinic_name
    );
    for (index, entry) in shared.entries.iter().enumerate() {
        println!("  {}. {}", index + 1, entry.payload.content);
    }
    Ok(())
}
