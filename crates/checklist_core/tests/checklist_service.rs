use checklist_core::db::open_db_in_memory;
use checklist_core::{
    ChecklistDetails, ChecklistService, ChecklistServiceError, ClinicianProfile,
    ProfileRepository, SqliteChecklistRepository, SqliteProfileRepository,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn service(conn: &Connection) -> ChecklistService<SqliteChecklistRepository<'_>> {
    ChecklistService::new(SqliteChecklistRepository::try_new(conn).unwrap())
}

fn insert_item(conn: &Connection, checklist_id: Uuid, content: &str, sort_order: i64, seq: i64) {
    conn.execute(
        "INSERT INTO checklist_items (item_uuid, checklist_uuid, content, sort_order, created_seq)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            Uuid::new_v4().to_string(),
            checklist_id.to_string(),
            content,
            sort_order,
            seq
        ],
    )
    .unwrap();
}

#[test]
fn create_trims_and_falls_back_to_default_title() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = Uuid::new_v4();

    let named = service
        .create_checklist(
            owner,
            ChecklistDetails::new("  Discharge  ")
                .with_description("   ")
                .with_specialty_tag(" Cardiology "),
        )
        .unwrap();
    let untitled = service
        .create_checklist(owner, ChecklistDetails::default())
        .unwrap();

    assert_eq!(named.title, "Discharge");
    assert_eq!(named.description, None);
    assert_eq!(named.specialty_tag.as_deref(), Some("Cardiology"));
    assert_eq!(untitled.specialty_tag, None);
    assert!(!named.is_published);
    assert_eq!(untitled.title, "New checklist");
    assert_eq!(service.get_checklist(named.id).unwrap(), named);
}

#[test]
fn blank_title_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .create_checklist(Uuid::new_v4(), ChecklistDetails::new(" \t"))
        .unwrap_err();
    assert!(matches!(err, ChecklistServiceError::InvalidTitle));
}

#[test]
fn update_and_publish_unknown_checklist_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = Uuid::new_v4();
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.update_details(owner, missing, ChecklistDetails::new("Title")),
        Err(ChecklistServiceError::ChecklistNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.set_published(owner, missing, true),
        Err(ChecklistServiceError::ChecklistNotFound(_))
    ));
    assert!(matches!(
        service.get_checklist(missing),
        Err(ChecklistServiceError::ChecklistNotFound(_))
    ));
}

#[test]
fn search_and_summary_are_scoped_to_owner() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = Uuid::new_v4();
    let colleague = Uuid::new_v4();

    let cardio = service
        .create_checklist(
            owner,
            ChecklistDetails::new("Cardiology follow-up").with_description("After stent placement"),
        )
        .unwrap();
    service
        .create_checklist(owner, ChecklistDetails::new("Pre-op"))
        .unwrap();
    service
        .create_checklist(colleague, ChecklistDetails::new("Cardiology intake"))
        .unwrap();
    service.set_published(owner, cardio.id, true).unwrap();

    let by_title = service.search(owner, "CARDIO").unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].id, cardio.id);
    assert_eq!(service.search(owner, "stent").unwrap().len(), 1);
    assert_eq!(service.search(owner, "  ").unwrap().len(), 2);

    let summary = service.summary(owner).unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.published, 1);
    assert_eq!(summary.drafts, 1);
}

#[test]
fn update_details_replaces_title_description_and_specialty() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = Uuid::new_v4();
    let checklist = service
        .create_checklist(owner, ChecklistDetails::new("Draft").with_specialty_tag("Dermatology"))
        .unwrap();

    service
        .update_details(
            owner,
            checklist.id,
            ChecklistDetails::new(" Wound care ")
                .with_description("Daily")
                .with_specialty_tag(" Plastic surgery "),
        )
        .unwrap();

    let reloaded = service.get_checklist(checklist.id).unwrap();
    assert_eq!(reloaded.title, "Wound care");
    assert_eq!(reloaded.description.as_deref(), Some("Daily"));
    assert_eq!(reloaded.specialty_tag.as_deref(), Some("Plastic surgery"));

    service
        .update_details(owner, checklist.id, ChecklistDetails::new("Wound care"))
        .unwrap();
    assert_eq!(service.get_checklist(checklist.id).unwrap().specialty_tag, None);
}

#[test]
fn mutations_from_another_owner_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let checklist = service
        .create_checklist(owner, ChecklistDetails::new("Pre-op"))
        .unwrap();

    assert!(matches!(
        service.update_details(stranger, checklist.id, ChecklistDetails::new("Hijacked")),
        Err(ChecklistServiceError::ChecklistNotFound(id)) if id == checklist.id
    ));
    assert!(matches!(
        service.set_published(stranger, checklist.id, true),
        Err(ChecklistServiceError::ChecklistNotFound(_))
    ));
    assert!(matches!(
        service.delete_checklist(stranger, checklist.id),
        Err(ChecklistServiceError::ChecklistNotFound(_))
    ));

    assert_eq!(service.get_checklist(checklist.id).unwrap(), checklist);
}

#[test]
fn shared_view_shows_author_clinic_and_ordered_items() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = Uuid::new_v4();
    let checklist = service
        .create_checklist(owner, ChecklistDetails::new("Post-op").with_description("Day one"))
        .unwrap();
    let mut profile = ClinicianProfile::empty(owner);
    profile.full_name = "Dr. Ada Moss".to_string();
    profile.clinic_name = "North Clinic".to_string();
    SqliteProfileRepository::try_new(&conn)
        .unwrap()
        .upsert_profile(&profile)
        .unwrap();
    for (content, sort_order, seq) in [("Rest", 4, 1), ("Ice the knee", 1, 2), ("Walk", 4, 3)] {
        insert_item(&conn, checklist.id, content, sort_order, seq);
    }

    let view = service.shared_view(checklist.id).unwrap();

    assert_eq!(view.id, checklist.id);
    assert_eq!(view.title, "Post-op");
    assert_eq!(view.description.as_deref(), Some("Day one"));
    assert_eq!(view.author_name.as_deref(), Some("Dr. Ada Moss"));
    assert_eq!(view.clinic_name.as_deref(), Some("North Clinic"));
    let contents: Vec<&str> = view
        .entries
        .iter()
        .map(|entry| entry.payload.content.as_str())
        .collect();
    assert_eq!(contents, vec!["Ice the knee", "Rest", "Walk"]);
}

#[test]
fn shared_view_without_profile_and_for_missing_checklist() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = Uuid::new_v4();
    let checklist = service
        .create_checklist(owner, ChecklistDetails::new("Discharge"))
        .unwrap();
    SqliteProfileRepository::try_new(&conn)
        .unwrap()
        .upsert_profile(&ClinicianProfile::empty(owner))
        .unwrap();

    let view = service.shared_view(checklist.id).unwrap();
    assert_eq!(view.author_name, None);
    assert_eq!(view.clinic_name, None);
    assert!(view.entries.is_empty());

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.shared_view(missing),
        Err(ChecklistServiceError::ChecklistNotFound(id)) if id == missing
    ));
}

#[test]
fn delete_removes_checklist_and_items() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = Uuid::new_v4();
    let checklist = service
        .create_checklist(owner, ChecklistDetails::default())
        .unwrap();
    insert_item(&conn, checklist.id, "Rest", 0, 1);

    service.delete_checklist(owner, checklist.id).unwrap();

    assert!(service.list_for_owner(owner).unwrap().is_empty());
    let items: i64 = conn
        .query_row("SELECT COUNT(*) FROM checklist_items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(items, 0);
    assert!(matches!(
        service.delete_checklist(owner, checklist.id),
        Err(ChecklistServiceError::ChecklistNotFound(_))
    ));
}

#[test]
fn profile_upsert_replaces_existing_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    assert_eq!(repo.get_profile(owner).unwrap(), None);

    let mut profile = ClinicianProfile::empty(owner);
    profile.full_name = "Dr. Ada Moss".to_string();
    repo.upsert_profile(&profile).unwrap();

    profile.clinic_name = "North Clinic".to_string();
    profile.signature = Some("data:image/png;base64,AAAA".to_string());
    repo.upsert_profile(&profile).unwrap();

    assert_eq!(repo.get_profile(owner).unwrap(), Some(profile));
}
