//! Storage-level tests: CRUD, the company cascade, and retention pruning.
//! These run against a real SQLite database in a temp dir.

use rapidd::assessment::{completion, AssessmentPath, AssessmentStatus, ResponseMap};
use rapidd::auth::{self, AuthError};
use rapidd::catalog;
use rapidd::storage::Storage;
use std::collections::BTreeSet;
use tempfile::TempDir;

/// Helper: create a fresh Storage in a temp dir.
async fn make_storage(dir: &TempDir) -> Storage {
    Storage::new(dir.path()).await.expect("storage init failed")
}

#[tokio::test]
async fn user_roundtrip_and_unique_email() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;

    let user = storage
        .create_user("ana@example.com", "Ana", "hash")
        .await
        .expect("create user");
    let by_email = storage
        .get_user_by_email("ana@example.com")
        .await
        .unwrap()
        .expect("found");
    assert_eq!(by_email.id, user.id);
    assert_eq!(by_email.display_name, "Ana");

    // Same email again violates the UNIQUE constraint.
    assert!(storage
        .create_user("ana@example.com", "Other", "hash2")
        .await
        .is_err());
}

#[tokio::test]
async fn auth_session_lifecycle_and_pruning() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;
    let user = storage
        .create_user("u@example.com", "U", "hash")
        .await
        .unwrap();

    let future = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
    let past = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
    storage
        .create_auth_session("digest-live", &user.id, &future)
        .await
        .unwrap();
    storage
        .create_auth_session("digest-expired", &user.id, &past)
        .await
        .unwrap();

    let pruned = storage.prune_expired_auth_sessions().await.unwrap();
    assert_eq!(pruned, 1);
    assert!(storage
        .get_auth_session("digest-live")
        .await
        .unwrap()
        .is_some());
    assert!(storage
        .get_auth_session("digest-expired")
        .await
        .unwrap()
        .is_none());

    storage.delete_auth_session("digest-live").await.unwrap();
    assert!(storage
        .get_auth_session("digest-live")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn authenticate_rejects_and_deletes_expired_sessions() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;
    let user = storage
        .create_user("e@example.com", "E", "hash")
        .await
        .unwrap();

    let token = "stale-token";
    let past = (chrono::Utc::now() - chrono::Duration::minutes(5)).to_rfc3339();
    storage
        .create_auth_session(&auth::token_digest(token), &user.id, &past)
        .await
        .unwrap();

    let header = format!("Bearer {token}");
    let err = auth::authenticate(&storage, Some(&header))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));

    // Lookup removes the row immediately, without waiting for the sweep.
    assert!(storage
        .get_auth_session(&auth::token_digest(token))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn duplicate_registration_is_email_taken() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;

    auth::register(&storage, "dup@example.com", "One", "password123")
        .await
        .expect("first registration");

    // The second insert hits the UNIQUE index and must not surface as an
    // internal error.
    let err = auth::register(&storage, "dup@example.com", "Two", "password123")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
    assert_eq!(storage.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn company_update_and_list_order() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;

    let c = storage
        .create_company("Acme", "widgets", "user-1")
        .await
        .unwrap();
    let updated = storage
        .update_company(&c.id, "Acme Corp", "more widgets")
        .await
        .unwrap()
        .expect("exists");
    assert_eq!(updated.name, "Acme Corp");
    assert!(updated.updated_at >= c.updated_at);

    assert!(storage
        .update_company("missing", "x", "y")
        .await
        .unwrap()
        .is_none());

    let list = storage.list_companies().await.unwrap();
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn deleting_company_cascades_to_assessments_and_reports() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;

    let company = storage.create_company("Acme", "", "user-1").await.unwrap();
    let assessment = storage
        .create_assessment(&company.id, "Q3", AssessmentPath::Exploratory, "user-1")
        .await
        .unwrap();
    storage
        .upsert_report(
            &assessment.id,
            &company.id,
            "Acme",
            "Q3",
            "exploratory",
            "<html></html>",
            "user-1",
        )
        .await
        .unwrap();

    assert!(storage.delete_company(&company.id).await.unwrap());
    assert!(storage.get_company(&company.id).await.unwrap().is_none());
    assert!(storage
        .get_assessment(&assessment.id)
        .await
        .unwrap()
        .is_none());
    assert!(storage
        .get_report_for_assessment(&assessment.id)
        .await
        .unwrap()
        .is_none());

    // Deleting again reports not-found.
    assert!(!storage.delete_company(&company.id).await.unwrap());
}

#[tokio::test]
async fn save_responses_roundtrips_documents() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;
    let company = storage.create_company("Acme", "", "u").await.unwrap();
    let row = storage
        .create_assessment(&company.id, "Q3", AssessmentPath::Migration, "u")
        .await
        .unwrap();
    assert_eq!(row.status, "draft");
    assert_eq!(row.response_map().unwrap(), ResponseMap::new());

    let path = AssessmentPath::Migration;
    let mut responses = ResponseMap::new();
    responses
        .entry("data_readiness".to_string())
        .or_default()
        .insert("dr_migration_format".to_string(), "CSV dumps".to_string());
    let touched: BTreeSet<String> = ["data_readiness".to_string()].into_iter().collect();
    let statuses = completion::rebuild_status_map(
        path,
        &responses,
        &Default::default(),
        &touched,
        "2026-08-28T00:00:00Z",
    );
    storage
        .save_responses(&row.id, &responses, &statuses, AssessmentStatus::InProgress)
        .await
        .unwrap();

    let row = storage.get_assessment(&row.id).await.unwrap().unwrap();
    assert_eq!(row.status, "in_progress");
    let loaded = row.response_map().unwrap();
    assert_eq!(loaded["data_readiness"]["dr_migration_format"], "CSV dumps");
    let status_map = row.category_status_map().unwrap();
    assert_eq!(status_map.len(), catalog::CATEGORY_ORDER.len());
    assert_eq!(
        status_map["data_readiness"].last_modified,
        "2026-08-28T00:00:00Z"
    );
}

#[tokio::test]
async fn upsert_report_replaces_previous() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;
    let company = storage.create_company("Acme", "", "u").await.unwrap();
    let a = storage
        .create_assessment(&company.id, "Q3", AssessmentPath::Exploratory, "u")
        .await
        .unwrap();

    storage
        .upsert_report(&a.id, &company.id, "Acme", "Q3", "exploratory", "v1", "u")
        .await
        .unwrap();
    storage
        .upsert_report(&a.id, &company.id, "Acme", "Q3", "exploratory", "v2", "u")
        .await
        .unwrap();

    let report = storage
        .get_report_for_assessment(&a.id)
        .await
        .unwrap()
        .expect("report");
    assert_eq!(report.html_content, "v2");
    assert_eq!(storage.count_reports().await.unwrap(), 1);
}

#[tokio::test]
async fn stale_draft_pruning_spares_recent_and_in_progress() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;
    let company = storage.create_company("Acme", "", "u").await.unwrap();
    storage
        .create_assessment(&company.id, "fresh draft", AssessmentPath::Exploratory, "u")
        .await
        .unwrap();

    // days = 0 disables pruning entirely.
    assert_eq!(storage.prune_stale_drafts(0).await.unwrap(), 0);
    // A fresh draft survives a 30-day cutoff.
    assert_eq!(storage.prune_stale_drafts(30).await.unwrap(), 0);
    assert_eq!(storage.count_assessments().await.unwrap(), 1);
}
