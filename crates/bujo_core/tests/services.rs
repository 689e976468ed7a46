use bujo_core::service::project_items::PROJECT_DIRECTORY_SOURCE;
use bujo_core::source::memory::{Fixture, InMemoryStore, COLLECTION_PROJECT_DIRECTORY};
use bujo_core::{
    AggregationConfig, AggregationError, Aggregator, ProjectItemsService, SignalError,
    SystemUpdatesService, TypeRouter, UpdateSignalCoordinator, UpdateTarget,
};
use std::sync::Arc;

const FIXTURE: &str = r#"{
    "projects": [
        {"id": 1, "name": "Chores", "owner": "ann", "kind": "task-list"},
        {"id": 2, "name": "Budget", "owner": "bob", "kind": "ledger", "sharedWith": ["ann"]},
        {"id": 3, "name": "Secret", "owner": "bob", "kind": "task-list"}
    ],
    "tasks": [
        {"id": 1, "projectId": 1, "name": "laundry", "dueDate": "2020-03-01", "timezone": "UTC"},
        {"id": 2, "projectId": 3, "name": "hidden", "dueDate": "2020-03-01", "timezone": "UTC"}
    ],
    "transactions": [
        {"id": 5, "projectId": 2, "name": "rent", "payer": "bob", "amount": 900.0,
         "transactionType": "EXPENSE", "date": "2020-03-01", "timezone": "UTC"}
    ],
    "groups": [{"id": 9, "name": "family", "owner": "ann"}]
}"#;

fn items_service(store: InMemoryStore) -> ProjectItemsService {
    let store = Arc::new(store);
    let aggregator = Aggregator::new(TypeRouter::standard(store.clone()), AggregationConfig::default())
        .expect("default config should be valid");
    ProjectItemsService::new(store, aggregator)
}

fn updates_service(store: InMemoryStore) -> SystemUpdatesService {
    SystemUpdatesService::new(UpdateSignalCoordinator::new(Arc::new(store)))
}

fn store() -> InMemoryStore {
    InMemoryStore::new(Fixture::from_json(FIXTURE).expect("fixture should parse"))
}

#[test]
fn project_items_only_reads_accessible_projects() {
    let buckets = items_service(store())
        .project_items("ann", &["todo", "ledger"], "2020-03-01", "2020-03-01", "UTC")
        .expect("items should aggregate");

    assert_eq!(buckets.len(), 1);
    let task_ids: Vec<i64> = buckets[0].tasks.iter().map(|task| task.id).collect();
    assert_eq!(task_ids, vec![1]);
    assert_eq!(buckets[0].transactions.len(), 1);
}

#[test]
fn project_items_serializes_wire_shape() {
    let buckets = items_service(store())
        .project_items("ann", &["ledger"], "2020-03-01", "2020-03-01", "UTC")
        .expect("items should aggregate");
    let json = serde_json::to_value(&buckets).expect("buckets should serialize");

    assert_eq!(json[0]["date"], "2020-03-01");
    assert_eq!(json[0]["tasks"], serde_json::json!([]));
    assert_eq!(json[0]["transactions"][0]["transactionType"], "EXPENSE");
    assert_eq!(json[0]["transactions"][0]["timezone"], "UTC");
}

#[test]
fn project_items_rejects_bad_input_before_listing_projects() {
    // A failing directory would turn any fetch into SourceUnavailable.
    let service = items_service(store().with_failing_collection(COLLECTION_PROJECT_DIRECTORY));

    let err = service
        .project_items("ann", &["ledger"], "2020-03-02", "2020-03-01", "UTC")
        .expect_err("reversed range");
    assert_eq!(err.code(), "invalid_range");

    let err = service
        .project_items("ann", &["ledger"], "2020-03-01", "2020-03-02", "Mars/Base")
        .expect_err("unknown zone");
    assert_eq!(err.code(), "invalid_timezone");

    let err = service
        .project_items("ann", &["calendar"], "2020-03-01", "2020-03-02", "UTC")
        .expect_err("unknown kind");
    assert_eq!(err.code(), "unsupported_kind");
}

#[test]
fn directory_failure_is_not_an_empty_result() {
    let service = items_service(store().with_failing_collection(COLLECTION_PROJECT_DIRECTORY));

    match service.project_items("ann", &["ledger"], "2020-03-01", "2020-03-02", "UTC") {
        Err(AggregationError::SourceUnavailable {
            source_name,
            project_id,
            ..
        }) => {
            assert_eq!(source_name, PROJECT_DIRECTORY_SOURCE);
            assert_eq!(project_id, None);
        }
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
}

#[test]
fn system_updates_honours_target_list() {
    let service = updates_service(store());

    let all = service
        .system_updates("ann", None)
        .expect("all signals should compute");
    assert_eq!(all.targets(), UpdateTarget::ALL.to_vec());

    let legacy = service
        .system_updates("ann", Some("projectsEtag"))
        .expect("legacy name should be accepted");
    assert_eq!(
        legacy.targets(),
        vec![UpdateTarget::OwnedProjects, UpdateTarget::SharedProjects]
    );
    assert_eq!(legacy.owned_projects_etag, all.owned_projects_etag);

    let err = service
        .system_updates("ann", Some("groupsEtag,everything"))
        .expect_err("unknown target");
    assert!(matches!(err, SignalError::UnsupportedTarget(name) if name == "everything"));
}
