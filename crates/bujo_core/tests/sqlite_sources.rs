use bujo_core::db::open_db_in_memory;
use bujo_core::source::{CollectionProvider, LedgerStore, ProjectDirectory, TaskStore};
use bujo_core::{
    AggregationConfig, AggregationQuery, Aggregator, DateWindow, SourceError, SqliteStore,
    TransactionType, TypeRouter,
};
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;

const SEED: &str = "
    INSERT INTO projects (id, name, owner, kind, parent_id, position) VALUES
        (1, 'Home', 'ann', 'task-list', NULL, 1),
        (2, 'Chores', 'ann', 'task-list', 1, 0),
        (3, 'Inbox', 'ann', 'task-list', NULL, 0),
        (4, 'Budget', 'bob', 'ledger', NULL, 0),
        (5, 'Private', 'bob', 'task-list', NULL, 1);
    INSERT INTO project_shares (project_id, username) VALUES (4, 'ann');

    INSERT INTO tasks (id, project_id, name, due_date, due_time, duration, timezone) VALUES
        (10, 2, 'laundry', '2020-03-01', '23:30', 30, 'America/New_York'),
        (11, 2, 'dishes', '2020-03-02', NULL, NULL, 'America/New_York'),
        (12, 2, 'someday', NULL, NULL, NULL, 'UTC'),
        (13, 2, 'later', '2020-04-01', NULL, NULL, 'UTC');

    INSERT INTO transactions (id, project_id, name, payer, amount, transaction_type, date, time, timezone) VALUES
        (20, 4, 'rent', 'bob', 950.0, 'EXPENSE', '2020-03-01', '09:00:00', 'Europe/Berlin'),
        (21, 4, 'salary', 'ann', 2100.0, 'INCOME', '2020-03-02', NULL, 'Europe/Berlin');

    INSERT INTO notifications (id, recipient, title, originator, notification_type, created_at) VALUES
        (1, 'ann', 'older', 'bob', 'MESSAGE', 100),
        (2, 'ann', 'newer', 'bob', 'MESSAGE', 200),
        (3, 'bob', 'other', 'ann', 'MESSAGE', 300);

    INSERT INTO user_groups (id, name, owner, is_default) VALUES
        (7, 'family', 'bob', 0),
        (8, 'solo', 'cat', 1);
    INSERT INTO group_users (group_id, username, accepted) VALUES
        (7, 'ann', 1),
        (7, 'bob', 1),
        (8, 'cat', 1);
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seeded_store() -> SqliteStore {
    let conn = open_db_in_memory().expect("in-memory db should open");
    conn.execute_batch(SEED).expect("seed should apply");
    SqliteStore::new(conn)
}

#[test]
fn task_rows_are_filtered_by_native_due_date() {
    let store = seeded_store();
    let window = DateWindow::new(date(2020, 3, 1), date(2020, 3, 2));

    let tasks = store.tasks_due_within(2, &window).expect("tasks should load");
    let ids: Vec<i64> = tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert_eq!(tasks[0].due_time, NaiveTime::from_hms_opt(23, 30, 0));
    assert_eq!(tasks[0].duration, Some(30));
    assert_eq!(tasks[0].timezone, chrono_tz::America::New_York);
}

#[test]
fn transaction_rows_map_every_column() {
    let store = seeded_store();
    let window = DateWindow::new(date(2020, 3, 1), date(2020, 3, 1));

    let transactions = store
        .transactions_within(4, &window)
        .expect("transactions should load");
    assert_eq!(transactions.len(), 1);
    let rent = &transactions[0];
    assert_eq!(rent.name, "rent");
    assert_eq!(rent.transaction_type, TransactionType::Expense);
    assert_eq!(rent.time, NaiveTime::from_hms_opt(9, 0, 0));
    assert!((rent.amount - 950.0).abs() < f64::EPSILON);
}

#[test]
fn directory_lists_owned_and_shared_projects() {
    let store = seeded_store();
    let ids: Vec<i64> = store
        .accessible_projects("ann")
        .expect("directory should list")
        .iter()
        .map(|project| project.id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[test]
fn owned_projects_follow_position_and_nest_children() {
    let store = seeded_store();
    let owned = store.owned_projects("ann").expect("owned projects should load");

    let roots: Vec<&str> = owned.iter().map(|record| record.name.as_str()).collect();
    assert_eq!(roots, vec!["Inbox", "Home"]);
    assert_eq!(owned[1].sub_projects.len(), 1);
    assert_eq!(owned[1].sub_projects[0].name, "Chores");

    let shared = store.shared_projects("ann").expect("shared projects should load");
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].owner, "bob");
}

#[test]
fn notifications_are_newest_first_and_groups_carry_members() {
    let store = seeded_store();

    let notifications = store.notifications("ann").expect("notifications should load");
    let titles: Vec<&str> = notifications.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["newer", "older"]);

    let groups = store.groups("ann").expect("groups should load");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "family");
    assert!(!groups[0].default);
    let members: Vec<&str> = groups[0].users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(members, vec!["ann", "bob"]);
}

#[test]
fn invalid_persisted_zone_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    conn.execute_batch(
        "INSERT INTO projects (id, name, owner, kind) VALUES (1, 'Home', 'ann', 'task-list');
         INSERT INTO tasks (id, project_id, name, due_date, timezone)
         VALUES (1, 1, 'broken', '2020-03-01', 'Mars/Olympus');",
    )
    .expect("seed should apply");
    let store = SqliteStore::new(conn);

    let err = store
        .tasks_due_within(1, &DateWindow::new(date(2020, 3, 1), date(2020, 3, 1)))
        .expect_err("unknown zone must not be masked");
    assert!(matches!(err, SourceError::InvalidData(message) if message.contains("tasks.timezone")));
}

#[test]
fn aggregates_over_sqlite_store_in_requested_zone() {
    let store = Arc::new(seeded_store());
    let projects = store.accessible_projects("ann").expect("directory should list");
    let aggregator = Aggregator::new(TypeRouter::standard(store), AggregationConfig::default())
        .expect("default config should be valid");

    let query = AggregationQuery::parse(&["task-list", "ledger"], "2020-03-01", "2020-03-02", "UTC")
        .expect("query should parse");
    let buckets = aggregator
        .aggregate(&projects, &query)
        .expect("aggregation should succeed");

    // 23:30 in New York on 03-01 is 04:30 UTC on 03-02; the Berlin rent
    // (09:00 on 03-01) stays on 03-01 and the salary (00:00 on 03-02) moves
    // back to 03-01 at 23:00 UTC.
    let summary: Vec<(NaiveDate, Vec<i64>, Vec<i64>)> = buckets
        .iter()
        .map(|bucket| {
            (
                bucket.date,
                bucket.tasks.iter().map(|task| task.id).collect(),
                bucket.transactions.iter().map(|t| t.id).collect(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (date(2020, 3, 2), vec![10, 11], vec![]),
            (date(2020, 3, 1), vec![], vec![20, 21]),
        ]
    );
}

#[test]
fn range_at_the_end_of_year_9999_still_finds_items() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    conn.execute_batch(
        "INSERT INTO projects (id, name, owner, kind) VALUES (1, 'Far', 'ann', 'task-list');
         INSERT INTO tasks (id, project_id, name, due_date, timezone)
         VALUES (1, 1, 'last call', '9999-12-30', 'UTC');",
    )
    .expect("seed should apply");
    let store = Arc::new(SqliteStore::new(conn));
    let projects = store.accessible_projects("ann").expect("directory should list");
    let aggregator = Aggregator::new(TypeRouter::standard(store), AggregationConfig::default())
        .expect("default config should be valid");

    let query = AggregationQuery::parse(&["task-list"], "9999-12-01", "9999-12-31", "UTC")
        .expect("query should parse");
    let buckets = aggregator
        .aggregate(&projects, &query)
        .expect("aggregation should succeed");

    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].date, date(9999, 12, 30));
    assert_eq!(buckets[0].tasks[0].id, 1);
}
