//! CLI command tests

use tempfile::TempDir;

use crate::commands::{self, truncate};

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a much longer string", 10), "a much ...");
}

#[test]
fn test_cmd_init_and_empty_reports() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("savor.db");

    commands::cmd_init(&db_path).unwrap();
    commands::cmd_reports(&db_path, 10).unwrap();
}

#[tokio::test]
async fn test_cmd_analyze_save_round_trip() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("sales.csv");
    std::fs::write(&csv_path, "Category,Net Sales,Guests\nFood,100,4\n").unwrap();
    let db_path = dir.path().join("savor.db");

    commands::cmd_analyze(
        &db_path,
        &[csv_path],
        "Joe's Diner",
        Some("November"),
        None,
        true,
        true,
    )
    .await
    .unwrap();

    let db = commands::open_db(&db_path).unwrap();
    let reports = db.list_reports(None, 10).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].restaurant_name, "Joe's Diner");
    assert_eq!(reports[0].report_type, "category_rollup");
    assert_eq!(reports[0].kpis.net_sales, Some(100.0));
    assert_eq!(reports[0].owner_email, "local-cli");
}

#[tokio::test]
async fn test_cmd_analyze_fails_when_nothing_readable() {
    let dir = TempDir::new().unwrap();
    let bad_path = dir.path().join("bad.csv");
    std::fs::write(&bad_path, "nothing,recognizable\n1,2\n").unwrap();
    let db_path = dir.path().join("savor.db");

    let result = commands::cmd_analyze(&db_path, &[bad_path], "Joe's", None, None, false, false)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_analyze_missing_file() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("savor.db");
    let missing = dir.path().join("does-not-exist.csv");

    let result =
        commands::cmd_analyze(&db_path, &[missing], "Joe's", None, None, false, false).await;

    assert!(result.is_err());
}
