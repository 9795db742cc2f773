mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use asyncsql::error::DbError;
use asyncsql::{MySqlClient, TransactionState, Value};
use common::{BROKEN, MockDriver, config};

#[tokio::test]
async fn test_absent_and_empty_params_run_literal_sql() {
    let driver = MockDriver::new();
    let registry = driver.registry();
    let client = MySqlClient::create_shared(&registry, config(1), "literal").unwrap();

    let absent: Option<Vec<Value>> = None;
    client.query("SELECT * FROM t", &absent).await.unwrap();
    client.query("SELECT * FROM t", &Vec::<Value>::new()).await.unwrap();
    client.query("SELECT * FROM t", &()).await.unwrap();
    let rs = client.query("SELECT * FROM t WHERE id = ?", &(7,)).await.unwrap();

    assert_eq!(
        driver.log(),
        vec![
            "1 query[literal] SELECT * FROM t",
            "1 query[literal] SELECT * FROM t",
            "1 query[literal] SELECT * FROM t",
            "1 query[prepared/1] SELECT * FROM t WHERE id = ?",
        ]
    );
    assert_eq!(rs.row(0).unwrap().get("p0"), Some(&Value::I32(7)));
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_first_statement_opens_transaction() {
    let driver = MockDriver::new();
    let registry = driver.registry();
    let client = MySqlClient::create_shared(&registry, config(1), "tx").unwrap();

    let mut conn = client.connection().await.unwrap();
    assert_eq!(conn.state(), TransactionState::Idle);

    conn.update("INSERT INTO t VALUES (?)", &(1,)).await.unwrap();
    assert_eq!(conn.state(), TransactionState::Active);
    conn.update("INSERT INTO t VALUES (?)", &(2,)).await.unwrap();
    conn.commit().await.unwrap();
    assert_eq!(conn.state(), TransactionState::Idle);

    conn.execute("DELETE FROM t").await.unwrap();
    assert_eq!(conn.state(), TransactionState::Active);
    conn.rollback().await.unwrap();
    assert_eq!(conn.state(), TransactionState::Idle);
    conn.close().await.unwrap();

    assert_eq!(
        driver.log(),
        vec![
            "1 BEGIN",
            "1 update[prepared/1] INSERT INTO t VALUES (?)",
            "1 update[prepared/1] INSERT INTO t VALUES (?)",
            "1 COMMIT",
            "1 BEGIN",
            "1 execute DELETE FROM t",
            "1 ROLLBACK",
        ]
    );
}

#[tokio::test]
async fn test_commit_without_transaction_is_rejected() {
    let driver = MockDriver::new();
    let registry = driver.registry();
    let client = MySqlClient::create_shared(&registry, config(1), "idle").unwrap();

    let mut conn = client.connection().await.unwrap();
    assert!(matches!(conn.commit().await, Err(DbError::TransactionState(_))));
    assert!(matches!(conn.rollback().await, Err(DbError::TransactionState(_))));
    // the connection stays usable
    conn.query("SELECT 1", &()).await.unwrap();
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_close_twice_is_ok_and_not_duplicated() {
    let driver = MockDriver::new();
    let registry = driver.registry();
    let client = MySqlClient::create_shared(&registry, config(2), "twice").unwrap();

    let mut conn = client.connection().await.unwrap();
    conn.close().await.unwrap();
    conn.close().await.unwrap();
    assert_eq!(conn.state(), TransactionState::Closed);
    assert_eq!(client.stats().idle, 1);
    assert_eq!(client.stats().checked_out, 0);

    let err = conn.execute("SELECT 1").await.unwrap_err();
    assert!(matches!(err, DbError::TransactionState(_)));
    assert!(matches!(conn.commit().await, Err(DbError::TransactionState(_))));
}

#[tokio::test]
async fn test_close_rolls_back_uncommitted_work() {
    let driver = MockDriver::new();
    let registry = driver.registry();
    let client = MySqlClient::create_shared(&registry, config(1), "uncommitted").unwrap();

    let mut conn = client.connection().await.unwrap();
    conn.update("UPDATE t SET a = 1", &()).await.unwrap();
    conn.close().await.unwrap();

    assert_eq!(driver.log().last().unwrap(), "1 ROLLBACK");
    assert_eq!(client.stats().idle, 1);
}

#[tokio::test]
async fn test_statements_on_one_connection_run_in_order() {
    let driver = MockDriver::new();
    driver.set_statement_delay(Duration::from_millis(5));
    let registry = driver.registry();
    let client = MySqlClient::create_shared(&registry, config(1), "order").unwrap();

    let mut conn = client.connection().await.unwrap();
    for i in 0..5 {
        conn.update(&format!("INSERT INTO t VALUES ({})", i), &())
            .await
            .unwrap();
    }
    conn.commit().await.unwrap();
    conn.close().await.unwrap();

    let inserts: Vec<String> = driver
        .log()
        .into_iter()
        .filter(|l| l.contains("INSERT"))
        .collect();
    let expected: Vec<String> = (0..5)
        .map(|i| format!("1 update[literal] INSERT INTO t VALUES ({})", i))
        .collect();
    assert_eq!(inserts, expected);
}

#[tokio::test]
async fn test_broken_session_is_not_reused_after_close() {
    let driver = MockDriver::new();
    let registry = driver.registry();
    let client = MySqlClient::create_shared(&registry, config(1), "broken").unwrap();

    let mut conn = client.connection().await.unwrap();
    let err = conn
        .query(&format!("SELECT 1 {}", BROKEN), &())
        .await
        .unwrap_err();
    assert!(err.is_session_fatal());
    conn.close().await.unwrap();
    assert_eq!(driver.disconnects(), 1);

    let rs = client.query("SELECT 1", &()).await.unwrap();
    assert_eq!(rs.row(0).unwrap().get("conn").unwrap().as_i64(), Some(2));
}

#[tokio::test]
async fn test_dropped_connection_is_released() {
    let driver = MockDriver::new();
    let registry = driver.registry();
    let client = MySqlClient::create_shared(&registry, config(1), "dropped").unwrap();

    {
        let mut conn = client.connection().await.unwrap();
        conn.update("INSERT INTO t VALUES (1)", &()).await.unwrap();
    }

    let rs = tokio::time::timeout(Duration::from_secs(1), client.query("SELECT 1", &()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rs.row(0).unwrap().get("conn").unwrap().as_i64(), Some(1));
    assert!(driver.log().contains(&"1 ROLLBACK".to_string()));
}

#[tokio::test]
async fn test_failed_commit_ends_transaction() {
    let driver = MockDriver::new();
    let registry = driver.registry();
    let client = MySqlClient::create_shared(&registry, config(1), "commit").unwrap();

    let mut conn = client.connection().await.unwrap();
    conn.update("INSERT INTO t VALUES (1)", &()).await.unwrap();
    driver.state.fail_commit.store(true, Ordering::SeqCst);
    let err = conn.commit().await.unwrap_err();
    assert!(matches!(err, DbError::Sql { code: Some(1180), .. }));
    assert_eq!(conn.state(), TransactionState::Idle);

    // the next statement opens a fresh transaction on the same session
    driver.state.fail_commit.store(false, Ordering::SeqCst);
    conn.update("INSERT INTO t VALUES (2)", &()).await.unwrap();
    assert_eq!(conn.state(), TransactionState::Active);
    conn.commit().await.unwrap();
    conn.close().await.unwrap();

    assert_eq!(
        driver.log(),
        vec![
            "1 BEGIN",
            "1 update[literal] INSERT INTO t VALUES (1)",
            "1 COMMIT",
            "1 BEGIN",
            "1 update[literal] INSERT INTO t VALUES (2)",
            "1 COMMIT",
        ]
    );
    assert_eq!(driver.disconnects(), 0);
}
