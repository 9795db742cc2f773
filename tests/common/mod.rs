#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use asyncsql::error::DbError;
use asyncsql::udbc::connection::Connection;
use asyncsql::udbc::driver::Driver;
use asyncsql::{PoolConfig, PoolRegistry, ResultSet, UpdateResult, Value};
use parking_lot::Mutex;

/// Statements containing this marker fail as if the socket dropped.
pub const BROKEN: &str = "/*broken*/";
/// Statements containing this marker fail with a server-side syntax error.
pub const SYNTAX: &str = "/*syntax*/";

#[derive(Default)]
pub struct DriverState {
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub fail_connect: AtomicBool,
    pub fail_rollback: AtomicBool,
    pub fail_commit: AtomicBool,
    pub connect_delay: Mutex<Duration>,
    pub statement_delay: Mutex<Duration>,
    pub log: Mutex<Vec<String>>,
}

/// In-memory driver that records every call as `"<conn id> <event>"`.
#[derive(Clone, Default)]
pub struct MockDriver {
    pub state: Arc<DriverState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> PoolRegistry {
        PoolRegistry::new(Arc::new(self.clone()))
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<String> {
        self.state.log.lock().clone()
    }

    pub fn set_statement_delay(&self, delay: Duration) {
        *self.state.statement_delay.lock() = delay;
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        *self.state.connect_delay.lock() = delay;
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn r#type(&self) -> &str {
        "mock"
    }

    async fn connect(&self, _config: &PoolConfig) -> Result<Box<dyn Connection>, DbError> {
        let delay = *self.state.connect_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(DbError::Connection("connection refused".into()));
        }
        let id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(MockConnection {
            id,
            state: self.state.clone(),
        }))
    }
}

pub struct MockConnection {
    id: usize,
    state: Arc<DriverState>,
}

impl MockConnection {
    async fn run(&self, event: String, sql: &str) -> Result<(), DbError> {
        let delay = *self.state.statement_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state.log.lock().push(format!("{} {}", self.id, event));
        if sql.contains(BROKEN) {
            return Err(DbError::broken("server has gone away"));
        }
        if sql.contains(SYNTAX) {
            return Err(DbError::sql(Some(1064), "syntax error"));
        }
        Ok(())
    }

    fn mode(params: &[Value]) -> String {
        if params.is_empty() {
            "literal".to_string()
        } else {
            format!("prepared/{}", params.len())
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.run(format!("execute {}", sql), sql).await
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DbError> {
        self.run(format!("query[{}] {}", Self::mode(params), sql), sql)
            .await?;
        let mut row = vec![Value::I64(self.id as i64)];
        row.extend(params.iter().cloned());
        let mut columns = vec!["conn".to_string()];
        columns.extend((0..params.len()).map(|i| format!("p{}", i)));
        ResultSet::new(columns, vec![row])
    }

    async fn update(&mut self, sql: &str, params: &[Value]) -> Result<UpdateResult, DbError> {
        self.run(format!("update[{}] {}", Self::mode(params), sql), sql)
            .await?;
        Ok(UpdateResult::new(1).with_key(self.id as u64))
    }

    async fn begin(&mut self) -> Result<(), DbError> {
        self.run("BEGIN".into(), "").await
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.run("COMMIT".into(), "").await?;
        if self.state.fail_commit.load(Ordering::SeqCst) {
            return Err(DbError::sql(Some(1180), "Got error during COMMIT"));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.run("ROLLBACK".into(), "").await?;
        if self.state.fail_rollback.load(Ordering::SeqCst) {
            return Err(DbError::broken("rollback failed"));
        }
        Ok(())
    }

    async fn disconnect(self: Box<Self>) -> Result<(), DbError> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        self.state.log.lock().push(format!("{} disconnect", self.id));
        Ok(())
    }
}

pub fn config(max_size: usize) -> PoolConfig {
    PoolConfig::default()
        .pool_max_size(max_size)
        .connect_timeout_ms(200)
}
