use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout_at;
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::models::db_config::PoolConfig;
use crate::udbc::connection::Connection;
use crate::udbc::driver::Driver;
use crate::udbc::result::{ResultSet, UpdateResult};
use crate::udbc::value::Value;

/// 连接池当前状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub idle: usize,
    pub checked_out: usize,
    pub waiting: usize,
    pub max_size: usize,
}

struct PoolState {
    idle: VecDeque<Box<dyn Connection>>,
    checked_out: usize,
    closed: bool,
}

/// A bounded set of sessions to one endpoint.
///
/// Every live or connecting session holds one permit of a fair semaphore, so
/// `pool_max_size` bounds the number of sessions and callers waiting for a
/// permit are served in arrival order. Bookkeeping lives behind a mutex that
/// is never held across an `.await`.
pub struct ConnectionPool {
    name: String,
    config: PoolConfig,
    driver: Arc<dyn Driver>,
    permits: Arc<Semaphore>,
    state: Mutex<PoolState>,
    waiting: AtomicUsize,
}

struct WaitGuard<'a>(&'a AtomicUsize);

impl<'a> WaitGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConnectionPool {
    pub fn new(
        name: impl Into<String>,
        config: PoolConfig,
        driver: Arc<dyn Driver>,
    ) -> Result<Self, DbError> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            permits: Arc::new(Semaphore::new(config.pool_max_size)),
            config,
            driver,
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                checked_out: 0,
                closed: false,
            }),
            waiting: AtomicUsize::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            idle: state.idle.len(),
            checked_out: state.checked_out,
            waiting: self.waiting.load(Ordering::SeqCst),
            max_size: self.config.pool_max_size,
        }
    }

    fn closed_error(&self) -> DbError {
        DbError::PoolClosed(self.name.clone())
    }

    /// 获取一个连接：优先复用空闲连接，未达上限时新建，否则排队等待
    ///
    /// Waiting and connecting share one deadline of `connect_timeout_ms`.
    /// Dropping the returned future while it waits leaves the queue.
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledConnection, DbError> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        let timeout = self.config.connect_timeout();
        let deadline = tokio::time::Instant::now() + timeout;

        let permit = {
            let _waiting = WaitGuard::enter(&self.waiting);
            match timeout_at(deadline, self.permits.clone().acquire_owned()).await {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(self.closed_error()),
                Err(_) => return Err(DbError::Timeout(timeout)),
            }
        };

        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(self.closed_error());
            }
            if let Some(conn) = state.idle.pop_front() {
                state.checked_out += 1;
                return Ok(PooledConnection::new(conn, self.clone(), permit));
            }
        }

        let conn = match timeout_at(deadline, self.driver.connect(&self.config)).await {
            Ok(conn) => conn?,
            Err(_) => return Err(DbError::Timeout(timeout)),
        };

        let closed = {
            let mut state = self.state.lock();
            if !state.closed {
                state.checked_out += 1;
            }
            state.closed
        };
        if closed {
            let _ = conn.disconnect().await;
            return Err(self.closed_error());
        }
        debug!(pool = %self.name, "opened new connection");
        Ok(PooledConnection::new(conn, self.clone(), permit))
    }

    /// 归还连接
    ///
    /// A connection with an open transaction is rolled back first. Broken
    /// sessions, failed rollbacks and connections of a closed pool are
    /// disconnected and their slot is freed for a replacement.
    pub async fn release(&self, mut pooled: PooledConnection) {
        let Some(mut conn) = pooled.conn.take() else {
            return;
        };
        let permit = pooled.permit.take();

        let mut reusable = !pooled.broken;
        if reusable && pooled.in_transaction {
            if let Err(e) = conn.rollback().await {
                warn!(pool = %self.name, error = %e, "rollback on release failed, discarding connection");
                reusable = false;
            }
        }

        let discarded = {
            let mut state = self.state.lock();
            state.checked_out -= 1;
            if reusable && !state.closed {
                state.idle.push_back(conn);
                None
            } else {
                Some(conn)
            }
        };

        if let Some(conn) = discarded {
            debug!(pool = %self.name, broken = pooled.broken, "closing connection");
            if let Err(e) = conn.disconnect().await {
                warn!(pool = %self.name, error = %e, "disconnect failed");
            }
        }
        drop(permit);
    }

    /// 关闭连接池：拒绝新的获取请求并关闭所有空闲连接
    ///
    /// Checked-out connections are closed when they come back.
    pub async fn shutdown(&self) {
        let idle: Vec<_> = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.idle.drain(..).collect()
        };
        self.permits.close();
        info!(pool = %self.name, idle = idle.len(), "pool shut down");
        for conn in idle {
            if let Err(e) = conn.disconnect().await {
                warn!(pool = %self.name, error = %e, "disconnect failed");
            }
        }
    }
}

/// 从连接池借出的连接，使用完毕后通过 `release` 归还
///
/// Dropping it without releasing hands it back on a spawned task.
pub struct PooledConnection {
    conn: Option<Box<dyn Connection>>,
    pool: Arc<ConnectionPool>,
    permit: Option<OwnedSemaphorePermit>,
    in_transaction: bool,
    broken: bool,
}

impl PooledConnection {
    fn new(conn: Box<dyn Connection>, pool: Arc<ConnectionPool>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            conn: Some(conn),
            pool,
            permit: Some(permit),
            in_transaction: false,
            broken: false,
        }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub async fn release(self) {
        let pool = self.pool.clone();
        pool.release(self).await;
    }

    fn session(&mut self) -> Result<&mut Box<dyn Connection>, DbError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DbError::TransactionState("connection already released".into()))
    }

    fn track<T>(&mut self, result: Result<T, DbError>) -> Result<T, DbError> {
        if let Err(e) = &result {
            if e.is_session_fatal() && !self.broken {
                warn!(pool = %self.pool.name, error = %e, "session broken");
                self.broken = true;
            }
        }
        result
    }

    pub async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        let start = Instant::now();
        let result = self.session()?.execute(sql).await;
        let err = result.as_ref().err().map(|e| e.to_string());
        debug!(sql, elapsed_ms = start.elapsed().as_millis() as u64, error = ?err, "execute");
        self.track(result)
    }

    pub async fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DbError> {
        let start = Instant::now();
        let result = self.session()?.query(sql, params).await;
        let rows = result.as_ref().ok().map(|rs| rs.len());
        let err = result.as_ref().err().map(|e| e.to_string());
        debug!(sql, ?params, elapsed_ms = start.elapsed().as_millis() as u64, ?rows, error = ?err, "query");
        self.track(result)
    }

    pub async fn update(&mut self, sql: &str, params: &[Value]) -> Result<UpdateResult, DbError> {
        let start = Instant::now();
        let result = self.session()?.update(sql, params).await;
        let affected = result.as_ref().ok().map(|r| r.updated);
        let err = result.as_ref().err().map(|e| e.to_string());
        debug!(sql, ?params, elapsed_ms = start.elapsed().as_millis() as u64, ?affected, error = ?err, "update");
        self.track(result)
    }

    pub async fn begin(&mut self) -> Result<(), DbError> {
        if self.in_transaction {
            return Err(DbError::TransactionState("transaction already active".into()));
        }
        let result = self.session()?.begin().await;
        self.track(result)?;
        self.in_transaction = true;
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<(), DbError> {
        if !self.in_transaction {
            return Err(DbError::TransactionState("commit without an active transaction".into()));
        }
        let result = self.session()?.commit().await;
        // 服务端收到 COMMIT 后事务即结束，失败时同样回到 Idle
        self.in_transaction = false;
        self.track(result)
    }

    pub async fn rollback(&mut self) -> Result<(), DbError> {
        if !self.in_transaction {
            return Err(DbError::TransactionState("rollback without an active transaction".into()));
        }
        let result = self.session()?.rollback().await;
        // 服务端收到 ROLLBACK 后事务即结束，失败时同样回到 Idle
        self.in_transaction = false;
        self.track(result)
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let orphan = PooledConnection {
                    conn: Some(conn),
                    pool: self.pool.clone(),
                    permit: self.permit.take(),
                    in_transaction: self.in_transaction,
                    broken: self.broken,
                };
                handle.spawn(orphan.release());
            }
            Err(_) => {
                // 没有运行时，无法断开会话，只更新计数
                self.pool.state.lock().checked_out -= 1;
                drop(conn);
            }
        }
    }
}
