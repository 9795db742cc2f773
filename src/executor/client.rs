use crate::error::DbError;
use crate::pool::{ConnectionPool, PoolStats, PooledConnection};
use crate::registry::PoolRegistry;
use crate::transaction::SqlConnection;
use crate::udbc::result::{ResultSet, UpdateResult};
use crate::udbc::value::to_params;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// 数据库客户端，绑定注册表中的一个连接池
///
/// `execute` / `query` / `update` each borrow a connection for one statement
/// in autocommit mode and hand it back before returning. Use
/// [`SqlClient::connection`] to run several statements in one transaction.
/// Dropping a client that was never closed releases its pool reference on a
/// spawned task.
pub struct SqlClient {
    registry: PoolRegistry,
    pool: Arc<ConnectionPool>,
    closed: AtomicBool,
}

impl SqlClient {
    pub(crate) fn new(registry: PoolRegistry, pool: Arc<ConnectionPool>) -> Self {
        Self {
            registry,
            pool,
            closed: AtomicBool::new(false),
        }
    }

    pub fn pool_name(&self) -> &str {
        self.pool.name()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn acquire(&self) -> Result<PooledConnection, DbError> {
        if self.is_closed() {
            return Err(DbError::PoolClosed(format!(
                "client for pool {} is closed",
                self.pool.name()
            )));
        }
        self.pool.acquire().await
    }

    /// 借出一个连接，用于多语句事务
    pub async fn connection(&self) -> Result<SqlConnection, DbError> {
        Ok(SqlConnection::new(self.acquire().await?))
    }

    pub async fn execute(&self, sql: &str) -> Result<(), DbError> {
        let mut conn = self.acquire().await?;
        let result = conn.execute(sql).await;
        conn.release().await;
        result
    }

    pub async fn query<P>(&self, sql: &str, params: &P) -> Result<ResultSet, DbError>
    where
        P: Serialize + ?Sized,
    {
        let params = to_params(params)?;
        let mut conn = self.acquire().await?;
        let result = conn.query(sql, &params).await;
        conn.release().await;
        result
    }

    pub async fn update<P>(&self, sql: &str, params: &P) -> Result<UpdateResult, DbError>
    where
        P: Serialize + ?Sized,
    {
        let params = to_params(params)?;
        let mut conn = self.acquire().await?;
        let result = conn.update(sql, &params).await;
        conn.release().await;
        result
    }

    /// 释放对连接池的引用；最后一个客户端关闭时连接池随之关闭
    pub async fn close(&self) -> Result<(), DbError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(pool = self.pool.name(), "closing client");
            self.registry.release_pool(&self.pool).await;
        }
        Ok(())
    }
}

impl Drop for SqlClient {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let registry = self.registry.clone();
                let pool = self.pool.clone();
                handle.spawn(async move {
                    debug!(pool = pool.name(), "client dropped without close");
                    registry.release_pool(&pool).await;
                });
            }
            Err(_) => {
                // 没有运行时，只能移除注册项，空闲连接随连接池一起丢弃
                self.registry.retire(self.pool.name(), Some(&self.pool));
            }
        }
    }
}
