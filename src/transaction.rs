use crate::error::DbError;
use crate::pool::PooledConnection;
use crate::udbc::result::{ResultSet, UpdateResult};
use crate::udbc::value::to_params;
use serde::Serialize;

/// 连接的事务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// 没有进行中的事务
    Idle,
    /// 已执行语句，等待 commit / rollback
    Active,
    /// 连接已归还，不能再使用
    Closed,
}

/// A checked-out connection for multi-statement transactions.
///
/// The first statement issued while idle opens a transaction; `commit` and
/// `rollback` end it and the next statement opens a new one. `close` hands
/// the connection back to its pool (rolling back anything uncommitted).
/// Dropping an unclosed `SqlConnection` releases it in the background.
pub struct SqlConnection {
    conn: Option<PooledConnection>,
}

impl SqlConnection {
    pub(crate) fn new(conn: PooledConnection) -> Self {
        Self { conn: Some(conn) }
    }

    pub fn state(&self) -> TransactionState {
        match &self.conn {
            None => TransactionState::Closed,
            Some(c) if c.in_transaction() => TransactionState::Active,
            Some(_) => TransactionState::Idle,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn open(&mut self) -> Result<&mut PooledConnection, DbError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DbError::TransactionState("connection is closed".into()))
    }

    async fn in_transaction(&mut self) -> Result<&mut PooledConnection, DbError> {
        let conn = self.open()?;
        if !conn.in_transaction() {
            conn.begin().await?;
        }
        Ok(conn)
    }

    /// 执行不返回结果的语句
    pub async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.in_transaction().await?.execute(sql).await
    }

    /// 执行查询，`params` 为位置参数（元组、Vec<Value>、`()` 或 `None`）
    pub async fn query<P>(&mut self, sql: &str, params: &P) -> Result<ResultSet, DbError>
    where
        P: Serialize + ?Sized,
    {
        let params = to_params(params)?;
        self.in_transaction().await?.query(sql, &params).await
    }

    pub async fn update<P>(&mut self, sql: &str, params: &P) -> Result<UpdateResult, DbError>
    where
        P: Serialize + ?Sized,
    {
        let params = to_params(params)?;
        self.in_transaction().await?.update(sql, &params).await
    }

    pub async fn commit(&mut self) -> Result<(), DbError> {
        self.open()?.commit().await
    }

    pub async fn rollback(&mut self) -> Result<(), DbError> {
        self.open()?.rollback().await
    }

    /// 归还连接到连接池；重复调用不会报错
    pub async fn close(&mut self) -> Result<(), DbError> {
        if let Some(conn) = self.conn.take() {
            conn.release().await;
        }
        Ok(())
    }
}
