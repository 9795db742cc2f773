use crate::error::DbError;
use crate::udbc::result::{ResultSet, UpdateResult};
use crate::udbc::value::Value;
use async_trait::async_trait;

/// One live session handed out by a [`Driver`](crate::udbc::driver::Driver).
///
/// The pool gives a session exactly one owner at a time, so every call takes
/// `&mut self` and statements on one session never interleave.
#[async_trait]
pub trait Connection: Send {
    /// 执行不返回结果集的语句（DDL 等）
    async fn execute(&mut self, sql: &str) -> Result<(), DbError>;

    /// 执行查询。`params` 为空时按原样发送 SQL，否则使用预处理语句。
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DbError>;

    async fn update(&mut self, sql: &str, params: &[Value]) -> Result<UpdateResult, DbError>;

    // ---------- transaction ----------
    async fn begin(&mut self) -> Result<(), DbError>;
    async fn commit(&mut self) -> Result<(), DbError>;
    async fn rollback(&mut self) -> Result<(), DbError>;

    /// 关闭底层会话
    async fn disconnect(self: Box<Self>) -> Result<(), DbError>;
}
