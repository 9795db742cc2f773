use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Column, Conn, Params, Row as MyRow};

use crate::error::DbError;
use crate::udbc::connection::Connection;
use crate::udbc::result::{ResultSet, UpdateResult};
use crate::udbc::value::Value;
use crate::udbc_mysql::value_codec::{from_mysql_value, to_mysql_value};

pub struct MysqlConnection {
    conn: Conn,
}

impl MysqlConnection {
    pub fn new(conn: Conn) -> Self {
        Self { conn }
    }

    fn params(args: &[Value]) -> Params {
        Params::Positional(args.iter().map(to_mysql_value).collect())
    }

    fn column_names(columns: Option<&[Column]>) -> Vec<String> {
        columns
            .unwrap_or_default()
            .iter()
            .map(|c| c.name_str().into_owned())
            .collect()
    }

    fn map_row(row: &MyRow) -> Vec<Value> {
        (0..row.len())
            .map(|i| row.as_ref(i).map(from_mysql_value).unwrap_or(Value::Null))
            .collect()
    }
}

#[async_trait]
impl Connection for MysqlConnection {
    async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.conn.query_drop(sql).await?;
        Ok(())
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DbError> {
        // 无参数时走文本协议，SQL 原样发送
        let (columns, rows) = if params.is_empty() {
            let result = self.conn.query_iter(sql).await?;
            let columns = Self::column_names(result.columns().as_deref());
            let rows: Vec<MyRow> = result.collect_and_drop().await?;
            (columns, rows)
        } else {
            let result = self.conn.exec_iter(sql, Self::params(params)).await?;
            let columns = Self::column_names(result.columns().as_deref());
            let rows: Vec<MyRow> = result.collect_and_drop().await?;
            (columns, rows)
        };
        ResultSet::new(columns, rows.iter().map(Self::map_row).collect())
    }

    async fn update(&mut self, sql: &str, params: &[Value]) -> Result<UpdateResult, DbError> {
        if params.is_empty() {
            self.conn.query_drop(sql).await?;
        } else {
            self.conn.exec_drop(sql, Self::params(params)).await?;
        }
        let mut result = UpdateResult::new(self.conn.affected_rows());
        if let Some(id) = self.conn.last_insert_id().filter(|id| *id > 0) {
            result = result.with_key(id);
        }
        Ok(result)
    }

    async fn begin(&mut self) -> Result<(), DbError> {
        self.conn.query_drop("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.conn.query_drop("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.conn.query_drop("ROLLBACK").await?;
        Ok(())
    }

    async fn disconnect(self: Box<Self>) -> Result<(), DbError> {
        self.conn.disconnect().await?;
        Ok(())
    }
}
