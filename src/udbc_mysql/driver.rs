use crate::error::DbError;
use crate::models::db_config::PoolConfig;
use crate::udbc::connection::Connection;
use crate::udbc::driver::Driver;
use crate::udbc_mysql::connection::MysqlConnection;
use async_trait::async_trait;
use mysql_async::{Conn, OptsBuilder};
use tracing::debug;

const MYSQL_TYPE: &str = "mysql";

/// 基于 mysql_async 的驱动，每次调用 `connect` 打开一个独立会话，由本库的连接池管理
#[derive(Debug, Default, Clone)]
pub struct MysqlDriver {
    stmt_cache_size: Option<usize>,
}

impl MysqlDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stmt_cache_size(mut self, size: usize) -> Self {
        self.stmt_cache_size = Some(size);
        self
    }

    fn opts(&self, config: &PoolConfig) -> OptsBuilder {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .db_name(Some(config.database.clone()))
            .user(Some(config.username.clone()))
            .pass(Some(config.password.clone()))
            .init(vec![format!("SET NAMES {}", mysql_charset(&config.charset))]);
        if let Some(size) = self.stmt_cache_size {
            builder = builder.stmt_cache_size(size);
        }
        builder
    }
}

/// Maps a charset name such as `UTF-8` to the MySQL character set name.
pub fn mysql_charset(charset: &str) -> String {
    let normalized = charset.trim().to_ascii_lowercase().replace(['-', '_'], "");
    match normalized.as_str() {
        "utf8" | "utf8mb4" => "utf8mb4".to_string(),
        "utf8mb3" => "utf8mb3".to_string(),
        "iso88591" | "latin1" => "latin1".to_string(),
        "usascii" | "ascii" => "ascii".to_string(),
        _ => normalized,
    }
}

#[async_trait]
impl Driver for MysqlDriver {
    fn r#type(&self) -> &str {
        MYSQL_TYPE
    }

    async fn connect(&self, config: &PoolConfig) -> Result<Box<dyn Connection>, DbError> {
        debug!(host = %config.host, port = config.port, database = %config.database, "opening mysql session");
        let conn = Conn::new(self.opts(config))
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(Box::new(MysqlConnection::new(conn)))
    }
}
