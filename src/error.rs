use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the pool, the registry and the connection facades.
#[derive(Error, Debug)]
pub enum DbError {
    /// 配置错误，例如端口无法解析
    #[error("Configuration error: {0}")]
    Config(String),
    /// 在连接超时时间内没有可用连接
    #[error("Timed out after {0:?} waiting for a connection")]
    Timeout(Duration),
    #[error("Pool closed: {0}")]
    PoolClosed(String),
    /// Driver-reported statement failure. `broken` marks a session that cannot be reused.
    #[error("SQL error{}: {message}", fmt_code(.code))]
    Sql {
        code: Option<u16>,
        message: String,
        broken: bool,
    },
    #[error("Transaction state error: {0}")]
    TransactionState(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Value error: {0}")]
    Value(String),
}

fn fmt_code(code: &Option<u16>) -> String {
    code.map(|c| format!(" [{}]", c)).unwrap_or_default()
}

impl DbError {
    pub fn sql(code: Option<u16>, message: impl Into<String>) -> Self {
        DbError::Sql {
            code,
            message: message.into(),
            broken: false,
        }
    }

    /// 会话已损坏的错误（连接需要丢弃）
    pub fn broken(message: impl Into<String>) -> Self {
        DbError::Sql {
            code: None,
            message: message.into(),
            broken: true,
        }
    }

    /// True when the session that produced this error must not go back to the idle set.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, DbError::Sql { broken: true, .. } | DbError::Connection(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Timeout(_))
    }
}

impl serde::de::Error for DbError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        DbError::Value(msg.to_string())
    }
}

impl serde::ser::Error for DbError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        DbError::Value(msg.to_string())
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for DbError {
    fn from(e: mysql_async::Error) -> Self {
        match e {
            mysql_async::Error::Server(server) => DbError::sql(Some(server.code), server.message),
            mysql_async::Error::Url(e) => DbError::Config(e.to_string()),
            other => DbError::broken(other.to_string()),
        }
    }
}
