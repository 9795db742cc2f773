use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::error::DbError;

/// 默认连接池名称
pub const DEFAULT_POOL_NAME: &str = "DEFAULT_MYSQL_POOL";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_DATABASE: &str = "testdb";
pub const DEFAULT_USER: &str = "vertx";
pub const DEFAULT_PASSWORD: &str = "password";
pub const DEFAULT_CHARSET: &str = "UTF-8";
/// 获取连接的超时时间（毫秒）
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10_000;
pub const DEFAULT_TEST_TIMEOUT: u64 = 10_000;
pub const DEFAULT_POOL_MAX_SIZE: usize = 10;

/// 连接池配置。连接池创建后持有自己的一份拷贝，不再改变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub charset: String,
    pub connect_timeout_ms: u64,
    pub test_timeout_ms: u64,
    pub pool_max_size: usize, // 设置池最大连接数
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            username: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT,
            test_timeout_ms: DEFAULT_TEST_TIMEOUT,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(i64),
    Text(String),
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawConfig {
    host: Option<String>,
    port: Option<PortValue>,
    database: Option<String>,
    #[serde(alias = "user")]
    username: Option<String>,
    password: Option<String>,
    charset: Option<String>,
    #[serde(alias = "connectTimeout")]
    connect_timeout_ms: Option<u64>,
    test_timeout_ms: Option<u64>,
    #[serde(alias = "maxPoolSize")]
    pool_max_size: Option<usize>,
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 配置对象构建，未指定的字段使用默认值
    ///
    /// Recognised keys: `host`, `port`, `database`, `username` (or `user`), `password`,
    /// `charset`, `connectTimeoutMs`, `testTimeoutMs`, `poolMaxSize`.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, DbError> {
        let raw: RawConfig = serde_json::from_value(json.clone())
            .map_err(|e| DbError::Config(format!("Invalid pool configuration: {}", e)))?;
        let defaults = Self::default();

        let port = match raw.port {
            None => defaults.port,
            Some(PortValue::Number(n)) => u16::try_from(n)
                .map_err(|_| DbError::Config(format!("Port out of range: {}", n)))?,
            Some(PortValue::Text(s)) => s
                .trim()
                .parse::<u16>()
                .map_err(|_| DbError::Config(format!("Unparsable port: {:?}", s)))?,
        };

        let config = Self {
            host: raw.host.unwrap_or(defaults.host),
            port,
            database: raw.database.unwrap_or(defaults.database),
            username: raw.username.unwrap_or(defaults.username),
            password: raw.password.unwrap_or(defaults.password),
            charset: raw.charset.unwrap_or(defaults.charset),
            connect_timeout_ms: raw.connect_timeout_ms.unwrap_or(defaults.connect_timeout_ms),
            test_timeout_ms: raw.test_timeout_ms.unwrap_or(defaults.test_timeout_ms),
            pool_max_size: raw.pool_max_size.unwrap_or(defaults.pool_max_size),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DbError> {
        if self.pool_max_size == 0 {
            return Err(DbError::Config("poolMaxSize must be greater than 0".into()));
        }
        if self.pool_max_size > Semaphore::MAX_PERMITS {
            return Err(DbError::Config(format!(
                "poolMaxSize must not exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.host.is_empty() {
            return Err(DbError::Config("host must not be empty".into()));
        }
        Ok(())
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.connect_timeout_ms = timeout;
        self
    }

    pub fn test_timeout_ms(mut self, timeout: u64) -> Self {
        self.test_timeout_ms = timeout;
        self
    }

    pub fn pool_max_size(mut self, max_size: usize) -> Self {
        self.pool_max_size = max_size;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3306);
        assert_eq!(config.database, "testdb");
        assert_eq!(config.username, "vertx");
        assert_eq!(config.password, "password");
        assert_eq!(config.charset, "UTF-8");
        assert_eq!(config.connect_timeout(), Duration::from_millis(10_000));
        assert_eq!(config.test_timeout(), Duration::from_millis(10_000));
        assert_eq!(config.pool_max_size, 10);
    }

    #[test]
    fn test_from_json_partial() {
        let config = PoolConfig::from_json(&json!({
            "host": "db.internal",
            "port": "3307",
            "user": "app",
            "poolMaxSize": 2,
            "connectTimeoutMs": 500,
            "unknown": true
        }))
        .unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.username, "app");
        assert_eq!(config.pool_max_size, 2);
        assert_eq!(config.connect_timeout_ms, 500);
        assert_eq!(config.database, DEFAULT_DATABASE);
    }

    #[test]
    fn test_from_json_empty_object_is_default() {
        assert_eq!(PoolConfig::from_json(&json!({})).unwrap(), PoolConfig::default());
    }

    #[test]
    fn test_from_json_bad_port() {
        let err = PoolConfig::from_json(&json!({ "port": "mysql" })).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));

        let err = PoolConfig::from_json(&json!({ "port": 70000 })).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let err = PoolConfig::from_json(&json!({ "poolMaxSize": 0 })).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_oversized_pool_rejected() {
        let err = PoolConfig::from_json(&json!({ "poolMaxSize": u64::MAX })).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));

        let config = PoolConfig::default().pool_max_size(usize::MAX);
        assert!(matches!(config.validate(), Err(DbError::Config(_))));
        let at_limit = PoolConfig::default().pool_max_size(Semaphore::MAX_PERMITS);
        assert!(at_limit.validate().is_ok());
    }
}
