use uuid::Uuid;

use crate::error::DbError;
use crate::executor::client::SqlClient;
use crate::models::db_config::{DEFAULT_POOL_NAME, PoolConfig};
use crate::registry::PoolRegistry;

/// MySQL 客户端工厂
///
/// ```ignore
/// let registry = PoolRegistry::mysql();
/// let client = MySqlClient::create_shared(&registry, PoolConfig::default(), "orders")?;
/// let rows = client.query("SELECT * FROM orders WHERE id = ?", &(42,)).await?;
/// client.close().await?;
/// ```
pub struct MySqlClient;

impl MySqlClient {
    /// 创建共享连接池的客户端：同名的客户端使用同一个连接池
    pub fn create_shared(
        registry: &PoolRegistry,
        config: PoolConfig,
        pool_name: &str,
    ) -> Result<SqlClient, DbError> {
        let pool = registry.resolve_or_create(pool_name, &config)?;
        Ok(SqlClient::new(registry.clone(), pool))
    }

    /// 同 [`MySqlClient::create_shared`]，使用默认池名 `DEFAULT_MYSQL_POOL`
    pub fn create_shared_default(
        registry: &PoolRegistry,
        config: PoolConfig,
    ) -> Result<SqlClient, DbError> {
        Self::create_shared(registry, config, DEFAULT_POOL_NAME)
    }

    /// 创建独占连接池的客户端
    pub fn create_non_shared(
        registry: &PoolRegistry,
        config: PoolConfig,
    ) -> Result<SqlClient, DbError> {
        let name = Uuid::new_v4().to_string();
        Self::create_shared(registry, config, &name)
    }
}
