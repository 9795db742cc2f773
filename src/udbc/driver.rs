use crate::error::DbError;
use crate::models::db_config::PoolConfig;
use crate::udbc::connection::Connection;
use async_trait::async_trait;

/// Opens sessions to a database endpoint. Pools call it on demand.
#[async_trait]
pub trait Driver: Send + Sync {
    fn r#type(&self) -> &str;

    async fn connect(&self, config: &PoolConfig) -> Result<Box<dyn Connection>, DbError>;
}
