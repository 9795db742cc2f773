pub mod error;
pub mod executor;
pub mod models;
pub mod mysql_client;
pub mod pool;
pub mod registry;
pub mod transaction;
pub mod udbc;
#[cfg(feature = "mysql")]
pub mod udbc_mysql;

pub use error::DbError;
pub use executor::client::SqlClient;
pub use models::db_config::{DEFAULT_POOL_NAME, PoolConfig};
pub use mysql_client::MySqlClient;
pub use pool::{ConnectionPool, PoolStats, PooledConnection};
pub use registry::PoolRegistry;
pub use transaction::{SqlConnection, TransactionState};
pub use udbc::result::{ResultSet, Row, UpdateResult};
pub use udbc::value::Value;
