use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use crate::error::DbError;
use crate::models::db_config::PoolConfig;
use crate::pool::ConnectionPool;
use crate::udbc::driver::Driver;
#[cfg(feature = "mysql")]
use crate::udbc_mysql::MysqlDriver;

struct Registered {
    pool: Arc<ConnectionPool>,
    refs: usize,
}

struct RegistryInner {
    driver: Arc<dyn Driver>,
    pools: DashMap<String, Registered>,
}

/// 连接池注册表：按名称共享连接池，并按引用计数回收
///
/// Created once at service start and passed to every client factory; clones
/// share the same pools. Call [`PoolRegistry::shutdown`] on service stop.
#[derive(Clone)]
pub struct PoolRegistry {
    inner: Arc<RegistryInner>,
}

impl PoolRegistry {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                driver,
                pools: DashMap::new(),
            }),
        }
    }

    /// 使用 mysql_async 驱动的注册表
    #[cfg(feature = "mysql")]
    pub fn mysql() -> Self {
        Self::new(Arc::new(MysqlDriver::new()))
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.inner.driver
    }

    /// Returns the pool registered under `name`, creating it from `config` if absent.
    ///
    /// Resolution is atomic per name: concurrent calls for a new name build a
    /// single pool. A name that is already registered with a different
    /// configuration is rejected with [`DbError::Config`].
    pub fn resolve_or_create(
        &self,
        name: &str,
        config: &PoolConfig,
    ) -> Result<Arc<ConnectionPool>, DbError> {
        match self.inner.pools.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                let registered = entry.get_mut();
                if registered.pool.config() != config {
                    return Err(DbError::Config(format!(
                        "pool {:?} is already registered with a different configuration",
                        name
                    )));
                }
                registered.refs += 1;
                debug!(pool = name, refs = registered.refs, "reusing shared pool");
                Ok(registered.pool.clone())
            }
            Entry::Vacant(entry) => {
                let pool = Arc::new(ConnectionPool::new(
                    name,
                    config.clone(),
                    self.inner.driver.clone(),
                )?);
                info!(
                    pool = name,
                    host = %config.host,
                    port = config.port,
                    database = %config.database,
                    max_size = config.pool_max_size,
                    "created pool"
                );
                entry.insert(Registered {
                    pool: pool.clone(),
                    refs: 1,
                });
                Ok(pool)
            }
        }
    }

    /// 释放一个引用；引用计数归零时移除并关闭连接池
    pub async fn release(&self, name: &str) {
        self.release_matching(name, None).await
    }

    /// Like [`PoolRegistry::release`], but only if `name` still maps to `pool`.
    pub(crate) async fn release_pool(&self, pool: &Arc<ConnectionPool>) {
        self.release_matching(pool.name(), Some(pool)).await
    }

    async fn release_matching(&self, name: &str, expected: Option<&Arc<ConnectionPool>>) {
        if let Some(pool) = self.retire(name, expected) {
            pool.shutdown().await;
        }
    }

    /// 引用计数减一；归零时从注册表移除并返回该连接池，由调用方负责关闭
    pub(crate) fn retire(
        &self,
        name: &str,
        expected: Option<&Arc<ConnectionPool>>,
    ) -> Option<Arc<ConnectionPool>> {
        match self.inner.pools.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                let registered = entry.get_mut();
                if expected.is_some_and(|p| !Arc::ptr_eq(p, &registered.pool)) {
                    return None;
                }
                registered.refs = registered.refs.saturating_sub(1);
                debug!(pool = name, refs = registered.refs, "released pool reference");
                if registered.refs == 0 {
                    Some(entry.remove().pool)
                } else {
                    None
                }
            }
            Entry::Vacant(_) => None,
        }
    }

    /// 关闭所有连接池
    pub async fn shutdown(&self) {
        let names: Vec<String> = self.inner.pools.iter().map(|e| e.key().clone()).collect();
        for name in names {
            if let Some((_, registered)) = self.inner.pools.remove(&name) {
                registered.pool.shutdown().await;
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.pools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.pools.is_empty()
    }

    pub fn ref_count(&self, name: &str) -> usize {
        self.inner.pools.get(name).map(|r| r.refs).unwrap_or(0)
    }

    pub fn pool(&self, name: &str) -> Option<Arc<ConnectionPool>> {
        self.inner.pools.get(name).map(|r| r.pool.clone())
    }
}
