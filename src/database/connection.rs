use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;

/// 连接统一经 Arc 在服务间共享；启用 mock 特性编译时
/// sea-orm 不再为 DatabaseConnection 派生 Clone
pub type DbPool = Arc<DatabaseConnection>;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool.as_ref(), None).await?;
    Ok(())
}
