use std::sync::Arc;

use crate::{adapters::persistence::PostgresPersistence, infra::db::init_db};

pub mod app;
pub mod code_store;
pub mod config;
pub mod db;
pub mod error;
pub mod geolocation;
pub mod http_client;
pub mod notification_queue;
pub mod notification_worker;
pub mod revocation;
pub mod setup;

pub async fn postgres_persistence(
    database_url: &str,
) -> Result<Arc<PostgresPersistence>, error::InfraError> {
    let pool = init_db(database_url).await?;
    Ok(Arc::new(PostgresPersistence::new(pool)))
}
