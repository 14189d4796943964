//! Directory backend selection from config.

use std::sync::Arc;
use std::time::Duration;

use intake_core::{CompanyDirectory, DirectorySource, HttpDirectory, MemoryDirectory};

pub async fn build_directory(source: &DirectorySource) -> anyhow::Result<Arc<dyn CompanyDirectory>> {
    match source {
        DirectorySource::Memory { entries } => {
            tracing::info!(entries = entries.len(), "using in-memory company directory");
            Ok(Arc::new(MemoryDirectory::from_entries(entries.iter().cloned())))
        }
        DirectorySource::Http {
            url,
            request_timeout_ms,
        } => {
            let directory =
                HttpDirectory::with_timeout(url.clone(), Duration::from_millis(*request_timeout_ms))?;
            tracing::info!(
                url = directory.url(),
                request_timeout_ms = *request_timeout_ms,
                "using HTTP company directory"
            );
            Ok(Arc::new(directory))
        }
        DirectorySource::Postgres { url_env } => connect_postgres(url_env).await,
    }
}

#[cfg(feature = "postgres")]
async fn connect_postgres(url_env: &str) -> anyhow::Result<Arc<dyn CompanyDirectory>> {
    use anyhow::Context;
    use sqlx::postgres::PgPoolOptions;

    let url = std::env::var(url_env).with_context(|| format!("{url_env} must be set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .context("failed to connect to company directory database")?;
    tracing::info!("using Postgres company directory");
    Ok(Arc::new(intake_core::PgDirectory::new(pool)))
}

#[cfg(not(feature = "postgres"))]
async fn connect_postgres(_url_env: &str) -> anyhow::Result<Arc<dyn CompanyDirectory>> {
    anyhow::bail!("postgres directory requires building with the `postgres` feature")
}
