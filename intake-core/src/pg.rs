//! Postgres-backed directory over the `company_lookup` table.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::directory::CompanyDirectory;
use crate::error::DirectoryError;
use crate::types::{Company, LookupResult};

pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyDirectory for PgDirectory {
    async fn lookup(&self, domain: &str) -> Result<LookupResult, DirectoryError> {
        // lower() = lower() rather than ILIKE: `_` and `%` in a domain must not
        // act as wildcards.
        let row = sqlx::query_as::<_, (Option<String>, i64, i64)>(
            r#"
            SELECT name, min_size::bigint, max_size::bigint
            FROM company_lookup
            WHERE lower(domain) = lower($1)
            LIMIT 1
            "#,
        )
        .bind(domain.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some((name, min_size, max_size)) => LookupResult::found(Company {
                name: name.unwrap_or_default(),
                min_size,
                max_size,
            }),
            None => LookupResult::not_found(),
        })
    }
}
