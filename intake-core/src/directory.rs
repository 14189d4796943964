//! Company directory capability.
//!
//! The directory is an external collaborator: the coordinator only needs
//! "given a domain, tell me whether a company is on record". Backends:
//! - [`MemoryDirectory`]: in-process table, used by tests and the dev server
//! - [`crate::http::HttpDirectory`]: remote lookup endpoint over HTTP
//! - `PgDirectory`: `company_lookup` table (feature `postgres`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::email::normalize_domain;
use crate::error::DirectoryError;
use crate::types::{Company, LookupResult};

/// Domain-keyed company lookup.
///
/// Matching is case-insensitive and exact: `Acme.io` matches `acme.io`,
/// never `mail.acme.io`. When several records share a domain only one is
/// returned.
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<LookupResult, DirectoryError>;
}

/// One row of the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub domain: String,
    pub name: String,
    pub min_size: i64,
    pub max_size: i64,
}

impl DirectoryEntry {
    pub fn company(&self) -> Company {
        Company {
            name: self.name.clone(),
            min_size: self.min_size,
            max_size: self.max_size,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: RwLock<Vec<(String, DirectoryEntry)>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let rows = entries
            .into_iter()
            .map(|e| (normalize_domain(&e.domain), e))
            .collect();
        Self {
            entries: RwLock::new(rows),
        }
    }

    /// Append a record. Earlier records for the same domain keep winning.
    pub async fn insert(&self, entry: DirectoryEntry) {
        let key = normalize_domain(&entry.domain);
        self.entries.write().await.push((key, entry));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CompanyDirectory for MemoryDirectory {
    async fn lookup(&self, domain: &str) -> Result<LookupResult, DirectoryError> {
        let key = normalize_domain(domain);
        let entries = self.entries.read().await;
        let hit = entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, entry)| entry.company());
        Ok(hit.map(LookupResult::found).unwrap_or_else(LookupResult::not_found))
    }
}
