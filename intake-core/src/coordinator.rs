//! Enrichment coordinator: bounded-latency company lookup.
//!
//! `enrich` races a directory lookup against a ceiling and always resolves
//! by the ceiling with a normalised [`LookupResult`]. The lookup runs in its
//! own task and reports through a oneshot slot; the slot is read at most
//! once, so whichever of {lookup, timer} resolves first decides the outcome.
//! A lookup that finishes late sends into a dropped receiver and its result
//! is discarded. Nothing here returns an error to the caller: directory
//! faults are logged and folded into "not found".

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::bucket::bucket_for;
use crate::directory::CompanyDirectory;
use crate::email::domain_of;
use crate::types::{LookupResult, SizeBucket};

/// Reference latency budget for a lookup.
pub const DEFAULT_CEILING: Duration = Duration::from_millis(300);

/// Why an enrichment produced the result it did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichOutcome {
    /// No `@`-delimited domain; the directory was not consulted.
    InvalidEmail,
    Found,
    NotFound,
    /// The ceiling elapsed before the directory answered.
    TimedOut,
    /// The directory errored or the lookup task died.
    Failed,
}

impl EnrichOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid_email",
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub result: LookupResult,
    pub outcome: EnrichOutcome,
    pub elapsed: Duration,
}

/// Company fields derived from a successful lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Prefill {
    pub company_name: String,
    pub size_bucket: SizeBucket,
}

impl Prefill {
    pub fn from_lookup(result: &LookupResult) -> Option<Self> {
        result.company().map(|c| Prefill {
            company_name: c.name.clone(),
            size_bucket: bucket_for(c.min_size, c.max_size),
        })
    }
}

#[derive(Clone)]
pub struct EnrichmentCoordinator {
    directory: Arc<dyn CompanyDirectory>,
    ceiling: Duration,
}

impl EnrichmentCoordinator {
    pub fn new(directory: Arc<dyn CompanyDirectory>) -> Self {
        Self::with_ceiling(directory, DEFAULT_CEILING)
    }

    pub fn with_ceiling(directory: Arc<dyn CompanyDirectory>, ceiling: Duration) -> Self {
        Self { directory, ceiling }
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub async fn enrich(&self, email: &str) -> LookupResult {
        self.resolve(email).await.result
    }

    pub async fn resolve(&self, email: &str) -> Resolution {
        let started = Instant::now();

        let Some(domain) = domain_of(email) else {
            tracing::debug!("email has no domain, skipping company lookup");
            return Resolution {
                result: LookupResult::not_found(),
                outcome: EnrichOutcome::InvalidEmail,
                elapsed: started.elapsed(),
            };
        };
        let domain = domain.to_string();

        let (tx, rx) = oneshot::channel();
        let directory = Arc::clone(&self.directory);
        let task_domain = domain.clone();
        tokio::spawn(async move {
            let result = directory.lookup(&task_domain).await;
            if let Err(unclaimed) = tx.send(result) {
                match unclaimed {
                    Ok(late) => tracing::debug!(
                        domain = %task_domain,
                        found = late.found,
                        "lookup resolved after the race was decided, discarding"
                    ),
                    Err(e) => tracing::debug!(
                        domain = %task_domain,
                        error = %e,
                        "lookup failed after the race was decided, discarding"
                    ),
                }
            }
        });

        let (result, outcome) = match tokio::time::timeout(self.ceiling, rx).await {
            Ok(Ok(Ok(result))) => match result.company() {
                Some(company) => (
                    LookupResult::found(company.clone()),
                    EnrichOutcome::Found,
                ),
                None => (LookupResult::not_found(), EnrichOutcome::NotFound),
            },
            Ok(Ok(Err(e))) => {
                tracing::warn!(domain = %domain, error = %e, "company lookup failed");
                (LookupResult::not_found(), EnrichOutcome::Failed)
            }
            Ok(Err(_)) => {
                tracing::warn!(domain = %domain, "company lookup task ended without a result");
                (LookupResult::not_found(), EnrichOutcome::Failed)
            }
            Err(_) => {
                tracing::info!(
                    domain = %domain,
                    ceiling_ms = self.ceiling.as_millis() as u64,
                    "company lookup exceeded ceiling, falling back to manual entry"
                );
                (LookupResult::not_found(), EnrichOutcome::TimedOut)
            }
        };

        let elapsed = started.elapsed();
        tracing::debug!(
            domain = %domain,
            outcome = outcome.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "enrichment resolved"
        );

        Resolution {
            result,
            outcome,
            elapsed,
        }
    }
}
