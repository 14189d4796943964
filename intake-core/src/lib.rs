//! Intake core: progressive contact form with bounded-latency enrichment.
//!
//! A visitor enters a work email; the [`EnrichmentCoordinator`] looks the
//! domain up in a [`CompanyDirectory`] under a hard latency ceiling and the
//! [`FormSession`] state machine advances to the details step whatever the
//! outcome, pre-filling company name and size bucket only on a match.
//!
//! ```text
//!   EMAIL ──submit──▶ CHECKING ──enrich resolves──▶ DETAILS ──submit──▶ SUCCESS
//!                        │
//!                        ├─ directory lookup ─┐
//!                        └─ ceiling timer ────┴─▶ first to resolve wins
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use intake_core::{EnrichmentCoordinator, FormSession, MemoryDirectory, SimulatedSink};
//!
//! let coordinator = EnrichmentCoordinator::new(Arc::new(MemoryDirectory::new()));
//! let mut session = FormSession::new();
//! session.submit_email("ada@acme.io", &coordinator).await?;
//! session.update_details(update)?;
//! session.submit_details(&SimulatedSink::default()).await?;
//! ```

pub mod bucket;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod email;
pub mod error;
pub mod http;
#[cfg(feature = "postgres")]
pub mod pg;
pub mod session;
pub mod submit;
pub mod types;

pub use bucket::bucket_for;
pub use config::{DirectorySource, IntakeConfig};
pub use coordinator::{EnrichOutcome, EnrichmentCoordinator, Prefill, Resolution};
pub use directory::{CompanyDirectory, DirectoryEntry, MemoryDirectory};
pub use error::{ConfigError, DirectoryError, SessionError, SubmitError};
pub use http::HttpDirectory;
#[cfg(feature = "postgres")]
pub use pg::PgDirectory;
pub use session::{DetailsUpdate, FormSession, SessionView};
pub use submit::{SimulatedSink, SubmissionReceipt, SubmissionSink};
pub use types::{Company, ContactDraft, LookupResult, SizeBucket, Step};
