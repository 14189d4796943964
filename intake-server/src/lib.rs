//! intake-server: REST surface for the progressive contact intake flow.
//!
//! - `POST /api/lookup` answers directory lookups directly (no ceiling).
//! - `/api/sessions/*` drives a [`intake_core::FormSession`] per visitor.

pub mod directory;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
