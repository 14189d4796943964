//! POST /api/lookup: direct directory lookup by email or domain.
//!
//! Directory faults are logged and answered as `{"found": false}`; only a
//! missing or domain-less email is a client error.

use axum::{extract::State, Json};
use intake_core::email::domain_of;
use intake_core::LookupResult;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

impl LookupRequest {
    fn domain(&self) -> Result<&str, AppError> {
        if let Some(domain) = self.domain.as_deref().map(str::trim) {
            if !domain.is_empty() {
                return Ok(domain);
            }
        }
        let email = match self.email.as_deref() {
            Some(e) if !e.trim().is_empty() => e,
            _ => return Err(AppError::BadRequest("Email is required")),
        };
        domain_of(email).ok_or(AppError::BadRequest("Invalid email"))
    }
}

pub async fn lookup(
    State(state): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> Result<Json<LookupResult>, AppError> {
    let domain = req.domain()?;
    match state.directory.lookup(domain).await {
        Ok(result) => Ok(Json(match result.company() {
            Some(company) => LookupResult::found(company.clone()),
            None => LookupResult::not_found(),
        })),
        Err(e) => {
            tracing::warn!(%domain, error = %e, "directory lookup failed");
            Ok(Json(LookupResult::not_found()))
        }
    }
}
