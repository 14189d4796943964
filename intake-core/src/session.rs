//! Step state machine for one intake session.
//!
//! `EMAIL → CHECKING → DETAILS → SUCCESS`, strictly forward. Each
//! transition that waits on I/O is split into `begin_*` / `complete_*` so a
//! caller holding the session behind a lock can release it while the I/O
//! runs. A begun transition leaves a pending ticket behind; any further
//! `begin_*` is refused with [`SessionError::InFlight`] until the matching
//! `complete_*` arrives, and a ticket that no longer matches is refused with
//! [`SessionError::StaleTicket`].

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::coordinator::{EnrichmentCoordinator, Prefill};
use crate::email::is_well_formed;
use crate::error::{SessionError, SubmitError};
use crate::submit::{SubmissionReceipt, SubmissionSink};
use crate::types::{ContactDraft, LookupResult, SizeBucket, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Lookup(u64),
    Submit(u64),
}

impl Pending {
    fn kind(&self) -> &'static str {
        match self {
            Pending::Lookup(_) => "lookup",
            Pending::Submit(_) => "submit",
        }
    }
}

/// Partial edit of the details step. Absent fields are left alone;
/// `companySizeBucket: null` clears the selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub company_size_bucket: Option<Option<SizeBucket>>,
    pub message: Option<String>,
}

fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Serializable snapshot of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub step: Step,
    pub draft: ContactDraft,
    pub company_found: bool,
    pub show_size_selector: bool,
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SubmissionReceipt>,
}

#[derive(Debug)]
pub struct FormSession {
    id: Uuid,
    step: Step,
    draft: ContactDraft,
    company_found: bool,
    pending: Option<Pending>,
    generation: u64,
    last_error: Option<String>,
    receipt: Option<SubmissionReceipt>,
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FormSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            step: Step::Email,
            draft: ContactDraft::default(),
            company_found: false,
            pending: None,
            generation: 0,
            last_error: None,
            receipt: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &ContactDraft {
        &self.draft
    }

    pub fn company_found(&self) -> bool {
        self.company_found
    }

    /// The size selector is hidden once the lookup resolved a bucket.
    pub fn show_size_selector(&self) -> bool {
        !self.company_found
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            step: self.step,
            draft: self.draft.clone(),
            company_found: self.company_found,
            show_size_selector: self.show_size_selector(),
            busy: self.is_busy(),
            last_error: self.last_error.clone(),
            receipt: self.receipt.clone(),
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.pending {
            Some(p) => Err(SessionError::InFlight(p.kind())),
            None => Ok(()),
        }
    }

    fn ensure_step(&self, expected: Step, action: &'static str) -> Result<(), SessionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                step: self.step,
                action,
            })
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    // ── EMAIL → CHECKING → DETAILS ──

    pub fn begin_lookup(&mut self, email: &str) -> Result<LookupTicket, SessionError> {
        self.ensure_idle()?;
        self.ensure_step(Step::Email, "submit email")?;
        if !is_well_formed(email) {
            return Err(SessionError::InvalidEmail(email.to_string()));
        }

        self.draft.email = email.trim().to_string();
        let generation = self.next_generation();
        self.pending = Some(Pending::Lookup(generation));
        self.step = Step::Checking;
        tracing::debug!(session_id = %self.id, "entered CHECKING");
        Ok(LookupTicket(generation))
    }

    /// Always advances to DETAILS; a not-found result only means nothing is
    /// pre-filled.
    pub fn complete_lookup(
        &mut self,
        ticket: LookupTicket,
        result: &LookupResult,
    ) -> Result<Step, SessionError> {
        if self.pending != Some(Pending::Lookup(ticket.0)) {
            return Err(SessionError::StaleTicket("lookup"));
        }
        self.pending = None;

        match Prefill::from_lookup(result) {
            Some(prefill) => {
                self.draft.company_name = prefill.company_name;
                self.draft.company_size_bucket = Some(prefill.size_bucket);
                self.company_found = true;
            }
            None => self.company_found = false,
        }
        self.step = Step::Details;
        tracing::debug!(
            session_id = %self.id,
            company_found = self.company_found,
            "entered DETAILS"
        );
        Ok(self.step)
    }

    pub async fn submit_email(
        &mut self,
        email: &str,
        coordinator: &EnrichmentCoordinator,
    ) -> Result<Step, SessionError> {
        let ticket = self.begin_lookup(email)?;
        let result = coordinator.enrich(&self.draft.email).await;
        self.complete_lookup(ticket, &result)
    }

    // ── DETAILS ──

    pub fn update_details(&mut self, update: DetailsUpdate) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.ensure_step(Step::Details, "edit details")?;

        let DetailsUpdate {
            first_name,
            last_name,
            company_name,
            company_size_bucket,
            message,
        } = update;
        if let Some(v) = first_name {
            self.draft.first_name = v;
        }
        if let Some(v) = last_name {
            self.draft.last_name = v;
        }
        if let Some(v) = company_name {
            self.draft.company_name = v;
        }
        if let Some(v) = company_size_bucket {
            self.draft.company_size_bucket = v;
        }
        if let Some(v) = message {
            self.draft.message = v;
        }
        Ok(())
    }

    // ── DETAILS → SUCCESS ──

    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SessionError> {
        self.ensure_idle()?;
        self.ensure_step(Step::Details, "submit details")?;
        let missing = self.draft.missing_fields();
        if !missing.is_empty() {
            return Err(SessionError::Incomplete { missing });
        }

        let generation = self.next_generation();
        self.pending = Some(Pending::Submit(generation));
        self.last_error = None;
        Ok(SubmitTicket(generation))
    }

    /// On failure the session stays in DETAILS with `last_error` set, so the
    /// user can correct and resubmit.
    pub fn complete_submit(
        &mut self,
        ticket: SubmitTicket,
        outcome: Result<SubmissionReceipt, SubmitError>,
    ) -> Result<Step, SessionError> {
        if self.pending != Some(Pending::Submit(ticket.0)) {
            return Err(SessionError::StaleTicket("submit"));
        }
        self.pending = None;

        match outcome {
            Ok(receipt) => {
                tracing::info!(
                    session_id = %self.id,
                    submission_id = %receipt.submission_id,
                    "entered SUCCESS"
                );
                self.receipt = Some(receipt);
                self.step = Step::Success;
                Ok(self.step)
            }
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "submission failed");
                self.last_error = Some(e.to_string());
                Err(SessionError::SubmissionFailed(e))
            }
        }
    }

    pub async fn submit_details(
        &mut self,
        sink: &dyn SubmissionSink,
    ) -> Result<Step, SessionError> {
        let ticket = self.begin_submit()?;
        let outcome = sink.submit(&self.draft).await;
        self.complete_submit(ticket, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::tests::{acme, Script, ScriptedDirectory};
    use crate::directory::CompanyDirectory;
    use crate::submit::SimulatedSink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn coordinator(delay: Duration, script: Script) -> EnrichmentCoordinator {
        let dir: Arc<dyn CompanyDirectory> = Arc::new(ScriptedDirectory::new(delay, script));
        EnrichmentCoordinator::new(dir)
    }

    fn found_coordinator() -> EnrichmentCoordinator {
        coordinator(Duration::from_millis(20), Script::Reply(LookupResult::found(acme())))
    }

    fn fill_person(session: &mut FormSession) {
        session
            .update_details(DetailsUpdate {
                first_name: Some("Ada".into()),
                last_name: Some("Lovelace".into()),
                ..Default::default()
            })
            .unwrap();
    }

    struct FlakySink {
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl SubmissionSink for FlakySink {
        async fn submit(&self, _draft: &ContactDraft) -> Result<SubmissionReceipt, SubmitError> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(SubmitError::Unavailable("crm offline".into()));
            }
            Ok(SubmissionReceipt::issue())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_email_does_not_transition() {
        let mut s = FormSession::new();
        let err = s
            .submit_email("not-an-email", &found_coordinator())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidEmail(_)));
        assert_eq!(s.step(), Step::Email);
        assert_eq!(s.draft().email, "");
        assert!(!s.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn found_company_prefills_and_hides_selector() {
        let mut s = FormSession::new();
        let step = s.submit_email("ada@acme.io", &found_coordinator()).await.unwrap();

        assert_eq!(step, Step::Details);
        assert_eq!(s.draft().email, "ada@acme.io");
        assert_eq!(s.draft().company_name, "Acme");
        assert_eq!(s.draft().company_size_bucket, Some(SizeBucket::Medium));
        assert!(s.company_found());
        assert!(!s.show_size_selector());
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_failure_still_reaches_details() {
        let mut s = FormSession::new();
        let c = coordinator(Duration::from_millis(5), Script::Fail);
        let step = s.submit_email("ada@acme.io", &c).await.unwrap();

        assert_eq!(step, Step::Details);
        assert!(!s.company_found());
        assert!(s.show_size_selector());
        assert_eq!(s.draft().company_size_bucket, None);
        assert_eq!(s.draft().company_name, "");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_reaches_details_without_prefill() {
        let mut s = FormSession::new();
        let c = coordinator(Duration::from_secs(5), Script::Reply(LookupResult::found(acme())));
        s.submit_email("ada@acme.io", &c).await.unwrap();
        assert_eq!(s.step(), Step::Details);
        assert!(!s.company_found());

        // The losing lookup finishes later; the session must not change.
        let before = s.view();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(s.view(), before);
    }

    #[test]
    fn duplicate_email_submission_is_refused_while_checking() {
        let mut s = FormSession::new();
        let ticket = s.begin_lookup("ada@acme.io").unwrap();
        assert_eq!(s.step(), Step::Checking);

        let err = s.begin_lookup("ada@acme.io").unwrap_err();
        assert!(matches!(err, SessionError::InFlight("lookup")));

        s.complete_lookup(ticket, &LookupResult::not_found()).unwrap();
        assert_eq!(s.step(), Step::Details);
    }

    #[test]
    fn lookup_ticket_applies_exactly_once() {
        let mut s = FormSession::new();
        let ticket = s.begin_lookup("ada@acme.io").unwrap();
        s.complete_lookup(ticket, &LookupResult::not_found()).unwrap();
        s.update_details(DetailsUpdate {
            company_name: Some("Typed By Hand".into()),
            ..Default::default()
        })
        .unwrap();

        let err = s
            .complete_lookup(ticket, &LookupResult::found(acme()))
            .unwrap_err();
        assert!(matches!(err, SessionError::StaleTicket("lookup")));
        assert_eq!(s.draft().company_name, "Typed By Hand");
        assert!(!s.company_found());
    }

    #[tokio::test(start_paused = true)]
    async fn resubmitting_email_after_details_keeps_fields() {
        let mut s = FormSession::new();
        let c = found_coordinator();
        s.submit_email("ada@acme.io", &c).await.unwrap();
        fill_person(&mut s);
        let before = s.draft().clone();

        let err = s.submit_email("ada@other.org", &c).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(s.draft(), &before);
        assert_eq!(s.step(), Step::Details);
    }

    #[tokio::test(start_paused = true)]
    async fn prefilled_bucket_stays_editable() {
        let mut s = FormSession::new();
        s.submit_email("ada@acme.io", &found_coordinator()).await.unwrap();
        s.update_details(DetailsUpdate {
            company_size_bucket: Some(Some(SizeBucket::Large)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.draft().company_size_bucket, Some(SizeBucket::Large));

        s.update_details(DetailsUpdate {
            company_size_bucket: Some(None),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.draft().company_size_bucket, None);
    }

    #[test]
    fn details_update_null_clears_but_absent_keeps() {
        let keep: DetailsUpdate = serde_json::from_str(r#"{"firstName":"Ada"}"#).unwrap();
        assert_eq!(keep.company_size_bucket, None);

        let clear: DetailsUpdate =
            serde_json::from_str(r#"{"companySizeBucket":null}"#).unwrap();
        assert_eq!(clear.company_size_bucket, Some(None));

        let set: DetailsUpdate =
            serde_json::from_str(r#"{"companySizeBucket":"11-50"}"#).unwrap();
        assert_eq!(set.company_size_bucket, Some(Some(SizeBucket::Small)));
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_details_are_rejected() {
        let mut s = FormSession::new();
        let c = coordinator(Duration::ZERO, Script::Reply(LookupResult::not_found()));
        s.submit_email("ada@acme.io", &c).await.unwrap();
        fill_person(&mut s);

        let err = s.submit_details(&SimulatedSink::default()).await.unwrap_err();
        match err {
            SessionError::Incomplete { missing } => {
                assert_eq!(missing, vec!["companyName", "companySizeBucket"]);
            }
            other => panic!("expected Incomplete, got {other:?}"),
        }
        assert_eq!(s.step(), Step::Details);
    }

    #[tokio::test(start_paused = true)]
    async fn complete_details_reach_success_once() {
        let mut s = FormSession::new();
        s.submit_email("ada@acme.io", &found_coordinator()).await.unwrap();
        fill_person(&mut s);

        let step = s.submit_details(&SimulatedSink::default()).await.unwrap();
        assert_eq!(step, Step::Success);
        assert!(s.view().receipt.is_some());

        let err = s.submit_details(&SimulatedSink::default()).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[test]
    fn double_submit_is_refused_while_in_flight() {
        let mut s = FormSession::new();
        let t = s.begin_lookup("ada@acme.io").unwrap();
        s.complete_lookup(t, &LookupResult::found(acme())).unwrap();
        fill_person(&mut s);

        let ticket = s.begin_submit().unwrap();
        assert!(s.is_busy());
        assert!(matches!(
            s.begin_submit().unwrap_err(),
            SessionError::InFlight("submit")
        ));
        assert!(matches!(
            s.update_details(DetailsUpdate::default()).unwrap_err(),
            SessionError::InFlight("submit")
        ));

        s.complete_submit(ticket, Ok(SubmissionReceipt::issue())).unwrap();
        assert_eq!(s.step(), Step::Success);
        assert!(matches!(
            s.complete_submit(ticket, Ok(SubmissionReceipt::issue()))
                .unwrap_err(),
            SessionError::StaleTicket("submit")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn sink_failure_is_reported_and_retryable() {
        let mut s = FormSession::new();
        s.submit_email("ada@acme.io", &found_coordinator()).await.unwrap();
        fill_person(&mut s);
        let sink = FlakySink {
            failures_left: AtomicUsize::new(1),
        };

        let err = s.submit_details(&sink).await.unwrap_err();
        assert!(matches!(err, SessionError::SubmissionFailed(_)));
        assert_eq!(s.step(), Step::Details);
        assert_eq!(
            s.last_error(),
            Some("submission sink unavailable: crm offline")
        );

        assert_eq!(s.submit_details(&sink).await.unwrap(), Step::Success);
        assert_eq!(s.last_error(), None);
    }

    #[test]
    fn view_serializes_for_rendering() {
        let s = FormSession::new();
        let json = serde_json::to_value(s.view()).unwrap();
        assert_eq!(json["step"], "EMAIL");
        assert_eq!(json["showSizeSelector"], true);
        assert_eq!(json["draft"]["companySizeBucket"], serde_json::Value::Null);
        assert!(json.get("lastError").is_none());
    }
}
