//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use intake_core::{CompanyDirectory, EnrichmentCoordinator, FormSession, SubmissionSink};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<FormSession>>;

/// Idle time after which a session is dropped by the sweeper.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct StoredSession {
    session: SharedSession,
    touched: Instant,
}

/// Live intake sessions keyed by id. Each session sits behind its own lock;
/// handlers drop that lock while a lookup or submission is in flight.
///
/// Sessions untouched for longer than `idle_ttl` are removed by
/// [`SessionStore::sweep_idle`], unless a transition is still pending.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn create(&self) -> SharedSession {
        let session = FormSession::new();
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.inner.write().await.insert(
            id,
            StoredSession {
                session: Arc::clone(&shared),
                touched: Instant::now(),
            },
        );
        shared
    }

    /// Fetch a session and reset its idle clock.
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.inner.write().await;
        let stored = sessions.get_mut(&id)?;
        stored.touched = Instant::now();
        Some(Arc::clone(&stored.session))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drop sessions idle past the TTL. A session whose lock is held, or
    /// that still has a lookup or submission pending, is kept.
    pub async fn sweep_idle(&self) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        let ttl = self.idle_ttl;
        sessions.retain(|_, stored| {
            if stored.touched.elapsed() < ttl {
                return true;
            }
            match stored.session.try_lock() {
                Ok(session) => session.is_busy(),
                Err(_) => true,
            }
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = sessions.len(), "swept idle sessions");
        }
        removed
    }

    /// Periodically sweep idle sessions for the lifetime of the runtime.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let store = self.clone();
        let period = (self.idle_ttl / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut timer = interval(period);
            loop {
                timer.tick().await;
                store.sweep_idle().await;
            }
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn CompanyDirectory>,
    pub coordinator: EnrichmentCoordinator,
    pub sink: Arc<dyn SubmissionSink>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn CompanyDirectory>,
        ceiling: Duration,
        sink: Arc<dyn SubmissionSink>,
    ) -> Self {
        let coordinator = EnrichmentCoordinator::with_ceiling(Arc::clone(&directory), ceiling);
        Self {
            directory,
            coordinator,
            sink,
            sessions: SessionStore::default(),
        }
    }

    pub fn with_session_ttl(mut self, idle_ttl: Duration) -> Self {
        self.sessions = SessionStore::new(idle_ttl);
        self
    }
}
