//! In-memory stand-ins and fault injection for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

use crate::artifacts::{ArtifactStore, FsArtifactStore, StorageError};
use crate::auth::delivery::CodeDelivery;
use crate::auth::session::{new_session_token, SessionStore};
use crate::config::{ArtifactBackend, Config, EngineKind};
use crate::engine::{EngineError, EngineOutput, ProfileSnapshot, ResumeEngine, StubEngine};
use crate::errors::AppError;
use crate::models::identity::IdentityRow;
use crate::models::profile::{ProfileInput, ProfileRow};
use crate::models::resume::{NewResume, ResumeRow};
use crate::state::AppState;
use crate::store::Store;

#[derive(Default)]
struct Tables {
    identities: HashMap<Uuid, IdentityRow>,
    profiles: HashMap<Uuid, ProfileRow>,
    resumes: HashMap<Uuid, ResumeRow>,
}

/// `Store` over in-process maps. Each method holds the lock for its whole
/// read-modify-write, which gives the same atomicity as the conditional SQL.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn identity_by_email(&self, email: &str) -> Option<IdentityRow> {
        let tables = self.tables.lock().unwrap();
        tables
            .identities
            .values()
            .find(|i| i.email == email)
            .cloned()
    }

    /// All rows, claimed or not.
    pub fn resume_count(&self) -> usize {
        self.tables.lock().unwrap().resumes.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_identity_code(
        &self,
        email: &str,
        code: &str,
        expiry: DateTime<Utc>,
    ) -> Result<IdentityRow, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables
            .identities
            .values()
            .find(|i| i.email == email)
            .map(|i| i.id);
        let id = existing.unwrap_or_else(Uuid::new_v4);
        let row = tables.identities.entry(id).or_insert_with(|| IdentityRow {
            id,
            email: email.to_string(),
            verified: false,
            verify_code: None,
            verify_expiry: None,
            created_at: Utc::now(),
        });
        row.verify_code = Some(code.to_string());
        row.verify_expiry = Some(expiry);
        Ok(row.clone())
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<IdentityRow>, AppError> {
        Ok(self.identity_by_email(email))
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<IdentityRow>, AppError> {
        Ok(self.tables.lock().unwrap().identities.get(&id).cloned())
    }

    async fn consume_code(&self, id: Uuid, code: &str) -> Result<Option<IdentityRow>, AppError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.identities.get_mut(&id) {
            Some(row) if row.verify_code.as_deref() == Some(code) => {
                row.verified = true;
                row.verify_code = None;
                row.verify_expiry = None;
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn clear_code(&self, id: Uuid, code: &str) -> Result<(), AppError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(row) = tables.identities.get_mut(&id) {
            if row.verify_code.as_deref() == Some(code) {
                row.verify_code = None;
                row.verify_expiry = None;
            }
        }
        Ok(())
    }

    async fn get_profile(&self, identity_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
        Ok(self.tables.lock().unwrap().profiles.get(&identity_id).cloned())
    }

    async fn upsert_profile(
        &self,
        identity_id: Uuid,
        input: &ProfileInput,
    ) -> Result<ProfileRow, AppError> {
        let row = ProfileRow {
            identity_id,
            full_name: input.full_name.clone(),
            city: input.city.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            linkedin: input.linkedin.clone(),
            github: input.github.clone(),
            about: input.about.clone(),
            api_key: input.api_key.clone(),
            updated_at: Utc::now(),
        };
        self.tables
            .lock()
            .unwrap()
            .profiles
            .insert(identity_id, row.clone());
        Ok(row)
    }

    async fn insert_resume(&self, resume: &NewResume) -> Result<ResumeRow, AppError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::PersistenceFailure(sqlx::Error::PoolTimedOut));
        }
        let row = ResumeRow {
            id: resume.id,
            identity_id: resume.identity_id,
            job_url: resume.job_url.clone(),
            pdf_key: resume.pdf_key.clone(),
            docx_key: resume.docx_key.clone(),
            pdf_name: resume.pdf_name.clone(),
            docx_name: resume.docx_name.clone(),
            coverage_json: resume.coverage_json.clone(),
            created_at: Utc::now(),
            deleting_at: None,
        };
        self.tables
            .lock()
            .unwrap()
            .resumes
            .insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_resume(&self, identity_id: Uuid, id: Uuid) -> Result<Option<ResumeRow>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .resumes
            .get(&id)
            .filter(|r| r.identity_id == identity_id && r.deleting_at.is_none())
            .cloned())
    }

    async fn list_resumes(
        &self,
        identity_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ResumeRow>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<ResumeRow> = tables
            .resumes
            .values()
            .filter(|r| r.identity_id == identity_id && r.deleting_at.is_none())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn claim_resume_deletion(
        &self,
        identity_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ResumeRow>, AppError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.resumes.get_mut(&id) {
            Some(row) if row.identity_id == identity_id && row.deleting_at.is_none() => {
                row.deleting_at = Some(Utc::now());
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_resume_deletion(&self, id: Uuid) -> Result<(), AppError> {
        if let Some(row) = self.tables.lock().unwrap().resumes.get_mut(&id) {
            row.deleting_at = None;
        }
        Ok(())
    }

    async fn remove_resume(&self, id: Uuid) -> Result<(), AppError> {
        self.tables.lock().unwrap().resumes.remove(&id);
        Ok(())
    }

    async fn abandoned_deletions(&self) -> Result<Vec<ResumeRow>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .resumes
            .values()
            .filter(|r| r.deleting_at.is_some())
            .cloned()
            .collect())
    }

    async fn referenced_artifact_keys(&self) -> Result<HashSet<String>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .resumes
            .values()
            .flat_map(|r| [r.pdf_key.clone(), r.docx_key.clone()])
            .collect())
    }
}

/// Sessions without expiry; TTLs are Redis's concern.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Uuid>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, identity_id: Uuid, _ttl: Duration) -> Result<String, AppError> {
        let token = new_session_token();
        self.sessions
            .lock()
            .unwrap()
            .insert(token.clone(), identity_id);
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        Ok(self.sessions.lock().unwrap().get(token).copied())
    }

    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        self.sessions.lock().unwrap().remove(token);
        Ok(())
    }
}

/// Keeps every delivered code so tests can read it back.
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingDelivery {
    pub fn last_code(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

impl CodeDelivery for RecordingDelivery {
    fn deliver(&self, email: &str, code: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
    }
}

/// Wraps a real store and fails or holds back selected operations on demand.
pub struct FailingArtifacts {
    inner: Arc<dyn ArtifactStore>,
    fail_put_suffix: Mutex<Option<String>>,
    fail_delete_suffix: Mutex<Option<String>>,
    put_gate: Option<Arc<Semaphore>>,
    put_started: Notify,
    deletes: AtomicUsize,
}

impl FailingArtifacts {
    pub fn new(inner: Arc<dyn ArtifactStore>) -> Self {
        Self {
            inner,
            fail_put_suffix: Mutex::new(None),
            fail_delete_suffix: Mutex::new(None),
            put_gate: None,
            put_started: Notify::new(),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Every `put` waits for a permit on `gate` before writing.
    pub fn gated(inner: Arc<dyn ArtifactStore>, gate: Arc<Semaphore>) -> Self {
        Self {
            put_gate: Some(gate),
            ..Self::new(inner)
        }
    }

    pub fn fail_puts_ending_with(&self, suffix: &str) {
        *self.fail_put_suffix.lock().unwrap() = Some(suffix.to_string());
    }

    pub fn fail_deletes_ending_with(&self, suffix: &str) {
        *self.fail_delete_suffix.lock().unwrap() = Some(suffix.to_string());
    }

    pub fn fail_deletes(&self, fail: bool) {
        *self.fail_delete_suffix.lock().unwrap() = fail.then(String::new);
    }

    /// Resolves once some `put` has been entered.
    pub async fn put_started(&self) {
        self.put_started.notified().await;
    }

    /// Successful deletes passed through to the inner store.
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn matches(suffix: &Mutex<Option<String>>, key: &str) -> bool {
        suffix
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|suffix| key.ends_with(suffix))
    }

    fn injected(key: &str) -> StorageError {
        StorageError::Io {
            key: key.to_string(),
            source: std::io::Error::other("injected failure"),
        }
    }
}

#[async_trait]
impl ArtifactStore for FailingArtifacts {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.put_started.notify_one();
        if let Some(gate) = &self.put_gate {
            let _permit = gate.acquire().await.unwrap();
        }
        if Self::matches(&self.fail_put_suffix, key) {
            return Err(Self::injected(key));
        }
        self.inner.put(key, bytes, content_type).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if Self::matches(&self.fail_delete_suffix, key) {
            return Err(Self::injected(key));
        }
        self.inner.delete(key).await?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.list(prefix).await
    }

    async fn sweep_incomplete(&self) -> Result<usize, StorageError> {
        self.inner.sweep_incomplete().await
    }
}

/// Engine that always fails with the given error.
pub struct FailingEngine(pub EngineError);

#[async_trait]
impl ResumeEngine for FailingEngine {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn generate(
        &self,
        _profile: &ProfileSnapshot,
        _job_url: &str,
    ) -> Result<EngineOutput, EngineError> {
        Err(self.0.clone())
    }
}

pub fn test_config(artifact_dir: &std::path::Path) -> Config {
    Config {
        database_url: "postgres://localhost/autotailor_test".to_string(),
        redis_url: "redis://localhost".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        code_ttl_minutes: 10,
        session_ttl_hours: 1,
        engine: EngineKind::Stub,
        anthropic_api_key: None,
        artifacts: ArtifactBackend::Filesystem {
            root: artifact_dir.to_path_buf(),
        },
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub delivery: Arc<RecordingDelivery>,
    _dir: TempDir,
}

/// Full application state over in-memory stores, the stub engine and a
/// filesystem artifact store in a temporary directory.
pub async fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = FsArtifactStore::new(dir.path()).await.unwrap();
    let store = Arc::new(MemoryStore::default());
    let delivery = Arc::new(RecordingDelivery::default());

    let state = AppState {
        store: store.clone(),
        sessions: Arc::new(MemorySessionStore::default()),
        artifacts: Arc::new(artifacts),
        engine: Arc::new(StubEngine),
        delivery: delivery.clone(),
        config: test_config(dir.path()),
    };

    TestApp {
        state,
        store,
        delivery,
        _dir: dir,
    }
}

pub async fn test_state() -> (AppState, TempDir) {
    let TestApp {
        state, _dir: dir, ..
    } = test_app().await;
    (state, dir)
}
