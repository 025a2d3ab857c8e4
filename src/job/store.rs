use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use super::bulk::run_bounded;
use super::dto::JobForm;
use super::models::{JobId, JobInput, JobRecord};
use super::validation::{validate, ValidationError};
use super::view::{project, ViewQuery};
use crate::remote::{JobsApi, RemoteError};

/// Step of the demo load that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkPhase {
    Delete,
    Create,
}

impl fmt::Display for BulkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkPhase::Delete => f.write_str("deleting existing jobs"),
            BulkPhase::Create => f.write_str("creating demo jobs"),
        }
    }
}

/// Store-level errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[source] RemoteError),

    #[error("Already saving, wait for the pending change to finish")]
    Busy,

    #[error("Jobs service did not answer within {0:?}")]
    TimedOut(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Job {0} is not loaded")]
    NotInStore(JobId),

    #[error(
        "Demo load failed while {phase}: {} request(s) failed; compensation {}",
        .failures.len(),
        compensation_outcome(.compensated)
    )]
    BulkReplace {
        phase: BulkPhase,
        failures: Vec<String>,
        compensated: bool,
    },
}

fn compensation_outcome(compensated: &bool) -> &'static str {
    if *compensated {
        "completed"
    } else {
        "incomplete"
    }
}

/// Whether `records` can be trusted to mirror the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consistency {
    NotLoaded,
    Synced,
    Inconsistent { reason: String },
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Upper bound for any single remote call made by the store
    pub mutation_timeout: Duration,
    /// Concurrent requests during a demo load
    pub bulk_concurrency: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            mutation_timeout: Duration::from_secs(30),
            bulk_concurrency: 4,
        }
    }
}

/// Holds the flag for as long as it lives
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Local mirror of the server-confirmed job records
///
/// Mutations wait for the service to confirm before touching `records`;
/// nothing here ever invents an id.
pub struct JobStore {
    api: Arc<dyn JobsApi>,
    options: StoreOptions,
    records: RwLock<Vec<JobRecord>>,
    consistency: RwLock<Consistency>,
    saving: AtomicBool,
    seeding: AtomicBool,
    shutdown: watch::Receiver<bool>,
}

impl JobStore {
    pub fn new(api: Arc<dyn JobsApi>, options: StoreOptions) -> Self {
        // sender dropped right away: never signals
        let (_, shutdown) = watch::channel(false);
        Self {
            api,
            options,
            records: RwLock::new(Vec::new()),
            consistency: RwLock::new(Consistency::NotLoaded),
            saving: AtomicBool::new(false),
            seeding: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Cancel in-flight remote calls once `shutdown` turns true
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub async fn records(&self) -> Vec<JobRecord> {
        self.records.read().await.clone()
    }

    pub async fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.records.read().await.iter().find(|r| &r.id == id).cloned()
    }

    pub async fn require(&self, id: &JobId) -> Result<JobRecord, StoreError> {
        self.get(id).await.ok_or_else(|| StoreError::NotInStore(id.clone()))
    }

    pub async fn consistency(&self) -> Consistency {
        self.consistency.read().await.clone()
    }

    /// True while an add or edit is outstanding
    pub fn is_busy(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    pub async fn project(&self, query: &ViewQuery) -> Vec<JobRecord> {
        project(&self.records.read().await, query)
    }

    /// Race a remote call against the timeout and the shutdown signal
    async fn guarded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        let mut shutdown = self.shutdown.clone();
        if *shutdown.borrow() {
            return Err(StoreError::Cancelled);
        }

        let timeout = self.options.mutation_timeout;
        tokio::select! {
            result = tokio::time::timeout(timeout, call) => match result {
                Ok(outcome) => outcome.map_err(StoreError::Remote),
                Err(_) => Err(StoreError::TimedOut(timeout)),
            },
            _ = wait_for_shutdown(&mut shutdown) => Err(StoreError::Cancelled),
        }
    }

    /// Replace `records` with the service's current list.
    ///
    /// # Business Logic
    /// - Lists every job from the service
    /// - On failure empties the local list instead of keeping it stale
    /// - A cancelled refresh leaves the list untouched
    ///
    /// # Returns
    /// - `Ok(usize)` - Number of jobs loaded
    /// - `Err(StoreError::BackendUnavailable)` - Service unreachable, timed out or answered badly
    pub async fn refresh(&self) -> Result<usize, StoreError> {
        match self.guarded(self.api.list()).await {
            Ok(records) => {
                let count = records.len();
                *self.records.write().await = records;
                *self.consistency.write().await = Consistency::Synced;
                info!("Store: loaded {} jobs", count);
                Ok(count)
            }
            Err(StoreError::Cancelled) => Err(StoreError::Cancelled),
            Err(err) => {
                let cause = match err {
                    StoreError::Remote(remote) => remote,
                    StoreError::TimedOut(_) => RemoteError::Timeout,
                    other => RemoteError::Network(other.to_string()),
                };
                error!("Store: backend offline, cannot load jobs: {}", cause);
                self.records.write().await.clear();
                *self.consistency.write().await = Consistency::NotLoaded;
                Err(StoreError::BackendUnavailable(cause))
            }
        }
    }

    /// Validate and create a job
    ///
    /// # Business Logic
    /// - Validates the form before any request is made
    /// - Rejects the call while another add or edit is in flight
    /// - Puts the record confirmed by the service at the front
    ///
    /// # Returns
    /// - `Ok(JobRecord)` - Job created with its service-assigned id
    /// - `Err(StoreError)` - Validation, busy, remote, timeout or cancellation failure
    pub async fn add(&self, form: &JobForm) -> Result<JobRecord, StoreError> {
        let input = validate(form)?;
        let _guard = BusyGuard::acquire(&self.saving).ok_or_else(|| {
            warn!("Store: add rejected, another save is in flight");
            StoreError::Busy
        })?;

        info!("Store: creating job company={}", input.company);
        let created = self.guarded(self.api.create(&input)).await.map_err(|e| {
            warn!("Store: failed to add job: {}", e);
            e
        })?;

        let mut records = self.records.write().await;
        records.retain(|r| r.id != created.id);
        records.insert(0, created.clone());
        info!("Store: job added with id={}", created.id);
        Ok(created)
    }

    /// Validate and fully replace the job `id`; the record keeps its position.
    pub async fn edit(&self, id: &JobId, form: &JobForm) -> Result<JobRecord, StoreError> {
        let input = validate(form)?;
        let _guard = BusyGuard::acquire(&self.saving).ok_or_else(|| {
            warn!("Store: edit of {} rejected, another save is in flight", id);
            StoreError::Busy
        })?;

        info!("Store: updating job id={}", id);
        let updated = self.guarded(self.api.update(id, &input)).await.map_err(|e| {
            warn!("Store: failed to update job {}: {}", id, e);
            e
        })?;

        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| &r.id == id) {
            Some(slot) => *slot = updated.clone(),
            None => {
                debug!("Store: updated job {} was not loaded, inserting it", id);
                records.insert(0, updated.clone());
            }
        }
        Ok(updated)
    }

    /// Delete job `id`. Asking the user to confirm is the caller's job.
    pub async fn remove(&self, id: &JobId) -> Result<(), StoreError> {
        info!("Store: deleting job id={}", id);
        self.guarded(self.api.delete(id)).await.map_err(|e| {
            warn!("Store: failed to delete job {}: {}", id, e);
            e
        })?;

        self.records.write().await.retain(|r| &r.id != id);
        Ok(())
    }

    /// Replace every remote job with `seeds` (the demo load).
    ///
    /// # Business Logic
    /// - Lists, then deletes every existing job with bounded concurrency
    /// - Creates every seed once all deletes succeeded
    /// - When a step fails, undoes the completed ones and marks the store
    ///   inconsistent. Re-created originals get new ids from the service.
    ///
    /// # Returns
    /// - `Ok(Vec<JobRecord>)` - The created demo jobs, now the local list
    /// - `Err(StoreError::BulkReplace)` - A delete or create failed
    /// - `Err(StoreError::Busy)` - Another demo load is running
    pub async fn bulk_replace(&self, seeds: &[JobInput]) -> Result<Vec<JobRecord>, StoreError> {
        let _guard = BusyGuard::acquire(&self.seeding).ok_or_else(|| {
            warn!("Store: demo load rejected, one is already running");
            StoreError::Busy
        })?;
        let limit = self.options.bulk_concurrency;

        let existing = self.guarded(self.api.list()).await.map_err(|e| {
            error!("Store: demo load could not list jobs: {}", e);
            e
        })?;
        info!(
            "Store: demo load replacing {} jobs with {} seeds",
            existing.len(),
            seeds.len()
        );

        let deletions = run_bounded(
            limit,
            existing.iter().map(|r| self.guarded(self.api.delete(&r.id))),
        )
        .await;
        let (deleted, delete_failures) = split_outcomes(&existing, deletions, |r| r.id.to_string());

        if !delete_failures.is_empty() {
            let compensated = self.recreate(&deleted).await;
            return Err(self
                .mark_failed(BulkPhase::Delete, delete_failures, compensated)
                .await);
        }

        let creations = run_bounded(limit, seeds.iter().map(|s| self.guarded(self.api.create(s)))).await;
        let mut created = Vec::new();
        let mut create_failures = Vec::new();
        for (seed, outcome) in seeds.iter().zip(creations) {
            match outcome {
                Ok(record) => created.push(record),
                Err(e) => create_failures.push(format!("{}: {}", seed.company, e)),
            }
        }

        if !create_failures.is_empty() {
            let removals = run_bounded(limit, created.iter().map(|r| self.guarded(self.api.delete(&r.id)))).await;
            let seeds_removed = removals.iter().all(Result::is_ok);
            let restored = self.recreate(&existing).await;
            return Err(self
                .mark_failed(BulkPhase::Create, create_failures, seeds_removed && restored)
                .await);
        }

        *self.records.write().await = created.clone();
        *self.consistency.write().await = Consistency::Synced;
        info!("Store: demo load completed with {} jobs", created.len());
        Ok(created)
    }

    /// Compensation step: create `records` again. True when all succeeded.
    async fn recreate(&self, records: &[JobRecord]) -> bool {
        if records.is_empty() {
            return true;
        }
        warn!("Store: re-creating {} deleted jobs", records.len());
        let inputs: Vec<JobInput> = records.iter().map(JobRecord::to_input).collect();
        let outcomes = run_bounded(
            self.options.bulk_concurrency,
            inputs.iter().map(|input| self.guarded(self.api.create(input))),
        )
        .await;
        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        if failed > 0 {
            error!("Store: {} jobs could not be re-created", failed);
        }
        failed == 0
    }

    async fn mark_failed(&self, phase: BulkPhase, failures: Vec<String>, compensated: bool) -> StoreError {
        for failure in &failures {
            error!("Store: demo load failure while {}: {}", phase, failure);
        }
        let reason = format!("demo load failed while {}; refresh to resync", phase);
        *self.consistency.write().await = Consistency::Inconsistent { reason };
        StoreError::BulkReplace {
            phase,
            failures,
            compensated,
        }
    }
}

/// Split records by outcome into (succeeded, failure messages)
fn split_outcomes<T>(
    records: &[JobRecord],
    outcomes: Vec<Result<T, StoreError>>,
    label: impl Fn(&JobRecord) -> String,
) -> (Vec<JobRecord>, Vec<String>) {
    let mut succeeded = Vec::new();
    let mut failures = Vec::new();
    for (record, outcome) in records.iter().zip(outcomes) {
        match outcome {
            Ok(_) => succeeded.push(record.clone()),
            Err(e) => failures.push(format!("{}: {}", label(record), e)),
        }
    }
    (succeeded, failures)
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        // sender gone without a signal
        std::future::pending::<()>().await;
    }
}
