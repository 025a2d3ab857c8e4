//! In-memory `JobsApi` for store tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::{JobsApi, RemoteError};
use crate::job::models::{JobId, JobInput, JobRecord};

pub struct FakeJobs {
    records: Mutex<Vec<JobRecord>>,
    next_id: AtomicU64,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    offline: AtomicBool,
    failing_companies: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<JobId>>,
    create_gate: Mutex<Option<Arc<Notify>>>,
    list_gate: Mutex<Option<Arc<Notify>>>,
    /// Notified each time a held create starts waiting
    pub create_started: Notify,
}

impl Default for FakeJobs {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
            failing_companies: Mutex::new(HashSet::new()),
            failing_deletes: Mutex::new(HashSet::new()),
            create_gate: Mutex::new(None),
            list_gate: Mutex::new(None),
            create_started: Notify::new(),
        }
    }
}

impl FakeJobs {
    pub fn seeded(inputs: &[JobInput]) -> Self {
        let fake = Self::default();
        for input in inputs {
            let id = JobId::Numeric(fake.next_id.fetch_add(1, Ordering::SeqCst));
            fake.records.lock().unwrap().push(JobRecord::new(id, input.clone()));
        }
        fake
    }

    pub fn snapshot(&self) -> Vec<JobRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fail_creates_for(&self, company: &str) {
        self.failing_companies.lock().unwrap().insert(company.to_string());
    }

    pub fn fail_deletes_for(&self, id: JobId) {
        self.failing_deletes.lock().unwrap().insert(id);
    }

    /// Make creates wait until the returned handle is notified
    pub fn hold_creates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Make lists wait until the returned handle is notified
    pub fn hold_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Network("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl JobsApi for FakeJobs {
    async fn list(&self) -> Result<Vec<JobRecord>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_online()?;
        Ok(self.snapshot())
    }

    async fn create(&self, input: &JobInput) -> Result<JobRecord, RemoteError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.create_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.create_started.notify_one();
            gate.notified().await;
        }
        self.check_online()?;
        if self.failing_companies.lock().unwrap().contains(&input.company) {
            return Err(RemoteError::Status {
                status: 500,
                body: format!("cannot store {}", input.company),
            });
        }
        let id = JobId::Numeric(self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = JobRecord::new(id, input.clone());
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &JobId, input: &JobInput) -> Result<JobRecord, RemoteError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;
        *slot = JobRecord::new(id.clone(), input.clone());
        Ok(slot.clone())
    }

    async fn delete(&self, id: &JobId) -> Result<(), RemoteError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(RemoteError::Status {
                status: 500,
                body: format!("cannot delete {}", id),
            });
        }
        self.records.lock().unwrap().retain(|r| &r.id != id);
        Ok(())
    }
}
