pub mod connection;
pub mod error;
pub mod job_client;
pub mod retry;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::job::models::{JobId, JobInput, JobRecord};

pub use error::RemoteError;
pub use job_client::HttpJobsClient;
pub use retry::RetryPolicy;

/// Boundary to the persistence service.
///
/// No caching and no local state: every call goes to the service.
#[async_trait]
pub trait JobsApi: Send + Sync {
    async fn list(&self) -> Result<Vec<JobRecord>, RemoteError>;

    /// The service assigns the id of the returned record
    async fn create(&self, input: &JobInput) -> Result<JobRecord, RemoteError>;

    /// Full replace; `RemoteError::NotFound` when `id` does not exist
    async fn update(&self, id: &JobId, input: &JobInput) -> Result<JobRecord, RemoteError>;

    /// Deleting an id that is already gone counts as success
    async fn delete(&self, id: &JobId) -> Result<(), RemoteError>;
}
