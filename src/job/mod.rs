pub mod bulk;
pub mod dto;
pub mod models;
pub mod seed;
pub mod store;
pub mod validation;
pub mod view;

// Re-export commonly used types
pub use dto::JobForm;
pub use models::{JobId, JobInput, JobRecord, JobStatus};
pub use store::{Consistency, JobStore, StoreError, StoreOptions};
pub use view::{SortKey, StatusFilter, ViewQuery};
