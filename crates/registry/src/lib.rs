pub mod client;
pub mod records;
pub mod retry;

pub use client::{DEFAULT_BASE_URL, RegistryClient};
pub use records::{StudyRecord, dedupe, simplify};
pub use retry::RetryPolicy;
