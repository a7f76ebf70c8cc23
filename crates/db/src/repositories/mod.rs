//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod upload_repo;
pub mod usage_counter_repo;

pub use upload_repo::UploadRepo;
pub use usage_counter_repo::UsageCounterRepo;
