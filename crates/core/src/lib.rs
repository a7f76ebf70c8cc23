//! Domain types and pure logic shared by the Iterra crates.
//!
//! Nothing in here talks to the network, the database, or a video file;
//! those live in `iterra-db`, `iterra-llm`, and `iterra-pipeline`.

pub mod error;
pub mod feedback;
pub mod metrics;
pub mod pose;
pub mod rate_limit;
pub mod types;
