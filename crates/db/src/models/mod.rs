//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row and, where rows are created from API input, a
//! `Deserialize` create DTO.

pub mod upload;
pub mod usage_counter;
