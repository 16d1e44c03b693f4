//! `filevault-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no terminal concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::Aggregate;
pub use entity::Entity;
pub use error::{StorageError, StorageResult};
pub use id::{AccountEmail, FileId};
pub use value_object::ValueObject;
