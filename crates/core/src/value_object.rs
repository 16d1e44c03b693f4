//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity** - they are defined entirely by their
//! attribute values. A storage tier or a size in kilobytes is a value object;
//! an account or a file is an entity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. To "modify" one, build a
/// new one (e.g. `StorageSize::saturating_sub` returns a fresh size).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
