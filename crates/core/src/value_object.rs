//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. In this workspace `Email` and `PlayerCount` are value
//! objects, while golfers, tee times and bookings are identified entities.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. Constructors
/// validate once, so holding a value object means holding a valid value.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct PlayerCount(u32);
///
/// impl ValueObject for PlayerCount {}
///
/// assert_eq!(PlayerCount(2), PlayerCount(2));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
