//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Golfers and bookings are entities; tee times are aggregates because their
/// writes are version-checked (see [`crate::AggregateRoot`]).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
