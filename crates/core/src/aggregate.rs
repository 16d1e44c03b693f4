//! Aggregate trait for command/event driven domain models.

/// Aggregate execution semantics (pure, deterministic).
///
/// - **Decision logic**: `handle(&self, cmd)` validates and returns events.
/// - **State mutation**: `apply(&mut self, event)` evolves state.
///
/// Splitting the two means a rejected command can never leave partial state
/// behind: nothing is mutated until `handle` has accepted it.
pub trait Aggregate {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Number of events applied so far.
    fn version(&self) -> u64;

    /// Evolve in-memory state from a single event.
    ///
    /// Implementations should bump `version()` by one per applied event.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events to emit given the current state and a command.
    ///
    /// This must not mutate state. State evolution is done through `apply`.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
