use filevault_core::Aggregate;

use crate::Event;

/// Execute an aggregate command deterministically (no IO, no async).
///
/// 1. **Decide**: `aggregate.handle(command)` validates and returns events
///    without touching state.
/// 2. **Evolve**: each event is applied in order via `aggregate.apply(event)`.
///
/// If `handle` rejects the command the aggregate is left exactly as it was.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: Aggregate,
    A::Event: Event,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
        tracing::trace!(
            event_type = ev.event_type(),
            occurred_at = %ev.occurred_at(),
            version = aggregate.version(),
            "applied event"
        );
    }
    Ok(events)
}
