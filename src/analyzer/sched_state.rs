//! Run-state breakdown of scheduling events.

use crate::parser::schema::{SchedState, SchedulingEvent, StateBreakdown};

/// Count scheduling events per run-state
pub fn count_states(events: &[SchedulingEvent]) -> StateBreakdown {
    events
        .iter()
        .fold(StateBreakdown::default(), |mut counts, event| {
            match event.state {
                SchedState::Runnable => counts.runnable += 1,
                SchedState::Sleeping => counts.sleeping += 1,
                SchedState::UninterruptibleSleep => counts.uninterruptible += 1,
                SchedState::Other => counts.other += 1,
            }
            counts
        })
}
