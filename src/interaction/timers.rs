//! One-shot timers for the consume/respawn cycle.
//!
//! Each consume cycle schedules two delayed actions: a *settle* that snaps
//! the shrink animation shut, and a *respawn* that brings the chinchilla
//! back. Tasks are keyed by a monotonically increasing cycle id; beginning
//! a new cycle cancels everything still pending from earlier cycles, so two
//! overlapping cycles can never interleave their resets.

use std::time::{Duration, Instant};

pub type CycleId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Visual settle: snap the scale to zero, clear the trash styling.
    Settle,
    /// Bring the chinchilla back to its origin pose.
    Respawn,
}

/// A timer that has reached its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub cycle: CycleId,
    pub kind: TimerKind,
}

#[derive(Debug, Clone, Copy)]
struct Task {
    cycle: CycleId,
    kind: TimerKind,
    deadline: Instant,
}

pub struct ConsumeSchedule {
    settle_after: Duration,
    respawn_after: Duration,
    tasks: Vec<Task>,
    next_cycle: CycleId,
}

impl ConsumeSchedule {
    pub fn new(settle_after: Duration, respawn_after: Duration) -> Self {
        Self {
            settle_after,
            respawn_after,
            tasks: Vec::new(),
            next_cycle: 0,
        }
    }

    /// Starts a consume cycle: cancels all pending tasks and schedules the
    /// settle and respawn timers relative to `now`. Returns the cycle id
    /// the caller should carry in its state.
    pub fn begin_cycle(&mut self, now: Instant) -> CycleId {
        self.tasks.clear();
        let cycle = self.next_cycle;
        self.next_cycle += 1;

        self.tasks.push(Task {
            cycle,
            kind: TimerKind::Settle,
            deadline: now + self.settle_after,
        });
        self.tasks.push(Task {
            cycle,
            kind: TimerKind::Respawn,
            deadline: now + self.respawn_after,
        });
        cycle
    }

    /// Removes and returns every task whose deadline has passed, ordered by
    /// deadline. On a long frame both timers of a cycle can fire together;
    /// the ordering guarantees the settle is observed before the respawn.
    pub fn drain_due(&mut self, now: Instant) -> Vec<FiredTimer> {
        let mut due: Vec<Task> = Vec::new();
        self.tasks.retain(|task| {
            if task.deadline <= now {
                due.push(*task);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|task| task.deadline);
        due.into_iter()
            .map(|task| FiredTimer {
                cycle: task.cycle,
                kind: task.kind,
            })
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> ConsumeSchedule {
        ConsumeSchedule::new(Duration::from_millis(500), Duration::from_millis(2000))
    }

    #[test]
    fn test_nothing_fires_early() {
        let mut schedule = schedule();
        let t0 = Instant::now();
        schedule.begin_cycle(t0);
        assert!(schedule.drain_due(t0 + Duration::from_millis(499)).is_empty());
        assert_eq!(schedule.pending(), 2);
    }

    #[test]
    fn test_settle_then_respawn() {
        let mut schedule = schedule();
        let t0 = Instant::now();
        let cycle = schedule.begin_cycle(t0);

        let fired = schedule.drain_due(t0 + Duration::from_millis(600));
        assert_eq!(
            fired,
            vec![FiredTimer {
                cycle,
                kind: TimerKind::Settle
            }]
        );

        let fired = schedule.drain_due(t0 + Duration::from_millis(2100));
        assert_eq!(
            fired,
            vec![FiredTimer {
                cycle,
                kind: TimerKind::Respawn
            }]
        );
        assert_eq!(schedule.pending(), 0);
    }

    #[test]
    fn test_long_frame_preserves_order() {
        let mut schedule = schedule();
        let t0 = Instant::now();
        let cycle = schedule.begin_cycle(t0);

        let fired = schedule.drain_due(t0 + Duration::from_secs(10));
        assert_eq!(
            fired,
            vec![
                FiredTimer {
                    cycle,
                    kind: TimerKind::Settle
                },
                FiredTimer {
                    cycle,
                    kind: TimerKind::Respawn
                },
            ]
        );
    }

    #[test]
    fn test_new_cycle_cancels_previous() {
        let mut schedule = schedule();
        let t0 = Instant::now();
        let first = schedule.begin_cycle(t0);
        let second = schedule.begin_cycle(t0 + Duration::from_millis(300));
        assert_ne!(first, second);

        // Only the second cycle's tasks remain, at the second cycle's times.
        assert!(schedule.drain_due(t0 + Duration::from_millis(600)).is_empty());
        let fired = schedule.drain_due(t0 + Duration::from_millis(900));
        assert_eq!(
            fired,
            vec![FiredTimer {
                cycle: second,
                kind: TimerKind::Settle
            }]
        );
    }
}
