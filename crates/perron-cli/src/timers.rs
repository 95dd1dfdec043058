//! Timer host on any [`Environment`] clock.
//!
//! `Environment::Instant` only supports subtraction, so each timer keeps the
//! instant it was armed and its delay. A timer is due once the time elapsed
//! since arming reaches the delay.

use std::time::Duration;

use perron_client::{TimerId, TimerService};
use perron_core::Environment;

#[derive(Debug, Clone, Copy)]
struct Armed<I> {
    id: TimerId,
    armed_at: I,
    delay: Duration,
    seq: u64,
}

/// One-shot timers polled by the runtime loop.
#[derive(Debug, Clone)]
pub struct EnvTimers<E: Environment> {
    env: E,
    armed: Vec<Armed<E::Instant>>,
    next_seq: u64,
}

impl<E: Environment> EnvTimers<E> {
    /// Timer host reading `env`'s clock.
    pub fn new(env: E) -> Self {
        Self { env, armed: Vec::new(), next_seq: 0 }
    }

    /// Time until the earliest armed timer is due. `None` if nothing is
    /// armed; zero if something is already due.
    pub fn next_wait(&self) -> Option<Duration> {
        let now = self.env.now();
        self.armed.iter().map(|t| t.delay.saturating_sub(now - t.armed_at)).min()
    }

    /// Number of armed timers.
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }
}

impl<E: Environment> TimerService for EnvTimers<E> {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        self.cancel(id);
        let armed_at = self.env.now();
        self.armed.push(Armed { id, armed_at, delay, seq: self.next_seq });
        self.next_seq += 1;
    }

    fn cancel(&mut self, id: TimerId) {
        self.armed.retain(|t| t.id != id);
    }

    fn poll_expired(&mut self) -> Option<TimerId> {
        let now = self.env.now();

        // Most overdue first; among equals, the one scheduled first.
        let (position, _) = self
            .armed
            .iter()
            .enumerate()
            .filter_map(|(i, t)| {
                let elapsed = now - t.armed_at;
                (elapsed >= t.delay).then(|| (i, (elapsed - t.delay, std::cmp::Reverse(t.seq))))
            })
            .max_by_key(|(_, key)| *key)?;

        Some(self.armed.swap_remove(position).id)
    }
}

#[cfg(test)]
mod tests {
    use perron_harness::SimEnv;

    use super::*;

    #[test]
    fn due_timers_fire_in_deadline_order() {
        let env = SimEnv::new();
        let mut timers = EnvTimers::new(env.clone());

        timers.schedule(TimerId(1), Duration::from_millis(80));
        env.advance(Duration::from_millis(10));
        timers.schedule(TimerId(2), Duration::from_millis(20));
        timers.schedule(TimerId(3), Duration::from_millis(20));
        assert_eq!(timers.next_wait(), Some(Duration::from_millis(20)));

        env.advance(Duration::from_millis(100));
        let fired: Vec<_> = std::iter::from_fn(|| timers.poll_expired()).collect();
        assert_eq!(fired, [TimerId(2), TimerId(3), TimerId(1)]);
        assert_eq!(timers.next_wait(), None);
    }

    #[test]
    fn cancel_and_reschedule() {
        let env = SimEnv::new();
        let mut timers = EnvTimers::new(env.clone());

        timers.schedule(TimerId(1), Duration::from_millis(5));
        timers.schedule(TimerId(1), Duration::from_millis(50));
        timers.schedule(TimerId(2), Duration::from_millis(5));
        timers.cancel(TimerId(2));
        assert_eq!(timers.armed_count(), 1);

        env.advance(Duration::from_millis(5));
        assert_eq!(timers.poll_expired(), None);
        env.advance(Duration::from_millis(45));
        assert_eq!(timers.poll_expired(), Some(TimerId(1)));
    }
}
