//! Virtual-time timer host.

use std::{collections::BTreeMap, time::Duration};

use perron_client::{TimerId, TimerService};
use perron_core::Environment;

use crate::{SimEnv, SimInstant};

/// One-shot timers against a [`SimEnv`] clock.
///
/// Deadlines are ordered by `(deadline, sequence)`, so timers due at the
/// same instant fire in the order they were scheduled.
#[derive(Debug, Clone)]
pub struct SimTimers {
    env: SimEnv,
    armed: BTreeMap<(SimInstant, u64), TimerId>,
    next_seq: u64,
}

impl SimTimers {
    /// Timer host reading `env`'s clock.
    pub fn new(env: SimEnv) -> Self {
        Self { env, armed: BTreeMap::new(), next_seq: 0 }
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<SimInstant> {
        self.armed.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Number of armed timers.
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Whether `id` is armed.
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.armed.values().any(|armed| *armed == id)
    }
}

impl TimerService for SimTimers {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        self.cancel(id);
        let deadline = self.env.now().after(delay);
        self.armed.insert((deadline, self.next_seq), id);
        self.next_seq += 1;
    }

    fn cancel(&mut self, id: TimerId) {
        self.armed.retain(|_, armed| *armed != id);
    }

    fn poll_expired(&mut self) -> Option<TimerId> {
        let now = self.env.now();
        let key = *self.armed.keys().next()?;
        if key.0 > now {
            return None;
        }
        self.armed.remove(&key)
    }
}
