use crate::clock::{Clock, TimerSet};
use crate::model::{Rules, Stat, Tick, VitalStats, MAX_STAT};
use tracing::{debug, info};

/// Raised once per engine lifetime, when a decay tick empties a stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Died {
    pub(crate) cause: Stat,
}

/// Owns the meters and their two decay timers.
pub(crate) struct VitalsEngine {
    stats: VitalStats,
    timers: TimerSet,
    died: Option<Stat>,
}

impl VitalsEngine {
    pub(crate) fn new() -> Self {
        Self {
            stats: VitalStats::default(),
            timers: TimerSet::default(),
            died: None,
        }
    }

    pub(crate) fn stats(&self) -> VitalStats {
        self.stats
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.died.is_some()
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Arms both decay timers. Hunger is registered first, so it wins
    /// when both fall due on the same instant.
    pub(crate) fn start(&mut self, clock: &mut Clock<Tick>, rules: &Rules) {
        if self.died.is_some() {
            return;
        }
        self.timers.release(clock);
        for stat in [Stat::Hunger, Stat::Happiness] {
            let h = clock.every(rules.decay_period(stat), Tick::Decay(stat));
            self.timers.hold(h);
        }
        debug!(
            hunger_ms = rules.hunger_period_ms,
            happiness_ms = rules.happiness_period_ms,
            "decay started"
        );
    }

    pub(crate) fn stop(&mut self, clock: &mut Clock<Tick>) {
        self.timers.release(clock);
    }

    /// Applies one decay tick. Returns `Some` exactly once, on the tick
    /// that kills; both timers are cancelled before returning.
    pub(crate) fn on_decay(&mut self, stat: Stat, clock: &mut Clock<Tick>) -> Option<Died> {
        if self.died.is_some() {
            return None;
        }
        if self.stats.get(stat) <= 1 {
            self.stats.set(stat, 0);
            self.died = Some(stat);
            self.stop(clock);
            info!(cause = %stat, "pet died");
            return Some(Died { cause: stat });
        }
        self.stats.adjust(stat, -1);
        None
    }

    /// Clamped change; ignored after death.
    pub(crate) fn adjust(&mut self, stat: Stat, delta: i32) {
        if self.died.is_none() {
            self.stats.adjust(stat, delta);
        }
    }

    pub(crate) fn fill(&mut self, stat: Stat) {
        if self.died.is_none() {
            self.stats.set(stat, MAX_STAT);
        }
    }
}
