use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub(crate) const MAX_STAT: u8 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Stat {
    Hunger,
    Happiness,
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Hunger => f.write_str("hunger"),
            Stat::Happiness => f.write_str("happiness"),
        }
    }
}

/// Both meters stay within `0..=MAX_STAT`; every write goes through a clamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct VitalStats {
    hunger: u8,
    happiness: u8,
}

impl Default for VitalStats {
    fn default() -> Self {
        Self {
            hunger: MAX_STAT,
            happiness: MAX_STAT,
        }
    }
}

impl VitalStats {
    pub(crate) fn get(&self, stat: Stat) -> u8 {
        match stat {
            Stat::Hunger => self.hunger,
            Stat::Happiness => self.happiness,
        }
    }

    pub(crate) fn hunger(&self) -> u8 {
        self.hunger
    }

    pub(crate) fn happiness(&self) -> u8 {
        self.happiness
    }

    pub(crate) fn adjust(&mut self, stat: Stat, delta: i32) {
        let next = (self.get(stat) as i32 + delta).clamp(0, MAX_STAT as i32) as u8;
        self.set(stat, next);
    }

    pub(crate) fn set(&mut self, stat: Stat, value: u8) {
        let value = value.min(MAX_STAT);
        match stat {
            Stat::Hunger => self.hunger = value,
            Stat::Happiness => self.happiness = value,
        }
    }
}

/// Payloads scheduled on the session clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tick {
    Decay(Stat),
    BlinkStart,
    BlinkEnd,
    DanceFlip,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Variant {
    #[default]
    Classic,
    Quick,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Rules {
    pub(crate) hunger_period_ms: u64,
    pub(crate) happiness_period_ms: u64,
    pub(crate) blink_ms: u64,
    pub(crate) hold_min_ms: u64,
    pub(crate) hold_max_ms: u64,
    pub(crate) dance_period_ms: u64,
    pub(crate) dance_enabled: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self::classic()
    }
}

impl Rules {
    pub(crate) fn classic() -> Self {
        Self {
            hunger_period_ms: 4000,
            happiness_period_ms: 3000, // faster than hunger
            blink_ms: 200,
            hold_min_ms: 1000,
            hold_max_ms: 3000,
            dance_period_ms: 500,
            dance_enabled: true,
        }
    }

    pub(crate) fn quick() -> Self {
        Self {
            hunger_period_ms: 2000,
            happiness_period_ms: 1500,
            dance_enabled: false,
            ..Self::classic()
        }
    }

    pub(crate) fn for_variant(v: Variant) -> Self {
        match v {
            Variant::Classic => Self::classic(),
            Variant::Quick => Self::quick(),
        }
    }

    pub(crate) fn decay_period(&self, stat: Stat) -> Duration {
        Duration::from_millis(match stat {
            Stat::Hunger => self.hunger_period_ms,
            Stat::Happiness => self.happiness_period_ms,
        })
    }

    pub(crate) fn blink(&self) -> Duration {
        Duration::from_millis(self.blink_ms)
    }

    pub(crate) fn dance_period(&self) -> Duration {
        Duration::from_millis(self.dance_period_ms)
    }
}
