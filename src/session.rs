use crate::animation::{AnimationScheduler, Frame, HoldProvider};
use crate::clock::Clock;
use crate::command::{Command, CommandSet};
use crate::model::{Rules, Stat, Tick, MAX_STAT};
use crate::vitals::{Died, VitalsEngine};
use std::time::Duration;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Playing,
    GameOver,
}

pub(crate) fn death_message(cause: Stat) -> &'static str {
    match cause {
        Stat::Hunger => "Your cat starved! It is dead.",
        Stat::Happiness => "Your cat got too sad. It has died.",
    }
}

/// Snapshot handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DisplayState {
    pub(crate) hunger: u8,
    pub(crate) happiness: u8,
    pub(crate) frame: Frame,
    pub(crate) message: String,
    pub(crate) is_game_over: bool,
}

impl DisplayState {
    pub(crate) fn hunger_bar(&self) -> String {
        stat_bar(self.hunger)
    }

    pub(crate) fn happiness_bar(&self) -> String {
        stat_bar(self.happiness)
    }
}

fn stat_bar(value: u8) -> String {
    let value = value.min(MAX_STAT) as usize;
    let mut s = String::with_capacity(MAX_STAT as usize + 2);
    s.push('[');
    s.push_str(&"X".repeat(value));
    s.push_str(&" ".repeat(MAX_STAT as usize - value));
    s.push(']');
    s
}

/// Top-level orchestrator. Owns the clock and everything scheduled on it.
pub(crate) struct Session {
    rules: Rules,
    commands: CommandSet,
    clock: Clock<Tick>,
    vitals: VitalsEngine,
    animation: AnimationScheduler,
    phase: Phase,
    message: String,
}

impl Session {
    pub(crate) fn new(rules: Rules, holds: Box<dyn HoldProvider>) -> Self {
        let commands = CommandSet {
            dance: rules.dance_enabled,
        };
        let animation = AnimationScheduler::new(&rules, holds);
        let mut s = Self {
            rules,
            commands,
            clock: Clock::new(),
            vitals: VitalsEngine::new(),
            animation,
            phase: Phase::Playing,
            message: String::new(),
        };
        s.enter_playing();
        s
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn commands(&self) -> CommandSet {
        self.commands
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.clock.now()
    }

    pub(crate) fn display_state(&self) -> DisplayState {
        let stats = self.vitals.stats();
        DisplayState {
            hunger: stats.hunger(),
            happiness: stats.happiness(),
            frame: self.animation.current_frame(),
            message: self.message.clone(),
            is_game_over: self.phase == Phase::GameOver,
        }
    }

    /// Runs every timer that falls due within `dt`, one handler at a time.
    pub(crate) fn advance(&mut self, dt: Duration) {
        let until = self.clock.now() + dt;
        while let Some((_, tick)) = self.clock.pop_due(until) {
            self.on_tick(tick);
        }
    }

    pub(crate) fn submit_command(&mut self, raw: &str) {
        if self.phase == Phase::GameOver {
            return;
        }
        let cmd = self.commands.parse(raw);
        if cmd == Command::Empty {
            return;
        }
        self.animation.stop_dancing(&mut self.clock);
        if let Some(msg) =
            self.commands
                .dispatch(cmd, &mut self.vitals, &mut self.animation, &mut self.clock)
        {
            self.message = msg.to_string();
        }
    }

    /// Throws the current pet away and starts a new one.
    pub(crate) fn restart(&mut self) {
        self.vitals.stop(&mut self.clock);
        self.animation.stop(&mut self.clock);
        self.vitals = VitalsEngine::new();
        info!("session restarted");
        self.enter_playing();
    }

    fn enter_playing(&mut self) {
        self.phase = Phase::Playing;
        self.message.clear();
        self.animation.reset(&mut self.clock);
        self.vitals.start(&mut self.clock, &self.rules);
        info!(dance = self.commands.dance, "playing");
    }

    fn on_tick(&mut self, tick: Tick) {
        match tick {
            Tick::Decay(stat) => {
                if let Some(died) = self.vitals.on_decay(stat, &mut self.clock) {
                    self.game_over(died);
                }
            }
            _ => self.animation.on_tick(tick, &mut self.clock),
        }
    }

    fn game_over(&mut self, died: Died) {
        if self.phase == Phase::GameOver {
            return;
        }
        self.vitals.stop(&mut self.clock);
        self.animation.enter_dead(&mut self.clock);
        self.phase = Phase::GameOver;
        self.message = death_message(died.cause).to_string();
        info!(cause = %died.cause, after_ms = self.clock.now().as_millis() as u64, "game over");
    }
}
