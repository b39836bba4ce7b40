use crate::animation::AnimationScheduler;
use crate::clock::Clock;
use crate::model::{Stat, Tick};
use crate::vitals::VitalsEngine;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Feed,
    Pet,
    Dance,
    Unknown,
    Empty,
}

pub(crate) const FEED_AMOUNT: i32 = 5;
pub(crate) const PET_AMOUNT: i32 = 3;
pub(crate) const DANCE_HUNGER_COST: i32 = 3;

/// Words the player may type; `dance` only when the variant has it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CommandSet {
    pub(crate) dance: bool,
}

impl CommandSet {
    pub(crate) fn words(&self) -> &'static [&'static str] {
        if self.dance {
            &["feed", "pet", "dance"]
        } else {
            &["feed", "pet"]
        }
    }

    pub(crate) fn unknown_message(&self) -> &'static str {
        if self.dance {
            "Unknown command. Try \"feed\", \"pet\", or \"dance\"."
        } else {
            "Unknown command. Try \"feed\" or \"pet\"."
        }
    }

    pub(crate) fn parse(&self, raw: &str) -> Command {
        let cmd = raw.trim().to_lowercase();
        match cmd.as_str() {
            "" => Command::Empty,
            "feed" => Command::Feed,
            "pet" => Command::Pet,
            "dance" if self.dance => Command::Dance,
            _ => Command::Unknown,
        }
    }

    /// Applies `cmd` and returns the new message line. `None` leaves the
    /// current message alone (empty input, or a dead pet).
    pub(crate) fn dispatch(
        &self,
        cmd: Command,
        vitals: &mut VitalsEngine,
        animation: &mut AnimationScheduler,
        clock: &mut Clock<Tick>,
    ) -> Option<&'static str> {
        if vitals.is_dead() {
            return None;
        }
        debug!(?cmd, "dispatch");
        match cmd {
            Command::Feed => {
                vitals.adjust(Stat::Hunger, FEED_AMOUNT);
                Some("You fed your cat.")
            }
            Command::Pet => {
                vitals.adjust(Stat::Happiness, PET_AMOUNT);
                Some("You pet your cat.")
            }
            Command::Dance if self.dance => {
                vitals.fill(Stat::Happiness);
                vitals.adjust(Stat::Hunger, -DANCE_HUNGER_COST);
                animation.enter_dancing(clock);
                Some("Your cat is dancing!")
            }
            Command::Dance | Command::Unknown => Some(self.unknown_message()),
            Command::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{FixedHold, Frame, Mode};
    use crate::model::{Rules, MAX_STAT};
    use std::time::Duration;

    const FULL: CommandSet = CommandSet { dance: true };
    const REDUCED: CommandSet = CommandSet { dance: false };

    struct Rig {
        clock: Clock<Tick>,
        vitals: VitalsEngine,
        anim: AnimationScheduler,
    }

    fn rig() -> Rig {
        let rules = Rules::classic();
        let mut clock = Clock::new();
        let mut anim =
            AnimationScheduler::new(&rules, Box::new(FixedHold(Duration::from_millis(1000))));
        anim.reset(&mut clock);
        Rig {
            clock,
            vitals: VitalsEngine::new(),
            anim,
        }
    }

    impl Rig {
        fn run(&mut self, set: CommandSet, cmd: Command) -> Option<&'static str> {
            set.dispatch(cmd, &mut self.vitals, &mut self.anim, &mut self.clock)
        }
    }

    #[test]
    fn parse_trims_and_folds_case() {
        assert_eq!(FULL.parse("  FEED "), Command::Feed);
        assert_eq!(FULL.parse("Pet"), Command::Pet);
        assert_eq!(FULL.parse("\tdAnCe\n"), Command::Dance);
        assert_eq!(FULL.parse("feed me"), Command::Unknown);
        assert_eq!(FULL.parse("   "), Command::Empty);
        assert_eq!(FULL.parse(""), Command::Empty);
    }

    #[test]
    fn reduced_set_treats_dance_as_unknown() {
        assert_eq!(REDUCED.parse("dance"), Command::Unknown);
        assert_eq!(REDUCED.words(), &["feed", "pet"]);
        let mut r = rig();
        assert_eq!(
            r.run(REDUCED, Command::Dance),
            Some("Unknown command. Try \"feed\" or \"pet\".")
        );
        assert_eq!(r.anim.mode(), Mode::Idle);
    }

    #[test]
    fn feed_near_max_clamps_exactly() {
        let mut r = rig();
        r.vitals.adjust(Stat::Hunger, -2);
        assert_eq!(r.run(FULL, Command::Feed), Some("You fed your cat."));
        assert_eq!(r.vitals.stats().hunger(), MAX_STAT);
    }

    #[test]
    fn pet_adds_three_happiness() {
        let mut r = rig();
        r.vitals.adjust(Stat::Happiness, -10);
        assert_eq!(r.run(FULL, Command::Pet), Some("You pet your cat."));
        assert_eq!(r.vitals.stats().happiness(), MAX_STAT - 7);
        assert_eq!(r.vitals.stats().hunger(), MAX_STAT);
    }

    #[test]
    fn dance_maxes_happiness_and_costs_hunger() {
        for (hunger_drop, happy_drop) in [(0, 0), (10, 19), (18, 5), (20, 1)] {
            let mut r = rig();
            r.vitals.adjust(Stat::Hunger, -hunger_drop);
            r.vitals.adjust(Stat::Happiness, -happy_drop);
            let before = r.vitals.stats().hunger() as i32;
            assert_eq!(r.run(FULL, Command::Dance), Some("Your cat is dancing!"));
            assert_eq!(r.vitals.stats().happiness(), MAX_STAT);
            assert_eq!(r.vitals.stats().hunger() as i32, (before - 3).max(0));
            assert_eq!(r.anim.current_frame(), Frame::DanceRight);
        }
    }

    #[test]
    fn unknown_and_empty_leave_stats_alone() {
        let mut r = rig();
        r.vitals.adjust(Stat::Hunger, -4);
        let before = r.vitals.stats();
        assert_eq!(r.run(FULL, Command::Unknown), Some(FULL.unknown_message()));
        assert_eq!(r.run(FULL, Command::Empty), None);
        assert_eq!(r.vitals.stats(), before);
    }

    #[test]
    fn dead_pet_ignores_everything() {
        let mut r = rig();
        r.vitals.adjust(Stat::Hunger, -20);
        assert!(r.vitals.on_decay(Stat::Hunger, &mut r.clock).is_some());
        let before = r.vitals.stats();
        for cmd in [Command::Feed, Command::Pet, Command::Dance, Command::Unknown] {
            assert_eq!(r.run(FULL, cmd), None);
        }
        assert_eq!(r.vitals.stats(), before);
        assert_ne!(r.anim.mode(), Mode::Dancing);
    }
}
