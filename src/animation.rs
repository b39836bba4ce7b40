use crate::clock::{Clock, TimerHandle};
use crate::model::{Rules, Tick};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Idle,
    Blinking,
    Dead,
    Dancing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    Open,
    Blink,
    Dead,
    DanceRight,
    DanceLeft,
}

const DANCE_FRAMES: [Frame; 2] = [Frame::DanceRight, Frame::DanceLeft];

/// Source of the open-eye hold before each blink.
pub(crate) trait HoldProvider {
    fn next_hold(&mut self) -> Duration;
    fn reseed(&mut self) {}
}

/// Uniform draw in `[min, max]` milliseconds.
pub(crate) struct RandomHold {
    rng: StdRng,
    seed: Option<u64>,
    min_ms: u64,
    max_ms: u64,
}

impl RandomHold {
    pub(crate) fn new(rules: &Rules, seed: Option<u64>) -> Self {
        Self {
            rng: make_rng(seed),
            seed,
            min_ms: rules.hold_min_ms.min(rules.hold_max_ms),
            max_ms: rules.hold_max_ms.max(rules.hold_min_ms),
        }
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

impl HoldProvider for RandomHold {
    fn next_hold(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.min_ms..=self.max_ms))
    }

    fn reseed(&mut self) {
        self.rng = make_rng(self.seed);
    }
}

/// Always the same hold.
#[cfg(test)]
pub(crate) struct FixedHold(pub(crate) Duration);

#[cfg(test)]
impl HoldProvider for FixedHold {
    fn next_hold(&mut self) -> Duration {
        self.0
    }
}

/// Cosmetic frame state machine. Never touches the meters.
///
/// At most one timer is owned at a time; it is cancelled whenever the
/// mode changes away from the one that armed it.
pub(crate) struct AnimationScheduler {
    mode: Mode,
    frame_index: usize,
    timer: Option<TimerHandle>,
    holds: Box<dyn HoldProvider>,
    blink: Duration,
    dance_period: Duration,
}

impl AnimationScheduler {
    pub(crate) fn new(rules: &Rules, holds: Box<dyn HoldProvider>) -> Self {
        Self {
            mode: Mode::Idle,
            frame_index: 0,
            timer: None,
            holds,
            blink: rules.blink(),
            dance_period: rules.dance_period(),
        }
    }

    #[cfg(test)]
    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn current_frame(&self) -> Frame {
        match self.mode {
            Mode::Idle => Frame::Open,
            Mode::Blinking => Frame::Blink,
            Mode::Dead => Frame::Dead,
            Mode::Dancing => DANCE_FRAMES[self.frame_index % DANCE_FRAMES.len()],
        }
    }

    /// Back to the open-eye frame with a fresh hold schedule.
    pub(crate) fn reset(&mut self, clock: &mut Clock<Tick>) {
        self.holds.reseed();
        self.enter_idle(clock);
    }

    pub(crate) fn enter_dancing(&mut self, clock: &mut Clock<Tick>) {
        self.cancel_timer(clock);
        self.mode = Mode::Dancing;
        self.frame_index = 0;
        self.timer = Some(clock.every(self.dance_period, Tick::DanceFlip));
        debug!("dance started");
    }

    /// No-op unless dancing.
    pub(crate) fn stop_dancing(&mut self, clock: &mut Clock<Tick>) {
        if self.mode == Mode::Dancing {
            debug!("dance stopped");
            self.enter_idle(clock);
        }
    }

    pub(crate) fn enter_dead(&mut self, clock: &mut Clock<Tick>) {
        self.cancel_timer(clock);
        self.mode = Mode::Dead;
        self.frame_index = 0;
    }

    /// Releases whatever timer is held. Mode is left as is.
    pub(crate) fn stop(&mut self, clock: &mut Clock<Tick>) {
        self.cancel_timer(clock);
    }

    pub(crate) fn on_tick(&mut self, tick: Tick, clock: &mut Clock<Tick>) {
        match (tick, self.mode) {
            (Tick::BlinkStart, Mode::Idle) => {
                self.mode = Mode::Blinking;
                self.timer = Some(clock.after(self.blink, Tick::BlinkEnd));
            }
            (Tick::BlinkEnd, Mode::Blinking) => self.enter_idle(clock),
            (Tick::DanceFlip, Mode::Dancing) => {
                self.frame_index = (self.frame_index + 1) % DANCE_FRAMES.len();
            }
            _ => {}
        }
    }

    fn enter_idle(&mut self, clock: &mut Clock<Tick>) {
        self.cancel_timer(clock);
        self.mode = Mode::Idle;
        self.frame_index = 0;
        let hold = self.holds.next_hold();
        self.timer = Some(clock.after(hold, Tick::BlinkStart));
    }

    fn cancel_timer(&mut self, clock: &mut Clock<Tick>) {
        if let Some(h) = self.timer.take() {
            clock.cancel(h);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn scheduler(hold_ms: u64) -> AnimationScheduler {
        AnimationScheduler::new(&Rules::classic(), Box::new(FixedHold(ms(hold_ms))))
    }

    fn advance(anim: &mut AnimationScheduler, clock: &mut Clock<Tick>, until_ms: u64) {
        while let Some((_, tick)) = clock.pop_due(ms(until_ms)) {
            anim.on_tick(tick, clock);
        }
    }

    #[test]
    fn idle_blinks_after_hold_and_reopens() {
        let mut clock = Clock::new();
        let mut anim = scheduler(1500);
        anim.reset(&mut clock);
        assert_eq!(anim.current_frame(), Frame::Open);

        advance(&mut anim, &mut clock, 1499);
        assert_eq!(anim.current_frame(), Frame::Open);
        advance(&mut anim, &mut clock, 1500);
        assert_eq!(anim.current_frame(), Frame::Blink);
        assert_eq!(anim.mode(), Mode::Blinking);
        advance(&mut anim, &mut clock, 1700);
        assert_eq!(anim.current_frame(), Frame::Open);
        // next cycle
        advance(&mut anim, &mut clock, 3200);
        assert_eq!(anim.current_frame(), Frame::Blink);
        assert_eq!(clock.active_count(), 1);
    }

    #[test]
    fn dancing_alternates_frames() {
        let mut clock = Clock::new();
        let mut anim = scheduler(1000);
        anim.reset(&mut clock);
        anim.enter_dancing(&mut clock);
        assert_eq!(anim.current_frame(), Frame::DanceRight);
        advance(&mut anim, &mut clock, 500);
        assert_eq!(anim.current_frame(), Frame::DanceLeft);
        advance(&mut anim, &mut clock, 1000);
        assert_eq!(anim.current_frame(), Frame::DanceRight);
        // idle blink timer was released when dancing began
        assert_eq!(clock.active_count(), 1);
    }

    #[test]
    fn stop_dancing_returns_to_idle() {
        let mut clock = Clock::new();
        let mut anim = scheduler(1000);
        anim.reset(&mut clock);
        anim.enter_dancing(&mut clock);
        advance(&mut anim, &mut clock, 500);
        anim.stop_dancing(&mut clock);
        assert_eq!(anim.mode(), Mode::Idle);
        assert_eq!(anim.current_frame(), Frame::Open);
        advance(&mut anim, &mut clock, 1499);
        assert_eq!(anim.current_frame(), Frame::Open);
        advance(&mut anim, &mut clock, 1500);
        assert_eq!(anim.current_frame(), Frame::Blink);
    }

    #[test]
    fn stop_dancing_outside_dance_keeps_blink_schedule() {
        let mut clock = Clock::new();
        let mut anim = scheduler(1000);
        anim.reset(&mut clock);
        advance(&mut anim, &mut clock, 400);
        anim.stop_dancing(&mut clock);
        advance(&mut anim, &mut clock, 1000);
        assert_eq!(anim.current_frame(), Frame::Blink);
    }

    #[test]
    fn dead_is_absorbing() {
        let mut clock = Clock::new();
        let mut anim = scheduler(100);
        anim.reset(&mut clock);
        anim.enter_dancing(&mut clock);
        anim.enter_dead(&mut clock);
        assert_eq!(clock.active_count(), 0);
        advance(&mut anim, &mut clock, 10_000);
        assert_eq!(anim.current_frame(), Frame::Dead);
        anim.stop_dancing(&mut clock);
        anim.on_tick(Tick::BlinkStart, &mut clock);
        assert_eq!(anim.mode(), Mode::Dead);

        anim.reset(&mut clock);
        assert_eq!(anim.current_frame(), Frame::Open);
    }

    #[test]
    fn random_hold_stays_in_bounds_and_replays_after_reseed() {
        let rules = Rules::classic();
        let mut holds = RandomHold::new(&rules, Some(7));
        let first: Vec<_> = (0..50).map(|_| holds.next_hold()).collect();
        for d in &first {
            assert!(*d >= ms(rules.hold_min_ms) && *d <= ms(rules.hold_max_ms));
        }
        holds.reseed();
        let again: Vec<_> = (0..50).map(|_| holds.next_hold()).collect();
        assert_eq!(first, again);
    }
}
