use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::trace;

/// Opaque id of a scheduled timer. Ids are handed out in registration
/// order and never reused within one clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TimerHandle(u64);

#[derive(Clone, Debug)]
struct Timer<E> {
    due_ns: u64,
    period_ns: Option<u64>,
    event: E,
}

/// Single-threaded virtual clock.
///
/// Timers carry a payload `E` instead of a closure. The owner drains due
/// timers with [`Clock::pop_due`] and runs the matching handler itself, so
/// every handler runs to completion before the next timer is looked at.
/// Timers due at the same instant come out in registration order.
/// Time is kept in nanoseconds so frame-sized steps never lose their
/// fractional part.
pub(crate) struct Clock<E> {
    now_ns: u64,
    next_id: u64,
    timers: HashMap<TimerHandle, Timer<E>>,
    queue: BTreeSet<(u64, TimerHandle)>,
}

impl<E: Clone> Clock<E> {
    pub(crate) fn new() -> Self {
        Self {
            now_ns: 0,
            next_id: 0,
            timers: HashMap::new(),
            queue: BTreeSet::new(),
        }
    }

    pub(crate) fn now(&self) -> Duration {
        Duration::from_nanos(self.now_ns)
    }

    /// Fire `event` once, `delay` from now.
    pub(crate) fn after(&mut self, delay: Duration, event: E) -> TimerHandle {
        self.schedule(as_nanos(delay), None, event)
    }

    /// Fire `event` every `period`, first delivery one period from now.
    pub(crate) fn every(&mut self, period: Duration, event: E) -> TimerHandle {
        let period_ns = as_nanos(period).max(MIN_PERIOD_NS);
        self.schedule(period_ns, Some(period_ns), event)
    }

    /// Returns false if the timer had already fired (one-shot) or was
    /// cancelled before.
    pub(crate) fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.timers.remove(&handle) {
            Some(t) => {
                self.queue.remove(&(t.due_ns, handle));
                trace!(?handle, "timer cancelled");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    #[cfg(test)]
    pub(crate) fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Pops the earliest timer due at or before `until`, moving the clock
    /// to its due time. Repeating timers are re-armed before they are
    /// returned, so the handler may cancel them. When nothing is due the
    /// clock moves to `until` and `None` is returned.
    pub(crate) fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, E)> {
        let until_ns = as_nanos(until).max(self.now_ns);
        let &(due_ns, handle) = match self.queue.first() {
            Some(head) if head.0 <= until_ns => head,
            _ => {
                self.now_ns = until_ns;
                return None;
            }
        };
        self.queue.remove(&(due_ns, handle));
        self.now_ns = due_ns;

        let timer = self.timers.get_mut(&handle)?;
        let event = timer.event.clone();
        match timer.period_ns {
            Some(p) => {
                timer.due_ns = due_ns + p;
                self.queue.insert((timer.due_ns, handle));
            }
            None => {
                self.timers.remove(&handle);
            }
        }
        Some((handle, event))
    }

    fn schedule(&mut self, delay_ns: u64, period_ns: Option<u64>, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let due_ns = self.now_ns.saturating_add(delay_ns);
        self.timers.insert(
            handle,
            Timer {
                due_ns,
                period_ns,
                event,
            },
        );
        self.queue.insert((due_ns, handle));
        handle
    }
}

const MIN_PERIOD_NS: u64 = 1_000_000;

fn as_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX / 2)
}

/// Handles acquired by one `start()`-like call, released together.
#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    handles: Vec<TimerHandle>,
}

impl TimerSet {
    pub(crate) fn hold(&mut self, handle: TimerHandle) {
        self.handles.push(handle);
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancels every held timer. Safe to call repeatedly.
    pub(crate) fn release<E: Clone>(&mut self, clock: &mut Clock<E>) {
        for h in self.handles.drain(..) {
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

    fn drain(clock: &mut Clock<&'static str>, until: u64) -> Vec<(u64, &'static str)> {
        let mut out = Vec::new();
        while let Some((_, ev)) = clock.pop_due(ms(until)) {
            out.push((clock.now().as_millis() as u64, ev));
        }
        out
    }

    #[test]
    fn one_shot_fires_once() {
        let mut clock = Clock::new();
        let h = clock.after(ms(100), "a");
        assert!(clock.pop_due(ms(99)).is_none());
        assert_eq!(clock.now(), ms(99));
        assert_eq!(clock.pop_due(ms(100)).map(|(_, e)| e), Some("a"));
        assert!(!clock.is_active(h));
        assert!(clock.pop_due(ms(1_000)).is_none());
        assert_eq!(clock.now(), ms(1_000));
    }

    #[test]
    fn repeating_timer_keeps_period() {
        let mut clock = Clock::new();
        clock.every(ms(300), "tick");
        let fired = drain(&mut clock, 1_000);
        assert_eq!(fired, vec![(300, "tick"), (600, "tick"), (900, "tick")]);
    }

    #[test]
    fn same_instant_resolves_in_registration_order() {
        let mut clock = Clock::new();
        clock.every(ms(200), "first");
        clock.every(ms(100), "second");
        clock.after(ms(200), "third");
        let fired = drain(&mut clock, 200);
        assert_eq!(
            fired,
            vec![(100, "second"), (200, "first"), (200, "second"), (200, "third")]
        );
    }

    #[test]
    fn cancel_from_handler_suppresses_queued_timer() {
        let mut clock = Clock::new();
        let killer = clock.after(ms(50), "killer");
        let victim = clock.after(ms(50), "victim");
        let (h, ev) = clock.pop_due(ms(50)).unwrap();
        assert_eq!((h, ev), (killer, "killer"));
        assert!(clock.cancel(victim));
        assert!(clock.pop_due(ms(50)).is_none());
        assert!(!clock.cancel(victim));
    }

    #[test]
    fn cancelling_repeating_timer_inside_its_own_delivery_stops_it() {
        let mut clock = Clock::new();
        let h = clock.every(ms(10), "r");
        assert!(clock.pop_due(ms(10)).is_some());
        clock.cancel(h);
        assert!(clock.pop_due(ms(100)).is_none());
        assert_eq!(clock.active_count(), 0);
    }

    #[test]
    fn timer_set_release_is_idempotent() {
        let mut clock = Clock::new();
        let mut set = TimerSet::default();
        set.hold(clock.every(ms(5), "a"));
        set.hold(clock.after(ms(5), "b"));
        set.release(&mut clock);
        set.release(&mut clock);
        assert!(set.is_empty());
        assert!(clock.pop_due(ms(50)).is_none());
    }

    #[test]
    fn fractional_steps_accumulate() {
        let mut clock = Clock::new();
        clock.every(ms(4000), "tick");
        let step = Duration::from_nanos(4_166_667);
        let mut fired = 0;
        for _ in 0..970 {
            let until = clock.now() + step;
            while clock.pop_due(until).is_some() {
                fired += 1;
            }
        }
        // 970 steps is just over 4.04s
        assert_eq!(fired, 1);
        assert!(clock.now() > ms(4040));
    }

    #[test]
    fn sub_millisecond_steps_still_move_time() {
        let mut clock = Clock::new();
        clock.after(ms(5), "late");
        let mut fired = 0;
        for _ in 0..10_000 {
            let until = clock.now() + Duration::from_micros(900);
            while clock.pop_due(until).is_some() {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(clock.now(), ms(9_000));
    }

    #[test]
    fn zero_period_does_not_spin() {
        let mut clock = Clock::new();
        clock.every(ms(0), "z");
        assert_eq!(drain(&mut clock, 3).len(), 3);
    }
}
