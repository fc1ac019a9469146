use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use crossbeam::utils::Backoff;

use crate::config::{MillisRange, RetryPolicy};
use crate::fork::{Fork, ForkId};
use crate::observer::SeatView;
use crate::probe::{DiningProbe, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Thinking = 0,
    Eating = 1,
}

impl State {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => State::Eating,
            _ => State::Thinking,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Thinking => f.write_str("thinking"),
            State::Eating => f.write_str("eating"),
        }
    }
}

/// How long each philosopher dines and how it behaves while waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MealPlan {
    pub meals: usize,
    pub eat: MillisRange,
    pub think: MillisRange,
    pub retry: RetryPolicy,
}

impl MealPlan {
    /// No sleeping anywhere; useful when only the protocol matters.
    pub fn hurried(meals: usize) -> Self {
        Self {
            meals,
            eat: MillisRange::ZERO,
            think: MillisRange::ZERO,
            retry: RetryPolicy::Spin,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiningStats {
    pub attempts: usize,
    pub left_busy: usize,
    pub right_busy: usize,
}

#[derive(Debug)]
pub struct Philosopher {
    index: usize,
    name: String,
    left: ForkId,
    right: ForkId,
    state: AtomicU8,
    has_left: AtomicBool,
    has_right: AtomicBool,
    meals: AtomicUsize,
    attempts: AtomicUsize,
    left_busy: AtomicUsize,
    right_busy: AtomicUsize,
}

/// A fork in hand. Dropping it clears the held flag and then puts the fork down.
struct HeldFork<'t> {
    seat: usize,
    id: ForkId,
    side: Side,
    fork: &'t Fork,
    flag: &'t AtomicBool,
    probe: &'t dyn DiningProbe,
}

impl Drop for HeldFork<'_> {
    fn drop(&mut self) {
        self.probe.putting_down(self.seat, self.id, self.side);
        self.flag.store(false, Ordering::Release);
        self.fork.release(self.seat);
    }
}

impl Philosopher {
    pub fn new(index: usize, left: ForkId, right: ForkId) -> Self {
        Self {
            index,
            name: format!("Philosopher {index}"),
            left,
            right,
            state: AtomicU8::new(State::Thinking as u8),
            has_left: AtomicBool::new(false),
            has_right: AtomicBool::new(false),
            meals: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
            left_busy: AtomicUsize::new(0),
            right_busy: AtomicUsize::new(0),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn left(&self) -> ForkId {
        self.left
    }

    pub fn right(&self) -> ForkId {
        self.right
    }

    pub fn fork_id(&self, side: Side) -> ForkId {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn has_left(&self) -> bool {
        self.has_left.load(Ordering::Acquire)
    }

    pub fn has_right(&self) -> bool {
        self.has_right.load(Ordering::Acquire)
    }

    pub fn meals(&self) -> usize {
        self.meals.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> DiningStats {
        DiningStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            left_busy: self.left_busy.load(Ordering::Relaxed),
            right_busy: self.right_busy.load(Ordering::Relaxed),
        }
    }

    pub fn view(&self) -> SeatView {
        SeatView {
            index: self.index,
            state: self.state(),
            has_left: self.has_left(),
            has_right: self.has_right(),
            meals: self.meals(),
        }
    }

    /// Thinks and eats until `plan.meals` meals are done.
    ///
    /// Each attempt tries the left fork, then the right one, without waiting
    /// on either. If the right fork is busy the left one goes straight back.
    pub fn dine(&self, forks: &[Fork], plan: &MealPlan, probe: &dyn DiningProbe) {
        let mut rng = rand::thread_rng();
        let backoff = Backoff::new();

        while self.meals() < plan.meals {
            self.set_state(State::Thinking);
            plan.think.pause(&mut rng);

            let Some((left, right)) = self.pick_up(forks, probe) else {
                plan.retry.wait(&backoff, &mut rng);
                continue;
            };

            self.set_state(State::Eating);
            plan.eat.pause(&mut rng);
            let meal = self.meals.fetch_add(1, Ordering::AcqRel) + 1;
            probe.ate(self.index, meal);

            drop(right);
            drop(left);
            backoff.reset();
        }

        self.set_state(State::Thinking);
    }

    fn set_state(&self, state: State) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn flag(&self, side: Side) -> &AtomicBool {
        match side {
            Side::Left => &self.has_left,
            Side::Right => &self.has_right,
        }
    }

    fn take<'t>(
        &'t self,
        forks: &'t [Fork],
        side: Side,
        probe: &'t dyn DiningProbe,
    ) -> Option<HeldFork<'t>> {
        let id = self.fork_id(side);
        let fork = &forks[id.0];
        if !fork.try_acquire(self.index) {
            return None;
        }

        let flag = self.flag(side);
        flag.store(true, Ordering::Release);
        probe.picked_up(self.index, id, side);

        Some(HeldFork {
            seat: self.index,
            id,
            side,
            fork,
            flag,
            probe,
        })
    }

    fn pick_up<'t>(
        &'t self,
        forks: &'t [Fork],
        probe: &'t dyn DiningProbe,
    ) -> Option<(HeldFork<'t>, HeldFork<'t>)> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let Some(left) = self.take(forks, Side::Left, probe) else {
            self.left_busy.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match self.take(forks, Side::Right, probe) {
            Some(right) => Some((left, right)),
            None => {
                self.right_busy.fetch_add(1, Ordering::Relaxed);
                drop(left);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::NoProbe;
    use std::sync::Mutex;
    use std::thread;

    fn two_forks() -> Vec<Fork> {
        vec![Fork::new("Fork 1"), Fork::new("Fork 2")]
    }

    #[test]
    fn test_new_philosopher_is_thinking_empty_handed() {
        let p = Philosopher::new(2, ForkId(2), ForkId(3));
        assert_eq!(p.name(), "Philosopher 2");
        assert_eq!(p.state(), State::Thinking);
        assert!(!p.has_left() && !p.has_right());
        assert_eq!(p.meals(), 0);
        assert_eq!(p.stats(), DiningStats::default());
    }

    #[test]
    fn test_pick_up_both_then_put_down() {
        let forks = two_forks();
        let p = Philosopher::new(0, ForkId(0), ForkId(1));

        for _ in 0..3 {
            let (left, right) = p.pick_up(&forks, &NoProbe).expect("both forks are free");
            assert!(p.has_left() && p.has_right());
            assert_eq!(forks[0].holder(), Some(0));
            assert_eq!(forks[1].holder(), Some(0));

            drop(right);
            drop(left);
            assert!(!p.has_left() && !p.has_right());
            assert!(!forks[0].is_held() && !forks[1].is_held());
        }
        assert_eq!(p.stats().attempts, 3);
    }

    #[test]
    fn test_busy_left_fork_fails_attempt() {
        let forks = two_forks();
        let p = Philosopher::new(0, ForkId(0), ForkId(1));
        assert!(forks[0].try_acquire(1));

        assert!(p.pick_up(&forks, &NoProbe).is_none());
        assert!(!p.has_left());
        assert!(!forks[1].is_held());
        assert_eq!(
            p.stats(),
            DiningStats {
                attempts: 1,
                left_busy: 1,
                right_busy: 0
            }
        );
    }

    #[test]
    fn test_busy_right_fork_returns_left_fork() {
        let forks = two_forks();
        let p = Philosopher::new(0, ForkId(0), ForkId(1));
        assert!(forks[1].try_acquire(1));

        assert!(p.pick_up(&forks, &NoProbe).is_none());
        assert!(!p.has_left() && !p.has_right());
        assert!(!forks[0].is_held());
        assert_eq!(forks[1].holder(), Some(1));
        assert_eq!(p.stats().right_busy, 1);
    }

    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<String>>,
    }

    impl DiningProbe for Journal {
        fn picked_up(&self, seat: usize, fork: ForkId, side: Side) {
            self.events.lock().unwrap().push(format!("{seat} up {fork} {side:?}"));
        }

        fn putting_down(&self, seat: usize, fork: ForkId, side: Side) {
            self.events.lock().unwrap().push(format!("{seat} down {fork} {side:?}"));
        }

        fn ate(&self, seat: usize, meal: usize) {
            self.events.lock().unwrap().push(format!("{seat} ate {meal}"));
        }
    }

    #[test]
    fn test_dine_alone_follows_left_right_order() {
        let forks = two_forks();
        let p = Philosopher::new(1, ForkId(1), ForkId(0));
        let journal = Journal::default();

        p.dine(&forks, &MealPlan::hurried(2), &journal);

        let events = journal.events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                "1 up #1 Left",
                "1 up #0 Right",
                "1 ate 1",
                "1 down #0 Right",
                "1 down #1 Left",
                "1 up #1 Left",
                "1 up #0 Right",
                "1 ate 2",
                "1 down #0 Right",
                "1 down #1 Left",
            ]
        );
        assert_eq!(p.meals(), 2);
        assert_eq!(p.state(), State::Thinking);
        assert!(!forks[0].is_held() && !forks[1].is_held());
    }

    /// Checks, at every callback, that the flag and the lock agree.
    struct FlagAudit<'a> {
        philosopher: &'a Philosopher,
        forks: &'a [Fork],
    }

    impl DiningProbe for FlagAudit<'_> {
        fn picked_up(&self, seat: usize, fork: ForkId, side: Side) {
            assert_eq!(self.forks[fork.0].holder(), Some(seat));
            let flag = match side {
                Side::Left => self.philosopher.has_left(),
                Side::Right => self.philosopher.has_right(),
            };
            assert!(flag, "flag must be set once the lock is held");
        }

        fn putting_down(&self, seat: usize, fork: ForkId, _side: Side) {
            assert_eq!(self.forks[fork.0].holder(), Some(seat));
        }

        fn ate(&self, seat: usize, _meal: usize) {
            assert_eq!(self.philosopher.state(), State::Eating);
            assert_eq!(self.forks[self.philosopher.left().0].holder(), Some(seat));
            assert_eq!(self.forks[self.philosopher.right().0].holder(), Some(seat));
        }
    }

    #[test]
    fn test_flags_track_locks() {
        let forks = two_forks();
        let p = Philosopher::new(0, ForkId(0), ForkId(1));
        let audit = FlagAudit {
            philosopher: &p,
            forks: &forks,
        };

        p.dine(&forks, &MealPlan::hurried(3), &audit);
        assert_eq!(p.meals(), 3);
    }

    /// A neighbour snatches the left fork the moment it is free and then
    /// looks at the flag. Taking the fork synchronizes with its release, so
    /// the flag must already be down.
    #[test]
    fn test_flag_is_down_before_fork_is_free() {
        let forks = two_forks();
        let p = Philosopher::new(0, ForkId(0), ForkId(1));
        let rounds = 2_000;
        let stale = AtomicUsize::new(0);

        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..rounds {
                    while !forks[0].try_acquire(1) {
                        std::hint::spin_loop();
                    }
                    if p.has_left() {
                        stale.fetch_add(1, Ordering::SeqCst);
                    }
                    forks[0].release(1);
                }
            });

            let mut meals = 0;
            while meals < rounds {
                match p.pick_up(&forks, &NoProbe) {
                    Some((left, right)) => {
                        drop(right);
                        drop(left);
                        meals += 1;
                    }
                    None => thread::yield_now(),
                }
            }
        });

        assert_eq!(stale.load(Ordering::SeqCst), 0);
        assert!(!p.has_left() && !forks[0].is_held());
    }

    #[test]
    fn test_view_reflects_state() {
        let forks = two_forks();
        let p = Philosopher::new(0, ForkId(0), ForkId(1));
        let (left, right) = p.pick_up(&forks, &NoProbe).unwrap();
        p.set_state(State::Eating);

        let view = p.view();
        assert_eq!(view.index, 0);
        assert_eq!(view.state, State::Eating);
        assert!(view.has_left && view.has_right);

        drop(right);
        drop(left);
        assert!(!p.view().has_left);
    }
}
