//! Deferred-action queue.
//!
//! Actions are appended while the reveal is being staged and replayed later
//! with a fixed stagger: the action at index `i` is due `interval * i +
//! EPSILON` after [`Sequence::play`] is called. Every action is scheduled
//! independently, so one that fails does not hold back the rest.
//!
//! ```text
//! append(a) append(b) append(c)      play(1s)
//!                                      │
//!                                      ├─ +1ms     a
//!                                      ├─ +1001ms  b
//!                                      └─ +2001ms  c
//! ```

use crate::error::Result;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;
use tokio::task::JoinSet;

/// Offset of the first action, so nothing runs inside the `play` call.
pub const EPSILON: Duration = Duration::from_millis(1);

/// A zero-argument, side-effecting callback.
pub type Action = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Delay of the action at `index` relative to the start of playback.
pub fn delay_for(index: usize, interval: Duration) -> Duration {
    let factor = u32::try_from(index).unwrap_or(u32::MAX);
    interval.saturating_mul(factor).saturating_add(EPSILON)
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// An action together with its position in the sequence.
pub struct Step {
    index: usize,
    label: String,
    action: Action,
}

impl Step {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run the action. Failures are logged and dropped; returns whether the
    /// action succeeded.
    pub fn run(self) -> bool {
        tracing::debug!(step = self.index, label = %self.label, "running reveal step");
        match (self.action)() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(step = self.index, label = %self.label, error = %e, "reveal step failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("index", &self.index)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

/// Append-only list of actions, consumed by a single [`Sequence::play`].
#[derive(Default)]
pub struct Sequence {
    steps: Vec<Step>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<F>(&mut self, action: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let label = format!("step {}", self.steps.len());
        self.append_named(label, action);
    }

    pub fn append_named<F>(&mut self, label: impl Into<String>, action: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.steps.push(Step {
            index: self.steps.len(),
            label: label.into(),
            action: Box::new(action),
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.label.as_str())
    }

    /// Hand every action to `scheduler` in one pass, staggered by `interval`.
    /// Returns the number of actions scheduled.
    pub fn play<S: Scheduler + ?Sized>(self, interval: Duration, scheduler: &mut S) -> usize {
        let n = self.steps.len();
        tracing::info!(steps = n, interval_ms = interval.as_millis() as u64, "playing reveal");
        for step in self.steps {
            let delay = delay_for(step.index, interval);
            scheduler.schedule(delay, step);
        }
        n
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Runs a step once `delay` has elapsed from the moment it was scheduled.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, step: Step);
}

/// Timer-backed scheduler: one Tokio task per step.
///
/// Deadlines are fixed when the step is scheduled, not when its task is first
/// polled. On a current-thread runtime each step runs to completion before
/// the next deadline is serviced.
#[derive(Default)]
pub struct TokioScheduler {
    tasks: JoinSet<bool>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every scheduled step. Returns how many ran without error
    /// (a panicking step counts as failed).
    pub async fn finish(mut self) -> usize {
        let mut ok = 0;
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(true) => ok += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "reveal step panicked"),
            }
        }
        ok
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, step: Step) {
        let deadline = tokio::time::Instant::now() + delay;
        self.tasks.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            step.run()
        });
    }
}

/// Virtual-clock scheduler; time only moves when the caller advances it.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    seq: u64,
    pending: BinaryHeap<Pending>,
}

#[derive(Debug)]
struct Pending {
    due: Duration,
    seq: u64,
    step: Step,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // Reversed: BinaryHeap is a max-heap and we want the earliest first.
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

/// A step the manual scheduler ran, and when.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired {
    pub at: Duration,
    pub index: usize,
    pub label: String,
    pub ok: bool,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.pending.peek().map(|p| p.due)
    }

    /// Move the clock forward by `by`, running every step that falls due,
    /// earliest first.
    pub fn advance(&mut self, by: Duration) -> Vec<Fired> {
        let until = self.now + by;
        let mut fired = Vec::new();
        while self.pending.peek().is_some_and(|p| p.due <= until) {
            let Some(Pending { due, step, .. }) = self.pending.pop() else {
                break;
            };
            self.now = due;
            let (index, label) = (step.index, step.label.clone());
            let ok = step.run();
            fired.push(Fired {
                at: due,
                index,
                label,
                ok,
            });
        }
        self.now = until;
        fired
    }

    /// Advance to the last deadline, running everything.
    pub fn run_all(&mut self) -> Vec<Fired> {
        let last = self.pending.iter().map(|p| p.due).max();
        match last {
            Some(last) if last > self.now => self.advance(last - self.now),
            _ => self.advance(Duration::ZERO),
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, step: Step) {
        self.pending.push(Pending {
            due: self.now + delay,
            seq: self.seq,
            step,
        });
        self.seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PullmapError;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Action) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&log);
        let make = move |name: &'static str| -> Action {
            let l = Arc::clone(&l);
            Box::new(move || {
                l.lock().unwrap().push(name);
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn delays_grow_strictly_with_index() {
        let interval = Duration::from_millis(250);
        for i in 0..50 {
            assert!(delay_for(i, interval) < delay_for(i + 1, interval));
        }
        assert_eq!(delay_for(0, interval), Duration::from_millis(1));
    }

    #[test]
    fn three_actions_fire_at_one_1001_and_2001_ms() {
        let (log, make) = recorder();
        let mut seq = Sequence::new();
        seq.append(make("A"));
        seq.append(make("B"));
        seq.append(make("C"));

        let mut sched = ManualScheduler::new();
        assert_eq!(seq.play(Duration::from_millis(1000), &mut sched), 3);
        assert!(log.lock().unwrap().is_empty(), "nothing runs inside play");

        let fired = sched.advance(Duration::from_millis(1));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].at, Duration::from_millis(1));

        assert!(sched.advance(Duration::from_millis(999)).is_empty());
        let fired = sched.advance(Duration::from_millis(1));
        assert_eq!(fired[0].at, Duration::from_millis(1001));

        let fired = sched.run_all();
        assert_eq!(fired[0].at, Duration::from_millis(2001));
        assert_eq!(*log.lock().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_sequence_schedules_nothing() {
        let mut sched = ManualScheduler::new();
        assert_eq!(Sequence::new().play(Duration::from_secs(1), &mut sched), 0);
        assert_eq!(sched.pending(), 0);
        assert!(sched.run_all().is_empty());
    }

    #[test]
    fn failing_action_does_not_stop_later_ones() {
        let (log, make) = recorder();
        let mut seq = Sequence::new();
        seq.append(make("before"));
        seq.append_named("broken", || Err(PullmapError::Canvas("gone".into())));
        seq.append(make("after"));

        let mut sched = ManualScheduler::new();
        seq.play(Duration::from_millis(10), &mut sched);
        let fired = sched.run_all();
        assert_eq!(
            fired.iter().map(|f| f.ok).collect::<Vec<_>>(),
            vec![true, false, true]
        );
        assert_eq!(fired[1].label, "broken");
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
    }

    #[test]
    fn labels_keep_append_order() {
        let mut seq = Sequence::new();
        seq.append_named("first", || Ok(()));
        seq.append(|| Ok(()));
        seq.append_named("third", || Ok(()));
        assert_eq!(seq.labels().collect::<Vec<_>>(), vec!["first", "step 1", "third"]);
    }

    #[test]
    fn zero_interval_still_runs_in_append_order() {
        let (log, make) = recorder();
        let mut seq = Sequence::new();
        for name in ["a", "b", "c", "d"] {
            seq.append(make(name));
        }
        let mut sched = ManualScheduler::new();
        seq.play(Duration::ZERO, &mut sched);
        sched.run_all();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_respects_the_stagger() {
        let (log, make) = recorder();
        let mut seq = Sequence::new();
        seq.append(make("A"));
        seq.append(make("B"));
        seq.append(make("C"));

        let start = tokio::time::Instant::now();
        let mut sched = TokioScheduler::new();
        seq.play(Duration::from_millis(1000), &mut sched);
        assert_eq!(sched.pending(), 3);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*log.lock().unwrap(), vec!["A"]);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);

        assert_eq!(sched.finish().await, 3);
        assert_eq!(*log.lock().unwrap(), vec!["A", "B", "C"]);
        assert!(start.elapsed() >= Duration::from_millis(2001));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_isolates_panics() {
        let (log, make) = recorder();
        let mut seq = Sequence::new();
        seq.append_named("boom", || panic!("step blew up"));
        seq.append(make("survivor"));

        let mut sched = TokioScheduler::new();
        seq.play(Duration::from_millis(5), &mut sched);
        assert_eq!(sched.finish().await, 1);
        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }
}
