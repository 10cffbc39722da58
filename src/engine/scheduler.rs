//! Lookahead step scheduling on the audio clock.
//!
//! The control thread polls coarsely (every ~25 ms) and jittery. Rather than
//! firing sounds from the poll, each poll commits every step that falls
//! inside the next `lookahead` seconds, stamped with its exact audio-clock
//! time; the render path then starts each voice on its frame.
//!
//! ```text
//!   poll         poll         poll
//!    │ lookahead  │            │
//!    ├───────────┐├───────────┐├───────────┐
//!    │ s0    s1  ││   s2    s3 ││  s4     s5│   steps committed ahead,
//!    ▼     ▼     ▼▼     ▼     ▼▼    ▼      ▼    rendered exactly on time
//! ```
//!
//! Step times are never accumulated. They are `anchor + n * step_duration`,
//! so sixteen steps at 120 bpm span exactly 2 seconds no matter how many
//! polls it took. A tempo change re-anchors at the next uncommitted step.

use tracing::warn;

/// Steps in one pattern cycle.
pub const STEPS_PER_CYCLE: usize = 16;

/// Seconds per 16th note at `bpm`.
pub fn step_duration(bpm: f64) -> f64 {
    60.0 / bpm / 4.0
}

/// What happens after a cycle completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleFlow {
    Continue,
    /// Keep going at a new tempo from the boundary on
    Retempo(f64),
    Halt,
}

/// Receives committed steps.
pub trait StepSource {
    /// Schedule everything for `step` at audio time `at`.
    fn on_step(&mut self, step: usize, at: f64);

    /// Called after step 15, with the time the next cycle would start.
    fn on_cycle_end(&mut self, _next_cycle: f64) -> CycleFlow {
        CycleFlow::Continue
    }
}

/// A poll arrived after steps were already due.
///
/// The overdue steps were still committed at their nominal times; the render
/// path plays them as soon as it can.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulingOverrun {
    /// How far behind the oldest overdue step was, in seconds
    pub late_by: f64,
    pub steps: usize,
}

/// What one poll did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub steps: usize,
    pub cycles: usize,
    pub overrun: Option<SchedulingOverrun>,
    pub halted: bool,
}

impl TickReport {
    pub fn merge(&mut self, other: TickReport) {
        self.steps += other.steps;
        self.cycles += other.cycles;
        self.halted |= other.halted;
        self.overrun = match (self.overrun, other.overrun) {
            (Some(a), Some(b)) => Some(SchedulingOverrun {
                late_by: a.late_by.max(b.late_by),
                steps: a.steps + b.steps,
            }),
            (a, b) => a.or(b),
        };
    }
}

#[derive(Debug, Clone)]
pub struct LookaheadScheduler {
    lookahead: f64,
    bpm: f64,
    anchor: f64,
    /// Steps committed since `anchor`
    since_anchor: u64,
    current_step: usize,
    running: bool,
}

impl LookaheadScheduler {
    pub fn new(lookahead: f64) -> Self {
        Self {
            lookahead,
            bpm: 120.0,
            anchor: 0.0,
            since_anchor: 0,
            current_step: 0,
            running: false,
        }
    }

    /// Begin at step 0, with the first step at `at`.
    pub fn start(&mut self, bpm: f64, at: f64) {
        self.bpm = bpm;
        self.anchor = at;
        self.since_anchor = 0;
        self.current_step = 0;
        self.running = true;
    }

    /// Stop committing steps and rewind to step 0.
    ///
    /// Steps already committed are the owner's to cancel.
    pub fn stop(&mut self) {
        self.running = false;
        self.current_step = 0;
        self.since_anchor = 0;
    }

    /// Change tempo from the next uncommitted step on.
    pub fn set_bpm(&mut self, bpm: f64) {
        if self.running {
            self.anchor = self.next_step_time();
            self.since_anchor = 0;
        }
        self.bpm = bpm;
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The step the next commit will be for.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn next_step_time(&self) -> f64 {
        self.anchor + self.since_anchor as f64 * step_duration(self.bpm)
    }

    /// Commit every step due before `now + lookahead`.
    pub fn tick<S: StepSource + ?Sized>(&mut self, now: f64, source: &mut S) -> TickReport {
        let mut report = TickReport::default();
        let horizon = now + self.lookahead;

        while self.running {
            let at = self.next_step_time();
            if at >= horizon {
                break;
            }

            if at < now {
                let overrun = report.overrun.get_or_insert(SchedulingOverrun {
                    late_by: now - at,
                    steps: 0,
                });
                overrun.steps += 1;
            }

            source.on_step(self.current_step, at);
            report.steps += 1;

            self.current_step = (self.current_step + 1) % STEPS_PER_CYCLE;
            self.since_anchor += 1;

            if self.current_step == 0 {
                report.cycles += 1;
                match source.on_cycle_end(self.next_step_time()) {
                    CycleFlow::Continue => {}
                    CycleFlow::Retempo(bpm) => self.set_bpm(bpm),
                    CycleFlow::Halt => {
                        self.stop();
                        report.halted = true;
                    }
                }
            }
        }

        if let Some(overrun) = report.overrun {
            warn!(
                late_by = overrun.late_by,
                steps = overrun.steps,
                "scheduling overrun"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Record {
        steps: Vec<(usize, f64)>,
        cycles_left: Option<usize>,
        retempo: Option<f64>,
    }

    impl StepSource for Record {
        fn on_step(&mut self, step: usize, at: f64) {
            self.steps.push((step, at));
        }

        fn on_cycle_end(&mut self, _next_cycle: f64) -> CycleFlow {
            if let Some(bpm) = self.retempo.take() {
                return CycleFlow::Retempo(bpm);
            }
            match self.cycles_left.as_mut() {
                Some(0) | Some(1) => CycleFlow::Halt,
                Some(n) => {
                    *n -= 1;
                    CycleFlow::Continue
                }
                None => CycleFlow::Continue,
            }
        }
    }

    /// Poll every 25 ms from 0 to `until`.
    fn run(scheduler: &mut LookaheadScheduler, source: &mut Record, until: f64) -> TickReport {
        let mut total = TickReport::default();
        let mut now = 0.0;
        while now <= until {
            total.merge(scheduler.tick(now, source));
            now += 0.025;
        }
        total
    }

    #[test]
    fn one_bar_at_120_is_two_seconds() {
        assert_eq!(step_duration(120.0), 0.125);

        let mut scheduler = LookaheadScheduler::new(0.1);
        let mut source = Record::default();
        scheduler.start(120.0, 0.0);
        run(&mut scheduler, &mut source, 2.5);

        let (step, at) = source.steps[16];
        assert_eq!(step, 0);
        assert_eq!(at, 2.0);
        let (step, at) = source.steps[15];
        assert_eq!(step, 15);
        assert_eq!(at, 1.875);
    }

    #[test]
    fn no_drift_over_many_bars() {
        let mut scheduler = LookaheadScheduler::new(0.1);
        let mut source = Record::default();
        scheduler.start(137.0, 0.5);
        run(&mut scheduler, &mut source, 60.0);

        let duration = step_duration(137.0);
        for (n, &(step, at)) in source.steps.iter().enumerate() {
            assert_eq!(step, n % STEPS_PER_CYCLE);
            assert_eq!(at, 0.5 + n as f64 * duration);
        }
    }

    #[test]
    fn commits_only_inside_the_lookahead() {
        let mut scheduler = LookaheadScheduler::new(0.1);
        let mut source = Record::default();
        scheduler.start(120.0, 0.0);

        let report = scheduler.tick(0.0, &mut source);
        assert_eq!(report.steps, 1);
        let report = scheduler.tick(0.05, &mut source);
        assert_eq!(report.steps, 1, "step at 0.125 is inside 0.05 + 0.1");
        assert!(report.overrun.is_none());
    }

    #[test]
    fn late_poll_commits_overdue_steps() {
        let mut scheduler = LookaheadScheduler::new(0.1);
        let mut source = Record::default();
        scheduler.start(120.0, 0.0);

        let report = scheduler.tick(0.5, &mut source);
        assert_eq!(report.steps, 5);
        let overrun = report.overrun.unwrap();
        assert_eq!(overrun.steps, 4);
        assert_eq!(overrun.late_by, 0.5);
        // Still stamped with their nominal times
        assert_eq!(source.steps[2], (2, 0.25));
    }

    #[test]
    fn stop_rewinds_to_step_zero() {
        let mut scheduler = LookaheadScheduler::new(0.1);
        let mut source = Record::default();
        scheduler.start(120.0, 0.0);
        run(&mut scheduler, &mut source, 0.3);
        assert_ne!(scheduler.current_step(), 0);

        scheduler.stop();
        assert_eq!(scheduler.current_step(), 0);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.tick(1.0, &mut source).steps, 0);
    }

    #[test]
    fn tempo_change_waits_for_the_next_boundary() {
        let mut scheduler = LookaheadScheduler::new(0.1);
        let mut source = Record::default();
        scheduler.start(120.0, 0.0);
        scheduler.tick(0.0, &mut source);
        scheduler.tick(0.05, &mut source);
        // Steps at 0.0 and 0.125 are committed; 0.25 is next
        scheduler.set_bpm(60.0);
        run(&mut scheduler, &mut source, 1.0);

        let times: Vec<f64> = source.steps.iter().map(|&(_, at)| at).collect();
        assert_eq!(&times[..4], &[0.0, 0.125, 0.25, 0.5]);
    }

    #[test]
    fn halt_stops_after_the_cycle() {
        let mut scheduler = LookaheadScheduler::new(0.1);
        let mut source = Record {
            cycles_left: Some(2),
            ..Record::default()
        };
        scheduler.start(300.0, 0.0);
        let report = run(&mut scheduler, &mut source, 5.0);

        assert_eq!(source.steps.len(), 32);
        assert_eq!(report.cycles, 2);
        assert!(report.halted);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn retempo_applies_from_the_cycle_boundary() {
        let mut scheduler = LookaheadScheduler::new(0.1);
        let mut source = Record {
            retempo: Some(60.0),
            ..Record::default()
        };
        scheduler.start(120.0, 0.0);
        run(&mut scheduler, &mut source, 3.0);

        assert_eq!(source.steps[16].1, 2.0);
        assert_eq!(source.steps[17].1, 2.25);
    }
}
