//! # Pipeline Statistics
//!
//! Lock-free counters the pipeline bumps on every tick, and a sampler that
//! turns them into per-second rates on its own timer.
//!
//! The sampler only reads the counters; it never touches pipeline state, so
//! it can run on a separate task from the tick loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic counters shared between the pipeline and any observers
#[derive(Debug, Default)]
pub struct PipelineCounters {
    samples: AtomicU64,
    commands: AtomicU64,
}

impl PipelineCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sample(&self) {
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commands(&self, count: usize) {
        self.commands.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Controller samples processed since start
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    /// Commands emitted since start
    #[must_use]
    pub fn commands(&self) -> u64 {
        self.commands.load(Ordering::Relaxed)
    }
}

/// Rates over the interval since the previous [`StatsSampler::sample`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineRates {
    pub samples_per_sec: f64,
    pub commands_per_sec: f64,
}

/// Periodic reader of [`PipelineCounters`]
#[derive(Debug)]
pub struct StatsSampler {
    counters: Arc<PipelineCounters>,
    last_at: Instant,
    last_samples: u64,
    last_commands: u64,
}

impl StatsSampler {
    /// Start sampling from the counters' current values
    #[must_use]
    pub fn new(counters: Arc<PipelineCounters>, now: Instant) -> Self {
        let last_samples = counters.samples();
        let last_commands = counters.commands();
        Self {
            counters,
            last_at: now,
            last_samples,
            last_commands,
        }
    }

    /// Compute rates since the previous call and start a new interval
    ///
    /// Returns zero rates when no time has elapsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::time::{Duration, Instant};
    /// use skynet_bridge::controller::stats::{PipelineCounters, StatsSampler};
    ///
    /// let counters = Arc::new(PipelineCounters::new());
    /// let start = Instant::now();
    /// let mut sampler = StatsSampler::new(Arc::clone(&counters), start);
    ///
    /// for _ in 0..60 {
    ///     counters.record_sample();
    /// }
    /// counters.record_commands(30);
    ///
    /// let rates = sampler.sample(start + Duration::from_secs(1));
    /// assert_eq!(rates.samples_per_sec, 60.0);
    /// assert_eq!(rates.commands_per_sec, 30.0);
    /// ```
    pub fn sample(&mut self, now: Instant) -> PipelineRates {
        let samples = self.counters.samples();
        let commands = self.counters.commands();
        let elapsed = now.saturating_duration_since(self.last_at).as_secs_f64();

        let rates = if elapsed > 0.0 {
            PipelineRates {
                samples_per_sec: (samples - self.last_samples) as f64 / elapsed,
                commands_per_sec: (commands - self.last_commands) as f64 / elapsed,
            }
        } else {
            PipelineRates {
                samples_per_sec: 0.0,
                commands_per_sec: 0.0,
            }
        };

        self.last_at = now;
        self.last_samples = samples;
        self.last_commands = commands;
        rates
    }
}
