//! `/work` handler of the companion backend service.
//!
//! Each request is one business job. A configurable share of jobs fails with
//! `500 Critical Business Failure`; the rest count towards
//! `processed_jobs_total`.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::observability::JobMetrics;

pub const JOB_COMPLETED: &str = "Business Job Completed Successfully";
pub const JOB_FAILED: &str = "Critical Business Failure";

/// State shared by `/work` requests.
pub struct WorkState {
    jobs: JobMetrics,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl WorkState {
    /// Fail `failure_rate` of jobs, chosen at random.
    pub fn new(failure_rate: f64, jobs: JobMetrics) -> anyhow::Result<Self> {
        Self::with_rng(failure_rate, jobs, StdRng::from_entropy())
    }

    /// Deterministic job outcomes for a given seed.
    pub fn with_seed(failure_rate: f64, jobs: JobMetrics, seed: u64) -> anyhow::Result<Self> {
        Self::with_rng(failure_rate, jobs, StdRng::seed_from_u64(seed))
    }

    fn with_rng(failure_rate: f64, jobs: JobMetrics, rng: StdRng) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&failure_rate),
            "failure rate {failure_rate} is not between 0 and 1"
        );
        Ok(Self {
            jobs,
            failure_rate,
            rng: Mutex::new(rng),
        })
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    /// Decide the outcome of one job; `true` when it succeeds.
    pub fn run_job(&self) -> bool {
        let failed = match self.rng.lock() {
            Ok(mut rng) => rng.gen_bool(self.failure_rate),
            Err(poisoned) => poisoned.into_inner().gen_bool(self.failure_rate),
        };
        if !failed {
            self.jobs.record_processed();
        }
        !failed
    }
}

/// Handle `GET /work`.
pub async fn work(State(state): State<Arc<WorkState>>) -> (StatusCode, &'static str) {
    if state.run_job() {
        (StatusCode::OK, JOB_COMPLETED)
    } else {
        tracing::warn!("business job failed");
        (StatusCode::INTERNAL_SERVER_ERROR, JOB_FAILED)
    }
}
