//! Fixed-step run driver.

use crate::error::{SimError, SimResult};
use crate::scheme::{Stage, TimeScheme};
use crate::system::{IntegrationSystem, StepTime};

/// Options for simulation runs.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Nominal time step (seconds)
    pub dt: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Report every N-th step (decimation)
    pub record_every: usize,
    /// Cap dt by the system's stable step at this Courant number
    pub max_courant: Option<f64>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1e-6,
            t_end: 1e-4,
            max_steps: 100_000,
            record_every: 10,
            max_courant: None,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !self.t_end.is_finite() || self.t_end < 0.0 {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        if let Some(c) = self.max_courant
            && (!c.is_finite() || c <= 0.0)
        {
            return Err(SimError::InvalidArg {
                what: "max_courant must be positive",
            });
        }
        Ok(())
    }
}

/// Position of the run when a record is taken.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimProgress {
    pub step: usize,
    /// Time reached (seconds)
    pub t: f64,
    /// Size of the last step, zero before the first
    pub dt: f64,
}

/// Outcome of a completed run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimSummary {
    pub steps: usize,
    pub t_final: f64,
    pub dt_min: f64,
    pub dt_max: f64,
}

/// Run `system` from t = 0 to `opts.t_end`.
pub fn run_sim<S: IntegrationSystem>(
    system: &mut S,
    scheme: &TimeScheme,
    opts: &SimOptions,
) -> SimResult<SimSummary> {
    run_sim_with_progress(system, scheme, opts, |_, _| {})
}

/// Run `system`, calling `on_record` for the initial state, every
/// `record_every` steps and the final state.
///
/// Stage storage is allocated once and released when the run ends, whether
/// it succeeds or not.
pub fn run_sim_with_progress<S, F>(
    system: &mut S,
    scheme: &TimeScheme,
    opts: &SimOptions,
    mut on_record: F,
) -> SimResult<SimSummary>
where
    S: IntegrationSystem,
    F: FnMut(&SimProgress, &S),
{
    opts.validate()?;
    scheme.validate()?;

    let stages = scheme.stages();
    let (store_fields, store_deltas) = scheme.store_flags();
    system.set_ode_fields(stages.len(), &store_fields, &store_deltas)?;

    tracing::info!(
        scheme = scheme.name(),
        dt = opts.dt,
        t_end = opts.t_end,
        "starting run"
    );
    let result = march(system, &stages, opts, &mut on_record);
    system.clear_ode_fields();

    match &result {
        Ok(summary) => tracing::info!(
            steps = summary.steps,
            t_final = summary.t_final,
            dt_min = summary.dt_min,
            dt_max = summary.dt_max,
            "run finished"
        ),
        Err(e) => tracing::error!(error = %e, "run failed"),
    }
    result
}

fn march<S, F>(
    system: &mut S,
    stages: &[Stage],
    opts: &SimOptions,
    on_record: &mut F,
) -> SimResult<SimSummary>
where
    S: IntegrationSystem,
    F: FnMut(&SimProgress, &S),
{
    // Relative slack so t_end is not missed by round-off
    let t_stop = opts.t_end * (1.0 - 1e-12);
    let mut t = 0.0;
    let mut step = 0;
    let mut dt_min = f64::INFINITY;
    let mut dt_max = 0.0_f64;
    let mut last_dt = 0.0;

    on_record(&SimProgress { step, t, dt: 0.0 }, system);

    while t < t_stop && step < opts.max_steps {
        let mut dt = opts.dt.min(opts.t_end - t);
        if let Some(courant) = opts.max_courant
            && let Some(stable) = system.stable_dt(courant)
        {
            dt = dt.min(stable);
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::NonPhysical {
                what: "time step collapsed to zero",
            });
        }

        let time = StepTime { t: t + dt, dt };
        for (i, stage) in stages.iter().enumerate() {
            system.update()?;
            system.solve(&time, i, &stage.a, &stage.b)?;
        }
        t += dt;
        step += 1;
        last_dt = dt;
        dt_min = dt_min.min(dt);
        dt_max = dt_max.max(dt);

        if step % opts.record_every == 0 {
            on_record(&SimProgress { step, t, dt }, system);
        }
    }

    // Always report the final state
    if step % opts.record_every != 0 {
        on_record(
            &SimProgress {
                step,
                t,
                dt: last_dt,
            },
            system,
        );
    }

    if step == 0 {
        dt_min = 0.0;
    }
    Ok(SimSummary {
        steps: step,
        t_final: t,
        dt_min,
        dt_max,
    })
}
