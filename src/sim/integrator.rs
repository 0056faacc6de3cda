use nalgebra::Vector2;
use tracing::debug;

use crate::error::SimError;

// ---------------------------------------------------------------------------
// ODE system seam
// ---------------------------------------------------------------------------

/// Two coupled first-order equations `dy/dt = f(t, y)`.
pub trait OdeSystem {
    fn rhs(&self, t: f64, y: &Vector2<f64>) -> Result<Vector2<f64>, SimError>;

    /// Optional terminal event. Integration stops where this goes from
    /// non-negative to negative.
    fn event(&self, _t: f64, _y: &Vector2<f64>) -> Option<f64> {
        None
    }
}

// ---------------------------------------------------------------------------
// Tolerances and statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
}

impl Tolerances {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol, ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.rtol > 0.0 && self.rtol.is_finite() && self.atol > 0.0 && self.atol.is_finite()) {
            return Err(SimError::invalid(format!(
                "tolerances must be positive, got rtol={} atol={}",
                self.rtol, self.atol
            )));
        }
        if self.max_steps == 0 {
            return Err(SimError::invalid("max_steps must be > 0"));
        }
        Ok(())
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { rtol: 1e-9, atol: 1e-6, max_steps: 1_000_000 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

/// Uniform samples of the solution, plus the terminal event if one fired.
/// When an event fires, the last sample is the event point.
#[derive(Debug, Clone)]
pub struct Solution {
    pub samples: Vec<(f64, Vector2<f64>)>,
    pub event: Option<(f64, Vector2<f64>)>,
    pub stats: Stats,
}

// ---------------------------------------------------------------------------
// Dormand-Prince 5(4) tableau
// ---------------------------------------------------------------------------

const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const A: [[f64; 6]; 7] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
    [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
];

// 5th-order weights (same as the last row of A)
const B: [f64; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];

// 5th minus embedded 4th order
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;
const EVENT_TIME_TOL: f64 = 1e-9; // s
const MAX_BISECTIONS: usize = 200;

// ---------------------------------------------------------------------------
// Adaptive integrator
// ---------------------------------------------------------------------------

/// Adaptive-step Dormand-Prince 5(4) integrator. Step sizes depend only on the
/// inputs, so repeated runs are bit-identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integrator {
    pub tolerances: Tolerances,
}

impl Integrator {
    pub fn new(tolerances: Tolerances) -> Self {
        Self { tolerances }
    }

    /// Integrate `sys` from `(t0, y0)` to `t1`, returning the state at `samples`
    /// uniformly spaced times (both ends included).
    pub fn integrate<S: OdeSystem>(
        &self,
        sys: &S,
        t0: f64,
        y0: Vector2<f64>,
        t1: f64,
        samples: usize,
    ) -> Result<Solution, SimError> {
        self.tolerances.validate()?;
        if samples < 2 {
            return Err(SimError::invalid(format!("need at least 2 samples, got {samples}")));
        }
        if !(t1 > t0) {
            return Err(SimError::invalid(format!("empty time interval [{t0}, {t1}]")));
        }

        let span = t1 - t0;
        let grid: Vec<f64> = (0..samples)
            .map(|k| {
                if k + 1 == samples {
                    t1
                } else {
                    t0 + span * k as f64 / (samples - 1) as f64
                }
            })
            .collect();

        let mut stats = Stats::default();
        let mut out = Vec::with_capacity(samples);
        out.push((t0, y0));

        let mut t = t0;
        let mut y = y0;
        let mut h = self.initial_step(sys, t0, &y0, span, &mut stats)?;
        let mut next = 1;

        while next < grid.len() {
            if stats.accepted + stats.rejected >= self.tolerances.max_steps {
                return Err(SimError::IntegrationFailure {
                    time: t,
                    reason: format!("exceeded {} steps", self.tolerances.max_steps),
                });
            }

            let target = grid[next];
            let clipped = h >= target - t;
            let h_try = if clipped { target - t } else { h };

            let (y_new, err) = self.step(sys, t, &y, h_try, &mut stats)?;
            let e = self.error_norm(&err, &y, &y_new);

            if e <= 1.0 {
                stats.accepted += 1;
                let t_new = if clipped { target } else { t + h_try };

                let event = self.locate_event(sys, t, &y, h_try, t_new, &y_new, &mut stats)?;
                if let Some(hit) = event {
                    out.push(hit);
                    debug!(?stats, t_event = hit.0, "terminal event");
                    return Ok(Solution { samples: out, event: Some(hit), stats });
                }

                t = t_new;
                y = y_new;
                if clipped {
                    out.push((t, y));
                    next += 1;
                }

                let proposal = h_try * growth(e);
                h = if clipped { proposal.max(h) } else { proposal };
            } else {
                stats.rejected += 1;
                h = h_try * growth(e).min(1.0);
            }

            if h <= 16.0 * f64::EPSILON * t.abs().max(1.0) {
                return Err(SimError::IntegrationFailure {
                    time: t,
                    reason: format!("step size underflow (h = {h:e})"),
                });
            }
        }

        debug!(?stats, t0, t1, "integration complete");
        Ok(Solution { samples: out, event: None, stats })
    }

    /// One Dormand-Prince step. Returns the 5th-order solution and the local error estimate.
    fn step<S: OdeSystem>(
        &self,
        sys: &S,
        t: f64,
        y: &Vector2<f64>,
        h: f64,
        stats: &mut Stats,
    ) -> Result<(Vector2<f64>, Vector2<f64>), SimError> {
        let mut k = [Vector2::zeros(); 7];
        for i in 0..7 {
            let mut yi = *y;
            for (j, kj) in k.iter().enumerate().take(i) {
                yi += kj * (h * A[i][j]);
            }
            k[i] = sys.rhs(t + C[i] * h, &yi)?;
            stats.evaluations += 1;
        }

        let mut y_new = *y;
        let mut err = Vector2::zeros();
        for i in 0..7 {
            y_new += k[i] * (h * B[i]);
            err += k[i] * (h * E[i]);
        }
        Ok((y_new, err))
    }

    fn error_norm(&self, err: &Vector2<f64>, y: &Vector2<f64>, y_new: &Vector2<f64>) -> f64 {
        let tol = self.tolerances;
        let sum: f64 = (0..2)
            .map(|i| {
                let scale = tol.atol + tol.rtol * y[i].abs().max(y_new[i].abs());
                (err[i] / scale).powi(2)
            })
            .sum();
        (sum / 2.0).sqrt()
    }

    fn initial_step<S: OdeSystem>(
        &self,
        sys: &S,
        t0: f64,
        y0: &Vector2<f64>,
        span: f64,
        stats: &mut Stats,
    ) -> Result<f64, SimError> {
        let f0 = sys.rhs(t0, y0)?;
        stats.evaluations += 1;
        let tol = self.tolerances;
        let scaled = |v: &Vector2<f64>| {
            let s: f64 = (0..2)
                .map(|i| (v[i] / (tol.atol + tol.rtol * y0[i].abs())).powi(2))
                .sum();
            (s / 2.0).sqrt()
        };
        let d0 = scaled(y0);
        let d1 = scaled(&f0);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
        Ok(h0.min(span))
    }

    /// Bisect the step length for the surface crossing, if the step crossed one.
    #[allow(clippy::too_many_arguments)]
    fn locate_event<S: OdeSystem>(
        &self,
        sys: &S,
        t: f64,
        y: &Vector2<f64>,
        h: f64,
        t_new: f64,
        y_new: &Vector2<f64>,
        stats: &mut Stats,
    ) -> Result<Option<(f64, Vector2<f64>)>, SimError> {
        let (Some(g_prev), Some(g_new)) = (sys.event(t, y), sys.event(t_new, y_new)) else {
            return Ok(None);
        };
        if !(g_prev >= 0.0 && g_new < 0.0) {
            return Ok(None);
        }

        let mut lo = 0.0;
        let mut hi = h;
        let mut y_hi = *y_new;
        for _ in 0..MAX_BISECTIONS {
            if hi - lo <= EVENT_TIME_TOL {
                break;
            }
            let mid = 0.5 * (lo + hi);
            let (y_mid, _) = self.step(sys, t, y, mid, stats)?;
            match sys.event(t + mid, &y_mid) {
                Some(g) if g >= 0.0 => lo = mid,
                _ => {
                    hi = mid;
                    y_hi = y_mid;
                }
            }
        }
        let t_hit = if hi == h { t_new } else { t + hi };
        Ok(Some((t_hit, y_hi)))
    }
}

fn growth(e: f64) -> f64 {
    if e == 0.0 {
        MAX_FACTOR
    } else {
        (SAFETY * e.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
