/// Locally weighted scatterplot smoothing (LOESS).
///
/// For every input x the smoother takes the `span` nearest neighbours,
/// weights them with the tricube kernel scaled to the farthest neighbour,
/// fits a weighted straight line and evaluates it at that x. The curve has
/// one point per input sample, sorted by x; nothing is resampled or
/// extrapolated.
///
/// After the first pass, `robustness_iterations` bisquare passes downweight
/// samples with large residuals (Cleveland 1979). Three passes are the
/// default, matching common statistics packages.
///
/// # Degenerate input
///
/// | samples | result                                   |
/// |---------|------------------------------------------|
/// | 0       | empty curve, `CurveFit::Empty`           |
/// | 1       | the raw point, `CurveFit::Passthrough`   |
/// | >= 2    | smoothed, `CurveFit::Loess`              |
///
/// The neighbourhood never shrinks below two points so the local regression
/// always has something to fit. A neighbourhood whose x-values are all tied
/// falls back to the weighted mean.

use serde::Serialize;
use thiserror::Error;

/// Fewest samples that are actually smoothed.
pub const MIN_POINTS: usize = 2;

pub const DEFAULT_ROBUSTNESS_ITERATIONS: usize = 3;

/// Bisquare tuning constant applied to the residual scale.
const BISQUARE_C: f64 = 6.0;

/// Relative size below which a residual scale counts as zero.
const SCALE_THRESHOLD: f64 = 1e-7;

// ---------------------------------------------------------------------------
// Errors and output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SmoothingError {
    #[error("smoothing fraction must be in (0, 1], got {0}")]
    InvalidFraction(f64),

    #[error("x and y must have the same length (x: {x_len}, y: {y_len})")]
    MismatchedLengths { x_len: usize, y_len: usize },

    #[error("non-finite {axis} value at index {index}")]
    NonFiniteValue { axis: &'static str, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

/// How a curve was produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveFit {
    Loess {
        fraction: f64,
        span: usize,
        /// Robustness passes that actually ran (may stop early).
        iterations: usize,
    },
    /// Too few samples to smooth; points are returned unchanged.
    Passthrough,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothedCurve {
    pub points: Vec<CurvePoint>,
    pub fit: CurveFit,
}

impl SmoothedCurve {
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            fit: CurveFit::Empty,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the curve was not actually smoothed.
    pub fn is_degenerate(&self) -> bool {
        !matches!(self.fit, CurveFit::Loess { .. })
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

// ---------------------------------------------------------------------------
// Smoother
// ---------------------------------------------------------------------------

/// Configured LOESS smoother.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loess {
    fraction: f64,
    robustness_iterations: usize,
}

impl Loess {
    /// Rejects fractions outside (0, 1] (including NaN).
    pub fn new(fraction: f64) -> Result<Self, SmoothingError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(SmoothingError::InvalidFraction(fraction));
        }
        Ok(Self {
            fraction,
            robustness_iterations: DEFAULT_ROBUSTNESS_ITERATIONS,
        })
    }

    pub fn with_robustness_iterations(mut self, iterations: usize) -> Self {
        self.robustness_iterations = iterations;
        self
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn robustness_iterations(&self) -> usize {
        self.robustness_iterations
    }

    /// Neighbourhood size for `n` samples: `round(fraction * n)` clamped to
    /// `[MIN_POINTS, n]`.
    pub fn span(&self, n: usize) -> usize {
        let raw = (self.fraction * n as f64).round() as usize;
        raw.clamp(MIN_POINTS, n.max(MIN_POINTS))
    }

    /// Smooths paired samples. Input order does not matter.
    pub fn smooth(&self, xs: &[f64], ys: &[f64]) -> Result<SmoothedCurve, SmoothingError> {
        validate_samples(xs, ys)?;

        let mut pairs: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        if n == 0 {
            return Ok(SmoothedCurve::empty());
        }
        if n < MIN_POINTS {
            return Ok(SmoothedCurve {
                points: pairs.into_iter().map(|(x, y)| CurvePoint { x, y }).collect(),
                fit: CurveFit::Passthrough,
            });
        }

        let (x, y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let span = self.span(n);

        let mut robustness = vec![1.0; n];
        let mut fitted = fit_pass(&x, &y, span, &robustness);
        let mut iterations = 0;

        for _ in 0..self.robustness_iterations {
            let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();
            if !update_robustness_weights(&residuals, &y, &mut robustness) {
                break;
            }
            fitted = fit_pass(&x, &y, span, &robustness);
            iterations += 1;
        }

        let points = x
            .into_iter()
            .zip(fitted)
            .map(|(x, y)| CurvePoint { x, y })
            .collect();

        Ok(SmoothedCurve {
            points,
            fit: CurveFit::Loess {
                fraction: self.fraction,
                span,
                iterations,
            },
        })
    }
}

/// One-shot smoothing with default robustness iterations.
pub fn smooth(xs: &[f64], ys: &[f64], fraction: f64) -> Result<SmoothedCurve, SmoothingError> {
    Loess::new(fraction)?.smooth(xs, ys)
}

fn validate_samples(xs: &[f64], ys: &[f64]) -> Result<(), SmoothingError> {
    if xs.len() != ys.len() {
        return Err(SmoothingError::MismatchedLengths {
            x_len: xs.len(),
            y_len: ys.len(),
        });
    }
    if let Some(index) = xs.iter().position(|v| !v.is_finite()) {
        return Err(SmoothingError::NonFiniteValue { axis: "x", index });
    }
    if let Some(index) = ys.iter().position(|v| !v.is_finite()) {
        return Err(SmoothingError::NonFiniteValue { axis: "y", index });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Neighbourhood window
// ---------------------------------------------------------------------------

/// Inclusive index bounds of the current neighbourhood in sorted x.
#[derive(Debug, Clone, Copy)]
struct Window {
    left: usize,
    right: usize,
}

impl Window {
    fn initialize(span: usize, n: usize) -> Self {
        Self {
            left: 0,
            right: span.min(n) - 1,
        }
    }

    /// Slides the window so it holds the nearest neighbours of `x[current]`.
    /// Callers visit points in increasing order, so the window only moves right.
    fn recenter(&mut self, x: &[f64], current: usize) {
        let n = x.len();
        let x_current = x[current];

        while self.right < n - 1 {
            let d_left = x_current - x[self.left];
            let d_right = x[self.right + 1] - x_current;
            if d_left <= d_right {
                break;
            }
            self.left += 1;
            self.right += 1;
        }
    }

    fn max_distance(&self, x: &[f64], x_current: f64) -> f64 {
        f64::max(x_current - x[self.left], x[self.right] - x_current)
    }
}

// ---------------------------------------------------------------------------
// Local regression
// ---------------------------------------------------------------------------

fn fit_pass(x: &[f64], y: &[f64], span: usize, robustness: &[f64]) -> Vec<f64> {
    let mut window = Window::initialize(span, x.len());

    (0..x.len())
        .map(|i| {
            window.recenter(x, i);
            fit_point(x, y, i, window, robustness)
        })
        .collect()
}

/// Tricube weight with Cleveland's near/far cut-offs.
fn tricube(distance: f64, radius: f64) -> f64 {
    if radius <= 0.0 || distance <= 0.001 * radius {
        return 1.0;
    }
    if distance >= 0.999 * radius {
        return 0.0;
    }
    let u = distance / radius;
    let t = 1.0 - u * u * u;
    t * t * t
}

fn fit_point(x: &[f64], y: &[f64], i: usize, window: Window, robustness: &[f64]) -> f64 {
    let x_i = x[i];
    let radius = window.max_distance(x, x_i);
    let range = window.left..=window.right;

    let weights: Vec<f64> = range
        .clone()
        .map(|j| tricube((x[j] - x_i).abs(), radius) * robustness[j])
        .collect();

    let sum_w: f64 = weights.iter().sum();
    if sum_w <= 0.0 {
        // Every neighbour rejected: keep the observed value
        return y[i];
    }

    let xs = &x[range.clone()];
    let ys = &y[range];

    let x_mean = weights.iter().zip(xs).map(|(w, xj)| w * xj).sum::<f64>() / sum_w;
    let y_mean = weights.iter().zip(ys).map(|(w, yj)| w * yj).sum::<f64>() / sum_w;

    let sxx: f64 = weights
        .iter()
        .zip(xs)
        .map(|(w, xj)| w * (xj - x_mean) * (xj - x_mean))
        .sum();

    // Too little spread in x for a slope: use the weighted mean.
    let x_range = xs[xs.len() - 1] - xs[0];
    if (sxx / sum_w).sqrt() <= 0.001 * x_range || x_range <= 0.0 {
        return y_mean;
    }

    let sxy: f64 = weights
        .iter()
        .zip(xs.iter().zip(ys))
        .map(|(w, (xj, yj))| w * (xj - x_mean) * (yj - y_mean))
        .sum();

    y_mean + (sxy / sxx) * (x_i - x_mean)
}

// ---------------------------------------------------------------------------
// Robustness
// ---------------------------------------------------------------------------

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Recomputes bisquare robustness weights from residuals.
///
/// The scale is the median absolute residual, or the mean absolute residual
/// when the median collapses (more than half the residuals exactly zero).
/// Returns false when every residual is negligible relative to the data, in
/// which case the current fit is final.
fn update_robustness_weights(residuals: &[f64], y: &[f64], weights: &mut [f64]) -> bool {
    let n = residuals.len() as f64;
    let mean_abs_residual = residuals.iter().map(|r| r.abs()).sum::<f64>() / n;
    let mean_abs_y = y.iter().map(|v| v.abs()).sum::<f64>() / n;
    if mean_abs_residual <= 0.0 || mean_abs_residual < SCALE_THRESHOLD * mean_abs_y {
        return false;
    }

    let mut abs_residuals: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
    let mut scale = median(&mut abs_residuals);
    if scale <= SCALE_THRESHOLD * mean_abs_residual {
        scale = mean_abs_residual;
    }
    let cmad = BISQUARE_C * scale;

    let c1 = 0.001 * cmad;
    let c9 = 0.999 * cmad;

    for (w, r) in weights.iter_mut().zip(residuals) {
        let r = r.abs();
        *w = if r <= c1 {
            1.0
        } else if r <= c9 {
            let u = r / cmad;
            let t = 1.0 - u * u;
            t * t
        } else {
            0.0
        };
    }

    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
