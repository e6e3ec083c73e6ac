//! Derivative-free minimisation used for model parameter estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed, summed over restarts.
    pub iterations: usize,
    /// Whether the final run converged.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations per run.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of objective values.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step size.
    pub initial_step: f64,
    /// Extra runs started from the previous optimum with a fresh simplex.
    pub restarts: usize,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
            restarts: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Vertex {
    point: Vec<f64>,
    value: f64,
}

fn by_value(a: &Vertex, b: &Vertex) -> Ordering {
    a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal)
}

/// Minimise `objective` with the Nelder-Mead simplex method.
///
/// Points are clamped to `bounds` (one `(min, max)` pair per coordinate)
/// before every evaluation. Non-finite objective values are treated as
/// `f64::MAX`, so an objective can reject infeasible points by returning
/// `f64::INFINITY`.
///
/// # Example
/// ```
/// use fpi_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let eval = |point: &[f64]| {
        let v = objective(point);
        if v.is_finite() {
            v
        } else {
            f64::MAX
        }
    };

    let mut start = clamp(initial, bounds);
    let mut total_iterations = 0;
    let mut best = Vertex {
        value: eval(&start),
        point: start.clone(),
    };
    let mut converged = false;

    for _ in 0..=config.restarts {
        let (vertex, iterations, run_converged) = run_simplex(&eval, &start, bounds, &config);
        total_iterations += iterations;
        converged = run_converged;
        let improved = vertex.value < best.value;
        if vertex.value <= best.value {
            best = vertex;
        }
        if !improved && total_iterations > iterations {
            break;
        }
        start = best.point.clone();
    }

    NelderMeadResult {
        optimal_point: best.point,
        optimal_value: best.value,
        iterations: total_iterations,
        converged,
    }
}

fn run_simplex<F>(
    eval: &F,
    start: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> (Vertex, usize, bool)
where
    F: Fn(&[f64]) -> f64,
{
    let n = start.len();
    let mut simplex: Vec<Vertex> = Vec::with_capacity(n + 1);
    simplex.push(Vertex {
        point: start.to_vec(),
        value: eval(start),
    });
    for i in 0..n {
        let mut point = start.to_vec();
        let step = if start[i].abs() > 1e-10 {
            config.initial_step * start[i].abs()
        } else {
            config.initial_step
        };
        point[i] += step;
        let point = clamp(&point, bounds);
        simplex.push(Vertex {
            value: eval(&point),
            point,
        });
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(by_value);

        let spread = simplex[n].value - simplex[0].value;
        if spread < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_without_worst(&simplex);
        let diameter = simplex
            .iter()
            .map(|v| distance(&v.point, &centroid))
            .fold(0.0, f64::max);
        if diameter < config.tolerance {
            converged = true;
            break;
        }

        let worst = simplex[n].point.clone();
        let reflected = clamp(&towards(&centroid, &worst, -config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < simplex[0].value {
            let expanded = clamp(&towards(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                Vertex {
                    point: expanded,
                    value: expanded_value,
                }
            } else {
                Vertex {
                    point: reflected,
                    value: reflected_value,
                }
            };
            continue;
        }

        if reflected_value < simplex[n - 1].value {
            simplex[n] = Vertex {
                point: reflected,
                value: reflected_value,
            };
            continue;
        }

        let outside = reflected_value < simplex[n].value;
        let target = if outside { &reflected } else { &worst };
        let contracted = clamp(&towards(&centroid, target, config.rho), bounds);
        let contracted_value = eval(&contracted);
        let accept = if outside {
            contracted_value <= reflected_value
        } else {
            contracted_value < simplex[n].value
        };
        if accept {
            simplex[n] = Vertex {
                point: contracted,
                value: contracted_value,
            };
            continue;
        }

        let best = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk: Vec<f64> = best
                .iter()
                .zip(vertex.point.iter())
                .map(|(b, p)| b + config.sigma * (p - b))
                .collect();
            vertex.point = clamp(&shrunk, bounds);
            vertex.value = eval(&vertex.point);
        }
    }

    simplex.sort_by(by_value);
    (simplex.swap_remove(0), iterations, converged)
}

/// Centroid of every vertex except the last (worst) one of a sorted simplex.
fn centroid_without_worst(simplex: &[Vertex]) -> Vec<f64> {
    let n = simplex[0].point.len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];
    for vertex in &simplex[..simplex.len() - 1] {
        for (c, p) in centroid.iter_mut().zip(vertex.point.iter()) {
            *c += p;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

/// `origin + coef * (point - origin)`.
fn towards(origin: &[f64], point: &[f64], coef: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point.iter())
        .map(|(o, p)| o + coef * (p - o))
        .collect()
}

fn clamp(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| match b.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect(),
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
