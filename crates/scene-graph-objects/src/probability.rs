//! Discrete probability helpers for information-bottleneck clustering.
//!
//! Segments are X, tasks are Y. Each segment carries an empirical posterior
//! `p(y|x)` derived from its feature's task scores; the clustering cost is a
//! size-weighted Jensen–Shannon divergence between cluster posteriors, scaled
//! against the global mutual information `I(X;Y)`.
//!
//! All distributions are `Vec<f64>` summing to 1 (uniform fallback when the
//! inputs are degenerate). Logarithms are natural; zero-probability terms
//! contribute zero.

/// Numerical floor below which probabilities are treated as zero.
pub(crate) const PROB_EPSILON: f64 = 1e-12;

/// Posterior `p(y|x)` from raw task scores via a tempered softmax.
///
/// `temperature` sharpens (<1) or flattens (>1) the distribution. Degenerate
/// input (empty, non-finite, all equal to negative infinity) falls back to
/// uniform.
#[must_use]
pub fn task_posterior(scores: &[f32], temperature: f64) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let n = scores.len();
    let uniform = vec![1.0 / n as f64; n];
    if !temperature.is_finite() || temperature <= 0.0 {
        return uniform;
    }

    let scaled: Vec<f64> = scores.iter().map(|&s| s as f64 / temperature).collect();
    if scaled.iter().any(|s| !s.is_finite()) {
        return uniform;
    }
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scaled.iter().map(|&s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    if !total.is_finite() || total < PROB_EPSILON {
        return uniform;
    }
    exps.into_iter().map(|e| e / total).collect()
}

/// Marginal `p(y)` from per-segment posteriors with uniform `p(x)`.
///
/// Empty input yields an empty marginal.
#[must_use]
pub fn task_marginal(posteriors: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = posteriors.first() else {
        return Vec::new();
    };
    let mut marginal = vec![0.0f64; first.len()];
    let px = 1.0 / posteriors.len() as f64;
    for posterior in posteriors {
        for (m, p) in marginal.iter_mut().zip(posterior.iter()) {
            *m += px * p;
        }
    }
    marginal
}

/// Kullback–Leibler divergence `KL(p || q)` in nats.
///
/// Terms with `p = 0` contribute zero; terms with `q = 0` and `p > 0` are
/// clamped through the epsilon floor rather than producing infinity.
#[must_use]
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    p.iter()
        .zip(q.iter())
        .filter(|(&pi, _)| pi > PROB_EPSILON)
        .map(|(&pi, &qi)| pi * (pi / qi.max(PROB_EPSILON)).ln())
        .sum()
}

/// Weighted Jensen–Shannon divergence with mixture weights `(pi_p, pi_q)`.
///
/// `JS_pi(p, q) = pi_p * KL(p || m) + pi_q * KL(q || m)` with
/// `m = pi_p * p + pi_q * q`. Non-negative, zero iff `p == q`.
#[must_use]
pub fn weighted_js_divergence(p: &[f64], q: &[f64], pi_p: f64, pi_q: f64) -> f64 {
    let mixture: Vec<f64> = p
        .iter()
        .zip(q.iter())
        .map(|(&pi, &qi)| pi_p * pi + pi_q * qi)
        .collect();
    pi_p * kl_divergence(p, &mixture) + pi_q * kl_divergence(q, &mixture)
}

/// Mutual information `I(X;Y)` in nats, with uniform `p(x)` over the given
/// posteriors.
///
/// `I = (1/n) * sum_x KL(p(y|x) || p(y))`. Zero for empty input or when all
/// posteriors equal the marginal (X carries no information about Y).
#[must_use]
pub fn mutual_information(posteriors: &[Vec<f64>]) -> f64 {
    if posteriors.is_empty() {
        return 0.0;
    }
    let marginal = task_marginal(posteriors);
    let px = 1.0 / posteriors.len() as f64;
    posteriors
        .iter()
        .map(|posterior| px * kl_divergence(posterior, &marginal))
        .sum()
}
