//! Statistical helpers shared by the transforms

use std::cmp::Ordering;

use statrs::statistics::Statistics;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Standard deviation with `ddof` delta degrees of freedom.
pub fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    let n = values.len();
    if n == 0 || n <= ddof {
        return None;
    }
    let population = values.iter().population_variance();
    Some((population * n as f64 / (n - ddof) as f64).sqrt())
}

/// Quantile `q` in `[0, 1]` of an ascending slice, linearly interpolated at
/// position `(n - 1) * q`. statrs' quantile estimator interpolates
/// differently, so this one stays local.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = (sorted.len() - 1) as f64 * q;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    if lower == upper || upper >= sorted.len() {
        Some(sorted[lower])
    } else {
        let fraction = idx - lower as f64;
        Some(sorted[lower] * (1.0 - fraction) + sorted[upper] * fraction)
    }
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// 1-based ranks; tied values share the average of their positions.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end (0-based) share rank mean(start+1..=end)
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// Pearson product-moment correlation. `None` when undefined.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    r.is_finite().then_some(r)
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Kendall's tau-b, adjusting for ties in either variable.
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }
    let (mut concordant, mut discordant) = (0i64, 0i64);
    let (mut ties_x, mut ties_y) = (0i64, 0i64);
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i].total_cmp(&x[j]);
            let dy = y[i].total_cmp(&y[j]);
            match (dx, dy) {
                (Ordering::Equal, Ordering::Equal) => {
                    ties_x += 1;
                    ties_y += 1;
                }
                (Ordering::Equal, _) => ties_x += 1,
                (_, Ordering::Equal) => ties_y += 1,
                _ if dx == dy => concordant += 1,
                _ => discordant += 1,
            }
        }
    }
    let pairs = (n * (n - 1) / 2) as i64;
    let denom = (((pairs - ties_x) * (pairs - ties_y)) as f64).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((concordant - discordant) as f64 / denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn quartiles_interpolate() {
        let s = sorted(&[4.0, 1.0, 3.0, 2.0]);
        assert!(approx(quantile(&s, 0.25).unwrap(), 1.75));
        assert!(approx(quantile(&s, 0.5).unwrap(), 2.5));
        assert!(approx(quantile(&s, 1.0).unwrap(), 4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn std_dev_degrees_of_freedom() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(std_dev(&v, 0).unwrap(), 2.0));
        assert!(approx(std_dev(&v, 1).unwrap(), (32.0f64 / 7.0).sqrt()));
        assert_eq!(std_dev(&[1.0], 1), None);
        assert!(approx(mean(&v).unwrap(), 5.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[3.0], 0), Some(0.0));
    }

    #[test]
    fn ranks_average_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn correlation_methods_on_monotone_data() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 25.0];
        assert!(pearson(&x, &y).unwrap() < 1.0);
        assert!(approx(spearman(&x, &y).unwrap(), 1.0));
        assert!(approx(kendall_tau_b(&x, &y).unwrap(), 1.0));

        let rev: Vec<f64> = y.iter().rev().copied().collect();
        assert!(approx(kendall_tau_b(&x, &rev).unwrap(), -1.0));
    }

    #[test]
    fn constant_input_is_undefined() {
        let x = [1.0, 2.0, 3.0];
        let c = [5.0, 5.0, 5.0];
        assert_eq!(pearson(&x, &c), None);
        assert_eq!(spearman(&x, &c), None);
        assert_eq!(kendall_tau_b(&x, &c), None);
    }

    #[test]
    fn kendall_with_ties() {
        // scipy.stats.kendalltau([1, 2, 2, 3], [1, 2, 3, 3]) -> 0.8
        let tau = kendall_tau_b(&[1.0, 2.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 3.0]).unwrap();
        assert!(approx(tau, 0.8));
    }
}
