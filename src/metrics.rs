/// Summary statistics over a cross-validation fold sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

/// Compute mean, min, max and sample standard deviation of fold accuracies.
pub fn compute_fold_stats(scores: &[f64]) -> Option<FoldStats> {
    if scores.is_empty() {
        return None;
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let stddev = if scores.len() < 2 {
        0.0
    } else {
        let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    };
    Some(FoldStats {
        mean,
        min,
        max,
        stddev,
    })
}

/// Indices of the `k` largest importance scores, highest first.
pub fn top_k_indices(scores: &[f64], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    idx.truncate(k);
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_stats_over_known_values() {
        let s = compute_fold_stats(&[0.8, 0.9, 1.0]).unwrap();
        assert!((s.mean - 0.9).abs() < 1e-12);
        assert_eq!(s.min, 0.8);
        assert_eq!(s.max, 1.0);
        assert!((s.stddev - 0.1).abs() < 1e-12);
        assert!(compute_fold_stats(&[]).is_none());
        assert_eq!(compute_fold_stats(&[0.5]).unwrap().stddev, 0.0);
    }

    #[test]
    fn top_k_orders_descending() {
        assert_eq!(top_k_indices(&[0.1, 0.7, 0.3, 0.9], 2), vec![3, 1]);
        assert_eq!(top_k_indices(&[0.2], 5), vec![0]);
    }
}
