//! Per-feature standardization (zero mean, unit variance).

use statrs::statistics::Statistics;

/// Column-wise standard scaler fit over a set of feature rows.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit over `rows`. Returns `None` for an empty or ragged input.
    pub fn fit(rows: &[Vec<f64>]) -> Option<Self> {
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|r| r.len() != width) {
            return None;
        }

        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for col in 0..width {
            let column: Vec<f64> = rows.iter().map(|r| r[col]).collect();
            means.push(column.iter().mean());
            let std = column.iter().population_std_dev();
            // Constant columns are left unscaled
            scales.push(if std.is_finite() && std > f64::EPSILON {
                std
            } else {
                1.0
            });
        }

        Some(Self { means, scales })
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardizes_columns() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0], vec![5.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.width(), 2);
        let scaled = scaler.transform_all(&rows);

        let col0: Vec<f64> = scaled.iter().map(|r| r[0]).collect();
        assert!(col0.iter().mean().abs() < 1e-12);
        assert!((col0.iter().population_std_dev() - 1.0).abs() < 1e-12);

        // Constant column centers to zero without dividing by zero
        assert!(scaled.iter().all(|r| r[1] == 0.0));
    }

    #[test]
    fn test_rejects_ragged_input() {
        assert!(StandardScaler::fit(&[]).is_none());
        assert!(StandardScaler::fit(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }
}
