use crate::detect::DetectError;

/// A sample of per-key counts for descriptive statistics.
pub struct CountSeries {
    values: Vec<f64>,
}

impl CountSeries {
    pub fn new<I: IntoIterator<Item = u64>>(counts: I) -> Self {
        Self {
            values: counts.into_iter().map(|c| c as f64).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Sample standard deviation (n - 1 denominator).
    pub fn sample_std_dev(&self) -> Result<f64, DetectError> {
        let n = self.values.len();
        if n < 2 {
            return Err(DetectError::InsufficientBaseline { needed: 2, have: n });
        }
        let mean = self.mean();
        let sum_sq_diff: f64 = self.values.iter().map(|&x| (x - mean).powi(2)).sum();
        Ok((sum_sq_diff / (n - 1) as f64).sqrt())
    }

    /// `mean + sigmas * std_dev`, or the largest value when the deviation is
    /// zero or undefined.
    pub fn outlier_threshold(&self, sigmas: f64) -> Option<f64> {
        match self.sample_std_dev() {
            Ok(std) if std > 0.0 => Some(self.mean() + sigmas * std),
            _ => self.max(),
        }
    }
}
