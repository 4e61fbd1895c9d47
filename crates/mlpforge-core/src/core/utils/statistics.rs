/// Mean and population standard deviation (`ddof = 0`) of a sample.
///
/// Returns `None` for an empty slice.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

pub fn summarize(values: &[f64]) -> Option<Summary> {
    let (mean, _) = mean_and_std(values)?;
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    Some(Summary {
        count: values.len(),
        min,
        max,
        mean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_uses_population_variance() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
    }

    #[test]
    fn mean_and_std_of_empty_slice_is_none() {
        assert!(mean_and_std(&[]).is_none());
    }

    #[test]
    fn summarize_reports_extremes() {
        let s = summarize(&[-1.0, 3.0, 1.0]).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.min, -1.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.mean, 1.0);
    }
}
