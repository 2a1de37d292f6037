/// Arithmetic mean; `None` on an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation; `None` on an empty slice.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    Some(variance.sqrt())
}

/// Percent correct; `None` before the first attempt (the UI shows "n/a"
/// rather than a misleading 0%).
pub fn accuracy_pct(correct: u32, attempted: u32) -> Option<f64> {
    if attempted == 0 {
        None
    } else {
        Some(correct as f64 / attempted as f64 * 100.0)
    }
}

/// Pages needed for `total` entries at `page_size` per page: `floor`
/// full pages plus a partial page iff the division has a remainder.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_response_times() {
        assert_eq!(mean(&[800.0, 1200.0, 1000.0]), Some(1000.0));
        assert_eq!(mean(&[450.0]), Some(450.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn std_dev_of_response_times() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0, 5.0]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
        let sd = std_dev(&[100.0, 120.0, 90.0, 102.0, 94.0]).unwrap();
        assert!((sd - 10.322790320451151).abs() < 1e-12);
    }

    #[test]
    fn accuracy_pct_handles_zero_attempts() {
        assert_eq!(accuracy_pct(0, 0), None);
        assert_eq!(accuracy_pct(0, 4), Some(0.0));
        assert_eq!(accuracy_pct(3, 4), Some(75.0));
        assert_eq!(accuracy_pct(4, 4), Some(100.0));
    }

    #[test]
    fn page_count_splits_on_remainder() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(5, 0), 0);
    }
}
