pub fn mean<T: Copy + Into<f64>>(values: &[T]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for &v in values {
        sum += v.into();
    }
    sum / values.len() as f64
}

pub fn mean_square_deviation<T: Copy + Into<f64>>(values: &[T], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for &v in values {
        let d = v.into() - mean;
        sum += d * d;
    }
    sum / values.len() as f64
}

pub fn std_dev<T: Copy + Into<f64>>(values: &[T], mean: f64) -> f64 {
    mean_square_deviation(values, mean).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_deviation() {
        let values = [2.0f64, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert_eq!(mean_square_deviation(&values, m), 4.0);
        assert_eq!(std_dev(&values, m), 2.0);
    }

    #[test]
    fn test_f32_input_accumulates_in_f64() {
        let values = vec![0.1f32; 1_000_000];
        let m = mean(&values);
        assert!((m - 0.1f32 as f64).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let values: [f64; 0] = [];
        assert_eq!(mean(&values), 0.0);
        assert_eq!(std_dev(&values, 0.0), 0.0);
    }
}
