use crate::datamodel::MetricSeries;
use crate::error::Result;

/// Keeps every `factor`-th element, plus the last element so the rendered
/// line still reaches the most recent point.
///
/// A factor of 0 or 1 returns the input unchanged. Parallel sequences must be
/// decimated with the same factor to stay index-aligned.
pub fn decimate<T: Clone>(data: &[T], factor: usize) -> Vec<T> {
    if factor <= 1 {
        return data.to_vec();
    }

    let mut result: Vec<T> = data.iter().step_by(factor).cloned().collect();
    let last_index = data.len().wrapping_sub(1);
    if !data.is_empty() && last_index % factor != 0 {
        result.push(data[last_index].clone());
    }
    result
}

/// Smallest factor that brings `len` points down to about `max_points`.
pub fn decimation_factor(len: usize, max_points: usize) -> usize {
    if max_points == 0 || len <= max_points {
        1
    } else {
        len.div_ceil(max_points)
    }
}

pub fn decimate_series(series: MetricSeries, factor: usize) -> Result<MetricSeries> {
    if factor <= 1 {
        return Ok(series);
    }
    let (name, labels, values) = series.into_parts();
    MetricSeries::new(name, decimate(&labels, factor), decimate(&values, factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::MetricName;

    #[test]
    fn test_identity_for_small_factors() {
        let data = vec![1, 2, 3];
        assert_eq!(decimate(&data, 0), data);
        assert_eq!(decimate(&data, 1), data);
    }

    #[test]
    fn test_even_division_keeps_last_once() {
        assert_eq!(decimate(&[1, 2, 3, 4, 5, 6, 7], 3), vec![1, 4, 7]);
        assert_eq!(decimate(&[1, 2, 3, 4, 5], 2), vec![1, 3, 5]);
    }

    #[test]
    fn test_last_element_appended() {
        assert_eq!(decimate(&[1, 2, 3, 4, 5, 6], 4), vec![1, 5, 6]);
        assert_eq!(decimate(&[1, 2], 5), vec![1, 2]);
    }

    #[test]
    fn test_endpoint_by_index_not_value() {
        // The last value equals the last selected value, but sits at another index.
        assert_eq!(decimate(&[7, 0, 0, 7, 7], 3), vec![7, 7, 7]);
        assert_eq!(decimate(&[7, 0, 0, 7], 3), vec![7, 7]);
        assert_eq!(decimate(&[7, 0, 7, 0, 7], 2), vec![7, 7, 7]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(decimate::<u8>(&[], 4).is_empty());
        assert_eq!(decimate(&[9], 4), vec![9]);
    }

    #[test]
    fn test_decimation_factor() {
        assert_eq!(decimation_factor(0, 1000), 1);
        assert_eq!(decimation_factor(1000, 1000), 1);
        assert_eq!(decimation_factor(1001, 1000), 2);
        assert_eq!(decimation_factor(4500, 1000), 5);
        assert_eq!(decimation_factor(10, 0), 1);
    }

    #[test]
    fn test_decimate_series_stays_aligned() {
        let labels: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let values: Vec<Option<f64>> = (0..10).map(|i| Some(i as f64)).collect();
        let series = MetricSeries::new(MetricName::new("G19").unwrap(), labels, values).unwrap();

        let decimated = decimate_series(series, 4).unwrap();
        assert_eq!(decimated.labels(), ["0", "4", "8", "9"]);
        assert_eq!(
            decimated.values(),
            [Some(0.0), Some(4.0), Some(8.0), Some(9.0)]
        );
    }
}
