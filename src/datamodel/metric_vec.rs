use super::metric_record::MetricName;
use smallvec::SmallVec;

pub type MetricVec<T> = SmallVec<[T; 8]>;

/// Metrics picked by the user for a chart, in selection order.
pub type MetricSelection = MetricVec<MetricName>;
