/// Values accumulated under one grouping key.
///
/// A bucket is only ever created from a first value, so `count() >= 1`.
/// Empty groups are represented by the absence of a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationBucket {
    values: Vec<f64>,
    sum: f64,
}

impl AggregationBucket {
    pub fn new(first: f64) -> Self {
        Self {
            values: vec![first],
            sum: first,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
        self.sum += value;
    }

    /// Adds `value` to the bucket in `slot`, creating it on first use.
    pub fn accumulate(slot: &mut Option<AggregationBucket>, value: f64) {
        match slot {
            Some(bucket) => bucket.push(value),
            None => *slot = Some(AggregationBucket::new(value)),
        }
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count() as f64
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
