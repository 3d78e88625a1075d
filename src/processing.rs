use crate::types::{Column, Dataset, Record};
use serde::Serialize;
use std::f64::consts::PI;

/// The first `n` records, for the data preview table.
pub fn preview(dataset: &Dataset, n: usize) -> &[Record] {
    let records = dataset.records();
    &records[..n.min(records.len())]
}

/// Descriptive statistics of one numeric column, missing values excluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: Column,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    pub fn from_values(column: Column, values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = mean(&sorted);
        Self {
            column,
            count,
            mean,
            std: sample_std(&sorted, mean),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q25: quantile(&sorted, 0.25),
            q50: quantile(&sorted, 0.50),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }

    /// Statistic names and values in table order.
    pub fn rows(&self) -> [(&'static str, f64); 8] {
        [
            ("count", self.count as f64),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.q50),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

pub fn describe(dataset: &Dataset) -> Vec<ColumnSummary> {
    Column::ALL
        .iter()
        .map(|&column| ColumnSummary::from_values(column, &dataset.values(column)))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

// Linear interpolation between closest ranks; `sorted` must be ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Frequency histogram of a column with a smoothed density overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub column: Column,
    /// `counts.len() + 1` ascending bucket edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Kernel density estimate scaled to the frequency axis, as (x, frequency).
    pub density: Option<Vec<(f64, f64)>>,
}

impl Histogram {
    pub fn for_column(dataset: &Dataset, column: Column, bins: usize, density_points: usize) -> Self {
        Self::build(column, &dataset.values(column), bins, density_points)
    }

    pub fn build(column: Column, values: &[f64], bins: usize, density_points: usize) -> Self {
        let bins = bins.max(1);
        let (lo, hi) = match min_max(values) {
            None => (0.0, 1.0),
            Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
            Some(range) => range,
        };

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0usize; bins];
        for &v in values {
            // Last bucket is closed on the right
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let density = kernel_density(values, density_points)
            .map(|curve| {
                let scale = values.len() as f64 * width;
                curve.into_iter().map(|(x, d)| (x, d * scale)).collect()
            });

        Self { column, edges, counts, density }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

pub(crate) fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Gaussian KDE with Scott's bandwidth, evaluated on `points` evenly spaced
/// positions across the data range.
fn kernel_density(values: &[f64], points: usize) -> Option<Vec<(f64, f64)>> {
    let n = values.len();
    if n < 2 || points < 2 {
        return None;
    }
    let std = sample_std(values, mean(values));
    if std.is_nan() || std <= 0.0 {
        return None;
    }
    let bandwidth = std * (n as f64).powf(-0.2);
    let (lo, hi) = min_max(values)?;
    let step = (hi - lo) / (points - 1) as f64;
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * PI).sqrt());

    let curve = (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let sum: f64 = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum();
            (x, sum * norm)
        })
        .collect();
    Some(curve)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, gdp: Option<f64>, density: Option<f64>) -> Record {
        Record {
            vehicle_number: id.to_string(),
            latitude: 10.0,
            longitude: 20.0,
            gdp_ppp: gdp,
            population_density: density,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn preview_is_bounded_by_row_count() {
        let dataset = Dataset::new(vec![record("1", None, None), record("2", None, None)]);
        assert_eq!(preview(&dataset, 5).len(), 2);
        assert_eq!(preview(&dataset, 1)[0].vehicle_number, "1");
        assert!(preview(&Dataset::default(), 5).is_empty());
    }

    #[test]
    fn describe_matches_known_values() {
        let summary = ColumnSummary::from_values(Column::GdpPpp, &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(summary.count, 4);
        assert!(close(summary.mean, 2.5));
        assert!(close(summary.std, (5.0f64 / 3.0).sqrt()));
        assert_eq!(summary.min, 1.0);
        assert!(close(summary.q25, 1.75));
        assert!(close(summary.q50, 2.5));
        assert!(close(summary.q75, 3.25));
        assert_eq!(summary.max, 4.0);
    }

    #[test]
    fn counts_equal_row_count_only_without_missing_values() {
        let dataset = Dataset::new(vec![
            record("1", Some(1.0), Some(5.0)),
            record("2", None, Some(6.0)),
            record("3", Some(3.0), Some(7.0)),
        ]);
        let summaries = describe(&dataset);
        for summary in &summaries {
            assert!(summary.count <= dataset.len());
        }
        let by_column = |c: Column| summaries.iter().find(|s| s.column == c).unwrap().count;
        assert_eq!(by_column(Column::GdpPpp), 2);
        assert_eq!(by_column(Column::PopulationDensity), 3);
        assert_eq!(by_column(Column::Latitude), 3);
    }

    #[test]
    fn empty_dataset_statistics_are_nan() {
        let summaries = describe(&Dataset::default());
        assert_eq!(summaries.len(), Column::ALL.len());
        for summary in summaries {
            assert_eq!(summary.count, 0);
            assert!(summary.mean.is_nan());
            assert!(summary.std.is_nan());
            assert!(summary.min.is_nan());
            assert!(summary.q50.is_nan());
            assert!(summary.max.is_nan());
        }
    }

    #[test]
    fn single_value_has_nan_std() {
        let summary = ColumnSummary::from_values(Column::GdpPpp, &[7.0]);
        assert_eq!(summary.mean, 7.0);
        assert!(summary.std.is_nan());
        assert_eq!(summary.q25, 7.0);
    }

    #[test]
    fn histogram_counts_every_present_value_once() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let hist = Histogram::build(Column::GdpPpp, &values, 30, 200);
        assert_eq!(hist.counts.len(), 30);
        assert_eq!(hist.edges.len(), 31);
        assert_eq!(hist.total(), 100);
        assert_eq!(hist.edges[0], 0.0);
        assert!(close(hist.edges[30], 99.0));
        // max lands in the final bucket
        assert!(hist.counts[29] >= 1);
    }

    #[test]
    fn histogram_drops_missing_values() {
        let dataset = Dataset::new(vec![
            record("1", Some(10.0), None),
            record("2", None, None),
            record("3", Some(20.0), None),
        ]);
        let hist = Histogram::for_column(&dataset, Column::GdpPpp, 30, 200);
        assert_eq!(hist.total(), 2);
        assert_eq!(hist.counts[0], 1);
        assert_eq!(hist.counts[29], 1);
    }

    #[test]
    fn degenerate_and_empty_histograms() {
        let single = Histogram::build(Column::GdpPpp, &[5.0, 5.0], 30, 200);
        assert_eq!(single.edges[0], 4.5);
        assert!(close(single.edges[30], 5.5));
        assert_eq!(single.total(), 2);
        assert!(single.density.is_none());

        let empty = Histogram::build(Column::GdpPpp, &[], 30, 200);
        assert_eq!(empty.edges[0], 0.0);
        assert_eq!(empty.total(), 0);
        assert!(empty.density.is_none());
    }

    #[test]
    fn density_overlay_integrates_to_frequency_area() {
        let values: Vec<f64> = (0..500).map(|i| ((i * 37) % 101) as f64).collect();
        let hist = Histogram::build(Column::PopulationDensity, &values, 30, 200);
        let curve = hist.density.as_ref().unwrap();
        assert_eq!(curve.len(), 200);
        assert_eq!(curve[0].0, 0.0);
        assert!(close(curve[199].0, 100.0));
        assert!(curve.iter().all(|&(_, y)| y >= 0.0));

        // Frequency-scaled KDE peaks on the same order as the bars.
        let peak = curve.iter().map(|&(_, y)| y).fold(0.0, f64::max);
        assert!(peak > 0.0 && peak < 2.0 * hist.max_count() as f64);
    }

    #[test]
    fn summaries_are_idempotent() {
        let dataset = Dataset::new(vec![
            record("1", Some(1.0), Some(8.0)),
            record("2", Some(9.0), None),
            record("3", Some(4.0), Some(2.0)),
        ]);
        assert_eq!(describe(&dataset), describe(&dataset));
        assert_eq!(
            Histogram::for_column(&dataset, Column::GdpPpp, 30, 200),
            Histogram::for_column(&dataset, Column::GdpPpp, 30, 200)
        );
    }
}
