//! Summary statistics shared by the built-in evaluators.
use super::task::{EvalError, TaskMetrics};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-example error thresholds (degrees) reported as "within" percentages.
pub const THRESHOLDS_DEG: [f64; 4] = [1.0, 2.0, 5.0, 10.0];

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (average of the two middle values for even lengths); `None` for
/// an empty slice. NaNs sort last.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Percentage of values strictly below `threshold`.
pub fn percent_below(values: &[f64], threshold: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.iter().filter(|&&v| v < threshold).count();
    Some(100.0 * n as f64 / values.len() as f64)
}

/// Per-pixel angular error summary for one example.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub mean_deg: Option<f64>,
    pub median_deg: Option<f64>,
    pub pixels: usize,
}

impl ErrorSummary {
    pub fn from_errors(errors: &[f64]) -> Self {
        Self {
            mean_deg: mean(errors),
            median_deg: median(errors),
            pixels: errors.len(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "mean_deg": self.mean_deg,
            "median_deg": self.median_deg,
            "pixels": self.pixels,
        })
    }
}

/// Reduces per-example [`ErrorSummary`] payloads of `task` into metrics.
///
/// Examples without any valid pixel count toward `examples` only.
pub fn aggregate_summaries(task: &'static str, payloads: &[&Value]) -> Result<TaskMetrics, EvalError> {
    let mut means = Vec::with_capacity(payloads.len());
    let mut medians = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let summary: ErrorSummary =
            serde_json::from_value((*payload).clone()).map_err(|e| EvalError::MalformedRecord {
                task,
                reason: e.to_string(),
            })?;
        if let (Some(m), Some(md)) = (summary.mean_deg, summary.median_deg) {
            means.push(m);
            medians.push(md);
        }
    }

    let mut metrics = TaskMetrics::new();
    metrics.insert("examples".into(), payloads.len() as f64);
    metrics.insert("evaluated".into(), means.len() as f64);
    if let (Some(m), Some(md)) = (mean(&means), median(&medians)) {
        metrics.insert("mean_error".into(), m);
        metrics.insert("median_error".into(), md);
        for t in THRESHOLDS_DEG {
            if let Some(p) = percent_below(&means, t) {
                metrics.insert(format!("within_{t}deg"), p);
            }
        }
    }
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_statistics() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(mean(&v), Some(2.5));
        assert_eq!(median(&v), Some(2.5));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(percent_below(&v, 3.0), Some(50.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn aggregates_example_summaries() {
        let a = ErrorSummary::from_errors(&[0.5, 1.5]).to_value();
        let b = ErrorSummary::from_errors(&[3.0]).to_value();
        let empty = ErrorSummary::from_errors(&[]).to_value();
        let metrics = aggregate_summaries("gravity", &[&a, &b, &empty]).expect("metrics");
        assert_eq!(metrics["examples"], 3.0);
        assert_eq!(metrics["evaluated"], 2.0);
        assert_eq!(metrics["mean_error"], 2.0);
        assert_eq!(metrics["within_2deg"], 50.0);
        assert_eq!(metrics["within_5deg"], 100.0);
    }

    #[test]
    fn malformed_payload_is_reported() {
        let bad = serde_json::json!({ "mean_deg": "nope" });
        assert!(matches!(
            aggregate_summaries("latitude", &[&bad]),
            Err(EvalError::MalformedRecord { task: "latitude", .. })
        ));
    }
}
