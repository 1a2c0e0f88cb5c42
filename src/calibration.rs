//! Confidence-vs-accuracy summaries over finished result records.
//!
//! Each summary pairs one stored confidence signal with whether the predicted
//! answer matched the expected one, then reports overall accuracy, Brier score,
//! and an equal-width reliability table with its expected calibration error.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::confidence::ConfidenceField;
use crate::store::write_json_atomic;
use crate::types::ResultRecord;

pub const NUM_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub mean_confidence: Option<f64>, // None for empty bins
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    pub field: ConfidenceField,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub mean_confidence: f64,
    pub brier_score: f64,
    pub ece: f64,
    pub bins: Vec<CalibrationBin>,
}

/// Builds the summary for one confidence signal. Empty input gives zeros.
pub fn summarize(records: &[ResultRecord], field: ConfidenceField, num_bins: usize) -> AccuracySummary {
    let num_bins = num_bins.max(1);
    let pairs: Vec<(f64, bool)> = records
        .iter()
        .map(|r| (field.read(&r.model_response.confidence), r.is_correct()))
        .collect();

    let total = pairs.len();
    let correct = pairs.iter().filter(|(_, ok)| *ok).count();
    let mut sums = vec![0.0_f64; num_bins];
    let mut hits = vec![0_usize; num_bins];
    let mut counts = vec![0_usize; num_bins];
    let mut conf_sum = 0.0;
    let mut sq_err = 0.0;

    for &(conf, ok) in &pairs {
        let y = if ok { 1.0 } else { 0.0 };
        let p = conf.clamp(0.0, 1.0);
        // [0, 1/B), ..., [(B-1)/B, 1]
        let bin = ((p * num_bins as f64) as usize).min(num_bins - 1);
        sums[bin] += p;
        hits[bin] += ok as usize;
        counts[bin] += 1;
        conf_sum += conf;
        sq_err += (conf - y).powi(2);
    }

    let mut ece = 0.0;
    let bins = (0..num_bins)
        .map(|b| {
            let n = counts[b];
            let (mean_confidence, accuracy) = if n > 0 {
                let mc = sums[b] / n as f64;
                let acc = hits[b] as f64 / n as f64;
                ece += (n as f64 / total as f64) * (mc - acc).abs();
                (Some(mc), Some(acc))
            } else {
                (None, None)
            };
            CalibrationBin {
                lower: b as f64 / num_bins as f64,
                upper: (b + 1) as f64 / num_bins as f64,
                count: n,
                mean_confidence,
                accuracy,
            }
        })
        .collect();

    let ratio = |x: f64| if total == 0 { 0.0 } else { x / total as f64 };
    AccuracySummary {
        field,
        total,
        correct,
        accuracy: ratio(correct as f64),
        mean_confidence: ratio(conf_sum),
        brier_score: ratio(sq_err),
        ece,
        bins,
    }
}

/// Writes one summary per `(field, file_name)` pair into `output_dir`.
pub fn evaluate_confidence_accuracy(
    records: &[ResultRecord],
    fields: &[(ConfidenceField, String)],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(fields.len());
    for (field, file_name) in fields {
        let summary = summarize(records, *field, NUM_BINS);
        let path = output_dir.join(file_name);
        write_json_atomic(&path, &summary)?;
        info!(
            field = %field,
            accuracy = summary.accuracy,
            ece = summary.ece,
            path = %path.display(),
            "accuracy summary written"
        );
        written.push(path);
    }
    Ok(written)
}

/// The three summaries a run produces, named `confidence_accuracy_<kind><suffix>.json`.
pub fn default_report_files(suffix: &str) -> Vec<(ConfidenceField, String)> {
    [
        (ConfidenceField::SelfEvalConfidence, "self_eval"),
        (ConfidenceField::LogitBasedConfidence, "logit"),
        (ConfidenceField::InternalBasedConfidence, "internal"),
    ]
    .into_iter()
    .map(|(field, kind)| (field, format!("confidence_accuracy_{kind}{suffix}.json")))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confidence, ModelResponse};
    use std::collections::BTreeMap;

    fn rec(predicted: Option<&str>, expected: &str, self_conf: f64) -> ResultRecord {
        ResultRecord {
            id: "x".into(),
            question_version: None,
            question: "q".into(),
            expected_answer: expected.into(),
            model_response: ModelResponse {
                reasoning: String::new(),
                predicted_answer: predicted.map(str::to_string),
                confidence: Confidence {
                    self_eval_confidence: self_conf,
                    logit_based_confidence: 1.0,
                    internal_based_confidence: 0.0,
                },
                confidence_distribution: BTreeMap::new(),
                parse_error: None,
            },
            raw_text: String::new(),
            timestamp: 0.0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn accuracy_brier_and_bins() {
        let records = vec![
            rec(Some("A"), "A", 0.95),
            rec(Some("B"), "A", 0.85),
            rec(Some("C"), "C", 0.25),
            rec(None, "D", 0.0),
        ];
        let s = summarize(&records, ConfidenceField::SelfEvalConfidence, 10);
        assert_eq!(s.total, 4);
        assert_eq!(s.correct, 2);
        assert!(close(s.accuracy, 0.5));
        assert!(close(s.mean_confidence, (0.95 + 0.85 + 0.25) / 4.0));
        // (0.05^2 + 0.85^2 + 0.75^2 + 0) / 4
        assert!(close(s.brier_score, (0.0025 + 0.7225 + 0.5625) / 4.0));
        assert_eq!(s.bins.len(), 10);
        assert_eq!(s.bins[0].count, 1);
        assert_eq!(s.bins[2].count, 1);
        assert_eq!(s.bins[8].count, 1);
        assert_eq!(s.bins[9].count, 1);
        assert_eq!(s.bins[5].mean_confidence, None);
        assert_eq!(s.bins[9].accuracy, Some(1.0));
        // |0.95-1| + |0.85-0| + |0.25-1| + |0-0|, each weighted 1/4
        assert!(close(s.ece, (0.05 + 0.85 + 0.75) / 4.0));
    }

    #[test]
    fn full_confidence_lands_in_last_bin() {
        let s = summarize(&[rec(Some("A"), "A", 0.0)], ConfidenceField::LogitBasedConfidence, 10);
        assert_eq!(s.bins[9].count, 1);
        assert!(close(s.ece, 0.0));
        assert!(close(s.bins[9].upper, 1.0));
    }

    #[test]
    fn empty_records_give_zeros() {
        let s = summarize(&[], ConfidenceField::InternalBasedConfidence, 10);
        assert_eq!((s.total, s.correct), (0, 0));
        assert_eq!(s.accuracy, 0.0);
        assert_eq!(s.ece, 0.0);
        assert!(s.bins.iter().all(|b| b.count == 0));
    }

    #[test]
    fn writes_one_file_per_field() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![rec(Some("A"), "A", 0.9)];
        let files = default_report_files("_augmented");
        let written = evaluate_confidence_accuracy(&records, &files, dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written[1].ends_with("confidence_accuracy_logit_augmented.json"));
        let text = std::fs::read_to_string(&written[0]).unwrap();
        let summary: AccuracySummary = serde_json::from_str(&text).unwrap();
        assert_eq!(summary.field, ConfidenceField::SelfEvalConfidence);
        assert_eq!(summary.correct, 1);
    }
}
