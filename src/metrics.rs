//! Classification evaluation metrics.

use std::fmt;

/// Fraction of predictions matching the true labels.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "label vectors must have the same length"
    );
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Precision, recall and support for one class.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassMetrics {
    /// Decoded class label.
    pub label: String,
    /// `tp / (tp + fp)`, 0 when the class was never predicted.
    pub precision: f64,
    /// `tp / (tp + fn)`, 0 when the class never occurs.
    pub recall: f64,
    /// Number of true occurrences of the class.
    pub support: usize,
}

/// Held-out evaluation summary: overall accuracy plus per-class metrics in
/// class-code order.
#[derive(Clone, Debug)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "accuracy: {:.4}", self.accuracy)?;
        for class in &self.classes {
            writeln!(
                f,
                "{:<14} precision: {:.4}  recall: {:.4}  support: {}",
                class.label, class.precision, class.recall, class.support
            )?;
        }
        Ok(())
    }
}

/// Build a report for predictions over classes coded `0..labels.len()`.
///
/// `labels[code]` is the decoded name of class `code`.
pub fn classification_report(
    y_true: &[usize],
    y_pred: &[usize],
    labels: &[String],
) -> ClassificationReport {
    let n_classes = labels.len();
    let mut tp = vec![0usize; n_classes];
    let mut fp = vec![0usize; n_classes];
    let mut fn_ = vec![0usize; n_classes];

    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        if t == p {
            tp[t] += 1;
        } else {
            if p < n_classes {
                fp[p] += 1;
            }
            fn_[t] += 1;
        }
    }

    let classes = labels
        .iter()
        .enumerate()
        .map(|(code, label)| {
            let predicted = tp[code] + fp[code];
            let actual = tp[code] + fn_[code];
            ClassMetrics {
                label: label.clone(),
                precision: if predicted == 0 {
                    0.0
                } else {
                    tp[code] as f64 / predicted as f64
                },
                recall: if actual == 0 {
                    0.0
                } else {
                    tp[code] as f64 / actual as f64
                },
                support: actual,
            }
        })
        .collect();

    ClassificationReport {
        accuracy: accuracy(y_true, y_pred),
        classes,
    }
}
