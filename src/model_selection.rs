//! Train/test partitioning.
//!
//! A single stratified split with a fixed ratio and seed: each target class
//! contributes the same fraction of its rows to the held-out partition, so
//! a rare class cannot vanish from either side, and identical inputs always
//! produce identical partitions.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;

/// Split sample indices into `(train, test)` stratified by label.
///
/// `test_size` is the held-out fraction in `(0, 1)`. Within each class the
/// row order is shuffled with `seed` before the cut; both returned index
/// lists are sorted ascending. Classes with at least two rows always keep
/// at least one row on each side.
///
/// # Errors
/// Returns [`PipelineError::InvalidDataset`] if `test_size` is out of range
/// or `y` is empty.
///
/// # Example
/// ```
/// use loan_approval::model_selection::stratified_split;
///
/// let y = vec![0, 0, 0, 0, 1, 1, 1, 1, 0, 1];
/// let (train, test) = stratified_split(&y, 0.2, 42).unwrap();
/// assert_eq!(train.len(), 8);
/// assert_eq!(test.len(), 2);
/// ```
pub fn stratified_split(
    y: &[usize],
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), PipelineError> {
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        return Err(PipelineError::InvalidDataset(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    if y.is_empty() {
        return Err(PipelineError::InvalidDataset(
            "cannot split an empty label vector".to_string(),
        ));
    }

    // Bucket indices by class; BTreeMap keeps class iteration deterministic.
    let mut buckets: std::collections::BTreeMap<usize, Vec<usize>> = Default::default();
    for (idx, &label) in y.iter().enumerate() {
        buckets.entry(label).or_default().push(idx);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for (_, mut indices) in buckets {
        indices.shuffle(&mut rng);
        let mut n_test = (indices.len() as f64 * test_size).round() as usize;
        if indices.len() >= 2 {
            n_test = n_test.clamp(1, indices.len() - 1);
        } else {
            n_test = 0;
        }
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Select matrix rows by index.
pub fn take_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    x.select(Axis(0), indices)
}

/// Select label entries by index.
pub fn take_labels(y: &[usize], indices: &[usize]) -> Vec<usize> {
    indices.iter().map(|&i| y[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_split_sizes_and_disjointness() {
        let y: Vec<usize> = (0..100).map(|i| i % 2).collect();
        let (train, test) = stratified_split(&y, 0.2, 42).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        for idx in &test {
            assert!(!train.contains(idx));
        }
    }

    #[test]
    fn test_split_is_stratified() {
        // 75/25 class imbalance must carry over to the test partition
        let y: Vec<usize> = (0..80).map(|i| usize::from(i % 4 == 0)).collect();
        let (_, test) = stratified_split(&y, 0.25, 7).unwrap();
        let minority = test.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(minority, 5);
        assert_eq!(test.len(), 20);
    }

    #[test]
    fn test_split_is_reproducible() {
        let y: Vec<usize> = (0..50).map(|i| i % 2).collect();
        let a = stratified_split(&y, 0.2, 42).unwrap();
        let b = stratified_split(&y, 0.2, 42).unwrap();
        assert_eq!(a, b);
        let c = stratified_split(&y, 0.2, 43).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_small_class_keeps_rows_on_both_sides() {
        let y = vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
        let (train, test) = stratified_split(&y, 0.1, 1).unwrap();
        let train_minority = train.iter().filter(|&&i| y[i] == 1).count();
        let test_minority = test.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(train_minority, 1);
        assert_eq!(test_minority, 1);
    }

    #[test]
    fn test_invalid_test_size() {
        let y = vec![0, 1];
        assert!(stratified_split(&y, 0.0, 1).is_err());
        assert!(stratified_split(&y, 1.0, 1).is_err());
        assert!(stratified_split(&y, -0.5, 1).is_err());
    }

    #[test]
    fn test_take_rows_and_labels() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = vec![0, 1, 0];
        let sub = take_rows(&x, &[0, 2]);
        assert_eq!(sub, array![[1.0], [3.0]]);
        assert_eq!(take_labels(&y, &[0, 2]), vec![0, 0]);
    }
}
