//! Label distributions and Shannon entropy.

use crate::table::Row;

/// Label occurrence counts, in first-encountered order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCounts {
    entries: Vec<(String, usize)>,
}

impl ClassCounts {
    /// Count the label of every row.
    #[must_use]
    pub fn from_rows(rows: &[&Row]) -> Self {
        let mut counts = Self::default();
        for row in rows {
            counts.add(row.label());
        }
        counts
    }

    /// Increment the count for `label`.
    pub fn add(&mut self, label: &str) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label.to_string(), 1)),
        }
    }

    /// Return the count for `label`, zero when unseen.
    #[must_use]
    pub fn get(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, c)| *c)
    }

    /// Iterate `(label, count)` pairs in first-encountered order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when no label has been counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Most frequent label; ties keep the first encountered.
    #[must_use]
    pub fn majority(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (label, count) in self.iter() {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((label, count));
            }
        }
        best.map(|(label, _)| label)
    }

    /// `count / total` per label.
    ///
    /// `total` must be non-zero.
    #[must_use]
    pub fn probabilities(&self, total: usize) -> Vec<(&str, f64)> {
        debug_assert!(total > 0, "probabilities of an empty distribution");
        let n = total as f64;
        self.iter().map(|(l, c)| (l, c as f64 / n)).collect()
    }

    /// Shannon entropy in bits. Zero for an empty distribution.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        -self
            .probabilities(total)
            .into_iter()
            .filter(|&(_, p)| p > 0.0)
            .map(|(_, p)| p * p.log2())
            .sum::<f64>()
    }
}

/// Entropy in bits of raw class counts summing to `n_samples`.
///
/// Returns 0.0 when `n_samples` is zero.
#[must_use]
pub(crate) fn entropy_of_counts(class_counts: &[usize], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    -class_counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Count labels across `rows`.
#[must_use]
pub fn class_counts(rows: &[&Row]) -> ClassCounts {
    ClassCounts::from_rows(rows)
}

/// Entropy of the label distribution of `rows`; 0.0 when empty.
#[must_use]
pub fn entropy(rows: &[&Row]) -> f64 {
    ClassCounts::from_rows(rows).entropy()
}

/// Most frequent label of `rows`, first encountered on ties.
#[must_use]
pub fn majority_label(rows: &[&Row]) -> Option<String> {
    ClassCounts::from_rows(rows).majority().map(str::to_string)
}
