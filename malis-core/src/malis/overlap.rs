//! Per-component ground-truth label histograms.

use std::collections::BTreeMap;

use crate::forest::Payload;

/// Label → site count for one component. Unlabelled sites (label `0`) are
/// never recorded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct LabelOverlap {
    counts: BTreeMap<u64, u64>,
}

impl LabelOverlap {
    /// Histogram of a single site carrying `label`.
    pub(crate) fn seeded(label: u64) -> Self {
        let mut counts = BTreeMap::new();
        if label != 0 {
            counts.insert(label, 1);
        }
        Self { counts }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.counts.iter().map(|(&label, &count)| (label, count))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn count(&self, label: u64) -> u64 {
        self.counts.get(&label).copied().unwrap_or(0)
    }
}

impl Payload for LabelOverlap {
    fn absorb(&mut self, mut other: Self) {
        if other.counts.len() > self.counts.len() {
            std::mem::swap(self, &mut other);
        }
        for (label, count) in other.counts {
            let entry = self.counts.entry(label).or_insert(0);
            *entry = entry.saturating_add(count);
        }
    }
}
