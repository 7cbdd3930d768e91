// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::record::WalletRow;
use rand::Rng;
use rand::seq::SliceRandom;

/// A row is a candidate iff it has an address and no value yet.
pub fn is_candidate(row: &WalletRow) -> bool {
    row.has_address() && !row.has_value()
}

/// First candidate, optionally after shuffling the full row set.
pub fn find_candidate<R: Rng + ?Sized>(
    mut rows: Vec<WalletRow>,
    shuffle: bool,
    rng: &mut R,
) -> Option<WalletRow> {
    if shuffle {
        rows.shuffle(rng);
    }
    rows.into_iter().find(is_candidate)
}

/// Up to `count` candidates, optionally shuffled.
pub fn find_candidates<R: Rng + ?Sized>(
    rows: Vec<WalletRow>,
    shuffle: bool,
    count: usize,
    rng: &mut R,
) -> Vec<WalletRow> {
    let mut candidates: Vec<WalletRow> = rows.into_iter().filter(is_candidate).collect();
    if shuffle {
        candidates.shuffle(rng);
    }
    candidates.truncate(count);
    candidates
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    pub min: usize,
    pub max: usize,
}

impl BatchRange {
    pub fn new(min: usize, max: usize) -> Self {
        let min = min.max(1);
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub shuffle: bool,
    /// `None` picks a single row per poll.
    pub batch: Option<BatchRange>,
}

impl SelectionPolicy {
    pub fn single(shuffle: bool) -> Self {
        Self {
            shuffle,
            batch: None,
        }
    }

    pub fn batch(shuffle: bool, range: BatchRange) -> Self {
        Self {
            shuffle,
            batch: Some(range),
        }
    }

    pub fn select<R: Rng + ?Sized>(&self, rows: Vec<WalletRow>, rng: &mut R) -> Vec<WalletRow> {
        let total = rows.len();
        let picked = match self.batch {
            None => find_candidate(rows, self.shuffle, rng).into_iter().collect(),
            Some(range) => {
                let count = range.draw(rng);
                find_candidates(rows, self.shuffle, count, rng)
            }
        };
        tracing::debug!(target: "selector", total, picked = picked.len(), "Selected candidate rows");
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::CellValue;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn row(id: i64, address: Option<&str>, value: Option<CellValue>) -> WalletRow {
        WalletRow {
            id,
            address: address.map(str::to_string),
            value,
            ..Default::default()
        }
    }

    fn mixed_rows() -> Vec<WalletRow> {
        let mut rows = Vec::new();
        for id in 0..40 {
            let address = match id % 3 {
                0 => None,
                _ => Some("0xabc"),
            };
            let value = match id % 4 {
                0 => Some(CellValue::Number(1.0)),
                1 => Some(CellValue::Text("--".into())),
                _ => None,
            };
            rows.push(row(id, address, value));
        }
        rows
    }

    #[test]
    fn selector_never_returns_non_candidates() {
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            for policy in [
                SelectionPolicy::single(false),
                SelectionPolicy::single(true),
                SelectionPolicy::batch(true, BatchRange::new(2, 5)),
                SelectionPolicy::batch(false, BatchRange::new(40, 40)),
            ] {
                for picked in policy.select(mixed_rows(), &mut rng) {
                    assert!(picked.address.is_some(), "row {} has no address", picked.id);
                    assert!(picked.value.is_none(), "row {} already has a value", picked.id);
                }
            }
        }
    }

    #[test]
    fn single_pick_without_shuffle_returns_first_candidate() {
        let rows = vec![
            row(1, None, None),
            row(2, Some("0x2"), Some(CellValue::Number(0.0))),
            row(3, Some("0x3"), None),
            row(4, Some("0x4"), None),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let picked = find_candidate(rows, false, &mut rng).unwrap();
        assert_eq!(picked.id, 3);
    }

    #[test]
    fn no_candidates_yields_nothing() {
        let rows = vec![row(1, None, None), row(2, Some("0x2"), Some(CellValue::Number(3.0)))];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(find_candidate(rows.clone(), true, &mut rng).is_none());
        assert!(find_candidates(rows, true, 5, &mut rng).is_empty());
    }

    #[test]
    fn batch_is_capped_by_drawn_count() {
        let rows: Vec<WalletRow> = (0..10).map(|id| row(id, Some("0x1"), None)).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let picked = SelectionPolicy::batch(true, BatchRange::new(2, 5)).select(rows, &mut rng);
        assert!((2..=5).contains(&picked.len()));
    }

    #[test]
    fn batch_range_is_normalized() {
        let range = BatchRange::new(0, 0);
        assert_eq!(range, BatchRange { min: 1, max: 1 });
        let range = BatchRange::new(5, 2);
        assert_eq!(range, BatchRange { min: 5, max: 5 });
    }
}
