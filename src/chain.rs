use crate::error::{ChainError, Result};
use crate::record::{Record, RecordHash, GENESIS_PREDECESSOR};
use log::{debug, info, warn};
use serde::Serialize;

/// Payload of the first record in every chain.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// An append-only, hash-linked sequence of records.
///
/// Positions are 1-based everywhere in the public API. Validity is never
/// cached: a repair of record `k` can change the answer for record `k + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    records: Vec<Record>,
}

/// Snapshot of one record for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecordView {
    pub index: usize,
    pub payload: String,
    pub predecessor_hash: RecordHash,
    pub stored_hash: RecordHash,
    pub computed_hash: RecordHash,
    pub valid: bool,
}

impl Chain {
    /// Create a chain holding only the genesis record.
    pub fn new() -> Self {
        let genesis = Record::new(1, GENESIS_PAYLOAD.into(), GENESIS_PREDECESSOR.into());
        debug!("genesis record {}", genesis.hash);
        Self {
            records: vec![genesis],
        }
    }

    /// Append a record linked to the current last record's stored hash.
    pub fn append(&mut self, payload: &str) -> &Record {
        let predecessor_hash = self.last().hash.clone();
        let record = Record::new(self.records.len() + 1, payload.into(), predecessor_hash);
        debug!(
            "appended record {} [{}] -> {}",
            record.index, record.hash, record.predecessor_hash
        );
        self.records.push(record);
        self.last()
    }

    /// Corrupt a record: replace its payload and stamp an arbitrary hash.
    ///
    /// The marker is stored as given; nothing checks that it differs from the
    /// real digest.
    pub fn tamper(&mut self, index: usize, payload: &str, marker: &str) -> Result<()> {
        let pos = self.position(index)?;
        let record = &mut self.records[pos];
        record.payload = payload.into();
        record.hash = marker.into();
        warn!("record {} tampered", index);
        Ok(())
    }

    /// Whether the record at `index` is self-consistent and linked to its
    /// predecessor's current hash. Genesis only checks itself.
    pub fn is_record_valid(&self, index: usize) -> Result<bool> {
        let pos = self.position(index)?;
        Ok(self.valid_at(pos))
    }

    /// Whether every record is valid.
    pub fn is_valid(&self) -> bool {
        (0..self.records.len()).all(|pos| self.valid_at(pos))
    }

    /// Recompute one record's hash, relinking it to its predecessor first.
    ///
    /// Only the record at `index` changes. Later records that point at the
    /// old hash stay broken until they are repaired too.
    pub fn repair(&mut self, index: usize) -> Result<&Record> {
        let pos = self.position(index)?;
        if pos > 0 {
            let predecessor_hash = self.records[pos - 1].hash.clone();
            self.records[pos].predecessor_hash = predecessor_hash;
        }
        let record = &mut self.records[pos];
        record.hash = record.compute_hash();
        info!("repaired record {} -> {}", index, record.hash);
        Ok(&self.records[pos])
    }

    /// Number of records, genesis included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false: a chain starts with its genesis record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Result<&Record> {
        let pos = self.position(index)?;
        Ok(&self.records[pos])
    }

    pub fn last(&self) -> &Record {
        // The genesis record is never removed.
        &self.records[self.records.len() - 1]
    }

    /// Lowest index whose record is currently invalid.
    pub fn first_invalid(&self) -> Option<usize> {
        (0..self.records.len())
            .find(|&pos| !self.valid_at(pos))
            .map(|pos| pos + 1)
    }

    pub fn valid_count(&self) -> usize {
        (0..self.records.len())
            .filter(|&pos| self.valid_at(pos))
            .count()
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.valid_count(), self.len())
    }

    /// Display snapshots of every record, validity evaluated fresh.
    pub fn views(&self) -> Vec<RecordView> {
        self.records
            .iter()
            .enumerate()
            .map(|(pos, r)| RecordView {
                index: r.index,
                payload: r.payload.clone(),
                predecessor_hash: r.predecessor_hash.clone(),
                stored_hash: r.hash.clone(),
                computed_hash: r.compute_hash(),
                valid: self.valid_at(pos),
            })
            .collect()
    }

    // ── Internal ──────────────────────────────────────────────

    fn position(&self, index: usize) -> Result<usize> {
        if index == 0 || index > self.records.len() {
            return Err(ChainError::OutOfRangeIndex {
                index,
                len: self.records.len(),
            });
        }
        Ok(index - 1)
    }

    fn valid_at(&self, pos: usize) -> bool {
        let record = &self.records[pos];
        record.verify() && (pos == 0 || record.predecessor_hash == self.records[pos - 1].hash)
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

/// How much of the chain is currently valid.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Progress {
    pub valid: usize,
    pub total: usize,
    /// Truncated, 0..=100.
    pub percent: u8,
}

impl Progress {
    pub fn new(valid: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (valid * 100 / total) as u8
        };
        Self {
            valid,
            total,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.valid == self.total
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const WIDTH: usize = 20;
        let filled = usize::from(self.percent) * WIDTH / 100;
        write!(
            f,
            "[{}{}] {:>3}% ({}/{} valid)",
            "#".repeat(filled),
            "-".repeat(WIDTH - filled),
            self.percent,
            self.valid,
            self.total
        )
    }
}
