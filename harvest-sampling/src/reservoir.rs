//! A bounded store of event records with unbiased random replacement.

use std::slice;

use harvest_event::EventRecord;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::RandomSource;

/// Largest capacity accepted by [`EventReservoir::new`].
pub const MAX_RESERVOIR_CAPACITY: usize = 10_000_000;

/// Raised if a reservoir cannot be created.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ReservoirError {
    /// The requested capacity is zero.
    #[error("reservoir capacity must be positive")]
    ZeroCapacity,
    /// The requested capacity exceeds [`MAX_RESERVOIR_CAPACITY`].
    #[error("reservoir capacity {capacity} exceeds the maximum of {max}")]
    CapacityTooLarge {
        /// The requested capacity.
        capacity: usize,
        /// The maximum allowed capacity.
        max: usize,
    },
}

/// The result of adding a record to an [`EventReservoir`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Admission {
    /// The reservoir had a free slot and the record was stored there.
    Appended,
    /// The reservoir was full and the record replaced the one at the given slot.
    Replaced(usize),
    /// The reservoir was full and the record was dropped.
    Discarded,
}

impl Admission {
    /// Returns `true` if the record is now stored in the reservoir.
    pub fn is_stored(self) -> bool {
        !matches!(self, Self::Discarded)
    }
}

/// A fixed capacity store of event records.
///
/// Until the reservoir is full, records are appended. Afterwards, every new record replaces a
/// random stored record with probability `capacity / seen` (Algorithm R). After `n` records have
/// been added, each one of them is present with the same probability `capacity / n`.
///
/// The reservoir is filled over one harvest cycle and then drained or discarded by the caller.
#[derive(Clone, Debug)]
pub struct EventReservoir {
    capacity: usize,
    records: Vec<EventRecord>,
    seen: u64,
}

impl EventReservoir {
    /// Creates an empty reservoir with the given capacity.
    ///
    /// Fails if the capacity is zero or larger than [`MAX_RESERVOIR_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self, ReservoirError> {
        if capacity == 0 {
            return Err(ReservoirError::ZeroCapacity);
        }

        if capacity > MAX_RESERVOIR_CAPACITY {
            return Err(ReservoirError::CapacityTooLarge {
                capacity,
                max: MAX_RESERVOIR_CAPACITY,
            });
        }

        Ok(Self {
            capacity,
            records: Vec::new(),
            seen: 0,
        })
    }

    /// Adds a record to the reservoir.
    ///
    /// Every call counts towards [`seen_count`](Self::seen_count). Once full, the replacement slot
    /// is drawn from all records seen so far, not just the stored ones, which keeps the sample
    /// uniform over the whole stream.
    pub fn add<R>(&mut self, record: EventRecord, rng: &mut R) -> Admission
    where
        R: RandomSource + ?Sized,
    {
        self.seen += 1;

        if self.records.len() < self.capacity {
            self.records.push(record);
            return Admission::Appended;
        }

        let slot = rng
            .uniform_int(self.seen)
            .and_then(|index| usize::try_from(index).ok())
            .filter(|&index| index < self.capacity);

        match slot {
            Some(index) => {
                self.records[index] = record;
                Admission::Replaced(index)
            }
            None => Admission::Discarded,
        }
    }

    /// Returns the stored record at the given slot, if it is occupied.
    pub fn get(&self, index: usize) -> Option<&EventRecord> {
        self.records.get(index)
    }

    /// Total number of records ever added.
    pub fn seen_count(&self) -> u64 {
        self.seen
    }

    /// Number of occupied slots.
    pub fn saved_count(&self) -> usize {
        self.records.len()
    }

    /// Number of records that were added but are no longer stored.
    pub fn dropped_count(&self) -> u64 {
        self.seen - self.records.len() as u64
    }

    /// The maximum number of stored records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if the reservoir is full and new records replace existing ones.
    pub fn is_sampling(&self) -> bool {
        self.records.len() == self.capacity
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the stored records in slot order.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Iterates over the stored records.
    pub fn iter(&self) -> slice::Iter<'_, EventRecord> {
        self.records.iter()
    }

    /// Replaces this reservoir with an empty one of the same capacity and returns the old one.
    pub fn take(&mut self) -> Self {
        let empty = Self {
            capacity: self.capacity,
            records: Vec::new(),
            seen: 0,
        };
        std::mem::replace(self, empty)
    }

    /// Consumes the reservoir and returns the stored records.
    pub fn into_records(self) -> Vec<EventRecord> {
        self.records
    }

    /// Serializes all stored records into a JSON array for transmission.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<'a> IntoIterator for &'a EventReservoir {
    type Item = &'a EventRecord;
    type IntoIter = slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for EventReservoir {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in &self.records {
            seq.serialize_element(record)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use harvest_event::Attributes;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::seeded_rng;

    fn record(name: &str) -> EventRecord {
        let mut intrinsics = Attributes::new();
        intrinsics.insert("name", name);
        EventRecord::new(intrinsics, Attributes::new(), Attributes::new())
    }

    fn name(record: &EventRecord) -> &str {
        record
            .intrinsics()
            .get("name")
            .and_then(|value| value.as_str())
            .unwrap()
    }

    #[test]
    fn test_create_rejects_bad_capacity() {
        assert_eq!(
            EventReservoir::new(0).unwrap_err(),
            ReservoirError::ZeroCapacity
        );
        assert_eq!(
            EventReservoir::new(MAX_RESERVOIR_CAPACITY + 1).unwrap_err(),
            ReservoirError::CapacityTooLarge {
                capacity: 10_000_001,
                max: 10_000_000,
            }
        );
        assert!(EventReservoir::new(MAX_RESERVOIR_CAPACITY).is_ok());
    }

    #[test]
    fn test_empty_reservoir() {
        let reservoir = EventReservoir::new(3).unwrap();
        assert!(reservoir.is_empty());
        assert!(!reservoir.is_sampling());
        assert_eq!(reservoir.seen_count(), 0);
        assert_eq!(reservoir.saved_count(), 0);
        assert_eq!(reservoir.capacity(), 3);
        assert_eq!(reservoir.get(0), None);
        assert_eq!(reservoir.to_json().unwrap(), "[]");
    }

    #[test]
    fn test_max_observed_bound() {
        let mut rng = seeded_rng(0);
        let mut reservoir = EventReservoir::new(2).unwrap();

        for n in ["a", "b", "c"] {
            reservoir.add(record(n), &mut rng);
        }

        assert_eq!(reservoir.saved_count(), 2);
        assert_eq!(reservoir.seen_count(), 3);
        assert_eq!(reservoir.dropped_count(), 1);
        assert!(reservoir.is_sampling());
        assert!(reservoir.get(2).is_none());
    }

    #[test]
    fn test_append_until_full() {
        let mut rng = seeded_rng(0);
        let mut reservoir = EventReservoir::new(3).unwrap();

        assert_eq!(reservoir.add(record("a"), &mut rng), Admission::Appended);
        assert_eq!(reservoir.add(record("b"), &mut rng), Admission::Appended);
        assert!(!reservoir.is_sampling());
        assert_eq!(reservoir.add(record("c"), &mut rng), Admission::Appended);
        assert!(reservoir.is_sampling());

        let names: Vec<_> = reservoir.iter().map(name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_replacement_matches_draw() {
        let mut rng = seeded_rng(5);
        let mut reservoir = EventReservoir::new(4).unwrap();

        for i in 0..50 {
            let admission = reservoir.add(record(&i.to_string()), &mut rng);
            match admission {
                Admission::Appended => assert!(i < 4),
                Admission::Replaced(slot) => {
                    assert_eq!(name(reservoir.get(slot).unwrap()), i.to_string());
                }
                Admission::Discarded => {
                    assert!(reservoir.iter().all(|r| name(r) != i.to_string()));
                }
            }
        }
    }

    #[test]
    fn test_capacity_invariant() {
        let mut rng = seeded_rng(11);
        let mut reservoir = EventReservoir::new(7).unwrap();

        for i in 0..1000u64 {
            reservoir.add(record("x"), &mut rng);
            assert!(reservoir.saved_count() <= reservoir.capacity());
            assert_eq!(reservoir.seen_count(), i + 1);
            assert!(reservoir.seen_count() >= reservoir.saved_count() as u64);
        }
    }

    #[test]
    fn test_uniform_split() {
        let mut rng = seeded_rng(2024);
        let mut reservoir = EventReservoir::new(100).unwrap();

        // The first half of the stream is "early", the second half "late".
        for i in 0..10_000 {
            let n = if i < 5_000 { "early" } else { "late" };
            reservoir.add(record(n), &mut rng);
        }

        let early = reservoir.iter().filter(|r| name(r) == "early").count();
        let late = reservoir.iter().filter(|r| name(r) == "late").count();
        assert_eq!(early + late, 100);
        assert!(early > 25, "early: {early}");
        assert!(late > 25, "late: {late}");
    }

    #[test]
    fn test_uniform_per_position() {
        const TRIALS: usize = 2_000;
        const STREAM: usize = 20;
        const CAPACITY: usize = 5;

        let mut rng = seeded_rng(7);
        let mut survived = [0usize; STREAM];

        for _ in 0..TRIALS {
            let mut reservoir = EventReservoir::new(CAPACITY).unwrap();
            for i in 0..STREAM {
                reservoir.add(record(&i.to_string()), &mut rng);
            }
            for r in &reservoir {
                let index: usize = name(r).parse().unwrap();
                survived[index] += 1;
            }
        }

        // Every position survives with probability 5 / 20, i.e. 500 times in expectation.
        for (index, count) in survived.iter().enumerate() {
            assert!((400..=600).contains(count), "position {index}: {count}");
        }
    }

    #[test]
    fn test_to_json() {
        let mut rng = seeded_rng(0);
        let mut reservoir = EventReservoir::new(2).unwrap();
        reservoir.add(record("a"), &mut rng);
        reservoir.add(record("b"), &mut rng);

        assert_eq!(
            reservoir.to_json().unwrap(),
            r#"[[{"name":"a"},{},{}],[{"name":"b"},{},{}]]"#
        );
    }

    #[test]
    fn test_take_resets() {
        let mut rng = seeded_rng(0);
        let mut reservoir = EventReservoir::new(2).unwrap();
        reservoir.add(record("a"), &mut rng);

        let taken = reservoir.take();
        assert_eq!(taken.saved_count(), 1);
        assert_eq!(reservoir.seen_count(), 0);
        assert!(reservoir.is_empty());
        assert_eq!(reservoir.capacity(), 2);
    }

    #[test]
    fn test_records_by_slot() {
        let mut rng = seeded_rng(3);
        let mut reservoir = EventReservoir::new(2).unwrap();
        assert!(reservoir.records().is_empty());

        reservoir.add(record("a"), &mut rng);
        reservoir.add(record("b"), &mut rng);
        let names: Vec<_> = reservoir.records().iter().map(name).collect();
        assert_eq!(names, vec!["a", "b"]);

        for i in 0..20 {
            if let Admission::Replaced(slot) = reservoir.add(record(&i.to_string()), &mut rng) {
                assert_eq!(name(&reservoir.records()[slot]), i.to_string());
            }
            assert_eq!(reservoir.records().len(), reservoir.saved_count());
        }
    }

    #[test]
    fn test_into_records() {
        let mut rng = seeded_rng(0);
        let mut reservoir = EventReservoir::new(2).unwrap();
        reservoir.add(record("a"), &mut rng);

        let records = reservoir.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(name(&records[0]), "a");
    }
}
