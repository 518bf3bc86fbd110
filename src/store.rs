use std::sync::{Arc, PoisonError, RwLock};

use crate::model::{Address, HistoricalRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record address {0} appears more than once in the batch")]
    DuplicateAddress(Address),
}

/// Readers get an immutable snapshot; `replace_all` swaps the whole set
/// under the write lock, so a reader sees either the old or the new set.
/// Snapshots iterate in address order.
#[derive(Debug)]
pub struct RecordStore {
    records: RwLock<Arc<[HistoricalRecord]>>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Replace the held set. A batch with a repeated address is rejected
    /// as a whole and the previous set stays in place.
    pub fn replace_all(&self, mut records: Vec<HistoricalRecord>) -> Result<usize, StoreError> {
        records.sort_by(|a, b| a.address.cmp(&b.address));
        if let Some(pair) = records.windows(2).find(|w| w[0].address == w[1].address) {
            return Err(StoreError::DuplicateAddress(pair[0].address));
        }

        let count = records.len();
        let snapshot: Arc<[HistoricalRecord]> = records.into();
        // only whole Arcs are ever written, so a poisoned lock still holds a consistent set
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        Ok(count)
    }

    pub fn all(&self) -> Arc<[HistoricalRecord]> {
        self.records.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn get(&self, address: &Address) -> Option<HistoricalRecord> {
        let records = self.all();
        records
            .binary_search_by(|r| r.address.cmp(address))
            .ok()
            .map(|i| records[i].clone())
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ADDRESS_LEN;

    fn record(seed: u8) -> HistoricalRecord {
        HistoricalRecord {
            address: Address::new([seed; ADDRESS_LEN]),
            author: Address::new([0xEE; ADDRESS_LEN]),
            uploaded_at: i64::from(seed) * 100,
            event_at: 0,
            topic: format!("topic {seed}"),
            description: String::new(),
            category: "Cultura".into(),
            source_url: String::new(),
        }
    }

    fn addresses(store: &RecordStore) -> Vec<Address> {
        store.all().iter().map(|r| r.address).collect()
    }

    #[test]
    fn starts_empty() {
        let store = RecordStore::new();
        assert!(store.is_empty());
        assert!(store.all().is_empty());
    }

    #[test]
    fn second_replace_drops_the_first_set() {
        let store = RecordStore::new();
        store.replace_all(vec![record(1), record(2)]).unwrap();
        store.replace_all(vec![record(3), record(4)]).unwrap();

        assert_eq!(
            addresses(&store),
            vec![Address::new([3; ADDRESS_LEN]), Address::new([4; ADDRESS_LEN])]
        );
        assert_eq!(store.get(&Address::new([1; ADDRESS_LEN])), None);
    }

    #[test]
    fn duplicate_address_rejects_batch_and_keeps_old_set() {
        let store = RecordStore::new();
        store.replace_all(vec![record(1)]).unwrap();

        let mut twin = record(2);
        twin.topic = "other".into();
        let err = store.replace_all(vec![record(2), record(5), twin]).unwrap_err();

        assert_eq!(err, StoreError::DuplicateAddress(Address::new([2; ADDRESS_LEN])));
        assert_eq!(addresses(&store), vec![Address::new([1; ADDRESS_LEN])]);
    }

    #[test]
    fn iteration_order_is_by_address_not_insertion() {
        let store = RecordStore::new();
        store.replace_all(vec![record(9), record(3), record(6)]).unwrap();
        let seeds: Vec<u8> = store.all().iter().map(|r| r.address.0[0]).collect();
        assert_eq!(seeds, vec![3, 6, 9]);
    }

    #[test]
    fn snapshot_outlives_replacement() {
        let store = RecordStore::new();
        store.replace_all(vec![record(1)]).unwrap();
        let before = store.all();
        store.replace_all(vec![record(2), record(3)]).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&Address::new([3; ADDRESS_LEN])), Some(record(3)));
    }

    #[test]
    fn concurrent_readers_never_see_a_mixed_set() {
        let store = Arc::new(RecordStore::new());
        store.replace_all(vec![record(1), record(2)]).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for round in 0..200u8 {
                    let batch = if round % 2 == 0 {
                        vec![record(10), record(11), record(12)]
                    } else {
                        vec![record(1), record(2)]
                    };
                    store.replace_all(batch).unwrap();
                }
            })
        };

        for _ in 0..200 {
            let seeds: Vec<u8> = store.all().iter().map(|r| r.address.0[0]).collect();
            assert!(seeds == vec![1, 2] || seeds == vec![10, 11, 12], "torn read: {seeds:?}");
        }
        writer.join().unwrap();
    }
}
