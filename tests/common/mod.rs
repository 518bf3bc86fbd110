#![allow(dead_code)]

use clio::decoder::{encode, RecordDraft};
use clio::model::{Address, HistoricalRecord, RawAccount, ADDRESS_LEN};

pub fn address(seed: u8) -> Address {
    Address::new([seed; ADDRESS_LEN])
}

pub fn record(seed: u8, uploaded_at: i64, category: &str, topic: &str) -> HistoricalRecord {
    RecordDraft {
        topic: topic.into(),
        description: format!("Scheda di archivio per {topic}."),
        category: category.into(),
        event_at: -1_594_080_000,
        source_url: String::new(),
    }
    .into_record(address(seed), address(0xA0), uploaded_at)
    .expect("fixture draft fits")
}

pub fn account(record: &HistoricalRecord) -> RawAccount {
    RawAccount::new(record.address, encode(record).expect("fixture record fits"))
}

/// Five records across three categories, as published on devnet.
pub fn sample_records() -> Vec<HistoricalRecord> {
    vec![
        record(1, 1_700_000_100, "Guerra", "Battaglia di Caporetto"),
        record(2, 1_700_000_300, "Economia", "Piano Marshall"),
        record(3, 1_700_000_200, "Guerra", "Sbarco in Sicilia"),
        record(4, 1_700_000_400, "Trattati", "Trattato di Versailles"),
        record(5, 1_700_000_400, "Trattati", "Trattato di Lisbona"),
    ]
}
