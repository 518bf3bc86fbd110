mod common;

use clio::decoder::{decode, encode, DecodeError};
use clio::model::{Address, HistoricalRecord, ADDRESS_LEN};
use clio::query::{query, query_by, QueryRequest};
use clio::schema::{HISTORICAL_RECORD_SIZE, HISTORICAL_RECORD_TAG, TAG_LEN};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const HEADER_END: usize = TAG_LEN + ADDRESS_LEN + 16;

fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; ADDRESS_LEN]>().prop_map(Address::new)
}

fn arb_record() -> impl Strategy<Value = HistoricalRecord> {
    (
        arb_address(),
        arb_address(),
        any::<i64>(),
        any::<i64>(),
        "[a-zA-Z0-9 àèéìòù']{0,20}",
        "[a-zA-Z0-9 ,.àèéìòù']{0,40}",
        prop::sample::select(vec!["Geopolitica", "Guerra", "Economia", "Trattati", "Cultura"]),
        "(https://[a-z]{1,20}\\.it)?",
    )
        .prop_map(
            |(address, author, uploaded_at, event_at, topic, description, category, source_url)| HistoricalRecord {
                address,
                author,
                uploaded_at,
                event_at,
                topic,
                description,
                category: category.to_owned(),
                source_url,
            },
        )
}

/// Records with distinct addresses and a narrow timestamp range so ties occur.
fn arb_record_set() -> impl Strategy<Value = Vec<HistoricalRecord>> {
    prop::collection::btree_map(any::<u8>(), (0i64..5, arb_record()), 0..24).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(seed, (uploaded_at, mut record))| {
                record.address = Address::new([seed; ADDRESS_LEN]);
                record.uploaded_at = uploaded_at;
                record
            })
            .collect()
    })
}

fn tagged(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    let n = len.min(TAG_LEN);
    bytes[..n].copy_from_slice(&HISTORICAL_RECORD_TAG[..n]);
    bytes
}

proptest! {
    #[test]
    fn decode_inverts_encode(record in arb_record()) {
        let bytes = encode(&record).unwrap();
        prop_assert_eq!(bytes.len(), HISTORICAL_RECORD_SIZE);
        prop_assert_eq!(decode(record.address, &bytes), Ok(record));
    }

    #[test]
    fn single_byte_edits_fail_or_re_encode_exactly(
        record in arb_record(),
        at in 0usize..HISTORICAL_RECORD_SIZE,
        value in any::<u8>(),
    ) {
        let mut bytes = encode(&record).unwrap();
        bytes[at] = value;
        match decode(record.address, &bytes) {
            Ok(decoded) => {
                prop_assert_eq!(encode(&decoded).unwrap(), bytes);
            }
            // author and timestamps take any bit pattern
            Err(error) => {
                prop_assert!(!(TAG_LEN..HEADER_END).contains(&at), "offset {} rejected: {}", at, error);
            }
        }
    }

    #[test]
    fn wrong_length_is_a_size_mismatch(len in 0usize..1100) {
        prop_assume!(len != HISTORICAL_RECORD_SIZE);
        let result = decode(Address::new([7; ADDRESS_LEN]), &tagged(len));
        if len < TAG_LEN {
            prop_assert_eq!(result, Err(DecodeError::TagMismatch("HistoricalRecord")));
        } else {
            prop_assert_eq!(
                result,
                Err(DecodeError::SizeMismatch { expected: HISTORICAL_RECORD_SIZE, actual: len })
            );
        }
    }

    #[test]
    fn filtering_twice_changes_nothing(
        records in arb_record_set(),
        category in prop::option::of(prop::sample::select(vec!["Guerra", "Trattati", "Tutti"])),
        search in prop::option::of("[a-e]{1,2}"),
    ) {
        let once = query_by(&records, category, search.as_deref()).unwrap();
        let twice = query_by(&once, None, None).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn order_ignores_input_order(records in arb_record_set(), seed in any::<u64>()) {
        let mut shuffled = records.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

        let request = QueryRequest::default();
        prop_assert_eq!(query(&shuffled, &request), query(&records, &request));
    }

    #[test]
    fn results_are_newest_first(records in arb_record_set()) {
        let hits = query(&records, &QueryRequest::default());
        prop_assert_eq!(hits.len(), records.len());
        for pair in hits.windows(2) {
            prop_assert!(
                pair[0].uploaded_at > pair[1].uploaded_at
                    || (pair[0].uploaded_at == pair[1].uploaded_at && pair[0].address < pair[1].address)
            );
        }
    }
}

#[test]
fn one_byte_short_buffer_does_not_panic() {
    let bytes = encode(&common::record(1, 10, "Guerra", "Caporetto")).unwrap();
    assert_eq!(
        decode(common::address(1), &bytes[..HISTORICAL_RECORD_SIZE - 1]),
        Err(DecodeError::SizeMismatch { expected: 522, actual: 521 })
    );
}

#[test]
fn edited_accounts_that_decode_re_encode_exactly() {
    let record = common::record(4, 1_700_000_400, "Trattati", "Trattato di Versailles");
    let clean = encode(&record).unwrap();
    let mut rng = StdRng::seed_from_u64(1919);

    let mut accepted = 0;
    for _ in 0..512 {
        let mut bytes = clean.clone();
        let at = rng.gen_range(0..bytes.len());
        bytes[at] = rng.gen();
        if let Ok(decoded) = decode(record.address, &bytes) {
            assert_eq!(encode(&decoded).unwrap(), bytes, "offset {at}");
            accepted += 1;
        }
    }
    assert!(accepted > 20, "only {accepted} of 512 edited accounts decoded");
    assert!(accepted < 512);
}
