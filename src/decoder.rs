//! Historical record account layout.
//!
//! Layout (little-endian, no padding between fields):
//! `[tag 8][author 32][uploaded_at i64][event_at i64]`
//! `[len u32][topic][len u32][description][len u32][category][len u32][source_url]`
//! followed by zero filler up to the fixed account size.

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::cursor::{ByteReader, ByteWriter, OutOfBounds};
use crate::model::{Address, HistoricalRecord, RawAccount, ADDRESS_LEN};
use crate::schema::{AccountSchema, TAG_LEN};

pub const TOPIC_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 280;

const FIXED_HEADER_LEN: usize = TAG_LEN + ADDRESS_LEN + 8 + 8;
const TEXT_FIELD_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("account tag does not match the {0} schema")]
    TagMismatch(&'static str),
    #[error("account is {actual} bytes, expected exactly {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("field `{0}` runs past the end of the account")]
    TruncatedField(&'static str),
    #[error("field `{0}` is not valid UTF-8")]
    InvalidText(&'static str),
    #[error("non-zero filler byte at offset {offset}")]
    NonZeroPadding { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("topic has {0} characters, at most {TOPIC_MAX_CHARS} allowed")]
    TopicTooLong(usize),
    #[error("description has {0} characters, at most {DESCRIPTION_MAX_CHARS} allowed")]
    DescriptionTooLong(usize),
    #[error("fields need {needed} bytes but the account holds {capacity}")]
    Overflow { needed: usize, capacity: usize },
}

fn truncated(field: &'static str) -> impl Fn(OutOfBounds) -> DecodeError {
    move |_| DecodeError::TruncatedField(field)
}

fn read_text(reader: &mut ByteReader<'_>, field: &'static str) -> Result<String, DecodeError> {
    let raw = reader.read_len_prefixed().map_err(truncated(field))?;
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|_| DecodeError::InvalidText(field))
}

/// The buffer must carry the record tag and be exactly the allocated size;
/// bytes after the last text field must be zero.
pub fn decode(address: Address, bytes: &[u8]) -> Result<HistoricalRecord, DecodeError> {
    let schema = AccountSchema::HistoricalRecord;
    if !schema.matches(bytes) {
        return Err(DecodeError::TagMismatch(schema.name()));
    }
    if bytes.len() != schema.size() {
        return Err(DecodeError::SizeMismatch {
            expected: schema.size(),
            actual: bytes.len(),
        });
    }

    let mut reader = ByteReader::new(bytes);
    reader.skip(TAG_LEN).map_err(truncated("tag"))?;
    let author = Address::new(reader.read_array().map_err(truncated("author"))?);
    let uploaded_at = reader.read_i64_le().map_err(truncated("uploaded_at"))?;
    let event_at = reader.read_i64_le().map_err(truncated("event_at"))?;
    let topic = read_text(&mut reader, "topic")?;
    let description = read_text(&mut reader, "description")?;
    let category = read_text(&mut reader, "category")?;
    let source_url = read_text(&mut reader, "source_url")?;

    if let Some(i) = reader.rest().iter().position(|b| *b != 0) {
        return Err(DecodeError::NonZeroPadding {
            offset: reader.position() + i,
        });
    }

    Ok(HistoricalRecord {
        address,
        author,
        uploaded_at,
        event_at,
        topic,
        description,
        category,
        source_url,
    })
}

pub fn encode(record: &HistoricalRecord) -> Result<Vec<u8>, EncodeError> {
    let schema = AccountSchema::HistoricalRecord;
    let texts = [
        record.topic.as_bytes(),
        record.description.as_bytes(),
        record.category.as_bytes(),
        record.source_url.as_bytes(),
    ];
    let needed = FIXED_HEADER_LEN
        + TEXT_FIELD_COUNT * 4
        + texts.iter().map(|t| t.len()).sum::<usize>();
    if needed > schema.size() {
        return Err(EncodeError::Overflow {
            needed,
            capacity: schema.size(),
        });
    }

    let mut writer = ByteWriter::with_capacity(schema.size());
    writer.write_bytes(schema.tag());
    writer.write_bytes(record.author.as_bytes());
    writer.write_i64_le(record.uploaded_at);
    writer.write_i64_le(record.event_at);
    for text in texts {
        // fits in u32: bounded by the size check above
        writer.write_u32_le(text.len() as u32);
        writer.write_bytes(text);
    }
    writer.zero_fill(schema.size());
    Ok(writer.finish())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub topic: String,
    pub description: String,
    pub category: String,
    pub event_at: i64,
    pub source_url: String,
}

impl RecordDraft {
    pub fn validate(&self) -> Result<(), EncodeError> {
        let topic_chars = self.topic.chars().count();
        if topic_chars > TOPIC_MAX_CHARS {
            return Err(EncodeError::TopicTooLong(topic_chars));
        }
        let description_chars = self.description.chars().count();
        if description_chars > DESCRIPTION_MAX_CHARS {
            return Err(EncodeError::DescriptionTooLong(description_chars));
        }
        Ok(())
    }

    pub fn into_record(
        self,
        address: Address,
        author: Address,
        uploaded_at: i64,
    ) -> Result<HistoricalRecord, EncodeError> {
        self.validate()?;
        let record = HistoricalRecord {
            address,
            author,
            uploaded_at,
            event_at: self.event_at,
            topic: self.topic,
            description: self.description,
            category: self.category,
            source_url: self.source_url,
        };
        // reject drafts the fixed allocation cannot hold
        encode(&record)?;
        Ok(record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeFailure {
    pub address: Address,
    #[serde(serialize_with = "serialize_display")]
    pub error: DecodeError,
}

fn serialize_display<S: Serializer>(error: &DecodeError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedBatch {
    pub records: Vec<HistoricalRecord>,
    /// Undecodable record accounts, in input order.
    pub failures: Vec<DecodeFailure>,
    /// Accounts of other schemas; skipped silently.
    pub foreign: usize,
}

/// Decode every recognised account; a bad account never aborts the batch.
pub fn decode_batch(accounts: &[RawAccount]) -> DecodedBatch {
    let mut batch = DecodedBatch::default();

    for account in accounts {
        match AccountSchema::identify(&account.bytes) {
            Some(AccountSchema::HistoricalRecord) => {}
            None => {
                batch.foreign += 1;
                continue;
            }
        }

        match decode(account.address, &account.bytes) {
            Ok(record) => {
                debug!(address = %account.address, topic = %record.topic, "decoded record");
                batch.records.push(record);
            }
            Err(error) => {
                warn!(address = %account.address, size = account.bytes.len(), %error, "skipping record account");
                batch.failures.push(DecodeFailure {
                    address: account.address,
                    error,
                });
            }
        }
    }

    batch
}
