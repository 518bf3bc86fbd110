use chrono::{DateTime, Datelike, Utc};

use crate::model::HistoricalRecord;

const MONTHS: [&str; 12] = [
    "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno",
    "luglio", "agosto", "settembre", "ottobre", "novembre", "dicembre",
];

/// Long Italian date (`28 giugno 1919`) for unix seconds, in UTC.
/// Out-of-range timestamps fall back to the raw number.
pub fn long_date(unix_secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(unix_secs, 0) {
        Some(dt) => format!("{} {} {}", dt.day(), MONTHS[dt.month0() as usize], dt.year()),
        None => unix_secs.to_string(),
    }
}

pub fn render_record(record: &HistoricalRecord) -> String {
    let mut out = format!(
        "  \u{2022} {}  [{}]\n    evento: {} | archiviato: {} | autore: {}\n",
        record.topic,
        record.category,
        long_date(record.event_at),
        long_date(record.uploaded_at),
        record.author.short(),
    );
    if !record.description.is_empty() {
        out.push_str(&format!("    {}\n", record.description));
    }
    if let Some(url) = record.source_link() {
        out.push_str(&format!("    fonte: {}\n", url));
    }
    out.push_str(&format!("    account: {}\n", record.address));
    out
}
