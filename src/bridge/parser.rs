//! Result parser: captured script text to typed values.
//!
//! Decoding is total. Lines or items that match nothing are skipped, so an
//! unexpected format yields fewer results rather than an error.

use std::collections::BTreeMap;

use serde::Serialize;

pub const LIST_DELIMITER: char = '|';
pub const PAIR_SEPARATOR: char = ':';
pub const ERROR_SENTINEL: &str = "ERROR";
/// Value reported for keys whose script-side lookup failed.
pub const UNAVAILABLE: i64 = -1;

const UNREAD_MARKER: char = '✉';
const READ_MARKER: char = '✓';
const BANNER_MARKERS: [char; 4] = ['=', '━', '📧', '⚠'];
const END_OF_LIST: &str = "TOTAL EMAILS";

/// One message as listed by a script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailRecord {
    pub subject: String,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Split `a|b|c` into its items. Empty input has no items.
pub fn decode_list(stdout: &str) -> Vec<String> {
    if stdout.is_empty() {
        return Vec::new();
    }
    stdout.split(LIST_DELIMITER).map(str::to_string).collect()
}

/// Split each list item on its first `:`. Items without one are dropped.
pub fn decode_pairs(stdout: &str) -> Vec<(String, String)> {
    decode_list(stdout)
        .into_iter()
        .filter_map(|item| {
            item.split_once(PAIR_SEPARATOR)
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

/// Decode `key:count` pairs; `ERROR` and non-numeric values become
/// [`UNAVAILABLE`].
pub fn decode_counts(stdout: &str) -> BTreeMap<String, i64> {
    decode_pairs(stdout)
        .into_iter()
        .map(|(k, v)| {
            let n = if v == ERROR_SENTINEL {
                UNAVAILABLE
            } else {
                v.trim().parse().unwrap_or(UNAVAILABLE)
            };
            (k, n)
        })
        .collect()
}

/// Decode the marker-based message listing into records.
pub fn decode_records(stdout: &str) -> Vec<EmailRecord> {
    let mut records = Vec::new();
    let mut open: Option<EmailRecord> = None;

    for raw in stdout.split(['\n', '\r']) {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(BANNER_MARKERS) {
            continue;
        }

        if let Some((is_read, rest)) = record_start(line) {
            records.extend(open.take());
            open = Some(EmailRecord {
                subject: rest.trim().to_string(),
                is_read,
                ..Default::default()
            });
        } else if line.starts_with(END_OF_LIST) {
            break;
        } else if let Some(rec) = open.as_mut() {
            if let Some(v) = field(line, "From:") {
                rec.sender = Some(v);
            } else if let Some(v) = field(line, "Date:") {
                rec.date = Some(v);
            } else if let Some(v) = field(line, "Preview:") {
                rec.preview = Some(v);
            }
        }
    }

    records.extend(open);
    records
}

fn record_start(line: &str) -> Option<(bool, &str)> {
    if let Some(rest) = line.strip_prefix(UNREAD_MARKER) {
        Some((false, rest))
    } else {
        line.strip_prefix(READ_MARKER).map(|rest| (true, rest))
    }
}

fn field(line: &str, prefix: &str) -> Option<String> {
    line.strip_prefix(prefix).map(|v| v.trim().to_string())
}
