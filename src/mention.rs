//! `@Sheet!A1` and `@Sheet!A1:B3` mentions in chat text.
//!
//! Sheet names are `[A-Za-z0-9_]+` and kept verbatim; cell parts are
//! uppercased. Mentions are parsed out of message text on every render and
//! never stored on their own.

use crate::error::{EngineError, Result};
use crate::model::Mention;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

static MENTION_EXACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@?([A-Za-z0-9_]+)!([A-Za-z]+[0-9]+)(?::([A-Za-z]+[0-9]+))?$")
        .expect("mention pattern is valid")
});

static MENTION_SCAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([A-Za-z0-9_]+)!([A-Za-z]+[0-9]+)(?::([A-Za-z]+[0-9]+))?")
        .expect("mention pattern is valid")
});

/// A mention located in a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionMatch {
    pub mention: Mention,
    /// Matched text including the leading `@`.
    pub raw: String,
    /// Byte range of `raw` within the scanned text.
    pub span: Range<usize>,
}

fn from_captures(caps: &Captures<'_>) -> Mention {
    let end_cell = caps.get(3).map(|m| m.as_str().to_ascii_uppercase());
    Mention {
        sheet: caps[1].to_string(),
        start_cell: caps[2].to_ascii_uppercase(),
        is_range: end_cell.is_some(),
        end_cell,
    }
}

/// Parses a whole string as one mention; the leading `@` is optional.
pub fn parse_mention(text: &str) -> Result<Mention> {
    MENTION_EXACT
        .captures(text)
        .map(|caps| from_captures(&caps))
        .ok_or_else(|| EngineError::InvalidMention {
            text: text.to_string(),
        })
}

/// All non-overlapping mentions in order of appearance.
pub fn extract_mentions(text: &str) -> Vec<Mention> {
    MENTION_SCAN
        .captures_iter(text)
        .map(|caps| from_captures(&caps))
        .collect()
}

pub fn find_mentions(text: &str) -> Vec<MentionMatch> {
    MENTION_SCAN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(MentionMatch {
                mention: from_captures(&caps),
                raw: whole.as_str().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

pub fn has_mentions(text: &str) -> bool {
    MENTION_SCAN.is_match(text)
}

/// Rewrites each mention with `formatter(parsed, raw)`; other text is kept.
pub fn replace_mentions<F>(text: &str, mut formatter: F) -> String
where
    F: FnMut(&Mention, &str) -> String,
{
    MENTION_SCAN
        .replace_all(text, |caps: &Captures<'_>| {
            let mention = from_captures(caps);
            formatter(&mention, &caps[0])
        })
        .into_owned()
}

/// Canonical mention text. An end equal to the start collapses to a single
/// cell.
pub fn format_mention(sheet: &str, start_cell: &str, end_cell: Option<&str>) -> String {
    let start = start_cell.to_ascii_uppercase();
    match end_cell {
        Some(end) if !end.eq_ignore_ascii_case(start_cell) => {
            format!("@{}!{}:{}", sheet, start, end.to_ascii_uppercase())
        }
        _ => format!("@{}!{}", sheet, start),
    }
}

pub fn format_range_mention(mention: &Mention) -> String {
    format_mention(
        &mention.sheet,
        &mention.start_cell,
        mention.end_cell.as_deref(),
    )
}
