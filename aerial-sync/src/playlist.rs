//! Extended playlist parsing
//!
//! Turns an `#EXTM3U` document into raw entries: a location URI plus the
//! attribute block from the preceding `#EXTINF` line.

use std::collections::HashMap;

use aerial_common::{Error, Result};

/// One parsed playlist entry, not yet categorized
#[derive(Debug, Clone)]
pub struct RawEntry {
    /// URI of the media resource
    pub location: String,
    /// `key=value` attributes from the `#EXTINF` line, keys lowercased
    pub attributes: HashMap<String, String>,
}

/// Parse playlist text into entries in file order
///
/// Entries with missing attributes are kept as-is. An `#EXTINF` line with
/// no following location is dropped, as is a location with no preceding
/// `#EXTINF` - neither is an error. Only a document without an `#EXTM3U`
/// header fails: without it there is no bounded set of entries to
/// identify.
pub fn parse_playlist(text: &str) -> Result<Vec<RawEntry>> {
    let header = text.lines().map(str::trim).find(|line| !line.is_empty());
    match header {
        Some(line) if line.starts_with("#EXTM3U") => {}
        _ => return Err(Error::Parse("Missing #EXTM3U header".to_string())),
    }

    let mut entries = Vec::new();
    let mut pending: Option<HashMap<String, String>> = None;

    for line in text.lines() {
        let line = line.trim();

        if let Some(info) = line.strip_prefix("#EXTINF:") {
            let mut attributes = HashMap::new();
            extract_attrs(info, &mut attributes);
            pending = Some(attributes);
        } else if !line.is_empty() && !line.starts_with('#') {
            // Location line; only meaningful with a preceding #EXTINF.
            if let Some(attributes) = pending.take() {
                entries.push(RawEntry {
                    location: line.to_string(),
                    attributes,
                });
            }
        }
    }

    Ok(entries)
}

/// Scan `key=value` attributes from an `#EXTINF` info line
///
/// Values may be quoted (honoring `\"` escapes) or bare. The leading
/// duration field and the `,Display Name` tail are not attributes.
fn extract_attrs(info: &str, attrs: &mut HashMap<String, String>) {
    let mut chars = info.chars().peekable();

    // Leading duration field, e.g. "-1" or "0.5"
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit() || *c == '-' || *c == '.') {
        chars.next();
    }

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }

        let mut key = String::new();
        loop {
            match chars.next() {
                Some('=') => break,
                // Reached the ",Display Name" tail: no more attributes.
                Some(',') | None => return,
                Some(c) => key.push(c),
            }
        }
        let key = key.trim().to_lowercase();

        let value = match chars.peek() {
            Some('"') => {
                chars.next();
                let mut value = String::new();
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' if chars.peek() == Some(&'"') => {
                            value.push('"');
                            chars.next();
                        }
                        _ => value.push(c),
                    }
                }
                value
            }
            Some(_) => {
                let mut value = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == ',' {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
                value
            }
            None => String::new(),
        };

        if !key.is_empty() {
            attrs.insert(key, value);
        }
    }
}
