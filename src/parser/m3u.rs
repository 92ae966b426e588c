use std::collections::HashMap;
use std::io::BufRead;

use regex::Regex;

use super::{ParseError, PlaylistParser};
use crate::models::Entry;

const HEADER: &str = "#EXTM3U";
const EXTINF: &str = "#EXTINF:";
const EXTGRP: &str = "#EXTGRP:";
const BOM: &[u8] = b"\xef\xbb\xbf";
/// Leading whitespace allowed before a document is rejected unseen.
const SNIFF_LIMIT: usize = 64 * 1024;

/// Extended M3U parser (`#EXTM3U` / `#EXTINF` / `#EXTGRP`).
pub struct M3uParser {
    attribute_re: Regex,
}

#[derive(Default)]
struct PendingInfo {
    title: String,
    attributes: HashMap<String, String>,
    group: Option<String>,
}

impl M3uParser {
    pub fn new() -> Self {
        let attribute_re = Regex::new(r#"([A-Za-z0-9_-]+)="([^"]*)""#)
            .expect("attribute pattern is valid");
        Self { attribute_re }
    }

    fn parse_extinf(&self, line: &str, info: &mut PendingInfo) {
        let body = &line[EXTINF.len()..];
        let (attributes, title) = split_title(body);

        info.title = title.trim().to_string();
        info.attributes = self
            .attribute_re
            .captures_iter(attributes)
            .map(|cap| (cap[1].to_ascii_lowercase(), cap[2].trim().to_string()))
            .collect();
    }
}

impl Default for M3uParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaylistParser for M3uParser {
    fn parse(&self, input: &mut dyn BufRead) -> Result<Vec<Entry>, ParseError> {
        let mut entries = Vec::new();
        let mut seen_header = false;
        let mut pending = PendingInfo::default();

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_start_matches('\u{feff}').trim();
            if line.is_empty() {
                continue;
            }

            if !seen_header {
                if !line.starts_with(HEADER) {
                    return Err(ParseError::UnrecognizedFormat);
                }
                seen_header = true;
                continue;
            }

            if line.starts_with(EXTINF) {
                self.parse_extinf(line, &mut pending);
            } else if let Some(group) = line.strip_prefix(EXTGRP) {
                pending.group = Some(group.trim().to_string());
            } else if line.starts_with('#') {
                continue;
            } else {
                let info = std::mem::take(&mut pending);
                entries.push(build_entry(info, line));
            }
        }

        if !seen_header {
            return Err(ParseError::UnrecognizedFormat);
        }

        tracing::debug!("Parsed {} playlist entries", entries.len());
        Ok(entries)
    }

    fn sniff(&self, head: &[u8]) -> Option<bool> {
        if BOM.starts_with(head) {
            return None;
        }
        let head = head.strip_prefix(BOM).unwrap_or(head);
        let Some(start) = head.iter().position(|b| !b.is_ascii_whitespace()) else {
            return (head.len() >= SNIFF_LIMIT).then_some(false);
        };

        let rest = &head[start..];
        let n = rest.len().min(HEADER.len());
        if rest[..n] != HEADER.as_bytes()[..n] {
            Some(false)
        } else if n == HEADER.len() {
            Some(true)
        } else {
            None
        }
    }
}

fn build_entry(mut info: PendingInfo, url: &str) -> Entry {
    let group = info
        .attributes
        .remove("group-title")
        .filter(|g| !g.is_empty())
        .or(info.group)
        .unwrap_or_default();
    let cover = info.attributes.remove("tvg-logo").filter(|c| !c.is_empty());
    let title = if !info.title.is_empty() {
        info.title
    } else {
        info.attributes
            .remove("tvg-name")
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| url.to_string())
    };

    Entry {
        title,
        url: url.to_string(),
        group,
        cover,
    }
}

/// Split `#EXTINF` content at the first comma that is not inside quotes.
fn split_title(body: &str) -> (&str, &str) {
    let mut quoted = false;
    for (i, c) in body.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => return (&body[..i], &body[i + 1..]),
            _ => {}
        }
    }
    (body, "")
}
