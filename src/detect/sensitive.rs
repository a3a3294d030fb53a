//! Flags substrings of recognized text that should be redacted.
//!
//! Two families run over the same text: fixed regular expressions for machine
//! secrets, then looser heuristics for personal details. Their outputs are
//! concatenated as-is. Overlapping and duplicate ranges are kept; the overlay that
//! consumes them redacts the union.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensitiveKind {
    Email,
    IpAddress,
    ApiKey,
    PhoneNumber,
    Address,
    Link,
}

/// Half-open `[start, end)` span in *character* offsets of the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveRange {
    pub start: usize,
    pub end: usize,
    pub kind: SensitiveKind,
}

impl SensitiveRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The covered substring of `text`.
    pub fn extract(&self, text: &str) -> String {
        text.chars().skip(self.start).take(self.len()).collect()
    }
}

struct Detector {
    kind: SensitiveKind,
    regex: Regex,
}

fn compile(kind: SensitiveKind, pattern: &str) -> Detector {
    Detector {
        kind,
        regex: Regex::new(pattern).expect("built-in detector pattern must compile"),
    }
}

fn pattern_family() -> &'static [Detector] {
    static PATTERNS: OnceLock<Vec<Detector>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            compile(
                SensitiveKind::Email,
                r"[A-Z0-9a-z._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}",
            ),
            compile(SensitiveKind::IpAddress, r"\b(?:\d{1,3}\.){3}\d{1,3}\b"),
            compile(
                SensitiveKind::ApiKey,
                r"sk_live_[0-9a-zA-Z]{24,}|ghp_[0-9a-zA-Z]{36}",
            ),
        ]
    })
}

fn heuristic_family() -> &'static [Detector] {
    static HEURISTICS: OnceLock<Vec<Detector>> = OnceLock::new();
    HEURISTICS.get_or_init(|| {
        vec![
            compile(
                SensitiveKind::PhoneNumber,
                r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{3}\)\s?|\b\d{3}[\s.-]?)\d{3}[\s.-]?\d{4}\b",
            ),
            compile(
                SensitiveKind::Address,
                concat!(
                    r"\b\d{1,6}\s+(?:[A-Z][A-Za-z]*\.?\s+){1,4}",
                    r"(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl|Terrace|Parkway|Pkwy|Highway|Hwy)\b\.?",
                    r"(?:,?\s+(?:Apt|Suite|Unit)\.?\s*[A-Za-z0-9-]+)?",
                    r"(?:,\s*[A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*,?\s+[A-Z]{2}(?:\s+\d{5}(?:-\d{4})?)?)?",
                ),
            ),
            compile(
                SensitiveKind::Link,
                r#"(?i)\b(?:[a-z][a-z0-9+.-]*://|www\.)[^\s<>"']*[^\s<>"'.,;:!?)\]]"#,
            ),
        ]
    })
}

/// Maps byte offsets produced by the regex engine to character offsets.
struct CharOffsets {
    byte_starts: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        Self {
            byte_starts: text.char_indices().map(|(idx, _)| idx).collect(),
        }
    }

    fn char_index(&self, byte: usize) -> usize {
        match self.byte_starts.binary_search(&byte) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }
}

fn scan(detectors: &[Detector], text: &str, offsets: &CharOffsets) -> Vec<SensitiveRange> {
    let mut ranges = Vec::new();
    for detector in detectors {
        for found in detector.regex.find_iter(text) {
            ranges.push(SensitiveRange {
                start: offsets.char_index(found.start()),
                end: offsets.char_index(found.end()),
                kind: detector.kind,
            });
        }
    }
    ranges
}

/// Every sensitive span in `text`: pattern matches first (by pattern, then position),
/// followed by heuristic matches in text order.
pub fn detect_sensitive_ranges(text: &str) -> Vec<SensitiveRange> {
    if text.is_empty() {
        return Vec::new();
    }

    let offsets = CharOffsets::new(text);

    let mut ranges = scan(pattern_family(), text, &offsets);

    let mut heuristics = scan(heuristic_family(), text, &offsets);
    heuristics.sort_by_key(|range| (range.start, range.kind, range.end));
    ranges.extend(heuristics);

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_covering<'a>(
        text: &str,
        ranges: &'a [SensitiveRange],
        needle: &str,
    ) -> Vec<&'a SensitiveRange> {
        ranges
            .iter()
            .filter(|range| range.extract(text) == needle)
            .collect()
    }

    #[test]
    fn finds_email_and_phone_with_exact_bounds() {
        let text = "contact me at a@b.com or call 555-123-4567";
        let ranges = detect_sensitive_ranges(text);

        let email = kinds_covering(text, &ranges, "a@b.com");
        assert!(email.iter().any(|range| range.kind == SensitiveKind::Email));
        assert_eq!(email[0].start, text.find("a@b.com").unwrap());

        let phone = kinds_covering(text, &ranges, "555-123-4567");
        assert!(phone
            .iter()
            .any(|range| range.kind == SensitiveKind::PhoneNumber));
    }

    #[test]
    fn detection_is_idempotent() {
        let text = "ping 10.0.0.1, mail ops@example.org, see https://example.org/x.";
        assert_eq!(detect_sensitive_ranges(text), detect_sensitive_ranges(text));
    }

    #[test]
    fn overlapping_ranges_are_kept() {
        let text = "admin panel at http://192.168.1.20/login";
        let ranges = detect_sensitive_ranges(text);

        let ip = ranges
            .iter()
            .find(|range| range.kind == SensitiveKind::IpAddress)
            .unwrap();
        let link = ranges
            .iter()
            .find(|range| range.kind == SensitiveKind::Link)
            .unwrap();

        assert_eq!(ip.extract(text), "192.168.1.20");
        assert_eq!(link.extract(text), "http://192.168.1.20/login");
        assert!(link.start < ip.start && ip.end <= link.end);
    }

    #[test]
    fn pattern_family_is_emitted_before_heuristics() {
        let text = "call (555) 123-4567 then email x@y.io";
        let ranges = detect_sensitive_ranges(text);

        assert_eq!(ranges[0].kind, SensitiveKind::Email);
        assert_eq!(ranges[1].kind, SensitiveKind::PhoneNumber);
        assert_eq!(ranges[1].extract(text), "(555) 123-4567");
    }

    #[test]
    fn recognizes_known_api_key_prefixes() {
        let stripe = format!("sk_live_{}", "a1B2c3D4e5F6g7H8i9J0k1L2");
        let github = format!("ghp_{}", "A".repeat(36));
        let text = format!("STRIPE={stripe}\nGH={github}");
        let ranges = detect_sensitive_ranges(&text);

        let keys: Vec<String> = ranges
            .iter()
            .filter(|range| range.kind == SensitiveKind::ApiKey)
            .map(|range| range.extract(&text))
            .collect();
        assert_eq!(keys, vec![stripe, github]);
    }

    #[test]
    fn short_key_lookalikes_are_ignored() {
        let ranges = detect_sensitive_ranges("sk_live_short ghp_tooShort");
        assert!(ranges.iter().all(|range| range.kind != SensitiveKind::ApiKey));
    }

    #[test]
    fn detects_street_addresses() {
        let text = "Ship to 221 Baker Street, London today";
        let ranges = detect_sensitive_ranges(text);

        let address = ranges
            .iter()
            .find(|range| range.kind == SensitiveKind::Address)
            .unwrap();
        assert_eq!(address.extract(text), "221 Baker Street");
    }

    #[test]
    fn link_excludes_trailing_punctuation() {
        let text = "Docs live at www.example.com/docs.";
        let ranges = detect_sensitive_ranges(text);

        let link = ranges
            .iter()
            .find(|range| range.kind == SensitiveKind::Link)
            .unwrap();
        assert_eq!(link.extract(text), "www.example.com/docs");
    }

    #[test]
    fn offsets_are_counted_in_characters() {
        let text = "héllo → a@b.com";
        let ranges = detect_sensitive_ranges(text);

        let email = ranges
            .iter()
            .find(|range| range.kind == SensitiveKind::Email)
            .unwrap();
        assert_eq!(email.start, 8);
        assert_eq!(email.end, 15);
        assert_eq!(email.extract(text), "a@b.com");
    }

    #[test]
    fn plain_prose_has_no_ranges() {
        assert!(detect_sensitive_ranges("The quick brown fox").is_empty());
        assert!(detect_sensitive_ranges("").is_empty());
    }
}
