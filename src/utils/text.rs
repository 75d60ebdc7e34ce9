// src/utils/text.rs

//! Text normalization for Brazilian court pages.
//!
//! Court sites render values as display text (dates like `12/03/2024 às
//! 14:30`, money like `R$ 1.234,56`, names with diacritics). These helpers
//! convert that text into canonical values and never panic on garbage input.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Date formats tried in priority order when no explicit list is given.
pub const DEFAULT_DATE_FORMATS: [&str; 7] = [
    "%d/%m/%Y",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y às %H:%M",
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Collapse runs of whitespace to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    whitespace_re().replace_all(text, " ").trim().to_string()
}

/// Fold accented Latin characters to their base letter.
///
/// Covers the diacritics that appear in Portuguese legal text; anything
/// outside the table passes through unchanged.
pub fn strip_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            _ => c,
        })
        .collect()
}

fn currency_junk_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[R$\s]").unwrap())
}

/// Parse a Brazilian-locale currency string into a decimal.
///
/// `"R$ 1.234,56"` becomes `1234.56`. Returns `None` for empty or
/// unparsable input.
pub fn parse_currency(value: &str) -> Option<Decimal> {
    if value.trim().is_empty() {
        return None;
    }

    let clean = currency_junk_re().replace_all(value, "");
    let clean = clean.replace('.', "").replace(',', ".");

    Decimal::from_str(&clean).ok()
}

/// Try to parse a date string against multiple formats.
///
/// Uses [`DEFAULT_DATE_FORMATS`] when `formats` is `None`. Formats without a
/// time component parse to midnight. Returns `None` if every format fails.
pub fn parse_date_flexible(date_str: &str, formats: Option<&[&str]>) -> Option<NaiveDateTime> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    let formats = formats.unwrap_or(&DEFAULT_DATE_FORMATS);
    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Convert text into a URL-friendly slug.
///
/// `"Ação de Cobrança"` becomes `"acao-de-cobranca"`.
pub fn slugify(text: &str) -> String {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    static DASHES: OnceLock<Regex> = OnceLock::new();
    let strip = STRIP.get_or_init(|| Regex::new(r"[^\w\s-]").unwrap());
    let dashes = DASHES.get_or_init(|| Regex::new(r"[-\s]+").unwrap());

    let lowered = strip_accents(&text.to_lowercase());
    let stripped = strip.replace_all(&lowered, "");
    dashes
        .replace_all(&stripped, "-")
        .trim_matches('-')
        .to_string()
}

/// Truncate text to at most `max_len` grapheme clusters, appending `…` when
/// anything was cut.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max_len {
        return text.to_string();
    }
    let cut = max_len.saturating_sub(1);
    let mut out: String = graphemes[..cut].concat();
    out.push('…');
    out
}

/// SHA-256 hex digest of a raw page snapshot, for audit logging.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_strip_accents() {
        assert_eq!(strip_accents("Ação de Execução"), "Acao de Execucao");
        assert_eq!(strip_accents("Vara Cível"), "Vara Civel");
        assert_eq!(strip_accents("plain ascii"), "plain ascii");
    }

    #[test]
    fn test_parse_currency_brazilian() {
        assert_eq!(
            parse_currency("R$ 1.234,56"),
            Some(Decimal::new(123456, 2))
        );
        assert_eq!(parse_currency("R$ 15.000,00"), Some(Decimal::new(15000, 0)));
        assert_eq!(parse_currency("1234,56"), Some(Decimal::new(123456, 2)));
    }

    #[test]
    fn test_parse_currency_rejects_garbage() {
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("   "), None);
        assert_eq!(parse_currency("a definir"), None);
    }

    #[test]
    fn test_parse_date_default_formats() {
        let d = parse_date_flexible("12/03/2024", None).unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());

        let dt = parse_date_flexible("12/03/2024 às 14:30", None).unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "14:30");

        let iso = parse_date_flexible("2024-03-12", None).unwrap();
        assert_eq!(iso.date(), NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());

        assert!(parse_date_flexible("12.03.2024", None).is_some());
        assert!(parse_date_flexible("not a date", None).is_none());
        assert!(parse_date_flexible("", None).is_none());
    }

    #[test]
    fn test_parse_date_custom_formats() {
        assert!(parse_date_flexible("2024/03/12", Some(&["%Y/%m/%d"])).is_some());
        // Custom list replaces the defaults entirely.
        assert!(parse_date_flexible("12/03/2024", Some(&["%Y/%m/%d"])).is_none());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Ação de Cobrança"), "acao-de-cobranca");
        assert_eq!(slugify("  Execução   Fiscal! "), "execucao-fiscal");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 4), "abc…");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint("<html></html>");
        let b = fingerprint("<html></html>");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint("<html> </html>"));
    }
}
