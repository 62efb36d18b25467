use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Date formats each bank is known to emit, most common first. The first
/// format that parses wins.
pub const TELEBIRR_DATE_FORMATS: &[&str] = &["%d-%m-%Y %H:%M:%S", "%d-%m-%Y %H:%M"];
pub const BOA_DATE_FORMATS: &[&str] = &["%d/%m/%y %H:%M", "%d-%m-%Y %H:%M:%S"];
pub const CBE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%d %b %Y",
];

static AMOUNT_WORDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)-?(\w+)?\s*birr").expect("amount words regex"));
static NUMERIC_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.?\d*)").expect("numeric token regex"));

/// Parse a currency string to a float. Strips everything except digits and
/// `.` first, so `"1,234.50 ETB"` becomes `1234.50`. Unparseable input yields
/// `0.0` rather than an error: one bad field must never sink the record.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Canonicalize a source date string using an ordered list of explicit
/// formats. Formats carrying a time component yield `YYYY-MM-DD HH:MM:SS`,
/// date-only formats yield `YYYY-MM-DD`. When nothing matches the original
/// string passes through unchanged; downstream consumers must tolerate
/// non-ISO dates.
pub fn parse_date(raw: &str, formats: &[&str]) -> String {
    let trimmed = raw.trim();
    for format in formats {
        if format.contains("%H") {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return dt.format("%Y-%m-%d %H:%M:%S").to_string();
            }
        } else if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return d.format("%Y-%m-%d").to_string();
        }
    }
    trimmed.to_string()
}

/// Convert one spelled-out number word to its value. Unknown words map to 0
/// and do not abort parsing of the rest of the phrase.
pub fn word_to_number(word: &str) -> u64 {
    match word.trim().to_lowercase().as_str() {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        "hundred" => 100,
        "thousand" => 1000,
        _ => 0,
    }
}

/// Extract an amount from a receipt line that spells it in words, e.g.
/// "twenty-two birr and zero cent". Falls back to any numeric token in the
/// phrase, then to `0.0`.
pub fn amount_from_words(phrase: &str) -> f64 {
    let lowered = phrase.to_lowercase();
    if let Some(caps) = AMOUNT_WORDS_RE.captures(&lowered) {
        let mut amount = caps
            .get(1)
            .map(|m| word_to_number(m.as_str()))
            .unwrap_or(0);
        if let Some(tens) = caps.get(2) {
            amount += word_to_number(tens.as_str());
        }
        return amount as f64;
    }
    if let Some(caps) = NUMERIC_TOKEN_RE.captures(&lowered) {
        return caps[1].parse::<f64>().unwrap_or(0.0);
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_strips_currency_and_separators() {
        assert_eq!(parse_amount("1,234.50 ETB"), 1234.50);
        assert_eq!(parse_amount("500 birr"), 500.0);
    }

    #[test]
    fn unparseable_amount_degrades_to_zero() {
        assert_eq!(parse_amount("N/A"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        // Two dots survive the strip but fail the parse.
        assert_eq!(parse_amount("1.2.3"), 0.0);
    }

    #[test]
    fn boa_short_year_datetime() {
        assert_eq!(
            parse_date("01/09/25 14:30", BOA_DATE_FORMATS),
            "2025-09-01 14:30:00"
        );
    }

    #[test]
    fn telebirr_full_datetime() {
        assert_eq!(
            parse_date("16-04-2025 12:24:00", TELEBIRR_DATE_FORMATS),
            "2025-04-16 12:24:00"
        );
    }

    #[test]
    fn cbe_date_only_formats() {
        assert_eq!(parse_date("2025-04-16", CBE_DATE_FORMATS), "2025-04-16");
        assert_eq!(parse_date("16/04/2025", CBE_DATE_FORMATS), "2025-04-16");
        assert_eq!(parse_date("Apr 16, 2025", CBE_DATE_FORMATS), "2025-04-16");
    }

    #[test]
    fn unrecognized_date_passes_through_unchanged() {
        assert_eq!(
            parse_date("sometime last Tuesday", CBE_DATE_FORMATS),
            "sometime last Tuesday"
        );
    }

    #[test]
    fn words_to_amount() {
        assert_eq!(amount_from_words("twenty-two birr and zero cent"), 22.0);
        assert_eq!(amount_from_words("fifty birr"), 50.0);
    }

    #[test]
    fn unknown_words_do_not_abort_the_phrase() {
        // "gobbledygook" maps to 0; the phrase still parses.
        assert_eq!(amount_from_words("gobbledygook-two birr"), 2.0);
        // No "birr" keyword at all: fall back to a numeric token.
        assert_eq!(amount_from_words("paid 35.25 total"), 35.25);
        assert_eq!(amount_from_words("nothing here"), 0.0);
    }
}
