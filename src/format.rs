//! Display formatting shared by the tables and the invoice renderer.
//!
//! Money uses the Indian grouping convention (`12,34,567.89`) with exactly two
//! decimals and no currency symbol; callers prepend one when they need it.

use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub const NOT_AVAILABLE_SHORT: &str = "N/A";
pub const NOT_AVAILABLE: &str = "Not Available";
pub const ZERO_RUPEES: &str = "Zero Rupees only";

/// Largest integer amount spelled out; above this the words fallback is used.
const MAX_WORDS_AMOUNT: u64 = 999_999_999_999_999;

pub fn format_currency(v: f64) -> String {
    if !v.is_finite() {
        return "0.00".to_string();
    }
    let s = format!("{:.2}", v.abs());
    let (int_part, dec_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let grouped = group_indian(int_part);
    let negative = v < 0.0 && s.chars().any(|c| c != '0' && c != '.');
    if negative {
        format!("-{}.{}", grouped, dec_part)
    } else {
        format!("{}.{}", grouped, dec_part)
    }
}

/// Last three digits form a group, every group before that has two digits.
fn group_indian(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    if chars.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = chars.split_at(chars.len() - 3);

    let mut out: Vec<char> = Vec::with_capacity(chars.len() + chars.len() / 2);
    for (i, ch) in head.iter().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    out.push(',');
    out.extend_from_slice(tail);
    out.into_iter().collect()
}

/// Inverse of [`format_currency`]: strips grouping separators and parses the number.
pub fn parse_currency(input: &str) -> Option<f64> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('₹')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `Tax (18%)` style label value; the rate is a fraction (`0.18`).
pub fn tax_percent_label(rate: f64) -> String {
    if !rate.is_finite() {
        return "0%".to_string();
    }
    format!("{}%", (rate * 100.0).round() as i64)
}

/// Renders an ISO date or RFC 3339 timestamp as `DD/MM/YYYY`.
///
/// Absent values become `N/A`; values that are neither format are shown as sent.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return NOT_AVAILABLE_SHORT.to_string();
    };
    match parse_date(raw) {
        Some(date) => display_date(date),
        None => raw.to_string(),
    }
}

pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339) {
        return Some(ts.date());
    }
    let ymd = raw.get(..10).unwrap_or(raw);
    Date::parse(ymd, format_description!("[year]-[month]-[day]")).ok()
}

pub fn display_date(date: Date) -> String {
    date.format(format_description!("[day]/[month]/[year]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Spells out a rupee amount, e.g. `1,250.50` becomes
/// `One Thousand Two Hundred Fifty Rupees and Fifty Paise only`.
///
/// Never fails: invalid input yields `Zero Rupees only`, amounts beyond the
/// words table yield `Rupees {integer} only`.
pub fn amount_in_words(value: f64) -> String {
    if !value.is_finite() || value < 0.0 {
        return ZERO_RUPEES.to_string();
    }
    match spell_rupees(value) {
        Some(words) => words,
        None => format!("Rupees {:.0} only", value.trunc()),
    }
}

fn spell_rupees(value: f64) -> Option<String> {
    if value.trunc() > MAX_WORDS_AMOUNT as f64 {
        return None;
    }
    let mut rupees = value.trunc() as u64;
    let mut paise = ((value - value.trunc()) * 100.0).round() as u64;
    if paise >= 100 {
        rupees += 1;
        paise -= 100;
    }
    if rupees > MAX_WORDS_AMOUNT {
        return None;
    }

    let out = match (rupees, paise) {
        (0, 0) => ZERO_RUPEES.to_string(),
        (0, p) => format!("{} Paise only", words_below_hundred(p)),
        (r, 0) => format!("{} Rupees only", integer_words(r)),
        (r, p) => format!(
            "{} Rupees and {} Paise only",
            integer_words(r),
            words_below_hundred(p)
        ),
    };
    Some(out)
}

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

fn words_below_hundred(n: u64) -> String {
    debug_assert!(n < 100);
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        unit => format!("{} {}", tens, ONES[unit as usize]),
    }
}

fn words_below_thousand(n: u64) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, r) => words_below_hundred(r),
        (h, 0) => format!("{} Hundred", ONES[h as usize]),
        (h, r) => format!("{} Hundred {}", ONES[h as usize], words_below_hundred(r)),
    }
}

/// Indian scale: crore (10^7), lakh (10^5), thousand, hundred.
fn integer_words(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }
    let mut parts: Vec<String> = Vec::new();

    let crores = n / 10_000_000;
    let mut rest = n % 10_000_000;
    if crores > 0 {
        parts.push(format!("{} Crore", integer_words(crores)));
    }
    let lakhs = rest / 100_000;
    rest %= 100_000;
    if lakhs > 0 {
        parts.push(format!("{} Lakh", words_below_hundred(lakhs)));
    }
    let thousands = rest / 1_000;
    rest %= 1_000;
    if thousands > 0 {
        parts.push(format!("{} Thousand", words_below_hundred(thousands)));
    }
    if rest > 0 {
        parts.push(words_below_thousand(rest));
    }
    parts.join(" ")
}

/// Keeps file names portable; empty results fall back to `invoice`.
pub fn sanitize_filename(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' || ch == ' ';
        out.push(if ok { ch } else { '_' });
    }
    let trimmed = out.trim().to_string();
    if trimmed.is_empty() {
        "invoice".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_uses_indian_grouping() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.5), "999.50");
        assert_eq!(format_currency(1000.0), "1,000.00");
        assert_eq!(format_currency(123456.789), "1,23,456.79");
        assert_eq!(format_currency(12345678.0), "1,23,45,678.00");
        assert_eq!(format_currency(-1500.0), "-1,500.00");
        assert_eq!(format_currency(-0.001), "0.00");
        assert_eq!(format_currency(f64::NAN), "0.00");
    }

    #[test]
    fn currency_round_trips_through_its_own_output() {
        for v in [0.0, 0.01, 7.5, 1234.5, 99999.999, 1_00_00_000.25, -42.42] {
            let first = format_currency(v);
            let parsed = parse_currency(&first).expect("formatted output parses");
            assert_eq!(format_currency(parsed), first);
            assert!((parsed - (v * 100.0).round() / 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn currency_round_trips_across_lakh_and_crore_magnitudes() {
        // deterministic spread of paise amounts, rupees up to a lakh crore
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for scale in [1u64, 100, 1_00_000, 1_00_00_000, 1_00_00_00_000, 1_00_00_00_00_000] {
            for _ in 0..200 {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                let paise = seed % (scale * 100);
                for v in [paise as f64 / 100.0, -(paise as f64) / 100.0] {
                    let text = format_currency(v);
                    let parsed = parse_currency(&text).expect("formatted output parses");
                    assert_eq!(parsed, v, "{text}");

                    let int_part = text.trim_start_matches('-').split('.').next().unwrap();
                    let groups: Vec<_> = int_part.split(',').collect();
                    let (last, rest) = groups.split_last().unwrap();
                    assert!(last.len() <= 3, "{text}");
                    if let Some((first, middle)) = rest.split_first() {
                        assert_eq!(last.len(), 3, "{text}");
                        assert!((1..=2).contains(&first.len()), "{text}");
                        assert!(middle.iter().all(|g| g.len() == 2), "{text}");
                    }
                }
            }
        }
    }

    #[test]
    fn words_cover_indian_scale() {
        assert_eq!(amount_in_words(0.0), "Zero Rupees only");
        assert_eq!(amount_in_words(5.0), "Five Rupees only");
        assert_eq!(amount_in_words(0.5), "Fifty Paise only");
        assert_eq!(
            amount_in_words(1250.5),
            "One Thousand Two Hundred Fifty Rupees and Fifty Paise only"
        );
        assert_eq!(
            amount_in_words(2_15_00_019.0),
            "Two Crore Fifteen Lakh Nineteen Rupees only"
        );
        assert_eq!(amount_in_words(99.999), "One Hundred Rupees only");
    }

    #[test]
    fn words_never_fail() {
        assert_eq!(amount_in_words(f64::NAN), ZERO_RUPEES);
        assert_eq!(amount_in_words(f64::INFINITY), ZERO_RUPEES);
        assert_eq!(amount_in_words(-3.0), ZERO_RUPEES);
        assert_eq!(amount_in_words(1e18), "Rupees 1000000000000000000 only");
        assert!(!amount_in_words(123.0).is_empty());
    }

    #[test]
    fn tax_label_rounds_to_whole_percent() {
        assert_eq!(tax_percent_label(0.18), "18%");
        assert_eq!(tax_percent_label(0.125), "13%");
        assert_eq!(tax_percent_label(0.0), "0%");
    }

    #[test]
    fn dates_render_day_first() {
        assert_eq!(format_date(Some("2024-03-07")), "07/03/2024");
        assert_eq!(format_date(Some("2024-03-07T10:15:00.000Z")), "07/03/2024");
        assert_eq!(format_date(None), "N/A");
        assert_eq!(format_date(Some("  ")), "N/A");
        assert_eq!(format_date(Some("soon")), "soon");
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("Invoice-INV/001.pdf"), "Invoice-INV_001.pdf");
        assert_eq!(sanitize_filename("  "), "invoice");
    }
}
