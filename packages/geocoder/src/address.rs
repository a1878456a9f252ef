//! Street name normalization for traffic survey segments.
//!
//! Survey data writes numbered streets without their ordinal suffix:
//! - Bare numbers: `"W 42 ST"`, `"3 AVE"`
//! - Already suffixed: `"5TH AVE"` (left alone)
//! - No number at all: `"BROADWAY"` (left alone)
//!
//! The geocoder matches `"W 42ND ST"` far more reliably than `"W 42 ST"`, so
//! the first bare number gets its suffix before the endpoint query is built.

/// City qualifier appended to every endpoint query.
pub const CITY_QUALIFIER: &str = "NEW YORK CITY";

/// Ordinal suffix for a run of digits, chosen by its last digit.
///
/// `11`, `12` and `13` are not special-cased: `"11"` becomes `"11ST"`.
#[must_use]
pub fn ordinal_suffix(digits: &str) -> &'static str {
    match digits.chars().last() {
        Some('1') => "ST",
        Some('2') => "ND",
        Some('3') => "RD",
        _ => "TH",
    }
}

/// Inserts the ordinal suffix after the first run of digits that is
/// directly followed by whitespace.
///
/// The whitespace character after the run is replaced by `"<SUFFIX> "`.
/// Digit runs followed by anything else (`"5TH"`, a trailing `"5"`) are
/// skipped, which makes the function idempotent. Input without a
/// qualifying run is returned unchanged.
#[must_use]
pub fn add_ordinal_suffix(street: &str) -> String {
    let mut run_start: Option<usize> = None;

    for (i, ch) in street.char_indices() {
        if ch.is_ascii_digit() {
            run_start.get_or_insert(i);
            continue;
        }

        if let Some(start) = run_start.take()
            && ch.is_whitespace()
        {
            let digits = &street[start..i];
            let rest = &street[i + ch.len_utf8()..];
            return format!(
                "{}{digits}{} {rest}",
                &street[..start],
                ordinal_suffix(digits)
            );
        }
    }

    street.to_string()
}

/// Builds the free-form query for one segment endpoint:
/// `"{roadway}+{cross_street}+NEW YORK CITY"`.
///
/// Both parts are expected to be normalized already.
#[must_use]
pub fn endpoint_query(roadway: &str, cross_street: &str) -> String {
    format!("{roadway}+{cross_street}+{CITY_QUALIFIER}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_by_last_digit() {
        assert_eq!(add_ordinal_suffix("123 Main"), "123RD Main");
        assert_eq!(add_ordinal_suffix("1 Main"), "1ST Main");
        assert_eq!(add_ordinal_suffix("2 Main"), "2ND Main");
        assert_eq!(add_ordinal_suffix("4 Main"), "4TH Main");
        assert_eq!(add_ordinal_suffix("10 AVE"), "10TH AVE");
    }

    #[test]
    fn leaves_street_without_digits_unchanged() {
        assert_eq!(add_ordinal_suffix("Main Street"), "Main Street");
        assert_eq!(add_ordinal_suffix(""), "");
    }

    #[test]
    fn handles_number_after_direction() {
        assert_eq!(add_ordinal_suffix("W 42 ST"), "W 42ND ST");
        assert_eq!(add_ordinal_suffix("E42 ST"), "E42ND ST");
    }

    #[test]
    fn skips_already_suffixed_numbers() {
        assert_eq!(add_ordinal_suffix("5TH AVE"), "5TH AVE");
        assert_eq!(add_ordinal_suffix("W 42ND ST"), "W 42ND ST");
        assert_eq!(add_ordinal_suffix("5TH AVE 3 ST"), "5TH AVE 3RD ST");
    }

    #[test]
    fn is_idempotent() {
        for street in ["W 42 ST", "3 AVE", "BROADWAY", "E 161 ST"] {
            let once = add_ordinal_suffix(street);
            assert_eq!(add_ordinal_suffix(&once), once, "input: {street}");
        }
    }

    #[test]
    fn only_first_run_is_rewritten() {
        assert_eq!(add_ordinal_suffix("1 AVE 2 ST"), "1ST AVE 2 ST");
    }

    #[test]
    fn ignores_trailing_number() {
        assert_eq!(add_ordinal_suffix("ROUTE 9"), "ROUTE 9");
    }

    #[test]
    fn teens_are_not_special_cased() {
        assert_eq!(add_ordinal_suffix("11 AVE"), "11ST AVE");
        assert_eq!(add_ordinal_suffix("12 AVE"), "12ND AVE");
        assert_eq!(add_ordinal_suffix("113 ST"), "113RD ST");
    }

    #[test]
    fn builds_endpoint_query() {
        assert_eq!(
            endpoint_query("BROADWAY", "W 42ND ST"),
            "BROADWAY+W 42ND ST+NEW YORK CITY"
        );
    }
}
