//! Strings with embedded numbers ("10px 20px", "rgba(0, 0, 0, 0.5)").
//!
//! A string is split into a skeleton of non-numeric segments and the numbers
//! between them. Two strings interpolate number-by-number only when their
//! skeletons match exactly; anything else is step-only.

use std::fmt::Write;

/// Why a string could not be used for numeric interpolation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseComplexError {
    #[error("no embedded numbers in {0:?}")]
    NoNumbers(String),
    #[error("skeleton mismatch between {start:?} and {end:?}")]
    SkeletonMismatch { start: String, end: String },
}

/// Parsed form of a string with embedded numbers.
/// Invariant: `segments.len() == numbers.len() + 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexString {
    segments: Vec<String>,
    numbers: Vec<f32>,
}

impl ComplexString {
    pub fn parse(s: &str) -> Result<Self, ParseComplexError> {
        let bytes = s.as_bytes();
        let mut segments = Vec::new();
        let mut numbers = Vec::new();
        let mut seg_start = 0usize;
        let mut i = 0usize;
        while i < bytes.len() {
            if let Some(end) = number_end(bytes, i) {
                // number_end only accepts ASCII, so slicing is on char boundaries.
                if let Ok(n) = s[i..end].parse::<f32>() {
                    segments.push(s[seg_start..i].to_string());
                    numbers.push(n);
                    seg_start = end;
                    i = end;
                    continue;
                }
            }
            i += 1;
        }
        if numbers.is_empty() {
            return Err(ParseComplexError::NoNumbers(s.to_string()));
        }
        segments.push(s[seg_start..].to_string());
        Ok(Self { segments, numbers })
    }

    /// Parse `start` and `end` and check that they share a skeleton.
    pub fn parse_pair(start: &str, end: &str) -> Result<(Self, Self), ParseComplexError> {
        let a = Self::parse(start)?;
        let b = Self::parse(end)?;
        if a.segments != b.segments {
            return Err(ParseComplexError::SkeletonMismatch {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok((a, b))
    }

    #[inline]
    pub fn numbers(&self) -> &[f32] {
        &self.numbers
    }

    /// Re-assemble the string with `numbers` substituted into the skeleton.
    pub fn render(&self, numbers: &[f32]) -> String {
        debug_assert_eq!(numbers.len(), self.numbers.len());
        let mut out = String::with_capacity(self.segments.iter().map(String::len).sum::<usize>() + numbers.len() * 6);
        for (seg, n) in self.segments.iter().zip(numbers) {
            out.push_str(seg);
            out.push_str(&format_number(*n));
        }
        if let Some(last) = self.segments.last() {
            out.push_str(last);
        }
        out
    }
}

/// Scan a number starting at `i`: optional '-' or '+', digits, optional
/// fraction, optional exponent. A sign only counts when a digit or '.'+digit
/// follows, so "translate-x" stays text.
fn number_end(bytes: &[u8], i: usize) -> Option<usize> {
    let mut j = i;
    if matches!(bytes[j], b'-' | b'+') {
        j += 1;
    }
    let int_start = j;
    while j < bytes.len() && bytes[j].is_ascii_digit() {
        j += 1;
    }
    let mut has_digits = j > int_start;
    if j < bytes.len() && bytes[j] == b'.' && j + 1 < bytes.len() && bytes[j + 1].is_ascii_digit() {
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        has_digits = true;
    }
    if !has_digits {
        return None;
    }
    // Exponent only when fully formed ("1e3", "2.5e-2").
    if j < bytes.len() && matches!(bytes[j], b'e' | b'E') {
        let mut k = j + 1;
        if k < bytes.len() && matches!(bytes[k], b'-' | b'+') {
            k += 1;
        }
        let exp_start = k;
        while k < bytes.len() && bytes[k].is_ascii_digit() {
            k += 1;
        }
        if k > exp_start {
            j = k;
        }
    }
    Some(j)
}

/// Format a number for string output: integers print without a fraction,
/// everything else is rounded to four decimals with trailing zeros removed.
pub fn format_number(v: f32) -> String {
    let rounded = (v as f64 * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let mut s = String::new();
    if rounded.fract() == 0.0 {
        let _ = write!(s, "{}", rounded as i64);
        return s;
    }
    let _ = write!(s, "{rounded:.4}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_numbers_and_units() {
        let c = ComplexString::parse("10px -2.5em").unwrap();
        assert_eq!(c.numbers(), &[10.0, -2.5]);
        assert_eq!(c.render(&[1.0, 2.0]), "1px 2em");
    }

    #[test]
    fn hyphenated_words_stay_text() {
        let c = ComplexString::parse("translate-x(4px)").unwrap();
        assert_eq!(c.numbers(), &[4.0]);
        assert_eq!(c.render(&[8.0]), "translate-x(8px)");
    }

    #[test]
    fn mismatched_skeletons_are_rejected() {
        let err = ComplexString::parse_pair("10px", "10%").unwrap_err();
        assert!(matches!(err, ParseComplexError::SkeletonMismatch { .. }));
        assert!(ComplexString::parse("auto").is_err());
    }

    #[test]
    fn format_trims_fraction() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.12345), "0.1235");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(-0.00001), "0");
    }
}
