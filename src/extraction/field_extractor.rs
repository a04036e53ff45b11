// src/extraction/field_extractor.rs
//! Pattern-based extraction of structured fields from certificate text.
//!
//! Five independent, case-insensitive rules run over the raw text, one per
//! schema slot. Each rule is anchored to a label phrase specific to its
//! slot and is order-insensitive with respect to the others. A rule that
//! finds no match sets its slot to the `"Not Found"` sentinel; extraction
//! as a whole never fails.

use crate::models::certificate::{CertificateFields, NOT_FOUND};
use once_cell::sync::Lazy;
use regex::Regex;

// Compiled once; the patterns are fixed at build time so a failed compile
// is a programming error, not a runtime condition.

/// Name: anchored at "Certified that", optional honorific, capture stops
/// at the "has passed" phrase.
static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    // Longest honorific first: "Mr" alone would eat the front of "Mrs"
    // and leave a stray "s" in the capture.
    Regex::new(r"(?i)Certified\s+that\s+(?:Mrs\.?|Ms\.?|Mr\.?)?\s*([\w\s'-]+?)\s+has\s+passed")
        .expect("invalid name pattern")
});

/// Honorific prefix occasionally left at the front of a captured name.
static HONORIFIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:Mrs\.?|Ms\.?|Mr\.?)\s*").expect("invalid honorific pattern")
});

/// Register number: label with optional `:` or `-` separator.
static REGISTER_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Register\s*Number\s*[:\-]?\s*([\w\d-]+)").expect("invalid register pattern")
});

/// Passing date: either label variant, month-year or date token.
static PASSING_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Month\s*&\s*Year\s*of\s*Passing|Date\s*of\s*Passing)\s*[:\-]?\s*([\w-]+)")
        .expect("invalid date pattern")
});

/// College: label-anchored, capture stops before a CGPA section or end of
/// text.
static COLLEGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)College\s*of\s*Study\s*[:\-]?\s*([\w\s&.,'-]+?)(?:\s*Cumulative|$)")
        .expect("invalid college pattern")
});

/// CGPA: full label with one- or two-digit value and optional two-decimal
/// fraction.
static CGPA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)Cumulative\s*Grade\s*Point\s*Average\s*\(CGPA\)\s*[:\-]?\s*(\d{1,2}(?:\.\d{1,2})?)",
    )
    .expect("invalid cgpa pattern")
});

/// Runs one rule, returning the trimmed capture or the sentinel.
fn capture_or_sentinel(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Extracts the fixed field schema from raw certificate text.
///
/// Infallible: every slot is always populated, with extracted text or the
/// sentinel. Downstream fingerprinting of a partially sentinel field set
/// is permitted; whether to anchor it is the caller's decision.
pub fn extract(text: &str) -> CertificateFields {
    let mut name = capture_or_sentinel(&NAME_RE, text);
    if name != NOT_FOUND {
        // The name rule tolerates an honorific before the capture, but OCR
        // output sometimes glues it into the captured text anyway.
        name = HONORIFIC_RE.replace(&name, "").trim().to_string();
        if name.is_empty() {
            name = NOT_FOUND.to_string();
        }
    }

    CertificateFields {
        name,
        register_number: capture_or_sentinel(&REGISTER_NUMBER_RE, text),
        passing_date: capture_or_sentinel(&PASSING_DATE_RE, text),
        college: capture_or_sentinel(&COLLEGE_RE, text),
        cgpa: capture_or_sentinel(&CGPA_RE, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Certified that Mr. John Smith has passed the examination. \
        Register Number: AB123456 \
        Date of Passing: MAY-2023 \
        College of Study: Example Institute \
        Cumulative Grade Point Average (CGPA): 8.50";

    #[test]
    fn test_extracts_all_fields_from_sample() {
        let fields = extract(SAMPLE);
        assert_eq!(fields.name, "John Smith");
        assert_eq!(fields.register_number, "AB123456");
        assert_eq!(fields.passing_date, "MAY-2023");
        assert_eq!(fields.college, "Example Institute");
        assert_eq!(fields.cgpa, "8.50");
    }

    #[test]
    fn test_strips_honorifics() {
        for honorific in ["Mr.", "Mr", "Ms.", "Ms", "Mrs.", "Mrs"] {
            let text = format!("Certified that {} Jane Doe has passed", honorific);
            assert_eq!(extract(&text).name, "Jane Doe", "honorific {:?}", honorific);
        }
    }

    #[test]
    fn test_case_insensitive_labels() {
        let text = "CERTIFIED THAT ALICE JONES HAS PASSED. \
            register number - XY-9876 \
            month & year of passing: APRIL-2024";
        let fields = extract(text);
        assert_eq!(fields.name, "ALICE JONES");
        assert_eq!(fields.register_number, "XY-9876");
        assert_eq!(fields.passing_date, "APRIL-2024");
    }

    #[test]
    fn test_missing_cgpa_yields_sentinel() {
        let text = "Certified that Ms. Jane Doe has passed. \
            Register Number: CD654321 \
            Date of Passing: JUNE-2022 \
            College of Study: Sample College";
        let fields = extract(text);
        assert_eq!(fields.cgpa, NOT_FOUND);
        assert_eq!(fields.college, "Sample College");
    }

    #[test]
    fn test_all_slots_populated_on_unrelated_text() {
        let fields = extract("completely unrelated text");
        assert_eq!(fields.name, NOT_FOUND);
        assert_eq!(fields.register_number, NOT_FOUND);
        assert_eq!(fields.passing_date, NOT_FOUND);
        assert_eq!(fields.college, NOT_FOUND);
        assert_eq!(fields.cgpa, NOT_FOUND);
    }

    #[test]
    fn test_college_stops_before_cgpa_section() {
        let text = "College of Study: St. Mary's College of Engineering \
            Cumulative Grade Point Average (CGPA): 9.1";
        let fields = extract(text);
        assert_eq!(fields.college, "St. Mary's College of Engineering");
        assert_eq!(fields.cgpa, "9.1");
    }

    #[test]
    fn test_rules_are_order_insensitive() {
        let text = "Date of Passing: JAN-2021 \
            Register Number: ZZ000111 \
            Certified that Mrs. Mary Major has passed \
            Cumulative Grade Point Average (CGPA): 7.25 \
            College of Study: Reordered Institute";
        let fields = extract(text);
        assert_eq!(fields.name, "Mary Major");
        assert_eq!(fields.register_number, "ZZ000111");
        assert_eq!(fields.passing_date, "JAN-2021");
        assert_eq!(fields.college, "Reordered Institute");
        assert_eq!(fields.cgpa, "7.25");
    }

    #[test]
    fn test_integer_cgpa_accepted() {
        let text = "Cumulative Grade Point Average (CGPA): 8";
        assert_eq!(extract(text).cgpa, "8");
    }
}
