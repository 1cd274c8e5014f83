// ✅ Validator - PAN structure checks + batch data quality
//
// Validation never fails a record. A malformed PAN is simply treated as
// absent by the matcher; the quality summary only feeds logs and reports.

use crate::record::PartyRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PAN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("PAN pattern is valid"));

// ============================================================================
// PRIMARY IDENTIFIER (PAN)
// ============================================================================

/// 5 uppercase letters, 4 digits, 1 uppercase letter, and not a dummy.
///
/// Case-sensitive: callers normalize first.
pub fn is_valid_primary_id(id: &str) -> bool {
    PAN_PATTERN.is_match(id) && !is_placeholder_primary_id(id)
}

/// Dummy PANs used for test/unknown customers repeat one letter across the
/// whole five-letter prefix (AAAAA1234A, XXXXX0000X...).
pub fn is_placeholder_primary_id(id: &str) -> bool {
    let prefix: Vec<char> = id.chars().take(5).collect();
    prefix.len() == 5 && prefix.iter().all(|c| *c == prefix[0])
}

// ============================================================================
// RECORD ISSUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning, // Record loses a matching signal
    Info,    // Record is usable as is
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordIssue {
    MissingPrimaryId,
    MalformedPrimaryId,
    PlaceholderPrimaryId,
    UnknownBirthDate,
    MissingName,
    MissingUcic,
}

impl RecordIssue {
    pub fn severity(&self) -> Severity {
        match self {
            RecordIssue::MalformedPrimaryId
            | RecordIssue::PlaceholderPrimaryId
            | RecordIssue::UnknownBirthDate
            | RecordIssue::MissingName => Severity::Warning,
            RecordIssue::MissingPrimaryId | RecordIssue::MissingUcic => Severity::Info,
        }
    }
}

/// List what a record is missing. UCIC is only checked for master rows.
pub fn assess(record: &PartyRecord, is_master: bool) -> Vec<RecordIssue> {
    let mut issues = Vec::new();

    match record.primary_id.as_deref() {
        None => issues.push(RecordIssue::MissingPrimaryId),
        Some(_) if record.primary_id_valid => {}
        Some(id) if PAN_PATTERN.is_match(id) => issues.push(RecordIssue::PlaceholderPrimaryId),
        Some(_) => issues.push(RecordIssue::MalformedPrimaryId),
    }

    if !record.date_of_birth.is_known() {
        issues.push(RecordIssue::UnknownBirthDate);
    }

    if record.identity_name().is_empty() {
        issues.push(RecordIssue::MissingName);
    }

    if is_master && !record.has_ucic() {
        issues.push(RecordIssue::MissingUcic);
    }

    issues
}

// ============================================================================
// QUALITY SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub total_records: usize,
    pub valid_primary_id: usize,
    pub missing_primary_id: usize,
    pub malformed_primary_id: usize,
    pub placeholder_primary_id: usize,
    pub unknown_birth_date: usize,
    pub missing_name: usize,
    pub missing_ucic: usize,
}

impl QualitySummary {
    pub fn from_records(records: &[PartyRecord], is_master: bool) -> Self {
        let mut summary = QualitySummary {
            total_records: records.len(),
            ..Default::default()
        };

        for record in records {
            if record.primary_id_valid {
                summary.valid_primary_id += 1;
            }
            for issue in assess(record, is_master) {
                match issue {
                    RecordIssue::MissingPrimaryId => summary.missing_primary_id += 1,
                    RecordIssue::MalformedPrimaryId => summary.malformed_primary_id += 1,
                    RecordIssue::PlaceholderPrimaryId => summary.placeholder_primary_id += 1,
                    RecordIssue::UnknownBirthDate => summary.unknown_birth_date += 1,
                    RecordIssue::MissingName => summary.missing_name += 1,
                    RecordIssue::MissingUcic => summary.missing_ucic += 1,
                }
            }
        }

        summary
    }

    pub fn summary(&self) -> String {
        format!(
            "{} records: {} valid PAN, {} missing, {} malformed, {} placeholder, {} unknown DOB, {} unnamed",
            self.total_records,
            self.valid_primary_id,
            self.missing_primary_id,
            self.malformed_primary_id,
            self.placeholder_primary_id,
            self.unknown_birth_date,
            self.missing_name,
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BirthDate, PartyType};
    use chrono::NaiveDate;

    fn record(pan: Option<&str>, dob: BirthDate, first: &str, ucic: &str) -> PartyRecord {
        PartyRecord {
            row: 0,
            party_type: PartyType::Person,
            primary_id: pan.map(str::to_string),
            primary_id_valid: pan.map(is_valid_primary_id).unwrap_or(false),
            secondary_id_suffix: String::new(),
            date_of_birth: dob,
            first_name: first.to_string(),
            last_name: String::new(),
            organization_name: String::new(),
            unique_customer_id: ucic.to_string(),
        }
    }

    #[test]
    fn test_valid_pan() {
        assert!(is_valid_primary_id("ABCDE1234F"));
        assert!(is_valid_primary_id("AABCD0000Z"));
    }

    #[test]
    fn test_placeholder_pan_rejected() {
        assert!(!is_valid_primary_id("AAAAA1234A"));
        assert!(!is_valid_primary_id("XXXXX0000X"));
        assert!(is_placeholder_primary_id("AAAAA1234A"));
        assert!(!is_placeholder_primary_id("ABCDE1234F"));
    }

    #[test]
    fn test_pan_is_case_sensitive() {
        assert!(!is_valid_primary_id("abcde1234f"));
        assert!(!is_valid_primary_id("ABCDE1234f"));
    }

    #[test]
    fn test_malformed_pan() {
        assert!(!is_valid_primary_id(""));
        assert!(!is_valid_primary_id("ABCDE1234"));
        assert!(!is_valid_primary_id("ABCDE1234FG"));
        assert!(!is_valid_primary_id("ABCD12345F"));
        assert!(!is_valid_primary_id(" ABCDE1234F"));
        assert!(!is_valid_primary_id("ABCDÉ1234F"));
    }

    #[test]
    fn test_assess_flags_each_issue() {
        let rec = record(Some("AAAAA1234A"), BirthDate::Unknown, "", "");
        let issues = assess(&rec, true);

        assert!(issues.contains(&RecordIssue::PlaceholderPrimaryId));
        assert!(issues.contains(&RecordIssue::UnknownBirthDate));
        assert!(issues.contains(&RecordIssue::MissingName));
        assert!(issues.contains(&RecordIssue::MissingUcic));

        // Incoming rows carry no UCIC; not an issue there
        assert!(!assess(&rec, false).contains(&RecordIssue::MissingUcic));
    }

    #[test]
    fn test_quality_summary_counts() {
        let dob = BirthDate::Known(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        let records = vec![
            record(Some("ABCDE1234F"), dob, "JOHN", "U1"),
            record(None, dob, "JANE", "U2"),
            record(Some("12345"), BirthDate::Unknown, "JIM", ""),
        ];

        let summary = QualitySummary::from_records(&records, true);

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.valid_primary_id, 1);
        assert_eq!(summary.missing_primary_id, 1);
        assert_eq!(summary.malformed_primary_id, 1);
        assert_eq!(summary.unknown_birth_date, 1);
        assert_eq!(summary.missing_ucic, 1);
        assert!(!summary.summary().is_empty());
    }
}
