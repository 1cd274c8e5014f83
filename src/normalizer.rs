// 🧹 Normalizer - Raw rows → canonical PartyRecord
//
// Names upper-cased and trimmed, PAN canonicalized and validated once,
// DOB parsed day-first, Aadhar reduced to its last 4 digits.

use crate::record::{BirthDate, PartyRecord, PartyType, RawPartyRow};
use crate::validator::is_valid_primary_id;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static AADHAR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})$").expect("Aadhar suffix pattern is valid"));

/// Date layouts, tried in order. Day-first wins over month-first.
const DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%Y%m%d",
    "%b %d, %Y",
];

/// Date-time layouts; only the date part is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

// ============================================================================
// FIELD NORMALIZERS
// ============================================================================

/// Trim + upper-case. Empty input stays empty.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Trim + upper-case; blank means absent.
pub fn normalize_primary_id(raw: &str) -> Option<String> {
    let canonical = raw.trim().to_uppercase();
    if canonical.is_empty() {
        None
    } else {
        Some(canonical)
    }
}

/// Parse a birth/incorporation date, day-first.
pub fn parse_birth_date(raw: &str) -> BirthDate {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return BirthDate::Unknown;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return BirthDate::Known(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return BirthDate::Known(datetime.date());
        }
    }

    BirthDate::Unknown
}

/// Last 4 digits of an Aadhar number ("XXXX XXXX 1234" → "1234").
pub fn secondary_id_suffix(raw: &str) -> String {
    AADHAR_SUFFIX
        .captures(raw.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

// ============================================================================
// RECORD NORMALIZER
// ============================================================================

/// Build the canonical record for one raw row. Does not touch the input.
pub fn normalize(raw: &RawPartyRow) -> PartyRecord {
    let primary_id = normalize_primary_id(&raw.pan);
    let primary_id_valid = primary_id.as_deref().map(is_valid_primary_id).unwrap_or(false);

    PartyRecord {
        row: raw.row,
        party_type: PartyType::from_classifier(&raw.party_tc),
        primary_id,
        primary_id_valid,
        secondary_id_suffix: secondary_id_suffix(&raw.aadhar_no),
        date_of_birth: parse_birth_date(&raw.dob),
        first_name: normalize_name(&raw.first_name),
        last_name: normalize_name(&raw.last_name),
        organization_name: normalize_name(&raw.organization_name),
        unique_customer_id: raw.ucic.trim().to_string(),
    }
}

pub fn normalize_all(rows: &[RawPartyRow]) -> Vec<PartyRecord> {
    rows.iter().map(normalize).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> BirthDate {
        BirthDate::Known(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_names_trimmed_and_uppercased() {
        assert_eq!(normalize_name("  john smith "), "JOHN SMITH");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_primary_id_canonical_form() {
        assert_eq!(normalize_primary_id(" abcde1234f "), Some("ABCDE1234F".to_string()));
        assert_eq!(normalize_primary_id("   "), None);
    }

    #[test]
    fn test_dates_parse_day_first() {
        // 03/04/1990 is 3 April, not 4 March
        assert_eq!(parse_birth_date("03/04/1990"), date(1990, 4, 3));
        assert_eq!(parse_birth_date("03-04-1990"), date(1990, 4, 3));
        assert_eq!(parse_birth_date("1990-04-03"), date(1990, 4, 3));
        assert_eq!(parse_birth_date("1990/04/03"), date(1990, 4, 3));
        assert_eq!(parse_birth_date("03.04.1990"), date(1990, 4, 3));
        assert_eq!(parse_birth_date("03-Apr-1990"), date(1990, 4, 3));
    }

    #[test]
    fn test_compact_and_month_name_dates() {
        assert_eq!(parse_birth_date("19900101"), date(1990, 1, 1));
        assert_eq!(parse_birth_date("19900403"), date(1990, 4, 3));
        assert_eq!(parse_birth_date("Jan 1, 1990"), date(1990, 1, 1));
        assert_eq!(parse_birth_date("Apr 03, 1990"), date(1990, 4, 3));
        assert!(!parse_birth_date("19901301").is_known());
    }

    #[test]
    fn test_datetime_keeps_date_part() {
        assert_eq!(parse_birth_date("1990-01-01 00:00:00"), date(1990, 1, 1));
        assert_eq!(parse_birth_date("1990-01-01T10:30:00"), date(1990, 1, 1));
    }

    #[test]
    fn test_unparseable_date_is_unknown() {
        assert!(!parse_birth_date("").is_known());
        assert!(!parse_birth_date("not a date").is_known());
        assert!(!parse_birth_date("31/02/1990").is_known());
    }

    #[test]
    fn test_aadhar_suffix() {
        assert_eq!(secondary_id_suffix("1234 5678 9012"), "9012");
        assert_eq!(secondary_id_suffix("XXXX-XXXX-4321"), "4321");
        assert_eq!(secondary_id_suffix("123"), "");
        assert_eq!(secondary_id_suffix("1234X"), "");
        assert_eq!(secondary_id_suffix(""), "");
    }

    #[test]
    fn test_normalize_row() {
        let raw = RawPartyRow {
            row: 4,
            party_tc: "person".to_string(),
            pan: "abcde1234f".to_string(),
            aadhar_no: "xxxx xxxx 5555".to_string(),
            dob: "01/01/1990".to_string(),
            first_name: " John".to_string(),
            last_name: "smith ".to_string(),
            organization_name: String::new(),
            ucic: " U1 ".to_string(),
        };

        let rec = normalize(&raw);

        assert_eq!(rec.row, 4);
        assert_eq!(rec.party_type, PartyType::Person);
        assert_eq!(rec.primary_id.as_deref(), Some("ABCDE1234F"));
        assert!(rec.primary_id_valid);
        assert_eq!(rec.secondary_id_suffix, "5555");
        assert_eq!(rec.date_of_birth, date(1990, 1, 1));
        assert_eq!(rec.full_name(), "JOHN SMITH");
        assert_eq!(rec.unique_customer_id, "U1");

        // input untouched
        assert_eq!(raw.first_name, " John");
    }

    #[test]
    fn test_placeholder_pan_kept_but_invalid() {
        let raw = RawPartyRow {
            pan: "aaaaa1234a".to_string(),
            ..Default::default()
        };
        let rec = normalize(&raw);

        assert_eq!(rec.primary_id.as_deref(), Some("AAAAA1234A"));
        assert!(!rec.primary_id_valid);
        assert_eq!(rec.party_type, PartyType::Organization);
    }
}
