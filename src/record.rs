// 🪪 Party Records - One canonical row per customer
// Shared by the master registry and the incoming batch
//
// Raw rows come in as strings (RawPartyRow). The normalizer turns them into
// PartyRecord exactly once; nothing downstream re-derives a field.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// ============================================================================
// PARTY TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyType {
    /// Natural person - matched on names, DOB and Aadhar suffix
    Person,

    /// Anything that is not a person (company, trust, firm...)
    Organization,
}

impl PartyType {
    /// Classify a raw party_tc value. Only "PERSON" is a person.
    pub fn from_classifier(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("PERSON") {
            PartyType::Person
        } else {
            PartyType::Organization
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PartyType::Person => "PERSON",
            PartyType::Organization => "ORGANIZATION",
        }
    }

    /// Prefix used for export file names
    pub fn slug(&self) -> &'static str {
        match self {
            PartyType::Person => "person",
            PartyType::Organization => "organization",
        }
    }
}

impl fmt::Display for PartyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DATE OF BIRTH
// ============================================================================

/// Date of birth (or incorporation, for organizations).
///
/// `Unknown` is never equal to anything, not even another `Unknown`, so two
/// records with missing birth dates can never be blocked together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum BirthDate {
    Known(NaiveDate),
    Unknown,
}

impl BirthDate {
    pub fn known(&self) -> Option<NaiveDate> {
        match self {
            BirthDate::Known(date) => Some(*date),
            BirthDate::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, BirthDate::Known(_))
    }
}

impl PartialEq for BirthDate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BirthDate::Known(a), BirthDate::Known(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for BirthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BirthDate::Known(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            BirthDate::Unknown => f.write_str("unknown"),
        }
    }
}

// ============================================================================
// RAW ROW (loader output)
// ============================================================================

/// Untyped row as it comes out of a CSV or spreadsheet.
/// Missing columns are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPartyRow {
    /// Zero-based data row index in the source table
    pub row: usize,
    pub party_tc: String,
    pub pan: String,
    pub aadhar_no: String,
    pub dob: String,
    pub first_name: String,
    pub last_name: String,
    pub organization_name: String,
    pub ucic: String,
}

// ============================================================================
// PARTY RECORD
// ============================================================================

/// Canonical party record. Built once by the normalizer, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRecord {
    /// Source row index - the record's identity in every output
    pub row: usize,

    pub party_type: PartyType,

    /// Upper-cased, trimmed PAN. None when the source cell was blank.
    pub primary_id: Option<String>,

    /// Structural PAN validity, computed once at normalization
    pub primary_id_valid: bool,

    /// Last 4 digits of the Aadhar number, or empty
    pub secondary_id_suffix: String,

    pub date_of_birth: BirthDate,

    pub first_name: String,
    pub last_name: String,
    pub organization_name: String,

    /// Empty means "not yet assigned"
    pub unique_customer_id: String,
}

impl PartyRecord {
    pub fn is_person(&self) -> bool {
        self.party_type == PartyType::Person
    }

    pub fn has_ucic(&self) -> bool {
        !self.unique_customer_id.is_empty()
    }

    /// The PAN, but only when it passed validation
    pub fn valid_primary_id(&self) -> Option<&str> {
        if self.primary_id_valid {
            self.primary_id.as_deref()
        } else {
            None
        }
    }

    /// "FIRST LAST", trimmed (a missing first or last name leaves no stray space)
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The string compared by fuzzy matching and clustering:
    /// full name for persons, organization name otherwise.
    pub fn identity_name(&self) -> String {
        match self.party_type {
            PartyType::Person => self.full_name(),
            PartyType::Organization => self.organization_name.clone(),
        }
    }

    /// Stable fingerprint of the canonical identity fields.
    /// Two rows with identical canonical content share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.party_type.as_str(),
            self.primary_id.as_deref().unwrap_or(""),
            self.secondary_id_suffix,
            self.date_of_birth,
            self.first_name,
            self.last_name,
            self.organization_name,
        ));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// TESTS
// ============================================================================
