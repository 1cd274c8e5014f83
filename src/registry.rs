// 📒 Master Registry - Read-only snapshot of issued UCICs
//
// Built once per batch:
// - rows without a UCIC are dropped (they can never be a match result)
// - PERSON / ORGANIZATION partition
// - PAN index (first registry position wins)
// - DOB blocks per partition, registry order preserved
//
// Every lookup returns candidates in registry order so "first match wins"
// always means "smallest registry position".

use crate::record::{BirthDate, PartyRecord, PartyType};
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;

pub struct Registry {
    /// Records with a UCIC, in source order
    records: Vec<PartyRecord>,

    /// Positions into `records`
    persons: Vec<usize>,
    organizations: Vec<usize>,

    /// PAN → first registry position carrying it
    primary_index: HashMap<String, usize>,

    /// DOB → registry positions, per partition
    person_blocks: HashMap<NaiveDate, Vec<usize>>,
    organization_blocks: HashMap<NaiveDate, Vec<usize>>,

    /// Rows dropped for having no UCIC
    unassigned: usize,
}

impl Registry {
    /// Build the registry from normalized master records.
    pub fn build(master: Vec<PartyRecord>) -> Self {
        let total = master.len();
        let records: Vec<PartyRecord> = master.into_iter().filter(|r| r.has_ucic()).collect();
        let unassigned = total - records.len();

        let mut persons = Vec::new();
        let mut organizations = Vec::new();
        let mut primary_index = HashMap::new();
        let mut person_blocks: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
        let mut organization_blocks: HashMap<NaiveDate, Vec<usize>> = HashMap::new();

        for (pos, record) in records.iter().enumerate() {
            if let Some(pan) = &record.primary_id {
                primary_index.entry(pan.clone()).or_insert(pos);
            }

            let (partition, blocks) = match record.party_type {
                PartyType::Person => (&mut persons, &mut person_blocks),
                PartyType::Organization => (&mut organizations, &mut organization_blocks),
            };
            partition.push(pos);

            if let Some(dob) = record.date_of_birth.known() {
                blocks.entry(dob).or_default().push(pos);
            }
        }

        debug!(
            "Registry built: {} records ({} persons, {} organizations), {} without UCIC dropped, {} distinct PANs",
            records.len(),
            persons.len(),
            organizations.len(),
            unassigned,
            primary_index.len()
        );

        Registry {
            records,
            persons,
            organizations,
            primary_index,
            person_blocks,
            organization_blocks,
            unassigned,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PartyRecord] {
        &self.records
    }

    pub fn get(&self, pos: usize) -> Option<&PartyRecord> {
        self.records.get(pos)
    }

    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    pub fn organization_count(&self) -> usize {
        self.organizations.len()
    }

    /// Number of master rows dropped because their UCIC was empty
    pub fn unassigned_count(&self) -> usize {
        self.unassigned
    }

    /// Registry position of the first record with this exact PAN
    pub fn find_by_primary_id(&self, primary_id: &str) -> Option<usize> {
        self.primary_index.get(primary_id).copied()
    }

    /// Registry positions of one partition sharing a known DOB.
    /// An unknown DOB blocks with nothing.
    pub fn dob_block(&self, party_type: PartyType, dob: &BirthDate) -> &[usize] {
        let blocks = match party_type {
            PartyType::Person => &self.person_blocks,
            PartyType::Organization => &self.organization_blocks,
        };

        dob.known()
            .and_then(|date| blocks.get(&date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ucic: &str, party_type: PartyType, pan: Option<&str>, dob: Option<(i32, u32, u32)>) -> PartyRecord {
        PartyRecord {
            row: 0,
            party_type,
            primary_id: pan.map(str::to_string),
            primary_id_valid: pan.is_some(),
            secondary_id_suffix: String::new(),
            date_of_birth: dob
                .map(|(y, m, d)| BirthDate::Known(NaiveDate::from_ymd_opt(y, m, d).unwrap()))
                .unwrap_or(BirthDate::Unknown),
            first_name: String::new(),
            last_name: String::new(),
            organization_name: String::new(),
            unique_customer_id: ucic.to_string(),
        }
    }

    #[test]
    fn test_unassigned_records_dropped() {
        let registry = Registry::build(vec![
            record("U1", PartyType::Person, None, None),
            record("", PartyType::Person, Some("ABCDE1234F"), None),
            record("U3", PartyType::Organization, None, None),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.unassigned_count(), 1);
        assert_eq!(registry.person_count(), 1);
        assert_eq!(registry.organization_count(), 1);
        // PAN of the dropped record is not indexed
        assert_eq!(registry.find_by_primary_id("ABCDE1234F"), None);
    }

    #[test]
    fn test_primary_index_keeps_first_position() {
        let registry = Registry::build(vec![
            record("U1", PartyType::Person, Some("ABCDE1234F"), None),
            record("U2", PartyType::Organization, Some("ABCDE1234F"), None),
        ]);

        let pos = registry.find_by_primary_id("ABCDE1234F").unwrap();
        assert_eq!(registry.get(pos).unwrap().unique_customer_id, "U1");
    }

    #[test]
    fn test_dob_blocks_partitioned_and_ordered() {
        let registry = Registry::build(vec![
            record("U1", PartyType::Person, None, Some((1990, 1, 1))),
            record("U2", PartyType::Organization, None, Some((1990, 1, 1))),
            record("U3", PartyType::Person, None, Some((1990, 1, 1))),
            record("U4", PartyType::Person, None, Some((1991, 1, 1))),
            record("U5", PartyType::Person, None, None),
        ]);

        let dob = BirthDate::Known(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());

        assert_eq!(registry.dob_block(PartyType::Person, &dob), &[0, 2]);
        assert_eq!(registry.dob_block(PartyType::Organization, &dob), &[1]);
        assert!(registry.dob_block(PartyType::Person, &BirthDate::Unknown).is_empty());
    }
}
