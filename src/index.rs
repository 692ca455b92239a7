//! Discipline/gender grouping of normalized records

use crate::record::{Gender, Record};
use indexmap::IndexMap;

/// The two gender buckets of one discipline, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenderBuckets {
    pub male: Vec<Record>,
    pub female: Vec<Record>,
}

impl GenderBuckets {
    pub fn get(&self, gender: Gender) -> &[Record] {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }

    fn push(&mut self, gender: Gender, record: Record) {
        match gender {
            Gender::Male => self.male.push(record),
            Gender::Female => self.female.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.male.len() + self.female.len()
    }

    pub fn is_empty(&self) -> bool {
        self.male.is_empty() && self.female.is_empty()
    }
}

/// Records grouped by discipline, then gender.
///
/// Disciplines keep first-appearance order. Built once per load and never
/// modified afterwards; a reload builds a new index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedIndex {
    disciplines: IndexMap<String, GenderBuckets>,
}

impl GroupedIndex {
    /// Group records, silently dropping those with an unrecognized gender code.
    pub fn build(records: impl IntoIterator<Item = Record>) -> Self {
        Self::build_with_stats(records).0
    }

    /// Like `build`, also returning how many records were dropped for their
    /// gender code.
    pub fn build_with_stats(records: impl IntoIterator<Item = Record>) -> (Self, usize) {
        let mut disciplines: IndexMap<String, GenderBuckets> = IndexMap::new();
        let mut dropped = 0usize;

        for record in records {
            // The discipline key exists even if this row is dropped below
            let buckets = disciplines.entry(record.discipline.clone()).or_default();
            match record.gender() {
                Some(gender) => buckets.push(gender, record),
                None => {
                    log::trace!(
                        "Dropping {} record with gender code {:?}",
                        record.discipline,
                        record.gender_code
                    );
                    dropped += 1;
                }
            }
        }

        (GroupedIndex { disciplines }, dropped)
    }

    /// Discipline names in index order
    pub fn disciplines(&self) -> impl Iterator<Item = &str> {
        self.disciplines.keys().map(|k| k.as_str())
    }

    pub fn buckets(&self, discipline: &str) -> Option<&GenderBuckets> {
        self.disciplines.get(discipline)
    }

    /// Look up a discipline, returning the index's own copy of the key.
    pub fn get_key_value(&self, discipline: &str) -> Option<(&str, &GenderBuckets)> {
        self.disciplines
            .get_key_value(discipline)
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GenderBuckets)> {
        self.disciplines.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains(&self, discipline: &str) -> bool {
        self.disciplines.contains_key(discipline)
    }

    /// Number of disciplines
    pub fn len(&self) -> usize {
        self.disciplines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disciplines.is_empty()
    }

    /// Number of records held across all buckets
    pub fn record_count(&self) -> usize {
        self.disciplines.values().map(GenderBuckets::len).sum()
    }
}
