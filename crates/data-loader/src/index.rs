//! Loading and indexing of the clean dataset.
//!
//! A [`Dataset`] keeps records in file order (so writes are stable) and an
//! id -> position map for O(1) lookups by the merger and the auditor.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::info;

impl Dataset {
    /// Load the clean dataset from a CSV file.
    ///
    /// Fails when the file is missing, a required column is absent, an id
    /// or a non-empty year is malformed, a rating is outside [0, 5], or an id repeats.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let table = parser::read_table(path)?;
        let dataset = parser::parse_records(&table, &path.display().to_string())?;
        let (total, rated) = dataset.counts();
        info!(
            "Loaded {} records ({} rated) from {}",
            total,
            rated,
            path.display()
        );
        Ok(dataset)
    }

    /// Append a record, enforcing unique identifiers.
    pub fn insert_record(&mut self, record: Record) -> Result<()> {
        if self.by_id.contains_key(&record.id) {
            return Err(DataLoadError::DuplicateId { id: record.id });
        }
        self.by_id.insert(record.id, self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Records that already carry a rating
    pub fn rated_records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.rating.is_some())
    }

    /// Records whose rating is missing
    pub fn unrated_records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.rating.is_none())
    }

    /// A copy holding only the records matching `keep`, same headers.
    pub fn filtered(&self, keep: impl Fn(&Record) -> bool) -> Self {
        let mut subset = Self::new(self.headers.clone());
        for record in self.records.iter().filter(|&r| keep(r)) {
            subset.by_id.insert(record.id, subset.records.len());
            subset.records.push(record.clone());
        }
        subset
    }

    /// Set the rating of one record. Returns false for unknown ids.
    pub fn set_rating(&mut self, id: RecordId, rating: Option<f64>) -> bool {
        match self.by_id.get(&id) {
            Some(&idx) => {
                self.records[idx].rating = rating;
                true
            }
            None => false,
        }
    }

    /// Set a pass-through cell of one record. Returns false for unknown ids.
    pub fn set_extra(&mut self, id: RecordId, column: &str, value: impl Into<String>) -> bool {
        match self.by_id.get(&id) {
            Some(&idx) => {
                self.records[idx]
                    .extra
                    .insert(column.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    /// Add a column to the output schema, after `after` when present.
    ///
    /// No-op when the column already exists.
    pub fn add_column(&mut self, name: &str, after: &str) {
        if self.headers.iter().any(|h| h == name) {
            return;
        }
        let position = self
            .headers
            .iter()
            .position(|h| h == after)
            .map(|idx| idx + 1)
            .unwrap_or(self.headers.len());
        self.headers.insert(position, name.to_string());
    }

    /// (total records, records with a rating)
    pub fn counts(&self) -> (usize, usize) {
        (self.records.len(), self.rated_records().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record(id: RecordId, rating: Option<f64>) -> Record {
        Record {
            id,
            title: format!("Film {}", id),
            year: Some(2001),
            genres: Some("Drama".to_string()),
            rating,
            extra: HashMap::new(),
        }
    }

    fn dataset() -> Dataset {
        let mut dataset = Dataset::new(vec![
            "tmdb_id".to_string(),
            "title".to_string(),
            "lb_rating".to_string(),
            "year".to_string(),
        ]);
        dataset.insert_record(record(1, Some(3.5))).unwrap();
        dataset.insert_record(record(2, None)).unwrap();
        dataset.insert_record(record(3, Some(4.0))).unwrap();
        dataset
    }

    #[test]
    fn test_counts_and_lookup() {
        let dataset = dataset();
        assert_eq!(dataset.counts(), (3, 2));
        assert_eq!(dataset.get(2).unwrap().title, "Film 2");
        assert!(dataset.get(99).is_none());
        assert_eq!(dataset.unrated_records().count(), 1);
    }

    #[test]
    fn test_filtered_keeps_order_and_index() {
        let rated = dataset().filtered(|r| r.rating.is_some());
        let ids: Vec<_> = rated.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(rated.contains(3));
        assert!(!rated.contains(2));
        assert_eq!(rated.headers().len(), 4);
    }

    #[test]
    fn test_set_rating_unknown_id() {
        let mut dataset = dataset();
        assert!(dataset.set_rating(2, Some(2.5)));
        assert_eq!(dataset.get(2).unwrap().rating, Some(2.5));
        assert!(!dataset.set_rating(42, Some(1.0)));
    }

    #[test]
    fn test_add_column_after() {
        let mut dataset = dataset();
        dataset.add_column("lb_rating_source", "lb_rating");
        dataset.add_column("lb_rating_source", "lb_rating");
        assert_eq!(
            dataset.headers(),
            &["tmdb_id", "title", "lb_rating", "lb_rating_source", "year"]
        );
    }
}
