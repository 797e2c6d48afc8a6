//! In-memory repository for tests and small hand-built datasets.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::db::repository::{
    missing_sequence_number, CatalogRepository, ErrorContext, PhotometryRepository,
    RepositoryError, RepositoryResult,
};
use crate::models::{ObjectClassEntry, Observation, SequenceNumber, TimeSeries};

#[derive(Debug, Default)]
struct LocalData {
    entries: Vec<ObjectClassEntry>,
    lightcurves: HashMap<SequenceNumber, TimeSeries>,
}

/// A catalogue and its lightcurves held in memory.
///
/// Lightcurves are keyed by sequence number, like the photometry table they
/// stand in for. Cloning shares the underlying store.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

/// JSON fixture layout: `{"objects": [{"entry": {...}, "observations": [...]}]}`.
#[derive(Debug, Deserialize)]
struct LocalFixture {
    objects: Vec<LocalFixtureObject>,
}

#[derive(Debug, Deserialize)]
struct LocalFixtureObject {
    entry: ObjectClassEntry,
    #[serde(default)]
    observations: Vec<Observation>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object and its lightcurve.
    ///
    /// An entry without a sequence number is assigned the next free one.
    /// Returns the entry as stored.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::ValidationError`] when the entry's sequence number
    /// already belongs to another object.
    pub fn insert_object(
        &self,
        mut entry: ObjectClassEntry,
        series: TimeSeries,
    ) -> RepositoryResult<ObjectClassEntry> {
        let mut data = self.data.write();
        let sequence_number = match entry.sequence_number {
            Some(n) if data.lightcurves.contains_key(&n) => {
                return Err(RepositoryError::validation_with_context(
                    format!("sequence number {} is already in use", n),
                    ErrorContext::new("insert_object")
                        .with_entity("crossmatch")
                        .with_entity_id(&entry.id),
                ));
            }
            Some(n) => n,
            None => {
                let next = data
                    .lightcurves
                    .keys()
                    .map(|k| k.value())
                    .max()
                    .unwrap_or(0)
                    + 1;
                SequenceNumber(next)
            }
        };
        entry.sequence_number = Some(sequence_number);
        data.lightcurves.insert(sequence_number, series);
        data.entries.push(entry.clone());
        Ok(entry)
    }

    /// Build a repository from a JSON fixture.
    pub fn from_json_str(json: &str) -> RepositoryResult<Self> {
        let fixture: LocalFixture = serde_json::from_str(json)?;
        let repo = Self::new();
        for object in fixture.objects {
            repo.insert_object(object.entry, TimeSeries::new(object.observations))?;
        }
        info!(
            "Loaded {} objects into local repository",
            repo.data.read().entries.len()
        );
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.data.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().entries.is_empty()
    }

    pub fn clear(&self) {
        let mut data = self.data.write();
        data.entries.clear();
        data.lightcurves.clear();
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn list_entries(&self) -> RepositoryResult<Vec<ObjectClassEntry>> {
        Ok(self.data.read().entries.clone())
    }
}

#[async_trait]
impl PhotometryRepository for LocalRepository {
    async fn fetch_lightcurve(&self, entry: &ObjectClassEntry) -> RepositoryResult<TimeSeries> {
        let sequence_number = entry
            .sequence_number
            .ok_or_else(|| missing_sequence_number(entry))?;

        self.data
            .read()
            .lightcurves
            .get(&sequence_number)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("no lightcurve for sequence number {}", sequence_number),
                    ErrorContext::new("fetch_lightcurve")
                        .with_entity("photometry")
                        .with_entity_id(&entry.id),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> TimeSeries {
        (0..5).map(|i| Observation::new(i as f64, 1.0 + i as f64)).collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_sequence_numbers() {
        let repo = LocalRepository::new();
        let a = repo
            .insert_object(ObjectClassEntry::new(1i64, "EB"), series())
            .unwrap();
        let b = repo
            .insert_object(ObjectClassEntry::new(2i64, "EB"), series())
            .unwrap();
        assert_eq!(a.sequence_number, Some(SequenceNumber(1)));
        assert_eq!(b.sequence_number, Some(SequenceNumber(2)));

        assert_eq!(repo.list_entries().await.unwrap().len(), 2);
        assert_eq!(repo.fetch_lightcurve(&b).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_taken_sequence_number_is_rejected() {
        let repo = LocalRepository::new();
        let first = ObjectClassEntry::new(1i64, "EB").with_sequence_number(3);
        repo.insert_object(first.clone(), series()).unwrap();

        let clash = ObjectClassEntry::new(2i64, "RRab").with_sequence_number(3);
        let err = repo.insert_object(clash, TimeSeries::default()).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        // The first object's lightcurve is untouched
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.fetch_lightcurve(&first).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_missing_lightcurve() {
        let repo = LocalRepository::new();
        let orphan = ObjectClassEntry::new("X", "EB").with_sequence_number(99);
        let err = repo.fetch_lightcurve(&orphan).await.unwrap_err();
        assert!(err.is_not_found());

        let unnumbered = ObjectClassEntry::new("Y", "EB");
        assert!(repo.fetch_lightcurve(&unnumbered).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_from_json_fixture() {
        let json = r#"{
            "objects": [
                {
                    "entry": {"id": "V* RR Lyr", "label": "RRLyr", "sequence_number": 4, "vmag": 7.19},
                    "observations": [
                        {"time": 57000.5, "value": 1200.0, "uncertainty": 3.0},
                        {"time": 57000.1, "value": 1180.0, "uncertainty": 3.0, "airmass": 1.3}
                    ]
                }
            ]
        }"#;
        let repo = LocalRepository::from_json_str(json).unwrap();
        let entries = repo.list_entries().await.unwrap();
        assert_eq!(entries[0].title(), "V* RR Lyr (RRLyr, V=7.19)");

        let lc = repo.fetch_lightcurve(&entries[0]).await.unwrap();
        assert_eq!(lc.observations()[0].time, 57000.1);
        assert_eq!(lc.observations()[0].airmass, Some(1.3));
    }

    #[test]
    fn test_bad_fixture_is_validation_error() {
        let err = LocalRepository::from_json_str("{\"objects\": 3}").unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }
}
