//! Explorer session: browse crossmatched objects and analyse their lightcurves.
//!
//! The session never remembers "the current object". Selecting an object
//! returns a [`Selection`] value which the caller passes back to every
//! analysis, so several selections can be held and compared at once.

use std::collections::BTreeSet;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::algorithms::{estimate_period, fold, PeriodogramConfig, PhaseOptions, PhasedSeries};
use crate::config::ExplorerConfig;
use crate::db::{FullRepository, RepositoryFactory};
use crate::error::ExplorerResult;
use crate::models::{ObjectClassEntry, PowerSeries, TimeSeries};
use crate::selector::ObjectSelector;

/// One object and its lightcurve, as returned by
/// [`ExplorerSession::select_object`].
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub entry: ObjectClassEntry,
    pub index: usize,
    pub series: TimeSeries,
    /// Number of objects in the entry's class.
    pub class_size: usize,
}

impl Selection {
    /// Plot title: `"{name} ({class}, V={vmag:.2})"`, or without V when unknown.
    pub fn title(&self) -> String {
        self.entry.title()
    }

    /// Time axis label, `"MJD - {first whole day}"`.
    pub fn time_label(&self) -> String {
        self.series.time_label()
    }

    pub fn label(&self) -> &str {
        &self.entry.label
    }

    /// The lightcurve for display: raw flux, or airmass-detrended magnitudes.
    pub fn view(&self, detrend: bool) -> TimeSeries {
        if detrend {
            self.series.detrended_magnitudes()
        } else {
            self.series.clone()
        }
    }
}

/// Catalogue, repository and default settings for an exploration session.
pub struct ExplorerSession {
    repository: Arc<dyn FullRepository>,
    selector: ObjectSelector,
    periodogram: PeriodogramConfig,
}

impl ExplorerSession {
    /// Load the crossmatch catalogue from `repository`.
    pub async fn open(repository: Arc<dyn FullRepository>) -> ExplorerResult<Self> {
        let entries = repository.list_entries().await?;
        let selector = ObjectSelector::new(entries);
        info!(
            "Explorer session ready: {} objects in {} classes",
            selector.total(),
            selector.keys().len()
        );
        Ok(Self {
            repository,
            selector,
            periodogram: PeriodogramConfig::default(),
        })
    }

    /// Build the configured repository and open a session on it.
    pub async fn from_config(config: &ExplorerConfig) -> ExplorerResult<Self> {
        let repository = RepositoryFactory::from_repository_config(&config.repository).await?;
        Ok(Self::open(repository)
            .await?
            .with_periodogram_config(config.periodogram.clone()))
    }

    pub fn with_periodogram_config(mut self, config: PeriodogramConfig) -> Self {
        self.periodogram = config;
        self
    }

    /// Default settings used by [`find_period_default`](Self::find_period_default).
    pub fn periodogram_config(&self) -> &PeriodogramConfig {
        &self.periodogram
    }

    pub fn selector(&self) -> &ObjectSelector {
        &self.selector
    }

    /// Distinct object classes.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.selector.keys()
    }

    /// Number of objects in class `label`.
    pub fn nobjects(&self, label: &str) -> usize {
        self.selector.count(label)
    }

    /// Select the `index`-th object of class `label` and load its lightcurve.
    pub async fn select_object(&self, label: &str, index: usize) -> ExplorerResult<Selection> {
        let entry = self.selector.select(label, index)?.clone();
        let series = self.repository.fetch_lightcurve(&entry).await?;
        let class_size = self.selector.count(label);
        info!(
            "Selected {} ({} of {} {} objects, {} samples)",
            entry.id,
            index + 1,
            class_size,
            label,
            series.len()
        );
        Ok(Selection {
            entry,
            index,
            series,
            class_size,
        })
    }

    /// Load every object of class `label`, in selection order.
    pub async fn select_all(&self, label: &str) -> ExplorerResult<Vec<Selection>> {
        let count = self.selector.entries(label)?.len();
        let mut selections = Vec::with_capacity(count);
        for index in 0..count {
            selections.push(self.select_object(label, index).await?);
        }
        Ok(selections)
    }

    /// Lomb-Scargle periodogram of the selected lightcurve.
    pub fn find_period(
        &self,
        selection: &Selection,
        config: &PeriodogramConfig,
    ) -> ExplorerResult<PowerSeries> {
        Ok(estimate_period(&selection.series, config)?)
    }

    pub fn find_period_default(&self, selection: &Selection) -> ExplorerResult<PowerSeries> {
        self.find_period(selection, &self.periodogram)
    }

    /// Fold the selected lightcurve on `period`, optionally on the
    /// detrended magnitudes.
    pub fn fold(
        &self,
        selection: &Selection,
        period: f64,
        options: PhaseOptions,
        detrend: bool,
    ) -> ExplorerResult<PhasedSeries> {
        Ok(fold(&selection.view(detrend), period, options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::error::{ExplorerError, SelectionError};
    use crate::models::Observation;

    fn sinusoid(period: f64) -> TimeSeries {
        (0..120)
            .map(|i| {
                let t = 57000.0 + i as f64 * 0.173;
                let flux = 1000.0 + 50.0 * (2.0 * std::f64::consts::PI * t / period).sin();
                Observation::new(t, flux).with_uncertainty(2.0)
            })
            .collect()
    }

    async fn session() -> ExplorerSession {
        let repo = LocalRepository::new();
        repo.insert_object(
            ObjectClassEntry::new(2i64, "RRab").with_vmag(12.3456),
            sinusoid(0.61),
        )
        .unwrap();
        repo.insert_object(ObjectClassEntry::new(1i64, "RRab"), sinusoid(0.55))
            .unwrap();
        repo.insert_object(ObjectClassEntry::new(3i64, "EB"), sinusoid(1.3))
            .unwrap();
        ExplorerSession::open(Arc::new(repo)).await.unwrap()
    }

    #[tokio::test]
    async fn test_select_and_describe() {
        let session = session().await;
        assert_eq!(session.keys().into_iter().collect::<Vec<_>>(), vec!["EB", "RRab"]);
        assert_eq!(session.nobjects("RRab"), 2);

        let selection = session.select_object("RRab", 1).await.unwrap();
        assert_eq!(selection.entry.id.as_str(), "2");
        assert_eq!(selection.class_size, 2);
        assert_eq!(selection.title(), "2 (RRab, V=12.35)");
        assert_eq!(selection.time_label(), "MJD - 57000");
    }

    #[tokio::test]
    async fn test_select_miss_keeps_selection_kind() {
        let session = session().await;
        let err = session.select_object("EB", 5).await.unwrap_err();
        assert!(matches!(
            err,
            ExplorerError::Selection(SelectionError::NotFound { index: Some(5), .. })
        ));
    }

    #[tokio::test]
    async fn test_find_period_and_fold() {
        let session = session().await;
        let selection = session.select_object("RRab", 1).await.unwrap();
        let config = PeriodogramConfig::default()
            .with_period_range(0.3, 1.0)
            .with_n_frequencies(4000);
        let ps = session.find_period(&selection, &config).unwrap();
        assert!((ps.peak_period() - 0.61).abs() / 0.61 < 0.01);

        let folded = session
            .fold(&selection, ps.peak_period(), PhaseOptions::default(), false)
            .unwrap();
        assert_eq!(folded.len(), 2 * selection.series.len());
    }

    #[tokio::test]
    async fn test_select_all() {
        let session = session().await;
        let all = session.select_all("RRab").await.unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.entry.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(session.select_all("Mira").await.is_err());
    }
}
