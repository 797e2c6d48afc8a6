//! Repository over static CSV tables, read with polars.
//!
//! Three tables are understood:
//!
//! * crossmatch: `main_id`, `otype`, `Sequence_number`, optional `V`
//! * photometry, one row per sample: `sequence_number`, `tmid` (or `mjd`),
//!   `flux`, optional `fluxerr`, optional `airmass`, optional `image_id`
//! * exposure headers (optional): `image_id`, `airmass`
//!
//! Column names are matched case-insensitively. When the photometry table
//! has no airmass column, airmass is looked up from the header table by
//! `image_id`.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use log::{debug, info, warn};
use polars::prelude::*;

use crate::db::repo_config::FileSources;
use crate::db::repository::{
    missing_sequence_number, CatalogRepository, ErrorContext, PhotometryRepository,
    RepositoryError, RepositoryResult,
};
use crate::models::{ImageId, ObjectClassEntry, ObjectId, Observation, SequenceNumber, TimeSeries};

const ID_COLUMNS: &[&str] = &["main_id"];
const LABEL_COLUMNS: &[&str] = &["otype"];
const SEQUENCE_COLUMNS: &[&str] = &["sequence_number"];
const VMAG_COLUMNS: &[&str] = &["v", "vmag"];
const TIME_COLUMNS: &[&str] = &["tmid", "mjd", "time"];
const FLUX_COLUMNS: &[&str] = &["flux", "value"];
const FLUX_ERR_COLUMNS: &[&str] = &["fluxerr", "flux_err", "uncertainty"];
const AIRMASS_COLUMNS: &[&str] = &["airmass"];
const IMAGE_ID_COLUMNS: &[&str] = &["image_id"];

/// Crossmatch and photometry tables loaded into memory.
#[derive(Debug, Clone)]
pub struct FileRepository {
    sources: FileSources,
    entries: Vec<ObjectClassEntry>,
    lightcurves: HashMap<SequenceNumber, TimeSeries>,
}

impl FileRepository {
    /// Read every table named in `sources`.
    pub fn open(sources: FileSources) -> RepositoryResult<Self> {
        let entries = read_crossmatch(&sources.match_file)?;

        let airmass = match &sources.airmass_file {
            Some(path) => Some(read_airmass(path)?),
            None => None,
        };
        let lightcurves = read_photometry(&sources.data_file, airmass.as_ref())?;

        info!(
            "Loaded {} crossmatched objects and {} lightcurves from {}",
            entries.len(),
            lightcurves.len(),
            sources.data_file.display()
        );

        Ok(Self {
            sources,
            entries,
            lightcurves,
        })
    }

    pub fn sources(&self) -> &FileSources {
        &self.sources
    }
}

#[async_trait]
impl CatalogRepository for FileRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.sources.match_file.exists() && self.sources.data_file.exists())
    }

    async fn list_entries(&self) -> RepositoryResult<Vec<ObjectClassEntry>> {
        Ok(self.entries.clone())
    }
}

#[async_trait]
impl PhotometryRepository for FileRepository {
    async fn fetch_lightcurve(&self, entry: &ObjectClassEntry) -> RepositoryResult<TimeSeries> {
        let sequence_number = entry
            .sequence_number
            .ok_or_else(|| missing_sequence_number(entry))?;

        self.lightcurves
            .get(&sequence_number)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("no photometry rows for sequence number {}", sequence_number),
                    ErrorContext::new("fetch_lightcurve")
                        .with_entity("photometry")
                        .with_entity_id(&entry.id)
                        .with_details(self.sources.data_file.display().to_string()),
                )
            })
    }
}

fn read_csv(path: &Path) -> RepositoryResult<DataFrame> {
    if !path.exists() {
        return Err(RepositoryError::not_found_with_context(
            format!("{} does not exist", path.display()),
            ErrorContext::new("read_csv").with_entity("file"),
        ));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()?;

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Actual name of the first column matching one of `candidates`, ignoring case.
fn find_column(df: &DataFrame, candidates: &[&str]) -> Option<String> {
    let names = df.get_column_names();
    candidates.iter().find_map(|candidate| {
        names
            .iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(candidate))
            .map(|name| name.to_string())
    })
}

fn require_column(df: &DataFrame, candidates: &[&str], table: &str) -> RepositoryResult<String> {
    find_column(df, candidates).ok_or_else(|| {
        RepositoryError::validation_with_context(
            format!("missing column '{}'", candidates[0]),
            ErrorContext::new("read_table")
                .with_entity(table)
                .with_details(format!("accepted names: {}", candidates.join(", "))),
        )
    })
}

fn f64_values(df: &DataFrame, name: &str) -> RepositoryResult<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

fn i64_values(df: &DataFrame, name: &str) -> RepositoryResult<Vec<Option<i64>>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().collect())
}

fn str_values(df: &DataFrame, name: &str) -> RepositoryResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn read_crossmatch(path: &Path) -> RepositoryResult<Vec<ObjectClassEntry>> {
    let df = read_csv(path)?;

    let ids = str_values(&df, &require_column(&df, ID_COLUMNS, "crossmatch")?)?;
    let labels = str_values(&df, &require_column(&df, LABEL_COLUMNS, "crossmatch")?)?;
    let sequence = match find_column(&df, SEQUENCE_COLUMNS) {
        Some(name) => i64_values(&df, &name)?,
        None => vec![None; df.height()],
    };
    let vmag = match find_column(&df, VMAG_COLUMNS) {
        Some(name) => f64_values(&df, &name)?,
        None => vec![None; df.height()],
    };

    let mut entries = Vec::with_capacity(df.height());
    let mut skipped = 0usize;
    for (row, (id, label)) in ids.into_iter().zip(labels).enumerate() {
        let (Some(id), Some(label)) = (id, label) else {
            skipped += 1;
            continue;
        };
        if id.trim().is_empty() || label.trim().is_empty() {
            skipped += 1;
            continue;
        }

        let mut entry = ObjectClassEntry::new(ObjectId::new(id), label);
        if let Some(n) = sequence[row].filter(|n| *n > 0) {
            entry = entry.with_sequence_number(n as u64);
        }
        if let Some(v) = vmag[row] {
            entry = entry.with_vmag(v);
        }
        entries.push(entry);
    }

    if skipped > 0 {
        warn!(
            "Skipped {} crossmatch rows without an id or class in {}",
            skipped,
            path.display()
        );
    }
    Ok(entries)
}

fn read_airmass(path: &Path) -> RepositoryResult<HashMap<ImageId, f64>> {
    let df = read_csv(path)?;
    let image_ids = i64_values(&df, &require_column(&df, IMAGE_ID_COLUMNS, "image_headers")?)?;
    let airmass = f64_values(&df, &require_column(&df, AIRMASS_COLUMNS, "image_headers")?)?;

    Ok(image_ids
        .into_iter()
        .zip(airmass)
        .filter_map(|(id, a)| Some((ImageId(id?), a?)))
        .collect())
}

fn read_photometry(
    path: &Path,
    headers: Option<&HashMap<ImageId, f64>>,
) -> RepositoryResult<HashMap<SequenceNumber, TimeSeries>> {
    let df = read_csv(path)?;
    let height = df.height();

    let sequence = i64_values(&df, &require_column(&df, SEQUENCE_COLUMNS, "photometry")?)?;
    let times = f64_values(&df, &require_column(&df, TIME_COLUMNS, "photometry")?)?;
    let fluxes = f64_values(&df, &require_column(&df, FLUX_COLUMNS, "photometry")?)?;
    let errors = match find_column(&df, FLUX_ERR_COLUMNS) {
        Some(name) => f64_values(&df, &name)?,
        None => vec![None; height],
    };

    let airmass = match find_column(&df, AIRMASS_COLUMNS) {
        Some(name) => f64_values(&df, &name)?,
        None => match (headers, find_column(&df, IMAGE_ID_COLUMNS)) {
            (Some(headers), Some(name)) => i64_values(&df, &name)?
                .into_iter()
                .map(|id| id.and_then(|id| headers.get(&ImageId(id)).copied()))
                .collect(),
            _ => vec![None; height],
        },
    };

    let mut grouped: HashMap<SequenceNumber, Vec<Observation>> = HashMap::new();
    let mut orphaned = 0usize;
    for row in 0..height {
        let Some(n) = sequence[row].filter(|n| *n > 0) else {
            orphaned += 1;
            continue;
        };
        // Missing time or flux become NaN so the analysis can count them.
        let observation = Observation {
            time: times[row].unwrap_or(f64::NAN),
            value: fluxes[row].unwrap_or(f64::NAN),
            uncertainty: errors[row],
            airmass: airmass[row],
        };
        grouped
            .entry(SequenceNumber(n as u64))
            .or_default()
            .push(observation);
    }

    if orphaned > 0 {
        warn!(
            "Ignored {} photometry rows without a sequence number in {}",
            orphaned,
            path.display()
        );
    }

    Ok(grouped
        .into_iter()
        .map(|(n, observations)| (n, TimeSeries::new(observations)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_find_column_ignores_case() {
        let df = df!("MAIN_ID" => &["a"], "Sequence_number" => &[1i64]).unwrap();
        assert_eq!(find_column(&df, ID_COLUMNS).as_deref(), Some("MAIN_ID"));
        assert_eq!(
            find_column(&df, SEQUENCE_COLUMNS).as_deref(),
            Some("Sequence_number")
        );
        assert!(find_column(&df, VMAG_COLUMNS).is_none());
    }

    #[tokio::test]
    async fn test_airmass_joined_from_headers() {
        let dir = tempfile::tempdir().unwrap();
        let matches = write(
            &dir,
            "match.csv",
            "MAIN_ID,OTYPE,Sequence_number,V\nV* AB Cas,EB,1,10.1\n",
        );
        let data = write(
            &dir,
            "data.csv",
            "sequence_number,tmid,flux,fluxerr,image_id\n1,57000.1,100.0,1.0,11\n1,57000.2,101.0,1.0,12\n",
        );
        let headers = write(&dir, "headers.csv", "image_id,airmass\n11,1.2\n12,1.4\n");

        let repo =
            FileRepository::open(FileSources::new(matches, data).with_airmass_file(headers))
                .unwrap();
        let entries = repo.list_entries().await.unwrap();
        let lc = repo.fetch_lightcurve(&entries[0]).await.unwrap();
        let airmass: Vec<Option<f64>> = lc.observations().iter().map(|o| o.airmass).collect();
        assert_eq!(airmass, vec![Some(1.2), Some(1.4)]);
    }

    #[test]
    fn test_missing_required_column() {
        let dir = tempfile::tempdir().unwrap();
        let matches = write(&dir, "match.csv", "name,otype\nfoo,EB\n");
        let data = write(&dir, "data.csv", "sequence_number,tmid,flux\n1,1.0,1.0\n");
        let err = FileRepository::open(FileSources::new(matches, data)).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileRepository::open(FileSources::new(
            dir.path().join("nope.csv"),
            dir.path().join("data.csv"),
        ))
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
