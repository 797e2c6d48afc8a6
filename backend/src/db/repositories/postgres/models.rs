use diesel::prelude::*;

use super::schema::crossmatch;
use crate::models::{ObjectClassEntry, ObjectId, Observation};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crossmatch)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CrossmatchRow {
    pub crossmatch_id: i64,
    pub main_id: String,
    pub otype: String,
    pub sequence_number: Option<i64>,
    pub vmag: Option<f64>,
}

impl CrossmatchRow {
    pub fn into_entry(self) -> ObjectClassEntry {
        let mut entry = ObjectClassEntry::new(ObjectId::new(&self.main_id), &self.otype);
        if let Some(n) = self.sequence_number.filter(|n| *n > 0) {
            entry = entry.with_sequence_number(n as u64);
        }
        if let Some(v) = self.vmag {
            entry = entry.with_vmag(v);
        }
        entry
    }
}

/// One photometry sample joined with the airmass of its exposure.
#[derive(Debug, Clone, Queryable)]
pub struct SampleRow {
    pub tmid: f64,
    pub flux: Option<f64>,
    pub fluxerr: Option<f64>,
    pub airmass: Option<f64>,
}

impl From<SampleRow> for Observation {
    fn from(row: SampleRow) -> Self {
        Observation {
            time: row.tmid,
            value: row.flux.unwrap_or(f64::NAN),
            uncertainty: row.fluxerr,
            airmass: row.airmass,
        }
    }
}
