//! Crossmatch catalogue entries.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::define_row_key;

define_row_key!(u64, SequenceNumber);
define_row_key!(i64, ImageId);

/// Catalogue identifier of a crossmatched object (e.g. a SIMBAD `MAIN_ID`).
///
/// Identifiers that parse as integers order numerically and sort before
/// free-text identifiers, which order lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawObjectId", into = "String")]
pub struct ObjectId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawObjectId {
    Integer(i64),
    Text(String),
}

impl From<RawObjectId> for ObjectId {
    fn from(raw: RawObjectId) -> Self {
        match raw {
            RawObjectId::Integer(v) => ObjectId(v.to_string()),
            RawObjectId::Text(s) => ObjectId::new(s),
        }
    }
}

impl ObjectId {
    /// Surrounding whitespace is stripped, as catalogue exports pad their columns.
    pub fn new(id: impl AsRef<str>) -> Self {
        ObjectId(id.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl Ord for ObjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        ObjectId::new(s)
    }
}

impl From<i64> for ObjectId {
    fn from(v: i64) -> Self {
        ObjectId(v.to_string())
    }
}

/// One row of the crossmatch table: an object, its classification and where
/// its lightcurve lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectClassEntry {
    pub id: ObjectId,
    pub label: String,
    /// 1-based row of the object in the photometry container.
    #[serde(default)]
    pub sequence_number: Option<SequenceNumber>,
    /// Catalogue V magnitude, absent when the catalogue has none.
    #[serde(default)]
    pub vmag: Option<f64>,
}

impl ObjectClassEntry {
    pub fn new(id: impl Into<ObjectId>, label: impl AsRef<str>) -> Self {
        Self {
            id: id.into(),
            label: label.as_ref().trim().to_string(),
            sequence_number: None,
            vmag: None,
        }
    }

    pub fn with_sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(SequenceNumber(sequence_number));
        self
    }

    /// NaN magnitudes are treated as missing.
    pub fn with_vmag(mut self, vmag: f64) -> Self {
        self.vmag = vmag.is_finite().then_some(vmag);
        self
    }

    /// Display title, e.g. `"V* RR Lyr (RRLyr, V=7.19)"`.
    pub fn title(&self) -> String {
        match self.vmag {
            Some(v) => format!("{} ({}, V={:.2})", self.id, self.label, v),
            None => format!("{} ({})", self.id, self.label),
        }
    }
}
