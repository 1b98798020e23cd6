//! Load part catalogs from CSV.
//!
//! The first row is a header naming the columns. `id`, `left_overhang` and
//! `right_overhang` are required; `name`, `description`, `color` and
//! `feature_type` are optional and empty cells count as absent. Any other
//! column is rejected. A malformed row fails the whole load; rows are never
//! skipped.

use std::{fs, path::Path};

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::{Catalog, CatalogError},
    part::{Part, PartError, PartFields},
};

const REQUIRED: [&str; 3] = ["id", "left_overhang", "right_overhang"];
const OPTIONAL: [&str; 4] = ["name", "description", "color", "feature_type"];

/// Thrown by [`parse_catalog`] and [`parse_catalog_str`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("line {line}: {source}")]
    InvalidRow { line: u64, source: PartError },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Column positions resolved from the header row.
struct Columns {
    id: usize,
    left_overhang: usize,
    right_overhang: usize,
    name: Option<usize>,
    description: Option<usize>,
    color: Option<usize>,
    feature_type: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        if let Some(unknown) = headers
            .iter()
            .find(|h| !REQUIRED.contains(h) && !OPTIONAL.contains(h))
        {
            return Err(LoadError::UnknownColumn(unknown.to_string()));
        }

        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));

        Ok(Self {
            id: require("id")?,
            left_overhang: require("left_overhang")?,
            right_overhang: require("right_overhang")?,
            name: find("name"),
            description: find("description"),
            color: find("color"),
            feature_type: find("feature_type"),
        })
    }

    fn fields<'r>(&self, record: &'r StringRecord) -> PartFields<'r> {
        let cell = |ix: usize| record.get(ix).unwrap_or("");
        let optional = |ix: Option<usize>| ix.map(cell).filter(|s| !s.is_empty());
        PartFields {
            id: cell(self.id),
            name: optional(self.name),
            description: optional(self.description),
            color: optional(self.color),
            feature_type: optional(self.feature_type),
            left_overhang: cell(self.left_overhang),
            right_overhang: cell(self.right_overhang),
        }
    }
}

/// Load a catalog from the CSV file at `p`.
pub fn parse_catalog(p: &Path) -> Result<Catalog, LoadError> {
    let contents = fs::read_to_string(p)?;
    parse_catalog_str(&contents)
}

/// Load a catalog from CSV text, keeping row order.
pub fn parse_catalog_str(input: &str) -> Result<Catalog, LoadError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(input.as_bytes());

    let columns = Columns::from_headers(reader.headers()?)?;

    let mut parts = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let part = Part::from_fields(&columns.fields(&record))
            .map_err(|source| LoadError::InvalidRow { line, source })?;
        parts.push(part);
    }

    debug!(parts = parts.len(), "loaded catalog");
    Ok(Catalog::new(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::FeatureType;

    #[test]
    fn parse_rows_in_order() {
        let csv = "\
id,name,left_overhang,right_overhang,color,feature_type
pro1,J23100,GGAG,AATG,#ff0000,promoter
cds1,,AATG,GCTT,,CDS
";
        let catalog = parse_catalog_str(csv).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].id(), "pro1");
        assert_eq!(catalog[0].name(), Some("J23100"));
        assert_eq!(catalog[0].feature_type(), Some(FeatureType::Promoter));
        assert_eq!(catalog[1].name(), None);
        assert_eq!(catalog[1].color(), None);
        assert_eq!(catalog[1].right_overhang().as_str(), "GCTT");
    }

    #[test]
    fn bad_row_reports_line() {
        let csv = "\
id,left_overhang,right_overhang
a,GGAG,AATG
b,AATG,CGCX
";
        match parse_catalog_str(csv) {
            Err(LoadError::InvalidRow { line, source }) => {
                assert_eq!(line, 3);
                assert!(matches!(source, PartError::InvalidOverhang { field: "right_overhang", .. }));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn header_checks() {
        let missing = "id,left_overhang\na,GGAG\n";
        assert!(matches!(
            parse_catalog_str(missing),
            Err(LoadError::MissingColumn("right_overhang"))
        ));

        let unknown = "id,left_overhang,right_overhang,mass\na,GGAG,AATG,3\n";
        assert!(matches!(
            parse_catalog_str(unknown),
            Err(LoadError::UnknownColumn(c)) if c == "mass"
        ));
    }

    #[test]
    fn duplicate_ids_fail() {
        let csv = "id,left_overhang,right_overhang\na,GGAG,AATG\na,AATG,CGCT\n";
        assert!(matches!(
            parse_catalog_str(csv),
            Err(LoadError::Catalog(CatalogError::DuplicateId(id))) if id == "a"
        ));
    }

    #[test]
    fn empty_catalog() {
        let catalog = parse_catalog_str("id,left_overhang,right_overhang\n").unwrap();
        assert!(catalog.is_empty());
    }
}
