//! Assemblies and the invariants every assembly must satisfy.
//!
//! An [`Assembly`] stores positions into the [`Catalog`] it was enumerated
//! from; it never copies part data. [`Assembly::validate`] re-checks an
//! assembly against a query without running the search, so results can be
//! audited independently of how they were produced.

use bit_set::BitSet;
use thiserror::Error;

use crate::{
    catalog::{Catalog, PartIndex},
    enumerate::{EndPolicy, Query},
    part::Part,
};

/// Thrown by [`Assembly::validate`] for the first violated invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("assembly has no parts")]
    Empty,

    #[error("part {0} is not in the catalog")]
    UnknownPart(String),

    #[error("part {id} is used more than once")]
    ReusedPart { id: String },

    #[error("first part {id} starts at {found}, expected {expected}")]
    WrongStart {
        id: String,
        found: String,
        expected: String,
    },

    #[error("last part {id} ends at {found}, expected {expected}")]
    WrongEnd {
        id: String,
        found: String,
        expected: String,
    },

    #[error("part {position} does not share an overhang with the next part")]
    Broken { position: usize },

    #[error("assembly already reaches the end overhang at part {position}")]
    EarlyEnd { position: usize },

    #[error("assembly {index}: {source}")]
    InAssembly {
        index: usize,
        source: Box<AssemblyError>,
    },
}

/// An ordered chain of distinct catalog parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Assembly {
    parts: Vec<PartIndex>,
}

impl Assembly {
    pub(crate) fn new(parts: Vec<PartIndex>) -> Self {
        Self { parts }
    }

    /// Construct an [`Assembly`] from part ids, e.g. a stored kit assembly.
    pub fn from_ids<S: AsRef<str>>(catalog: &Catalog, ids: &[S]) -> Result<Self, AssemblyError> {
        ids.iter()
            .map(|id| {
                catalog
                    .position(id.as_ref())
                    .ok_or_else(|| AssemblyError::UnknownPart(id.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Positions of this assembly's parts in the catalog.
    pub fn indices(&self) -> &[PartIndex] {
        &self.parts
    }

    /// Resolve this assembly's parts against `catalog`.
    ///
    /// Panics if the assembly was not produced from `catalog`.
    pub fn parts<'a>(&'a self, catalog: &'a Catalog) -> impl Iterator<Item = &'a Part> + 'a {
        self.parts.iter().map(move |&ix| &catalog[ix])
    }

    /// Return the ids of this assembly's parts, in order.
    pub fn ids<'a>(&self, catalog: &'a Catalog) -> Vec<&'a str> {
        self.parts.iter().map(|&ix| catalog[ix].id()).collect()
    }

    /// Return `true` iff every adjacent pair of parts shares an overhang.
    pub fn is_chained(&self, catalog: &Catalog) -> bool {
        self.resolve(catalog).is_ok_and(|parts| {
            parts
                .windows(2)
                .all(|w| w[0].right_overhang() == w[1].left_overhang())
        })
    }

    /// Check every invariant of an assembly for `query` under `policy`:
    /// known parts, no reuse, correct start, unbroken chain, correct end, and
    /// (for [`EndPolicy::StopAtFirstMatch`]) no earlier part on the end tag.
    pub fn validate(
        &self,
        catalog: &Catalog,
        query: &Query,
        policy: EndPolicy,
    ) -> Result<(), AssemblyError> {
        let parts = self.resolve(catalog)?;
        let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
            return Err(AssemblyError::Empty);
        };

        let mut used = BitSet::with_capacity(catalog.len());
        for (&ix, part) in self.parts.iter().zip(&parts) {
            if !used.insert(ix) {
                return Err(AssemblyError::ReusedPart {
                    id: part.id().to_string(),
                });
            }
        }

        if first.left_overhang() != &query.start {
            return Err(AssemblyError::WrongStart {
                id: first.id().to_string(),
                found: first.left_overhang().to_string(),
                expected: query.start.to_string(),
            });
        }

        for (position, w) in parts.windows(2).enumerate() {
            if w[0].right_overhang() != w[1].left_overhang() {
                return Err(AssemblyError::Broken { position });
            }
        }

        if last.right_overhang() != &query.end {
            return Err(AssemblyError::WrongEnd {
                id: last.id().to_string(),
                found: last.right_overhang().to_string(),
                expected: query.end.to_string(),
            });
        }

        if policy == EndPolicy::StopAtFirstMatch {
            let inner = &parts[..parts.len() - 1];
            if let Some(position) = inner.iter().position(|p| p.right_overhang() == &query.end) {
                return Err(AssemblyError::EarlyEnd { position });
            }
        }

        Ok(())
    }

    fn resolve<'a>(&self, catalog: &'a Catalog) -> Result<Vec<&'a Part>, AssemblyError> {
        self.parts
            .iter()
            .map(|&ix| {
                catalog
                    .get(ix)
                    .ok_or_else(|| AssemblyError::UnknownPart(format!("#{ix}")))
            })
            .collect()
    }
}

/// Validate every assembly, reporting the first invalid one by position.
pub fn validate_all(
    catalog: &Catalog,
    query: &Query,
    policy: EndPolicy,
    assemblies: &[Assembly],
) -> Result<(), AssemblyError> {
    for (index, assembly) in assemblies.iter().enumerate() {
        assembly
            .validate(catalog, query, policy)
            .map_err(|e| AssemblyError::InAssembly {
                index,
                source: Box::new(e),
            })?;
    }
    Ok(())
}

/// Stable-sort assemblies by ascending length; ties keep discovery order.
pub fn sort_by_length(assemblies: &mut [Assembly]) {
    assemblies.sort_by_key(Assembly::len);
}
