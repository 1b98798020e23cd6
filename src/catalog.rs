//! An ordered, duplicate-free collection of parts.

use std::collections::HashSet;

use thiserror::Error;

use crate::part::Part;

/// Position of a part within its [`Catalog`].
pub type PartIndex = usize;

/// Thrown by [`Catalog::new`] when two parts share an id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate part id {0:?}")]
    DuplicateId(String),
}

/// The parts available for assembly, in the order they were provided.
///
/// The order is significant: the search tries candidate parts in catalog
/// order, so a fixed catalog always produces the same sequence of
/// assemblies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    parts: Vec<Part>,
}

impl Catalog {
    /// Construct a [`Catalog`], failing on the first repeated part id.
    pub fn new(parts: Vec<Part>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(parts.len());
        for part in &parts {
            if !seen.insert(part.id()) {
                return Err(CatalogError::DuplicateId(part.id().to_string()));
            }
        }
        Ok(Self { parts })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, ix: PartIndex) -> Option<&Part> {
        self.parts.get(ix)
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    /// Return the index of the part with identity `id`, if any.
    pub fn position(&self, id: &str) -> Option<PartIndex> {
        self.parts.iter().position(|p| p.id() == id)
    }
}

impl std::ops::Index<PartIndex> for Catalog {
    type Output = Part;
    fn index(&self, ix: PartIndex) -> &Part {
        &self.parts[ix]
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Part;
    type IntoIter = std::slice::Iter<'a, Part>;
    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}
