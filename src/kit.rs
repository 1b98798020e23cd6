//! MoClo kits: a syntax, its part definitions and named assemblies.
//!
//! Kits are exchanged as JSON. Unknown fields are rejected, and every
//! overhang and color is validated while deserializing.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    assembly::{Assembly, AssemblyError},
    catalog::{Catalog, CatalogError},
    part::{Overhang, Part, PartError},
};

#[derive(Debug, Error)]
pub enum KitError {
    #[error("malformed kit JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Part(#[from] PartError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("assembly {name}: {source}")]
    Assembly {
        name: String,
        source: AssemblyError,
    },

    #[error("assembly {0}: adjacent parts do not share an overhang")]
    Unchained(String),

    #[error("part {id} uses overhang {overhang} which the syntax does not declare")]
    UndeclaredOverhang { id: String, overhang: Overhang },
}

/// The ordered overhangs a MoClo standard declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Syntax {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub overhangs: Vec<Overhang>,
}

impl Syntax {
    pub fn contains(&self, overhang: &Overhang) -> bool {
        self.overhangs.contains(overhang)
    }

    /// Return `(part id, overhang)` for every part overhang missing from this
    /// syntax, in catalog order.
    pub fn undeclared_overhangs<'a>(&self, catalog: &'a Catalog) -> Vec<(&'a str, &'a Overhang)> {
        catalog
            .iter()
            .flat_map(|p| [(p.id(), p.left_overhang()), (p.id(), p.right_overhang())])
            .filter(|(_, oh)| !self.contains(oh))
            .collect()
    }
}

/// A named assembly, stored as part ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KitAssembly {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parts: Vec<String>,
}

impl KitAssembly {
    /// Record an enumerated assembly by the ids of its parts.
    pub fn from_assembly(name: Option<String>, assembly: &Assembly, catalog: &Catalog) -> Self {
        Self {
            name,
            description: None,
            parts: assembly.ids(catalog).into_iter().map(str::to_string).collect(),
        }
    }

    fn label(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("#{index}"))
    }
}

/// A syntax, the parts that follow it and assemblies built from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Kit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assemblies: Vec<KitAssembly>,
    pub syntax: Syntax,
    pub part_definitions: Vec<Part>,
}

impl Kit {
    pub fn from_json(input: &str) -> Result<Self, KitError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json(&self) -> Result<String, KitError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a validated [`Catalog`] from this kit's part definitions.
    pub fn catalog(&self) -> Result<Catalog, KitError> {
        if self.part_definitions.iter().any(|p| p.id().trim().is_empty()) {
            return Err(PartError::EmptyId.into());
        }
        Ok(Catalog::new(self.part_definitions.clone())?)
    }

    /// Check the whole kit: part ids are unique, every part overhang is
    /// declared by the syntax (when the syntax declares any), and every
    /// assembly names known parts that chain by overhang.
    pub fn validate(&self) -> Result<Catalog, KitError> {
        let catalog = self.catalog()?;

        if !self.syntax.overhangs.is_empty() {
            if let Some((id, overhang)) = self.syntax.undeclared_overhangs(&catalog).first() {
                return Err(KitError::UndeclaredOverhang {
                    id: id.to_string(),
                    overhang: (*overhang).clone(),
                });
            }
        }

        for (index, kit_assembly) in self.assemblies.iter().enumerate() {
            let assembly = Assembly::from_ids(&catalog, &kit_assembly.parts[..]).map_err(|source| {
                KitError::Assembly {
                    name: kit_assembly.label(index),
                    source,
                }
            })?;
            if assembly.is_empty() {
                return Err(KitError::Assembly {
                    name: kit_assembly.label(index),
                    source: AssemblyError::Empty,
                });
            }
            if !assembly.is_chained(&catalog) {
                return Err(KitError::Unchained(kit_assembly.label(index)));
            }
        }

        debug!(
            parts = catalog.len(),
            assemblies = self.assemblies.len(),
            "kit validated"
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIT: &str = r##"{
        "name": "demo",
        "syntax": { "name": "standard", "overhangs": ["GGAG", "AATG", "CGCT"] },
        "part_definitions": [
            { "id": "pro", "left_overhang": "GGAG", "right_overhang": "AATG",
              "feature_type": "promoter", "color": "#ff0000" },
            { "id": "cds", "left_overhang": "AATG", "right_overhang": "CGCT",
              "feature_type": "CDS" }
        ],
        "assemblies": [ { "name": "unit", "parts": ["pro", "cds"] } ]
    }"##;

    #[test]
    fn parse_and_validate() {
        let kit = Kit::from_json(KIT).unwrap();
        assert_eq!(kit.syntax.overhangs.len(), 3);
        let catalog = kit.validate().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[1].id(), "cds");
    }

    #[test]
    fn json_round_trip() {
        let kit = Kit::from_json(KIT).unwrap();
        let again = Kit::from_json(&kit.to_json().unwrap()).unwrap();
        assert_eq!(kit, again);
    }

    #[test]
    fn rejects_bad_fields() {
        let bad_overhang = KIT.replace("\"GGAG\", \"AATG\"", "\"GGAX\", \"AATG\"");
        assert!(matches!(Kit::from_json(&bad_overhang), Err(KitError::Json(_))));

        let extra = KIT.replace("\"name\": \"demo\"", "\"name\": \"demo\", \"vendor\": \"x\"");
        assert!(matches!(Kit::from_json(&extra), Err(KitError::Json(_))));
    }

    #[test]
    fn unchained_assembly() {
        let mut kit = Kit::from_json(KIT).unwrap();
        kit.assemblies[0].parts.reverse();
        assert!(matches!(kit.validate(), Err(KitError::Unchained(name)) if name == "unit"));

        kit.assemblies[0].parts = vec!["pro".to_string(), "ghost".to_string()];
        assert!(matches!(
            kit.validate(),
            Err(KitError::Assembly { source: AssemblyError::UnknownPart(_), .. })
        ));
    }

    #[test]
    fn undeclared_overhang() {
        let mut kit = Kit::from_json(KIT).unwrap();
        kit.syntax.overhangs.pop();
        match kit.validate() {
            Err(KitError::UndeclaredOverhang { id, overhang }) => {
                assert_eq!(id, "cds");
                assert_eq!(overhang.as_str(), "CGCT");
            }
            other => panic!("expected undeclared overhang, got {other:?}"),
        }

        kit.syntax.overhangs.clear();
        assert!(kit.validate().is_ok());
    }

    #[test]
    fn from_enumerated_assembly() {
        let kit = Kit::from_json(KIT).unwrap();
        let catalog = kit.catalog().unwrap();
        let assembly = Assembly::from_ids(&catalog, &["pro", "cds"]).unwrap();
        let named = KitAssembly::from_assembly(Some("a1".to_string()), &assembly, &catalog);
        assert_eq!(named.parts, vec!["pro", "cds"]);
        assert_eq!(named.name.as_deref(), Some("a1"));
    }
}
