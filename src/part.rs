//! Validated MoClo part records.
//!
//! A [`Part`] is one interchangeable DNA fragment bounded by a left and a
//! right [`Overhang`]. Every field is validated at construction, so the rest
//! of the crate never sees a malformed overhang or color.

use std::{fmt::Display, str::FromStr};

use bio::alphabets::dna;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bases in an overhang.
pub const OVERHANG_LEN: usize = 4;

/// Thrown when a part field violates its declared pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartError {
    #[error("part id must not be empty")]
    EmptyId,

    #[error("invalid {field} {value:?}: expected {OVERHANG_LEN} bases from ACGT")]
    InvalidOverhang { field: &'static str, value: String },

    #[error("invalid color {0:?}: expected a hex code like #1f77b4")]
    InvalidColor(String),

    #[error("unknown feature type {0:?}")]
    InvalidFeatureType(String),
}

/// A short DNA tag marking a joinable end of a part.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Overhang(String);

impl Overhang {
    /// The bases of this overhang.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The overhang read on the opposite strand.
    pub fn reverse_complement(&self) -> Overhang {
        // Only ACGT ever reaches here, so the complement is ACGT as well.
        let rc = dna::revcomp(self.0.as_bytes());
        Overhang(String::from_utf8_lossy(&rc).into_owned())
    }

    fn parse_field(field: &'static str, value: &str) -> Result<Self, PartError> {
        let valid = value.len() == OVERHANG_LEN
            && value.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'));
        if valid {
            Ok(Overhang(value.to_string()))
        } else {
            Err(PartError::InvalidOverhang {
                field,
                value: value.to_string(),
            })
        }
    }
}

impl FromStr for Overhang {
    type Err = PartError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Overhang::parse_field("overhang", s)
    }
}

impl TryFrom<String> for Overhang {
    type Error = PartError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Overhang> for String {
    fn from(value: Overhang) -> Self {
        value.0
    }
}

impl Display for Overhang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A hex color code such as `#1f77b4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Color {
    type Err = PartError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('#') {
            Some(hex) if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                Ok(Color(s.to_string()))
            }
            _ => Err(PartError::InvalidColor(s.to_string())),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = PartError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.0
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! feature_types {
    ( $(($variant:ident, $name:literal),)* ) => {
        /// The kind of genetic feature a part carries.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum FeatureType {
            $(
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl FeatureType {
            /// Every feature type, in declaration order.
            pub const ALL: &'static [FeatureType] = &[ $( FeatureType::$variant, )* ];
        }

        impl Display for FeatureType {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match &self {
                    $( FeatureType::$variant => write!(f, "{}", $name), )*
                }
            }
        }

        impl FromStr for FeatureType {
            type Err = PartError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(FeatureType::$variant), )*
                    _ => Err(PartError::InvalidFeatureType(s.to_string())),
                }
            }
        }
    };
}

feature_types!(
    (Cds, "CDS"),
    (Promoter, "promoter"),
    (Terminator, "terminator"),
    (Rbs, "rbs"),
    (MiscFeature, "misc_feature"),
);

/// One entry of a part catalog: a directed edge from `left_overhang` to
/// `right_overhang` in the overhang graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Part {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_type: Option<FeatureType>,
    left_overhang: Overhang,
    right_overhang: Overhang,
}

/// Raw, unvalidated part fields as they come out of a table row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartFields<'a> {
    pub id: &'a str,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub color: Option<&'a str>,
    pub feature_type: Option<&'a str>,
    pub left_overhang: &'a str,
    pub right_overhang: &'a str,
}

impl Part {
    /// Construct a [`Part`] with no display metadata.
    pub fn new(id: impl Into<String>, left: Overhang, right: Overhang) -> Result<Self, PartError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PartError::EmptyId);
        }
        Ok(Self {
            id,
            name: None,
            description: None,
            color: None,
            feature_type: None,
            left_overhang: left,
            right_overhang: right,
        })
    }

    /// Validate every field of `fields` and construct a [`Part`], reporting
    /// the first field that violates its pattern.
    pub fn from_fields(fields: &PartFields<'_>) -> Result<Self, PartError> {
        let left = Overhang::parse_field("left_overhang", fields.left_overhang)?;
        let right = Overhang::parse_field("right_overhang", fields.right_overhang)?;
        let mut part = Part::new(fields.id, left, right)?;
        part.name = fields.name.map(str::to_string);
        part.description = fields.description.map(str::to_string);
        part.color = fields.color.map(str::parse::<Color>).transpose()?;
        part.feature_type = fields.feature_type.map(str::parse::<FeatureType>).transpose()?;
        Ok(part)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_feature_type(mut self, feature_type: FeatureType) -> Self {
        self.feature_type = Some(feature_type);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }

    pub fn feature_type(&self) -> Option<FeatureType> {
        self.feature_type
    }

    pub fn left_overhang(&self) -> &Overhang {
        &self.left_overhang
    }

    pub fn right_overhang(&self) -> &Overhang {
        &self.right_overhang
    }

    /// Return `true` iff this part starts and ends on the same overhang.
    pub fn is_self_loop(&self) -> bool {
        self.left_overhang == self.right_overhang
    }
}
