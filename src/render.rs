//! Render parts as SVG diagrams by template substitution.
//!
//! A [`Renderer`] owns two templates and a [`PathLibrary`] of glyph
//! fragments keyed by [`FeatureType`]. Nothing is global: callers build the
//! library explicitly, usually from a directory of SBOL glyph files.
//!
//! Overhang templates use four placeholder runs for the sticky ends: `CCCC`
//! (left overhang), `GGGG` (its reverse complement), `AAAA` (right overhang)
//! and `TTTT` (its reverse complement). Both templates use `{{path}}` for the
//! glyph and `{{color}}` for the part color. Placeholders are substituted in
//! a single pass, so an inserted overhang is never itself rewritten.

use std::{
    collections::HashMap,
    fs,
    path::{Component, Path},
};

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::part::{FeatureType, Part};

/// Thrown when a part cannot be drawn.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("part {0} has no feature type")]
    MissingFeatureType(String),

    #[error("no glyph for feature type {0}")]
    MissingGlyph(FeatureType),

    #[error("part {0} has no color")]
    MissingColor(String),

    #[error("part id {0:?} cannot be used as a file name")]
    UnsafeFileName(String),

    #[error("could not read glyph: {0}")]
    Io(#[from] std::io::Error),
}

lazy_static! {
    // A `d="..."` attribute opening an indented line of a glyph file.
    static ref PATH_ATTR: Regex = Regex::new(r#"^\s+d="([^"]*)""#).unwrap();

    static ref OVERHANG_PLACEHOLDERS: Regex =
        Regex::new(r"CCCC|GGGG|AAAA|TTTT|\{\{path\}\}|\{\{color\}\}").unwrap();

    static ref BOX_PLACEHOLDERS: Regex = Regex::new(r"\{\{path\}\}|\{\{color\}\}").unwrap();
}

/// SBOL glyph file names for the feature types that have a glyph.
pub const GLYPH_FILES: [(FeatureType, &str); 4] = [
    (FeatureType::Cds, "cds.svg"),
    (FeatureType::Promoter, "promoter.svg"),
    (FeatureType::Rbs, "ribosome-entry-site.svg"),
    (FeatureType::Terminator, "terminator.svg"),
];

/// Glyph fragments (one or more `<path/>` elements) keyed by feature type.
#[derive(Debug, Clone, Default)]
pub struct PathLibrary {
    fragments: HashMap<FeatureType, String>,
}

impl PathLibrary {
    /// Construct a library from ready-made fragments.
    pub fn from_fragments(fragments: impl IntoIterator<Item = (FeatureType, String)>) -> Self {
        Self {
            fragments: fragments.into_iter().collect(),
        }
    }

    /// Build a library from the standard glyph files in `dir`. Feature types
    /// whose file is absent are left out.
    pub fn from_glyph_dir(dir: &Path) -> Result<Self, RenderError> {
        let mut fragments = HashMap::new();
        for (feature_type, file) in GLYPH_FILES {
            let path = dir.join(file);
            if !path.is_file() {
                continue;
            }
            let svg = fs::read_to_string(&path)?;
            fragments.insert(feature_type, glyph_fragment(&svg, feature_type));
        }
        Ok(Self { fragments })
    }

    pub fn insert(&mut self, feature_type: FeatureType, fragment: String) {
        self.fragments.insert(feature_type, fragment);
    }

    pub fn get(&self, feature_type: FeatureType) -> Option<&str> {
        self.fragments.get(&feature_type).map(String::as_str)
    }
}

/// Extract every `d="..."` attribute that starts a line of `svg` and wrap
/// each as a stroked, unfilled `<path/>`. Returns an empty string when the
/// file has no paths.
pub fn glyph_fragment(svg: &str, feature_type: FeatureType) -> String {
    svg.lines()
        .filter_map(|line| PATH_ATTR.captures(line))
        .map(|c| {
            format!(
                "<path d=\"{}\" style=\"stroke:#000000;fill:none;stroke-width:3\" id=\"inline-{}\"/>",
                &c[1],
                feature_type.to_string().to_lowercase()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Return `<id>.svg` for `part`, refusing ids that would resolve outside
/// the directory the file is written to.
pub fn svg_file_name(part: &Part) -> Result<String, RenderError> {
    let id = part.id();
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == id && !id.contains('\\') => {
            Ok(format!("{id}.svg"))
        }
        _ => Err(RenderError::UnsafeFileName(id.to_string())),
    }
}

/// Draws parts from an overhang template and a box template.
#[derive(Debug, Clone)]
pub struct Renderer {
    library: PathLibrary,
    overhang_template: String,
    box_template: String,
}

impl Renderer {
    pub fn new(library: PathLibrary, overhang_template: String, box_template: String) -> Self {
        Self {
            library,
            overhang_template,
            box_template,
        }
    }

    /// Draw `part` with both sticky ends spelled out on each strand.
    pub fn render_overhangs(&self, part: &Part) -> Result<String, RenderError> {
        let (glyph, color) = self.style(part)?;
        let left = part.left_overhang();
        let right = part.right_overhang();
        let left_rc = left.reverse_complement();
        let right_rc = right.reverse_complement();

        let svg = OVERHANG_PLACEHOLDERS
            .replace_all(&self.overhang_template, |c: &Captures| {
                let value = match &c[0] {
                    "CCCC" => left.as_str(),
                    "GGGG" => left_rc.as_str(),
                    "AAAA" => right.as_str(),
                    "TTTT" => right_rc.as_str(),
                    "{{path}}" => glyph,
                    _ => color,
                };
                value.to_string()
            });
        Ok(svg.into_owned())
    }

    /// Draw `part` as a colored box holding its glyph.
    pub fn render_box(&self, part: &Part) -> Result<String, RenderError> {
        let (glyph, color) = self.style(part)?;
        let svg = BOX_PLACEHOLDERS
            .replace_all(&self.box_template, |c: &Captures| {
                let value = if &c[0] == "{{path}}" { glyph } else { color };
                value.to_string()
            });
        Ok(svg.into_owned())
    }

    fn style<'a>(&'a self, part: &'a Part) -> Result<(&'a str, &'a str), RenderError> {
        let feature_type = part
            .feature_type()
            .ok_or_else(|| RenderError::MissingFeatureType(part.id().to_string()))?;
        let glyph = self
            .library
            .get(feature_type)
            .ok_or(RenderError::MissingGlyph(feature_type))?;
        let color = part
            .color()
            .ok_or_else(|| RenderError::MissingColor(part.id().to_string()))?;
        Ok((glyph, color.as_str()))
    }
}
