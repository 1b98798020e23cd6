use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use moclo_assembly::{
    enumerate::{enumerate_with, EndPolicy, Query, SearchConfig, SearchError, SearchMode},
    kit::KitAssembly,
    loader,
    render::{svg_file_name, PathLibrary, Renderer},
    validate_all, Assembly, Catalog,
};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum Format {
    /// One assembly per line, part ids separated by spaces.
    Text,
    /// A JSON list of named assemblies.
    Json,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// CSV part catalog.
    path: PathBuf,

    /// Overhang every assembly starts from.
    #[arg(short, long, default_value = "GGAG")]
    start: String,

    /// Overhang that closes an assembly.
    #[arg(short, long, default_value = "CGCT")]
    end: String,

    #[arg(long, value_enum, default_value_t = SearchMode::Recursive)]
    mode: SearchMode,

    #[arg(long, value_enum, default_value_t = EndPolicy::StopAtFirstMatch)]
    policy: EndPolicy,

    /// Prune assemblies longer than this many parts.
    #[arg(long)]
    max_length: Option<usize>,

    /// Stop after this many assemblies.
    #[arg(long)]
    max_results: Option<usize>,

    /// Report what was found even when a limit cut the search short.
    #[arg(long)]
    allow_partial: bool,

    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write results here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render every catalog part into overhang_parts/ and box_parts/ here.
    #[arg(long, requires_all = ["glyph_dir", "overhang_template", "box_template"])]
    render_dir: Option<PathBuf>,

    /// Directory of SBOL glyph SVGs.
    #[arg(long)]
    glyph_dir: Option<PathBuf>,

    #[arg(long)]
    overhang_template: Option<PathBuf>,

    #[arg(long)]
    box_template: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let catalog = loader::parse_catalog(&cli.path)
        .with_context(|| format!("loading catalog {}", cli.path.display()))?;
    let query = Query::parse(&cli.start, &cli.end).context("invalid query overhang")?;
    info!(parts = catalog.len(), start = %query.start, end = %query.end, "catalog loaded");

    let mut config = SearchConfig::default()
        .with_mode(cli.mode)
        .with_policy(cli.policy)
        .sorted();
    config.max_length = cli.max_length;
    config.max_results = cli.max_results;

    let assemblies = match enumerate_with(&catalog, &query, &config) {
        Ok(found) => found,
        Err(SearchError::Truncated { limit, partial }) if cli.allow_partial => {
            warn!(%limit, "reporting a partial result");
            partial
        }
        Err(e) => return Err(e.into()),
    };

    // Double-check every result before reporting it.
    validate_all(&catalog, &query, cli.policy, &assemblies)
        .context("search produced an invalid assembly")?;
    info!(found = assemblies.len(), "assemblies enumerated");

    let report = match cli.format {
        Format::Text => text_report(&catalog, &assemblies),
        Format::Json => json_report(&catalog, &assemblies)?,
    };
    match &cli.output {
        Some(path) => fs::write(path, report)
            .with_context(|| format!("writing {}", path.display()))?,
        None => io::stdout().write_all(report.as_bytes())?,
    }

    if let Some(dir) = &cli.render_dir {
        let (Some(glyphs), Some(overhang), Some(boxed)) =
            (&cli.glyph_dir, &cli.overhang_template, &cli.box_template)
        else {
            bail!("--render-dir needs --glyph-dir, --overhang-template and --box-template");
        };
        let library = PathLibrary::from_glyph_dir(glyphs)?;
        let renderer = Renderer::new(
            library,
            fs::read_to_string(overhang)
                .with_context(|| format!("reading {}", overhang.display()))?,
            fs::read_to_string(boxed).with_context(|| format!("reading {}", boxed.display()))?,
        );
        render_parts(&renderer, &catalog, dir)?;
    }

    Ok(())
}

fn text_report(catalog: &Catalog, assemblies: &[Assembly]) -> String {
    let mut out = String::new();
    for assembly in assemblies {
        out.push_str(&assembly.ids(catalog).join(" "));
        out.push('\n');
    }
    out
}

fn json_report(catalog: &Catalog, assemblies: &[Assembly]) -> Result<String> {
    let named: Vec<KitAssembly> = assemblies
        .iter()
        .enumerate()
        .map(|(i, a)| KitAssembly::from_assembly(Some(format!("assembly_{}", i + 1)), a, catalog))
        .collect();
    Ok(serde_json::to_string_pretty(&named)? + "\n")
}

/// Write `overhang_parts/<id>.svg` and `box_parts/<id>.svg` for every part.
fn render_parts(renderer: &Renderer, catalog: &Catalog, dir: &Path) -> Result<()> {
    let overhang_dir = dir.join("overhang_parts");
    let box_dir = dir.join("box_parts");
    fs::create_dir_all(&overhang_dir)?;
    fs::create_dir_all(&box_dir)?;

    for part in catalog {
        let file_name = svg_file_name(part)?;
        let svg = renderer
            .render_overhangs(part)
            .with_context(|| format!("rendering part {}", part.id()))?;
        fs::write(overhang_dir.join(&file_name), svg)?;

        let svg = renderer
            .render_box(part)
            .with_context(|| format!("rendering part {}", part.id()))?;
        fs::write(box_dir.join(&file_name), svg)?;
    }
    info!(parts = catalog.len(), dir = %dir.display(), "rendered part diagrams");
    Ok(())
}
