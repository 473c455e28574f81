use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::FilterDocument;
use crate::input::{bundle_set, load_records};
use crate::sinks::{DataSink, GeoJsonSink, GeoJsonlSink, JsonlSink};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file (.geojson, .geojsonl, .jsonl, .json)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file, or '-' for stdout
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Filter document (YAML or JSON)
    #[arg(short, long, env = "TAGSIFT_FILTERS")]
    pub filters: PathBuf,

    /// Output format (auto-detected from the output extension if omitted)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Print the compiled references and filter tree to stderr
    #[arg(long)]
    pub print_tree: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum OutputFormat {
    #[value(name = "geojson")]
    GeoJson,
    #[value(name = "geojsonl")]
    GeoJsonl,
    #[value(name = "jsonl", alias = "json")]
    Jsonl,
}

pub fn output_format_label(format: &OutputFormat) -> &'static str {
    match format {
        OutputFormat::GeoJson => "geojson",
        OutputFormat::GeoJsonl => "geojsonl",
        OutputFormat::Jsonl => "jsonl",
    }
}

/// Explicit format, else the output extension, else jsonl.
pub fn resolve_format(requested: Option<OutputFormat>, output: &Path) -> OutputFormat {
    requested
        .or_else(|| {
            let ext = output.extension()?.to_str()?;
            match ext.to_lowercase().as_str() {
                "geojson" => Some(OutputFormat::GeoJson),
                "geojsonl" => Some(OutputFormat::GeoJsonl),
                "jsonl" | "ndjson" | "json" => Some(OutputFormat::Jsonl),
                _ => None,
            }
        })
        .unwrap_or(OutputFormat::Jsonl)
}

pub fn init_sink(format: &OutputFormat, output: &Path) -> Result<Box<dyn DataSink>> {
    let sink: Box<dyn DataSink> = match format {
        OutputFormat::GeoJson => Box::new(GeoJsonSink::new(output)?),
        OutputFormat::GeoJsonl => Box::new(GeoJsonlSink::new(output)?),
        OutputFormat::Jsonl => Box::new(JsonlSink::new(output)?),
    };
    Ok(sink)
}

/// Run one query: compile the filter, load records, write the matching ones.
/// Returns the number of records written.
pub fn run(cli: &Cli) -> Result<usize> {
    let document = FilterDocument::load(&cli.filters)?;
    let compiled = document
        .compile()
        .with_context(|| format!("Filters: Failed to build {}", cli.filters.display()))?;

    if cli.print_tree {
        eprintln!("{}", compiled.render());
    }

    let records = load_records(&cli.input)?;
    let bundles = bundle_set(&records);

    let start = std::time::Instant::now();
    let matched = compiled.root.apply(&bundles);
    tracing::info!(
        "Filter: {} of {} distinct tag bundle(s) matched in {:.3}s",
        matched.len(),
        bundles.len(),
        start.elapsed().as_secs_f64()
    );

    let format = resolve_format(cli.format, &cli.output);
    tracing::info!("Output: writing {}", output_format_label(&format));
    let mut sink = init_sink(&format, &cli.output)
        .with_context(|| format!("Output: Failed to open {}", cli.output.display()))?;

    let mut written = 0;
    for record in records.iter().filter(|record| matched.contains(&record.tags)) {
        sink.add_record(record)
            .context("Output: Failed to write record")?;
        written += 1;
    }
    sink.finish().context("Output: Failed to finalize sink")?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            resolve_format(None, Path::new("out.geojson")),
            OutputFormat::GeoJson
        );
        assert_eq!(
            resolve_format(None, Path::new("out.GEOJSONL")),
            OutputFormat::GeoJsonl
        );
        assert_eq!(resolve_format(None, Path::new("-")), OutputFormat::Jsonl);
        assert_eq!(
            resolve_format(Some(OutputFormat::GeoJson), Path::new("out.jsonl")),
            OutputFormat::GeoJson
        );
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from([
            "tagsift",
            "--input",
            "in.geojson",
            "--filters",
            "f.yaml",
            "--print-tree",
        ])
        .unwrap();
        assert_eq!(cli.output, PathBuf::from("-"));
        assert!(cli.print_tree);
        assert!(cli.format.is_none());
    }
}
