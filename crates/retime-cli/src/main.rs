use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use retime_engine::{
    convert_document, resolve_path, ConvertOptions, DEFAULT_DATA_DIR, DEFAULT_PRETTY_FIELD,
};
use serde_json::Value;
use tracing::{debug, info};

mod logger;

#[derive(Parser)]
#[command(
    name = "retime",
    about = "Rebuild Unix arrival timestamps using the pretty arrival time as the source of truth",
    version
)]
struct Cli {
    /// Input route JSON; a bare file name is looked up in the data directory
    #[arg(default_value = "route-testing.json")]
    input: String,

    /// Output route JSON; a bare file name is written to the data directory
    #[arg(default_value = "route.json")]
    output: String,

    /// Name of the schedule field holding the pretty arrival time
    #[arg(long, default_value = DEFAULT_PRETTY_FIELD)]
    pretty_field: String,

    /// Directory bare file names resolve into
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
}

fn main() -> Result<()> {
    logger::init_logger()?;
    let cli = Cli::parse();

    let input_path = resolve_path(&cli.input, &cli.data_dir);
    let output_path = resolve_path(&cli.output, &cli.data_dir);
    debug!(input = %input_path.display(), output = %output_path.display(), "resolved paths");

    let mut doc = read_json(&input_path)?;

    let options = ConvertOptions {
        pretty_field: cli.pretty_field,
    };
    let converted = convert_document(&mut doc, &options)
        .with_context(|| format!("failed to convert {}", input_path.display()))?;
    info!(
        shape = %converted.shape,
        records = converted.summary.total(),
        preserved = converted.summary.preserved,
        collapsed = converted.summary.collapsed,
        skipped = converted.summary.skipped,
        "converted schedule"
    );

    write_json(&output_path, &doc)?;

    println!("Done. Read:  {}", input_path.display());
    println!("Done. Wrote: {}", output_path.display());
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse JSON from {}", path.display()))
}

fn write_json(path: &Path, doc: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, doc)
        .with_context(|| format!("failed to write JSON to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write JSON to {}", path.display()))
}
