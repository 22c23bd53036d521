use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use structopt::StructOpt;
use varexp_lib::export::{export_assay, export_feature_metadata, export_sample_metadata};

use super::common::{self, CommonArgs};

#[derive(StructOpt, Debug, Clone)]
#[structopt(name = "export", about = "Write metadata tables and assays as TSV")]
pub struct ExportArgs {
    #[structopt(long, short = "i", parse(from_os_str), help = "Input store (.vxs)")]
    pub input: PathBuf,

    #[structopt(long, parse(from_os_str), help = "Directory receiving the TSV files")]
    pub out_dir: PathBuf,

    #[structopt(
        long,
        number_of_values = 1,
        help = "Assay to export as a dense matrix (repeatable)"
    )]
    pub assay: Vec<String>,

    #[structopt(long, help = "gzip the written tables")]
    pub gzip: bool,

    #[structopt(flatten)]
    pub common: CommonArgs,
}

pub fn run_export(args: ExportArgs) -> Result<()> {
    info!("Arguments: {:?}", args);
    common::require_input(&args.input)?;
    args.common.apply()?;

    let store = common::load_store(&args.input)?;
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let suffix = if args.gzip { "tsv.gz" } else { "tsv" };

    export_feature_metadata(&store, args.out_dir.join(format!("features.{}", suffix)))?;
    export_sample_metadata(&store, args.out_dir.join(format!("samples.{}", suffix)))?;
    for assay in &args.assay {
        export_assay(&store, assay, args.out_dir.join(format!("{}.{}", assay, suffix)))?;
    }
    info!("Tables written to: {}", args.out_dir.display());
    Ok(())
}
