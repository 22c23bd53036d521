//! varexp - variant experiment store
//!
//! Build, annotate, subset and export synchronized feature × sample stores of
//! variant calls.
//!
//! # Tools
//!
//! - `import`: Convert a VCF/BCF file into a store
//! - `annotate`: Attach sample annotations and feature/sample flags
//! - `subset`: Slice a store by boolean columns or explicit positions
//! - `inspect`: Print dimensions, assays and metadata columns
//! - `export`: Write metadata tables and assays as TSV
//!
//! # Usage
//!
//! ```bash
//! varexp import --vcf calls.vcf.gz --output cov.vxs
//! varexp annotate --input cov.vxs --output cov.vxs --samples metadata.tsv --id-column strain \
//!     --mark-features VOC1=6,25 --carriers has_VOC1=VOC1
//! varexp subset --input cov.vxs --output voc1.vxs --features-where VOC1
//! varexp export --input voc1.vxs --out-dir voc1_tables --assay genotype
//! ```

extern crate varexp_lib;
pub mod commands;
use anyhow::Result;
use env_logger::Env;
use log::*;
use structopt::StructOpt;
use varexp_lib::core::prelude::is_broken_pipe;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Synchronized annotated matrix store for variant calls
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Convert a VCF/BCF file into a store
    Import(commands::ImportArgs),
    /// Attach sample annotations and feature/sample flags
    Annotate(commands::AnnotateArgs),
    /// Slice a store by boolean columns or explicit positions
    Subset(commands::SubsetArgs),
    /// Print dimensions, assays and metadata columns
    Inspect(commands::InspectArgs),
    /// Write metadata tables and assays as TSV
    Export(commands::ExportArgs),
}

impl Subcommand {
    fn common(&self) -> &commands::CommonArgs {
        match self {
            Subcommand::Import(args) => &args.common,
            Subcommand::Annotate(args) => &args.common,
            Subcommand::Subset(args) => &args.common,
            Subcommand::Inspect(args) => &args.common,
            Subcommand::Export(args) => &args.common,
        }
    }

    fn run(self) -> Result<()> {
        match self {
            Subcommand::Import(args) => commands::run_import(args)?,
            Subcommand::Annotate(args) => commands::run_annotate(args)?,
            Subcommand::Subset(args) => commands::run_subset(args)?,
            Subcommand::Inspect(args) => commands::run_inspect(args)?,
            Subcommand::Export(args) => commands::run_export(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let subcommand = Args::from_args().subcommand;
    let default_level = if subcommand.common().verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    if let Err(err) = subcommand.run() {
        if is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
