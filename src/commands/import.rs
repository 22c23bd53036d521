use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use structopt::StructOpt;
use varexp_lib::import::{import_variant_file, ImportOptions};
use varexp_lib::store::MatrixStore;

use super::common::{self, CommonArgs};

#[derive(StructOpt, Debug, Clone)]
#[structopt(name = "import", about = "Convert a VCF/BCF file into a store")]
pub struct ImportArgs {
    #[structopt(long, parse(from_os_str), help = "Input VCF/BCF (plain or bgzipped)")]
    pub vcf: PathBuf,

    #[structopt(long, short = "o", parse(from_os_str), help = "Output store (.vxs)")]
    pub output: PathBuf,

    #[structopt(long, default_value = "genotype", help = "Name of the dosage assay")]
    pub genotype_assay: String,

    #[structopt(long, default_value = "depth", help = "Name of the FORMAT/DP assay")]
    pub depth_assay: String,

    #[structopt(long, help = "Do not import FORMAT/DP")]
    pub no_depth: bool,

    #[structopt(long, help = "Keep only records whose FILTER is PASS")]
    pub pass_only: bool,

    #[structopt(flatten)]
    pub common: CommonArgs,
}

impl ImportArgs {
    pub fn validate(&self) -> Result<ImportOptions> {
        common::require_input(&self.vcf)?;
        common::require_store_extension(&self.output)?;
        let options = ImportOptions {
            genotype_assay: self.genotype_assay.clone(),
            depth_assay: if self.no_depth {
                None
            } else {
                Some(self.depth_assay.clone())
            },
            pass_only: self.pass_only,
        };
        options.validate()?;
        Ok(options)
    }
}

pub fn run_import(args: ImportArgs) -> Result<()> {
    info!("Arguments: {:?}", args);
    let options = args.validate()?;
    args.common.apply()?;

    let imported = import_variant_file(&args.vcf, &options)
        .with_context(|| format!("Failed to import {}", args.vcf.display()))?;
    let store = MatrixStore::from_import(imported)?;
    info!("Store summary:\n{}", store.summary());

    common::save_store(&store, &args.output)?;
    info!("Output written to: {}", args.output.display());
    Ok(())
}
