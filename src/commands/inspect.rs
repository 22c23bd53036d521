use anyhow::Result;
use std::io::{self, Write};
use std::path::PathBuf;
use structopt::StructOpt;

use super::common::{self, CommonArgs};

#[derive(StructOpt, Debug, Clone)]
#[structopt(name = "inspect", about = "Print dimensions, assays and metadata columns")]
pub struct InspectArgs {
    #[structopt(long, short = "i", parse(from_os_str), help = "Input store (.vxs)")]
    pub input: PathBuf,

    #[structopt(long, help = "Also list feature and sample identifiers")]
    pub names: bool,

    #[structopt(flatten)]
    pub common: CommonArgs,
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    common::require_input(&args.input)?;
    let store = common::load_store(&args.input)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", store.summary())?;
    if args.names {
        writeln!(out, "features: {}", store.feature_axis().names().join(" "))?;
        writeln!(out, "samples: {}", store.sample_axis().names().join(" "))?;
    }
    Ok(())
}
