use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;
use structopt::StructOpt;
use varexp_lib::import::read_sample_table;
use varexp_lib::store::{positions_to_mask, MatrixStore, Selector};

use super::common::{self, CommonArgs};

#[derive(StructOpt, Debug, Clone)]
#[structopt(
    name = "annotate",
    about = "Attach sample annotations and boolean feature/sample flags"
)]
pub struct AnnotateArgs {
    #[structopt(long, short = "i", parse(from_os_str), help = "Input store (.vxs)")]
    pub input: PathBuf,

    #[structopt(long, short = "o", parse(from_os_str), help = "Output store (.vxs)")]
    pub output: PathBuf,

    #[structopt(
        long,
        parse(from_os_str),
        help = "Tab-delimited sample annotation table with a header row"
    )]
    pub samples: Option<PathBuf>,

    #[structopt(
        long,
        default_value = "sample",
        help = "Column of --samples holding sample identifiers"
    )]
    pub id_column: String,

    #[structopt(
        long,
        number_of_values = 1,
        help = "Boolean feature column true at 0-based positions, as NAME=POS,POS,..."
    )]
    pub mark_features: Vec<String>,

    #[structopt(
        long,
        number_of_values = 1,
        help = "Boolean sample column flagging carriers of a feature flag, as NAME=FEATURE_COLUMN"
    )]
    pub carriers: Vec<String>,

    #[structopt(
        long,
        default_value = "genotype",
        help = "Assay consulted by --carriers"
    )]
    pub carrier_assay: String,

    #[structopt(flatten)]
    pub common: CommonArgs,
}

impl AnnotateArgs {
    pub fn validate(&self) -> Result<()> {
        common::require_input(&self.input)?;
        common::require_store_extension(&self.output)?;
        if let Some(samples) = &self.samples {
            common::require_input(samples)?;
        }
        if self.samples.is_none() && self.mark_features.is_empty() && self.carriers.is_empty() {
            bail!("Nothing to annotate: pass --samples, --mark-features or --carriers");
        }
        Ok(())
    }
}

pub fn run_annotate(args: AnnotateArgs) -> Result<()> {
    info!("Arguments: {:?}", args);
    args.validate()?;
    args.common.apply()?;

    let mut store = common::load_store(&args.input)?;
    annotate(&mut store, &args)?;
    info!("Store summary:\n{}", store.summary());

    common::save_store(&store, &args.output)?;
    info!("Output written to: {}", args.output.display());
    Ok(())
}

/// Apply every requested annotation; the first failure aborts before saving.
fn annotate(store: &mut MatrixStore, args: &AnnotateArgs) -> Result<()> {
    if let Some(path) = &args.samples {
        let table = read_sample_table(path, &args.id_column)?;
        store
            .attach_sample_table(&table)
            .with_context(|| format!("Sample table {} does not match the store", path.display()))?;
    }

    for mark in &args.mark_features {
        let (name, list) = common::parse_assignment(mark)?;
        let positions = common::parse_positions(&list)?;
        let mask = positions_to_mask(store.feature_axis_length(), &positions)?;
        info!("Feature column '{}' marks {} loci", name, positions.len());
        store.set_feature_column(&name, mask)?;
    }

    for carrier in &args.carriers {
        let (name, feature_column) = common::parse_assignment(carrier)?;
        let mask = store.feature_metadata().mask(&feature_column)?.to_vec();
        let flags = store.carrier_mask(&args.carrier_assay, &Selector::Mask(mask))?;
        info!(
            "Sample column '{}': {} of {} samples carry '{}'",
            name,
            flags.iter().filter(|&&f| f).count(),
            flags.len(),
            feature_column
        );
        store.set_sample_column(&name, flags)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use varexp_lib::store::{Assay, Axis};

    fn store() -> MatrixStore {
        let features = Axis::new([
            "MN908947.3:241_C/T",
            "MN908947.3:3037_C/T",
            "MN908947.3:23403_A/G",
        ])
        .unwrap();
        let samples = Axis::new(["hCoV-19/A", "hCoV-19/B", "hCoV-19/C"]).unwrap();
        let gt = Assay::from_dense(&[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.0, f64::NAN, 1.0],
        ])
        .unwrap();
        MatrixStore::new(features, samples, vec![("genotype", gt)]).unwrap()
    }

    fn args() -> AnnotateArgs {
        AnnotateArgs {
            input: PathBuf::from("in.vxs"),
            output: PathBuf::from("out.vxs"),
            samples: None,
            id_column: "sample".to_string(),
            mark_features: Vec::new(),
            carriers: Vec::new(),
            carrier_assay: "genotype".to_string(),
            common: CommonArgs {
                threads: 1,
                verbose: false,
            },
        }
    }

    #[test]
    fn marks_features_then_derives_carriers() {
        let mut store = store();
        let args = AnnotateArgs {
            mark_features: vec!["VOC1=0,2".into()],
            carriers: vec!["has_VOC1=VOC1".into()],
            ..args()
        };
        annotate(&mut store, &args).unwrap();

        assert_eq!(
            store.feature_metadata().mask("VOC1").unwrap(),
            &[true, false, true]
        );
        assert_eq!(
            store.sample_metadata().mask("has_VOC1").unwrap(),
            &[true, false, true]
        );
    }

    #[test]
    fn carriers_need_a_boolean_feature_column() {
        let mut store = store();
        let args = AnnotateArgs {
            carriers: vec!["has_VOC2=VOC2".into()],
            ..args()
        };
        assert!(annotate(&mut store, &args).is_err());
        assert_eq!(store.sample_metadata().width(), 0);
    }

    #[test]
    fn out_of_range_mark_is_rejected() {
        let mut store = store();
        let args = AnnotateArgs {
            mark_features: vec!["VOC1=3".into()],
            ..args()
        };
        assert!(annotate(&mut store, &args).is_err());
        assert!(!store.feature_metadata().has_column("VOC1"));
    }

    #[test]
    fn validate_requires_some_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.vxs");
        common::save_store(&store(), &input).unwrap();

        let empty = AnnotateArgs {
            input: input.clone(),
            ..args()
        };
        assert!(empty.validate().is_err());

        let marking = AnnotateArgs {
            input,
            mark_features: vec!["VOC1=0".into()],
            ..args()
        };
        assert!(marking.validate().is_ok());
    }
}
