use anyhow::{bail, Result};
use log::info;
use std::path::PathBuf;
use structopt::StructOpt;
use varexp_lib::store::{MetadataTable, Selector};

use super::common::{self, CommonArgs};

#[derive(StructOpt, Debug, Clone)]
#[structopt(
    name = "subset",
    about = "Slice a store by boolean metadata columns or explicit positions"
)]
pub struct SubsetArgs {
    #[structopt(long, short = "i", parse(from_os_str), help = "Input store (.vxs)")]
    pub input: PathBuf,

    #[structopt(long, short = "o", parse(from_os_str), help = "Output store (.vxs)")]
    pub output: PathBuf,

    #[structopt(long, help = "Keep features where this boolean feature column is true")]
    pub features_where: Option<String>,

    #[structopt(long, help = "Keep samples where this boolean sample column is true")]
    pub samples_where: Option<String>,

    #[structopt(long, help = "Keep features at these 0-based positions, in order (e.g. 2,0,1)")]
    pub features: Option<String>,

    #[structopt(long, help = "Keep samples at these 0-based positions, in order")]
    pub samples: Option<String>,

    #[structopt(flatten)]
    pub common: CommonArgs,
}

impl SubsetArgs {
    pub fn validate(&self) -> Result<()> {
        common::require_input(&self.input)?;
        common::require_store_extension(&self.output)?;
        if self.features_where.is_some() && self.features.is_some() {
            bail!("--features-where and --features are mutually exclusive");
        }
        if self.samples_where.is_some() && self.samples.is_some() {
            bail!("--samples-where and --samples are mutually exclusive");
        }
        Ok(())
    }
}

fn selector(
    table: &MetadataTable,
    column: &Option<String>,
    positions: &Option<String>,
) -> Result<Selector> {
    Ok(match (column, positions) {
        (Some(name), _) => Selector::Mask(table.mask(name)?.to_vec()),
        (None, Some(list)) => Selector::Positions(common::parse_positions(list)?),
        (None, None) => Selector::All,
    })
}

pub fn run_subset(args: SubsetArgs) -> Result<()> {
    info!("Arguments: {:?}", args);
    args.validate()?;
    args.common.apply()?;

    let store = common::load_store(&args.input)?;
    let features = selector(store.feature_metadata(), &args.features_where, &args.features)?;
    let samples = selector(store.sample_metadata(), &args.samples_where, &args.samples)?;

    let subset = store.subset(&features, &samples)?;
    if subset.feature_axis_length() == 0 || subset.sample_axis_length() == 0 {
        log::warn!(
            "Subset is empty: {} features × {} samples",
            subset.feature_axis_length(),
            subset.sample_axis_length()
        );
    }
    info!("Store summary:\n{}", subset.summary());

    common::save_store(&subset, &args.output)?;
    info!("Output written to: {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use varexp_lib::store::{Assay, Axis, MatrixStore};

    fn store() -> MatrixStore {
        let features = Axis::new(["f0", "f1", "f2"]).unwrap();
        let samples = Axis::new(["s0", "s1"]).unwrap();
        let mut store =
            MatrixStore::new(features, samples, vec![("genotype", Assay::zeros(3, 2))]).unwrap();
        store.set_feature_column("VOC1", vec![false, true, true]).unwrap();
        store.set_feature_column("qual", vec![10.0, 20.0, 30.0]).unwrap();
        store
    }

    fn args(input: &Path) -> SubsetArgs {
        SubsetArgs {
            input: input.to_path_buf(),
            output: input.with_file_name("out.vxs"),
            features_where: None,
            samples_where: None,
            features: None,
            samples: None,
            common: CommonArgs {
                threads: 1,
                verbose: false,
            },
        }
    }

    #[test]
    fn flags_map_to_selectors() {
        let table = store().feature_metadata().clone();
        assert_eq!(
            selector(&table, &Some("VOC1".into()), &None).unwrap(),
            Selector::Mask(vec![false, true, true])
        );
        assert_eq!(
            selector(&table, &None, &Some("2,0".into())).unwrap(),
            Selector::Positions(vec![2, 0])
        );
        assert_eq!(selector(&table, &None, &None).unwrap(), Selector::All);
        assert!(selector(&table, &Some("qual".into()), &None).is_err());
        assert!(selector(&table, &Some("VOC2".into()), &None).is_err());
    }

    #[test]
    fn where_and_position_flags_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.vxs");
        common::save_store(&store(), &input).unwrap();

        assert!(args(&input).validate().is_ok());
        let both_features = SubsetArgs {
            features_where: Some("VOC1".into()),
            features: Some("0".into()),
            ..args(&input)
        };
        assert!(both_features.validate().is_err());
        let both_samples = SubsetArgs {
            samples_where: Some("has_VOC1".into()),
            samples: Some("1".into()),
            ..args(&input)
        };
        assert!(both_samples.validate().is_err());
        let wrong_extension = SubsetArgs {
            output: dir.path().join("out.h5ad"),
            ..args(&input)
        };
        assert!(wrong_extension.validate().is_err());
    }

    #[test]
    fn run_writes_the_flagged_subset() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.vxs");
        common::save_store(&store(), &input).unwrap();

        let subset_args = SubsetArgs {
            features_where: Some("VOC1".into()),
            samples: Some("1".into()),
            ..args(&input)
        };
        let output = subset_args.output.clone();
        run_subset(subset_args).unwrap();

        let subset = common::load_store(&output).unwrap();
        assert_eq!(subset.shape(), (2, 1));
        assert_eq!(subset.feature_axis().names(), &["f1".to_string(), "f2".to_string()]);
        assert_eq!(
            subset.feature_metadata().get_column("qual").unwrap().as_numeric().unwrap(),
            &[20.0, 30.0]
        );
    }
}
