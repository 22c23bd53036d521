//! VCF/BCF import through htslib.
//!
//! Each record becomes one feature, each header sample one sample. The
//! genotype assay holds alternate-allele dosage; FORMAT/DP becomes a depth
//! assay when the header declares it.

use crate::core::error::{Result, VarexpError};
use crate::store::{Assay, Axis, MatrixStore, MetadataTable};
use log::{debug, info, warn};
use rust_htslib::bcf::record::{Genotype, Numeric};
use rust_htslib::bcf::{self, Read as BcfRead};
use std::path::Path;

/// Options controlling how a variant file is turned into a store.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Name of the dosage assay.
    pub genotype_assay: String,
    /// Name of the read depth assay, `None` to skip FORMAT/DP.
    pub depth_assay: Option<String>,
    /// Drop records whose FILTER is not PASS.
    pub pass_only: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            genotype_assay: "genotype".to_string(),
            depth_assay: Some("depth".to_string()),
            pass_only: false,
        }
    }
}

impl ImportOptions {
    pub fn validate(&self) -> Result<()> {
        if self.genotype_assay.trim().is_empty() {
            return Err(VarexpError::InvalidInput(
                "genotype assay name must not be empty".to_string(),
            ));
        }
        if let Some(depth) = &self.depth_assay {
            if depth.trim().is_empty() {
                return Err(VarexpError::InvalidInput(
                    "depth assay name must not be empty".to_string(),
                ));
            }
            if depth == &self.genotype_assay {
                return Err(VarexpError::InvalidInput(format!(
                    "genotype and depth assays share the name '{}'",
                    depth
                )));
            }
        }
        Ok(())
    }
}

/// Everything needed to assemble a [`MatrixStore`] from a variant file.
#[derive(Debug, Clone)]
pub struct ImportedVariants {
    pub feature_axis: Axis,
    pub sample_axis: Axis,
    pub assays: Vec<(String, Assay)>,
    /// chrom, pos, ref, alt, qual, filter_pass
    pub feature_metadata: MetadataTable,
}

impl MatrixStore {
    /// Build a store from imported variants, attaching the per-locus columns.
    pub fn from_import(imported: ImportedVariants) -> Result<Self> {
        let mut store = MatrixStore::new(
            imported.feature_axis,
            imported.sample_axis,
            imported.assays,
        )?;
        store.attach_feature_metadata(imported.feature_metadata)?;
        Ok(store)
    }
}

#[derive(Default)]
struct LocusColumns {
    ids: Vec<String>,
    chrom: Vec<String>,
    pos: Vec<f64>,
    reference: Vec<String>,
    alt: Vec<String>,
    qual: Vec<f64>,
    filter_pass: Vec<bool>,
}

/// Read a VCF or BCF file (plain or bgzipped).
pub fn import_variant_file<P: AsRef<Path>>(
    path: P,
    options: &ImportOptions,
) -> Result<ImportedVariants> {
    options.validate()?;
    let path = path.as_ref();
    info!("Importing variant calls from {}", path.display());

    let mut reader = bcf::Reader::from_path(path)?;
    let (samples, has_gt, has_dp) = {
        let header = reader.header();
        let samples = header
            .samples()
            .into_iter()
            .map(|s| utf8(s, "sample name"))
            .collect::<Result<Vec<String>>>()?;
        (
            samples,
            header.format_type(b"GT").is_ok(),
            header.format_type(b"DP").is_ok(),
        )
    };

    if samples.is_empty() {
        return Err(VarexpError::EmptyData(format!(
            "{} declares no samples",
            path.display()
        )));
    }
    if !has_gt {
        return Err(VarexpError::InvalidInput(format!(
            "{} declares no FORMAT/GT field",
            path.display()
        )));
    }
    let depth_assay = match (&options.depth_assay, has_dp) {
        (Some(name), true) => Some(name.clone()),
        (Some(_), false) => {
            debug!("No FORMAT/DP in header; skipping depth assay");
            None
        }
        (None, _) => None,
    };

    let n_samples = samples.len();
    let mut loci = LocusColumns::default();
    let mut genotype_triplets: Vec<(usize, usize, f64)> = Vec::new();
    let mut depth_triplets: Vec<(usize, usize, f64)> = Vec::new();
    let mut skipped = 0usize;

    for (record_idx, record) in reader.records().enumerate() {
        let record = record?;
        let passes = record.has_filter(&b"PASS"[..]);
        if options.pass_only && !passes {
            skipped += 1;
            continue;
        }

        let feature = loci.ids.len();
        let rid = record.rid().ok_or_else(|| {
            VarexpError::Parse(format!("record {} has no CHROM", record_idx + 1))
        })?;
        let chrom = utf8(record.header().rid2name(rid)?, "CHROM")?;
        let pos = record.pos() + 1;
        let alleles = record
            .alleles()
            .into_iter()
            .map(|a| utf8(a, "allele"))
            .collect::<Result<Vec<String>>>()?;
        let (reference, alts) = match alleles.split_first() {
            Some((r, a)) => (r.clone(), a.join(",")),
            None => {
                return Err(VarexpError::Parse(format!(
                    "record {} at {}:{} has no alleles",
                    record_idx + 1,
                    chrom,
                    pos
                )))
            }
        };
        let alts = if alts.is_empty() { ".".to_string() } else { alts };
        let qual = record.qual();

        loci.ids.push(format!("{}:{}_{}/{}", chrom, pos, reference, alts));
        loci.chrom.push(chrom);
        loci.pos.push(pos as f64);
        loci.reference.push(reference);
        loci.alt.push(alts);
        loci.qual
            .push(if qual.is_missing() { f64::NAN } else { qual as f64 });
        loci.filter_pass.push(passes);

        match record.genotypes() {
            Ok(genotypes) => {
                for sample in 0..n_samples {
                    let dosage = alt_dosage(&genotypes.get(sample));
                    if dosage != 0.0 {
                        genotype_triplets.push((feature, sample, dosage));
                    }
                }
            }
            Err(e) => {
                warn!(
                    "FORMAT/GT unreadable at {}:{} ({}); recording as missing",
                    loci.chrom[feature], pos, e
                );
                genotype_triplets.extend((0..n_samples).map(|s| (feature, s, f64::NAN)));
            }
        }

        if depth_assay.is_some() {
            match record.format(b"DP").integer() {
                Ok(depths) => {
                    for (sample, values) in depths.iter().enumerate() {
                        let depth = match values.first() {
                            Some(v) if !v.is_missing() && *v != i32::MIN + 1 => *v as f64,
                            _ => f64::NAN,
                        };
                        if depth != 0.0 {
                            depth_triplets.push((feature, sample, depth));
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "FORMAT/DP unreadable at {}:{} ({}); recording as missing",
                        loci.chrom[feature], pos, e
                    );
                    depth_triplets.extend((0..n_samples).map(|s| (feature, s, f64::NAN)));
                }
            }
        }
    }

    let n_features = loci.ids.len();
    info!(
        "Read {} loci × {} samples ({} records skipped by FILTER)",
        n_features, n_samples, skipped
    );

    let mut assays = vec![(
        options.genotype_assay.clone(),
        Assay::from_triplets(n_features, n_samples, genotype_triplets)?,
    )];
    if let Some(name) = depth_assay {
        assays.push((name, Assay::from_triplets(n_features, n_samples, depth_triplets)?));
    }

    let feature_axis = Axis::new(loci.ids)?;
    let sample_axis = Axis::new(samples)?;

    let mut feature_metadata = MetadataTable::new(n_features);
    feature_metadata.set_column("chrom", loci.chrom)?;
    feature_metadata.set_column("pos", loci.pos)?;
    feature_metadata.set_column("ref", loci.reference)?;
    feature_metadata.set_column("alt", loci.alt)?;
    feature_metadata.set_column("qual", loci.qual)?;
    feature_metadata.set_column("filter_pass", loci.filter_pass)?;

    Ok(ImportedVariants {
        feature_axis,
        sample_axis,
        assays,
        feature_metadata,
    })
}

/// Count of called non-reference alleles; NaN when no allele is called.
fn alt_dosage(genotype: &Genotype) -> f64 {
    let mut called = 0usize;
    let mut alt = 0usize;
    for allele in genotype.iter() {
        if let Some(index) = allele.index() {
            called += 1;
            if index > 0 {
                alt += 1;
            }
        }
    }
    if called == 0 {
        f64::NAN
    } else {
        alt as f64
    }
}

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| VarexpError::Parse(format!("invalid UTF-8 in {}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Selector;
    use std::fs;
    use tempfile::tempdir;

    const SARS_COV_2_VCF: &str = "##fileformat=VCFv4.2
##contig=<ID=MN908947.3,length=29903>
##FILTER=<ID=LowQual,Description=\"Low quality\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsampleA\tsampleB\tsampleC
MN908947.3\t241\t.\tC\tT\t50\tPASS\t.\tGT:DP\t1:30\t0:25\t.:.
MN908947.3\t3037\t.\tC\tT\t.\tLowQual\t.\tGT:DP\t1:12\t1:.\t0:8
MN908947.3\t23403\t.\tA\tG,C\t99\tPASS\t.\tGT:DP\t2:40\t0:33\t1:20
";

    const RECORD_WITHOUT_GT: &str = "MN908947.3\t28881\t.\tG\tA\t60\tPASS\t.\tDP\t10\t11\t12\n";

    fn write_vcf(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("calls.vcf");
        fs::write(&path, SARS_COV_2_VCF).unwrap();
        path
    }

    fn same(a: f64, b: f64) -> bool {
        a == b || (a.is_nan() && b.is_nan())
    }

    #[test]
    fn imports_axes_assays_and_locus_columns() {
        let dir = tempdir().unwrap();
        let imported =
            import_variant_file(write_vcf(dir.path()), &ImportOptions::default()).unwrap();

        assert_eq!(
            imported.feature_axis.names(),
            &[
                "MN908947.3:241_C/T".to_string(),
                "MN908947.3:3037_C/T".to_string(),
                "MN908947.3:23403_A/G,C".to_string(),
            ]
        );
        assert_eq!(
            imported.sample_axis.names(),
            &["sampleA".to_string(), "sampleB".to_string(), "sampleC".to_string()]
        );

        let store = MatrixStore::from_import(imported).unwrap();
        let gt = store.get_assay("genotype").unwrap();
        let expected_gt = [[1.0, 0.0, f64::NAN], [1.0, 1.0, 0.0], [1.0, 0.0, 1.0]];
        let dp = store.get_assay("depth").unwrap();
        let expected_dp = [[30.0, 25.0, f64::NAN], [12.0, f64::NAN, 8.0], [40.0, 33.0, 20.0]];
        for f in 0..3 {
            for s in 0..3 {
                assert!(same(gt.get(f, s).unwrap(), expected_gt[f][s]), "gt[{},{}]", f, s);
                assert!(same(dp.get(f, s).unwrap(), expected_dp[f][s]), "dp[{},{}]", f, s);
            }
        }

        let meta = store.feature_metadata();
        assert_eq!(
            meta.get_column("pos").unwrap().as_numeric().unwrap(),
            &[241.0, 3037.0, 23403.0]
        );
        assert_eq!(meta.mask("filter_pass").unwrap(), &[true, false, true]);
        let qual = meta.get_column("qual").unwrap().as_numeric().unwrap();
        assert_eq!(qual[0], 50.0);
        assert!(qual[1].is_nan());
        assert_eq!(
            meta.get_column("alt").unwrap().as_text().unwrap()[2],
            "G,C".to_string()
        );
    }

    #[test]
    fn pass_only_and_no_depth() {
        let dir = tempdir().unwrap();
        let options = ImportOptions {
            depth_assay: None,
            pass_only: true,
            ..ImportOptions::default()
        };
        let store =
            MatrixStore::from_import(import_variant_file(write_vcf(dir.path()), &options).unwrap())
                .unwrap();
        assert_eq!(store.shape(), (2, 3));
        assert_eq!(store.assay_names(), vec!["genotype"]);

        let pass = store.feature_metadata().mask("filter_pass").unwrap().to_vec();
        let again = store.subset(&Selector::Mask(pass), &Selector::All).unwrap();
        assert_eq!(again, store);
    }

    #[test]
    fn options_validation() {
        let clash = ImportOptions {
            genotype_assay: "calls".into(),
            depth_assay: Some("calls".into()),
            pass_only: false,
        };
        assert!(clash.validate().is_err());
        assert!(ImportOptions::default().validate().is_ok());
    }

    #[test]
    fn missing_file_is_an_htslib_error() {
        let dir = tempdir().unwrap();
        let err = import_variant_file(dir.path().join("absent.vcf"), &ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, VarexpError::Htslib(_)));
    }

    #[test]
    fn record_without_genotypes_is_kept_as_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.vcf");
        fs::write(&path, format!("{}{}", SARS_COV_2_VCF, RECORD_WITHOUT_GT)).unwrap();

        let store =
            MatrixStore::from_import(import_variant_file(&path, &ImportOptions::default()).unwrap())
                .unwrap();
        assert_eq!(store.shape(), (4, 3));
        assert_eq!(store.feature_axis().position_of("MN908947.3:28881_G/A").unwrap(), 3);

        let gt = store.get_assay("genotype").unwrap();
        let dp = store.get_assay("depth").unwrap();
        for s in 0..3 {
            assert!(gt.get(3, s).unwrap().is_nan());
            assert_eq!(dp.get(3, s).unwrap(), 10.0 + s as f64);
        }
        assert_eq!(gt.get(0, 0).unwrap(), 1.0);
    }
}
