use super::axis::{check_positions, Axis};
use super::metadata::mask_to_positions;
use crate::core::error::{Result, VarexpError};

/// How one axis of a store is restricted by [`MatrixStore::subset`](super::MatrixStore::subset).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    /// Every position, original order.
    #[default]
    All,
    /// Keep positions whose mask entry is true; length must match the axis.
    Mask(Vec<bool>),
    /// Explicit ordered positions; may filter and reorder.
    Positions(Vec<usize>),
    /// Explicit ordered identifiers, looked up on the axis.
    Identifiers(Vec<String>),
}

impl Selector {
    /// Resolve to an explicit ordered position list against `axis`.
    pub fn resolve(&self, axis: &Axis) -> Result<Vec<usize>> {
        match self {
            Selector::All => Ok((0..axis.len()).collect()),
            Selector::Mask(mask) => {
                if mask.len() != axis.len() {
                    return Err(VarexpError::length_mismatch(
                        "selection mask",
                        axis.len(),
                        mask.len(),
                    ));
                }
                Ok(mask_to_positions(mask))
            }
            Selector::Positions(positions) => {
                check_positions(positions, axis.len())?;
                Ok(positions.clone())
            }
            Selector::Identifiers(ids) => ids.iter().map(|id| axis.position_of(id)).collect(),
        }
    }
}

impl From<Vec<bool>> for Selector {
    fn from(mask: Vec<bool>) -> Self {
        Selector::Mask(mask)
    }
}

impl From<&[bool]> for Selector {
    fn from(mask: &[bool]) -> Self {
        Selector::Mask(mask.to_vec())
    }
}

impl From<Vec<usize>> for Selector {
    fn from(positions: Vec<usize>) -> Self {
        Selector::Positions(positions)
    }
}

impl From<std::ops::Range<usize>> for Selector {
    fn from(range: std::ops::Range<usize>) -> Self {
        Selector::Positions(range.collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Axis {
        Axis::new(["s1", "s2", "s3", "s4"]).unwrap()
    }

    #[test]
    fn all_is_identity() {
        assert_eq!(Selector::All.resolve(&samples()).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn mask_resolution() {
        let sel = Selector::from(vec![false, true, false, true]);
        assert_eq!(sel.resolve(&samples()).unwrap(), vec![1, 3]);

        let short = Selector::Mask(vec![true, false]);
        assert!(matches!(
            short.resolve(&samples()),
            Err(VarexpError::LengthMismatch { expected: 4, actual: 2, .. })
        ));
    }

    #[test]
    fn positions_resolution() {
        assert_eq!(
            Selector::from(vec![3, 0]).resolve(&samples()).unwrap(),
            vec![3, 0]
        );
        assert!(matches!(
            Selector::from(vec![0, 9]).resolve(&samples()),
            Err(VarexpError::IndexOutOfRange { index: 9, length: 4 })
        ));
        assert_eq!(
            Selector::from(1..3).resolve(&samples()).unwrap(),
            vec![1, 2]
        );
    }

    #[test]
    fn identifier_resolution() {
        let sel = Selector::Identifiers(vec!["s4".into(), "s2".into()]);
        assert_eq!(sel.resolve(&samples()).unwrap(), vec![3, 1]);
        let missing = Selector::Identifiers(vec!["s9".into()]);
        assert!(matches!(
            missing.resolve(&samples()),
            Err(VarexpError::NotFound(_))
        ));
    }
}
