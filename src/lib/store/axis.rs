//! Coordinate index: the ordered, uniquely-identified positions of one store dimension.

use crate::core::error::{Result, VarexpError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// An ordered sequence of unique identifiers.
///
/// Identifiers map to positions `0..len()`. An axis is never resized in place;
/// [`Axis::select`] produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Axis {
    names: Vec<String>,
    #[serde(skip)]
    lookup: FxHashMap<String, usize>,
}

impl Axis {
    /// Build an axis, rejecting any repeated identifier.
    pub fn new<I, S>(identifiers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = identifiers.into_iter().map(Into::into).collect();
        let mut lookup = FxHashMap::default();
        lookup.reserve(names.len());
        for (pos, name) in names.iter().enumerate() {
            if lookup.insert(name.clone(), pos).is_some() {
                return Err(VarexpError::DuplicateIdentifier(name.clone()));
            }
        }
        Ok(Self { names, lookup })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position_of(&self, identifier: &str) -> Result<usize> {
        self.lookup
            .get(identifier)
            .copied()
            .ok_or_else(|| VarexpError::NotFound(identifier.to_string()))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.lookup.contains_key(identifier)
    }

    /// Identifier at `position`, if in range.
    pub fn get(&self, position: usize) -> Option<&str> {
        self.names.get(position).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// New axis holding the identifiers at `positions`, in the order given.
    ///
    /// Fails with `IndexOutOfRange` for a position past the end, and with
    /// `DuplicateIdentifier` when a position is repeated.
    pub fn select(&self, positions: &[usize]) -> Result<Axis> {
        check_positions(positions, self.len())?;
        Axis::new(positions.iter().map(|&p| self.names[p].clone()))
    }
}

impl TryFrom<Vec<String>> for Axis {
    type Error = VarexpError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Axis::new(names)
    }
}

impl From<Axis> for Vec<String> {
    fn from(axis: Axis) -> Self {
        axis.names
    }
}

/// Ensure every position lies in `[0, length)`.
pub(crate) fn check_positions(positions: &[usize], length: usize) -> Result<()> {
    match positions.iter().find(|&&p| p >= length) {
        Some(&index) => Err(VarexpError::IndexOutOfRange { index, length }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loci() -> Axis {
        Axis::new(["MN908947.3:241_C/T", "MN908947.3:3037_C/T", "MN908947.3:23403_A/G"]).unwrap()
    }

    #[test]
    fn duplicate_identifiers_rejected() {
        let err = Axis::new(["s1", "s2", "s1"]).unwrap_err();
        assert!(matches!(err, VarexpError::DuplicateIdentifier(ref id) if id == "s1"));
    }

    #[test]
    fn position_lookup() {
        let axis = loci();
        assert_eq!(axis.len(), 3);
        assert_eq!(axis.position_of("MN908947.3:23403_A/G").unwrap(), 2);
        assert!(matches!(
            axis.position_of("missing"),
            Err(VarexpError::NotFound(_))
        ));
    }

    #[test]
    fn select_preserves_given_order() {
        let axis = loci();
        let picked = axis.select(&[2, 0]).unwrap();
        assert_eq!(
            picked.names(),
            &["MN908947.3:23403_A/G".to_string(), "MN908947.3:241_C/T".to_string()]
        );
        assert_eq!(picked.position_of("MN908947.3:241_C/T").unwrap(), 1);
    }

    #[test]
    fn select_out_of_range() {
        assert!(matches!(
            loci().select(&[0, 3]),
            Err(VarexpError::IndexOutOfRange { index: 3, length: 3 })
        ));
    }

    #[test]
    fn select_repeated_position() {
        assert!(matches!(
            loci().select(&[1, 1]),
            Err(VarexpError::DuplicateIdentifier(_))
        ));
    }

    #[test]
    fn empty_selection() {
        let picked = loci().select(&[]).unwrap();
        assert!(picked.is_empty());
    }
}
