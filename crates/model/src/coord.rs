//! Cube coordinates.
//!
//! A [`Coordinate`] is one element id per dimension in the cube's fixed
//! dimension order. A [`CoordinateArea`] names several element ids per
//! dimension and expands into the full cross-product of coordinates.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::cache::Id;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("dimension {0} not found in coordinate area")]
    MissingDimension(Id),
}

/// A full cell address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate(Vec<Id>);

impl Coordinate {
    pub fn new(ids: Vec<Id>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[Id] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wire form: ids joined by `,` in dimension order.
    pub fn render(&self) -> String {
        self.0.iter().map(Id::to_string).collect::<Vec<_>>().join(",")
    }
}

impl From<Vec<Id>> for Coordinate {
    fn from(ids: Vec<Id>) -> Self {
        Self(ids)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Dimension id → element ids. Sparse and multi-valued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinateArea {
    values: HashMap<Id, Vec<Id>>,
}

impl CoordinateArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dimension: Id, elements: Vec<Id>) -> &mut Self {
        self.values.insert(dimension, elements);
        self
    }

    pub fn get(&self, dimension: Id) -> Option<&[Id]> {
        self.values.get(&dimension).map(Vec::as_slice)
    }

    /// Expand into coordinates ordered by `dimension_order`: the first
    /// dimension varies slowest, the last fastest.
    ///
    /// Entries for dimensions outside `dimension_order` are ignored.
    pub fn expand(&self, dimension_order: &[Id]) -> Result<Vec<Coordinate>, CoordError> {
        let columns = dimension_order
            .iter()
            .map(|&dim| {
                self.values
                    .get(&dim)
                    .map(Vec::as_slice)
                    .ok_or(CoordError::MissingDimension(dim))
            })
            .collect::<Result<Vec<&[Id]>, _>>()?;

        let total: usize = columns.iter().map(|c| c.len()).product();
        let mut coords = Vec::with_capacity(total);
        // mixed-radix counter, last digit fastest
        let mut digits = vec![0usize; columns.len()];
        for _ in 0..total {
            coords.push(Coordinate(
                columns.iter().zip(&digits).map(|(col, &d)| col[d]).collect(),
            ));
            for pos in (0..columns.len()).rev() {
                digits[pos] += 1;
                if digits[pos] < columns[pos].len() {
                    break;
                }
                digits[pos] = 0;
            }
        }
        Ok(coords)
    }
}

impl FromIterator<(Id, Vec<Id>)> for CoordinateArea {
    fn from_iter<I: IntoIterator<Item = (Id, Vec<Id>)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
