//! Coordinate queries by element name, with calendar dates resolved
//! through tagged date dimensions.

use std::collections::HashMap;

use chrono::NaiveDate;

use palo_model::{Coordinate, DateRole};

use crate::cube::Cube;
use crate::error::{Error, Result};

/// Builder for a set of coordinates.
///
/// ```ignore
/// let coords = cube.resolve(
///     &CoordinateQuery::new()
///         .element("Products", "Tea")
///         .date("date", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
/// )?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoordinateQuery {
    names: HashMap<String, Vec<String>>,
    dates: Vec<(String, NaiveDate)>,
}

impl CoordinateQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(mut self, dimension: &str, element: &str) -> Self {
        self.names
            .entry(dimension.to_string())
            .or_default()
            .push(element.to_string());
        self
    }

    pub fn elements<I, S>(mut self, dimension: &str, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names
            .entry(dimension.to_string())
            .or_default()
            .extend(elements.into_iter().map(Into::into));
        self
    }

    /// Select `date` in every dimension tagged `#group <group>`, projected
    /// through the dimension's `#role` tag.
    pub fn date(mut self, group: &str, date: NaiveDate) -> Self {
        self.dates.push((group.to_string(), date));
        self
    }
}

impl Cube {
    /// Expand `query` into coordinates in cube order.
    pub fn resolve(&self, query: &CoordinateQuery) -> Result<Vec<Coordinate>> {
        let mut names = query.names.clone();
        for (group, date) in &query.dates {
            let dimensions = self.group(group)?;
            if dimensions.is_empty() {
                return Err(Error::UnknownDateGroup(group.clone()));
            }
            for dim in dimensions {
                let role: DateRole = dim.tag("role").unwrap_or_default().parse().map_err(|role| {
                    Error::UnknownDateRole { dimension: dim.name().to_string(), role }
                })?;
                names.entry(dim.name().to_string()).or_default().push(role.project(*date));
            }
        }
        self.coordinates(&names)
    }
}
