//! Cell groups: batched reads and writes over a list of coordinates.

use palo_model::{CellData, CellValue, Coordinate};
use palo_protocol::{Params, Row};

use crate::cube::Cube;
use crate::error::{Error, Result};

pub const CELL_VALUES_ENDPOINT: &str = "/cell/values";
pub const CELL_REPLACE_BULK_ENDPOINT: &str = "/cell/replace_bulk";

/// One cell: its coordinate and the last fetched value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub path: Coordinate,
    pub value: CellValue,
}

impl Cell {
    pub fn exists(&self) -> bool {
        self.value.exists()
    }

    pub fn data(&self) -> CellData {
        self.value.data()
    }
}

/// A value to write.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    Numeric(f64),
    Text(String),
}

impl From<f64> for CellInput {
    fn from(v: f64) -> Self {
        CellInput::Numeric(v)
    }
}

impl From<i64> for CellInput {
    fn from(v: i64) -> Self {
        CellInput::Numeric(v as f64)
    }
}

impl From<i32> for CellInput {
    fn from(v: i32) -> Self {
        CellInput::Numeric(f64::from(v))
    }
}

impl From<&str> for CellInput {
    fn from(v: &str) -> Self {
        CellInput::Text(v.to_string())
    }
}

impl From<String> for CellInput {
    fn from(v: String) -> Self {
        CellInput::Text(v)
    }
}

impl std::fmt::Display for CellInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellInput::Numeric(v) => write!(f, "{}", v),
            CellInput::Text(s) => f.write_str(s),
        }
    }
}

/// Cells of one cube, read and written together.
///
/// Groups touching a consolidated element can be read but not written.
pub struct CellGroup<'c> {
    cube: &'c Cube,
    cells: Vec<Cell>,
    consolidated: bool,
}

impl<'c> CellGroup<'c> {
    pub(crate) fn new(cube: &'c Cube, coords: Vec<Coordinate>, consolidated: bool) -> Self {
        let cells = coords
            .into_iter()
            .map(|path| Cell { path, value: CellValue::default() })
            .collect();
        Self { cube, cells, consolidated }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn has_consolidated(&self) -> bool {
        self.consolidated
    }

    /// Read every cell's value in one request. Row `i` belongs to cell `i`.
    pub fn fetch(&mut self) -> Result<()> {
        if self.cells.is_empty() {
            return Ok(());
        }
        let mut params = Params::new();
        for cell in &self.cells {
            params.path("paths", cell.path.ids().iter().map(|id| id.to_string()));
        }
        let rows = self.cube.execute(CELL_VALUES_ENDPOINT, params)?;
        if rows.len() < self.cells.len() {
            return Err(Error::Protocol {
                row: rows.len(),
                content: String::new(),
                message: format!("{} cell rows for {} cells", rows.len(), self.cells.len()),
            });
        }
        for (i, (cell, row)) in self.cells.iter_mut().zip(&rows).enumerate() {
            cell.value = row.bind().map_err(|source| Error::Bind { row: i, source })?;
        }
        Ok(())
    }

    /// Write one value per cell, in cell order.
    ///
    /// Values are sent unescaped: text containing `:`, `,`, `&` or `#`
    /// corrupts the request.
    pub fn set(&self, values: &[CellInput]) -> Result<()> {
        self.write(values, false, false)
    }

    /// Write `value` into every cell. Text values are sent unescaped, as
    /// with [`CellGroup::set`].
    pub fn set_all(&self, value: impl Into<CellInput>) -> Result<()> {
        self.write(&[value.into()], false, true)
    }

    /// Add one value per cell to the stored values.
    pub fn add(&self, values: &[CellInput]) -> Result<()> {
        self.write(values, true, false)
    }

    /// Add `value` to every cell.
    pub fn add_all(&self, value: impl Into<CellInput>) -> Result<()> {
        self.write(&[value.into()], true, true)
    }

    /// Concatenate with `other`. Fetched values are kept.
    pub fn append(mut self, other: CellGroup<'c>) -> Self {
        self.consolidated |= other.consolidated;
        self.cells.extend(other.cells);
        self
    }

    fn write(&self, values: &[CellInput], add: bool, broadcast: bool) -> Result<()> {
        if self.consolidated {
            return Err(Error::Consolidated);
        }
        let expected = if broadcast { 1 } else { self.cells.len() };
        if values.len() != expected {
            return Err(Error::ValueCount { expected, actual: values.len() });
        }

        let mut params = Params::new();
        if add {
            params.set("add", "1");
        }
        for (i, cell) in self.cells.iter().enumerate() {
            let value = if broadcast { &values[0] } else { &values[i] };
            params.path("values", [value.to_string()]);
            params.path("paths", cell.path.ids().iter().map(|id| id.to_string()));
        }

        let rows = self.cube.execute(CELL_REPLACE_BULK_ENDPOINT, params)?;
        let rejected = rejected_rows(&rows);
        if !rejected.is_empty() {
            log::warn!("cube {:?}: server rejected rows {:?}", self.cube.name(), rejected);
            return Err(Error::RejectedRows(rejected));
        }
        Ok(())
    }
}

impl std::fmt::Debug for CellGroup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellGroup")
            .field("cube", &self.cube.name())
            .field("cells", &self.cells)
            .field("consolidated", &self.consolidated)
            .finish()
    }
}

/// Indexes of the rows whose status field is not `1`.
fn rejected_rows(rows: &[Row]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.get(0).map(|f| f.as_str()) != Some("1"))
        .map(|(i, _)| i)
        .collect()
}
