//! Cube data model — no I/O.
//!
//! Dimensions and elements are indexed by id and by name ([`IndexCache`]),
//! elements are linked into a multi-parent hierarchy
//! ([`ElementHierarchy`]), and cells are addressed by [`Coordinate`]s,
//! optionally expanded from a sparse [`CoordinateArea`].

pub mod cache;
pub mod coord;
pub mod element;
pub mod hierarchy;
pub mod records;
pub mod roles;
pub mod tags;

pub use cache::{Id, IndexCache, Indexed, Slot};
pub use coord::{CoordError, Coordinate, CoordinateArea};
pub use element::{Element, ELEMENT_CONSOLIDATED, ELEMENT_NUMERIC, ELEMENT_STRING};
pub use hierarchy::{ElementHierarchy, HierarchyError};
pub use records::{CellData, CellValue, CubeInfo, DatabaseInfo, DimensionInfo, LoginInfo};
pub use roles::DateRole;
pub use tags::{split_decorated, DecoratedName};
