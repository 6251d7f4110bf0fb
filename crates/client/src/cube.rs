//! Cube handle: dimension lookup, name-to-id coordinates, cell groups.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use palo_model::{Coordinate, CoordinateArea, CubeInfo, DimensionInfo, Id, IndexCache};
use palo_protocol::{Params, Row};

use crate::cell::CellGroup;
use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::executor::{bind_rows, SessionExecutor};

pub const CUBES_ENDPOINT: &str = "/database/cubes";
pub const DIMENSIONS_ENDPOINT: &str = "/database/dimensions";

/// Dimensions of one cube plus the database-wide tag groups.
struct DimensionSet {
    dimensions: IndexCache<Arc<Dimension>>,
    groups: HashMap<String, Vec<Arc<Dimension>>>,
}

/// A cube in the configured database.
pub struct Cube {
    executor: Arc<SessionExecutor>,
    info: CubeInfo,
    attribute: bool,
    dimensions: Mutex<Option<Arc<DimensionSet>>>,
}

impl Cube {
    /// Select the configured database and look `name` up among its cubes.
    /// Attribute cubes are only listed when `attribute` is set.
    pub(crate) fn open(executor: Arc<SessionExecutor>, name: &str, attribute: bool) -> Result<Self> {
        let database = executor.config().database.clone();
        executor.select_database(&database)?;

        let rows = executor.execute(CUBES_ENDPOINT, listing_params(attribute))?;
        let info = bind_rows::<CubeInfo>(&rows)?
            .into_iter()
            .find(|cube| cube.name == name)
            .ok_or_else(|| Error::CubeNotFound(name.to_string()))?;
        log::debug!("opened cube {:?} (id {}, {} dimensions)", info.name, info.id, info.dimensions.len());

        Ok(Self {
            executor,
            info,
            attribute,
            dimensions: Mutex::new(None),
        })
    }

    pub fn info(&self) -> &CubeInfo {
        &self.info
    }

    pub fn id(&self) -> Id {
        self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn is_attribute(&self) -> bool {
        self.attribute
    }

    // ── Dimensions ──────────────────────────────────────────────────

    /// Names of the cube's dimensions, in cube order.
    pub fn dimension_names(&self) -> Result<Vec<String>> {
        let set = self.dimension_set()?;
        self.info
            .dimensions
            .iter()
            .map(|&id| {
                set.dimensions
                    .by_id(id)
                    .map(|d| d.name().to_string())
                    .ok_or(Error::DimensionIdNotFound(id))
            })
            .collect()
    }

    pub fn dimension(&self, name: &str) -> Result<Arc<Dimension>> {
        self.dimension_set()?
            .dimensions
            .by_name(name)
            .cloned()
            .ok_or_else(|| Error::DimensionNotFound(name.to_string()))
    }

    pub fn dimension_by_id(&self, id: Id) -> Result<Arc<Dimension>> {
        self.dimension_set()?
            .dimensions
            .by_id(id)
            .cloned()
            .ok_or(Error::DimensionIdNotFound(id))
    }

    /// Dimensions tagged `#group <group>`, from the whole database.
    pub(crate) fn group(&self, group: &str) -> Result<Vec<Arc<Dimension>>> {
        Ok(self
            .dimension_set()?
            .groups
            .get(group)
            .cloned()
            .unwrap_or_default())
    }

    // ── Coordinates ─────────────────────────────────────────────────

    /// Map `dimension name -> element name` to a coordinate in cube order.
    pub fn coordinate(&self, names: &HashMap<String, String>) -> Result<Coordinate> {
        self.info
            .dimensions
            .iter()
            .map(|&dim_id| -> Result<Id> {
                let dim = self.dimension_by_id(dim_id)?;
                let element = names
                    .get(dim.name())
                    .ok_or_else(|| Error::DimensionNotFound(dim.name().to_string()))?;
                Ok(dim.element(element)?.id)
            })
            .collect::<Result<Vec<Id>>>()
            .map(Coordinate::new)
    }

    /// Map `dimension name -> element names` to the cartesian product of
    /// coordinates. The first cube dimension varies slowest.
    pub fn coordinates(&self, names: &HashMap<String, Vec<String>>) -> Result<Vec<Coordinate>> {
        let mut area = CoordinateArea::new();
        for &dim_id in &self.info.dimensions {
            let dim = self.dimension_by_id(dim_id)?;
            let elements = names
                .get(dim.name())
                .ok_or_else(|| Error::DimensionNotFound(dim.name().to_string()))?;
            let ids = elements
                .iter()
                .map(|name| dim.element(name).map(|e| e.id))
                .collect::<Result<Vec<Id>>>()?;
            area.insert(dim_id, ids);
        }
        Ok(area.expand(&self.info.dimensions)?)
    }

    // ── Cells ───────────────────────────────────────────────────────

    pub fn cell(&self, coord: Coordinate) -> Result<CellGroup<'_>> {
        self.cells(vec![coord])
    }

    /// Group `coords` for reading and writing. Every element id must
    /// exist in its dimension.
    pub fn cells(&self, coords: Vec<Coordinate>) -> Result<CellGroup<'_>> {
        let mut consolidated = false;
        for coord in &coords {
            consolidated |= self.analyze(coord)?;
        }
        Ok(CellGroup::new(self, coords, consolidated))
    }

    /// Group every coordinate of `area`.
    pub fn cell_group(&self, area: &CoordinateArea) -> Result<CellGroup<'_>> {
        self.cells(area.expand(&self.info.dimensions)?)
    }

    pub(crate) fn execute(&self, endpoint: &str, mut params: Params) -> Result<Vec<Row>> {
        params.add("cube", [self.info.id.to_string()]);
        self.executor.execute(endpoint, params)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn dimension_set(&self) -> Result<Arc<DimensionSet>> {
        let mut slot = self.dimensions.lock();
        if let Some(set) = slot.as_ref() {
            return Ok(Arc::clone(set));
        }
        let set = Arc::new(self.load_dimensions()?);
        *slot = Some(Arc::clone(&set));
        Ok(set)
    }

    fn load_dimensions(&self) -> Result<DimensionSet> {
        let rows = self.execute(DIMENSIONS_ENDPOINT, listing_params(self.attribute))?;
        let mut dimensions = IndexCache::new();
        let mut groups: HashMap<String, Vec<Arc<Dimension>>> = HashMap::new();

        for info in bind_rows::<DimensionInfo>(&rows)? {
            let dim = Arc::new(Dimension::new(Arc::clone(&self.executor), self.info.id, info));
            if let Some(group) = dim.tag("group") {
                groups.entry(group.to_string()).or_default().push(Arc::clone(&dim));
            }
            if self.info.dimensions.contains(&dim.id()) {
                dimensions.add(dim);
            }
        }
        log::debug!("cube {:?}: {} dimensions, {} groups", self.name(), dimensions.len(), groups.len());
        Ok(DimensionSet { dimensions, groups })
    }

    /// Check `coord` against the cube and report whether any of its
    /// elements is consolidated.
    fn analyze(&self, coord: &Coordinate) -> Result<bool> {
        let order = &self.info.dimensions;
        if coord.len() != order.len() {
            return Err(Error::CoordinateLength { expected: order.len(), actual: coord.len() });
        }
        let mut consolidated = false;
        for (&dim_id, &element_id) in order.iter().zip(coord.ids()) {
            let dim = self.dimension_by_id(dim_id)?;
            consolidated |= dim.element_by_id(element_id)?.is_consolidated();
        }
        Ok(consolidated)
    }
}

impl std::fmt::Display for Cube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<cube id:{} name:{:?} dims:{:?} tags:{:?}>",
            self.info.id, self.info.name, self.info.dimensions, self.info.tags
        )
    }
}

fn listing_params(attribute: bool) -> Params {
    let mut params = Params::new();
    if attribute {
        params.set("show_attribute", "1");
    }
    params
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::executor::tests::{executor, Scripted};

    pub(crate) const DATABASES: &str = "1;System;\n4;Demo;\n";
    pub(crate) const CUBES: &str = "9;Sales;2;10,11;0;0;1;0;0;\n";
    pub(crate) const DIMENSIONS: &str = "10;Products;;;;;0;\n\
                                         11;Year #group date #role year;;;;;0;\n\
                                         12;Month #group date #role month;;;;;0;\n";
    pub(crate) const PRODUCTS: &str = "1;All;0;0;0;1;4;0;;2;2,3;1,1;\n\
                                       2;Tea;1;1;1;0;1;1;1;0;;;\n\
                                       3;Coffee;2;1;1;0;1;1;1;0;;;\n";
    pub(crate) const YEARS: &str = "20;2023;0;0;0;0;1;0;;0;;;\n21;2024;1;0;0;0;1;0;;0;;;\n";

    /// Script the database selection and cube listing for `open`.
    pub(crate) fn open_sales(script: &Arc<Scripted>) -> Cube {
        script.ok(DATABASES).ok(CUBES);
        Cube::open(Arc::new(executor(script)), "Sales", false).unwrap()
    }

    #[test]
    fn test_open_selects_database_and_finds_cube() {
        let script = Scripted::new();
        let cube = open_sales(&script);

        assert_eq!(cube.id(), 9);
        assert_eq!(cube.info().dimensions, vec![10, 11]);
        let urls = script.urls();
        assert!(urls[0].contains("/server/databases?"));
        assert!(urls[1].contains("/database/cubes?"));
        assert!(urls[1].contains("database=4"));
        assert!(!urls[1].contains("show_attribute"));
    }

    #[test]
    fn test_open_unknown_cube() {
        let script = Scripted::new();
        script.ok(DATABASES).ok(CUBES);
        let err = Cube::open(Arc::new(executor(&script)), "Budget", false).err().unwrap();
        assert_eq!(err.to_string(), "cube \"Budget\" not found");
    }

    #[test]
    fn test_attribute_listing_flag() {
        let script = Scripted::new();
        script.ok(DATABASES).ok("30;#_Products;2;40,10;0;0;1;2;0;\n");
        let cube = Cube::open(Arc::new(executor(&script)), "#_Products", true).unwrap();

        assert!(cube.is_attribute());
        assert!(script.urls()[1].contains("show_attribute=1"));
    }

    #[test]
    fn test_dimensions_filtered_to_cube_but_groups_span_database() {
        let script = Scripted::new();
        let cube = open_sales(&script);
        script.ok(DIMENSIONS);

        assert_eq!(cube.dimension_names().unwrap(), vec!["Products", "Year"]);
        assert_eq!(cube.dimension("Year").unwrap().tag("role"), Some("year"));
        assert!(matches!(cube.dimension("Month"), Err(Error::DimensionNotFound(_))));
        assert!(matches!(cube.dimension_by_id(12), Err(Error::DimensionIdNotFound(12))));

        let dates: Vec<String> =
            cube.group("date").unwrap().iter().map(|d| d.name().to_string()).collect();
        assert_eq!(dates, vec!["Year", "Month"]);
        assert!(script.urls()[2].contains("cube=9"));
        assert_eq!(script.calls_to(DIMENSIONS_ENDPOINT), 1);
    }

    #[test]
    fn test_concurrent_dimension_listing_fetches_once() {
        let script = Scripted::new();
        let cube = open_sales(&script);
        script.ok(DIMENSIONS);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| assert_eq!(cube.dimension_names().unwrap(), vec!["Products", "Year"]));
            }
        });
        assert_eq!(script.calls_to(DIMENSIONS_ENDPOINT), 1);
    }

    #[test]
    fn test_coordinate_in_cube_order() {
        let script = Scripted::new();
        let cube = open_sales(&script);
        script.ok(DIMENSIONS).ok(PRODUCTS).ok(YEARS);

        let names = HashMap::from([
            ("Year".to_string(), "2024".to_string()),
            ("Products".to_string(), "Tea".to_string()),
        ]);
        assert_eq!(cube.coordinate(&names).unwrap(), Coordinate::new(vec![2, 21]));
    }

    #[test]
    fn test_coordinate_missing_dimension_name() {
        let script = Scripted::new();
        let cube = open_sales(&script);
        script.ok(DIMENSIONS).ok(PRODUCTS);

        let names = HashMap::from([("Products".to_string(), "Tea".to_string())]);
        let err = cube.coordinate(&names).unwrap_err();
        assert!(matches!(err, Error::DimensionNotFound(ref d) if d == "Year"));
    }

    #[test]
    fn test_coordinates_cartesian_product() {
        let script = Scripted::new();
        let cube = open_sales(&script);
        script.ok(DIMENSIONS).ok(PRODUCTS).ok(YEARS);

        let names = HashMap::from([
            ("Products".to_string(), vec!["Tea".to_string(), "Coffee".to_string()]),
            ("Year".to_string(), vec!["2023".to_string(), "2024".to_string()]),
        ]);
        let coords = cube.coordinates(&names).unwrap();
        let ids: Vec<Vec<Id>> = coords.iter().map(|c| c.ids().to_vec()).collect();
        assert_eq!(ids, vec![vec![2, 20], vec![2, 21], vec![3, 20], vec![3, 21]]);
    }

    #[test]
    fn test_cells_flag_consolidated_and_validate() {
        let script = Scripted::new();
        let cube = open_sales(&script);
        script.ok(DIMENSIONS).ok(PRODUCTS).ok(YEARS);

        let base = cube.cell(Coordinate::new(vec![2, 20])).unwrap();
        assert!(!base.has_consolidated());

        let mixed = cube
            .cells(vec![Coordinate::new(vec![2, 20]), Coordinate::new(vec![1, 21])])
            .unwrap();
        assert!(mixed.has_consolidated());

        let err = cube.cell(Coordinate::new(vec![2])).unwrap_err();
        assert!(matches!(err, Error::CoordinateLength { expected: 2, actual: 1 }));

        let err = cube.cell(Coordinate::new(vec![2, 99])).unwrap_err();
        assert!(matches!(err, Error::ElementIdNotFound { id: 99, .. }));
    }

    #[test]
    fn test_cell_group_from_area() {
        let script = Scripted::new();
        let cube = open_sales(&script);
        script.ok(DIMENSIONS).ok(PRODUCTS).ok(YEARS);

        let area: CoordinateArea = [(10, vec![2, 3]), (11, vec![21])].into_iter().collect();
        let group = cube.cell_group(&area).unwrap();
        assert_eq!(group.len(), 2);

        let partial: CoordinateArea = [(10, vec![2])].into_iter().collect();
        let err = cube.cell_group(&partial).unwrap_err();
        assert_eq!(err.to_string(), "dimension 11 not found in coordinate area");
    }
}
