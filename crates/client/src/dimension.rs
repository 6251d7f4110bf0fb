//! Dimension handle: elements by name, structural edits.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use palo_model::{
    DimensionInfo, Element, ElementHierarchy, Id, Indexed, ELEMENT_CONSOLIDATED, ELEMENT_STRING,
};
use palo_protocol::{Params, Row};

use crate::cube::Cube;
use crate::error::{Error, Result};
use crate::executor::{bind_rows, SessionExecutor};

pub const ELEMENTS_ENDPOINT: &str = "/dimension/elements";
pub const ELEMENT_CREATE_ENDPOINT: &str = "/element/create";
pub const ELEMENT_APPEND_ENDPOINT: &str = "/element/append";
pub const ELEMENT_DESTROY_ENDPOINT: &str = "/element/destroy";

/// Attribute element holding human-readable labels.
const LABEL_ELEMENT: &str = "label";

/// A cube dimension.
///
/// Elements are fetched on first access and rebuilt wholesale after every
/// add or delete. The build runs under a lock, so concurrent first access
/// fetches once.
pub struct Dimension {
    executor: Arc<SessionExecutor>,
    cube_id: Id,
    info: DimensionInfo,
    elements: Mutex<Option<Arc<ElementHierarchy>>>,
}

impl Dimension {
    pub(crate) fn new(executor: Arc<SessionExecutor>, cube_id: Id, info: DimensionInfo) -> Self {
        Self {
            executor,
            cube_id,
            info,
            elements: Mutex::new(None),
        }
    }

    pub fn info(&self) -> &DimensionInfo {
        &self.info
    }

    pub fn id(&self) -> Id {
        self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Tag parsed from the decorated server name (`#group date`).
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.info.tag(key)
    }

    /// The element index, built on first use.
    pub fn hierarchy(&self) -> Result<Arc<ElementHierarchy>> {
        let mut slot = self.elements.lock();
        if let Some(built) = slot.as_ref() {
            return Ok(Arc::clone(built));
        }
        let built = Arc::new(self.load()?);
        *slot = Some(Arc::clone(&built));
        Ok(built)
    }

    pub fn element_names(&self) -> Result<Vec<String>> {
        Ok(self.hierarchy()?.elements().names())
    }

    pub fn root_names(&self) -> Result<Vec<String>> {
        Ok(self.hierarchy()?.root_names())
    }

    pub fn element(&self, name: &str) -> Result<Element> {
        self.hierarchy()?
            .by_name(name)
            .cloned()
            .ok_or_else(|| Error::ElementNotFound {
                dimension: self.name().to_string(),
                element: name.to_string(),
            })
    }

    pub fn element_by_id(&self, id: Id) -> Result<Element> {
        self.hierarchy()?
            .by_id(id)
            .cloned()
            .ok_or_else(|| Error::ElementIdNotFound {
                dimension: self.name().to_string(),
                id,
            })
    }

    /// Create an element, as a root when `parent` is `None`.
    ///
    /// A `label` is written into the dimension's attribute cube.
    pub fn add_element(
        &self,
        name: &str,
        parent: Option<&str>,
        consolidated: bool,
        label: Option<&str>,
    ) -> Result<Element> {
        let parent = parent.map(|p| self.element(p)).transpose()?;

        let element_type = if consolidated { ELEMENT_CONSOLIDATED } else { ELEMENT_STRING };
        let mut params = self.params();
        params.add("type", [element_type.to_string()]);
        params.add("new_name", [escape(name)]);
        let rows = self.execute(ELEMENT_CREATE_ENDPOINT, params)?;
        let created = first_element(&rows, ELEMENT_CREATE_ENDPOINT)?;

        if let Some(parent) = parent {
            let mut params = self.params();
            params.add("element", [parent.id.to_string()]);
            params.add("children", [created.id.to_string()]);
            self.execute(ELEMENT_APPEND_ENDPOINT, params)?;
        }

        self.rebuild()?;
        if let Some(label) = label {
            self.write_label(name, label)?;
        }
        Ok(created)
    }

    pub fn delete_element(&self, name: &str) -> Result<()> {
        let element = self.element(name)?;
        let mut params = self.params();
        params.add("element", [element.id.to_string()]);
        let rows = self.execute(ELEMENT_DESTROY_ENDPOINT, params)?;
        first_element(&rows, ELEMENT_DESTROY_ENDPOINT)?;
        self.rebuild()
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn load(&self) -> Result<ElementHierarchy> {
        let rows = self.execute(ELEMENTS_ENDPOINT, self.params())?;
        let elements = bind_rows::<Element>(&rows)?;
        let hierarchy = ElementHierarchy::build(elements).map_err(|source| Error::Hierarchy {
            dimension: self.name().to_string(),
            source,
        })?;
        log::debug!("indexed {} elements of dimension {:?}", hierarchy.len(), self.name());
        Ok(hierarchy)
    }

    /// Drop the index and fetch it again. A failed fetch leaves the index
    /// unbuilt, so the next lookup retries.
    fn rebuild(&self) -> Result<()> {
        let mut slot = self.elements.lock();
        *slot = None;
        *slot = Some(Arc::new(self.load()?));
        Ok(())
    }

    fn write_label(&self, element: &str, label: &str) -> Result<()> {
        let attribute_name = format!("#_{}", self.name());
        let cube = Cube::open(Arc::clone(&self.executor), &attribute_name, true)?;
        let attributes = cube.dimension(&attribute_name)?;
        if attributes.hierarchy()?.by_name(LABEL_ELEMENT).is_none() {
            attributes.add_element(LABEL_ELEMENT, None, false, None)?;
        }

        let names = HashMap::from([
            (attribute_name, LABEL_ELEMENT.to_string()),
            (self.name().to_string(), element.to_string()),
        ]);
        let coord = cube.coordinate(&names)?;
        cube.cell(coord)?.set_all(label)
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.add("dimension", [self.id().to_string()]);
        params
    }

    fn execute(&self, endpoint: &str, mut params: Params) -> Result<Vec<Row>> {
        params.add("cube", [self.cube_id.to_string()]);
        self.executor.execute(endpoint, params)
    }
}

impl Indexed for Dimension {
    fn id(&self) -> Id {
        self.info.id
    }

    fn name(&self) -> &str {
        &self.info.name
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.elements.lock().as_ref().map_or(0, |h| h.len());
        write!(
            f,
            "<dim id:{} name:{:?} tags:{:?} elems:{}>",
            self.info.id, self.info.name, self.info.tags, count
        )
    }
}

fn first_element(rows: &[Row], endpoint: &str) -> Result<Element> {
    let row = rows.first().ok_or_else(|| Error::EmptyResponse { endpoint: endpoint.into() })?;
    row.bind().map_err(|source| Error::Bind { row: 0, source })
}

fn escape(name: &str) -> String {
    url::form_urlencoded::byte_serialize(name.as_bytes()).collect()
}
