//! Dimension elements as returned by `/dimension/elements`.

use palo_protocol::{FieldSpec, Record, Setter};
use serde::Serialize;

use crate::cache::{Id, Indexed, Slot};

/// Element type codes.
pub const ELEMENT_NUMERIC: i32 = 1;
pub const ELEMENT_STRING: i32 = 2;
pub const ELEMENT_CONSOLIDATED: i32 = 4;

/// A dimension element.
///
/// `parent_ids`/`child_ids` are the raw lists from the wire. The resolved
/// links are arena slots filled in by the hierarchy build; an element never
/// owns its relatives.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Element {
    pub id: Id,
    pub name: String,
    pub position: i64,
    pub level: i32,
    pub indent: i32,
    pub depth: i32,
    pub element_type: i32,
    pub parent_count: i32,
    pub parent_ids: Vec<Id>,
    pub child_count: i32,
    pub child_ids: Vec<Id>,
    pub weights: Vec<f64>,
    #[serde(skip)]
    pub(crate) parents: Vec<Slot>,
    #[serde(skip)]
    pub(crate) children: Vec<Slot>,
}

impl Element {
    /// Resolved parent slots (empty before the hierarchy build).
    pub fn parent_slots(&self) -> &[Slot] {
        &self.parents
    }

    pub fn child_slots(&self) -> &[Slot] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Any resolved child makes an element consolidated, whatever its
    /// declared type.
    pub fn is_consolidated(&self) -> bool {
        !self.children.is_empty()
    }
}

impl Indexed for Element {
    fn id(&self) -> Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Record for Element {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec::new("id", Setter::I64(|r, v| r.id = v)),
        FieldSpec::new("name", Setter::Str(|r, v| r.name = v)),
        FieldSpec::new("position", Setter::I64(|r, v| r.position = v)),
        FieldSpec::new("level", Setter::I32(|r, v| r.level = v)),
        FieldSpec::new("indent", Setter::I32(|r, v| r.indent = v)),
        FieldSpec::new("depth", Setter::I32(|r, v| r.depth = v)),
        FieldSpec::new("type", Setter::I32(|r, v| r.element_type = v)),
        FieldSpec::new("number_parents", Setter::I32(|r, v| r.parent_count = v)),
        FieldSpec::new("parents", Setter::I64List(|r, v| r.parent_ids = v)),
        FieldSpec::new("number_children", Setter::I32(|r, v| r.child_count = v)),
        FieldSpec::new("children", Setter::I64List(|r, v| r.child_ids = v)),
        FieldSpec::new("weights", Setter::F64List(|r, v| r.weights = v)),
        FieldSpec::new("parents_resolved", Setter::Opaque),
        FieldSpec::new("children_resolved", Setter::Opaque),
    ];
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<elem id:{} name:{:?} parents:{} children:{}>",
            self.id,
            self.name,
            self.parents.len(),
            self.children.len()
        )
    }
}
