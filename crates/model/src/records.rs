//! Server records bound from response rows.

use std::collections::BTreeMap;

use palo_protocol::{FieldSpec, Record, Setter};
use serde::Serialize;

use crate::cache::{Id, Indexed};
use crate::tags::split_decorated;

// ── Login ───────────────────────────────────────────────────────────

/// `/server/login` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginInfo {
    pub session: String,
    pub time: String,
}

impl Record for LoginInfo {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec::new("session", Setter::Str(|r, v| r.session = v)),
        FieldSpec::new("time", Setter::Str(|r, v| r.time = v)),
    ];
}

// ── Database ────────────────────────────────────────────────────────

/// One row of `/server/databases`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub id: Id,
    pub name: String,
    pub dimension_count: i32,
    pub cube_count: i32,
    pub status: i32,
    pub database_type: i32,
    pub token: i64,
}

impl Indexed for DatabaseInfo {
    fn id(&self) -> Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Record for DatabaseInfo {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec::new("id", Setter::I64(|r, v| r.id = v)),
        FieldSpec::new("name", Setter::Str(|r, v| r.name = v)),
        FieldSpec::new("number_dimensions", Setter::I32(|r, v| r.dimension_count = v)),
        FieldSpec::new("number_cubes", Setter::I32(|r, v| r.cube_count = v)),
        FieldSpec::new("status", Setter::I32(|r, v| r.status = v)),
        FieldSpec::new("type", Setter::I32(|r, v| r.database_type = v)),
        FieldSpec::new("database_token", Setter::I64(|r, v| r.token = v)),
    ];
}

// ── Cube ────────────────────────────────────────────────────────────

/// One row of `/database/cubes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CubeInfo {
    pub id: Id,
    pub name: String,
    pub dimension_count: i32,
    /// Dimension ids in cube order.
    pub dimensions: Vec<Id>,
    pub cell_count: i64,
    pub filled_cell_count: i64,
    /// 0=unloaded, 1=loaded, 2=changed
    pub status: i32,
    /// 0=normal, 1=system, 2=attribute, 3=user info, 4=gpu
    pub cube_type: i32,
    pub token: i64,
    pub tags: BTreeMap<String, String>,
    pub hash: Option<String>,
}

impl Indexed for CubeInfo {
    fn id(&self) -> Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Record for CubeInfo {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec::new("id", Setter::I64(|r, v| r.id = v)),
        FieldSpec::new("name", Setter::Str(|r, v| r.name = v)),
        FieldSpec::new("number_dimensions", Setter::I32(|r, v| r.dimension_count = v)),
        FieldSpec::new("dimensions", Setter::I64List(|r, v| r.dimensions = v)),
        FieldSpec::new("number_cells", Setter::I64(|r, v| r.cell_count = v)),
        FieldSpec::new("number_filled_cells", Setter::I64(|r, v| r.filled_cell_count = v)),
        FieldSpec::new("status", Setter::I32(|r, v| r.status = v)),
        FieldSpec::new("type", Setter::I32(|r, v| r.cube_type = v)),
        FieldSpec::new("cube_token", Setter::I64(|r, v| r.token = v)),
        FieldSpec::new("tags", Setter::Opaque),
        FieldSpec::new("hash", Setter::Opaque),
    ];

    fn normalizer() -> Option<fn(&mut Self)> {
        Some(|cube| {
            let decorated = split_decorated(&cube.name, true);
            cube.name = decorated.name;
            cube.tags = decorated.tags;
            cube.hash = decorated.hash;
        })
    }
}

// ── Dimension ───────────────────────────────────────────────────────

/// One row of `/database/dimensions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimensionInfo {
    pub id: Id,
    pub name: String,
    pub element_count: i64,
    pub max_level: i32,
    pub max_indent: i32,
    pub max_depth: i32,
    /// 0=normal, 1=system, 2=attribute, 3=user info
    pub dimension_type: i32,
    /// Attribute dimension of a normal dimension, or the reverse.
    pub attribute_dimension: Id,
    pub attribute_cube: Id,
    pub rights_cube: Id,
    pub token: i64,
    pub tags: BTreeMap<String, String>,
}

impl DimensionInfo {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

impl Indexed for DimensionInfo {
    fn id(&self) -> Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Record for DimensionInfo {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec::new("id", Setter::I64(|r, v| r.id = v)),
        FieldSpec::new("name", Setter::Str(|r, v| r.name = v)),
        FieldSpec::new("number_elements", Setter::I64(|r, v| r.element_count = v)),
        FieldSpec::new("maximum_level", Setter::I32(|r, v| r.max_level = v)),
        FieldSpec::new("maximum_indent", Setter::I32(|r, v| r.max_indent = v)),
        FieldSpec::new("maximum_depth", Setter::I32(|r, v| r.max_depth = v)),
        FieldSpec::new("type", Setter::I32(|r, v| r.dimension_type = v)),
        FieldSpec::new("attributes_dimension", Setter::I64(|r, v| r.attribute_dimension = v)),
        FieldSpec::new("attributes_cube", Setter::I64(|r, v| r.attribute_cube = v)),
        FieldSpec::new("rights_cube", Setter::I64(|r, v| r.rights_cube = v)),
        FieldSpec::new("dimension_token", Setter::I64(|r, v| r.token = v)),
        FieldSpec::new("tags", Setter::Opaque),
    ];

    fn normalizer() -> Option<fn(&mut Self)> {
        Some(|dim| {
            let decorated = split_decorated(&dim.name, false);
            dim.name = decorated.name;
            dim.tags = decorated.tags;
        })
    }
}

// ── Cell value ──────────────────────────────────────────────────────

pub const CELL_NUMERIC: i32 = 1;
pub const CELL_STRING: i32 = 2;

/// One row of `/cell/values`. The value is kept as sent and typed on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CellValue {
    pub value_type: i32,
    /// 1 if at least one base cell for the path exists
    pub exists: i32,
    pub raw: String,
}

impl Record for CellValue {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec::new("type", Setter::I32(|r, v| r.value_type = v)),
        FieldSpec::new("exists", Setter::I32(|r, v| r.exists = v)),
        FieldSpec::new("value", Setter::Str(|r, v| r.raw = v)),
    ];
}

/// Typed reading of a [`CellValue`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellData {
    Numeric(f64),
    Text(String),
}

impl CellValue {
    pub fn exists(&self) -> bool {
        self.exists == 1
    }

    /// Numeric cells read an empty or unparseable value as `0`.
    pub fn data(&self) -> CellData {
        if self.value_type == CELL_STRING {
            CellData::Text(self.raw.clone())
        } else {
            CellData::Numeric(self.raw.parse().unwrap_or(0.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palo_protocol::Row;

    #[test]
    fn test_bind_cube_with_decorations() {
        let row = Row::parse("4;Sales #group finance # 9f2c;3;1,2,5;600;12;1;0;17;").unwrap();
        let cube: CubeInfo = row.bind().unwrap();
        assert_eq!(cube.id, 4);
        assert_eq!(cube.name, "Sales");
        assert_eq!(cube.dimensions, vec![1, 2, 5]);
        assert_eq!(cube.tags.get("group").map(String::as_str), Some("finance"));
        assert_eq!(cube.hash.as_deref(), Some("9f2c"));
        assert_eq!(cube.token, 17);
    }

    #[test]
    fn test_bind_dimension_with_role() {
        let row = Row::parse("2;Month #group date #role month;13;1;1;2;0;8;9;10;3;").unwrap();
        let dim: DimensionInfo = row.bind().unwrap();
        assert_eq!(dim.name, "Month");
        assert_eq!(dim.tag("group"), Some("date"));
        assert_eq!(dim.tag("role"), Some("month"));
        assert_eq!(dim.attribute_cube, 9);
    }

    #[test]
    fn test_bind_short_database_row() {
        let db: DatabaseInfo = Row::parse("1;Demo;").unwrap().bind().unwrap();
        assert_eq!(db.id, 1);
        assert_eq!(db.name, "Demo");
        assert_eq!(db.cube_count, 0);
    }

    #[test]
    fn test_cell_data() {
        let num: CellValue = Row::parse("1;1;12.5;").unwrap().bind().unwrap();
        assert!(num.exists());
        assert_eq!(num.data(), CellData::Numeric(12.5));

        let empty: CellValue = Row::parse("1;0;;").unwrap().bind().unwrap();
        assert!(!empty.exists());
        assert_eq!(empty.data(), CellData::Numeric(0.0));

        let text: CellValue = Row::parse("2;1;\"a;b\";").unwrap().bind().unwrap();
        assert_eq!(text.data(), CellData::Text("a;b".into()));
    }

    #[test]
    fn test_dimension_serializes_tags() {
        let dim: DimensionInfo = Row::parse("2;Year #role year;").unwrap().bind().unwrap();
        let json = serde_json::to_value(&dim).unwrap();
        assert_eq!(json["name"], "Year");
        assert_eq!(json["tags"]["role"], "year");
    }
}
