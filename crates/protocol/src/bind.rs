//! Positional record binding.
//!
//! A [`Record`] declares its attributes in wire order as a list of
//! [`FieldSpec`]s. Binding walks that list, consuming one row position per
//! bindable attribute and skipping [`Setter::Opaque`] ones. When the row
//! runs out the remaining attributes keep their `Default` values.
//!
//! Numbers always go through an `f64` parse before narrowing, so integer
//! attributes accept server output such as `3.0`. An empty numeric field
//! reads as zero.

use thiserror::Error;

use crate::row::{Field, Row};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("field {field}: cannot convert {value:?} to {kind}")]
    Convert {
        field: &'static str,
        kind: WireKind,
        value: String,
    },
}

/// Scalar width an attribute is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Str,
    I32,
    I64,
    F32,
    F64,
}

/// What an attribute expects from its row position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Scalar(Scalar),
    List(Scalar),
    /// Not bound from the wire; does not consume a position.
    Opaque,
}

impl std::fmt::Display for WireKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scalar = |s: &Scalar| match s {
            Scalar::Str => "string",
            Scalar::I32 => "i32",
            Scalar::I64 => "i64",
            Scalar::F32 => "f32",
            Scalar::F64 => "f64",
        };
        match self {
            WireKind::Scalar(s) => f.write_str(scalar(s)),
            WireKind::List(s) => write!(f, "list of {}", scalar(s)),
            WireKind::Opaque => f.write_str("opaque"),
        }
    }
}

/// Typed assignment into one attribute of `R`.
pub enum Setter<R> {
    Str(fn(&mut R, String)),
    I32(fn(&mut R, i32)),
    I64(fn(&mut R, i64)),
    F32(fn(&mut R, f32)),
    F64(fn(&mut R, f64)),
    StrList(fn(&mut R, Vec<String>)),
    I32List(fn(&mut R, Vec<i32>)),
    I64List(fn(&mut R, Vec<i64>)),
    F64List(fn(&mut R, Vec<f64>)),
    Opaque,
}

impl<R> Setter<R> {
    pub fn kind(&self) -> WireKind {
        match self {
            Setter::Str(_) => WireKind::Scalar(Scalar::Str),
            Setter::I32(_) => WireKind::Scalar(Scalar::I32),
            Setter::I64(_) => WireKind::Scalar(Scalar::I64),
            Setter::F32(_) => WireKind::Scalar(Scalar::F32),
            Setter::F64(_) => WireKind::Scalar(Scalar::F64),
            Setter::StrList(_) => WireKind::List(Scalar::Str),
            Setter::I32List(_) => WireKind::List(Scalar::I32),
            Setter::I64List(_) => WireKind::List(Scalar::I64),
            Setter::F64List(_) => WireKind::List(Scalar::F64),
            Setter::Opaque => WireKind::Opaque,
        }
    }
}

/// One attribute declaration: name, wire kind (implied by the setter), setter.
pub struct FieldSpec<R> {
    pub name: &'static str,
    pub setter: Setter<R>,
}

impl<R> FieldSpec<R> {
    pub const fn new(name: &'static str, setter: Setter<R>) -> Self {
        Self { name, setter }
    }
}

/// A typed entity bound positionally from a [`Row`].
pub trait Record: Default + 'static {
    /// Attributes in wire order.
    const FIELDS: &'static [FieldSpec<Self>];

    /// Post-bind normalization, if this record type has one.
    fn normalizer() -> Option<fn(&mut Self)> {
        None
    }
}

/// Bind `row` into a fresh `R`. No partial record is returned on error.
pub fn bind<R: Record>(row: &Row) -> Result<R, BindError> {
    let mut record = R::default();
    let mut pos = 0;
    for spec in R::FIELDS {
        if matches!(spec.setter, Setter::Opaque) {
            continue;
        }
        let Some(field) = row.get(pos) else {
            break;
        };
        apply(&mut record, spec, field)?;
        pos += 1;
    }
    if let Some(normalize) = R::normalizer() {
        normalize(&mut record);
    }
    Ok(record)
}

impl Row {
    /// Convenience for [`bind`].
    pub fn bind<R: Record>(&self) -> Result<R, BindError> {
        bind(self)
    }
}

fn apply<R>(record: &mut R, spec: &FieldSpec<R>, field: &Field) -> Result<(), BindError> {
    let raw = field.as_str();
    let number = |s: &str| parse_number(s, spec);
    match &spec.setter {
        Setter::Str(set) => set(record, raw.to_string()),
        Setter::I32(set) => set(record, number(raw)? as i32),
        Setter::I64(set) => set(record, number(raw)? as i64),
        Setter::F32(set) => set(record, number(raw)? as f32),
        Setter::F64(set) => set(record, number(raw)?),
        Setter::StrList(set) => {
            set(record, field.list().into_iter().map(str::to_string).collect())
        }
        Setter::I32List(set) => set(
            record,
            field.list().into_iter().map(|s| number(s).map(|n| n as i32)).collect::<Result<_, _>>()?,
        ),
        Setter::I64List(set) => set(
            record,
            field.list().into_iter().map(|s| number(s).map(|n| n as i64)).collect::<Result<_, _>>()?,
        ),
        Setter::F64List(set) => {
            set(record, field.list().into_iter().map(number).collect::<Result<_, _>>()?)
        }
        Setter::Opaque => {}
    }
    Ok(())
}

fn parse_number<R>(raw: &str, spec: &FieldSpec<R>) -> Result<f64, BindError> {
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>().map_err(|_| BindError::Convert {
        field: spec.name,
        kind: spec.setter.kind(),
        value: raw.to_string(),
    })
}
