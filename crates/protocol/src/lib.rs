//! Palo wire protocol.
//!
//! Requests are `GET {base}{endpoint}?{params}`; responses are line-oriented
//! text, one record per row, `;`-separated fields. This crate turns bodies
//! into [`Row`]s and rows into typed [`Record`]s. No I/O.
//!
//! # Usage
//!
//! ```ignore
//! use palo_protocol::{parse_body, Record};
//!
//! let rows = parse_body("1;Sales;\n2;Costs;\n")?;
//! let db: DatabaseInfo = rows[0].bind()?;
//! ```

pub mod bind;
pub mod error;
pub mod params;
pub mod row;

pub use bind::{bind, BindError, FieldSpec, Record, Scalar, Setter, WireKind};
pub use error::{ServerError, CODE_INVALID_SESSION, ERROR_STATUS};
pub use params::Params;
pub use row::{parse_body, split_fields, split_rows, Field, Fields, ParseError, Row, RowError};
