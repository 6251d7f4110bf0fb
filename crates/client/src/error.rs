use palo_model::{CoordError, HierarchyError, Id};
use palo_protocol::{BindError, ServerError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error type for client operations.
///
/// Everything except [`Error::Server`] is internal to this crate and reports
/// code `0` from [`Error::code`].
#[derive(Debug, Error)]
pub enum Error {
    /// Request could not be sent or the body could not be read
    #[error("transport error: {0}")]
    Transport(String),
    /// Malformed wire data
    #[error("protocol error in row {row}: {message} ({content:?})")]
    Protocol {
        row: usize,
        content: String,
        message: String,
    },
    /// Error row reported by the server
    #[error("{0}")]
    Server(ServerError),
    /// Row could not be bound to the expected record
    #[error("row {row}: {source}")]
    Bind {
        row: usize,
        #[source]
        source: BindError,
    },
    /// Server answered without the rows the endpoint promises
    #[error("{endpoint}: empty response")]
    EmptyResponse { endpoint: String },
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("database {0:?} not found")]
    DatabaseNotFound(String),
    #[error("cube {0:?} not found")]
    CubeNotFound(String),
    #[error("dimension {0:?} not found")]
    DimensionNotFound(String),
    #[error("dimension with id {0} not found")]
    DimensionIdNotFound(Id),
    #[error("element {element:?} missing in dimension {dimension:?}")]
    ElementNotFound { dimension: String, element: String },
    #[error("element with id {id} does not exist in dimension {dimension:?}")]
    ElementIdNotFound { dimension: String, id: Id },
    #[error("dimension {dimension:?}: {source}")]
    Hierarchy {
        dimension: String,
        #[source]
        source: HierarchyError,
    },
    #[error(transparent)]
    Coord(#[from] CoordError),
    #[error("coordinate has length {actual}, expected {expected}")]
    CoordinateLength { expected: usize, actual: usize },

    /// Write attempted on a group containing consolidated cells
    #[error("cell group contains consolidated cells")]
    Consolidated,
    #[error("{actual} values given, expected {expected}")]
    ValueCount { expected: usize, actual: usize },
    /// The server refused some rows of a bulk write
    #[error("cannot write rows {0:?}")]
    RejectedRows(Vec<usize>),

    #[error("no dimension belongs to date group {0:?}")]
    UnknownDateGroup(String),
    #[error("dimension {dimension:?} has unknown date role {role:?}")]
    UnknownDateRole { dimension: String, role: String },
}

impl Error {
    /// Server error code, `0` for internal errors.
    pub fn code(&self) -> i32 {
        match self {
            Error::Server(e) => e.code,
            _ => 0,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Server(e) if e.is_session_expired())
    }
}

impl From<ServerError> for Error {
    fn from(e: ServerError) -> Self {
        Error::Server(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let server = Error::Server(ServerError {
            code: 1015,
            name: "invalid session".into(),
            message: "expired".into(),
        });
        assert_eq!(server.code(), 1015);
        assert!(server.is_session_expired());
        assert_eq!(server.to_string(), "invalid session (1015): expired");

        let internal = Error::Transport("connection refused".into());
        assert_eq!(internal.code(), 0);
        assert!(!internal.is_session_expired());
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = Error::ElementNotFound { dimension: "Months".into(), element: "Jan".into() };
        assert_eq!(err.to_string(), "element \"Jan\" missing in dimension \"Months\"");
        assert_eq!(Error::RejectedRows(vec![1, 3]).to_string(), "cannot write rows [1, 3]");
    }
}
