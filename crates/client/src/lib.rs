//! Client for the Palo OLAP HTTP interface.
//!
//! Cubes, dimensions and elements are addressed by name; the client
//! resolves names to server ids, keeps the session alive across expiry and
//! batches cell reads and writes.
//!
//! ```ignore
//! let client = Client::connect(Config::new("admin", "admin", "localhost", "7777", "Demo"))?;
//! let sales = client.cube("Sales")?;
//! let query = CoordinateQuery::new().element("Products", "Tea").element("Year", "2024");
//! let mut cells = sales.cells(sales.resolve(&query)?)?;
//! cells.fetch()?;
//! ```

pub mod cell;
pub mod config;
pub mod cube;
pub mod dimension;
pub mod error;
pub mod executor;
pub mod query;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

pub use cell::{Cell, CellGroup, CellInput};
pub use config::Config;
pub use cube::Cube;
pub use dimension::Dimension;
pub use error::{Error, Result};
pub use executor::{Session, SessionExecutor};
pub use query::CoordinateQuery;
pub use transport::{HttpTransport, RawResponse, Transport};

pub use palo_model::{CellData, Coordinate, CoordinateArea, Element, ElementHierarchy, Id};

/// A logged-in connection to one server and database.
#[derive(Clone)]
pub struct Client {
    executor: Arc<SessionExecutor>,
}

impl Client {
    /// Connect over HTTP and log in.
    pub fn connect(config: Config) -> Result<Self> {
        let transport =
            HttpTransport::new(Duration::from_secs(config.timeout_secs)).map_err(Error::Transport)?;
        Self::with_transport(config, Box::new(transport))
    }

    /// Log in through a caller-supplied transport.
    pub fn with_transport(config: Config, transport: Box<dyn Transport>) -> Result<Self> {
        let executor = SessionExecutor::new(config, transport);
        executor.login()?;
        Ok(Self { executor: Arc::new(executor) })
    }

    pub fn cube(&self, name: &str) -> Result<Cube> {
        Cube::open(Arc::clone(&self.executor), name, false)
    }

    /// Open a cube that is only listed with attribute cubes shown,
    /// e.g. `#_Products`.
    pub fn attribute_cube(&self, name: &str) -> Result<Cube> {
        Cube::open(Arc::clone(&self.executor), name, true)
    }

    pub fn executor(&self) -> &Arc<SessionExecutor> {
        &self.executor
    }
}
