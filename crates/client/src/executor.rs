//! Session-aware request execution.
//!
//! Every request carries the current session id and selected database id.
//! When the server answers with the "invalid session" code the executor
//! logs in again and re-issues the request once; a second failure is
//! returned to the caller as is.

use parking_lot::Mutex;

use palo_model::{DatabaseInfo, Id, IndexCache, LoginInfo};
use palo_protocol::{parse_body, split_rows, Params, Record, Row, ServerError, ERROR_STATUS};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::Transport;

pub const LOGIN_ENDPOINT: &str = "/server/login";
pub const DATABASES_ENDPOINT: &str = "/server/databases";

const SID_KEY: &str = "sid";
const DATABASE_KEY: &str = "database";

/// Client-side session state. The session id is replaced on every login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub session_id: Option<String>,
    pub database_id: Option<Id>,
}

/// Executes requests against one server with one session.
pub struct SessionExecutor {
    transport: Box<dyn Transport>,
    config: Config,
    base_url: String,
    session: Mutex<Session>,
    // held while logging in again so concurrent expiries converge on one login
    relogin: Mutex<()>,
}

impl SessionExecutor {
    pub fn new(config: Config, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: config.base_url(),
            transport,
            config,
            session: Mutex::new(Session::default()),
            relogin: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.lock().clone()
    }

    /// Log in with the configured credentials and store the new session id.
    pub fn login(&self) -> Result<()> {
        let mut params = Params::new();
        params.add("user", [self.config.user.as_str()]);
        params.add("password", [self.config.password.as_str()]);

        let snapshot = self.session();
        let rows = self.send(LOGIN_ENDPOINT, params, &snapshot)?;
        let row = match rows.as_slice() {
            [row] => row,
            [] => return Err(Error::EmptyResponse { endpoint: LOGIN_ENDPOINT.into() }),
            _ => {
                return Err(Error::Protocol {
                    row: 1,
                    content: rows[1].render(),
                    message: format!("login returned {} rows, expected 1", rows.len()),
                })
            }
        };
        let info: LoginInfo = row.bind().map_err(|source| Error::Bind { row: 0, source })?;

        self.session.lock().session_id = Some(info.session);
        log::info!("logged in as {} (server time {})", self.config.user, info.time);
        Ok(())
    }

    /// Run `endpoint` with `params` and return its rows.
    ///
    /// `sid` and `database` in `params` are overwritten with the session's.
    pub fn execute(&self, endpoint: &str, params: Params) -> Result<Vec<Row>> {
        let used = self.session();
        match self.send(endpoint, params.clone(), &used) {
            Err(e) if e.is_session_expired() => {
                log::warn!("session expired on {}, logging in again", endpoint);
            }
            other => return other,
        }
        self.refresh_session(&used)?;
        let fresh = self.session();
        self.send(endpoint, params, &fresh)
    }

    /// All databases on the server, indexed by id and name.
    pub fn databases(&self) -> Result<IndexCache<DatabaseInfo>> {
        let rows = self.execute(DATABASES_ENDPOINT, Params::new())?;
        Ok(bind_rows::<DatabaseInfo>(&rows)?.into_iter().collect())
    }

    /// Resolve `name` and make it the database attached to every request.
    pub fn select_database(&self, name: &str) -> Result<Id> {
        let databases = self.databases()?;
        let db = databases
            .by_name(name)
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))?;
        self.session.lock().database_id = Some(db.id);
        log::info!("selected database {:?} (id {})", name, db.id);
        Ok(db.id)
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Log in again unless another caller already replaced the session
    /// that `stale` saw expire.
    fn refresh_session(&self, stale: &Session) -> Result<()> {
        let _guard = self.relogin.lock();
        if self.session.lock().session_id != stale.session_id {
            log::debug!("session already refreshed by another caller");
            return Ok(());
        }
        self.login()
    }

    fn send(&self, endpoint: &str, mut params: Params, session: &Session) -> Result<Vec<Row>> {
        params.set(SID_KEY, session.session_id.clone().unwrap_or_default());
        params.set(
            DATABASE_KEY,
            session.database_id.map(|id| id.to_string()).unwrap_or_default(),
        );
        let url = format!("{}{}?{}", self.base_url, endpoint, params.to_query_string());
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("request: {}{}?{}", self.base_url, endpoint, masked(&params));
        }

        let response = self.transport.get(&url).map_err(Error::Transport)?;
        let body = response.text();
        log::debug!("response: status {} ({} bytes)", response.status, response.body.len());

        if response.status == ERROR_STATUS {
            return Err(server_error(&body));
        }

        parse_body(&body).map_err(|e| Error::Protocol {
            row: e.index,
            content: e.content,
            message: e.source.to_string(),
        })
    }
}

fn masked(params: &Params) -> String {
    if !params.contains("password") {
        return params.to_query_string();
    }
    let mut shown = params.clone();
    shown.set("password", "***");
    shown.to_query_string()
}

/// Turn an error body into [`Error::Server`], or an internal error if the
/// row itself is unreadable.
fn server_error(body: &str) -> Error {
    let line = split_rows(body).into_iter().next().unwrap_or("");
    let row = match Row::parse(line) {
        Ok(row) => row,
        Err(e) => {
            return Error::Protocol { row: 0, content: line.to_string(), message: e.to_string() }
        }
    };
    match row.bind::<ServerError>() {
        Ok(err) => Error::Server(err),
        Err(source) => Error::Bind { row: 0, source },
    }
}

/// Bind every row, naming the first one that fails.
pub(crate) fn bind_rows<R: Record>(rows: &[Row]) -> Result<Vec<R>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| row.bind::<R>().map_err(|source| Error::Bind { row: i, source }))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transport::RawResponse;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replays canned responses in order and records every URL.
    #[derive(Default)]
    pub(crate) struct Scripted {
        responses: Mutex<VecDeque<std::result::Result<RawResponse, String>>>,
        urls: Mutex<Vec<String>>,
    }

    impl Scripted {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub(crate) fn ok(&self, body: &str) -> &Self {
            self.responses.lock().push_back(Ok(RawResponse::new(200, body)));
            self
        }

        pub(crate) fn fail(&self, body: &str) -> &Self {
            self.responses.lock().push_back(Ok(RawResponse::new(400, body)));
            self
        }

        pub(crate) fn broken(&self, msg: &str) -> &Self {
            self.responses.lock().push_back(Err(msg.to_string()));
            self
        }

        pub(crate) fn urls(&self) -> Vec<String> {
            self.urls.lock().clone()
        }

        pub(crate) fn calls_to(&self, endpoint: &str) -> usize {
            self.urls().iter().filter(|u| u.contains(&format!("{}?", endpoint))).count()
        }
    }

    impl Transport for Scripted {
        fn get(&self, url: &str) -> std::result::Result<RawResponse, String> {
            self.urls.lock().push(url.to_string());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(format!("no scripted response for {}", url)))
        }
    }

    pub(crate) fn config() -> Config {
        Config::new("admin", "pw", "olap", "7777", "Demo")
    }

    pub(crate) fn executor(script: &Arc<Scripted>) -> SessionExecutor {
        SessionExecutor::new(config(), Box::new(script.clone()))
    }

    #[test]
    fn test_login_stores_session() {
        let script = Scripted::new();
        script.ok("s1;1700000000;\n");
        let ex = executor(&script);

        ex.login().unwrap();
        assert_eq!(ex.session().session_id.as_deref(), Some("s1"));
        let url = &script.urls()[0];
        assert!(url.starts_with("http://olap:7777/server/login?"));
        assert!(url.contains("user=admin"));
        assert!(url.contains("password=pw"));
    }

    #[test]
    fn test_login_needs_exactly_one_row() {
        let script = Scripted::new();
        script.ok("");
        let ex = executor(&script);
        assert!(matches!(ex.login().unwrap_err(), Error::EmptyResponse { .. }));

        script.ok("a;1;\nb;2;\n");
        assert!(matches!(ex.login().unwrap_err(), Error::Protocol { row: 1, .. }));
    }

    #[test]
    fn test_execute_attaches_session_over_caller_values() {
        let script = Scripted::new();
        script.ok("s1;0;\n").ok("1;x;\n2;y;\n");
        let ex = executor(&script);
        ex.login().unwrap();

        let mut params = Params::new();
        params.add("sid", ["forged"]).add("cube", ["3"]);
        let rows = ex.execute("/cube/info", params).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get(1).map(|f| f.as_str()), Some("y"));
        assert_eq!(script.urls()[1], "http://olap:7777/cube/info?cube=3&database=&sid=s1");
    }

    #[test]
    fn test_expired_session_relogs_and_retries_once() {
        let script = Scripted::new();
        script
            .ok("s1;0;\n")
            .fail("1015;invalid session;expired;\n")
            .ok("s2;0;\n")
            .ok("1;ok;\n");
        let ex = executor(&script);
        ex.login().unwrap();

        let rows = ex.execute("/database/cubes", Params::new()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(script.calls_to(LOGIN_ENDPOINT), 2);
        assert_eq!(script.calls_to("/database/cubes"), 2);
        let urls = script.urls();
        assert!(urls[1].contains("sid=s1"));
        assert!(urls[3].contains("sid=s2"));
        assert_eq!(ex.session().session_id.as_deref(), Some("s2"));
    }

    #[test]
    fn test_second_expiry_is_returned() {
        let script = Scripted::new();
        script
            .fail("1015;invalid session;expired;\n")
            .ok("s2;0;\n")
            .fail("1015;invalid session;expired again;\n");
        let ex = executor(&script);

        let err = ex.execute("/database/cubes", Params::new()).unwrap_err();
        assert!(err.is_session_expired());
        assert_eq!(script.urls().len(), 3);
    }

    #[test]
    fn test_other_server_errors_pass_through() {
        let script = Scripted::new();
        script.fail("2001;element not found;no element with id 9;\n");
        let ex = executor(&script);

        let err = ex.execute("/element/destroy", Params::new()).unwrap_err();
        assert_eq!(err.code(), 2001);
        assert_eq!(script.calls_to(LOGIN_ENDPOINT), 0);
    }

    #[test]
    fn test_transport_failure_not_retried() {
        let script = Scripted::new();
        script.broken("connection refused");
        let ex = executor(&script);

        let err = ex.execute("/server/databases", Params::new()).unwrap_err();
        assert!(matches!(err, Error::Transport(ref m) if m == "connection refused"));
        assert_eq!(err.code(), 0);
        assert_eq!(script.urls().len(), 1);
    }

    #[test]
    fn test_malformed_row_is_protocol_error() {
        let script = Scripted::new();
        script.ok("1;ok;\n2;\"bad\"x;\n");
        let ex = executor(&script);

        match ex.execute("/dimension/elements", Params::new()).unwrap_err() {
            Error::Protocol { row, content, .. } => {
                assert_eq!(row, 1);
                assert_eq!(content, "2;\"bad\"x;");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_select_database() {
        let script = Scripted::new();
        script.ok("1;System;\n4;Demo;\n");
        let ex = executor(&script);

        assert_eq!(ex.select_database("Demo").unwrap(), 4);
        assert_eq!(ex.session().database_id, Some(4));

        script.ok("1;System;\n");
        let err = ex.select_database("Missing").unwrap_err();
        assert_eq!(err.to_string(), "database \"Missing\" not found");
    }

    #[test]
    fn test_refresh_skipped_when_session_already_replaced() {
        let script = Scripted::new();
        script.ok("s2;0;\n");
        let ex = executor(&script);
        ex.login().unwrap();

        let stale = Session { session_id: Some("s1".into()), database_id: None };
        ex.refresh_session(&stale).unwrap();
        assert_eq!(script.urls().len(), 1);
    }

    #[test]
    fn test_masked_hides_password() {
        let mut params = Params::new();
        params.add("user", ["admin"]).add("password", ["secret"]);
        assert_eq!(masked(&params), "password=***&user=admin");
    }
}
