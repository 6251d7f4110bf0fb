//! Request parameters, serialized into the query string.
//!
//! Each key carries its own join policy, fixed by the first call that
//! creates it:
//!
//! - [`Params::add`] — values joined by `,`
//! - [`Params::set`] — a single value, replacing whatever was there
//! - [`Params::path`] — each call appends one `,`-joined group; groups are
//!   joined by `:` (several cell paths in one request)

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    Comma,
    Single,
    Path,
}

impl Join {
    fn separator(self) -> &'static str {
        match self {
            Join::Comma => ",",
            Join::Single => "",
            Join::Path => ":",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Param {
    values: Vec<String>,
    join: Join,
}

/// Query parameters. Keys serialize in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, Param>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append comma-joined values under `key`.
    pub fn add<I, S>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry(key, Join::Comma)
            .values
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Replace `key` with exactly one value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.entries.insert(
            key.to_string(),
            Param { values: vec![value.into()], join: Join::Single },
        );
        self
    }

    /// Append one path group under `key`.
    pub fn path<I, S>(&mut self, key: &str, group: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let joined = group.into_iter().map(Into::into).collect::<Vec<String>>().join(",");
        self.entry(key, Join::Path).values.push(joined);
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(render)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `key=value` pairs joined by `&`. Values are not escaped here.
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(key, param)| format!("{}={}", key, render(param)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn entry(&mut self, key: &str, join: Join) -> &mut Param {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| Param { values: Vec::new(), join })
    }
}

fn render(param: &Param) -> String {
    param.values.join(param.join.separator())
}

impl std::fmt::Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_joins_with_comma() {
        let mut p = Params::new();
        p.add("dimension", ["3"]).add("dimension", ["4", "5"]);
        assert_eq!(p.to_query_string(), "dimension=3,4,5");
    }

    #[test]
    fn test_set_overwrites() {
        let mut p = Params::new();
        p.add("sid", ["caller"]);
        p.set("sid", "abc");
        p.set("sid", "def");
        assert_eq!(p.get("sid").as_deref(), Some("def"));
    }

    #[test]
    fn test_path_groups() {
        let mut p = Params::new();
        p.path("paths", ["1", "2", "3"]);
        p.path("paths", ["4", "5", "6"]);
        assert_eq!(p.to_query_string(), "paths=1,2,3:4,5,6");
    }

    #[test]
    fn test_query_string_is_sorted() {
        let mut p = Params::new();
        p.set("sid", "s1");
        p.add("cube", ["7"]);
        p.set("database", "2");
        assert_eq!(p.to_string(), "cube=7&database=2&sid=s1");
    }

    #[test]
    fn test_empty() {
        let p = Params::new();
        assert!(p.is_empty());
        assert_eq!(p.to_query_string(), "");
    }
}
