//! Decorated object names.
//!
//! Cube and dimension names can carry metadata after `#` markers:
//!
//! ```text
//! Year #group date #role year     -> name "Year", tags {group: date, role: year}
//! Sales # 9f2c                    -> name "Sales", hash "9f2c" (cubes)
//! #_Products                      -> name "#_Products"
//! ```

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoratedName {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub hash: Option<String>,
}

/// Split `raw` into its base name, `#key value` tags and, when `with_hash`
/// is set, a `# value` hash decoration.
pub fn split_decorated(raw: &str, with_hash: bool) -> DecoratedName {
    let mut parts = raw.split('#');
    let base = parts.next().unwrap_or("").trim();
    let decorations: Vec<&str> = parts.collect();

    let name = match (base.is_empty(), decorations.first()) {
        (true, Some(first)) => format!("#{}", first.trim()),
        _ => base.to_string(),
    };

    let mut out = DecoratedName { name, ..Default::default() };
    for info in decorations {
        match info.find(' ') {
            Some(0) => {
                if with_hash {
                    out.hash = Some(info.trim().to_string());
                }
            }
            Some(i) => {
                let key = info[..i].trim();
                let value = info[i..].trim();
                out.tags.insert(key.to_string(), value.to_string());
            }
            None => {}
        }
    }
    out
}
