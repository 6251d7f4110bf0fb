//! Parent/child links between the elements of one dimension.
//!
//! Links arrive as id lists that may point at elements later in the
//! response, so the build runs in two phases: index every element, then
//! resolve every id list against the index. Elements may have several
//! parents; the result is a DAG stored in a single [`IndexCache`] arena.

use thiserror::Error;

use crate::cache::{Id, IndexCache, Slot};
use crate::element::Element;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("element {element} references unknown {relation} id {missing}")]
    UnknownReference {
        element: Id,
        relation: &'static str,
        missing: Id,
    },
}

/// The indexed elements of a dimension plus their resolved links.
#[derive(Debug, Clone, Default)]
pub struct ElementHierarchy {
    elements: IndexCache<Element>,
    roots: Vec<Slot>,
}

impl ElementHierarchy {
    pub fn build<I>(elements: I) -> Result<Self, HierarchyError>
    where
        I: IntoIterator<Item = Element>,
    {
        let mut cache: IndexCache<Element> = elements.into_iter().collect();

        let mut resolved = Vec::with_capacity(cache.len());
        for slot in cache.slots() {
            let Some(el) = cache.get(slot) else { continue };
            let parents = resolve(&cache, el, &el.parent_ids, "parent")?;
            let children = resolve(&cache, el, &el.child_ids, "child")?;
            resolved.push((slot, parents, children));
        }

        let mut roots = Vec::new();
        for (slot, parents, children) in resolved {
            if parents.is_empty() {
                roots.push(slot);
            }
            if let Some(el) = cache.get_mut(slot) {
                el.parents = parents;
                el.children = children;
            }
        }

        Ok(Self { elements: cache, roots })
    }

    pub fn elements(&self) -> &IndexCache<Element> {
        &self.elements
    }

    pub fn by_id(&self, id: Id) -> Option<&Element> {
        self.elements.by_id(id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Element> {
        self.elements.by_name(name)
    }

    pub fn parents<'a>(&'a self, el: &'a Element) -> impl Iterator<Item = &'a Element> + 'a {
        el.parents.iter().filter_map(|&s| self.elements.get(s))
    }

    pub fn children<'a>(&'a self, el: &'a Element) -> impl Iterator<Item = &'a Element> + 'a {
        el.children.iter().filter_map(|&s| self.elements.get(s))
    }

    pub fn roots(&self) -> impl Iterator<Item = &Element> {
        self.roots.iter().filter_map(|&s| self.elements.get(s))
    }

    pub fn root_names(&self) -> Vec<String> {
        self.roots().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn resolve(
    cache: &IndexCache<Element>,
    el: &Element,
    ids: &[Id],
    relation: &'static str,
) -> Result<Vec<Slot>, HierarchyError> {
    ids.iter()
        .map(|&id| {
            cache.slot_of(id).ok_or(HierarchyError::UnknownReference {
                element: el.id,
                relation,
                missing: id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(id: Id, name: &str, parents: &[Id], children: &[Id]) -> Element {
        Element {
            id,
            name: name.to_string(),
            parent_ids: parents.to_vec(),
            child_ids: children.to_vec(),
            ..Default::default()
        }
    }

    fn sorted_ids<'a>(it: impl Iterator<Item = &'a Element>) -> Vec<Id> {
        let mut ids: Vec<Id> = it.map(|e| e.id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_roots_and_children() {
        let h = ElementHierarchy::build(vec![
            elem(1, "Total", &[], &[2, 3]),
            elem(2, "A", &[1], &[]),
            elem(3, "B", &[1], &[]),
        ])
        .unwrap();

        assert_eq!(sorted_ids(h.roots()), vec![1]);
        let total = h.by_id(1).unwrap();
        assert_eq!(sorted_ids(h.children(total)), vec![2, 3]);
        assert!(total.is_consolidated());
        assert!(!h.by_name("A").unwrap().is_consolidated());
    }

    #[test]
    fn test_forward_references_resolve() {
        // children listed before their parent
        let h = ElementHierarchy::build(vec![
            elem(2, "A", &[1], &[]),
            elem(1, "Total", &[], &[2]),
        ])
        .unwrap();
        let a = h.by_name("A").unwrap();
        assert_eq!(sorted_ids(h.parents(a)), vec![1]);
    }

    #[test]
    fn test_multiple_parents() {
        let h = ElementHierarchy::build(vec![
            elem(1, "Europe", &[], &[3]),
            elem(2, "EU", &[], &[3]),
            elem(3, "France", &[1, 2], &[]),
        ])
        .unwrap();
        let france = h.by_id(3).unwrap();
        assert_eq!(sorted_ids(h.parents(france)), vec![1, 2]);
        assert!(!france.is_root());
        let mut roots = h.root_names();
        roots.sort();
        assert_eq!(roots, vec!["EU", "Europe"]);
    }

    #[test]
    fn test_unknown_reference_is_error() {
        let err = ElementHierarchy::build(vec![elem(1, "Total", &[], &[99])]).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::UnknownReference { element: 1, relation: "child", missing: 99 }
        );
    }

    #[test]
    fn test_empty() {
        let h = ElementHierarchy::build(Vec::new()).unwrap();
        assert!(h.is_empty());
        assert_eq!(h.roots().count(), 0);
    }
}
