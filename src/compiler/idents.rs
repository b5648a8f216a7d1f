//! WGSL identifiers for node values.

use std::collections::HashMap;

use anyhow::{Result, bail};
use log::warn;

use super::utils::sanitize_wgsl_ident;

/// Hands out one WGSL identifier per node id for a single compile call.
///
/// Identifiers are `n_` + the sanitized id, which keeps them clear of the template's own
/// locals and of ids starting with a digit. Two ids can sanitize to the same text
/// (`a-b` and `a.b`); the reverse map catches that instead of letting them alias.
#[derive(Debug, Default)]
pub struct IdentAllocator {
    by_node: HashMap<String, String>,
    owner_by_ident: HashMap<String, String>,
}

impl IdentAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for `node_id`, allocating it on first use.
    ///
    /// On a collision, `strict` turns it into an error; otherwise the later node gets the
    /// first free `_2`, `_3`, ... suffix.
    pub fn allocate(&mut self, node_id: &str, strict: bool) -> Result<String> {
        if let Some(ident) = self.by_node.get(node_id) {
            return Ok(ident.clone());
        }

        let base = format!("n_{}", sanitize_wgsl_ident(node_id));
        let mut ident = base.clone();
        if let Some(owner) = self.owner_by_ident.get(&base) {
            if strict {
                bail!("node ids {owner:?} and {node_id:?} both map to WGSL identifier `{base}`");
            }
            let mut n = 2usize;
            while self.owner_by_ident.contains_key(&ident) {
                ident = format!("{base}_{n}");
                n += 1;
            }
            warn!("node id {node_id:?} collides with {owner:?} as `{base}`; using `{ident}`");
        }

        self.owner_by_ident.insert(ident.clone(), node_id.to_string());
        self.by_node.insert(node_id.to_string(), ident.clone());
        Ok(ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_sanitized_ids() {
        let mut idents = IdentAllocator::new();
        assert_eq!(idents.allocate("node-1", false).unwrap(), "n_node_1");
        assert_eq!(idents.allocate("3d", false).unwrap(), "n_3d");
        assert_eq!(idents.allocate("node-1", true).unwrap(), "n_node_1");
    }

    #[test]
    fn same_node_gets_same_ident() {
        let mut idents = IdentAllocator::new();
        let first = idents.allocate("a.b", true).unwrap();
        assert_eq!(idents.allocate("a.b", true).unwrap(), first);
    }

    #[test]
    fn lenient_collisions_get_suffixes() {
        let mut idents = IdentAllocator::new();
        assert_eq!(idents.allocate("a-b", false).unwrap(), "n_a_b");
        assert_eq!(idents.allocate("a.b", false).unwrap(), "n_a_b_2");
        assert_eq!(idents.allocate("a b", false).unwrap(), "n_a_b_3");
        // A real id that happens to look like a suffixed one is pushed along too.
        assert_eq!(idents.allocate("a_b_2", false).unwrap(), "n_a_b_2_2");
    }

    #[test]
    fn strict_collisions_are_errors() {
        let mut idents = IdentAllocator::new();
        idents.allocate("a-b", true).unwrap();
        let err = idents.allocate("a.b", true).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("a-b"), "{msg}");
        assert!(msg.contains("n_a_b"), "{msg}");
    }
}
