//! Substring search over the catalog tree.
//!
//! Every node below the root is tested on its own: a matching artist does
//! not pull in its albums or tracks. Results come back in depth-first
//! order (root children in insertion order, each subtree fully explored
//! before the next sibling). That order carries no relevance meaning.

use super::node::CatalogNode;

/// Nodes whose name contains `query`, ignoring case.
pub fn search<'a>(root: &'a CatalogNode, query: &str) -> Vec<&'a CatalogNode> {
    let needle = query.to_lowercase();
    collect_matching(root, |node| node.folded_name().contains(needle.as_str()), &needle)
}

/// Nodes whose name equals `query`, ignoring case.
pub fn search_exact<'a>(root: &'a CatalogNode, query: &str) -> Vec<&'a CatalogNode> {
    let needle = query.to_lowercase();
    collect_matching(root, |node| node.folded_name() == needle, &needle)
}

fn collect_matching<'a, F>(root: &'a CatalogNode, matches: F, needle: &str) -> Vec<&'a CatalogNode>
where
    F: Fn(&CatalogNode) -> bool,
{
    let mut results = Vec::new();
    if needle.is_empty() {
        return results;
    }
    for child in root.children() {
        walk(child, &matches, &mut results);
    }
    results
}

fn walk<'a, F>(node: &'a CatalogNode, matches: &F, results: &mut Vec<&'a CatalogNode>)
where
    F: Fn(&CatalogNode) -> bool,
{
    if matches(node) {
        results.push(node);
    }
    for child in node.children() {
        walk(child, matches, results);
    }
}
