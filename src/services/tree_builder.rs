//! Tree Builder for Syncmarks.
//!
//! Pure reconstruction of a nested bookmark forest from the flat rows a
//! device uploaded. Children are grouped in an index keyed by parent id
//! rather than by language-level self-reference, and every sibling list is
//! sorted the same way: folders first, then titles case-insensitively.
//!
//! A record whose parent chain loops fails with
//! [`TreeError::CycleDetected`]; a record whose parent id points at a
//! missing record is dropped from the visible tree (it is not promoted to
//! a root).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::types::bookmark::{BookmarkNode, BookmarkRecord};
use crate::types::errors::TreeError;

/// Reconstructs the ordered forest for one device's flat record set.
///
/// Roots are the records with no parent id. The sibling comparator is
/// applied at every level independently, so the result is fully ordered
/// regardless of input order.
///
/// # Errors
/// Returns `TreeError::CycleDetected` when any record's parent chain
/// revisits an id instead of terminating at a root or a missing parent.
pub fn build_tree(records: &[BookmarkRecord]) -> Result<Vec<BookmarkNode>, TreeError> {
    detect_cycles(records)?;

    let mut children_of: HashMap<Option<&str>, Vec<&BookmarkRecord>> = HashMap::new();
    for record in records {
        children_of
            .entry(record.parent_id.as_deref())
            .or_default()
            .push(record);
    }

    Ok(assemble(&children_of, None))
}

/// Builds the ordered sibling list under one parent, recursing into each
/// node's own children. The recursion depth is bounded by the record count:
/// `detect_cycles` has already ruled out loops, and each record appears
/// under exactly one parent key.
fn assemble(
    children_of: &HashMap<Option<&str>, Vec<&BookmarkRecord>>,
    parent: Option<&str>,
) -> Vec<BookmarkNode> {
    let mut nodes: Vec<BookmarkNode> = children_of
        .get(&parent)
        .map(|siblings| siblings.as_slice())
        .unwrap_or(&[])
        .iter()
        .map(|record| {
            let mut node = BookmarkNode::from_record(record);
            node.children = assemble(children_of, Some(record.id.as_str()));
            node
        })
        .collect();

    nodes.sort_by(sibling_order);
    nodes
}

/// Sibling comparator: folders before non-folders, then titles compared
/// case-insensitively, raw title as the deterministic tiebreak.
fn sibling_order(a: &BookmarkNode, b: &BookmarkNode) -> Ordering {
    b.is_folder
        .cmp(&a.is_folder)
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.title.cmp(&b.title))
}

/// Walks every record's parent chain, memoizing chains already proven to
/// terminate. A chain revisiting an id within one walk is a cycle.
fn detect_cycles(records: &[BookmarkRecord]) -> Result<(), TreeError> {
    let parent_of: HashMap<&str, Option<&str>> = records
        .iter()
        .map(|record| (record.id.as_str(), record.parent_id.as_deref()))
        .collect();

    let mut terminates: HashSet<&str> = HashSet::new();
    for record in records {
        let mut walked: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = record.id.as_str();
        loop {
            if terminates.contains(current) {
                break;
            }
            if !seen.insert(current) {
                return Err(TreeError::CycleDetected(current.to_string()));
            }
            walked.push(current);
            match parent_of.get(current) {
                Some(Some(parent)) => current = parent,
                // Root, or a dangling reference: both terminate the chain.
                Some(None) | None => break,
            }
        }
        terminates.extend(walked);
    }
    Ok(())
}
