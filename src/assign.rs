//! Ordinal assignment: one depth-first preorder walk per configured root.
//!
//! A single counter, starting at 1, is shared by the whole walk. Leaves take
//! the next value in the order they are visited, so the descendants of a
//! composite variant are numbered strictly between its neighbouring siblings:
//!
//! ```text
//! UhOh { Cool, Nice, NotCool { VeryUncool { Woooo }, NotNice }, Weh }
//!
//!   UhOh       Cool=1  Nice=2  Weh=5
//!   NotCool    NotNice=4
//!   VeryUncool Woooo=3
//! ```
//!
//! In non-recursive mode a composite variant is numbered like a leaf and its
//! own variants are never visited.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::AssignError;
use crate::model::{ConfiguredRoot, NodeId, TypeTable};

/// One leaf numbered within its enclosing enum.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Assignment {
    pub enclosing: NodeId,
    pub leaf: String,
    pub ordinal: u32,
}

/// An entry of an [`OutputGroup`], in traversal order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum GroupEntry {
    /// A numbered variant.
    Leaf(Assignment),
    /// A composite variant that was descended into. It carries no ordinal at
    /// this level; its leaves live in the group of `node`.
    Nested { variant: String, node: NodeId },
}

/// Everything numbered directly inside one enum during one traversal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputGroup {
    pub node: NodeId,
    pub name: String,
    entries: Vec<GroupEntry>,
}

impl OutputGroup {
    fn new(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Name of the generated artifact, `<Name>Ext`.
    pub fn artifact_name(&self) -> String {
        format!("{}Ext", self.name)
    }

    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    /// Numbered leaves only, in traversal order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.entries.iter().filter_map(|e| match e {
            GroupEntry::Leaf(a) => Some(a),
            GroupEntry::Nested { .. } => None,
        })
    }

    pub fn ordinal_of(&self, leaf: &str) -> Option<u32> {
        self.assignments()
            .find(|a| a.leaf == leaf)
            .map(|a| a.ordinal)
    }

    /// `(leaf, ordinal)` pairs, handy for comparisons.
    pub fn pairs(&self) -> Vec<(&str, u32)> {
        self.assignments()
            .map(|a| (a.leaf.as_str(), a.ordinal))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Number the subtree of `root`.
///
/// Returns one group per enum entered, root first, in preorder. Every enum
/// entered gets a group even when all its variants are composite.
pub fn assign(table: &TypeTable, root: &ConfiguredRoot) -> Result<Vec<OutputGroup>, AssignError> {
    let mut walk = Traversal {
        table,
        root: root.node,
        recursive: root.config.recursive,
        counter: 1,
        entered: HashSet::new(),
        groups: Vec::new(),
    };
    walk.enter(root.node)?;

    tracing::debug!(
        root = %table.info(root.node),
        groups = walk.groups.len(),
        leaves = walk.counter - 1,
        "assigned ordinals"
    );
    Ok(walk.groups)
}

struct Traversal<'a> {
    table: &'a TypeTable,
    root: NodeId,
    recursive: bool,
    counter: u32,
    entered: HashSet<NodeId>,
    groups: Vec<OutputGroup>,
}

impl Traversal<'_> {
    fn enter(&mut self, node: NodeId) -> Result<(), AssignError> {
        let table = self.table;
        if !self.entered.insert(node) {
            return Err(AssignError::NotATree {
                root: table.info(self.root),
                node: table.info(node),
            });
        }

        let slot = self.groups.len();
        self.groups.push(OutputGroup::new(node, table.name(node)));

        for variant in table.direct_children(node) {
            match table.composite_target(variant) {
                Some(child) if self.recursive => {
                    self.groups[slot].entries.push(GroupEntry::Nested {
                        variant: variant.name.clone(),
                        node: child,
                    });
                    self.enter(child)?;
                }
                _ => {
                    let ordinal = self.counter;
                    self.counter += 1;
                    tracing::trace!(group = table.name(node), leaf = %variant.name, ordinal);
                    self.groups[slot].entries.push(GroupEntry::Leaf(Assignment {
                        enclosing: node,
                        leaf: variant.name.clone(),
                        ordinal,
                    }));
                }
            }
        }

        Ok(())
    }
}
