//! Hierarchy model: an arena of declarations and the variants that link them.
//!
//! A closed hierarchy is an `enum`; its direct children are its variants in
//! declaration order. A variant that wraps another enum of the table is a
//! composite child, every other variant is a leaf.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{NodeInfo, NotComposite};

/// Identity of a declaration inside a [`TypeTable`].
///
/// Identity is positional, never by name: two enums called `Status` in
/// different modules are different nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source position of a declaration, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// What kind of item a declaration is. Only [`DeclKind::Enum`] is composite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    Enum,
    Struct,
    TupleStruct,
    UnitStruct,
    Union,
    Trait,
    TypeAlias,
    Function,
    Const,
    Static,
}

impl DeclKind {
    #[inline]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Enum)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enum => "enum",
            Self::Struct => "struct",
            Self::TupleStruct => "tuple struct",
            Self::UnitStruct => "unit struct",
            Self::Union => "union",
            Self::Trait => "trait",
            Self::TypeAlias => "type alias",
            Self::Function => "fn",
            Self::Const => "const",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared visibility, kept only to describe rejected declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Crate,
    /// `pub(super)`, `pub(in path)`; holds the text between the parentheses.
    Restricted(String),
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => f.write_str("private"),
            Self::Public => f.write_str("pub"),
            Self::Crate => f.write_str("pub(crate)"),
            Self::Restricted(scope) => write!(f, "pub({scope})"),
        }
    }
}

/// A declaration: an enum with its variants, or any other item that could
/// carry the marker attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeNode {
    pub name: String,
    pub location: Location,
    pub kind: DeclKind,
    pub visibility: Visibility,
    variants: Vec<Variant>,
}

impl TypeNode {
    pub fn new(name: impl Into<String>, location: Location, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            location,
            kind,
            visibility: Visibility::Private,
            variants: Vec::new(),
        }
    }

    /// Shorthand for an enum node.
    pub fn enumeration(name: impl Into<String>, location: Location) -> Self {
        Self::new(name, location, DeclKind::Enum)
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Human readable kind, e.g. `pub unit struct`.
    pub fn describe(&self) -> String {
        format!("{} {}", self.visibility, self.kind)
    }

    pub fn info(&self) -> NodeInfo {
        NodeInfo::new(&self.name, self.location.clone())
    }
}

/// A direct child of an enum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Variant {
    pub name: String,
    pub location: Location,
    /// The declaration this variant wraps, when it wraps one from the table.
    pub target: Option<NodeId>,
}

impl Variant {
    pub fn leaf(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            target: None,
        }
    }

    pub fn wrapping(name: impl Into<String>, location: Location, target: NodeId) -> Self {
        Self {
            name: name.into(),
            location,
            target: Some(target),
        }
    }
}

/// Per-root numbering options, the only datum of the marker attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Configuration {
    /// Descend into composite variants instead of numbering them as leaves.
    pub recursive: bool,
}

impl Configuration {
    pub const fn new(recursive: bool) -> Self {
        Self { recursive }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self { recursive: true }
    }
}

/// A node designated for numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ConfiguredRoot {
    pub node: NodeId,
    pub config: Configuration,
}

/// Arena of declarations plus the roots configured for numbering.
///
/// The table is read-only once built; every query is side-effect free.
#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    nodes: Vec<TypeNode>,
    roots: Vec<ConfiguredRoot>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration. Variants are attached afterwards with
    /// [`push_variant`](Self::push_variant) so that they can refer to nodes
    /// declared later.
    pub fn insert(&mut self, node: TypeNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append a variant to `parent`, preserving declaration order.
    pub fn push_variant(&mut self, parent: NodeId, variant: Variant) {
        self.nodes[parent.index()].variants.push(variant);
    }

    /// Designate `node` as a numbering root.
    ///
    /// Roots are processed in the order they were first configured.
    /// Configuring the same node again replaces its configuration in place.
    pub fn configure(&mut self, node: NodeId, config: Configuration) {
        match self.roots.iter_mut().find(|r| r.node == node) {
            Some(existing) => existing.config = config,
            None => self.roots.push(ConfiguredRoot { node, config }),
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &TypeNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    #[inline]
    pub fn location(&self, id: NodeId) -> &Location {
        &self.node(id).location
    }

    #[inline]
    pub fn is_composite(&self, id: NodeId) -> bool {
        self.node(id).kind.is_composite()
    }

    /// Direct children in declaration order.
    #[inline]
    pub fn direct_children(&self, id: NodeId) -> &[Variant] {
        &self.node(id).variants
    }

    /// The composite node a variant descends into, if any.
    #[inline]
    pub fn composite_target(&self, variant: &Variant) -> Option<NodeId> {
        variant.target.filter(|&target| self.is_composite(target))
    }

    pub fn configured_roots(&self) -> &[ConfiguredRoot] {
        &self.roots
    }

    pub fn info(&self, id: NodeId) -> NodeInfo {
        self.node(id).info()
    }

    /// Reject a root that cannot have children before any traversal runs.
    pub fn validate_root(&self, root: &ConfiguredRoot) -> Result<(), NotComposite> {
        let node = self.node(root.node);
        if node.kind.is_composite() {
            Ok(())
        } else {
            Err(NotComposite {
                node: node.info(),
                kind: node.describe(),
            })
        }
    }

    /// First node with the given simple name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| NodeId(i as u32))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
