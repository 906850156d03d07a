//! Conflict-aware emission of output groups.
//!
//! Every group is committed once, keyed by the identity of its enum, in a
//! [`CommitRegistry`] shared by all roots of a run. A second commit for the
//! same enum means two roots both number it and is reported as an
//! [`OverlapError`] naming both roots. Groups committed before a collision
//! stay committed.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io;

use thiserror::Error;

use crate::assign::OutputGroup;
use crate::error::{EmitError, OverlapError};
use crate::model::{NodeId, TypeTable};

/// Who owns a committed group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitRecord {
    pub root: NodeId,
    /// Key the writer stored the artifact under. Unique within one writer.
    pub artifact: String,
}

/// Emit-once map from enum identity to the root that numbered it.
#[derive(Clone, Debug, Default)]
pub struct CommitRegistry {
    records: HashMap<NodeId, CommitRecord>,
}

impl CommitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` as committed. Fails with the existing record if the node
    /// was already committed.
    pub fn commit(&mut self, node: NodeId, record: CommitRecord) -> Result<(), CommitRecord> {
        match self.records.entry(node) {
            Entry::Occupied(existing) => Err(existing.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&CommitRecord> {
        self.records.get(&node)
    }

    /// Record holding the given artifact key, if any.
    pub fn by_artifact(&self, artifact: &str) -> Option<(NodeId, &CommitRecord)> {
        self.records
            .iter()
            .find(|(_, r)| r.artifact == artifact)
            .map(|(&n, r)| (n, r))
    }

    /// Nodes committed by `root`, sorted by id.
    pub fn committed_by(&self, root: NodeId) -> Vec<NodeId> {
        let mut nodes: Vec<_> = self
            .records
            .iter()
            .filter(|(_, r)| r.root == root)
            .map(|(&n, _)| n)
            .collect();
        nodes.sort();
        nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A group ready to be written, with the name of its artifact.
#[derive(Clone, Copy, Debug)]
pub struct Artifact<'g> {
    pub name: &'g str,
    /// The configured root whose traversal produced the group.
    pub root: NodeId,
    pub group: &'g OutputGroup,
}

/// Failure reported by an [`ArtifactWriter`].
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("artifact {0} already exists")]
    AlreadyExists(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The collaborator that performs the physical write of one group.
pub trait ArtifactWriter {
    /// Write one artifact and return the key it was stored under.
    ///
    /// Keys must be unique per writer. A write whose key is already taken
    /// fails with [`WriteError::AlreadyExists`] carrying that key.
    fn write(&mut self, table: &TypeTable, artifact: &Artifact<'_>) -> Result<String, WriteError>;
}

impl<W: ArtifactWriter + ?Sized> ArtifactWriter for &mut W {
    fn write(&mut self, table: &TypeTable, artifact: &Artifact<'_>) -> Result<String, WriteError> {
        (**self).write(table, artifact)
    }
}

/// An artifact captured by [`MemoryWriter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub node: NodeId,
    pub name: String,
    pub root: NodeId,
    pub group: OutputGroup,
}

/// Keeps artifacts in memory, keyed by enum identity. Unrelated enums that
/// share a simple name get separate entries. Writing one enum twice is
/// `AlreadyExists`.
#[derive(Clone, Debug, Default)]
pub struct MemoryWriter {
    artifacts: Vec<WrittenArtifact>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// First artifact with the given name.
    pub fn get(&self, name: &str) -> Option<&OutputGroup> {
        self.artifacts
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.group)
    }

    /// The artifact written for `node`.
    pub fn group(&self, node: NodeId) -> Option<&OutputGroup> {
        self.artifacts
            .iter()
            .find(|a| a.node == node)
            .map(|a| &a.group)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.iter().map(|a| a.name.as_str())
    }

    pub fn artifacts(&self) -> &[WrittenArtifact] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactWriter for MemoryWriter {
    fn write(&mut self, _table: &TypeTable, artifact: &Artifact<'_>) -> Result<String, WriteError> {
        let node = artifact.group.node;
        let key = format!("{}#{}", artifact.name, node.index());
        if self.artifacts.iter().any(|a| a.node == node) {
            return Err(WriteError::AlreadyExists(key));
        }
        self.artifacts.push(WrittenArtifact {
            node,
            name: artifact.name.to_string(),
            root: artifact.root,
            group: artifact.group.clone(),
        });
        Ok(key)
    }
}

/// Commits groups through a writer, one configured root at a time.
#[derive(Debug)]
pub struct Emitter<W> {
    registry: CommitRegistry,
    writer: W,
}

impl<W: ArtifactWriter> Emitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            registry: CommitRegistry::new(),
            writer,
        }
    }

    /// Commit every group produced for `root`, in order.
    ///
    /// Stops at the first collision; groups committed before it are kept.
    /// Returns the number of groups committed.
    pub fn emit(
        &mut self,
        table: &TypeTable,
        root: NodeId,
        groups: &[OutputGroup],
    ) -> Result<usize, EmitError> {
        for (committed, group) in groups.iter().enumerate() {
            if let Some(existing) = self.registry.get(group.node) {
                return Err(overlap(table, group, root, existing.root).into());
            }

            let name = group.artifact_name();
            let artifact = Artifact {
                name: &name,
                root,
                group,
            };
            let key = match self.writer.write(table, &artifact) {
                Ok(key) => key,
                Err(WriteError::AlreadyExists(key)) => {
                    // Another enum of this run holds the key: blame its root.
                    if let Some((_, holder)) = self.registry.by_artifact(&key) {
                        return Err(overlap(table, group, root, holder.root).into());
                    }
                    return Err(EmitError::Io {
                        artifact: key,
                        root: table.info(root),
                        source: io::Error::new(
                            io::ErrorKind::AlreadyExists,
                            "artifact already exists",
                        ),
                    });
                }
                Err(WriteError::Io(source)) => {
                    return Err(EmitError::Io {
                        artifact: name,
                        root: table.info(root),
                        source,
                    });
                }
            };

            let record = CommitRecord { root, artifact: key };
            if let Err(existing) = self.registry.commit(group.node, record) {
                return Err(overlap(table, group, root, existing.root).into());
            }
            tracing::debug!(
                group = %group.name,
                root = table.name(root),
                committed = committed + 1,
                "committed group"
            );
        }
        Ok(groups.len())
    }

    pub fn registry(&self) -> &CommitRegistry {
        &self.registry
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn overlap(
    table: &TypeTable,
    group: &OutputGroup,
    current: NodeId,
    existing: NodeId,
) -> OverlapError {
    let err = OverlapError {
        group: table.info(group.node),
        current: table.info(current),
        existing: table.info(existing),
    };
    tracing::warn!(%err, "overlapping #[ordinal] roots");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::assign;
    use crate::model::{Configuration, ConfiguredRoot, Location, TypeNode, Variant};

    fn loc(line: u32) -> Location {
        Location::new("src/lib.rs", line)
    }

    fn root(node: NodeId) -> ConfiguredRoot {
        ConfiguredRoot {
            node,
            config: Configuration::default(),
        }
    }

    /// `Outer { A, Inner { B } }` plus an unrelated `Other { A }`.
    fn table() -> (TypeTable, NodeId, NodeId, NodeId) {
        let mut t = TypeTable::new();
        let outer = t.insert(TypeNode::enumeration("Outer", loc(1)));
        let inner = t.insert(TypeNode::enumeration("Inner", loc(5)));
        let other = t.insert(TypeNode::enumeration("Other", loc(9)));
        t.push_variant(outer, Variant::leaf("A", loc(2)));
        t.push_variant(outer, Variant::wrapping("Inner", loc(3), inner));
        t.push_variant(inner, Variant::leaf("B", loc(6)));
        t.push_variant(other, Variant::leaf("A", loc(10)));
        (t, outer, inner, other)
    }

    #[test]
    fn registry_is_emit_once() {
        let mut registry = CommitRegistry::new();
        let (_, outer, inner, _) = table();
        let record = |root| CommitRecord {
            root,
            artifact: "InnerExt".into(),
        };

        assert!(registry.commit(inner, record(outer)).is_ok());
        let existing = registry.commit(inner, record(inner)).unwrap_err();
        assert_eq!(existing.root, outer);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn emits_every_group_of_one_root() {
        let (t, outer, inner, _) = table();
        let groups = assign(&t, &root(outer)).unwrap();

        let mut emitter = Emitter::new(MemoryWriter::new());
        assert_eq!(emitter.emit(&t, outer, &groups).unwrap(), 2);

        let names: Vec<_> = emitter.writer().names().collect();
        assert_eq!(names, ["OuterExt", "InnerExt"]);
        assert_eq!(emitter.registry().committed_by(outer), [outer, inner]);
    }

    #[test]
    fn unrelated_roots_sharing_leaf_names_do_not_collide() {
        let (t, outer, _, other) = table();
        let mut emitter = Emitter::new(MemoryWriter::new());

        let groups = assign(&t, &root(outer)).unwrap();
        emitter.emit(&t, outer, &groups).unwrap();
        let groups = assign(&t, &root(other)).unwrap();
        emitter.emit(&t, other, &groups).unwrap();

        assert_eq!(emitter.writer().get("OuterExt").unwrap().ordinal_of("A"), Some(1));
        assert_eq!(emitter.writer().get("OtherExt").unwrap().ordinal_of("A"), Some(1));
    }

    #[test]
    fn nested_root_after_ancestor_overlaps() {
        let (t, outer, inner, _) = table();
        let mut emitter = Emitter::new(MemoryWriter::new());

        let groups = assign(&t, &root(outer)).unwrap();
        emitter.emit(&t, outer, &groups).unwrap();

        let groups = assign(&t, &root(inner)).unwrap();
        let err = match emitter.emit(&t, inner, &groups) {
            Err(EmitError::Overlap(err)) => err,
            other => panic!("expected overlap, got {other:?}"),
        };
        assert_eq!(err.group.name, "Inner");
        assert_eq!(err.current.name, "Inner");
        assert_eq!(err.existing.name, "Outer");
        // The ancestor's artifact is untouched.
        assert_eq!(emitter.writer().get("InnerExt").unwrap().ordinal_of("B"), Some(2));
    }

    #[test]
    fn partial_commit_survives_a_collision() {
        let (t, outer, inner, _) = table();
        let mut emitter = Emitter::new(MemoryWriter::new());

        let groups = assign(&t, &root(inner)).unwrap();
        emitter.emit(&t, inner, &groups).unwrap();

        let groups = assign(&t, &root(outer)).unwrap();
        let err = emitter.emit(&t, outer, &groups).unwrap_err();
        assert!(matches!(
            err,
            EmitError::Overlap(ref e) if e.current.name == "Outer" && e.existing.name == "Inner"
        ));

        // OuterExt was committed before InnerExt collided.
        assert_eq!(emitter.registry().committed_by(outer), [outer]);
        assert_eq!(emitter.writer().len(), 2);
    }

    #[test]
    fn unrelated_enums_sharing_a_name_do_not_collide() {
        let mut t = TypeTable::new();
        let a = t.insert(TypeNode::enumeration("Status", Location::new("src/a.rs", 1)));
        let b = t.insert(TypeNode::enumeration("Status", Location::new("src/b.rs", 1)));
        t.push_variant(a, Variant::leaf("On", Location::new("src/a.rs", 2)));
        t.push_variant(b, Variant::leaf("Off", Location::new("src/b.rs", 2)));

        let mut emitter = Emitter::new(MemoryWriter::new());
        for node in [a, b] {
            let groups = assign(&t, &root(node)).unwrap();
            emitter.emit(&t, node, &groups).unwrap();
        }

        assert_eq!(emitter.writer().group(a).unwrap().ordinal_of("On"), Some(1));
        assert_eq!(emitter.writer().group(b).unwrap().ordinal_of("Off"), Some(1));
        assert_ne!(
            emitter.registry().get(a).unwrap().artifact,
            emitter.registry().get(b).unwrap().artifact
        );
    }

    /// Keys artifacts by bare name, like a flat output directory.
    #[derive(Default)]
    struct ByName(Vec<String>);

    impl ArtifactWriter for ByName {
        fn write(&mut self, _: &TypeTable, artifact: &Artifact<'_>) -> Result<String, WriteError> {
            let key = artifact.name.to_string();
            if self.0.contains(&key) {
                return Err(WriteError::AlreadyExists(key));
            }
            self.0.push(key.clone());
            Ok(key)
        }
    }

    #[test]
    fn writer_collision_blames_the_holder() {
        // `Outer` numbers an enum named `Other`; the configured `Other` is unrelated.
        let mut t = TypeTable::new();
        let outer = t.insert(TypeNode::enumeration("Outer", loc(1)));
        let nested = t.insert(TypeNode::enumeration("Other", loc(4)));
        let other = t.insert(TypeNode::enumeration("Other", loc(8)));
        t.push_variant(outer, Variant::wrapping("Other", loc(2), nested));
        t.push_variant(nested, Variant::leaf("X", loc(5)));
        t.push_variant(other, Variant::leaf("Y", loc(9)));

        let mut emitter = Emitter::new(ByName::default());
        let groups = assign(&t, &root(outer)).unwrap();
        emitter.emit(&t, outer, &groups).unwrap();

        let groups = assign(&t, &root(other)).unwrap();
        let err = match emitter.emit(&t, other, &groups) {
            Err(EmitError::Overlap(err)) => err,
            other => panic!("expected overlap, got {other:?}"),
        };
        assert_eq!(err.current.location.line, 8);
        assert_eq!(err.existing.name, "Outer");
    }

    struct Stale(&'static str);

    impl ArtifactWriter for Stale {
        fn write(&mut self, _: &TypeTable, artifact: &Artifact<'_>) -> Result<String, WriteError> {
            if artifact.name == self.0 {
                Err(WriteError::AlreadyExists(artifact.name.to_string()))
            } else {
                Ok(artifact.name.to_string())
            }
        }
    }

    #[test]
    fn collision_with_nothing_committed_is_io() {
        let (t, outer, _, _) = table();
        let groups = assign(&t, &root(outer)).unwrap();
        let mut emitter = Emitter::new(Stale("InnerExt"));

        let err = emitter.emit(&t, outer, &groups).unwrap_err();
        let (artifact, source) = match err {
            EmitError::Io { artifact, source, .. } => (artifact, source),
            other => panic!("expected io error, got {other:?}"),
        };
        assert_eq!(artifact, "InnerExt");
        assert_eq!(source.kind(), io::ErrorKind::AlreadyExists);
        assert!(emitter.registry().get(outer).is_some());
    }

    struct Broken;

    impl ArtifactWriter for Broken {
        fn write(&mut self, _: &TypeTable, _: &Artifact<'_>) -> Result<String, WriteError> {
            Err(io::Error::other("disk full").into())
        }
    }

    #[test]
    fn io_failure_is_reported_with_artifact() {
        let (t, outer, _, _) = table();
        let groups = assign(&t, &root(outer)).unwrap();
        let mut emitter = Emitter::new(Broken);

        let err = emitter.emit(&t, outer, &groups).unwrap_err();
        assert!(matches!(err, EmitError::Io { ref artifact, .. } if artifact == "OuterExt"));
        assert!(emitter.registry().is_empty());
    }
}
