//! Writes committed groups to `OUT_DIR`, plus the index and manifest.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use sealed_ordinal::{Artifact, ArtifactWriter, GroupEntry, NodeId, TypeTable, WriteError};
use serde::Serialize;

use crate::codegen::{render_group, GENERATED_HEADER};
use crate::scan::EnumShape;

/// Directory under `OUT_DIR` holding one file per artifact.
pub const ARTIFACT_DIR: &str = "sealed_ordinal";
/// Index file to `include!` from the crate root.
pub const INDEX_FILE: &str = "ordinals.rs";
/// Human readable listing of every assigned ordinal.
pub const MANIFEST_FILE: &str = "ordinals.manifest.toml";

/// One artifact written during the run.
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub node: NodeId,
    pub root: NodeId,
    pub name: String,
    pub path: PathBuf,
    /// Enums this artifact delegates to
    pub nested: Vec<NodeId>,
    pub leaves: Vec<(String, u32)>,
}

/// [`ArtifactWriter`] rendering Rust source into a directory.
pub struct FileWriter<'a> {
    dir: PathBuf,
    shapes: &'a HashMap<NodeId, EnumShape>,
    crate_path: String,
    written: Vec<ArtifactFile>,
}

impl<'a> FileWriter<'a> {
    /// Create a writer over a fresh `dir`. Files left by an earlier run are
    /// removed.
    pub fn new(
        dir: impl Into<PathBuf>,
        shapes: &'a HashMap<NodeId, EnumShape>,
        crate_path: impl Into<String>,
    ) -> io::Result<Self> {
        let dir = dir.into();
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            shapes,
            crate_path: crate_path.into(),
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[ArtifactFile] {
        &self.written
    }

    /// File name of an artifact: module path joined with `__`, then the
    /// artifact name. `a::b::Foo` → `a__b__FooExt.rs`.
    pub fn file_name(shape: &EnumShape, artifact: &str) -> String {
        let mut name = String::new();
        for segment in &shape.module {
            name.push_str(segment);
            name.push_str("__");
        }
        name.push_str(artifact);
        name.push_str(".rs");
        name
    }

    /// Artifacts safe to include: every enum they delegate to has an
    /// included artifact written for the same root. A missing delegate would
    /// not compile, and one numbered by another root would repeat ordinals.
    pub fn includable(&self) -> Vec<&ArtifactFile> {
        let roots: HashMap<NodeId, NodeId> =
            self.written.iter().map(|a| (a.node, a.root)).collect();
        let mut ok: HashSet<NodeId> = self.written.iter().map(|a| a.node).collect();
        loop {
            let before = ok.len();
            for artifact in &self.written {
                let broken = artifact
                    .nested
                    .iter()
                    .any(|n| !ok.contains(n) || roots.get(n) != Some(&artifact.root));
                if broken {
                    ok.remove(&artifact.node);
                }
            }
            if ok.len() == before {
                break;
            }
        }
        self.written.iter().filter(|a| ok.contains(&a.node)).collect()
    }

    /// Write `ordinals.rs` into `out_dir`, returning its path.
    pub fn write_index(&self, table: &TypeTable, out_dir: &Path) -> io::Result<PathBuf> {
        let mut content = String::new();
        content.push_str(GENERATED_HEADER);
        content.push('\n');

        let includable = self.includable();
        for artifact in &self.written {
            if !includable.iter().any(|a| a.node == artifact.node) {
                tracing::warn!(
                    artifact = %artifact.name,
                    "left out of the index, a nested enum has no ordinals from the same root"
                );
            }
        }
        for artifact in includable {
            let absolute = std::path::absolute(&artifact.path)?;
            content.push_str(&format!(
                "// {} ({})\ninclude!({:?});\n",
                artifact.name,
                table.location(artifact.node),
                absolute.to_string_lossy()
            ));
        }

        let path = out_dir.join(INDEX_FILE);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Write `ordinals.manifest.toml` into `out_dir`, returning its path.
    pub fn write_manifest(
        &self,
        table: &TypeTable,
        out_dir: &Path,
    ) -> Result<PathBuf, ManifestError> {
        let manifest = Manifest {
            generated_at: chrono::Utc::now().to_rfc3339(),
            group: self
                .written
                .iter()
                .map(|a| ManifestGroup {
                    name: a.name.clone(),
                    path: self
                        .shapes
                        .get(&a.node)
                        .map(EnumShape::qualified_name)
                        .unwrap_or_else(|| table.name(a.node).to_string()),
                    root: table.name(a.root).to_string(),
                    source: self
                        .shapes
                        .get(&a.node)
                        .map(|shape| shape.file.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    file: a
                        .path
                        .file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    leaf: a
                        .leaves
                        .iter()
                        .map(|(name, ordinal)| ManifestLeaf {
                            name: name.clone(),
                            ordinal: *ordinal,
                        })
                        .collect(),
                })
                .collect(),
        };

        let content = toml::to_string_pretty(&manifest)?;
        let path = out_dir.join(MANIFEST_FILE);
        std::fs::write(
            &path,
            format!("# @generated by sealed-ordinal-build. Do not edit.\n{content}"),
        )?;
        Ok(path)
    }
}

impl ArtifactWriter for FileWriter<'_> {
    fn write(&mut self, table: &TypeTable, artifact: &Artifact<'_>) -> Result<String, WriteError> {
        let group = artifact.group;
        let shape = self.shapes.get(&group.node).ok_or_else(|| {
            io::Error::other(format!("no source declaration recorded for enum {}", group.name))
        })?;

        let file_name = Self::file_name(shape, artifact.name);
        let path = self.dir.join(&file_name);
        if self.written.iter().any(|a| a.path == path) {
            return Err(WriteError::AlreadyExists(file_name));
        }

        let code = render_group(table, shape, group, table.name(artifact.root), &self.crate_path)
            .map_err(io::Error::other)?;
        std::fs::write(&path, code)?;
        tracing::debug!(artifact = artifact.name, file = %path.display(), "wrote artifact");

        self.written.push(ArtifactFile {
            node: group.node,
            root: artifact.root,
            name: artifact.name.to_string(),
            path,
            nested: group
                .entries()
                .iter()
                .filter_map(|e| match e {
                    GroupEntry::Nested { node, .. } => Some(*node),
                    GroupEntry::Leaf(_) => None,
                })
                .collect(),
            leaves: group.assignments().map(|a| (a.leaf.clone(), a.ordinal)).collect(),
        });
        Ok(file_name)
    }
}

#[derive(Serialize)]
struct Manifest {
    generated_at: String,
    group: Vec<ManifestGroup>,
}

#[derive(Serialize)]
struct ManifestGroup {
    name: String,
    path: String,
    root: String,
    /// Source file the enum is declared in
    source: String,
    file: String,
    leaf: Vec<ManifestLeaf>,
}

#[derive(Serialize)]
struct ManifestLeaf {
    name: String,
    ordinal: u32,
}

/// Failure writing the manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write manifest: {0}")]
    Io(#[from] io::Error),
}
