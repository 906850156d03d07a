//! Source scanning: builds a [`TypeTable`] from Rust files.
//!
//! Scanning runs in two passes. The first declares every item of every file
//! and records `#[ordinal]` markers; the second resolves the field type of
//! single-field tuple variants so that `NotCool(NotCool)` or
//! `Neg(Box<Expr>)` links to the enum it wraps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sealed_ordinal::{
    Configuration, DeclKind, Location, NodeId, TypeNode, TypeTable, Variant, Visibility,
};
use syn::spanned::Spanned;
use syn::{Attribute, Fields, Item, LitBool, Type};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::OrdinalConfig;

/// What codegen needs to know about a scanned enum.
#[derive(Clone)]
pub struct EnumShape {
    /// Module path from the crate root, excluding the enum itself
    pub module: Vec<String>,
    pub ident: syn::Ident,
    pub generics: syn::Generics,
    /// File the enum was declared in
    pub file: PathBuf,
}

impl EnumShape {
    /// `a::b::Name`, relative to the crate root.
    pub fn qualified_name(&self) -> String {
        let mut path = self.module.join("::");
        if !path.is_empty() {
            path.push_str("::");
        }
        path.push_str(&self.ident.to_string());
        path
    }
}

/// Result of a scan: the hierarchy plus codegen side data.
pub struct ScannedSource {
    pub table: TypeTable,
    pub shapes: HashMap<NodeId, EnumShape>,
    /// Every file read, in scan order
    pub files: Vec<PathBuf>,
}

/// Errors while reading or parsing sources.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: syn::Error },

    #[error("{}:{line}: invalid #[ordinal] attribute: {message}", path.display())]
    Attribute {
        path: PathBuf,
        line: u32,
        message: String,
    },
}

/// Scan every `.rs` file under `config.source_root`, sorted by path.
pub fn scan(config: &OrdinalConfig) -> Result<ScannedSource, ScanError> {
    let root = &config.source_root;
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ScanError::Walk {
            root: root.clone(),
            source,
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "rs") {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if config.is_excluded(relative) {
            tracing::debug!(file = %path.display(), "excluded from scan");
            continue;
        }
        files.push(path.to_path_buf());
    }

    let mut scanner = Scanner::new();
    for path in &files {
        scanner.add_file(root, path)?;
    }
    Ok(scanner.finish())
}

/// Module path of a file relative to the source root.
///
/// `lib.rs`, `main.rs` → crate root; `a/mod.rs` → `a`; `a/b.rs` → `a::b`.
pub fn module_path_of(relative: &Path) -> Vec<String> {
    let mut module: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let Some(last) = module.pop() else {
        return module;
    };
    let stem = Path::new(&last)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(last);

    match stem.as_str() {
        "mod" => {}
        "lib" | "main" if module.is_empty() => {}
        _ => module.push(stem),
    }
    module
}

struct PendingEnum {
    id: NodeId,
    module: Vec<String>,
    file: PathBuf,
    item: syn::ItemEnum,
}

/// Incremental two-pass scanner. Feed it files with
/// [`add_file`](Self::add_file) or [`add_source`](Self::add_source), then
/// call [`finish`](Self::finish).
#[derive(Default)]
pub struct Scanner {
    table: TypeTable,
    enums: Vec<PendingEnum>,
    roots: Vec<(NodeId, Configuration)>,
    /// Full path (module + ident) → type declaration
    by_path: HashMap<Vec<String>, NodeId>,
    /// Simple name → type declarations, for paths brought in by `use`
    by_name: HashMap<String, Vec<NodeId>>,
    files: Vec<PathBuf>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and declare one file below `root`.
    pub fn add_file(&mut self, root: &Path, path: &Path) -> Result<(), ScanError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let relative = path.strip_prefix(root).unwrap_or(path);
        let module = module_path_of(relative);
        self.add_source(path, module, &content)
    }

    /// Declare the items of one source text living at `module`.
    pub fn add_source(
        &mut self,
        file: impl Into<PathBuf>,
        module: Vec<String>,
        content: &str,
    ) -> Result<(), ScanError> {
        let file = file.into();
        let parsed = syn::parse_file(content).map_err(|source| ScanError::Parse {
            path: file.clone(),
            source,
        })?;
        tracing::debug!(file = %file.display(), module = %module.join("::"), "scanning");

        self.declare_items(&file, &module, &parsed.items)?;
        self.files.push(file);
        Ok(())
    }

    fn declare_items(
        &mut self,
        file: &Path,
        module: &[String],
        items: &[Item],
    ) -> Result<(), ScanError> {
        for item in items {
            if let Item::Mod(m) = item {
                if let Some((_, nested)) = &m.content {
                    let mut inner = module.to_vec();
                    inner.push(m.ident.to_string());
                    self.declare_items(file, &inner, nested)?;
                }
                continue;
            }

            let Some((ident, kind, vis, attrs)) = declaration(item) else {
                continue;
            };
            let marker = ordinal_marker(file, attrs)?;
            let is_type = matches!(
                kind,
                DeclKind::Enum
                    | DeclKind::Struct
                    | DeclKind::TupleStruct
                    | DeclKind::UnitStruct
                    | DeclKind::Union
                    | DeclKind::TypeAlias
            );
            if !is_type && marker.is_none() {
                continue;
            }

            let location = Location::new(file, line_of(ident.span()));
            let node =
                TypeNode::new(ident.to_string(), location, kind).with_visibility(visibility(vis));
            let id = self.table.insert(node);

            if is_type {
                let mut path = module.to_vec();
                path.push(ident.to_string());
                self.by_path.insert(path, id);
                self.by_name.entry(ident.to_string()).or_default().push(id);
            }
            if let Item::Enum(e) = item {
                self.enums.push(PendingEnum {
                    id,
                    module: module.to_vec(),
                    file: file.to_path_buf(),
                    item: e.clone(),
                });
            }
            if let Some(config) = marker {
                self.roots.push((id, config));
            }
        }
        Ok(())
    }

    /// Resolve variants and configure roots in discovery order.
    pub fn finish(mut self) -> ScannedSource {
        let mut shapes = HashMap::new();
        let enums = std::mem::take(&mut self.enums);

        for pending in enums {
            for variant in &pending.item.variants {
                let location = Location::new(&pending.file, line_of(variant.ident.span()));
                let name = variant.ident.to_string();
                let target = single_field(&variant.fields)
                    .and_then(|ty| self.resolve(&pending.module, ty));
                let variant = match target {
                    Some(target) => Variant::wrapping(name, location, target),
                    None => Variant::leaf(name, location),
                };
                self.table.push_variant(pending.id, variant);
            }

            shapes.insert(
                pending.id,
                EnumShape {
                    module: pending.module,
                    ident: pending.item.ident,
                    generics: pending.item.generics,
                    file: pending.file,
                },
            );
        }

        for (id, config) in self.roots {
            self.table.configure(id, config);
        }

        ScannedSource {
            table: self.table,
            shapes,
            files: self.files,
        }
    }

    fn resolve(&self, module: &[String], ty: &Type) -> Option<NodeId> {
        let segments = type_path(peel(ty))?;
        let (first, rest) = segments.split_first()?;

        match first.as_str() {
            "crate" => self.by_path.get(rest).copied(),
            "self" => self.lookup_in(module, rest),
            "super" => {
                let supers = segments.iter().take_while(|s| *s == "super").count();
                let base = module.get(..module.len().checked_sub(supers)?)?;
                self.lookup_in(base, &segments[supers..])
            }
            _ => self
                .lookup_in(module, &segments)
                .or_else(|| self.by_path.get(&segments).copied())
                .or_else(|| {
                    if segments.len() == 1 {
                        self.unique_by_name(first)
                    } else {
                        None
                    }
                }),
        }
    }

    fn lookup_in(&self, module: &[String], rest: &[String]) -> Option<NodeId> {
        let mut path = module.to_vec();
        path.extend_from_slice(rest);
        self.by_path.get(&path).copied()
    }

    fn unique_by_name(&self, name: &str) -> Option<NodeId> {
        match self.by_name.get(name).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            Some(candidates) if candidates.len() > 1 => {
                tracing::warn!(
                    name,
                    candidates = candidates.len(),
                    "ambiguous variant type, numbering it as a leaf"
                );
                None
            }
            _ => None,
        }
    }
}

fn line_of(span: proc_macro2::Span) -> u32 {
    span.start().line as u32
}

fn declaration(item: &Item) -> Option<(&syn::Ident, DeclKind, &syn::Visibility, &[Attribute])> {
    let decl = match item {
        Item::Enum(e) => (&e.ident, DeclKind::Enum, &e.vis, &e.attrs[..]),
        Item::Struct(s) => {
            let kind = match s.fields {
                Fields::Named(_) => DeclKind::Struct,
                Fields::Unnamed(_) => DeclKind::TupleStruct,
                Fields::Unit => DeclKind::UnitStruct,
            };
            (&s.ident, kind, &s.vis, &s.attrs[..])
        }
        Item::Union(u) => (&u.ident, DeclKind::Union, &u.vis, &u.attrs[..]),
        Item::Trait(t) => (&t.ident, DeclKind::Trait, &t.vis, &t.attrs[..]),
        Item::Type(t) => (&t.ident, DeclKind::TypeAlias, &t.vis, &t.attrs[..]),
        Item::Fn(f) => (&f.sig.ident, DeclKind::Function, &f.vis, &f.attrs[..]),
        Item::Const(c) => (&c.ident, DeclKind::Const, &c.vis, &c.attrs[..]),
        Item::Static(s) => (&s.ident, DeclKind::Static, &s.vis, &s.attrs[..]),
        _ => return None,
    };
    Some(decl)
}

fn visibility(vis: &syn::Visibility) -> Visibility {
    match vis {
        syn::Visibility::Public(_) => Visibility::Public,
        syn::Visibility::Inherited => Visibility::Private,
        syn::Visibility::Restricted(r) => {
            let path = path_string(&r.path);
            match (r.in_token.is_some(), path.as_str()) {
                (false, "crate") => Visibility::Crate,
                (true, _) => Visibility::Restricted(format!("in {path}")),
                (false, _) => Visibility::Restricted(path),
            }
        }
    }
}

fn path_string(path: &syn::Path) -> String {
    let joined = path
        .segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");
    if path.leading_colon.is_some() {
        format!("::{joined}")
    } else {
        joined
    }
}

fn is_ordinal_attr(attr: &Attribute) -> bool {
    let segments: Vec<String> = attr.path().segments.iter().map(|s| s.ident.to_string()).collect();
    match segments.as_slice() {
        [name] => name == "ordinal",
        [krate, name] => krate == "sealed_ordinal" && name == "ordinal",
        _ => false,
    }
}

/// The configuration carried by an `#[ordinal]` attribute, if present.
fn ordinal_marker(file: &Path, attrs: &[Attribute]) -> Result<Option<Configuration>, ScanError> {
    let Some(attr) = attrs.iter().find(|a| is_ordinal_attr(a)) else {
        return Ok(None);
    };

    let mut config = Configuration::default();
    let parsed = match &attr.meta {
        syn::Meta::Path(_) => Ok(()),
        syn::Meta::List(_) => attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("recursive") {
                let value: LitBool = meta.value()?.parse()?;
                config.recursive = value.value;
                Ok(())
            } else {
                Err(meta.error("unknown #[ordinal] argument, expected `recursive`"))
            }
        }),
        syn::Meta::NameValue(nv) => Err(syn::Error::new(
            nv.span(),
            "expected #[ordinal] or #[ordinal(recursive = <bool>)]",
        )),
    };

    parsed.map(|()| Some(config)).map_err(|e| ScanError::Attribute {
        path: file.to_path_buf(),
        line: line_of(e.span()),
        message: e.to_string(),
    })
}

/// The field type of a single-field tuple variant.
fn single_field(fields: &Fields) -> Option<&Type> {
    match fields {
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
            unnamed.unnamed.first().map(|f| &f.ty)
        }
        _ => None,
    }
}

/// Strip parentheses, groups and `Box<..>`.
fn peel(ty: &Type) -> &Type {
    match ty {
        Type::Paren(p) => peel(&p.elem),
        Type::Group(g) => peel(&g.elem),
        Type::Path(p) if p.qself.is_none() => {
            let Some(last) = p.path.segments.last() else {
                return ty;
            };
            if last.ident != "Box" {
                return ty;
            }
            match &last.arguments {
                syn::PathArguments::AngleBracketed(args) if args.args.len() == 1 => {
                    match args.args.first() {
                        Some(syn::GenericArgument::Type(inner)) => peel(inner),
                        _ => ty,
                    }
                }
                _ => ty,
            }
        }
        _ => ty,
    }
}

/// Path segments of a plain type path, generic arguments dropped.
fn type_path(ty: &Type) -> Option<Vec<String>> {
    match ty {
        Type::Path(p) if p.qself.is_none() && p.path.leading_colon.is_none() => {
            Some(p.path.segments.iter().map(|s| s.ident.to_string()).collect())
        }
        _ => None,
    }
}
