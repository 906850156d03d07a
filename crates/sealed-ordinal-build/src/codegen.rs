//! Rust code generation for committed groups.
//!
//! Each group becomes an inherent `impl` on its enum with one
//! `<VARIANT>_ORDINAL` constant per numbered variant and an `ordinal()`
//! accessor, plus an impl of the `Ordinal` trait forwarding to it.

use std::collections::HashSet;
use std::fmt::Write as FmtWrite;

use heck::ToShoutySnakeCase;
use quote::ToTokens;
use sealed_ordinal::{GroupEntry, OutputGroup, TypeTable};

use crate::scan::EnumShape;

/// Header of every generated file.
pub const GENERATED_HEADER: &str = "// @generated by sealed-ordinal-build. Do not edit.";

/// Name of the associated constant for a numbered variant.
pub fn const_name(variant: &str) -> String {
    let bare = variant.strip_prefix("r#").unwrap_or(variant);
    format!("{}_ORDINAL", bare.to_shouty_snake_case())
}

/// Render one group.
///
/// `root` names the configured root the group was numbered for and only
/// appears in the header comment.
pub fn render_group(
    table: &TypeTable,
    shape: &EnumShape,
    group: &OutputGroup,
    root: &str,
    crate_path: &str,
) -> Result<String, std::fmt::Error> {
    let mut output = String::new();
    let location = table.location(group.node);

    writeln!(&mut output, "{GENERATED_HEADER}")?;
    writeln!(
        &mut output,
        "// {}: numbered by #[ordinal] enum {root}, declared at {location}",
        group.artifact_name()
    )?;
    writeln!(&mut output)?;

    let (impl_generics, ty_generics, where_clause) = shape.generics.split_for_impl();
    let impl_generics = tokens(&impl_generics);
    let ty_generics = tokens(&ty_generics);
    let where_clause = where_clause.map(|w| format!(" {}", tokens(w))).unwrap_or_default();
    let self_ty = format!("crate::{}{ty_generics}", shape.qualified_name());

    // Constants
    let mut seen = HashSet::new();
    let mut consts = Vec::new();
    for assignment in group.assignments() {
        let mut name = const_name(&assignment.leaf);
        if !seen.insert(name.clone()) {
            name = format!("{name}_{}", assignment.ordinal);
            seen.insert(name.clone());
        }
        consts.push((assignment.leaf.as_str(), name, assignment.ordinal));
    }

    writeln!(&mut output, "impl{impl_generics} {self_ty}{where_clause} {{")?;
    for (leaf, name, ordinal) in &consts {
        writeln!(&mut output, "    /// Ordinal of [`Self::{leaf}`].")?;
        writeln!(&mut output, "    pub const {name}: u32 = {ordinal};")?;
    }
    if !consts.is_empty() {
        writeln!(&mut output)?;
    }

    // Accessor
    writeln!(&mut output, "    /// Sequential ordinal of the active variant.")?;
    writeln!(&mut output, "    #[inline]")?;
    writeln!(&mut output, "    pub fn ordinal(&self) -> u32 {{")?;
    if group.is_empty() {
        writeln!(&mut output, "        match *self {{}}")?;
    } else {
        writeln!(&mut output, "        match self {{")?;
        let mut consts = consts.iter();
        for entry in group.entries() {
            match entry {
                GroupEntry::Leaf(_) => {
                    if let Some((leaf, name, _)) = consts.next() {
                        writeln!(
                            &mut output,
                            "            Self::{leaf} {{ .. }} => Self::{name},"
                        )?;
                    }
                }
                GroupEntry::Nested { variant, .. } => {
                    writeln!(
                        &mut output,
                        "            Self::{variant}(inner) => inner.ordinal(),"
                    )?;
                }
            }
        }
        writeln!(&mut output, "        }}")?;
    }
    writeln!(&mut output, "    }}")?;
    writeln!(&mut output, "}}")?;
    writeln!(&mut output)?;

    // Trait
    writeln!(
        &mut output,
        "impl{impl_generics} {crate_path}::Ordinal for {self_ty}{where_clause} {{"
    )?;
    writeln!(&mut output, "    #[inline]")?;
    writeln!(&mut output, "    fn ordinal(&self) -> u32 {{")?;
    writeln!(&mut output, "        Self::ordinal(self)")?;
    writeln!(&mut output, "    }}")?;
    writeln!(&mut output, "}}")?;

    Ok(output)
}

fn tokens(value: &impl ToTokens) -> String {
    value.to_token_stream().to_string()
}
