//! End-to-end numbering scenarios through `process`.

use pretty_assertions::assert_eq;
use sealed_ordinal::{
    process, Configuration, DeclKind, Location, MemoryWriter, NodeId, OrdinalError, RootState,
    TypeNode, TypeTable, Variant, Visibility,
};

/// Builds a table from a compact description, numbering lines as it goes.
struct Builder {
    table: TypeTable,
    line: u32,
}

impl Builder {
    fn new() -> Self {
        Self {
            table: TypeTable::new(),
            line: 0,
        }
    }

    fn loc(&mut self) -> Location {
        self.line += 1;
        Location::new("src/lib.rs", self.line)
    }

    fn enumeration(&mut self, name: &str) -> NodeId {
        let loc = self.loc();
        self.table.insert(TypeNode::enumeration(name, loc))
    }

    fn leaves(&mut self, parent: NodeId, names: &[&str]) {
        for name in names {
            let loc = self.loc();
            self.table.push_variant(parent, Variant::leaf(*name, loc));
        }
    }

    fn wrap(&mut self, parent: NodeId, name: &str, target: NodeId) {
        let loc = self.loc();
        self.table.push_variant(parent, Variant::wrapping(name, loc, target));
    }

    fn root(&mut self, node: NodeId, recursive: bool) {
        self.table.configure(node, Configuration::new(recursive));
    }
}

/// `UhOh { Cool, Nice, NotCool(NotCool { VeryUncool(VeryUncool { Woooo }), NotNice }), Weh }`
fn uh_oh() -> (Builder, NodeId, NodeId, NodeId) {
    let mut b = Builder::new();
    let uh_oh = b.enumeration("UhOh");
    let not_cool = b.enumeration("NotCool");
    let very_uncool = b.enumeration("VeryUncool");

    b.leaves(uh_oh, &["Cool", "Nice"]);
    b.wrap(uh_oh, "NotCool", not_cool);
    b.leaves(uh_oh, &["Weh"]);
    b.wrap(not_cool, "VeryUncool", very_uncool);
    b.leaves(not_cool, &["NotNice"]);
    b.leaves(very_uncool, &["Woooo"]);
    (b, uh_oh, not_cool, very_uncool)
}

#[test]
fn flat_root_numbers_in_declaration_order() {
    let mut b = Builder::new();
    let foo = b.enumeration("Foo");
    b.leaves(foo, &["Bar1", "Bar2"]);
    b.root(foo, true);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert!(report.is_success());
    assert_eq!(writer.names().collect::<Vec<_>>(), ["FooExt"]);
    assert_eq!(writer.get("FooExt").unwrap().pairs(), [("Bar1", 1), ("Bar2", 2)]);
}

#[test]
fn independent_roots_share_leaf_names() {
    let mut b = Builder::new();
    let sample = b.enumeration("Sample");
    b.leaves(sample, &["Cool", "Nice"]);
    let uh_oh = b.enumeration("UhOh");
    b.leaves(uh_oh, &["Cool", "Nice"]);
    b.root(sample, true);
    b.root(uh_oh, true);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert!(report.is_success());
    assert_eq!(writer.get("SampleExt").unwrap().pairs(), [("Cool", 1), ("Nice", 2)]);
    assert_eq!(writer.get("UhOhExt").unwrap().pairs(), [("Cool", 1), ("Nice", 2)]);
}

#[test]
fn recursive_root_numbers_nested_enums_depth_first() {
    let (mut b, uh_oh, _, _) = uh_oh();
    b.root(uh_oh, true);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert!(report.is_success());
    assert_eq!(writer.names().collect::<Vec<_>>(), ["UhOhExt", "NotCoolExt", "VeryUncoolExt"]);
    assert_eq!(writer.get("UhOhExt").unwrap().pairs(), [("Cool", 1), ("Nice", 2), ("Weh", 5)]);
    assert_eq!(writer.get("NotCoolExt").unwrap().pairs(), [("NotNice", 4)]);
    assert_eq!(writer.get("VeryUncoolExt").unwrap().pairs(), [("Woooo", 3)]);
}

#[test]
fn non_recursive_root_numbers_nested_enum_as_leaf() {
    let (mut b, uh_oh, _, _) = uh_oh();
    b.root(uh_oh, false);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert!(report.is_success());
    assert_eq!(writer.names().collect::<Vec<_>>(), ["UhOhExt"]);
    assert_eq!(
        writer.get("UhOhExt").unwrap().pairs(),
        [("Cool", 1), ("Nice", 2), ("NotCool", 3), ("Weh", 4)]
    );
}

#[test]
fn nested_root_inside_flat_root_does_not_overlap() {
    let (mut b, uh_oh, not_cool, _) = uh_oh();
    b.root(uh_oh, false);
    b.root(not_cool, true);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert!(report.is_success());
    assert_eq!(
        writer.get("UhOhExt").unwrap().pairs(),
        [("Cool", 1), ("Nice", 2), ("NotCool", 3), ("Weh", 4)]
    );
    assert_eq!(writer.get("NotCoolExt").unwrap().pairs(), [("NotNice", 2)]);
    assert_eq!(writer.get("VeryUncoolExt").unwrap().pairs(), [("Woooo", 1)]);
}

#[test]
fn nested_root_inside_recursive_root_overlaps() {
    let (mut b, uh_oh, not_cool, _) = uh_oh();
    b.root(uh_oh, true);
    b.root(not_cool, true);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert_eq!(report.errors.len(), 1);
    let OrdinalError::Emit(err) = &report.errors[0] else {
        panic!("expected an overlap, got {:?}", report.errors[0]);
    };
    assert_eq!(
        err.to_string(),
        "#[ordinal] cannot target enum NotCool (line 2) as its count would overlap with the #[ordinal] enum UhOh (line 1)"
    );

    // UhOh's numbering is untouched.
    assert_eq!(report.outcome(uh_oh).unwrap().state, RootState::Committed);
    assert_eq!(report.outcome(not_cool).unwrap().state, RootState::Conflicted);
    assert_eq!(writer.get("NotCoolExt").unwrap().pairs(), [("NotNice", 4)]);
    assert_eq!(writer.len(), 3);
}

#[test]
fn ancestor_configured_after_nested_root_overlaps_on_shared_group() {
    let (mut b, uh_oh, not_cool, _) = uh_oh();
    b.root(not_cool, true);
    b.root(uh_oh, true);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].is_overlap());
    assert_eq!(
        report.errors[0].to_string(),
        "#[ordinal] on enum UhOh (line 1) cannot number enum NotCool (line 2) as its count would overlap with the #[ordinal] enum NotCool (line 2)"
    );

    // UhOhExt was committed before the collision and stays.
    assert_eq!(report.outcome(uh_oh).unwrap().committed, [uh_oh]);
    assert_eq!(writer.get("UhOhExt").unwrap().pairs(), [("Cool", 1), ("Nice", 2), ("Weh", 5)]);
    assert_eq!(writer.get("NotCoolExt").unwrap().pairs(), [("NotNice", 2)]);
}

#[test]
fn non_enum_root_is_rejected() {
    let mut b = Builder::new();
    b.line = 3;
    let loc = b.loc();
    let unreasonable = b.table.insert(
        TypeNode::new("Unreasonable", loc, DeclKind::UnitStruct)
            .with_visibility(Visibility::Public),
    );
    b.root(unreasonable, true);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert!(writer.is_empty());
    assert_eq!(report.outcome(unreasonable).unwrap().state, RootState::Rejected);
    assert_eq!(
        report.errors[0].to_string(),
        "#[ordinal] must target an enum, but Unreasonable (line 4) is pub unit struct (non-enum)"
    );
    assert_eq!(report.errors[0].location().line, 4);
}

#[test]
fn every_root_is_processed_despite_errors() {
    let (mut b, uh_oh, not_cool, _) = uh_oh();
    let loc = b.loc();
    let alias = b.table.insert(TypeNode::new("Gid", loc, DeclKind::TypeAlias));
    let later = b.enumeration("Later");
    b.leaves(later, &["Fine"]);

    b.root(alias, true);
    b.root(uh_oh, true);
    b.root(not_cool, true);
    b.root(later, true);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.outcome(alias).unwrap().state, RootState::Rejected);
    assert_eq!(report.outcome(not_cool).unwrap().state, RootState::Conflicted);
    assert_eq!(report.outcome(later).unwrap().state, RootState::Committed);
    assert_eq!(writer.get("LaterExt").unwrap().pairs(), [("Fine", 1)]);
}

#[test]
fn unrelated_roots_sharing_a_simple_name_do_not_collide() {
    let mut b = Builder::new();
    let first = b.enumeration("Status");
    b.leaves(first, &["On", "Off"]);
    let second = b.enumeration("Status");
    b.leaves(second, &["Idle"]);
    b.root(first, true);
    b.root(second, true);

    let mut writer = MemoryWriter::new();
    let report = process(&b.table, &mut writer);

    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(writer.names().collect::<Vec<_>>(), ["StatusExt", "StatusExt"]);
    assert_eq!(writer.group(first).unwrap().pairs(), [("On", 1), ("Off", 2)]);
    assert_eq!(writer.group(second).unwrap().pairs(), [("Idle", 1)]);
    assert_eq!(report.outcome(second).unwrap().state, RootState::Committed);
}
