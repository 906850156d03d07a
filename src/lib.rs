//! # Sealed Ordinals (sealed-ordinal)
//!
//! Assigns stable, sequential ordinals to the leaf variants of closed enum
//! hierarchies and generates an `ordinal()` accessor for each enum.
//!
//! ## Design
//!
//! An enum marked `#[ordinal]` is a configured root. Its variants are visited
//! depth-first in declaration order with one counter starting at 1. A variant
//! wrapping another enum is descended into (the default) or numbered like a
//! leaf (`#[ordinal(recursive = false)]`):
//!
//! ```text
//! #[ordinal]
//! enum UhOh {                        UhOhExt       Cool=1 Nice=2 Weh=5
//!     Cool(String),                  NotCoolExt    NotNice=4
//!     Nice(String),                  VeryUncoolExt Woooo=3
//!     NotCool(NotCool),
//!     Weh,
//! }
//! enum NotCool { VeryUncool(VeryUncool), NotNice }
//! enum VeryUncool { Woooo(i32) }
//! ```
//!
//! Each enum entered produces one output group, emitted at most once per run.
//! If two roots would number the same enum the run reports an
//! [`OverlapError`] naming both roots instead of letting one overwrite the
//! other.
//!
//! ## Pipeline
//!
//! ```ignore
//! use sealed_ordinal::{process, MemoryWriter, TypeTable};
//!
//! let table: TypeTable = /* scanned by sealed-ordinal-build */;
//! let mut writer = MemoryWriter::new();
//! let report = process(&table, &mut writer);
//! assert!(report.is_success());
//! ```

pub mod assign;
pub mod emit;
pub mod error;
pub mod model;
pub mod process;
pub mod traits;

pub use assign::{assign, Assignment, GroupEntry, OutputGroup};
pub use emit::{
    Artifact, ArtifactWriter, CommitRecord, CommitRegistry, Emitter, MemoryWriter, WriteError,
    WrittenArtifact,
};
pub use error::{AssignError, EmitError, NodeInfo, NotComposite, OrdinalError, OverlapError};
pub use model::{
    Configuration, ConfiguredRoot, DeclKind, Location, NodeId, TypeNode, TypeTable, Variant,
    Visibility,
};
pub use process::{process, Processor, Report, RootOutcome, RootState};
pub use traits::{Ordinal, OrdinalRoot};

pub use sealed_ordinal_macro::ordinal;
