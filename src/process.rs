//! Runs every configured root of a table through validation, assignment and
//! emission, collecting one outcome per root.

use serde::Serialize;

use crate::assign::assign;
use crate::emit::{ArtifactWriter, CommitRegistry, Emitter};
use crate::error::OrdinalError;
use crate::model::{NodeId, TypeTable};

/// Lifecycle of one configured root.
///
/// `NotStarted -> Traversing -> GroupsCollected -> Committed | Conflicted`.
/// A root that fails validation, or whose variants do not form a tree, ends
/// `Rejected` without committing anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RootState {
    NotStarted,
    Traversing,
    GroupsCollected,
    Committed,
    Conflicted,
    Rejected,
}

impl RootState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Conflicted | Self::Rejected)
    }
}

/// What happened to one configured root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RootOutcome {
    pub root: NodeId,
    pub state: RootState,
    /// Groups this root committed, in traversal order.
    pub committed: Vec<NodeId>,
}

/// Result of processing a whole table.
#[derive(Debug, Default)]
pub struct Report {
    pub outcomes: Vec<RootOutcome>,
    pub errors: Vec<OrdinalError>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn outcome(&self, root: NodeId) -> Option<&RootOutcome> {
        self.outcomes.iter().find(|o| o.root == root)
    }

    /// Every committed group across all roots.
    pub fn committed_groups(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.outcomes.iter().flat_map(|o| o.committed.iter().copied())
    }
}

/// Processes configured roots one at a time against a shared registry.
#[derive(Debug)]
pub struct Processor<W> {
    emitter: Emitter<W>,
}

impl<W: ArtifactWriter> Processor<W> {
    pub fn new(writer: W) -> Self {
        Self {
            emitter: Emitter::new(writer),
        }
    }

    /// Process every configured root in discovery order.
    ///
    /// An error for one root never stops the others; all of them end up in
    /// [`Report::errors`].
    pub fn run(&mut self, table: &TypeTable) -> Report {
        let mut report = Report::default();

        for root in table.configured_roots() {
            let info = table.info(root.node);
            let mut outcome = RootOutcome {
                root: root.node,
                state: RootState::NotStarted,
                committed: Vec::new(),
            };

            if let Err(err) = table.validate_root(root) {
                tracing::warn!(root = %info, "{err}");
                outcome.state = RootState::Rejected;
                report.outcomes.push(outcome);
                report.errors.push(err.into());
                continue;
            }

            outcome.state = RootState::Traversing;
            let groups = match assign(table, root) {
                Ok(groups) => groups,
                Err(err) => {
                    tracing::warn!(root = %info, "{err}");
                    outcome.state = RootState::Rejected;
                    report.outcomes.push(outcome);
                    report.errors.push(err.into());
                    continue;
                }
            };
            outcome.state = RootState::GroupsCollected;

            let result = self.emitter.emit(table, root.node, &groups);
            let registry = self.emitter.registry();
            outcome.committed = groups
                .iter()
                .map(|g| g.node)
                .filter(|&n| registry.get(n).is_some_and(|r| r.root == root.node))
                .collect();

            match result {
                Ok(count) => {
                    tracing::debug!(root = %info, groups = count, "root committed");
                    outcome.state = RootState::Committed;
                }
                Err(err) => {
                    outcome.state = RootState::Conflicted;
                    report.errors.push(err.into());
                }
            }
            report.outcomes.push(outcome);
        }

        tracing::info!(
            roots = report.outcomes.len(),
            errors = report.errors.len(),
            "ordinal processing finished"
        );
        report
    }

    pub fn registry(&self) -> &CommitRegistry {
        self.emitter.registry()
    }

    pub fn writer(&self) -> &W {
        self.emitter.writer()
    }

    pub fn into_writer(self) -> W {
        self.emitter.into_writer()
    }
}

/// Process `table` with a borrowed writer.
pub fn process<W: ArtifactWriter + ?Sized>(table: &TypeTable, writer: &mut W) -> Report {
    Processor::new(writer).run(table)
}
