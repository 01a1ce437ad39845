//! The property-checker contract: an assertion dispatched against computed invariants.

use crate::cfg::Cfg;

/// An assertion-style analysis dispatched against computed invariants.
///
/// `Ctx` is left generic rather than fixed to a concrete call-context type, since the call
/// context lives in `fixpoint-engine` (one layer above this crate) and this crate must not
/// depend on it.
pub trait Checker<G: Cfg, V, Ctx> {
    /// Whether this checker would emit a finding for `stmt`. Consulted once per statement at WTO
    /// build time to populate `has_check` / `children_with_checks`, and again during deferred
    /// replay to decide whether to actually call `check`.
    fn has_check(&self, stmt: &G::Stmt) -> bool;

    /// Emits findings, if any, for `stmt` given the invariant that holds just before it runs.
    fn check(&self, stmt: &G::Stmt, value: &V, ctx: &Ctx);
}

/// Runs every checker in the list and reports a statement as check-relevant if any one of them
/// is. Analyzers typically register several independent checkers (a null-dereference checker, an
/// overflow checker, ...); the WTO builder and function fixpoint only need to talk to "the
/// checkers" as a single collaborator, so this is the composition point.
pub struct CheckerSet<'a, G: Cfg, V, Ctx> {
    checkers: Vec<&'a dyn Checker<G, V, Ctx>>,
}

impl<'a, G: Cfg, V, Ctx> CheckerSet<'a, G, V, Ctx> {
    pub fn new(checkers: Vec<&'a dyn Checker<G, V, Ctx>>) -> Self {
        Self { checkers }
    }

    pub fn has_check(&self, stmt: &G::Stmt) -> bool {
        self.checkers.iter().any(|c| c.has_check(stmt))
    }

    pub fn check_all(&self, stmt: &G::Stmt, value: &V, ctx: &Ctx) {
        for checker in &self.checkers {
            if checker.has_check(stmt) {
                checker.check(stmt, value, ctx);
            }
        }
    }
}
