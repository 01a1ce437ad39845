//! Call-context interning and recursion detection: each call chain interns to a stable id, and
//! recursion is detected by walking that chain for the callee already being on it.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Interned handle to a call-context stack. Cheap to copy and compare; two contexts built from
/// the same call chain intern to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallContextId(usize);

/// One frame: the call site plus the function it was resolved to call into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Frame<Call, Function> {
    parent: Option<CallContextId>,
    call: Call,
    callee: Function,
}

/// Interns call-context stacks so each distinct call chain (used as a call-cache key, and to
/// detect recursion) gets a single stable id rather than repeatedly cloning a `Vec`.
pub struct CallContextInterner<Call, Function> {
    frames: Vec<Frame<Call, Function>>,
    index: HashMap<Frame<Call, Function>, CallContextId>,
    root: CallContextId,
}

impl<Call, Function> Default for CallContextInterner<Call, Function>
where
    Call: Clone + Eq + Hash,
    Function: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Call, Function> CallContextInterner<Call, Function>
where
    Call: Clone + Eq + Hash,
    Function: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        // The empty context is never stored in `frames`/`index`; it is represented by the
        // sentinel id 0, which `push` never produces (pushed ids start at 1).
        Self { frames: Vec::new(), index: HashMap::new(), root: CallContextId(0) }
    }

    pub fn empty(&self) -> CallContextId {
        self.root
    }

    /// Extends `parent` with one more frame: `call` inside `parent`'s function, resolved to
    /// `callee`.
    pub fn push(&mut self, parent: CallContextId, call: Call, callee: Function) -> CallContextId {
        let frame = Frame { parent: Some(parent).filter(|id| *id != self.root), call, callee };
        if let Some(&id) = self.index.get(&frame) {
            return id;
        }
        self.frames.push(frame.clone());
        let id = CallContextId(self.frames.len());
        self.index.insert(frame, id);
        id
    }

    /// True if `callee` already appears somewhere on `ctx`'s call chain — a recursive call.
    pub fn contains(&self, ctx: CallContextId, callee: &Function) -> bool {
        let mut cur = ctx;
        while cur != self.root {
            let frame = &self.frames[cur.0 - 1];
            if frame.callee == *callee {
                return true;
            }
            cur = frame.parent.unwrap_or(self.root);
        }
        false
    }
}

/// Shared handle to an interner, cloned cheaply across a fork of the numerical engine.
pub type SharedCallContexts<Call, Function> = Rc<std::cell::RefCell<CallContextInterner<Call, Function>>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursion_is_detected_through_the_call_chain() {
        let mut interner: CallContextInterner<u32, &'static str> = CallContextInterner::new();
        let root = interner.empty();
        let a_calls_b = interner.push(root, 1, "b");
        let b_calls_a = interner.push(a_calls_b, 2, "a");

        assert!(interner.contains(b_calls_a, &"a"));
        assert!(interner.contains(b_calls_a, &"b"));
        assert!(!interner.contains(a_calls_b, &"a"));
    }

    #[test]
    fn identical_call_chains_intern_to_the_same_id() {
        let mut interner: CallContextInterner<u32, &'static str> = CallContextInterner::new();
        let root = interner.empty();
        let a = interner.push(root, 1, "f");
        let b = interner.push(root, 1, "f");
        assert_eq!(a, b);
    }
}
