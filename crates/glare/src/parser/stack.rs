//! Graph-structured parse stack.
//!
//! Nodes live in an arena and point at their parent by index, so forked
//! heads share everything below the fork point. Each node counts the
//! references held on it: one per head sitting on it and one per child
//! node. Releasing the last reference frees the node and releases its
//! parent in turn.
//!
//! Pushing a node hands the caller's reference on the parent over to the
//! new child. A caller that keeps using the parent must [`Gss::retain`] it
//! first.

use super::Value;
use crate::automaton::StateId;
use crate::span::Span;
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node {
    state: StateId,
    value: Value,
    parent: Option<NodeId>,
    span: Span,
    /// Cumulative derivation score of everything up to this node.
    score: i64,
    depth: usize,
    refs: u32,
}

/// Values and bookkeeping removed from the top of a stack.
#[derive(Debug)]
pub(crate) struct Popped {
    /// Left to right.
    pub(crate) values: Vec<Value>,
    /// Node the popped nodes were stacked on.
    pub(crate) base: NodeId,
    /// Covers the popped nodes; `None` when nothing was popped.
    pub(crate) span: Option<Span>,
    pub(crate) score: i64,
}

#[derive(Debug, Default)]
pub(crate) struct Gss {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    live: usize,
}

impl Gss {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Bottom node in `state`, holding one reference for its head.
    pub(crate) fn root(&mut self, state: StateId, pos: usize) -> NodeId {
        self.alloc(Node {
            state,
            value: Value::Empty,
            parent: None,
            span: Span::empty(pos),
            score: 0,
            depth: 0,
            refs: 1,
        })
    }

    /// Pushes a node on `parent`, taking over the caller's reference to it.
    pub(crate) fn push(&mut self, parent: NodeId, state: StateId, value: Value, span: Span, score: i64) -> NodeId {
        let depth = self.node(parent).depth + 1;
        self.alloc(Node {
            state,
            value,
            parent: Some(parent),
            span,
            score,
            depth,
            refs: 1,
        })
    }

    pub(crate) fn retain(&mut self, id: NodeId) {
        self.nodes[id.index()].refs += 1;
    }

    pub(crate) fn release(&mut self, id: NodeId) {
        let mut next = Some(id);
        while let Some(id) = next {
            let node = &mut self.nodes[id.index()];
            node.refs -= 1;
            if node.refs > 0 {
                return;
            }
            node.value = Value::Empty;
            next = node.parent.take();
            self.free.push(id);
            self.live -= 1;
        }
    }

    /// Removes the top `n` values above `top`.
    ///
    /// Values on nodes only this path can reach are moved out, the rest are
    /// cloned. The nodes themselves stay until the caller releases `top`.
    /// Returns `None` if the stack is shallower than `n`.
    pub(crate) fn pop(&mut self, top: NodeId, n: usize) -> Option<Popped> {
        if self.node(top).depth < n {
            return None;
        }
        let score = self.node(top).score;
        let mut values = Vec::with_capacity(n);
        let mut span: Option<Span> = None;
        let mut exclusive = true;
        let mut current = top;
        for _ in 0..n {
            let node = &mut self.nodes[current.index()];
            let parent = node.parent?;
            exclusive &= node.refs == 1;
            values.push(if exclusive {
                mem::take(&mut node.value)
            } else {
                node.value.clone()
            });
            span = Some(span.map_or(node.span, |s| s.cover(node.span)));
            current = parent;
        }
        values.reverse();
        Some(Popped {
            values,
            base: current,
            span,
            score,
        })
    }

    /// Clones the top `n` values above `top`, left to right.
    pub(crate) fn peek(&self, top: NodeId, n: usize) -> Vec<Value> {
        let mut values = Vec::with_capacity(n);
        let mut current = Some(top);
        while values.len() < n
            && let Some(id) = current
        {
            let node = self.node(id);
            if node.parent.is_none() {
                break;
            }
            values.push(node.value.clone());
            current = node.parent;
        }
        values.reverse();
        values
    }

    /// Moves the value out of `id` if nothing else refers to it.
    pub(crate) fn take_value(&mut self, id: NodeId) -> Value {
        let node = &mut self.nodes[id.index()];
        if node.refs == 1 {
            mem::take(&mut node.value)
        } else {
            node.value.clone()
        }
    }

    pub(crate) fn value(&self, id: NodeId) -> &Value {
        &self.node(id).value
    }

    pub(crate) fn state(&self, id: NodeId) -> StateId {
        self.node(id).state
    }

    pub(crate) fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub(crate) fn score(&self, id: NodeId) -> i64 {
        self.node(id).score
    }

    pub(crate) fn depth(&self, id: NodeId) -> usize {
        self.node(id).depth
    }

    /// Nodes currently allocated.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str) -> Value {
        Value::Token(text.into())
    }

    #[test]
    fn pop_moves_exclusive_values() {
        let mut gss = Gss::new();
        let root = gss.root(StateId::START, 0);
        let a = gss.push(root, StateId(1), token("a"), Span::new(0, 1), 0);
        let b = gss.push(a, StateId(2), token("b"), Span::new(1, 2), 3);

        let popped = gss.pop(b, 2).unwrap();
        assert_eq!(popped.values, vec![token("a"), token("b")]);
        assert_eq!(popped.base, root);
        assert_eq!(popped.span, Some(Span::new(0, 2)));
        assert_eq!(popped.score, 3);
        assert_eq!(gss.value(a), &Value::Empty);

        gss.retain(root);
        gss.release(b);
        assert_eq!(gss.live(), 1);
    }

    #[test]
    fn shared_history_is_cloned_and_kept() {
        let mut gss = Gss::new();
        let root = gss.root(StateId::START, 0);
        let a = gss.push(root, StateId(1), token("a"), Span::new(0, 1), 0);
        gss.retain(a);
        let left = gss.push(a, StateId(2), token("l"), Span::new(1, 2), 0);
        let right = gss.push(a, StateId(3), token("r"), Span::new(1, 2), 0);

        let popped = gss.pop(left, 2).unwrap();
        assert_eq!(popped.values, vec![token("a"), token("l")]);
        assert_eq!(gss.value(a), &token("a"));
        assert_eq!(gss.value(left), &Value::Empty);

        gss.release(left);
        assert_eq!(gss.live(), 3);
        assert_eq!(gss.peek(right, 2), vec![token("a"), token("r")]);
        gss.release(right);
        assert_eq!(gss.live(), 0);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut gss = Gss::new();
        let root = gss.root(StateId::START, 0);
        gss.retain(root);
        let a = gss.push(root, StateId(1), token("a"), Span::new(0, 1), 0);
        gss.release(a);
        let b = gss.push(root, StateId(2), token("b"), Span::new(0, 1), 0);
        assert_eq!(a, b);
        assert_eq!(gss.depth(b), 1);
        assert!(gss.pop(b, 3).is_none());
    }

    #[test]
    fn every_live_node_has_its_own_slot() {
        let mut gss = Gss::new();
        let root = gss.root(StateId::START, 0);
        let mut top = root;
        let mut seen = vec![root];
        for i in 0..1000 {
            top = gss.push(top, StateId(1), Value::Int(i), Span::new(0, 0), 0);
            seen.push(top);
        }
        assert_eq!(top.index(), 1000);
        seen.sort_by_key(|id| id.index());
        seen.dedup();
        assert_eq!(seen.len(), 1001);
        assert_eq!(gss.live(), 1001);
        assert_eq!(gss.value(top), &Value::Int(999));
        assert_eq!(gss.depth(top), 1000);
    }
}
