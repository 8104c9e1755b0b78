//! Bitmap trie index.
//!
//! Triples are stored as root → subject → predicate → object paths of
//! [`TermId`]s. Nodes live in an arena and refer to each other by index;
//! freed slots are recycled by later inserts.
//!
//! ```text
//!            root (sentinel)
//!           /              \
//!        s=0                s=5
//!         |                  |
//!        p=1                p=1
//!       /   \                |
//!     o=2   o=3             o=2
//! ```

use hashbrown::HashMap;
use smallvec::SmallVec;

use super::dictionary::TermId;

/// Index of a node in the trie arena.
pub type NodeIndex = usize;

/// The sentinel root is always slot 0.
pub const ROOT: NodeIndex = 0;

/// Levels below the root: subject, predicate, object.
pub const DEPTH: usize = 3;

/// How one level of a pattern selects children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSlot {
    /// Only the child with this id.
    Bound(TermId),
    /// Every child, each matched against the rest of the pattern.
    Any,
    /// Every child and everything below it, ignoring the rest of the pattern.
    Collapse,
}

#[derive(Debug, Default)]
struct TrieNode {
    /// `None` for the root and for free slots.
    id: Option<TermId>,
    children: HashMap<TermId, NodeIndex>,
}

/// Arena-backed three-level prefix tree.
#[derive(Debug)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    free: Vec<NodeIndex>,
    /// Number of complete root → object paths.
    paths: usize,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub fn new() -> Self {
        Self { nodes: vec![TrieNode::default()], free: Vec::new(), paths: 0 }
    }

    /// Number of stored triples.
    pub fn len(&self) -> usize {
        self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths == 0
    }

    /// The id held by a node; `None` for the root.
    pub fn id(&self, node: NodeIndex) -> Option<TermId> {
        self.nodes[node].id
    }

    pub fn child(&self, node: NodeIndex, id: TermId) -> Option<NodeIndex> {
        self.nodes[node].children.get(&id).copied()
    }

    /// Children of `node` as `(id, index)` pairs, in no particular order.
    pub fn children(&self, node: NodeIndex) -> impl Iterator<Item = (TermId, NodeIndex)> + '_ {
        self.nodes[node].children.iter().map(|(id, idx)| (*id, *idx))
    }

    /// Insert a root → s → p → o path. Returns `false` if it already existed.
    pub fn insert(&mut self, path: [TermId; DEPTH]) -> bool {
        let mut node = ROOT;
        let mut created = false;
        for id in path {
            node = match self.child(node, id) {
                Some(next) => next,
                None => {
                    let next = self.alloc(id);
                    self.nodes[node].children.insert(id, next);
                    created = true;
                    next
                }
            };
        }
        if created {
            self.paths += 1;
        }
        created
    }

    /// True if the exact path is stored.
    pub fn contains(&self, path: [TermId; DEPTH]) -> bool {
        let mut node = ROOT;
        for id in path {
            match self.child(node, id) {
                Some(next) => node = next,
                None => return false,
            }
        }
        true
    }

    /// Remove every path selected by `pattern`, returning how many were
    /// removed. Interior nodes left without children are pruned.
    pub fn remove(&mut self, pattern: &[PatternSlot; DEPTH]) -> usize {
        let removed = self.remove_below(ROOT, 0, pattern);
        self.paths -= removed;
        removed
    }

    fn remove_below(&mut self, node: NodeIndex, depth: usize, slots: &[PatternSlot]) -> usize {
        let Some((slot, rest)) = slots.split_first() else {
            return 0;
        };
        match *slot {
            PatternSlot::Collapse => {
                let removed = self.count_paths(node, depth);
                let children: Vec<NodeIndex> =
                    self.nodes[node].children.drain().map(|(_, idx)| idx).collect();
                for child in children {
                    self.release(child);
                }
                removed
            }
            PatternSlot::Any => {
                let ids: SmallVec<[TermId; 8]> = self.nodes[node].children.keys().copied().collect();
                ids.into_iter()
                    .map(|id| self.remove_from_child(node, id, depth, rest))
                    .sum()
            }
            PatternSlot::Bound(id) => self.remove_from_child(node, id, depth, rest),
        }
    }

    fn remove_from_child(
        &mut self,
        node: NodeIndex,
        id: TermId,
        depth: usize,
        rest: &[PatternSlot],
    ) -> usize {
        let Some(child) = self.child(node, id) else {
            return 0;
        };
        let removed = if rest.is_empty() {
            // `child` is an object leaf: the path ends here.
            1
        } else {
            self.remove_below(child, depth + 1, rest)
        };
        if self.nodes[child].children.is_empty() {
            self.nodes[node].children.remove(&id);
            self.release(child);
        }
        removed
    }

    fn count_paths(&self, node: NodeIndex, depth: usize) -> usize {
        if depth == DEPTH {
            return 1;
        }
        self.nodes[node]
            .children
            .values()
            .map(|child| self.count_paths(*child, depth + 1))
            .sum()
    }

    fn alloc(&mut self, id: TermId) -> NodeIndex {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx].id = Some(id);
                idx
            }
            None => {
                self.nodes.push(TrieNode { id: Some(id), children: HashMap::new() });
                self.nodes.len() - 1
            }
        }
    }

    /// Return `node` and its whole subtree to the free list.
    fn release(&mut self, node: NodeIndex) {
        let mut stack = vec![node];
        while let Some(idx) = stack.pop() {
            let slot = &mut self.nodes[idx];
            slot.id = None;
            stack.extend(slot.children.drain().map(|(_, child)| child));
            self.free.push(idx);
        }
    }
}
