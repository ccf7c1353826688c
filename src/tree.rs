//! Rooted bifurcating tree carried as a flat array of node records.
//!
//! # Layout
//! Nodes live in a preallocated `Vec<Node>` of fixed capacity `C`,
//! indexed `0..len`. Each node holds a parent index (`None` at the
//! root), an optional pair of child indices (`None` iff the node is a
//! tip), an optional sequence pointer, and an optional branch length.
//!
//! The root index is **not** fixed at 0: [`DnaSequenceTree::add`]
//! relocates the root whenever the inserted internal node replaces the
//! current root in its parent slot — i.e. whenever a tip is attached by
//! splitting the root edge.
//!
//! # Sequence ownership
//! A node's sequence is an `Rc<RefCell<DnaSequence>>` — shared by
//! reference, never deep-cloned. [`DnaSequenceTree::copy_from`] copies
//! node records verbatim, which clones these `Rc` pointers cheaply and
//! deliberately aliases them with the source tree. Tip sequences are
//! owned by the originating [`crate::sequence_list::DnaSequenceList`]
//! and must never be mutated once stored in a tree; interior-node
//! sequences are mutated in place by the incremental scorer and are
//! only valid for the tree that currently holds them.

use crate::dna::SeqRef;
use crate::error::{PhyloError, Result};

/// A single node record in the flat tree arena.
#[derive(Clone, Debug)]
pub struct Node {
    pub parent: Option<usize>,
    pub children: Option<(usize, usize)>,
    pub sequence: Option<SeqRef>,
    pub branch_length: Option<f64>,
}

/// A rooted bifurcating tree over a fixed-capacity node arena.
#[derive(Clone, Debug)]
pub struct DnaSequenceTree {
    nodes: Vec<Node>,
    capacity: usize,
    root: usize,
}

impl DnaSequenceTree {
    /// Preallocates an empty tree with room for `capacity` nodes.
    pub fn new(capacity: usize) -> Self {
        DnaSequenceTree {
            nodes: Vec::with_capacity(capacity),
            capacity,
            root: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn root(&self) -> usize {
        self.root
    }

    pub fn is_tip(&self, idx: usize) -> bool {
        self.nodes[idx].children.is_none()
    }

    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.nodes[idx].parent
    }

    pub fn children(&self, idx: usize) -> Option<(usize, usize)> {
        self.nodes[idx].children
    }

    pub fn sequence(&self, idx: usize) -> Option<SeqRef> {
        self.nodes[idx].sequence.clone()
    }

    pub fn set_sequence(&mut self, idx: usize, seq: SeqRef) {
        self.nodes[idx].sequence = Some(seq);
    }

    pub fn branch_length(&self, idx: usize) -> Option<f64> {
        self.nodes[idx].branch_length
    }

    pub fn set_branch_length(&mut self, idx: usize, length: Option<f64>) {
        self.nodes[idx].branch_length = length;
    }

    /// The Fitch score stored on the root's sequence.
    pub fn root_score(&self) -> Result<i64> {
        let seq = self.nodes[self.root]
            .sequence
            .as_ref()
            .ok_or_else(|| PhyloError::Format("root has no sequence".into()))?;
        Ok(seq.borrow().score())
    }

    /// Attaches a new tip holding `seq` onto edge `edge` (see spec §4.3
    /// for the edge-numbering scheme). If the tree is empty, `edge` is
    /// ignored and the tip becomes a lone root at index 0.
    ///
    /// Otherwise splices a fresh internal node in between node `edge`
    /// and its former parent, and a fresh tip alongside it: before the
    /// call, "edge `edge`" is the edge above node `edge`; after the
    /// call that edge is split by the new internal node. Returns the
    /// index of the newly attached tip.
    pub fn add(&mut self, edge: usize, seq: SeqRef) -> Result<usize> {
        if self.nodes.is_empty() {
            if self.capacity < 1 {
                return Err(PhyloError::CapacityExceeded {
                    needed: 1,
                    capacity: self.capacity,
                });
            }
            self.nodes.push(Node {
                parent: None,
                children: None,
                sequence: Some(seq),
                branch_length: None,
            });
            self.root = 0;
            return Ok(0);
        }

        if edge >= self.nodes.len() {
            return Err(PhyloError::IndexOutOfBounds {
                index: edge,
                len: self.nodes.len(),
            });
        }

        let needed = self.nodes.len() + 2;
        if needed > self.capacity {
            return Err(PhyloError::CapacityExceeded {
                needed,
                capacity: self.capacity,
            });
        }

        let new_internal = self.nodes.len();
        let new_tip = new_internal + 1;
        let old_parent = self.nodes[edge].parent;

        self.nodes.push(Node {
            parent: old_parent,
            children: Some((edge, new_tip)),
            sequence: None,
            branch_length: None,
        });
        self.nodes.push(Node {
            parent: Some(new_internal),
            children: None,
            sequence: Some(seq),
            branch_length: None,
        });
        self.nodes[edge].parent = Some(new_internal);

        match old_parent {
            Some(p) => {
                let children = self.nodes[p]
                    .children
                    .as_mut()
                    .expect("parent of a non-root node must have children");
                if children.0 == edge {
                    children.0 = new_internal;
                } else if children.1 == edge {
                    children.1 = new_internal;
                } else {
                    unreachable!("parent's recorded children do not include this node");
                }
            }
            None => self.root = new_internal,
        }

        Ok(new_tip)
    }

    /// Overwrites `self` with a verbatim copy of `src`'s node records.
    /// Sequence pointers alias those in `src` (they are `Rc`s); no deep
    /// sequence data is cloned. Requires `self.capacity() >=
    /// src.len()`.
    pub fn copy_from(&mut self, src: &DnaSequenceTree) -> Result<()> {
        if src.nodes.len() > self.capacity {
            return Err(PhyloError::CapacityExceeded {
                needed: src.nodes.len(),
                capacity: self.capacity,
            });
        }
        self.nodes.clear();
        self.nodes.extend(src.nodes.iter().cloned());
        self.root = src.root;
        Ok(())
    }

    /// Resets the tree to empty, ready to be rebuilt by `add`.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = 0;
    }

    /// Builds a new tree whose root is a fresh interior node joining
    /// `t1` and `t2`. Used exclusively by [`crate::upgma`]. Node
    /// records from `t1` land at indices `1..=t1.len()` (shifted by
    /// `+1`), and `t2`'s at `t1.len()+1..` (shifted by `t1.len()+1`);
    /// each subtree's former root gets parent `0` instead of `None`.
    pub fn join(t1: &DnaSequenceTree, t2: &DnaSequenceTree) -> Self {
        let n1 = t1.nodes.len();
        let n2 = t2.nodes.len();
        let capacity = n1 + n2 + 1;
        let mut nodes = Vec::with_capacity(capacity);

        let child0 = t1.root + 1;
        let child1 = t2.root + n1 + 1;
        nodes.push(Node {
            parent: None,
            children: Some((child0, child1)),
            sequence: None,
            branch_length: None,
        });

        for node in &t1.nodes {
            nodes.push(Node {
                parent: Some(node.parent.map(|p| p + 1).unwrap_or(0)),
                children: node.children.map(|(a, b)| (a + 1, b + 1)),
                sequence: node.sequence.clone(),
                branch_length: node.branch_length,
            });
        }
        let shift = n1 + 1;
        for node in &t2.nodes {
            nodes.push(Node {
                parent: Some(node.parent.map(|p| p + shift).unwrap_or(0)),
                children: node.children.map(|(a, b)| (a + shift, b + shift)),
                sequence: node.sequence.clone(),
                branch_length: node.branch_length,
            });
        }

        let _ = n2;
        DnaSequenceTree {
            nodes,
            capacity,
            root: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::DnaSequence;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tip(state: u8) -> SeqRef {
        Rc::new(RefCell::new(DnaSequence::from_sites(vec![state], None).unwrap()))
    }

    #[test]
    fn add_first_tip_becomes_lone_root() {
        let mut t = DnaSequenceTree::new(7);
        let idx = t.add(0, tip(1)).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.root(), 0);
        assert!(t.is_tip(0));
        assert_eq!(t.parent(0), None);
    }

    #[test]
    fn add_grows_by_two_and_moves_root() {
        let mut t = DnaSequenceTree::new(7);
        t.add(0, tip(1)).unwrap(); // node 0: lone root/tip
        let new_tip = t.add(0, tip(2)).unwrap(); // splits root edge
        assert_eq!(t.len(), 3);
        assert_eq!(new_tip, 2);
        // node 1 is the new internal root; 0 and 2 are its children.
        assert_eq!(t.root(), 1);
        assert_eq!(t.parent(0), Some(1));
        assert_eq!(t.children(1), Some((0, 2)));
        assert_eq!(t.parent(2), Some(1));
    }

    #[test]
    fn after_m_tips_length_is_2m_minus_1() {
        let mut t = DnaSequenceTree::new(7);
        t.add(0, tip(1)).unwrap();
        t.add(0, tip(2)).unwrap();
        t.add(1, tip(4)).unwrap();
        t.add(2, tip(8)).unwrap();
        assert_eq!(t.len(), 7); // 2*4 - 1
        let mut tip_count = 0;
        let mut root_count = 0;
        for i in 0..t.len() {
            if t.is_tip(i) {
                tip_count += 1;
                assert_eq!(t.children(i), None);
            } else {
                assert!(t.children(i).is_some());
            }
            if t.parent(i).is_none() {
                root_count += 1;
            }
        }
        assert_eq!(tip_count, 4);
        assert_eq!(root_count, 1);
    }

    #[test]
    fn add_rejects_capacity_overflow() {
        let mut t = DnaSequenceTree::new(1);
        t.add(0, tip(1)).unwrap();
        assert!(t.add(0, tip(2)).is_err());
    }

    #[test]
    fn copy_from_aliases_sequences() {
        let mut src = DnaSequenceTree::new(3);
        src.add(0, tip(1)).unwrap();
        src.add(0, tip(2)).unwrap();

        let mut dst = DnaSequenceTree::new(3);
        dst.copy_from(&src).unwrap();
        assert_eq!(dst.len(), src.len());
        assert_eq!(dst.root(), src.root());
        // Mutating through dst's sequence pointer is visible via src's,
        // because they are the same Rc<RefCell<_>>.
        let shared = dst.sequence(0).unwrap();
        shared.borrow_mut().set_score(42);
        assert_eq!(src.sequence(0).unwrap().borrow().score(), 42);
    }

    #[test]
    fn copy_from_rejects_undersized_capacity() {
        let mut src = DnaSequenceTree::new(3);
        src.add(0, tip(1)).unwrap();
        src.add(0, tip(2)).unwrap();
        let mut dst = DnaSequenceTree::new(2);
        assert!(dst.copy_from(&src).is_err());
    }

    #[test]
    fn join_combines_two_trees_under_fresh_root() {
        let mut t1 = DnaSequenceTree::new(1);
        t1.add(0, tip(1)).unwrap();
        let mut t2 = DnaSequenceTree::new(1);
        t2.add(0, tip(2)).unwrap();

        let joined = DnaSequenceTree::join(&t1, &t2);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.root(), 0);
        assert_eq!(joined.children(0), Some((1, 2)));
        assert_eq!(joined.parent(1), Some(0));
        assert_eq!(joined.parent(2), Some(0));
    }
}
