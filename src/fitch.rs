//! Fitch maximum-parsimony scoring: full tree scoring and the
//! incremental re-scoring path used by the branch-and-bound search.

use crate::dna::{DnaSequence, SeqRef};
use crate::error::{PhyloError, Result};
use crate::tree::DnaSequenceTree;
use std::cell::RefCell;
use std::rc::Rc;

/// Computes the full parsimony score of `tree` by a post-order
/// traversal from the root, allocating and filling in any missing
/// interior sequences along the way. Tips already carry their observed
/// sequence at score 0. Returns the root's score.
///
/// Recurses to a depth equal to the tree's height; safe for the few
/// hundred tips typical of this search, per the data model's design
/// notes.
pub fn compute_score(tree: &mut DnaSequenceTree) -> Result<i64> {
    let root = tree.root();
    let seq = compute_node(tree, root)?;
    let score = seq.borrow().score();
    Ok(score)
}

fn compute_node(tree: &mut DnaSequenceTree, idx: usize) -> Result<SeqRef> {
    match tree.children(idx) {
        None => tree
            .sequence(idx)
            .ok_or_else(|| PhyloError::Format(format!("tip {idx} missing its sequence"))),
        Some((c0, c1)) => {
            let a = compute_node(tree, c0)?;
            let b = compute_node(tree, c1)?;
            let seq = match tree.sequence(idx) {
                Some(existing) => existing,
                None => {
                    let length = a.borrow().len();
                    let fresh = Rc::new(RefCell::new(DnaSequence::with_length(length)));
                    tree.set_sequence(idx, Rc::clone(&fresh));
                    fresh
                }
            };
            let changes = {
                let mut seq_mut = seq.borrow_mut();
                seq_mut.set_fitch_ancestor(&a.borrow(), &b.borrow())?
            };
            // Diagnostic only, not load-bearing: records this node's
            // local change count in its name.
            seq.borrow_mut().set_name(Some(changes.to_string()));
            Ok(seq)
        }
    }
}

/// Given that tip `tip_index` was just attached (so exactly one
/// root-ward chain of interior nodes, from its parent to the root, is
/// stale), recomputes scores along that chain using preallocated
/// `scratch` sequences indexed `0, 1, 2, ...` as the chain ascends.
/// Returns the root's score.
///
/// This is the essential branch-and-bound optimization: the fraction
/// of dirty nodes at depth `k` is `O(k)` out of `O(N)`, so recomputing
/// only the stale chain (rather than the whole tree) keeps each search
/// step cheap.
pub fn update_score(
    tree: &mut DnaSequenceTree,
    tip_index: usize,
    scratch: &mut [SeqRef],
) -> Result<i64> {
    let mut current = tree
        .parent(tip_index)
        .ok_or_else(|| PhyloError::Format(format!("tip {tip_index} has no parent")))?;
    let mut level = 0usize;

    loop {
        let (c0, c1) = tree
            .children(current)
            .ok_or_else(|| PhyloError::Format(format!("node {current} has no children")))?;
        let a = tree
            .sequence(c0)
            .ok_or_else(|| PhyloError::Format(format!("node {c0} missing its sequence")))?;
        let b = tree
            .sequence(c1)
            .ok_or_else(|| PhyloError::Format(format!("node {c1} missing its sequence")))?;
        if level >= scratch.len() {
            return Err(PhyloError::CapacityExceeded {
                needed: level + 1,
                capacity: scratch.len(),
            });
        }

        let dst = Rc::clone(&scratch[level]);
        dst.borrow_mut().set_fitch_ancestor(&a.borrow(), &b.borrow())?;
        tree.set_sequence(current, dst);

        match tree.parent(current) {
            Some(p) => {
                current = p;
                level += 1;
            }
            None => break,
        }
    }

    tree.root_score()
}
