//! A collection of equal-length [`DnaSequence`]s: informative-site
//! analysis, uninformative-site excision, absent-state lookahead, and
//! conversion of a tree signature into a full tree.

use crate::dna::{DnaSequence, SeqRef, POPCOUNT_4BIT};
use crate::error::{PhyloError, Result};
use crate::tree::DnaSequenceTree;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A collection of equal-length DNA sequences, with lazily computed
/// informative-site analysis.
///
/// A site is *informative* when at least two distinct states each
/// occur in at least two sequences; only informative sites can change
/// which topology is most parsimonious (spec §3, §4.2).
pub struct DnaSequenceList {
    sequences: Vec<SeqRef>,
    length: usize,
    informative: Option<Vec<bool>>,
    n_informative: Option<usize>,
    uninformative_changes: Option<usize>,
}

impl DnaSequenceList {
    /// Builds a list from already-loaded sequences, all of which must
    /// share the same length.
    pub fn new(sequences: Vec<DnaSequence>) -> Result<Self> {
        let length = sequences.first().map(|s| s.len()).unwrap_or(0);
        for seq in &sequences {
            if seq.len() != length {
                return Err(PhyloError::LengthMismatch {
                    a: length,
                    b: seq.len(),
                });
            }
        }
        Ok(DnaSequenceList {
            sequences: sequences
                .into_iter()
                .map(|s| Rc::new(RefCell::new(s)))
                .collect(),
            length,
            informative: None,
            n_informative: None,
            uninformative_changes: None,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Length `L` shared by every member sequence.
    #[inline]
    pub fn sequence_length(&self) -> usize {
        self.length
    }

    /// A cloned handle (cheap `Rc` clone) to tip `i`.
    pub fn get(&self, i: usize) -> SeqRef {
        Rc::clone(&self.sequences[i])
    }

    pub fn sequences(&self) -> &[SeqRef] {
        &self.sequences
    }

    fn ensure_analyzed(&mut self) {
        if self.informative.is_some() {
            return;
        }
        let l = self.length;
        let mut informative = vec![false; l];
        let mut uninformative_changes = 0usize;

        for site in 0..l {
            let mut counts: HashMap<u8, usize> = HashMap::new();
            for seq in &self.sequences {
                let state = seq.borrow().sites()[site];
                *counts.entry(state).or_insert(0) += 1;
            }
            let distinct_with_two_or_more = counts.values().filter(|&&c| c >= 2).count();
            if distinct_with_two_or_more >= 2 {
                informative[site] = true;
            } else if !counts.is_empty() {
                uninformative_changes += counts.len() - 1;
            }
        }

        let n_informative = informative.iter().filter(|&&b| b).count();
        self.informative = Some(informative);
        self.n_informative = Some(n_informative);
        self.uninformative_changes = Some(uninformative_changes);
    }

    /// The informative-site bitmap, computed and cached on first use.
    pub fn informative_sites(&mut self) -> &[bool] {
        self.ensure_analyzed();
        self.informative.as_ref().unwrap()
    }

    /// Count of informative sites.
    pub fn n_informative_sites(&mut self) -> usize {
        self.ensure_analyzed();
        self.n_informative.unwrap()
    }

    /// State changes contributed by uninformative sites: the sum, over
    /// uninformative sites, of `(distinct states - 1)`. Every tree pays
    /// exactly this much for these sites, so they may be excised
    /// without affecting which topology is optimal.
    pub fn uninformative_state_changes(&mut self) -> usize {
        self.ensure_analyzed();
        self.uninformative_changes.unwrap()
    }

    /// Replaces each member's site vector with its informative
    /// projection in place, and invalidates (collapses to "all
    /// informative") the cached analysis. Returns the state-change
    /// count previously contributed by the excised sites; add this to
    /// any subsequent parsimony score computed over the projected
    /// alignment to recover the true score over the original one.
    pub fn excise_uninformative_sites(&mut self) -> usize {
        self.ensure_analyzed();
        let informative = self.informative.clone().unwrap();
        let changes = self.uninformative_changes.unwrap();
        let n_informative = self.n_informative.unwrap();

        for seq_ref in &self.sequences {
            let mut seq = seq_ref.borrow_mut();
            let projected: Vec<u8> = seq
                .sites()
                .iter()
                .zip(informative.iter())
                .filter_map(|(&b, &keep)| keep.then_some(b))
                .collect();
            let name = seq.name().map(str::to_string);
            *seq = DnaSequence::from_sites(projected, name)
                .expect("projected sites were already validated by the source sequence");
        }

        self.length = n_informative;
        self.informative = Some(vec![true; n_informative]);
        self.n_informative = Some(n_informative);
        self.uninformative_changes = Some(0);
        changes
    }

    /// `A[i]` = number of 4-bit state values absent from the union of
    /// sequences `i+1..N-1` (spec §4.2). Computed by starting from the
    /// union over *all* sequences and, for `i` from 0 upward, removing
    /// (via intersection with the complement) whatever appears in
    /// sequence `i`; each absent state contributes at least one change
    /// somewhere higher in the search tree, so `A[i]` is a valid
    /// additive lower-bound increment on the remaining work at depth
    /// `i`.
    pub fn count_absent_states(&self) -> Vec<usize> {
        let n = self.sequences.len();
        if n == 0 {
            return Vec::new();
        }
        let l = self.length;
        let mut running = vec![0u8; l];
        for seq_ref in &self.sequences {
            let seq = seq_ref.borrow();
            for (u, &b) in running.iter_mut().zip(seq.sites()) {
                *u |= b;
            }
        }

        let mut absent = vec![0usize; n];
        for i in 0..n {
            let seq = self.sequences[i].borrow();
            for (r, &b) in running.iter_mut().zip(seq.sites()) {
                *r &= (!b) & 0x0F;
            }
            absent[i] = running
                .iter()
                .map(|&r| POPCOUNT_4BIT[r as usize] as usize)
                .sum();
        }
        absent
    }

    /// Constructs an empty tree of capacity `2N-1` and replays
    /// `signature` by calling `add(signature[i], seq[i])` for `i` in
    /// `0..N`.
    pub fn to_tree(&self, signature: &[usize]) -> Result<DnaSequenceTree> {
        let n = self.sequences.len();
        if signature.len() != n {
            return Err(PhyloError::Format(format!(
                "signature length {} does not match list length {n}",
                signature.len()
            )));
        }
        let mut tree = DnaSequenceTree::new(2 * n - 1);
        for (i, &edge) in signature.iter().enumerate() {
            if i > 0 {
                let max = 2 * (i - 1);
                if edge > max {
                    return Err(PhyloError::InvalidSignatureEntry {
                        tip: i,
                        value: edge as i64,
                        max,
                    });
                }
            }
            tree.add(edge, self.get(i))?;
        }
        Ok(tree)
    }
}
