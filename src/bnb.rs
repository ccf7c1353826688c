//! Branch-and-bound driver: enumerates tree signatures under a bound,
//! pruning with incremental Fitch scoring and absent-state lookahead.

use crate::dna::{DnaSequence, SeqRef};
use crate::error::{PhyloError, Result};
use crate::fitch;
use crate::results::MaximumParsimonyResults;
use crate::sequence_list::DnaSequenceList;
use crate::tree::DnaSequenceTree;
use log::{debug, info};
use std::cell::RefCell;
use std::rc::Rc;

/// Enumerates every rooted bifurcating topology over a sequence list
/// (after uninformative-site excision, if desired) via depth-first
/// branch-and-bound, keeping every topology tied for the best Fitch
/// score found, up to a results capacity.
///
/// All search-time allocation happens in [`MaximumParsimonyBnb::new`]:
/// a preallocated tree per depth, a jagged scratch-sequence stack, and
/// a signature buffer. The inner loop performs no allocation.
pub struct MaximumParsimonyBnb {
    sequences: Vec<SeqRef>,
    n: usize,
    absent: Vec<usize>,
    tree_stack: Vec<DnaSequenceTree>,
    scratch: Vec<Vec<SeqRef>>,
    signature: Vec<i64>,
    level: usize,
    results: MaximumParsimonyResults,
}

impl MaximumParsimonyBnb {
    /// Builds a driver over `list`. `initial_bound` seeds the results
    /// accumulator's score (e.g. from a UPGMA tree scored by Fitch);
    /// `None` means no bound is known yet (the first complete tree
    /// found becomes the bound). `capacity` limits how many
    /// tied-optimal signatures are retained.
    pub fn new(
        list: &DnaSequenceList,
        initial_bound: Option<i64>,
        capacity: usize,
    ) -> Result<Self> {
        let n = list.len();
        if n == 0 {
            return Err(PhyloError::Format(
                "cannot search an empty sequence list".into(),
            ));
        }
        let length = list.sequence_length();
        let tree_capacity = 2 * n - 1;

        let sequences: Vec<SeqRef> = (0..n).map(|i| list.get(i)).collect();
        let absent = list.count_absent_states();

        let mut tree_stack: Vec<DnaSequenceTree> =
            (0..n).map(|_| DnaSequenceTree::new(tree_capacity)).collect();
        tree_stack[0].add(0, Rc::clone(&sequences[0]))?;

        let scratch: Vec<Vec<SeqRef>> = (0..n)
            .map(|i| {
                (0..i)
                    .map(|_| Rc::new(RefCell::new(DnaSequence::with_length(length))))
                    .collect()
            })
            .collect();

        let mut signature = vec![-1i64; n];
        signature[0] = 0;

        let mut results = MaximumParsimonyResults::new(capacity);
        if let Some(bound) = initial_bound {
            results.reduce_score(bound);
        }
        info!(
            "bnb: searching {n} tips ({} sites), initial bound {:?}, capacity {capacity}",
            length, initial_bound
        );

        Ok(MaximumParsimonyBnb {
            sequences,
            n,
            absent,
            tree_stack,
            scratch,
            signature,
            level: 1,
            results,
        })
    }

    /// Runs the search to completion and returns the accumulated
    /// results.
    pub fn run(mut self) -> Result<MaximumParsimonyResults> {
        let mut leaves_seen = 0u64;
        let mut nodes_pruned = 0u64;

        while self.level > 0 {
            if self.level == self.n {
                let score = self.tree_stack[self.level - 1].root_score()?;
                let signature: Vec<usize> = self.signature[..self.level]
                    .iter()
                    .map(|&v| v as usize)
                    .collect();
                leaves_seen += 1;
                let is_new_best = match self.results.score() {
                    None => true,
                    Some(best) => score < best,
                };
                if is_new_best {
                    debug!("bnb: new best score {score} at signature {signature:?}");
                }
                self.results.add(signature, score);
                self.level -= 1;
                continue;
            }

            let max_edge = 2 * (self.level as i64 - 1);
            if self.signature[self.level] == max_edge {
                self.signature[self.level] = -1;
                self.level -= 1;
                continue;
            }

            self.signature[self.level] += 1;
            let edge = self.signature[self.level] as usize;

            let (lower, upper) = self.tree_stack.split_at_mut(self.level);
            upper[0].copy_from(&lower[self.level - 1])?;
            let tip_seq = Rc::clone(&self.sequences[self.level]);
            let tip_idx = upper[0].add(edge, tip_seq)?;
            let partial_score =
                fitch::update_score(&mut upper[0], tip_idx, &mut self.scratch[self.level])?;

            let keep = match self.results.score() {
                None => true,
                Some(best) => partial_score + self.absent[self.level] as i64 <= best,
            };
            if keep {
                self.level += 1;
            } else {
                nodes_pruned += 1;
            }
        }

        info!(
            "bnb: search complete, {leaves_seen} complete trees scored, {nodes_pruned} branches pruned, best score {:?}, {} tied signatures",
            self.results.score(),
            self.results.signatures().len()
        );
        Ok(self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitch::compute_score;

    fn iupac(s: &str) -> DnaSequence {
        let sites = s
            .chars()
            .map(|c| crate::dna::char_to_state(c).unwrap())
            .collect();
        DnaSequence::from_sites(sites, None).unwrap()
    }

    fn brute_force_best(list: &DnaSequenceList) -> (i64, usize) {
        let n = list.len();
        let mut signature = vec![0usize; n];
        let mut best = i64::MAX;
        let mut count = 0usize;
        fn recurse(
            list: &DnaSequenceList,
            signature: &mut Vec<usize>,
            level: usize,
            best: &mut i64,
            count: &mut usize,
        ) {
            let n = signature.len();
            if level == n {
                let mut tree = list.to_tree(signature.as_slice()).unwrap();
                let score = compute_score(&mut tree).unwrap();
                match score.cmp(best) {
                    std::cmp::Ordering::Less => {
                        *best = score;
                        *count = 1;
                    }
                    std::cmp::Ordering::Equal => *count += 1,
                    std::cmp::Ordering::Greater => {}
                }
                return;
            }
            let max_edge = 2 * (level - 1);
            for edge in 0..=max_edge {
                signature[level] = edge;
                recurse(list, signature, level + 1, best, count);
            }
        }
        recurse(list, &mut signature, 1, &mut best, &mut count);
        (best, count)
    }

    /// Scenario D: tips A, A, C (L=1). Every attachment of the third
    /// tip yields the same score (the lone differing taxon always
    /// costs exactly one change), so all three signatures survive.
    #[test]
    fn scenario_d_three_tips_all_tie() {
        let list =
            DnaSequenceList::new(vec![iupac("A"), iupac("A"), iupac("C")]).unwrap();
        let bnb = MaximumParsimonyBnb::new(&list, None, 10).unwrap();
        let results = bnb.run().unwrap();
        assert_eq!(results.score(), Some(1));
        assert_eq!(results.signatures().len(), 3);
    }

    #[test]
    fn matches_brute_force_on_four_tips() {
        let list = DnaSequenceList::new(vec![
            iupac("AAAA"),
            iupac("AACA"),
            iupac("ACAA"),
            iupac("CCAA"),
        ])
        .unwrap();
        let (brute_score, brute_count) = brute_force_best(&list);

        let bnb = MaximumParsimonyBnb::new(&list, None, 100).unwrap();
        let results = bnb.run().unwrap();

        assert_eq!(results.score(), Some(brute_score));
        assert_eq!(results.signatures().len(), brute_count);
        for signature in results.signatures() {
            let mut tree = list.to_tree(signature).unwrap();
            assert_eq!(compute_score(&mut tree).unwrap(), brute_score);
        }
    }

    #[test]
    fn single_tip_is_trivially_optimal() {
        let list = DnaSequenceList::new(vec![iupac("AAAA")]).unwrap();
        let bnb = MaximumParsimonyBnb::new(&list, None, 10).unwrap();
        let results = bnb.run().unwrap();
        assert_eq!(results.score(), Some(0));
        assert_eq!(results.signatures(), &[vec![0]]);
    }

    #[test]
    fn tight_initial_bound_prunes_to_the_same_optimum() {
        let list = DnaSequenceList::new(vec![
            iupac("AAAA"),
            iupac("AACA"),
            iupac("ACAA"),
            iupac("CCAA"),
        ])
        .unwrap();
        let (brute_score, _) = brute_force_best(&list);

        let bnb = MaximumParsimonyBnb::new(&list, Some(brute_score), 100).unwrap();
        let results = bnb.run().unwrap();
        assert_eq!(results.score(), Some(brute_score));
        assert!(!results.signatures().is_empty());
    }
}
