//! UPGMA agglomerative clustering: builds a starting tree from pairwise
//! distances, used to seed the branch-and-bound search with a good
//! initial upper bound (spec §4.5).

use crate::distance::Distance;
use crate::error::{PhyloError, Result};
use crate::sequence_list::DnaSequenceList;
use crate::tree::DnaSequenceTree;
use log::{debug, info};

#[derive(Clone)]
struct Cluster {
    tree: DnaSequenceTree,
    size: usize,
}

/// Average-linkage (UPGMA) tree builder.
pub struct Upgma;

impl Upgma {
    /// Builds a tree over every sequence in `list` by repeatedly
    /// joining the two closest clusters under `metric`, recomputing
    /// inter-cluster distances by the weighted-average-linkage
    /// formula, and converting node heights to branch lengths once
    /// clustering completes.
    pub fn build<D: Distance>(list: &DnaSequenceList, metric: &D) -> Result<DnaSequenceTree> {
        let n = list.len();
        if n == 0 {
            return Err(PhyloError::Format(
                "cannot build a UPGMA tree over an empty sequence list".into(),
            ));
        }
        info!("upgma: clustering {n} sequences");
        let mut clusters: Vec<Cluster> = Vec::with_capacity(n);
        for i in 0..n {
            let mut t = DnaSequenceTree::new(1);
            t.add(0, list.get(i))?;
            clusters.push(Cluster { tree: t, size: 1 });
        }

        let mut dist = vec![vec![0.0f64; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let a = list.get(i);
                let b = list.get(j);
                let d = metric.distance(&a.borrow(), &b.borrow())?;
                dist[i][j] = d;
                dist[j][i] = d;
            }
        }

        while clusters.len() > 1 {
            let m = clusters.len();
            let mut best = (0usize, 1usize, f64::INFINITY);
            for i in 0..m {
                for j in (i + 1)..m {
                    if dist[i][j] < best.2 {
                        best = (i, j, dist[i][j]);
                    }
                }
            }
            let (i, j, d) = best;
            let height = d / 2.0;
            let new_size = clusters[i].size + clusters[j].size;
            debug!(
                "upgma: merging clusters of size {} and {} at distance {d:.6} (height {height:.6}), {} clusters remain",
                clusters[i].size,
                clusters[j].size,
                m - 1
            );

            let n1 = clusters[i].tree.len();
            let mut joined = DnaSequenceTree::join(&clusters[i].tree, &clusters[j].tree);
            // join() places t1's (shifted) root at index 1 and t2's at
            // n1+1; tag each with this merge's height, to be consumed
            // as "my parent's height" by finalize_branch_lengths.
            joined.set_branch_length(1, Some(height));
            joined.set_branch_length(n1 + 1, Some(height));

            let remaining: Vec<usize> = (0..m).filter(|&k| k != i && k != j).collect();
            let mut new_dist = vec![vec![0.0f64; remaining.len() + 1]; remaining.len() + 1];
            for (a_idx, &a) in remaining.iter().enumerate() {
                for (b_idx, &b) in remaining.iter().enumerate() {
                    new_dist[a_idx][b_idx] = dist[a][b];
                }
                let weighted = (clusters[i].size as f64 * dist[i][a]
                    + clusters[j].size as f64 * dist[j][a])
                    / new_size as f64;
                new_dist[a_idx][remaining.len()] = weighted;
                new_dist[remaining.len()][a_idx] = weighted;
            }
            dist = new_dist;

            let mut new_clusters: Vec<Cluster> =
                remaining.iter().map(|&k| clusters[k].clone()).collect();
            new_clusters.push(Cluster {
                tree: joined,
                size: new_size,
            });
            clusters = new_clusters;
        }

        let mut tree = clusters
            .pop()
            .expect("loop runs until exactly one cluster remains")
            .tree;
        finalize_branch_lengths(&mut tree);
        info!("upgma: clustering complete, {} nodes", tree.len());
        Ok(tree)
    }
}

/// Converts the height tags left by [`Upgma::build`] on every non-root
/// node into branch lengths, recursing from the root. A node's
/// branch-length field, as left by clustering, holds the height of the
/// merge that created its parent; a node's own height is recovered from
/// either of its children's tag before that tag is overwritten with the
/// final branch length `parent_height - own_height`. Tips (height 0,
/// no children) get `parent_height - 0`.
fn finalize_branch_lengths(tree: &mut DnaSequenceTree) {
    let root = tree.root();
    finalize_node(tree, root);
}

fn finalize_node(tree: &mut DnaSequenceTree, idx: usize) -> f64 {
    match tree.children(idx) {
        None => 0.0,
        Some((c0, c1)) => {
            let own_height = tree.branch_length(c0).unwrap_or(0.0);
            let h0 = finalize_node(tree, c0);
            let h1 = finalize_node(tree, c1);
            tree.set_branch_length(c0, Some(own_height - h0));
            tree.set_branch_length(c1, Some(own_height - h1));
            own_height
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::DnaSequence;
    use crate::distance::Hamming;

    fn seq(states: &[u8]) -> DnaSequence {
        DnaSequence::from_sites(states.to_vec(), None).unwrap()
    }

    /// Scenario F: three tips with Hamming distances D(0,1)=2, D(0,2)=4,
    /// D(1,2)=4. Tips 0 and 1 merge first (height 1), then join tip 2
    /// (height 2), yielding final branch lengths tip0=1, tip1=1,
    /// interior=1, tip2=2.
    #[test]
    fn scenario_f_upgma_heights() {
        let s0 = seq(&[1, 1, 1, 1]); // AAAA
        let s1 = seq(&[2, 2, 1, 1]); // CCAA: differs from tip0 at 2 sites
        let s2 = seq(&[4, 4, 4, 4]); // GGGG: differs from both at all 4 sites
        let list = DnaSequenceList::new(vec![s0, s1, s2]).unwrap();

        let a = list.get(0);
        let b = list.get(1);
        let c = list.get(2);
        assert_eq!(Hamming.distance(&a.borrow(), &b.borrow()).unwrap(), 2.0);
        assert_eq!(Hamming.distance(&a.borrow(), &c.borrow()).unwrap(), 4.0);
        assert_eq!(Hamming.distance(&b.borrow(), &c.borrow()).unwrap(), 4.0);

        let tree = Upgma::build(&list, &Hamming).unwrap();
        assert_eq!(tree.len(), 5);

        let mut tip_lengths: Vec<f64> = Vec::new();
        let mut interior_length = None;
        for i in 0..tree.len() {
            if i == tree.root() {
                continue;
            }
            let bl = tree.branch_length(i).unwrap();
            if tree.is_tip(i) {
                tip_lengths.push(bl);
            } else {
                interior_length = Some(bl);
            }
        }
        tip_lengths.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert_eq!(tip_lengths, vec![1.0, 1.0, 2.0]);
        assert_eq!(interior_length, Some(1.0));
    }

    #[test]
    fn build_single_tip_has_no_merges() {
        let list = DnaSequenceList::new(vec![seq(&[1, 2])]).unwrap();
        let tree = Upgma::build(&list, &Hamming).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.is_tip(tree.root()));
    }

    #[test]
    fn build_rejects_empty_list() {
        let list = DnaSequenceList::new(vec![]).unwrap();
        assert!(Upgma::build(&list, &Hamming).is_err());
    }
}
