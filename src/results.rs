//! Bounded accumulator of tied-optimal tree signatures found during the
//! branch-and-bound search.

/// Holds every complete tree signature seen so far at the current best
/// score, up to a fixed capacity. A signature is a `Vec<usize>` of
/// length `N` recording, for each tip, the edge index it attached to
/// when the tree was built (spec §4.3, §4.7).
pub struct MaximumParsimonyResults {
    score: Option<i64>,
    signatures: Vec<Vec<usize>>,
    capacity: usize,
}

impl MaximumParsimonyResults {
    /// A fresh, empty accumulator holding at most `capacity` tied
    /// signatures.
    pub fn new(capacity: usize) -> Self {
        MaximumParsimonyResults {
            score: None,
            signatures: Vec::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The best score seen so far, or `None` if nothing has been added.
    #[inline]
    pub fn score(&self) -> Option<i64> {
        self.score
    }

    pub fn signatures(&self) -> &[Vec<usize>] {
        &self.signatures
    }

    /// Records a complete signature found at `score`.
    ///
    /// - If `score` beats the current best, replaces the whole
    ///   collection with just this one signature.
    /// - If `score` ties the current best, appends it (dropping it
    ///   silently once `capacity` signatures are already held).
    /// - If `score` is worse than the current best, does nothing.
    pub fn add(&mut self, signature: Vec<usize>, score: i64) {
        match self.score {
            None => {
                self.score = Some(score);
                self.signatures.push(signature);
            }
            Some(best) if score < best => {
                self.score = Some(score);
                self.signatures.clear();
                self.signatures.push(signature);
            }
            Some(best) if score == best => {
                if self.signatures.len() < self.capacity {
                    self.signatures.push(signature);
                }
            }
            _ => {}
        }
    }

    /// Merges `other` into `self`, as if every signature in `other` had
    /// been `add`ed individually in some order. Used to combine results
    /// from independent parallel search branches (spec §5).
    pub fn add_all(&mut self, other: &MaximumParsimonyResults) {
        if let Some(other_score) = other.score {
            for signature in &other.signatures {
                self.add(signature.clone(), other_score);
            }
        }
    }

    /// Lowers the recorded best score without adding any signature,
    /// discarding any signatures that no longer match. Used to seed the
    /// search with an upper bound (e.g. from UPGMA) tighter than any
    /// signature found yet.
    pub fn reduce_score(&mut self, score: i64) {
        match self.score {
            Some(best) if score < best => {
                self.score = Some(score);
                self.signatures.clear();
            }
            None => {
                self.score = Some(score);
            }
            _ => {}
        }
    }

    pub fn clear(&mut self) {
        self.score = None;
        self.signatures.clear();
    }
}
