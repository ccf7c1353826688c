//! Pairwise sequence distances used to seed a starting tree via UPGMA.

use crate::dna::DnaSequence;
use crate::error::Result;

/// A pairwise distance measure between two DNA sequences.
pub trait Distance {
    /// Distance between `a` and `b`. `f64::INFINITY` signals sequences
    /// too diverged for this measure to estimate (see [`JukesCantor`]).
    fn distance(&self, a: &DnaSequence, b: &DnaSequence) -> Result<f64>;
}

/// Raw Hamming distance: the count of differing sites, unscaled.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hamming;

impl Distance for Hamming {
    fn distance(&self, a: &DnaSequence, b: &DnaSequence) -> Result<f64> {
        Ok(a.hamming_distance(b)? as f64)
    }
}

/// Jukes-Cantor corrected distance: `-3/4 * ln(1 - 4/3 * p)` where `p`
/// is the proportion of differing sites. When `p >= 3/4` the log
/// argument is non-positive and the two sequences are treated as
/// having saturated — infinitely diverged under this model — and the
/// distance is `f64::INFINITY` rather than `NaN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JukesCantor;

impl Distance for JukesCantor {
    fn distance(&self, a: &DnaSequence, b: &DnaSequence) -> Result<f64> {
        let hamming = a.hamming_distance(b)? as f64;
        let length = a.len() as f64;
        if length == 0.0 {
            return Ok(0.0);
        }
        let p = hamming / length;
        let arg = 1.0 - (4.0 / 3.0) * p;
        if arg <= 0.0 {
            return Ok(f64::INFINITY);
        }
        Ok(-(3.0 / 4.0) * arg.ln())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(states: &[u8]) -> DnaSequence {
        DnaSequence::from_sites(states.to_vec(), None).unwrap()
    }

    #[test]
    fn hamming_counts_differences() {
        let a = seq(&[1, 1, 1, 1]);
        let b = seq(&[1, 1, 2, 1]);
        assert_eq!(Hamming.distance(&a, &b).unwrap(), 1.0);
    }

    #[test]
    fn jukes_cantor_identical_sequences_is_zero() {
        let a = seq(&[1, 2, 4, 8]);
        let b = seq(&[1, 2, 4, 8]);
        assert_eq!(JukesCantor.distance(&a, &b).unwrap(), 0.0);
    }

    /// Scenario B: two length-4 sequences differing at all 4 sites.
    /// `p = 1.0`, so `1 - 4/3 = -1/3 <= 0` and the distance saturates.
    #[test]
    fn jukes_cantor_saturates_to_infinity() {
        let a = seq(&[1, 1, 1, 1]);
        let b = seq(&[2, 2, 2, 2]);
        assert_eq!(JukesCantor.distance(&a, &b).unwrap(), f64::INFINITY);
    }

    #[test]
    fn jukes_cantor_below_saturation_is_finite_and_positive() {
        // p = 1/4: 1 - 4/3 * 1/4 = 2/3 > 0.
        let a = seq(&[1, 1, 1, 1]);
        let b = seq(&[2, 1, 1, 1]);
        let d = JukesCantor.distance(&a, &b).unwrap();
        assert!(d.is_finite() && d > 0.0);
    }
}
