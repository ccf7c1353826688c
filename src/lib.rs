//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `error`: the shared `PhyloError`/`Result` threaded through every
//!   fallible core operation.
//! - `dna`: bitmap-encoded DNA sequences, Hamming distance, Fitch ancestor.
//! - `tree`: the flat-array rooted bifurcating tree (`add`, `copy`, `join`).
//! - `sequence_list`: collections of sequences, informative-site analysis,
//!   absent-state lookahead, signature-to-tree conversion.
//! - `fitch`: full and incremental Fitch parsimony scoring.
//! - `distance`: pluggable pairwise distance (`Hamming`, `JukesCantor`).
//! - `upgma`: agglomerative distance-based tree builder.
//! - `results`: bounded accumulator of tied-optimal tree signatures.
//! - `bnb`: the branch-and-bound search driver.
//! - `io`: interleaved PHYLIP reading and results writing.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod error;
pub mod dna;
pub mod tree;
pub mod sequence_list;
pub mod fitch;
pub mod distance;
pub mod upgma;
pub mod results;
pub mod bnb;
pub mod io;

#[cfg(feature = "python")]
pub mod api;

pub use bnb::MaximumParsimonyBnb;
pub use dna::DnaSequence;
pub use error::{PhyloError, Result};
pub use results::MaximumParsimonyResults;
pub use sequence_list::DnaSequenceList;
pub use tree::DnaSequenceTree;
