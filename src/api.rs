//! Python binding layer for the maximum-parsimony search.
//!
//! Provides a single Python-callable entry point that runs the whole
//! pipeline (read alignment, optionally excise uninformative sites,
//! optionally seed a bound from UPGMA, search) over a PHYLIP file.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::bnb::MaximumParsimonyBnb;
use crate::distance::JukesCantor;
use crate::fitch;
use crate::io::read_phylip;
use crate::upgma::Upgma;

/// Runs maximum-parsimony search over the alignment at `path`.
///
/// Args:
///     path: Path to an interleaved PHYLIP alignment.
///     capacity: Maximum number of tied-optimal signatures to retain.
///     excise_uninformative: Drop uninformative sites before searching
///         (default: True). The returned score always reflects the
///         full original alignment.
///     upgma_bound: Seed the search with an upper bound from a UPGMA
///         tree scored by Fitch parsimony (default: True).
///
/// Returns:
///     A tuple `(score, signatures)` where `signatures` is a list of
///     tied-optimal tree signatures (lists of edge indices).
///
/// Raises:
///     ValueError: If the alignment fails to parse or the search
///         cannot be constructed.
#[pyfunction]
#[pyo3(signature = (path, capacity=1000, excise_uninformative=true, upgma_bound=true))]
fn maximum_parsimony(
    path: String,
    capacity: usize,
    excise_uninformative: bool,
    upgma_bound: bool,
) -> PyResult<(i64, Vec<Vec<usize>>)> {
    let mut list =
        read_phylip(&path).map_err(|e| PyValueError::new_err(format!("{e}")))?;

    let uninformative_changes = if excise_uninformative {
        list.excise_uninformative_sites() as i64
    } else {
        0
    };

    let initial_bound = if upgma_bound {
        let mut seed = Upgma::build(&list, &JukesCantor)
            .map_err(|e| PyValueError::new_err(format!("{e}")))?;
        let score =
            fitch::compute_score(&mut seed).map_err(|e| PyValueError::new_err(format!("{e}")))?;
        Some(score + uninformative_changes)
    } else {
        None
    };

    let bnb = MaximumParsimonyBnb::new(&list, initial_bound, capacity)
        .map_err(|e| PyValueError::new_err(format!("{e}")))?;
    let results = bnb.run().map_err(|e| PyValueError::new_err(format!("{e}")))?;

    let score = results.score().unwrap_or(0) + uninformative_changes;
    Ok((score, results.signatures().to_vec()))
}

/// Python module definition
#[pymodule]
fn maxpars(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(maximum_parsimony, m)?)?;
    Ok(())
}
