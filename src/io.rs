//! Interleaved PHYLIP alignment reader and results writer.
//!
//! These are the core's external collaborators: parsing and
//! serialization carry no algorithmic depth of their own, but they are
//! the only place genuinely external input reaches the search.

use std::fs;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};

use crate::dna::{char_to_state, DnaSequence};
use crate::error::{PhyloError, Result};
use crate::sequence_list::DnaSequenceList;

/// Reads an interleaved PHYLIP alignment from `path` into a
/// [`DnaSequenceList`].
///
/// Grammar: a header line `S N` (species count, site count), followed
/// by groups of `S` lines. In the first group each line begins with a
/// 10-character fixed-width name field; in later groups every character
/// is a site. Blank lines are ignored. Sites are IUPAC ambiguity
/// characters (case-insensitive), `?` for fully ambiguous, or `.`
/// meaning "same as species 1 at this position."
pub fn read_phylip<P: AsRef<Path>>(path: P) -> Result<DnaSequenceList> {
    info!("reading interleaved PHYLIP alignment from {:?}", path.as_ref());
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        PhyloError::Format(format!("failed to read {:?}: {e}", path.as_ref()))
    })?;
    parse_phylip(&content)
}

fn parse_phylip(content: &str) -> Result<DnaSequenceList> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| PhyloError::Format("empty PHYLIP input".into()))?;
    let mut header_fields = header.split_whitespace();
    let species: usize = header_fields
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| PhyloError::Format("missing species count in header".into()))?;
    let sites_per_species: usize = header_fields
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| PhyloError::Format("missing site count in header".into()))?;
    if species < 2 {
        return Err(PhyloError::Format("need at least 2 species".into()));
    }
    if sites_per_species < 1 {
        return Err(PhyloError::Format("need at least 1 site".into()));
    }
    debug!("phylip header: {species} species, {sites_per_species} sites");

    let mut names: Vec<String> = Vec::with_capacity(species);
    let mut sites: Vec<Vec<u8>> = vec![Vec::with_capacity(sites_per_species); species];

    let mut index = 0usize;
    let mut first_group = true;
    for line in lines {
        let rest = if first_group {
            if line.len() < 10 {
                return Err(PhyloError::Format(format!(
                    "species {index}'s name field is shorter than 10 characters"
                )));
            }
            let (name_field, rest) = line.split_at(10);
            names.push(name_field.trim().to_string());
            rest
        } else {
            line
        };

        for ch in rest.chars() {
            if ch.is_whitespace() {
                continue;
            }
            let state = if ch == '.' {
                if index == 0 {
                    return Err(PhyloError::Format("'.' is illegal in species 1".into()));
                }
                let position = sites[index].len();
                *sites[0].get(position).ok_or_else(|| {
                    PhyloError::Format(format!(
                        "'.' at site {position} has no corresponding site in species 1"
                    ))
                })?
            } else {
                char_to_state(ch)
                    .ok_or_else(|| PhyloError::Format(format!("unknown character '{ch}'")))?
            };
            sites[index].push(state);
        }

        if sites[index].len() > sites_per_species {
            return Err(PhyloError::Format(format!("species {index} has too many sites")));
        }

        index += 1;
        if index == species {
            index = 0;
            first_group = false;
        }
    }

    if index != 0 {
        return Err(PhyloError::Format("input ended mid-group".into()));
    }
    for (i, seq_sites) in sites.iter().enumerate() {
        if seq_sites.len() != sites_per_species {
            return Err(PhyloError::Format(format!(
                "species {i} has {} sites, expected {sites_per_species}",
                seq_sites.len()
            )));
        }
    }

    let sequences = sites
        .into_iter()
        .zip(names)
        .map(|(site_vec, name)| DnaSequence::from_sites(site_vec, Some(name)))
        .collect::<Result<Vec<_>>>()?;
    info!("parsed {species} sequences of length {sites_per_species}");
    DnaSequenceList::new(sequences)
}

/// Writes the search's final score and every tied-optimal signature to
/// `path`, one signature per line as comma-separated edge indices. If
/// `path` ends with `.gz`, the output is gzip-compressed.
pub fn write_results<P: AsRef<Path>>(
    path: P,
    score: i64,
    signatures: &[Vec<usize>],
) -> io::Result<()> {
    let p = path.as_ref();
    let is_gz = p.to_string_lossy().ends_with(".gz");

    let mut out: Box<dyn Write> = if is_gz {
        let f = File::create(p)?;
        let enc = GzEncoder::new(f, Compression::default());
        Box::new(BufWriter::new(enc))
    } else {
        Box::new(BufWriter::new(File::create(p)?))
    };

    writeln!(&mut out, "score\t{score}")?;
    for signature in signatures {
        let joined = signature
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        writeln!(&mut out, "{joined}")?;
    }

    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_interleaved_alignment() {
        let input = "4 4\n\
                      species1  AAAA\n\
                      species2  AACA\n\
                      species3  ACAA\n\
                      species4  CCAA\n";
        let list = parse_phylip(input).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list.sequence_length(), 4);
    }

    #[test]
    fn parses_interleaved_blocks_across_multiple_groups() {
        let input = "2 4\n\
                      sp1       AA\n\
                      sp2       AC\n\
                      CA\n\
                      AA\n";
        let list = parse_phylip(input).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.sequence_length(), 4);
    }

    #[test]
    fn dot_copies_from_species_one() {
        let input = "2 4\n\
                      sp1       AACG\n\
                      sp2       ..T.\n";
        let list = parse_phylip(input).unwrap();
        let seq2 = list.get(1);
        assert_eq!(seq2.borrow().to_iupac_string(), "AATG");
    }

    #[test]
    fn dot_in_species_one_is_rejected() {
        let input = "2 4\nsp1       AA.A\nsp2       AAAA\n";
        assert!(parse_phylip(input).is_err());
    }

    #[test]
    fn short_name_field_is_rejected() {
        let input = "2 4\nsp1 AAAA\nsp2       AAAA\n";
        assert!(parse_phylip(input).is_err());
    }

    #[test]
    fn unknown_character_is_rejected() {
        let input = "2 4\nsp1       AAZA\nsp2       AAAA\n";
        assert!(parse_phylip(input).is_err());
    }

    #[test]
    fn wrong_site_count_is_rejected() {
        let input = "2 4\nsp1       AAA\nsp2       AAAA\n";
        assert!(parse_phylip(input).is_err());
    }
}
