//! Output formatting for index results

use crate::alphabet::Symbol;
use crate::indexer::{IndexResult, NeedleMatch, TargetDecoy};
use crate::trie::AutomatonStats;
use std::io;
use termcolor::{Color, ColorSpec, WriteColor};

/// Print one line per match, grouped by haystack
///
/// Format: `haystack:position:needle:sequence`, with the matched residues
/// highlighted in `sequence`. `haystack` is the accession when the result
/// has them.
pub fn print_matches<W, H>(out: &mut W, result: &IndexResult, haystacks: &[H]) -> io::Result<()>
where
    W: WriteColor,
    H: AsRef<[u8]>,
{
    let mut ordered: Vec<&NeedleMatch> = result.matches.iter().collect();
    ordered.sort_by_key(|m| (m.haystack_index, m.position, m.needle_index));

    for m in ordered {
        let Some(haystack) = haystacks.get(m.haystack_index as usize) else {
            continue;
        };
        let label = result.haystack_label(m.haystack_index);
        print_match_line(out, m, &label, haystack.as_ref())?;
    }

    Ok(())
}

/// Print a match line with highlighted match
fn print_match_line<W: WriteColor>(
    out: &mut W,
    m: &NeedleMatch,
    label: &str,
    haystack: &[u8],
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
    write!(out, "{label}")?;
    out.reset()?;
    write!(out, ":")?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "{}", m.position)?;
    out.reset()?;
    write!(out, ":")?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    write!(out, "{}", m.needle_index)?;
    out.reset()?;
    write!(out, ":")?;

    let start = m.position.min(haystack.len());
    let end = match_end(haystack, start, m.length as usize);

    // Text before match
    out.write_all(&haystack[..start])?;

    // The match itself (highlighted)
    if end > start {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        out.write_all(&haystack[start..end])?;
        out.reset()?;
    }

    // Text after match
    out.write_all(&haystack[end..])?;
    writeln!(out)?;

    Ok(())
}

/// Byte offset just past the `length`-th residue starting at `start`
///
/// Characters outside the alphabet inside the span are skipped by the search,
/// so they are counted as part of the highlighted region.
fn match_end(haystack: &[u8], start: usize, length: usize) -> usize {
    let mut remaining = length;
    for (offset, &b) in haystack[start..].iter().enumerate() {
        if remaining == 0 {
            return start + offset;
        }
        if Symbol::from(b).is_valid() {
            remaining -= 1;
        }
    }
    haystack.len()
}

/// Print automaton statistics
pub fn print_stats<W: WriteColor>(out: &mut W, stats: &AutomatonStats) -> io::Result<()> {
    let rows = [
        ("Nodes", stats.node_count.to_string()),
        ("Needles", stats.needle_count.to_string()),
        ("Hit nodes", stats.hit_node_count.to_string()),
        ("Max depth", stats.max_depth.to_string()),
    ];

    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "Automaton statistics:")?;
    out.reset()?;
    for (label, value) in rows {
        writeln!(out, "  {:<10} {}", format!("{label}:"), value)?;
    }

    Ok(())
}

/// Print a one-line summary of an index run
pub fn print_summary<W: WriteColor>(out: &mut W, result: &IndexResult) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    writeln!(
        out,
        "{} hits, {} of {} needles matched in {} haystacks",
        result.matches.len(),
        result.matched_needle_count(),
        result.needle_count,
        result.haystack_count
    )?;
    if !result.accessions.is_empty() {
        writeln!(
            out,
            "{} target, {} decoy, {} target+decoy needles",
            result.target_decoy_count(TargetDecoy::Target),
            result.target_decoy_count(TargetDecoy::Decoy),
            result.target_decoy_count(TargetDecoy::TargetDecoy)
        )?;
    }
    out.reset()?;

    Ok(())
}
