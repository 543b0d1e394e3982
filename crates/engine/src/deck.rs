// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses XYZ geometry files and renders them into ORCA input decks.

use orca_core::{CalcStep, OrcaConfig};

use crate::error::EngineError;

/// One atom's element symbol and Cartesian coordinates, in angstroms.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A parsed XYZ geometry: the atom count line and comment line are consumed
/// during parsing and not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub atoms: Vec<Atom>,
}

/// Parse the standard XYZ format: an atom count, a comment line, then one
/// `element x y z` line per atom.
pub fn parse_xyz(text: &str) -> Result<Geometry, EngineError> {
    let mut lines = text.lines();
    let count_line = lines
        .next()
        .ok_or_else(|| EngineError::Deck("empty xyz file".to_string()))?;
    let count: usize = count_line
        .trim()
        .parse()
        .map_err(|_| EngineError::Deck(format!("invalid atom count: {count_line:?}")))?;

    lines.next(); // comment line, discarded

    let mut atoms = Vec::with_capacity(count);
    for (i, line) in lines.enumerate() {
        if atoms.len() == count {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let element = fields
            .next()
            .ok_or_else(|| EngineError::Deck(format!("missing element on atom line {i}")))?
            .to_string();
        let coords: Vec<f64> = fields
            .by_ref()
            .take(3)
            .map(|f| f.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| EngineError::Deck(format!("invalid coordinates on atom line {i}")))?;
        if coords.len() != 3 {
            return Err(EngineError::Deck(format!("expected 3 coordinates on atom line {i}")));
        }
        atoms.push(Atom { element, x: coords[0], y: coords[1], z: coords[2] });
    }

    if atoms.len() != count {
        return Err(EngineError::Deck(format!(
            "xyz header declared {count} atoms but found {}",
            atoms.len()
        )));
    }

    Ok(Geometry { atoms })
}

const CARTESIAN_HEADER: &str = "CARTESIAN COORDINATES (ANGSTROEM)";

/// Scan ORCA output text for the last `CARTESIAN COORDINATES (ANGSTROEM)`
/// block and parse it into a [`Geometry`] (spec.md §4.7).
///
/// ORCA repeats this block once per optimization cycle; only the final one
/// reflects the converged geometry. Within the chosen block, a line is kept
/// only if its first whitespace-delimited field is alphabetic (an element
/// symbol) and its last field parses as `f64` — this tolerates the extra
/// columns some ORCA versions append (bond info, fragment indices) by always
/// reading coordinates from the *last* three fields rather than fixed
/// columns.
pub fn extract_last_cartesian_block(text: &str) -> Option<Geometry> {
    let lines: Vec<&str> = text.lines().collect();
    let last_header = lines.iter().rposition(|line| line.contains(CARTESIAN_HEADER))?;

    let mut atoms = Vec::new();
    for line in lines[last_header + 1..].iter() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if atoms.is_empty() {
                continue;
            }
            break;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let Some(element) = fields.first() else { break };
        if !element.chars().all(|c| c.is_ascii_alphabetic()) {
            break;
        }
        let Some(last) = fields.last() else { break };
        if last.parse::<f64>().is_err() {
            break;
        }
        if fields.len() < 4 {
            break;
        }
        let tail = &fields[fields.len() - 3..];
        let coords: Result<Vec<f64>, _> = tail.iter().map(|f| f.parse::<f64>()).collect();
        let Ok(coords) = coords else { break };
        atoms.push(Atom { element: element.to_string(), x: coords[0], y: coords[1], z: coords[2] });
    }

    if atoms.is_empty() {
        None
    } else {
        Some(Geometry { atoms })
    }
}

/// Render a complete ORCA `.inp` deck for `geometry` at the given calculation
/// step, using `config` for the method/basis/resource header.
pub fn render_deck(config: &OrcaConfig, step: CalcStep, geometry: &Geometry) -> String {
    let mut lines = config.header_lines(step);
    for atom in &geometry.atoms {
        lines.push(format!(
            "{:<2} {:>12.6} {:>12.6} {:>12.6}",
            atom.element, atom.x, atom.y, atom.z
        ));
    }
    lines.push("*".to_string());
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
#[path = "deck_tests.rs"]
mod tests;
