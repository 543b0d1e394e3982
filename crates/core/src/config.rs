// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chemistry-level configuration shared by deck synthesis and job chaining.
//!
//! [`OrcaConfig`] is pure data: the method, basis set, and resource knobs that
//! get rendered into an ORCA `.inp` deck. It knows nothing about files or
//! processes; that belongs to the crates that consume it.

/// Implicit solvation model. `None` means gas phase (no `%cpcm`/solvent keyword).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolventModel {
    #[default]
    None,
    Cpcm,
    Smd,
    Cosmo,
}

impl SolventModel {
    /// The token ORCA expects in the `!` keyword line, e.g. `"CPCM"`.
    fn keyword(self) -> Option<&'static str> {
        match self {
            SolventModel::None => Option::None,
            SolventModel::Cpcm => Some("CPCM"),
            SolventModel::Smd => Some("SMD"),
            SolventModel::Cosmo => Some("COSMO"),
        }
    }
}

impl std::str::FromStr for SolventModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(SolventModel::None),
            "cpcm" => Ok(SolventModel::Cpcm),
            "smd" => Ok(SolventModel::Smd),
            "cosmo" => Ok(SolventModel::Cosmo),
            other => Err(format!("unknown solvent model: {other:?}")),
        }
    }
}

/// Which computation step a deck's `!` line should request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcStep {
    Opt,
    Freq,
}

impl CalcStep {
    fn keyword(self) -> &'static str {
        match self {
            CalcStep::Opt => "Opt",
            CalcStep::Freq => "Freq",
        }
    }
}

/// Method, basis, and resource settings used to render an ORCA input deck.
///
/// Mirrors the `[orca]` section of the daemon's on-disk config, but carries no
/// I/O of its own so it can be unit-tested and reused by the chain builder.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrcaConfig {
    pub method: String,
    pub basis: String,
    pub solvent_model: SolventModel,
    /// Solvent display name, e.g. `"water"`. Rendered as `Cpcm(Water)`. Ignored
    /// when `solvent_model` is `None`.
    pub solvent_name: Option<String>,
    pub nprocs: u32,
    /// Per-core memory limit in MB (ORCA's `%maxcore`).
    pub maxcore: u32,
    pub charge: i32,
    pub multiplicity: u32,
    /// Additional tokens appended verbatim to the `!` keyword line.
    pub extra_keywords: Vec<String>,
}

impl OrcaConfig {
    /// Render the `!` keyword line for the given calculation step, e.g.
    /// `"! B3LYP def2-SVP Opt CPCM(Water)"`.
    pub fn keyword_line(&self, step: CalcStep) -> String {
        let mut line = format!("! {} {} {}", self.method, self.basis, step.keyword());
        if let Some(kw) = self.solvent_model.keyword() {
            let name = self
                .solvent_name
                .as_deref()
                .map(capitalize)
                .unwrap_or_default();
            line.push_str(&format!(" {kw}({name})"));
        }
        for extra in &self.extra_keywords {
            line.push(' ');
            line.push_str(extra);
        }
        line
    }

    /// Render the full deck body (everything but the coordinate block), e.g.
    /// the `%pal`, `%maxcore`, and `* xyz` header lines.
    pub fn header_lines(&self, step: CalcStep) -> Vec<String> {
        vec![
            self.keyword_line(step),
            format!("%pal nprocs {} end", self.nprocs),
            format!("%maxcore {}", self.maxcore),
            format!("* xyz {} {}", self.charge, self.multiplicity),
        ]
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

crate::builder! {
    pub struct OrcaConfigBuilder => OrcaConfig {
        into { method: String = "B3LYP" }
        into { basis: String = "def2-SVP" }
        set { solvent_model: SolventModel = SolventModel::None }
        option { solvent_name: String = None }
        set { nprocs: u32 = 1 }
        set { maxcore: u32 = 2000 }
        set { charge: i32 = 0 }
        set { multiplicity: u32 = 1 }
        set { extra_keywords: Vec<String> = Vec::new() }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
