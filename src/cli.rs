use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::patterns::PulsePattern;

/// Command line options for the pulse-jump simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Pulse-jump simulator for a coil-array levitation pad")]
pub struct CliOptions {
    /// Path to the simulation TOML configuration file.
    #[arg(long, value_name = "FILE", default_value = "config/pulse_jump.toml")]
    pub config: PathBuf,

    /// Run only the given pulse pattern instead of the configured set.
    #[arg(long, value_enum)]
    pub pattern: Option<PatternOverride>,

    /// Display configuration summary without running the simulation.
    #[arg(long)]
    pub dry_run: bool,
}

/// Pulse patterns exposed on the CLI.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum PatternOverride {
    SingleBoost,
    ResonantPumping,
    StaircaseClimbing,
    TeslaResonance,
}

impl From<PatternOverride> for PulsePattern {
    fn from(value: PatternOverride) -> Self {
        match value {
            PatternOverride::SingleBoost => PulsePattern::SingleBoost,
            PatternOverride::ResonantPumping => PulsePattern::ResonantPumping,
            PatternOverride::StaircaseClimbing => PulsePattern::StaircaseClimbing,
            PatternOverride::TeslaResonance => PulsePattern::TeslaResonance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_override_maps_onto_every_pattern() {
        let overrides = [
            PatternOverride::SingleBoost,
            PatternOverride::ResonantPumping,
            PatternOverride::StaircaseClimbing,
            PatternOverride::TeslaResonance,
        ];
        for (override_value, pattern) in overrides.into_iter().zip(PulsePattern::ALL) {
            assert_eq!(PulsePattern::from(override_value), pattern);
        }
    }
}
