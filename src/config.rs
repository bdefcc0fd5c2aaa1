use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::envelope::EnvelopeParams;
use crate::field::{ArrayParams, CoilParams, FieldModel, MagnetParams};
use crate::harmonics::HarmonicsParams;
use crate::jump::JumpParams;
use crate::patterns::{PatternParams, PulsePattern};
use crate::sweep::SweepParams;
use crate::waveform::{FlightInputs, RotatingDriveParams, TripulseParams};

// ---------------------------------------------------------------------------
// Shared field-model sections
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MagnetSection {
    surface_field: f64,
    #[serde(default = "default_magnet_thickness")]
    thickness: f64,
    #[serde(default = "default_magnet_falloff")]
    falloff_exponent: f64,
}

fn default_magnet_thickness() -> f64 {
    0.02
}

fn default_magnet_falloff() -> f64 {
    2.0
}

#[derive(Debug, Deserialize)]
struct CoilSection {
    turns: u32,
    radius: f64,
    peak_current: f64,
    #[serde(default = "default_tones")]
    tones: u32,
    #[serde(default = "default_coil_falloff")]
    falloff_exponent: f64,
    #[serde(default = "default_coil_efficiency")]
    efficiency: f64,
}

fn default_tones() -> u32 {
    3
}

fn default_coil_falloff() -> f64 {
    1.2
}

fn default_coil_efficiency() -> f64 {
    0.95
}

#[derive(Debug, Deserialize)]
struct ArraySection {
    #[serde(default = "default_coil_count")]
    coil_count: usize,
    #[serde(default = "default_array_factor")]
    array_factor: f64,
    pad_area: f64,
    #[serde(default = "default_pressure_efficiency")]
    pressure_efficiency: f64,
    #[serde(default = "default_coil_resistance")]
    coil_resistance: f64,
    #[serde(default)]
    superconducting: bool,
    #[serde(default)]
    cooling_power: f64,
}

fn default_coil_count() -> usize {
    9
}

fn default_array_factor() -> f64 {
    6.5
}

fn default_pressure_efficiency() -> f64 {
    0.7
}

fn default_coil_resistance() -> f64 {
    0.1
}

fn build_field_model(
    magnet: &MagnetSection,
    coil: &CoilSection,
    array: &ArraySection,
) -> Result<FieldModel> {
    ensure!(magnet.surface_field >= 0.0, "Magnet surface field must be non-negative");
    ensure!(magnet.thickness > 0.0, "Magnet thickness must be positive");
    ensure!(magnet.falloff_exponent > 0.0, "Magnet falloff exponent must be positive");
    ensure!(coil.turns > 0, "Coil turn count must be positive");
    ensure!(coil.radius > 0.0, "Coil radius must be positive");
    ensure!(coil.peak_current > 0.0, "Coil peak current must be positive");
    ensure!(coil.tones > 0, "Coil tone count must be positive");
    ensure!(coil.falloff_exponent > 0.0, "Coil falloff exponent must be positive");
    ensure!(
        coil.efficiency > 0.0 && coil.efficiency <= 1.0,
        "Coil efficiency must lie in (0, 1]"
    );
    ensure!(array.coil_count > 0, "Array coil count must be positive");
    ensure!(array.array_factor > 0.0, "Array factor must be positive");
    ensure!(array.pad_area > 0.0, "Pad area must be positive");
    ensure!(
        array.pressure_efficiency > 0.0 && array.pressure_efficiency <= 1.0,
        "Pressure efficiency must lie in (0, 1]"
    );
    ensure!(array.coil_resistance >= 0.0, "Coil resistance must be non-negative");
    ensure!(array.cooling_power >= 0.0, "Cooling power must be non-negative");

    Ok(FieldModel {
        magnet: MagnetParams {
            surface_field: magnet.surface_field,
            thickness: magnet.thickness,
            falloff_exponent: magnet.falloff_exponent,
        },
        coil: CoilParams {
            turns: coil.turns,
            radius: coil.radius,
            peak_current: coil.peak_current,
            tones: coil.tones,
            falloff_exponent: coil.falloff_exponent,
            efficiency: coil.efficiency,
        },
        array: ArrayParams {
            coil_count: array.coil_count,
            array_factor: array.array_factor,
            pad_area: array.pad_area,
            pressure_efficiency: array.pressure_efficiency,
            coil_resistance: array.coil_resistance,
            superconducting: array.superconducting,
            cooling_power: array.cooling_power,
        },
    })
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct TogglesSection {
    #[serde(default = "default_true")]
    png: bool,
    #[serde(default = "default_true")]
    svg: bool,
    #[serde(default = "default_true")]
    csv: bool,
    #[serde(default = "default_true")]
    json: bool,
}

impl Default for TogglesSection {
    fn default() -> Self {
        Self {
            png: true,
            svg: true,
            csv: true,
            json: true,
        }
    }
}

/// Artifact toggles shared by every analysis.
#[derive(Debug, Clone, Copy)]
pub struct OutputToggles {
    pub png: bool,
    pub svg: bool,
    pub csv: bool,
    pub json: bool,
}

impl From<TogglesSection> for OutputToggles {
    fn from(section: TogglesSection) -> Self {
        OutputToggles {
            png: section.png,
            svg: section.svg,
            csv: section.csv,
            json: section.json,
        }
    }
}

// ---------------------------------------------------------------------------
// Pulse-jump simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JumpConfigRoot {
    magnet: MagnetSection,
    coil: CoilSection,
    array: ArraySection,
    simulation: JumpSimulationSection,
    #[serde(default)]
    patterns: PatternsSection,
    output: JumpOutputSection,
}

#[derive(Debug, Deserialize)]
struct JumpSimulationSection {
    duration: f64,
    dt: f64,
    mass: f64,
    #[serde(default = "default_start_height")]
    start_height: f64,
    #[serde(default = "default_floor_height")]
    floor_height: f64,
}

fn default_start_height() -> f64 {
    0.05
}

fn default_floor_height() -> f64 {
    1e-3
}

#[derive(Debug, Deserialize)]
struct PatternsSection {
    #[serde(default = "default_pattern_run")]
    run: Vec<PulsePattern>,
    #[serde(default = "default_hold_multiplier")]
    hold_multiplier: f64,
    #[serde(default = "default_boost_start")]
    boost_start: f64,
    #[serde(default = "default_boost_end")]
    boost_end: f64,
    #[serde(default = "default_staircase_starts")]
    staircase_starts: Vec<f64>,
    #[serde(default = "default_staircase_width")]
    staircase_width: f64,
    #[serde(default = "default_staircase_level")]
    staircase_level: f64,
    #[serde(default = "default_resonance_floor")]
    resonance_floor: f64,
}

impl Default for PatternsSection {
    fn default() -> Self {
        Self {
            run: default_pattern_run(),
            hold_multiplier: default_hold_multiplier(),
            boost_start: default_boost_start(),
            boost_end: default_boost_end(),
            staircase_starts: default_staircase_starts(),
            staircase_width: default_staircase_width(),
            staircase_level: default_staircase_level(),
            resonance_floor: default_resonance_floor(),
        }
    }
}

fn default_pattern_run() -> Vec<PulsePattern> {
    PulsePattern::ALL.to_vec()
}

fn default_hold_multiplier() -> f64 {
    0.15
}

fn default_boost_start() -> f64 {
    0.5
}

fn default_boost_end() -> f64 {
    0.6
}

fn default_staircase_starts() -> Vec<f64> {
    vec![0.2, 0.6, 1.0, 1.4]
}

fn default_staircase_width() -> f64 {
    0.1
}

fn default_staircase_level() -> f64 {
    0.8
}

fn default_resonance_floor() -> f64 {
    0.05
}

#[derive(Debug, Deserialize)]
struct JumpOutputSection {
    directory: PathBuf,
    #[serde(default = "default_jump_summary_json")]
    summary_json: PathBuf,
    #[serde(default = "default_jump_heights_png")]
    heights_png: PathBuf,
    #[serde(default = "default_jump_heights_svg")]
    heights_svg: PathBuf,
    #[serde(default = "default_jump_multipliers_png")]
    multipliers_png: PathBuf,
    #[serde(default = "default_jump_multipliers_svg")]
    multipliers_svg: PathBuf,
    #[serde(default = "default_jump_force_png")]
    force_png: PathBuf,
    #[serde(default = "default_jump_force_svg")]
    force_svg: PathBuf,
    #[serde(default)]
    toggles: TogglesSection,
    #[serde(default = "default_jump_csv_fields")]
    csv_fields: Vec<String>,
}

fn default_jump_summary_json() -> PathBuf {
    PathBuf::from("jump_summary.json")
}

fn default_jump_heights_png() -> PathBuf {
    PathBuf::from("jump_heights.png")
}

fn default_jump_heights_svg() -> PathBuf {
    PathBuf::from("jump_heights.svg")
}

fn default_jump_multipliers_png() -> PathBuf {
    PathBuf::from("jump_multipliers.png")
}

fn default_jump_multipliers_svg() -> PathBuf {
    PathBuf::from("jump_multipliers.svg")
}

fn default_jump_force_png() -> PathBuf {
    PathBuf::from("jump_force.png")
}

fn default_jump_force_svg() -> PathBuf {
    PathBuf::from("jump_force.svg")
}

fn default_jump_csv_fields() -> Vec<String> {
    vec![
        "time".into(),
        "height".into(),
        "velocity".into(),
        "net_force".into(),
        "multiplier".into(),
    ]
}

#[derive(Debug, Clone)]
pub struct JumpOutput {
    pub directory: PathBuf,
    pub summary_json: PathBuf,
    pub heights_png: PathBuf,
    pub heights_svg: PathBuf,
    pub multipliers_png: PathBuf,
    pub multipliers_svg: PathBuf,
    pub force_png: PathBuf,
    pub force_svg: PathBuf,
    pub toggles: OutputToggles,
    pub csv_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct JumpConfig {
    pub simulation: JumpParams,
    pub model: FieldModel,
    pub run: Vec<PulsePattern>,
    pub patterns: PatternParams,
    pub output: JumpOutput,
}

pub fn load_jump(path: impl AsRef<Path>) -> Result<JumpConfig> {
    let raw = read_config(path.as_ref())?;
    let parsed: JumpConfigRoot =
        toml::from_str(&raw).context("Failed to parse pulse-jump configuration")?;

    let sim = &parsed.simulation;
    ensure!(sim.dt > 0.0, "Time step dt must be positive");
    ensure!(sim.duration > 0.0, "Simulation duration must be positive");
    ensure!(sim.mass > 0.0, "Mass must be positive");
    ensure!(sim.floor_height > 0.0, "Floor height must be positive");
    ensure!(
        sim.start_height >= sim.floor_height,
        "Start height must not be below the floor"
    );

    let patterns = &parsed.patterns;
    ensure!(
        (0.0..=1.0).contains(&patterns.hold_multiplier),
        "Hold multiplier must lie in [0, 1]"
    );
    ensure!(
        patterns.boost_end > patterns.boost_start,
        "Boost window must have positive width"
    );
    ensure!(!patterns.run.is_empty(), "At least one pulse pattern must be selected");

    Ok(JumpConfig {
        simulation: JumpParams {
            duration: sim.duration,
            dt: sim.dt,
            mass: sim.mass,
            start_height: sim.start_height,
            floor_height: sim.floor_height,
        },
        model: build_field_model(&parsed.magnet, &parsed.coil, &parsed.array)?,
        run: patterns.run.clone(),
        patterns: PatternParams {
            hold_multiplier: patterns.hold_multiplier,
            boost_start: patterns.boost_start,
            boost_end: patterns.boost_end,
            staircase_starts: patterns.staircase_starts.clone(),
            staircase_width: patterns.staircase_width,
            staircase_level: patterns.staircase_level,
            resonance_floor: patterns.resonance_floor,
        },
        output: JumpOutput {
            directory: parsed.output.directory.clone(),
            summary_json: parsed.output.summary_json.clone(),
            heights_png: parsed.output.heights_png.clone(),
            heights_svg: parsed.output.heights_svg.clone(),
            multipliers_png: parsed.output.multipliers_png.clone(),
            multipliers_svg: parsed.output.multipliers_svg.clone(),
            force_png: parsed.output.force_png.clone(),
            force_svg: parsed.output.force_svg.clone(),
            toggles: parsed.output.toggles.into(),
            csv_fields: parsed.output.csv_fields.clone(),
        },
    })
}

// ---------------------------------------------------------------------------
// Tripulse hover simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TripulseConfigRoot {
    magnet: MagnetSection,
    coil: CoilSection,
    array: ArraySection,
    tripulse: TripulseSection,
    output: SingleOutputSection,
}

#[derive(Debug, Deserialize)]
struct TripulseSection {
    #[serde(default = "default_tone_freqs")]
    tone_freqs: [f64; 3],
    duration: f64,
    dt: f64,
    mass: f64,
    #[serde(default = "default_start_height")]
    hover_height: f64,
    #[serde(default = "default_optimize_currents")]
    optimize_currents: Vec<f64>,
}

fn default_tone_freqs() -> [f64; 3] {
    [5.0, 3.0, 6.0]
}

fn default_optimize_currents() -> Vec<f64> {
    vec![10.0, 15.0, 20.0, 25.0, 30.0]
}

#[derive(Debug, Deserialize)]
struct SingleOutputSection {
    directory: PathBuf,
    #[serde(default = "default_data_csv")]
    data_csv: PathBuf,
    #[serde(default = "default_report_json")]
    report_json: PathBuf,
    #[serde(default = "default_chart_png")]
    chart_png: PathBuf,
    #[serde(default = "default_chart_svg")]
    chart_svg: PathBuf,
    #[serde(default)]
    toggles: TogglesSection,
}

fn default_data_csv() -> PathBuf {
    PathBuf::from("data.csv")
}

fn default_report_json() -> PathBuf {
    PathBuf::from("report.json")
}

fn default_chart_png() -> PathBuf {
    PathBuf::from("chart.png")
}

fn default_chart_svg() -> PathBuf {
    PathBuf::from("chart.svg")
}

/// Generic single-chart artifact set used by the secondary analyses.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub directory: PathBuf,
    pub data_csv: PathBuf,
    pub report_json: PathBuf,
    pub chart_png: PathBuf,
    pub chart_svg: PathBuf,
    pub toggles: OutputToggles,
}

impl From<&SingleOutputSection> for AnalysisOutput {
    fn from(section: &SingleOutputSection) -> Self {
        AnalysisOutput {
            directory: section.directory.clone(),
            data_csv: section.data_csv.clone(),
            report_json: section.report_json.clone(),
            chart_png: section.chart_png.clone(),
            chart_svg: section.chart_svg.clone(),
            toggles: section.toggles.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TripulseConfig {
    pub model: FieldModel,
    pub waveform: TripulseParams,
    pub duration: f64,
    pub dt: f64,
    pub mass: f64,
    pub hover_height: f64,
    pub optimize_currents: Vec<f64>,
    pub output: AnalysisOutput,
}

pub fn load_tripulse(path: impl AsRef<Path>) -> Result<TripulseConfig> {
    let raw = read_config(path.as_ref())?;
    let parsed: TripulseConfigRoot =
        toml::from_str(&raw).context("Failed to parse tripulse configuration")?;

    let section = &parsed.tripulse;
    ensure!(section.duration > 0.0, "Simulation duration must be positive");
    ensure!(section.dt > 0.0, "Time step dt must be positive");
    ensure!(section.mass > 0.0, "Mass must be positive");
    ensure!(section.hover_height > 0.0, "Hover height must be positive");
    ensure!(
        section.tone_freqs.iter().all(|f| *f > 0.0),
        "Tone frequencies must be positive"
    );

    let model = build_field_model(&parsed.magnet, &parsed.coil, &parsed.array)?;
    Ok(TripulseConfig {
        waveform: TripulseParams {
            tone_freqs: section.tone_freqs,
            peak_current: model.coil.peak_current,
            coil_count: model.array.coil_count,
        },
        model,
        duration: section.duration,
        dt: section.dt,
        mass: section.mass,
        hover_height: section.hover_height,
        optimize_currents: section.optimize_currents.clone(),
        output: AnalysisOutput::from(&parsed.output),
    })
}

// ---------------------------------------------------------------------------
// Height/payload envelope analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EnvelopeConfigRoot {
    magnet: MagnetSection,
    coil: CoilSection,
    array: ArraySection,
    envelope: EnvelopeSection,
    #[serde(default)]
    scenario: Vec<ScenarioSection>,
    output: SingleOutputSection,
}

#[derive(Debug, Deserialize)]
struct EnvelopeSection {
    #[serde(default = "default_drive_multiplier")]
    drive_multiplier: f64,
    board_mass: f64,
    #[serde(default = "default_min_height")]
    min_height: f64,
    #[serde(default = "default_max_height")]
    max_height: f64,
    #[serde(default = "default_height_step")]
    height_step: f64,
    #[serde(default = "default_payloads")]
    payloads: Vec<f64>,
}

fn default_drive_multiplier() -> f64 {
    1.0
}

fn default_min_height() -> f64 {
    0.005
}

fn default_max_height() -> f64 {
    0.5
}

fn default_height_step() -> f64 {
    0.005
}

fn default_payloads() -> Vec<f64> {
    vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 120.0]
}

#[derive(Debug, Deserialize)]
struct ScenarioSection {
    name: String,
    drive_multiplier: f64,
    height: f64,
    total_mass: f64,
}

#[derive(Debug, Clone)]
pub struct ScenarioSpec {
    pub name: String,
    pub drive_multiplier: f64,
    pub height: f64,
    pub total_mass: f64,
}

#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    pub model: FieldModel,
    pub envelope: EnvelopeParams,
    pub payloads: Vec<f64>,
    pub scenarios: Vec<ScenarioSpec>,
    pub output: AnalysisOutput,
}

pub fn load_envelope(path: impl AsRef<Path>) -> Result<EnvelopeConfig> {
    let raw = read_config(path.as_ref())?;
    let parsed: EnvelopeConfigRoot =
        toml::from_str(&raw).context("Failed to parse envelope configuration")?;

    let section = &parsed.envelope;
    ensure!(section.board_mass > 0.0, "Board mass must be positive");
    ensure!(section.min_height > 0.0, "Minimum height must be positive");
    ensure!(
        section.max_height > section.min_height,
        "Height scan range must have positive width"
    );
    ensure!(section.height_step > 0.0, "Height step must be positive");
    ensure!(
        (0.0..=1.0).contains(&section.drive_multiplier),
        "Drive multiplier must lie in [0, 1]"
    );
    for scenario in &parsed.scenario {
        ensure!(
            (0.0..=1.0).contains(&scenario.drive_multiplier),
            "Scenario '{}': drive multiplier must lie in [0, 1]",
            scenario.name
        );
        ensure!(
            scenario.height > 0.0 && scenario.total_mass > 0.0,
            "Scenario '{}': height and mass must be positive",
            scenario.name
        );
    }

    Ok(EnvelopeConfig {
        model: build_field_model(&parsed.magnet, &parsed.coil, &parsed.array)?,
        envelope: EnvelopeParams {
            drive_multiplier: section.drive_multiplier,
            board_mass: section.board_mass,
            min_height: section.min_height,
            max_height: section.max_height,
            height_step: section.height_step,
        },
        payloads: section.payloads.clone(),
        scenarios: parsed
            .scenario
            .iter()
            .map(|s| ScenarioSpec {
                name: s.name.clone(),
                drive_multiplier: s.drive_multiplier,
                height: s.height,
                total_mass: s.total_mass,
            })
            .collect(),
        output: AnalysisOutput::from(&parsed.output),
    })
}

// ---------------------------------------------------------------------------
// Current sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SweepConfigRoot {
    magnet: MagnetSection,
    coil: CoilSection,
    array: ArraySection,
    sweep: SweepSection,
    output: SingleOutputSection,
}

#[derive(Debug, Deserialize)]
struct SweepSection {
    start_current: f64,
    end_current: f64,
    #[serde(default = "default_sweep_samples")]
    sample_count: usize,
    hover_height: f64,
    total_mass: f64,
}

fn default_sweep_samples() -> usize {
    400
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub model: FieldModel,
    pub sweep: SweepParams,
    pub output: AnalysisOutput,
}

pub fn load_sweep(path: impl AsRef<Path>) -> Result<SweepConfig> {
    let raw = read_config(path.as_ref())?;
    let parsed: SweepConfigRoot =
        toml::from_str(&raw).context("Failed to parse current-sweep configuration")?;

    let section = &parsed.sweep;
    ensure!(section.start_current >= 0.0, "Start current must be non-negative");
    ensure!(
        section.end_current > section.start_current,
        "Current range must have positive width"
    );
    ensure!(section.sample_count >= 2, "Sweep needs at least two samples");
    ensure!(section.hover_height > 0.0, "Hover height must be positive");
    ensure!(section.total_mass > 0.0, "Total mass must be positive");

    Ok(SweepConfig {
        model: build_field_model(&parsed.magnet, &parsed.coil, &parsed.array)?,
        sweep: SweepParams {
            start_current: section.start_current,
            end_current: section.end_current,
            sample_count: section.sample_count,
            hover_height: section.hover_height,
            total_mass: section.total_mass,
        },
        output: AnalysisOutput::from(&parsed.output),
    })
}

// ---------------------------------------------------------------------------
// Rotating-triangle drive
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RotatingConfigRoot {
    coil: CoilSection,
    drive: DriveSection,
    #[serde(default)]
    inputs: InputsSection,
    output: SingleOutputSection,
}

#[derive(Debug, Deserialize)]
struct DriveSection {
    #[serde(default = "default_coil_count")]
    coil_count: usize,
    #[serde(default = "default_active_coils")]
    active_coils: usize,
    #[serde(default = "default_rotation_rate")]
    rotation_rate: f64,
    hover_current: f64,
    #[serde(default = "default_attitude_gain")]
    attitude_gain: f64,
    duration: f64,
    #[serde(default = "default_unit_scale")]
    unit_scale: f64,
}

fn default_active_coils() -> usize {
    3
}

fn default_rotation_rate() -> f64 {
    111.0
}

fn default_attitude_gain() -> f64 {
    0.3
}

fn default_unit_scale() -> f64 {
    0.125
}

#[derive(Debug, Deserialize)]
struct InputsSection {
    #[serde(default = "default_throttle")]
    throttle: f64,
    #[serde(default)]
    yaw: f64,
    #[serde(default)]
    pitch: f64,
    #[serde(default)]
    roll: f64,
}

impl Default for InputsSection {
    fn default() -> Self {
        Self {
            throttle: default_throttle(),
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}

fn default_throttle() -> f64 {
    0.5
}

#[derive(Debug, Clone)]
pub struct RotatingConfig {
    pub drive: RotatingDriveParams,
    pub inputs: FlightInputs,
    pub coil_turns: u32,
    pub duration: f64,
    /// Meters per normalized layout unit.
    pub unit_scale: f64,
    pub output: AnalysisOutput,
}

pub fn load_rotating(path: impl AsRef<Path>) -> Result<RotatingConfig> {
    let raw = read_config(path.as_ref())?;
    let parsed: RotatingConfigRoot =
        toml::from_str(&raw).context("Failed to parse rotating-drive configuration")?;

    let drive = &parsed.drive;
    ensure!(drive.coil_count == 9, "Rotating drive assumes the nine-coil layout");
    ensure!(
        drive.active_coils > 0 && drive.active_coils <= drive.coil_count,
        "Active coil count must lie in [1, coil_count]"
    );
    ensure!(
        drive.coil_count % drive.active_coils == 0,
        "Coil count must be divisible by the active coil count"
    );
    ensure!(drive.rotation_rate > 0.0, "Rotation rate must be positive");
    ensure!(drive.hover_current > 0.0, "Hover current must be positive");
    ensure!(drive.duration > 0.0, "Drive duration must be positive");
    ensure!(drive.unit_scale > 0.0, "Unit scale must be positive");
    ensure!(parsed.coil.turns > 0, "Coil turn count must be positive");

    Ok(RotatingConfig {
        drive: RotatingDriveParams {
            coil_count: drive.coil_count,
            active_coils: drive.active_coils,
            rotation_rate: drive.rotation_rate,
            hover_current: drive.hover_current,
            attitude_gain: drive.attitude_gain,
        },
        inputs: FlightInputs {
            throttle: parsed.inputs.throttle,
            yaw: parsed.inputs.yaw,
            pitch: parsed.inputs.pitch,
            roll: parsed.inputs.roll,
        }
        .clamped(),
        coil_turns: parsed.coil.turns,
        duration: drive.duration,
        unit_scale: drive.unit_scale,
        output: AnalysisOutput::from(&parsed.output),
    })
}

// ---------------------------------------------------------------------------
// Neural gain controller
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ControllerConfigRoot {
    controller: ControllerSection,
    output: SingleOutputSection,
}

#[derive(Debug, Deserialize)]
struct ControllerSection {
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default = "default_frame_count")]
    frame_count: usize,
    #[serde(default = "default_start_height")]
    min_height: f64,
    #[serde(default = "default_controller_max_height")]
    max_height: f64,
    #[serde(default = "default_frame_power")]
    frame_power: f64,
}

fn default_seed() -> u64 {
    369
}

fn default_frame_count() -> usize {
    32
}

fn default_controller_max_height() -> f64 {
    0.15
}

fn default_frame_power() -> f64 {
    450.0
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub seed: u64,
    pub frame_count: usize,
    pub min_height: f64,
    pub max_height: f64,
    pub frame_power: f64,
    pub output: AnalysisOutput,
}

pub fn load_controller(path: impl AsRef<Path>) -> Result<ControllerConfig> {
    let raw = read_config(path.as_ref())?;
    let parsed: ControllerConfigRoot =
        toml::from_str(&raw).context("Failed to parse controller configuration")?;

    let section = &parsed.controller;
    ensure!(section.frame_count > 0, "Frame count must be positive");
    ensure!(section.min_height > 0.0, "Minimum frame height must be positive");
    ensure!(
        section.max_height > section.min_height,
        "Frame height range must have positive width"
    );

    Ok(ControllerConfig {
        seed: section.seed,
        frame_count: section.frame_count,
        min_height: section.min_height,
        max_height: section.max_height,
        frame_power: section.frame_power,
        output: AnalysisOutput::from(&parsed.output),
    })
}

// ---------------------------------------------------------------------------
// Harmonic-distortion report
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HarmonicsConfigRoot {
    harmonics: HarmonicsSection,
    output: SingleOutputSection,
}

#[derive(Debug, Deserialize)]
struct HarmonicsSection {
    #[serde(default = "default_tone_freqs")]
    tone_freqs: [f64; 3],
    #[serde(default = "default_harmonics_peak_current")]
    peak_current: f64,
    #[serde(default = "default_sample_rate")]
    sample_rate: f64,
    #[serde(default = "default_harmonics_duration")]
    duration: f64,
    #[serde(default = "default_max_order")]
    max_order: usize,
    #[serde(default = "default_thd_limit")]
    thd_limit_pct: f64,
    #[serde(default = "default_harmonic_limit")]
    harmonic_limit_pct: f64,
}

fn default_harmonics_peak_current() -> f64 {
    15.0
}

fn default_sample_rate() -> f64 {
    2048.0
}

fn default_harmonics_duration() -> f64 {
    4.0
}

fn default_max_order() -> usize {
    50
}

fn default_thd_limit() -> f64 {
    8.0
}

fn default_harmonic_limit() -> f64 {
    5.0
}

#[derive(Debug, Clone)]
pub struct HarmonicsConfig {
    pub waveform: TripulseParams,
    pub sample_rate: f64,
    pub duration: f64,
    pub analysis: HarmonicsParams,
    pub output: AnalysisOutput,
}

pub fn load_harmonics(path: impl AsRef<Path>) -> Result<HarmonicsConfig> {
    let raw = read_config(path.as_ref())?;
    let parsed: HarmonicsConfigRoot =
        toml::from_str(&raw).context("Failed to parse harmonics configuration")?;

    let section = &parsed.harmonics;
    ensure!(section.sample_rate > 0.0, "Sample rate must be positive");
    ensure!(section.duration > 0.0, "Capture duration must be positive");
    ensure!(section.max_order >= 2, "Harmonic order must be at least 2");
    ensure!(
        section.tone_freqs.iter().all(|f| *f > 0.0),
        "Tone frequencies must be positive"
    );
    ensure!(
        section.sample_rate > 2.0 * section.tone_freqs.iter().fold(0.0_f64, |a, &b| a.max(b)),
        "Sample rate must exceed twice the highest tone frequency"
    );

    Ok(HarmonicsConfig {
        waveform: TripulseParams {
            tone_freqs: section.tone_freqs,
            peak_current: section.peak_current,
            coil_count: default_coil_count(),
        },
        sample_rate: section.sample_rate,
        duration: section.duration,
        analysis: HarmonicsParams {
            sample_rate: section.sample_rate,
            max_order: section.max_order,
            thd_limit_pct: section.thd_limit_pct,
            harmonic_limit_pct: section.harmonic_limit_pct,
        },
        output: AnalysisOutput::from(&parsed.output),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUMP_TOML: &str = r#"
        [magnet]
        surface_field = 0.05

        [coil]
        turns = 108
        radius = 0.125
        peak_current = 200.0

        [array]
        pad_area = 0.0491

        [simulation]
        duration = 3.0
        dt = 0.001
        mass = 79.4

        [output]
        directory = "out/jump"
    "#;

    #[test]
    fn jump_config_parses_with_defaults() {
        let parsed: JumpConfigRoot = toml::from_str(JUMP_TOML).unwrap();
        assert_eq!(parsed.patterns.run.len(), 4);
        assert_eq!(parsed.simulation.start_height, 0.05);
        assert_eq!(parsed.coil.tones, 3);
        assert_eq!(parsed.array.coil_count, 9);
        assert!(parsed.output.toggles.png);
    }

    #[test]
    fn negative_dt_is_rejected() {
        let toml_text = JUMP_TOML.replace("dt = 0.001", "dt = -0.001");
        let parsed: JumpConfigRoot = toml::from_str(&toml_text).unwrap();
        assert!(parsed.simulation.dt < 0.0);
        // The loader path rejects it.
        let dir = std::env::temp_dir().join("levpad_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad_dt.toml");
        std::fs::write(&path, &toml_text).unwrap();
        let err = load_jump(&path).unwrap_err();
        assert!(err.to_string().contains("dt"));
    }

    #[test]
    fn pattern_names_deserialize_snake_case() {
        let toml_text = JUMP_TOML.replace(
            "[simulation]",
            "[patterns]\nrun = [\"single_boost\", \"tesla_resonance\"]\n\n[simulation]",
        );
        let parsed: JumpConfigRoot = toml::from_str(&toml_text).unwrap();
        assert_eq!(
            parsed.patterns.run,
            vec![PulsePattern::SingleBoost, PulsePattern::TeslaResonance]
        );
    }

    #[test]
    fn sweep_range_must_be_increasing() {
        let toml_text = r#"
            [magnet]
            surface_field = 1.3

            [coil]
            turns = 108
            radius = 0.125
            peak_current = 15.0

            [array]
            pad_area = 0.25

            [sweep]
            start_current = 20.0
            end_current = 10.0
            hover_height = 0.05
            total_mass = 92.0

            [output]
            directory = "out/sweep"
        "#;
        let dir = std::env::temp_dir().join("levpad_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad_sweep.toml");
        std::fs::write(&path, toml_text).unwrap();
        assert!(load_sweep(&path).is_err());
    }
}
