use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::jump::JumpSample;

pub fn resolve_path(base: &Path, relative: &Path) -> PathBuf {
    if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        base.join(relative)
    }
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create output directory {}", path.display()))?;
    }
    Ok(())
}

/// Write the pulse-jump time series with the configured field selection.
pub fn write_jump_csv(path: &Path, samples: &[JumpSample], fields: &[String]) -> Result<()> {
    let fields = parse_sample_fields(fields)?;
    if fields.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Unable to create CSV file {}", path.display()))?;

    writer.write_record(fields.iter().map(|field| field.header()))?;
    for sample in samples {
        let row: Vec<String> = fields.iter().map(|field| field.format(sample)).collect();
        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write sample at t={:.6}", sample.time))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV writer for {}", path.display()))
}

/// Write a tabular artifact whose rows are already formatted strings.
pub fn write_table_csv(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Unable to create CSV file {}", path.display()))?;

    writer.write_record(headers)?;
    for row in rows {
        if row.len() != headers.len() {
            return Err(anyhow!(
                "CSV row width {} does not match header width {}",
                row.len(),
                headers.len()
            ));
        }
        writer.write_record(row)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV writer for {}", path.display()))
}

/// Serialize any report structure as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let file = File::create(path)
        .with_context(|| format!("Unable to create JSON file {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("Failed to write JSON payload to {}", path.display()))
}

pub fn format_value(value: f64) -> String {
    format!("{:.12e}", value)
}

#[derive(Debug, Clone, Copy)]
enum SampleField {
    Time,
    Height,
    Velocity,
    NetForce,
    Multiplier,
}

impl SampleField {
    fn from_str(field: &str) -> Option<Self> {
        match field {
            "time" => Some(Self::Time),
            "height" => Some(Self::Height),
            "velocity" => Some(Self::Velocity),
            "net_force" => Some(Self::NetForce),
            "multiplier" => Some(Self::Multiplier),
            _ => None,
        }
    }

    fn header(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Height => "height",
            Self::Velocity => "velocity",
            Self::NetForce => "net_force",
            Self::Multiplier => "multiplier",
        }
    }

    fn value(&self, sample: &JumpSample) -> f64 {
        match self {
            Self::Time => sample.time,
            Self::Height => sample.height,
            Self::Velocity => sample.velocity,
            Self::NetForce => sample.net_force,
            Self::Multiplier => sample.multiplier,
        }
    }

    fn format(&self, sample: &JumpSample) -> String {
        format_value(self.value(sample))
    }
}

fn parse_sample_fields(fields: &[String]) -> Result<Vec<SampleField>> {
    let mut parsed = Vec::with_capacity(fields.len());
    for field in fields {
        let trimmed = field.trim();
        let sample_field = SampleField::from_str(trimmed)
            .ok_or_else(|| anyhow!("Unsupported sample field '{}' in export config", trimmed))?;
        parsed.push(sample_field);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sample_field_is_rejected() {
        let fields = vec!["time".to_string(), "altitude".to_string()];
        assert!(parse_sample_fields(&fields).is_err());
    }

    #[test]
    fn all_sample_fields_round_trip_through_names() {
        for name in ["time", "height", "velocity", "net_force", "multiplier"] {
            let field = SampleField::from_str(name).unwrap();
            assert_eq!(field.header(), name);
        }
    }

    #[test]
    fn table_rows_must_match_header_width() {
        let dir = std::env::temp_dir().join("levpad_output_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad_table.csv");
        let rows = vec![vec!["1".to_string()]];
        assert!(write_table_csv(&path, &["a", "b"], &rows).is_err());
    }

    #[test]
    fn relative_paths_resolve_under_the_directory() {
        let base = Path::new("out/jump");
        let resolved = resolve_path(base, Path::new("summary.json"));
        assert_eq!(resolved, PathBuf::from("out/jump/summary.json"));
        let absolute = resolve_path(base, Path::new("/tmp/summary.json"));
        assert_eq!(absolute, PathBuf::from("/tmp/summary.json"));
    }
}
