use chrono::{DateTime, Utc};
use keylevels_engine::{Analysis, KeyLevel, KeyLevelRecord, Metadata};
use serde::Serialize;
use smol_str::SmolStr;
use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Distance (percent) beyond which a level is marked as above or below spot.
const DISTANCE_MARK_PCT: f64 = 2.0;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialise report: {0}")]
    Serialise(#[from] serde_json::Error),

    #[error("failed to write report {path}: {error}")]
    Write {
        path: PathBuf,
        error: std::io::Error,
    },
}

/// JSON export of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportExport<'a> {
    pub currency: SmolStr,
    pub spot_price: f64,
    pub generated_at: DateTime<Utc>,
    pub levels: Vec<KeyLevelRecord>,
    pub metadata: &'a Metadata,
}

impl<'a> ReportExport<'a> {
    pub fn new(analysis: &'a Analysis, generated_at: DateTime<Utc>) -> Self {
        Self {
            currency: analysis.metadata.currency.clone(),
            spot_price: analysis.metadata.spot_price,
            generated_at,
            levels: analysis.levels.iter().map(KeyLevel::to_record).collect(),
            metadata: &analysis.metadata,
        }
    }
}

/// Write a pretty printed JSON export into `dir`, returning the file path.
pub fn write_json(
    dir: &Path,
    analysis: &Analysis,
    generated_at: DateTime<Utc>,
) -> Result<PathBuf, ReportError> {
    let export = ReportExport::new(analysis, generated_at);
    let json = serde_json::to_string_pretty(&export)?;

    let path = dir.join(format!(
        "key_levels_{}_{}.json",
        export.currency.to_lowercase(),
        generated_at.format("%Y%m%d_%H%M%S")
    ));

    std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&path, json))
        .map_err(|error| ReportError::Write {
            path: path.clone(),
            error,
        })?;

    Ok(path)
}

/// Console table of the ranked levels followed by put/call ratios.
pub fn render_table(analysis: &Analysis) -> String {
    let metadata = &analysis.metadata;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} spot ${}",
        metadata.currency,
        format_usd(metadata.spot_price)
    );
    let _ = writeln!(
        out,
        "{:<25} {:>15} {:>12}  {}",
        "Key Level", "Value", "Distance", "Confidence"
    );
    let _ = writeln!(out, "{}", "-".repeat(70));

    for level in &analysis.levels {
        let _ = writeln!(
            out,
            "{:<25} {:>15} {:>12}  {}",
            level.name,
            format!("${}", format_usd(level.price)),
            format_distance(level.distance_pct),
            confidence_bar(level.confidence)
        );
    }

    let _ = writeln!(out, "\nPut/Call Ratios (higher = more bearish):");
    for (timeframe, ratio) in metadata.put_call_ratios.iter() {
        let _ = writeln!(out, "   {timeframe}: {ratio:.2}");
    }

    out
}

/// eg/ `▲ +4.17%`, `▼ -2.50%`, `• +0.31%`.
fn format_distance(distance_pct: f64) -> String {
    let marker = if distance_pct > DISTANCE_MARK_PCT {
        '▲'
    } else if distance_pct < -DISTANCE_MARK_PCT {
        '▼'
    } else {
        '•'
    };
    format!("{marker} {distance_pct:+.2}%")
}

/// One block per eighth of confidence, at least one block.
fn confidence_bar(confidence: f64) -> String {
    let blocks = ((confidence * 8.0) as usize).max(1);
    "█".repeat(blocks)
}

/// Two decimal places with thousands separators, eg/ `98,120.50`.
fn format_usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (integer, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
