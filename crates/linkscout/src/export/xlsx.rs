// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Spreadsheet export: a `Statistics` sheet, then the flattened `Profiles` sheet.

use super::{csv_columns, flatten};
use crate::model::ProfileRecord;
use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use std::path::Path;

const HEADER_FILL: u32 = 0x366092;
const PROFILE_COLUMN_WIDTH: f64 = 25.0;
const STATS_COLUMN_WIDTH: f64 = 30.0;

/// Metric/value rows of the statistics sheet, below its header row.
pub fn statistics_rows(records: &[&ProfileRecord]) -> Vec<(String, String)> {
    let total = records.len();
    let mut rows = vec![("Total Profiles".to_string(), total.to_string())];
    if total == 0 {
        rows.push(("No profiles to analyze".to_string(), String::new()));
        return rows;
    }

    let share = |n: usize| format!("{n} ({:.1}%)", n as f64 / total as f64 * 100.0);
    let mean = |sum: usize| format!("{:.1}", sum as f64 / total as f64);
    let with_about = records
        .iter()
        .filter(|r| r.about.as_deref().is_some_and(|a| !a.trim().is_empty()))
        .count();
    let with_experience = records.iter().filter(|r| !r.experience.is_empty()).count();
    let with_education = records.iter().filter(|r| !r.education.is_empty()).count();
    let with_skills = records.iter().filter(|r| !r.skills.is_empty()).count();
    let skills: usize = records.iter().map(|r| r.skills.len()).sum();
    let experience: usize = records.iter().map(|r| r.experience.len()).sum();

    rows.extend([
        ("Profiles with About".to_string(), share(with_about)),
        ("Profiles with Experience".to_string(), share(with_experience)),
        ("Profiles with Education".to_string(), share(with_education)),
        ("Profiles with Skills".to_string(), share(with_skills)),
        ("Average Skills per Profile".to_string(), mean(skills)),
        ("Average Experience Entries".to_string(), mean(experience)),
    ]);
    rows
}

/// Write `records` as a two-sheet workbook.
pub fn write_xlsx(records: &[&ProfileRecord], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL));
    let cell = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    let stats = workbook.add_worksheet();
    stats.set_name("Statistics")?;
    stats.write_string_with_format(0, 0, "Metric", &bold)?;
    stats.write_string_with_format(0, 1, "Value", &bold)?;
    for (i, (metric, value)) in statistics_rows(records).into_iter().enumerate() {
        let row = i as u32 + 1;
        stats.write_string_with_format(row, 0, metric, &bold)?;
        stats.write_string(row, 1, value)?;
    }
    stats.set_column_width(0, STATS_COLUMN_WIDTH)?;
    stats.set_column_width(1, STATS_COLUMN_WIDTH)?;

    let profiles = workbook.add_worksheet();
    profiles.set_name("Profiles")?;
    let columns = csv_columns();
    for (col, name) in columns.iter().enumerate() {
        profiles.write_string_with_format(0, col as u16, name, &header)?;
        profiles.set_column_width(col as u16, PROFILE_COLUMN_WIDTH)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, value) in flatten(record).into_iter().enumerate() {
            profiles.write_string_with_format(row, col as u16, value, &cell)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
