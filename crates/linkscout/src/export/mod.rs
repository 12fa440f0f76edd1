// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Export of scraped records as a JSON document, a flattened CSV table, and
//! a spreadsheet workbook.

pub mod csv;
pub mod xlsx;

use crate::model::{ContactInfo, ProfileRecord, CONTACT_CATEGORIES, NOT_AVAILABLE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Separator between values of one contact category in the CSV.
pub const CONTACT_SEPARATOR: &str = " | ";
const ABOUT_CELL_CHARS: usize = 500;

/// Output document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(format!("unsupported export format: {other}")),
        }
    }
}

/// Flattened CSV columns, in order.
pub fn csv_columns() -> Vec<String> {
    let mut cols: Vec<String> = ["profile_url", "name", "headline", "location", "about"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    cols.extend(CONTACT_CATEGORIES.iter().map(|c| format!("contact_{c}")));
    cols.extend(
        [
            "contact_linkedin_url",
            "experience_titles",
            "total_experience_entries",
            "education_schools",
            "total_education_entries",
            "skills",
            "total_skills",
            "certifications",
            "total_certifications",
            "languages",
            "total_languages",
            "completeness",
            "scraped_at",
            "extraction_method",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    cols
}

/// Real values joined by [`CONTACT_SEPARATOR`], or `N/A`.
///
/// Never truncated: [`split_contact_cell`] must get every value back.
pub fn contact_cell(values: &[String]) -> String {
    let joined = ContactInfo::values(values)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(CONTACT_SEPARATOR);
    if joined.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        joined
    }
}

/// Split a contact cell back into its values.
pub fn split_contact_cell(cell: &str) -> Vec<String> {
    cell.split(CONTACT_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != NOT_AVAILABLE)
        .map(str::to_string)
        .collect()
}

fn join_some<'a>(values: impl Iterator<Item = Option<&'a String>>) -> String {
    values
        .map(|v| v.map(String::as_str).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(CONTACT_SEPARATOR)
}

/// One CSV row in [`csv_columns`] order.
pub fn flatten(record: &ProfileRecord) -> Vec<String> {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let mut row = vec![
        record.profile_url.clone(),
        text(&record.name),
        text(&record.headline),
        text(&record.location),
        record
            .about
            .as_deref()
            .map(|a| a.chars().take(ABOUT_CELL_CHARS).collect())
            .unwrap_or_default(),
    ];

    let contact = record.contact_info.clone().unwrap_or_default();
    row.extend(contact.categories().iter().map(|(_, values)| contact_cell(values)));
    row.push(if contact.linkedin_url.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        contact.linkedin_url.clone()
    });

    row.push(join_some(record.experience.iter().take(3).map(|e| e.title.as_ref())));
    row.push(record.experience.len().to_string());
    row.push(join_some(record.education.iter().take(2).map(|e| e.school.as_ref())));
    row.push(record.education.len().to_string());
    row.push(record.skills.iter().take(10).cloned().collect::<Vec<_>>().join(", "));
    row.push(record.skills.len().to_string());
    row.push(join_some(record.certifications.iter().take(3).map(|c| c.name.as_ref())));
    row.push(record.certifications.len().to_string());
    row.push(record.languages.join(", "));
    row.push(record.languages.len().to_string());
    row.push(record.completeness.to_string());
    row.push(record.scraped_at.to_rfc3339());
    row.push(record.extraction_method.clone());
    row
}

/// Records at or above `min_completeness`.
pub fn filter_complete(records: &[ProfileRecord], min_completeness: u8) -> Vec<&ProfileRecord> {
    records.iter().filter(|r| r.completeness >= min_completeness).collect()
}

/// Write `records` as a pretty-printed JSON array.
pub fn write_json(records: &[&ProfileRecord], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, records).context("failed to serialize profiles")?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}

/// Write `records` as a flattened CSV table with a header row.
pub fn write_csv(records: &[&ProfileRecord], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    csv::write_row(&mut w, &csv_columns())?;
    for record in records {
        csv::write_row(&mut w, &flatten(record))?;
    }
    w.flush()?;
    Ok(())
}

/// Read a CSV written by [`write_csv`] into header-keyed rows.
pub fn read_csv(path: &Path) -> Result<Vec<HashMap<String, String>>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut rows = csv::parse_rows(&text).into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    Ok(rows
        .map(|row| header.iter().cloned().zip(row).collect::<HashMap<_, _>>())
        .collect())
}

/// Writes export documents into one directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one document per format for records at or above
    /// `min_completeness`, named `{stem}.{ext}`. Returns the written paths.
    ///
    /// A failing format is logged and does not stop the others.
    pub fn export(
        &self,
        records: &[ProfileRecord],
        min_completeness: u8,
        formats: &[ExportFormat],
        stem: &str,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create export dir {}", self.dir.display()))?;
        let selected = filter_complete(records, min_completeness);
        if selected.is_empty() {
            warn!(min_completeness, "no profiles to export");
            return Ok(Vec::new());
        }

        let mut written = Vec::new();
        for format in formats {
            let path = self.dir.join(format!("{stem}.{}", format.extension()));
            let result = match format {
                ExportFormat::Json => write_json(&selected, &path),
                ExportFormat::Csv => write_csv(&selected, &path),
                ExportFormat::Xlsx => xlsx::write_xlsx(&selected, &path),
            };
            match result {
                Ok(()) => {
                    info!(path = %path.display(), profiles = selected.len(), "exported");
                    written.push(path);
                }
                Err(e) => warn!(format = format.extension(), error = %e, "export failed"),
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExperienceEntry;
    use std::collections::BTreeSet;

    fn record(url: &str, completeness: u8) -> ProfileRecord {
        let mut r = ProfileRecord::new(url);
        r.name = Some("Jane Doe".into());
        r.completeness = completeness;
        r
    }

    #[test]
    fn test_contact_cell() {
        assert_eq!(contact_cell(&["N/A".to_string()]), "N/A");
        assert_eq!(contact_cell(&[]), "N/A");
        assert_eq!(contact_cell(&["a@x.io".into(), "b@y.io".into()]), "a@x.io | b@y.io");
        let long: Vec<String> = (0..50).map(|i| format!("user{i}@example.com")).collect();
        assert_eq!(split_contact_cell(&contact_cell(&long)), long);
    }

    #[test]
    fn test_flatten_shape() {
        let mut r = record("https://www.linkedin.com/in/jane", 71);
        r.experience = vec![
            ExperienceEntry {
                title: Some("Staff Engineer".into()),
                ..Default::default()
            },
            ExperienceEntry::default(),
        ];
        r.skills = vec!["Rust".into(), "Kafka".into()];
        let row = flatten(&r);
        let cols = csv_columns();
        assert_eq!(row.len(), cols.len());
        let cell = |name: &str| row[cols.iter().position(|c| c == name).unwrap()].clone();
        assert_eq!(cell("contact_emails"), "N/A");
        assert_eq!(cell("contact_linkedin_url"), "N/A");
        assert_eq!(cell("experience_titles"), "Staff Engineer | ");
        assert_eq!(cell("total_experience_entries"), "2");
        assert_eq!(cell("skills"), "Rust, Kafka");
        assert_eq!(cell("completeness"), "71");
    }

    #[test]
    fn test_export_filters_and_writes_both() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("exports"));
        let records = vec![record("https://www.linkedin.com/in/a", 80), record("https://www.linkedin.com/in/b", 20)];
        let paths = exporter
            .export(&records, 50, &[ExportFormat::Json, ExportFormat::Csv], "profiles")
            .unwrap();
        assert_eq!(paths.len(), 2);

        let json: Vec<ProfileRecord> = serde_json::from_str(&std::fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(json.len(), 1);
        assert_eq!(json[0].profile_url, "https://www.linkedin.com/in/a");
        assert_eq!(read_csv(&paths[1]).unwrap().len(), 1);

        assert!(exporter.export(&records, 95, &[ExportFormat::Json], "none").unwrap().is_empty());
    }

    #[test]
    fn test_csv_round_trip_keeps_contact_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.csv");
        let mut r = record("https://www.linkedin.com/in/jane", 60);
        let mut contact = ContactInfo::default();
        contact.set("emails", vec!["jane@acme.com".into(), "j.doe@mail.org".into()]);
        contact.set("phones", vec!["+1 415 555 0100".into()]);
        contact.set("websites", vec!["jane.dev, blog".into()]);
        r.contact_info = Some(contact.clone());
        write_csv(&[&r], &path).unwrap();

        let rows = read_csv(&path).unwrap();
        assert_eq!(rows.len(), 1);
        for (category, values) in contact.categories() {
            let expected: BTreeSet<String> = ContactInfo::values(values).cloned().collect();
            let actual: BTreeSet<String> = split_contact_cell(&rows[0][&format!("contact_{category}")])
                .into_iter()
                .collect();
            assert_eq!(actual, expected, "{category}");
        }
    }

    #[test]
    fn test_csv_round_trip_keeps_long_contact_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.csv");
        let emails: Vec<String> = (0..12).map(|i| format!("person{i}@example-company.com")).collect();
        let mut r = record("https://www.linkedin.com/in/jane", 60);
        let mut contact = ContactInfo::default();
        contact.set("emails", emails.clone());
        r.contact_info = Some(contact);
        write_csv(&[&r], &path).unwrap();

        let rows = read_csv(&path).unwrap();
        let actual: BTreeSet<String> = split_contact_cell(&rows[0]["contact_emails"]).into_iter().collect();
        assert_eq!(actual, emails.into_iter().collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_export_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path());
        let paths = exporter
            .export(&[record("https://www.linkedin.com/in/a", 80)], 0, &[ExportFormat::Xlsx], "profiles")
            .unwrap();
        assert_eq!(paths, vec![dir.path().join("profiles.xlsx")]);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("Excel".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("xls".parse::<ExportFormat>().is_err());
    }
}
