use std::collections::HashSet;
use std::io::Read;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

use crate::models::NewStudent;

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "lrn",
    "sy",
    "name",
    "gender",
    "address",
    "guardian",
    "elementary",
];

#[derive(Debug, Default, Clone, Deserialize)]
pub struct StudentCsvRow {
    #[serde(default)]
    pub lrn: Option<String>,
    #[serde(default)]
    pub sy: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub guardian: Option<String>,
    #[serde(default)]
    pub elementary: Option<String>,
}

impl StudentCsvRow {
    fn column(&self, name: &str) -> Option<&str> {
        let value = match name {
            "lrn" => &self.lrn,
            "sy" => &self.sy,
            "name" => &self.name,
            "gender" => &self.gender,
            "address" => &self.address,
            "guardian" => &self.guardian,
            "elementary" => &self.elementary,
            _ => return None,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Row {row}: Missing fields - {}", .fields.join(", ").to_uppercase())]
    MissingFields { row: usize, fields: Vec<&'static str> },
    #[error("Row {row}: Duplicate LRN - {lrn}")]
    DuplicateLrn { row: usize, lrn: String },
}

#[derive(Debug, Error)]
#[error("import rejected, nothing was inserted:\n{}", render_errors(.0))]
pub struct ImportRejected(pub Vec<RowError>);

fn render_errors(errors: &[RowError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads student rows, matching headers case-insensitively and ignoring surrounding spaces.
pub fn read_student_csv<R: Read>(source: R) -> anyhow::Result<Vec<StudentCsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers: csv::StringRecord = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(|header| header.trim().to_lowercase())
        .collect();
    reader.set_headers(headers);

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<StudentCsvRow>().enumerate() {
        rows.push(record.with_context(|| format!("malformed CSV row {}", index + 2))?);
    }

    Ok(rows)
}

/// All-or-nothing: any bad row rejects the whole batch with every problem listed.
pub fn validate_students(
    rows: &[StudentCsvRow],
    existing_lrns: &HashSet<String>,
) -> Result<Vec<NewStudent>, ImportRejected> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut students = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 2;
        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|c| row.column(c).is_none())
            .collect();

        if !missing.is_empty() {
            errors.push(RowError::MissingFields {
                row: row_number,
                fields: missing,
            });
            continue;
        }

        let field = |name: &str| row.column(name).unwrap_or_default().to_string();
        let lrn = row.column("lrn").unwrap_or_default();
        if existing_lrns.contains(lrn) || !seen.insert(lrn) {
            errors.push(RowError::DuplicateLrn {
                row: row_number,
                lrn: lrn.to_string(),
            });
            continue;
        }

        students.push(NewStudent {
            lrn: field("lrn"),
            sy: field("sy"),
            name: field("name"),
            gender: field("gender"),
            address: field("address"),
            guardian: field("guardian"),
            elementary: field("elementary"),
        });
    }

    if errors.is_empty() {
        Ok(students)
    } else {
        Err(ImportRejected(errors))
    }
}
