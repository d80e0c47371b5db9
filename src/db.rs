use std::collections::HashSet;

use anyhow::{bail, Context};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::import;
use crate::level;
use crate::models::{
    AssessmentLevels, AssessmentRecord, AssessmentScores, NewStudent, RosterEntry, StudentRecord,
    DEFAULT_INTERVENTION,
};
use crate::summary::SummaryRow;

const ASSESSMENT_COLUMNS: &str = "a.lrn, a.name, a.grade_section, a.school_year, \
     a.fil_oral_pre_score, a.fil_oral_pre_level, a.fil_comp_pre_score, a.fil_comp_pre_level, \
     a.fil_oral_post_score, a.fil_oral_post_level, a.fil_comp_post_score, a.fil_comp_post_level, \
     a.eng_oral_pre_score, a.eng_oral_pre_level, a.eng_comp_pre_score, a.eng_comp_pre_level, \
     a.eng_oral_post_score, a.eng_oral_post_level, a.eng_comp_post_score, a.eng_comp_post_level, \
     a.numeracy_pre_score, a.numeracy_pre_level, a.numeracy_post_score, a.numeracy_post_level, \
     a.intervention, a.updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = [
        ("136728140001", "Dela Cruz, Juan", "Male", "Poblacion 1", "Maria Dela Cruz", "Maragondon Elementary School"),
        ("136728140002", "Santos, Ana Marie", "Female", "Bucal", "Jose Santos", "Pinagsanhan Elementary School"),
        ("136728140003", "Reyes, Mark Anthony", "Male", "Caingin", "Liza Reyes", "Maragondon Elementary School"),
        ("136728140004", "Garcia, Kristine", "Female", "Talipusngo", "Ramon Garcia", "Layong Mabilog Elementary School"),
        ("136728140005", "Villanueva, Paolo", "Male", "Mabato", "Elena Villanueva", "Bucal Elementary School"),
        ("136728140006", "Mendoza, Jasmine", "Female", "Pantihan 2", "Arnel Mendoza", "Pantihan Elementary School"),
    ];

    for (lrn, name, gender, address, guardian, elementary) in students {
        sqlx::query(
            r#"
            INSERT INTO school_records.students
            (id, lrn, sy, name, gender, address, guardian, elementary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (lrn) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lrn)
        .bind("2025-2026")
        .bind(name)
        .bind(gender)
        .bind(address)
        .bind(guardian)
        .bind(elementary)
        .execute(pool)
        .await?;
    }

    let sheets: [(&str, &str, &str, [u8; 10]); 6] = [
        ("136728140001", "Dela Cruz, Juan", "Grade 7 - Dahlia", [85, 14, 92, 22, 80, 12, 88, 17, 5, 15]),
        ("136728140002", "Santos, Ana Marie", "Grade 7 - Sampaguita", [93, 20, 98, 30, 91, 18, 97, 29, 12, 28]),
        ("136728140003", "Reyes, Mark Anthony", "Grade 8 - Atis", [78, 10, 86, 16, 70, 8, 82, 14, 20, 35]),
        ("136728140004", "Garcia, Kristine", "Grade 9 - Luna", [97, 28, 99, 31, 95, 26, 98, 30, 58, 66]),
        ("136728140005", "Villanueva, Paolo", "Grade 10 - Rizal", [88, 15, 94, 24, 86, 13, 90, 21, 30, 62]),
        ("136728140006", "Mendoza, Jasmine", "Grade 10 - Bonifacio", [96, 27, 100, 33, 92, 25, 97, 28, 60, 70]),
    ];

    for (lrn, name, grade_section, raw) in sheets {
        let scores = AssessmentScores {
            fil_oral_pre: Some(raw[0]),
            fil_comp_pre: Some(raw[1]),
            fil_oral_post: Some(raw[2]),
            fil_comp_post: Some(raw[3]),
            eng_oral_pre: Some(raw[4]),
            eng_comp_pre: Some(raw[5]),
            eng_oral_post: Some(raw[6]),
            eng_comp_post: Some(raw[7]),
            numeracy_pre: Some(raw[8]),
            numeracy_post: Some(raw[9]),
        };
        let (grade, _) = crate::models::split_grade_section(grade_section);
        let record = AssessmentRecord {
            lrn: lrn.to_string(),
            name: name.to_string(),
            school_year: "2025-2026".to_string(),
            grade_section: grade_section.to_string(),
            levels: level::classify_sheet(&scores, Some(grade)),
            scores,
            intervention: DEFAULT_INTERVENTION.to_string(),
            updated_at: None,
        };
        upsert_assessment(pool, &record).await?;
    }

    Ok(())
}

fn student_from_row(row: &PgRow) -> anyhow::Result<StudentRecord> {
    Ok(StudentRecord {
        id: row.try_get("id")?,
        lrn: row.try_get("lrn")?,
        name: row.try_get("name")?,
        gender: row.try_get("gender")?,
        address: row.try_get("address")?,
        guardian: row.try_get("guardian")?,
        elementary: row.try_get("elementary")?,
        sy: row.try_get("sy")?,
    })
}

/// Rows written by other tools may hold anything; pin them to the scored range.
fn score(row: &PgRow, column: &str) -> anyhow::Result<Option<u8>> {
    let value: Option<i32> = row.try_get(column)?;
    Ok(value.map(|v| v.clamp(0, i32::from(level::MAX_SCORE)) as u8))
}

fn assessment_from_row(row: &PgRow) -> anyhow::Result<AssessmentRecord> {
    let scores = AssessmentScores {
        fil_oral_pre: score(row, "fil_oral_pre_score")?,
        fil_comp_pre: score(row, "fil_comp_pre_score")?,
        fil_oral_post: score(row, "fil_oral_post_score")?,
        fil_comp_post: score(row, "fil_comp_post_score")?,
        eng_oral_pre: score(row, "eng_oral_pre_score")?,
        eng_comp_pre: score(row, "eng_comp_pre_score")?,
        eng_oral_post: score(row, "eng_oral_post_score")?,
        eng_comp_post: score(row, "eng_comp_post_score")?,
        numeracy_pre: score(row, "numeracy_pre_score")?,
        numeracy_post: score(row, "numeracy_post_score")?,
    };
    let levels = AssessmentLevels {
        fil_oral_pre: row.try_get("fil_oral_pre_level")?,
        fil_comp_pre: row.try_get("fil_comp_pre_level")?,
        fil_oral_post: row.try_get("fil_oral_post_level")?,
        fil_comp_post: row.try_get("fil_comp_post_level")?,
        eng_oral_pre: row.try_get("eng_oral_pre_level")?,
        eng_comp_pre: row.try_get("eng_comp_pre_level")?,
        eng_oral_post: row.try_get("eng_oral_post_level")?,
        eng_comp_post: row.try_get("eng_comp_post_level")?,
        numeracy_pre: row.try_get("numeracy_pre_level")?,
        numeracy_post: row.try_get("numeracy_post_level")?,
    };

    Ok(AssessmentRecord {
        lrn: row.try_get("lrn")?,
        name: row.try_get("name")?,
        school_year: row.try_get("school_year")?,
        grade_section: row.try_get("grade_section")?,
        scores,
        levels,
        intervention: row.try_get("intervention")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn insert_student(pool: &PgPool, student: &NewStudent) -> anyhow::Result<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO school_records.students
        (id, lrn, sy, name, gender, address, guardian, elementary)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (lrn) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&student.lrn)
    .bind(&student.sy)
    .bind(&student.name)
    .bind(&student.gender)
    .bind(&student.address)
    .bind(&student.guardian)
    .bind(&student.elementary)
    .execute(pool)
    .await
    .context("failed to insert student")?;

    if result.rows_affected() == 0 {
        bail!("Student with LRN {} already exists.", student.lrn);
    }

    info!(lrn = %student.lrn, "student inserted");
    Ok(())
}

/// `%`, `_` and `\` in user input match literally under `ILIKE`.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Newest first; `search` matches an LRN substring case-insensitively.
pub async fn list_students(pool: &PgPool, search: Option<&str>) -> anyhow::Result<Vec<StudentRecord>> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);

    let rows = sqlx::query(
        r#"
        SELECT id, lrn, sy, name, gender, address, guardian, elementary
        FROM school_records.students
        WHERE $1::TEXT IS NULL OR lrn ILIKE $1 ESCAPE '\'
        ORDER BY created_at DESC, lrn DESC
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
    .context("failed to fetch students")?;

    rows.iter().map(student_from_row).collect()
}

pub async fn fetch_student(pool: &PgPool, lrn: &str) -> anyhow::Result<Option<StudentRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, lrn, sy, name, gender, address, guardian, elementary
        FROM school_records.students
        WHERE lrn = $1
        "#,
    )
    .bind(lrn)
    .fetch_optional(pool)
    .await
    .context("failed to fetch student")?;

    row.as_ref().map(student_from_row).transpose()
}

/// Assessments for the student go with it.
pub async fn delete_student(pool: &PgPool, lrn: &str) -> anyhow::Result<()> {
    let result = sqlx::query("DELETE FROM school_records.students WHERE lrn = $1")
        .bind(lrn)
        .execute(pool)
        .await
        .context("failed to delete student")?;

    if result.rows_affected() == 0 {
        bail!("Student not found.");
    }

    info!(%lrn, "student deleted");
    Ok(())
}

pub async fn existing_lrns(pool: &PgPool) -> anyhow::Result<HashSet<String>> {
    let rows = sqlx::query("SELECT lrn FROM school_records.students")
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| row.try_get::<String, _>("lrn").map_err(Into::into))
        .collect()
}

pub async fn import_students(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = import::read_student_csv(file)?;
    let existing = existing_lrns(pool).await?;
    let students = import::validate_students(&rows, &existing)?;

    let mut tx = pool.begin().await?;
    for student in &students {
        sqlx::query(
            r#"
            INSERT INTO school_records.students
            (id, lrn, sy, name, gender, address, guardian, elementary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&student.lrn)
        .bind(&student.sy)
        .bind(&student.name)
        .bind(&student.gender)
        .bind(&student.address)
        .bind(&student.guardian)
        .bind(&student.elementary)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("LRN {}: insert failed", student.lrn))?;
    }
    tx.commit().await?;

    Ok(students.len())
}

fn bind_score(score: Option<u8>) -> Option<i32> {
    score.map(i32::from)
}

/// Insert or update the sheet for (lrn, school_year), refreshing `updated_at`.
pub async fn upsert_assessment(
    pool: &PgPool,
    record: &AssessmentRecord,
) -> anyhow::Result<UpsertOutcome> {
    let scores = &record.scores;
    let levels = &record.levels;

    let row = sqlx::query(
        r#"
        INSERT INTO school_records.assessments (
            id, lrn, name, grade_section, school_year,
            fil_oral_pre_score, fil_oral_pre_level, fil_comp_pre_score, fil_comp_pre_level,
            fil_oral_post_score, fil_oral_post_level, fil_comp_post_score, fil_comp_post_level,
            eng_oral_pre_score, eng_oral_pre_level, eng_comp_pre_score, eng_comp_pre_level,
            eng_oral_post_score, eng_oral_post_level, eng_comp_post_score, eng_comp_post_level,
            numeracy_pre_score, numeracy_pre_level, numeracy_post_score, numeracy_post_level,
            intervention, updated_at
        )
        VALUES (
            $1, $2, $3, $4, $5,
            $6, $7, $8, $9,
            $10, $11, $12, $13,
            $14, $15, $16, $17,
            $18, $19, $20, $21,
            $22, $23, $24, $25,
            $26, now()
        )
        ON CONFLICT (lrn, school_year) DO UPDATE SET
            name = EXCLUDED.name,
            grade_section = EXCLUDED.grade_section,
            fil_oral_pre_score = EXCLUDED.fil_oral_pre_score,
            fil_oral_pre_level = EXCLUDED.fil_oral_pre_level,
            fil_comp_pre_score = EXCLUDED.fil_comp_pre_score,
            fil_comp_pre_level = EXCLUDED.fil_comp_pre_level,
            fil_oral_post_score = EXCLUDED.fil_oral_post_score,
            fil_oral_post_level = EXCLUDED.fil_oral_post_level,
            fil_comp_post_score = EXCLUDED.fil_comp_post_score,
            fil_comp_post_level = EXCLUDED.fil_comp_post_level,
            eng_oral_pre_score = EXCLUDED.eng_oral_pre_score,
            eng_oral_pre_level = EXCLUDED.eng_oral_pre_level,
            eng_comp_pre_score = EXCLUDED.eng_comp_pre_score,
            eng_comp_pre_level = EXCLUDED.eng_comp_pre_level,
            eng_oral_post_score = EXCLUDED.eng_oral_post_score,
            eng_oral_post_level = EXCLUDED.eng_oral_post_level,
            eng_comp_post_score = EXCLUDED.eng_comp_post_score,
            eng_comp_post_level = EXCLUDED.eng_comp_post_level,
            numeracy_pre_score = EXCLUDED.numeracy_pre_score,
            numeracy_pre_level = EXCLUDED.numeracy_pre_level,
            numeracy_post_score = EXCLUDED.numeracy_post_score,
            numeracy_post_level = EXCLUDED.numeracy_post_level,
            intervention = EXCLUDED.intervention,
            updated_at = now()
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&record.lrn)
    .bind(&record.name)
    .bind(&record.grade_section)
    .bind(&record.school_year)
    .bind(bind_score(scores.fil_oral_pre))
    .bind(&levels.fil_oral_pre)
    .bind(bind_score(scores.fil_comp_pre))
    .bind(&levels.fil_comp_pre)
    .bind(bind_score(scores.fil_oral_post))
    .bind(&levels.fil_oral_post)
    .bind(bind_score(scores.fil_comp_post))
    .bind(&levels.fil_comp_post)
    .bind(bind_score(scores.eng_oral_pre))
    .bind(&levels.eng_oral_pre)
    .bind(bind_score(scores.eng_comp_pre))
    .bind(&levels.eng_comp_pre)
    .bind(bind_score(scores.eng_oral_post))
    .bind(&levels.eng_oral_post)
    .bind(bind_score(scores.eng_comp_post))
    .bind(&levels.eng_comp_post)
    .bind(bind_score(scores.numeracy_pre))
    .bind(&levels.numeracy_pre)
    .bind(bind_score(scores.numeracy_post))
    .bind(&levels.numeracy_post)
    .bind(&record.intervention)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to save assessment for LRN {}", record.lrn))?;

    let inserted: bool = row.try_get("inserted")?;
    let outcome = if inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    };
    debug!(lrn = %record.lrn, school_year = %record.school_year, ?outcome, "assessment saved");
    Ok(outcome)
}

/// Every student, with their assessment for `school_year` when one exists. Ordered by name.
pub async fn fetch_roster(pool: &PgPool, school_year: &str) -> anyhow::Result<Vec<RosterEntry>> {
    let query = format!(
        "SELECT s.id, s.lrn AS student_lrn, s.sy, s.name AS student_name, s.gender, s.address, \
         s.guardian, s.elementary, a.id AS assessment_id, {ASSESSMENT_COLUMNS} \
         FROM school_records.students s \
         LEFT JOIN school_records.assessments a ON s.lrn = a.lrn AND a.school_year = $1 \
         ORDER BY s.name ASC"
    );

    let rows = sqlx::query(&query)
        .bind(school_year)
        .fetch_all(pool)
        .await
        .context("failed to join students with assessments")?;

    let mut roster = Vec::with_capacity(rows.len());
    for row in rows {
        let student = StudentRecord {
            id: row.try_get("id")?,
            lrn: row.try_get("student_lrn")?,
            name: row.try_get("student_name")?,
            gender: row.try_get("gender")?,
            address: row.try_get("address")?,
            guardian: row.try_get("guardian")?,
            elementary: row.try_get("elementary")?,
            sy: row.try_get("sy")?,
        };
        let assessment_id: Option<Uuid> = row.try_get("assessment_id")?;
        let assessment = match assessment_id {
            Some(_) => Some(assessment_from_row(&row)?),
            None => None,
        };
        roster.push(RosterEntry { student, assessment });
    }

    Ok(roster)
}

/// All sheets for one learner, oldest school year first.
pub async fn fetch_history(pool: &PgPool, lrn: &str) -> anyhow::Result<Vec<AssessmentRecord>> {
    let query = format!(
        "SELECT {ASSESSMENT_COLUMNS} FROM school_records.assessments a \
         WHERE a.lrn = $1 ORDER BY a.school_year ASC"
    );

    let rows = sqlx::query(&query)
        .bind(lrn)
        .fetch_all(pool)
        .await
        .context("failed to fetch assessment history")?;

    rows.iter().map(assessment_from_row).collect()
}

/// The sheet for one learner and school year, if one has been saved.
pub async fn fetch_assessment(
    pool: &PgPool,
    lrn: &str,
    school_year: &str,
) -> anyhow::Result<Option<AssessmentRecord>> {
    let query = format!(
        "SELECT {ASSESSMENT_COLUMNS} FROM school_records.assessments a \
         WHERE a.lrn = $1 AND a.school_year = $2"
    );

    let row = sqlx::query(&query)
        .bind(lrn)
        .bind(school_year)
        .fetch_optional(pool)
        .await
        .context("failed to fetch assessment")?;

    row.as_ref().map(assessment_from_row).transpose()
}

pub async fn fetch_assessments(
    pool: &PgPool,
    school_year: &str,
) -> anyhow::Result<Vec<AssessmentRecord>> {
    let query = format!(
        "SELECT {ASSESSMENT_COLUMNS} FROM school_records.assessments a \
         WHERE a.school_year = $1 ORDER BY a.lrn ASC"
    );

    let rows = sqlx::query(&query)
        .bind(school_year)
        .fetch_all(pool)
        .await
        .context("failed to fetch assessments")?;

    rows.iter().map(assessment_from_row).collect()
}

pub async fn fetch_summary_rows(pool: &PgPool, school_year: &str) -> anyhow::Result<Vec<SummaryRow>> {
    let rows = sqlx::query(
        r#"
        SELECT
            s.gender,
            a.grade_section,
            a.fil_oral_pre_level, a.fil_comp_pre_level,
            a.fil_oral_post_level, a.fil_comp_post_level,
            a.eng_oral_pre_level, a.eng_comp_pre_level,
            a.eng_oral_post_level, a.eng_comp_post_level,
            a.numeracy_pre_level, a.numeracy_post_level
        FROM school_records.assessments a
        JOIN school_records.students s ON a.lrn = s.lrn
        WHERE a.school_year = $1
        "#,
    )
    .bind(school_year)
    .fetch_all(pool)
    .await
    .context("failed to fetch summary rows")?;

    let mut summary_rows = Vec::with_capacity(rows.len());
    for row in rows {
        summary_rows.push(SummaryRow {
            gender: row.try_get("gender")?,
            grade_section: row.try_get("grade_section")?,
            fil_oral_pre_level: row.try_get("fil_oral_pre_level")?,
            fil_comp_pre_level: row.try_get("fil_comp_pre_level")?,
            fil_oral_post_level: row.try_get("fil_oral_post_level")?,
            fil_comp_post_level: row.try_get("fil_comp_post_level")?,
            eng_oral_pre_level: row.try_get("eng_oral_pre_level")?,
            eng_comp_pre_level: row.try_get("eng_comp_pre_level")?,
            eng_oral_post_level: row.try_get("eng_oral_post_level")?,
            eng_comp_post_level: row.try_get("eng_comp_post_level")?,
            numeracy_pre_level: row.try_get("numeracy_pre_level")?,
            numeracy_post_level: row.try_get("numeracy_post_level")?,
        });
    }

    debug!(school_year, rows = summary_rows.len(), "summary rows fetched");
    Ok(summary_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_terms_match_literally() {
        assert_eq!(like_pattern("1367"), "%1367%");
        assert_eq!(like_pattern("_"), "%\\_%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
