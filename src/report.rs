use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::level::{Language, LevelMismatch, NumeracyLevel, ReadingTier};
use crate::models::{split_grade_section, AssessmentRecord, RosterEntry, SchoolProfile, StudentRecord};
use crate::summary::{GenderBucket, GradeKey, Metric, SummaryGrid};

struct SubjectTable {
    title: &'static str,
    pre: Metric,
    post: Metric,
    levels: Vec<&'static str>,
}

fn subject_tables() -> [SubjectTable; 3] {
    [
        SubjectTable {
            title: "Literacy (Filipino)",
            pre: Metric::FilipinoPre,
            post: Metric::FilipinoPost,
            levels: ReadingTier::ALL.iter().map(|t| t.label(Language::Filipino)).collect(),
        },
        SubjectTable {
            title: "Literacy (English)",
            pre: Metric::EnglishPre,
            post: Metric::EnglishPost,
            levels: ReadingTier::ALL.iter().map(|t| t.label(Language::English)).collect(),
        },
        SubjectTable {
            title: "Numeracy",
            pre: Metric::NumeracyPre,
            post: Metric::NumeracyPost,
            levels: NumeracyLevel::ALL.iter().map(|l| l.label()).collect(),
        },
    ]
}

pub fn build_summary_report(school_year: &str, grid: &SummaryGrid) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Summary of Results");
    let _ = writeln!(output, "S.Y. {school_year}");

    for table in subject_tables() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", table.title);
        let _ = writeln!(
            output,
            "Test instances: {} pre, {} post",
            grid.observations(table.pre),
            grid.observations(table.post)
        );
        let _ = writeln!(output);

        let mut header = String::from("| Level |");
        let mut rule = String::from("| --- |");
        for key in GradeKey::ALL {
            for column in ["Pre M", "Pre F", "Pre T", "Post M", "Post F", "Post T"] {
                let _ = write!(header, " {} {} |", key.label(), column);
                rule.push_str(" ---: |");
            }
        }
        let _ = writeln!(output, "{header}");
        let _ = writeln!(output, "{rule}");

        // Labels outside the canonical scale still show up, after it.
        let mut levels: Vec<&str> = table.levels.clone();
        for metric in [table.pre, table.post] {
            for observed in grid.observed_levels(metric) {
                if !levels.iter().any(|known| *known == observed) {
                    levels.push(observed);
                }
            }
        }

        for level in levels {
            let mut line = format!("| {level} |");
            for key in GradeKey::ALL {
                for metric in [table.pre, table.post] {
                    for bucket in [GenderBucket::Male, GenderBucket::Female, GenderBucket::Total] {
                        let _ = write!(line, " {} |", grid.count(metric, key, bucket, level));
                    }
                }
            }
            let _ = writeln!(output, "{line}");
        }
    }

    output
}

fn score_line(label: &str, score: Option<u8>, level: Option<&str>) -> String {
    let score = score.map(|s| s.to_string()).unwrap_or_default();
    format!("- {label} score: {score} {}", level.unwrap_or_default())
        .trim_end()
        .to_string()
}

pub fn build_progress_record(
    student: &StudentRecord,
    school: &SchoolProfile,
    history: &[AssessmentRecord],
    generated_at: DateTime<Local>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# MNHS Synchronized Progress Record");
    let _ = writeln!(output);
    for (label, value) in [
        ("LRN", student.lrn.as_str()),
        ("Name", student.name.as_str()),
        ("Gender", student.gender.as_str()),
        ("Guardian", student.guardian.as_str()),
        ("Address", student.address.as_str()),
        ("Elementary", student.elementary.as_str()),
        ("SY Enrolled", student.sy.as_str()),
        ("School ID", school.school_id.as_str()),
        ("Municipality", school.municipality.as_str()),
        ("Division", school.division.as_str()),
    ] {
        let _ = writeln!(output, "- {label}: {value}");
    }

    if history.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No assessments recorded.");
    }

    for record in history {
        let s = &record.scores;
        let l = &record.levels;

        let _ = writeln!(output);
        let _ = writeln!(output, "## School Year: {}", record.school_year);
        let _ = writeln!(output, "Grade & Section: {}", record.grade_section);

        let _ = writeln!(output);
        let _ = writeln!(output, "### Filipino");
        let _ = writeln!(output, "Pre-Test");
        let _ = writeln!(output, "{}", score_line("Pagbasa", s.fil_oral_pre, l.fil_oral_pre.as_deref()));
        let _ = writeln!(output, "{}", score_line("Pag-unawa", s.fil_comp_pre, l.fil_comp_pre.as_deref()));
        let _ = writeln!(output, "Post-Test");
        let _ = writeln!(output, "{}", score_line("Pagbasa", s.fil_oral_post, l.fil_oral_post.as_deref()));
        let _ = writeln!(output, "{}", score_line("Pag-unawa", s.fil_comp_post, l.fil_comp_post.as_deref()));

        let _ = writeln!(output);
        let _ = writeln!(output, "### English");
        let _ = writeln!(output, "Pre-Test");
        let _ = writeln!(output, "{}", score_line("Oral Reading", s.eng_oral_pre, l.eng_oral_pre.as_deref()));
        let _ = writeln!(output, "{}", score_line("Comprehension", s.eng_comp_pre, l.eng_comp_pre.as_deref()));
        let _ = writeln!(output, "Post-Test");
        let _ = writeln!(output, "{}", score_line("Oral Reading", s.eng_oral_post, l.eng_oral_post.as_deref()));
        let _ = writeln!(output, "{}", score_line("Comprehension", s.eng_comp_post, l.eng_comp_post.as_deref()));

        let _ = writeln!(output);
        let _ = writeln!(output, "### Numeracy");
        let _ = writeln!(output, "Pre-Test");
        let _ = writeln!(output, "{}", score_line("Numeracy", s.numeracy_pre, l.numeracy_pre.as_deref()));
        let _ = writeln!(output, "Post-Test");
        let _ = writeln!(output, "{}", score_line("Numeracy", s.numeracy_post, l.numeracy_post.as_deref()));
        let intervention = Some(record.intervention.trim()).filter(|i| !i.is_empty());
        let _ = writeln!(output, "Intervention: {}", intervention.unwrap_or("--"));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "---");
    let _ = writeln!(output, "Generated on {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(output);
    let _ = writeln!(output, "Principal's Signature: ______________________");

    output
}

pub fn build_roster_table(school_year: &str, entries: &[RosterEntry]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Roster for S.Y. {school_year}");
    let _ = writeln!(output);

    if entries.is_empty() {
        let _ = writeln!(output, "No students match.");
        return output;
    }

    let _ = writeln!(output, "| LRN | Name | Gender | Grade | Section | Intervention |");
    let _ = writeln!(output, "| --- | --- | --- | --- | --- | --- |");
    for entry in entries {
        let (grade, section) = split_grade_section(entry.grade_section());
        let intervention = entry
            .assessment
            .as_ref()
            .map(|a| a.intervention.as_str())
            .unwrap_or(crate::models::DEFAULT_INTERVENTION);
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} |",
            entry.student.lrn, entry.student.name, entry.student.gender, grade, section, intervention
        );
    }

    output
}

pub fn build_audit_report(school_year: &str, mismatches: &[LevelMismatch]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Level Audit for S.Y. {school_year}");
    let _ = writeln!(output);

    if mismatches.is_empty() {
        let _ = writeln!(output, "Every stored level matches its score.");
        return output;
    }

    for mismatch in mismatches {
        let _ = writeln!(
            output,
            "- {} {}: score {} stored \"{}\" expected \"{}\"",
            mismatch.lrn,
            mismatch.field,
            mismatch
                .score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            mismatch.stored.as_deref().unwrap_or(""),
            mismatch.expected.as_deref().unwrap_or("")
        );
    }

    output
}
