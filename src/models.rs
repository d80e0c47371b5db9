use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_INTERVENTION: &str = "ARAL PROGRAM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Only the exact stored values count; anything else is left out of summaries.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    Seven,
    Eight,
    Nine,
    Ten,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Seven, Grade::Eight, Grade::Nine, Grade::Ten];

    pub fn label(self) -> &'static str {
        match self {
            Grade::Seven => "Grade 7",
            Grade::Eight => "Grade 8",
            Grade::Nine => "Grade 9",
            Grade::Ten => "Grade 10",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Grade::ALL.into_iter().find(|grade| grade.label() == value)
    }

    /// "Grade 9 - Luna" -> Grade 9. Text before the first " - " must be an exact grade label.
    pub fn from_grade_section(grade_section: &str) -> Option<Self> {
        let grade = grade_section
            .split(" - ")
            .next()
            .unwrap_or(grade_section);
        Grade::parse(grade)
    }

    pub fn sections(self) -> &'static [&'static str] {
        match self {
            Grade::Seven => &[
                "Dahlia",
                "Honesty",
                "Ilang-ilang",
                "Rosal",
                "Sampaguita",
                "Santan",
                "Waling-waling",
            ],
            Grade::Eight => &[
                "Atis",
                "Guyabano",
                "Kaymito",
                "Lansonez",
                "Manga",
                "SPJ Integrity",
            ],
            Grade::Nine => &[
                "Amorsolo",
                "Dela Rosa",
                "Edades",
                "Francisco",
                "Hidalgo",
                "Luna",
            ],
            Grade::Ten => &[
                "Aguinaldo",
                "Bonifacio",
                "Burgos",
                "Del Pilar",
                "Rizal",
                "Zamora",
            ],
        }
    }
}

pub fn grade_section_label(grade: &str, section: &str) -> String {
    format!("{grade} - {section}")
}

/// Splits a stored grade-and-section into its two halves; missing parts come back empty.
pub fn split_grade_section(grade_section: &str) -> (&str, &str) {
    match grade_section.split_once(" - ") {
        Some((grade, section)) => (grade, section),
        None => (grade_section, ""),
    }
}

/// Fixed school details printed on every progress record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchoolProfile {
    pub school_id: String,
    pub municipality: String,
    pub division: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRecord {
    pub id: Uuid,
    pub lrn: String,
    pub name: String,
    pub gender: String,
    pub address: String,
    pub guardian: String,
    pub elementary: String,
    pub sy: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub lrn: String,
    pub sy: String,
    pub name: String,
    pub gender: String,
    pub address: String,
    pub guardian: String,
    pub elementary: String,
}

/// Raw scores for one learner and school year, already clamped to 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssessmentScores {
    pub fil_oral_pre: Option<u8>,
    pub fil_comp_pre: Option<u8>,
    pub fil_oral_post: Option<u8>,
    pub fil_comp_post: Option<u8>,
    pub eng_oral_pre: Option<u8>,
    pub eng_comp_pre: Option<u8>,
    pub eng_oral_post: Option<u8>,
    pub eng_comp_post: Option<u8>,
    pub numeracy_pre: Option<u8>,
    pub numeracy_post: Option<u8>,
}

impl AssessmentScores {
    /// Scores present in `update` replace ours; absent ones keep what is stored.
    pub fn overlay(&self, update: &AssessmentScores) -> AssessmentScores {
        AssessmentScores {
            fil_oral_pre: update.fil_oral_pre.or(self.fil_oral_pre),
            fil_comp_pre: update.fil_comp_pre.or(self.fil_comp_pre),
            fil_oral_post: update.fil_oral_post.or(self.fil_oral_post),
            fil_comp_post: update.fil_comp_post.or(self.fil_comp_post),
            eng_oral_pre: update.eng_oral_pre.or(self.eng_oral_pre),
            eng_comp_pre: update.eng_comp_pre.or(self.eng_comp_pre),
            eng_oral_post: update.eng_oral_post.or(self.eng_oral_post),
            eng_comp_post: update.eng_comp_post.or(self.eng_comp_post),
            numeracy_pre: update.numeracy_pre.or(self.numeracy_pre),
            numeracy_post: update.numeracy_post.or(self.numeracy_post),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssessmentLevels {
    pub fil_oral_pre: Option<String>,
    pub fil_comp_pre: Option<String>,
    pub fil_oral_post: Option<String>,
    pub fil_comp_post: Option<String>,
    pub eng_oral_pre: Option<String>,
    pub eng_comp_pre: Option<String>,
    pub eng_oral_post: Option<String>,
    pub eng_comp_post: Option<String>,
    pub numeracy_pre: Option<String>,
    pub numeracy_post: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentRecord {
    pub lrn: String,
    pub name: String,
    pub school_year: String,
    pub grade_section: String,
    pub scores: AssessmentScores,
    pub levels: AssessmentLevels,
    pub intervention: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("A grade is required before a section can be set.")]
    SectionWithoutGrade,
}

/// One round of score entry. Anything left `None` keeps its stored value.
#[derive(Debug, Clone, Default)]
pub struct SheetEntry {
    pub grade: Option<String>,
    pub section: Option<String>,
    pub intervention: Option<String>,
    pub scores: AssessmentScores,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl SheetEntry {
    /// Grade-and-section to store, given what is already on file.
    /// A section keeps the stored grade; a new grade drops a section that belonged to the old one.
    pub fn resolve_grade_section(&self, stored: &str) -> Result<String, EntryError> {
        let (stored_grade, stored_section) = split_grade_section(stored);
        let stored_grade = stored_grade.trim();

        let grade = match non_blank(self.grade.as_deref()) {
            Some(grade) => grade,
            None if stored_grade.is_empty() => {
                if non_blank(self.section.as_deref()).is_some() {
                    return Err(EntryError::SectionWithoutGrade);
                }
                return Ok(String::new());
            }
            None => stored_grade,
        };

        let section = match non_blank(self.section.as_deref()) {
            Some(section) => section,
            None if grade == stored_grade => stored_section.trim(),
            None => "",
        };

        Ok(if section.is_empty() {
            grade.to_string()
        } else {
            grade_section_label(grade, section)
        })
    }

    pub fn resolve_intervention(&self, stored: Option<&str>) -> String {
        non_blank(self.intervention.as_deref())
            .or(non_blank(stored))
            .unwrap_or(DEFAULT_INTERVENTION)
            .to_string()
    }
}

/// A student joined with their (possibly missing) assessment for one school year.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub student: StudentRecord,
    pub assessment: Option<AssessmentRecord>,
}

impl RosterEntry {
    pub fn grade_section(&self) -> &str {
        self.assessment
            .as_ref()
            .map(|assessment| assessment.grade_section.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default)]
pub struct RosterFilter {
    pub grade: Option<String>,
    pub section: Option<String>,
    /// Case-insensitive match against LRN or name.
    pub search: Option<String>,
}

impl RosterFilter {
    pub fn matches(&self, entry: &RosterEntry) -> bool {
        let (grade, section) = split_grade_section(entry.grade_section());

        if self.grade.as_deref().is_some_and(|wanted| wanted != grade) {
            return false;
        }
        if self.section.as_deref().is_some_and(|wanted| wanted != section) {
            return false;
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let term = term.to_lowercase();
                entry.student.lrn.to_lowercase().contains(&term)
                    || entry.student.name.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(lrn: &str, name: &str, grade_section: Option<&str>) -> RosterEntry {
        RosterEntry {
            student: StudentRecord {
                id: Uuid::new_v4(),
                lrn: lrn.to_string(),
                name: name.to_string(),
                gender: "Male".to_string(),
                address: "Poblacion 1".to_string(),
                guardian: "Maria Dela Cruz".to_string(),
                elementary: "Maragondon Elementary School".to_string(),
                sy: "2025-2026".to_string(),
            },
            assessment: grade_section.map(|gs| AssessmentRecord {
                lrn: lrn.to_string(),
                name: name.to_string(),
                school_year: "2025-2026".to_string(),
                grade_section: gs.to_string(),
                scores: AssessmentScores::default(),
                levels: AssessmentLevels::default(),
                intervention: DEFAULT_INTERVENTION.to_string(),
                updated_at: None,
            }),
        }
    }

    fn entry_with(grade: Option<&str>, section: Option<&str>) -> SheetEntry {
        SheetEntry {
            grade: grade.map(str::to_string),
            section: section.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn overlay_keeps_scores_that_were_not_entered() {
        let stored = AssessmentScores {
            fil_oral_pre: Some(85),
            numeracy_pre: Some(5),
            ..Default::default()
        };
        let update = AssessmentScores {
            numeracy_post: Some(25),
            fil_oral_pre: Some(92),
            ..Default::default()
        };

        let merged = stored.overlay(&update);
        assert_eq!(merged.fil_oral_pre, Some(92));
        assert_eq!(merged.numeracy_pre, Some(5));
        assert_eq!(merged.numeracy_post, Some(25));
        assert_eq!(merged.eng_comp_post, None);
        assert_eq!(stored.overlay(&AssessmentScores::default()), stored);
    }

    #[test]
    fn grade_section_resolution() {
        let both = entry_with(Some("Grade 7"), Some("Dahlia"));
        assert_eq!(both.resolve_grade_section("").unwrap(), "Grade 7 - Dahlia");

        let grade_only = entry_with(Some("Grade 7"), None);
        assert_eq!(grade_only.resolve_grade_section("").unwrap(), "Grade 7");
        assert_eq!(
            grade_only.resolve_grade_section("Grade 7 - Dahlia").unwrap(),
            "Grade 7 - Dahlia"
        );
        assert_eq!(grade_only.resolve_grade_section("Grade 8 - Atis").unwrap(), "Grade 7");

        let section_only = entry_with(None, Some("Rizal"));
        assert_eq!(
            section_only.resolve_grade_section(""),
            Err(EntryError::SectionWithoutGrade)
        );
        assert_eq!(
            section_only.resolve_grade_section("Grade 10 - Zamora").unwrap(),
            "Grade 10 - Rizal"
        );

        let neither = entry_with(None, Some("  "));
        assert_eq!(neither.resolve_grade_section("Grade 9 - Luna").unwrap(), "Grade 9 - Luna");
        assert_eq!(neither.resolve_grade_section("").unwrap(), "");

        let unknown = entry_with(Some("Grade 11"), Some("STEM"));
        assert_eq!(unknown.resolve_grade_section("").unwrap(), "Grade 11 - STEM");
    }

    #[test]
    fn intervention_falls_back_to_stored_then_default() {
        let blank = SheetEntry {
            intervention: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.resolve_intervention(None), DEFAULT_INTERVENTION);
        assert_eq!(blank.resolve_intervention(Some("Remedial Reading")), "Remedial Reading");

        let given = SheetEntry {
            intervention: Some("Peer Tutoring".to_string()),
            ..Default::default()
        };
        assert_eq!(given.resolve_intervention(Some("Remedial Reading")), "Peer Tutoring");
        assert_eq!(SheetEntry::default().resolve_intervention(Some("")), DEFAULT_INTERVENTION);
    }

    #[test]
    fn roster_filter_checks_grade_section_and_search() {
        let juan = entry("136728140001", "Dela Cruz, Juan", Some("Grade 7 - Dahlia"));
        let ana = entry("136728140002", "Santos, Ana", Some("Grade 8 - Atis"));
        let unassessed = entry("136728140003", "Reyes, Mark", None);

        let grade_seven = RosterFilter {
            grade: Some("Grade 7".to_string()),
            ..Default::default()
        };
        assert!(grade_seven.matches(&juan));
        assert!(!grade_seven.matches(&ana));
        assert!(!grade_seven.matches(&unassessed));

        let atis = RosterFilter {
            grade: Some("Grade 8".to_string()),
            section: Some("Atis".to_string()),
            ..Default::default()
        };
        assert!(atis.matches(&ana));

        let search = RosterFilter {
            search: Some("santos".to_string()),
            ..Default::default()
        };
        assert!(search.matches(&ana));
        assert!(!search.matches(&juan));

        let by_lrn = RosterFilter {
            search: Some("140003".to_string()),
            ..Default::default()
        };
        assert!(by_lrn.matches(&unassessed));
        assert!(RosterFilter::default().matches(&unassessed));
    }

    #[test]
    fn grade_is_text_before_first_delimiter() {
        assert_eq!(Grade::from_grade_section("Grade 7 - Dahlia"), Some(Grade::Seven));
        assert_eq!(Grade::from_grade_section("Grade 10 - Del Pilar"), Some(Grade::Ten));
        assert_eq!(Grade::from_grade_section("Grade 8"), Some(Grade::Eight));
        assert_eq!(Grade::from_grade_section("Grade 11 - X"), None);
        assert_eq!(Grade::from_grade_section("grade 7 - Dahlia"), None);
        assert_eq!(Grade::from_grade_section(""), None);
    }

    #[test]
    fn gender_requires_exact_value() {
        assert_eq!(Gender::parse("Male"), Some(Gender::Male));
        assert_eq!(Gender::parse("Female"), Some(Gender::Female));
        assert_eq!(Gender::parse("Non-binary"), None);
        assert_eq!(Gender::parse(""), None);
    }

    #[test]
    fn splits_grade_section() {
        assert_eq!(split_grade_section("Grade 9 - Dela Rosa"), ("Grade 9", "Dela Rosa"));
        assert_eq!(split_grade_section("Grade 9"), ("Grade 9", ""));
        assert_eq!(grade_section_label("Grade 9", "Luna"), "Grade 9 - Luna");
    }

    #[test]
    fn section_catalog_covers_every_grade() {
        for grade in Grade::ALL {
            assert!(!grade.sections().is_empty());
        }
        assert!(Grade::Eight.sections().contains(&"SPJ Integrity"));
    }
}
