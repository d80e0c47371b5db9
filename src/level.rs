use serde::Serialize;

use crate::models::{
    split_grade_section, AssessmentLevels, AssessmentRecord, AssessmentScores, EntryError, Grade,
    SheetEntry, StudentRecord,
};

/// Placeholder shown when a numeracy score is entered before a grade is chosen.
/// It is not a proficiency level and must never be persisted or counted.
pub const SELECT_GRADE: &str = "Select Grade";

pub const MAX_SCORE: u8 = 100;

pub fn clamp_score(raw: u16) -> u8 {
    raw.min(u16::from(MAX_SCORE)) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Filipino,
    English,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadingTier {
    Lowest,
    Middle,
    Highest,
}

impl ReadingTier {
    pub const ALL: [ReadingTier; 3] = [ReadingTier::Lowest, ReadingTier::Middle, ReadingTier::Highest];

    pub fn label(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::Filipino, ReadingTier::Lowest) => "Kabiguan",
            (Language::Filipino, ReadingTier::Middle) => "Instruksiyunal",
            (Language::Filipino, ReadingTier::Highest) => "Malaya",
            (Language::English, ReadingTier::Lowest) => "Frustration",
            (Language::English, ReadingTier::Middle) => "Instructional",
            (Language::English, ReadingTier::Highest) => "Independent",
        }
    }
}

/// Three-tier reading scale: inclusive upper bounds for the lowest and middle tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingScale {
    upper_bounds: [u8; 2],
}

pub const ORAL_READING: ReadingScale = ReadingScale {
    upper_bounds: [89, 96],
};

pub const COMPREHENSION: ReadingScale = ReadingScale {
    upper_bounds: [15, 27],
};

impl ReadingScale {
    pub fn tier(&self, score: u8) -> ReadingTier {
        let [lowest, middle] = self.upper_bounds;
        match score {
            s if s <= lowest => ReadingTier::Lowest,
            s if s <= middle => ReadingTier::Middle,
            _ => ReadingTier::Highest,
        }
    }

    pub fn classify(&self, score: u8, language: Language) -> &'static str {
        self.tier(score).label(language)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum NumeracyLevel {
    EmergingNotProficient,
    EmergingLowProficiency,
    DevelopingNearlyProficient,
    TransitioningProficient,
    AtGradeLevel,
}

impl NumeracyLevel {
    pub const ALL: [NumeracyLevel; 5] = [
        NumeracyLevel::EmergingNotProficient,
        NumeracyLevel::EmergingLowProficiency,
        NumeracyLevel::DevelopingNearlyProficient,
        NumeracyLevel::TransitioningProficient,
        NumeracyLevel::AtGradeLevel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NumeracyLevel::EmergingNotProficient => "Emerging (NP)",
            NumeracyLevel::EmergingLowProficiency => "Emerging (LP)",
            NumeracyLevel::DevelopingNearlyProficient => "Developing (NP)",
            NumeracyLevel::TransitioningProficient => "Transitioning (P)",
            NumeracyLevel::AtGradeLevel => "At Grade Level (HP)",
        }
    }
}

/// Inclusive upper bounds for the four lower numeracy levels of one grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumeracyThresholds {
    pub emerging_np: u8,
    pub emerging_lp: u8,
    pub developing: u8,
    pub transitioning: u8,
}

pub const NUMERACY_THRESHOLDS: [(Grade, NumeracyThresholds); 4] = [
    (Grade::Seven, NumeracyThresholds::new(6, 13, 20, 27)),
    (Grade::Eight, NumeracyThresholds::new(15, 30, 43, 52)),
    (Grade::Nine, NumeracyThresholds::new(27, 55, 60, 65)),
    (Grade::Ten, NumeracyThresholds::new(29, 59, 64, 68)),
];

impl NumeracyThresholds {
    const fn new(emerging_np: u8, emerging_lp: u8, developing: u8, transitioning: u8) -> Self {
        Self {
            emerging_np,
            emerging_lp,
            developing,
            transitioning,
        }
    }

    /// Rows of `NUMERACY_THRESHOLDS` follow `Grade` declaration order.
    pub fn for_grade(grade: Grade) -> Self {
        let (_, thresholds) = NUMERACY_THRESHOLDS[grade as usize];
        thresholds
    }

    pub fn level(&self, score: u8) -> NumeracyLevel {
        match score {
            s if s <= self.emerging_np => NumeracyLevel::EmergingNotProficient,
            s if s <= self.emerging_lp => NumeracyLevel::EmergingLowProficiency,
            s if s <= self.developing => NumeracyLevel::DevelopingNearlyProficient,
            s if s <= self.transitioning => NumeracyLevel::TransitioningProficient,
            _ => NumeracyLevel::AtGradeLevel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumeracyOutcome {
    Level(NumeracyLevel),
    /// No grade chosen yet.
    SelectGrade,
    /// A grade was given but it has no threshold row.
    Unrecognized,
}

impl NumeracyOutcome {
    /// What the entry form shows next to the score.
    pub fn display_label(self) -> &'static str {
        match self {
            NumeracyOutcome::Level(level) => level.label(),
            NumeracyOutcome::SelectGrade => SELECT_GRADE,
            NumeracyOutcome::Unrecognized => "",
        }
    }

    /// The value to store; sentinels never reach the database.
    pub fn stored_label(self) -> Option<&'static str> {
        match self {
            NumeracyOutcome::Level(level) => Some(level.label()),
            NumeracyOutcome::SelectGrade | NumeracyOutcome::Unrecognized => None,
        }
    }
}

pub fn classify_oral(score: u8, language: Language) -> &'static str {
    ORAL_READING.classify(score, language)
}

pub fn classify_comprehension(score: u8, language: Language) -> &'static str {
    COMPREHENSION.classify(score, language)
}

/// `grade` is the grade label ("Grade 9"); `None` means none was selected.
pub fn classify_numeracy(score: u8, grade: Option<&str>) -> NumeracyOutcome {
    match grade.map(str::trim) {
        None | Some("") => NumeracyOutcome::SelectGrade,
        Some(label) => match Grade::parse(label) {
            Some(grade) => NumeracyOutcome::Level(NumeracyThresholds::for_grade(grade).level(score)),
            None => NumeracyOutcome::Unrecognized,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    Oral(Language),
    Comprehension(Language),
    Numeracy,
}

/// One of the ten score/level column pairs on an assessment sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetField {
    FilOralPre,
    FilCompPre,
    FilOralPost,
    FilCompPost,
    EngOralPre,
    EngCompPre,
    EngOralPost,
    EngCompPost,
    NumeracyPre,
    NumeracyPost,
}

impl SheetField {
    pub const ALL: [SheetField; 10] = [
        SheetField::FilOralPre,
        SheetField::FilCompPre,
        SheetField::FilOralPost,
        SheetField::FilCompPost,
        SheetField::EngOralPre,
        SheetField::EngCompPre,
        SheetField::EngOralPost,
        SheetField::EngCompPost,
        SheetField::NumeracyPre,
        SheetField::NumeracyPost,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SheetField::FilOralPre => "fil_oral_pre",
            SheetField::FilCompPre => "fil_comp_pre",
            SheetField::FilOralPost => "fil_oral_post",
            SheetField::FilCompPost => "fil_comp_post",
            SheetField::EngOralPre => "eng_oral_pre",
            SheetField::EngCompPre => "eng_comp_pre",
            SheetField::EngOralPost => "eng_oral_post",
            SheetField::EngCompPost => "eng_comp_post",
            SheetField::NumeracyPre => "numeracy_pre",
            SheetField::NumeracyPost => "numeracy_post",
        }
    }

    pub fn assessment(self) -> Assessment {
        match self {
            SheetField::FilOralPre | SheetField::FilOralPost => Assessment::Oral(Language::Filipino),
            SheetField::FilCompPre | SheetField::FilCompPost => {
                Assessment::Comprehension(Language::Filipino)
            }
            SheetField::EngOralPre | SheetField::EngOralPost => Assessment::Oral(Language::English),
            SheetField::EngCompPre | SheetField::EngCompPost => {
                Assessment::Comprehension(Language::English)
            }
            SheetField::NumeracyPre | SheetField::NumeracyPost => Assessment::Numeracy,
        }
    }

    pub fn score(self, scores: &AssessmentScores) -> Option<u8> {
        match self {
            SheetField::FilOralPre => scores.fil_oral_pre,
            SheetField::FilCompPre => scores.fil_comp_pre,
            SheetField::FilOralPost => scores.fil_oral_post,
            SheetField::FilCompPost => scores.fil_comp_post,
            SheetField::EngOralPre => scores.eng_oral_pre,
            SheetField::EngCompPre => scores.eng_comp_pre,
            SheetField::EngOralPost => scores.eng_oral_post,
            SheetField::EngCompPost => scores.eng_comp_post,
            SheetField::NumeracyPre => scores.numeracy_pre,
            SheetField::NumeracyPost => scores.numeracy_post,
        }
    }

    pub fn level(self, levels: &AssessmentLevels) -> Option<&str> {
        let level = match self {
            SheetField::FilOralPre => &levels.fil_oral_pre,
            SheetField::FilCompPre => &levels.fil_comp_pre,
            SheetField::FilOralPost => &levels.fil_oral_post,
            SheetField::FilCompPost => &levels.fil_comp_post,
            SheetField::EngOralPre => &levels.eng_oral_pre,
            SheetField::EngCompPre => &levels.eng_comp_pre,
            SheetField::EngOralPost => &levels.eng_oral_post,
            SheetField::EngCompPost => &levels.eng_comp_post,
            SheetField::NumeracyPre => &levels.numeracy_pre,
            SheetField::NumeracyPost => &levels.numeracy_post,
        };
        level.as_deref()
    }

    fn level_mut(self, levels: &mut AssessmentLevels) -> &mut Option<String> {
        match self {
            SheetField::FilOralPre => &mut levels.fil_oral_pre,
            SheetField::FilCompPre => &mut levels.fil_comp_pre,
            SheetField::FilOralPost => &mut levels.fil_oral_post,
            SheetField::FilCompPost => &mut levels.fil_comp_post,
            SheetField::EngOralPre => &mut levels.eng_oral_pre,
            SheetField::EngCompPre => &mut levels.eng_comp_pre,
            SheetField::EngOralPost => &mut levels.eng_oral_post,
            SheetField::EngCompPost => &mut levels.eng_comp_post,
            SheetField::NumeracyPre => &mut levels.numeracy_pre,
            SheetField::NumeracyPost => &mut levels.numeracy_post,
        }
    }

    /// Level this field should hold for `score`, or `None` if nothing is storable.
    pub fn classify(self, score: u8, grade: Option<&str>) -> Option<&'static str> {
        match self.assessment() {
            Assessment::Oral(language) => Some(classify_oral(score, language)),
            Assessment::Comprehension(language) => Some(classify_comprehension(score, language)),
            Assessment::Numeracy => classify_numeracy(score, grade).stored_label(),
        }
    }
}

/// Levels for every entered score. A missing score leaves its level empty.
pub fn classify_sheet(scores: &AssessmentScores, grade: Option<&str>) -> AssessmentLevels {
    let mut levels = AssessmentLevels::default();
    for field in SheetField::ALL {
        if let Some(score) = field.score(scores) {
            *field.level_mut(&mut levels) = field.classify(score, grade).map(str::to_string);
        }
    }
    levels
}

/// Grade label of a stored grade-and-section, if one was chosen.
fn sheet_grade(grade_section: &str) -> Option<&str> {
    let (grade, _) = split_grade_section(grade_section);
    Some(grade).filter(|g| !g.trim().is_empty())
}

/// Applies `entry` on top of the stored sheet (if any) and reclassifies all ten levels
/// from the merged scores and the resulting grade.
pub fn build_sheet(
    student: &StudentRecord,
    school_year: &str,
    stored: Option<&AssessmentRecord>,
    entry: &SheetEntry,
) -> Result<AssessmentRecord, EntryError> {
    let grade_section =
        entry.resolve_grade_section(stored.map_or("", |sheet| sheet.grade_section.as_str()))?;
    let scores = stored
        .map(|sheet| sheet.scores)
        .unwrap_or_default()
        .overlay(&entry.scores);
    let levels = classify_sheet(&scores, sheet_grade(&grade_section));

    Ok(AssessmentRecord {
        lrn: student.lrn.clone(),
        name: student.name.clone(),
        school_year: school_year.to_string(),
        intervention: entry.resolve_intervention(stored.map(|sheet| sheet.intervention.as_str())),
        grade_section,
        scores,
        levels,
        updated_at: None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelMismatch {
    pub lrn: String,
    pub school_year: String,
    pub field: &'static str,
    pub score: Option<u8>,
    pub stored: Option<String>,
    pub expected: Option<String>,
}

/// Stored levels that disagree with what their scores classify to. Read-only.
pub fn audit_levels(record: &AssessmentRecord) -> Vec<LevelMismatch> {
    let grade = sheet_grade(&record.grade_section);

    SheetField::ALL
        .into_iter()
        .filter_map(|field| {
            let score = field.score(&record.scores);
            let expected = score.and_then(|s| field.classify(s, grade));
            let stored = field
                .level(&record.levels)
                .map(str::trim)
                .filter(|level| !level.is_empty());

            if stored == expected {
                return None;
            }

            Some(LevelMismatch {
                lrn: record.lrn.clone(),
                school_year: record.school_year.clone(),
                field: field.name(),
                score,
                stored: stored.map(str::to_string),
                expected: expected.map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_INTERVENTION;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn student() -> StudentRecord {
        StudentRecord {
            id: Uuid::new_v4(),
            lrn: "136728140001".to_string(),
            name: "Dela Cruz, Juan".to_string(),
            gender: "Male".to_string(),
            address: "Poblacion 1".to_string(),
            guardian: "Maria Dela Cruz".to_string(),
            elementary: "Maragondon Elementary School".to_string(),
            sy: "2025-2026".to_string(),
        }
    }

    fn pretest_sheet() -> AssessmentRecord {
        let scores = AssessmentScores {
            fil_oral_pre: Some(85),
            numeracy_pre: Some(5),
            ..Default::default()
        };
        AssessmentRecord {
            lrn: "136728140001".to_string(),
            name: "Dela Cruz, Juan".to_string(),
            school_year: "2025-2026".to_string(),
            grade_section: "Grade 7 - Dahlia".to_string(),
            levels: classify_sheet(&scores, Some("Grade 7")),
            scores,
            intervention: "Remedial Reading".to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn post_test_entry_keeps_pre_test_and_grade() {
        let stored = pretest_sheet();
        let entry = SheetEntry {
            scores: AssessmentScores {
                numeracy_post: Some(25),
                ..Default::default()
            },
            ..Default::default()
        };

        let sheet = build_sheet(&student(), "2025-2026", Some(&stored), &entry).unwrap();
        assert_eq!(sheet.grade_section, "Grade 7 - Dahlia");
        assert_eq!(sheet.scores.fil_oral_pre, Some(85));
        assert_eq!(sheet.levels.fil_oral_pre.as_deref(), Some("Kabiguan"));
        assert_eq!(sheet.levels.numeracy_pre.as_deref(), Some("Emerging (NP)"));
        assert_eq!(sheet.levels.numeracy_post.as_deref(), Some("Transitioning (P)"));
        assert_eq!(sheet.intervention, "Remedial Reading");
        assert!(audit_levels(&sheet).is_empty());
    }

    #[test]
    fn grade_change_reclassifies_stored_numeracy() {
        let stored = pretest_sheet();
        let entry = SheetEntry {
            grade: Some("Grade 9".to_string()),
            section: Some("Luna".to_string()),
            ..Default::default()
        };

        let sheet = build_sheet(&student(), "2025-2026", Some(&stored), &entry).unwrap();
        assert_eq!(sheet.grade_section, "Grade 9 - Luna");
        assert_eq!(sheet.scores.numeracy_pre, Some(5));
        assert_eq!(sheet.levels.numeracy_pre.as_deref(), Some("Emerging (NP)"));
    }

    #[test]
    fn new_sheet_without_grade_stores_no_numeracy_level() {
        let entry = SheetEntry {
            scores: AssessmentScores {
                numeracy_pre: Some(40),
                eng_oral_pre: Some(97),
                ..Default::default()
            },
            ..Default::default()
        };

        let sheet = build_sheet(&student(), "2025-2026", None, &entry).unwrap();
        assert_eq!(sheet.grade_section, "");
        assert_eq!(sheet.levels.numeracy_pre, None);
        assert_eq!(sheet.levels.eng_oral_pre.as_deref(), Some("Independent"));
        assert_eq!(sheet.intervention, DEFAULT_INTERVENTION);

        let section_only = SheetEntry {
            section: Some("Rizal".to_string()),
            ..entry.clone()
        };
        assert_eq!(
            build_sheet(&student(), "2025-2026", None, &section_only).unwrap_err(),
            EntryError::SectionWithoutGrade
        );

        let unknown_grade = SheetEntry {
            grade: Some("Grade 11".to_string()),
            ..entry
        };
        let sheet = build_sheet(&student(), "2025-2026", None, &unknown_grade).unwrap();
        assert_eq!(sheet.grade_section, "Grade 11");
        assert_eq!(sheet.levels.numeracy_pre, None);
        assert_eq!(sheet.levels.eng_oral_pre.as_deref(), Some("Independent"));
    }

    #[test]
    fn oral_reading_boundaries() {
        assert_eq!(classify_oral(0, Language::Filipino), "Kabiguan");
        assert_eq!(classify_oral(89, Language::Filipino), "Kabiguan");
        assert_eq!(classify_oral(90, Language::Filipino), "Instruksiyunal");
        assert_eq!(classify_oral(96, Language::Filipino), "Instruksiyunal");
        assert_eq!(classify_oral(97, Language::Filipino), "Malaya");
        assert_eq!(classify_oral(100, Language::Filipino), "Malaya");

        assert_eq!(classify_oral(89, Language::English), "Frustration");
        assert_eq!(classify_oral(90, Language::English), "Instructional");
        assert_eq!(classify_oral(97, Language::English), "Independent");
    }

    #[test]
    fn comprehension_boundaries() {
        assert_eq!(classify_comprehension(15, Language::Filipino), "Kabiguan");
        assert_eq!(classify_comprehension(16, Language::Filipino), "Instruksiyunal");
        assert_eq!(classify_comprehension(27, Language::Filipino), "Instruksiyunal");
        assert_eq!(classify_comprehension(28, Language::Filipino), "Malaya");
        assert_eq!(classify_comprehension(0, Language::English), "Frustration");
        assert_eq!(classify_comprehension(27, Language::English), "Instructional");
        assert_eq!(classify_comprehension(100, Language::English), "Independent");
    }

    #[test]
    fn numeracy_grade_nine_boundaries() {
        let level = |score| classify_numeracy(score, Some("Grade 9")).display_label();
        assert_eq!(level(27), "Emerging (NP)");
        assert_eq!(level(28), "Emerging (LP)");
        assert_eq!(level(55), "Emerging (LP)");
        assert_eq!(level(56), "Developing (NP)");
        assert_eq!(level(60), "Developing (NP)");
        assert_eq!(level(61), "Transitioning (P)");
        assert_eq!(level(65), "Transitioning (P)");
        assert_eq!(level(66), "At Grade Level (HP)");
    }

    #[test]
    fn numeracy_table_matches_every_cut_point() {
        let expected = [
            (Grade::Seven, [6, 13, 20, 27]),
            (Grade::Eight, [15, 30, 43, 52]),
            (Grade::Nine, [27, 55, 60, 65]),
            (Grade::Ten, [29, 59, 64, 68]),
        ];

        for (grade, cuts) in expected {
            let thresholds = NumeracyThresholds::for_grade(grade);
            for (index, cut) in cuts.into_iter().enumerate() {
                assert_eq!(thresholds.level(cut), NumeracyLevel::ALL[index]);
                assert_eq!(thresholds.level(cut + 1), NumeracyLevel::ALL[index + 1]);
            }
        }
    }

    #[test]
    fn threshold_rows_follow_grade_order() {
        for (index, (grade, _)) in NUMERACY_THRESHOLDS.iter().enumerate() {
            assert_eq!(*grade as usize, index);
        }
    }

    #[test]
    fn numeracy_without_grade_is_a_sentinel() {
        let missing = classify_numeracy(50, None);
        assert_eq!(missing, NumeracyOutcome::SelectGrade);
        assert_eq!(missing.display_label(), SELECT_GRADE);
        assert_eq!(missing.stored_label(), None);

        assert_eq!(classify_numeracy(50, Some("")), NumeracyOutcome::SelectGrade);

        let unknown = classify_numeracy(50, Some("Grade 11"));
        assert_eq!(unknown, NumeracyOutcome::Unrecognized);
        assert_eq!(unknown.display_label(), "");
        assert_eq!(unknown.stored_label(), None);
    }

    #[test]
    fn clamps_scores_above_hundred() {
        assert_eq!(clamp_score(0), 0);
        assert_eq!(clamp_score(100), 100);
        assert_eq!(clamp_score(101), 100);
        assert_eq!(clamp_score(u16::MAX), 100);
    }

    #[test]
    fn sheet_classification_leaves_missing_scores_empty() {
        let scores = AssessmentScores {
            fil_oral_pre: Some(98),
            eng_comp_post: Some(20),
            numeracy_pre: Some(14),
            ..Default::default()
        };

        let levels = classify_sheet(&scores, Some("Grade 7"));
        assert_eq!(levels.fil_oral_pre.as_deref(), Some("Malaya"));
        assert_eq!(levels.eng_comp_post.as_deref(), Some("Instructional"));
        assert_eq!(levels.numeracy_pre.as_deref(), Some("Developing (NP)"));
        assert_eq!(levels.fil_comp_pre, None);
        assert_eq!(levels.numeracy_post, None);
    }

    #[test]
    fn sheet_classification_never_stores_select_grade() {
        let scores = AssessmentScores {
            numeracy_pre: Some(40),
            ..Default::default()
        };
        let levels = classify_sheet(&scores, None);
        assert_eq!(levels.numeracy_pre, None);
    }

    fn record(grade_section: &str, scores: AssessmentScores, levels: AssessmentLevels) -> AssessmentRecord {
        AssessmentRecord {
            lrn: "136728140001".to_string(),
            name: "Dela Cruz, Juan".to_string(),
            school_year: "2025-2026".to_string(),
            grade_section: grade_section.to_string(),
            scores,
            levels,
            intervention: DEFAULT_INTERVENTION.to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn audit_accepts_classifier_output() {
        let scores = AssessmentScores {
            fil_oral_pre: Some(91),
            numeracy_post: Some(70),
            ..Default::default()
        };
        let levels = classify_sheet(&scores, Some("Grade 10"));
        assert!(audit_levels(&record("Grade 10 - Rizal", scores, levels)).is_empty());
    }

    #[test]
    fn audit_flags_levels_written_around_the_classifier() {
        let scores = AssessmentScores {
            eng_oral_pre: Some(50),
            ..Default::default()
        };
        let levels = AssessmentLevels {
            eng_oral_pre: Some("Independent".to_string()),
            eng_comp_pre: Some("Frustration".to_string()),
            ..Default::default()
        };

        let mismatches = audit_levels(&record("Grade 8 - Atis", scores, levels));
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].field, "eng_oral_pre");
        assert_eq!(mismatches[0].expected.as_deref(), Some("Frustration"));
        assert_eq!(mismatches[1].field, "eng_comp_pre");
        assert_eq!(mismatches[1].score, None);
        assert_eq!(mismatches[1].expected, None);
    }

    proptest! {
        #[test]
        fn numeracy_is_monotonic(score in 0u8..100, grade_index in 0usize..4) {
            let thresholds = NumeracyThresholds::for_grade(Grade::ALL[grade_index]);
            prop_assert!(thresholds.level(score) <= thresholds.level(score + 1));
        }

        #[test]
        fn reading_scales_are_monotonic(score in 0u8..100) {
            prop_assert!(ORAL_READING.tier(score) <= ORAL_READING.tier(score + 1));
            prop_assert!(COMPREHENSION.tier(score) <= COMPREHENSION.tier(score + 1));
        }
    }
}
