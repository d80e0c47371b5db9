use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::level::SELECT_GRADE;
use crate::models::{Gender, Grade};

/// One joined assessment/student row as the summary query returns it.
#[derive(Debug, Clone, Default)]
pub struct SummaryRow {
    pub gender: Option<String>,
    pub grade_section: Option<String>,
    pub fil_oral_pre_level: Option<String>,
    pub fil_comp_pre_level: Option<String>,
    pub fil_oral_post_level: Option<String>,
    pub fil_comp_post_level: Option<String>,
    pub eng_oral_pre_level: Option<String>,
    pub eng_comp_pre_level: Option<String>,
    pub eng_oral_post_level: Option<String>,
    pub eng_comp_post_level: Option<String>,
    pub numeracy_pre_level: Option<String>,
    pub numeracy_post_level: Option<String>,
}

impl SummaryRow {
    fn levels(&self, metric: Metric) -> [Option<&str>; 2] {
        let (first, second) = match metric {
            Metric::FilipinoPre => (&self.fil_oral_pre_level, &self.fil_comp_pre_level),
            Metric::FilipinoPost => (&self.fil_oral_post_level, &self.fil_comp_post_level),
            Metric::EnglishPre => (&self.eng_oral_pre_level, &self.eng_comp_pre_level),
            Metric::EnglishPost => (&self.eng_oral_post_level, &self.eng_comp_post_level),
            Metric::NumeracyPre => return [self.numeracy_pre_level.as_deref(), None],
            Metric::NumeracyPost => return [self.numeracy_post_level.as_deref(), None],
        };
        [first.as_deref(), second.as_deref()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    FilipinoPre,
    FilipinoPost,
    EnglishPre,
    EnglishPost,
    NumeracyPre,
    NumeracyPost,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::FilipinoPre,
        Metric::FilipinoPost,
        Metric::EnglishPre,
        Metric::EnglishPost,
        Metric::NumeracyPre,
        Metric::NumeracyPost,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GradeKey {
    Grade(Grade),
    Total,
}

impl GradeKey {
    pub const ALL: [GradeKey; 5] = [
        GradeKey::Grade(Grade::Seven),
        GradeKey::Grade(Grade::Eight),
        GradeKey::Grade(Grade::Nine),
        GradeKey::Grade(Grade::Ten),
        GradeKey::Total,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GradeKey::Grade(grade) => grade.label(),
            GradeKey::Total => "TOTAL",
        }
    }
}

impl Serialize for GradeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderBucket {
    Male,
    Female,
    Total,
}

impl From<Gender> for GenderBucket {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => GenderBucket::Male,
            Gender::Female => GenderBucket::Female,
        }
    }
}

pub type LevelCounts = BTreeMap<String, u32>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenderBuckets {
    #[serde(rename = "M")]
    pub male: LevelCounts,
    #[serde(rename = "F")]
    pub female: LevelCounts,
    #[serde(rename = "T")]
    pub total: LevelCounts,
}

impl GenderBuckets {
    pub fn get(&self, bucket: GenderBucket) -> &LevelCounts {
        match bucket {
            GenderBucket::Male => &self.male,
            GenderBucket::Female => &self.female,
            GenderBucket::Total => &self.total,
        }
    }

    fn get_mut(&mut self, bucket: GenderBucket) -> &mut LevelCounts {
        match bucket {
            GenderBucket::Male => &mut self.male,
            GenderBucket::Female => &mut self.female,
            GenderBucket::Total => &mut self.total,
        }
    }
}

/// Cross-tab of level observations: metric -> grade/TOTAL -> M/F/T -> level -> count.
/// Missing level keys mean zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SummaryGrid {
    metrics: BTreeMap<Metric, BTreeMap<GradeKey, GenderBuckets>>,
}

impl Default for SummaryGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryGrid {
    pub fn new() -> Self {
        let metrics = Metric::ALL
            .into_iter()
            .map(|metric| {
                let grades = GradeKey::ALL
                    .into_iter()
                    .map(|key| (key, GenderBuckets::default()))
                    .collect();
                (metric, grades)
            })
            .collect();
        Self { metrics }
    }

    pub fn buckets(&self, metric: Metric, key: GradeKey) -> &GenderBuckets {
        &self.metrics[&metric][&key]
    }

    pub fn count(&self, metric: Metric, key: GradeKey, bucket: GenderBucket, level: &str) -> u32 {
        self.buckets(metric, key)
            .get(bucket)
            .get(level)
            .copied()
            .unwrap_or(0)
    }

    /// Number of test instances counted for a metric.
    pub fn observations(&self, metric: Metric) -> u32 {
        self.buckets(metric, GradeKey::Total)
            .total
            .values()
            .sum()
    }

    /// Level labels seen anywhere in a metric.
    pub fn observed_levels(&self, metric: Metric) -> Vec<&str> {
        self.buckets(metric, GradeKey::Total)
            .total
            .keys()
            .map(String::as_str)
            .collect()
    }

    fn bump(&mut self, metric: Metric, key: GradeKey, bucket: GenderBucket, level: &str, by: u32) {
        let counts = self
            .metrics
            .entry(metric)
            .or_default()
            .entry(key)
            .or_default()
            .get_mut(bucket);
        *counts.entry(level.to_string()).or_insert(0) += by;
    }

    fn record(&mut self, metric: Metric, grade: Grade, gender: GenderBucket, level: &str) {
        for (key, bucket) in [
            (GradeKey::Grade(grade), gender),
            (GradeKey::Grade(grade), GenderBucket::Total),
            (GradeKey::Total, gender),
            (GradeKey::Total, GenderBucket::Total),
        ] {
            self.bump(metric, key, bucket, level, 1);
        }
    }

    /// Adds every leaf count of `other` into `self`.
    pub fn merge(&mut self, other: &SummaryGrid) {
        for (metric, grades) in &other.metrics {
            for (key, buckets) in grades {
                for bucket in [GenderBucket::Male, GenderBucket::Female, GenderBucket::Total] {
                    for (level, count) in buckets.get(bucket) {
                        self.bump(*metric, *key, bucket, level, *count);
                    }
                }
            }
        }
    }
}

fn countable_level(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|level| !level.is_empty() && *level != SELECT_GRADE)
}

/// Rolls one school year's rows into a fresh grid. Rows outside Grade 7-10 or
/// without a Male/Female gender are skipped entirely.
pub fn aggregate<'a, I>(rows: I) -> SummaryGrid
where
    I: IntoIterator<Item = &'a SummaryRow>,
{
    let mut grid = SummaryGrid::new();
    let mut skipped = 0usize;

    for row in rows {
        let grade = row
            .grade_section
            .as_deref()
            .and_then(Grade::from_grade_section);
        let gender = row.gender.as_deref().and_then(Gender::parse);

        let (Some(grade), Some(gender)) = (grade, gender) else {
            skipped += 1;
            continue;
        };

        for metric in Metric::ALL {
            for level in row.levels(metric).into_iter().filter_map(countable_level) {
                grid.record(metric, grade, gender.into(), level);
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "rows left out of summary grid");
    }

    grid
}
