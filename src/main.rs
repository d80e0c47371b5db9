use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod db;
mod import;
mod level;
mod models;
mod report;
mod summary;

use crate::level::Language;
use crate::models::{
    split_grade_section, AssessmentScores, Grade, NewStudent, RosterFilter, SchoolProfile,
    SheetEntry,
};

#[derive(Parser)]
#[command(name = "literacy-tracker")]
#[command(about = "Literacy and numeracy assessment records for a secondary school", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Settings {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,
    #[arg(
        long,
        env = "DB_MAX_CONNECTIONS",
        global = true,
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_connections: u32,
    /// Log level for this tool; RUST_LOG takes precedence when set
    #[arg(long, env = "LOG_LEVEL", global = true, default_value = "info")]
    log_level: String,
    #[arg(long, env = "SCHOOL_ID", global = true, default_value = "301204")]
    school_id: String,
    #[arg(long, env = "SCHOOL_MUNICIPALITY", global = true, default_value = "MARAGONDON")]
    municipality: String,
    #[arg(long, env = "SCHOOL_DIVISION", global = true, default_value = "CAVITE PROVINCE")]
    division: String,
}

impl Settings {
    fn school(&self) -> SchoolProfile {
        SchoolProfile {
            school_id: self.school_id.clone(),
            municipality: self.municipality.clone(),
            division: self.division.clone(),
        }
    }

    async fn connect(&self) -> anyhow::Result<PgPool> {
        let database_url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")?;

        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")
    }
}

#[derive(Args)]
struct ScoreArgs {
    #[arg(long)]
    fil_oral_pre: Option<u16>,
    #[arg(long)]
    fil_comp_pre: Option<u16>,
    #[arg(long)]
    fil_oral_post: Option<u16>,
    #[arg(long)]
    fil_comp_post: Option<u16>,
    #[arg(long)]
    eng_oral_pre: Option<u16>,
    #[arg(long)]
    eng_comp_pre: Option<u16>,
    #[arg(long)]
    eng_oral_post: Option<u16>,
    #[arg(long)]
    eng_comp_post: Option<u16>,
    #[arg(long)]
    numeracy_pre: Option<u16>,
    #[arg(long)]
    numeracy_post: Option<u16>,
}

impl ScoreArgs {
    fn clamped(&self) -> AssessmentScores {
        let clamp = |raw: Option<u16>| raw.map(level::clamp_score);
        AssessmentScores {
            fil_oral_pre: clamp(self.fil_oral_pre),
            fil_comp_pre: clamp(self.fil_comp_pre),
            fil_oral_post: clamp(self.fil_oral_post),
            fil_comp_post: clamp(self.fil_comp_post),
            eng_oral_pre: clamp(self.eng_oral_pre),
            eng_comp_pre: clamp(self.eng_comp_pre),
            eng_oral_post: clamp(self.eng_oral_post),
            eng_comp_post: clamp(self.eng_comp_post),
            numeracy_pre: clamp(self.numeracy_pre),
            numeracy_post: clamp(self.numeracy_post),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Subject {
    FilOral,
    FilComp,
    EngOral,
    EngComp,
    Numeracy,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Register one student
    AddStudent {
        #[arg(long)]
        lrn: String,
        /// School year of enrollment
        #[arg(long)]
        sy: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        guardian: String,
        /// Elementary school attended
        #[arg(long)]
        elementary: String,
    },
    /// Import students from a CSV file
    ImportStudents {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List students, newest first
    ListStudents {
        /// Match part of an LRN
        #[arg(long)]
        search: Option<String>,
    },
    /// Remove a student and their assessments
    DeleteStudent {
        #[arg(long)]
        lrn: String,
    },
    /// Show the level a score classifies to
    Classify {
        #[arg(long, value_enum)]
        subject: Subject,
        #[arg(long)]
        score: u16,
        /// Needed for numeracy, e.g. "Grade 8"
        #[arg(long)]
        grade: Option<String>,
    },
    /// Save scores for a student and school year; omitted fields keep their stored values
    Record {
        #[arg(long)]
        lrn: String,
        #[arg(long)]
        school_year: String,
        #[arg(long)]
        grade: Option<String>,
        /// Requires a grade, given here or already on file
        #[arg(long)]
        section: Option<String>,
        /// Defaults to ARAL PROGRAM for a new sheet
        #[arg(long)]
        intervention: Option<String>,
        #[command(flatten)]
        scores: ScoreArgs,
    },
    /// List students with their assessment for a school year
    Roster {
        #[arg(long)]
        school_year: String,
        #[arg(long)]
        grade: Option<String>,
        #[arg(long)]
        section: Option<String>,
        /// Match part of an LRN or name
        #[arg(long)]
        search: Option<String>,
    },
    /// Print every assessment recorded for a student as JSON
    History {
        #[arg(long)]
        lrn: String,
    },
    /// Write a student's progress record as markdown
    Progress {
        #[arg(long)]
        lrn: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Cross-tab level counts; several school years are summed together
    Summary {
        #[arg(long, required = true, num_args = 1..)]
        school_year: Vec<String>,
        /// Emit the raw grid as JSON instead of markdown tables
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report stored levels that disagree with their scores
    AuditLevels {
        #[arg(long)]
        school_year: String,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("literacy_numeracy_tracker={log_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn require(field: &str, value: String) -> anyhow::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("Missing required field: {}", field.to_uppercase());
    }
    Ok(trimmed.to_string())
}

fn emit(content: &str, out: Option<&PathBuf>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Written to {}.", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.settings.log_level);

    if let Commands::Classify {
        subject,
        score,
        grade,
    } = &cli.command
    {
        let score = level::clamp_score(*score);
        let label = match subject {
            Subject::FilOral => level::classify_oral(score, Language::Filipino),
            Subject::FilComp => level::classify_comprehension(score, Language::Filipino),
            Subject::EngOral => level::classify_oral(score, Language::English),
            Subject::EngComp => level::classify_comprehension(score, Language::English),
            Subject::Numeracy => level::classify_numeracy(score, grade.as_deref()).display_label(),
        };
        println!("{score}: {label}");
        return Ok(());
    }

    let pool = cli.settings.connect().await?;

    match cli.command {
        Commands::Classify { .. } => {}
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::AddStudent {
            lrn,
            sy,
            name,
            gender,
            address,
            guardian,
            elementary,
        } => {
            let student = NewStudent {
                lrn: require("lrn", lrn)?,
                sy: require("sy", sy)?,
                name: require("name", name)?,
                gender: require("gender", gender)?,
                address: require("address", address)?,
                guardian: require("guardian", guardian)?,
                elementary: require("elementary", elementary)?,
            };
            if models::Gender::parse(&student.gender).is_none() {
                warn!(gender = %student.gender, "gender is not Male or Female; student will be left out of summaries");
            }
            db::insert_student(&pool, &student).await?;
            println!("Student inserted successfully.");
        }
        Commands::ImportStudents { csv } => {
            let inserted = db::import_students(&pool, &csv).await?;
            info!(inserted, path = %csv.display(), "student import finished");
            println!("Inserted {inserted} students from {}.", csv.display());
        }
        Commands::ListStudents { search } => {
            let students = db::list_students(&pool, search.as_deref()).await?;
            if students.is_empty() {
                println!("No students found.");
                return Ok(());
            }
            for student in students {
                println!(
                    "- {} {} ({}, enrolled {})",
                    student.lrn, student.name, student.gender, student.sy
                );
            }
        }
        Commands::DeleteStudent { lrn } => {
            db::delete_student(&pool, &lrn).await?;
            println!("Student deleted successfully.");
        }
        Commands::Record {
            lrn,
            school_year,
            grade,
            section,
            intervention,
            scores,
        } => {
            let student = db::fetch_student(&pool, &lrn)
                .await?
                .context("Student not found.")?;

            let stored = db::fetch_assessment(&pool, &lrn, &school_year).await?;
            let entry = SheetEntry {
                grade,
                section,
                intervention,
                scores: scores.clamped(),
            };
            let record = level::build_sheet(&student, &school_year, stored.as_ref(), &entry)?;

            let (grade, section) = split_grade_section(&record.grade_section);
            let grade = Some(grade).filter(|g| !g.is_empty());
            let has_numeracy = record.scores.numeracy_pre.is_some() || record.scores.numeracy_post.is_some();
            if let Some(parsed) = grade.and_then(Grade::parse) {
                if !section.is_empty() && !parsed.sections().contains(&section) {
                    warn!(grade = parsed.label(), section, "section is not in the catalog for this grade");
                }
            } else if let Some(unknown) = grade {
                warn!(grade = unknown, "grade is outside Grade 7-10; record will not appear in summaries");
            } else if has_numeracy {
                warn!("{}: numeracy levels stay empty until a grade is given", level::SELECT_GRADE);
            }

            let outcome = db::upsert_assessment(&pool, &record).await?;
            println!("{outcome:?} assessment for {} ({}).", record.lrn, record.school_year);
            for field in level::SheetField::ALL {
                if let Some(score) = field.score(&record.scores) {
                    let shown = field.level(&record.levels).unwrap_or_else(|| {
                        level::classify_numeracy(score, grade).display_label()
                    });
                    println!("- {}: {} {}", field.name(), score, shown);
                }
            }
        }
        Commands::Roster {
            school_year,
            grade,
            section,
            search,
        } => {
            let filter = RosterFilter {
                grade,
                section,
                search,
            };
            let roster: Vec<_> = db::fetch_roster(&pool, &school_year)
                .await?
                .into_iter()
                .filter(|entry| filter.matches(entry))
                .collect();
            print!("{}", report::build_roster_table(&school_year, &roster));
        }
        Commands::History { lrn } => {
            let history = db::fetch_history(&pool, &lrn).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Commands::Progress { lrn, out } => {
            let student = db::fetch_student(&pool, &lrn)
                .await?
                .context("Student not found.")?;
            let history = db::fetch_history(&pool, &lrn).await?;
            let record = report::build_progress_record(
                &student,
                &cli.settings.school(),
                &history,
                chrono::Local::now(),
            );
            let out = out.unwrap_or_else(|| PathBuf::from(format!("{lrn}_Progress_Record.md")));
            emit(&record, Some(&out))?;
        }
        Commands::Summary {
            school_year,
            json,
            out,
        } => {
            let mut grid = summary::SummaryGrid::new();
            for year in &school_year {
                let rows = db::fetch_summary_rows(&pool, year).await?;
                grid.merge(&summary::aggregate(&rows));
                info!(school_year = %year, rows = rows.len(), "summary grid built");
            }

            let rendered = if json {
                let mut text = serde_json::to_string_pretty(&grid)?;
                text.push('\n');
                text
            } else {
                report::build_summary_report(&school_year.join(", "), &grid)
            };
            emit(&rendered, out.as_ref())?;
        }
        Commands::AuditLevels { school_year } => {
            let assessments = db::fetch_assessments(&pool, &school_year).await?;
            let mismatches: Vec<_> = assessments.iter().flat_map(level::audit_levels).collect();
            if !mismatches.is_empty() {
                warn!(count = mismatches.len(), %school_year, "stored levels disagree with scores");
            }
            print!("{}", report::build_audit_report(&school_year, &mismatches));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pool_size_must_be_positive() {
        assert!(Cli::try_parse_from(["literacy-tracker", "--max-connections", "0", "init-db"]).is_err());

        let cli = Cli::try_parse_from(["literacy-tracker", "--max-connections", "3", "init-db"]).unwrap();
        assert_eq!(cli.settings.max_connections, 3);
    }
}
