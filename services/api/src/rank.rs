use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use hirehub::error::AppError;
use hirehub::recruiting::applications::{
    Candidate, JobRequirements, RankedCandidate, RankingEngine, RankingFactor,
};
use hirehub::recruiting::profiles::ApplicantSnapshot;
use hirehub::recruiting::RecruitingError;
use serde::{Deserialize, Serialize};

#[derive(Args, Debug)]
pub(crate) struct RankArgs {
    /// JSON fixture with a `job` and its `candidates`
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Print the ranking as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RankFixture {
    pub(crate) job: FixtureJob,
    #[serde(default)]
    pub(crate) candidates: Vec<FixtureCandidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FixtureJob {
    #[serde(default)]
    pub(crate) skills: Vec<String>,
    #[serde(default)]
    pub(crate) min_experience: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FixtureCandidate {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) skills: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) experience: Option<f64>,
    #[serde(default)]
    pub(crate) ratings: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RankRow {
    pub(crate) position: usize,
    pub(crate) id: String,
    pub(crate) score: i64,
    pub(crate) skill_points: f64,
    pub(crate) experience_points: f64,
    pub(crate) feedback_points: f64,
    pub(crate) matched_skills: Vec<String>,
}

pub(crate) fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let raw = fs::read_to_string(&args.input)?;
    let fixture: RankFixture = serde_json::from_str(&raw)?;
    let rows = rank_fixture(fixture)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        render_table(&rows);
    }
    Ok(())
}

pub(crate) fn rank_fixture(fixture: RankFixture) -> Result<Vec<RankRow>, AppError> {
    let engine = RankingEngine::new(JobRequirements::new(
        fixture.job.skills,
        fixture.job.min_experience,
    ));

    let candidates = fixture
        .candidates
        .into_iter()
        .map(|candidate| -> Result<Candidate<String>, RecruitingError> {
            let ratings = candidate
                .ratings
                .iter()
                .map(|rating| {
                    u8::try_from(*rating)
                        .ok()
                        .filter(|rating| (1..=5).contains(rating))
                        .ok_or_else(|| {
                            RecruitingError::Validation(format!(
                                "candidate {} has rating {rating}; ratings must be between 1 and 5",
                                candidate.id
                            ))
                        })
                })
                .collect::<Result<Vec<u8>, _>>()?;
            Ok(Candidate {
                applicant: ApplicantSnapshot::new(
                    candidate.skills.unwrap_or_default(),
                    candidate.experience,
                ),
                ratings,
                item: candidate.id,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ranked = engine.rank(candidates, Utc::now());
    Ok(ranked.into_iter().enumerate().map(to_row).collect())
}

fn to_row((index, entry): (usize, RankedCandidate<String>)) -> RankRow {
    let breakdown = entry.breakdown;
    RankRow {
        position: index + 1,
        id: entry.item,
        score: breakdown.total,
        skill_points: breakdown.points(RankingFactor::SkillMatch),
        experience_points: breakdown.points(RankingFactor::Experience),
        feedback_points: breakdown.points(RankingFactor::Feedback),
        matched_skills: breakdown.matched_skills,
    }
}

fn render_table(rows: &[RankRow]) {
    if rows.is_empty() {
        println!("No candidates to rank.");
        return;
    }

    println!(
        "{:>3}  {:<16} {:>6} {:>7} {:>7} {:>7}  matched",
        "#", "candidate", "score", "skills", "exp", "fdbk"
    );
    for row in rows {
        println!(
            "{:>3}  {:<16} {:>6} {:>7.1} {:>7.1} {:>7.1}  {}",
            row.position,
            row.id,
            row.score,
            row.skill_points,
            row.experience_points,
            row.feedback_points,
            if row.matched_skills.is_empty() {
                "-".to_string()
            } else {
                row.matched_skills.join(", ")
            }
        );
    }
}
