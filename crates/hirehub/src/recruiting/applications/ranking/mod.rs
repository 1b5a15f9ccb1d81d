//! Applicant ranking: a fixed-weight suitability score per application.
//!
//! The score is the sum of three components, rounded half-up to an integer:
//!
//! * skill match, up to 50 points for the share of required skills covered,
//! * experience, 30 points when the posting's minimum is met, pro rata otherwise,
//! * feedback, the mean recruiter rating multiplied by 20.
//!
//! The feedback component is not normalised against the five
//! point rating scale, so totals above 100 are expected for well-rated
//! candidates. Scores are pure functions of their inputs; the engine holds no
//! state between passes.

mod persist;
mod rules;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recruiting::profiles::ApplicantSnapshot;

pub use persist::PersistenceSummary;
pub(crate) use persist::persist_rankings;

/// Requirements a posting places on its applicants, frozen for one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    pub skills: Vec<String>,
    pub min_experience: f64,
}

impl JobRequirements {
    pub fn new(skills: Vec<String>, min_experience: f64) -> Self {
        let min_experience = if min_experience.is_finite() && min_experience > 0.0 {
            min_experience
        } else {
            0.0
        };
        Self {
            skills,
            min_experience,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingFactor {
    SkillMatch,
    Experience,
    Feedback,
}

/// Discrete contribution to a score, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: RankingFactor,
    pub points: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: i64,
    pub components: Vec<ScoreComponent>,
    pub matched_skills: Vec<String>,
}

impl ScoreBreakdown {
    pub fn points(&self, factor: RankingFactor) -> f64 {
        self.components
            .iter()
            .filter(|component| component.factor == factor)
            .map(|component| component.points)
            .sum()
    }
}

/// One application offered to the engine, with whatever payload the caller needs back.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub item: T,
    pub applicant: ApplicantSnapshot,
    pub ratings: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate<T> {
    pub item: T,
    pub applicant: ApplicantSnapshot,
    pub breakdown: ScoreBreakdown,
    pub computed_at: DateTime<Utc>,
}

/// Stateless scorer bound to one posting's requirements.
pub struct RankingEngine {
    requirements: JobRequirements,
}

impl RankingEngine {
    pub fn new(requirements: JobRequirements) -> Self {
        Self { requirements }
    }

    pub fn requirements(&self) -> &JobRequirements {
        &self.requirements
    }

    pub fn score(&self, applicant: &ApplicantSnapshot, ratings: &[u8]) -> ScoreBreakdown {
        let (skill, matched_skills) = rules::skill_component(&self.requirements, applicant);
        let experience = rules::experience_component(&self.requirements, applicant);
        let feedback = rules::feedback_component(ratings);

        let raw = skill.points + experience.points + feedback.points;

        ScoreBreakdown {
            total: rules::round_half_up(raw),
            components: vec![skill, experience, feedback],
            matched_skills,
        }
    }

    /// Score every candidate and order best-first.
    ///
    /// The sort is stable, so equal totals keep the order they arrived in.
    pub fn rank<T>(
        &self,
        candidates: Vec<Candidate<T>>,
        computed_at: DateTime<Utc>,
    ) -> Vec<RankedCandidate<T>> {
        let mut ranked: Vec<RankedCandidate<T>> = candidates
            .into_iter()
            .map(|candidate| {
                let breakdown = self.score(&candidate.applicant, &candidate.ratings);
                RankedCandidate {
                    item: candidate.item,
                    applicant: candidate.applicant,
                    breakdown,
                    computed_at,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.breakdown.total.cmp(&a.breakdown.total));
        ranked
    }
}
