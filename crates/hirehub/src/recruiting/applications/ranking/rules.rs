use super::{JobRequirements, RankingFactor, ScoreComponent};
use crate::recruiting::profiles::ApplicantSnapshot;

pub(crate) const SKILL_WEIGHT: f64 = 50.0;
pub(crate) const EXPERIENCE_WEIGHT: f64 = 30.0;
pub(crate) const FEEDBACK_MULTIPLIER: f64 = 20.0;

/// An applicant skill matches when either lowercase string contains the other.
/// Each applicant skill counts at most once, however many job skills it hits.
pub(crate) fn skill_component(
    requirements: &JobRequirements,
    applicant: &ApplicantSnapshot,
) -> (ScoreComponent, Vec<String>) {
    let job_skills: Vec<String> = requirements
        .skills
        .iter()
        .map(|skill| skill.to_lowercase())
        .collect();

    if job_skills.is_empty() {
        let component = ScoreComponent {
            factor: RankingFactor::SkillMatch,
            points: 0.0,
            notes: "posting lists no required skills".to_string(),
        };
        return (component, Vec::new());
    }

    let matched: Vec<String> = applicant
        .skills
        .iter()
        .filter(|skill| {
            let skill = skill.to_lowercase();
            job_skills
                .iter()
                .any(|job_skill| job_skill.contains(&skill) || skill.contains(job_skill.as_str()))
        })
        .cloned()
        .collect();

    let points = matched.len() as f64 / job_skills.len() as f64 * SKILL_WEIGHT;
    let component = ScoreComponent {
        factor: RankingFactor::SkillMatch,
        points,
        notes: format!(
            "{} applicant skill(s) matched against {} required",
            matched.len(),
            job_skills.len()
        ),
    };
    (component, matched)
}

/// Negative or non-finite year counts score as zero years.
fn years_or_zero(years: f64) -> f64 {
    if years.is_finite() && years > 0.0 {
        years
    } else {
        0.0
    }
}

pub(crate) fn experience_component(
    requirements: &JobRequirements,
    applicant: &ApplicantSnapshot,
) -> ScoreComponent {
    let minimum = years_or_zero(requirements.min_experience);
    let years = years_or_zero(applicant.experience);

    if minimum <= 0.0 || years >= minimum {
        return ScoreComponent {
            factor: RankingFactor::Experience,
            points: EXPERIENCE_WEIGHT,
            notes: format!("{years} year(s) meets minimum {minimum}"),
        };
    }

    ScoreComponent {
        factor: RankingFactor::Experience,
        points: years / minimum * EXPERIENCE_WEIGHT,
        notes: format!("{years} year(s) below minimum {minimum}"),
    }
}

/// Mean rating times twenty; no feedback scores zero.
pub(crate) fn feedback_component(ratings: &[u8]) -> ScoreComponent {
    let sum: f64 = ratings.iter().map(|rating| f64::from(*rating)).sum();
    let count = ratings.len().max(1) as f64;
    let points = sum / count * FEEDBACK_MULTIPLIER;

    let notes = if ratings.is_empty() {
        "no feedback recorded".to_string()
    } else {
        format!("mean rating {:.2} across {} entries", sum / count, ratings.len())
    };

    ScoreComponent {
        factor: RankingFactor::Feedback,
        points,
        notes,
    }
}

pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
