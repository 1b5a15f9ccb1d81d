//! End-to-end ranking scenarios driven through the public services and router.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, Utc};

    use hirehub::recruiting::applications::{
        ApplicationId, ApplicationRecord, ApplicationRepository, ApplicationService,
        ApplicationStatus, DerivedRanking, FeedbackEntry,
    };
    use hirehub::recruiting::events::OutboxEntry;
    use hirehub::recruiting::jobs::{
        EmploymentType, ExperienceRange, JobDraft, JobId, JobPosting, JobRepository, JobService,
        JobStatus, SalaryRange,
    };
    use hirehub::recruiting::profiles::{ProfileDirectory, UserProfile};
    use hirehub::recruiting::{
        DomainEvent, EventOutbox, OwnershipPolicy, RepositoryError, Role, UserId,
    };

    #[derive(Default)]
    pub struct Store {
        jobs: Mutex<HashMap<JobId, JobPosting>>,
        applications: Mutex<HashMap<ApplicationId, ApplicationRecord>>,
        profiles: Mutex<HashMap<UserId, UserProfile>>,
        events: Mutex<Vec<DomainEvent>>,
    }

    impl Store {
        pub fn ranking_of(&self, id: &ApplicationId) -> DerivedRanking {
            self.applications
                .lock()
                .expect("store poisoned")
                .get(id)
                .map(|record| record.ranking)
                .expect("application stored")
        }

        pub fn events(&self) -> Vec<DomainEvent> {
            self.events.lock().expect("store poisoned").clone()
        }

        fn applications_where(
            &self,
            keep: impl Fn(&ApplicationRecord) -> bool,
        ) -> Vec<ApplicationRecord> {
            self.applications
                .lock()
                .expect("store poisoned")
                .values()
                .filter(|record| keep(record))
                .cloned()
                .collect()
        }
    }

    impl JobRepository for Store {
        fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
            self.jobs
                .lock()
                .expect("store poisoned")
                .insert(job.id.clone(), job.clone());
            Ok(job)
        }

        fn record_application(&self, id: &JobId) -> Result<u32, RepositoryError> {
            let mut guard = self.jobs.lock().expect("store poisoned");
            let job = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
            job.applications_count += 1;
            Ok(job.applications_count)
        }

        fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
            Ok(self.jobs.lock().expect("store poisoned").get(id).cloned())
        }

        fn all(&self) -> Result<Vec<JobPosting>, RepositoryError> {
            Ok(self
                .jobs
                .lock()
                .expect("store poisoned")
                .values()
                .cloned()
                .collect())
        }
    }

    impl ApplicationRepository for Store {
        fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
            let mut guard = self.applications.lock().expect("store poisoned");
            if guard
                .values()
                .any(|existing| existing.job == record.job && existing.applicant == record.applicant)
            {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(record.id.clone(), record.clone());
            Ok(record)
        }

        fn append_feedback(
            &self,
            id: &ApplicationId,
            entry: FeedbackEntry,
        ) -> Result<ApplicationRecord, RepositoryError> {
            let mut guard = self.applications.lock().expect("store poisoned");
            let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
            record.updated_at = entry.created_at;
            record.feedback.push(entry);
            Ok(record.clone())
        }

        fn set_status(
            &self,
            id: &ApplicationId,
            status: ApplicationStatus,
            updated_at: DateTime<Utc>,
        ) -> Result<ApplicationRecord, RepositoryError> {
            let mut guard = self.applications.lock().expect("store poisoned");
            let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
            record.status = status;
            record.updated_at = updated_at;
            Ok(record.clone())
        }

        fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
            Ok(self
                .applications
                .lock()
                .expect("store poisoned")
                .get(id)
                .cloned())
        }

        fn for_job(&self, job: &JobId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
            Ok(self.applications_where(|record| &record.job == job))
        }

        fn for_applicant(
            &self,
            applicant: &UserId,
        ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
            Ok(self.applications_where(|record| &record.applicant == applicant))
        }

        fn for_recruiter(
            &self,
            recruiter: &UserId,
        ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
            Ok(self.applications_where(|record| &record.recruiter == recruiter))
        }

        fn store_ranking(
            &self,
            id: &ApplicationId,
            ranking: DerivedRanking,
        ) -> Result<(), RepositoryError> {
            let mut guard = self.applications.lock().expect("store poisoned");
            let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
            record.ranking = ranking;
            Ok(())
        }
    }

    impl ProfileDirectory for Store {
        fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
            Ok(self.profiles.lock().expect("store poisoned").get(id).cloned())
        }

        fn upsert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError> {
            self.profiles
                .lock()
                .expect("store poisoned")
                .insert(profile.user_id.clone(), profile.clone());
            Ok(profile)
        }
    }

    impl EventOutbox for Store {
        fn record(&self, event: DomainEvent) -> Result<u64, RepositoryError> {
            let mut events = self.events.lock().expect("store poisoned");
            events.push(event);
            Ok(events.len() as u64)
        }

        fn pending(&self, _limit: usize) -> Result<Vec<OutboxEntry>, RepositoryError> {
            Ok(Vec::new())
        }

        fn acknowledge(&self, _id: u64) -> Result<(), RepositoryError> {
            Ok(())
        }

        fn mark_failed(&self, _id: u64, _error: &str) -> Result<(), RepositoryError> {
            Ok(())
        }

        fn dead_letter(&self, _id: u64) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    pub struct Board {
        pub store: Arc<Store>,
        pub jobs: Arc<JobService<Store>>,
        pub applications: Arc<ApplicationService<Store, Store>>,
    }

    pub fn board() -> Board {
        let store = Arc::new(Store::default());
        let jobs = JobService::new(store.clone(), store.clone(), Arc::new(OwnershipPolicy));
        let applications =
            ApplicationService::new(store.clone(), store.clone(), store.clone(), store.clone());
        Board {
            store,
            jobs: Arc::new(jobs),
            applications: Arc::new(applications),
        }
    }

    pub fn profile(id: &str, role: Role, skills: &[&str], experience: Option<f64>) -> UserProfile {
        UserProfile {
            user_id: UserId(id.to_string()),
            name: id.to_string(),
            email: format!("{id}@example.com"),
            role,
            company: (role == Role::Recruiter).then(|| "Globex".to_string()),
            skills: Some(skills.iter().map(|s| s.to_string()).collect()),
            experience,
        }
    }

    pub fn draft(skills: &[&str], min_experience: f64) -> JobDraft {
        JobDraft {
            title: "Platform Engineer".to_string(),
            description: "Own the deployment pipeline".to_string(),
            requirements: Vec::new(),
            location: "Lisbon".to_string(),
            employment_type: EmploymentType::Contract,
            salary: SalaryRange::default(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience: ExperienceRange {
                min: min_experience,
                max: 0.0,
            },
            deadline: Utc::now() + Duration::days(7),
            status: JobStatus::Open,
        }
    }
}

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{board, draft, profile};
use hirehub::recruiting::access::{USER_ID_HEADER, USER_ROLE_HEADER};
use hirehub::recruiting::applications::{
    application_router, ApplicationStatus, ApplicationSubmission, FeedbackSubmission,
};
use hirehub::recruiting::profiles::ProfileDirectory;
use hirehub::recruiting::{Actor, DomainEvent, Role};
use tower::ServiceExt;

fn submission(job: &hirehub::recruiting::jobs::JobId) -> ApplicationSubmission {
    ApplicationSubmission {
        job_id: job.clone(),
        resume_url: "https://cdn.example.com/cv.pdf".to_string(),
        cover_letter: "Hello".to_string(),
        referred_by: None,
    }
}

#[tokio::test]
async fn feedback_moves_a_candidate_up_on_the_next_pass() {
    let board = board();
    let recruiter = Actor::recruiter("r-1");
    board
        .store
        .upsert(profile("r-1", Role::Recruiter, &[], None))
        .expect("profile stored");
    board
        .store
        .upsert(profile("s-skilled", Role::JobSeeker, &["terraform", "aws"], Some(6.0)))
        .expect("profile stored");
    board
        .store
        .upsert(profile("s-junior", Role::JobSeeker, &[], Some(1.0)))
        .expect("profile stored");

    let job = board
        .jobs
        .create(&recruiter, draft(&["Terraform", "AWS", "Kubernetes"], 4.0))
        .expect("job created");
    assert_eq!(job.company, "Globex");

    let skilled = board
        .applications
        .submit(&Actor::job_seeker("s-skilled"), submission(&job.id))
        .expect("applied");
    let junior = board
        .applications
        .submit(&Actor::job_seeker("s-junior"), submission(&job.id))
        .expect("applied");

    let first = board
        .applications
        .rank(&recruiter, &job.id)
        .await
        .expect("first pass");
    let scores: Vec<_> = first
        .applications
        .iter()
        .map(|entry| (entry.id.clone(), entry.ranking))
        .collect();
    // 2/3 skills -> 33.33, full experience -> 30; junior gets 1/4 of 30.
    assert_eq!(scores, vec![(skilled.id.clone(), 63), (junior.id.clone(), 8)]);

    for rating in [5, 5, 4] {
        board
            .applications
            .add_feedback(
                &recruiter,
                &junior.id,
                FeedbackSubmission {
                    rating,
                    comment: "Sharp in the pairing session".to_string(),
                    stage: "Technical".to_string(),
                },
            )
            .expect("feedback added");
    }

    let second = board
        .applications
        .rank(&recruiter, &job.id)
        .await
        .expect("second pass");
    assert_eq!(second.applications[0].id, junior.id);
    // 7.5 + 14 * 20 / 3 = 100.83
    assert_eq!(second.applications[0].ranking, 101);
    assert_eq!(board.store.ranking_of(&junior.id).score, 101);
    assert_eq!(board.store.ranking_of(&skilled.id).score, 63);

    let ranked_events = board
        .store
        .events()
        .into_iter()
        .filter(|event| matches!(event, DomainEvent::ApplicationsRanked { .. }))
        .count();
    assert_eq!(ranked_events, 2);
}

#[tokio::test]
async fn router_serves_ranking_to_the_owner_only() {
    let board = board();
    let recruiter = Actor::recruiter("r-1");
    let job = board
        .jobs
        .create(&recruiter, draft(&["Go"], 0.0))
        .expect("job created");
    let application = board
        .applications
        .submit(&Actor::job_seeker("s-1"), submission(&job.id))
        .expect("applied");
    board
        .applications
        .update_status(&recruiter, &application.id, ApplicationStatus::UnderReview)
        .expect("status updated");

    let router = application_router(board.applications.clone());
    let uri = format!("/api/v1/applications/job/{}/rank", job.id.0);

    let owner = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(USER_ID_HEADER, "r-1")
                .header(USER_ROLE_HEADER, "recruiter")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(owner.status(), StatusCode::OK);
    let body = axum::body::to_bytes(owner.into_body(), 64 * 1024)
        .await
        .expect("body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(payload[0]["ranking"], 30);
    assert_eq!(payload[0]["status"], "Under Review");

    let applicant = router
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(USER_ID_HEADER, "s-1")
                .header(USER_ROLE_HEADER, "jobSeeker")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(applicant.status(), StatusCode::FORBIDDEN);
}
