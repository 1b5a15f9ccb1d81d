use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hirehub::config::{AppConfig, RankingSettings};
use hirehub::error::AppError;
use hirehub::recruiting::applications::ApplicationService;
use hirehub::recruiting::events::{DrainReport, Notifier};
use hirehub::recruiting::jobs::JobService;
use hirehub::recruiting::OwnershipPolicy;
use hirehub::telemetry;
use tracing::{info, warn};

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryJobRepository, InMemoryOutbox,
    InMemoryProfileDirectory, LogMailTransport,
};
use crate::routes::{with_board_routes, Services};

const DRAIN_BATCH: usize = 50;

pub(crate) fn build_services(settings: RankingSettings) -> (Services, Arc<InMemoryOutbox>) {
    let jobs = Arc::new(InMemoryJobRepository::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let profiles = Arc::new(InMemoryProfileDirectory::default());
    let outbox = Arc::new(InMemoryOutbox::default());
    let policy = Arc::new(OwnershipPolicy);

    let job_service = JobService::new(jobs.clone(), profiles.clone(), policy.clone());
    let application_service =
        ApplicationService::new(applications, outbox.clone(), jobs, profiles.clone())
            .with_policy(policy)
            .with_ranking_settings(settings);

    let services = Services {
        jobs: Arc::new(job_service),
        applications: Arc::new(application_service),
        profiles,
    };
    (services, outbox)
}

fn spawn_notifier(
    outbox: Arc<InMemoryOutbox>,
    profiles: Arc<InMemoryProfileDirectory>,
    max_attempts: u32,
    every: Duration,
) {
    let notifier = Notifier::new(outbox, Arc::new(LogMailTransport), profiles, max_attempts);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match notifier.drain(DRAIN_BATCH) {
                Ok(report) if report == DrainReport::default() => {}
                Ok(report) => info!(
                    delivered = report.delivered,
                    skipped = report.skipped,
                    retrying = report.retrying,
                    dead_lettered = report.dead_lettered,
                    "notification outbox drained"
                ),
                Err(err) => warn!(error = %err, "notification drain failed"),
            }
        }
    });
}

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (services, outbox) = build_services(config.ranking);
    spawn_notifier(
        outbox,
        services.profiles.clone(),
        config.notifications.max_attempts,
        config.notifications.drain_interval(),
    );

    let app = with_board_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "hirehub api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
