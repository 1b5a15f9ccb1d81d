use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::recruiting::applications::domain::{ApplicationId, DerivedRanking};
use crate::recruiting::applications::repository::ApplicationRepository;
use crate::recruiting::repository::RepositoryError;

/// Outcome of writing one ranking pass back to storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistenceSummary {
    pub attempted: usize,
    pub failed: usize,
}

impl PersistenceSummary {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failed == self.attempted
    }
}

/// Issue one write per application concurrently and wait for all of them.
///
/// There is no transaction: a partial failure leaves a mix of fresh and stale
/// scores until the next pass recomputes everything.
pub(crate) async fn persist_rankings<R>(
    repository: Arc<R>,
    writes: Vec<(ApplicationId, DerivedRanking)>,
    attempts: u32,
) -> PersistenceSummary
where
    R: ApplicationRepository + 'static,
{
    let mut summary = PersistenceSummary {
        attempted: writes.len(),
        failed: 0,
    };
    let mut tasks = JoinSet::new();

    for (id, ranking) in writes {
        let repository = repository.clone();
        tasks.spawn_blocking(move || {
            write_with_retry(repository.as_ref(), &id, ranking, attempts).map_err(|err| (id, err))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err((id, err))) => {
                summary.failed += 1;
                warn!(application_id = %id.0, error = %err, "failed to persist ranking");
            }
            Err(err) => {
                summary.failed += 1;
                warn!(error = %err, "ranking write task aborted");
            }
        }
    }

    summary
}

fn write_with_retry<R>(
    repository: &R,
    id: &ApplicationId,
    ranking: DerivedRanking,
    attempts: u32,
) -> Result<(), RepositoryError>
where
    R: ApplicationRepository + ?Sized,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match repository.store_ranking(id, ranking) {
            Ok(()) => return Ok(()),
            Err(err @ RepositoryError::NotFound) => return Err(err),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                debug!(application_id = %id.0, attempt, error = %err, "retrying ranking write");
                attempt += 1;
            }
        }
    }
}
