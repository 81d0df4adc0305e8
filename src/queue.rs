use crate::entity::Translatable;
use crate::pipeline::{EntityTranslator, TranslationReport};
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type JobId = u64;

/// Lifecycle of one background translation.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Waiting for a worker slot.
    Pending,
    Running,
    /// Every non-empty field was translated and stored.
    Done(TranslationReport),
    /// At least one field could not be translated; the report says which.
    Failed(TranslationReport),
    /// The worker died (panicked or was cancelled) before producing a report.
    Aborted(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

/// Runs entity translations off the request path with bounded concurrency.
///
/// `trigger_translation` returns as soon as the job is queued. Each job runs
/// under a supervising task that records its final status, so statuses settle
/// without anyone calling [`wait_idle`](Self::wait_idle). Finished statuses are
/// kept until [`clear_finished`](Self::clear_finished). There is no
/// cancellation; a job that is still running when the process exits simply
/// leaves its remaining fields untranslated until the next edit.
pub struct TranslationQueue {
    translator: Arc<EntityTranslator>,
    semaphore: Arc<Semaphore>,
    jobs: Arc<RwLock<HashMap<JobId, JobStatus>>>,
    handles: Mutex<Vec<(JobId, JoinHandle<()>)>>,
    next_id: AtomicU64,
    progress: Option<ProgressBar>,
}

impl TranslationQueue {
    pub fn new(translator: EntityTranslator, concurrency: usize) -> Self {
        Self {
            translator: Arc::new(translator),
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            handles: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            progress: None,
        }
    }

    /// Tick `progress` once per finished job.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Queue a full translation of `entity`. Call after every create or update.
    pub async fn trigger_translation<E>(&self, entity: E) -> JobId
    where
        E: Translatable + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.jobs.write().await.insert(id, JobStatus::Pending);

        debug!(
            "Queued translation job {} for {}:{}",
            id,
            entity.source_type(),
            entity.id()
        );

        let semaphore = self.semaphore.clone();
        let translator = self.translator.clone();
        let worker_jobs = self.jobs.clone();

        let worker = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return None;
            };
            worker_jobs.write().await.insert(id, JobStatus::Running);
            Some(translator.translate_entity(&entity).await)
        });

        let jobs = self.jobs.clone();
        let progress = self.progress.clone();

        let handle = tokio::spawn(async move {
            let status = match worker.await {
                Ok(Some(report)) if report.is_complete() => JobStatus::Done(report),
                Ok(Some(report)) => JobStatus::Failed(report),
                Ok(None) => JobStatus::Aborted("translation queue closed".to_string()),
                Err(e) => {
                    warn!("Translation job {} aborted: {}", id, e);
                    JobStatus::Aborted(e.to_string())
                }
            };
            jobs.write().await.insert(id, status);

            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        });

        let mut handles = self.handles.lock().await;
        handles.retain(|(_, h)| !h.is_finished());
        handles.push((id, handle));
        id
    }

    pub async fn status(&self, id: JobId) -> Option<JobStatus> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Number of jobs not yet finished.
    pub async fn outstanding(&self) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|s| !s.is_finished())
            .count()
    }

    /// Wait for every job still tracked to finish.
    pub async fn wait_idle(&self) {
        let handles: Vec<(JobId, JoinHandle<()>)> = self.handles.lock().await.drain(..).collect();
        let count = handles.len();

        for (id, handle) in handles {
            if let Err(e) = handle.await {
                warn!("Translation job {} aborted: {}", id, e);
                self.jobs
                    .write()
                    .await
                    .insert(id, JobStatus::Aborted(e.to_string()));
            }
        }

        if count > 0 {
            info!("Translation queue idle after {} job(s)", count);
        }
    }

    /// Drop the status of finished jobs.
    pub async fn clear_finished(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, s| !s.is_finished());
        before - jobs.len()
    }
}
