//! Ingestion job status polling and classification
//!
//! Jobs transition server-side (RUNNING → FAILED | COMPLETED); this module
//! only observes. One batch call issues an independent status query per job
//! id and partitions the ids into three disjoint buckets. A query that errors
//! leaves its id in the running bucket for this batch, so one unreachable job
//! never blocks visibility into the others; the id is queried again on the
//! next call.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wdg_common::headers::RequestHeaders;

use crate::client::{IngestionApi, JobStatusResponse, MasterJobStatus};

/// Tri-partition of a polled batch: every input id lands in exactly one list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsPullingResult {
    /// Ids not yet terminal (including ids whose query failed this round)
    pub running: Vec<String>,
    pub failed: Vec<JobStatusResponse>,
    pub completed: Vec<JobStatusResponse>,
}

impl JobsPullingResult {
    pub fn all_terminal(&self) -> bool {
        self.running.is_empty()
    }
}

/// Polls job status endpoints with bounded fan-out
pub struct JobStatusAggregator {
    backend: Arc<dyn IngestionApi>,
    fan_out: usize,
}

impl JobStatusAggregator {
    pub fn new(backend: Arc<dyn IngestionApi>, fan_out: usize) -> Self {
        Self {
            backend,
            fan_out: fan_out.max(1),
        }
    }

    /// Classify one batch of job ids by their current master status.
    ///
    /// No retry happens inside a single call; retry cadence is the caller's
    /// concern (repeated invocation until terminal or deadline).
    pub async fn poll_batch(
        &self,
        job_ids: &[String],
        headers: &RequestHeaders,
    ) -> JobsPullingResult {
        // Duplicate ids would make the buckets double-count.
        let mut seen = HashSet::new();
        let unique_ids: Vec<&String> =
            job_ids.iter().filter(|id| seen.insert(id.as_str())).collect();

        let status_futures: Vec<_> = unique_ids
            .into_iter()
            .map(|job_id| async move {
                match self.backend.job_status(job_id, headers).await {
                    Ok(response) => (job_id.clone(), Some(response)),
                    Err(err) => {
                        // Treated as still running for this batch; polled
                        // again on the next call.
                        tracing::warn!(
                            job_id = %job_id,
                            error = %err,
                            "Job status query failed, keeping job in running bucket"
                        );
                        (job_id.clone(), None)
                    }
                }
            })
            .collect();
        let statuses: Vec<(String, Option<JobStatusResponse>)> = stream::iter(status_futures)
            .buffer_unordered(self.fan_out)
            .collect()
            .await;

        let mut result = JobsPullingResult::default();
        for (job_id, status) in statuses {
            match status {
                None => result.running.push(job_id),
                Some(response) => match response.job_info.master_job_status {
                    MasterJobStatus::Running => result.running.push(job_id),
                    MasterJobStatus::Failed => result.failed.push(response),
                    MasterJobStatus::Completed => result.completed.push(response),
                },
            }
        }

        tracing::debug!(
            running = result.running.len(),
            failed = result.failed.len(),
            completed = result.completed.len(),
            "Polled job batch"
        );
        result
    }

    /// Poll repeatedly until every id reaches a terminal bucket or the
    /// deadline elapses; ids still running at the deadline stay in `running`.
    pub async fn await_terminal(
        &self,
        job_ids: &[String],
        headers: &RequestHeaders,
        poll_interval: Duration,
        deadline: Duration,
    ) -> JobsPullingResult {
        let started = Instant::now();
        let mut outstanding: Vec<String> = job_ids.to_vec();
        let mut failed = Vec::new();
        let mut completed = Vec::new();

        loop {
            let round = self.poll_batch(&outstanding, headers).await;
            failed.extend(round.failed);
            completed.extend(round.completed);
            outstanding = round.running;

            if outstanding.is_empty() || started.elapsed() >= deadline {
                break;
            }
            tokio::time::sleep(poll_interval).await;
        }

        if !outstanding.is_empty() {
            tracing::warn!(
                outstanding = outstanding.len(),
                "Deadline elapsed with jobs still running"
            );
        }

        JobsPullingResult {
            running: outstanding,
            failed,
            completed,
        }
    }
}
