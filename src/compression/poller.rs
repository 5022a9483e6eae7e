//! Status polling and the wait-then-download flow.
//!
//! A single status check never fails from the caller's point of view: a
//! transport or protocol error becomes [`ProgressProbe::Unknown`], which
//! the `(progress, is_completed)` contract reports as `(0, false)`.
//!
//! [`download_when_ready`] drives the bounded re-poll loop:
//!
//! ```text
//! check ──complete──▶ download
//!   │
//!   └─not ready──▶ tick(2 s) ─▶ re-poll ─┬─complete──▶ check again
//!                     ▲                  ├─failed────▶ Err(JobFailed)
//!                     └──── < 10 ────────┴─10 reached─▶ Err(PollTimedOut)
//! ```
//!
//! The loop has a fixed interval, no backoff and no jitter. It stops on
//! completion, on an explicit `failed` status, or when the cap is reached;
//! nothing else cancels it.

use super::{
    CompressionService, DownloadedArchive, FileType, JobHandle, ProgressProbe, StartRequest,
};
use crate::config::PollPolicy;
use crate::error::DocstampError;
use crate::progress::DownloadObserver;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Issue one status request and return what is known about the job.
pub async fn probe_progress<S: CompressionService>(
    service: &S,
    handle: &JobHandle,
) -> ProgressProbe {
    match service.progress(handle).await {
        Ok(snapshot) => {
            debug!(
                "Job {}: {:.0}% (completed: {})",
                handle, snapshot.progress, snapshot.is_completed
            );
            ProgressProbe::Known(snapshot)
        }
        Err(e) => {
            warn!("Progress check for job {} failed: {}", handle, e);
            ProgressProbe::Unknown {
                reason: e.to_string(),
            }
        }
    }
}

/// Issue one status request and report `(progress, is_completed)` to
/// `callback` exactly once. Failures are reported as `(0.0, false)`.
pub async fn check_progress<S, F>(service: &S, handle: &JobHandle, callback: F)
where
    S: CompressionService,
    F: FnOnce(f64, bool),
{
    let (progress, completed) = probe_progress(service, handle).await.reported();
    callback(progress, completed);
}

/// Start a job, then wait for it and download the archive.
pub async fn start_and_download<S: CompressionService>(
    service: &S,
    request: &StartRequest,
    policy: PollPolicy,
    observer: &dyn DownloadObserver,
) -> Result<(JobHandle, DownloadedArchive), DocstampError> {
    policy.validate()?;
    let handle = match service.start(request).await {
        Ok(handle) => handle,
        Err(e) => {
            if let DocstampError::JobRejected { ref message } = e {
                observer.on_rejected(message);
            }
            return Err(e);
        }
    };
    observer.on_job_started(&handle);

    let archive = download_when_ready(service, &handle, request.file_type, policy, observer).await?;
    Ok((handle, archive))
}

/// Download the archive of `handle`, waiting for the job if necessary.
///
/// The first status check happens immediately. If the job is not done, the
/// job is re-polled every `policy.interval` for at most `policy.max_retries`
/// attempts. A completed re-poll leads back to a fresh confirmation check
/// before the download. The download itself is attempted once; its failure
/// is returned as-is.
pub async fn download_when_ready<S: CompressionService>(
    service: &S,
    handle: &JobHandle,
    file_type: FileType,
    policy: PollPolicy,
    observer: &dyn DownloadObserver,
) -> Result<DownloadedArchive, DocstampError> {
    policy.validate()?;

    loop {
        let probe = observe(service, handle, observer).await;
        fail_if_job_failed(&probe)?;

        if probe.is_completed() {
            return fetch_archive(service, handle, file_type, observer).await;
        }

        info!("Job {} is not complete yet; re-checking every {:?}", handle, policy.interval);
        observer.on_not_ready(handle);
        wait_for_completion(service, handle, policy, observer).await?;
    }
}

/// Re-poll on a fixed interval until the job completes or the cap is hit.
async fn wait_for_completion<S: CompressionService>(
    service: &S,
    handle: &JobHandle,
    policy: PollPolicy,
    observer: &dyn DownloadObserver,
) -> Result<(), DocstampError> {
    // First tick one full interval from now.
    let mut ticker = interval_at(Instant::now() + policy.interval, policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for attempt in 1..=policy.max_retries {
        ticker.tick().await;
        observer.on_retry(attempt, policy.max_retries);

        let probe = observe(service, handle, observer).await;
        fail_if_job_failed(&probe)?;
        if probe.is_completed() {
            debug!("Job {} completed after {} re-poll(s)", handle, attempt);
            return Ok(());
        }
    }

    warn!(
        "Job {} still incomplete after {} re-polls; giving up",
        handle, policy.max_retries
    );
    observer.on_timed_out(policy.max_retries);
    Err(DocstampError::PollTimedOut {
        attempts: policy.max_retries,
    })
}

/// Probe once and forward the outcome to the observer.
async fn observe<S: CompressionService>(
    service: &S,
    handle: &JobHandle,
    observer: &dyn DownloadObserver,
) -> ProgressProbe {
    let probe = probe_progress(service, handle).await;
    if let ProgressProbe::Unknown { ref reason } = probe {
        observer.on_probe_failed(reason);
    }
    let (progress, completed) = probe.reported();
    observer.on_progress(progress, completed);
    probe
}

fn fail_if_job_failed(probe: &ProgressProbe) -> Result<(), DocstampError> {
    match probe {
        ProgressProbe::Known(s) if s.is_failed() => Err(DocstampError::JobFailed {
            message: s
                .error_message
                .clone()
                .unwrap_or_else(|| "no error message".to_string()),
        }),
        _ => Ok(()),
    }
}

async fn fetch_archive<S: CompressionService>(
    service: &S,
    handle: &JobHandle,
    file_type: FileType,
    observer: &dyn DownloadObserver,
) -> Result<DownloadedArchive, DocstampError> {
    match service.download(handle, file_type).await {
        Ok(archive) => {
            observer.on_downloaded(&archive.filename, archive.bytes.len());
            Ok(archive)
        }
        Err(e) => {
            if let DocstampError::DownloadRejected { ref message } = e {
                observer.on_rejected(message);
            }
            Err(e)
        }
    }
}
