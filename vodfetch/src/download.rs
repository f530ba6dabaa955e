use std::{
    collections::VecDeque,
    error::Error,
    fmt::Display,
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use futures::future::join_all;
use hlstream_rs::format::MediaSegment;
use log::{debug, warn};
use reqwest::Client;
use tokio::{
    fs::File,
    io::AsyncWriteExt,
    sync::{Mutex, mpsc},
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use url::Url;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

pub struct SegmentDownloader {
    http_client: Arc<Client>,
    workers: usize,
    retry_attempts: u32,
    retry_delay: Duration,
}

/// Outcome of a download pass over a segment list.
#[derive(Debug)]
pub struct DownloadReport {
    pub attempted: usize,
    pub completed: usize,
    /// Sequence numbers left without local bytes, with the last error seen
    pub failed: Vec<(u64, DownloadError)>,
}

struct Job {
    index: usize,
    sequence: u64,
    url: Url,
    path: PathBuf,
}

impl SegmentDownloader {
    pub fn new(http_client: Arc<Client>, workers: usize) -> Self {
        Self {
            http_client,
            workers: workers.max(1),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn set_retry_policy(&mut self, attempts: u32, delay: Duration) {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
    }

    /// Download every segment into `dir` with at most `workers` fetches in
    /// flight, storing each as `<sequence>.ts`. Returns only after every
    /// segment has been attempted; a failure stays confined to its segment.
    pub async fn download_all(
        &self,
        segments: &mut [MediaSegment],
        dir: &Path,
        cancel: &CancellationToken,
    ) -> DownloadReport {
        let queue = segments
            .iter()
            .enumerate()
            .map(|(index, segment)| Job {
                index,
                sequence: segment.sequence,
                url: segment.url.clone(),
                path: dir.join(format!("{}.ts", segment.sequence)),
            })
            .collect::<VecDeque<_>>();
        let queue = Arc::new(Mutex::new(queue));

        let (result_tx, mut result_rx) = mpsc::unbounded_channel();

        let mut handles = Vec::with_capacity(self.workers);
        for _ in 0..self.workers {
            let queue = queue.clone();
            let result_tx = result_tx.clone();
            let http_client = self.http_client.clone();
            let cancel = cancel.clone();
            let retry_attempts = self.retry_attempts;
            let retry_delay = self.retry_delay;

            handles.push(tokio::spawn(async move {
                loop {
                    let Some(job) = queue.lock().await.pop_front() else {
                        break;
                    };

                    let outcome = if cancel.is_cancelled() {
                        Err(DownloadError::Cancelled)
                    } else {
                        fetch_with_retry(&http_client, &job, retry_attempts, retry_delay, &cancel)
                            .await
                    };

                    if result_tx.send((job.index, job.sequence, outcome)).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(result_tx);

        // barrier: every worker has exited, every segment has been attempted
        join_all(handles).await;

        let mut report = DownloadReport {
            attempted: segments.len(),
            completed: 0,
            failed: Vec::new(),
        };

        // workers never touch the segment list; the local paths are applied
        // here, by the only writer
        while let Ok((index, sequence, outcome)) = result_rx.try_recv() {
            match outcome {
                Ok(path) => {
                    segments[index].local_path = Some(path);
                    report.completed += 1;
                }
                Err(e) => {
                    warn!("Failed to download segment {}: {}", sequence, e);
                    report.failed.push((sequence, e));
                }
            }
        }
        report.failed.sort_by_key(|x| x.0);

        report
    }
}

async fn fetch_with_retry(
    http_client: &Client,
    job: &Job,
    retry_attempts: u32,
    retry_delay: Duration,
    cancel: &CancellationToken,
) -> Result<PathBuf, DownloadError> {
    let mut attempt = 0;
    loop {
        match fetch_segment(http_client, job, cancel).await {
            Ok(path) => return Ok(path),
            Err(DownloadError::Cancelled) => return Err(DownloadError::Cancelled),
            Err(e) => {
                attempt += 1;
                if attempt > retry_attempts {
                    return Err(e);
                }

                debug!(
                    "Retry {}/{} for segment {}: {}",
                    attempt, retry_attempts, job.sequence, e
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                    _ = sleep(retry_delay) => {}
                }
            }
        }
    }
}

async fn fetch_segment(
    http_client: &Client,
    job: &Job,
    cancel: &CancellationToken,
) -> Result<PathBuf, DownloadError> {
    let mut response = tokio::select! {
        _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
        response = http_client.get(job.url.clone()).send() => response?,
    };

    if !response.status().is_success() {
        return Err(DownloadError::RequestNotSuccess(response.status().as_u16()));
    }

    let mut file = File::create(&job.path).await?;
    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            chunk = response.chunk() => chunk?,
        };
        let Some(chunk) = chunk else {
            break;
        };
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(job.path.clone())
}

#[derive(Debug)]
pub enum DownloadError {
    RequestError(reqwest::Error),
    RequestNotSuccess(u16),
    IoError(io::Error),
    Cancelled,
}

impl Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestError(e) => e.fmt(f),
            Self::RequestNotSuccess(status_code) => {
                write!(f, "Server respond with status code {}", status_code)
            }
            Self::IoError(e) => e.fmt(f),
            Self::Cancelled => write!(f, "Download was cancelled"),
        }
    }
}

impl Error for DownloadError {}

impl From<reqwest::Error> for DownloadError {
    fn from(value: reqwest::Error) -> Self {
        Self::RequestError(value)
    }
}

impl From<io::Error> for DownloadError {
    fn from(value: io::Error) -> Self {
        Self::IoError(value)
    }
}
