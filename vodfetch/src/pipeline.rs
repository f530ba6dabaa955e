use std::{io::Cursor, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};
use reqwest::{Client, Proxy};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    Config,
    download::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_WORKERS, SegmentDownloader},
    fetch::parse_manifest_async,
    merge::merge_segments,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Pipeline {
    pub config: Arc<Config>,
    pub http_client: Arc<Client>,
    downloader: SegmentDownloader,
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub segments: usize,
    pub downloaded: usize,
    /// Sequence numbers that contributed no bytes to the output
    pub dropped: Vec<u64>,
    pub merged: usize,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let mut builder = Client::builder().timeout(
            config
                .request_timeout
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        );

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        if let Some(proxy) = &config.proxy {
            info!("With proxy: {}", proxy);
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        let http_client = Arc::new(builder.build()?);

        let mut downloader = SegmentDownloader::new(
            http_client.clone(),
            config.workers.unwrap_or(DEFAULT_WORKERS),
        );
        downloader.set_retry_policy(
            config.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS),
            config
                .retry_delay_millis
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_DELAY),
        );

        Ok(Self {
            config,
            http_client,
            downloader,
        })
    }

    /// Fetch the playlist at `target`, download its segments and merge
    /// them into `<output>.mp4` (or a suffixed name when taken).
    pub async fn run(
        &self,
        target: &str,
        output: &str,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let address = Url::parse(target).context("Parse target address")?;

        let data = self
            .http_client
            .get(address.clone())
            .send()
            .await
            .context("Request manifest")?
            .error_for_status()
            .context("Request manifest")?
            .bytes()
            .await
            .context("Request bytes")?;

        let mut playlist = parse_manifest_async(Cursor::new(data), address)
            .await
            .context("Parse manifest")?;
        info!("Parsed {} segments", playlist.segments.len());

        // per-run staging directory next to the output, segments land as
        // <sequence>.ts and the directory goes away with the run
        let staging_dir = tempfile::Builder::new()
            .prefix(&format!("{}_", output))
            .tempdir_in(".")
            .context("Create staging directory")?;

        let download_report = self
            .downloader
            .download_all(&mut playlist.segments, staging_dir.path(), cancel)
            .await;
        if !download_report.failed.is_empty() {
            warn!(
                "Dropped {} of {} segments",
                download_report.failed.len(),
                download_report.attempted
            );
        }

        let merge_report =
            merge_segments(&playlist.segments, output).context("Create output file")?;

        Ok(RunReport {
            output_path: merge_report.output_path,
            segments: playlist.segments.len(),
            downloaded: download_report.completed,
            dropped: download_report.failed.into_iter().map(|x| x.0).collect(),
            merged: merge_report.merged,
        })
    }
}
