use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::Result;
use crate::leonardo::LeonardoClient;
use crate::models::{FailureReason, GenerationDetails, GenerationJob, GenerationRequest, JobStatus};

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const ERROR_BACKOFF: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_WAIT_SECS: u64 = 120;

/// Drives one generation end to end: validate and submit the request, poll
/// the job until it reaches a terminal status, download the results.
pub struct Orchestrator {
    client: LeonardoClient,
    downloader: reqwest::Client,
    output_dir: PathBuf,
    max_wait: Duration,
}

impl Orchestrator {
    pub fn new(client: LeonardoClient, output_dir: PathBuf) -> Self {
        Orchestrator {
            client,
            downloader: reqwest::Client::new(),
            output_dir,
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
        }
    }

    pub fn with_max_wait(mut self, seconds: u64) -> Self {
        self.max_wait = Duration::from_secs(seconds);
        self
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Validate the request and post it, returning the server-assigned job
    /// id. Constraint violations fail here, before any network call.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<String> {
        request.validate()?;
        let payload = request.payload();
        let job_id = self.client.generation().create_generation(&payload).await?;
        log::info!("Generation started with id {}", job_id);
        Ok(job_id)
    }

    /// Poll the job at a fixed interval until it is COMPLETE or FAILED, or
    /// until the maximum wait elapses. A timed-out poll returns a job marked
    /// FAILED with a reason distinct from a server-reported failure, and the
    /// same job id can be polled again later without resubmitting.
    pub async fn poll(&self, job_id: &str) -> Result<GenerationJob> {
        let start = Instant::now();

        loop {
            if start.elapsed() >= self.max_wait {
                log::warn!(
                    "Gave up waiting for generation {} after {}s",
                    job_id,
                    self.max_wait.as_secs()
                );
                return Ok(GenerationJob::failed(
                    job_id,
                    FailureReason::TimedOut {
                        seconds: self.max_wait.as_secs(),
                    },
                ));
            }

            match self.client.generation().get_generation(job_id).await {
                Ok(details) => {
                    let job = job_from_details(job_id, &details);
                    if job.status.is_terminal() {
                        return Ok(job);
                    }
                    log::debug!(
                        "Generation {} still pending ({}s elapsed)",
                        job_id,
                        start.elapsed().as_secs()
                    );
                    sleep(POLL_INTERVAL).await;
                }
                Err(e) => {
                    // Transient query errors do not fail the job; back off
                    // and keep polling until the deadline.
                    log::warn!("Error checking status of {}: {}", job_id, e);
                    sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }

    /// Fetch each result URL into the output directory. Individual fetch
    /// failures are skipped, not fatal; the report says how many of N made
    /// it to disk.
    pub async fn download(&self, job: &GenerationJob) -> Result<DownloadReport> {
        fs::create_dir_all(&self.output_dir)?;

        let mut saved = Vec::new();
        let total = job.result_urls.len();

        for (index, url) in job.result_urls.iter().enumerate() {
            match self.fetch_image(url).await {
                Ok(bytes) => {
                    let path = self.output_dir.join(format!("{}_{}.png", job.id, index));
                    match fs::write(&path, &bytes) {
                        Ok(()) => {
                            log::info!("Image {} saved to {}", index + 1, path.display());
                            saved.push(path);
                        }
                        Err(e) => log::warn!("Could not write {}: {}", path.display(), e),
                    }
                }
                Err(e) => log::warn!("Could not fetch image {}: {}", index + 1, e),
            }
        }

        let report = DownloadReport { saved, attempted: total };
        log::info!("{}", report.summary());
        Ok(report)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        // Result URLs point at the vendor's CDN and need no auth headers.
        let response = self.downloader.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Map one status response onto the job state machine. Anything that is not
/// COMPLETE or FAILED leaves the job pending.
pub fn job_from_details(job_id: &str, details: &GenerationDetails) -> GenerationJob {
    match JobStatus::from_wire(&details.status) {
        JobStatus::Complete => {
            let urls = details
                .generations
                .iter()
                .filter_map(|image| image.url.clone())
                .collect();
            GenerationJob::complete(job_id, urls)
        }
        JobStatus::Failed => {
            let reason = details
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            GenerationJob::failed(job_id, FailureReason::Server(reason))
        }
        JobStatus::Pending => GenerationJob::pending(job_id),
    }
}

/// Outcome of a download pass over one job's result URLs.
#[derive(Debug)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    pub attempted: usize,
}

impl DownloadReport {
    pub fn summary(&self) -> String {
        format!("{} of {} image(s) downloaded", self.saved.len(), self.attempted)
    }

    pub fn is_complete(&self) -> bool {
        self.saved.len() == self.attempted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeneratedImage;

    fn details(status: &str) -> GenerationDetails {
        GenerationDetails {
            status: status.to_string(),
            generations: vec![
                GeneratedImage {
                    id: Some("img-1".into()),
                    url: Some("https://cdn.example/one.png".into()),
                },
                GeneratedImage {
                    id: Some("img-2".into()),
                    url: None,
                },
            ],
            error: None,
        }
    }

    #[test]
    fn complete_details_yield_urls_in_order() {
        let job = job_from_details("gen-1", &details("COMPLETE"));
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.result_urls, vec!["https://cdn.example/one.png"]);
        assert!(job.failure.is_none());
    }

    #[test]
    fn server_failure_reason_is_distinct_from_timeout() {
        let mut failed = details("FAILED");
        failed.error = Some("content policy".to_string());
        let job = job_from_details("gen-1", &failed);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(
            job.failure,
            Some(FailureReason::Server("content policy".to_string()))
        );

        let timed_out = GenerationJob::failed("gen-1", FailureReason::TimedOut { seconds: 120 });
        assert_ne!(job.failure, timed_out.failure);
        assert!(timed_out.failure.unwrap().to_string().contains("timed out"));
    }

    #[test]
    fn unknown_status_stays_pending() {
        let job = job_from_details("gen-1", &details("QUEUED"));
        assert_eq!(job.status, JobStatus::Pending);
        assert!(!job.status.is_terminal());
    }

    #[tokio::test]
    async fn poll_times_out_with_a_timeout_reason() {
        // A zero max wait trips the deadline before the first status query,
        // so no network is touched.
        let client = crate::leonardo::LeonardoClient::with_base_url("test-key", "http://127.0.0.1:0")
            .unwrap();
        let orchestrator = Orchestrator::new(client, PathBuf::from("unused")).with_max_wait(0);

        let job = orchestrator.poll("gen-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.failure, Some(FailureReason::TimedOut { seconds: 0 }));
        assert!(job.result_urls.is_empty());
    }

    #[test]
    fn report_counts_partial_success() {
        let report = DownloadReport {
            saved: vec![PathBuf::from("a.png"), PathBuf::from("b.png")],
            attempted: 3,
        };
        assert_eq!(report.summary(), "2 of 3 image(s) downloaded");
        assert!(!report.is_complete());
    }
}
