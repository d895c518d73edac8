//! Execution backends for candidate shaders.
//!
//! A dispatcher runs one candidate and reports either a render artifact or
//! a diagnostic. Two variants: a local subprocess renderer (no retry; a
//! failure is authoritative) and a remote job queue (bounded retries over a
//! transport, shared job counter for correlating responses).
//!
//! # Invariants
//! - One render invocation is bounded by the configured timeout; expiry is a
//!   dispatch error, never a hang.
//! - The remote job counter is strictly increasing across the run and is the
//!   only mutable state shared between dispatch calls.

use std::fs;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::errors::{DispatchError, ErrorClass, TransportError, UsageError};

/// Outcome category of one candidate execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RenderStatus {
    /// An image was produced.
    ImageReady,
    /// The shader failed to compile.
    CompileError,
    /// The shader compiled but failed to link.
    LinkError,
    /// The backend skipped execution (compile-only request, or the remote
    /// client repeatedly crashed on this candidate).
    Skipped,
    /// Execution failed for another reason.
    UnexpectedError,
}

/// Result of executing one candidate.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Outcome category.
    pub status: RenderStatus,
    /// Image bytes when `status == ImageReady`.
    pub image: Option<Vec<u8>>,
    /// Compiler/validator/driver log text.
    pub log: String,
}

impl RenderResult {
    /// True when an image artifact was produced.
    pub fn produced_image(&self) -> bool {
        self.status == RenderStatus::ImageReady && self.image.is_some()
    }
}

/// Per-invocation execution options.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    /// Request compilation only; meaningful when reducing compile or link
    /// errors, where rendering is wasted work.
    pub skip_render: bool,
}

/// Contract for executing a candidate shader file.
///
/// The candidate's sidecar metadata file sits next to the shader with a
/// `.json` extension; implementations that need it resolve it themselves.
pub trait ShaderDispatcher {
    fn render(&self, shader: &Path, options: &RenderOptions)
        -> Result<RenderResult, DispatchError>;
}

// ----------------------------------------------------------------------------
// Local dispatcher
// ----------------------------------------------------------------------------

/// Configuration for the local subprocess renderer.
#[derive(Clone, Debug)]
pub struct LocalDispatcherConfig {
    /// Renderer executable invoked as
    /// `renderer <shader> --output <image> [--swiftshader] [--compile-only]`.
    pub renderer: PathBuf,
    /// Use the software rasterizer instead of hardware rendering.
    pub software_rasterizer: bool,
    /// Per-invocation wall-clock limit.
    pub timeout: Duration,
}

impl Default for LocalDispatcherConfig {
    fn default() -> Self {
        Self {
            renderer: PathBuf::from("get_image"),
            software_rasterizer: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Executes candidates via a local renderer subprocess. No retry.
#[derive(Clone, Debug)]
pub struct LocalDispatcher {
    config: LocalDispatcherConfig,
}

impl LocalDispatcher {
    pub fn new(config: LocalDispatcherConfig) -> Self {
        Self { config }
    }

    /// Wait for the child with a deadline, killing it on expiry.
    fn wait_with_deadline(
        child: &mut std::process::Child,
        limit: Duration,
    ) -> Result<std::process::ExitStatus, DispatchError> {
        let deadline = Instant::now() + limit;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(DispatchError::Timeout { limit });
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(err) => return Err(DispatchError::Io(err)),
            }
        }
    }
}

impl ShaderDispatcher for LocalDispatcher {
    fn render(
        &self,
        shader: &Path,
        options: &RenderOptions,
    ) -> Result<RenderResult, DispatchError> {
        let image_path = shader.with_extension("png");

        let mut cmd = Command::new(&self.config.renderer);
        cmd.arg(shader)
            .arg("--output")
            .arg(&image_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if self.config.software_rasterizer {
            cmd.arg("--swiftshader");
        }
        if options.skip_render {
            cmd.arg("--compile-only");
        }

        let mut child = cmd.spawn().map_err(DispatchError::Spawn)?;
        let status = Self::wait_with_deadline(&mut child, self.config.timeout)?;

        let mut log = String::new();
        if let Some(mut err) = child.stderr.take() {
            let _ = err.read_to_string(&mut log);
        }
        if let Some(mut out) = child.stdout.take() {
            let _ = out.read_to_string(&mut log);
        }

        if !status.success() {
            return Ok(RenderResult {
                status: RenderStatus::CompileError,
                image: None,
                log,
            });
        }

        if options.skip_render {
            return Ok(RenderResult {
                status: RenderStatus::Skipped,
                image: None,
                log,
            });
        }

        match fs::read(&image_path) {
            Ok(bytes) => Ok(RenderResult {
                status: RenderStatus::ImageReady,
                image: Some(bytes),
                log,
            }),
            // Exit zero with no image: treat as an execution failure the
            // judges can interpret, not a dispatch error.
            Err(_) => Ok(RenderResult {
                status: RenderStatus::UnexpectedError,
                image: None,
                log,
            }),
        }
    }
}

// ----------------------------------------------------------------------------
// Remote dispatcher
// ----------------------------------------------------------------------------

/// One render job as submitted to the remote queue.
#[derive(Clone, Debug)]
pub struct RenderJob<'a> {
    /// Run-unique job id drawn from the dispatcher's shared counter.
    pub job_id: u64,
    /// Client token identifying the device that should execute the job.
    pub token: &'a str,
    /// Shader source text.
    pub source: &'a str,
    /// Sidecar metadata JSON text.
    pub metadata: &'a str,
    /// Compile-only request.
    pub skip_render: bool,
}

/// Transport-level contract for the remote job queue.
///
/// Implementations handle the actual network calls; the dispatcher handles
/// job numbering and retry. Errors carry their own retry classification.
pub trait JobClient {
    fn submit(&self, job: &RenderJob<'_>) -> Result<RenderResult, TransportError>;
}

/// Suffix appended to the server URL to form the job endpoint.
pub const MANAGE_API_SUFFIX: &str = "/manageAPI";

/// Executes candidates via a remote job queue with bounded retries.
#[derive(Debug)]
pub struct RemoteDispatcher<C: JobClient> {
    client: C,
    endpoint: String,
    token: String,
    /// Strictly increasing across the run; each attempt draws a fresh id.
    job_counter: AtomicU64,
    /// Additional attempts allowed after the first failure.
    retry_limit: u32,
}

impl<C: JobClient> RemoteDispatcher<C> {
    /// Build a dispatcher for `server_url` (the endpoint suffix is appended
    /// here, once). A server without a client token is a usage error.
    pub fn new(
        client: C,
        server_url: &str,
        token: impl Into<String>,
        retry_limit: u32,
    ) -> Result<Self, UsageError> {
        let token = token.into();
        if token.is_empty() {
            return Err(UsageError::MissingClientToken);
        }
        Ok(Self {
            client,
            endpoint: format!("{}{}", server_url.trim_end_matches('/'), MANAGE_API_SUFFIX),
            token,
            job_counter: AtomicU64::new(0),
            retry_limit,
        })
    }

    /// The resolved job endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Number of jobs submitted so far (all attempts).
    pub fn jobs_submitted(&self) -> u64 {
        self.job_counter.load(Ordering::SeqCst)
    }

    fn next_job_id(&self) -> u64 {
        self.job_counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl<C: JobClient> ShaderDispatcher for RemoteDispatcher<C> {
    fn render(
        &self,
        shader: &Path,
        options: &RenderOptions,
    ) -> Result<RenderResult, DispatchError> {
        let source = fs::read_to_string(shader).map_err(DispatchError::Io)?;
        let metadata_path = shader.with_extension("json");
        let metadata = fs::read_to_string(&metadata_path).map_err(DispatchError::Io)?;

        let max_attempts = self.retry_limit + 1;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let job = RenderJob {
                job_id: self.next_job_id(),
                token: &self.token,
                source: &source,
                metadata: &metadata,
                skip_render: options.skip_render,
            };
            match self.client.submit(&job) {
                Ok(reply) => return Ok(reply),
                Err(err) => match err.class {
                    ErrorClass::Permanent => return Err(DispatchError::Transport(err)),
                    ErrorClass::Retryable => {
                        if attempts >= max_attempts {
                            return Err(DispatchError::RetriesExhausted { attempts });
                        }
                    }
                },
            }
        }
    }
}
