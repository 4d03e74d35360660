//! Local package materialization.
//!
//! Brings one exact release's files onto disk so the metadata extractor can
//! read them. A prebuilt wheel is preferred (download + unzip); when no
//! wheel exists or it cannot be unpacked, the general installer is invoked
//! as a fallback. Each cycle gets its own temporary scratch directory, so
//! concurrent in-flight requests can never contaminate each other and
//! cleanup is guaranteed on every exit path by the directory guard's `Drop`.

use crate::config::ResolverConfig;
use crate::error::{PypiError, Result};
use crate::registry::ReleaseFile;
use std::io::{self, Cursor};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use zip::ZipArchive;

/// Scratch directory holding one materialized release.
///
/// Removing the tree is tied to `Drop`, so an early return from extraction
/// still cleans up.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("depot-scratch-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Downloads or installs package files for metadata introspection.
pub struct Materializer {
    client: reqwest::Client,
    python_program: String,
    install_timeout: Duration,
}

impl Materializer {
    pub fn new(config: &ResolverConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("depot/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            python_program: config.python_program.clone(),
            install_timeout: config.install_timeout(),
        }
    }

    /// Materializes `name==version` into a fresh scratch directory.
    ///
    /// `files` is the release's artifact listing from the index; the first
    /// `bdist_wheel` entry is tried before falling back to the installer.
    ///
    /// # Errors
    ///
    /// Returns [`PypiError::Install`] when the fallback installer also fails
    /// or times out.
    pub async fn materialize(
        &self,
        name: &str,
        version: &str,
        files: &[ReleaseFile],
    ) -> Result<Scratch> {
        let scratch = Scratch::create()?;

        if let Some(wheel) = files.iter().find(|f| f.package_type == "bdist_wheel") {
            match self.fetch_wheel(wheel, scratch.path()).await {
                Ok(()) => {
                    tracing::debug!("unpacked wheel {} for {name} {version}", wheel.filename);
                    return Ok(scratch);
                }
                Err(e) => {
                    tracing::warn!(
                        "wheel {} unusable for {name} {version} ({e}), falling back to installer",
                        wheel.filename
                    );
                }
            }
        }

        self.pip_install(name, version, scratch.path()).await?;
        Ok(scratch)
    }

    /// Downloads a wheel and unpacks it into `target`.
    async fn fetch_wheel(&self, wheel: &ReleaseFile, target: &Path) -> Result<()> {
        let response = self
            .client
            .get(&wheel.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PypiError::Download {
                url: wheel.url.clone(),
                source: e,
            })?;

        let bytes = response.bytes().await.map_err(|e| PypiError::Download {
            url: wheel.url.clone(),
            source: e,
        })?;

        unpack_wheel(&bytes, &wheel.filename, target)
    }

    /// Installs the exact release into `target` with the general installer.
    ///
    /// `--no-deps` because only this package's own metadata is wanted, and
    /// a hard timeout because source builds can hang indefinitely.
    async fn pip_install(&self, name: &str, version: &str, target: &Path) -> Result<()> {
        let spec = format!("{name}=={version}");
        tracing::debug!("installing {spec} into {}", target.display());

        let mut command = tokio::process::Command::new(&self.python_program);
        command
            .args(["-m", "pip", "install", &spec, "--no-deps", "--quiet", "--target"])
            .arg(target)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let output = tokio::time::timeout(self.install_timeout, command.output())
            .await
            .map_err(|_| {
                PypiError::install(
                    name,
                    version,
                    format!("timed out after {}s", self.install_timeout.as_secs()),
                )
            })?
            .map_err(|e| PypiError::install(name, version, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().last().unwrap_or("exited with failure");
            return Err(PypiError::install(
                name,
                version,
                format!("{}: {reason}", output.status),
            ));
        }

        Ok(())
    }
}

/// Unpacks an in-memory wheel archive (a zip) under `target`.
///
/// Entries whose names escape the target directory are skipped rather than
/// written.
fn unpack_wheel(bytes: &[u8], filename: &str, target: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| PypiError::Unpack {
        filename: filename.to_string(),
        source: e,
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| PypiError::Unpack {
            filename: filename.to_string(),
            source: e,
        })?;

        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let path = target.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&path)?;
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&path)?;
        io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}
