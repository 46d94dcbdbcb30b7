use std::{
    fs, io,
    path::{Path, PathBuf},
};

use time::OffsetDateTime;
use tracing::debug;

use mproc_model::{CommandTemplate, Variant};

use crate::{config::OrchestratorConfig, error::CoreError};

/// Journal file name inside a run's output directory.
pub const LOG_FILE: &str = "log";

/// Identity and location of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// First 8 hex chars of the template's blake3 digest.
    pub command_hash: String,
    pub started_at: OffsetDateTime,
    /// Effective pool size.
    pub concurrency: usize,
    /// Directory holding the journal and every output file. Unique per run.
    pub out_dir: PathBuf,
}

impl RunContext {
    /// Claim a fresh output directory for `template` under the configured root.
    pub fn create(
        cfg: &OrchestratorConfig,
        template: &CommandTemplate,
        concurrency: usize,
    ) -> Result<Self, CoreError> {
        let root = &cfg.output_root;
        fs::create_dir_all(root).map_err(|source| CoreError::Setup {
            path: root.display().to_string(),
            source,
        })?;

        let command_hash = command_hash(template.as_str());
        let out_dir = claim_dir(root, &command_hash).map_err(|source| CoreError::Setup {
            path: root.join(&command_hash).display().to_string(),
            source,
        })?;
        debug!(target: "mproc.core.context", dir = %out_dir.display(), "output directory claimed");

        let started_at = OffsetDateTime::now_utc().to_offset(cfg.utc_offset);
        Ok(Self {
            command_hash,
            started_at,
            concurrency,
            out_dir,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.out_dir.join(LOG_FILE)
    }

    pub fn output_path(&self, variant: &Variant) -> PathBuf {
        self.out_dir.join(&variant.output_name)
    }
}

/// Short stable digest of a command template.
pub fn command_hash(template: &str) -> String {
    let hex = blake3::hash(template.as_bytes()).to_hex();
    hex.as_str()[..8].to_string()
}

/// `<root>/<hash>`, or the first free `<root>/<hash>_<n>`.
///
/// `create_dir` fails on an existing path, so concurrent runs of the same
/// template never share a directory.
fn claim_dir(root: &Path, hash: &str) -> io::Result<PathBuf> {
    let mut n = 0usize;
    loop {
        let candidate = if n == 0 {
            root.join(hash)
        } else {
            root.join(format!("{hash}_{n}"))
        };
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}
