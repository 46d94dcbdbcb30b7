//! Shared list of live orchestrator pids, one per line.
//!
//! Every access takes an advisory lock on the file, so concurrent runs and
//! `kill` never interleave their read-modify-write cycles.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use fd_lock::RwLock;
use tracing::{trace, warn};

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct RunRegistry {
    path: PathBuf,
}

impl RunRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add `pid`; a no-op if it is already listed.
    pub fn register(&self, pid: u32) -> Result<(), CoreError> {
        self.update(|pids| {
            if !pids.contains(&pid) {
                pids.push(pid);
            }
        })
    }

    /// Remove `pid`. Returns whether it was listed.
    pub fn deregister(&self, pid: u32) -> Result<bool, CoreError> {
        let mut removed = false;
        self.update(|pids| {
            let before = pids.len();
            pids.retain(|p| *p != pid);
            removed = pids.len() != before;
        })?;
        Ok(removed)
    }

    /// Keep only the pids for which `keep` returns `true`.
    pub fn retain(&self, keep: impl FnMut(&u32) -> bool) -> Result<(), CoreError> {
        self.update(|pids| pids.retain(keep))
    }

    /// Listed pids in registration order. A missing file is an empty registry.
    pub fn entries(&self) -> Result<Vec<u32>, CoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.error(e)),
        };
        let lock = RwLock::new(file);
        let guard = lock.read().map_err(|e| self.error(e))?;
        let mut raw = Vec::new();
        (&*guard)
            .read_to_end(&mut raw)
            .map_err(|e| self.error(e))?;
        Ok(parse(&raw))
    }

    fn update(&self, edit: impl FnOnce(&mut Vec<u32>)) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| self.error(e))?;

        let mut lock = RwLock::new(file);
        let mut guard = lock.write().map_err(|e| self.error(e))?;

        let mut raw = Vec::new();
        guard
            .read_to_end(&mut raw)
            .map_err(|e| self.error(e))?;
        let mut pids = parse(&raw);
        edit(&mut pids);

        let body: String = pids.iter().map(|p| format!("{p}\n")).collect();
        guard.set_len(0).map_err(|e| self.error(e))?;
        guard
            .seek(SeekFrom::Start(0))
            .map_err(|e| self.error(e))?;
        guard
            .write_all(body.as_bytes())
            .map_err(|e| self.error(e))?;
        guard.flush().map_err(|e| self.error(e))?;
        trace!(target: "mproc.core.registry", path = %self.path.display(), count = pids.len(), "registry updated");
        Ok(())
    }

    fn error(&self, source: io::Error) -> CoreError {
        CoreError::Registry {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// One pid per line; anything else (including non-UTF-8 bytes) is skipped.
fn parse(raw: &[u8]) -> Vec<u32> {
    raw.split(|b| *b == b'\n')
        .filter(|line| !line.trim_ascii().is_empty())
        .filter_map(|line| {
            let pid = std::str::from_utf8(line)
                .ok()
                .and_then(|text| parse_pid(text.trim()));
            if pid.is_none() {
                warn!(
                    target: "mproc.core.registry",
                    entry = %String::from_utf8_lossy(line),
                    "skipping malformed registry entry"
                );
            }
            pid
        })
        .collect()
}

/// Positive and representable as a `pid_t`; `0` would address a process group.
fn parse_pid(line: &str) -> Option<u32> {
    let pid: u32 = line.parse().ok()?;
    (pid > 0 && pid <= i32::MAX as u32).then_some(pid)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn register_and_deregister() {
        let tmp = tempfile::tempdir().unwrap();
        let reg = RunRegistry::new(tmp.path().join("pids"));

        assert!(reg.entries().unwrap().is_empty());
        reg.register(10).unwrap();
        reg.register(20).unwrap();
        reg.register(10).unwrap();
        assert_eq!(reg.entries().unwrap(), vec![10, 20]);

        assert!(reg.deregister(10).unwrap());
        assert!(!reg.deregister(10).unwrap());
        assert_eq!(reg.entries().unwrap(), vec![20]);
        assert_eq!(fs::read_to_string(reg.path()).unwrap(), "20\n");
    }

    #[test]
    fn parent_directory_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let reg = RunRegistry::new(tmp.path().join("a").join("b").join("pids"));
        reg.register(7).unwrap();
        assert_eq!(reg.entries().unwrap(), vec![7]);
    }

    #[test]
    fn malformed_lines_are_skipped_and_dropped_on_rewrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pids");
        fs::write(&path, "12\ngarbage\n\n0\n-4\n99999999999\n  34  \n").unwrap();
        let reg = RunRegistry::new(&path);

        assert_eq!(reg.entries().unwrap(), vec![12, 34]);
        reg.register(56).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "12\n34\n56\n");
    }

    #[test]
    fn invalid_utf8_lines_do_not_poison_the_registry() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pids");
        fs::write(&path, b"\xff\xfe\n123\n").unwrap();
        let reg = RunRegistry::new(&path);

        assert_eq!(reg.entries().unwrap(), vec![123]);
        reg.register(456).unwrap();
        assert_eq!(reg.entries().unwrap(), vec![123, 456]);
        assert_eq!(fs::read(&path).unwrap(), b"123\n456\n");
    }

    #[test]
    fn retain_filters_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let reg = RunRegistry::new(tmp.path().join("pids"));
        for pid in 1..=5 {
            reg.register(pid).unwrap();
        }
        reg.retain(|p| p % 2 == 1).unwrap();
        assert_eq!(reg.entries().unwrap(), vec![1, 3, 5]);
    }

    #[test]
    fn concurrent_registrations_are_not_lost() {
        let tmp = tempfile::tempdir().unwrap();
        let reg = Arc::new(RunRegistry::new(tmp.path().join("pids")));

        let handles: Vec<_> = (1..=16u32)
            .map(|pid| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || reg.register(pid).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut pids = reg.entries().unwrap();
        pids.sort_unstable();
        assert_eq!(pids, (1..=16).collect::<Vec<_>>());
    }
}
