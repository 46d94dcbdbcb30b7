//! Run journal: one writer thread owns the log file; everyone else sends
//! messages over a channel.
//!
//! Lines are `[YYYY-MM-DD HH:MM:SS] message`, every one carrying the run's
//! start time. The last line of a finalized journal is always `Done.`.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    thread::{self, JoinHandle},
};

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, trace};

use mproc_exec::EventSink;

use crate::error::CoreError;

const STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Written after the last message, once the journal is finalized.
pub const DONE: &str = "Done.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Message(String),
    /// Stop after writing everything queued so far.
    Finalize,
}

/// Cloneable sending side of the journal.
#[derive(Debug, Clone)]
pub struct Journal {
    tx: UnboundedSender<LogEvent>,
}

/// Owner of the writer thread.
#[derive(Debug)]
pub struct JournalWriter {
    journal: Journal,
    thread: JoinHandle<u64>,
}

impl Journal {
    /// Open (append) `path` and start the writer thread. Every line is
    /// prefixed with `started_at`.
    pub fn spawn(
        path: &Path,
        started_at: OffsetDateTime,
    ) -> Result<(Journal, JournalWriter), CoreError> {
        let stamp = started_at
            .format(STAMP)
            .map_err(|e| CoreError::Journal(format!("cannot format start time: {e}")))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| CoreError::Setup {
                path: path.display().to_string(),
                source,
            })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let thread = thread::Builder::new()
            .name("mproc-journal".into())
            .spawn(move || drain(rx, file, &stamp))
            .map_err(|e| CoreError::Journal(format!("cannot start writer thread: {e}")))?;

        let journal = Journal { tx };
        debug!(target: "mproc.core.journal", path = %path.display(), "journal started");
        Ok((journal.clone(), JournalWriter { journal, thread }))
    }

    /// Queue a message. Never blocks; dropped silently once finalized.
    pub fn emit(&self, message: impl Into<String>) {
        self.send(LogEvent::Message(message.into()));
    }

    fn send(&self, event: LogEvent) {
        if self.tx.send(event).is_err() {
            trace!(target: "mproc.core.journal", "message after finalize dropped");
        }
    }
}

impl EventSink for Journal {
    fn emit(&self, message: String) {
        self.send(LogEvent::Message(message));
    }
}

impl JournalWriter {
    /// Flush everything queued, write the closing line and join the thread.
    ///
    /// Returns the number of messages written, the closing line excluded.
    pub async fn finalize(self) -> Result<u64, CoreError> {
        self.journal.send(LogEvent::Finalize);
        let thread = self.thread;
        tokio::task::spawn_blocking(move || thread.join())
            .await
            .map_err(|e| CoreError::Journal(e.to_string()))?
            .map_err(|_| CoreError::Journal("writer thread panicked".into()))
    }
}

fn drain(mut rx: UnboundedReceiver<LogEvent>, mut file: File, stamp: &str) -> u64 {
    let mut written = 0;
    while let Some(LogEvent::Message(msg)) = rx.blocking_recv() {
        match write_line(&mut file, stamp, &msg) {
            Ok(()) => written += 1,
            Err(e) => error!(target: "mproc.core.journal", error = %e, "journal write failed"),
        }
    }
    if let Err(e) = write_line(&mut file, stamp, DONE) {
        error!(target: "mproc.core.journal", error = %e, "journal write failed");
    }
    written
}

fn write_line(file: &mut File, stamp: &str, msg: &str) -> io::Result<()> {
    // single write so a line is never split
    file.write_all(format!("[{stamp}] {msg}\n").as_bytes())?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use super::*;

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn body(line: &str) -> &str {
        // "[YYYY-MM-DD HH:MM:SS] " is 22 bytes
        &line[22..]
    }

    #[tokio::test]
    async fn lines_are_stamped_and_end_with_done() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("log");
        let (journal, writer) = Journal::spawn(&path, OffsetDateTime::now_utc()).unwrap();

        journal.emit("first");
        journal.emit(String::from("second"));
        let n = writer.finalize().await.unwrap();

        assert_eq!(n, 2);
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('['));
        assert_eq!(&lines[0][20..22], "] ");
        assert_eq!(body(&lines[0]), "first");
        assert_eq!(body(&lines[1]), "second");
        assert_eq!(body(&lines[2]), "Done.");
    }

    #[tokio::test]
    async fn every_line_carries_the_start_stamp() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("log");
        let started = time::macros::datetime!(2024-03-05 07:08:09 UTC);
        let (journal, writer) = Journal::spawn(&path, started).unwrap();

        journal.emit("one");
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        journal.emit("two");
        writer.finalize().await.unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert!(line.starts_with("[2024-03-05 07:08:09] "), "{line}");
        }
    }

    #[tokio::test]
    async fn concurrent_emitters_keep_lines_whole() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("log");
        let (journal, writer) = Journal::spawn(&path, OffsetDateTime::now_utc()).unwrap();

        let mut tasks = Vec::new();
        for t in 0..8 {
            let sink: Arc<dyn EventSink> = Arc::new(journal.clone());
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    sink.emit(format!("task {t} message {i}"));
                }
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        writer.finalize().await.unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 8 * 50 + 1);
        assert_eq!(body(lines.last().unwrap()), "Done.");
        for t in 0..8 {
            let mine: Vec<_> = lines
                .iter()
                .filter(|l| body(l).starts_with(&format!("task {t} ")))
                .collect();
            assert_eq!(mine.len(), 50);
            // per-sender order is preserved
            for (i, l) in mine.iter().enumerate() {
                assert_eq!(body(l), format!("task {t} message {i}"));
            }
        }
    }

    #[tokio::test]
    async fn emit_after_finalize_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("log");
        let (journal, writer) = Journal::spawn(&path, OffsetDateTime::now_utc()).unwrap();

        writer.finalize().await.unwrap();
        journal.emit("late");

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert_eq!(body(&lines[0]), "Done.");
    }

    #[test]
    fn missing_directory_is_setup_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope").join("log");
        let err = Journal::spawn(&path, OffsetDateTime::now_utc()).unwrap_err();
        assert!(matches!(err, CoreError::Setup { .. }));
    }
}
