//! Terminal Sink Capability
//!
//! The capability object installed by the terminal UI. The session loop is
//! the sole writer during normal operation; `read` hands one line of user
//! input back to the loop. At most one `read` may be outstanding at a time;
//! a second concurrent `read` fails deterministically with
//! [`Error::ReadInProgress`].

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Raw control sequence that clears the current terminal line.
///
/// Written once at session start to remove the loading placeholder.
pub const CLEAR_LINE: &str = "\x1b[2K\r";

/// Capability object installed by the terminal UI
#[async_trait]
pub trait TerminalSink: Send + Sync {
    /// Print one line of text followed by a newline
    fn println(&self, text: &str);

    /// Write raw text, control sequences included, without a newline
    fn write(&self, raw: &str);

    /// Read one line of user input, presenting `prompt`.
    ///
    /// Resolves with the captured line, or fails if the terminal surface is
    /// destroyed mid-read or another read is already outstanding.
    async fn read(&self, prompt: &str) -> Result<String>;
}

/// Guard enforcing the single-outstanding-read invariant.
///
/// Terminal implementations wrap their line-reading future in
/// [`ReadGate::locked`]; the chosen policy for a second concurrent read is
/// to fail it immediately rather than queue it.
#[derive(Default)]
pub struct ReadGate {
    busy: Mutex<()>,
}

impl ReadGate {
    /// Create a new gate with no read outstanding
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` while holding the gate; fails with `ReadInProgress` when a
    /// prior read has not resolved yet.
    pub async fn locked<T, F>(&self, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        let _guard = self.busy.try_lock().map_err(|_| Error::ReadInProgress)?;
        fut.await
    }

    /// Whether a read is currently outstanding
    pub fn is_busy(&self) -> bool {
        self.busy.try_lock().is_err()
    }
}

/// Terminal sink used before a real terminal UI has been mounted.
///
/// Output is routed to the log; reads always fail, since there is no surface
/// for the user to type into.
#[derive(Default)]
pub struct DetachedTerminal;

#[async_trait]
impl TerminalSink for DetachedTerminal {
    fn println(&self, text: &str) {
        info!(target: "replbridge::terminal", "{}", text);
    }

    fn write(&self, raw: &str) {
        info!(target: "replbridge::terminal", "{}", raw.escape_debug());
    }

    async fn read(&self, _prompt: &str) -> Result<String> {
        Err(Error::TerminalReadFailed {
            reason: "no terminal surface attached".to_string(),
        })
    }
}

/// Convenience alias for a shared terminal sink handle
pub type SharedTerminal = Arc<dyn TerminalSink>;
