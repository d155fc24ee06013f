//! Isolated Engine Wire Protocol
//!
//! Message types exchanged between the UI-side adapter and the engine
//! worker. Calls that expect an answer carry a correlation id; the worker
//! replies with a `Response` tagged with the same id. Engine-originated
//! effects travel as `Event` messages on the same outbound channel, which
//! guarantees ordering between responses and events per-channel only.

use crate::config::EngineConfig;
use crate::events::OutputEvent;

/// Correlation identifier for request/response matching
pub type RequestId = u64;

/// Message sent from the adapter to the worker
#[derive(Debug)]
pub enum Request {
    /// Expects exactly one `Response` with the same id
    Call {
        id: RequestId,
        payload: CallPayload,
    },
    /// Fire-and-forget; no response follows
    Cast(CastPayload),
}

/// Calls that produce a response
#[derive(Debug)]
pub enum CallPayload {
    /// Establish the interpreter runtime
    Init(Box<EngineConfig>),
    /// Side-load one extension package
    InstallPackage(String),
    /// Query completion candidates
    Complete { source: String, cursor: usize },
}

/// Fire-and-forget commands
#[derive(Debug)]
pub enum CastPayload {
    /// Enqueue one line of console input
    WriteConsole(String),
    /// Reconfigure the graphics device for future pages
    SetPlotSize { width: u32, height: u32 },
    /// Close the output channel and stop the worker
    Shutdown,
}

/// Message sent from the worker back to the adapter
#[derive(Debug)]
pub enum WorkerMessage {
    /// Answer to a `Request::Call`, matched by correlation id
    Response {
        id: RequestId,
        payload: ResponsePayload,
    },
    /// Engine-originated output, delivered in production order
    Event(OutputEvent),
}

/// Response bodies. Failures cross the boundary as plain strings; the
/// adapter reattaches typed errors on its side.
#[derive(Debug)]
pub enum ResponsePayload {
    Init(std::result::Result<(), String>),
    InstallPackage(std::result::Result<(), String>),
    Completions(Vec<String>),
}

impl ResponsePayload {
    /// Short tag for logging
    pub fn tag(&self) -> &'static str {
        match self {
            ResponsePayload::Init(_) => "init",
            ResponsePayload::InstallPackage(_) => "install-package",
            ResponsePayload::Completions(_) => "completions",
        }
    }
}
