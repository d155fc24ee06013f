//! Engine Adapters
//!
//! A uniform contract over structurally different interpreter engines. Two
//! shapes exist: an [`embedded`] engine that runs in the caller's execution
//! context with a blocking-style read loop, and an [`isolated`] engine that
//! runs on a dedicated worker and is reachable only through an asynchronous
//! request/response channel.
//!
//! The adapter is selected once, by [`EngineKind`], at session construction.
//! Call sites never inspect the engine shape again; everything flows through
//! [`EngineAdapter`].

pub mod embedded;
pub mod isolated;
pub mod protocol;

// Re-exports for convenience
pub use embedded::EmbeddedEngine;
pub use isolated::IsolatedEngine;

use async_trait::async_trait;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::completion::CompletionRequest;
use crate::config::{EngineConfig, EngineKind};
use crate::error::Result;
use crate::events::{Bitmap, OutputEvent};

/// Shared flag a runtime may poll to notice an interrupt request.
///
/// Interrupts are best-effort: nothing forces an engine to check the flag,
/// and engines that cannot interrupt simply never do.
pub type InterruptFlag = Arc<AtomicBool>;

/// Callbacks through which a runtime delivers output while evaluating
pub trait RuntimeSink {
    /// One line of normal console output
    fn stdout(&mut self, text: &str);

    /// One line of error console output
    fn stderr(&mut self, text: &str);

    /// The graphics device opened a new page
    fn new_page(&mut self);

    /// The graphics device drew a bitmap onto the current page
    fn draw(&mut self, bitmap: Bitmap);

    /// The runtime is shutting down; no further output will follow
    fn closed(&mut self);
}

/// The seam a concrete interpreter runtime implements.
///
/// Implementations live outside this crate (the interpreter itself is an
/// external collaborator); the adapters only route lines in and output out.
pub trait ReplRuntime: Send + 'static {
    /// Establish the interpreter. Called once; must return only when the
    /// runtime can accept input. `interrupt` may be polled during later
    /// evaluations to notice interrupt requests.
    fn start(&mut self, config: &EngineConfig, interrupt: InterruptFlag) -> Result<()>;

    /// The prompt text presented when the runtime wants input
    fn prompt(&self) -> String;

    /// Evaluate one line of console input, streaming output through `sink`.
    /// An `Err` is surfaced to the user as a stderr line, not a crash.
    fn eval_line(&mut self, line: &str, sink: &mut dyn RuntimeSink) -> Result<()>;

    /// Produce raw completion candidates for `source` with the cursor at
    /// byte offset `cursor`. Must not fail on malformed input; return an
    /// empty list instead.
    fn complete(&mut self, source: &str, cursor: usize) -> Vec<String>;

    /// Side-load one extension package
    fn install_package(&mut self, name: &str) -> Result<()>;

    /// Reconfigure the graphics device for future pages
    fn set_plot_size(&mut self, _width: u32, _height: u32) {}
}

/// Uniform engine contract consumed by the session loop and the
/// completion bridge
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// Which shape this adapter is
    fn kind(&self) -> EngineKind;

    /// Establish the interpreter. Idempotent: repeated calls after a
    /// successful init are no-ops. Failure leaves the engine unusable.
    async fn init(&self) -> Result<()>;

    /// Enqueue one line of input. Non-blocking; lines submitted before the
    /// engine consumes earlier ones queue up in FIFO order.
    fn write_console(&self, line: &str) -> Result<()>;

    /// Consume the next output event, in production order.
    ///
    /// The stream is not rewindable and never repeats. Once
    /// [`OutputEvent::Closed`] has been observed, every further call fails
    /// with [`crate::error::Error::EngineClosed`].
    async fn next_event(&self) -> Result<OutputEvent>;

    /// Best-effort request that the engine abandon in-flight evaluation.
    /// Fire-and-forget; a no-op implementation is legal.
    fn interrupt(&self);

    /// Install extension packages one at a time, stopping at the first
    /// failure. Already-installed packages remain installed.
    async fn install_packages(&self, packages: &[String]) -> Result<()>;

    /// Raw completion candidates for the given request. Never fails;
    /// malformed input yields an empty list.
    async fn complete(&self, request: &CompletionRequest) -> Vec<String>;

    /// Fire-and-forget reconfiguration of the engine's graphics device
    fn set_plot_size(&self, width: u32, height: u32);

    /// Ask the engine to close its output channel. The stream will end with
    /// [`OutputEvent::Closed`].
    fn shutdown(&self);
}

/// Construct the adapter selected by the configuration tag.
///
/// Must be called from within a tokio runtime; the isolated adapter spawns
/// its router task at construction.
pub fn build_engine<R: ReplRuntime>(
    config: &EngineConfig,
    runtime: R,
) -> Arc<dyn EngineAdapter> {
    match config.kind {
        EngineKind::Embedded => Arc::new(EmbeddedEngine::new(runtime, config.clone())),
        EngineKind::Isolated => Arc::new(IsolatedEngine::spawn(runtime, config.clone())),
    }
}
