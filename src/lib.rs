//! replbridge - Embedded REPL session bridge
//!
//! Hosts interactive language engines behind a uniform adapter contract and
//! bridges them to a line-oriented terminal surface. Two engine shapes are
//! supported: an embedded engine that runs the interpreter on the session's
//! own runtime, and an isolated engine that confines it to a dedicated
//! worker thread behind a correlated request/response protocol. A single
//! session loop consumes the engine's output event stream and drives the
//! terminal, the prompt/read hand-off, and the plot surface manager.
//!
//! # Architecture
//!
//! - **engine**: the [`EngineAdapter`](engine::EngineAdapter) contract, the
//!   [`ReplRuntime`](engine::ReplRuntime) interpreter seam, and the two
//!   adapter implementations
//! - **session**: session lifecycle and the coordinating session loop
//! - **events**: the output event vocabulary shared by every engine shape
//! - **terminal**: the terminal sink capability and the read gate
//! - **completion**: token extraction and the completion bridge
//! - **plot**: append-only plot pages and the surface manager
//! - **config**: engine/terminal/plot configuration and the TOML loader

#[macro_use]
extern crate tracing;

pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod plot;
pub mod session;
pub mod terminal;

pub use completion::{CompletionBridge, CompletionItem, CompletionReply, CompletionRequest};
pub use config::{Config, ConfigLoader, EngineConfig, EngineKind, PlotConfig, TerminalConfig};
pub use engine::{build_engine, EngineAdapter, InterruptFlag, ReplRuntime, RuntimeSink};
pub use error::{Error, Result};
pub use events::{Bitmap, GraphicsEvent, OutputEvent};
pub use plot::{PlotSink, PlotSurfaceManager};
pub use session::{Session, SessionLoop, SessionState};
pub use terminal::{DetachedTerminal, ReadGate, SharedTerminal, TerminalSink, CLEAR_LINE};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
