//! Embedded Engine Adapter
//!
//! Runs the interpreter in the same execution context as the caller. There
//! is no separate thread: evaluation happens inline inside `next_event`, so
//! long-running user code blocks the caller until the runtime yields back.
//! The only suspension point is awaiting the next queued input line.
//!
//! The read hand-off is an explicit state machine: emit one prompt, await a
//! queued line, drain the evaluation output in production order, then emit
//! the next prompt.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

use super::{EngineAdapter, InterruptFlag, ReplRuntime, RuntimeSink};
use crate::completion::CompletionRequest;
use crate::config::{EngineConfig, EngineKind};
use crate::error::{Error, Result};
use crate::events::{Bitmap, GraphicsEvent, OutputEvent};

/// Where the cooperative read loop currently is
enum ReadState {
    /// The next event is a prompt for one line of input
    EmitPrompt,
    /// A prompt is outstanding; waiting for a line from the input queue
    AwaitInput,
}

/// Collects runtime output produced during one `eval_line` call
#[derive(Default)]
struct BufferSink {
    events: Vec<OutputEvent>,
    closed: bool,
}

impl RuntimeSink for BufferSink {
    fn stdout(&mut self, text: &str) {
        self.events.push(OutputEvent::Stdout(text.to_string()));
    }

    fn stderr(&mut self, text: &str) {
        self.events.push(OutputEvent::Stderr(text.to_string()));
    }

    fn new_page(&mut self) {
        self.events.push(OutputEvent::Graphics(GraphicsEvent::NewPage));
    }

    fn draw(&mut self, bitmap: Bitmap) {
        self.events
            .push(OutputEvent::Graphics(GraphicsEvent::Image(bitmap)));
    }

    fn closed(&mut self) {
        self.events.push(OutputEvent::Closed);
        self.closed = true;
    }
}

/// In-context engine adapter wrapping a blocking-style runtime
pub struct EmbeddedEngine<R: ReplRuntime> {
    runtime: Mutex<R>,
    config: EngineConfig,
    input_tx: UnboundedSender<String>,
    /// Consumed only by `next_event`; the mutex serializes consumers
    input_rx: Mutex<UnboundedReceiver<String>>,
    /// Events produced but not yet consumed, in production order
    buffer: Mutex<VecDeque<OutputEvent>>,
    read_state: Mutex<ReadState>,
    /// Latest requested graphics size not yet applied to the runtime
    pending_plot_size: std::sync::Mutex<Option<(u32, u32)>>,
    interrupt: InterruptFlag,
    initialized: AtomicBool,
    /// Set once `Closed` has been yielded; the stream is then spent
    closed_observed: AtomicBool,
    /// Set by `shutdown`; makes the next fetch yield `Closed`
    shutdown_requested: AtomicBool,
}

impl<R: ReplRuntime> EmbeddedEngine<R> {
    /// Wrap a runtime in an embedded adapter
    pub fn new(runtime: R, config: EngineConfig) -> Self {
        let (input_tx, input_rx) = unbounded_channel();
        Self {
            runtime: Mutex::new(runtime),
            config,
            input_tx,
            input_rx: Mutex::new(input_rx),
            buffer: Mutex::new(VecDeque::new()),
            read_state: Mutex::new(ReadState::EmitPrompt),
            pending_plot_size: std::sync::Mutex::new(None),
            interrupt: Arc::new(AtomicBool::new(false)),
            initialized: AtomicBool::new(false),
            closed_observed: AtomicBool::new(false),
            shutdown_requested: AtomicBool::new(false),
        }
    }

    /// Apply a queued resize while holding the runtime lock
    fn flush_plot_size(&self, runtime: &mut R) {
        if let Some((width, height)) = self.pending_plot_size.lock().unwrap().take() {
            runtime.set_plot_size(width, height);
        }
    }

    /// Evaluate one queued line inline, buffering its output
    async fn eval_queued_line(&self, line: String) {
        let mut runtime = self.runtime.lock().await;
        self.flush_plot_size(&mut runtime);
        let mut sink = BufferSink::default();
        self.interrupt.store(false, Ordering::SeqCst);

        if let Err(e) = runtime.eval_line(&line, &mut sink) {
            // Evaluation failures are console output, not adapter failures
            sink.stderr(&e.to_string());
        }
        drop(runtime);

        let closed = sink.closed;
        let mut buffer = self.buffer.lock().await;
        buffer.extend(sink.events);
        drop(buffer);

        if closed {
            self.shutdown_requested.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl<R: ReplRuntime> EngineAdapter for EmbeddedEngine<R> {
    fn kind(&self) -> EngineKind {
        EngineKind::Embedded
    }

    async fn init(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }
        let mut runtime = self.runtime.lock().await;
        runtime
            .start(&self.config, Arc::clone(&self.interrupt))
            .map_err(|e| Error::EngineInit {
                kind: self.kind().to_string(),
                reason: e.to_string(),
            })?;
        self.initialized.store(true, Ordering::SeqCst);
        debug!("Embedded engine initialized");
        Ok(())
    }

    fn write_console(&self, line: &str) -> Result<()> {
        self.input_tx
            .send(line.to_string())
            .map_err(|_| Error::EngineClosed)
    }

    async fn next_event(&self) -> Result<OutputEvent> {
        loop {
            if self.closed_observed.load(Ordering::SeqCst) {
                return Err(Error::EngineClosed);
            }

            // Drain buffered output strictly in production order
            if let Some(event) = self.buffer.lock().await.pop_front() {
                if event.is_terminal() {
                    self.closed_observed.store(true, Ordering::SeqCst);
                }
                return Ok(event);
            }

            if self.shutdown_requested.load(Ordering::SeqCst) {
                self.closed_observed.store(true, Ordering::SeqCst);
                return Ok(OutputEvent::Closed);
            }

            let mut state = self.read_state.lock().await;
            match *state {
                ReadState::EmitPrompt => {
                    *state = ReadState::AwaitInput;
                    let prompt = self.runtime.lock().await.prompt();
                    return Ok(OutputEvent::Prompt(prompt));
                }
                ReadState::AwaitInput => {
                    drop(state);
                    // Cooperative suspension point: wait for a queued line
                    let line = self.input_rx.lock().await.recv().await;
                    match line {
                        Some(line) => {
                            if self.shutdown_requested.load(Ordering::SeqCst) {
                                self.closed_observed.store(true, Ordering::SeqCst);
                                return Ok(OutputEvent::Closed);
                            }
                            self.eval_queued_line(line).await;
                            *self.read_state.lock().await = ReadState::EmitPrompt;
                        }
                        None => {
                            // Input side dropped; the channel is dead
                            self.closed_observed.store(true, Ordering::SeqCst);
                            return Ok(OutputEvent::Closed);
                        }
                    }
                }
            }
        }
    }

    fn interrupt(&self) {
        // Evaluation runs inline, so this can only be noticed at the
        // runtime's own polling points
        self.interrupt.store(true, Ordering::SeqCst);
    }

    async fn install_packages(&self, packages: &[String]) -> Result<()> {
        let mut runtime = self.runtime.lock().await;
        for package in packages {
            runtime
                .install_package(package)
                .map_err(|e| Error::PackageInstall {
                    package: package.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    async fn complete(&self, request: &CompletionRequest) -> Vec<String> {
        let mut runtime = self.runtime.lock().await;
        runtime.complete(&request.line_text, request.token_end)
    }

    fn set_plot_size(&self, width: u32, height: u32) {
        // Queue the size; applied immediately when the runtime is free,
        // otherwise at the next evaluation so mid-eval resizes are not lost
        *self.pending_plot_size.lock().unwrap() = Some((width, height));
        if let Ok(mut runtime) = self.runtime.try_lock() {
            self.flush_plot_size(&mut runtime);
        }
    }

    fn shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        // Nudge a pending input await so the loop can observe the shutdown
        let _ = self.input_tx.send(String::new());
    }
}
