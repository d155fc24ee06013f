//! Isolated Engine Adapter
//!
//! Runs the interpreter on a dedicated worker thread, reachable only through
//! the message protocol in [`super::protocol`]. Every adapter call becomes a
//! request message; every engine-side effect comes back as an event message.
//!
//! The worker processes one inbound message at a time, which serializes
//! nested callbacks: output produced while handling one request can never
//! interleave with output from another. On the UI side a single router task
//! splits the worker's outbound stream, matching responses to pending
//! waiters by correlation id and forwarding events in arrival order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::{oneshot, Mutex};

use super::protocol::{CallPayload, CastPayload, Request, RequestId, ResponsePayload, WorkerMessage};
use super::{EngineAdapter, InterruptFlag, ReplRuntime, RuntimeSink};
use crate::completion::CompletionRequest;
use crate::config::{EngineConfig, EngineKind};
use crate::error::{Error, Result};
use crate::events::{Bitmap, GraphicsEvent, OutputEvent};

/// Streams runtime output straight onto the worker's outbound channel
struct ChannelSink<'a> {
    out_tx: &'a tokio::sync::mpsc::UnboundedSender<WorkerMessage>,
    closed: bool,
}

impl RuntimeSink for ChannelSink<'_> {
    fn stdout(&mut self, text: &str) {
        let _ = self
            .out_tx
            .send(WorkerMessage::Event(OutputEvent::Stdout(text.to_string())));
    }

    fn stderr(&mut self, text: &str) {
        let _ = self
            .out_tx
            .send(WorkerMessage::Event(OutputEvent::Stderr(text.to_string())));
    }

    fn new_page(&mut self) {
        let _ = self.out_tx.send(WorkerMessage::Event(OutputEvent::Graphics(
            GraphicsEvent::NewPage,
        )));
    }

    fn draw(&mut self, bitmap: Bitmap) {
        let _ = self.out_tx.send(WorkerMessage::Event(OutputEvent::Graphics(
            GraphicsEvent::Image(bitmap),
        )));
    }

    fn closed(&mut self) {
        self.closed = true;
    }
}

/// Worker-side loop: owns the runtime, drains requests one at a time
fn run_worker<R: ReplRuntime>(
    mut runtime: R,
    interrupt: InterruptFlag,
    req_rx: std::sync::mpsc::Receiver<Request>,
    out_tx: tokio::sync::mpsc::UnboundedSender<WorkerMessage>,
) {
    let send_event = |event: OutputEvent| {
        let _ = out_tx.send(WorkerMessage::Event(event));
    };

    for request in req_rx.iter() {
        match request {
            Request::Call { id, payload } => {
                let payload = match payload {
                    CallPayload::Init(config) => {
                        let result = runtime
                            .start(&config, Arc::clone(&interrupt))
                            .map_err(|e| e.to_string());
                        if result.is_ok() {
                            // The engine is ready for its first line
                            send_event(OutputEvent::Prompt(runtime.prompt()));
                        }
                        ResponsePayload::Init(result)
                    }
                    CallPayload::InstallPackage(name) => ResponsePayload::InstallPackage(
                        runtime.install_package(&name).map_err(|e| e.to_string()),
                    ),
                    CallPayload::Complete { source, cursor } => {
                        ResponsePayload::Completions(runtime.complete(&source, cursor))
                    }
                };
                let _ = out_tx.send(WorkerMessage::Response { id, payload });
            }
            Request::Cast(CastPayload::WriteConsole(line)) => {
                interrupt.store(false, Ordering::SeqCst);
                let mut sink = ChannelSink {
                    out_tx: &out_tx,
                    closed: false,
                };
                if let Err(e) = runtime.eval_line(&line, &mut sink) {
                    sink.stderr(&e.to_string());
                }
                if sink.closed {
                    send_event(OutputEvent::Closed);
                    return;
                }
                send_event(OutputEvent::Prompt(runtime.prompt()));
            }
            Request::Cast(CastPayload::SetPlotSize { width, height }) => {
                runtime.set_plot_size(width, height);
            }
            Request::Cast(CastPayload::Shutdown) => {
                send_event(OutputEvent::Closed);
                return;
            }
        }
    }

    // Request channel disconnected: the adapter is gone
    send_event(OutputEvent::Closed);
}

/// Worker-isolated engine adapter
pub struct IsolatedEngine {
    req_tx: std::sync::mpsc::Sender<Request>,
    /// Events routed out of the worker's outbound stream
    event_rx: Mutex<UnboundedReceiver<OutputEvent>>,
    /// Waiters keyed by correlation id
    pending: Arc<StdMutex<HashMap<RequestId, oneshot::Sender<ResponsePayload>>>>,
    next_id: AtomicU64,
    config: EngineConfig,
    interrupt: InterruptFlag,
    initialized: AtomicBool,
    closed_observed: AtomicBool,
}

impl IsolatedEngine {
    /// Spawn the worker thread and the router task for `runtime`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R: ReplRuntime>(runtime: R, config: EngineConfig) -> Self {
        let (req_tx, req_rx) = std::sync::mpsc::channel::<Request>();
        let (out_tx, mut out_rx) = unbounded_channel::<WorkerMessage>();
        let (event_tx, event_rx) = unbounded_channel::<OutputEvent>();

        let interrupt: InterruptFlag = Arc::new(AtomicBool::new(false));
        let pending: Arc<StdMutex<HashMap<RequestId, oneshot::Sender<ResponsePayload>>>> =
            Arc::new(StdMutex::new(HashMap::new()));

        let worker_interrupt = Arc::clone(&interrupt);
        if let Err(e) = std::thread::Builder::new()
            .name("replbridge-engine-worker".to_string())
            .spawn(move || run_worker(runtime, worker_interrupt, req_rx, out_tx))
        {
            // Requests will fail with WorkerUnreachable; keep the cause
            error!("Failed to spawn engine worker thread: {}", e);
        }

        // Router: split responses from events, preserving event order
        let router_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                match message {
                    WorkerMessage::Response { id, payload } => {
                        let waiter = router_pending.lock().unwrap().remove(&id);
                        match waiter {
                            Some(tx) => {
                                let _ = tx.send(payload);
                            }
                            None => {
                                warn!("Dropping unmatched response for request {}", id);
                            }
                        }
                    }
                    WorkerMessage::Event(event) => {
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            req_tx,
            event_rx: Mutex::new(event_rx),
            pending,
            next_id: AtomicU64::new(1),
            config,
            interrupt,
            initialized: AtomicBool::new(false),
            closed_observed: AtomicBool::new(false),
        }
    }

    /// Issue a call and await its correlated response
    async fn call(&self, payload: CallPayload) -> Result<ResponsePayload> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);

        if self.req_tx.send(Request::Call { id, payload }).is_err() {
            self.pending.lock().unwrap().remove(&id);
            return Err(Error::WorkerUnreachable {
                reason: "request channel disconnected".to_string(),
            });
        }

        rx.await.map_err(|_| Error::WorkerUnreachable {
            reason: "response channel dropped".to_string(),
        })
    }

    fn cast(&self, payload: CastPayload) -> Result<()> {
        self.req_tx
            .send(Request::Cast(payload))
            .map_err(|_| Error::EngineClosed)
    }
}

#[async_trait]
impl EngineAdapter for IsolatedEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Isolated
    }

    async fn init(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }
        let payload = CallPayload::Init(Box::new(self.config.clone()));
        match self.call(payload).await? {
            ResponsePayload::Init(Ok(())) => {
                self.initialized.store(true, Ordering::SeqCst);
                debug!("Isolated engine initialized");
                Ok(())
            }
            ResponsePayload::Init(Err(reason)) => Err(Error::EngineInit {
                kind: self.kind().to_string(),
                reason,
            }),
            other => Err(Error::WorkerUnreachable {
                reason: format!("mismatched response: {}", other.tag()),
            }),
        }
    }

    fn write_console(&self, line: &str) -> Result<()> {
        self.cast(CastPayload::WriteConsole(line.to_string()))
    }

    async fn next_event(&self) -> Result<OutputEvent> {
        if self.closed_observed.load(Ordering::SeqCst) {
            return Err(Error::EngineClosed);
        }
        let mut event_rx = self.event_rx.lock().await;
        match event_rx.recv().await {
            Some(event) => {
                if event.is_terminal() {
                    self.closed_observed.store(true, Ordering::SeqCst);
                }
                Ok(event)
            }
            None => {
                self.closed_observed.store(true, Ordering::SeqCst);
                Ok(OutputEvent::Closed)
            }
        }
    }

    fn interrupt(&self) {
        // Out-of-band: crosses the boundary without queueing behind the
        // in-flight evaluation
        self.interrupt.store(true, Ordering::SeqCst);
    }

    async fn install_packages(&self, packages: &[String]) -> Result<()> {
        for package in packages {
            match self
                .call(CallPayload::InstallPackage(package.clone()))
                .await?
            {
                ResponsePayload::InstallPackage(Ok(())) => {}
                ResponsePayload::InstallPackage(Err(reason)) => {
                    return Err(Error::PackageInstall {
                        package: package.clone(),
                        reason,
                    });
                }
                other => {
                    return Err(Error::WorkerUnreachable {
                        reason: format!("mismatched response: {}", other.tag()),
                    });
                }
            }
        }
        Ok(())
    }

    async fn complete(&self, request: &CompletionRequest) -> Vec<String> {
        let payload = CallPayload::Complete {
            source: request.line_text.clone(),
            cursor: request.token_end,
        };
        match self.call(payload).await {
            Ok(ResponsePayload::Completions(labels)) => labels,
            Ok(other) => {
                warn!("Mismatched completion response: {}", other.tag());
                Vec::new()
            }
            // Completion is best-effort: engine failures become empty results
            Err(e) => {
                debug!("Completion request failed: {}", e);
                Vec::new()
            }
        }
    }

    fn set_plot_size(&self, width: u32, height: u32) {
        let _ = self.cast(CastPayload::SetPlotSize { width, height });
    }

    fn shutdown(&self) {
        let _ = self.cast(CastPayload::Shutdown);
    }
}
