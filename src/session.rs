//! Session Lifecycle and the Session Loop
//!
//! A [`Session`] owns one engine adapter and lives exactly as long as the
//! UI instance that mounted it. The [`SessionLoop`] is the single
//! coordinating task: it pulls the output event stream and dispatches each
//! event to the terminal sink or the plot surface manager, owning the
//! prompt/read hand-off in between. The loop never runs two iterations
//! concurrently; every dispatch completes before the next fetch.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::{Config, EngineKind};
use crate::engine::EngineAdapter;
use crate::error::{Error, Result};
use crate::events::{GraphicsEvent, OutputEvent};
use crate::plot::PlotSurfaceManager;
use crate::terminal::{SharedTerminal, CLEAR_LINE};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Created but the engine has not been established yet
    #[default]
    Uninitialized,
    /// Engine init in progress
    Initializing,
    /// Engine accepted init; the loop may run
    Ready,
    /// The output channel has closed; terminal state
    Closed,
}

/// Where the session loop currently is
enum LoopState {
    /// Waiting for the next output event
    AwaitingEvent,
    /// An event has been fetched and is being dispatched
    Dispatching(OutputEvent),
}

/// Whether the loop proceeds to the next fetch or stops
enum Flow {
    Continue,
    Stop,
}

/// One interactive console session, owned by the hosting UI instance
pub struct Session {
    id: String,
    kind: EngineKind,
    state: Arc<Mutex<SessionState>>,
    engine: Arc<dyn EngineAdapter>,
    plots: Arc<PlotSurfaceManager>,
    config: Config,
    started_at: DateTime<Utc>,
    loop_task: Option<JoinHandle<Result<()>>>,
}

impl Session {
    /// Create a session around an already-constructed engine adapter.
    ///
    /// The plot manager is created here with the configured page size and
    /// wired to the engine so resizes reach the graphics device.
    pub fn new(config: Config, engine: Arc<dyn EngineAdapter>) -> Self {
        let plots = Arc::new(PlotSurfaceManager::new(
            config.plot.width,
            config.plot.height,
        ));
        plots.attach_engine(Arc::clone(&engine));

        Self {
            id: Uuid::new_v4().to_string(),
            kind: engine.kind(),
            state: Arc::new(Mutex::new(SessionState::Uninitialized)),
            engine,
            plots,
            config,
            started_at: Utc::now(),
            loop_task: None,
        }
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Which engine shape this session uses
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// When the session was created
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// The engine adapter, for the completion bridge and UI callbacks
    pub fn engine(&self) -> Arc<dyn EngineAdapter> {
        Arc::clone(&self.engine)
    }

    /// The plot surface manager for this session
    pub fn plots(&self) -> Arc<PlotSurfaceManager> {
        Arc::clone(&self.plots)
    }

    /// Establish the engine and side-load configured packages.
    ///
    /// Init failure is fatal and leaves the session `Uninitialized`.
    /// Package failures are reported per-package and do not halt the
    /// session; already-installed packages remain installed.
    pub async fn init(&self) -> Result<()> {
        *self.state.lock().unwrap() = SessionState::Initializing;

        if let Err(e) = self.engine.init().await {
            error!("Engine init failed: {}", e);
            *self.state.lock().unwrap() = SessionState::Uninitialized;
            return Err(e);
        }

        for package in &self.config.engine.packages {
            if let Err(e) = self
                .engine
                .install_packages(std::slice::from_ref(package))
                .await
            {
                warn!("Package install failed: {}", e);
            }
        }

        *self.state.lock().unwrap() = SessionState::Ready;
        info!("Session {} ready ({} engine)", self.id, self.kind);
        Ok(())
    }

    /// Start the session loop against the given terminal sink.
    ///
    /// Must be called after `init` resolved; returns an error otherwise.
    pub fn start(&mut self, terminal: SharedTerminal) -> Result<()> {
        let state = self.state();
        if state != SessionState::Ready {
            return Err(Error::InvalidSessionState {
                expected: "Ready".to_string(),
                actual: format!("{:?}", state),
            });
        }

        let session_loop = SessionLoop {
            engine: Arc::clone(&self.engine),
            terminal,
            plots: Arc::clone(&self.plots),
            session_state: Arc::clone(&self.state),
            highlight_stderr: self.config.terminal.highlight_stderr,
        };
        self.loop_task = Some(tokio::spawn(session_loop.run()));
        Ok(())
    }

    /// Tear the session down: close the engine's output channel and wait
    /// for the loop to drain.
    pub async fn close(&mut self) {
        self.engine.shutdown();
        if let Some(task) = self.loop_task.take() {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Session loop exited with error: {}", e),
                Err(e) => warn!("Session loop task failed: {}", e),
            }
        }
        *self.state.lock().unwrap() = SessionState::Closed;
    }
}

/// The single coordinating task for one session
pub struct SessionLoop {
    engine: Arc<dyn EngineAdapter>,
    terminal: SharedTerminal,
    plots: Arc<PlotSurfaceManager>,
    session_state: Arc<Mutex<SessionState>>,
    highlight_stderr: bool,
}

impl SessionLoop {
    /// Drive the output event stream until the channel closes or a fatal
    /// error occurs.
    pub async fn run(self) -> Result<()> {
        // Clear the loading placeholder left by the terminal UI
        self.terminal.write(CLEAR_LINE);

        let mut state = LoopState::AwaitingEvent;
        loop {
            state = match state {
                LoopState::AwaitingEvent => match self.engine.next_event().await {
                    Ok(event) => LoopState::Dispatching(event),
                    Err(e) => {
                        error!("Output event stream failed: {}", e);
                        return Err(e);
                    }
                },
                LoopState::Dispatching(event) => match self.dispatch(event).await? {
                    Flow::Continue => LoopState::AwaitingEvent,
                    Flow::Stop => return Ok(()),
                },
            };
        }
    }

    async fn dispatch(&self, event: OutputEvent) -> Result<Flow> {
        trace!("Dispatching {} event", event.tag());
        match event {
            OutputEvent::Stdout(text) => {
                self.terminal.println(&text);
            }
            OutputEvent::Stderr(text) => {
                if self.highlight_stderr {
                    self.terminal.println(&format!("\x1b[1;31m{}\x1b[m", text));
                } else {
                    self.terminal.println(&text);
                }
            }
            OutputEvent::Prompt(prompt) => {
                // The read hand-off completes before the next fetch; the
                // single-in-flight-read invariant holds because this loop is
                // the only reader.
                match self.terminal.read(&prompt).await {
                    Ok(line) => self.engine.write_console(&line)?,
                    Err(e) => {
                        error!("Terminal read failed, stopping session loop: {}", e);
                        return Err(e);
                    }
                }
            }
            OutputEvent::Graphics(GraphicsEvent::NewPage) => {
                self.plots.new_page();
            }
            OutputEvent::Graphics(GraphicsEvent::Image(bitmap)) => {
                self.plots.draw(&bitmap);
            }
            OutputEvent::Closed => {
                self.mark_closed();
                info!("Engine channel closed, session loop finished");
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    /// Transition the session to `Closed`; idempotent by construction, but
    /// the stream yields `Closed` at most once anyway.
    fn mark_closed(&self) {
        let mut state = self.session_state.lock().unwrap();
        if *state != SessionState::Closed {
            *state = SessionState::Closed;
        }
    }
}
