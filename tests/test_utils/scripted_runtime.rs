//! Scripted runtime double for exercising the engine adapters

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use replbridge::engine::{InterruptFlag, ReplRuntime, RuntimeSink};
use replbridge::{Bitmap, EngineConfig, Error, Result};

/// One scripted reaction to an evaluated line
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Stdout(String),
    Stderr(String),
    NewPage,
    Draw(u32, u32),
    Close,
}

/// A `ReplRuntime` that replays canned output per input line.
///
/// Lines without a script entry are echoed back on stdout, so tests can
/// assert FIFO ordering without scripting every input.
pub struct ScriptedRuntime {
    prompt: String,
    script: HashMap<String, Vec<ScriptStep>>,
    completions: Vec<String>,
    failing_packages: HashSet<String>,
    fail_start: bool,
    eval_log: Arc<Mutex<Vec<String>>>,
    install_log: Arc<Mutex<Vec<String>>>,
    plot_sizes: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self {
            prompt: "> ".to_string(),
            script: HashMap::new(),
            completions: Vec::new(),
            failing_packages: HashSet::new(),
            fail_start: false,
            eval_log: Arc::new(Mutex::new(Vec::new())),
            install_log: Arc::new(Mutex::new(Vec::new())),
            plot_sizes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_script(mut self, line: &str, steps: Vec<ScriptStep>) -> Self {
        self.script.insert(line.to_string(), steps);
        self
    }

    pub fn with_completions(mut self, labels: &[&str]) -> Self {
        self.completions = labels.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_failing_package(mut self, name: &str) -> Self {
        self.failing_packages.insert(name.to_string());
        self
    }

    pub fn with_failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Handle to the evaluated-line log, readable after the runtime has
    /// moved into an adapter
    pub fn eval_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.eval_log)
    }

    /// Handle to the install-call log
    pub fn install_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.install_log)
    }

    /// Handle to the recorded plot-size reconfigurations
    pub fn plot_sizes(&self) -> Arc<Mutex<Vec<(u32, u32)>>> {
        Arc::clone(&self.plot_sizes)
    }
}

impl ReplRuntime for ScriptedRuntime {
    fn start(&mut self, _config: &EngineConfig, _interrupt: InterruptFlag) -> Result<()> {
        if self.fail_start {
            return Err(Error::EngineInit {
                kind: "scripted".to_string(),
                reason: "scripted start failure".to_string(),
            });
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        self.prompt.clone()
    }

    fn eval_line(&mut self, line: &str, sink: &mut dyn RuntimeSink) -> Result<()> {
        self.eval_log.lock().unwrap().push(line.to_string());
        match self.script.get(line) {
            Some(steps) => {
                for step in steps.clone() {
                    match step {
                        ScriptStep::Stdout(text) => sink.stdout(&text),
                        ScriptStep::Stderr(text) => sink.stderr(&text),
                        ScriptStep::NewPage => sink.new_page(),
                        ScriptStep::Draw(w, h) => {
                            sink.draw(Bitmap::solid(w, h, [255, 0, 0, 255]))
                        }
                        ScriptStep::Close => sink.closed(),
                    }
                }
            }
            None => sink.stdout(line),
        }
        Ok(())
    }

    fn complete(&mut self, _source: &str, _cursor: usize) -> Vec<String> {
        self.completions.clone()
    }

    fn install_package(&mut self, name: &str) -> Result<()> {
        self.install_log.lock().unwrap().push(name.to_string());
        if self.failing_packages.contains(name) {
            return Err(Error::PackageInstall {
                package: name.to_string(),
                reason: "scripted install failure".to_string(),
            });
        }
        Ok(())
    }

    fn set_plot_size(&mut self, width: u32, height: u32) {
        self.plot_sizes.lock().unwrap().push((width, height));
    }
}
