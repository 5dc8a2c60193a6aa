//! External tool invocation.
//!
//! Every external tool the pipeline drives (rosinstall, rosdep, apt-get,
//! cmake, make, rosmake) goes through the [`ProcessRunner`] capability so the
//! orchestration logic can be exercised against a scripted fake. The system
//! implementation blocks until the tool exits and checks its status; a
//! non-zero exit becomes a [`PipelineError::ToolInvocation`] carrying the
//! captured output.

use crate::error::{PipelineError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// A fully described tool invocation: program, arguments, environment, cwd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,

    /// Replacement environment. `None` inherits the process environment.
    pub env: Option<BTreeMap<String, String>>,

    /// Working directory. `None` inherits the process working directory.
    pub cwd: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: None,
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run with a full replacement environment instead of the inherited one.
    pub fn env_map(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a successful tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Capability for running external tools to completion.
pub trait ProcessRunner {
    /// Run the command and wait for it to exit.
    ///
    /// Returns the captured output on exit code zero; a non-zero exit or a
    /// spawn failure is a [`PipelineError::ToolInvocation`].
    fn run(&self, command: &CommandLine) -> Result<ToolOutput>;
}

/// The real implementation, backed by `std::process::Command`.
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &CommandLine) -> Result<ToolOutput> {
        debug!(command = %command, "running external tool");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(env) = &command.env {
            cmd.env_clear();
            cmd.envs(env);
        }
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd.output().map_err(|e| PipelineError::ToolInvocation {
            command: command.to_string(),
            code: -1,
            stdout: String::new(),
            stderr: format!("failed to spawn: {}", e),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(PipelineError::ToolInvocation {
                command: command.to_string(),
                code: output.status.code().unwrap_or(-1),
                stdout,
                stderr,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

pub mod fakes {
    //! Scripted process runner for tests.
    //!
    //! Records every invocation and replies with canned results keyed by
    //! program name. Programs with no scripted response succeed with empty
    //! output, so a test only scripts the commands it cares about.

    use super::{CommandLine, ProcessRunner, ToolOutput};
    use crate::error::{PipelineError, Result};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    enum Response {
        Succeed(ToolOutput),
        Fail { code: i32, stderr: String },
    }

    /// A [`ProcessRunner`] that never spawns anything.
    #[derive(Default)]
    pub struct ScriptedRunner {
        calls: Mutex<Vec<CommandLine>>,
        responses: Mutex<HashMap<String, VecDeque<Response>>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a successful response for the next invocation of `program`.
        pub fn respond(&self, program: &str, output: ToolOutput) {
            self.push(program, Response::Succeed(output));
        }

        /// Queue a failing response for the next invocation of `program`.
        pub fn fail(&self, program: &str, code: i32, stderr: &str) {
            self.push(
                program,
                Response::Fail {
                    code,
                    stderr: stderr.to_string(),
                },
            );
        }

        fn push(&self, program: &str, response: Response) {
            self.responses
                .lock()
                .unwrap()
                .entry(program.to_string())
                .or_default()
                .push_back(response);
        }

        /// Every invocation recorded so far, in order.
        pub fn calls(&self) -> Vec<CommandLine> {
            self.calls.lock().unwrap().clone()
        }

        /// The recorded invocations rendered as display strings.
        pub fn command_lines(&self) -> Vec<String> {
            self.calls().iter().map(|c| c.to_string()).collect()
        }

        /// Whether any recorded invocation starts with `prefix`.
        pub fn invoked(&self, prefix: &str) -> bool {
            self.command_lines().iter().any(|c| c.starts_with(prefix))
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&self, command: &CommandLine) -> Result<ToolOutput> {
            self.calls.lock().unwrap().push(command.clone());

            let response = self
                .responses
                .lock()
                .unwrap()
                .get_mut(&command.program)
                .and_then(|queue| queue.pop_front());

            match response {
                Some(Response::Succeed(output)) => Ok(output),
                Some(Response::Fail { code, stderr }) => Err(PipelineError::ToolInvocation {
                    command: command.to_string(),
                    code,
                    stdout: String::new(),
                    stderr,
                }),
                None => Ok(ToolOutput::default()),
            }
        }
    }
}
