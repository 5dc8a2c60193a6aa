//! ROS environment capture.
//!
//! The native build tools expect the environment produced by sourcing a
//! distro or workspace setup file. Instead of mutating the pipeline's own
//! environment, the capture shells out once, parses the resulting `env`
//! dump, and hands the map to later tool invocations explicitly.

use crate::error::Result;
use crate::process::{CommandLine, ProcessRunner};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Capture the environment after sourcing `setup_file`.
pub fn ros_env(setup_file: &Path, runner: &dyn ProcessRunner) -> Result<BTreeMap<String, String>> {
    let command = CommandLine::new("bash").args([
        "-c".to_string(),
        format!("source {} && env", setup_file.display()),
    ]);
    let output = runner.run(&command)?;
    let env = parse_env(&output.stdout);
    debug!(
        setup_file = %setup_file.display(),
        variables = env.len(),
        "captured ROS environment"
    );
    Ok(env)
}

fn parse_env(dump: &str) -> BTreeMap<String, String> {
    dump.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
