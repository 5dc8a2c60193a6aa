//! Error taxonomy for the build pipeline.
//!
//! Every stage fails fast: the first error aborts the run and is surfaced to
//! the invoking CI layer as a non-zero process exit with readable diagnostics.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors produced by the build pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The triggering build identifier is absent from the pipeline configuration.
    #[error("repository {0} is not in the pipeline configuration")]
    Configuration(String),

    /// A source-tree unit could not be classified into exactly one packaging family.
    #[error("package classification failed: {0}")]
    Classification(String),

    /// The target repository was not found in either family after a full scan.
    #[error("repository {0} to build not found in the source tree")]
    RepositoryNotFound(String),

    /// Declared source overrides that were never installed.
    #[error("not all user-declared build dependencies are fulfilled (declared: {declared:?}, fulfilled: {fulfilled:?})")]
    UnresolvedOverride {
        declared: Vec<String>,
        fulfilled: Vec<String>,
    },

    /// A wet package must not depend on dry stacks.
    #[error("wet package {package} depends on dry stack(s): {stacks:?}")]
    CrossFamilyDependency {
        package: String,
        stacks: Vec<String>,
    },

    /// An external tool exited non-zero; carries the tool's captured output.
    #[error("`{command}` failed with exit code {code}: {stderr}")]
    ToolInvocation {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// rosdep resolver initialization failed even after the one-shot retry.
    #[error("rosdep resolver initialization failed after retry: {0}")]
    TransientResolver(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pipeline configuration parsing error
    #[error("configuration parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP error while fetching the pipeline configuration
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Http(err.to_string())
    }
}
