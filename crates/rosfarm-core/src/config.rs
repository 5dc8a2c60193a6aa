//! Pipeline configuration loading.
//!
//! The pipeline configuration is a YAML document maintained per CI user. It
//! declares every repository the pipeline may build, where to check it out
//! from, and which of its build dependencies are pinned to user-declared
//! source overrides instead of system packages.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

fn default_scm() -> String {
    "git".to_string()
}

/// A user-declared pin forcing a dependency to be built from a specific
/// source checkout rather than installed via the system package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOverride {
    /// Source control kind (git, hg, svn).
    #[serde(rename = "type", default = "default_scm")]
    pub scm: String,

    /// Source URI.
    pub url: String,

    /// Branch, tag or revision to check out.
    #[serde(default)]
    pub version: Option<String>,
}

impl SourceOverride {
    /// Render this override as a rosinstall manifest entry.
    pub fn rosinstall_entry(&self, local_name: &str) -> String {
        rosinstall_entry(&self.scm, local_name, &self.url, self.version.as_deref())
    }
}

/// One buildable repository declared in the pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    /// Source control kind (git, hg, svn).
    #[serde(rename = "type", default = "default_scm")]
    pub scm: String,

    /// Source URI.
    pub url: String,

    /// Branch, tag or revision to check out.
    #[serde(default)]
    pub version: Option<String>,

    /// Whether the CI server polls this repository for changes.
    #[serde(default)]
    pub poll: bool,

    /// Dependency-name to source-override mapping. Names declared here are
    /// installed from source instead of resolved through rosdep.
    #[serde(default)]
    pub dependencies: BTreeMap<String, SourceOverride>,
}

impl RepoEntry {
    /// Render this repository as a rosinstall manifest entry.
    pub fn rosinstall_entry(&self, local_name: &str) -> String {
        rosinstall_entry(&self.scm, local_name, &self.url, self.version.as_deref())
    }
}

fn rosinstall_entry(scm: &str, local_name: &str, url: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!(
            "- {}: {{local-name: {}, uri: '{}', version: {}}}\n",
            scm, local_name, url, version
        ),
        None => format!("- {}: {{local-name: {}, uri: '{}'}}\n", scm, local_name, url),
    }
}

/// The pipeline configuration of one CI user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// User the configuration belongs to.
    pub user_name: String,

    /// CI server the jobs run on.
    pub server_name: String,

    /// Notification address.
    #[serde(default)]
    pub email: Option<String>,

    /// Repository-identifier to repository mapping. Identifiers may carry a
    /// `__suffix` distinguishing multiple build variants of one repository.
    #[serde(default)]
    pub repositories: BTreeMap<String, RepoEntry>,
}

impl PipelineConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(text)?;
        debug!(
            repositories = config.repositories.len(),
            user = %config.user_name,
            "parsed pipeline configuration"
        );
        Ok(config)
    }

    /// Load a configuration from a local file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Fetch a configuration from the pipeline configuration repository.
    ///
    /// The configuration lives in a per-server, per-user layout inside the
    /// owner's `jenkins_config` repository.
    pub fn load_from_url(owner: &str, server_name: &str, user_name: &str) -> Result<Self> {
        let url = format!(
            "https://raw.github.com/{}/jenkins_config/master/{}/{}/pipeline_config.yaml",
            owner, server_name, user_name
        );
        info!(%url, "loading pipeline configuration");
        let text = reqwest::blocking::get(&url)?.error_for_status()?.text()?;
        Self::from_yaml(&text)
    }

    /// Look up the repository entry for a build identifier.
    ///
    /// The lookup uses the full identifier including any `__suffix`, since
    /// every build variant is a separate configuration entry.
    pub fn lookup(&self, identifier: &str) -> Result<&RepoEntry> {
        self.repositories
            .get(identifier)
            .ok_or_else(|| PipelineError::Configuration(identifier.to_string()))
    }
}

/// The `repo[__suffix]` string identifying which pipeline entry triggered
/// the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentifier {
    /// The identifier exactly as triggered, used for configuration lookup.
    pub full: String,

    /// Base repository name, the substring before the first `__`.
    pub repository: String,

    /// Build-variant suffix, reported but never used for resolution.
    pub suffix: Option<String>,
}

impl BuildIdentifier {
    /// Split a raw identifier at the first `__`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once("__") {
            Some((repository, suffix)) => Self {
                full: raw.to_string(),
                repository: repository.to_string(),
                suffix: Some(suffix.to_string()),
            },
            None => Self {
                full: raw.to_string(),
                repository: raw.to_string(),
                suffix: None,
            },
        }
    }
}

impl fmt::Display for BuildIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full)
    }
}
