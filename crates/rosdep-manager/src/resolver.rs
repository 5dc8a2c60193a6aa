//! rosdep database resolution.
//!
//! The resolver shells out to `rosdep` once at construction, parses the full
//! database dump into a name-to-package map, and answers lookups from memory
//! afterwards. Construction can transiently fail while the rosdep cache is
//! cold, so the pipeline builds it through [`RosdepResolver::new_with_retry`].

use rosfarm_core::error::{PipelineError, Result};
use rosfarm_core::process::{CommandLine, ProcessRunner};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backoff before the single construction retry.
pub const ROSDEP_RETRY_BACKOFF: Duration = Duration::from_secs(10);

/// ROS-name to system-package mapping for one distro release.
#[derive(Debug)]
pub struct RosdepResolver {
    ros_to_apt: BTreeMap<String, Vec<String>>,
}

impl RosdepResolver {
    /// Build the mapping by updating the rosdep cache and dumping its database.
    pub fn new(ros_distro: &str, runner: &dyn ProcessRunner) -> Result<Self> {
        info!(%ros_distro, "initializing rosdep database");

        let mut env: BTreeMap<String, String> = std::env::vars().collect();
        env.insert("ROS_DISTRO".to_string(), ros_distro.to_string());

        runner.run(&CommandLine::new("rosdep").arg("update").env_map(env.clone()))?;
        let db = runner.run(&CommandLine::new("rosdep").arg("db").env_map(env))?;

        let ros_to_apt = parse_db(&db.stdout);
        debug!(entries = ros_to_apt.len(), "built rosdep lookup table");
        Ok(Self { ros_to_apt })
    }

    /// Like [`RosdepResolver::new`], retrying exactly once after a fixed
    /// backoff. A second failure is a [`PipelineError::TransientResolver`].
    pub fn new_with_retry(ros_distro: &str, runner: &dyn ProcessRunner) -> Result<Self> {
        Self::new_with_backoff(ros_distro, runner, ROSDEP_RETRY_BACKOFF)
    }

    fn new_with_backoff(
        ros_distro: &str,
        runner: &dyn ProcessRunner,
        backoff: Duration,
    ) -> Result<Self> {
        match Self::new(ros_distro, runner) {
            Ok(resolver) => Ok(resolver),
            Err(first) => {
                warn!(error = %first, "rosdep initialization failed, retrying once");
                std::thread::sleep(backoff);
                Self::new(ros_distro, runner)
                    .map_err(|e| PipelineError::TransientResolver(e.to_string()))
            }
        }
    }

    /// Whether rosdep knows a system mapping for this name.
    pub fn has_ros(&self, name: &str) -> bool {
        self.ros_to_apt.contains_key(name)
    }

    /// The system packages a ROS name resolves to.
    pub fn to_apt(&self, name: &str) -> Option<&[String]> {
        self.ros_to_apt.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.ros_to_apt.is_empty()
    }
}

/// Parse `rosdep db` dump lines of the form `ros_key -> pkg [pkg ...]`.
fn parse_db(dump: &str) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    for line in dump.lines() {
        let Some((ros_name, apt_names)) = line.split_once(" -> ") else {
            continue;
        };
        let ros_name = ros_name.trim();
        let apt_names: Vec<String> = apt_names
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if ros_name.is_empty() || apt_names.is_empty() {
            continue;
        }
        map.insert(ros_name.to_string(), apt_names);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosfarm_core::process::fakes::ScriptedRunner;
    use rosfarm_core::process::ToolOutput;

    const DB_DUMP: &str = "\
boost -> libboost-all-dev
curl -> curl libcurl4-openssl-dev
malformed line without arrow
 -> orphan
";

    fn scripted_db(runner: &ScriptedRunner) {
        // first rosdep call is `update`, second is `db`
        runner.respond("rosdep", ToolOutput::default());
        runner.respond("rosdep", ToolOutput::with_stdout(DB_DUMP));
    }

    #[test]
    fn builds_lookup_table_from_db_dump() {
        let runner = ScriptedRunner::new();
        scripted_db(&runner);

        let resolver = RosdepResolver::new("groovy", &runner).unwrap();
        assert!(resolver.has_ros("boost"));
        assert_eq!(
            resolver.to_apt("curl"),
            Some(&["curl".to_string(), "libcurl4-openssl-dev".to_string()][..])
        );
        assert!(!resolver.has_ros("malformed"));
        assert!(!resolver.has_ros(""));
    }

    #[test]
    fn sets_the_distro_in_the_tool_environment() {
        let runner = ScriptedRunner::new();
        scripted_db(&runner);
        RosdepResolver::new("groovy", &runner).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        for call in calls {
            let env = call.env.expect("rosdep runs with an explicit environment");
            assert_eq!(env.get("ROS_DISTRO").map(String::as_str), Some("groovy"));
        }
    }

    #[test]
    fn retries_once_and_succeeds() {
        let runner = ScriptedRunner::new();
        runner.fail("rosdep", 1, "cache not initialized");
        // retry: update + db succeed
        runner.respond("rosdep", ToolOutput::default());
        runner.respond("rosdep", ToolOutput::with_stdout("boost -> libboost-all-dev\n"));

        let resolver =
            RosdepResolver::new_with_backoff("groovy", &runner, Duration::ZERO).unwrap();
        assert!(resolver.has_ros("boost"));
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn second_failure_is_transient_resolver_error() {
        let runner = ScriptedRunner::new();
        runner.fail("rosdep", 1, "cache not initialized");
        runner.fail("rosdep", 1, "still not initialized");

        let err =
            RosdepResolver::new_with_backoff("groovy", &runner, Duration::ZERO).unwrap_err();
        assert!(matches!(err, PipelineError::TransientResolver(_)));
    }

    #[test]
    fn empty_dump_yields_empty_resolver() {
        let runner = ScriptedRunner::new();
        let resolver = RosdepResolver::new("groovy", &runner).unwrap();
        assert!(resolver.is_empty());
        assert_eq!(resolver.to_apt("anything"), None);
    }
}
