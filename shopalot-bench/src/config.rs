//! The benchmark config file (`config/asterixdb.json`).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkConfig {
    pub benchmark: TargetConfig,
    pub analysis_cluster: AnalysisCluster,
    #[serde(default)]
    pub results: ResultsConfig,
    /// Directory the run's `results.json` is written to. Created if missing.
    pub results_dir: PathBuf,
}

impl BenchmarkConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// The database under test and how to restart it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfig {
    pub node_controller: NodeController,
    /// argv of the command that stops the cluster.
    pub stop_command: Vec<String>,
    /// argv of the command that starts the cluster.
    pub start_command: Vec<String>,
    /// Run after the workload with the results directory appended as its last argument.
    #[serde(default)]
    pub post_command: Option<String>,
    /// Ask the query service for per-operator counts with every statement.
    #[serde(default = "default_true")]
    pub is_profile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeController {
    pub address: String,
    pub port: u16,
}

impl NodeController {
    pub fn query_service_url(&self) -> String {
        format!("http://{}:{}/query/service", self.address, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCluster {
    pub cluster_controller: ClusterControllerAddress,
    pub feed_socket_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterControllerAddress {
    pub address: String,
}

/// Where result entries go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsConfig {
    pub is_file: bool,
    pub is_socket: bool,
    pub is_console: bool,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            is_file: true,
            is_socket: false,
            is_console: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_benchmark_config() {
        let config: BenchmarkConfig = serde_json::from_str(
            r#"{
                "benchmark": {
                    "nodeController": {"address": "localhost", "port": 19002},
                    "stopCommand": ["bin/stop-sample-cluster.sh", "-f"],
                    "startCommand": ["bin/start-sample-cluster.sh"],
                    "postCommand": "scripts/collect.sh"
                },
                "analysisCluster": {
                    "clusterController": {"address": "analysis.local"},
                    "feedSocketPort": 10001
                },
                "results": {"isFile": true, "isSocket": true, "isConsole": false},
                "resultsDir": "out/run"
            }"#,
        )
        .unwrap();

        assert!(config.benchmark.is_profile);
        assert_eq!(
            config.benchmark.node_controller.query_service_url(),
            "http://localhost:19002/query/service"
        );
        assert_eq!(config.benchmark.stop_command.len(), 2);
        assert_eq!(config.analysis_cluster.feed_socket_port, 10001);
        assert!(config.results.is_socket);
    }
}
