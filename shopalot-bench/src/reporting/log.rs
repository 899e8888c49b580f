use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{timestamp, Entry, ResultSink};
use crate::config::BenchmarkConfig;
use crate::error::Result;

pub const RESULTS_FILE: &str = "results.json";

/// Stamps entries with the run's identity and fans them out to the configured outputs.
pub struct ResultLog {
    execution_id: Uuid,
    dataverse: String,
    file: Option<(PathBuf, BufWriter<File>)>,
    socket: Option<TcpStream>,
    console: bool,
}

impl ResultLog {
    /// A log with no outputs. Entries are stamped with `execution_id` and `dataverse`.
    pub fn new(execution_id: Uuid, dataverse: impl Into<String>) -> Self {
        Self {
            execution_id,
            dataverse: dataverse.into(),
            file: None,
            socket: None,
            console: false,
        }
    }

    /// Opens every output `config.results` asks for.
    pub async fn open(
        config: &BenchmarkConfig,
        execution_id: Uuid,
        dataverse: impl Into<String>,
    ) -> Result<Self> {
        let mut log = Self::new(execution_id, dataverse);
        if config.results.is_file {
            log = log.with_file(&config.results_dir).await?;
        }
        if config.results.is_socket {
            let cluster = &config.analysis_cluster;
            log = log
                .with_socket((
                    cluster.cluster_controller.address.as_str(),
                    cluster.feed_socket_port,
                ))
                .await?;
        }
        if config.results.is_console {
            log = log.with_console();
        }
        Ok(log)
    }

    /// Writes entries to `results.json` inside `dir`, creating the directory if needed.
    pub async fn with_file(mut self, dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(RESULTS_FILE);
        let file = File::create(&path).await?;
        info!(path = %path.display(), "Results will be stored on disk");
        self.file = Some((path, BufWriter::new(file)));
        Ok(self)
    }

    /// Sends entries to the analysis cluster feed at `addr`.
    pub async fn with_socket(mut self, addr: impl tokio::net::ToSocketAddrs) -> Result<Self> {
        let socket = TcpStream::connect(addr).await?;
        let peer: Option<SocketAddr> = socket.peer_addr().ok();
        info!(?peer, "Connected to the analysis cluster feed");
        self.socket = Some(socket);
        Ok(self)
    }

    pub fn with_console(mut self) -> Self {
        self.console = true;
        self
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }
}

#[async_trait]
impl ResultSink for ResultLog {
    async fn record(&mut self, mut entry: Entry) -> Result<()> {
        entry.insert("logTime".into(), timestamp().into());
        entry.insert("executionID".into(), self.execution_id.to_string().into());
        entry.insert("dataverse".into(), self.dataverse.clone().into());

        if let Some((_, file)) = self.file.as_mut() {
            debug!("Recording result to disk");
            let mut line = serde_json::to_vec(&entry)?;
            line.push(b'\n');
            file.write_all(&line).await?;
        }

        // The feed needs a key per entry.
        if let Some(socket) = self.socket.as_mut() {
            let mut keyed = entry.clone();
            keyed.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
            match socket.write_all(&serde_json::to_vec(&keyed)?).await {
                Ok(()) => debug!("Result sent to the analysis cluster"),
                Err(error) => warn!(%error, "Analysis cluster did not accept record"),
            }
        }

        if self.console {
            info!(entry = %serde_json::Value::Object(entry), "result");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some((path, mut file)) = self.file.take() {
            file.flush().await?;
            debug!(path = %path.display(), "Closed results file");
        }
        if let Some(mut socket) = self.socket.take() {
            if let Err(error) = socket.shutdown().await {
                warn!(%error, "Failed to shut down the analysis cluster feed");
            }
        }
        Ok(())
    }
}
