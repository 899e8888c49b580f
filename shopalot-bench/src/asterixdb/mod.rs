//! AsterixDB: an HTTP [`QueryExecutor`] for its query service, and the SQL++ text the workloads
//! send it.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::TargetConfig;
use crate::error::Result;
use crate::executor::{QueryExecutor, QueryResponse};

pub mod statements;

/// Posts statements as forms to `http://<node controller>/query/service`.
#[derive(Debug, Clone)]
pub struct AsterixExecutor {
    client: reqwest::Client,
    url: String,
    profile: bool,
}

impl AsterixExecutor {
    pub fn new(url: impl Into<String>, profile: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            profile,
        }
    }

    pub fn from_config(target: &TargetConfig) -> Self {
        Self::new(target.node_controller.query_service_url(), target.is_profile)
    }

    /// Form parameters for `statement`. Every statement asks for its plans and, when profiling,
    /// per-operator counts, so the recorded entry carries them.
    fn parameters(&self, statement: &str, timeout: Option<Duration>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("statement", statement.to_owned()),
            ("client_context_id", Uuid::new_v4().to_string()),
            ("plan-format", "STRING".to_owned()),
            ("expression-tree", "true".to_owned()),
            ("rewritten-expression-tree", "true".to_owned()),
            ("logical-plan", "true".to_owned()),
            ("optimized-logical-plan", "true".to_owned()),
            ("job", "true".to_owned()),
        ];
        if self.profile {
            params.push(("profile", "counts".to_owned()));
        }
        if let Some(timeout) = timeout {
            params.push(("timeout", format!("{}s", timeout.as_secs().max(1))));
        }
        params
    }
}

#[async_trait]
impl QueryExecutor for AsterixExecutor {
    async fn execute(&self, statement: &str, timeout: Option<Duration>) -> Result<QueryResponse> {
        let mut request = self
            .client
            .post(&self.url)
            .form(&self.parameters(statement, timeout));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response: QueryResponse = request.send().await?.json().await?;
        if response.is_success() {
            debug!(elapsed = response.elapsed_time(), "statement executed");
        } else {
            warn!(
                %statement,
                status = %response.status,
                errors = %response.error_message(),
                "statement was not successful"
            );
        }
        Ok(response)
    }
}
