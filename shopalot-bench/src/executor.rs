//! The query execution boundary: a statement goes in, the service's JSON response comes out.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// The JSON document a query service answers with.
///
/// Only the fields the harness looks at are typed; everything else the service sends (plans,
/// request ids, signatures, ...) is kept in `extra` so it can be recorded untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueryResponse {
    pub const SUCCESS: &'static str = "success";

    pub fn success(results: Vec<Value>) -> Self {
        Self {
            status: Self::SUCCESS.to_owned(),
            results: Some(results),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }

    pub fn result_count(&self) -> usize {
        self.results.as_ref().map_or(0, Vec::len)
    }

    /// The service-reported execution time, e.g. `"12.3ms"`.
    pub fn elapsed_time(&self) -> Option<&str> {
        self.metrics
            .as_ref()
            .and_then(|m| m.get("elapsedTime"))
            .and_then(Value::as_str)
    }

    pub fn error_message(&self) -> String {
        self.errors
            .as_ref()
            .map_or_else(|| "no error reported".to_owned(), Value::to_string)
    }

    /// Fails with [`Error::Query`] unless the status is `success`.
    pub fn into_success(self, phase: &'static str, run: usize) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Query {
                phase,
                run,
                status: self.status.clone(),
                message: self.error_message(),
            })
        }
    }

    /// The response as a result entry, without its result set.
    pub fn into_entry(mut self) -> Result<Map<String, Value>> {
        self.results = None;
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::InvalidWorkload(format!(
                "response serialized to a non-object: {other}"
            ))),
        }
    }
}

/// Runs statements against the database under test.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes `statement`. A response with a non-`success` status is still `Ok`; transport
    /// failures and undecodable responses are errors. Nothing is retried.
    async fn execute(&self, statement: &str, timeout: Option<Duration>) -> Result<QueryResponse>;
}
