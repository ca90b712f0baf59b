//! Metrics datasource configuration
//!
//! Describes the metrics backend that collects what the benchmark
//! workload produces. The engine only needs to know that one is
//! configured; reading from it happens after a run.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Metrics backend descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceConfig {
    /// Backend type, e.g. `prometheus` or `influxdb`
    #[serde(rename = "type")]
    pub kind: String,

    pub url: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl DatasourceConfig {
    pub(crate) fn sample() -> Self {
        Self {
            kind: "prometheus".to_string(),
            url: "http://prometheus:9090".to_string(),
            description: "Benchmark metrics".to_string(),
            username: None,
            password: None,
            database: None,
        }
    }

    /// Whether both halves of a credential pair are present
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

impl Validatable for DatasourceConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.kind, "type", self.domain_name())?;
        validate_url(&self.url, "url", self.domain_name())?;
        validate_required_string(&self.description, "description", self.domain_name())?;

        if self.username.is_some() != self.password.is_some() {
            return Err(self.validation_error(
                "username and password must be given together",
            ));
        }

        if let Some(database) = &self.database {
            validate_required_string(database, "database", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "datasource"
    }
}
