//! Test specifications and the documents that carry them
//!
//! A test document is a YAML mapping from test name to definition:
//!
//! ```yaml
//! 4k-random-readwrite:
//!   description: 4K random read/write workload test
//!   testDuration: 1800   # seconds
//!   rampInterval: 90     # seconds between batches of clients
//!   batchSize: 20
//!   clients: 100
//!   target: woodpecker:magpie
//!   action: fio
//!   parameters:
//!     operation: randrw
//!     iodepth: 32
//! ```
//!
//! The kebab-case (`test-duration`) and snake_case (`test_duration`)
//! spellings are accepted as well, and `application` is an alias of
//! `target`.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DocumentError;
use crate::utils::serde_duration;

/// Free-form action parameters
pub type Parameters = serde_json::Map<String, JsonValue>;

/// A `"app"` or `"model:app"` target string.
///
/// The string is split on the first `:`. Without a model component the
/// fleet session's current model is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetDescriptor {
    model: Option<String>,
    application: String,
}

impl TargetDescriptor {
    /// Target an application in the current model
    pub fn application(application: impl Into<String>) -> Self {
        Self {
            model: None,
            application: application.into(),
        }
    }

    /// Target an application in a named model
    pub fn in_model(model: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            application: application.into(),
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn app_name(&self) -> &str {
        &self.application
    }
}

impl FromStr for TargetDescriptor {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (model, application) = match trimmed.split_once(':') {
            Some((model, application)) => {
                let model = model.trim();
                if model.is_empty() {
                    return Err(DocumentError::InvalidTarget(s.to_string()));
                }
                (Some(model.to_string()), application.trim())
            }
            None => (None, trimmed),
        };

        if application.is_empty() {
            return Err(DocumentError::InvalidTarget(s.to_string()));
        }

        Ok(Self {
            model,
            application: application.to_string(),
        })
    }
}

impl TryFrom<String> for TargetDescriptor {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetDescriptor> for String {
    fn from(target: TargetDescriptor) -> Self {
        target.to_string()
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.model {
            Some(model) => write!(f, "{}:{}", model, self.application),
            None => write!(f, "{}", self.application),
        }
    }
}

/// A named benchmark definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "serde_duration")]
    pub test_duration: Duration,
    #[serde(with = "serde_duration")]
    pub ramp_interval: Duration,
    pub batch_size: usize,
    pub clients: usize,
    pub target: TargetDescriptor,
    pub action: String,
    pub parameters: Parameters,
}

impl TestSpec {
    /// Start building a spec; the remaining fields default to a single
    /// client in a single batch over a 60 second run.
    pub fn builder(
        name: impl Into<String>,
        target: TargetDescriptor,
        action: impl Into<String>,
    ) -> TestSpecBuilder {
        TestSpecBuilder::new(name, target, action)
    }

    /// Check the numeric invariants of a spec
    pub fn check(&self) -> Result<(), DocumentError> {
        if self.test_duration.is_zero() {
            return Err(self.invalid("testDuration", "must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(self.invalid("batchSize", "must be at least 1"));
        }
        if self.clients == 0 {
            return Err(self.invalid("clients", "must be at least 1"));
        }
        if self.action.trim().is_empty() {
            return Err(self.invalid("action", "cannot be empty"));
        }
        Ok(())
    }

    /// Number of batches the ramp is split into
    pub fn batch_count(&self) -> usize {
        self.clients.div_ceil(self.batch_size.max(1))
    }

    fn invalid(&self, field: &'static str, message: &str) -> DocumentError {
        DocumentError::InvalidField {
            test: self.name.clone(),
            field,
            message: message.to_string(),
        }
    }
}

/// Builder for constructing test specs in code
pub struct TestSpecBuilder {
    spec: TestSpec,
}

impl TestSpecBuilder {
    fn new(name: impl Into<String>, target: TargetDescriptor, action: impl Into<String>) -> Self {
        Self {
            spec: TestSpec {
                name: name.into(),
                description: None,
                test_duration: Duration::from_secs(60),
                ramp_interval: Duration::ZERO,
                batch_size: 1,
                clients: 1,
                target,
                action: action.into(),
                parameters: Parameters::new(),
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = Some(description.into());
        self
    }

    pub fn test_duration(mut self, duration: Duration) -> Self {
        self.spec.test_duration = duration;
        self
    }

    pub fn ramp_interval(mut self, interval: Duration) -> Self {
        self.spec.ramp_interval = interval;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.spec.batch_size = batch_size;
        self
    }

    pub fn clients(mut self, clients: usize) -> Self {
        self.spec.clients = clients;
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.spec.parameters.insert(key.into(), value);
        self
    }

    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.spec.parameters = parameters;
        self
    }

    /// Build the spec, checking its invariants
    pub fn build(self) -> Result<TestSpec, DocumentError> {
        self.spec.check()?;
        Ok(self.spec)
    }
}

/// Wire shape of a single test entry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawTestSpec {
    #[serde(default)]
    description: Option<String>,
    #[serde(with = "serde_duration", alias = "test-duration", alias = "test_duration")]
    test_duration: Duration,
    #[serde(
        with = "serde_duration",
        default,
        alias = "ramp-interval",
        alias = "ramp_interval"
    )]
    ramp_interval: Duration,
    #[serde(alias = "batch-size", alias = "batch_size")]
    batch_size: usize,
    clients: usize,
    #[serde(alias = "application")]
    target: TargetDescriptor,
    action: String,
    #[serde(default)]
    parameters: Parameters,
}

impl RawTestSpec {
    fn into_spec(self, name: String) -> Result<TestSpec, DocumentError> {
        let spec = TestSpec {
            name,
            description: self.description,
            test_duration: self.test_duration,
            ramp_interval: self.ramp_interval,
            batch_size: self.batch_size,
            clients: self.clients,
            target: self.target,
            action: self.action,
            parameters: self.parameters,
        };
        spec.check()?;
        Ok(spec)
    }
}

/// An ordered collection of named tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestDocument {
    tests: Vec<TestSpec>,
}

impl TestDocument {
    /// Build a document from already-constructed specs, keeping their order
    pub fn from_tests(tests: Vec<TestSpec>) -> Self {
        Self { tests }
    }

    /// Parse a YAML document, preserving the order tests are declared in
    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mapping: serde_yaml::Mapping = serde_yaml::from_str(content)?;
        let mut tests = Vec::with_capacity(mapping.len());

        for (key, value) in mapping {
            let name = match key {
                serde_yaml::Value::String(name) => name,
                other => return Err(DocumentError::InvalidName(format!("{:?}", other))),
            };
            let raw: RawTestSpec = serde_yaml::from_value(value)?;
            tests.push(raw.into_spec(name)?);
        }

        Ok(Self { tests })
    }

    /// Parse a base64-wrapped YAML document
    pub fn from_base64_yaml(encoded: &str) -> Result<Self, DocumentError> {
        let compact: String = encoded.split_whitespace().collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| DocumentError::Decode(e.to_string()))?;
        let content = String::from_utf8(bytes).map_err(|e| DocumentError::Decode(e.to_string()))?;
        Self::from_yaml_str(&content)
    }

    pub fn tests(&self) -> &[TestSpec] {
        &self.tests
    }

    pub fn get(&self, name: &str) -> Option<&TestSpec> {
        self.tests.iter().find(|test| test.name == name)
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl IntoIterator for TestDocument {
    type Item = TestSpec;
    type IntoIter = std::vec::IntoIter<TestSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.tests.into_iter()
    }
}

impl<'a> IntoIterator for &'a TestDocument {
    type Item = &'a TestSpec;
    type IntoIter = std::slice::Iter<'a, TestSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.tests.iter()
    }
}
