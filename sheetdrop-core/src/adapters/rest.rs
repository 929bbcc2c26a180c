//! SheetDrop backend client
//!
//! Rules live under `{base}/gmail/rules/`. The backend accepts the flat
//! payload shape and answers with the stored rule.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::domain::result::Error as DomainError;
use crate::domain::{Rule, RulePayload};
use crate::ports::RuleRepository;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Parse a list response, bare or wrapped in `data`
///
/// Rules are read one by one so a malformed entry is reported by its id.
fn parse_rule_list(body: Value) -> Result<Vec<Rule>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Err(DomainError::backend("Rules response has no rule list").into()),
        },
        _ => return Err(DomainError::backend("Rules response is not a list").into()),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| -> Result<Rule> {
            let which = match item.get("id").and_then(Value::as_i64) {
                Some(id) => format!("rule {}", id),
                None => format!("rule at position {}", index),
            };
            serde_json::from_value::<Rule>(item).map_err(|e| {
                anyhow::Error::from(DomainError::backend(format!(
                    "Invalid {} in rules response: {}",
                    which, e
                )))
            })
        })
        .collect()
}

/// Remote rule repository talking to the SheetDrop API
#[derive(Debug)]
pub struct RestRuleRepository {
    client: Client,
    rules_url: Url,
    token: Option<String>,
}

impl RestRuleRepository {
    /// Create a client for `base_url`, authenticating with `token` if given
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        // A trailing slash keeps the base path when joining
        let mut base = Url::parse(base_url)
            .map_err(|e| DomainError::Config(format!("Invalid API URL '{}': {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rules_url = base
            .join("gmail/rules/")
            .context("Failed to build rules endpoint URL")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            rules_url,
            token: token.filter(|t| !t.trim().is_empty()).map(str::to_string),
        })
    }

    /// Endpoint of the rule collection
    pub fn rules_url(&self) -> &Url {
        &self.rules_url
    }

    fn rule_url(&self, id: i64) -> Result<Url> {
        self.rules_url
            .join(&format!("{}/", id))
            .context("Failed to build rule URL")
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .map_err(map_request_error)?;
        check_response_status(response)
    }
}

fn map_request_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        DomainError::backend(format!(
            "Connection timed out after {} seconds",
            REQUEST_TIMEOUT_SECS
        ))
        .into()
    } else if error.is_connect() {
        DomainError::backend("Unable to connect to the SheetDrop API").into()
    } else {
        DomainError::backend(format!("Request failed: {}", error)).into()
    }
}

/// Map non-success statuses to domain errors, carrying the response body
fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let detail = if body.trim().is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {}", status.as_u16(), body.trim())
    };

    match status {
        StatusCode::UNAUTHORIZED => Err(DomainError::Unauthorized(detail).into()),
        StatusCode::NOT_FOUND => Err(DomainError::not_found(detail).into()),
        _ => Err(DomainError::backend(detail).into()),
    }
}

/// Parse a saved rule, falling back to the payload when the body is not a rule
fn saved_rule(response: Response, id: Option<i64>, payload: &RulePayload) -> Result<Rule> {
    let body = response.text().context("Failed to read API response")?;
    match serde_json::from_str::<Rule>(&body) {
        Ok(rule) if rule.id.is_some() => Ok(rule),
        _ => Ok(Rule::from_payload(id, payload)?),
    }
}

impl RuleRepository for RestRuleRepository {
    fn name(&self) -> &str {
        "remote"
    }

    fn list_rules(&self) -> Result<Vec<Rule>> {
        let response = self.send(self.client.get(self.rules_url.clone()))?;
        let body: Value = response
            .json()
            .context("Failed to parse rules response")?;
        parse_rule_list(body)
    }

    fn get_rule(&self, id: i64) -> Result<Option<Rule>> {
        // The API has no single-rule read; filter the listing
        Ok(self.list_rules()?.into_iter().find(|r| r.id == Some(id)))
    }

    fn create_rule(&self, payload: &RulePayload) -> Result<Rule> {
        let response = self.send(self.client.post(self.rules_url.clone()).json(payload))?;
        saved_rule(response, None, payload)
    }

    fn update_rule(&self, id: i64, payload: &RulePayload) -> Result<Rule> {
        let response = self.send(self.client.put(self.rule_url(id)?).json(payload))?;
        saved_rule(response, Some(id), payload)
    }

    fn delete_rule(&self, id: i64) -> Result<bool> {
        match self.send(self.client.delete(self.rule_url(id)?)) {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
