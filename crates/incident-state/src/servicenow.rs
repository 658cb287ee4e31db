//! ServiceNow Table API backend
//!
//! Talks to the `incident`, `sys_user` and `sys_journal_field` tables over
//! basic auth. Records are always addressed by `sys_id`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::backend::{
    IncidentBackend, IncidentRecord, IncidentRef, IncidentState, IncidentUpdate, JournalEntry,
    NewIncident,
};
use crate::error::{IncidentError, IncidentResult};

/// Username the automation files incidents as.
pub const DEFAULT_CALLER: &str = "integration.incidentuser";

/// Resolution code used when an update to Resolved does not carry one.
pub const DEFAULT_RESOLUTION_CODE: &str = "Resolved by caller";

/// Close notes used when an update to Resolved does not carry any.
pub const DEFAULT_CLOSE_NOTES: &str = "Automated remediation applied. See work notes.";

const INCIDENT_TABLE: &str = "incident";
const READ_FIELDS: &str = "sys_id,number,state,incident_state,short_description,description";
const JOURNAL_FIELDS: &str = "sys_created_on,sys_created_by,element,value";
const JOURNAL_LIMIT: &str = "100";

/// ServiceNow connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceNowConfig {
    /// Instance base URL, e.g. `https://dev12345.service-now.com`
    pub instance_url: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    /// Caller username for newly created incidents
    pub caller: String,
    /// Resolution code applied when resolving without an explicit one
    pub default_resolution_code: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ServiceNowConfig {
    fn default() -> Self {
        ServiceNowConfig {
            instance_url: non_empty_env("SERVICENOW_INSTANCE_URL"),
            username: non_empty_env("SERVICENOW_USERNAME"),
            password: non_empty_env("SERVICENOW_PASSWORD"),
            caller: non_empty_env("SERVICENOW_CALLER")
                .unwrap_or_else(|| DEFAULT_CALLER.to_string()),
            default_resolution_code: non_empty_env("DEFAULT_RESOLUTION_CODE")
                .unwrap_or_else(|| DEFAULT_RESOLUTION_CODE.to_string()),
            timeout_secs: 30,
        }
    }
}

impl ServiceNowConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific instance
    pub fn new(instance_url: &str, username: &str, password: &str) -> Self {
        ServiceNowConfig {
            instance_url: Some(instance_url.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            caller: DEFAULT_CALLER.to_string(),
            default_resolution_code: DEFAULT_RESOLUTION_CODE.to_string(),
            timeout_secs: 30,
        }
    }

    /// Config with no instance or credentials set.
    pub fn unconfigured() -> Self {
        ServiceNowConfig {
            instance_url: None,
            username: None,
            password: None,
            caller: DEFAULT_CALLER.to_string(),
            default_resolution_code: DEFAULT_RESOLUTION_CODE.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_caller(mut self, caller: &str) -> Self {
        self.caller = caller.to_string();
        self
    }

    pub fn with_resolution_code(mut self, code: &str) -> Self {
        self.default_resolution_code = code.to_string();
        self
    }

    /// Whether instance URL, username and password are all present.
    pub fn is_configured(&self) -> bool {
        self.instance_url.is_some() && self.username.is_some() && self.password.is_some()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

struct Credentials<'a> {
    base: &'a str,
    username: &'a str,
    password: &'a str,
}

/// ServiceNow incident client
pub struct ServiceNowClient {
    config: ServiceNowConfig,
    http_client: reqwest::Client,
}

impl ServiceNowClient {
    /// Create a new client. Credentials are checked lazily, on first use.
    pub fn new(config: ServiceNowConfig) -> IncidentResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("remediator-incident-state/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(ServiceNowClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> IncidentResult<Self> {
        Self::new(ServiceNowConfig::from_env())
    }

    pub fn config(&self) -> &ServiceNowConfig {
        &self.config
    }

    fn credentials(&self) -> IncidentResult<Credentials<'_>> {
        match (
            self.config.instance_url.as_deref(),
            self.config.username.as_deref(),
            self.config.password.as_deref(),
        ) {
            (Some(base), Some(username), Some(password)) => Ok(Credentials {
                base: base.trim_end_matches('/'),
                username,
                password,
            }),
            _ => Err(IncidentError::MissingCredentials),
        }
    }

    fn request(
        &self,
        creds: &Credentials<'_>,
        method: reqwest::Method,
        path: &str,
    ) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}/api/now/table/{}", creds.base, path))
            .basic_auth(creds.username, Some(creds.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    /// Resolve a username to its `sys_user.sys_id`.
    async fn caller_sys_id(&self, username: &str) -> IncidentResult<Option<String>> {
        let creds = self.credentials()?;
        let user_query = format!("user_name={username}");
        let body = self
            .request(&creds, reqwest::Method::GET, "sys_user")
            .query(&[
                ("sysparm_query", user_query.as_str()),
                ("sysparm_fields", "sys_id"),
                ("sysparm_limit", "1"),
            ])
            .send()
            .await
            .map_err(IncidentError::from)?;
        let body = into_json(body).await?;

        Ok(body
            .get("result")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(|row| field_text(row, "sys_id")))
    }
}

#[async_trait]
impl IncidentBackend for ServiceNowClient {
    async fn create(&self, incident: NewIncident) -> IncidentResult<IncidentRef> {
        let creds = self.credentials()?;
        let caller_id = self.caller_sys_id(&incident.caller).await?;
        if caller_id.is_none() {
            warn!(caller = %incident.caller, "Caller not found in sys_user; creating without caller_id");
        }

        let payload = create_payload(&incident, caller_id.as_deref());
        let response = self
            .request(&creds, reqwest::Method::POST, INCIDENT_TABLE)
            .json(&payload)
            .send()
            .await?;
        let body = into_json(response).await?;

        let result = body
            .get("result")
            .ok_or_else(|| IncidentError::Decode("create response has no result".to_string()))?;
        let created = IncidentRef {
            sys_id: field_text(result, "sys_id")
                .ok_or_else(|| IncidentError::Decode("created incident has no sys_id".to_string()))?,
            number: field_text(result, "number").unwrap_or_default(),
        };
        info!(sys_id = %created.sys_id, number = %created.number, "Created incident");
        Ok(created)
    }

    async fn read(&self, sys_id: &str) -> IncidentResult<IncidentRecord> {
        let creds = self.credentials()?;
        let response = self
            .request(
                &creds,
                reqwest::Method::GET,
                &format!("{INCIDENT_TABLE}/{sys_id}"),
            )
            .query(&[("sysparm_fields", READ_FIELDS)])
            .send()
            .await?;

        let body = match into_json(response).await {
            Ok(body) => body,
            Err(IncidentError::Http { status: 404, .. }) => {
                return Err(IncidentError::NotFound(sys_id.to_string()))
            }
            Err(e) => return Err(e),
        };

        let result = body
            .get("result")
            .ok_or_else(|| IncidentError::NotFound(sys_id.to_string()))?;
        parse_record(result, sys_id)
    }

    async fn update(&self, sys_id: &str, update: IncidentUpdate) -> IncidentResult<()> {
        if sys_id.trim().is_empty() {
            return Err(IncidentError::MissingId);
        }
        let creds = self.credentials()?;
        let payload = update_payload(&update, &self.config.default_resolution_code);
        debug!(sys_id, fields = ?payload.keys().collect::<Vec<_>>(), "Patching incident");

        let response = self
            .request(
                &creds,
                reqwest::Method::PATCH,
                &format!("{INCIDENT_TABLE}/{sys_id}"),
            )
            .query(&[("sysparm_input_display_value", "true")])
            .json(&payload)
            .send()
            .await?;

        match into_json(response).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(sys_id, error = %e, "Incident update failed");
                Err(e)
            }
        }
    }

    async fn journal(&self, sys_id: &str) -> IncidentResult<Vec<JournalEntry>> {
        let creds = self.credentials()?;
        let query = journal_query(sys_id);
        let response = self
            .request(&creds, reqwest::Method::GET, "sys_journal_field")
            .query(&[
                ("sysparm_query", query.as_str()),
                ("sysparm_fields", JOURNAL_FIELDS),
                ("sysparm_display_value", "true"),
                ("sysparm_limit", JOURNAL_LIMIT),
            ])
            .send()
            .await?;
        let body = into_json(response).await?;
        Ok(parse_journal(&body))
    }
}

async fn into_json(response: reqwest::Response) -> IncidentResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IncidentError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<Value>().await?)
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// POST body for a new incident.
pub fn create_payload(incident: &NewIncident, caller_id: Option<&str>) -> Value {
    json!({
        "short_description": incident.short_description,
        "description": incident.description,
        "caller_id": caller_id,
        "urgency": "2",
        "impact": "2",
        "category": "inquiry",
    })
}

/// PATCH body for an update. Moving to Resolved sends every resolution-code
/// column instances are known to use; unknown columns are ignored upstream.
pub fn update_payload(update: &IncidentUpdate, default_resolution_code: &str) -> Map<String, Value> {
    let mut payload = Map::new();

    if let Some(notes) = update.work_notes.as_deref().filter(|n| !n.is_empty()) {
        payload.insert("work_notes".into(), Value::from(notes));
    }

    if let Some(state) = &update.state {
        let code = state.code();
        let value = code
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(code));
        payload.insert("state".into(), value.clone());
        payload.insert("incident_state".into(), value);

        if *state == IncidentState::Resolved {
            let code = update
                .close_code
                .as_deref()
                .unwrap_or(default_resolution_code);
            let notes = update.close_notes.as_deref().unwrap_or(DEFAULT_CLOSE_NOTES);
            payload.insert("close_notes".into(), Value::from(notes));
            payload.insert("close_code".into(), Value::from(code));
            payload.insert("u_resolution_code".into(), Value::from(code));
            payload.insert("resolution_code".into(), Value::from(code));
        }
    }

    payload
}

/// Encoded query selecting a record's work notes and comments, oldest first.
pub fn journal_query(sys_id: &str) -> String {
    format!(
        "name={INCIDENT_TABLE}^elementINcomments,work_notes^documentkey={sys_id}^ORDERBYsys_created_on"
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Field as text. Display-value responses may nest `{display_value, value}`.
fn field_text(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj
            .get("value")
            .or_else(|| obj.get("display_value"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Parse an incident `result` object. `state` wins over `incident_state`.
pub fn parse_record(result: &Value, requested_id: &str) -> IncidentResult<IncidentRecord> {
    if !result.is_object() {
        return Err(IncidentError::Decode(format!(
            "incident {requested_id} is not an object"
        )));
    }
    let state = field_text(result, "state")
        .filter(|s| !s.is_empty())
        .or_else(|| field_text(result, "incident_state"))
        .unwrap_or_default();

    Ok(IncidentRecord {
        sys_id: field_text(result, "sys_id").unwrap_or_else(|| requested_id.to_string()),
        number: field_text(result, "number").unwrap_or_default(),
        state: IncidentState::from_code(&state),
        short_description: field_text(result, "short_description").unwrap_or_default(),
        description: field_text(result, "description").unwrap_or_default(),
    })
}

/// Parse `sys_journal_field` rows.
pub fn parse_journal(body: &Value) -> Vec<JournalEntry> {
    body.get("result")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| JournalEntry {
                    timestamp: field_text(row, "sys_created_on"),
                    author: field_text(row, "sys_created_by"),
                    kind: field_text(row, "element"),
                    text: field_text(row, "value").unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default()
}
