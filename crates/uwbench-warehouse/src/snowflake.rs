//! Snowflake backend over the session and query REST endpoints used by the
//! official connectors.
//!
//! A session is a login token. Statements are submitted synchronously; when
//! Snowflake answers with an in-progress code the result URL is polled until
//! the statement completes.

use std::fmt::{Debug, Formatter};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::http::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::{BackendKind, Cursor, HttpError, QueryOutcome, WarehouseConnection, WarehouseError};

const LOGIN_PATH: &str = "/session/v1/login-request";
const QUERY_PATH: &str = "/queries/v1/query-request";
const SESSION_PATH: &str = "/session";
const CLIENT_APP_ID: &str = "uwbench";

const QUERY_IN_PROGRESS: &str = "333333";
const QUERY_IN_PROGRESS_ASYNC: &str = "333334";

const INITIAL_POLL_DELAY: Duration = Duration::from_millis(250);
/// Completion is only observed on a poll, so a statement's measured time can
/// exceed its server time by up to one poll interval.
const MAX_POLL_DELAY: Duration = Duration::from_secs(1);

/// Connection parameters for a Snowflake account.
#[derive(Clone, PartialEq, Eq)]
pub struct SnowflakeConfig {
    /// Account identifier, optionally with region (`xy12345.us-east-1`).
    pub account: String,
    pub user: String,
    pub password: String,
    /// Compute warehouse the queries run on.
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    pub role: Option<String>,
    /// Base URL override, e.g. for private link endpoints.
    pub host: Option<String>,
}

impl Debug for SnowflakeConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .field("host", &self.host)
            .finish()
    }
}

impl SnowflakeConfig {
    pub fn base_url(&self) -> String {
        match self.host.as_deref() {
            Some(host) if !host.trim().is_empty() => host.trim().trim_end_matches('/').to_string(),
            _ => format!("https://{}.snowflakecomputing.com", self.account),
        }
    }

    /// Account name sent at login: the identifier without region or cloud suffix.
    pub fn account_name(&self) -> &str {
        self.account.split('.').next().unwrap_or_default()
    }

    fn login_url(&self, request_id: &str) -> String {
        let mut params = vec![
            ("databaseName", self.database.as_str()),
            ("schemaName", self.schema.as_str()),
            ("warehouse", self.warehouse.as_str()),
        ];
        if let Some(role) = self.role.as_deref() {
            params.push(("roleName", role));
        }
        params.push(("requestId", request_id));

        format!("{}{LOGIN_PATH}?{}", self.base_url(), encode_query(&params))
    }

    fn login_body(&self) -> Value {
        json!({
            "data": {
                "CLIENT_APP_ID": CLIENT_APP_ID,
                "CLIENT_APP_VERSION": env!("CARGO_PKG_VERSION"),
                "ACCOUNT_NAME": self.account_name(),
                "LOGIN_NAME": self.user,
                "PASSWORD": self.password,
            }
        })
    }
}

/// Common Snowflake response wrapper.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: Option<T>,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Default, Deserialize)]
struct LoginData {
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    query_id: Option<String>,
    get_result_url: Option<String>,
    total: Option<u64>,
    returned: Option<u64>,
    sql_state: Option<String>,
    error_code: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum QueryProgress {
    Complete(QueryOutcome),
    Pending { result_url: String },
}

/// An authenticated Snowflake session.
pub struct SnowflakeConnection {
    transport: Box<dyn HttpTransport>,
    base_url: String,
    token: String,
    sequence_id: u64,
    initial_poll_delay: Duration,
}

impl SnowflakeConnection {
    /// Log in over HTTPS with the default transport.
    ///
    /// # Errors
    /// Returns [`WarehouseError::Authentication`] when the credentials are
    /// rejected, or a transport error when the account is unreachable.
    pub fn connect(config: &SnowflakeConfig) -> Result<Self, WarehouseError> {
        Self::connect_with(config, Box::new(ReqwestTransport::new()))
    }

    /// Log in through a caller-provided transport.
    pub fn connect_with(
        config: &SnowflakeConfig,
        transport: Box<dyn HttpTransport>,
    ) -> Result<Self, WarehouseError> {
        let request_id = Uuid::new_v4().to_string();
        let request = HttpRequest::post(config.login_url(&request_id))
            .with_header("accept", "application/json")
            .with_header("content-type", "application/json")
            .with_body(config.login_body().to_string());

        let response: ApiResponse<LoginData> = send_json(transport.as_ref(), request)?;
        if !response.success {
            return Err(WarehouseError::Authentication {
                code: response.code,
                message: response
                    .message
                    .unwrap_or_else(|| String::from("login rejected")),
            });
        }

        let token = response
            .data
            .and_then(|data| data.token)
            .ok_or_else(|| {
                WarehouseError::Protocol(String::from("login response did not include a session token"))
            })?;

        debug!(
            account = config.account_name(),
            warehouse = %config.warehouse,
            database = %config.database,
            schema = %config.schema,
            "snowflake session established"
        );

        Ok(Self {
            transport,
            base_url: config.base_url(),
            token,
            sequence_id: 0,
            initial_poll_delay: INITIAL_POLL_DELAY,
        })
    }

    /// First delay between result polls; doubles up to one second.
    #[must_use]
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.initial_poll_delay = delay;
        self
    }

    fn authorized(&self, request: HttpRequest) -> HttpRequest {
        request
            .with_header("authorization", format!("Snowflake Token=\"{}\"", self.token))
            .with_header("accept", "application/json")
    }

    fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{path}", self.base_url)
        }
    }

    fn submit(&mut self, sql: &str) -> Result<QueryOutcome, WarehouseError> {
        self.sequence_id += 1;
        let body = json!({
            "sqlText": sql,
            "asyncExec": false,
            "sequenceId": self.sequence_id,
            "querySubmissionTime": submission_time_ms(),
        });
        let url = format!("{}{QUERY_PATH}?requestId={}", self.base_url, Uuid::new_v4());
        let request = self
            .authorized(HttpRequest::post(url))
            .with_header("content-type", "application/json")
            .with_body(body.to_string());

        let mut progress = interpret_query_response(send_json(self.transport.as_ref(), request)?)?;
        let mut delay = self.initial_poll_delay;
        loop {
            match progress {
                QueryProgress::Complete(outcome) => {
                    debug!(
                        query_id = outcome.query_id.as_deref().unwrap_or_default(),
                        rows = outcome.row_count,
                        "snowflake statement complete"
                    );
                    return Ok(outcome);
                }
                QueryProgress::Pending { result_url } => {
                    debug!(
                        %result_url,
                        delay_ms = delay.as_millis() as u64,
                        "snowflake statement still running"
                    );
                    thread::sleep(delay);
                    delay = next_poll_delay(delay);

                    let request = self.authorized(HttpRequest::get(self.resolve_url(&result_url)));
                    progress =
                        interpret_query_response(send_json(self.transport.as_ref(), request)?)?;
                }
            }
        }
    }
}

impl WarehouseConnection for SnowflakeConnection {
    fn kind(&self) -> BackendKind {
        BackendKind::Snowflake
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>, WarehouseError> {
        Ok(Box::new(SnowflakeCursor { connection: self }))
    }

    fn close(self: Box<Self>) -> Result<(), WarehouseError> {
        let url = format!("{}{SESSION_PATH}?delete=true", self.base_url);
        let request = self.authorized(HttpRequest::post(url));
        let response: ApiResponse<Value> = send_json(self.transport.as_ref(), request)?;
        if !response.success {
            return Err(WarehouseError::Protocol(format!(
                "session close rejected: {}",
                response.message.unwrap_or_default()
            )));
        }
        debug!("snowflake session closed");
        Ok(())
    }
}

struct SnowflakeCursor<'conn> {
    connection: &'conn mut SnowflakeConnection,
}

impl Cursor for SnowflakeCursor<'_> {
    fn execute(&mut self, sql: &str) -> Result<QueryOutcome, WarehouseError> {
        self.connection.submit(sql)
    }
}

fn next_poll_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_POLL_DELAY)
}

fn send_json<T: DeserializeOwned>(
    transport: &dyn HttpTransport,
    request: HttpRequest,
) -> Result<ApiResponse<T>, WarehouseError> {
    let response = transport.execute(request)?;
    if !response.is_success() {
        return Err(WarehouseError::Http(HttpError::new(format!(
            "warehouse returned HTTP {}",
            response.status
        ))));
    }
    Ok(serde_json::from_str(&response.body)?)
}

fn interpret_query_response(
    response: ApiResponse<QueryData>,
) -> Result<QueryProgress, WarehouseError> {
    let data = response.data.unwrap_or_default();

    if matches!(
        response.code.as_deref(),
        Some(QUERY_IN_PROGRESS | QUERY_IN_PROGRESS_ASYNC)
    ) {
        let result_url = data.get_result_url.ok_or_else(|| {
            WarehouseError::Protocol(String::from("statement in progress without a result URL"))
        })?;
        return Ok(QueryProgress::Pending { result_url });
    }

    if !response.success {
        return Err(WarehouseError::QueryFailed {
            code: response.code.or(data.error_code),
            sql_state: data.sql_state,
            message: response
                .message
                .unwrap_or_else(|| String::from("statement failed")),
            query_id: data.query_id,
        });
    }

    Ok(QueryProgress::Complete(QueryOutcome {
        row_count: data.total.or(data.returned).unwrap_or(0),
        query_id: data.query_id,
    }))
}

fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn submission_time_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
