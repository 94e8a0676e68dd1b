//! Monitoring API client.
//!
//! Logs in, fetches the facility list or a single facility's detail view
//! and normalizes what comes back. The bearer token comes from an explicit
//! [`Session`]; an HTTP 401 invalidates that session. There is no retry
//! policy.

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{FacilityDetail, FacilityRecord};
use crate::normalize::{
    departments_from_envelope, envelope_message, facilities_from_envelope, facility_from_envelope,
    staff_from_envelope,
};
use crate::session::{Session, SessionUser};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Minimum password length the backend accepts.
const MIN_PASSWORD_LEN: usize = 6;

/// A fetch result stamped with the generation of the request.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub generation: u64,
    pub data: T,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    data: LoginData,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
    user: LoginUser,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    id: serde_json::Value,
    email: String,
}

/// HTTP client for the monitoring API.
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
    generation: AtomicU64,
}

impl ApiClient {
    /// Create a client for the configured API.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            generation: AtomicU64::new(0),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Log in and start a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        validate_credentials(email, password)?;

        info!("Logging in as {}", email);
        let response = self
            .http_client
            .post(self.url("login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            let message = envelope_message(&body)
                .unwrap_or_else(|| "email or password rejected".to_string());
            return Err(ApiError::InvalidCredentials(message));
        }
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let envelope: LoginEnvelope = serde_json::from_str(&body)?;
        let user_id = match envelope.data.user.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };

        Ok(Session::new(
            envelope.data.token,
            SessionUser {
                id: user_id,
                email: envelope.data.user.email,
            },
        ))
    }

    /// Fetch and normalize the facility list.
    ///
    /// When a session is given it must be active; a 401 from the API
    /// invalidates it.
    pub async fn fetch_facilities(
        &self,
        session: Option<&mut Session>,
    ) -> Result<Fetched<Vec<FacilityRecord>>, ApiError> {
        let generation = self.begin_fetch();
        let token = bearer_token(session.as_deref())?;

        debug!("Fetching facilities (generation {})", generation);
        let result = self.get_body("hospitals", &[], token.as_deref()).await;
        let body = invalidate_on_unauthorized(result, session)?;

        let data = facilities_from_envelope(&body)?;
        info!("Fetched {} facilities", data.len());

        Ok(Fetched { generation, data })
    }

    /// Fetch one facility with its departments and staff.
    ///
    /// The three requests run concurrently; any failure fails the whole
    /// view.
    pub async fn fetch_facility_detail(
        &self,
        id: &str,
        session: Option<&mut Session>,
    ) -> Result<FacilityDetail, ApiError> {
        let id = id.trim();
        if id.is_empty() || id.contains(['/', '?', '#']) {
            return Err(ApiError::InvalidFacilityId(id.to_string()));
        }
        let token = bearer_token(session.as_deref())?;
        let token = token.as_deref();

        info!("Fetching detail for facility {}", id);
        let facility_path = format!("hospitals/{}", id);
        let departments_path = format!("hospitals/{}/departments", id);
        let staff_query = [("hospital_id", id)];
        let result = tokio::try_join!(
            self.get_body(&facility_path, &[], token),
            self.get_body(&departments_path, &[], token),
            self.get_body("staff", &staff_query, token),
        );
        let (facility, departments, staff) = invalidate_on_unauthorized(result, session)?;

        let detail = FacilityDetail {
            facility: facility_from_envelope(&facility)?,
            departments: departments_from_envelope(&departments)?,
            staff: staff_from_envelope(&staff)?,
        };
        debug!(
            "Facility {} has {} departments and {} staff",
            id,
            detail.departments.len(),
            detail.staff.len()
        );

        Ok(detail)
    }

    /// Send a GET and return the body of a 2xx response.
    async fn get_body(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<String, ApiError> {
        let mut request = self.http_client.get(self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            warn!("API rejected the session token ({})", path);
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Ok(body)
    }

    /// Whether no newer fetch has started since this result was requested.
    pub fn is_current<T>(&self, fetched: &Fetched<T>) -> bool {
        fetched.generation == self.generation.load(Ordering::SeqCst)
    }

    fn begin_fetch(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Token of the given session. An invalidated session cannot be used.
fn bearer_token(session: Option<&Session>) -> Result<Option<String>, ApiError> {
    session
        .map(|s| {
            s.bearer_token()
                .map(str::to_string)
                .ok_or(ApiError::SessionInactive)
        })
        .transpose()
}

fn invalidate_on_unauthorized<T>(
    result: Result<T, ApiError>,
    session: Option<&mut Session>,
) -> Result<T, ApiError> {
    if let (Err(ApiError::Unauthorized), Some(session)) = (&result, session) {
        session.invalidate_unauthorized();
    }
    result
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::InvalidCredentials(
            "email must be a valid address".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::InvalidCredentials(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = envelope_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("An error occurred")
            .to_string()
    });
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}
