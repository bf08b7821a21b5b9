use serde::Deserialize;

/// Request payload for `POST /api/auth/login`.
///
/// Fields are optional so that a missing field is reported as a validation
/// message instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request payload for `POST /api/agents`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub password: Option<String>,
}

/// Request payload for `PUT /api/agents/{id}`. Absent or empty fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub password: Option<String>,
}
