//! Wire types for the license API.
//!
//! The API speaks camelCase JSON with Mongo-style `_id` keys; everything
//! here mirrors that shape so handlers never touch raw `serde_json`
//! values except for free-form log details.

use chrono::{DateTime, Utc};
use keywarden_core::Role;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Signed-in operator as returned by `GET /user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub discord_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One issued license.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(rename = "_id")]
    pub id: String,
    pub token: String,
    pub script_name: String,
    pub user_discord: String,
    /// Display name cached by the backend, when it has one.
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_avatar: Option<String>,
    /// Absent on permanent licenses.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// `ip:port` binding, e.g. `203.0.113.9:30120`.
    #[serde(default)]
    pub ip_port: Option<String>,
    #[serde(default)]
    pub is_permanent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for `POST /api/licenses`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLicenseRequest {
    pub script_id: String,
    pub user_discord: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_permanent: Option<bool>,
}

/// Body for `PATCH /api/licenses/{token}/ip`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIpRequest {
    pub ip_port: String,
}

/// Body for the add-days and remove-days endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ModifyDaysRequest {
    pub days: i64,
}

/// Response of `DELETE /api/licenses/{token}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedLicense {
    pub message: String,
    pub license: License,
}

/// One script product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for script create and rename.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptNameRequest {
    pub name: String,
}

/// Response of `GET /api/scripts/{id}/licenses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptLicenses {
    pub script: Script,
    pub quantity: u64,
    pub licenses: Vec<License>,
}

/// Audit log verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogAction {
    Create,
    Update,
    Delete,
}

impl LogAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Who performed a logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogActor {
    Admin,
    Bot,
}

impl LogActor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Bot => "bot",
        }
    }
}

/// One audit log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseLog {
    #[serde(rename = "_id")]
    pub id: String,
    pub action: LogAction,
    pub actor_type: LogActor,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_username: Option<String>,
    #[serde(default)]
    pub actor_discord_id: Option<String>,
    #[serde(default)]
    pub license_id: Option<String>,
    #[serde(default)]
    pub license_token: Option<String>,
    #[serde(default)]
    pub script_name: Option<String>,
    #[serde(default)]
    pub user_discord: Option<String>,
    #[serde(default)]
    pub request_ip: Option<String>,
    /// Free-form change payload; `actionSource` inside it names the
    /// integration that triggered the change.
    #[serde(default)]
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Paging envelope on the logs endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Response of `GET /api/licenses/logs`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsPage {
    pub data: Vec<LicenseLog>,
    pub pagination: Pagination,
}

/// Aggregate numbers for the overview page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub totals: SummaryTotals,
    #[serde(default)]
    pub latest_license: Option<License>,
    #[serde(default)]
    pub top_script: Option<TopScript>,
    #[serde(default)]
    pub top_user: Option<TopUser>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    pub customers: u64,
    pub active_licenses: u64,
    pub scripts: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopScript {
    pub script_name: String,
    pub license_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUser {
    pub user_discord: String,
    pub license_count: u64,
}

/// Outcome of the auth-apply transform endpoint.
#[derive(Debug, Clone)]
pub struct TransformedFile {
    /// Download name suggested by the backend, when it sent one.
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_license_deserializes_wire_shape() {
        let raw = serde_json::json!({
            "_id": "665f1c2e8b3a5d0012ab34cd",
            "token": "KW-9f8e7d6c5b4a",
            "scriptName": "drift-counter",
            "userDiscord": "111222333444555666",
            "userName": "opal",
            "expiresAt": "2030-01-10T00:00:00.000Z",
            "ipPort": "203.0.113.9:30120",
            "isPermanent": false,
            "createdAt": "2026-01-01T12:00:00.000Z",
            "updatedAt": "2026-01-02T12:00:00.000Z"
        });
        let license: License = serde_json::from_value(raw).unwrap();
        assert_eq!(license.id, "665f1c2e8b3a5d0012ab34cd");
        assert_eq!(license.script_name, "drift-counter");
        assert_eq!(license.user_name.as_deref(), Some("opal"));
        assert!(!license.is_permanent);
        assert_eq!(license.ip_port.as_deref(), Some("203.0.113.9:30120"));
        assert_eq!(
            license.expires_at.unwrap().date_naive().to_string(),
            "2030-01-10"
        );
    }

    #[test]
    fn test_license_tolerates_missing_optionals() {
        let raw = serde_json::json!({
            "_id": "665f1c2e8b3a5d0012ab34ce",
            "token": "KW-permanent",
            "scriptName": "hud-pack",
            "userDiscord": "999888777666555444",
            "isPermanent": true,
            "createdAt": "2026-01-01T12:00:00.000Z",
            "updatedAt": "2026-01-01T12:00:00.000Z"
        });
        let license: License = serde_json::from_value(raw).unwrap();
        assert!(license.is_permanent);
        assert!(license.expires_at.is_none());
        assert!(license.ip_port.is_none());
        assert!(license.user_name.is_none());
    }

    #[test]
    fn test_create_request_omits_unset_fields() {
        let request = CreateLicenseRequest {
            script_id: "s1".to_string(),
            user_discord: "42".to_string(),
            ip: None,
            port: None,
            expires_in_days: None,
            is_permanent: Some(true),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"scriptId": "s1", "userDiscord": "42", "isPermanent": true})
        );
    }

    #[test]
    fn test_log_action_wire_casing() {
        let action: LogAction = serde_json::from_value(serde_json::json!("CREATE")).unwrap();
        assert_eq!(action, LogAction::Create);
        assert_eq!(action.as_str(), "CREATE");
        let actor: LogActor = serde_json::from_value(serde_json::json!("bot")).unwrap();
        assert_eq!(actor, LogActor::Bot);
    }

    #[test]
    fn test_user_defaults_role_when_absent() {
        let raw = serde_json::json!({
            "_id": "u1",
            "discordId": "111222333444555666",
            "username": "opal",
            "createdAt": "2026-01-01T12:00:00.000Z",
            "updatedAt": "2026-01-01T12:00:00.000Z"
        });
        let user: User = serde_json::from_value(raw).unwrap();
        assert!(!user.role.is_admin());
        assert!(user.access_token.is_empty());
    }
}
