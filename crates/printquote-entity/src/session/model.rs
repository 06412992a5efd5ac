//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row per live refresh token.
///
/// Sessions are created on login, registration, and refresh; replaced
/// (not updated) on rotation; and deleted on logout, revocation, or the
/// expiry sweep. The refresh-token value is the sole lookup key for
/// rotation and revocation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// The raw refresh-token value (unique).
    pub refresh_token: String,
    /// Client-supplied device fingerprint. Descriptive only.
    pub fingerprint: Option<String>,
    /// User-Agent header value. Descriptive only.
    pub user_agent: Option<String>,
    /// Originating IP address. Descriptive only.
    pub ip_address: Option<String>,
    /// When the refresh token expires.
    pub expires_at: DateTime<Utc>,
    /// When the session was created (login time).
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check whether the session has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Best-effort browser family extracted from the user-agent string.
    pub fn browser_family(&self) -> &'static str {
        browser_family(self.user_agent.as_deref())
    }
}

/// Device metadata captured from request headers at the boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Client-supplied device fingerprint.
    pub fingerprint: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// Originating IP address.
    pub ip_address: Option<String>,
}

/// Data required to persist a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// The raw refresh-token value.
    pub refresh_token: String,
    /// Device fingerprint.
    pub fingerprint: Option<String>,
    /// User-Agent header.
    pub user_agent: Option<String>,
    /// Originating IP address.
    pub ip_address: Option<String>,
    /// When the refresh token expires.
    pub expires_at: DateTime<Utc>,
}

impl CreateSession {
    /// Builds a session row from a freshly issued refresh token and the
    /// request metadata.
    pub fn new(
        user_id: Uuid,
        refresh_token: impl Into<String>,
        metadata: SessionMetadata,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            refresh_token: refresh_token.into(),
            fingerprint: metadata.fingerprint,
            user_agent: metadata.user_agent,
            ip_address: metadata.ip_address,
            expires_at,
        }
    }
}

/// A live session joined with the identity of its owner.
///
/// Returned by the valid-token lookup so that rotation can rebuild the
/// claims payload without a second credential-store round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// The matched session row.
    pub session: Session,
    /// The owning user's claims-shaped identity.
    pub user: crate::user::UserProfile,
}

/// Display view of a session for "manage devices" listings.
///
/// Token values are deliberately omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    /// Session identifier.
    pub id: Uuid,
    /// Device fingerprint, or a placeholder when absent.
    pub device: String,
    /// Browser family parsed from the user-agent.
    pub browser: String,
    /// Originating IP address.
    pub ip_address: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the refresh token expires.
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            device: session
                .fingerprint
                .clone()
                .unwrap_or_else(|| "Unknown device".to_string()),
            browser: session.browser_family().to_string(),
            ip_address: session.ip_address.clone(),
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

/// Maps a user-agent string to a coarse browser family.
///
/// Edge and Chrome both advertise "Chrome", so Edge is checked first.
fn browser_family(user_agent: Option<&str>) -> &'static str {
    let Some(ua) = user_agent else {
        return "Unknown";
    };
    if ua.contains("Edg") {
        "Edge"
    } else if ua.contains("Chrome") {
        "Chrome"
    } else if ua.contains("Firefox") {
        "Firefox"
    } else if ua.contains("Safari") {
        "Safari"
    } else {
        "Other"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_with_ua(ua: Option<&str>) -> Session {
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            refresh_token: "token".to_string(),
            fingerprint: None,
            user_agent: ua.map(String::from),
            ip_address: None,
            expires_at: Utc::now() + Duration::days(7),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_browser_family_parsing() {
        let chrome = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                      (KHTML, like Gecko) Chrome/121.0 Safari/537.36";
        let edge = "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 \
                    (KHTML, like Gecko) Chrome/121.0 Safari/537.36 Edg/121.0";
        let firefox = "Mozilla/5.0 (X11; Linux x86_64; rv:122.0) Gecko/20100101 Firefox/122.0";

        assert_eq!(session_with_ua(Some(chrome)).browser_family(), "Chrome");
        assert_eq!(session_with_ua(Some(edge)).browser_family(), "Edge");
        assert_eq!(session_with_ua(Some(firefox)).browser_family(), "Firefox");
        assert_eq!(session_with_ua(None).browser_family(), "Unknown");
        assert_eq!(session_with_ua(Some("curl/8.5")).browser_family(), "Other");
    }

    #[test]
    fn test_view_omits_token() {
        let session = session_with_ua(None);
        let view = SessionView::from(&session);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains(&session.refresh_token));
        assert_eq!(view.device, "Unknown device");
    }

    #[test]
    fn test_expiry_check() {
        let mut session = session_with_ua(None);
        assert!(!session.is_expired());
        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }
}
