use std::fmt;

use serde::{Deserialize, Serialize};

use crate::row::Row;
use crate::temporal::Timestamp;

/// Audience stamped on every mock user.
pub const AUDIENCE: &str = "authenticated";

/// Lifetime advertised by every mock session, in seconds.
pub const SESSION_TTL_SECS: u64 = 3600;

/// Role of a signed-in user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Signed up or signed in with an email address.
    Authenticated,
    /// Guest session with no email of its own.
    Anonymous,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => write!(f, "authenticated"),
            Self::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// The identity behind a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub aud: String,
    pub role: Role,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_anonymous: bool,
}

impl User {
    /// An authenticated user with the given id and email.
    pub fn authenticated(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            aud: AUDIENCE.into(),
            role: Role::Authenticated,
            created_at: Timestamp::now().to_iso_string(),
            is_anonymous: false,
        }
    }

    /// A freshly minted authenticated user with a random id.
    pub fn register(email: impl Into<String>) -> Self {
        Self::authenticated(uuid::Uuid::new_v4().to_string(), email)
    }

    /// A guest user (`guest-<uuid>`, `guest@nest.app`).
    pub fn guest() -> Self {
        Self {
            id: format!("guest-{}", uuid::Uuid::new_v4()),
            email: "guest@nest.app".into(),
            aud: AUDIENCE.into(),
            role: Role::Anonymous,
            created_at: Timestamp::now().to_iso_string(),
            is_anonymous: true,
        }
    }

    /// Rebuild a user from a `profiles` row. Missing fields fall back to
    /// empty strings or a fresh timestamp.
    pub fn from_profile(profile: &Row) -> Self {
        let mut user = Self::authenticated(
            profile.id_str().unwrap_or_default(),
            profile.str_field("email").unwrap_or_default(),
        );
        if let Some(created_at) = profile.str_field(Row::CREATED_AT) {
            user.created_at = created_at.to_string();
        }
        user
    }

    /// The `profiles` row describing this user.
    pub fn to_profile(&self) -> Row {
        Row::new()
            .with(Row::ID, self.id.clone())
            .with("email", self.email.clone())
            .with(Row::CREATED_AT, self.created_at.clone())
    }
}

/// An active session: the user plus the (fake) tokens issued for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
    pub expires_in: u64,
    pub refresh_token: String,
}

impl Session {
    /// Issue a session for `user`.
    ///
    /// Anonymous users get `guest-` token prefixes, everyone else `mock-`.
    pub fn issue(user: User) -> Self {
        let prefix = if user.is_anonymous { "guest" } else { "mock" };
        Self {
            access_token: format!("{prefix}-token-{}", user.id),
            token_type: "bearer".into(),
            expires_in: SESSION_TTL_SECS,
            refresh_token: format!("{prefix}-refresh-{}", user.id),
            user,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// Kind of identity change delivered to auth subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignedIn => write!(f, "SIGNED_IN"),
            Self::SignedOut => write!(f, "SIGNED_OUT"),
        }
    }
}
