use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use nest_store::{KeyValueStore, TableStore};
use nest_types::{tables, AuthEvent, Row, Session, User};
use tracing::{debug, info, warn};

use crate::error::{AuthError, AuthResult};
use crate::subscription::{AuthCallback, Listeners, Subscription};

/// Key the session snapshot is stored under.
pub const SESSION_KEY: &str = "nest_mock_session";

/// Simulated delays for auth calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthLatency {
    /// Sign-up, sign-in and account maintenance calls.
    pub auth: Duration,
    pub sign_out: Duration,
}

/// Holds the active identity and tells subscribers when it changes.
///
/// Every change is mirrored to a [`KeyValueStore`] snapshot, so an emulator
/// built over the same store picks the session back up.
pub struct AuthEmulator {
    tables: Arc<TableStore>,
    snapshots: Arc<dyn KeyValueStore>,
    latency: AuthLatency,
    session: RwLock<Option<Session>>,
    listeners: Listeners,
}

impl AuthEmulator {
    /// Build an emulator, rehydrating any stored session.
    ///
    /// A snapshot that no longer decodes is discarded with a warning.
    pub fn new(
        tables: Arc<TableStore>,
        snapshots: Arc<dyn KeyValueStore>,
        latency: AuthLatency,
    ) -> AuthResult<Self> {
        let session = match snapshots.get(SESSION_KEY)? {
            Some(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => {
                    debug!(user = %session.user_id(), "session rehydrated");
                    Some(session)
                }
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable session snapshot");
                    None
                }
            },
            None => None,
        };
        Ok(Self {
            tables,
            snapshots,
            latency,
            session: RwLock::new(session),
            listeners: Listeners::default(),
        })
    }

    /// The active session, if any.
    pub fn current_session(&self) -> AuthResult<Option<Session>> {
        Ok(self
            .session
            .read()
            .map_err(|e| AuthError::LockPoisoned(e.to_string()))?
            .clone())
    }

    /// The active identity, if any.
    pub fn current_user(&self) -> AuthResult<Option<User>> {
        Ok(self.current_session()?.map(|s| s.user))
    }

    /// Replace the active session, persist it and notify subscribers.
    pub fn set_session(&self, session: Option<Session>) -> AuthResult<()> {
        match &session {
            Some(s) => self.snapshots.set(SESSION_KEY, &serde_json::to_string(s)?)?,
            None => {
                self.snapshots.remove(SESSION_KEY)?;
            }
        }
        *self
            .session
            .write()
            .map_err(|e| AuthError::LockPoisoned(e.to_string()))? = session.clone();

        let event = if session.is_some() {
            AuthEvent::SignedIn
        } else {
            AuthEvent::SignedOut
        };
        self.listeners.notify(event, session.as_ref())
    }

    /// Register `callback` for future identity changes.
    pub fn subscribe<F>(&self, callback: F) -> AuthResult<Subscription>
    where
        F: Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(callback))
    }

    /// Like [`subscribe`](AuthEmulator::subscribe), but the callback also
    /// runs once right away with the current state.
    pub fn on_auth_state_change<F>(&self, callback: F) -> AuthResult<Subscription>
    where
        F: Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let callback: AuthCallback = Arc::new(callback);
        let subscription = self.listeners.add(Arc::clone(&callback))?;
        match self.current_session()? {
            Some(session) => callback(AuthEvent::SignedIn, Some(&session)),
            None => callback(AuthEvent::SignedOut, None),
        }
        Ok(subscription)
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn get_session(&self) -> AuthResult<Option<Session>> {
        self.current_session()
    }

    pub fn get_user(&self) -> AuthResult<Option<User>> {
        self.current_user()
    }

    /// Create a fresh account and sign it in. The password is not checked.
    pub async fn sign_up(&self, email: &str, _password: &str) -> AuthResult<Session> {
        self.pause(self.latency.auth).await;
        let session = Session::issue(User::register(email));
        info!(user = %session.user_id(), email, "signed up");
        self.set_session(Some(session.clone()))?;
        Ok(session)
    }

    /// Sign in as the profile with `email`, creating it on first use. Any
    /// password is accepted.
    pub async fn sign_in_with_password(&self, email: &str, _password: &str) -> AuthResult<Session> {
        self.pause(self.latency.auth).await;
        let user = self.tables.write_table(tables::PROFILES, |profiles| {
            match profiles.iter().find(|p| p.str_field("email") == Some(email)) {
                Some(profile) => User::from_profile(profile),
                None => {
                    let user = User::register(email);
                    profiles.push(user.to_profile());
                    debug!(user = %user.id, "profile created");
                    user
                }
            }
        })?;
        let session = Session::issue(user);
        info!(user = %session.user_id(), email, "signed in");
        self.set_session(Some(session.clone()))?;
        Ok(session)
    }

    /// Sign in as a fresh guest.
    pub async fn sign_in_anonymously(&self) -> AuthResult<Session> {
        self.pause(self.latency.auth).await;
        let session = Session::issue(User::guest());
        info!(user = %session.user_id(), "signed in anonymously");
        self.set_session(Some(session.clone()))?;
        Ok(session)
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        self.pause(self.latency.sign_out).await;
        info!("signed out");
        self.set_session(None)
    }

    /// Acknowledge a reset request. Nothing is sent.
    pub async fn reset_password_for_email(&self, email: &str) -> AuthResult<()> {
        self.pause(self.latency.auth).await;
        info!(email, "password reset requested");
        Ok(())
    }

    /// Acknowledge an account update. The active identity is unchanged.
    pub async fn update_user(&self, attributes: &Row) -> AuthResult<Option<User>> {
        self.pause(self.latency.auth).await;
        debug!(fields = attributes.len(), "user update acknowledged");
        self.current_user()
    }

    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl fmt::Debug for AuthEmulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEmulator")
            .field("latency", &self.latency)
            .field("session", &self.session)
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nest_store::{FileKeyValueStore, InMemoryKeyValueStore};
    use nest_types::{row, Role};
    use std::sync::Mutex;

    fn emulator() -> (AuthEmulator, Arc<TableStore>, Arc<InMemoryKeyValueStore>) {
        let store = Arc::new(TableStore::new());
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let auth = AuthEmulator::new(Arc::clone(&store), kv.clone(), AuthLatency::default()).unwrap();
        (auth, store, kv)
    }

    fn record(auth: &AuthEmulator) -> Arc<Mutex<Vec<(AuthEvent, Option<String>)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        auth.subscribe(move |event, session| {
            sink.lock()
                .unwrap()
                .push((event, session.map(|s| s.user_id().to_string())));
        })
        .unwrap();
        seen
    }

    #[test]
    fn set_session_notifies_and_persists() {
        let (auth, _, kv) = emulator();
        let seen = record(&auth);
        let session = Session::issue(User::authenticated("u1", "a@nest.app"));

        auth.set_session(Some(session.clone())).unwrap();
        assert_eq!(auth.current_session().unwrap(), Some(session));
        assert!(kv.get(SESSION_KEY).unwrap().is_some());

        auth.set_session(None).unwrap();
        assert!(auth.current_user().unwrap().is_none());
        assert!(kv.get(SESSION_KEY).unwrap().is_none());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (AuthEvent::SignedIn, Some("u1".to_string())),
                (AuthEvent::SignedOut, None),
            ]
        );
    }

    #[test]
    fn on_auth_state_change_fires_immediately() {
        let (auth, _, _) = emulator();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = auth
            .on_auth_state_change(move |event, _| sink.lock().unwrap().push(event))
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![AuthEvent::SignedOut]);

        auth.set_session(Some(Session::issue(User::guest()))).unwrap();
        assert!(sub.unsubscribe());
        auth.set_session(None).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![AuthEvent::SignedOut, AuthEvent::SignedIn]
        );
        assert_eq!(auth.subscriber_count(), 0);
    }

    #[test]
    fn rehydrates_from_snapshot() {
        let store = Arc::new(TableStore::new());
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let first = AuthEmulator::new(Arc::clone(&store), Arc::clone(&kv), AuthLatency::default()).unwrap();
        first
            .set_session(Some(Session::issue(User::authenticated("u7", "x@nest.app"))))
            .unwrap();

        let second = AuthEmulator::new(store, kv, AuthLatency::default()).unwrap();
        assert_eq!(second.get_user().unwrap().map(|u| u.id), Some("u7".to_string()));
    }

    #[test]
    fn corrupt_snapshot_is_ignored() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        kv.set(SESSION_KEY, "{not json").unwrap();
        let auth = AuthEmulator::new(Arc::new(TableStore::new()), kv, AuthLatency::default()).unwrap();
        assert!(auth.get_session().unwrap().is_none());
    }

    #[test]
    fn file_snapshot_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let open = || {
            let kv: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(dir.path()));
            AuthEmulator::new(Arc::new(TableStore::new()), kv, AuthLatency::default()).unwrap()
        };
        open()
            .set_session(Some(Session::issue(User::authenticated("u1", "a@nest.app"))))
            .unwrap();
        assert_eq!(
            open().current_user().unwrap().map(|u| u.email),
            Some("a@nest.app".to_string())
        );
    }

    #[tokio::test]
    async fn sign_up_issues_mock_tokens() {
        let (auth, store, _) = emulator();
        let session = auth.sign_up("new@nest.app", "pw").await.unwrap();
        assert_eq!(session.access_token, format!("mock-token-{}", session.user.id));
        assert_eq!(session.refresh_token, format!("mock-refresh-{}", session.user.id));
        assert_eq!(session.token_type, "bearer");
        assert_eq!(session.expires_in, 3600);
        assert_eq!(session.user.role, Role::Authenticated);
        assert_eq!(session.user.aud, "authenticated");
        assert!(!store.has_table(tables::PROFILES).unwrap());
    }

    #[tokio::test]
    async fn password_sign_in_reuses_or_creates_profile() {
        let (auth, store, _) = emulator();
        store
            .write_table(tables::PROFILES, |p| {
                p.push(row! { "id": "user-123-mock", "email": "demo@nest.app" })
            })
            .unwrap();

        let demo = auth.sign_in_with_password("demo@nest.app", "anything").await.unwrap();
        assert_eq!(demo.user_id(), "user-123-mock");

        let fresh = auth.sign_in_with_password("new@nest.app", "x").await.unwrap();
        let again = auth.sign_in_with_password("new@nest.app", "y").await.unwrap();
        assert_eq!(fresh.user_id(), again.user_id());
        assert_eq!(store.row_count(tables::PROFILES).unwrap(), 2);
    }

    #[tokio::test]
    async fn anonymous_sign_in_and_sign_out() {
        let (auth, _, _) = emulator();
        let seen = record(&auth);
        let session = auth.sign_in_anonymously().await.unwrap();
        assert!(session.user.id.starts_with("guest-"));
        assert!(session.access_token.starts_with("guest-token-"));
        assert!(session.user.is_anonymous);

        auth.sign_out().await.unwrap();
        assert!(auth.get_session().unwrap().is_none());
        let events: Vec<AuthEvent> = seen.lock().unwrap().iter().map(|(e, _)| *e).collect();
        assert_eq!(events, vec![AuthEvent::SignedIn, AuthEvent::SignedOut]);
    }

    #[tokio::test]
    async fn maintenance_calls_leave_identity_alone() {
        let (auth, _, _) = emulator();
        let session = auth.sign_up("a@nest.app", "pw").await.unwrap();
        auth.reset_password_for_email("a@nest.app").await.unwrap();
        let user = auth.update_user(&row! { "email": "b@nest.app" }).await.unwrap();
        assert_eq!(user, Some(session.user));
    }
}
