//! Session state machine.
//!
//! Two states: `Anonymous` (initial) and `Authenticated`. The session changes
//! only through `restore`, `login`, `logout` and `on_unauthorized`, and each
//! of them replaces the whole state at once, so an authenticated session
//! without an identity can never be observed.
//!
//! The manager performs no credential verification: `login` is called after
//! the backend has accepted the credentials.

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

use super::routes::{self, Route, RouteDecision, LOGIN_ENTRY};
use super::store::{CredentialStore, IDENTITY_KEY, TOKEN_KEY};
use crate::types::{Credential, Identity};
use crate::BmsResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        credential: Credential,
        identity: Identity,
    },
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated { identity, .. } => Some(identity),
            Session::Anonymous => None,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Session::Authenticated { credential, .. } => Some(credential),
            Session::Anonymous => None,
        }
    }
}

/// Notifications for the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { customer_id: String },
    SignedOut,
    /// The backend rejected the credential; navigation must go to `redirect`.
    Expired { redirect: Route },
}

/// Owns the session and its persisted credential.
pub struct SessionManager<S: CredentialStore> {
    store: S,
    session: Session,
    observers: Vec<UnboundedSender<SessionEvent>>,
}

impl<S: CredentialStore> SessionManager<S> {
    /// A manager in the `Anonymous` state. Call [`restore`](Self::restore) to
    /// pick up a previously persisted session.
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: Session::Anonymous,
            observers: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.session.credential()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Receive every subsequent [`SessionEvent`]. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> UnboundedReceiver<SessionEvent> {
        let (tx, rx) = unbounded();
        self.observers.push(tx);
        rx
    }

    /// Load a persisted `(credential, identity)` pair.
    ///
    /// Returns `true` when the session is now authenticated. Missing, partial
    /// or unparsable data leaves the session as it was; partial or unparsable
    /// data is also cleared from the store.
    pub fn restore(&mut self) -> bool {
        match self.load_persisted() {
            Persisted::Pair(credential, identity) => {
                tracing::info!(customer_id = %identity.customer_id, "session restored");
                let customer_id = identity.customer_id.clone();
                self.session = Session::Authenticated { credential, identity };
                self.emit(SessionEvent::SignedIn { customer_id });
                true
            }
            Persisted::Nothing => false,
            Persisted::Malformed => {
                tracing::warn!("discarding malformed persisted session");
                if let Err(e) = self.clear_persisted() {
                    tracing::warn!(error = %e, "failed to clear malformed session data");
                }
                false
            }
        }
    }

    /// Enter the authenticated state, replacing any previous session, and
    /// persist the pair for future [`restore`](Self::restore) calls.
    ///
    /// The in-memory session is authenticated even when persisting fails; the
    /// error only means a restart will not find it.
    pub fn login(&mut self, credential: Credential, identity: Identity) -> BmsResult<()> {
        let persisted = self.persist(&credential, &identity);
        if let Err(ref e) = persisted {
            tracing::warn!(error = %e, "session not persisted");
        }

        tracing::info!(customer_id = %identity.customer_id, "signed in");
        let customer_id = identity.customer_id.clone();
        self.session = Session::Authenticated { credential, identity };
        self.emit(SessionEvent::SignedIn { customer_id });
        persisted
    }

    /// Leave the authenticated state and clear persisted data.
    /// A no-op while anonymous.
    pub fn logout(&mut self) -> BmsResult<()> {
        if !self.session.is_authenticated() {
            return Ok(());
        }
        self.session = Session::Anonymous;
        tracing::info!("signed out");
        self.emit(SessionEvent::SignedOut);
        self.clear_persisted()
    }

    /// The backend rejected the current credential. Clears the session
    /// whatever its state and returns the route the view must go to.
    pub fn on_unauthorized(&mut self) -> Route {
        let was_authenticated = self.session.is_authenticated();
        self.session = Session::Anonymous;
        if let Err(e) = self.clear_persisted() {
            tracing::warn!(error = %e, "failed to clear expired session data");
        }
        tracing::warn!(was_authenticated, "credential rejected by backend");
        self.emit(SessionEvent::Expired { redirect: LOGIN_ENTRY });
        LOGIN_ENTRY
    }

    /// Render or redirect, from current state only.
    pub fn resolve(&self, route: Route) -> RouteDecision {
        routes::resolve(route, self.is_authenticated())
    }

    pub fn is_reachable(&self, route: Route) -> bool {
        routes::is_reachable(route, self.is_authenticated())
    }

    fn emit(&mut self, event: SessionEvent) {
        self.observers.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    fn load_persisted(&self) -> Persisted {
        let token = self.store.get(TOKEN_KEY);
        let user = self.store.get(IDENTITY_KEY);
        let (token, user) = match (token, user) {
            (Ok(token), Ok(user)) => (token, user),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "credential store unreadable");
                return Persisted::Nothing;
            }
        };

        match (token, user) {
            (None, None) => Persisted::Nothing,
            (Some(token), Some(user)) => {
                let credential = Credential::new(token);
                match serde_json::from_str::<Identity>(&user) {
                    Ok(identity) if !credential.is_empty() && !identity.customer_id.is_empty() => {
                        Persisted::Pair(credential, identity)
                    }
                    _ => Persisted::Malformed,
                }
            }
            _ => Persisted::Malformed,
        }
    }

    /// Write both keys, or neither: a failed write also drops whatever an
    /// earlier session left behind.
    fn persist(&mut self, credential: &Credential, identity: &Identity) -> BmsResult<()> {
        let written = self.write_pair(credential, identity);
        if written.is_err() {
            if let Err(e) = self.clear_persisted() {
                tracing::warn!(error = %e, "failed to clear partially written session data");
            }
        }
        written
    }

    fn write_pair(&mut self, credential: &Credential, identity: &Identity) -> BmsResult<()> {
        let user = serde_json::to_string(identity)?;
        self.store.set(IDENTITY_KEY, &user)?;
        self.store.set(TOKEN_KEY, credential.as_str())
    }

    fn clear_persisted(&mut self) -> BmsResult<()> {
        let token = self.store.clear(TOKEN_KEY);
        let user = self.store.clear(IDENTITY_KEY);
        token.and(user)
    }
}

enum Persisted {
    Nothing,
    Pair(Credential, Identity),
    Malformed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BmsError;
    use crate::session::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn identity() -> Identity {
        Identity {
            customer_id: "1".into(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john@example.com".into(),
            phone_number: "5550100".into(),
            address: "1 Main St".into(),
            created_date: None,
        }
    }

    fn signed_in() -> SessionManager<MemoryStore> {
        let mut manager = SessionManager::new(MemoryStore::new());
        manager.login(Credential::new("tok-1"), identity()).unwrap();
        manager
    }

    /// Accepts reads, fails every write.
    struct ReadOnlyStore;

    impl CredentialStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> BmsResult<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> BmsResult<()> {
            Err(BmsError::Storage("read-only".into()))
        }

        fn clear(&mut self, _key: &str) -> BmsResult<()> {
            Err(BmsError::Storage("read-only".into()))
        }
    }

    /// Rejects writing `key` when the value contains `marker`.
    struct RefusesKey {
        inner: MemoryStore,
        key: &'static str,
        marker: &'static str,
    }

    impl RefusesKey {
        fn new(key: &'static str, marker: &'static str) -> Self {
            Self { inner: MemoryStore::new(), key, marker }
        }
    }

    impl CredentialStore for RefusesKey {
        fn get(&self, key: &str) -> BmsResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> BmsResult<()> {
            if key == self.key && value.contains(self.marker) {
                return Err(BmsError::Storage(format!("cannot write {key}")));
            }
            self.inner.set(key, value)
        }

        fn clear(&mut self, key: &str) -> BmsResult<()> {
            self.inner.clear(key)
        }
    }

    #[test]
    fn test_starts_anonymous() {
        let manager = SessionManager::new(MemoryStore::new());
        assert_eq!(manager.session(), &Session::Anonymous);
        assert_eq!(manager.identity(), None);
        assert_eq!(manager.credential(), None);
    }

    #[test]
    fn test_restore_without_data_stays_anonymous() {
        let mut manager = SessionManager::new(MemoryStore::new());
        assert!(!manager.restore());
        assert!(!manager.is_authenticated());
    }

    #[test]
    fn test_login_then_restore_in_fresh_manager() {
        let store = signed_in().into_store();
        let mut fresh = SessionManager::new(store);
        assert!(fresh.restore());
        assert_eq!(fresh.identity(), Some(&identity()));
        assert_eq!(fresh.credential().map(|c| c.as_str()), Some("tok-1"));
    }

    #[test]
    fn test_login_overwrites_previous_session() {
        let mut manager = signed_in();
        let mut other = identity();
        other.customer_id = "2".into();
        manager.login(Credential::new("tok-2"), other.clone()).unwrap();
        assert_eq!(manager.identity(), Some(&other));

        let mut fresh = SessionManager::new(manager.into_store());
        fresh.restore();
        assert_eq!(fresh.identity().map(|i| i.customer_id.as_str()), Some("2"));
    }

    #[test]
    fn test_malformed_identity_is_treated_as_absent_and_cleared() {
        let store = MemoryStore::new()
            .with_entry(TOKEN_KEY, "tok-1")
            .with_entry(IDENTITY_KEY, "{not json");
        let mut manager = SessionManager::new(store);
        assert!(!manager.restore());
        assert!(!manager.is_authenticated());
        assert!(manager.store().is_empty());
    }

    #[test]
    fn test_half_persisted_pair_is_absent() {
        let store = MemoryStore::new().with_entry(TOKEN_KEY, "tok-1");
        let mut manager = SessionManager::new(store);
        assert!(!manager.restore());
        assert!(manager.store().is_empty());
    }

    #[test]
    fn test_empty_token_is_absent() {
        let user = serde_json::to_string(&identity()).unwrap();
        let store = MemoryStore::new()
            .with_entry(TOKEN_KEY, "  ")
            .with_entry(IDENTITY_KEY, &user);
        let mut manager = SessionManager::new(store);
        assert!(!manager.restore());
    }

    #[test]
    fn test_logout_clears_state_and_store() {
        let mut manager = signed_in();
        manager.logout().unwrap();
        assert!(!manager.is_authenticated());
        assert!(manager.store().is_empty());
    }

    #[test]
    fn test_logout_when_anonymous_is_noop() {
        let mut manager = SessionManager::new(MemoryStore::new());
        let mut events = manager.subscribe();
        manager.logout().unwrap();
        manager.logout().unwrap();
        assert!(!manager.is_authenticated());
        assert!(events.try_next().is_err());
    }

    #[test]
    fn test_on_unauthorized_from_authenticated() {
        let mut manager = signed_in();
        assert_eq!(manager.on_unauthorized(), Route::Login);
        assert!(!manager.is_authenticated());
        assert!(manager.store().is_empty());
    }

    #[test]
    fn test_on_unauthorized_from_anonymous() {
        let mut manager = SessionManager::new(MemoryStore::new());
        assert_eq!(manager.on_unauthorized(), Route::Login);
        assert_eq!(manager.session(), &Session::Anonymous);
    }

    #[test]
    fn test_events_are_delivered_in_order() {
        let mut manager = SessionManager::new(MemoryStore::new());
        let mut events = manager.subscribe();
        manager.login(Credential::new("tok-1"), identity()).unwrap();
        manager.logout().unwrap();
        manager.on_unauthorized();

        assert_eq!(
            events.try_next().unwrap(),
            Some(SessionEvent::SignedIn { customer_id: "1".into() })
        );
        assert_eq!(events.try_next().unwrap(), Some(SessionEvent::SignedOut));
        assert_eq!(
            events.try_next().unwrap(),
            Some(SessionEvent::Expired { redirect: Route::Login })
        );
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut manager = SessionManager::new(MemoryStore::new());
        drop(manager.subscribe());
        manager.login(Credential::new("tok-1"), identity()).unwrap();
        assert!(manager.observers.is_empty());
    }

    #[test]
    fn test_login_still_authenticates_when_store_fails() {
        let mut manager = SessionManager::new(ReadOnlyStore);
        assert!(manager.login(Credential::new("tok-1"), identity()).is_err());
        assert!(manager.is_authenticated());
        assert!(manager.logout().is_err());
        assert!(!manager.is_authenticated());
    }

    #[test]
    fn test_failed_relogin_leaves_no_stale_token() {
        let mut manager = SessionManager::new(RefusesKey::new(TOKEN_KEY, "tok-2"));
        manager.login(Credential::new("tok-1"), identity()).unwrap();

        let second = Identity { customer_id: "2".into(), ..identity() };
        assert!(manager.login(Credential::new("tok-2"), second).is_err());
        assert_eq!(manager.identity().map(|i| i.customer_id.as_str()), Some("2"));

        let store = manager.into_store();
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(IDENTITY_KEY).unwrap(), None);
    }

    #[test]
    fn test_failed_identity_write_drops_previous_pair() {
        let mut manager = SessionManager::new(RefusesKey::new(IDENTITY_KEY, r#""customerId":"2""#));
        manager.login(Credential::new("tok-1"), identity()).unwrap();

        let second = Identity { customer_id: "2".into(), ..identity() };
        assert!(manager.login(Credential::new("tok-2"), second).is_err());
        assert!(manager.is_authenticated());
        assert!(manager.into_store().inner.is_empty());
    }

    #[test]
    fn test_route_reachability_follows_state() {
        let mut manager = SessionManager::new(MemoryStore::new());
        assert!(!manager.is_reachable(Route::Dashboard));
        assert!(manager.is_reachable(Route::Login));
        manager.login(Credential::new("tok-1"), identity()).unwrap();
        assert!(manager.is_reachable(Route::Dashboard));
        assert!(!manager.is_reachable(Route::Login));
        assert_eq!(
            manager.resolve(Route::Register),
            RouteDecision::Redirect(Route::Dashboard)
        );
    }

    #[test]
    fn test_manager_over_borrowed_store() {
        let mut store = MemoryStore::new();
        {
            let mut manager = SessionManager::new(&mut store);
            manager.login(Credential::new("tok-1"), identity()).unwrap();
        }
        assert!(!store.is_empty());
    }
}
