use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::web::flash::Flash;

/// Session entry holding the JWT issued by the backend API.
pub const TOKEN_KEY: &str = "comics_jwt_token";
/// Session entry holding the token expiry as an RFC 3339 string.
pub const EXPIRES_AT_KEY: &str = "comics_jwt_expires_at";

/// Server-side sessions idle longer than this are discarded. Matches the
/// browser cookie's max-age, so a session outliving its cookie is reclaimed.
const SESSION_IDLE_TTL_HOURS: i64 = 24;

/// Read/write access to the string entries of one session.
///
/// The token checker only needs `get` and `remove`; keeping the trait this
/// narrow lets tests drive it with a bare `SessionData`.
pub trait SessionAccess {
    fn get(&self, key: &str) -> Option<String>;
    fn remove(&mut self, key: &str);
}

/// Remaining lifetime of a valid token, decomposed for display.
///
/// `hours_left` is the largest whole number of hours, `minutes_left` the
/// whole minutes after subtracting those hours, `seconds_left` the whole
/// seconds after both. All components are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLeft {
    pub hours_left: i64,
    pub minutes_left: i64,
    pub seconds_left: i64,
}

/// Outcome of checking the stored credential against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No expiry entry in the session; the visitor never signed in (or was
    /// cleaned up already).
    Absent,
    /// The token outlived its expiry. Both credential entries have been
    /// removed from the session.
    Expired,
    Valid(TimeLeft),
}

/// Checks the session-stored token expiry against `now`.
///
/// Returns [`TokenStatus::Absent`] when no expiry is stored, and
/// [`TokenStatus::Expired`] when `now` is strictly past the expiry, removing
/// the token and expiry entries before returning. An expiry exactly equal to
/// `now` still counts as valid, with all components zero.
///
/// An unparseable expiry fails closed: the entries are cleared and the
/// status is `Absent`, so callers re-prompt for authentication instead of
/// granting a token of unknown lifetime.
pub fn check_token(session: &mut dyn SessionAccess, now: DateTime<Utc>) -> TokenStatus {
    let Some(raw) = session.get(EXPIRES_AT_KEY) else {
        return TokenStatus::Absent;
    };

    let expires_at = match DateTime::parse_from_rfc3339(&raw) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(err) => {
            warn!(%err, "stored token expiry is not a valid RFC 3339 timestamp");
            session.remove(TOKEN_KEY);
            session.remove(EXPIRES_AT_KEY);
            return TokenStatus::Absent;
        }
    };

    if now > expires_at {
        session.remove(TOKEN_KEY);
        session.remove(EXPIRES_AT_KEY);
        return TokenStatus::Expired;
    }

    let left = expires_at - now;
    TokenStatus::Valid(TimeLeft {
        hours_left: left.num_hours(),
        minutes_left: left.num_minutes() % 60,
        seconds_left: left.num_seconds() % 60,
    })
}

/// Entries and pending flash messages of one server-side session.
#[derive(Debug)]
pub struct SessionData {
    values: HashMap<String, String>,
    flashes: Vec<Flash>,
    last_seen: DateTime<Utc>,
}

impl Default for SessionData {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            flashes: Vec::new(),
            last_seen: Utc::now(),
        }
    }
}

impl SessionData {
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.last_seen > Duration::hours(SESSION_IDLE_TTL_HOURS)
    }

    #[cfg(test)]
    fn set_last_seen(&mut self, when: DateTime<Utc>) {
        self.last_seen = when;
    }

    pub fn push_flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    /// Drains the pending flashes; each message is shown at most once.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

impl SessionAccess for SessionData {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// In-memory store of server-side sessions, keyed by the cookie value.
///
/// The browser only ever holds the random session id; token and expiry stay
/// on this side. Handlers take the write guard for the duration of one
/// mutation, which gives the at-most-one-writer-per-request behavior the
/// token checker assumes.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionData>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh, empty session and returns its id. Doubles as the
    /// sweep point: sessions idle past the TTL are dropped here, so the map
    /// cannot grow without bound under cookie-less traffic.
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut sessions = self.inner.write().await;
        sessions.retain(|_, session| !session.is_stale(now));
        sessions.insert(id, SessionData::default());
        id
    }

    /// A session idle past the TTL counts as gone even before the next
    /// sweep physically removes it.
    pub async fn contains(&self, id: Uuid) -> bool {
        let now = Utc::now();
        self.inner
            .read()
            .await
            .get(&id)
            .is_some_and(|session| !session.is_stale(now))
    }

    pub async fn destroy(&self, id: Uuid) {
        self.inner.write().await.remove(&id);
    }

    /// Runs `f` against the session, holding the store's write guard, and
    /// refreshes its idle clock. Returns `None` when the id is unknown
    /// (stale or forged cookie).
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionData) -> R,
    ) -> Option<R> {
        let mut sessions = self.inner.write().await;
        sessions.get_mut(&id).map(|session| {
            session.last_seen = Utc::now();
            f(session)
        })
    }

    /// Evaluates the stored token for `id` at `now`.
    ///
    /// An unknown session id reports [`TokenStatus::Absent`]: no session
    /// means no credential.
    pub async fn check_token(&self, id: Uuid, now: DateTime<Utc>) -> TokenStatus {
        self.with_session(id, |session| check_token(session, now))
            .await
            .unwrap_or(TokenStatus::Absent)
    }

    pub async fn value(&self, id: Uuid, key: &str) -> Option<String> {
        let sessions = self.inner.read().await;
        sessions.get(&id).and_then(|session| session.get(key))
    }

    pub async fn push_flash(&self, id: Uuid, flash: Flash) {
        self.with_session(id, |session| session.push_flash(flash))
            .await;
    }

    pub async fn take_flashes(&self, id: Uuid) -> Vec<Flash> {
        self.with_session(id, |session| session.take_flashes())
            .await
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn session_with_expiry(expires_at: DateTime<Utc>) -> SessionData {
        let mut session = SessionData::default();
        session.insert(TOKEN_KEY, "jwt-under-test");
        session.insert(EXPIRES_AT_KEY, expires_at.to_rfc3339());
        session
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn missing_expiry_reports_absent_and_leaves_session_alone() {
        let mut session = SessionData::default();
        session.insert(TOKEN_KEY, "orphan-token");

        assert_eq!(check_token(&mut session, now()), TokenStatus::Absent);
        // An absent expiry must not clear anything else.
        assert_eq!(session.get(TOKEN_KEY).as_deref(), Some("orphan-token"));
    }

    #[test]
    fn empty_session_reports_absent() {
        let mut session = SessionData::default();
        assert_eq!(check_token(&mut session, now()), TokenStatus::Absent);
    }

    #[test]
    fn past_expiry_reports_expired_and_clears_credentials() {
        let mut session = session_with_expiry(now() - Duration::seconds(1));

        assert_eq!(check_token(&mut session, now()), TokenStatus::Expired);
        assert_eq!(session.get(TOKEN_KEY), None);
        assert_eq!(session.get(EXPIRES_AT_KEY), None);
    }

    #[test]
    fn expiry_equal_to_now_is_still_valid_with_zero_components() {
        let mut session = session_with_expiry(now());

        let status = check_token(&mut session, now());
        assert_eq!(
            status,
            TokenStatus::Valid(TimeLeft {
                hours_left: 0,
                minutes_left: 0,
                seconds_left: 0,
            })
        );
        assert!(session.get(TOKEN_KEY).is_some());
        assert!(session.get(EXPIRES_AT_KEY).is_some());
    }

    #[test]
    fn future_expiry_decomposes_into_hours_minutes_seconds() {
        let remaining = Duration::hours(2) + Duration::minutes(30) + Duration::seconds(15);
        let mut session = session_with_expiry(now() + remaining);

        let status = check_token(&mut session, now());
        assert_eq!(
            status,
            TokenStatus::Valid(TimeLeft {
                hours_left: 2,
                minutes_left: 30,
                seconds_left: 15,
            })
        );
    }

    #[test]
    fn components_reconstruct_the_full_difference() {
        let remaining = Duration::hours(49) + Duration::minutes(7) + Duration::seconds(3);
        let mut session = session_with_expiry(now() + remaining);

        // Sessions longer than a day keep accumulating hours instead of
        // rolling over into days.
        let TokenStatus::Valid(left) = check_token(&mut session, now()) else {
            panic!("expected a valid token");
        };
        let rebuilt =
            Duration::hours(left.hours_left)
                + Duration::minutes(left.minutes_left)
                + Duration::seconds(left.seconds_left);
        assert_eq!(rebuilt, remaining);
    }

    #[test]
    fn check_is_idempotent_for_a_fixed_clock() {
        let mut session = session_with_expiry(now() + Duration::minutes(5));

        let first = check_token(&mut session, now());
        let second = check_token(&mut session, now());
        assert_eq!(first, second);

        let mut expired = session_with_expiry(now() - Duration::minutes(5));
        assert_eq!(check_token(&mut expired, now()), TokenStatus::Expired);
        // The second pass sees the cleared session.
        assert_eq!(check_token(&mut expired, now()), TokenStatus::Absent);
    }

    #[test]
    fn malformed_expiry_fails_closed() {
        let mut session = SessionData::default();
        session.insert(TOKEN_KEY, "jwt-under-test");
        session.insert(EXPIRES_AT_KEY, "sometime next week");

        assert_eq!(check_token(&mut session, now()), TokenStatus::Absent);
        assert_eq!(session.get(TOKEN_KEY), None);
        assert_eq!(session.get(EXPIRES_AT_KEY), None);
    }

    #[test]
    fn accepts_expiry_with_an_offset_timezone() {
        let mut session = SessionData::default();
        session.insert(TOKEN_KEY, "jwt-under-test");
        // 11:30+02:00 is 09:30 UTC, exactly `now`.
        session.insert(EXPIRES_AT_KEY, "2025-03-14T11:30:00+02:00");

        assert!(matches!(
            check_token(&mut session, now()),
            TokenStatus::Valid(_)
        ));
    }

    #[tokio::test]
    async fn store_reports_absent_for_unknown_session_ids() {
        let store = SessionStore::new();
        let status = store.check_token(Uuid::new_v4(), now()).await;
        assert_eq!(status, TokenStatus::Absent);
    }

    #[tokio::test]
    async fn store_round_trips_values_and_flashes() {
        let store = SessionStore::new();
        let id = store.create().await;

        store
            .with_session(id, |session| session.insert(TOKEN_KEY, "jwt"))
            .await;
        assert_eq!(store.value(id, TOKEN_KEY).await.as_deref(), Some("jwt"));

        store.push_flash(id, Flash::success("saved")).await;
        let flashes = store.take_flashes(id).await;
        assert_eq!(flashes.len(), 1);
        assert!(store.take_flashes(id).await.is_empty());

        store.destroy(id).await;
        assert!(!store.contains(id).await);
    }

    #[tokio::test]
    async fn sessions_idle_past_the_ttl_are_swept() {
        let store = SessionStore::new();
        let stale = store.create().await;
        store
            .with_session(stale, |session| {
                session.insert(TOKEN_KEY, "forgotten-jwt");
                session.set_last_seen(Utc::now() - Duration::hours(25));
            })
            .await;

        // The idle session no longer resolves, even before a sweep runs.
        assert!(!store.contains(stale).await);

        // The next create() physically evicts it.
        let fresh = store.create().await;
        assert!(store.contains(fresh).await);
        assert!(store.with_session(stale, |_| ()).await.is_none());
        assert_eq!(store.value(stale, TOKEN_KEY).await, None);
    }

    #[tokio::test]
    async fn recently_touched_sessions_survive_the_sweep() {
        let store = SessionStore::new();
        let id = store.create().await;
        store
            .with_session(id, |session| {
                session.set_last_seen(Utc::now() - Duration::hours(23));
            })
            .await;

        let _churn = store.create().await;
        assert!(store.contains(id).await);
    }
}
