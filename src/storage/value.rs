//! Typed values with optional expiry.
//!
//! A [`Value`] is a tagged payload ([`Payload`]) plus an optional absolute
//! expiration instant. Whether a value is expired is computed from the
//! instant and the caller-supplied "now"; nothing about it is cached.

use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

/// The kind of data a [`Value`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    List,
    Hash,
    Set,
}

impl ValueKind {
    /// Returns the name used by the `TYPE` command.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Hash => "hash",
            ValueKind::Set => "set",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload of a value.
///
/// The storage engine treats every variant as opaque; the encodings are
/// owned by the command layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Binary-safe scalar string
    String(Bytes),
    /// Deque for O(1) push/pop on both ends
    List(VecDeque<Bytes>),
    /// Field -> value map
    Hash(HashMap<Bytes, Bytes>),
    /// Unordered member set
    Set(HashSet<Bytes>),
}

impl Payload {
    pub fn kind(&self) -> ValueKind {
        match self {
            Payload::String(_) => ValueKind::String,
            Payload::List(_) => ValueKind::List,
            Payload::Hash(_) => ValueKind::Hash,
            Payload::Set(_) => ValueKind::Set,
        }
    }
}

/// A stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    payload: Payload,
    /// When this value expires (None = never expires)
    expires_at: Option<Instant>,
}

impl Value {
    /// Creates a non-expiring value.
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            expires_at: None,
        }
    }

    /// Creates a string value.
    pub fn string(data: impl Into<Bytes>) -> Self {
        Self::new(Payload::String(data.into()))
    }

    /// Creates a list value, preserving element order.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Self::new(Payload::List(items.into_iter().map(Into::into).collect()))
    }

    /// Creates a hash value from field/value pairs.
    pub fn hash<I, F, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<Bytes>,
        V: Into<Bytes>,
    {
        Self::new(Payload::Hash(
            fields
                .into_iter()
                .map(|(f, v)| (f.into(), v.into()))
                .collect(),
        ))
    }

    /// Creates a set value. Duplicate members collapse.
    pub fn set<I, T>(members: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Self::new(Payload::Set(members.into_iter().map(Into::into).collect()))
    }

    /// Returns this value expiring at `instant`.
    pub fn with_expiry(mut self, instant: Instant) -> Self {
        self.expires_at = Some(instant);
        self
    }

    /// Returns this value expiring `ttl` from now.
    ///
    /// A `ttl` too large to represent as an `Instant` yields a value that
    /// never expires.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = Instant::now().checked_add(ttl);
        self
    }

    /// Attaches or replaces the expiration instant.
    pub fn set_ttl(&mut self, instant: Instant) {
        self.expires_at = Some(instant);
    }

    /// Removes the expiration instant, making the value persistent.
    ///
    /// Returns `true` if an expiration was removed.
    pub fn clear_ttl(&mut self) -> bool {
        self.expires_at.take().is_some()
    }

    #[inline]
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    #[inline]
    pub fn has_ttl(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Checks whether this value has expired as of `now`.
    ///
    /// A value expires at its deadline, not after it: `now == expires_at`
    /// counts as expired.
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }

    /// Returns the time left before expiry, or `None` if no expiry is set.
    ///
    /// Saturates at zero for values already past their deadline.
    pub fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|exp| exp.saturating_duration_since(now))
    }

    pub fn kind(&self) -> ValueKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    pub fn as_string(&self) -> Option<&Bytes> {
        match &self.payload {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&VecDeque<Bytes>> {
        match &self.payload {
            Payload::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&HashMap<Bytes, Bytes>> {
        match &self.payload {
            Payload::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&HashSet<Bytes>> {
        match &self.payload {
            Payload::Set(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_ttl_never_expires() {
        let value = Value::string("v");
        let far = Instant::now() + Duration::from_secs(10 * 365 * 24 * 3600);

        assert!(!value.has_ttl());
        assert!(!value.is_expired(far));
        assert_eq!(value.ttl_remaining(far), None);
    }

    #[test]
    fn test_expired_at_deadline() {
        let now = Instant::now();
        let value = Value::string("v").with_expiry(now + Duration::from_secs(1));

        assert!(!value.is_expired(now));
        assert!(value.is_expired(now + Duration::from_secs(1)));
        assert!(value.is_expired(now + Duration::from_secs(2)));
    }

    #[test]
    fn test_set_ttl_replaces_deadline() {
        let now = Instant::now();
        let mut value = Value::string("v");

        value.set_ttl(now + Duration::from_secs(1));
        value.set_ttl(now + Duration::from_secs(60));

        assert!(!value.is_expired(now + Duration::from_secs(30)));
        assert_eq!(
            value.ttl_remaining(now),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_clear_ttl() {
        let mut value = Value::string("v").with_ttl(Duration::from_secs(5));
        assert!(value.clear_ttl());
        assert!(!value.clear_ttl());
        assert!(!value.has_ttl());
    }

    #[test]
    fn test_with_ttl_overflow_never_expires() {
        let value = Value::string("v")
            .with_expiry(Instant::now())
            .with_ttl(Duration::from_secs(u64::MAX));

        assert!(!value.has_ttl());
        assert!(!value.is_expired(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn test_ttl_remaining_saturates() {
        let now = Instant::now();
        let value = Value::string("v").with_expiry(now);
        assert_eq!(
            value.ttl_remaining(now + Duration::from_secs(3)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Value::string("s").kind(), ValueKind::String);
        assert_eq!(Value::list(["a", "b"]).kind().as_str(), "list");
        assert_eq!(Value::hash([("f", "v")]).kind().as_str(), "hash");
        assert_eq!(Value::set(["m", "m"]).kind().as_str(), "set");
    }

    #[test]
    fn test_accessors() {
        let list = Value::list(["a", "b", "c"]);
        assert_eq!(list.as_list().map(|l| l.len()), Some(3));
        assert!(list.as_string().is_none());

        let set = Value::set(["m", "m", "n"]);
        assert_eq!(set.as_set().map(|s| s.len()), Some(2));

        let hash = Value::hash([("f", "v")]);
        assert_eq!(
            hash.as_hash().and_then(|h| h.get(&Bytes::from("f"))),
            Some(&Bytes::from("v"))
        );
    }
}
