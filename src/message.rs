//! Wire contract between the relay and the store.
//!
//! A submission travels as one datagram holding an
//! `application/x-www-form-urlencoded` body. The store answers with a single
//! short status datagram; only [`Reply::Ack`] counts as success.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One decoded form payload: field name to field value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Submission(BTreeMap<String, String>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedSubmission {
    InvalidUtf8,
    Empty,
    MissingSeparator(String),
}

impl fmt::Display for MalformedSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedSubmission::InvalidUtf8 => write!(f, "payload is not valid UTF-8"),
            MalformedSubmission::Empty => write!(f, "payload is empty"),
            MalformedSubmission::MissingSeparator(token) => {
                write!(f, "field '{token}' has no '=' separator")
            }
        }
    }
}

impl std::error::Error for MalformedSubmission {}

impl Submission {
    /// Decode a URL-encoded payload (`a=1&b=two+words`).
    ///
    /// Every `&`-separated token must contain `=`; the token is split on the
    /// first one only, so values may themselves contain `=`. Keys and values
    /// are decoded after splitting with `+` read as a space. A repeated key
    /// keeps its last value.
    pub fn decode(payload: &[u8]) -> Result<Self, MalformedSubmission> {
        let text = std::str::from_utf8(payload).map_err(|_| MalformedSubmission::InvalidUtf8)?;
        if text.is_empty() {
            return Err(MalformedSubmission::Empty);
        }

        let mut fields = BTreeMap::new();
        for token in text.split('&') {
            if !token.contains('=') {
                return Err(MalformedSubmission::MissingSeparator(token.to_string()));
            }
            if let Some((key, value)) = form_urlencoded::parse(token.as_bytes()).next() {
                fields.insert(key.into_owned(), value.into_owned());
            }
        }

        Ok(Submission(fields))
    }

    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Submission {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Submission(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Status datagram sent by the store after handling a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Stored. The literal `200 OK`.
    Ack,
    Malformed,
    StorageFailed,
}

impl Reply {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Reply::Ack => b"200 OK",
            Reply::Malformed => b"400 Bad Request",
            Reply::StorageFailed => b"500 Internal Server Error",
        }
    }

    /// Exact match against the known status datagrams.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        [Reply::Ack, Reply::Malformed, Reply::StorageFailed]
            .into_iter()
            .find(|reply| reply.as_bytes() == payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plus_as_space() {
        let sub = Submission::decode(b"name=Alice&msg=Hi+there").unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.get("name"), Some("Alice"));
        assert_eq!(sub.get("msg"), Some("Hi there"));
    }

    #[test]
    fn last_duplicate_wins() {
        let sub = Submission::decode(b"a=1&a=2").unwrap();
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.get("a"), Some("2"));
    }

    #[test]
    fn value_may_contain_equals() {
        let sub = Submission::decode(b"expr=1%2B1=2&raw=a=b").unwrap();
        assert_eq!(sub.get("expr"), Some("1+1=2"));
        assert_eq!(sub.get("raw"), Some("a=b"));
    }

    #[test]
    fn keeps_non_ascii() {
        let sub = Submission::decode("msg=%D0%9F%D1%80%D0%B8%D0%B2%D1%96%D1%82".as_bytes()).unwrap();
        assert_eq!(sub.get("msg"), Some("Привіт"));
    }

    #[test]
    fn empty_values_are_allowed() {
        let sub = Submission::decode(b"name=&msg=").unwrap();
        assert_eq!(sub.get("name"), Some(""));
        assert_eq!(sub.get("msg"), Some(""));
    }

    #[test]
    fn rejects_empty_payload() {
        assert_eq!(Submission::decode(b""), Err(MalformedSubmission::Empty));
    }

    #[test]
    fn rejects_token_without_separator() {
        assert_eq!(
            Submission::decode(b"name=Alice&oops"),
            Err(MalformedSubmission::MissingSeparator("oops".to_string()))
        );
        assert_eq!(
            Submission::decode(b"a=1&&b=2"),
            Err(MalformedSubmission::MissingSeparator(String::new()))
        );
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert_eq!(
            Submission::decode(&[b'a', b'=', 0xff, 0xfe]),
            Err(MalformedSubmission::InvalidUtf8)
        );
    }

    #[test]
    fn encode_then_decode_keeps_fields() {
        let sub: Submission = [
            ("name", "Alice & Bob"),
            ("msg", "50% = half"),
            ("lang", "uk: Привіт"),
        ]
        .into_iter()
        .collect();

        let decoded = Submission::decode(sub.encode().as_bytes()).unwrap();
        assert_eq!(decoded, sub);
    }

    #[test]
    fn serializes_as_flat_object() {
        let sub = Submission::decode(b"name=Alice&msg=Hi+there").unwrap();
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Alice", "msg": "Hi there"}));
    }

    #[test]
    fn ack_is_the_exact_literal() {
        assert_eq!(Reply::Ack.as_bytes(), b"200 OK");
        assert_eq!(Reply::parse(b"200 OK"), Some(Reply::Ack));
        assert_eq!(Reply::parse(b"200 OK\n"), None);
        assert_eq!(Reply::parse(b"ok"), None);
        assert_eq!(Reply::parse(b"400 Bad Request"), Some(Reply::Malformed));
        assert_eq!(
            Reply::parse(b"500 Internal Server Error"),
            Some(Reply::StorageFailed)
        );
    }
}
