//! Delegation token entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token kind advertised to clients alongside the credential
pub const TOKEN_KIND: &str = "TIMELINE_DELEGATION_TOKEN";

/// Identity of a delegation token instance.
///
/// Immutable once issued; equality is by value. The identifier doubles as
/// the signed payload of the token, so it is fully serde-serializable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenIdentifier {
    /// Principal the token was issued to
    pub owner: String,

    /// Principal allowed to renew the token
    pub renewer: String,

    /// Real user behind a proxied request, if any
    pub real_user: String,

    /// When the token was issued
    pub issue_date: DateTime<Utc>,

    /// Absolute time past which the token can only be replaced, not renewed
    pub max_date: DateTime<Utc>,

    /// Monotonically increasing sequence number within the secret manager
    pub sequence_number: i64,

    /// Id of the master key the token was signed under
    pub master_key_id: u64,
}

impl TokenIdentifier {
    /// Whether the identifier's max lifetime has passed
    pub fn is_past_max_lifetime(&self, now: DateTime<Utc>) -> bool {
        now > self.max_date
    }
}

/// A delegation token as handed to an application's credential set.
///
/// The password is a compact signed encoding of the identifier; the mutable
/// expiry state produced by renewal lives server-side in the secret
/// manager's live set, never inside the token itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationToken {
    /// Value identity of the token
    pub identifier: TokenIdentifier,

    /// Signed payload presented as the bearer credential
    pub password: String,

    /// Service endpoint the token is bound to
    pub service: String,

    /// Token kind, always [`TOKEN_KIND`]
    pub kind: String,
}

impl DelegationToken {
    /// Creates a token bound to no service endpoint yet
    pub fn new(identifier: TokenIdentifier, password: String) -> Self {
        Self {
            identifier,
            password,
            service: String::new(),
            kind: TOKEN_KIND.to_string(),
        }
    }

    /// Rebinds the token to a service endpoint (host:port)
    pub fn set_service(&mut self, service: impl Into<String>) {
        self.service = service.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn identifier(seq: i64) -> TokenIdentifier {
        let now = Utc::now();
        TokenIdentifier {
            owner: "foo".to_string(),
            renewer: "foo".to_string(),
            real_user: String::new(),
            issue_date: now,
            max_date: now + Duration::seconds(4),
            sequence_number: seq,
            master_key_id: 1,
        }
    }

    #[test]
    fn test_identifier_value_equality() {
        let a = identifier(1);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, identifier(2));
    }

    #[test]
    fn test_past_max_lifetime() {
        let ident = identifier(1);
        assert!(!ident.is_past_max_lifetime(Utc::now()));
        assert!(ident.is_past_max_lifetime(Utc::now() + Duration::seconds(5)));
    }

    #[test]
    fn test_identifier_serde_round_trip() {
        let ident = identifier(7);
        let json = serde_json::to_string(&ident).unwrap();
        let parsed: TokenIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(ident, parsed);
    }

    #[test]
    fn test_set_service() {
        let mut token = DelegationToken::new(identifier(1), "signed".to_string());
        assert!(token.service.is_empty());
        token.set_service("localhost:8188");
        assert_eq!(token.service, "localhost:8188");
        assert_eq!(token.kind, TOKEN_KIND);
    }
}
