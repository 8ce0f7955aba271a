//! Authenticated identity and payment input.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Which side of the marketplace the authenticated user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses the menu, owns a cart, places orders.
    #[default]
    Customer,
    /// Sees assigned orders and marks them delivered.
    DeliveryAgent,
}

/// The authenticated user's id and bearer token.
///
/// Owned by the session store; read-only everywhere else. Absence of the
/// token means the session is no longer usable for authenticated calls.
///
/// Implements `Clone` cheaply and redacts the token in `Debug` output.
#[derive(Clone)]
pub struct Identity {
    /// Server-issued user ID.
    pub user_id: UserId,
    /// Role the user authenticated as.
    pub role: Role,
    token: Option<SecretString>,
}

impl Identity {
    /// Create an identity carrying a bearer token.
    #[must_use]
    pub fn new(user_id: UserId, role: Role, token: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            token: Some(SecretString::from(token.into())),
        }
    }

    /// Create an identity with no token (e.g. a restored session whose token
    /// expired). Authenticated calls made with it fail before any I/O.
    #[must_use]
    pub const fn without_token(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            token: None,
        }
    }

    /// The bearer token, if the session still holds one.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(ExposeSecret::expose_secret)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Card details entered at checkout.
///
/// A pass-through payload for the order-create request; the client performs
/// no validation beyond non-emptiness and never stores it. Number and CVV
/// are redacted from `Debug` output.
#[derive(Clone)]
pub struct PaymentCard {
    /// Name on the card.
    pub card_name: String,
    card_number: SecretString,
    /// Expiry in `MM/YY` form.
    pub valid_through: String,
    cvv: SecretString,
}

impl PaymentCard {
    /// Assemble card details from user input.
    #[must_use]
    pub fn new(
        card_name: impl Into<String>,
        card_number: impl Into<String>,
        valid_through: impl Into<String>,
        cvv: impl Into<String>,
    ) -> Self {
        Self {
            card_name: card_name.into(),
            card_number: SecretString::from(card_number.into()),
            valid_through: valid_through.into(),
            cvv: SecretString::from(cvv.into()),
        }
    }

    /// Card number, exposed only for request construction.
    #[must_use]
    pub fn card_number(&self) -> &str {
        self.card_number.expose_secret()
    }

    /// CVV, exposed only for request construction.
    #[must_use]
    pub fn cvv(&self) -> &str {
        self.cvv.expose_secret()
    }
}

impl std::fmt::Debug for PaymentCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentCard")
            .field("card_name", &self.card_name)
            .field("card_number", &"[REDACTED]")
            .field("valid_through", &self.valid_through)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_debug_redacts_token() {
        let identity = Identity::new(UserId::new(3), Role::Customer, "jwt-abc123");
        let debug_output = format!("{identity:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("jwt-abc123"));
    }

    #[test]
    fn test_identity_token_accessor() {
        let identity = Identity::new(UserId::new(3), Role::Customer, "jwt-abc123");
        assert_eq!(identity.token(), Some("jwt-abc123"));
        assert!(Identity::without_token(UserId::new(3), Role::Customer)
            .token()
            .is_none());
    }

    #[test]
    fn test_payment_card_debug_redacts_secrets() {
        let card = PaymentCard::new("A N Other", "4111111111111111", "12/27", "123");
        let debug_output = format!("{card:?}");
        assert!(debug_output.contains("A N Other"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("4111111111111111"));
        assert!(!debug_output.contains("\"123\""));
    }
}
