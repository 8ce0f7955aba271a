//! Unified error handling with Sentry integration.
//!
//! Every outbound operation settles into a structured [`ApiError`]; nothing
//! is thrown uncaught to the UI. The taxonomy distinguishes failures that
//! never reached the network (`ValidationRejected`, `Unauthenticated` with a
//! missing token) from transport loss (`NetworkUnreachable`) and from
//! responses that arrived but said no (`ServerRejected`, `NotFound`).

use thiserror::Error;

/// Errors reported by gateways, synchronizers, and the checkout coordinator.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No token, or the server rejected the one presented.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The referenced cart line or order no longer exists server-side.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input caught client-side before any network call.
    #[error("Validation rejected: {0}")]
    ValidationRejected(String),

    /// No response was received.
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    /// A response was received, but the server refused the request.
    #[error("Server rejected request: {message}")]
    ServerRejected {
        /// HTTP status, when the refusal came as a non-2xx response.
        status: Option<u16>,
        /// Human-readable reason, from the response when it carried one.
        message: String,
    },
}

impl ApiError {
    /// Shorthand for a `ServerRejected` without an HTTP status (envelope
    /// `success=false` responses).
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::ServerRejected {
            status: None,
            message: message.into(),
        }
    }

    /// Whether the failure means the session token is no longer valid.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

/// Result type alias for [`ApiError`].
pub type Result<T> = std::result::Result<T, ApiError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after login to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Updated line quantity", Some(&[("cart_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        assert_eq!(ApiError::Unauthenticated.to_string(), "Not authenticated");
        assert_eq!(
            ApiError::NotFound("cart line 9".to_string()).to_string(),
            "Not found: cart line 9"
        );
        assert_eq!(
            ApiError::ValidationRejected("quantity must be at least 1".to_string()).to_string(),
            "Validation rejected: quantity must be at least 1"
        );
        assert_eq!(
            ApiError::rejected("out of stock").to_string(),
            "Server rejected request: out of stock"
        );
    }

    #[test]
    fn test_is_unauthenticated() {
        assert!(ApiError::Unauthenticated.is_unauthenticated());
        assert!(!ApiError::rejected("nope").is_unauthenticated());
    }
}
