//! Who is writing: the principal stamped into `lastModifiedBy`.

/// Principal recorded when no identity is available.
pub const ANONYMOUS: &str = "anonymous";

/// Source of the authenticated caller's identity.
pub trait IdentityProvider: Send + Sync {
    /// The current principal, if the caller is authenticated.
    fn current_principal(&self) -> Option<String>;

    /// The current principal, or [`ANONYMOUS`].
    fn principal_or_anonymous(&self) -> String {
        self.current_principal()
            .unwrap_or_else(|| ANONYMOUS.to_string())
    }
}

/// Never authenticated.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnonymousIdentity;

impl IdentityProvider for AnonymousIdentity {
    fn current_principal(&self) -> Option<String> {
        None
    }
}

/// Always the same principal; for CLIs and service accounts.
#[derive(Clone, Debug)]
pub struct StaticIdentity(pub String);

impl StaticIdentity {
    pub fn new(principal: impl Into<String>) -> Self {
        Self(principal.into())
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_principal(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_fallback() {
        assert_eq!(AnonymousIdentity.current_principal(), None);
        assert_eq!(AnonymousIdentity.principal_or_anonymous(), "anonymous");
    }

    #[test]
    fn static_identity() {
        let id = StaticIdentity::new("alice");
        assert_eq!(id.current_principal().as_deref(), Some("alice"));
        assert_eq!(id.principal_or_anonymous(), "alice");
    }
}
