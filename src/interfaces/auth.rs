//! Authentication gate, consumed from the surrounding application.
//!
//! The engine never inspects credentials; the embedding request layer
//! authenticates once per request and passes the resulting context into
//! the engine's entry points as a plain value.

use async_trait::async_trait;

/// Role attached to an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

/// Authenticated identity for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unauthenticated")]
    Unauthenticated,
}

/// Interface the embedding application implements to authenticate
/// inbound credentials. Provided here so the engine and its tests can
/// name the contract; no production implementation ships in this crate.
#[async_trait]
pub trait AuthGate: Send + Sync {
    /// Resolve credentials to an authenticated identity.
    async fn authenticate(&self, token: &str) -> Result<AuthContext, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticGate;

    #[async_trait]
    impl AuthGate for StaticGate {
        async fn authenticate(&self, token: &str) -> Result<AuthContext, AuthError> {
            match token {
                "admin-token" => Ok(AuthContext::new("admin@example.com", Role::Admin)),
                "user-token" => Ok(AuthContext::new("user@example.com", Role::User)),
                _ => Err(AuthError::Unauthenticated),
            }
        }
    }

    #[tokio::test]
    async fn test_auth_gate_contract() {
        let gate = StaticGate;

        let ctx = gate.authenticate("admin-token").await.unwrap();
        assert!(ctx.is_admin());

        let ctx = gate.authenticate("user-token").await.unwrap();
        assert!(!ctx.is_admin());

        assert!(matches!(
            gate.authenticate("garbage").await,
            Err(AuthError::Unauthenticated)
        ));
    }
}
