//! Operation Context
//!
//! Contains metadata about the current operation for audit and tracing.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// Context for an operation, used for auditing and tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Authenticated caller (account id) from X-Request-User-Id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<Uuid>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    /// Client IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
}

impl OperationContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self {
            caller_id: None,
            correlation_id: None,
            client_ip: None,
        }
    }

    /// Create context with the authenticated caller
    pub fn with_caller(mut self, account_id: Uuid) -> Self {
        self.caller_id = Some(account_id);
        self
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Create context with client IP
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let caller = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let context = OperationContext::new()
            .with_caller(caller)
            .with_correlation_id(correlation_id);

        assert_eq!(context.caller_id, Some(caller));
        assert_eq!(context.correlation_id, Some(correlation_id));
        assert!(context.client_ip.is_none());
    }

    #[test]
    fn test_ensure_correlation_id() {
        let mut context = OperationContext::new();
        assert!(context.correlation_id.is_none());

        let id = context.ensure_correlation_id();
        assert_eq!(context.correlation_id, Some(id));

        // Calling again should return the same ID
        assert_eq!(context.ensure_correlation_id(), id);
    }
}
