//! Safety gate and ownership resolution
//!
//! Every mutating call goes through [`SafetyChecker::check`] after the
//! existence check has run. For updates the ownership must come from the
//! owner recorded on the fetched resource; creates always pass
//! [`Ownership::Unknown`] because the target has no owner yet.

use crate::types::{Operation, Ownership, SafetyLevel};

/// Derive ownership of a resource relative to the caller
///
/// Empty strings mean "not available" on either side.
pub fn resolve_ownership(resource_owner: &str, caller: &str) -> Ownership {
    if resource_owner.is_empty() || caller.is_empty() {
        Ownership::Unknown
    } else if resource_owner == caller {
        Ownership::Own
    } else {
        Ownership::Shared
    }
}

/// Denial raised by the safety gate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} denied by safety level '{level}': {reason}")]
pub struct SafetyError {
    pub level: SafetyLevel,
    pub operation: Operation,
    pub ownership: Ownership,
    pub reason: String,
}

/// Safety policy for one connection context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyChecker {
    level: SafetyLevel,
    caller: String,
}

impl SafetyChecker {
    pub fn new(level: SafetyLevel, caller: impl Into<String>) -> Self {
        Self {
            level,
            caller: caller.into(),
        }
    }

    pub fn level(&self) -> SafetyLevel {
        self.level
    }

    /// Caller identity, empty when unknown
    pub fn caller(&self) -> &str {
        &self.caller
    }

    /// Ownership of a resource whose recorded owner is `owner`
    pub fn ownership_of(&self, owner: Option<&str>) -> Ownership {
        resolve_ownership(owner.unwrap_or_default(), &self.caller)
    }

    /// Allow or deny an operation for the given ownership
    pub fn check(&self, operation: Operation, ownership: Ownership) -> Result<(), SafetyError> {
        let reason = match (self.level, operation, ownership) {
            (SafetyLevel::ReadOnly, _, _) => Some("the context is read-only"),
            (SafetyLevel::ReadWriteMine, Operation::Create, _) => None,
            (SafetyLevel::ReadWriteMine, Operation::Update, Ownership::Own) => None,
            (SafetyLevel::ReadWriteMine, Operation::Update, Ownership::Shared) => {
                Some("the resource is owned by another user")
            }
            (SafetyLevel::ReadWriteMine, Operation::Update, Ownership::Unknown) => {
                Some("the resource owner could not be determined")
            }
            (SafetyLevel::ReadWriteAll | SafetyLevel::DangerouslyUnrestricted, _, _) => None,
        };

        match reason {
            None => {
                log::info!(
                    "Safety gate: {} allowed ({}, ownership {})",
                    operation,
                    self.level,
                    ownership
                );
                Ok(())
            }
            Some(reason) => Err(SafetyError {
                level: self.level,
                operation,
                ownership,
                reason: reason.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNERSHIPS: [Ownership; 3] = [Ownership::Own, Ownership::Shared, Ownership::Unknown];

    fn allowed(level: SafetyLevel, op: Operation, ownership: Ownership) -> bool {
        SafetyChecker::new(level, "u1").check(op, ownership).is_ok()
    }

    #[test]
    fn test_resolve_ownership() {
        assert_eq!(resolve_ownership("u1", "u1"), Ownership::Own);
        assert_eq!(resolve_ownership("u1", ""), Ownership::Unknown);
        assert_eq!(resolve_ownership("", "u2"), Ownership::Unknown);
        assert_eq!(resolve_ownership("", ""), Ownership::Unknown);
        assert_eq!(resolve_ownership("u1", "u2"), Ownership::Shared);
    }

    #[test]
    fn test_readonly_denies_everything() {
        for ownership in OWNERSHIPS {
            assert!(!allowed(SafetyLevel::ReadOnly, Operation::Create, ownership));
            assert!(!allowed(SafetyLevel::ReadOnly, Operation::Update, ownership));
        }
    }

    #[test]
    fn test_readwrite_mine_table() {
        for ownership in OWNERSHIPS {
            assert!(allowed(SafetyLevel::ReadWriteMine, Operation::Create, ownership));
        }
        assert!(allowed(SafetyLevel::ReadWriteMine, Operation::Update, Ownership::Own));
        assert!(!allowed(SafetyLevel::ReadWriteMine, Operation::Update, Ownership::Shared));
        assert!(!allowed(SafetyLevel::ReadWriteMine, Operation::Update, Ownership::Unknown));
    }

    #[test]
    fn test_readwrite_all_and_unrestricted_allow_everything() {
        for level in [SafetyLevel::ReadWriteAll, SafetyLevel::DangerouslyUnrestricted] {
            for ownership in OWNERSHIPS {
                assert!(allowed(level, Operation::Create, ownership));
                assert!(allowed(level, Operation::Update, ownership));
            }
        }
    }

    #[test]
    fn test_readwrite_mine_with_caller_u1() {
        let checker = SafetyChecker::new(SafetyLevel::ReadWriteMine, "u1");

        let own = checker.ownership_of(Some("u1"));
        assert!(checker.check(Operation::Update, own).is_ok());

        let other = checker.ownership_of(Some("u2"));
        let err = checker.check(Operation::Update, other).unwrap_err();
        assert_eq!(err.ownership, Ownership::Shared);
        assert!(err.to_string().contains("owned by another user"));

        assert!(checker.check(Operation::Create, Ownership::Unknown).is_ok());
    }

    #[test]
    fn test_missing_owner_is_unknown() {
        let checker = SafetyChecker::new(SafetyLevel::ReadWriteMine, "u1");
        assert_eq!(checker.ownership_of(None), Ownership::Unknown);

        let anonymous = SafetyChecker::new(SafetyLevel::ReadWriteMine, "");
        assert_eq!(anonymous.ownership_of(Some("u1")), Ownership::Unknown);
        assert!(anonymous.check(Operation::Create, Ownership::Unknown).is_ok());
    }

    #[test]
    fn test_denial_message_names_level_and_operation() {
        let err = SafetyChecker::new(SafetyLevel::ReadOnly, "u1")
            .check(Operation::Create, Ownership::Unknown)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("create"));
        assert!(msg.contains("readonly"));
    }
}
