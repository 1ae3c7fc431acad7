//! Business roles a platform identity can act as

use serde::{Deserialize, Serialize};

/// The closed set of business roles.
///
/// A user may hold several of these, but acts as exactly one at a time.
/// There is no ordering or hierarchy between roles; `Ord` exists only so
/// roles can live in sorted sets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Rents a property
    Tenant,
    /// Owns one or more properties
    Owner,
    /// Manages properties on behalf of owners, under a mandate
    Agency,
    /// Certified third party (diagnostics, inventory reports)
    TrustedThirdParty,
}

impl Role {
    /// All roles, in declaration order
    pub const ALL: [Role; 4] = [
        Role::Tenant,
        Role::Owner,
        Role::Agency,
        Role::TrustedThirdParty,
    ];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Tenant => "tenant",
            Role::Owner => "owner",
            Role::Agency => "agency",
            Role::TrustedThirdParty => "trusted_third_party",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::TrustedThirdParty).unwrap(),
            "\"trusted_third_party\""
        );
        assert_eq!(
            serde_json::from_str::<Role>("\"agency\"").unwrap(),
            Role::Agency
        );
    }

    #[test]
    fn display_matches_wire_name() {
        for role in Role::ALL {
            let wire = serde_json::to_string(&role).unwrap();
            assert_eq!(wire, format!("\"{}\"", role));
        }
    }
}
