use serde::{Deserialize, Serialize};

/// Opaque identifier of the store account that owns every scoped row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolved identity for an inbound sender address.
///
/// Resolution is read-only: the account system owns tenant records, this
/// runtime only looks them up. An unresolvable sender is terminal for the
/// request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantIdentity {
    pub owner_id: OwnerId,
    pub display_name: String,
}
