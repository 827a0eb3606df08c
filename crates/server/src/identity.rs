//! Sender-address to tenant resolution.
//!
//! Channels are inconsistent about country-code prefixes, so resolution is
//! two-step: an exact match on the full sender address, then a fallback match
//! on its trailing nine digits. An unresolved sender is terminal for the
//! request; a failed exact lookup counts as not-found and still reaches the
//! suffix step, so only a failed suffix lookup ends resolution.

use tiendita_core::domain::TenantIdentity;
use tiendita_core::trace::RequestTrace;
use tiendita_db::repositories::TenantRepository;
use tracing::warn;

/// Suffix length that survives country-code and formatting differences for
/// the local subscriber numbers this runtime serves.
const SUFFIX_LEN: usize = 9;

pub async fn resolve(
    tenants: &dyn TenantRepository,
    sender: &str,
    trace: &mut RequestTrace,
) -> Option<TenantIdentity> {
    match tenants.find_by_contact(sender).await {
        Ok(Some(identity)) => {
            trace.push(format!("identity: exact match for {}", identity.display_name));
            return Some(identity);
        }
        Ok(None) => {}
        Err(error) => {
            warn!(event_name = "identity.lookup_failed", error = %error, "exact lookup failed");
            trace.push(format!("identity: exact lookup failed, treating as not found: {error}"));
        }
    }

    let digits: Vec<char> = sender.chars().collect();
    if digits.len() < SUFFIX_LEN {
        trace.push("identity: sender too short for suffix match".to_string());
        return None;
    }
    let suffix: String = digits[digits.len() - SUFFIX_LEN..].iter().collect();

    match tenants.find_by_contact_suffix(&suffix).await {
        Ok(Some(identity)) => {
            trace.push(format!("identity: suffix match for {}", identity.display_name));
            Some(identity)
        }
        Ok(None) => {
            trace.push("identity: no tenant for sender".to_string());
            None
        }
        Err(error) => {
            warn!(event_name = "identity.lookup_failed", error = %error, "suffix lookup failed");
            trace.push(format!("identity: suffix lookup failed: {error}"));
            None
        }
    }
}
