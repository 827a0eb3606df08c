use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Query parameters of the subscription handshake GET.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(default, rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(default, rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(default, rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Echo the challenge back verbatim with a 200.
    Accepted(String),
    /// Respond 403; mode or token did not match.
    Rejected,
}

/// Cloud API webhook verification: mode must be `subscribe` and the token
/// must equal the configured shared secret.
pub fn verify_subscription(params: &VerifyParams, expected_token: &SecretString) -> VerifyOutcome {
    let mode_ok = params.mode.as_deref() == Some("subscribe");
    let token_ok = params.verify_token.as_deref() == Some(expected_token.expose_secret());

    match (mode_ok, token_ok, params.challenge.as_deref()) {
        (true, true, Some(challenge)) => VerifyOutcome::Accepted(challenge.to_string()),
        _ => VerifyOutcome::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{verify_subscription, VerifyOutcome, VerifyParams};

    fn secret() -> SecretString {
        SecretString::from("verify-secret".to_string())
    }

    #[test]
    fn matching_subscription_echoes_challenge() {
        let params = VerifyParams {
            mode: Some("subscribe".to_string()),
            verify_token: Some("verify-secret".to_string()),
            challenge: Some("ABC123".to_string()),
        };

        assert_eq!(
            verify_subscription(&params, &secret()),
            VerifyOutcome::Accepted("ABC123".to_string())
        );
    }

    #[test]
    fn wrong_token_is_rejected() {
        let params = VerifyParams {
            mode: Some("subscribe".to_string()),
            verify_token: Some("nope".to_string()),
            challenge: Some("ABC123".to_string()),
        };

        assert_eq!(verify_subscription(&params, &secret()), VerifyOutcome::Rejected);
    }

    #[test]
    fn wrong_mode_is_rejected() {
        let params = VerifyParams {
            mode: Some("unsubscribe".to_string()),
            verify_token: Some("verify-secret".to_string()),
            challenge: Some("ABC123".to_string()),
        };

        assert_eq!(verify_subscription(&params, &secret()), VerifyOutcome::Rejected);
    }

    #[test]
    fn missing_challenge_is_rejected() {
        let params = VerifyParams {
            mode: Some("subscribe".to_string()),
            verify_token: Some("verify-secret".to_string()),
            challenge: None,
        };

        assert_eq!(verify_subscription(&params, &secret()), VerifyOutcome::Rejected);
    }
}
