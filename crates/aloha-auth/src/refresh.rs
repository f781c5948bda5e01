//! Opaque refresh tokens bound to an email.

use rand::RngCore;

use aloha_core::Email;

use crate::error::{AuthError, Result};

/// Prefix every refresh token starts with.
pub const PREFIX: &str = "refresh_";

const RANDOM_BYTES: usize = 32;

/// Refresh token generation and parsing.
pub struct RefreshToken;

impl RefreshToken {
    /// Generate `refresh_<email>_<64 hex chars>` from 32 random bytes.
    #[must_use]
    pub fn generate(email: &Email) -> String {
        let mut bytes = [0u8; RANDOM_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        format!("{PREFIX}{email}_{}", hex::encode(bytes))
    }

    /// Extract the email a refresh token is bound to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRefreshToken` if the token does not have
    /// the expected shape.
    pub fn owner(token: &str) -> Result<Email> {
        let body = token
            .strip_prefix(PREFIX)
            .ok_or(AuthError::InvalidRefreshToken)?;
        let (email, random) = body
            .rsplit_once('_')
            .ok_or(AuthError::InvalidRefreshToken)?;

        let well_formed = random.len() == RANDOM_BYTES * 2
            && random
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(AuthError::InvalidRefreshToken);
        }

        Email::parse(email).map_err(|_| AuthError::InvalidRefreshToken)
    }

    /// Whether `token` is a well-formed refresh token for `email`.
    #[must_use]
    pub fn is_bound_to(token: &str, email: &Email) -> bool {
        Self::owner(token).is_ok_and(|owner| owner.normalized() == email.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn generate_layout() {
        let token = RefreshToken::generate(&email("user@example.com"));
        let random = token.strip_prefix("refresh_user@example.com_").unwrap();
        assert_eq!(random.len(), 64);
        assert!(random.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn tokens_are_unique() {
        let e = email("user@example.com");
        assert_ne!(RefreshToken::generate(&e), RefreshToken::generate(&e));
    }

    #[test]
    fn owner_roundtrip_with_underscores_in_email() {
        let e = email("first_last@example.com");
        let token = RefreshToken::generate(&e);
        assert_eq!(RefreshToken::owner(&token).unwrap(), e);
    }

    #[test]
    fn bound_to_ignores_case() {
        let token = RefreshToken::generate(&email("User@Example.com"));
        assert!(RefreshToken::is_bound_to(&token, &email("user@example.com")));
        assert!(!RefreshToken::is_bound_to(&token, &email("other@example.com")));
    }

    #[test]
    fn malformed_rejected() {
        let short = format!("refresh_a@b.c_{}", "ab".repeat(10));
        let upper = format!("refresh_a@b.c_{}", "AB".repeat(32));
        let no_email = format!("refresh__{}", "ab".repeat(32));
        for token in ["", "refresh_", "token_a@b.c_00", &short, &upper, &no_email] {
            assert!(
                matches!(
                    RefreshToken::owner(token),
                    Err(AuthError::InvalidRefreshToken)
                ),
                "{token:?} was accepted"
            );
        }
    }
}
