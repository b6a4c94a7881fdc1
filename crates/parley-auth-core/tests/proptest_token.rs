//! Property-based tests for the token codec
//!
//! These tests verify:
//! - Issued tokens roundtrip (issue -> verify -> claims)
//! - Malformed tokens never cause panics
//! - Payload tampering is always detected
//! - Lifetimes are embedded exactly

mod common;

use std::time::Duration;

use parley_auth_core::{AuthConfig, AuthError, TokenCodec};
use parley_types::{AccountId, TokenKind};
use proptest::prelude::*;

fn codec_with_lifetimes(access_secs: u64, refresh_secs: u64) -> TokenCodec {
    let config = AuthConfig::try_new(common::TEST_SECRET, common::TEST_CLIENT_ID)
        .unwrap()
        .with_access_token_lifetime(Duration::from_secs(access_secs))
        .with_refresh_token_lifetime(Duration::from_secs(refresh_secs));
    TokenCodec::new(&config)
}

fn arb_account_id() -> impl Strategy<Value = AccountId> {
    any::<[u8; 16]>().prop_map(|bytes| AccountId(uuid::Uuid::from_bytes(bytes)))
}

fn arb_kind() -> impl Strategy<Value = TokenKind> {
    prop_oneof![Just(TokenKind::Access), Just(TokenKind::Refresh)]
}

/// Garbage that must never verify or panic
fn arb_malformed_token() -> impl Strategy<Value = String> {
    prop_oneof![
        // No dots
        "[a-zA-Z0-9_-]{0,60}",
        // Too many segments
        "[a-zA-Z0-9_-]{5,20}\\.[a-zA-Z0-9_-]{5,20}\\.[a-zA-Z0-9_-]{5,20}\\.[a-zA-Z0-9_-]{5,20}",
        // Empty segments
        Just("..".to_string()),
        Just(".".to_string()),
        Just("a..c".to_string()),
        // Non-base64 characters
        "[!@#$%^&*(){}]{5,30}\\.[a-zA-Z0-9_-]{5,30}\\.[a-zA-Z0-9_-]{5,30}",
    ]
}

proptest! {
    /// Property: issue -> verify preserves subject and kind
    #[test]
    fn prop_roundtrip_preserves_subject_and_kind(
        subject in arb_account_id(),
        kind in arb_kind(),
        access_secs in 1u64..86_400,
        refresh_secs in 1u64..2_592_000,
    ) {
        let codec = codec_with_lifetimes(access_secs, refresh_secs);
        let token = codec.issue(subject, kind).unwrap();
        let claims = codec.verify(&token).unwrap();
        prop_assert_eq!(claims.account_id().unwrap(), subject);
        prop_assert_eq!(claims.kind().unwrap(), kind);
    }

    /// Property: the embedded lifetime equals the configured one exactly
    #[test]
    fn prop_lifetime_embedded_exactly(
        subject in arb_account_id(),
        access_secs in 1u64..86_400,
    ) {
        let codec = codec_with_lifetimes(access_secs, 3600);
        let token = codec.issue(subject, TokenKind::Access).unwrap();
        let claims = codec.verify(&token).unwrap();
        prop_assert_eq!(claims.exp - claims.iat, access_secs as i64);
    }

    /// Property: malformed input never panics, always MalformedToken
    #[test]
    fn prop_malformed_never_panics(token in arb_malformed_token()) {
        let codec = codec_with_lifetimes(3600, 86_400);
        let result = codec.verify(&token);
        prop_assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    /// Property: flipping any payload byte invalidates the signature
    #[test]
    fn prop_payload_tampering_detected(
        subject in arb_account_id(),
        kind in arb_kind(),
        flip_index in 0usize..64,
    ) {
        let codec = codec_with_lifetimes(3600, 86_400);
        let token = codec.issue(subject, kind).unwrap();

        // Tamper inside the payload segment.
        let payload_start = token.find('.').unwrap() + 1;
        let payload_end = token.rfind('.').unwrap();
        prop_assume!(payload_start + flip_index < payload_end);

        let mut bytes = token.into_bytes();
        let i = payload_start + flip_index;
        bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let result = codec.verify(&tampered);
        prop_assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    /// Property: a token is never accepted by a codec with another secret
    #[test]
    fn prop_cross_secret_rejected(
        subject in arb_account_id(),
        kind in arb_kind(),
    ) {
        let codec = codec_with_lifetimes(3600, 86_400);
        let other = TokenCodec::new(
            &AuthConfig::try_new("another-secret-another-secret-xx", common::TEST_CLIENT_ID)
                .unwrap(),
        );
        let token = codec.issue(subject, kind).unwrap();
        prop_assert!(matches!(other.verify(&token), Err(AuthError::MalformedToken)));
    }
}
