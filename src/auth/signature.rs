// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet signature verification.
//!
//! ## Verification Steps
//!
//! 1. Signature and timestamp must be present
//! 2. `|now - timestamp|` must not exceed the window (5 minutes)
//! 3. The signer is recovered from the EIP-191 `personal_sign` digest of the
//!    canonical message (see [`super::message`])
//! 4. The recovered address must equal the claimed wallet (case-insensitive)
//! 5. The `(signature, scope)` pair is consumed in the replay store
//!
//! Signatures are parsed before use and high-s forms are rejected. The replay
//! key is built from the canonical `r || s || v` encoding (lowercase, `0x`,
//! v as 27/28), so any other spelling of a consumed signature maps to the
//! same entry.
//!
//! Step 5 is a single insert-if-absent, so two concurrent requests carrying
//! the same signature cannot both pass. Nothing is written on any earlier
//! failure.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Signature;
use chrono::Utc;

use super::message::{build_auth_message, Scope};
use super::replay::{replay_key, ReplayStore};
use super::AuthError;
use crate::config::SIGNATURE_WINDOW;

/// A signed authorization claim attached to an API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    /// Claimed signer (0x-prefixed, 40 hex characters).
    pub wallet_address: String,
    /// 65-byte `r || s || v` signature, hex encoded.
    pub signature: String,
    /// Epoch milliseconds embedded in the signed message.
    pub timestamp: Option<i64>,
    pub scope: Scope,
}

/// Verifies signed auth messages and enforces single use within the window.
#[derive(Clone)]
pub struct SignatureVerifier {
    replay: Arc<dyn ReplayStore>,
    window: Duration,
}

impl SignatureVerifier {
    pub fn new(replay: Arc<dyn ReplayStore>) -> Self {
        Self {
            replay,
            window: SIGNATURE_WINDOW,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn replay_store(&self) -> &Arc<dyn ReplayStore> {
        &self.replay
    }

    /// Verify `request` against the current wall clock.
    pub fn verify(&self, request: &AuthRequest) -> Result<(), AuthError> {
        self.verify_at(request, Utc::now().timestamp_millis())
    }

    /// Verify `request` as if the current time were `now_ms`.
    pub fn verify_at(&self, request: &AuthRequest, now_ms: i64) -> Result<(), AuthError> {
        let timestamp = match request.timestamp {
            Some(ts) if ts != 0 && !request.signature.is_empty() => ts,
            _ => return Err(AuthError::MissingSignature),
        };

        let window_ms = self.window_ms();
        if now_ms.abs_diff(timestamp) > window_ms as u64 {
            return Err(AuthError::SignatureExpired);
        }

        let signature = parse_signature(&request.signature)?;
        let message = build_auth_message(request.scope, &request.wallet_address, timestamp);
        let recovered = recover_from(&message, &signature)?;

        if !recovered.eq_ignore_ascii_case(&request.wallet_address) {
            tracing::debug!(
                claimed = %request.wallet_address,
                recovered = %recovered,
                scope = %request.scope,
                "Recovered signer does not match claimed wallet"
            );
            return Err(AuthError::WalletMismatch);
        }

        let key = replay_key(&alloy::hex::encode_prefixed(signature.as_bytes()), request.scope);
        let consumed = self
            .replay
            .try_consume(&key, now_ms, now_ms.saturating_add(window_ms))
            .map_err(|e| AuthError::ReplayStore(e.to_string()))?;
        if !consumed {
            tracing::warn!(
                wallet = %request.wallet_address,
                scope = %request.scope,
                "Rejected replayed signature"
            );
            return Err(AuthError::SignatureReused);
        }

        Ok(())
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Recover the checksummed signer address of an EIP-191 signed `message`.
pub fn recover_signer(message: &str, signature_hex: &str) -> Result<String, AuthError> {
    let signature = parse_signature(signature_hex)?;
    recover_from(message, &signature)
}

/// Decode a hex `r || s || v` signature, rejecting malleable high-s forms.
///
/// v may be 0/1 or 27/28; both decode to the same [`Signature`].
pub fn parse_signature(signature_hex: &str) -> Result<Signature, AuthError> {
    let bytes = alloy::hex::decode(signature_hex.trim()).map_err(|_| AuthError::InvalidSignature)?;
    let signature =
        Signature::try_from(bytes.as_slice()).map_err(|_| AuthError::InvalidSignature)?;
    if signature.normalize_s().is_some() {
        return Err(AuthError::InvalidSignature);
    }
    Ok(signature)
}

fn recover_from(message: &str, signature: &Signature) -> Result<String, AuthError> {
    let address = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|_| AuthError::InvalidSignature)?;
    Ok(address.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::replay::InMemoryReplayStore;
    use crate::test_support::TestWallet;

    const NOW: i64 = 1_760_000_000_000;
    const MINUTE: i64 = 60_000;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(Arc::new(InMemoryReplayStore::new()))
    }

    fn signed(wallet: &TestWallet, scope: Scope, timestamp: i64) -> AuthRequest {
        AuthRequest {
            wallet_address: wallet.address(),
            signature: wallet.sign(scope, timestamp),
            timestamp: Some(timestamp),
            scope,
        }
    }

    #[test]
    fn valid_signature_verifies_exactly_once() {
        let wallet = TestWallet::primary();
        let verifier = verifier();
        let request = signed(&wallet, Scope::Submission, NOW);

        assert_eq!(verifier.verify_at(&request, NOW), Ok(()));
        assert_eq!(
            verifier.verify_at(&request, NOW + 1_000),
            Err(AuthError::SignatureReused)
        );
    }

    #[test]
    fn wallet_case_is_ignored() {
        let wallet = TestWallet::primary();
        let verifier = verifier();
        let mut request = signed(&wallet, Scope::Submission, NOW);
        request.wallet_address = request.wallet_address.to_lowercase();

        assert_eq!(verifier.verify_at(&request, NOW), Ok(()));
    }

    #[test]
    fn stale_and_future_timestamps_are_expired() {
        let wallet = TestWallet::primary();
        let verifier = verifier();

        let stale = signed(&wallet, Scope::Submission, NOW - 6 * MINUTE);
        assert_eq!(verifier.verify_at(&stale, NOW), Err(AuthError::SignatureExpired));

        let future = signed(&wallet, Scope::Submission, NOW + 6 * MINUTE);
        assert_eq!(verifier.verify_at(&future, NOW), Err(AuthError::SignatureExpired));

        // Exactly on the boundary is still accepted
        let edge = signed(&wallet, Scope::Submission, NOW - 5 * MINUTE);
        assert_eq!(verifier.verify_at(&edge, NOW), Ok(()));
    }

    #[test]
    fn missing_fields_are_rejected_before_anything_else() {
        let wallet = TestWallet::primary();
        let verifier = verifier();

        let mut no_sig = signed(&wallet, Scope::Submission, NOW);
        no_sig.signature.clear();
        assert_eq!(verifier.verify_at(&no_sig, NOW), Err(AuthError::MissingSignature));

        let mut no_ts = signed(&wallet, Scope::Submission, NOW);
        no_ts.timestamp = None;
        assert_eq!(verifier.verify_at(&no_ts, NOW), Err(AuthError::MissingSignature));

        assert!(verifier.replay_store().is_empty());
    }

    #[test]
    fn malformed_signature_is_invalid() {
        let wallet = TestWallet::primary();
        let verifier = verifier();
        let mut request = signed(&wallet, Scope::Submission, NOW);
        request.signature = "0xdeadbeef".to_string();

        assert_eq!(verifier.verify_at(&request, NOW), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn signature_from_other_wallet_does_not_match() {
        let signer = TestWallet::primary();
        let other = TestWallet::secondary();
        let verifier = verifier();

        let mut request = signed(&signer, Scope::Submission, NOW);
        request.wallet_address = other.address();

        assert_eq!(verifier.verify_at(&request, NOW), Err(AuthError::WalletMismatch));
        assert!(verifier.replay_store().is_empty());
    }

    #[test]
    fn signature_for_one_scope_fails_for_another() {
        let wallet = TestWallet::primary();
        let verifier = verifier();
        let mut request = signed(&wallet, Scope::Submission, NOW);
        request.scope = Scope::Review;

        // Message differs, so a different address is recovered
        assert_eq!(verifier.verify_at(&request, NOW), Err(AuthError::WalletMismatch));
    }

    #[test]
    fn signature_usable_again_after_window() {
        let wallet = TestWallet::primary();
        let verifier = verifier().with_window(Duration::from_secs(60));
        let request = signed(&wallet, Scope::Review, NOW);

        assert_eq!(verifier.verify_at(&request, NOW), Ok(()));
        // The replay entry has expired, but so has the timestamp
        assert_eq!(
            verifier.verify_at(&request, NOW + 2 * MINUTE),
            Err(AuthError::SignatureExpired)
        );
    }

    #[test]
    fn re_encoded_signature_is_still_a_replay() {
        let wallet = TestWallet::primary();
        let verifier = verifier();
        let request = signed(&wallet, Scope::Submission, NOW);
        assert_eq!(verifier.verify_at(&request, NOW), Ok(()));

        let hex = request.signature.trim_start_matches("0x").to_string();
        let mut bytes = alloy::hex::decode(&hex).unwrap();
        bytes[64] -= 27;
        let variants = [
            format!("0x{}", hex.to_uppercase()),
            hex.clone(),
            format!("  {}  ", request.signature),
            alloy::hex::encode_prefixed(&bytes),
        ];

        for signature in variants {
            let replay = AuthRequest {
                signature: signature.clone(),
                ..request.clone()
            };
            assert_eq!(
                verifier.verify_at(&replay, NOW),
                Err(AuthError::SignatureReused),
                "{signature}"
            );
        }
        assert_eq!(verifier.replay_store().len(), 1);
    }

    #[test]
    fn high_s_signature_is_rejected() {
        use alloy::primitives::U256;

        let order: U256 = "0xfffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"
            .parse()
            .unwrap();
        let wallet = TestWallet::primary();
        let request = signed(&wallet, Scope::Submission, NOW);
        let low = parse_signature(&request.signature).unwrap();
        let high = Signature::new(low.r(), order - low.s(), !low.v());
        assert!(high.normalize_s().is_some());

        let malleated = AuthRequest {
            signature: alloy::hex::encode_prefixed(high.as_bytes()),
            ..request
        };
        let verifier = verifier();
        assert_eq!(verifier.verify_at(&malleated, NOW), Err(AuthError::InvalidSignature));
        assert!(verifier.replay_store().is_empty());
    }

    #[test]
    fn recover_signer_returns_checksummed_address() {
        let wallet = TestWallet::primary();
        let message = build_auth_message(Scope::Submission, &wallet.address(), NOW);
        let signature = wallet.sign(Scope::Submission, NOW);

        assert_eq!(recover_signer(&message, &signature).unwrap(), wallet.address());
    }
}
