// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Wallet signature verification.
//!
//! Login proves control of a wallet by signing the nonce message with the
//! wallet's key (EIP-191 personal sign). Verification recovers the signer
//! address from the signature and compares it to the claimed address. The
//! comparison is on the 20 raw address bytes, so checksum casing never
//! matters. Pure function; no side effects.

use alloy::primitives::{Address, Signature};

use super::error::AuthError;
use crate::models::WalletAddress;

/// Recover the signer of `message` and require it to equal `claimed`.
///
/// Returns the recovered address on success so callers can use the
/// canonical (checksummed) form.
pub fn verify_wallet_signature(
    claimed: &WalletAddress,
    message: &str,
    signature: &str,
) -> Result<Address, AuthError> {
    let claimed_addr: Address = claimed
        .0
        .parse()
        .map_err(|_| AuthError::InvalidAddress)?;

    let sig: Signature = signature
        .parse()
        .map_err(|_| AuthError::MalformedSignature)?;

    // EIP-191 prefixed-message recovery, matching wallet personal_sign.
    let recovered = sig
        .recover_address_from_msg(message)
        .map_err(|_| AuthError::SignatureMismatch)?;

    if recovered == claimed_addr {
        Ok(recovered)
    } else {
        Err(AuthError::SignatureMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    const MESSAGE: &str = "Sign this message to authenticate with AI Prompt Marketplace: 1700000000000";

    fn signed_message(signer: &PrivateKeySigner) -> String {
        let sig = signer
            .sign_message_sync(MESSAGE.as_bytes())
            .expect("signing succeeds");
        format!("0x{}", alloy::hex::encode(sig.as_bytes()))
    }

    #[test]
    fn accepts_signature_from_claimed_address() {
        let signer = PrivateKeySigner::random();
        let claimed = WalletAddress::from(signer.address().to_string());
        let signature = signed_message(&signer);

        let recovered = verify_wallet_signature(&claimed, MESSAGE, &signature)
            .expect("valid signature verifies");
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn address_comparison_is_case_insensitive() {
        let signer = PrivateKeySigner::random();
        let lowercase = WalletAddress::from(signer.address().to_string().to_lowercase());
        let signature = signed_message(&signer);

        assert!(verify_wallet_signature(&lowercase, MESSAGE, &signature).is_ok());
    }

    #[test]
    fn rejects_signature_from_different_key() {
        let signer = PrivateKeySigner::random();
        let other = PrivateKeySigner::random();
        let claimed = WalletAddress::from(other.address().to_string());
        let signature = signed_message(&signer);

        assert_eq!(
            verify_wallet_signature(&claimed, MESSAGE, &signature),
            Err(AuthError::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_signature_over_different_message() {
        let signer = PrivateKeySigner::random();
        let claimed = WalletAddress::from(signer.address().to_string());
        let signature = signed_message(&signer);

        assert_eq!(
            verify_wallet_signature(&claimed, "a different message", &signature),
            Err(AuthError::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_malformed_inputs() {
        let signer = PrivateKeySigner::random();
        let claimed = WalletAddress::from(signer.address().to_string());

        assert_eq!(
            verify_wallet_signature(&claimed, MESSAGE, "0xnothex"),
            Err(AuthError::MalformedSignature)
        );
        assert_eq!(
            verify_wallet_signature(&WalletAddress::from("not-an-address"), MESSAGE, "0x00"),
            Err(AuthError::InvalidAddress)
        );
    }
}
