//! Local recovery of the signer of a returned signature.
//!
//! Wallets sign without telling what they hashed, so recovering the signer locally is the only
//! way to tell whether a signature matches the displayed payload.

use crate::signing::SignOperation;
use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, B256, Signature};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid signature: {0}")]
    Signature(#[from] alloy_primitives::SignatureError),
    #[error("invalid typed data: {0}")]
    TypedData(String),
}

/// The EIP-712 signing hash of a v3/v4 payload.
pub fn typed_data_digest(text: &str) -> Result<B256, VerifyError> {
    let typed_data: TypedData =
        serde_json::from_str(text).map_err(|err| VerifyError::TypedData(err.to_string()))?;
    typed_data.eip712_signing_hash().map_err(|err| VerifyError::TypedData(err.to_string()))
}

/// Recovers the address that produced `signature` over the payload `text`.
///
/// Returns `Ok(None)` for legacy typed data, whose hashing scheme is not supported.
pub fn recover_signer(
    operation: SignOperation,
    text: &str,
    signature: &str,
) -> Result<Option<Address>, VerifyError> {
    let signature = Signature::from_str(signature)?;
    let signer = match operation {
        SignOperation::PersonalSign => signature.recover_address_from_msg(text.as_bytes())?,
        SignOperation::TypedDataV4 | SignOperation::TypedDataV3 => {
            signature.recover_address_from_prehash(&typed_data_digest(text)?)?
        }
        SignOperation::TypedDataLegacy => return Ok(None),
    };
    Ok(Some(signer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples;
    use alloy_primitives::{b256, hex};

    #[test]
    fn mail_digest_matches_eip712_reference() {
        // Reference vector from the EIP-712 specification, where the sender is named "Cow".
        let mut mail = samples::typed_data_v4();
        mail["message"]["from"]["name"] = "Cow".into();
        let text = samples::to_editor_text(&mail);
        assert_eq!(
            typed_data_digest(&text).unwrap(),
            b256!("0xbe609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2")
        );
    }

    #[test]
    fn digest_follows_chain_id() {
        let mut mail = samples::typed_data_v4();
        let mainnet = typed_data_digest(&mail.to_string()).unwrap();
        mail["domain"]["chainId"] = 137.into();
        assert_ne!(typed_data_digest(&mail.to_string()).unwrap(), mainnet);
    }

    #[test]
    fn legacy_is_not_recovered() {
        let sig = hex::encode_prefixed([1u8; 65]);
        let text = samples::to_editor_text(&samples::typed_data_legacy());
        assert!(matches!(
            recover_signer(SignOperation::TypedDataLegacy, &text, &sig),
            Ok(None) | Err(VerifyError::Signature(_))
        ));
    }

    #[test]
    fn rejects_garbage_signatures() {
        assert!(matches!(
            recover_signer(SignOperation::PersonalSign, "hello", "0xsig"),
            Err(VerifyError::Signature(_))
        ));
    }
}
