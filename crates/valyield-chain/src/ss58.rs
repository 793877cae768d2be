//! SS58 address encoding utilities.

use crate::error::ChainError;
use subxt::utils::AccountId32;
use valyield_core::ValidatorId;

const SS58_PREFIX: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut checksum_input = Vec::with_capacity(SS58_PREFIX.len() + payload.len());
    checksum_input.extend_from_slice(SS58_PREFIX);
    checksum_input.extend_from_slice(payload);

    let hash = sp_crypto_hashing::blake2_512(&checksum_input);
    [hash[0], hash[1]]
}

/// Encode an AccountId32 with a specific SS58 prefix.
pub fn encode_ss58(account: &AccountId32, prefix: u16) -> String {
    let account_bytes: &[u8; 32] = account.as_ref();

    let mut payload = Vec::with_capacity(2 + 32 + CHECKSUM_LEN);

    if prefix < 64 {
        payload.push(prefix as u8);
    } else if prefix < 16384 {
        // Two-byte encoding for larger prefixes
        let first = ((prefix & 0x00FC) >> 2) as u8 | 0x40;
        let second = ((prefix >> 8) as u8) | ((prefix & 0x03) << 6) as u8;
        payload.push(first);
        payload.push(second);
    } else {
        // Unsupported prefix, fall back to generic
        payload.push(42);
    }

    payload.extend_from_slice(account_bytes);
    let sum = checksum(&payload);
    payload.extend_from_slice(&sum);

    bs58::encode(payload).into_string()
}

/// Decode and checksum-verify an SS58 address, returning the account and its prefix.
pub fn decode_ss58(address: &str) -> Result<(AccountId32, u16), ChainError> {
    let invalid = |reason: &str| {
        ChainError::InvalidArgument(format!("Invalid SS58 address '{}': {}", address, reason))
    };

    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|_| invalid("not base58"))?;

    let (prefix, prefix_len) = match bytes.first() {
        Some(&b) if b < 64 => (b as u16, 1),
        Some(&b) if b < 128 => {
            let second = *bytes.get(1).ok_or_else(|| invalid("truncated prefix"))?;
            let lower = ((b & 0x3F) << 2) | (second >> 6);
            let upper = second & 0x3F;
            (lower as u16 | ((upper as u16) << 8), 2)
        }
        Some(_) => return Err(invalid("reserved prefix")),
        None => return Err(invalid("empty")),
    };

    if bytes.len() != prefix_len + 32 + CHECKSUM_LEN {
        return Err(invalid("wrong length"));
    }

    let body_end = bytes.len() - CHECKSUM_LEN;
    if checksum(&bytes[..body_end]) != bytes[body_end..] {
        return Err(invalid("bad checksum"));
    }

    let account_bytes: [u8; 32] = bytes[prefix_len..body_end]
        .try_into()
        .map_err(|_| invalid("wrong length"))?;

    Ok((AccountId32::from(account_bytes), prefix))
}

/// Resolve a validator id to its on-chain account.
pub fn validator_account(id: &ValidatorId) -> Result<AccountId32, ChainError> {
    decode_ss58(id.as_str()).map(|(account, _)| account)
}

/// Encode an account as a validator id for the given network prefix.
pub fn validator_id(account: &AccountId32, prefix: u16) -> ValidatorId {
    ValidatorId::new(encode_ss58(account, prefix))
}
