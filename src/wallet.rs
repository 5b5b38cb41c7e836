/// Solana-style address check: base58 string decoding to exactly 32 raw bytes.
/// Format-only; no on-chain existence lookup.
pub fn is_valid_address(address: &str) -> bool {
    match bs58::decode(address.trim()).into_vec() {
        Ok(bytes) => bytes.len() == 32,
        Err(_) => false,
    }
}
