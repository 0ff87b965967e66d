//! Content identifiers.

use sha2::{Digest, Sha256};

/// Multibase prefix `f` (base16) + CIDv1 + `raw` codec + sha2-256 multihash header.
const CID_V1_RAW_SHA256_PREFIX: &str = "f01551220";

/// Computes the CIDv1 (raw codec, sha2-256, base16) of `bytes`.
#[must_use]
pub fn content_id(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{CID_V1_RAW_SHA256_PREFIX}{}", hex::encode(digest))
}

/// `ipfs://<cid>`
#[must_use]
pub fn ipfs_uri(cid: &str) -> String {
    format!("ipfs://{cid}")
}

/// `<gateway>/ipfs/<cid>`
#[must_use]
pub fn gateway_uri(gateway: &str, cid: &str) -> String {
    format!("{}/ipfs/{cid}", gateway.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_of_empty_input() {
        assert_eq!(
            content_id(b""),
            "f01551220e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_content_id_is_stable() {
        assert_eq!(content_id(b"{\"name\":\"x\"}"), content_id(b"{\"name\":\"x\"}"));
        assert_ne!(content_id(b"a"), content_id(b"b"));
    }

    #[test]
    fn test_uris() {
        assert_eq!(ipfs_uri("f0155"), "ipfs://f0155");
        assert_eq!(gateway_uri("https://nftstorage.link/", "bafy"), "https://nftstorage.link/ipfs/bafy");
    }
}
