use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::enums::ProtocolVersion;

/// P_hash, as defined in RFC 2246 section 5.
fn p_hash<M: Mac + Clone>(out: &mut [u8], hmac_key: &M, seed: &[u8]) {
    // A(1)
    let mut current_a = {
        let mut ctx = hmac_key.clone();
        ctx.update(seed);
        ctx.finalize().into_bytes()
    };

    let mut offset = 0;
    while offset < out.len() {
        // P_hash[i] = HMAC_hash(secret, A(i) + seed)
        let mut ctx = hmac_key.clone();
        ctx.update(&current_a);
        ctx.update(seed);
        let p_term = ctx.finalize().into_bytes();

        let todo = core::cmp::min(p_term.len(), out.len() - offset);
        out[offset..offset + todo].copy_from_slice(&p_term[..todo]);
        offset += todo;

        // A(i+1) = HMAC_hash(secret, A(i))
        let mut ctx = hmac_key.clone();
        ctx.update(&current_a);
        current_a = ctx.finalize().into_bytes();
    }
}

fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut ret = Vec::with_capacity(a.len() + b.len());
    ret.extend_from_slice(a);
    ret.extend_from_slice(b);
    ret
}

/// The TLS 1.0/1.1 PRF: P_MD5 over the first half of the secret, xored
/// with P_SHA1 over the second half (RFC 2246 section 5).
pub(crate) fn prf_tls10(out: &mut [u8], secret: &[u8], label: &[u8], seed: &[u8]) {
    let joined_seed = concat(label, seed);

    let half = (secret.len() + 1) / 2;
    let md5_key = Hmac::<Md5>::new_from_slice(&secret[..half]).unwrap();
    let sha1_key = Hmac::<Sha1>::new_from_slice(&secret[secret.len() - half..]).unwrap();

    p_hash(out, &md5_key, &joined_seed);

    let mut sha1_out = vec![0u8; out.len()];
    p_hash(&mut sha1_out, &sha1_key, &joined_seed);

    for (o, s) in out.iter_mut().zip(sha1_out.iter()) {
        *o ^= s;
    }
    sha1_out.zeroize();
}

/// The TLS 1.2 PRF: P_SHA256 (RFC 5246 section 5).
///
/// None of the catalogued suites select a different PRF hash.
pub(crate) fn prf_tls12(out: &mut [u8], secret: &[u8], label: &[u8], seed: &[u8]) {
    let hmac_key = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    p_hash(out, &hmac_key, &concat(label, seed));
}

/// The SSL 3.0 key-material generator: 16-byte blocks of
/// `MD5(secret || SHA1(salt || secret || seed))` with salts "A", "BB",
/// "CCC", ...
pub(crate) fn ssl3_generate(out: &mut [u8], secret: &[u8], seed: &[u8]) {
    debug_assert!(out.len() <= 26 * 16);

    for (i, chunk) in out.chunks_mut(16).enumerate() {
        let salt = vec![b'A' + i as u8; i + 1];

        let mut sha1 = Sha1::new();
        sha1.update(&salt);
        sha1.update(secret);
        sha1.update(seed);
        let inner = sha1.finalize();

        let mut md5 = Md5::new();
        md5.update(secret);
        md5.update(inner);
        let block = md5.finalize();

        chunk.copy_from_slice(&block[..chunk.len()]);
    }
}

/// Version-selected PRF over the master secret, used for the key block
/// and the `Finished` verify data.
pub(crate) fn prf(
    version: ProtocolVersion,
    out: &mut [u8],
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
) {
    match version {
        ProtocolVersion::SSLv3 => ssl3_generate(out, secret, seed),
        ProtocolVersion::TLSv1_0 | ProtocolVersion::TLSv1_1 => {
            prf_tls10(out, secret, label, seed)
        }
        ProtocolVersion::TLSv1_2 => prf_tls12(out, secret, label, seed),
        ProtocolVersion::Unknown(_) => unreachable!(),
    }
}

/// The key material derived at the end of the handshake: the master
/// secret plus the per-direction keys, MAC keys and IVs, already
/// partitioned per RFC 5246 section 6.3.
pub(crate) struct KeyBlock {
    pub(crate) master_secret: [u8; 48],
    pub(crate) client_mac: Vec<u8>,
    pub(crate) server_mac: Vec<u8>,
    pub(crate) client_key: Vec<u8>,
    pub(crate) server_key: Vec<u8>,
    pub(crate) client_iv: Vec<u8>,
    pub(crate) server_iv: Vec<u8>,
}

impl KeyBlock {
    /// Swap the two directions. The cipher factory builds a client-side
    /// pair; a swapped block yields the server's view of the same keys.
    #[cfg(test)]
    pub(crate) fn swapped(&self) -> Self {
        Self {
            master_secret: self.master_secret,
            client_mac: self.server_mac.clone(),
            server_mac: self.client_mac.clone(),
            client_key: self.server_key.clone(),
            server_key: self.client_key.clone(),
            client_iv: self.server_iv.clone(),
            server_iv: self.client_iv.clone(),
        }
    }
}

impl Drop for KeyBlock {
    fn drop(&mut self) {
        self.master_secret.zeroize();
        self.client_mac.zeroize();
        self.server_mac.zeroize();
        self.client_key.zeroize();
        self.server_key.zeroize();
        self.client_iv.zeroize();
        self.server_iv.zeroize();
    }
}

/// Convert the premaster secret and both randoms into the master secret
/// and a partitioned key block, using the version's PRF.
pub(crate) fn keys_from_premaster_secret(
    version: ProtocolVersion,
    premaster: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    key_len: usize,
    mac_len: usize,
    iv_len: usize,
) -> KeyBlock {
    let mut master_secret = [0u8; 48];
    prf(
        version,
        &mut master_secret,
        premaster,
        b"master secret",
        &concat(client_random, server_random),
    );

    // NOTE: opposite order of randoms to the master secret derivation.
    let mut key_material = vec![0u8; (mac_len + key_len + iv_len) * 2];
    prf(
        version,
        &mut key_material,
        &master_secret,
        b"key expansion",
        &concat(server_random, client_random),
    );

    let (client_mac, rest) = key_material.split_at(mac_len);
    let (server_mac, rest) = rest.split_at(mac_len);
    let (client_key, rest) = rest.split_at(key_len);
    let (server_key, rest) = rest.split_at(key_len);
    let (client_iv, server_iv) = rest.split_at(iv_len);

    let kb = KeyBlock {
        master_secret,
        client_mac: client_mac.to_vec(),
        server_mac: server_mac.to_vec(),
        client_key: client_key.to_vec(),
        server_key: server_key.to_vec(),
        client_iv: client_iv.to_vec(),
        server_iv: server_iv.to_vec(),
    };

    key_material.zeroize();
    kb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_tls12_sha256() {
        // Public PRF test vector from the IETF TLS working group.
        let secret = b"\x9b\xbe\x43\x6b\xa9\x40\xf0\x17\xb1\x76\x52\x84\x9a\x71\xdb\x35";
        let seed = b"\xa0\xba\x9f\x93\x6c\xda\x31\x18\x27\xa6\xf7\x96\xff\xd5\x19\x8c";
        let label = b"test label";
        let expect: &[u8] = &[
            0xe3, 0xf2, 0x29, 0xba, 0x72, 0x7b, 0xe1, 0x7b, 0x8d, 0x12, 0x26, 0x20, 0x55, 0x7c,
            0xd4, 0x53, 0xc2, 0xaa, 0xb2, 0x1d, 0x07, 0xc3, 0xd4, 0x95, 0x32, 0x9b, 0x52, 0xd4,
            0xe6, 0x1e, 0xdb, 0x5a, 0x6b, 0x30, 0x17, 0x91, 0xe9, 0x0d, 0x35, 0xc9, 0xc9, 0xa4,
            0x6b, 0x4e, 0x14, 0xba, 0xf9, 0xaf, 0x0f, 0xa0, 0x22, 0xf7, 0x07, 0x7d, 0xef, 0x17,
            0xab, 0xfd, 0x37, 0x97, 0xc0, 0x56, 0x4b, 0xab, 0x4f, 0xbc, 0x91, 0x66, 0x6e, 0x9d,
            0xef, 0x9b, 0x97, 0xfc, 0xb6, 0x2f, 0x5e, 0xd1, 0x3d, 0x9b, 0x62, 0xff, 0x12, 0xab,
            0xde, 0x0c, 0x8b, 0x52, 0xa0, 0xb8, 0xf8, 0xac, 0x9b, 0xe2, 0xd1, 0xfc,
        ];

        let mut output = [0u8; 100];
        prf_tls12(&mut output, secret, label, seed);
        assert_eq!(expect, &output[..]);
    }

    #[test]
    fn key_block_partition() {
        let premaster = [0x0bu8; 48];
        let client_random = [0x01u8; 32];
        let server_random = [0x02u8; 32];

        let kb = keys_from_premaster_secret(
            ProtocolVersion::TLSv1_2,
            &premaster,
            &client_random,
            &server_random,
            16,
            20,
            16,
        );

        assert_eq!(kb.client_mac.len(), 20);
        assert_eq!(kb.server_mac.len(), 20);
        assert_eq!(kb.client_key.len(), 16);
        assert_eq!(kb.server_key.len(), 16);
        assert_eq!(kb.client_iv.len(), 16);
        assert_eq!(kb.server_iv.len(), 16);
        assert_ne!(kb.client_key, kb.server_key);
        assert_ne!(kb.master_secret, [0u8; 48]);
    }

    #[test]
    fn derivation_is_deterministic_per_version() {
        let premaster = [0x42u8; 48];
        let cr = [0x11u8; 32];
        let sr = [0x22u8; 32];

        for version in [
            ProtocolVersion::SSLv3,
            ProtocolVersion::TLSv1_0,
            ProtocolVersion::TLSv1_1,
            ProtocolVersion::TLSv1_2,
        ] {
            let a = keys_from_premaster_secret(version, &premaster, &cr, &sr, 16, 20, 16);
            let b = keys_from_premaster_secret(version, &premaster, &cr, &sr, 16, 20, 16);
            assert_eq!(a.master_secret, b.master_secret);
            assert_eq!(a.client_key, b.client_key);
        }

        let tls10 = keys_from_premaster_secret(ProtocolVersion::TLSv1_0, &premaster, &cr, &sr, 16, 20, 16);
        let tls12 = keys_from_premaster_secret(ProtocolVersion::TLSv1_2, &premaster, &cr, &sr, 16, 20, 16);
        assert_ne!(tls10.master_secret, tls12.master_secret);
    }
}
