//! Stress tests: boundary conditions across digests and ciphers.

use std::sync::Arc;

use cipherflow::{
    cipher_bytes, digest_data, digest_data_into, Cipher, CipherAlgorithm, CryptoError, Digest,
    DigestAlgorithm, Direction, Key, KeyKind,
};

fn aes_key(kind: KeyKind) -> Arc<Key> {
    Arc::new(Key::generate_aes(kind).unwrap())
}

// ── Digests ─────────────────────────────────────────────────────────────────

#[test]
fn edge_digest_update_after_finish() {
    let mut d = Digest::new(DigestAlgorithm::Sha256);
    d.update(b"abc").unwrap();
    let first = d.finish().to_vec();
    assert!(matches!(d.update(b"more"), Err(CryptoError::AlreadyFinished)));
    assert!(matches!(
        d.update_scattered(&[&b"x"[..], &b"y"[..]]),
        Err(CryptoError::AlreadyFinished)
    ));
    // Finish is idempotent and the failed updates changed nothing.
    assert_eq!(d.finish(), &first[..]);
}

#[test]
fn edge_digest_reset_after_finish() {
    let mut d = Digest::new(DigestAlgorithm::Md5);
    d.update(b"garbage").unwrap();
    d.finish();
    d.reset();
    assert!(!d.is_finished());
    d.update(b"abc").unwrap();
    assert_eq!(d.finish_hex(), "900150983cd24fb0d6963f7d28e17f72");
}

#[test]
fn edge_digest_empty_updates() {
    let mut d = Digest::new(DigestAlgorithm::Sha1);
    for _ in 0..100 {
        d.update(&[]).unwrap();
    }
    d.update_scattered(&[]).unwrap();
    assert_eq!(d.finish(), &digest_data(DigestAlgorithm::Sha1, &[])[..]);
}

#[test]
fn edge_digest_copy_mismatch_leaves_target() {
    let mut sha = Digest::new(DigestAlgorithm::Sha256);
    sha.update(b"abc").unwrap();
    let md5 = Digest::new(DigestAlgorithm::Md5);
    assert!(matches!(sha.copy_from(&md5), Err(CryptoError::AlgorithmMismatch)));
    assert_eq!(
        sha.finish_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn edge_digest_copy_finished_source() {
    let mut source = Digest::new(DigestAlgorithm::Sha1);
    source.update(b"abc").unwrap();
    source.finish();
    let mut target = Digest::new(DigestAlgorithm::Sha1);
    target.update(b"unrelated").unwrap();
    target.copy_from(&source).unwrap();
    assert!(target.is_finished());
    assert_eq!(target.finish_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
}

#[test]
fn edge_digest_into_small_buffer() {
    let mut out = [0u8; 31];
    let err = digest_data_into(DigestAlgorithm::Sha256, b"abc", &mut out).unwrap_err();
    assert!(matches!(
        err,
        CryptoError::BufferTooSmall {
            needed: 32,
            actual: 31
        }
    ));
    let mut out = [0u8; 40];
    assert_eq!(
        digest_data_into(DigestAlgorithm::Sha256, b"abc", &mut out).unwrap(),
        32
    );
}

// ── Ciphers ─────────────────────────────────────────────────────────────────

#[test]
fn edge_unsupported_key_pairings() {
    let aes = aes_key(KeyKind::Aes192);
    let rsa = Arc::new(Key::generate_rsa(1024).unwrap());
    for alg in CipherAlgorithm::ALL {
        let key = if alg.is_symmetric() { &rsa } else { &aes };
        let err = Cipher::new(alg, Arc::clone(key)).unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedKey { .. }), "{alg}");
    }
}

#[test]
fn edge_empty_input_produces_nothing() {
    for alg in CipherAlgorithm::ALL.into_iter().filter(|a| a.is_symmetric()) {
        let ct = cipher_bytes(alg, aes_key(KeyKind::Aes128), &[]).unwrap();
        assert!(ct.is_empty(), "{alg}");
    }
}

#[test]
fn edge_finish_full_block_equals_step() {
    let key = aes_key(KeyKind::Aes256);
    let block = [0x77u8; 16];
    let mut a = Cipher::new(CipherAlgorithm::AesCbcEncrypt, key.clone()).unwrap();
    let mut b = Cipher::new(CipherAlgorithm::AesCbcEncrypt, key).unwrap();
    let (mut out_a, mut out_b) = ([0u8; 16], [0u8; 16]);
    assert_eq!(a.step(&block, &mut out_a).unwrap(), 16);
    assert_eq!(b.finish(&block, &mut out_b).unwrap(), 16);
    assert_eq!(out_a, out_b);
}

#[test]
fn edge_step_size_checks() {
    let mut cipher = Cipher::new(CipherAlgorithm::AesEcbEncrypt, aes_key(KeyKind::Aes128)).unwrap();
    let mut out = [0u8; 16];
    for len in [0usize, 1, 15, 17, 32] {
        let input = vec![0u8; len];
        assert!(
            matches!(
                cipher.step(&input, &mut out),
                Err(CryptoError::BlockSize { expected: 16, .. })
            ),
            "len {len}"
        );
    }
    let mut short = [0u8; 8];
    assert!(matches!(
        cipher.step(&[0u8; 16], &mut short),
        Err(CryptoError::BlockSize { .. })
    ));
}

#[test]
fn edge_zero_padding_is_decryptable() {
    let key = aes_key(KeyKind::Aes128);
    let mut enc = Cipher::new(CipherAlgorithm::AesCbcEncrypt, key.clone()).unwrap();
    enc.set_padding_func(Some(cipherflow::cipher::padding::zero_padding))
        .unwrap();
    let ct = enc.process(b"short message").unwrap();
    let pt = cipher_bytes(CipherAlgorithm::AesCbcDecrypt, key, &ct).unwrap();
    assert_eq!(&pt[..13], b"short message");
    assert!(pt[13..].iter().all(|&b| b == 0));
}

#[test]
fn edge_padding_reset_to_default() {
    let key = aes_key(KeyKind::Aes128);
    let mut cipher = Cipher::new(CipherAlgorithm::AesEcbEncrypt, key).unwrap();
    cipher.set_padding_with(|block, filled| block[filled..].fill(0)).unwrap();
    let a = cipher.clone().process(b"x").unwrap();
    let b = cipher.clone().process(b"x").unwrap();
    assert_eq!(a, b);

    // Back to random padding: two tails almost surely differ.
    cipher.set_padding_func(None).unwrap();
    let a = cipher.clone().process(b"x").unwrap();
    let b = cipher.clone().process(b"x").unwrap();
    assert_ne!(a, b);
}

#[test]
fn edge_rsa_rejects_custom_padding() {
    let key = Arc::new(Key::generate_rsa(1024).unwrap());
    let mut cipher = Cipher::new(CipherAlgorithm::RsaEncrypt, key).unwrap();
    assert!(matches!(
        cipher.set_padding_func(None),
        Err(CryptoError::PaddingUnsupported(_))
    ));
    assert!(matches!(
        cipher.set_padding_with(|_, _| {}),
        Err(CryptoError::PaddingUnsupported(_))
    ));
}

#[test]
fn edge_clone_diverges_from_original() {
    let key = aes_key(KeyKind::Aes128);
    let mut original = Cipher::new(CipherAlgorithm::AesCtrEncrypt, key.clone()).unwrap();
    let mut out = [0u8; 16];
    original.step(&[0u8; 16], &mut out).unwrap();

    let mut copy = original.clone();
    let (mut from_orig, mut from_copy) = ([0u8; 16], [0u8; 16]);
    original.step(&[1u8; 16], &mut from_orig).unwrap();
    copy.step(&[1u8; 16], &mut from_copy).unwrap();
    assert_eq!(from_orig, from_copy);

    // Advancing one does not move the other.
    original.step(&[2u8; 16], &mut from_orig).unwrap();
    let mut behind = [0u8; 16];
    copy.step(&[2u8; 16], &mut behind).unwrap();
    assert_eq!(from_orig, behind);
    original.step(&[2u8; 16], &mut from_orig).unwrap();
    assert_ne!(from_orig, behind);
    assert_eq!(Arc::strong_count(&key), 3);
}

// ── Names and tags ──────────────────────────────────────────────────────────

#[test]
fn edge_names_and_tags_parse_back() {
    for alg in CipherAlgorithm::ALL {
        assert_eq!(alg.as_tag().parse::<CipherAlgorithm>().unwrap(), alg);
        assert_eq!(alg.name().parse::<CipherAlgorithm>().unwrap(), alg);
        let json = serde_json::to_string(&alg).unwrap();
        assert_eq!(json, format!("\"{}\"", alg.as_tag()));
    }
    for alg in DigestAlgorithm::ALL {
        assert_eq!(alg.to_string().parse::<DigestAlgorithm>().unwrap(), alg);
    }
    assert_eq!(
        serde_json::to_string(&Direction::Decrypt).unwrap(),
        "\"decrypt\""
    );
    assert!(matches!(
        "aes-gcm-encrypt".parse::<CipherAlgorithm>(),
        Err(CryptoError::UnknownAlgorithm(_))
    ));
}
