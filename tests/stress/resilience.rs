//! Resilience tests: tampered ciphertext, failing sinks, bad key material.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::Arc;

use cipherflow::{
    cipher_bytes, digest_data, Cipher, CipherAlgorithm, CryptoError, Digest, DigestAlgorithm, Key,
    KeyKind, ManualScheduler, SharedOutput,
};

/// Sink that accepts `limit` bytes and then fails.
struct FailingSink {
    accepted: Vec<u8>,
    limit: usize,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.accepted.len() + buf.len() > self.limit {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "sink full"));
        }
        self.accepted.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn resilience_tampered_rsa_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("sealed.bin");
    let private = Arc::new(Key::generate_rsa(1024).unwrap());
    let public = Arc::new(private.public_key().unwrap());

    let ct = cipher_bytes(CipherAlgorithm::RsaEncrypt, public, b"sealed payload").unwrap();
    std::fs::write(&path, &ct).unwrap();

    // Flip bytes in the middle of the block.
    let mut data = std::fs::read(&path).unwrap();
    for byte in data.iter_mut().skip(40).take(10) {
        *byte ^= 0xff;
    }
    std::fs::write(&path, &data).unwrap();

    let tampered = std::fs::read(&path).unwrap();
    let err = cipher_bytes(CipherAlgorithm::RsaDecrypt, private, &tampered).unwrap_err();
    assert!(matches!(err, CryptoError::Backend(_)), "got {err}");
}

#[test]
fn resilience_tampered_signature_block_detected() {
    let private = Arc::new(Key::generate_rsa(1024).unwrap());
    let public = Arc::new(private.public_key().unwrap());
    let mut ct = cipher_bytes(CipherAlgorithm::RsaEncrypt, private, b"signed").unwrap();
    ct[0] ^= 0x01;
    ct[64] ^= 0x80;
    let err = cipher_bytes(CipherAlgorithm::RsaDecrypt, public, &ct).unwrap_err();
    assert!(matches!(err, CryptoError::Backend(_)));
}

#[test]
fn resilience_tampered_aes_changes_only_local_blocks() {
    let key = Arc::new(Key::generate_aes(KeyKind::Aes128).unwrap());
    let message = vec![0x11u8; 64];
    let mut ct = cipher_bytes(CipherAlgorithm::AesCbcEncrypt, key.clone(), &message).unwrap();
    ct[20] ^= 0x01;
    let pt = cipher_bytes(CipherAlgorithm::AesCbcDecrypt, key, &ct).unwrap();
    // CBC: the hit block is garbled, the next one has a single flipped bit.
    assert_eq!(&pt[..16], &message[..16]);
    assert_ne!(&pt[16..32], &message[16..32]);
    assert_eq!(pt[36], message[36] ^ 0x01);
    assert_eq!(&pt[48..], &message[48..]);
}

#[test]
fn resilience_failing_sink_reports_io() {
    let key = Arc::new(Key::generate_aes(KeyKind::Aes256).unwrap());
    let mut cipher = Cipher::new(CipherAlgorithm::AesCtrEncrypt, key).unwrap();
    let mut sink = FailingSink {
        accepted: Vec::new(),
        limit: 48,
    };
    let mut digest = Digest::new(DigestAlgorithm::Sha256);
    let err = cipher
        .write_data(&[0u8; 100], &mut sink, Some(&mut digest))
        .unwrap_err();
    assert!(matches!(err, CryptoError::Io(ref e) if e.kind() == io::ErrorKind::StorageFull));
    assert_eq!(sink.accepted.len(), 48);
}

#[test]
fn resilience_failing_sink_async() {
    let sched = ManualScheduler::new();
    let key = Arc::new(Key::generate_aes(KeyKind::Aes128).unwrap());
    let cipher = Cipher::new(CipherAlgorithm::AesEcbEncrypt, key).unwrap();
    let sink: SharedOutput = Rc::new(RefCell::new(FailingSink {
        accepted: Vec::new(),
        limit: 0,
    }));
    let outcome = Rc::new(RefCell::new(None));

    let o = outcome.clone();
    cipher
        .write_data_async(&sched, b"some data", Some(sink), None, move |r| {
            *o.borrow_mut() = Some(r.is_err())
        })
        .unwrap();
    sched.run_until_idle();
    assert_eq!(*outcome.borrow(), Some(true));
}

#[test]
fn resilience_bad_key_material() {
    for len in [0usize, 15, 17, 31, 33] {
        assert!(matches!(
            Key::aes_from_bytes(KeyKind::Aes128, &vec![0u8; len]),
            Err(CryptoError::InvalidKey(_))
        ));
    }
    assert!(matches!(
        Key::aes_from_bytes(KeyKind::RsaPublic, &[0u8; 16]),
        Err(CryptoError::InvalidKey(_))
    ));
    assert!(Key::aes_from_bytes(KeyKind::Aes128, &[0u8; 32]).is_ok());
    assert!(Key::aes_from_bytes(KeyKind::Aes256, &[0u8; 48]).is_ok());
}

#[test]
fn resilience_cipher_survives_rejected_block() {
    let private = Arc::new(Key::generate_rsa(1024).unwrap());
    let public = Arc::new(private.public_key().unwrap());
    let mut dec = Cipher::new(CipherAlgorithm::RsaDecrypt, private).unwrap();
    let mut out = vec![0u8; 128];

    assert!(dec.step(&[0xffu8; 128], &mut out).is_err());

    // A good block after a bad one still decrypts.
    let ct = cipher_bytes(CipherAlgorithm::RsaEncrypt, public, b"after failure").unwrap();
    let n = dec.step(&ct, &mut out).unwrap();
    assert_eq!(&out[..n], b"after failure");
}

#[test]
fn resilience_rejected_tail_not_hashed() {
    let private = Arc::new(Key::generate_rsa(1024).unwrap());
    let public = Arc::new(private.public_key().unwrap());
    let ct = cipher_bytes(CipherAlgorithm::RsaEncrypt, public, b"first block").unwrap();
    assert_eq!(ct.len(), 128);

    let mut input = ct.clone();
    input.extend_from_slice(&[1, 2, 3, 4, 5]);

    let mut dec = Cipher::new(CipherAlgorithm::RsaDecrypt, private).unwrap();
    let mut digest = Digest::new(DigestAlgorithm::Sha256);
    let mut out = Vec::new();
    let err = dec.write_data(&input, &mut out, Some(&mut digest)).unwrap_err();
    assert!(matches!(
        err,
        CryptoError::BlockSize {
            expected: 128,
            actual: 5
        }
    ));

    // Only the block the cipher accepted was hashed.
    assert_eq!(out, b"first block");
    assert_eq!(digest.finish(), &digest_data(DigestAlgorithm::Sha256, &ct)[..]);
}
