//! Deferred operations: queue steps and a finish on a tokio `LocalSet`,
//! cancel one of them, and let the rest complete in order.
//!
//! Run with:
//!   cargo run --example deferred_ops -p cipherflow

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use cipherflow::{Cipher, CipherAlgorithm, Key, KeyKind, SharedBlock};
use tokio::task::LocalSet;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let key = Arc::new(Key::generate_aes(KeyKind::Aes128).expect("key generation"));
    let cipher = Cipher::new(CipherAlgorithm::AesCtrEncrypt, key).expect("cipher");
    let local = LocalSet::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    // ── 1. Queue three steps and a finish ───────────────────────────────────
    //
    // Nothing runs yet: each call only returns a handle.
    let mut handles = Vec::new();
    for i in 0..3u8 {
        let out: SharedBlock = Rc::default();
        let (o, l) = (out.clone(), log.clone());
        let handle = cipher
            .step_async(&local, &[i; 16], out, move |r| {
                let n = r.expect("step");
                l.borrow_mut()
                    .push(format!("step {i}: {}", hex::encode(&o.borrow()[..n])));
            })
            .expect("schedule step");
        handles.push(handle);
    }
    let l = log.clone();
    let finish = cipher
        .finish_async(&local, b"tail", None, move |r| {
            l.borrow_mut().push(format!("finish: {} bytes", r.expect("finish")));
        })
        .expect("schedule finish");
    println!("Queued {} operations", cipher.pending_operations());

    // ── 2. Cancel the middle step ───────────────────────────────────────────
    //
    // A cancelled operation never runs and never calls back. The counter
    // does not advance for it, so the remaining steps chain as if it had
    // never been queued.
    let cancelled = handles[1].id();
    assert!(cipher.cancel(cancelled));
    println!("Cancelled {cancelled}");
    println!("  Finish {} still pending: {}", finish.id(), finish.is_pending());
    println!();

    // ── 3. Drive the loop ───────────────────────────────────────────────────
    local.await;
    for line in log.borrow().iter() {
        println!("  {line}");
    }
    println!();

    println!("All operations completed successfully.");
}
