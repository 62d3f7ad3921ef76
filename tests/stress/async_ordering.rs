//! Stress tests: ordering and cancellation of many deferred operations.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use cipherflow::{
    Cipher, CipherAlgorithm, Key, KeyKind, ManualScheduler, OperationHandle, SharedBlock,
};
use tokio::task::LocalSet;

fn key() -> Arc<Key> {
    Arc::new(Key::aes_from_bytes(KeyKind::Aes256, &[0x42u8; 48]).unwrap())
}

/// Schedule `count` single-block steps over `blocks` and return the outputs
/// in callback order.
fn schedule_steps(
    cipher: &Cipher,
    scheduler: &dyn cipherflow::Scheduler,
    blocks: &[[u8; 16]],
    results: &Rc<RefCell<Vec<Vec<u8>>>>,
) -> Vec<OperationHandle> {
    blocks
        .iter()
        .map(|block| {
            let out: SharedBlock = Rc::default();
            let (o, r) = (out.clone(), results.clone());
            cipher
                .step_async(scheduler, block, out, move |res| {
                    res.unwrap();
                    r.borrow_mut().push(o.borrow().clone());
                })
                .unwrap()
        })
        .collect()
}

fn sync_reference(blocks: &[[u8; 16]]) -> Vec<Vec<u8>> {
    let mut cipher = Cipher::new(CipherAlgorithm::AesCbcEncrypt, key()).unwrap();
    blocks
        .iter()
        .map(|block| {
            let mut out = vec![0u8; 16];
            cipher.step(block, &mut out).unwrap();
            out
        })
        .collect()
}

fn blocks(n: usize) -> Vec<[u8; 16]> {
    (0..n).map(|i| [i as u8; 16]).collect()
}

#[tokio::test]
async fn stress_thousand_steps_keep_chain_order() {
    let local = LocalSet::new();
    let input = blocks(1000);
    let cipher = Cipher::new(CipherAlgorithm::AesCbcEncrypt, key()).unwrap();
    let results = Rc::new(RefCell::new(Vec::new()));

    schedule_steps(&cipher, &local, &input, &results);
    assert_eq!(cipher.pending_operations(), 1000);
    local.await;

    assert_eq!(*results.borrow(), sync_reference(&input));
}

#[test]
fn stress_reversed_loop_still_fifo() {
    let sched = ManualScheduler::new();
    let input = blocks(64);
    let cipher = Cipher::new(CipherAlgorithm::AesCbcEncrypt, key()).unwrap();
    let results = Rc::new(RefCell::new(Vec::new()));

    schedule_steps(&cipher, &sched, &input, &results);
    assert_eq!(sched.run_reversed(), 64);

    assert_eq!(*results.borrow(), sync_reference(&input));
}

#[test]
fn stress_cancel_every_other() {
    let sched = ManualScheduler::new();
    let input = blocks(100);
    let cipher = Cipher::new(CipherAlgorithm::AesCbcEncrypt, key()).unwrap();
    let results = Rc::new(RefCell::new(Vec::new()));

    let handles = schedule_steps(&cipher, &sched, &input, &results);
    let mut kept = Vec::new();
    for (i, handle) in handles.iter().enumerate() {
        if i % 2 == 0 {
            assert!(cipher.cancel(handle.id()));
        } else {
            kept.push(input[i]);
        }
    }
    assert_eq!(cipher.pending_operations(), 50);
    sched.run_until_idle();

    assert_eq!(*results.borrow(), sync_reference(&kept));
    assert!(handles.iter().all(|h| !h.is_pending()));
}

#[test]
fn stress_many_owners_interleaved() {
    let sched = ManualScheduler::new();
    let input = blocks(20);
    let ciphers: Vec<Cipher> = (0..10)
        .map(|_| Cipher::new(CipherAlgorithm::AesCbcEncrypt, key()).unwrap())
        .collect();
    let results: Vec<_> = (0..10).map(|_| Rc::new(RefCell::new(Vec::new()))).collect();

    // Round-robin scheduling so the loop interleaves owners.
    for block in &input {
        for (cipher, res) in ciphers.iter().zip(&results) {
            schedule_steps(cipher, &sched, std::slice::from_ref(block), res);
        }
    }
    sched.run_until_idle();

    let expected = sync_reference(&input);
    for res in &results {
        assert_eq!(*res.borrow(), expected);
    }
}

#[test]
fn stress_drop_half_the_owners() {
    let sched = ManualScheduler::new();
    let fired = Rc::new(Cell::new(0usize));
    let mut ciphers: Vec<Option<Cipher>> = (0..50)
        .map(|_| Some(Cipher::new(CipherAlgorithm::AesCtrEncrypt, key()).unwrap()))
        .collect();

    for cipher in ciphers.iter().flatten() {
        for _ in 0..4 {
            let f = fired.clone();
            cipher
                .finish_async(&sched, b"tail", None, move |r| {
                    assert_eq!(r.unwrap(), 16);
                    f.set(f.get() + 1);
                })
                .unwrap();
        }
    }
    for slot in ciphers.iter_mut().step_by(2) {
        *slot = None;
    }
    assert_eq!(sched.run_until_idle(), 200);
    assert_eq!(fired.get(), 25 * 4);
}

#[test]
fn stress_callback_schedules_follow_up() {
    let sched = Rc::new(ManualScheduler::new());
    let cipher = Rc::new(Cipher::new(CipherAlgorithm::AesCbcEncrypt, key()).unwrap());
    let count = Rc::new(Cell::new(0));

    fn chain(cipher: Rc<Cipher>, sched: Rc<ManualScheduler>, count: Rc<Cell<u32>>, left: u32) {
        if left == 0 {
            return;
        }
        let (c, s, n) = (cipher.clone(), sched.clone(), count.clone());
        cipher
            .step_async(&*sched, &[0u8; 16], Rc::default(), move |r| {
                r.unwrap();
                n.set(n.get() + 1);
                chain(c, s, n, left - 1);
            })
            .unwrap();
    }

    chain(cipher.clone(), sched.clone(), count.clone(), 100);
    assert_eq!(sched.run_until_idle(), 100);
    assert_eq!(count.get(), 100);
    assert_eq!(cipher.pending_operations(), 0);
}
