/// Loom-based concurrency tests for the allocation ledger.
///
/// Run w/ `RUSTFLAGS="--cfg loom" cargo test --lib`
///
/// Loom exhaustively enumerates thread interleavings, so thread counts stay
/// at 2 and each thread does a single alloc/free pair. The ledger's list
/// bookkeeping only exists with debug assertions on, so run these without
/// `--release` (the model still passes in release, it just degenerates to
/// plain malloc/free).
#[cfg(loom)]
mod tests {
    use crate::memory::ledger::Ledger;
    use crate::sync::thread;
    use crate::sync::Arc;

    #[test]
    fn loom_concurrent_alloc_free() {
        loom::model(|| {
            let ledger = Arc::new(Ledger::new());

            let handles: Vec<_> = (0..2usize)
                .map(|i| {
                    let ledger = Arc::clone(&ledger);
                    thread::spawn(move || {
                        let ptr = ledger.alloc(16 * (i + 1));
                        // Safety: ptr came from this ledger.
                        unsafe { ledger.free(ptr.as_ptr()) };
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(ledger.live_allocations(), 0);
        });
    }

    #[test]
    fn loom_alloc_races_with_free() {
        loom::model(|| {
            let ledger = Arc::new(Ledger::new());
            let held = ledger.alloc(8).as_ptr() as usize;

            let t = {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.alloc(24).as_ptr() as usize)
            };

            // Unlinking `held` races with the other thread's list push.
            // Safety: held came from this ledger.
            unsafe { ledger.free(held as *mut u8) };

            let other = t.join().unwrap();
            #[cfg(debug_assertions)]
            assert_eq!(ledger.live_bytes(), 24);

            // Safety: other came from this ledger.
            unsafe { ledger.free(other as *mut u8) };
            assert_eq!(ledger.live_allocations(), 0);
        });
    }
}
