//! Per-thread pool of reusable encode buffers

use std::cell::RefCell;

use bytes::BytesMut;

const POOLED_BUFFERS: usize = 8;
const INITIAL_CAPACITY: usize = 4 * 1024;
/// Buffers that grew beyond this are dropped instead of pooled
const MAX_RETAINED_CAPACITY: usize = 4 * 1024 * 1024;

thread_local! {
    static POOL: RefCell<Vec<BytesMut>> = const { RefCell::new(Vec::new()) };
}

/// Lend a cleared buffer to `f` and return it to the pool afterwards.
///
/// The buffer must not escape `f`; copy out whatever needs to be returned.
pub fn with_buffer<T>(f: impl FnOnce(&mut BytesMut) -> T) -> T {
    let mut buf = POOL
        .with(|pool| pool.borrow_mut().pop())
        .unwrap_or_else(|| BytesMut::with_capacity(INITIAL_CAPACITY));
    buf.clear();
    let out = f(&mut buf);
    if buf.capacity() <= MAX_RETAINED_CAPACITY {
        POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool.len() < POOLED_BUFFERS {
                pool.push(buf);
            }
        });
    }
    out
}
