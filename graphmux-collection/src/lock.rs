//! Reentrant read/write lock guarding a triple collection

use crate::{CollectionError, Result};
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use std::fmt;
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

/// Reentrant read/write lock
///
/// Lock ownership is tracked per thread:
///
/// - a thread already holding the read or write lock may take the read lock
///   again without blocking;
/// - the thread holding the write lock may take it again;
/// - a thread holding only the read lock cannot upgrade: [`GraphLock::write`]
///   fails with [`CollectionError::LockUpgrade`] instead of deadlocking;
/// - while a writer is waiting, threads not already holding the lock wait
///   before reading, so a steady stream of readers cannot starve writers.
///
/// Guards release on drop and cannot leave the thread that acquired them.
pub struct GraphLock {
    state: Mutex<LockState>,
    changed: Condvar,
}

#[derive(Default)]
struct LockState {
    /// Read hold count per thread
    readers: FxHashMap<ThreadId, usize>,
    /// Write owner and hold count
    writer: Option<(ThreadId, usize)>,
    waiting_writers: usize,
}

impl LockState {
    fn is_writer(&self, me: ThreadId) -> bool {
        matches!(self.writer, Some((owner, _)) if owner == me)
    }
}

impl GraphLock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            changed: Condvar::new(),
        }
    }

    /// Acquire the read lock, blocking while another thread writes
    pub fn read(&self) -> ReadGuard<'_> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            let reentrant = state.readers.contains_key(&me) || state.is_writer(me);
            if reentrant || (state.writer.is_none() && state.waiting_writers == 0) {
                break;
            }
            self.changed.wait(&mut state);
        }
        *state.readers.entry(me).or_insert(0) += 1;
        ReadGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Acquire the write lock, blocking while other threads hold the lock
    ///
    /// Fails with [`CollectionError::LockUpgrade`] if the current thread
    /// holds the read lock but not the write lock.
    pub fn write(&self) -> Result<WriteGuard<'_>> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if let Some((owner, count)) = state.writer.as_mut() {
            if *owner == me {
                *count += 1;
                return Ok(WriteGuard {
                    lock: self,
                    _not_send: PhantomData,
                });
            }
        }
        if state.readers.contains_key(&me) {
            tracing::debug!(thread = ?me, "write lock requested while holding read lock");
            return Err(CollectionError::LockUpgrade);
        }

        state.waiting_writers += 1;
        while state.writer.is_some() || !state.readers.is_empty() {
            self.changed.wait(&mut state);
        }
        state.waiting_writers -= 1;
        state.writer = Some((me, 1));
        Ok(WriteGuard {
            lock: self,
            _not_send: PhantomData,
        })
    }

    /// Check if the current thread holds the read lock
    pub fn is_read_held(&self) -> bool {
        self.state
            .lock()
            .readers
            .contains_key(&thread::current().id())
    }

    /// Check if the current thread holds the write lock
    pub fn is_write_held(&self) -> bool {
        self.state.lock().is_writer(thread::current().id())
    }

    fn release_read(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if let Some(count) = state.readers.get_mut(&me) {
            *count -= 1;
            if *count == 0 {
                state.readers.remove(&me);
            }
        }
        drop(state);
        self.changed.notify_all();
    }

    fn release_write(&self) {
        let mut state = self.state.lock();
        if let Some((_, count)) = state.writer.as_mut() {
            *count -= 1;
            if *count == 0 {
                state.writer = None;
            }
        }
        drop(state);
        self.changed.notify_all();
    }
}

impl Default for GraphLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("GraphLock")
            .field("readers", &state.readers.len())
            .field("write_held", &state.writer.is_some())
            .field("waiting_writers", &state.waiting_writers)
            .finish()
    }
}

/// Read hold on a [`GraphLock`], released on drop
#[must_use = "the read lock is released as soon as the guard is dropped"]
pub struct ReadGuard<'a> {
    lock: &'a GraphLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Write hold on a [`GraphLock`], released on drop
#[must_use = "the write lock is released as soon as the guard is dropped"]
pub struct WriteGuard<'a> {
    lock: &'a GraphLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_nested_reads_do_not_block() {
        let lock = GraphLock::new();
        let _a = lock.read();
        let _b = lock.read();
        assert!(lock.is_read_held());
    }

    #[test]
    fn test_writer_may_read_and_write_again() {
        let lock = GraphLock::new();
        let _w = lock.write().unwrap();
        let _r = lock.read();
        let _w2 = lock.write().unwrap();
        assert!(lock.is_write_held());
    }

    #[test]
    fn test_upgrade_fails_fast() {
        let lock = GraphLock::new();
        let _r = lock.read();
        assert!(matches!(lock.write(), Err(CollectionError::LockUpgrade)));
    }

    #[test]
    fn test_release_on_drop() {
        let lock = GraphLock::new();
        {
            let _w = lock.write().unwrap();
            let _w2 = lock.write().unwrap();
        }
        assert!(!lock.is_write_held());
        {
            let _r = lock.read();
        }
        assert!(!lock.is_read_held());
        assert!(lock.write().is_ok());
    }

    #[test]
    fn test_writer_excludes_other_threads() {
        let lock = Arc::new(GraphLock::new());
        let acquired = Arc::new(AtomicBool::new(false));

        let guard = lock.write().unwrap();
        let handle = {
            let lock = Arc::clone(&lock);
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let _r = lock.read();
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst));
        drop(guard);
        handle.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_waiting_writer_blocks_new_readers() {
        let lock = Arc::new(GraphLock::new());
        let first_read = lock.read();

        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let _w = lock.write().unwrap();
            })
        };
        while lock.state.lock().waiting_writers == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        let reader_done = Arc::new(AtomicBool::new(false));
        let reader = {
            let lock = Arc::clone(&lock);
            let reader_done = Arc::clone(&reader_done);
            thread::spawn(move || {
                let _r = lock.read();
                reader_done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!reader_done.load(Ordering::SeqCst));

        // Reentrant read by the holder still succeeds
        let _again = lock.read();
        drop(_again);
        drop(first_read);

        writer.join().unwrap();
        reader.join().unwrap();
        assert!(reader_done.load(Ordering::SeqCst));
    }
}
