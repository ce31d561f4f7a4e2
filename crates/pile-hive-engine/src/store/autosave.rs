//! Background auto-save on a fixed interval.

use anyhow::Context;
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::DocumentStore;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

pub type SharedStore = Arc<Mutex<DocumentStore>>;

pub(crate) fn lock(store: &SharedStore) -> MutexGuard<'_, DocumentStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Save the shared store now, regardless of the dirty flag
pub fn save_shared(store: &SharedStore) -> anyhow::Result<()> {
    let mut store = lock(store);
    let title = store.title().to_string();
    store
        .save_document()
        .with_context(|| format!("Failed to save {title:?}"))
}

/// Saves the store every interval while it is dirty. Stops on drop.
#[derive(Debug)]
pub struct AutoSaver {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoSaver {
    pub fn spawn(store: SharedStore, interval: Duration) -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("auto-save".to_string())
            .spawn(move || {
                log::debug!("auto-save every {interval:?}");
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if lock(&store).auto_save() {
                                log::debug!("auto-saved");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Stop the timer and wait for the thread
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("auto-save thread panicked");
        }
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStorage;
    use std::time::Instant;

    fn shared() -> SharedStore {
        Arc::new(Mutex::new(DocumentStore::new(MemoryStorage::new())))
    }

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_auto_saver_saves_dirty_store() {
        // Given a dirty store
        let store = shared();
        lock(&store).set_title("Draft");

        // When the auto-saver runs
        let mut saver = AutoSaver::spawn(store.clone(), Duration::from_millis(10)).unwrap();

        // Then the store becomes clean with a save timestamp
        assert!(wait_until(|| !lock(&store).is_dirty()));
        assert!(lock(&store).last_saved().is_some());
        saver.stop();
    }

    #[test]
    fn test_auto_saver_leaves_clean_store_alone() {
        let store = shared();
        let saver = AutoSaver::spawn(store.clone(), Duration::from_millis(5)).unwrap();

        thread::sleep(Duration::from_millis(40));
        drop(saver);

        assert_eq!(lock(&store).last_saved(), None);
    }

    #[test]
    fn test_save_shared_saves_clean_store() {
        let store = shared();

        save_shared(&store).unwrap();

        assert!(lock(&store).last_saved().is_some());
    }
}
