use super::Screen;
use crate::{conf::Conf, map::MapOptions, Error, Result};
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};
use tracing::info;
use uuid::Uuid;

struct Entry {
    screen: Screen,
    touched_at: Instant,
}

/// Mounted screens shared by all workers. The lock is only held for state
/// transitions, never across backend calls.
pub struct ScreenStore {
    screens: Mutex<HashMap<Uuid, Entry>>,
    ttl: Duration,
    map_options: MapOptions,
}

impl ScreenStore {
    pub fn new(conf: &Conf) -> Self {
        ScreenStore {
            screens: Mutex::new(HashMap::new()),
            ttl: conf.screen_ttl,
            map_options: MapOptions::from(conf),
        }
    }

    pub fn mount(&self) -> Uuid {
        self.evict_idle(Instant::now());
        let id = Uuid::new_v4();
        let entry = Entry {
            screen: Screen::new(id, self.map_options.clone()),
            touched_at: Instant::now(),
        };
        self.lock().insert(id, entry);
        info!(screen = %id, "Mounted screen");
        id
    }

    pub fn with<T>(&self, id: Uuid, f: impl FnOnce(&mut Screen) -> T) -> Result<T> {
        let mut screens = self.lock();
        let Some(entry) = screens.get_mut(&id) else {
            return Err(Error::NotFound(format!("Screen {id} doesn't exist")));
        };
        entry.touched_at = Instant::now();
        Ok(f(&mut entry.screen))
    }

    /// Dropping a screen drops its map view.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut screens = self.lock();
        let before = screens.len();
        screens.retain(|_, it| now.saturating_duration_since(it.touched_at) < self.ttl);
        let evicted = before - screens.len();
        if evicted > 0 {
            info!(evicted, "Evicted idle screens");
        }
        evicted
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.screens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
