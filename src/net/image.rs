//! Background planet-map fetcher.
//!
//! Spawns one thread per map to download and decode it into a
//! [`TextureMap`]. The UI polls once per frame and swaps maps in as they land.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;

use crate::config::TextureUrls;
use crate::net::http::{build_client, fetch_bytes};
use crate::render::texture::{MapKind, TextureError, TextureMap};

/// Manages background map fetching and decoding.
pub struct MapLoader {
    pending: HashMap<MapKind, mpsc::Receiver<Result<TextureMap, TextureError>>>,
    failed: HashSet<MapKind>,
}

impl Default for MapLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MapLoader {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    /// Request all three maps from `urls`.
    pub fn request_all(&mut self, urls: &TextureUrls) {
        self.request(MapKind::Day, &urls.day);
        self.request(MapKind::Night, &urls.night);
        self.request(MapKind::Clouds, &urls.clouds);
    }

    /// Request one map in the background. Duplicate requests are ignored.
    pub fn request(&mut self, kind: MapKind, url: &str) {
        if self.pending.contains_key(&kind) || self.failed.contains(&kind) {
            return;
        }

        let (tx, rx) = mpsc::channel();
        let url_owned = url.to_string();

        std::thread::spawn(move || {
            let result = fetch_and_decode(&url_owned);
            let _ = tx.send(result);
        });

        self.pending.insert(kind, rx);
    }

    /// Collect maps that finished since the last call. Call every frame.
    pub fn poll(&mut self) -> Vec<(MapKind, TextureMap)> {
        let mut ready = Vec::new();
        let mut completed = Vec::new();

        for (kind, rx) in &self.pending {
            match rx.try_recv() {
                Ok(Ok(map)) => {
                    log::info!("{:?} map ready ({}x{})", kind, map.width, map.height);
                    ready.push((*kind, map));
                    completed.push(*kind);
                }
                Ok(Err(e)) => {
                    log::warn!("{:?} map unavailable, keeping flat fallback: {}", kind, e);
                    self.failed.insert(*kind);
                    completed.push(*kind);
                }
                Err(mpsc::TryRecvError::Empty) => {}
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::warn!("{:?} map loader thread exited without a result", kind);
                    self.failed.insert(*kind);
                    completed.push(*kind);
                }
            }
        }

        for kind in completed {
            self.pending.remove(&kind);
        }
        ready
    }

    /// Drop in-flight requests. Their threads finish and discard the result.
    pub fn cancel(&mut self) {
        self.pending.clear();
    }

    /// Number of maps still being fetched.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

fn fetch_and_decode(url: &str) -> Result<TextureMap, TextureError> {
    let client = build_client(Some(std::time::Duration::from_secs(30)))?;
    let bytes = fetch_bytes(&client, url)?;
    TextureMap::decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_deduplicates() {
        let mut loader = MapLoader::new();
        loader.request(MapKind::Day, "http://127.0.0.1:9/day.jpg");
        loader.request(MapKind::Day, "http://127.0.0.1:9/day.jpg");
        assert_eq!(loader.pending_count(), 1);
    }

    #[test]
    fn unreachable_map_fails_quietly() {
        let mut loader = MapLoader::new();
        loader.request(MapKind::Clouds, "http://127.0.0.1:9/clouds.png");
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(20);
        while !loader.is_idle() && std::time::Instant::now() < deadline {
            assert!(loader.poll().is_empty());
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(loader.is_idle());
        // A failed map is not retried.
        loader.request(MapKind::Clouds, "http://127.0.0.1:9/clouds.png");
        assert_eq!(loader.pending_count(), 0);
    }
}
