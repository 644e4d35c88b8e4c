//! Scripted timeline player — a `TimelinePlayer` driven by `tokio::time`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use eventide_core::error::DomainError;
use eventide_cutscene::TimelinePlayer;
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
struct Script {
    duration: Duration,
    markers: HashMap<String, Duration>,
}

/// A timeline player whose assets are fixed durations with named markers at
/// fixed offsets. Playback is measured against `tokio::time`, so it follows
/// paused test time.
#[derive(Debug, Default)]
pub struct ScriptedTimeline {
    scripts: HashMap<String, Script>,
    load_delay: Duration,
    started: Mutex<HashMap<String, Instant>>,
    played: Mutex<Vec<String>>,
    stopped: Mutex<Vec<String>>,
}

impl ScriptedTimeline {
    /// Create a player with no assets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset that plays for `duration`.
    #[must_use]
    pub fn with_timeline(mut self, name: &str, duration: Duration) -> Self {
        self.scripts.entry(name.to_owned()).or_default().duration = duration;
        self
    }

    /// Makes every `play` spend `delay` loading before playback starts.
    #[must_use]
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Adds a marker at `offset` into `name`.
    #[must_use]
    pub fn with_marker(mut self, name: &str, marker: &str, offset: Duration) -> Self {
        self.scripts
            .entry(name.to_owned())
            .or_default()
            .markers
            .insert(marker.to_owned(), offset);
        self
    }

    /// Returns every asset started, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }

    /// Returns every asset stopped before it finished, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stopped(&self) -> Vec<String> {
        self.stopped.lock().unwrap().clone()
    }

    fn started_at(&self, timeline: &str) -> Option<Instant> {
        self.started.lock().unwrap().get(timeline).copied()
    }
}

#[async_trait]
impl TimelinePlayer for ScriptedTimeline {
    async fn play(&self, timeline: &str) -> Result<(), DomainError> {
        if !self.scripts.contains_key(timeline) {
            return Err(DomainError::NotFound(format!("timeline {timeline}")));
        }
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        self.started
            .lock()
            .unwrap()
            .insert(timeline.to_owned(), Instant::now());
        self.played.lock().unwrap().push(timeline.to_owned());
        Ok(())
    }

    fn stop(&self, timeline: &str) {
        if self.started.lock().unwrap().remove(timeline).is_some() {
            self.stopped.lock().unwrap().push(timeline.to_owned());
        }
    }

    fn is_playing(&self, timeline: &str) -> bool {
        let Some(script) = self.scripts.get(timeline) else {
            return false;
        };
        self.started_at(timeline)
            .is_some_and(|started| Instant::now() < started + script.duration)
    }

    async fn wait_marker(&self, timeline: &str, marker: &str) {
        let offset = self
            .scripts
            .get(timeline)
            .and_then(|script| script.markers.get(marker).copied());
        if let (Some(started), Some(offset)) = (self.started_at(timeline), offset) {
            tokio::time::sleep_until(started + offset).await;
        }
    }
}
