//! Synchronization points for the command track of a hybrid cutscene.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eventide_core::command::{Command, CommandData};
use eventide_core::cutscene::{CutsceneId, SyncKind, SyncPoint};
use eventide_interpreter::{BarrierOutcome, CommandBarrier};
use tracing::{debug, warn};

use super::collaborators::TimelinePlayer;
use super::registry::CutsceneRegistry;

/// Extracts the synchronization points of a command track in ascending
/// index order. Waits, nested cutscenes and timeline markers each yield one
/// point; disabled commands yield none.
#[must_use]
pub fn extract_sync_points(commands: &[Command]) -> Vec<SyncPoint> {
    commands
        .iter()
        .enumerate()
        .filter(|(_, command)| command.enabled)
        .filter_map(|(command_index, command)| {
            let kind = match &command.data {
                CommandData::Wait { duration_ms } => {
                    SyncKind::Wait(Duration::from_millis(*duration_ms))
                }
                CommandData::PlayCutscene { cutscene_id } => {
                    SyncKind::Cutscene(CutsceneId::new(cutscene_id.clone()))
                }
                CommandData::TimelineMarker { marker } => SyncKind::Timeline(marker.clone()),
                _ => return None,
            };
            Some(SyncPoint {
                command_index,
                kind,
            })
        })
        .collect()
}

/// Pending synchronization points of one hybrid run.
pub struct SyncSchedule {
    pending: VecDeque<SyncPoint>,
    lineage: Vec<CutsceneId>,
    timeline: Option<String>,
    player: Arc<dyn TimelinePlayer>,
    registry: Arc<CutsceneRegistry>,
}

impl fmt::Debug for SyncSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSchedule")
            .field("pending", &self.pending)
            .field("lineage", &self.lineage)
            .finish_non_exhaustive()
    }
}

impl SyncSchedule {
    /// Builds the schedule for `commands`. `lineage` is the owning cutscene
    /// preceded by the cutscenes enclosing it.
    #[must_use]
    pub fn new(
        lineage: Vec<CutsceneId>,
        commands: &[Command],
        timeline: Option<String>,
        player: Arc<dyn TimelinePlayer>,
        registry: Arc<CutsceneRegistry>,
    ) -> Self {
        Self {
            pending: extract_sync_points(commands).into(),
            lineage,
            timeline,
            player,
            registry,
        }
    }

    /// Points not yet reached.
    #[must_use]
    pub fn pending(&self) -> Vec<SyncPoint> {
        self.pending.iter().cloned().collect()
    }
}

#[async_trait]
impl CommandBarrier for SyncSchedule {
    async fn before_command(&mut self, index: usize, _command: &Command) -> BarrierOutcome {
        while let Some(stale) = self.pending.front().filter(|p| p.command_index < index) {
            debug!(point = stale.command_index, index, "sync point skipped by flow control");
            self.pending.pop_front();
        }

        if self.pending.front().is_none_or(|p| p.command_index != index) {
            return BarrierOutcome::Proceed;
        }
        let Some(point) = self.pending.pop_front() else {
            return BarrierOutcome::Proceed;
        };

        match point.kind {
            SyncKind::Wait(duration) => {
                tokio::time::sleep(duration).await;
                BarrierOutcome::Consumed
            }
            SyncKind::Cutscene(cutscene_id) => {
                debug!(index, %cutscene_id, "waiting for other cutscenes to end");
                self.registry.wait_for_others(&self.lineage).await;
                BarrierOutcome::Proceed
            }
            SyncKind::Timeline(marker) => {
                match &self.timeline {
                    Some(timeline) => self.player.wait_marker(timeline, &marker).await,
                    None => warn!(index, %marker, "timeline marker without a timeline; skipped"),
                }
                BarrierOutcome::Consumed
            }
        }
    }
}
