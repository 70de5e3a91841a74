use std::path::{Path, PathBuf};

use chrono::Utc;
use futures_channel::oneshot;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

use crate::*;

/// Partition of one submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub resolved: Vec<Step>,
    pub rejected: Vec<Step>,
}

/// A running contest: live engine, snapshot history and finish listeners.
///
/// Every [`Contest::submit_steps`] call appends exactly one snapshot. Hosts
/// serving concurrent submitters must serialize calls per contest; the
/// `&mut self` receiver already enforces that within one owner.
#[derive(Debug)]
pub struct Contest<L = FsImageLoader> {
    config: ContestConfig,
    engine: RevealEngine,
    history: History,
    renderer: Renderer,
    loader: L,
    notifier: FinishNotifier,
}

impl Contest<FsImageLoader> {
    pub fn new(config: ContestConfig) -> Result<Self, ConfigError> {
        Self::with_loader(config, FsImageLoader)
    }
}

impl<L: ImageLoader> Contest<L> {
    /// Validates `config`, generates the field and bank, and records the
    /// initial snapshot.
    pub fn with_loader(config: ContestConfig, loader: L) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let engine = RevealEngine::generate(&config.layout(), &config.bank, &mut rng)?;
        let renderer = Renderer::new(&config)?;

        let mut history = History::new();
        history.record(engine.capture(), Vec::new());
        log::debug!(
            "Contest created: {}x{} px, {}x{} chunks, {} prizes",
            config.size.width,
            config.size.height,
            config.grid.width,
            config.grid.height,
            config.bank.len()
        );

        Ok(Self {
            config,
            engine,
            history,
            renderer,
            loader,
            notifier: FinishNotifier::new(),
        })
    }

    pub fn config(&self) -> &ContestConfig {
        &self.config
    }

    pub fn engine(&self) -> &RevealEngine {
        &self.engine
    }

    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    pub fn snapshots(&self) -> &History {
        &self.history
    }

    pub fn snapshot(&self, sequence: usize) -> Option<&Snapshot> {
        self.history.get(sequence)
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.history.latest()
    }

    pub fn bank_stats(&self) -> Vec<PrizeStats> {
        self.engine.bank().stats()
    }

    /// Applies `steps` in order and records the resulting snapshot.
    pub fn submit_steps(&mut self, steps: impl IntoIterator<Item = Step>) -> Submission {
        let batch = self.engine.apply_steps(steps);
        let resolved = batch.resolved_steps();
        let sequence = self
            .history
            .record(self.engine.capture(), resolved.clone())
            .sequence;
        log::debug!(
            "Submission #{}: {} resolved, {} rejected",
            sequence,
            resolved.len(),
            batch.rejected.len()
        );

        if batch.finished_now {
            self.notifier.fire(FinishedEvent {
                finished_at: Utc::now(),
                snapshot: sequence,
                stats: self.bank_stats(),
            });
        }

        Submission {
            resolved,
            rejected: batch.rejected,
        }
    }

    /// Runs `callback` once when the contest finishes, or right away if it
    /// already has.
    pub fn on_finished<F>(&mut self, callback: F)
    where
        F: FnOnce(&FinishedEvent) + Send + 'static,
    {
        self.notifier.on_finished(callback);
    }

    pub fn subscribe_finished(&mut self) -> oneshot::Receiver<FinishedEvent> {
        self.notifier.subscribe()
    }

    pub async fn render_snapshot(&self, sequence: usize) -> Result<Option<Pixmap>, RenderError> {
        match self.history.get(sequence) {
            Some(snapshot) => Ok(Some(self.renderer.render(snapshot, &self.loader).await?)),
            None => Ok(None),
        }
    }

    /// PNG bytes of the latest snapshot.
    pub async fn export_image_bytes(&self) -> Result<Option<Vec<u8>>, RenderError> {
        match self.history.latest() {
            Some(snapshot) => Ok(Some(self.renderer.render_png(snapshot, &self.loader).await?)),
            None => Ok(None),
        }
    }

    pub async fn export_image_base64(&self) -> Result<Option<String>, RenderError> {
        Ok(self
            .export_image_bytes()
            .await?
            .map(|bytes| encode_base64(&bytes)))
    }

    /// Writes the latest snapshot to `{directory}/{name}.{format}`.
    pub async fn export_image_file(
        &self,
        directory: impl AsRef<Path>,
        name: &str,
        format: ImageFormat,
    ) -> Result<Option<PathBuf>, RenderError> {
        let Some(bytes) = self.export_image_bytes().await? else {
            return Ok(None);
        };
        write_image_file(directory.as_ref(), name, format, &bytes).map(Some)
    }
}
