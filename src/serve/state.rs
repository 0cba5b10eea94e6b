//! Shared server state: the loaded dataset and everything derived from it.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use voronoi_offices::config::Config;
use voronoi_offices::dataset::DatasetLoader;
use voronoi_offices::lookup::OfficeIndex;
use voronoi_offices::models::PointSet;
use voronoi_offices::pipeline::{Pipeline, Tessellation};

/// One consistent snapshot of dataset, tessellation and lookup index
pub struct Snapshot {
    pub content_hash: u64,
    pub points: Arc<PointSet>,
    pub tessellation: Arc<Tessellation>,
    pub index: OfficeIndex,
    pub loaded_at: DateTime<Utc>,
}

struct Engine {
    loader: DatasetLoader,
    pipeline: Pipeline,
}

impl Engine {
    fn build(&mut self, config: &Config) -> voronoi_offices::Result<Arc<Snapshot>> {
        let (content_hash, points) = self.loader.load(&config.input.path)?;
        let tessellation = self.pipeline.tessellate(&points)?;
        let index = OfficeIndex::build(&points.assigned());
        Ok(Arc::new(Snapshot {
            content_hash,
            points,
            tessellation,
            index,
            loaded_at: Utc::now(),
        }))
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    /// Held for the whole of a rebuild; serializes reloads
    engine: Arc<Mutex<Engine>>,
    current: RwLock<Arc<Snapshot>>,
}

impl AppState {
    pub fn load(config: Config) -> voronoi_offices::Result<Self> {
        let mut engine = Engine {
            loader: DatasetLoader::new(config.input.delimiter)?,
            pipeline: Pipeline::from_config(&config),
        };
        let current = engine.build(&config)?;

        Ok(Self {
            config,
            engine: Arc::new(Mutex::new(engine)),
            current: RwLock::new(current),
        })
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Drop memoized dataset and tessellation and rebuild from disk.
    ///
    /// The rebuild runs on the blocking pool; readers keep the previous
    /// snapshot until the new one is swapped in. On failure the previous
    /// snapshot stays in service.
    pub async fn reload(&self) -> Result<Arc<Snapshot>> {
        let mut guard = Arc::clone(&self.engine).lock_owned().await;
        let config = self.config.clone();
        let (guard, built) = tokio::task::spawn_blocking(move || {
            guard.loader.invalidate();
            guard.pipeline.invalidate();
            let built = guard.build(&config);
            (guard, built)
        })
        .await
        .context("Reload task failed")?;
        let snapshot = built?;

        *self.current.write().await = Arc::clone(&snapshot);
        drop(guard);

        info!(
            "Reloaded {} offices, content hash {:016x}",
            snapshot.points.len(),
            snapshot.content_hash
        );
        Ok(snapshot)
    }
}
