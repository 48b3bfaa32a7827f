//! Background chunk rebuilds on a fixed worker pool.
//!
//! Offloads chunk rebuilds to worker threads, supports cancellation, and
//! delivers finished chunks via bounded channels. Each task carries its own
//! pipeline snapshot, so parameter changes on the submitting side never race
//! with a rebuild in progress.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use tracing::trace;

use crate::chunk::{ChunkGrid, ChunkSamples, rebuild_chunk};
use crate::pipeline::TerrainPipeline;
use crate::tile_manager::ChunkKey;

/// A request to rebuild a single chunk.
#[derive(Clone, Debug)]
pub struct ChunkTask {
    /// Chunk being rebuilt.
    pub key: ChunkKey,
    /// Vertex layout of the chunk.
    pub grid: ChunkGrid,
    /// Pipeline snapshot to evaluate.
    pub pipeline: Arc<TerrainPipeline>,
    /// Queue order for [`AsyncChunkBuilder::submit_batch`]; lower values are
    /// queued first. Typically the squared distance to the viewer.
    pub priority: u64,
}

/// A rebuilt chunk ready to hand to the renderer.
#[derive(Debug)]
pub struct RebuiltChunk {
    /// The chunk key of the submitted task.
    pub key: ChunkKey,
    /// Per-vertex heights and colors.
    pub samples: ChunkSamples,
    /// Rebuild time in microseconds (for profiling).
    pub rebuild_time_us: u64,
    /// Cancellation flag of the task that produced this chunk.
    cancelled: Arc<AtomicBool>,
}

/// Internal wrapper that carries the task and its cancellation flag.
struct QueuedTask {
    task: ChunkTask,
    cancelled: Arc<AtomicBool>,
}

/// Runs chunk rebuilds across a thread pool.
pub struct AsyncChunkBuilder {
    /// Sender for submitting rebuild tasks.
    task_sender: Sender<QueuedTask>,
    /// Receiver for collecting finished chunks on the caller's thread.
    result_receiver: Receiver<RebuiltChunk>,
    /// Shared cancellation flag per pending task.
    active_tasks: Arc<DashMap<ChunkKey, Arc<AtomicBool>>>,
    /// Current number of in-flight tasks.
    in_flight: Arc<AtomicU64>,
}

impl AsyncChunkBuilder {
    /// Create a builder with the specified thread count and queue capacity.
    ///
    /// # Arguments
    /// - `thread_count`: Number of worker threads.
    /// - `max_concurrent`: Maximum queued tasks; excess submissions are rejected.
    /// - `result_capacity`: Bounded channel capacity for finished chunks.
    pub fn new(thread_count: usize, max_concurrent: usize, result_capacity: usize) -> Self {
        let (task_sender, task_receiver) = bounded::<QueuedTask>(max_concurrent);
        let (result_sender, result_receiver) = bounded::<RebuiltChunk>(result_capacity);
        let in_flight = Arc::new(AtomicU64::new(0));

        for _ in 0..thread_count.max(1) {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);

            std::thread::Builder::new()
                .name("chunk-rebuild-worker".into())
                .spawn(move || {
                    while let Ok(queued) = receiver.recv() {
                        if queued.cancelled.load(Ordering::Relaxed) {
                            in_flight.fetch_sub(1, Ordering::Relaxed);
                            continue;
                        }

                        let start = std::time::Instant::now();
                        let samples = rebuild_chunk(&queued.task.pipeline, &queued.task.grid);
                        let elapsed = start.elapsed().as_micros() as u64;
                        trace!(key = ?queued.task.key, elapsed_us = elapsed, "chunk rebuilt");

                        if !queued.cancelled.load(Ordering::Relaxed) {
                            let _ = sender.send(RebuiltChunk {
                                key: queued.task.key,
                                samples,
                                rebuild_time_us: elapsed,
                                cancelled: Arc::clone(&queued.cancelled),
                            });
                        }

                        in_flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })
                .expect("Failed to spawn chunk rebuild worker thread");
        }

        Self {
            task_sender,
            result_receiver,
            active_tasks: Arc::new(DashMap::new()),
            in_flight,
        }
    }

    /// Create a builder with a thread count based on CPU cores, leaving one
    /// core for the caller.
    pub fn with_defaults() -> Self {
        let threads = num_cpus::get().saturating_sub(1).max(1);
        Self::new(threads, 64, 128)
    }

    /// Queue a chunk for background rebuild.
    ///
    /// Submitting a key that is already pending supersedes the earlier task:
    /// once the new task is queued the old one is cancelled and never
    /// delivered.
    ///
    /// Returns `Ok(())` if the task was queued, or `Err(task)` if the queue is
    /// full. A rejected task leaves any earlier task for the key untouched.
    #[allow(clippy::result_large_err)]
    pub fn submit(&self, task: ChunkTask) -> Result<(), ChunkTask> {
        let key = task.key;
        let cancelled = Arc::new(AtomicBool::new(false));
        let previous = self.active_tasks.insert(key, Arc::clone(&cancelled));
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        match self.task_sender.try_send(QueuedTask {
            task,
            cancelled: Arc::clone(&cancelled),
        }) {
            Ok(()) => {
                if let Some(previous) = previous {
                    previous.store(true, Ordering::Relaxed);
                    trace!(?key, "superseded pending chunk rebuild");
                }
                Ok(())
            }
            Err(e) => {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                match previous {
                    Some(previous) => {
                        if self.owns_entry(&key, &cancelled) {
                            self.active_tasks.insert(key, previous);
                        }
                    }
                    None => {
                        self.active_tasks
                            .remove_if(&key, |_, flag| Arc::ptr_eq(flag, &cancelled));
                    }
                }
                Err(e.into_inner().task)
            }
        }
    }

    /// Queue several chunks in ascending [`ChunkTask::priority`] order.
    ///
    /// Tasks with equal priority keep their relative order. Returns the tasks
    /// the queue had no room for, in the order they were tried.
    pub fn submit_batch(&self, mut tasks: Vec<ChunkTask>) -> Vec<ChunkTask> {
        tasks.sort_by_key(|task| task.priority);
        let mut rejected = Vec::new();
        for task in tasks {
            if let Err(task) = self.submit(task) {
                rejected.push(task);
            }
        }
        rejected
    }

    /// Cancel a pending or running rebuild. A no-op if it already finished.
    ///
    /// A cancelled task never shows up in [`Self::drain_results`], even if it
    /// finished before the cancel landed.
    pub fn cancel(&self, key: &ChunkKey) {
        if let Some((_, cancelled)) = self.active_tasks.remove(key) {
            cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Drain all finished chunks from the result channel.
    pub fn drain_results(&self) -> Vec<RebuiltChunk> {
        let mut results = Vec::new();
        while let Ok(chunk) = self.result_receiver.try_recv() {
            if chunk.cancelled.load(Ordering::Relaxed) {
                continue;
            }
            // A newer submission for the same key keeps its entry.
            self.active_tasks
                .remove_if(&chunk.key, |_, flag| Arc::ptr_eq(flag, &chunk.cancelled));
            results.push(chunk);
        }
        results
    }

    fn owns_entry(&self, key: &ChunkKey, flag: &Arc<AtomicBool>) -> bool {
        self.active_tasks
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), flag))
    }

    /// Number of tasks currently queued or running.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns `true` if a rebuild for `key` is pending.
    pub fn is_pending(&self, key: &ChunkKey) -> bool {
        self.active_tasks.contains_key(key)
    }
}
