// this_file: crates/glyphgen/src/scheduler.rs

//! The job scheduler: one worker thread, two channels
//!
//! Rasterization runs on a single dedicated worker; results come back over a
//! completion channel and are integrated into the glyph store during
//! [`Scheduler::drain`], on the calling thread. Batch bookkeeping lives
//! entirely on the calling thread, so no batch field is ever written from
//! two sides of the channel.
//!
//! A (font, codepoint) pair is rasterized at most once at a time: a batch
//! that requests a glyph already in flight subscribes to the existing job
//! instead of queueing a second one.

use crate::raster::{self, RenderJobParams};
use glyphgen_core::{
    BatchOutcome, FontId, GlyphCell, GlyphGenError, GlyphMetrics, OnComplete, OutlineFace,
    RequestId, Result,
};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// One unit of worker work: everything rasterization needs, detached from
/// the instance registry. The face `Arc` keeps the outline alive for the
/// duration of the job no matter what happens on the main thread.
pub(crate) struct GlyphJob {
    pub font: FontId,
    pub codepoint: char,
    pub face: Arc<dyn OutlineFace>,
    pub params: RenderJobParams,
}

/// What the worker sends back for one job.
struct Completion {
    font: FontId,
    codepoint: char,
    result: Result<(GlyphMetrics, GlyphCell)>,
    elapsed: Duration,
}

/// Main-thread state of one `add_glyphs` request.
struct Batch {
    total: usize,
    completed: usize,
    failures: usize,
    first_error: Option<String>,
    raster_time: Duration,
    started: Instant,
    callback: Option<OnComplete>,
}

pub(crate) struct Scheduler {
    work_tx: Option<Sender<GlyphJob>>,
    completion_rx: Receiver<Completion>,
    worker: Option<JoinHandle<()>>,
    batches: HashMap<RequestId, Batch>,
    /// Jobs handed to the worker and not yet drained; the value lists every
    /// batch waiting on the result.
    pending: HashMap<(FontId, char), Vec<RequestId>>,
}

fn worker_loop(work_rx: &Receiver<GlyphJob>, completion_tx: &Sender<Completion>) {
    while let Ok(job) = work_rx.recv() {
        let started = Instant::now();
        let result = raster::compose_cell(job.face.as_ref(), job.codepoint, &job.params);
        let completion = Completion {
            font: job.font,
            codepoint: job.codepoint,
            result,
            elapsed: started.elapsed(),
        };
        // receiver gone means the scheduler is shutting down
        if completion_tx.send(completion).is_err() {
            break;
        }
    }
}

impl Scheduler {
    pub fn new() -> Result<Self> {
        let (work_tx, work_rx) = channel::<GlyphJob>();
        let (completion_tx, completion_rx) = channel::<Completion>();
        let worker = std::thread::Builder::new()
            .name("glyphgen-worker".to_string())
            .spawn(move || worker_loop(&work_rx, &completion_tx))?;
        Ok(Self {
            work_tx: Some(work_tx),
            completion_rx,
            worker: Some(worker),
            batches: HashMap::new(),
            pending: HashMap::new(),
        })
    }

    /// Register one batch and queue its jobs in order.
    ///
    /// Jobs whose (font, codepoint) is already in flight are not queued
    /// again; the batch waits on the existing job. A batch with no jobs at
    /// all completes on the next [`drain`](Self::drain).
    pub fn submit_batch(
        &mut self,
        request: RequestId,
        jobs: Vec<GlyphJob>,
        callback: Option<OnComplete>,
    ) -> Result<()> {
        let batch = Batch {
            total: jobs.len(),
            completed: 0,
            failures: 0,
            first_error: None,
            raster_time: Duration::ZERO,
            started: Instant::now(),
            callback,
        };
        log::debug!(
            "batch {}: submitting {} glyph jobs",
            request.raw(),
            batch.total
        );

        for job in jobs {
            let key = (job.font, job.codepoint);
            if let Some(waiters) = self.pending.get_mut(&key) {
                waiters.push(request);
                continue;
            }
            self.work_tx
                .as_ref()
                .ok_or(GlyphGenError::WorkerGone)?
                .send(job)
                .map_err(|_| GlyphGenError::WorkerGone)?;
            self.pending.insert(key, vec![request]);
        }
        self.batches.insert(request, batch);
        Ok(())
    }

    /// Number of jobs still in flight for one font.
    pub fn pending_jobs(&self, font: FontId) -> usize {
        self.pending.keys().filter(|(id, _)| *id == font).count()
    }

    /// Process completed jobs on the calling thread until the channel is
    /// empty or `budget` has elapsed, then fire every batch whose last job
    /// has completed. `integrate` hands each successful cell to the glyph
    /// store; its error counts as that glyph's failure.
    ///
    /// Returns the number of cells integrated.
    pub fn drain<F>(&mut self, budget: Duration, mut integrate: F) -> usize
    where
        F: FnMut(FontId, char, &GlyphMetrics, GlyphCell) -> Result<()>,
    {
        let deadline = Instant::now() + budget;
        let mut integrated = 0;

        loop {
            let completion = match self.completion_rx.try_recv() {
                Ok(completion) => completion,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::error!("glyph worker thread terminated unexpectedly");
                    break;
                }
            };

            let waiters = self
                .pending
                .remove(&(completion.font, completion.codepoint))
                .unwrap_or_default();

            let outcome = match completion.result {
                Ok((metrics, cell)) => {
                    match integrate(completion.font, completion.codepoint, &metrics, cell) {
                        Ok(()) => {
                            integrated += 1;
                            Ok(())
                        }
                        Err(err) => {
                            log::warn!(
                                "failed to store glyph U+{:04X}: {err}",
                                completion.codepoint as u32
                            );
                            Err(err.to_string())
                        }
                    }
                }
                Err(err) => {
                    log::warn!(
                        "failed to generate glyph U+{:04X}: {err}",
                        completion.codepoint as u32
                    );
                    Err(err.to_string())
                }
            };

            for request in waiters {
                self.credit(request, &outcome, completion.elapsed);
            }

            if Instant::now() >= deadline {
                break;
            }
        }

        self.fire_finished();
        integrated
    }

    fn credit(
        &mut self,
        request: RequestId,
        outcome: &std::result::Result<(), String>,
        elapsed: Duration,
    ) {
        let Some(batch) = self.batches.get_mut(&request) else {
            return;
        };
        batch.completed += 1;
        batch.raster_time += elapsed;
        if let Err(message) = outcome {
            batch.failures += 1;
            if batch.first_error.is_none() {
                batch.first_error = Some(message.clone());
            }
        }
    }

    fn fire_finished(&mut self) {
        let finished: Vec<RequestId> = self
            .batches
            .iter()
            .filter(|(_, batch)| batch.completed >= batch.total)
            .map(|(request, _)| *request)
            .collect();

        for request in finished {
            let Some(mut batch) = self.batches.remove(&request) else {
                continue;
            };
            let outcome = BatchOutcome {
                total: batch.total,
                failures: batch.failures,
                first_error: batch.first_error.take(),
                raster_time: batch.raster_time,
            };
            log::debug!(
                "batch {}: {}/{} glyphs ok, raster {:?}, wall {:?}",
                request.raw(),
                outcome.total - outcome.failures,
                outcome.total,
                outcome.raster_time,
                batch.started.elapsed()
            );
            if let Some(callback) = batch.callback.take() {
                callback(request, outcome);
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // closing the work channel ends the worker loop
        self.work_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("glyph worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphgen_core::{FaceBounds, FaceMetrics, GlyphHMetrics, SdfBitmap};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct TinyFace;

    impl OutlineFace for TinyFace {
        fn path(&self) -> &str {
            "/fonts/tiny.ttf"
        }
        fn glyph_index(&self, codepoint: char) -> Option<u16> {
            codepoint.is_ascii_alphanumeric().then_some(codepoint as u16)
        }
        fn scale_for_pixel_height(&self, pixel_height: f32) -> f32 {
            pixel_height / 1000.0
        }
        fn metrics(&self) -> FaceMetrics {
            FaceMetrics {
                ascent: 800.0,
                descent: -200.0,
                line_gap: 0.0,
            }
        }
        fn bounds(&self) -> FaceBounds {
            FaceBounds {
                x_min: 0.0,
                y_min: -200.0,
                x_max: 600.0,
                y_max: 800.0,
            }
        }
        fn h_metrics(&self, _glyph: u16) -> GlyphHMetrics {
            GlyphHMetrics {
                advance: 600.0,
                left_bearing: 0.0,
            }
        }
        fn render_sdf(
            &self,
            _glyph: u16,
            _scale: f32,
            _padding: u32,
            _edge_value: u8,
        ) -> Result<Option<SdfBitmap>> {
            Ok(Some(SdfBitmap {
                width: 1,
                height: 1,
                offset_x: 0,
                offset_y: -1,
                data: vec![255],
            }))
        }
    }

    fn params() -> RenderJobParams {
        RenderJobParams {
            scale: 0.024,
            padding: 3,
            edge_value: 190,
            cell_width: 4,
            cell_height: 4,
            cell_max_ascent: 2,
            has_shadow: false,
            compress_cells: false,
        }
    }

    fn job(font: FontId, codepoint: char) -> GlyphJob {
        GlyphJob {
            font,
            codepoint,
            face: Arc::new(TinyFace),
            params: params(),
        }
    }

    type Fired = Rc<RefCell<Vec<(RequestId, BatchOutcome)>>>;

    fn recording_callback(fired: &Fired) -> OnComplete {
        let fired = fired.clone();
        Box::new(move |request, outcome| fired.borrow_mut().push((request, outcome)))
    }

    fn drain_until<F>(scheduler: &mut Scheduler, mut done: F) -> usize
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut integrated = 0;
        while !done() {
            assert!(Instant::now() < deadline, "batch never completed");
            integrated += scheduler.drain(Duration::from_millis(1), |_, _, _, _| Ok(()));
            std::thread::yield_now();
        }
        integrated
    }

    #[test]
    fn batch_callback_fires_once_after_all_jobs() {
        let mut scheduler = Scheduler::new().unwrap();
        let font = FontId::from_path("/a.fontc");
        let request = RequestId::from_raw(1);
        let fired: Fired = Rc::new(RefCell::new(Vec::new()));

        scheduler
            .submit_batch(
                request,
                vec![job(font, 'A'), job(font, 'b'), job(font, 'c')],
                Some(recording_callback(&fired)),
            )
            .unwrap();

        let integrated = drain_until(&mut scheduler, || !fired.borrow().is_empty());
        assert_eq!(integrated, 3);

        let fired = fired.borrow();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, request);
        assert_eq!(fired[0].1.total, 3);
        assert!(fired[0].1.success());
        assert_eq!(scheduler.pending_jobs(font), 0);
    }

    #[test]
    fn zero_job_batch_completes_on_next_drain() {
        let mut scheduler = Scheduler::new().unwrap();
        let request = RequestId::from_raw(7);
        let fired: Fired = Rc::new(RefCell::new(Vec::new()));

        scheduler
            .submit_batch(request, Vec::new(), Some(recording_callback(&fired)))
            .unwrap();
        assert!(fired.borrow().is_empty(), "never reentrant");

        scheduler.drain(Duration::from_millis(1), |_, _, _, _| Ok(()));
        let fired = fired.borrow();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1.total, 0);
        assert!(fired[0].1.success());
    }

    #[test]
    fn in_flight_glyphs_are_not_rasterized_twice() {
        let mut scheduler = Scheduler::new().unwrap();
        let font = FontId::from_path("/a.fontc");
        let fired: Fired = Rc::new(RefCell::new(Vec::new()));

        // same codepoint from two batches before any drain
        scheduler
            .submit_batch(
                RequestId::from_raw(1),
                vec![job(font, 'A')],
                Some(recording_callback(&fired)),
            )
            .unwrap();
        scheduler
            .submit_batch(
                RequestId::from_raw(2),
                vec![job(font, 'A')],
                Some(recording_callback(&fired)),
            )
            .unwrap();
        assert_eq!(scheduler.pending_jobs(font), 1);

        let integrated = drain_until(&mut scheduler, || fired.borrow().len() == 2);
        // one rasterization satisfied both batches
        assert_eq!(integrated, 1);
        assert!(fired.borrow().iter().all(|(_, outcome)| outcome.success()));
    }

    #[test]
    fn failures_aggregate_and_keep_the_first_error() {
        let mut scheduler = Scheduler::new().unwrap();
        let font = FontId::from_path("/a.fontc");
        let request = RequestId::from_raw(3);
        let fired: Fired = Rc::new(RefCell::new(Vec::new()));

        // '\u{E000}' and '\u{E001}' have no glyph in TinyFace
        scheduler
            .submit_batch(
                request,
                vec![job(font, 'A'), job(font, '\u{E000}'), job(font, '\u{E001}')],
                Some(recording_callback(&fired)),
            )
            .unwrap();

        drain_until(&mut scheduler, || !fired.borrow().is_empty());
        let fired = fired.borrow();
        let outcome = &fired[0].1;
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.failures, 2);
        assert!(!outcome.success());
        // submission order is FIFO per worker, so the first failure wins
        assert!(outcome.first_error.as_deref().unwrap_or("").contains("U+E000"));
    }

    #[test]
    fn integration_errors_count_as_failures() {
        let mut scheduler = Scheduler::new().unwrap();
        let font = FontId::from_path("/a.fontc");
        let request = RequestId::from_raw(4);
        let fired: Fired = Rc::new(RefCell::new(Vec::new()));

        scheduler
            .submit_batch(request, vec![job(font, 'A')], Some(recording_callback(&fired)))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while fired.borrow().is_empty() {
            assert!(Instant::now() < deadline, "batch never completed");
            scheduler.drain(Duration::from_millis(1), |_, _, _, _| {
                Err(GlyphGenError::CacheRejected("atlas full".to_string()))
            });
            std::thread::yield_now();
        }

        let fired = fired.borrow();
        assert_eq!(fired[0].1.failures, 1);
        assert!(fired[0].1.first_error.as_deref().unwrap_or("").contains("atlas full"));
    }

    #[test]
    fn pending_jobs_is_per_font() {
        let mut scheduler = Scheduler::new().unwrap();
        let font_a = FontId::from_path("/a.fontc");
        let font_b = FontId::from_path("/b.fontc");

        scheduler
            .submit_batch(
                RequestId::from_raw(5),
                vec![job(font_a, 'x'), job(font_a, 'y'), job(font_b, 'x')],
                None,
            )
            .unwrap();
        assert_eq!(scheduler.pending_jobs(font_a), 2);
        assert_eq!(scheduler.pending_jobs(font_b), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        while scheduler.pending_jobs(font_a) > 0 || scheduler.pending_jobs(font_b) > 0 {
            assert!(Instant::now() < deadline, "jobs never drained");
            scheduler.drain(Duration::from_millis(1), |_, _, _, _| Ok(()));
            std::thread::yield_now();
        }
    }
}
