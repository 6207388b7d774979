use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use mandelscope_core::{pixel_to_point, Fractal, OutputSize, Viewport};

use crate::frame::FrameBuffer;
use crate::tile::{build_row_bands, RowBand};
use crate::version::RenderVersion;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle of the current render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    Idle,
    Scheduling,
    InProgress,
    Complete,
}

impl PassPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Scheduling => "Scheduling\u{2026}",
            Self::InProgress => "Rendering\u{2026}",
            Self::Complete => "Done",
        }
    }
}

/// Completion signal sent by a row task to the coordinator.
#[derive(Debug, Clone)]
pub struct RowComplete {
    /// Version the task was submitted under.
    pub version: u64,
    pub band: RowBand,
    /// `band.height` rows of `width` intensities, unpadded.
    pub pixels: Vec<u8>,
}

/// Reported once when every row of the current pass has arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassComplete {
    pub version: u64,
    /// The viewport snapshot the pass was computed from.
    pub viewport: Viewport,
    pub size: OutputSize,
    pub elapsed: Duration,
}

/// Immutable inputs of one pass, shared by all of its row tasks.
struct PassContext<F> {
    version: u64,
    viewport: Viewport,
    size: OutputSize,
    fractal: F,
}

/// Coordinator-side bookkeeping for the current pass.
struct ActivePass {
    version: u64,
    viewport: Viewport,
    size: OutputSize,
    rows_done: u32,
    rows_seen: Vec<bool>,
    started: Instant,
}

// ---------------------------------------------------------------------------
// Row rendering
// ---------------------------------------------------------------------------

/// Compute the intensities of every pixel in `band`, row-major, unpadded.
pub fn render_band<F: Fractal>(
    fractal: &F,
    viewport: &Viewport,
    size: OutputSize,
    band: RowBand,
) -> Vec<u8> {
    let width = size.width();
    let mut pixels = Vec::with_capacity(band.pixel_count(width));
    for y in band.rows() {
        for x in 0..width {
            let c = pixel_to_point(size, x as f64, y as f64, viewport);
            pixels.push(fractal.intensity_at(c));
        }
    }
    pixels
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Splits each pass into row bands, runs them on a bounded rayon pool, and
/// folds their results back into the frame on the coordinating thread.
///
/// All methods take `&mut self`, so whoever owns the scheduler is the single
/// coordination context: only it touches the frame, the counter, or the
/// phase. Worker threads share nothing mutable besides the atomic version;
/// finished bands travel back over an `mpsc` channel.
pub struct TileScheduler {
    pool: rayon::ThreadPool,
    version: Arc<RenderVersion>,
    tx: mpsc::Sender<RowComplete>,
    rx: mpsc::Receiver<RowComplete>,
    frame: Option<FrameBuffer>,
    pass: Option<ActivePass>,
    phase: PassPhase,
    band_rows: u32,
}

impl TileScheduler {
    /// `threads == 0` lets rayon pick one thread per core.
    pub fn new(threads: usize, band_rows: u32) -> crate::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("render-{i}"))
            .build()?;
        let (tx, rx) = mpsc::channel();
        debug!(threads = pool.current_num_threads(), band_rows, "Render pool ready");
        Ok(Self {
            pool,
            version: Arc::new(RenderVersion::new()),
            tx,
            rx,
            frame: None,
            pass: None,
            phase: PassPhase::Idle,
            band_rows: band_rows.max(1),
        })
    }

    /// Supersede any pass in flight and start rendering `viewport` at `size`.
    ///
    /// The viewport is captured by value: tasks never observe later viewport
    /// changes. If the frame cannot be (re)allocated the new pass is abandoned,
    /// the phase drops to `Idle` and the previous frame contents are kept.
    pub fn start_pass<F>(
        &mut self,
        fractal: F,
        viewport: Viewport,
        size: OutputSize,
    ) -> crate::Result<u64>
    where
        F: Fractal + Send + Sync + 'static,
    {
        self.phase = PassPhase::Scheduling;
        let version = self.version.advance();

        if let Err(e) = prepare_frame(&mut self.frame, size) {
            warn!(version, %size, error = %e, "Abandoning render pass");
            self.pass = None;
            self.phase = PassPhase::Idle;
            return Err(e);
        }

        let bands = build_row_bands(size.height(), self.band_rows);
        debug!(version, %size, %viewport, bands = bands.len(), "Starting render pass");

        let ctx = Arc::new(PassContext {
            version,
            viewport,
            size,
            fractal,
        });
        for band in bands {
            let ctx = Arc::clone(&ctx);
            let live = Arc::clone(&self.version);
            let tx = self.tx.clone();
            self.pool.spawn(move || {
                // Superseded before it started: skip the work entirely.
                if !live.is_current(ctx.version) {
                    return;
                }
                let pixels = render_band(&ctx.fractal, &ctx.viewport, ctx.size, band);
                // The receiver lives as long as the scheduler; a failed send
                // only happens during teardown.
                let _ = tx.send(RowComplete {
                    version: ctx.version,
                    band,
                    pixels,
                });
            });
        }

        self.pass = Some(ActivePass {
            version,
            viewport,
            size,
            rows_done: 0,
            rows_seen: vec![false; size.height() as usize],
            started: Instant::now(),
        });
        self.phase = PassPhase::InProgress;
        Ok(version)
    }

    /// Fold one completion signal into the current pass.
    ///
    /// Stale or malformed signals are dropped without touching the frame or
    /// the counter. Returns `Some` exactly once per pass, on the signal that
    /// brings the row count to the frame height.
    pub fn accept(&mut self, signal: RowComplete) -> Option<PassComplete> {
        let Some(pass) = self.pass.as_mut() else {
            trace!(version = signal.version, "Discarding rows: no active pass");
            return None;
        };
        if signal.version != pass.version {
            trace!(
                stale = signal.version,
                current = pass.version,
                y = signal.band.y,
                "Discarding stale rows"
            );
            return None;
        }
        let frame = self.frame.as_mut()?;

        let band = signal.band;
        let in_bounds = band.height > 0
            && band.y.checked_add(band.height).is_some_and(|end| end <= frame.height());
        if !in_bounds || signal.pixels.len() != band.pixel_count(frame.width()) {
            warn!(?band, len = signal.pixels.len(), "Ignoring malformed row signal");
            return None;
        }
        if band.rows().any(|y| pass.rows_seen[y as usize]) {
            warn!(?band, version = pass.version, "Ignoring duplicate row signal");
            return None;
        }

        frame.blit_band(&band, &signal.pixels);
        for y in band.rows() {
            pass.rows_seen[y as usize] = true;
        }
        pass.rows_done += band.height;
        if pass.rows_done < frame.height() {
            return None;
        }

        self.phase = PassPhase::Complete;
        let elapsed = pass.started.elapsed();
        info!(
            version = pass.version,
            size = %pass.size,
            elapsed_ms = elapsed.as_millis(),
            "Render pass complete"
        );
        Some(PassComplete {
            version: pass.version,
            viewport: pass.viewport,
            size: pass.size,
            elapsed,
        })
    }

    /// Drain every pending signal without blocking.
    pub fn pump(&mut self) -> Option<PassComplete> {
        let mut completed = None;
        while let Ok(signal) = self.rx.try_recv() {
            if let Some(done) = self.accept(signal) {
                completed = Some(done);
            }
        }
        completed
    }

    /// Block until the current pass completes or `timeout` elapses.
    ///
    /// Returns `None` on timeout, or straight away if no pass is in progress.
    /// A timeout too large to represent as a deadline waits without limit.
    pub fn wait(&mut self, timeout: Duration) -> Option<PassComplete> {
        let deadline = Instant::now().checked_add(timeout);
        while self.phase == PassPhase::InProgress {
            let received = match deadline {
                Some(deadline) => self
                    .rx
                    .recv_timeout(deadline.saturating_duration_since(Instant::now()))
                    .ok(),
                None => self.rx.recv().ok(),
            };
            let signal = received?;
            if let Some(done) = self.accept(signal) {
                return Some(done);
            }
        }
        None
    }

    pub fn phase(&self) -> PassPhase {
        self.phase
    }

    /// The latest version handed out, i.e. the only one whose rows count.
    pub fn current_version(&self) -> u64 {
        self.version.current()
    }

    /// `(rows completed, rows in pass)` for the current pass.
    pub fn progress(&self) -> (u32, u32) {
        self.pass
            .as_ref()
            .map_or((0, 0), |p| (p.rows_done, p.size.height()))
    }

    /// The frame being filled (or last filled). `None` before the first pass.
    pub fn frame(&self) -> Option<&FrameBuffer> {
        self.frame.as_ref()
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

fn prepare_frame(slot: &mut Option<FrameBuffer>, size: OutputSize) -> crate::Result<()> {
    if let Some(frame) = slot {
        frame.prepare(size)?;
        return Ok(());
    }
    *slot = Some(FrameBuffer::new(size)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandelscope_core::{Complex, FractalParams, Mandelbrot};

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn mandelbrot(max_iterations: u32) -> Mandelbrot {
        Mandelbrot::new(FractalParams::new(max_iterations).unwrap())
    }

    fn size(w: u32, h: u32) -> OutputSize {
        OutputSize::new(w, h).unwrap()
    }

    #[test]
    fn pass_completes_and_matches_sequential_render() {
        let mut scheduler = TileScheduler::new(4, 1).unwrap();
        let vp = Viewport::default();
        let sz = size(32, 20);
        let version = scheduler.start_pass(mandelbrot(50), vp, sz).unwrap();
        assert_eq!(scheduler.phase(), PassPhase::InProgress);

        let done = scheduler.wait(TIMEOUT).expect("pass should complete");
        assert_eq!(done.version, version);
        assert_eq!(done.viewport, vp);
        assert_eq!(scheduler.phase(), PassPhase::Complete);
        assert_eq!(scheduler.progress(), (20, 20));

        let frame = scheduler.frame().unwrap();
        let expected = render_band(&mandelbrot(50), &vp, sz, RowBand { y: 0, height: 20 });
        for y in 0..20 {
            let start = (y * 32) as usize;
            assert_eq!(frame.row(y), &expected[start..start + 32], "row {y}");
        }
    }

    #[test]
    fn stale_signal_is_not_counted() {
        let mut scheduler = TileScheduler::new(1, 1).unwrap();
        let sz = size(2, 2);
        let old = scheduler.start_pass(mandelbrot(10), Viewport::default(), sz).unwrap();
        let new = scheduler.start_pass(mandelbrot(10), Viewport::default(), sz).unwrap();
        assert_eq!(new, old + 1);

        for y in 0..2 {
            let stale = RowComplete {
                version: old,
                band: RowBand { y, height: 1 },
                pixels: vec![99, 99],
            };
            assert!(scheduler.accept(stale).is_none());
        }
        assert_eq!(scheduler.progress(), (0, 2));
        assert_ne!(scheduler.phase(), PassPhase::Complete);
        assert!(scheduler.frame().unwrap().as_bytes().iter().all(|&b| b != 99));
    }

    #[test]
    fn only_the_last_of_many_passes_completes() {
        let mut scheduler = TileScheduler::new(4, 2).unwrap();
        let sz = size(24, 16);
        let mut last = 0;
        for i in 0..5 {
            let vp = Viewport::default()
                .translated(Complex::new(0.1 * i as f64, 0.0))
                .unwrap();
            last = scheduler.start_pass(mandelbrot(40), vp, sz).unwrap();
        }
        assert_eq!(scheduler.current_version(), last);

        let done = scheduler.wait(TIMEOUT).expect("final pass should complete");
        assert_eq!(done.version, last);
        assert_eq!(scheduler.progress(), (16, 16));
        // Late rows from superseded passes change nothing.
        std::thread::sleep(Duration::from_millis(20));
        assert!(scheduler.pump().is_none());
        assert_eq!(scheduler.progress(), (16, 16));
    }

    #[test]
    fn completion_is_reported_exactly_once() {
        let mut scheduler = TileScheduler::new(1, 1).unwrap();
        let sz = size(3, 2);
        let version = scheduler.start_pass(mandelbrot(5), Viewport::default(), sz).unwrap();

        let row = |y| RowComplete {
            version,
            band: RowBand { y, height: 1 },
            pixels: vec![1, 2, 3],
        };
        assert!(scheduler.accept(row(0)).is_none());
        assert!(scheduler.accept(row(0)).is_none(), "duplicate row must not count");
        assert_eq!(scheduler.progress(), (1, 2));
        assert!(scheduler.accept(row(1)).is_some());
        assert_eq!(scheduler.phase(), PassPhase::Complete);

        // The real tasks for this version still report; none may complete it again.
        std::thread::sleep(Duration::from_millis(20));
        assert!(scheduler.pump().is_none());
        assert!(scheduler.wait(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn malformed_signal_is_ignored() {
        let mut scheduler = TileScheduler::new(1, 1).unwrap();
        let sz = size(4, 2);
        let version = scheduler.start_pass(mandelbrot(5), Viewport::default(), sz).unwrap();

        let short = RowComplete {
            version,
            band: RowBand { y: 0, height: 1 },
            pixels: vec![1, 2],
        };
        assert!(scheduler.accept(short).is_none());
        let out_of_range = RowComplete {
            version,
            band: RowBand { y: 2, height: 1 },
            pixels: vec![0; 4],
        };
        assert!(scheduler.accept(out_of_range).is_none());
        assert_eq!(scheduler.progress().0, 0);
    }

    #[test]
    fn failed_allocation_abandons_pass_and_keeps_frame() {
        let mut scheduler = TileScheduler::new(2, 1).unwrap();
        scheduler
            .start_pass(mandelbrot(10), Viewport::default(), size(4, 4))
            .unwrap();
        scheduler.wait(TIMEOUT).unwrap();
        let before = scheduler.frame().unwrap().as_bytes().to_vec();

        let err = scheduler
            .start_pass(mandelbrot(10), Viewport::default(), size(u32::MAX, 1))
            .unwrap_err();
        assert!(matches!(err, crate::RenderError::InvalidDimensions { .. }));
        assert_eq!(scheduler.phase(), PassPhase::Idle);
        assert_eq!(scheduler.progress(), (0, 0));
        assert_eq!(scheduler.frame().unwrap().as_bytes(), before.as_slice());
    }

    #[test]
    fn signal_without_pass_is_ignored() {
        let mut scheduler = TileScheduler::new(1, 1).unwrap();
        let signal = RowComplete {
            version: 0,
            band: RowBand { y: 0, height: 1 },
            pixels: vec![],
        };
        assert!(scheduler.accept(signal).is_none());
        assert_eq!(scheduler.phase(), PassPhase::Idle);
        assert!(scheduler.wait(Duration::from_millis(1)).is_none());
    }

    #[test]
    fn phase_labels() {
        assert_eq!(PassPhase::Idle.label(), "Idle");
        assert_eq!(PassPhase::Complete.label(), "Done");
    }

    #[test]
    fn unbounded_wait_completes_the_pass() {
        let mut scheduler = TileScheduler::new(2, 1).unwrap();
        let version = scheduler
            .start_pass(mandelbrot(20), Viewport::default(), size(8, 6))
            .unwrap();
        let done = scheduler.wait(Duration::MAX).expect("pass should complete");
        assert_eq!(done.version, version);
        assert_eq!(scheduler.phase(), PassPhase::Complete);
        // Nothing in progress any more: returns at once even without a limit.
        assert!(scheduler.wait(Duration::MAX).is_none());
    }
}
