//! Live analysis session: capture → pooled windows → analysis thread → subscriber.
//!
//! The capture callback only fills pooled buffers and `try_send`s them on a
//! bounded queue, so it never blocks. A single named thread analyzes windows
//! in FIFO order, keeps the rolling history and publishes through a
//! publish gate. `stop()` closes the gate under its lock: once it returns,
//! no callback can run, even for a window that was mid-analysis.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use arc_swap::ArcSwapOption;
use serde::Serialize;

use ms_core::config::EngineConfig;
use ms_core::features::AudioFeatures;
use ms_core::frame::{AudioFormat, SampleWindow};
use ms_core::mood::{Mood, classify};
use ms_core::traits::{CaptureSource, FileReader, FrameSink};

use crate::batch::{BatchAnalyzer, BatchReport};
use crate::decode::SymphoniaReader;
use crate::error::AudioError;
use crate::features::to_audio_features;
use crate::history::FeatureHistory;
use crate::pool::{BufferPool, PoolStats, PooledBuffer};
use crate::spectral::SpectralEngine;

/// One analyzed window, handed to the subscriber by value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FeatureUpdate {
    /// Instantaneous features of the window.
    pub features: AudioFeatures,
    /// Mood of `features`.
    pub mood: Mood,
}

type Subscriber = Box<dyn FnMut(FeatureUpdate) + Send>;

/// Point de publication d'une session.
///
/// The subscriber slot is the only thing `stop()` and the analysis thread
/// contend on.
struct PublishGate {
    subscriber: Mutex<Option<Subscriber>>,
    averaged: Arc<ArcSwapOption<AudioFeatures>>,
}

impl PublishGate {
    fn new(subscriber: Subscriber, averaged: Arc<ArcSwapOption<AudioFeatures>>) -> Self {
        Self {
            subscriber: Mutex::new(Some(subscriber)),
            averaged,
        }
    }

    fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Publish under the lock. Returns `false` once the gate is closed.
    fn publish(&self, update: FeatureUpdate, average: Option<AudioFeatures>) -> bool {
        let mut slot = self.lock();
        let Some(subscriber) = slot.as_mut() else {
            return false;
        };
        self.averaged.store(average.map(Arc::new));
        subscriber(update);
        true
    }

    /// Waits for an in-flight `publish` to finish, then empties the slot.
    fn close(&self) {
        let subscriber = self.lock().take();
        drop(subscriber);
    }

    fn lock(&self) -> MutexGuard<'_, Option<Subscriber>> {
        self.subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Capture-side sink: fills pooled buffers to exactly one window.
struct QueueSink {
    pool: Arc<BufferPool>,
    format: AudioFormat,
    window_frames: usize,
    tx: flume::Sender<PooledBuffer>,
    pending: Option<PooledBuffer>,
    /// Samples skipped since the last whole window counted as dropped.
    skipped: usize,
    dropped: Arc<AtomicU64>,
}

impl QueueSink {
    fn dispatch(&mut self, buffer: PooledBuffer) {
        match self.tx.try_send(buffer) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(buffer)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("File d'analyse pleine, fenêtre abandonnée");
                self.pool.release(buffer);
            }
            Err(flume::TrySendError::Disconnected(buffer)) => self.pool.release(buffer),
        }
    }

    /// Count skipped samples in whole windows, whatever the block size.
    fn skip(&mut self, samples: usize) {
        let window = self.window_frames * usize::from(self.format.channels);
        self.skipped += samples;
        let windows = self.skipped / window;
        self.skipped %= window;
        if windows > 0 {
            self.dropped.fetch_add(windows as u64, Ordering::Relaxed);
            log::debug!("Pool épuisé : {windows} fenêtre(s) abandonnée(s)");
        }
    }
}

impl FrameSink for QueueSink {
    fn deliver(&mut self, mut samples: &[f32]) {
        while !samples.is_empty() {
            if self.pending.is_none() {
                self.pending = self.pool.request(self.format, self.window_frames);
            }
            // Pool exhausted: the rest of this block is skipped.
            let Some(buffer) = self.pending.as_mut() else {
                self.skip(samples.len());
                return;
            };
            let taken = buffer.fill_from(samples);
            samples = &samples[taken..];
            if buffer.is_full()
                && let Some(full) = self.pending.take()
            {
                self.dispatch(full);
            }
        }
    }
}

/// Analysis thread body. Ends when every sender (the capture sink) is gone;
/// queued buffers are still drained back to the pool.
fn run_analysis(
    mut engine: SpectralEngine,
    rx: &flume::Receiver<PooledBuffer>,
    pool: &BufferPool,
    gate: &PublishGate,
    history_len: usize,
) {
    let mut history = FeatureHistory::new(history_len);
    for buffer in rx.iter() {
        let result = gate
            .is_open()
            .then(|| engine.analyze_window(&SampleWindow::new(buffer.samples(), buffer.format())));
        pool.release(buffer);

        match result {
            Some(Ok(spectral)) => {
                let features = to_audio_features(&spectral);
                history.push(features);
                let update = FeatureUpdate {
                    features,
                    mood: classify(&features),
                };
                gate.publish(update, history.average());
            }
            Some(Err(e)) => log::debug!("Fenêtre ignorée : {e}"),
            None => {}
        }
    }
    log::debug!("Thread d'analyse terminé ({} entrées d'historique)", history.len());
}

/// Orchestrateur de l'analyse : capture en direct et analyse de fichiers.
///
/// States are `idle` and `analyzing`; [`stop`](Self::stop) is idempotent and
/// also runs on drop.
pub struct FeaturePipeline {
    config: EngineConfig,
    pool: Arc<BufferPool>,
    capture: Box<dyn CaptureSource>,
    reader: Box<dyn FileReader>,
    averaged: Arc<ArcSwapOption<AudioFeatures>>,
    dropped: Arc<AtomicU64>,
    session: Option<Arc<PublishGate>>,
}

impl FeaturePipeline {
    /// Build an idle pipeline reading files through symphonia.
    #[must_use]
    pub fn new(config: EngineConfig, pool: Arc<BufferPool>, capture: Box<dyn CaptureSource>) -> Self {
        Self {
            config,
            pool,
            capture,
            reader: Box::new(SymphoniaReader),
            averaged: Arc::new(ArcSwapOption::empty()),
            dropped: Arc::new(AtomicU64::new(0)),
            session: None,
        }
    }

    /// Replace the file reader used by [`analyze_file`](Self::analyze_file).
    #[must_use]
    pub fn with_reader(mut self, reader: Box<dyn FileReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Start a live session; `on_update` runs on the analysis thread once per
    /// analyzed window.
    ///
    /// # Errors
    /// - `AlreadyActive` if a session is running.
    /// - `InvalidFormat` / `TransformUnavailable` for an unusable capture
    ///   format or analysis configuration.
    /// - `Worker` if the analysis thread cannot be spawned.
    /// - `Capture` if the capture source refuses to start. The pipeline
    ///   stays idle.
    pub fn start(
        &mut self,
        on_update: impl FnMut(FeatureUpdate) + Send + 'static,
    ) -> Result<(), AudioError> {
        if self.session.is_some() {
            return Err(AudioError::AlreadyActive);
        }
        let format = self.capture.format();
        if format.channels == 0 {
            return Err(AudioError::InvalidFormat("aucun canal".to_string()));
        }
        let engine = SpectralEngine::new(&self.config.analysis, format.sample_rate)?;
        let window_frames = engine.window_size();

        let (tx, rx) = flume::bounded(self.config.pipeline.queue_capacity.max(1));
        let gate = Arc::new(PublishGate::new(
            Box::new(on_update),
            Arc::clone(&self.averaged),
        ));

        {
            let pool = Arc::clone(&self.pool);
            let gate = Arc::clone(&gate);
            let history_len = self.config.pipeline.history_len;
            thread::Builder::new()
                .name("ms-analysis".to_string())
                .spawn(move || run_analysis(engine, &rx, &pool, &gate, history_len))
                .map_err(|e| AudioError::Worker(e.to_string()))?;
        }

        self.dropped.store(0, Ordering::Relaxed);
        let sink = QueueSink {
            pool: Arc::clone(&self.pool),
            format,
            window_frames,
            tx,
            pending: None,
            skipped: 0,
            dropped: Arc::clone(&self.dropped),
        };
        if let Err(e) = self.capture.start(Box::new(sink)) {
            gate.close();
            self.capture.stop();
            return Err(AudioError::Capture(format!("{e:#}")));
        }

        self.session = Some(gate);
        log::info!(
            "Analyse démarrée : {} Hz, {} canal(aux), fenêtre de {window_frames} trames",
            format.sample_rate,
            format.channels
        );
        Ok(())
    }

    /// Like [`start`](Self::start), handing updates to whichever thread owns
    /// the returned receiver. Updates are dropped, never queued without
    /// bound, when the receiver falls behind; they count in
    /// [`dropped_windows`](Self::dropped_windows).
    ///
    /// # Errors
    /// Same as [`start`](Self::start).
    pub fn start_channel(&mut self) -> Result<flume::Receiver<FeatureUpdate>, AudioError> {
        let (tx, rx) = flume::bounded(self.config.pipeline.queue_capacity.max(1));
        let dropped = Arc::clone(&self.dropped);
        self.start(move |update| match tx.try_send(update) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(_)) => {
                dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("Récepteur en retard, mise à jour abandonnée");
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                log::debug!("Récepteur fermé, mise à jour ignorée");
            }
        })?;
        Ok(rx)
    }

    /// Stop the session. Idempotent. No update is delivered after this
    /// returns; the history and the published average are discarded.
    pub fn stop(&mut self) {
        let Some(gate) = self.session.take() else {
            return;
        };
        gate.close();
        self.capture.stop();
        self.averaged.store(None);
        log::info!(
            "Analyse arrêtée ({} fenêtre(s) abandonnée(s))",
            self.dropped.load(Ordering::Relaxed)
        );
    }

    /// `true` between a successful `start` and `stop`.
    #[must_use]
    pub fn is_analyzing(&self) -> bool {
        self.session.is_some()
    }

    /// Mean of the current history; `None` when idle or nothing analyzed yet.
    #[must_use]
    pub fn averaged_features(&self) -> Option<AudioFeatures> {
        self.averaged.load().as_deref().copied()
    }

    /// Mood of [`averaged_features`](Self::averaged_features).
    #[must_use]
    pub fn averaged_mood(&self) -> Option<Mood> {
        self.averaged_features().as_ref().map(classify)
    }

    /// Analyze a whole file synchronously; `None` on I/O error or when no
    /// complete window was produced.
    #[must_use]
    pub fn analyze_file(&self, path: &Path) -> Option<AudioFeatures> {
        match self.analyze_file_report(path) {
            Ok(report) => report.average,
            Err(e) => {
                log::warn!("Analyse de {} impossible : {e}", path.display());
                None
            }
        }
    }

    /// Analyze a whole file synchronously, with window counts.
    ///
    /// # Errors
    /// `DecodeError` if the file cannot be read; format and configuration
    /// errors from [`BatchAnalyzer::new`].
    pub fn analyze_file_report(&self, path: &Path) -> Result<BatchReport, AudioError> {
        let audio = self
            .reader
            .read(path)
            .map_err(|e| AudioError::DecodeError(format!("{e:#}")))?;
        let mut analyzer = BatchAnalyzer::new(&self.config.analysis, audio.format)?;
        let report = analyzer.analyze_all(&audio.samples);
        log::info!(
            "{} : {} fenêtre(s) analysée(s), {} ignorée(s), {} trame(s) de reste",
            path.display(),
            report.windows,
            report.skipped,
            report.dropped_tail
        );
        Ok(report)
    }

    /// Buffer pool diagnostics.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Windows dropped in the current session: pool exhausted, analysis queue
    /// full, or (with [`start_channel`](Self::start_channel)) update receiver
    /// full.
    #[must_use]
    pub fn dropped_windows(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for FeaturePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use ms_core::config::{AnalysisConfig, PipelineConfig, PoolConfig};
    use ms_core::frame::DecodedAudio;

    use super::*;

    const WINDOW: usize = 256;
    const RATE: u32 = 44100;
    const TIMEOUT: Duration = Duration::from_secs(5);

    type SharedSink = Arc<Mutex<Option<Box<dyn FrameSink>>>>;

    /// Capture source driven by hand from the test thread.
    struct ManualCapture {
        format: AudioFormat,
        sink: SharedSink,
        fail: bool,
    }

    impl CaptureSource for ManualCapture {
        fn format(&self) -> AudioFormat {
            self.format
        }

        fn start(&mut self, sink: Box<dyn FrameSink>) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("micro refusé");
            }
            *self.sink.lock().expect("sink lock") = Some(sink);
            Ok(())
        }

        fn stop(&mut self) {
            self.sink.lock().expect("sink lock").take();
        }
    }

    fn feed(sink: &SharedSink, samples: &[f32]) {
        if let Some(sink) = sink.lock().expect("sink lock").as_mut() {
            sink.deliver(samples);
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            analysis: AnalysisConfig {
                window_size: WINDOW,
                ..AnalysisConfig::default()
            },
            pool: PoolConfig::default(),
            pipeline: PipelineConfig {
                history_len: 3,
                queue_capacity: 16,
            },
        }
    }

    fn pipeline_with(format: AudioFormat, fail: bool) -> (FeaturePipeline, SharedSink, Arc<BufferPool>) {
        pipeline_from(config(), format, fail)
    }

    fn pipeline_from(
        config: EngineConfig,
        format: AudioFormat,
        fail: bool,
    ) -> (FeaturePipeline, SharedSink, Arc<BufferPool>) {
        let pool = Arc::new(BufferPool::new(&config.pool));
        let sink: SharedSink = Arc::new(Mutex::new(None));
        let capture = ManualCapture {
            format,
            sink: Arc::clone(&sink),
            fail,
        };
        let pipeline = FeaturePipeline::new(config, Arc::clone(&pool), Box::new(capture));
        (pipeline, sink, pool)
    }

    fn sine(len: usize, amp: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (std::f32::consts::TAU * 440.0 * i as f32 / RATE as f32).sin())
            .collect()
    }

    #[test]
    fn publishes_one_update_per_window() {
        let (mut pipeline, sink, pool) = pipeline_with(AudioFormat::mono(RATE), false);
        let rx = pipeline.start_channel().expect("start");
        assert!(pipeline.is_analyzing());

        // Deliver 2.5 windows in uneven blocks.
        let signal = sine(WINDOW * 5 / 2, 0.5);
        for block in signal.chunks(100) {
            feed(&sink, block);
        }
        let first = rx.recv_timeout(TIMEOUT).expect("first window");
        let second = rx.recv_timeout(TIMEOUT).expect("second window");
        assert_eq!(first.mood, classify(&first.features));
        assert!(second.features.energy > 0.0);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        let avg = pipeline.averaged_features().expect("published average");
        assert!(avg.energy > 0.0);
        assert!(pipeline.averaged_mood().is_some());

        pipeline.stop();
        assert!(!pipeline.is_analyzing());
        assert!(pipeline.averaged_features().is_none());
        // The partial third window went back to the pool with the sink.
        assert!(pool.stats().in_use <= 1);
    }

    #[test]
    fn second_start_is_rejected() {
        let (mut pipeline, _sink, _pool) = pipeline_with(AudioFormat::mono(RATE), false);
        pipeline.start(|_| {}).expect("first start");
        assert!(matches!(pipeline.start(|_| {}), Err(AudioError::AlreadyActive)));
        pipeline.stop();
        pipeline.start(|_| {}).expect("restart after stop");
    }

    #[test]
    fn capture_failure_leaves_pipeline_idle() {
        let (mut pipeline, _sink, _pool) = pipeline_with(AudioFormat::mono(RATE), true);
        assert!(matches!(pipeline.start(|_| {}), Err(AudioError::Capture(_))));
        assert!(!pipeline.is_analyzing());
    }

    #[test]
    fn configuration_errors_surface_at_start() {
        let (mut pipeline, _sink, _pool) = pipeline_with(AudioFormat::new(0, 1), false);
        assert!(matches!(
            pipeline.start(|_| {}),
            Err(AudioError::TransformUnavailable(_))
        ));
        let (mut pipeline, _sink, _pool) = pipeline_with(AudioFormat::new(RATE, 0), false);
        assert!(matches!(pipeline.start(|_| {}), Err(AudioError::InvalidFormat(_))));
    }

    /// Poll until `cond` holds or the timeout expires.
    fn eventually(cond: impl Fn() -> bool) -> bool {
        let deadline = std::time::Instant::now() + TIMEOUT;
        while std::time::Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        cond()
    }

    #[test]
    fn double_stop_and_no_update_after() {
        let (mut pipeline, sink, pool) = pipeline_with(AudioFormat::mono(RATE), false);
        let stopped = Arc::new(AtomicBool::new(false));
        let late = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (entered_tx, entered_rx) = flume::bounded(1);
        {
            let stopped = Arc::clone(&stopped);
            let late = Arc::clone(&late);
            let finished = Arc::clone(&finished);
            pipeline
                .start(move |_| {
                    if stopped.load(Ordering::SeqCst) {
                        late.store(true, Ordering::SeqCst);
                    }
                    let _ = entered_tx.try_send(());
                    // Fenêtre en cours pendant que stop() arrive.
                    thread::sleep(Duration::from_millis(200));
                    finished.store(true, Ordering::SeqCst);
                })
                .expect("start");
        }

        feed(&sink, &sine(WINDOW * 8, 0.3));
        entered_rx.recv_timeout(TIMEOUT).expect("callback in flight");
        pipeline.stop();
        // stop() waited for the running callback to return.
        assert!(finished.load(Ordering::SeqCst));
        stopped.store(true, Ordering::SeqCst);
        pipeline.stop();

        // The sink is gone: this is a no-op, and the queued windows drain
        // without reaching the subscriber.
        feed(&sink, &sine(WINDOW * 2, 0.3));
        assert!(eventually(|| pool.stats().in_use == 0));
        thread::sleep(Duration::from_millis(100));
        assert!(!late.load(Ordering::SeqCst));
        assert!(!pipeline.is_analyzing());
    }

    #[test]
    fn panicking_subscriber_returns_every_buffer() {
        let (mut pipeline, sink, pool) = pipeline_with(AudioFormat::mono(RATE), false);
        pipeline
            .start(|_| panic!("abonné défaillant"))
            .expect("start");
        feed(&sink, &sine(WINDOW * 8, 0.3));

        // The analysis thread is gone; stopping drops the sink, and with it
        // the last handle on the queued buffers.
        pipeline.stop();
        assert!(eventually(|| pool.stats().in_use == 0));
        let stats = pool.stats();
        assert_eq!(stats.available as u64, stats.allocations);

        pool.handle_pressure(ms_core::traits::MemoryPressure::Critical);
        assert_eq!(pool.stats().current_size, 0);
        assert!(pool.request(AudioFormat::mono(RATE), WINDOW).is_some());
    }

    #[test]
    fn slow_receiver_drops_are_counted() {
        let mut config = config();
        config.pipeline.queue_capacity = 2;
        let (mut pipeline, sink, _pool) = pipeline_from(config, AudioFormat::mono(RATE), false);
        let rx = pipeline.start_channel().expect("start");

        // One window at a time so none is lost to the analysis queue.
        for _ in 0..6 {
            let before = pipeline.dropped_windows() + rx.len() as u64;
            feed(&sink, &sine(WINDOW, 0.5));
            assert!(eventually(|| pipeline.dropped_windows() + rx.len() as u64 > before));
        }
        assert_eq!(rx.len(), 2);
        assert_eq!(pipeline.dropped_windows(), 4);
        pipeline.stop();
    }

    #[test]
    fn corrupt_window_is_skipped() {
        let (mut pipeline, sink, pool) = pipeline_with(AudioFormat::mono(RATE), false);
        let rx = pipeline.start_channel().expect("start");
        let mut bad = sine(WINDOW, 0.5);
        bad[10] = f32::INFINITY;
        feed(&sink, &bad);
        feed(&sink, &sine(WINDOW, 0.5));

        let update = rx.recv_timeout(TIMEOUT).expect("good window");
        assert!(update.features.energy > 0.0);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        pipeline.stop();
        assert_eq!(pool.stats().in_use, 0);
    }

    #[test]
    fn exhausted_pool_drops_frames() {
        let config = config();
        let pool = Arc::new(BufferPool::new(&PoolConfig {
            max_bytes: WINDOW * 4,
            ..PoolConfig::default()
        }));
        // The only buffer the budget allows is held by the test.
        let held = pool.request(AudioFormat::mono(RATE), WINDOW).expect("fits");

        let sink: SharedSink = Arc::new(Mutex::new(None));
        let capture = ManualCapture {
            format: AudioFormat::mono(RATE),
            sink: Arc::clone(&sink),
            fail: false,
        };
        let mut pipeline = FeaturePipeline::new(config, Arc::clone(&pool), Box::new(capture));
        let rx = pipeline.start_channel().expect("start");
        // Three windows in one block count as three drops.
        feed(&sink, &sine(WINDOW * 3, 0.5));
        assert_eq!(pipeline.dropped_windows(), 3);
        // Small blocks add up to whole windows.
        for block in sine(WINDOW * 2 + 50, 0.5).chunks(100) {
            feed(&sink, block);
        }
        assert_eq!(pipeline.dropped_windows(), 5);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        pool.release(held);
        feed(&sink, &sine(WINDOW, 0.5));
        assert!(rx.recv_timeout(TIMEOUT).is_ok());
    }

    struct FakeReader {
        audio: Option<DecodedAudio>,
    }

    impl FileReader for FakeReader {
        fn read(&self, path: &Path) -> anyhow::Result<DecodedAudio> {
            self.audio
                .clone()
                .ok_or_else(|| anyhow::anyhow!("illisible : {}", path.display()))
        }
    }

    fn with_file(samples: Option<Vec<f32>>) -> FeaturePipeline {
        let (pipeline, _sink, _pool) = pipeline_with(AudioFormat::mono(RATE), false);
        pipeline.with_reader(Box::new(FakeReader {
            audio: samples.map(|samples| DecodedAudio {
                samples,
                format: AudioFormat::mono(RATE),
            }),
        }))
    }

    #[test]
    fn file_windows_are_floor_of_length() {
        let path = PathBuf::from("memoire.wav");
        let pipeline = with_file(Some(sine(WINDOW * 4, 0.4)));
        let report = pipeline.analyze_file_report(&path).expect("report");
        assert_eq!((report.windows, report.dropped_tail), (4, 0));

        let pipeline = with_file(Some(sine(WINDOW * 4 + 17, 0.4)));
        let report = pipeline.analyze_file_report(&path).expect("report");
        assert_eq!((report.windows, report.dropped_tail), (4, 17));
        assert_eq!(pipeline.analyze_file(&path), report.average);
    }

    #[test]
    fn file_without_result() {
        let path = PathBuf::from("court.wav");
        assert!(with_file(Some(vec![0.1; WINDOW - 1])).analyze_file(&path).is_none());
        assert!(with_file(None).analyze_file(&path).is_none());
        assert!(matches!(
            with_file(None).analyze_file_report(&path),
            Err(AudioError::DecodeError(_))
        ));
    }
}
