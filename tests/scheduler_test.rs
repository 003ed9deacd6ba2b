mod test_signals;

use std::thread;
use std::time::Duration;

use firstream::FilterError;
use firstream::audio::{FrameBuffer, ReferenceSignal, WavFileSource};
use firstream::config::MeterConfig;
use firstream::scheduler::{NullSink, PassOutcome, Scheduler, SourceMode};
use firstream::signal_processing::{CoefficientSet, FilterEngine};

use test_signals::RecordingSink;

const FRAME: usize = 8;
const TIMEOUT: Duration = Duration::from_secs(5);

fn engine(taps: Vec<f32>) -> firstream::signal_processing::SharedEngine {
    FilterEngine::new(FRAME, CoefficientSet::new(taps).unwrap())
        .unwrap()
        .into_shared()
}

fn reference(chunks: usize) -> ReferenceSignal {
    // One extra partial chunk that must never be played
    ReferenceSignal::new(vec![0.5; chunks * FRAME + 3], 8000)
}

#[test]
fn test_toggle_resets_outstanding_chunks() {
    let (sink, scheduled) = RecordingSink::new();
    let scheduler = Scheduler::new(
        engine(vec![1.0]),
        sink.clone(),
        Some(reference(4)),
        &MeterConfig::default(),
    );
    let worker = scheduler.spawn_loop_worker().unwrap();

    scheduler.set_mode(SourceMode::Looped);
    let first_epoch = scheduler.state().epoch();
    for _ in 0..4 {
        assert_eq!(scheduled.recv_timeout(TIMEOUT).unwrap(), Some(first_epoch));
    }
    assert_eq!(scheduler.remaining_chunks(), 4);

    let stops = sink.recorded().stops;
    assert_eq!(scheduler.toggle_mode(), SourceMode::Live);
    assert_eq!(scheduler.remaining_chunks(), 0);
    assert_eq!(sink.recorded().stops, stops + 1);

    // Chunks flushed by the toggle report in late: ignored
    let flushed: Vec<_> = sink.recorded().flushed.drain(..).collect();
    assert_eq!(flushed.len(), 4);
    for completion in flushed {
        assert!(!completion.complete());
    }
    assert_eq!(scheduler.remaining_chunks(), 0);

    // Nothing more from the looped producer
    assert!(scheduled.recv_timeout(Duration::from_millis(200)).is_err());
    assert_eq!(sink.looped_frames(), 4);

    worker.shutdown();
}

#[test]
fn test_reentering_looped_starts_a_fresh_pass() {
    let (sink, scheduled) = RecordingSink::new();
    let scheduler = Scheduler::new(
        engine(vec![1.0]),
        sink.clone(),
        Some(reference(3)),
        &MeterConfig::default(),
    );
    let worker = scheduler.spawn_loop_worker().unwrap();

    scheduler.set_mode(SourceMode::Looped);
    for _ in 0..3 {
        scheduled.recv_timeout(TIMEOUT).unwrap();
    }
    scheduler.set_mode(SourceMode::Live);
    scheduler.set_mode(SourceMode::Looped);
    let epoch = scheduler.state().epoch();

    for _ in 0..3 {
        assert_eq!(scheduled.recv_timeout(TIMEOUT).unwrap(), Some(epoch));
    }
    assert_eq!(scheduler.remaining_chunks(), 3);

    // Playing the pass out lets the worker start the next one
    assert_eq!(sink.complete_all(), 3);
    assert_eq!(scheduled.recv_timeout(TIMEOUT).unwrap(), Some(epoch));

    worker.shutdown();
}

#[test]
fn test_pass_blocks_until_chunks_played() {
    let (sink, scheduled) = RecordingSink::new();
    let scheduler = Scheduler::new(
        engine(vec![1.0]),
        sink.clone(),
        Some(reference(2)),
        &MeterConfig::default(),
    );
    scheduler.set_mode(SourceMode::Looped);

    let runner = {
        let scheduler = scheduler.clone();
        thread::spawn(move || scheduler.run_loop_pass())
    };

    for _ in 0..2 {
        scheduled.recv_timeout(TIMEOUT).unwrap();
    }
    assert!(!runner.is_finished());
    assert_eq!(sink.complete_all(), 2);

    assert_eq!(runner.join().unwrap().unwrap(), PassOutcome::Completed);
    assert_eq!(scheduler.remaining_chunks(), 0);
    // Only full chunks were played
    assert!(sink.recorded().frames.iter().all(|(f, _)| f.len() == FRAME));
}

#[test]
fn test_toggle_cancels_waiting_pass() {
    let (sink, scheduled) = RecordingSink::new();
    let scheduler = Scheduler::new(
        engine(vec![1.0]),
        sink,
        Some(reference(2)),
        &MeterConfig::default(),
    );
    scheduler.set_mode(SourceMode::Looped);

    let runner = {
        let scheduler = scheduler.clone();
        thread::spawn(move || scheduler.run_loop_pass())
    };
    for _ in 0..2 {
        scheduled.recv_timeout(TIMEOUT).unwrap();
    }

    scheduler.toggle_mode();
    assert_eq!(runner.join().unwrap().unwrap(), PassOutcome::Cancelled);
}

#[test]
fn test_live_frames_are_filtered_and_metered() {
    let (sink, _scheduled) = RecordingSink::new();
    let scheduler = Scheduler::new(
        engine(vec![0.5, 0.5]),
        sink.clone(),
        None,
        &MeterConfig::default(),
    );

    let frame = FrameBuffer::from_samples(vec![0.1, 0.1, 0.1, 0.1]);
    assert!(scheduler.on_live_frame(frame).unwrap());
    assert!((scheduler.power_level() - -20.0).abs() < 1e-3);
    assert!(scheduler.normalized_level() > 0.0);

    let recorded = sink.recorded();
    assert_eq!(recorded.frames.len(), 1);
    let (samples, epoch) = &recorded.frames[0];
    assert_eq!(samples, &test_signals::convolve(&[0.5, 0.5], &[0.1; 4]));
    assert!(epoch.is_none());
}

#[test]
fn test_live_frames_ignored_while_looped() {
    let (sink, _scheduled) = RecordingSink::new();
    let scheduler = Scheduler::new(engine(vec![1.0]), sink.clone(), None, &MeterConfig::default());
    scheduler.set_mode(SourceMode::Looped);

    let mut source = WavFileSource::from_samples(vec![0.2; 20], 8000, FRAME);
    let summary = scheduler.run_live(&mut source);
    assert_eq!(summary.scheduled, 0);
    assert_eq!(summary.ignored, 3);
    assert!(sink.recorded().frames.is_empty());
}

#[test]
fn test_oversized_live_frame_is_rejected() {
    let scheduler = Scheduler::new(engine(vec![1.0]), NullSink, None, &MeterConfig::default());
    let result = scheduler.on_live_frame(FrameBuffer::from_samples(vec![0.0; FRAME + 1]));
    assert!(matches!(result, Err(FilterError::FrameTooLarge { .. })));
}

#[test]
fn test_starved_looped_mode_recovers() {
    let (sink, scheduled) = RecordingSink::new();
    let scheduler = Scheduler::new(
        engine(vec![1.0]),
        sink,
        Some(ReferenceSignal::new(vec![0.5; FRAME - 1], 8000)),
        &MeterConfig::default(),
    );
    scheduler.set_mode(SourceMode::Looped);
    assert!(matches!(
        scheduler.run_loop_pass(),
        Err(FilterError::ProducerStarved(_))
    ));

    // The worker keeps idling without scheduling anything, and shuts down
    // promptly
    let worker = scheduler.spawn_loop_worker().unwrap();
    assert!(scheduled.recv_timeout(Duration::from_millis(300)).is_err());
    worker.shutdown();
    assert!(scheduler.state().is_shutdown());
}

#[test]
fn test_dropping_worker_stops_live_driver() {
    let scheduler = Scheduler::new(engine(vec![1.0]), NullSink, None, &MeterConfig::default());
    let worker = scheduler.spawn_loop_worker().unwrap();
    drop(worker);

    let mut source = WavFileSource::from_samples(vec![0.2; 64], 8000, FRAME);
    let summary = scheduler.run_live(&mut source);
    assert_eq!(summary.scheduled, 0);
}
