//! Integration tests for the LoggerService → RecordStore pipeline.
//!
//! Drives the service the way the main loop does (motion ticks, log
//! ticks, commands) against mock hardware and an in-memory record file.

use super::mock_hw::{CollectingSink, MockClock, MockHardware};

use roomlogger::adapters::mem_store::MemFileStore;
use roomlogger::app::commands::AppCommand;
use roomlogger::app::events::{AppEvent, SkipReason};
use roomlogger::app::ports::{SchedulerDelegate, TimerKind};
use roomlogger::app::service::LoggerService;
use roomlogger::config::LoggerConfig;
use roomlogger::error::StoreError;
use roomlogger::scheduler::IntervalScheduler;
use roomlogger::store::HEADER;

fn prefilled(records: u32) -> MemFileStore {
    let mut content = format!("{HEADER}\n");
    for i in 1..=records {
        content.push_str(&format!("1754913000,2025-08-11 11:50:00,22.00,71.60,40.00,false,{i}\n"));
    }
    MemFileStore::with_content(&content)
}

fn make_service(file: MemFileStore) -> (LoggerService<MemFileStore>, CollectingSink) {
    let mut svc = LoggerService::new(LoggerConfig::default(), file);
    let mut sink = CollectingSink::new();
    svc.start(&mut sink);
    (svc, sink)
}

fn last_line(svc: &LoggerService<MemFileStore>) -> String {
    svc.store()
        .backend()
        .content()
        .and_then(|c| c.lines().last())
        .unwrap_or_default()
        .to_owned()
}

// ── Record format and sequencing ─────────────────────────────

#[test]
fn appends_next_sequence_after_recovered_records() {
    let (mut svc, mut sink) = make_service(prefilled(41));
    assert!(matches!(sink.events[0], AppEvent::Started { record_count: 41 }));

    let mut hw = MockHardware::new(23.5, 41.2);
    let clock = MockClock::synced();

    let rec = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert_eq!(rec.sequence, 42);
    assert_eq!(
        last_line(&svc),
        "1754913600,2025-08-11 12:00:00,23.50,74.30,41.20,false,42"
    );
    assert_eq!(svc.store_stats().record_count, 42);
    assert_eq!(hw.climate_reads, 1, "a valid primary read needs no retry");
}

#[test]
fn invalid_twice_stores_sentinels() {
    let (mut svc, mut sink) = make_service(MemFileStore::new());
    let mut hw = MockHardware::new(f32::NAN, f32::NAN);
    let clock = MockClock::synced();

    let rec = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert_eq!(rec.sequence, 1);
    assert_eq!(hw.climate_reads, 2, "exactly one retry");
    assert_eq!(hw.delayed_ns, 100_000_000);
    assert_eq!(
        last_line(&svc),
        "1754913600,2025-08-11 12:00:00,0.00,32.00,0.00,false,1"
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorDegraded(_))), 1);
}

#[test]
fn retry_value_is_used_when_primary_fails() {
    let (mut svc, mut sink) = make_service(MemFileStore::new());
    let mut hw = MockHardware::new(20.0, 50.0);
    hw.queue(f32::NAN, 50.0);
    let clock = MockClock::synced();

    let rec = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert_eq!(rec.temperature_c, 20.0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorDegraded(_))), 0);
}

#[test]
fn local_offset_changes_datetime_column_only() {
    let (mut svc, mut sink) = make_service(MemFileStore::new());
    let mut hw = MockHardware::new(23.5, 41.2);
    let clock = MockClock::synced();
    let cest = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
    clock.wall.set(clock.wall.get().map(|t| t.with_timezone(&cest)));

    svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert!(last_line(&svc).starts_with("1754913600,2025-08-11 14:00:00,"));
}

// ── Skipped intervals ────────────────────────────────────────

#[test]
fn unsynced_clock_skips_without_advancing() {
    let (mut svc, mut sink) = make_service(prefilled(3));
    let mut hw = MockHardware::new(21.0, 45.0);
    let before = svc.store().backend().content().map(str::to_owned);

    assert!(svc.log_interval(&mut hw, &MockClock::unsynced(), &mut sink).is_none());

    assert_eq!(svc.store_stats().record_count, 3);
    assert_eq!(svc.store().backend().content().map(str::to_owned), before);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::IntervalSkipped(SkipReason::TimeUnavailable))),
        1
    );
    let status = svc.live_status();
    assert_eq!(status.skipped_intervals, 1);
    assert!(status.reading.is_some(), "live view still gets the reading");
}

#[test]
fn store_open_failure_skips_and_keeps_counter() {
    let (mut svc, mut sink) = make_service(prefilled(7));
    svc.store_mut().backend_mut().set_writable(false);
    let mut hw = MockHardware::new(21.0, 45.0);
    let clock = MockClock::synced();

    assert!(svc.log_interval(&mut hw, &clock, &mut sink).is_none());
    assert_eq!(svc.store_stats().record_count, 7);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::IntervalSkipped(SkipReason::Store(StoreError::OpenFailed))
        )),
        1
    );

    svc.store_mut().backend_mut().set_writable(true);
    let rec = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert_eq!(rec.sequence, 8);
}

// ── Clear ────────────────────────────────────────────────────

#[test]
fn clear_restarts_sequence_at_one() {
    let (mut svc, mut sink) = make_service(prefilled(12));
    svc.handle_command(AppCommand::ClearStore, &mut sink).unwrap();

    assert_eq!(svc.store().backend().content(), Some(format!("{HEADER}\n").as_str()));
    assert_eq!(svc.store_stats().record_count, 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::StoreCleared)), 1);

    let mut hw = MockHardware::new(21.0, 45.0);
    let rec = svc.log_interval(&mut hw, &MockClock::synced(), &mut sink).unwrap();
    assert_eq!(rec.sequence, 1);
}

// ── Motion aggregation ───────────────────────────────────────

#[test]
fn motion_pulse_inside_interval_is_recorded_once() {
    let (mut svc, mut sink) = make_service(MemFileStore::new());
    let mut hw = MockHardware::new(21.0, 45.0);
    let clock = MockClock::synced();

    for level in [false, true, true, false, false] {
        hw.motion = level;
        svc.sample_motion(&mut hw, &clock, &mut sink);
    }
    assert_eq!(sink.count(|e| matches!(e, AppEvent::MotionDetected { .. })), 1);

    let first = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert!(first.motion_detected);

    let second = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert!(!second.motion_detected, "aggregate resets after a record");
    assert_eq!(svc.live_status().last_motion_at, Some(1_754_913_600));
}

#[test]
fn motion_held_high_across_boundary_is_not_a_new_edge() {
    let (mut svc, mut sink) = make_service(MemFileStore::new());
    let mut hw = MockHardware::new(21.0, 45.0);
    let clock = MockClock::synced();

    hw.motion = true;
    svc.sample_motion(&mut hw, &clock, &mut sink);
    assert!(svc.log_interval(&mut hw, &clock, &mut sink).unwrap().motion_detected);

    svc.sample_motion(&mut hw, &clock, &mut sink);
    let next = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert!(!next.motion_detected);
    assert!(svc.live_status().motion_active);
}

#[test]
fn rising_edge_without_clock_still_counts() {
    let (mut svc, mut sink) = make_service(MemFileStore::new());
    let mut hw = MockHardware::new(21.0, 45.0);

    hw.motion = true;
    svc.sample_motion(&mut hw, &MockClock::unsynced(), &mut sink);
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::MotionDetected { timestamp: None })
    ));
    assert_eq!(svc.live_status().last_motion_at, None);

    let rec = svc.log_interval(&mut hw, &MockClock::synced(), &mut sink).unwrap();
    assert!(rec.motion_detected);
}

// ── Scheduler + service ──────────────────────────────────────

#[derive(Default)]
struct Fired(Vec<TimerKind>);

impl SchedulerDelegate for Fired {
    fn on_timer_fired(&mut self, kind: TimerKind) {
        self.0.push(kind);
    }
}

#[test]
fn one_minute_of_ticks_yields_six_records() {
    let config = LoggerConfig::default();
    let mut sched = IntervalScheduler::new(config.motion_tick_ms, config.log_interval_ms, 0);
    let (mut svc, mut sink) = make_service(MemFileStore::new());
    let mut hw = MockHardware::new(21.0, 45.0);
    let clock = MockClock::synced();

    let mut records = Vec::new();
    for _ in 0..(60_000 / 10) {
        clock.advance_ms(10);
        // A 300 ms pulse early in the second interval.
        let t = clock.uptime_ms.get();
        hw.motion = (12_000..12_300).contains(&t);

        let mut fired = Fired::default();
        sched.tick(t, &mut fired);
        for kind in fired.0 {
            match kind {
                TimerKind::Motion => svc.sample_motion(&mut hw, &clock, &mut sink),
                TimerKind::Log => records.extend(svc.log_interval(&mut hw, &clock, &mut sink)),
            }
        }
    }

    assert_eq!(records.len(), 6);
    let seqs: Vec<u32> = records.iter().map(|r| r.sequence).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5, 6]);
    let motion: Vec<bool> = records.iter().map(|r| r.motion_detected).collect();
    assert_eq!(motion, vec![false, true, false, false, false, false]);
}
