//! Record store on a real filesystem: persistence across restarts.

use super::mock_hw::{CollectingSink, MockClock, MockHardware};

use roomlogger::adapters::fs_store::FsFileStore;
use roomlogger::app::service::LoggerService;
use roomlogger::config::LoggerConfig;
use roomlogger::store::HEADER;

fn boot(path: &std::path::Path) -> LoggerService<FsFileStore> {
    LoggerService::new(LoggerConfig::default(), FsFileStore::new(path))
}

#[test]
fn restart_continues_sequence_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensor_data.csv");
    let mut hw = MockHardware::new(21.0, 45.0);
    let clock = MockClock::synced();
    let mut sink = CollectingSink::new();

    {
        let mut svc = boot(&path);
        for _ in 0..3 {
            svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
        }
    }

    let mut svc = boot(&path);
    assert_eq!(svc.store_stats().record_count, 3);
    let rec = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert_eq!(rec.sequence, 4);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().next(), Some(HEADER));
    assert_eq!(content.lines().count(), 5);
}

#[test]
fn deleted_file_is_recreated_and_restarts_at_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensor_data.csv");
    let mut hw = MockHardware::new(21.0, 45.0);
    let clock = MockClock::synced();
    let mut sink = CollectingSink::new();

    let mut svc = boot(&path);
    svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    svc.log_interval(&mut hw, &clock, &mut sink).unwrap();

    std::fs::remove_file(&path).unwrap();
    let rec = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert_eq!(rec.sequence, 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
}

#[test]
fn foreign_file_is_rewritten_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensor_data.csv");
    std::fs::write(&path, "ts,temp\n1,2\n").unwrap();

    let mut svc = boot(&path);
    assert_eq!(svc.store_stats().record_count, 0);
    let csv = svc.export_csv().unwrap();
    assert_eq!(csv, format!("{HEADER}\n"));
}

#[test]
fn empty_file_gets_header_and_first_record_is_projected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensor_data.csv");
    std::fs::write(&path, "").unwrap();
    let mut hw = MockHardware::new(21.0, 45.0);
    let clock = MockClock::synced();
    let mut sink = CollectingSink::new();

    let mut svc = boot(&path);
    let rec = svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    assert_eq!(rec.sequence, 1);

    let v: serde_json::Value = serde_json::from_str(&svc.export_json().unwrap()).unwrap();
    assert_eq!(v["data"].as_array().unwrap().len(), 1);

    drop(svc);
    let mut svc = boot(&path);
    assert_eq!(svc.store_stats().record_count, 1);
    assert_eq!(svc.log_interval(&mut hw, &clock, &mut sink).unwrap().sequence, 2);
}

#[test]
fn torn_last_line_is_dropped_on_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensor_data.csv");
    let mut hw = MockHardware::new(21.0, 45.0);
    let clock = MockClock::synced();
    let mut sink = CollectingSink::new();

    {
        let mut svc = boot(&path);
        svc.log_interval(&mut hw, &clock, &mut sink).unwrap();
    }
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    std::io::Write::write_all(&mut file, b"1754913600,2025-08-11 12:0").unwrap();
    drop(file);

    let mut svc = boot(&path);
    assert_eq!(svc.store_stats().record_count, 1);
    assert_eq!(svc.log_interval(&mut hw, &clock, &mut sink).unwrap().sequence, 2);
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(content.lines().nth(1).unwrap().ends_with(",1"));
    assert!(content.lines().nth(2).unwrap().ends_with(",2"));
}
