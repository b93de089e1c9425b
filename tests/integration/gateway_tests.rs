//! Integration tests for the query gateway endpoints.

use super::mock_hw::{CollectingSink, MockClock, MockHardware};

use roomlogger::adapters::mem_store::MemFileStore;
use roomlogger::app::events::AppEvent;
use roomlogger::app::service::LoggerService;
use roomlogger::config::LoggerConfig;
use roomlogger::diagnostics::RuntimeMetrics;
use roomlogger::gateway::{self, HttpRequest, HttpResponse, Method};
use roomlogger::store::HEADER;

struct Rig {
    svc: LoggerService<MemFileStore>,
    sink: CollectingSink,
    metrics: RuntimeMetrics,
}

impl Rig {
    /// A service with `records` logged at 12:00, 12:00:10, ...
    fn with_records(records: u32) -> Self {
        let mut svc = LoggerService::new(LoggerConfig::default(), MemFileStore::new());
        let mut sink = CollectingSink::new();
        let mut hw = MockHardware::new(23.5, 41.2);
        let clock = MockClock::synced();
        for _ in 0..records {
            svc.log_interval(&mut hw, &clock, &mut sink);
            clock.advance_ms(10_000);
        }
        Self {
            svc,
            sink,
            metrics: RuntimeMetrics::collect(120).with_loop_counters(12_000, 7),
        }
    }

    fn get(&mut self, path: &str) -> HttpResponse {
        gateway::handle(
            &HttpRequest::get(path),
            &mut self.svc,
            &self.metrics,
            &mut self.sink,
        )
    }
}

#[test]
fn root_serves_live_view() {
    let mut rig = Rig::with_records(1);
    let resp = rig.get("/");
    assert_eq!(resp.status, 200);
    assert!(resp.content_type.starts_with("text/html"));
    assert!(resp.body.contains("23.50"));
    assert!(resp.body.contains("74.30"));
    assert!(resp.body.contains("Records: 1"));
}

#[test]
fn download_returns_raw_csv_as_attachment() {
    let mut rig = Rig::with_records(2);
    let resp = rig.get("/download");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, "text/csv");
    assert_eq!(
        resp.disposition.as_deref(),
        Some("attachment; filename=sensor_data.csv")
    );
    let lines: Vec<&str> = resp.body.lines().collect();
    assert_eq!(lines[0], HEADER);
    assert_eq!(
        lines[2],
        "1754913610,2025-08-11 12:00:10,23.50,74.30,41.20,false,2"
    );
}

#[test]
fn data_projects_records_to_json() {
    let mut rig = Rig::with_records(2);
    let resp = rig.get("/data");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, "application/json");

    let v: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    let data = v["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["timestamp"], 1_754_913_600);
    assert_eq!(data[0]["datetime"], "2025-08-11 12:00:00");
    assert_eq!(data[0]["motion_detected"], false);
    assert_eq!(data[1]["data_point"], 2);
}

#[test]
fn data_on_empty_store_is_empty_array() {
    let mut rig = Rig::with_records(0);
    assert_eq!(rig.get("/data").body, r#"{"data":[]}"#);
}

#[test]
fn data_escapes_hostile_content() {
    let raw = format!("{HEADER}\n1754913600,2025-08-11 \"12\":00\\,1,2,3,true,1\n");
    let mut rig = Rig::with_records(0);
    rig.svc = LoggerService::new(LoggerConfig::default(), MemFileStore::with_content(&raw));

    let resp = rig.get("/data");
    let v: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(v["data"][0]["datetime"], "2025-08-11 \"12\":00\\");
}

#[test]
fn clear_wipes_store_and_confirms() {
    let mut rig = Rig::with_records(3);
    let resp = rig.get("/clear");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "Data cleared successfully");
    assert_eq!(rig.svc.store_stats().record_count, 0);
    assert!(rig.sink.events.iter().any(|e| matches!(e, AppEvent::StoreCleared)));

    let csv = rig.get("/download").body;
    assert_eq!(csv, format!("{HEADER}\n"));
}

#[test]
fn info_reports_store_and_fs_statistics() {
    let mut rig = Rig::with_records(4);
    let resp = rig.get("/info");
    assert_eq!(resp.status, 200);

    let v: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    for key in [
        "record_count",
        "file_size_bytes",
        "fs_total_bytes",
        "fs_used_bytes",
        "uptime_secs",
        "heap_free_bytes",
        "loop_iterations",
        "requests_served",
    ] {
        assert!(v.get(key).is_some(), "missing key {key}");
    }
    assert_eq!(v["record_count"], 4);
    assert_eq!(v["uptime_secs"], 120);
    assert_eq!(v["loop_iterations"], 12_000);
    assert_eq!(v["requests_served"], 7);
    assert_eq!(
        v["file_size_bytes"].as_u64().unwrap(),
        rig.svc.store_stats().byte_size
    );
}

#[test]
fn unknown_path_is_404() {
    let mut rig = Rig::with_records(0);
    assert_eq!(rig.get("/nope").status, 404);
}

#[test]
fn non_get_is_405() {
    let mut rig = Rig::with_records(1);
    let req = HttpRequest {
        method: Method::Other,
        path: "/clear",
    };
    let resp = gateway::handle(&req, &mut rig.svc, &rig.metrics, &mut rig.sink);
    assert_eq!(resp.status, 405);
    assert_eq!(rig.svc.store_stats().record_count, 1, "nothing cleared");
}

#[test]
fn unreadable_store_is_500() {
    let mut rig = Rig::with_records(1);
    // Removing the file and blocking writes means the store can neither
    // read nor recreate it.
    {
        use roomlogger::app::ports::FileStore;
        let backend = rig.svc.store_mut().backend_mut();
        backend.remove().unwrap();
        backend.set_writable(false);
    }
    assert_eq!(rig.get("/download").status, 500);
    assert_eq!(rig.get("/data").status, 500);
}

#[test]
fn every_registered_route_is_answered() {
    for path in gateway::ROUTES {
        let mut rig = Rig::with_records(1);
        let resp = rig.get(path);
        assert_eq!(resp.status, 200, "GET {path}");
    }
}
