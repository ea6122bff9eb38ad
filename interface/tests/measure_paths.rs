use std::sync::mpsc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use interface::{Driver, NoopViewer, SharedMemoryStore};
use wire::{Attrs, MsgType, PeerType, SessionMessage};

fn test_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

/// Stands in for the orchestrator + measurement clients: answers
/// `getclients` and any CALL naming a target client with a canned RESULT
/// carrying that client's name back, so the sequencer's fan-out/collect
/// logic can be exercised without a real fabric.
fn run_fake_fabric(from_driver: mpsc::Receiver<SessionMessage>, to_driver: mpsc::Sender<SessionMessage>, clients: Vec<&'static str>) {
    thread::spawn(move || {
        for call in from_driver.iter() {
            let funcname = call.attr("funcname").unwrap_or("").to_string();
            if funcname == "getclients" {
                let mut reply = SessionMessage::new(MsgType::Result, PeerType::Orch);
                reply.clients = clients.iter().map(|s| s.to_string()).collect();
                to_driver.send(reply).ok();
                continue;
            }
            for target in &call.clients {
                let mut reply = SessionMessage::new(MsgType::Result, PeerType::MeasClient);
                reply.attributes = Attrs::new().with("clientname", target.clone()).with("funcname", funcname.clone());
                reply.measurements = vec![-30.0];
                to_driver.send(reply).ok();
            }
        }
    });
}

#[test]
fn measure_paths_writes_a_two_row_dataset_per_receiver() {
    let (to_connector_tx, from_driver_rx) = mpsc::channel();
    let (to_driver_tx, from_connector_rx) = mpsc::channel();
    run_fake_fabric(from_driver_rx, to_driver_tx, vec!["A", "B"]);

    let store = SharedMemoryStore::new();
    let before = now_secs();
    let mut driver = Driver::new(to_connector_tx, from_connector_rx, store.clone(), NoopViewer::new(), test_logger());
    let script = serde_json::json!([{
        "cmd": "measure_paths",
        "txgain": 10.0,
        "rxgain": 5.0,
        "freq": 915e6,
        "rate": 1e6,
        "freq_step": 1e5,
        "time_step": 0.01,
        "timeout": 2.0,
        "client_list": ["A", "B"]
    }]);
    driver.run_script(script.as_array().unwrap()).unwrap();
    let after = now_secs();

    // T=A round writes B's dataset; T=B round writes A's. Both rows must be
    // present (baseline + active) once the fake fabric has answered both
    // passes. `run_ts` is wall-clock at call time, within [before, after].
    let dataset = (before..=after + 1).find_map(|ts| store.f32_dataset(&format!("measure_paths/{ts}/A/B/avgpower")));
    let dataset = dataset.expect("expected a dataset for transmitter A, receiver B");
    assert_eq!(dataset.len(), 2, "expected baseline and active rows");
    assert_eq!(dataset[0], vec![-30.0]);
    assert_eq!(dataset[1], vec![-30.0]);
}
