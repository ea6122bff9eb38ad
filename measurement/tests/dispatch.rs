use std::sync::mpsc;
use std::thread;

use measurement::{Client, FakeRadio};
use rpc::{MeasurePowerArgs, RpcCall, Tuning};
use wire::{MsgType, PeerType, SessionMessage};

fn test_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

#[test]
fn processes_calls_in_order_and_preserves_uuids() {
    let (to_client, from_driver) = mpsc::channel();
    let (to_driver, from_client) = mpsc::channel();

    let handle = thread::spawn(move || {
        let mut client = Client::new(FakeRadio::new(), test_logger());
        client.run(to_driver, from_driver);
    });

    let call = RpcCall::MeasurePower(MeasurePowerArgs {
        tuning: Tuning { freq: 915e6, gain: 0.0, rate: 2e6 },
        nsamps: 32,
        wfreq: 0.0,
    });
    let mut msg = SessionMessage::new(MsgType::Call, PeerType::IfaceClient);
    msg.attributes = call.encode();
    msg.uuid = 1;
    to_client.send(msg.clone()).unwrap();

    let mut msg2 = msg.clone();
    msg2.uuid = 2;
    to_client.send(msg2).unwrap();

    let first = from_client.recv().unwrap();
    let second = from_client.recv().unwrap();
    assert_eq!(first.uuid, 1);
    assert_eq!(second.uuid, 2);
    assert_eq!(first.measurements.len(), 1);

    drop(to_client);
    handle.join().unwrap();
}
