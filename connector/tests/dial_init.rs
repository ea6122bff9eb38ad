use std::net::TcpListener;
use std::thread;

use connector::Dialer;
use wire::{FramedStream, MessageEndpoint, MsgType, PeerType};

fn fake_orchestrator() -> (u16, thread::JoinHandle<wire::SessionMessage>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut endpoint = FramedStream::new(stream);
        let init = endpoint.recv().unwrap();
        let mut reply = wire::SessionMessage::new(MsgType::Init, PeerType::Orch);
        reply.sid = 42;
        endpoint.send(&reply).unwrap();
        init
    });
    (port, handle)
}

#[test]
fn interface_dialer_stamps_clientname_on_init() {
    let (port, handle) = fake_orchestrator();
    let dialer = Dialer::new("127.0.0.1", port, PeerType::IfaceClient, connector::ReconnectPolicy::INTERFACE).with_name("iface-test");
    let (_endpoint, sid) = dialer.dial_and_init(0).unwrap();
    assert_eq!(sid, 42);

    let observed_init = handle.join().unwrap();
    assert_eq!(observed_init.attr("clientname"), Some("iface-test"));
    assert_eq!(observed_init.peer_type, PeerType::IfaceClient);
}

#[test]
fn measurement_dialer_sends_no_clientname_on_init() {
    let (port, handle) = fake_orchestrator();
    let dialer = Dialer::new("127.0.0.1", port, PeerType::MeasClient, connector::ReconnectPolicy::MEASUREMENT);
    let (_endpoint, sid) = dialer.dial_and_init(0).unwrap();
    assert_eq!(sid, 42);

    let observed_init = handle.join().unwrap();
    assert_eq!(observed_init.attr("clientname"), None);
}
