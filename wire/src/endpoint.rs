use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::mpsc::{Receiver, Sender};

use crate::codec::{read_framed, write_framed};
use crate::error::WireError;
use crate::message::SessionMessage;

/// The capability every peer endpoint needs, independent of whether the
/// transport underneath is a TCP connection or an in-process channel.
pub trait MessageEndpoint {
    fn send(&mut self, msg: &SessionMessage) -> Result<(), WireError>;
    fn recv(&mut self) -> Result<SessionMessage, WireError>;
}

/// Length-prefixed framing over any `Read + Write` stream.
pub struct FramedStream<S> {
    stream: S,
}

impl<S: Read + Write> FramedStream<S> {
    pub fn new(stream: S) -> Self {
        FramedStream { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }
}

impl<S: Read + Write> MessageEndpoint for FramedStream<S> {
    fn send(&mut self, msg: &SessionMessage) -> Result<(), WireError> {
        write_framed(&mut self.stream, msg)
    }

    fn recv(&mut self) -> Result<SessionMessage, WireError> {
        read_framed(&mut self.stream)
    }
}

impl FramedStream<TcpStream> {
    pub fn try_clone(&self) -> Result<Self, WireError> {
        Ok(FramedStream::new(self.stream.try_clone()?))
    }
}

/// No length prefix: an `mpsc` channel already preserves message
/// boundaries, matching the in-process pipe variant of this transport.
pub struct ChannelEndpoint {
    tx: Sender<SessionMessage>,
    rx: Receiver<SessionMessage>,
}

impl ChannelEndpoint {
    pub fn new(tx: Sender<SessionMessage>, rx: Receiver<SessionMessage>) -> Self {
        ChannelEndpoint { tx, rx }
    }

    /// Build a connected pair, useful for wiring a driver directly to its
    /// connector in tests without touching a socket.
    pub fn pair() -> (ChannelEndpoint, ChannelEndpoint) {
        let (tx_a, rx_a) = std::sync::mpsc::channel();
        let (tx_b, rx_b) = std::sync::mpsc::channel();
        (ChannelEndpoint::new(tx_a, rx_b), ChannelEndpoint::new(tx_b, rx_a))
    }
}

fn broken_pipe() -> WireError {
    WireError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "channel endpoint closed"))
}

impl MessageEndpoint for ChannelEndpoint {
    fn send(&mut self, msg: &SessionMessage) -> Result<(), WireError> {
        self.tx.send(msg.clone()).map_err(|_| broken_pipe())
    }

    fn recv(&mut self) -> Result<SessionMessage, WireError> {
        self.rx.recv().map_err(|_| broken_pipe())
    }
}
