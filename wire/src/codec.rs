use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::WireError;
use crate::message::SessionMessage;

/// Frames larger than this are refused outright rather than trusted as an
/// allocation size. A length prefix corrupted by a peer bug should fail
/// fast, not OOM the orchestrator.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Write `len(4 bytes BE) || bincode(msg)` to `w`.
pub fn write_framed<W: Write>(w: &mut W, msg: &SessionMessage) -> Result<(), WireError> {
    let body = bincode::serialize(msg)?;
    w.write_u32::<BigEndian>(body.len() as u32)?;
    w.write_all(&body)?;
    w.flush()?;
    Ok(())
}

/// Read one length-prefixed frame from `r`. An EOF before the length
/// prefix is a plain `Io` error (no message was in flight); an EOF partway
/// through the body is `Truncated`.
pub fn read_framed<R: Read>(r: &mut R) -> Result<SessionMessage, WireError> {
    let len = r.read_u32::<BigEndian>()?;
    if len > MAX_FRAME_LEN {
        return Err(WireError::Truncated { expected: len });
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            WireError::Truncated { expected: len }
        } else {
            WireError::Io(e)
        }
    })?;
    bincode::deserialize(&buf).map_err(WireError::Decode)
}

/// Serialize without a length prefix, for transports (in-process channels)
/// that already preserve message boundaries.
pub fn encode_unframed(msg: &SessionMessage) -> Result<Vec<u8>, WireError> {
    Ok(bincode::serialize(msg)?)
}

pub fn decode_unframed(buf: &[u8]) -> Result<SessionMessage, WireError> {
    Ok(bincode::deserialize(buf)?)
}
