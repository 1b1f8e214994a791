//! Record framing for archive files.
//!
//! On-disk format of a single record:
//! ```text
//! [4 bytes: payload length (little-endian u32)]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [N bytes: payload (bincode-serialized record)]
//! ```
//! A file is a plain concatenation of records; end of file on a record
//! boundary is the end of the stream.

use std::io::{self, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ArchiveError, ArchiveResult};

/// Header size: 4 bytes length + 4 bytes CRC.
pub const HEADER_SIZE: usize = 8;

/// Largest payload a reader accepts.
pub const MAX_RECORD_SIZE: u32 = 64 * 1024 * 1024;

/// Frame a record. Returns the full bytes (header and payload).
pub fn encode_record<T: Serialize>(record: &T) -> ArchiveResult<Vec<u8>> {
    let payload = bincode::serialize(record).map_err(|e| ArchiveError::Encode(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len > 0 && *len <= MAX_RECORD_SIZE)
        .ok_or_else(|| ArchiveError::Encode(format!("record of {} bytes", payload.len())))?;

    let mut framed = Vec::with_capacity(HEADER_SIZE + payload.len());
    framed.extend_from_slice(&length.to_le_bytes());
    framed.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    framed.extend_from_slice(&payload);
    Ok(framed)
}

/// Frame a record and write it. Returns the number of bytes written.
pub fn write_record<W: Write, T: Serialize>(output: &mut W, record: &T) -> ArchiveResult<u64> {
    let framed = encode_record(record)?;
    output.write_all(&framed)?;
    Ok(framed.len() as u64)
}

/// Read the next framed payload.
///
/// Returns `Ok(None)` on a clean end of stream. `path` and `offset` only
/// label errors.
pub fn read_frame<R: Read>(
    input: &mut R,
    path: &Path,
    offset: u64,
) -> ArchiveResult<Option<Vec<u8>>> {
    let mut header = [0u8; HEADER_SIZE];
    let filled = read_full(input, &mut header)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < HEADER_SIZE {
        return Err(ArchiveError::Truncated {
            path: path.to_path_buf(),
            offset,
        });
    }

    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if length == 0 || length > MAX_RECORD_SIZE {
        return Err(ArchiveError::InvalidLength {
            path: path.to_path_buf(),
            offset,
            length,
        });
    }

    let mut payload = vec![0u8; length as usize];
    if read_full(input, &mut payload)? < payload.len() {
        return Err(ArchiveError::Truncated {
            path: path.to_path_buf(),
            offset,
        });
    }

    let actual = crc32fast::hash(&payload);
    if actual != expected {
        return Err(ArchiveError::CrcMismatch {
            path: path.to_path_buf(),
            offset,
            expected,
            actual,
        });
    }
    Ok(Some(payload))
}

/// Decode a payload returned by [`read_frame`].
pub fn decode_payload<T: DeserializeOwned>(
    payload: &[u8],
    path: &Path,
    offset: u64,
) -> ArchiveResult<T> {
    bincode::deserialize(payload).map_err(|e| ArchiveError::Decode {
        path: path.to_path_buf(),
        offset,
        reason: e.to_string(),
    })
}

/// Like `read_exact`, but reports how much was read instead of failing on
/// a short read.
fn read_full<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
