//! Line protocol spoken by the photoino firmware.
//!
//! Commands are ASCII lines terminated by `\n`. Queries (`rate?`, `level?`,
//! `timebase?`) are answered with a decimal integer terminated by `\n` or
//! `\r`. The firmware may emit extra line breaks before the number and
//! unsolicited bytes after it, so [`decode_reply`] skips the former and
//! drains the latter.

use crate::transport::SerialTransport;

const LINE_TERMINATOR: u8 = b'\n';

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Timeout waiting for a reply terminator")]
    Timeout,

    #[error("Malformed reply: unexpected byte 0x{byte:02x} inside number")]
    MalformedReply { byte: u8 },

    #[error("Malformed reply: number does not fit in 64 bits")]
    ReplyOverflow,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedReply { .. } | Self::ReplyOverflow)
    }
}

/// Commands understood by the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start,
    Stop,
    QueryRate,
    QueryLevel,
    SetLevel(f64),
    QueryTimeBase,
    SetTimeBase(f64),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::QueryRate => "rate?",
            Command::QueryLevel => "level?",
            Command::SetLevel(_) => "level",
            Command::QueryTimeBase => "timebase?",
            Command::SetTimeBase(_) => "timebase",
        }
    }

    pub fn argument(&self) -> Option<f64> {
        match self {
            Command::SetLevel(value) | Command::SetTimeBase(value) => Some(*value),
            _ => None,
        }
    }

    /// Whether the device answers this command with a number.
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Command::QueryRate | Command::QueryLevel | Command::QueryTimeBase
        )
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_command(self.name(), self.argument())
    }
}

/// Render a numeric argument the way the firmware parses it: fixed point,
/// six decimals, `.` separator regardless of locale.
pub fn format_argument(value: f64) -> String {
    format!("{value:.6}")
}

/// Encode `name` and an optional numeric argument as one terminated line.
pub fn encode_command(name: &str, argument: Option<f64>) -> Vec<u8> {
    let mut line = match argument {
        Some(value) => format!("{} {}", name, format_argument(value)),
        None => name.to_string(),
    }
    .into_bytes();
    line.push(LINE_TERMINATOR);
    line
}

fn is_line_break(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

fn read_one(source: &mut dyn SerialTransport) -> Result<u8, ProtocolError> {
    let mut byte = [0u8; 1];
    match source.read_bytes(&mut byte) {
        Ok(0) => Err(ProtocolError::Timeout),
        Ok(_) => Ok(byte[0]),
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(ProtocolError::Timeout),
        Err(e) => Err(e.into()),
    }
}

/// Discard whatever is already buffered on `source`, without waiting for
/// more. Returns the number of bytes dropped.
pub fn drain_available(source: &mut dyn SerialTransport) -> Result<usize, ProtocolError> {
    let available = source.bytes_available()?;
    if available == 0 {
        return Ok(0);
    }

    let mut junk = vec![0u8; available];
    let mut drained = 0;
    while drained < available {
        match source.read_bytes(&mut junk[drained..]) {
            Ok(0) => break,
            Ok(n) => drained += n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
            Err(e) => return Err(e.into()),
        }
    }

    if drained > 0 {
        log::trace!(
            "Discarded {} trailing byte(s): {:?}",
            drained,
            String::from_utf8_lossy(&junk[..drained])
        );
    }
    Ok(drained)
}

/// Read one integer reply from `source`.
///
/// Leading `\n`/`\r` bytes are skipped, digits are accumulated until a line
/// break, then any bytes already buffered are drained. A malformed number
/// also drains the buffer before failing. Each byte read is bounded by the
/// transport's read timeout.
pub fn decode_reply(source: &mut dyn SerialTransport) -> Result<u64, ProtocolError> {
    let mut byte = read_one(source)?;
    while is_line_break(byte) {
        byte = read_one(source)?;
    }

    let mut value: u64 = 0;
    loop {
        if is_line_break(byte) {
            break;
        }
        if !byte.is_ascii_digit() {
            // Rest of the garbled line must not be taken as the next reply.
            drain_available(source)?;
            return Err(ProtocolError::MalformedReply { byte });
        }
        value = match value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
        {
            Some(v) => v,
            None => {
                drain_available(source)?;
                return Err(ProtocolError::ReplyOverflow);
            }
        };
        byte = read_one(source)?;
    }

    drain_available(source)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_command_encoding() {
        assert_eq!(Command::Start.encode(), b"start\n");
        assert_eq!(Command::Stop.encode(), b"stop\n");
        assert_eq!(Command::QueryRate.encode(), b"rate?\n");
        assert_eq!(Command::QueryLevel.encode(), b"level?\n");
        assert_eq!(Command::QueryTimeBase.encode(), b"timebase?\n");
        assert_eq!(Command::SetLevel(0.25).encode(), b"level 0.250000\n");
        assert_eq!(Command::SetTimeBase(10.0).encode(), b"timebase 10.000000\n");
    }

    #[test]
    fn test_negative_argument_encoding() {
        assert_eq!(encode_command("level", Some(-1.5)), b"level -1.500000\n");
    }

    #[test]
    fn test_expects_reply() {
        assert!(Command::QueryRate.expects_reply());
        assert!(Command::QueryTimeBase.expects_reply());
        assert!(!Command::Start.expects_reply());
        assert!(!Command::SetLevel(1.0).expects_reply());
    }

    #[test]
    fn test_decode_skips_leading_line_breaks() {
        let mut source = MockTransport::with_incoming(b"\n\r42\n");
        assert_eq!(decode_reply(&mut source).unwrap(), 42);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_decode_drains_trailing_junk() {
        let mut source = MockTransport::with_incoming(b"\r\n7\rXYZ");
        assert_eq!(decode_reply(&mut source).unwrap(), 7);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_decode_consecutive_replies_after_drain() {
        let mut source = MockTransport::with_incoming(b"12\r\n");
        assert_eq!(decode_reply(&mut source).unwrap(), 12);
        source.push_incoming(b"\n34\n");
        assert_eq!(decode_reply(&mut source).unwrap(), 34);
    }

    #[test]
    fn test_decode_rejects_non_digit() {
        let mut source = MockTransport::with_incoming(b"12a3\n");
        let err = decode_reply(&mut source).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedReply { byte: b'a' }));
        assert!(err.is_malformed());
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_decode_times_out_without_terminator() {
        let mut source = MockTransport::with_incoming(b"123");
        assert!(matches!(
            decode_reply(&mut source),
            Err(ProtocolError::Timeout)
        ));
    }

    #[test]
    fn test_decode_times_out_on_silence() {
        let mut source = MockTransport::default();
        assert!(matches!(
            decode_reply(&mut source),
            Err(ProtocolError::Timeout)
        ));

        let mut source = MockTransport::with_incoming(b"\r\n\r\n");
        assert!(matches!(
            decode_reply(&mut source),
            Err(ProtocolError::Timeout)
        ));
    }

    #[test]
    fn test_decode_overflow() {
        let mut source = MockTransport::with_incoming(b"99999999999999999999999\n");
        let err = decode_reply(&mut source).unwrap_err();
        assert!(matches!(err, ProtocolError::ReplyOverflow));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_drain_with_nothing_buffered() {
        let mut source = MockTransport::default();
        assert_eq!(drain_available(&mut source).unwrap(), 0);
    }
}
