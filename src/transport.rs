use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

/// Byte stream the line protocol runs over.
///
/// `read_bytes` blocks for at most the transport's configured read timeout.
/// A timeout surfaces either as `io::ErrorKind::TimedOut` or as a zero-length
/// read; the codec treats both the same way.
pub trait SerialTransport: Send {
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    fn read_bytes(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Number of bytes already buffered and readable without blocking.
    fn bytes_available(&mut self) -> std::io::Result<usize>;
}

impl SerialTransport for Box<dyn SerialPort> {
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.read(buf)
    }

    fn bytes_available(&mut self) -> std::io::Result<usize> {
        Ok(self.bytes_to_read()? as usize)
    }
}

/// Opens a transport for a serial endpoint.
pub trait PortOpener: Send {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn SerialTransport>, serialport::Error>;
}

/// Opens real serial ports through the `serialport` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialPortOpener;

impl PortOpener for SerialPortOpener {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn SerialTransport>, serialport::Error> {
        let serial = serialport::new(port, baud_rate)
            .timeout(read_timeout)
            .open()?;

        // Stale bytes from a previous session would be read as a reply.
        serial.clear(serialport::ClearBuffer::All)?;
        Ok(Box::new(serial))
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::{PortOpener, SerialTransport};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// State shared between a `MockTransport` and the test holding it.
    #[derive(Debug, Default)]
    pub struct MockState {
        pub incoming: VecDeque<u8>,
        pub written: Vec<u8>,
        pub fail_writes: bool,
    }

    impl MockState {
        pub fn written_str(&self) -> String {
            String::from_utf8_lossy(&self.written).to_string()
        }
    }

    /// In-memory transport: reads pop from `incoming`, an empty queue reads
    /// as a timeout.
    #[derive(Debug, Clone, Default)]
    pub struct MockTransport {
        pub state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        pub fn with_incoming(bytes: &[u8]) -> Self {
            let transport = Self::default();
            transport.push_incoming(bytes);
            transport
        }

        pub fn push_incoming(&self, bytes: &[u8]) {
            self.state.lock().unwrap().incoming.extend(bytes);
        }

        pub fn remaining(&self) -> usize {
            self.state.lock().unwrap().incoming.len()
        }

        pub fn written(&self) -> String {
            self.state.lock().unwrap().written_str()
        }
    }

    impl SerialTransport for MockTransport {
        fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_writes {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "mock write failure",
                ));
            }
            state.written.extend_from_slice(bytes);
            Ok(())
        }

        fn read_bytes(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let mut state = self.state.lock().unwrap();
            let mut n = 0;
            while n < buf.len() {
                match state.incoming.pop_front() {
                    Some(byte) => {
                        buf[n] = byte;
                        n += 1;
                    }
                    None => break,
                }
            }
            if n == 0 && !buf.is_empty() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "mock read timed out",
                ));
            }
            Ok(n)
        }

        fn bytes_available(&mut self) -> std::io::Result<usize> {
            Ok(self.state.lock().unwrap().incoming.len())
        }
    }

    /// Record of one `PortOpener::open` call.
    #[derive(Debug, Clone, PartialEq)]
    pub struct OpenCall {
        pub port: String,
        pub baud_rate: u32,
        pub read_timeout: Duration,
    }

    /// Hands out clones of one `MockTransport` and records every open.
    #[derive(Debug, Clone, Default)]
    pub struct MockOpener {
        pub transport: MockTransport,
        pub calls: Arc<Mutex<Vec<OpenCall>>>,
        pub refuse: bool,
    }

    impl MockOpener {
        pub fn refusing() -> Self {
            Self {
                refuse: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<OpenCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PortOpener for MockOpener {
        fn open(
            &self,
            port: &str,
            baud_rate: u32,
            read_timeout: Duration,
        ) -> Result<Box<dyn SerialTransport>, serialport::Error> {
            self.calls.lock().unwrap().push(OpenCall {
                port: port.to_string(),
                baud_rate,
                read_timeout,
            });
            if self.refuse {
                return Err(serialport::Error::new(
                    serialport::ErrorKind::NoDevice,
                    format!("{port} not present"),
                ));
            }
            Ok(Box::new(self.transport.clone()))
        }
    }
}
