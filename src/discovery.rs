use crate::error::PhotoinoError;
use serialport::{SerialPortInfo, SerialPortType};

/// A serial endpoint that might be a photoino.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePort {
    pub port: String,
    pub description: String,
}

impl CandidatePort {
    pub fn new(port: String, description: String) -> Self {
        Self { port, description }
    }
}

/// Device-node prefixes used by USB CDC-ACM and USB-serial adapters.
const CANDIDATE_PREFIXES: [&str; 5] = [
    "/dev/ttyACM",
    "/dev/ttyUSB",
    "/dev/cu.usbmodem",
    "/dev/cu.usbserial",
    "COM",
];

fn to_candidate(info: SerialPortInfo) -> Option<CandidatePort> {
    let usb_description = match &info.port_type {
        SerialPortType::UsbPort(usb) => Some(
            usb.product
                .clone()
                .unwrap_or_else(|| format!("USB {:04x}:{:04x}", usb.vid, usb.pid)),
        ),
        _ => None,
    };

    let has_candidate_name = CANDIDATE_PREFIXES
        .iter()
        .any(|prefix| info.port_name.starts_with(prefix));

    match usb_description {
        Some(description) => Some(CandidatePort::new(info.port_name, description)),
        None if has_candidate_name => Some(CandidatePort::new(info.port_name, String::new())),
        None => None,
    }
}

/// Keep the ports that look like a USB-attached photoino, sorted by path.
pub fn filter_candidates(ports: Vec<SerialPortInfo>) -> Vec<CandidatePort> {
    let mut candidates: Vec<CandidatePort> = ports.into_iter().filter_map(to_candidate).collect();
    candidates.sort_by(|a, b| a.port.cmp(&b.port));
    candidates.dedup_by(|a, b| a.port == b.port);
    candidates
}

/// Enumerate candidate devices now. Nothing is cached between calls.
pub fn available_candidates() -> Result<Vec<CandidatePort>, PhotoinoError> {
    let ports = serialport::available_ports().map_err(PhotoinoError::Enumeration)?;
    let candidates = filter_candidates(ports);
    log::debug!("Found {} candidate serial port(s)", candidates.len());
    Ok(candidates)
}

/// Device paths of [`available_candidates`], ready for
/// [`crate::HardwareConfig::with_candidate_ports`].
pub fn candidate_ports() -> Result<Vec<String>, PhotoinoError> {
    Ok(available_candidates()?
        .into_iter()
        .map(|candidate| candidate.port)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn port(name: &str, port_type: SerialPortType) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_string(),
            port_type,
        }
    }

    fn usb(product: Option<&str>) -> SerialPortType {
        SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x2341,
            pid: 0x0043,
            serial_number: None,
            manufacturer: None,
            product: product.map(str::to_string),
        })
    }

    #[test]
    fn test_filter_keeps_usb_and_known_names() {
        let candidates = filter_candidates(vec![
            port("/dev/ttyS0", SerialPortType::Unknown),
            port("/dev/ttyUSB0", SerialPortType::Unknown),
            port("/dev/ttyACM0", usb(Some("Arduino Uno"))),
            port("/dev/rfcomm0", SerialPortType::BluetoothPort),
        ]);

        assert_eq!(
            candidates,
            vec![
                CandidatePort::new("/dev/ttyACM0".to_string(), "Arduino Uno".to_string()),
                CandidatePort::new("/dev/ttyUSB0".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_usb_without_product_uses_ids() {
        let candidates = filter_candidates(vec![port("/dev/serial1", usb(None))]);
        assert_eq!(candidates[0].description, "USB 2341:0043");
    }

    #[test]
    fn test_enumeration_does_not_panic() {
        // Depends on the machine; only the shape of the result is checked.
        match candidate_ports() {
            Ok(ports) => assert!(ports.iter().all(|p| !p.is_empty())),
            Err(e) => assert!(matches!(e, PhotoinoError::Enumeration(_))),
        }
    }
}
