//! Byte-level framing of ramp packets.
//!
//! Wire format, per channel:
//! `HEADER(2) | TYPE(1) | PAYLOAD(n_samples x little-endian i16) | FOOTER(2)`.

use std::io::Read;

/// Two-byte marker opening every ramp packet.
pub const HEADER: [u8; 2] = [0xAA, 0x55];
/// Two-byte marker closing every ramp packet.
pub const FOOTER: [u8; 2] = [0x55, 0xAA];

/// Packet type byte for the rising-frequency ramp.
pub const TYPE_UP: u8 = 1;
/// Packet type byte for the falling-frequency ramp.
pub const TYPE_DOWN: u8 = 2;

/// Framing state machine that decodes one ramp packet per call.
pub struct PacketParser {
    n_samples: usize,
}

impl PacketParser {
    pub fn new(n_samples: usize) -> Self {
        Self { n_samples }
    }

    /// Decodes the next packet from `source`.
    ///
    /// Returns `None` on a short read (device timeout), a truncated
    /// payload, or a footer mismatch. No partial state survives a
    /// `None`: the next call restarts the header search at the current
    /// stream position, so one corrupt packet costs exactly one packet.
    pub fn read_packet(&self, source: &mut dyn Read) -> Option<(u8, Vec<i16>)> {
        self.seek_header(source)?;

        let pkt_type = read_byte(source)?;

        let mut payload = vec![0u8; self.n_samples * 2];
        let mut filled = 0;
        while filled < payload.len() {
            match source.read(&mut payload[filled..]) {
                Ok(0) | Err(_) => return None,
                Ok(read) => filled += read,
            }
        }
        let samples = payload
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        if read_byte(source)? != FOOTER[0] || read_byte(source)? != FOOTER[1] {
            return None;
        }

        Some((pkt_type, samples))
    }

    /// Scans byte-by-byte until the two-byte header sequence is seen,
    /// discarding any leading noise.
    fn seek_header(&self, source: &mut dyn Read) -> Option<()> {
        let mut previous = read_byte(source)?;
        loop {
            if previous == HEADER[0] {
                let next = read_byte(source)?;
                if next == HEADER[1] {
                    return Some(());
                }
                // The second byte may itself start a header.
                previous = next;
            } else {
                previous = read_byte(source)?;
            }
        }
    }
}

fn read_byte(source: &mut dyn Read) -> Option<u8> {
    let mut byte = [0u8; 1];
    match source.read(&mut byte) {
        Ok(1) => Some(byte[0]),
        _ => None,
    }
}

/// Frames a payload the way the front end does. Test-only helper shared
/// by the reader and end-to-end tests.
#[cfg(test)]
pub(crate) fn frame_packet(pkt_type: u8, samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(5 + samples.len() * 2);
    bytes.extend_from_slice(&HEADER);
    bytes.push(pkt_type);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes.extend_from_slice(&FOOTER);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_both_packet_types() {
        let samples: Vec<i16> = (0..8).map(|v| v * 100 - 350).collect();
        let parser = PacketParser::new(samples.len());
        for pkt_type in [TYPE_UP, TYPE_DOWN] {
            let mut cursor = Cursor::new(frame_packet(pkt_type, &samples));
            let (decoded_type, decoded) = parser.read_packet(&mut cursor).unwrap();
            assert_eq!(decoded_type, pkt_type);
            assert_eq!(decoded, samples);
        }
    }

    #[test]
    fn resyncs_past_leading_noise() {
        let samples: Vec<i16> = vec![1, -2, 3, -4];
        let mut bytes = vec![0x00, 0x13, 0xAA, 0x42, 0x55, 0x12];
        bytes.extend_from_slice(&frame_packet(TYPE_UP, &samples));
        let parser = PacketParser::new(samples.len());
        let (pkt_type, decoded) = parser.read_packet(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(pkt_type, TYPE_UP);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn locks_onto_header_with_repeated_first_byte() {
        let samples: Vec<i16> = vec![7, 7];
        let mut bytes = vec![0xAA];
        bytes.extend_from_slice(&frame_packet(TYPE_DOWN, &samples));
        let parser = PacketParser::new(samples.len());
        let (pkt_type, decoded) = parser.read_packet(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(pkt_type, TYPE_DOWN);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn short_payload_yields_none() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&HEADER);
        bytes.push(TYPE_UP);
        bytes.extend_from_slice(&[0x01, 0x00, 0x02]); // 1.5 of 4 samples
        let parser = PacketParser::new(4);
        assert!(parser.read_packet(&mut Cursor::new(bytes)).is_none());
    }

    #[test]
    fn footer_mismatch_yields_none() {
        let samples: Vec<i16> = vec![10, 20];
        let mut bytes = frame_packet(TYPE_UP, &samples);
        let len = bytes.len();
        bytes[len - 1] = 0x00;
        let parser = PacketParser::new(samples.len());
        assert!(parser.read_packet(&mut Cursor::new(bytes)).is_none());
    }

    #[test]
    fn corrupt_packet_does_not_desync_the_next_one() {
        let samples: Vec<i16> = vec![5, 6, 7];
        let mut corrupt = frame_packet(TYPE_UP, &samples);
        let len = corrupt.len();
        corrupt[len - 2] = 0xFF;
        let mut bytes = corrupt;
        bytes.extend_from_slice(&frame_packet(TYPE_DOWN, &samples));

        let parser = PacketParser::new(samples.len());
        let mut cursor = Cursor::new(bytes);
        assert!(parser.read_packet(&mut cursor).is_none());
        let (pkt_type, decoded) = parser.read_packet(&mut cursor).unwrap();
        assert_eq!(pkt_type, TYPE_DOWN);
        assert_eq!(decoded, samples);
    }
}
