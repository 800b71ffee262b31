//! Incremental framing over buffered peer bytes.
//!
//! Both decoders are stateless pure functions: handed the buffered bytes,
//! they either report that more data is needed (nothing consumed), yield a
//! complete frame together with the byte count the caller must remove from
//! the buffer front, or fail with a protocol error. Invoked repeatedly on a
//! growing buffer they produce the same result as seeing the bytes in fewer,
//! larger reads, which is what lets partial TCP reads persist across event
//! loop passes.
//!
//! # Binary Packet Header
//!
//! Layout at the front of the buffer once the banner is consumed
//! (RFC 4253 Section 6):
//!
//! ```text
//! | offset | size | field                                      |
//! |--------|------|--------------------------------------------|
//! | 0      | 4    | packet_length (big-endian, excludes itself)|
//! | 4      | 1    | padding_length                             |
//! | 5      | 1    | message type (first payload byte)          |
//! ```

use bytes::Buf;
use kexhold_platform::{KexholdError, KexholdResult};

use crate::ssh::version::{BANNER_PREFIX, MAX_BANNER_LEN};

/// Size of the packet_length field.
pub const LENGTH_FIELD_LEN: usize = 4;

/// Buffer offset of the message-type byte (packet offset 1).
pub const MSG_TYPE_OFFSET: usize = 5;

/// Outcome of a decode attempt against buffered bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode<T> {
    /// Not enough buffered bytes to complete the frame; nothing consumed.
    /// Not an error: the caller returns control to the event loop and waits
    /// for the next read.
    NeedMoreData,
    /// A complete frame. The caller must remove `consumed` bytes from the
    /// front of its buffer.
    Complete {
        /// The decoded frame.
        frame: T,
        /// Bytes the frame occupied at the front of the buffer.
        consumed: usize,
    },
}

/// Header of a complete binary packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHead {
    /// Declared packet length (excludes the length field itself).
    pub length: u32,
    /// Message-type byte, absent for frames too short to carry one.
    pub msg_type: Option<u8>,
}

/// Recognizes the peer's identification banner at the front of `buf`.
///
/// Scans for a carriage return; until both terminator bytes are visible the
/// result is [`Decode::NeedMoreData`]. A visible terminator is then
/// validated: line feed after the carriage return, line no longer than 255
/// bytes, and the `SSH-2.0-` prefix. The returned frame borrows the banner
/// line (terminator excluded); `consumed` covers the line plus CRLF.
///
/// # Errors
///
/// Returns [`KexholdError::Protocol`] if the terminator or prefix rules are
/// violated.
///
/// # Example
///
/// ```rust
/// use kexhold_proto::ssh::codec::{decode_banner, Decode};
///
/// let outcome = decode_banner(b"SSH-2.0-OpenSSH_9.0\r\nrest").unwrap();
/// assert_eq!(
///     outcome,
///     Decode::Complete { frame: &b"SSH-2.0-OpenSSH_9.0"[..], consumed: 21 }
/// );
/// ```
pub fn decode_banner(buf: &[u8]) -> KexholdResult<Decode<&[u8]>> {
    // wait for CR, and for the byte after it
    let cr = match buf.iter().position(|&b| b == b'\r') {
        Some(cr) if cr + 1 < buf.len() => cr,
        _ => return Ok(Decode::NeedMoreData),
    };

    if buf[cr + 1] != b'\n' {
        return Err(KexholdError::Protocol(
            "banner carriage return not followed by line feed".to_string(),
        ));
    }
    if cr > MAX_BANNER_LEN {
        return Err(KexholdError::Protocol(format!(
            "banner line too long: {} bytes (max {})",
            cr, MAX_BANNER_LEN
        )));
    }
    let line = &buf[..cr];
    if !line.starts_with(BANNER_PREFIX) {
        return Err(KexholdError::Protocol(
            "banner does not identify SSH protocol 2.0".to_string(),
        ));
    }

    Ok(Decode::Complete {
        frame: line,
        consumed: cr + 2,
    })
}

/// Frames a binary packet at the front of `buf`.
///
/// `capacity` is the receive buffer's fixed capacity: a declared length
/// whose frame could never fit is rejected immediately, regardless of how
/// many bytes have actually arrived. An incomplete frame is
/// [`Decode::NeedMoreData`]; a complete one carries the declared length and
/// the message-type byte at [`MSG_TYPE_OFFSET`] (absent for degenerate
/// frames too short to contain it). `consumed` is always the whole frame,
/// length field included.
///
/// # Errors
///
/// Returns [`KexholdError::Protocol`] for an oversize packet.
///
/// # Example
///
/// ```rust
/// use kexhold_proto::ssh::codec::{decode_packet, Decode, PacketHead};
///
/// let frame = [0, 0, 0, 12, 5, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
/// let outcome = decode_packet(&frame, 2048).unwrap();
/// assert_eq!(
///     outcome,
///     Decode::Complete {
///         frame: PacketHead { length: 12, msg_type: Some(20) },
///         consumed: 16,
///     }
/// );
/// ```
pub fn decode_packet(buf: &[u8], capacity: usize) -> KexholdResult<Decode<PacketHead>> {
    if buf.len() < LENGTH_FIELD_LEN {
        return Ok(Decode::NeedMoreData);
    }
    let mut head = &buf[..LENGTH_FIELD_LEN];
    let length = head.get_u32() as usize;
    let frame_len = length + LENGTH_FIELD_LEN;

    if frame_len > capacity {
        return Err(KexholdError::Protocol(format!(
            "oversize packet ({} bytes)",
            length
        )));
    }
    if buf.len() < frame_len {
        return Ok(Decode::NeedMoreData);
    }

    let msg_type = if frame_len > MSG_TYPE_OFFSET {
        Some(buf[MSG_TYPE_OFFSET])
    } else {
        None
    };

    Ok(Decode::Complete {
        frame: PacketHead {
            length: length as u32,
            msg_type,
        },
        consumed: frame_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPACITY: usize = 2048;

    #[test]
    fn test_banner_complete() {
        let outcome = decode_banner(b"SSH-2.0-OpenSSH_9.0\r\n").unwrap();
        assert_eq!(
            outcome,
            Decode::Complete {
                frame: &b"SSH-2.0-OpenSSH_9.0"[..],
                consumed: 21,
            }
        );
    }

    #[test]
    fn test_banner_leaves_trailing_bytes_unconsumed() {
        let buf = b"SSH-2.0-x\r\n\x00\x00\x00\x0c";
        match decode_banner(buf).unwrap() {
            Decode::Complete { consumed, .. } => assert_eq!(consumed, 11),
            other => panic!("expected complete banner, got {:?}", other),
        }
    }

    #[test]
    fn test_banner_fragmented_reads_agree() {
        let full = b"SSH-2.0-OpenSSH_9.0\r\n";
        // every strict prefix wants more data, never errors
        for end in 0..full.len() {
            assert_eq!(decode_banner(&full[..end]).unwrap(), Decode::NeedMoreData);
        }
        // the complete buffer decodes identically to the all-at-once case
        assert_eq!(
            decode_banner(full).unwrap(),
            decode_banner(b"SSH-2.0-OpenSSH_9.0\r\n").unwrap()
        );
    }

    #[test]
    fn test_banner_cr_as_last_byte_waits_for_lf() {
        assert_eq!(
            decode_banner(b"SSH-2.0-server\r").unwrap(),
            Decode::NeedMoreData
        );
    }

    #[test]
    fn test_banner_cr_without_lf_is_violation() {
        assert!(decode_banner(b"SSH-2.0-server\rX").is_err());
    }

    #[test]
    fn test_banner_wrong_prefix_is_violation() {
        assert!(decode_banner(b"SSH-1.5-old\r\n").is_err());
        assert!(decode_banner(b"HTTP/1.1 200 OK\r\n").is_err());
    }

    #[test]
    fn test_banner_too_long_is_violation() {
        let mut buf = b"SSH-2.0-".to_vec();
        buf.extend(std::iter::repeat(b'A').take(300));
        buf.extend_from_slice(b"\r\n");
        assert!(decode_banner(&buf).is_err());
    }

    #[test]
    fn test_banner_at_length_limit_is_accepted() {
        let mut buf = b"SSH-2.0-".to_vec();
        buf.extend(std::iter::repeat(b'A').take(MAX_BANNER_LEN - 8));
        buf.extend_from_slice(b"\r\n");
        match decode_banner(&buf).unwrap() {
            Decode::Complete { consumed, .. } => assert_eq!(consumed, MAX_BANNER_LEN + 2),
            other => panic!("expected complete banner, got {:?}", other),
        }
    }

    #[test]
    fn test_packet_needs_length_field() {
        assert_eq!(decode_packet(&[], CAPACITY).unwrap(), Decode::NeedMoreData);
        assert_eq!(
            decode_packet(&[0, 0, 0], CAPACITY).unwrap(),
            Decode::NeedMoreData
        );
    }

    #[test]
    fn test_packet_incomplete_frame_waits() {
        // declares 12 bytes after the length field, delivers 6
        let buf = [0, 0, 0, 12, 5, 20, 0, 0, 0, 0];
        assert_eq!(decode_packet(&buf, CAPACITY).unwrap(), Decode::NeedMoreData);
    }

    #[test]
    fn test_packet_split_delivery_matches_whole() {
        let mut frame = vec![0, 0, 0, 12, 5, 20];
        frame.extend_from_slice(&[0u8; 10]);
        let whole = decode_packet(&frame, CAPACITY).unwrap();
        // grow the buffer a few bytes at a time, as TCP might deliver it
        let mut grown = Vec::new();
        let mut last = Decode::NeedMoreData;
        for chunk in frame.chunks(3) {
            grown.extend_from_slice(chunk);
            last = decode_packet(&grown, CAPACITY).unwrap();
        }
        assert_eq!(last, whole);
    }

    #[test]
    fn test_packet_oversize_fails_before_arrival() {
        // the declared frame exceeds capacity even though only 4 bytes arrived
        let buf = (CAPACITY as u32).to_be_bytes();
        assert!(decode_packet(&buf, CAPACITY).is_err());
    }

    #[test]
    fn test_packet_at_capacity_is_not_oversize() {
        let length = (CAPACITY - LENGTH_FIELD_LEN) as u32;
        let mut buf = length.to_be_bytes().to_vec();
        buf.resize(CAPACITY, 0);
        buf[MSG_TYPE_OFFSET] = 2;
        match decode_packet(&buf, CAPACITY).unwrap() {
            Decode::Complete { frame, consumed } => {
                assert_eq!(consumed, CAPACITY);
                assert_eq!(frame.msg_type, Some(2));
            }
            other => panic!("expected complete frame, got {:?}", other),
        }
    }

    #[test]
    fn test_packet_disconnect_type() {
        let buf = [0, 0, 0, 12, 5, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        match decode_packet(&buf, CAPACITY).unwrap() {
            Decode::Complete { frame, .. } => assert_eq!(frame.msg_type, Some(1)),
            other => panic!("expected complete frame, got {:?}", other),
        }
    }

    #[test]
    fn test_packet_degenerate_frame_has_no_type() {
        // a 1-byte packet ends before the message-type offset
        let buf = [0, 0, 0, 1, 9];
        assert_eq!(
            decode_packet(&buf, CAPACITY).unwrap(),
            Decode::Complete {
                frame: PacketHead {
                    length: 1,
                    msg_type: None,
                },
                consumed: 5,
            }
        );
    }

    #[test]
    fn test_packet_consumes_exactly_the_frame() {
        let mut buf = vec![0, 0, 0, 12, 5, 20];
        buf.extend_from_slice(&[0u8; 10]);
        buf.extend_from_slice(b"tail");
        match decode_packet(&buf, CAPACITY).unwrap() {
            Decode::Complete { consumed, .. } => {
                assert_eq!(consumed, 16);
                assert_eq!(&buf[consumed..], b"tail");
            }
            other => panic!("expected complete frame, got {:?}", other),
        }
    }
}
