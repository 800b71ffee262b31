//! SSH key exchange initialization (RFC 4253 Section 7.1).
//!
//! The probe sends a single SSH_MSG_KEXINIT per connection and never answers
//! the peer's reply, so this module only knows how to *build* the message:
//! algorithm name-lists, payload serialization, and binary-packet framing
//! (RFC 4253 Section 6). The advertised algorithms are a fixed legacy set;
//! nothing is ever negotiated.
//!
//! # Wire Format
//!
//! ```text
//! uint32    packet_length (big-endian, excludes itself)
//! byte      padding_length
//! byte      SSH_MSG_KEXINIT (20)
//! byte[16]  cookie (random bytes)
//! name-list kex_algorithms
//! name-list server_host_key_algorithms
//! name-list encryption_algorithms_client_to_server
//! name-list encryption_algorithms_server_to_client
//! name-list mac_algorithms_client_to_server
//! name-list mac_algorithms_server_to_client
//! name-list compression_algorithms_client_to_server
//! name-list compression_algorithms_server_to_client
//! name-list languages_client_to_server (empty)
//! name-list languages_server_to_client (empty)
//! boolean   first_kex_packet_follows (0)
//! uint32    0 (reserved)
//! byte[n]   random padding
//! ```
//!
//! # Example
//!
//! ```rust
//! use kexhold_proto::ssh::kex::KexInit;
//!
//! let kexinit = KexInit::new_default();
//! let packet = kexinit.to_packet();
//! assert_eq!(packet[5], 20); // SSH_MSG_KEXINIT
//! ```

use bytes::{BufMut, BytesMut};
use rand::RngCore;

use crate::ssh::message::MessageType;

/// Minimum padding length in bytes (RFC 4253 Section 6).
const MIN_PADDING_LEN: usize = 4;

/// Cipher block size the packet is aligned to (RFC 4253 Section 6).
const BLOCK_SIZE: usize = 8;

/// SSH_MSG_KEXINIT message (RFC 4253 Section 7.1).
///
/// Each algorithm list is a comma-separated list of algorithm names,
/// ordered by preference (most preferred first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KexInit {
    /// Random cookie (16 bytes)
    cookie: [u8; 16],
    /// Key exchange algorithms
    kex_algorithms: Vec<String>,
    /// Server host key algorithms
    server_host_key_algorithms: Vec<String>,
    /// Encryption algorithms client to server
    encryption_algorithms_client_to_server: Vec<String>,
    /// Encryption algorithms server to client
    encryption_algorithms_server_to_client: Vec<String>,
    /// MAC algorithms client to server
    mac_algorithms_client_to_server: Vec<String>,
    /// MAC algorithms server to client
    mac_algorithms_server_to_client: Vec<String>,
    /// Compression algorithms client to server
    compression_algorithms_client_to_server: Vec<String>,
    /// Compression algorithms server to client
    compression_algorithms_server_to_client: Vec<String>,
    /// Languages client to server (empty)
    languages_client_to_server: Vec<String>,
    /// Languages server to client (empty)
    languages_server_to_client: Vec<String>,
    /// First KEX packet follows
    first_kex_packet_follows: bool,
}

impl KexInit {
    /// Creates the KEXINIT message the probe advertises.
    ///
    /// The algorithm set is fixed and deliberately old-fashioned; the probe
    /// never performs the exchange, it only needs the server to accept the
    /// message and allocate handshake state.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kexhold_proto::ssh::kex::KexInit;
    ///
    /// let kexinit = KexInit::new_default();
    /// assert_eq!(kexinit.cookie().len(), 16);
    /// ```
    pub fn new_default() -> Self {
        let mut cookie = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut cookie);

        Self {
            cookie,
            kex_algorithms: vec![
                "diffie-hellman-group1-sha1".to_string(),
                "diffie-hellman-group14-sha1".to_string(),
            ],
            server_host_key_algorithms: vec!["ssh-dss".to_string(), "ssh-rsa".to_string()],
            encryption_algorithms_client_to_server: vec![
                "3des-cbc".to_string(),
                "aes128-cbc".to_string(),
            ],
            encryption_algorithms_server_to_client: vec![
                "3des-cbc".to_string(),
                "aes128-cbc".to_string(),
            ],
            mac_algorithms_client_to_server: vec!["hmac-sha1".to_string()],
            mac_algorithms_server_to_client: vec!["hmac-sha1".to_string()],
            compression_algorithms_client_to_server: vec!["none".to_string()],
            compression_algorithms_server_to_client: vec!["none".to_string()],
            languages_client_to_server: vec![],
            languages_server_to_client: vec![],
            first_kex_packet_follows: false,
        }
    }

    /// Returns the cookie.
    pub fn cookie(&self) -> &[u8; 16] {
        &self.cookie
    }

    /// Returns the key exchange algorithms.
    pub fn kex_algorithms(&self) -> &[String] {
        &self.kex_algorithms
    }

    /// Serializes the KEXINIT payload (without packet framing).
    ///
    /// # Example
    ///
    /// ```rust
    /// use kexhold_proto::ssh::kex::KexInit;
    ///
    /// let kexinit = KexInit::new_default();
    /// let bytes = kexinit.to_bytes();
    /// assert_eq!(bytes[0], 20); // SSH_MSG_KEXINIT
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();

        // byte SSH_MSG_KEXINIT (20)
        buf.put_u8(MessageType::KexInit as u8);

        // byte[16] cookie
        buf.put_slice(&self.cookie);

        // name-list fields
        write_name_list(&mut buf, &self.kex_algorithms);
        write_name_list(&mut buf, &self.server_host_key_algorithms);
        write_name_list(&mut buf, &self.encryption_algorithms_client_to_server);
        write_name_list(&mut buf, &self.encryption_algorithms_server_to_client);
        write_name_list(&mut buf, &self.mac_algorithms_client_to_server);
        write_name_list(&mut buf, &self.mac_algorithms_server_to_client);
        write_name_list(&mut buf, &self.compression_algorithms_client_to_server);
        write_name_list(&mut buf, &self.compression_algorithms_server_to_client);
        write_name_list(&mut buf, &self.languages_client_to_server);
        write_name_list(&mut buf, &self.languages_server_to_client);

        // boolean first_kex_packet_follows
        buf.put_u8(if self.first_kex_packet_follows { 1 } else { 0 });

        // uint32 reserved (always 0)
        buf.put_u32(0);

        buf.to_vec()
    }

    /// Serializes the KEXINIT as a complete binary packet, ready for the wire.
    ///
    /// Framing per RFC 4253 Section 6: minimum 4 bytes of random padding,
    /// total packet size a multiple of the 8-byte block size. The result is
    /// built once per run and replayed verbatim for every connection.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kexhold_proto::ssh::kex::KexInit;
    ///
    /// let packet = KexInit::new_default().to_packet();
    /// let declared = u32::from_be_bytes([packet[0], packet[1], packet[2], packet[3]]);
    /// assert_eq!(declared as usize + 4, packet.len());
    /// ```
    pub fn to_packet(&self) -> Vec<u8> {
        let payload = self.to_bytes();

        // packet_length field (4) + padding_length field (1)
        let header_len = 5;
        let unpadded_len = header_len + payload.len();

        let mut padding_len = MIN_PADDING_LEN;
        while (unpadded_len + padding_len) % BLOCK_SIZE != 0 {
            padding_len += 1;
        }

        let mut padding = vec![0u8; padding_len];
        rand::thread_rng().fill_bytes(&mut padding);

        let packet_length = 1 + payload.len() + padding.len();
        let mut buf = BytesMut::with_capacity(4 + packet_length);
        buf.put_u32(packet_length as u32);
        buf.put_u8(padding.len() as u8);
        buf.put_slice(&payload);
        buf.put_slice(&padding);
        buf.to_vec()
    }
}

/// Writes a name-list: uint32 length followed by comma-separated names
/// (RFC 4251 Section 5).
fn write_name_list(buf: &mut BytesMut, names: &[String]) {
    let joined = names.join(",");
    buf.put_u32(joined.len() as u32);
    buf.put_slice(joined.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kexinit_payload_starts_with_type_and_cookie() {
        let kexinit = KexInit::new_default();
        let bytes = kexinit.to_bytes();
        assert_eq!(bytes[0], 20);
        assert_eq!(&bytes[1..17], kexinit.cookie());
    }

    #[test]
    fn test_kexinit_payload_field_order() {
        let bytes = KexInit::new_default().to_bytes();
        // the first name-list follows the type byte and cookie
        let kex_len = u32::from_be_bytes([bytes[17], bytes[18], bytes[19], bytes[20]]) as usize;
        let kex_list = &bytes[21..21 + kex_len];
        assert_eq!(
            kex_list,
            b"diffie-hellman-group1-sha1,diffie-hellman-group14-sha1"
        );
    }

    #[test]
    fn test_kexinit_payload_trailer() {
        let bytes = KexInit::new_default().to_bytes();
        // boolean first_kex_packet_follows then uint32 reserved
        assert_eq!(&bytes[bytes.len() - 5..], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_packet_framing() {
        let packet = KexInit::new_default().to_packet();
        let declared =
            u32::from_be_bytes([packet[0], packet[1], packet[2], packet[3]]) as usize;
        let padding_len = packet[4] as usize;

        assert_eq!(declared + 4, packet.len());
        assert_eq!(packet.len() % BLOCK_SIZE, 0);
        assert!(padding_len >= MIN_PADDING_LEN);
        assert_eq!(packet[5], 20); // SSH_MSG_KEXINIT at buffer offset 5
    }

    #[test]
    fn test_packet_has_fixed_size() {
        // the algorithm lists are constant, so the frame size is too
        let packet = KexInit::new_default().to_packet();
        assert_eq!(packet.len(), 208);
        assert_eq!(packet[..4], [0x00, 0x00, 0x00, 0xcc]);
        assert_eq!(packet[4], 8);
    }

    #[test]
    fn test_cookie_is_randomized() {
        let a = KexInit::new_default();
        let b = KexInit::new_default();
        assert_ne!(a.cookie(), b.cookie());
    }
}
