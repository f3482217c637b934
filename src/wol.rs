// ABOUTME: Wake-on-LAN magic packet construction and broadcast
// ABOUTME: One fire-and-forget UDP datagram; no reply is expected or awaited

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::info;

use crate::error::BackupError;

/// Six 0xFF header bytes followed by sixteen copies of the six-byte address.
const PACKET_LEN: usize = 6 + 16 * 6;

/// Builds the magic packet for `hardware_address`.
///
/// The address may use `:`, `-`, or space separators; after stripping them it
/// must be exactly twelve hex characters (case-insensitive).
pub fn magic_packet(hardware_address: &str) -> Result<Vec<u8>, BackupError> {
    let hex: Vec<char> = hardware_address
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | ' '))
        .collect();

    if hex.len() != 12 {
        return Err(BackupError::InvalidAddress(format!(
            "expected 12 hex characters, got {} in {:?}",
            hex.len(),
            hardware_address
        )));
    }

    let digits = hex
        .iter()
        .map(|c| {
            c.to_digit(16).ok_or_else(|| {
                BackupError::InvalidAddress(format!(
                    "non-hex character {:?} in {:?}",
                    c, hardware_address
                ))
            })
        })
        .collect::<Result<Vec<u32>, BackupError>>()?;

    let mut mac = [0u8; 6];
    for (i, byte) in mac.iter_mut().enumerate() {
        *byte = (digits[i * 2] * 16 + digits[i * 2 + 1]) as u8;
    }

    let mut packet = Vec::with_capacity(PACKET_LEN);
    packet.extend_from_slice(&[0xFF; 6]);
    for _ in 0..16 {
        packet.extend_from_slice(&mac);
    }
    Ok(packet)
}

/// Sends the magic packet for `hardware_address` as a single broadcast
/// datagram to `(broadcast_address, port)`.
///
/// Succeeds as soon as the packet is handed to the transport layer; the only
/// reported failure is transport-level (bind or send).
pub async fn send_wake(
    hardware_address: &str,
    broadcast_address: &str,
    port: u16,
) -> Result<(), BackupError> {
    let packet = magic_packet(hardware_address)?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.set_broadcast(true)?;
    socket.send_to(&packet, (broadcast_address, port)).await?;
    Ok(())
}

/// Seam between the orchestrator and the wake transmission.
#[async_trait]
pub trait WakeSignal: Send + Sync {
    async fn send_wake(&self) -> Result<(), BackupError>;
}

/// Production sender carrying the `[wake]` configuration.
pub struct WolSender {
    mac_address: String,
    broadcast_address: String,
    port: u16,
}

impl WolSender {
    pub fn new(
        mac_address: impl Into<String>,
        broadcast_address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            mac_address: mac_address.into(),
            broadcast_address: broadcast_address.into(),
            port,
        }
    }
}

#[async_trait]
impl WakeSignal for WolSender {
    async fn send_wake(&self) -> Result<(), BackupError> {
        send_wake(&self.mac_address, &self.broadcast_address, self.port).await?;
        info!(
            mac = %self.mac_address,
            broadcast = %self.broadcast_address,
            port = self.port,
            "wake-on-LAN packet sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: &str = "2A:14:6C:11:0F:C8";
    const MAC_BYTES: [u8; 6] = [0x2A, 0x14, 0x6C, 0x11, 0x0F, 0xC8];

    #[test]
    fn builds_standard_packet() {
        let packet = magic_packet(MAC).unwrap();

        assert_eq!(packet.len(), 102);
        assert_eq!(&packet[..6], &[0xFF; 6]);
        for rep in packet[6..].chunks(6) {
            assert_eq!(rep, MAC_BYTES);
        }
    }

    #[test]
    fn accepts_other_separators_and_lowercase() {
        let canonical = magic_packet(MAC).unwrap();

        assert_eq!(magic_packet("2a-14-6c-11-0f-c8").unwrap(), canonical);
        assert_eq!(magic_packet("2A 14 6C 11 0F C8").unwrap(), canonical);
        assert_eq!(magic_packet("2a146c110fc8").unwrap(), canonical);
    }

    #[test]
    fn rejects_wrong_length() {
        for addr in ["", "2A:14:6C:11:0F", "2A:14:6C:11:0F:C8:99", "2A146C110FC"] {
            let err = magic_packet(addr).unwrap_err();
            assert!(
                matches!(err, BackupError::InvalidAddress(_)),
                "{:?} should be rejected as invalid, got {:?}",
                addr,
                err
            );
        }
    }

    #[test]
    fn rejects_non_hex_characters() {
        let err = magic_packet("2A:14:6C:11:0F:CG").unwrap_err();
        assert!(matches!(err, BackupError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn sends_packet_as_single_datagram() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        send_wake(MAC, "127.0.0.1", port).await.unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = listener.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], magic_packet(MAC).unwrap().as_slice());
    }

    #[tokio::test]
    async fn invalid_address_transmits_nothing() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(send_wake("not-a-mac", "127.0.0.1", port).await.is_err());

        let mut buf = [0u8; 16];
        let got = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            listener.recv_from(&mut buf),
        )
        .await;
        assert!(got.is_err(), "no datagram should arrive");
    }
}
