// UDP protocol listener
//
// Receives RADIUS datagrams and resolves each sender to a provider through
// the ProviderDirectory. Packet decoding and the authentication exchange are
// not handled here, so datagrams are classified and counted but never
// answered.

use async_trait::async_trait;
use radius_outpost_core::traits::ProtocolListener;
use radius_outpost_core::{ProviderDirectory, ProviderMatch, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::telemetry;

/// Largest RADIUS packet (RFC 2865 §3)
const MAX_PACKET_SIZE: usize = 4096;

/// Smallest RADIUS packet: code, identifier, length, authenticator
const MIN_PACKET_SIZE: usize = 20;

/// Why a datagram was not handed to a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Shorter than a RADIUS header
    Malformed,
    /// No provider's client networks contain the sender
    UnknownClient,
}

impl RejectReason {
    /// Metric label value
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Malformed => "malformed",
            RejectReason::UnknownClient => "unknown_client",
        }
    }
}

/// Classification of one received datagram
#[derive(Debug)]
pub enum Disposition {
    Accepted(ProviderMatch),
    Rejected(RejectReason),
}

/// RADIUS listener backed by a provider directory
pub struct UdpListener {
    addr: SocketAddr,
    directory: Arc<ProviderDirectory>,
}

impl UdpListener {
    pub fn new(addr: SocketAddr, directory: Arc<ProviderDirectory>) -> Self {
        Self { addr, directory }
    }

    /// Classify a datagram of `len` bytes from `src` and record the outcome
    pub fn handle_datagram(&self, src: SocketAddr, len: usize) -> Disposition {
        let disposition = if len < MIN_PACKET_SIZE {
            Disposition::Rejected(RejectReason::Malformed)
        } else {
            match self.directory.lookup(src.ip()) {
                Some(found) => Disposition::Accepted(found),
                None => Disposition::Rejected(RejectReason::UnknownClient),
            }
        };

        match &disposition {
            Disposition::Accepted(found) => {
                debug!(
                    client = %src,
                    provider = found.provider.name(),
                    network = %found.network,
                    "Matched client to provider"
                );
                telemetry::record_request("accepted");
            }
            Disposition::Rejected(reason) => {
                debug!(client = %src, len, reason = reason.as_str(), "Rejected datagram");
                telemetry::record_request("rejected");
                telemetry::record_rejection(reason.as_str());
            }
        }

        disposition
    }
}

#[async_trait]
impl ProtocolListener for UdpListener {
    async fn serve(&self) -> Result<()> {
        let socket = UdpSocket::bind(self.addr).await?;
        info!(listen = %self.addr, "RADIUS listener bound");

        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        loop {
            let (len, src) = socket.recv_from(&mut buf).await?;
            self.handle_datagram(src, len);
        }
    }

    fn listen_addr(&self) -> String {
        self.addr.to_string()
    }
}
