//! Direct A-record queries against a fixed public DNS server.
//!
//! The OS resolver would answer from the hosts table, which points the
//! upstream domain back at this process, so queries are built and sent by hand.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RData, RecordType};
use tokio::net::UdpSocket;

use crate::dns::ResolveError;

/// Largest UDP response we accept.
const MAX_RESPONSE_BYTES: usize = 4096;

/// Resolves a hostname to one IPv4 address.
pub trait HostLookup: Send + Sync + 'static {
    fn lookup_ipv4(&self, host: &str) -> impl Future<Output = Result<Ipv4Addr, ResolveError>> + Send;
}

/// One-shot UDP query to a configured DNS server.
#[derive(Debug, Clone)]
pub struct PublicDnsLookup {
    server: SocketAddr,
    timeout: Duration,
}

impl PublicDnsLookup {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    async fn exchange(&self, host: &str) -> Result<Ipv4Addr, ResolveError> {
        let fqdn = if host.ends_with('.') {
            host.to_string()
        } else {
            format!("{}.", host)
        };
        let name = Name::from_ascii(&fqdn).map_err(|e| ResolveError::protocol(host, e))?;

        let id = rand::random::<u16>();
        let mut query = Message::new();
        query
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_query(Query::query(name, RecordType::A));
        let request = query.to_vec().map_err(|e| ResolveError::protocol(host, e))?;

        let bind = if self.server.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, 0))
        };
        let io_error = |source| ResolveError::Io {
            host: host.to_string(),
            source,
        };
        let socket = UdpSocket::bind(bind).await.map_err(io_error)?;
        socket.connect(self.server).await.map_err(io_error)?;
        socket.send(&request).await.map_err(io_error)?;

        let mut buf = vec![0u8; MAX_RESPONSE_BYTES];
        loop {
            let len = socket.recv(&mut buf).await.map_err(io_error)?;
            let response = Message::from_vec(&buf[..len]).map_err(|e| ResolveError::protocol(host, e))?;
            // Stray datagrams with another id are not ours.
            if response.id() != id {
                continue;
            }
            if response.response_code() != ResponseCode::NoError {
                return Err(ResolveError::ResponseCode {
                    host: host.to_string(),
                    code: response.response_code().to_string(),
                });
            }
            return response
                .answers()
                .iter()
                .find_map(|record| match record.data() {
                    RData::A(a) => Some(a.0),
                    _ => None,
                })
                .ok_or_else(|| ResolveError::NoAnswer(host.to_string()));
        }
    }
}

impl HostLookup for PublicDnsLookup {
    async fn lookup_ipv4(&self, host: &str) -> Result<Ipv4Addr, ResolveError> {
        tracing::debug!(host, server = %self.server, "Querying public DNS");
        match tokio::time::timeout(self.timeout, self.exchange(host)).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::Timeout {
                host: host.to_string(),
                after: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::A;
    use hickory_proto::rr::Record;

    /// Answer a single query with the given A records.
    async fn fake_dns_server(answers: Vec<Ipv4Addr>) -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];
            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            let request = Message::from_vec(&buf[..len]).unwrap();
            let question = request.queries()[0].clone();

            let mut response = Message::new();
            response
                .set_id(request.id())
                .set_message_type(MessageType::Response)
                .set_op_code(OpCode::Query)
                .set_response_code(ResponseCode::NoError)
                .add_query(question.clone());
            for ip in answers {
                response.add_answer(Record::from_rdata(question.name().clone(), 60, RData::A(A(ip))));
            }
            socket.send_to(&response.to_vec().unwrap(), peer).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn returns_first_a_record() {
        let server = fake_dns_server(vec![Ipv4Addr::new(202, 248, 110, 243), Ipv4Addr::new(10, 0, 0, 1)]).await;
        let lookup = PublicDnsLookup::new(server, Duration::from_secs(2));

        let ip = lookup.lookup_ipv4("nmsg.nicovideo.jp").await.unwrap();
        assert_eq!(ip, Ipv4Addr::new(202, 248, 110, 243));
    }

    #[tokio::test]
    async fn empty_answer_is_an_error() {
        let server = fake_dns_server(vec![]).await;
        let lookup = PublicDnsLookup::new(server, Duration::from_secs(2));

        let err = lookup.lookup_ipv4("nmsg.nicovideo.jp").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoAnswer(_)));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let lookup = PublicDnsLookup::new(silent.local_addr().unwrap(), Duration::from_millis(200));

        let err = lookup.lookup_ipv4("nmsg.nicovideo.jp").await.unwrap_err();
        assert!(matches!(err, ResolveError::Timeout { .. }));
    }
}
