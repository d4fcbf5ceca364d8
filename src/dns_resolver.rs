use log::{debug, trace};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};
use thiserror::Error;
use trust_dns_resolver::proto::error::ProtoError;
use trust_dns_resolver::proto::op::{Message, MessageType, OpCode, Query};
use trust_dns_resolver::proto::rr::{Name, RData};

use crate::model::{DnsAnswer, RecordKind};

/// 默认的单次查询超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

const MAX_UDP_SIZE: usize = 4096;

/// 单次DNS查询的失败原因
#[derive(Debug, Error)]
pub enum LookupError {
    /// 服务器有响应，但应答区为空
    #[error("no answer")]
    NoAnswer,
    /// 发送失败或在超时前没有收到响应
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    /// 报文无法编码或解码
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),
}

/// 按记录类型查询一个域名
///
/// 链式解析器和测试都通过这个trait访问DNS，方便替换成内存实现。
pub trait RecordLookup: Send + Sync {
    fn lookup(&self, name: &str, kind: RecordKind) -> Result<Vec<String>, LookupError>;
}

/// 向指定DNS服务器发送单个问题的UDP查询
#[derive(Debug, Clone)]
pub struct DnsClient {
    server: SocketAddr,
    timeout: Duration,
}

impl DnsClient {
    /// `server` 为 `host:port` 形式
    pub fn new(server: &str, timeout: Duration) -> io::Result<Self> {
        let server = server.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("无法解析DNS服务器地址: {}", server),
            )
        })?;
        Ok(DnsClient { server, timeout })
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// 查询并返回应答区中所有记录的类型化结果
    pub fn query(&self, name: &str, kind: RecordKind) -> Result<Vec<DnsAnswer>, LookupError> {
        let request = build_query(name, kind, rand::random())?;
        let response = self.exchange(&request)?;
        if response.answers().is_empty() {
            return Err(LookupError::NoAnswer);
        }
        Ok(decode_answers(&response))
    }

    fn exchange(&self, request: &Message) -> Result<Message, LookupError> {
        let bind_addr: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(self.server)?;
        socket.send(&request.to_vec()?)?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; MAX_UDP_SIZE];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "dns query timed out").into());
            }
            socket.set_read_timeout(Some(remaining))?;

            let len = socket.recv(&mut buf)?;
            let response = Message::from_vec(&buf[..len])?;
            if response.id() != request.id() || response.message_type() != MessageType::Response {
                trace!("丢弃不匹配的响应 id={} from {}", response.id(), self.server);
                continue;
            }
            return Ok(response);
        }
    }
}

impl RecordLookup for DnsClient {
    fn lookup(&self, name: &str, kind: RecordKind) -> Result<Vec<String>, LookupError> {
        let answers = self.query(name, kind).map_err(|e| {
            debug!("{} {} 查询失败: {}", name, kind, e);
            e
        })?;
        Ok(answers.iter().filter_map(|answer| answer.value_for(kind)).collect())
    }
}

/// 补全结尾的点
pub fn to_fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// 构造单问题的查询报文
pub fn build_query(name: &str, kind: RecordKind, id: u16) -> Result<Message, LookupError> {
    let name = Name::from_ascii(to_fqdn(name))?;
    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(name, kind.record_type()));
    Ok(message)
}

/// 把应答区解码成封闭的变体集合
pub fn decode_answers(message: &Message) -> Vec<DnsAnswer> {
    message
        .answers()
        .iter()
        .map(|record| match record.data() {
            Some(RData::A(a)) => DnsAnswer::A(a.0),
            Some(RData::CNAME(cname)) => DnsAnswer::Cname(cname.0.to_ascii()),
            _ => DnsAnswer::Other(record.record_type()),
        })
        .collect()
}
