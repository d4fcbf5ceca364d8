use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use trust_dns_resolver::proto::rr::RecordType;

/// 查询的记录类型，只支持A和CNAME
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    A,
    Cname,
}

impl RecordKind {
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordKind::A => RecordType::A,
            RecordKind::Cname => RecordType::CNAME,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::A => write!(f, "A"),
            RecordKind::Cname => write!(f, "CNAME"),
        }
    }
}

/// 应答区中的一条记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsAnswer {
    A(Ipv4Addr),
    Cname(String), // 别名目标，带结尾的点
    Other(RecordType),
}

impl DnsAnswer {
    /// 按请求的类型取出记录内容，类型不符时返回None
    pub fn value_for(&self, kind: RecordKind) -> Option<String> {
        match (self, kind) {
            (DnsAnswer::A(ip), RecordKind::A) => Some(ip.to_string()),
            (DnsAnswer::Cname(target), RecordKind::Cname) => Some(target.clone()),
            _ => None,
        }
    }
}

/// 一个解析成功的子域名
///
/// `hostname` 始终是最初查询的域名，即使解析过程中跟随了CNAME。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolvedPair {
    pub hostname: String,
    pub ip: String,
}

impl ResolvedPair {
    pub fn new(hostname: impl Into<String>, ip: impl Into<String>) -> Self {
        ResolvedPair {
            hostname: hostname.into(),
            ip: ip.into(),
        }
    }
}

impl fmt::Display for ResolvedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.hostname, self.ip)
    }
}
