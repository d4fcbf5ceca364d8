use log::debug;

use crate::dns_resolver::RecordLookup;
use crate::model::{RecordKind, ResolvedPair};

/// 最多跟随的CNAME跳数
pub const DEFAULT_MAX_HOPS: usize = 16;

/// 跟随CNAME直到拿到A记录
///
/// 每一跳只跟随第一个CNAME目标。超过 `max_hops` 的链按无结果处理，
/// 避免CNAME环导致无限循环。
pub struct ChainResolver<L> {
    client: L,
    max_hops: usize,
}

impl<L: RecordLookup> ChainResolver<L> {
    pub fn new(client: L) -> Self {
        Self::with_max_hops(client, DEFAULT_MAX_HOPS)
    }

    pub fn with_max_hops(client: L, max_hops: usize) -> Self {
        ChainResolver { client, max_hops }
    }

    pub fn client(&self) -> &L {
        &self.client
    }

    /// 解析一个候选域名，任何失败都返回空结果
    pub fn resolve(&self, fqdn: &str) -> Vec<ResolvedPair> {
        let mut current = fqdn.to_string();
        let mut hops = 0;

        loop {
            match self.client.lookup(&current, RecordKind::Cname) {
                Ok(targets) if !targets.is_empty() => {
                    if hops == self.max_hops {
                        debug!("{} 的CNAME链超过{}跳，放弃", fqdn, self.max_hops);
                        return Vec::new();
                    }
                    hops += 1;
                    current = targets.into_iter().next().unwrap_or_default();
                    continue;
                }
                _ => {}
            }

            return match self.client.lookup(&current, RecordKind::A) {
                Ok(ips) => ips
                    .into_iter()
                    .map(|ip| ResolvedPair::new(fqdn, ip))
                    .collect(),
                Err(_) => Vec::new(),
            };
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dns_resolver::LookupError;
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 内存中的记录表，键为 (小写FQDN, 类型)
    #[derive(Default)]
    pub(crate) struct StaticZone {
        records: HashMap<(String, RecordKind), Vec<String>>,
        unreachable: Vec<String>,
        pub(crate) queries: AtomicUsize,
    }

    impl StaticZone {
        pub(crate) fn a(mut self, name: &str, ips: &[&str]) -> Self {
            self.records.insert(
                (fqdn(name), RecordKind::A),
                ips.iter().map(|s| s.to_string()).collect(),
            );
            self
        }

        pub(crate) fn cname(mut self, name: &str, targets: &[&str]) -> Self {
            self.records.insert(
                (fqdn(name), RecordKind::Cname),
                targets.iter().map(|s| fqdn(s)).collect(),
            );
            self
        }

        pub(crate) fn unreachable(mut self, name: &str) -> Self {
            self.unreachable.push(fqdn(name));
            self
        }
    }

    fn fqdn(name: &str) -> String {
        crate::dns_resolver::to_fqdn(&name.to_lowercase())
    }

    impl RecordLookup for StaticZone {
        fn lookup(&self, name: &str, kind: RecordKind) -> Result<Vec<String>, LookupError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let name = fqdn(name);
            if self.unreachable.contains(&name) {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "timed out").into());
            }
            match self.records.get(&(name, kind)) {
                Some(values) => Ok(values.clone()),
                None => Err(LookupError::NoAnswer),
            }
        }
    }

    #[test]
    fn direct_a_records_keep_order() {
        let zone = StaticZone::default().a("www.example.com", &["93.184.216.34", "93.184.216.35"]);
        let resolver = ChainResolver::new(zone);

        let pairs = resolver.resolve("www.example.com");
        assert_eq!(
            pairs,
            vec![
                ResolvedPair::new("www.example.com", "93.184.216.34"),
                ResolvedPair::new("www.example.com", "93.184.216.35"),
            ]
        );
    }

    #[test]
    fn cname_hop_reports_original_name() {
        let zone = StaticZone::default()
            .cname("foo.example.com", &["bar.example.net"])
            .a("bar.example.net", &["1.2.3.4"]);
        let resolver = ChainResolver::new(zone);

        let pairs = resolver.resolve("foo.example.com");
        assert_eq!(pairs, vec![ResolvedPair::new("foo.example.com", "1.2.3.4")]);
    }

    #[test]
    fn only_first_cname_target_is_followed() {
        let zone = StaticZone::default()
            .cname("foo.example.com", &["first.example.net", "second.example.net"])
            .a("first.example.net", &["1.1.1.1"])
            .a("second.example.net", &["2.2.2.2"]);
        let resolver = ChainResolver::new(zone);

        assert_eq!(
            resolver.resolve("foo.example.com"),
            vec![ResolvedPair::new("foo.example.com", "1.1.1.1")]
        );
    }

    #[test]
    fn missing_records_give_empty_output() {
        let resolver = ChainResolver::new(StaticZone::default());
        assert!(resolver.resolve("doesnotexist123.example.com").is_empty());
    }

    #[test]
    fn broken_chain_gives_empty_output() {
        let zone = StaticZone::default().cname("foo.example.com", &["gone.example.net"]);
        let resolver = ChainResolver::new(zone);
        assert!(resolver.resolve("foo.example.com").is_empty());
    }

    #[test]
    fn transport_failure_gives_empty_output() {
        let zone = StaticZone::default()
            .a("www.example.com", &["10.0.0.1"])
            .unreachable("www.example.com");
        let resolver = ChainResolver::new(zone);
        assert!(resolver.resolve("www.example.com").is_empty());
    }

    #[test]
    fn cname_cycle_stops_at_hop_limit() {
        let zone = StaticZone::default()
            .cname("a.example.com", &["b.example.com"])
            .cname("b.example.com", &["a.example.com"])
            .a("a.example.com", &["10.0.0.1"]);
        let resolver = ChainResolver::with_max_hops(zone, 4);

        assert!(resolver.resolve("a.example.com").is_empty());
        // 5次CNAME查询，第5次超限后直接返回
        assert_eq!(resolver.client().queries.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn chain_within_limit_resolves() {
        let zone = StaticZone::default()
            .cname("a.example.com", &["b.example.com"])
            .cname("b.example.com", &["c.example.com"])
            .a("c.example.com", &["10.9.8.7"]);
        let resolver = ChainResolver::with_max_hops(zone, 2);

        assert_eq!(
            resolver.resolve("a.example.com"),
            vec![ResolvedPair::new("a.example.com", "10.9.8.7")]
        );
    }
}
