use log::info;
use rand::Rng;
use std::collections::{HashMap, HashSet};

use crate::chain::ChainResolver;
use crate::dns_resolver::RecordLookup;
use crate::model::ResolvedPair;

const PROBE_COUNT: usize = 3;
const PROBE_LABEL_LEN: usize = 10;

/// 泛解析检测器
#[derive(Debug, Default)]
pub struct WildcardDetector {
    wildcard_ips: HashMap<String, HashSet<String>>,
}

impl WildcardDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 检测域名是否存在泛解析
    ///
    /// 用随机子域名试探，至少两个能解析时认为存在泛解析，
    /// 记录它们解析到的全部IP。
    pub fn detect<L: RecordLookup>(&mut self, resolver: &ChainResolver<L>, domain: &str) -> bool {
        let domain = domain.trim_end_matches('.').to_lowercase();
        let mut resolved = 0;
        let mut ips = HashSet::new();

        for probe in generate_probe_names(&domain, PROBE_COUNT) {
            let pairs = resolver.resolve(&probe);
            if pairs.is_empty() {
                continue;
            }
            resolved += 1;
            ips.extend(pairs.into_iter().map(|pair| pair.ip));
        }

        if resolved >= 2 {
            info!("检测到泛解析域名: {} -> {:?}", domain, ips);
            self.wildcard_ips.insert(domain, ips);
            true
        } else {
            false
        }
    }

    pub fn is_wildcard(&self, domain: &str) -> bool {
        self.wildcard_ips
            .contains_key(&domain.trim_end_matches('.').to_lowercase())
    }

    /// 检查结果是否命中所属域名的泛解析IP
    pub fn is_wildcard_result(&self, pair: &ResolvedPair) -> bool {
        let hostname = pair.hostname.trim_end_matches('.').to_lowercase();
        self.wildcard_ips.iter().any(|(domain, ips)| {
            hostname.ends_with(&format!(".{}", domain)) && ips.contains(&pair.ip)
        })
    }

    /// 去掉泛解析产生的结果
    pub fn filter(&self, results: Vec<ResolvedPair>) -> Vec<ResolvedPair> {
        if self.wildcard_ips.is_empty() {
            return results;
        }
        results
            .into_iter()
            .filter(|pair| !self.is_wildcard_result(pair))
            .collect()
    }
}

/// 生成测试用的随机子域名
fn generate_probe_names(domain: &str, count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    let chars = b"abcdefghijklmnopqrstuvwxyz0123456789";

    (0..count)
        .map(|_| {
            let label: String = (0..PROBE_LABEL_LEN)
                .map(|_| chars[rng.gen_range(0..chars.len())] as char)
                .collect();
            format!("{}.{}", label, domain)
        })
        .collect()
}
