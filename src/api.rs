use log::info;
use std::time::Duration;

use crate::chain::{ChainResolver, DEFAULT_MAX_HOPS};
use crate::dns_resolver::{DnsClient, DEFAULT_TIMEOUT};
use crate::input::{candidate_stream, open_wordlist};
use crate::model::ResolvedPair;
use crate::pipeline::{Pipeline, PipelineReport, DEFAULT_WORKERS};
use crate::wildcard::WildcardDetector;

/// 可跨线程传递的错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 域名暴破配置
#[derive(Debug, Clone)]
pub struct SubdomainBruteConfig {
    /// 目标域名列表
    pub domains: Vec<String>,
    /// 字典文件路径
    pub dictionary_file: Option<String>,
    /// 内存中的字典，和字典文件合并使用
    pub labels: Vec<String>,
    /// DNS服务器，`host:port`
    pub server: String,
    /// 工作线程数
    pub workers: usize,
    /// 单次查询超时
    pub timeout: Duration,
    /// 最多跟随的CNAME跳数
    pub max_hops: usize,
    /// 是否过滤泛解析结果
    pub filter_wildcard: bool,
}

impl Default for SubdomainBruteConfig {
    fn default() -> Self {
        SubdomainBruteConfig {
            domains: Vec::new(),
            dictionary_file: None,
            labels: Vec::new(),
            server: "8.8.8.8:53".to_string(),
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            max_hops: DEFAULT_MAX_HOPS,
            filter_wildcard: false,
        }
    }
}

/// 域名暴破引擎
#[derive(Debug, Clone)]
pub struct SubdomainBruteEngine {
    config: SubdomainBruteConfig,
    client: DnsClient,
}

impl SubdomainBruteEngine {
    /// 创建新的暴破引擎，DNS服务器地址在这里解析
    pub fn new(config: SubdomainBruteConfig) -> Result<Self, BoxError> {
        if config.domains.is_empty() {
            return Err("至少需要一个目标域名".into());
        }
        let client = DnsClient::new(&config.server, config.timeout)?;
        Ok(SubdomainBruteEngine { config, client })
    }

    pub fn config(&self) -> &SubdomainBruteConfig {
        &self.config
    }

    /// 按需生成候选域名：先是内存中的字典，再是字典文件里的标签
    ///
    /// 字典文件在这里打开，打不开时在任何查询之前返回错误。
    pub fn candidates(&self) -> Result<impl Iterator<Item = String>, BoxError> {
        let from_file = match self.config.dictionary_file {
            Some(ref path) => Some(
                open_wordlist(path).map_err(|e| format!("无法读取字典文件 {}: {}", path, e))?,
            ),
            None => None,
        };
        let labels = self
            .config
            .labels
            .clone()
            .into_iter()
            .chain(from_file.into_iter().flatten());
        Ok(candidate_stream(labels, self.config.domains.clone()))
    }

    /// 读取整个字典并生成全部候选域名，字典文件在返回前关闭
    pub fn load_candidates(&self) -> Result<Vec<String>, BoxError> {
        Ok(self.candidates()?.collect())
    }

    /// 阻塞执行完整流程，返回运行报告
    pub fn run_blocking(&self) -> Result<PipelineReport, BoxError> {
        let candidates = self.candidates()?;
        info!(
            "目标域名: {}, 工作线程: {}, DNS服务器: {}",
            self.config.domains.join(","),
            self.config.workers,
            self.client.server()
        );

        let detector = if self.config.filter_wildcard {
            let resolver = self.chain_resolver();
            let mut detector = WildcardDetector::new();
            for domain in &self.config.domains {
                detector.detect(&resolver, domain);
            }
            Some(detector)
        } else {
            None
        };

        let pipeline = Pipeline::new(self.chain_resolver(), self.config.workers);
        let mut report = pipeline.run(candidates)?;

        if let Some(detector) = detector {
            let before = report.results.len();
            report.results = detector.filter(report.results);
            if report.results.len() < before {
                info!("过滤泛解析结果 {} 条", before - report.results.len());
            }
        }

        Ok(report)
    }

    /// 执行域名暴破，解析在阻塞线程池中进行
    pub async fn run_brute_force(&self) -> Result<Vec<ResolvedPair>, BoxError> {
        let engine = self.clone();
        let report = tokio::task::spawn_blocking(move || engine.run_blocking()).await??;
        Ok(report.results)
    }

    fn chain_resolver(&self) -> ChainResolver<DnsClient> {
        ChainResolver::with_max_hops(self.client.clone(), self.config.max_hops)
    }
}

/// 便捷的域名暴破函数
pub async fn brute_force_subdomains(
    domains: Vec<String>,
    dictionary_file: Option<String>,
) -> Result<Vec<ResolvedPair>, BoxError> {
    let config = SubdomainBruteConfig {
        domains,
        dictionary_file,
        ..Default::default()
    };

    let engine = SubdomainBruteEngine::new(config)?;
    engine.run_brute_force().await
}
