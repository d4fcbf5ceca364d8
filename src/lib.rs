//! # rsubenum
//!
//! 基于字典的子域名枚举库：把字典中的每个标签和目标域名拼接，
//! 通过指定的DNS服务器解析出IPv4地址，遇到CNAME时沿链跟随直到A记录。
//!
//! ## 特性
//!
//! - 🚀 **并发解析**: 固定大小的工作线程池，有界工作队列提供背压
//! - 🔗 **CNAME跟随**: 结果始终记录最初查询的域名，带跳数上限防止CNAME环
//! - 🧹 **泛解析过滤**: 可选的随机子域名探测
//! - 📊 **多格式输出**: 支持JSON、CSV、TXT三种导出格式
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use rsubenum::brute_force_subdomains;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let domains = vec!["example.com".to_string()];
//!     let results = brute_force_subdomains(domains, Some("words.txt".to_string())).await?;
//!
//!     println!("发现 {} 条记录", results.len());
//!     for result in results.iter().take(5) {
//!         println!("  {} -> {}", result.hostname, result.ip);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## 直接使用流水线
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use rsubenum::{ChainResolver, DnsClient, Pipeline};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DnsClient::new("1.1.1.1:53", Duration::from_secs(2))?;
//!     let pipeline = Pipeline::new(ChainResolver::new(client), 50);
//!
//!     let report = pipeline.run(vec!["www.example.com".to_string()])?;
//!     print!("{}", rsubenum::output::render_table(&report.results));
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod chain;
pub mod dns_resolver;
pub mod handle;
pub mod input;
pub mod logger;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod wildcard;
pub mod worker;

// 重新导出主要的公共API
pub use api::{brute_force_subdomains, BoxError, SubdomainBruteConfig, SubdomainBruteEngine};

pub use chain::ChainResolver;
pub use dns_resolver::{DnsClient, LookupError, RecordLookup};
pub use handle::{generate_summary, SummaryStats};
pub use input::{OutputFormat, Opts};
pub use model::{DnsAnswer, RecordKind, ResolvedPair};
pub use output::{export_results, render_table};
pub use pipeline::{Pipeline, PipelineError, PipelineReport};
pub use wildcard::WildcardDetector;
