use crossbeam_channel::{Receiver, Sender};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::net::Ipv4Addr;
use std::thread::{self, JoinHandle};

use crate::model::ResolvedPair;
use crate::worker::{Completion, DoneSignal};

/// 启动唯一的结果收集线程
///
/// 按到达顺序收集每个批次，直到所有发送端关闭，然后发送
/// `Completion::Aggregator` 并通过 `JoinHandle` 交出结果。
pub fn spawn_aggregator(
    gather: Receiver<Vec<ResolvedPair>>,
    tracker: Sender<Completion>,
) -> io::Result<JoinHandle<Vec<ResolvedPair>>> {
    thread::Builder::new()
        .name("aggregator".to_string())
        .spawn(move || {
            let _done = DoneSignal::new(Completion::Aggregator, tracker);
            collect_results(&gather)
        })
}

fn collect_results(gather: &Receiver<Vec<ResolvedPair>>) -> Vec<ResolvedPair> {
    let mut results = Vec::new();
    for batch in gather.iter() {
        for pair in &batch {
            debug!("发现 {}", pair);
        }
        results.extend(batch);
    }
    results
}

/// 汇总统计信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_records: usize,
    pub total_hosts: usize,
    pub unique_ips: BTreeSet<String>,
    pub ip_ranges: BTreeMap<String, Vec<String>>,
}

/// 生成汇总统计
pub fn generate_summary(results: &[ResolvedPair]) -> SummaryStats {
    let mut unique_ips = BTreeSet::new();
    let mut ip_ranges: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for pair in results {
        if !unique_ips.insert(pair.ip.clone()) {
            continue;
        }
        // 计算IP段
        if let Ok(ip) = pair.ip.parse::<Ipv4Addr>() {
            let octets = ip.octets();
            let range = format!("{}.{}.{}.0/24", octets[0], octets[1], octets[2]);
            ip_ranges.entry(range).or_default().push(pair.ip.clone());
        }
    }

    SummaryStats {
        total_records: results.len(),
        total_hosts: results.iter().map(|pair| &pair.hostname).unique().count(),
        unique_ips,
        ip_ranges,
    }
}

/// 打印汇总信息
pub fn print_summary(summary: &SummaryStats) {
    println!("\n{}", "=".repeat(60));
    println!("                    汇总统计");
    println!("{}", "=".repeat(60));

    println!("发现域名总数: {}", summary.total_hosts);
    println!("解析记录总数: {}", summary.total_records);
    println!("唯一IP数量: {}", summary.unique_ips.len());

    println!("\nIP段分布 (前10个):");
    for (range, ips) in summary
        .ip_ranges
        .iter()
        .sorted_by(|a, b| b.1.len().cmp(&a.1.len()))
        .take(10)
    {
        println!("  {}: {} 个IP", range, ips.len());
    }

    if !summary.unique_ips.is_empty() {
        println!("\n发现的IP地址 (前20个):");
        for ip in summary.unique_ips.iter().take(20) {
            println!("  {}", ip);
        }
        if summary.unique_ips.len() > 20 {
            println!("  ... 还有 {} 个IP", summary.unique_ips.len() - 20);
        }
    }

    println!("{}", "=".repeat(60));
}
