use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

use crate::handle::SummaryStats;
use crate::input::OutputFormat;
use crate::model::ResolvedPair;

/// 表格中主机名列与IP列之间的间距
const COLUMN_PADDING: usize = 4;

/// 完整的导出数据结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub results: Vec<ResolvedPair>,
    pub summary: SummaryStats,
    pub export_time: String,
}

/// 按列对齐生成 `hostname  ip` 表格，每条结果一行
pub fn render_table(results: &[ResolvedPair]) -> String {
    let width = results
        .iter()
        .map(|pair| pair.hostname.len())
        .max()
        .unwrap_or(0)
        + COLUMN_PADDING;

    let mut table = String::new();
    for pair in results {
        table.push_str(&format!("{:<width$}{}\n", pair.hostname, pair.ip, width = width));
    }
    table
}

/// 静默模式下的输出行，多条A记录的主机名只出现一次
pub fn silent_lines(results: &[ResolvedPair]) -> Vec<&str> {
    results
        .iter()
        .map(|pair| pair.hostname.as_str())
        .unique()
        .collect()
}

/// 打印最终结果
pub fn print_results(results: &[ResolvedPair], silent: bool) {
    if silent {
        for hostname in silent_lines(results) {
            println!("{}", hostname);
        }
    } else {
        print!("{}", render_table(results));
    }
}

/// 导出结果到文件
pub fn export_results(
    results: &[ResolvedPair],
    summary: SummaryStats,
    output_path: &str,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let export_data = ExportData {
        results: results.to_vec(),
        summary,
        export_time: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    };

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&export_data)?,
        OutputFormat::Csv => export_to_csv(&export_data),
        OutputFormat::Txt => export_to_txt(&export_data),
    };

    let mut file = File::create(output_path)?;
    file.write_all(content.as_bytes())?;

    log::info!("结果已导出到: {}", output_path);
    Ok(())
}

/// 导出为CSV格式
fn export_to_csv(data: &ExportData) -> String {
    let mut csv = String::from("Hostname,IP\n");
    for pair in &data.results {
        csv.push_str(&format!("{},{}\n", escape_csv(&pair.hostname), escape_csv(&pair.ip)));
    }
    csv
}

/// 导出为TXT格式
fn export_to_txt(data: &ExportData) -> String {
    let mut txt = String::new();

    txt.push_str("rsubenum 扫描结果报告\n");
    txt.push_str(&format!("导出时间: {}\n", data.export_time));
    txt.push_str(&format!("{}\n\n", "=".repeat(60)));

    txt.push_str("汇总统计:\n");
    txt.push_str(&format!("  发现域名总数: {}\n", data.summary.total_hosts));
    txt.push_str(&format!("  解析记录总数: {}\n", data.summary.total_records));
    txt.push_str(&format!("  唯一IP数量: {}\n", data.summary.unique_ips.len()));
    txt.push('\n');

    txt.push_str("发现的域名:\n");
    txt.push_str(&format!("{}\n", "-".repeat(60)));
    txt.push_str(&render_table(&data.results));

    txt
}

/// CSV转义
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
