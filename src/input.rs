use clap::Parser;
use itertools::Itertools;
use log::warn;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

/// 允许以单横线书写的长参数
const LEGACY_LONG_FLAGS: &[&str] = &["domain", "wordlist", "server", "workers", "timeout"];

/// 输出格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Txt,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "txt" => Ok(OutputFormat::Txt),
            _ => Err(format!("不支持的输出格式: {}。支持的格式: json, csv, txt", s)),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rsubenum")]
#[command(version)]
#[command(about = "Resolve wordlist subdomains to IPv4 addresses, following CNAME chains", long_about = None, arg_required_else_help = true)]
pub struct Opts {
    /// target domain, may be repeated
    #[arg(short, long, required = true)]
    pub domain: Vec<String>,

    /// wordlist path, one label per line
    #[arg(short = 'f', long)]
    pub wordlist: String,

    /// amount of workers
    #[arg(short, long, default_value_t = crate::pipeline::DEFAULT_WORKERS)]
    pub workers: usize,

    /// dns server (host:port)
    #[arg(short, long, default_value = "8.8.8.8:53")]
    pub server: String,

    /// per query timeout in milliseconds
    #[arg(short, long, default_value_t = 2000)]
    pub timeout: u64,

    /// max CNAME hops followed per candidate
    #[arg(long, default_value_t = crate::chain::DEFAULT_MAX_HOPS)]
    pub max_hops: usize,

    /// drop results that match a wildcard record of the target domain
    #[arg(long)]
    pub filter_wildcard: bool,

    /// output file path
    #[arg(short, long)]
    pub output: Option<String>,

    /// output format (json, csv, txt)
    #[arg(long, default_value = "json")]
    pub format: String,

    /// show summary statistics
    #[arg(long)]
    pub summary: bool,

    /// only print hostnames
    #[arg(long)]
    pub silent: bool,

    /// debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// 把 `-domain`、`-wordlist=w.txt` 这类单横线长参数改写成双横线形式，其余参数原样保留
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            if arg.to_str().map(is_legacy_flag).unwrap_or(false) {
                let mut fixed = OsString::from("-");
                fixed.push(&arg);
                fixed
            } else {
                arg
            }
        })
        .collect()
}

fn is_legacy_flag(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some(name) if !name.starts_with('-') => {
            let name = name.split('=').next().unwrap_or(name);
            LEGACY_LONG_FLAGS.contains(&name)
        }
        _ => false,
    }
}

/// 逐行读取的字典，去掉首尾空白并跳过空行
///
/// 读取出错时记录警告并结束，文件句柄随迭代器一起释放。
pub struct Wordlist {
    lines: Option<Lines<BufReader<File>>>,
}

impl Iterator for Wordlist {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.lines.as_mut()?.next() {
                Some(Ok(line)) => {
                    let label = line.trim();
                    if !label.is_empty() {
                        return Some(label.to_string());
                    }
                }
                Some(Err(e)) => {
                    warn!("读取字典中断: {}", e);
                    self.lines = None;
                }
                None => self.lines = None,
            }
        }
    }
}

/// 打开字典文件，打不开时立即返回错误
pub fn open_wordlist<P: AsRef<Path>>(path: P) -> io::Result<Wordlist> {
    let file = File::open(path)?;
    Ok(Wordlist {
        lines: Some(BufReader::new(file).lines()),
    })
}

/// 一次性读入整个字典
pub fn load_wordlist<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
    Ok(open_wordlist(path)?.collect())
}

/// 按需把每个标签和每个目标域名拼成候选域名，标签只在被取用时才读取
pub fn candidate_stream<I>(labels: I, domains: Vec<String>) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = String>,
{
    let domains: Vec<String> = domains
        .iter()
        .map(|domain| domain.trim_end_matches('.').to_string())
        .collect();
    labels
        .into_iter()
        .cartesian_product(domains)
        .map(|(label, domain)| format!("{}.{}", label, domain))
}

/// 把字典中的每个标签和每个目标域名拼成候选域名
pub fn build_candidates(labels: &[String], domains: &[String]) -> Vec<String> {
    candidate_stream(labels.iter().cloned(), domains.to_vec()).collect()
}
