use std::process;
use std::time::Duration;

use clap::Parser;
use log::{error, warn};
use rsubenum::handle::{generate_summary, print_summary};
use rsubenum::input::{normalize_args, Opts, OutputFormat};
use rsubenum::output::{export_results, print_results};
use rsubenum::{logger, BoxError, SubdomainBruteConfig, SubdomainBruteEngine};

#[tokio::main]
async fn main() {
    let opts = Opts::parse_from(normalize_args(std::env::args_os()));

    if let Err(e) = logger::init_logger(logger::level_for(opts.verbose, opts.silent)) {
        eprintln!("日志初始化失败: {}", e);
    }

    if let Err(e) = run_subdomain_brute(opts).await {
        error!("域名枚举失败: {}", e);
        process::exit(1);
    }
}

/// 执行域名枚举主逻辑，结果在全部解析完成后一次性输出
async fn run_subdomain_brute(opts: Opts) -> Result<(), BoxError> {
    let config = SubdomainBruteConfig {
        domains: opts.domain.clone(),
        dictionary_file: Some(opts.wordlist.clone()),
        labels: Vec::new(),
        server: opts.server.clone(),
        workers: opts.workers,
        timeout: Duration::from_millis(opts.timeout),
        max_hops: opts.max_hops,
        filter_wildcard: opts.filter_wildcard,
    };

    let engine = SubdomainBruteEngine::new(config)?;
    let results = engine.run_brute_force().await?;

    print_results(&results, opts.silent);

    let summary = generate_summary(&results);
    if opts.summary {
        print_summary(&summary);
    }

    if let Some(output_path) = opts.output {
        let format = opts.format.parse::<OutputFormat>().unwrap_or_else(|e| {
            warn!("输出格式解析错误: {}, 使用默认JSON格式", e);
            OutputFormat::Json
        });
        export_results(&results, summary, &output_path, &format)
            .map_err(|e| format!("导出结果失败: {}", e))?;
    }

    Ok(())
}
