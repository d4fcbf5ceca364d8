//! 并发解析流水线
//!
//! 候选域名 → 有界工作队列 → N个工作线程 → 结果通道 → 收集线程。
//!
//! 关闭顺序：候选发送完毕后关闭工作队列，等齐N个工作线程的完成信号后
//! 才释放协调者持有的结果通道发送端，再等待收集线程的完成信号，最后取出结果。
//! 结果通道只会在没有线程还能写入时关闭，结果集合也只会在收集线程退出后被读取。

use crossbeam_channel::{bounded, unbounded};
use log::{debug, info, warn};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::chain::ChainResolver;
use crate::dns_resolver::RecordLookup;
use crate::handle::spawn_aggregator;
use crate::model::ResolvedPair;
use crate::worker::{spawn_worker, Completion};

/// 默认工作线程数
pub const DEFAULT_WORKERS: usize = 100;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("工作线程数必须大于0")]
    NoWorkers,
    #[error("无法创建线程: {0}")]
    Spawn(#[from] io::Error),
    #[error("完成信号丢失: 期望{expected}个工作线程, 收到{received}个")]
    SignalLost { expected: usize, received: usize },
    #[error("收集线程异常退出")]
    AggregatorPanicked,
}

/// 一次流水线运行的结果
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// 按完成顺序排列的解析结果
    pub results: Vec<ResolvedPair>,
    /// 送入工作队列的候选数量
    pub candidates: usize,
    /// 收到的工作线程完成信号数
    pub workers_finished: usize,
    /// 收到的收集线程完成信号数
    pub aggregator_finished: usize,
    pub elapsed: Duration,
}

/// 流水线协调者
pub struct Pipeline<L> {
    resolver: Arc<ChainResolver<L>>,
    workers: usize,
}

impl<L: RecordLookup + 'static> Pipeline<L> {
    pub fn new(resolver: ChainResolver<L>, workers: usize) -> Self {
        Pipeline {
            resolver: Arc::new(resolver),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// 解析所有候选域名，阻塞直到全部完成
    pub fn run<I>(&self, candidates: I) -> Result<PipelineReport, PipelineError>
    where
        I: IntoIterator<Item = String>,
    {
        if self.workers == 0 {
            return Err(PipelineError::NoWorkers);
        }
        let start = Instant::now();

        let (fqdn_tx, fqdn_rx) = bounded::<String>(self.workers);
        let (gather_tx, gather_rx) = unbounded::<Vec<ResolvedPair>>();
        let (tracker_tx, tracker_rx) = unbounded::<Completion>();

        let mut worker_handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            worker_handles.push(spawn_worker(
                id,
                Arc::clone(&self.resolver),
                fqdn_rx.clone(),
                gather_tx.clone(),
                tracker_tx.clone(),
            )?);
        }
        let aggregator = spawn_aggregator(gather_rx, tracker_tx)?;
        drop(fqdn_rx);
        debug!("已启动 {} 个工作线程", self.workers);

        let mut queued = 0;
        for fqdn in candidates {
            if fqdn_tx.send(fqdn).is_err() {
                warn!("工作队列已关闭，停止发送候选域名");
                break;
            }
            queued += 1;
        }
        drop(fqdn_tx);
        debug!("已发送 {} 个候选域名，等待工作线程退出", queued);

        let mut workers_finished = 0;
        let mut aggregator_finished = 0;
        while workers_finished < self.workers {
            match tracker_rx.recv() {
                Ok(Completion::Worker(_)) => workers_finished += 1,
                Ok(Completion::Aggregator) => aggregator_finished += 1,
                Err(_) => {
                    return Err(PipelineError::SignalLost {
                        expected: self.workers,
                        received: workers_finished,
                    })
                }
            }
        }
        drop(gather_tx);

        while aggregator_finished == 0 {
            match tracker_rx.recv() {
                Ok(Completion::Aggregator) => aggregator_finished += 1,
                Ok(Completion::Worker(id)) => warn!("多余的工作线程完成信号: {}", id),
                Err(_) => {
                    return Err(PipelineError::SignalLost {
                        expected: self.workers,
                        received: workers_finished,
                    })
                }
            }
        }

        let results = aggregator
            .join()
            .map_err(|_| PipelineError::AggregatorPanicked)?;
        for handle in worker_handles {
            if handle.join().is_err() {
                warn!("工作线程异常退出");
            }
        }

        let elapsed = start.elapsed();
        info!(
            "解析完成: {} 个候选, {} 条结果, 耗时 {:.2?}",
            queued,
            results.len(),
            elapsed
        );

        Ok(PipelineReport {
            results,
            candidates: queued,
            workers_finished,
            aggregator_finished,
            elapsed,
        })
    }
}
