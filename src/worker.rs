use crossbeam_channel::{Receiver, Sender};
use log::{debug, trace};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::chain::ChainResolver;
use crate::dns_resolver::RecordLookup;
use crate::model::ResolvedPair;

/// 发往协调者的完成信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Worker(usize),
    Aggregator,
}

/// 离开作用域时发送完成信号，线程panic时也只发一次
pub(crate) struct DoneSignal {
    signal: Completion,
    tracker: Sender<Completion>,
}

impl DoneSignal {
    pub(crate) fn new(signal: Completion, tracker: Sender<Completion>) -> Self {
        DoneSignal { signal, tracker }
    }
}

impl Drop for DoneSignal {
    fn drop(&mut self) {
        if self.tracker.send(self.signal).is_err() {
            debug!("{:?} 完成信号无人接收", self.signal);
        }
    }
}

/// 启动一个工作线程
///
/// 线程从 `fqdns` 取候选域名直到队列关闭并取空，非空结果发往 `gather`，
/// 最后在 `tracker` 上发送一次 `Completion::Worker(id)`。
/// 返回值为该线程解析成功的候选数量。
pub fn spawn_worker<L>(
    id: usize,
    resolver: Arc<ChainResolver<L>>,
    fqdns: Receiver<String>,
    gather: Sender<Vec<ResolvedPair>>,
    tracker: Sender<Completion>,
) -> io::Result<JoinHandle<usize>>
where
    L: RecordLookup + 'static,
{
    thread::Builder::new()
        .name(format!("resolver-{}", id))
        .spawn(move || {
            let _done = DoneSignal::new(Completion::Worker(id), tracker);
            // gather 先于 _done 释放，协调者收到信号时本线程已不再写入
            let gather = gather;
            run_worker(id, &resolver, &fqdns, &gather)
        })
}

fn run_worker<L: RecordLookup>(
    id: usize,
    resolver: &ChainResolver<L>,
    fqdns: &Receiver<String>,
    gather: &Sender<Vec<ResolvedPair>>,
) -> usize {
    let mut resolved = 0;
    for fqdn in fqdns.iter() {
        let results = resolver.resolve(&fqdn);
        if results.is_empty() {
            continue;
        }
        resolved += 1;
        if gather.send(results).is_err() {
            debug!("worker {}: 结果通道已关闭", id);
        }
    }
    trace!("worker {} 退出，解析成功 {} 个", id, resolved);
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::tests::StaticZone;
    use crossbeam_channel::{bounded, unbounded};

    #[test]
    fn worker_forwards_only_non_empty_batches() {
        let zone = StaticZone::default().a("www.example.com", &["10.0.0.1"]);
        let resolver = Arc::new(ChainResolver::new(zone));
        let (fqdn_tx, fqdn_rx) = bounded(4);
        let (gather_tx, gather_rx) = unbounded();
        let (tracker_tx, tracker_rx) = unbounded();

        let handle = spawn_worker(7, resolver, fqdn_rx, gather_tx, tracker_tx).unwrap();
        fqdn_tx.send("www.example.com".to_string()).unwrap();
        fqdn_tx.send("nope.example.com".to_string()).unwrap();
        drop(fqdn_tx);

        assert_eq!(handle.join().unwrap(), 1);
        assert_eq!(tracker_rx.recv().unwrap(), Completion::Worker(7));
        assert!(tracker_rx.try_recv().is_err());

        let batches: Vec<_> = gather_rx.iter().collect();
        assert_eq!(batches, vec![vec![ResolvedPair::new("www.example.com", "10.0.0.1")]]);
    }

    #[test]
    fn done_signal_sent_on_drop() {
        let (tracker_tx, tracker_rx) = unbounded();
        {
            let _done = DoneSignal::new(Completion::Aggregator, tracker_tx);
        }
        assert_eq!(tracker_rx.recv().unwrap(), Completion::Aggregator);
        assert!(tracker_rx.recv().is_err());
    }
}
