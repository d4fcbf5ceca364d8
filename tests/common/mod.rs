//! 测试用的本地DNS服务器

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use trust_dns_resolver::proto::op::{Message, MessageType, OpCode, ResponseCode};
use trust_dns_resolver::proto::rr::rdata::{A, CNAME};
use trust_dns_resolver::proto::rr::{Name, RData, Record};

/// 记录表，键为小写FQDN，支持 `*.domain.` 形式的泛解析
#[derive(Default, Clone)]
pub struct Zone {
    records: HashMap<String, Vec<RData>>,
    silent: HashSet<String>,
}

fn key(name: &str) -> String {
    let name = name.to_lowercase();
    if name.ends_with('.') {
        name
    } else {
        format!("{}.", name)
    }
}

impl Zone {
    pub fn a(mut self, name: &str, ip: [u8; 4]) -> Self {
        self.records
            .entry(key(name))
            .or_default()
            .push(RData::A(A::new(ip[0], ip[1], ip[2], ip[3])));
        self
    }

    pub fn cname(mut self, name: &str, target: &str) -> Self {
        let target = Name::from_ascii(key(target)).unwrap();
        self.records
            .entry(key(name))
            .or_default()
            .push(RData::CNAME(CNAME(target)));
        self
    }

    /// 对这个名字的查询不做任何响应
    pub fn silent(mut self, name: &str) -> Self {
        self.silent.insert(key(name));
        self
    }

    fn find(&self, name: &str) -> Option<&Vec<RData>> {
        if let Some(records) = self.records.get(name) {
            return Some(records);
        }
        let parent = name.split_once('.')?.1;
        self.records.get(&format!("*.{}", parent))
    }

    fn answer(&self, request: &Message) -> Option<Message> {
        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(request.recursion_desired())
            .set_recursion_available(true);

        let mut found = false;
        for query in request.queries() {
            let name = key(&query.name().to_ascii());
            if self.silent.contains(&name) {
                return None;
            }
            response.add_query(query.clone());
            if let Some(records) = self.find(&name) {
                found = true;
                for rdata in records {
                    if rdata.record_type() == query.query_type() {
                        response.add_answer(Record::from_rdata(query.name().clone(), 60, rdata.clone()));
                    }
                }
            }
        }
        response.set_response_code(if found {
            ResponseCode::NoError
        } else {
            ResponseCode::NXDomain
        });
        Some(response)
    }
}

/// 在127.0.0.1的随机端口上应答查询，drop时停止
pub struct FakeDns {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    per_name: Arc<Mutex<HashMap<String, usize>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FakeDns {
    pub fn start(zone: Zone) -> Self {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        socket.set_read_timeout(Some(Duration::from_millis(20))).unwrap();
        let addr = socket.local_addr().unwrap();
        let queries = Arc::new(AtomicUsize::new(0));
        let per_name = Arc::new(Mutex::new(HashMap::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let queries = Arc::clone(&queries);
            let per_name = Arc::clone(&per_name);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut buf = [0u8; 4096];
                while !stop.load(Ordering::SeqCst) {
                    let (len, peer) = match socket.recv_from(&mut buf) {
                        Ok(received) => received,
                        Err(_) => continue,
                    };
                    queries.fetch_add(1, Ordering::SeqCst);
                    let request = match Message::from_vec(&buf[..len]) {
                        Ok(request) => request,
                        Err(_) => continue,
                    };
                    if let Ok(mut counts) = per_name.lock() {
                        for query in request.queries() {
                            *counts.entry(key(&query.name().to_ascii())).or_insert(0) += 1;
                        }
                    }
                    if let Some(response) = zone.answer(&request) {
                        let _ = socket.send_to(&response.to_vec().unwrap(), peer);
                    }
                }
            })
        };

        FakeDns {
            addr,
            queries,
            per_name,
            stop,
            handle: Some(handle),
        }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// 某个名字收到的查询次数，不区分记录类型
    pub fn queries_for(&self, name: &str) -> usize {
        self.per_name
            .lock()
            .map(|counts| counts.get(&key(name)).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl Drop for FakeDns {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// 示例中用到的记录
pub fn example_zone() -> Zone {
    Zone::default()
        .a("www.example.com", [93, 184, 216, 34])
        .a("mail.example.com", [10, 0, 0, 5])
        .cname("foo.example.com", "bar.example.net")
        .a("bar.example.net", [1, 2, 3, 4])
}

/// 在临时目录写一个字典文件
pub fn write_wordlist(name: &str, labels: &[&str]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "rsubenum-it-{}-{}.txt",
        std::process::id(),
        name
    ));
    let mut file = std::fs::File::create(&path).unwrap();
    for label in labels {
        writeln!(file, "{}", label).unwrap();
    }
    path
}
