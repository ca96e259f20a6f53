// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 集成测试公用的进程内服务器。
//!
//! 每个测试在临时目录中布置文件，绑定 127.0.0.1 的随机端口，
//! 然后通过原始 TCP 报文与服务器交互。

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use dev_fileserver::{server, AliasTable, FileScanner, ServerConfig, ServerContext};

pub struct TestServer {
    pub addr: SocketAddr,
    pub root: PathBuf,
    pub table: Arc<AliasTable>,
    stop: Arc<Notify>,
    task: JoinHandle<()>,
    _dir: TempDir,
}

/// 以 `/` 结尾的条目创建为空目录
pub fn populate(root: &Path, files: &[(&str, &[u8])]) {
    for (relative, content) in files {
        let path = root.join(relative);
        if relative.ends_with('/') {
            fs::create_dir_all(&path).unwrap();
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }
}

impl TestServer {
    pub async fn start(files: &[(&str, &[u8])]) -> Self {
        Self::start_with_config(files, "").await
    }

    pub async fn start_with_config(files: &[(&str, &[u8])], toml: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), files);
        let root = fs::canonicalize(dir.path()).unwrap();

        let config = ServerConfig::from_toml_str(toml, "test.toml").unwrap();
        let table = Arc::new(AliasTable::build(
            FileScanner::new(&root, config.extensions()).scan(),
        ));

        let listener = server::bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let ctx = Arc::new(ServerContext::new(root.clone(), config, Arc::clone(&table)));

        let stop = Arc::new(Notify::new());
        let signal = Arc::clone(&stop);
        let task = tokio::spawn(async move {
            server::serve(listener, ctx, async move { signal.notified().await }).await;
        });

        Self {
            addr,
            root,
            table,
            stop,
            task,
            _dir: dir,
        }
    }

    pub async fn get(&self, target: &str) -> RawResponse {
        self.request(&format!("GET {} HTTP/1.1\r\nHost: test\r\n\r\n", target))
            .await
    }

    pub async fn request(&self, raw: &str) -> RawResponse {
        self.request_bytes(raw.as_bytes()).await
    }

    pub async fn request_bytes(&self, raw: &[u8]) -> RawResponse {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(raw).await.unwrap();

        let mut buffer = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buffer))
            .await
            .expect("server did not close the connection")
            .unwrap();
        RawResponse::parse(&buffer)
    }

    pub async fn shutdown(self) {
        self.stop.notify_one();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("accept loop did not stop")
            .unwrap();
    }
}

pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn parse(bytes: &[u8]) -> Self {
        let split = bytes
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has no header terminator");
        let head = std::str::from_utf8(&bytes[..split]).unwrap();
        let body = bytes[split + 4..].to_vec();

        let mut lines = head.split("\r\n");
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(": "))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
