// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 服务器生命周期
//!
//! 启动时绑定一次监听套接字，主循环接受连接并为每个连接派生独立任务，
//! 直到收到中断信号或控制台的 `stop` 指令。慢速连接不会阻塞其他测试设备。
//!
//! 别名表、配置等共享状态在第一个连接到来之前就已构建完成，之后只读。
//! 唯一需要加锁的是小文件缓存。

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::Notify,
};

use crate::{
    alias::AliasTable,
    cache::FileCache,
    config::ServerConfig,
    exception::Exception,
    param::MAX_REQUEST_HEAD,
    request::Request,
    response::Response,
    rewrite::AliasRewriter,
};

/// 所有连接共享的运行状态
pub struct ServerContext {
    root: PathBuf,
    config: ServerConfig,
    rewriter: AliasRewriter,
    cache: Mutex<FileCache>,
    active_connection: AtomicUsize,
}

impl ServerContext {
    pub fn new(root: PathBuf, config: ServerConfig, table: Arc<AliasTable>) -> Self {
        let cache = Mutex::new(FileCache::from_capacity(config.cache_size()));
        Self {
            root,
            config,
            rewriter: AliasRewriter::new(table),
            cache,
            active_connection: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn aliases(&self) -> &AliasTable {
        self.rewriter.table()
    }

    pub fn active_connections(&self) -> usize {
        self.active_connection.load(Ordering::SeqCst)
    }
}

/// 绑定监听地址
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, Exception> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|e| Exception::Bind(format!("{}:{}", host, port), e.to_string()))?;
    info!("服务端将在{}:{}上监听Socket连接", host, port);
    Ok(listener)
}

/// 主事件循环。`shutdown` 完成后停止接受新连接并释放监听套接字。
///
/// 已派生的连接任务不会被等待，随运行时一起结束。
pub async fn serve<F>(listener: TcpListener, ctx: Arc<ServerContext>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut id: u128 = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("主循环接收到停机指令，正在退出...");
                break;
            }
            accepted = listener.accept() => {
                let (mut stream, addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("接受连接失败: {}", e);
                        continue;
                    }
                };
                debug!("[ID{}]TCP连接已建立：{}", id, addr);

                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    ctx.active_connection.fetch_add(1, Ordering::SeqCst);
                    handle_connection(&mut stream, id, &ctx).await;
                    ctx.active_connection.fetch_sub(1, Ordering::SeqCst);
                });
                id += 1;
            }
        }
    }

    drop(listener);
    info!("监听套接字已释放");
}

/// 等待 Ctrl+C 或控制台的停机通知
pub async fn shutdown_signal(stop: Arc<Notify>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("无法监听中断信号: {}，仅能通过控制台停机", e);
                stop.notified().await;
            }
        }
        _ = stop.notified() => {}
    }
}

/// 读取请求头部，直到空行。对端直接关闭时返回空缓冲区
async fn read_head(stream: &mut TcpStream) -> Result<Vec<u8>, Exception> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(buffer);
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            return Ok(buffer);
        }
        if buffer.len() > MAX_REQUEST_HEAD {
            return Err(Exception::RequestTooLarge);
        }
    }
}

/// # 连接处理器
///
/// 单个 TCP 流的完整生命周期：读取解析请求、别名改写、构建并发送响应。
pub async fn handle_connection(stream: &mut TcpStream, id: u128, ctx: &ServerContext) {
    let buffer = match read_head(stream).await {
        Ok(buffer) if buffer.is_empty() => return,
        Ok(buffer) => buffer,
        Err(Exception::RequestTooLarge) => {
            warn!("[ID{}]请求头部过大，返回413", id);
            let _ = Response::from_status_code(413, &[], id).write_to(stream, 0).await;
            return;
        }
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    };
    let start_time = Instant::now();

    let mut request = match Request::try_from(&buffer, id) {
        Ok(req) => req,
        Err(e) => {
            warn!("[ID{}]解析HTTP请求失败: {}", id, e);
            let response = match e {
                Exception::UnSupportedRequestMethod => Response::from_status_code(405, &[], id),
                Exception::UnsupportedHttpVersion => Response::from_status_code(505, &[], id),
                _ => Response::bad_request(id),
            };
            let _ = response.write_to(stream, 0).await;
            return;
        }
    };

    if request.apply_alias(&ctx.rewriter) {
        debug!(
            "[ID{}]别名命中：{} -> {}",
            id,
            request.original_path().unwrap_or_default(),
            request.path()
        );
    }

    let response = Response::from(&request, &ctx.root, id, &ctx.cache, &ctx.config);
    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    info!(
        "[ID{}] {}, {}, {}, {}, {} {}, {}",
        id,
        request.version(),
        request.original_path().unwrap_or(request.path()),
        request.path(),
        request.method(),
        response.status_code(),
        response.information(),
        request.user_agent(),
    );

    match response.write_to(stream, ctx.config.chunk_size()).await {
        Ok(sent) => debug!("[ID{}]响应发送完成，响应体{}字节", id, sent),
        // 播放器拖动进度条时经常主动断开
        Err(e) => debug!("[ID{}]发送响应中断: {}", id, e),
    }
    let _ = stream.shutdown().await;
}

/// # 管理控制台
///
/// 从标准输入读取运维指令。输入结束时控制台退出，服务器继续运行。
pub async fn run_console<R>(reader: R, ctx: Arc<ServerContext>, stop: Arc<Notify>, report: String)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("读取控制台输入失败: {}", e);
                break;
            }
        };
        match line.trim() {
            "" => {}
            "stop" => {
                println!("停机指令已激活，服务器即将关闭...");
                stop.notify_one();
                break;
            }
            "status" => {
                println!("== Dev Fileserver 状态 ===");
                println!("服务目录: {}", ctx.root().display());
                println!("监听地址: {}:{}", ctx.config().host(), ctx.config().port());
                println!("当前活跃连接数: {}", ctx.active_connections());
                println!("别名数量: {}", ctx.aliases().len());
                println!("=========================");
            }
            "urls" => print!("{}", report),
            "help" => {
                println!("== Dev Fileserver Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前服务器运行状态");
                println!("urls   - 重新打印测试URL");
                println!("help   - 显示此帮助信息");
                println!("=========================");
            }
            cmd => println!("无效的命令：{}", cmd),
        }
    }
}
