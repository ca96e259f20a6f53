// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了调试文件服务器在启动阶段和请求处理阶段可能出现的各类异常。
//!
//! - **启动阶段**：目录校验、配置读取、日志初始化、端口绑定。出现即终止进程（退出码 1）。
//! - **请求阶段**：报文解析错误与文件系统错误，由上层映射为对应的 HTTP 状态码。
//!
//! 局域网地址探测失败不属于异常，它只会让输出的 URL 变少。

use std::fmt;
use std::io;
use std::path::PathBuf;

/// 服务器运行过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行缺失或格式不正确（例如少于三段）。对应 `400 Bad Request`。
    MalformedRequest,
    /// 请求头部超过了 `MAX_REQUEST_HEAD` 限制。
    RequestTooLarge,
    /// 客户端使用了服务器暂不支持的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 在资源根目录下未找到所请求的文件。对应 `404 Not Found`。
    FileNotFound,
    /// 请求的路径包含越权尝试（`..`）或非法字节。对应 `400 Bad Request`。
    InvalidPath,
    /// 需要提供服务的目录不存在或不是目录。
    InvalidDirectory(PathBuf),
    /// 无法读取配置文件：(文件名, 原因)
    ConfigRead(String, String),
    /// 配置文件内容无法解析：(文件名, 原因)
    ConfigParse(String, String),
    /// log4rs 初始化失败
    LoggerInit(String),
    /// 无法绑定监听地址：(地址, 原因)
    Bind(String, String),
    /// 其他 I/O 错误
    Io(String),
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequest => write!(f, "Malformed request line"),
            RequestTooLarge => write!(f, "Request head is too large"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            FileNotFound => write!(f, "File not found (404)"),
            InvalidPath => write!(f, "Invalid path (400)"),
            InvalidDirectory(path) => write!(
                f,
                "Directory does not exist or is not a directory: {}",
                path.display()
            ),
            ConfigRead(file, reason) => write!(f, "Couldn't read config file {}: {}", file, reason),
            ConfigParse(file, reason) => {
                write!(f, "Couldn't parse config file {}: {}", file, reason)
            }
            LoggerInit(reason) => write!(f, "Couldn't initialize logger: {}", reason),
            Bind(addr, reason) => write!(f, "Couldn't bind {}: {}", addr, reason),
            Io(reason) => write!(f, "I/O error: {}", reason),
        }
    }
}

impl std::error::Error for Exception {}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => FileNotFound,
            _ => Io(e.to_string()),
        }
    }
}
