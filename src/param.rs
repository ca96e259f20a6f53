// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 全局参数与协议常量
//!
//! 该模块集中定义了调试文件服务器使用的默认值和 HTTP 协议常量：
//! - 命令行与配置文件的默认参数（监听地址、端口、样例目录等）。
//! - 别名生成所需的扩展名白名单与兜底扩展名。
//! - HTTP 状态码、MIME 映射表以及方法/版本/编码的强类型枚举。

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "shaneyale-dev-fileserver";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 默认监听地址（通配地址）
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 8788;

/// 默认提供服务的样例目录，位于仓库根目录下，与启动时的工作目录无关
pub const DEFAULT_SAMPLE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/sample_files");

/// 默认的 TOML 配置文件位置
pub const DEFAULT_CONFIG_FILE: &str = "config/development.toml";

/// 默认的 log4rs 配置文件位置
pub const DEFAULT_LOG_CONFIG_FILE: &str = "config/log4rs.yaml";

/// 文件没有扩展名时别名所使用的扩展名
pub const FALLBACK_EXTENSION: &str = "bin";

/// 默认允许生成别名的测试媒体扩展名（小写、不含点）
pub const DEFAULT_MEDIA_EXTENSIONS: [&str; 2] = ["mp4", "mkv"];

/// 用于探测本机局域网地址的外部地址。只建立 UDP 路由，不会发送任何数据。
pub const ROUTE_PROBE_TARGET: &str = "8.8.8.8:80";

/// 请求报文头部允许的最大字节数
pub const MAX_REQUEST_HEAD: usize = 16 * 1024;

/// 目录下优先返回的首页文件
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

lazy_static! {
    /// 服务器当前允许处理的 HTTP 方法列表。
    pub static ref ALLOWED_METHODS: Vec<HttpRequestMethod> = {
        vec![
            HttpRequestMethod::Get,
            HttpRequestMethod::Head,
            HttpRequestMethod::Options,
        ]
    };
}

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 只收录本服务器实际可能返回的状态码。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(200, "OK");
        map.insert(204, "No Content");
        map.insert(206, "Partial Content");
        map.insert(301, "Moved Permanently");
        map.insert(400, "Bad Request");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(413, "Content Too Large");
        map.insert(416, "Range Not Satisfiable");
        map.insert(500, "Internal Server Error");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

lazy_static! {
    /// 文件后缀名（小写）到 MIME 类型的映射表。
    ///
    /// 以音视频、字幕和图片为主，外加目录浏览时常见的文本类型。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        // 视频容器
        map.insert("mp4", "video/mp4");
        map.insert("m4v", "video/x-m4v");
        map.insert("mkv", "video/x-matroska");
        map.insert("webm", "video/webm");
        map.insert("mov", "video/quicktime");
        map.insert("avi", "video/x-msvideo");
        map.insert("ts", "video/mp2t");
        map.insert("mpeg", "video/mpeg");
        map.insert("ogv", "video/ogg");
        map.insert("3gp", "video/3gpp");
        // 流媒体清单
        map.insert("m3u8", "application/vnd.apple.mpegurl");
        map.insert("mpd", "application/dash+xml");
        // 音频
        map.insert("aac", "audio/aac");
        map.insert("m4a", "audio/mp4");
        map.insert("mp3", "audio/mpeg");
        map.insert("flac", "audio/flac");
        map.insert("oga", "audio/ogg");
        map.insert("opus", "audio/opus");
        map.insert("wav", "audio/wav");
        // 字幕
        map.insert("srt", "application/x-subrip");
        map.insert("vtt", "text/vtt");
        // 图片
        map.insert("gif", "image/gif");
        map.insert("jpg", "image/jpeg");
        map.insert("jpeg", "image/jpeg");
        map.insert("png", "image/png");
        map.insert("svg", "image/svg+xml");
        map.insert("webp", "image/webp");
        map.insert("ico", "image/x-icon");
        // 文本与杂项
        map.insert("css", "text/css;charset=utf-8");
        map.insert("htm", "text/html;charset=utf-8");
        map.insert("html", "text/html;charset=utf-8");
        map.insert("js", "text/javascript;charset=utf-8");
        map.insert("json", "application/json");
        map.insert("txt", "text/plain;charset=utf-8");
        map.insert("xml", "text/xml");
        map.insert("pdf", "application/pdf");
        map.insert("zip", "application/zip");
        map.insert("bin", "application/octet-stream");
        map
    };
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpVersion {
    /// HTTP/1.0 版本，部分播放器内核仍会使用
    V1_0,
    /// HTTP/1.1 版本
    V1_1,
}

/// 标准 HTTP 请求方法
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpRequestMethod {
    /// 获取资源
    Get,
    /// 获取资源的元数据（不包含响应体）
    Head,
    /// 查询服务器支持的选项
    Options,
    /// 提交数据。本服务器只解析，不处理，统一返回 405
    Post,
}

impl HttpRequestMethod {
    /// 读取类请求（GET / HEAD）才会经过别名改写
    pub fn is_read(&self) -> bool {
        matches!(self, HttpRequestMethod::Get | HttpRequestMethod::Head)
    }
}

/// 支持的内容编码（压缩）格式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpEncoding {
    /// GNU zip 压缩
    Gzip,
    /// zlib 压缩
    Deflate,
    /// Brotli 压缩
    Br,
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "HTTP/1.0"),
            HttpVersion::V1_1 => write!(f, "HTTP/1.1"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Options => write!(f, "OPTIONS"),
            HttpRequestMethod::Post => write!(f, "POST"),
        }
    }
}

impl fmt::Display for HttpEncoding {
    /// 将枚举格式化为 `Content-Encoding` 头所使用的标识符
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpEncoding::Gzip => write!(f, "gzip"),
            HttpEncoding::Deflate => write!(f, "deflate"),
            HttpEncoding::Br => write!(f, "br"),
        }
    }
}
