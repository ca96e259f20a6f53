// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 负责将 TCP 流中读取的请求头部字节解析为强类型的 `Request` 结构体：
//! 1. 请求行（方法、目标、版本）。
//! 2. 常用标头：`User-Agent`、`Accept`、`Accept-Encoding`、`Range`。
//! 3. 别名改写：GET 与 HEAD 请求在进入文件传输层之前替换请求目标。

use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;

use crate::{exception::Exception, param::*, rewrite::AliasRewriter};

lazy_static! {
    /// 单段字节范围：`bytes=a-b`、`bytes=a-`、`bytes=-n`
    static ref RANGE_PATTERN: Regex = Regex::new(r"^\s*bytes\s*=\s*(\d*)\s*-\s*(\d*)\s*$").unwrap();
}

/// `Range` 请求头描述的字节范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// 从 `start` 开始，到 `end`（含）或文件末尾
    FromTo(u64, Option<u64>),
    /// 文件最后 n 个字节
    Suffix(u64),
}

impl ByteRange {
    /// 根据文件大小求出闭区间 `[start, end]`，无法满足时返回 `None`
    pub fn resolve(&self, file_size: u64) -> Option<(u64, u64)> {
        if file_size == 0 {
            return None;
        }
        match *self {
            ByteRange::FromTo(start, end) => {
                if start >= file_size {
                    return None;
                }
                let end = end.map_or(file_size - 1, |e| e.min(file_size - 1));
                if start > end {
                    None
                } else {
                    Some((start, end))
                }
            }
            ByteRange::Suffix(0) => None,
            ByteRange::Suffix(n) => Some((file_size.saturating_sub(n), file_size - 1)),
        }
    }
}

fn parse_range(value: &str) -> Option<ByteRange> {
    let captures = RANGE_PATTERN.captures(value)?;
    let start = captures.get(1).map_or("", |m| m.as_str());
    let end = captures.get(2).map_or("", |m| m.as_str());
    match (start.is_empty(), end.is_empty()) {
        (false, true) => Some(ByteRange::FromTo(start.parse().ok()?, None)),
        (false, false) => {
            let (start, end): (u64, u64) = (start.parse().ok()?, end.parse().ok()?);
            // 起点大于终点的范围语法无效，整个头被忽略
            if start > end {
                return None;
            }
            Some(ByteRange::FromTo(start, Some(end)))
        }
        (true, false) => Some(ByteRange::Suffix(end.parse().ok()?)),
        (true, true) => None,
    }
}

/// 一次 HTTP 请求的元数据，不包含请求体
#[derive(Debug, Clone)]
pub struct Request {
    method: HttpRequestMethod,
    /// 当前请求目标（包含查询串），别名命中后为改写结果
    path: String,
    /// 别名改写前的原始请求目标
    original_path: Option<String>,
    version: HttpVersion,
    user_agent: String,
    /// 客户端支持的压缩编码列表（按解析顺序排列）
    accept_encoding: Vec<HttpEncoding>,
    accept: Option<String>,
    range: Option<ByteRange>,
}

impl Request {
    /// 从请求头部字节构建 `Request`。
    ///
    /// 头部之后的请求体会被忽略。`id` 只用于日志追踪。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };
        let head = match request_string.split_once("\r\n\r\n") {
            Some((head, _body)) => head,
            None => request_string,
        };
        let head = head.trim_end_matches('\0');

        let mut request_lines = head.split(CRLF);
        let request_line = request_lines.next().unwrap_or("");

        // 请求行 (e.g., "GET /index.html HTTP/1.1")
        let first_line_parts: Vec<&str> = request_line.split(' ').collect();
        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequest);
        }

        let method_str = first_line_parts[0].to_uppercase();
        let method = match method_str.as_str() {
            "GET" => HttpRequestMethod::Get,
            "HEAD" => HttpRequestMethod::Head,
            "OPTIONS" => HttpRequestMethod::Options,
            "POST" => HttpRequestMethod::Post,
            _ => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, &method_str);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let version_str = first_line_parts[first_line_parts.len() - 1].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 路径中可能包含未编码的空格，虽然不规范但通过 join 尝试恢复
        let path = first_line_parts[1..first_line_parts.len() - 1].join(" ");
        if path.is_empty() {
            error!("[ID{}]HTTP请求目标为空", id);
            return Err(Exception::MalformedRequest);
        }

        let mut user_agent = String::new();
        let mut accept_encoding = vec![];
        let mut accept = None;
        let mut range = None;
        for line in request_lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_lowercase().as_str() {
                "user-agent" => user_agent = value.to_string(),
                "accept" => accept = Some(value.to_string()),
                "accept-encoding" => {
                    // 只要包含关键词即视为支持
                    if value.contains("gzip") {
                        accept_encoding.push(HttpEncoding::Gzip);
                    }
                    if value.contains("deflate") {
                        accept_encoding.push(HttpEncoding::Deflate);
                    }
                    if value.contains("br") {
                        accept_encoding.push(HttpEncoding::Br);
                    }
                }
                "range" => {
                    range = parse_range(value);
                    if range.is_none() {
                        debug!("[ID{}]忽略无法识别的Range头: {}", id, value);
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            method,
            path,
            original_path: None,
            version,
            user_agent,
            accept_encoding,
            accept,
            range,
        })
    }

    /// 别名改写。只处理 GET 与 HEAD，命中时返回 `true`
    pub fn apply_alias(&mut self, rewriter: &AliasRewriter) -> bool {
        if !self.method.is_read() {
            return false;
        }
        match rewriter.rewrite(&self.path) {
            Some(mapped) => {
                self.original_path = Some(std::mem::replace(&mut self.path, mapped));
                true
            }
            None => false,
        }
    }
}

impl Request {
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    /// 请求目标（含查询参数），改写后为真实路径
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 别名改写前的请求目标
    pub fn original_path(&self) -> Option<&str> {
        self.original_path.as_deref()
    }

    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn accept_encoding(&self) -> &Vec<HttpEncoding> {
        &self.accept_encoding
    }

    pub fn accept(&self) -> Option<&String> {
        self.accept.as_ref()
    }

    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    pub fn wants_json(&self) -> bool {
        self.accept
            .as_ref()
            .map_or(false, |a| a.contains("application/json"))
    }
}
