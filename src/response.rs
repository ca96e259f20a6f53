// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应构建
//!
//! 通用的静态文件传输层：MIME 类型、范围请求、目录列表、压缩与小文件缓存都在这里完成。
//! 别名改写发生在此之前，这一层只处理真实路径。

use crate::{
    cache::FileCache,
    config::ServerConfig,
    exception::Exception,
    param::*,
    request::Request,
    route::{route, Resolved},
    util::{format_file_size, HtmlBuilder},
};

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use log::{debug, error, warn};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use std::{
    fs::{self, metadata},
    io::{self, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

/// 响应体
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Bytes(Bytes),
    /// 发送时从磁盘分块读取
    File {
        path: PathBuf,
        offset: u64,
        length: u64,
    },
}

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    content_encoding: Option<HttpEncoding>,
    server_name: String,
    allow: Option<Vec<HttpRequestMethod>>,
    body: Body,
    content_range: Option<String>,
    accept_ranges: Option<String>,
    location: Option<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            content_encoding: None,
            server_name: SERVER_NAME.to_string(),
            allow: None,
            body: Body::Empty,
            content_range: None,
            accept_ranges: None,
            location: None,
        }
    }

    /// 传输层入口：按方法分派，再按路由结果构建响应
    pub fn from(
        request: &Request,
        root: &Path,
        id: u128,
        cache: &Mutex<FileCache>,
        config: &ServerConfig,
    ) -> Response {
        let accept_encoding = request.accept_encoding().to_vec();
        let headonly = match request.method() {
            HttpRequestMethod::Get => false,
            HttpRequestMethod::Head => {
                debug!("[ID{}]请求方法为HEAD", id);
                true
            }
            HttpRequestMethod::Options => {
                debug!("[ID{}]请求方法为OPTIONS", id);
                return Self::from_status_code(204, &accept_encoding, id);
            }
            HttpRequestMethod::Post => {
                return Self::from_status_code(405, &accept_encoding, id);
            }
        };

        let mut response = match route(request.path(), root, id) {
            Ok(Resolved::File(path)) => {
                debug!("[ID{}]请求的路径是文件", id);
                match Self::from_file(&path, request, id, cache, config) {
                    Ok(response) => response,
                    Err(e) => {
                        error!("[ID{}]读取文件{}失败: {}", id, path.display(), e);
                        Self::from_status_code(500, &accept_encoding, id)
                    }
                }
            }
            Ok(Resolved::Directory(path, display)) => {
                debug!("[ID{}]请求的路径是目录", id);
                match Self::from_dir(&path, &display, &accept_encoding, id, request.wants_json()) {
                    Ok(response) => response,
                    Err(e) => {
                        error!("[ID{}]读取目录{}失败: {}", id, path.display(), e);
                        Self::from_status_code(500, &accept_encoding, id)
                    }
                }
            }
            Ok(Resolved::Redirect(location)) => {
                debug!("[ID{}]目录请求缺少结尾斜杠，重定向到{}", id, location);
                Self::redirect(&location)
            }
            Err(Exception::FileNotFound) => {
                warn!("[ID{}]请求的路径：{} 不存在，返回404", id, request.path());
                Self::from_status_code(404, &accept_encoding, id)
            }
            Err(Exception::InvalidPath) => {
                warn!("[ID{}]请求的路径：{} 非法，返回400", id, request.path());
                Self::from_status_code(400, &accept_encoding, id)
            }
            Err(e) => {
                error!("[ID{}]路由时发生未知异常: {}", id, e);
                Self::from_status_code(500, &accept_encoding, id)
            }
        };

        // HEAD 与 GET 的响应头完全一致，只是不发送响应体
        if headonly {
            response.body = Body::Empty;
        }
        response.version = *request.version();
        response
    }

    fn from_file(
        path: &Path,
        request: &Request,
        id: u128,
        cache: &Mutex<FileCache>,
        config: &ServerConfig,
    ) -> io::Result<Self> {
        let mut response = Self::new();
        let file_metadata = metadata(path)?;
        let file_size = file_metadata.len();
        let file_modified_time = file_metadata.modified()?;
        let mime = get_mime(path);
        response.content_type = Some(mime.to_string());

        let range_request = if config.enable_range_requests() {
            response.accept_ranges = Some("bytes".to_string());
            request.range()
        } else {
            None
        };

        if let Some(range) = range_request {
            let Some((start, end)) = range.resolve(file_size) else {
                warn!("[ID{}]无效的Range请求: {:?}, file_size={}", id, range, file_size);
                response.set_code(416);
                response.content_type = None;
                response.content_range = Some(format!("bytes */{}", file_size));
                return Ok(response);
            };
            let length = end - start + 1;
            debug!("[ID{}]处理Range请求: bytes {}-{}/{} ({}字节)", id, start, end, file_size, length);

            response.set_code(206);
            response.content_range = Some(format!("bytes {}-{}/{}", start, end, file_size));
            response.content_length = length;
            response.body = Body::File {
                path: path.to_path_buf(),
                offset: start,
                length,
            };
            return Ok(response);
        }

        if file_size > config.streaming_threshold() {
            debug!(
                "[ID{}]文件大小: {} bytes, 流式阈值: {} bytes，不读入内存",
                id, file_size, config.streaming_threshold()
            );
            response.content_length = file_size;
            response.body = Body::File {
                path: path.to_path_buf(),
                offset: 0,
                length: file_size,
            };
            return Ok(response);
        }

        let contents = {
            let mut cache_lock = match cache.lock() {
                Ok(lock) => lock,
                Err(poisoned) => {
                    warn!("[ID{}]缓存锁被污染，恢复并继续", id);
                    poisoned.into_inner()
                }
            };
            match cache_lock.find(path, file_modified_time) {
                Some(bytes) => {
                    debug!("[ID{}]缓存命中，原始大小: {} bytes", id, bytes.len());
                    bytes
                }
                None => {
                    debug!("[ID{}]缓存未命中或文件已修改，读取文件: {}", id, path.display());
                    let bytes = Bytes::from(fs::read(path)?);
                    if FileCache::should_cache(file_size, config.streaming_threshold()) {
                        cache_lock.push(path, bytes.clone(), file_modified_time);
                    }
                    bytes
                }
            }
        };

        let encoding = if should_skip_compression(mime) {
            None
        } else {
            decide_encoding(request.accept_encoding())
        };
        response.set_content(contents, encoding, id);
        Ok(response)
    }

    fn from_dir(
        path: &Path,
        display_path: &str,
        accept_encoding: &[HttpEncoding],
        id: u128,
        is_json: bool,
    ) -> io::Result<Self> {
        debug!("[ID{}]from_dir: path={}, is_json={}", id, path.display(), is_json);
        let mut response = Self::new();

        let mut dir_vec = Vec::<PathBuf>::new();
        for entry in fs::read_dir(path)? {
            dir_vec.push(entry?.path());
        }

        let content_bytes = if is_json {
            response.content_type = Some("application/json".to_string());
            dir_vec.sort();
            let json_struct: Vec<_> = dir_vec
                .iter()
                .map(|p| {
                    let meta = fs::metadata(p).ok();
                    let is_dir = meta.as_ref().map_or(false, |m| m.is_dir());
                    let size = meta.as_ref().map(|m| m.len()).unwrap_or(0);
                    let modified = meta
                        .as_ref()
                        .and_then(|m| m.modified().ok())
                        .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
                        .unwrap_or_default();

                    let size_str = format_file_size(size);
                    serde_json::json!({
                        "name": p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
                        "type": if is_dir { "dir" } else { "file" },
                        "size": if is_dir { "-" } else { &size_str },
                        "raw_size": size,
                        "date": modified
                    })
                })
                .collect();
            serde_json::to_vec(&json_struct).map_err(io::Error::from)?
        } else {
            response.content_type = Some("text/html;charset=utf-8".to_string());
            HtmlBuilder::from_dir(display_path, &mut dir_vec)
                .build()
                .into_bytes()
        };

        let encoding = decide_encoding(accept_encoding);
        response.set_content(Bytes::from(content_bytes), encoding, id);
        Ok(response)
    }

    pub fn from_status_code(code: u16, accept_encoding: &[HttpEncoding], id: u128) -> Self {
        let mut response = Self::new();
        response.set_code(code);
        if code == 204 {
            response.allow = Some(ALLOWED_METHODS.to_vec());
            return response;
        }
        if code == 405 {
            response.allow = Some(ALLOWED_METHODS.to_vec());
        }
        let content = match code {
            404 => HtmlBuilder::from_status_code(404, Some(
                r"<h2>噢！</h2><p>你指定的文件无法找到。</p>"
            )),
            405 => HtmlBuilder::from_status_code(405, Some(
                r"<h2>噢！</h2><p>本服务器只支持GET、HEAD与OPTIONS方法。</p>"
            )),
            500 => HtmlBuilder::from_status_code(500, Some(
                r"<h2>噢！</h2><p>服务器出现了一个内部错误。</p>"
            )),
            _ => HtmlBuilder::from_status_code(code, None),
        }
        .build();
        response.content_type = Some("text/html;charset=utf-8".to_string());
        response.set_content(Bytes::from(content), decide_encoding(accept_encoding), id);
        response
    }

    pub fn redirect(location: &str) -> Self {
        let mut response = Self::new();
        response.set_code(301);
        response.location = Some(location.to_string());
        response
    }

    /// 请求无法解析时使用，此时没有可用的 `Request`
    pub fn bad_request(id: u128) -> Self {
        Self::from_status_code(400, &[], id)
    }

    /// 设置内存响应体，压缩失败时退回原始内容
    fn set_content(&mut self, contents: Bytes, encoding: Option<HttpEncoding>, id: u128) {
        let original_size = contents.len();
        let contents = match encoding {
            None => contents,
            Some(_) => match compress(&contents, encoding) {
                Ok(compressed) => {
                    debug!(
                        "[ID{}]压缩完成: {:?}, 原始: {} bytes -> 压缩后: {} bytes",
                        id, encoding, original_size, compressed.len()
                    );
                    self.content_encoding = encoding;
                    Bytes::from(compressed)
                }
                Err(e) => {
                    error!("[ID{}]压缩失败: {}，返回未压缩内容", id, e);
                    contents
                }
            },
        };
        self.content_length = contents.len() as u64;
        self.body = Body::Bytes(contents);
    }

    fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = STATUS_CODES.get(&code).copied().unwrap_or("Unknown").to_string();
        self
    }

    /// 状态行与全部响应头
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut header = format!(
            "{} {} {}{}",
            self.version, self.status_code, self.information, CRLF
        );
        if let Some(t) = &self.content_type {
            header.push_str(&format!("Content-Type: {}{}", t, CRLF));
        }
        if let Some(e) = self.content_encoding {
            header.push_str(&format!("Content-Encoding: {}{}", e, CRLF));
        }
        header.push_str(&format!("Content-Length: {}{}", self.content_length, CRLF));
        header.push_str(&format!("Date: {}{}", format_date(&self.date), CRLF));
        header.push_str(&format!("Server: {}{}", self.server_name, CRLF));
        if let Some(a) = &self.allow {
            let allow_str: Vec<String> = a.iter().map(|m| m.to_string()).collect();
            header.push_str(&format!("Allow: {}{}", allow_str.join(", "), CRLF));
        }
        if let Some(r) = &self.accept_ranges {
            header.push_str(&format!("Accept-Ranges: {}{}", r, CRLF));
        }
        if let Some(r) = &self.content_range {
            header.push_str(&format!("Content-Range: {}{}", r, CRLF));
        }
        if let Some(l) = &self.location {
            header.push_str(&format!("Location: {}{}", l, CRLF));
        }
        header.push_str("Connection: close");
        header.push_str(CRLF);
        header.push_str(CRLF);
        header.into_bytes()
    }

    /// 头部加内存响应体。文件响应体不包含在内，需要用 `write_to` 发送
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header_bytes();
        if let Body::Bytes(content) = &self.body {
            bytes.extend_from_slice(content);
        }
        bytes
    }

    /// 发送完整响应，返回发送的响应体字节数
    pub async fn write_to<W>(&self, writer: &mut W, chunk_size: usize) -> io::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.header_bytes()).await?;
        let sent = match &self.body {
            Body::Empty => 0,
            Body::Bytes(content) => {
                writer.write_all(content).await?;
                content.len() as u64
            }
            Body::File {
                path,
                offset,
                length,
            } => {
                let mut file = tokio::fs::File::open(path).await?;
                file.seek(SeekFrom::Start(*offset)).await?;
                let mut buffer = vec![0u8; chunk_size.max(1)];
                let mut remaining = *length;
                while remaining > 0 {
                    let want = remaining.min(buffer.len() as u64) as usize;
                    let n = file.read(&mut buffer[..want]).await?;
                    if n == 0 {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "file shrank while streaming",
                        ));
                    }
                    writer.write_all(&buffer[..n]).await?;
                    remaining -= n as u64;
                }
                *length
            }
        };
        writer.flush().await?;
        Ok(sent)
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, Body::File { .. })
    }

    pub fn get_content_length(&self) -> u64 {
        self.content_length
    }
}

/// IMF-fixdate，例如 `Sun, 06 Nov 1994 08:49:37 GMT`
fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn compress(data: &[u8], mode: Option<HttpEncoding>) -> io::Result<Vec<u8>> {
    match mode {
        Some(HttpEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Br) => {
            let params = BrotliEncoderParams::default();
            let mut output = Vec::new();
            enc::BrotliCompress(&mut io::Cursor::new(data), &mut output, &params)?;
            Ok(output)
        }
        None => Ok(data.to_vec()),
    }
}

fn should_skip_compression(mime_type: &str) -> bool {
    let skip_types = [
        "image/",
        "video/",
        "audio/",
        "application/zip",
        "application/octet-stream",
        "application/pdf",
    ];

    skip_types
        .iter()
        .any(|&skip_type| mime_type.starts_with(skip_type))
}

fn decide_encoding(accept_encoding: &[HttpEncoding]) -> Option<HttpEncoding> {
    if accept_encoding.contains(&HttpEncoding::Br) {
        Some(HttpEncoding::Br)
    } else if accept_encoding.contains(&HttpEncoding::Gzip) {
        Some(HttpEncoding::Gzip)
    } else if accept_encoding.contains(&HttpEncoding::Deflate) {
        Some(HttpEncoding::Deflate)
    } else {
        None
    }
}

fn get_mime(path: &Path) -> &'static str {
    let extension = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return "application/octet-stream",
    };
    match MIME_TYPES.get(extension.as_str()) {
        Some(v) => v,
        None => "application/octet-stream",
    }
}
