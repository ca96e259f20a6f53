// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由
//!
//! 把（可能已经过别名改写的）请求目标映射到服务目录中的真实路径。
//!
//! ## 规则
//! 1. 去掉查询串与片段，百分号解码。
//! 2. 含 NUL 字节或 `..` 分量的路径直接拒绝，保证不会越出服务目录。
//! 3. 空分量与 `.` 分量忽略。
//! 4. 目录请求缺少结尾 `/` 时重定向；目录下有首页文件时返回首页，否则返回目录列表。

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::{exception::Exception, param::INDEX_FILES, rewrite::RequestTarget};

/// 路由结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// (物理路径, 解码后的请求路径)
    Directory(PathBuf, String),
    /// 301 跳转目标
    Redirect(String),
}

pub fn route(target: &str, root: &Path, id: u128) -> Result<Resolved, Exception> {
    let parts = RequestTarget::split(target);
    if !parts.path.starts_with('/') {
        return Err(Exception::InvalidPath);
    }
    let decoded = parts.decoded_path();
    if decoded.contains('\0') {
        return Err(Exception::InvalidPath);
    }

    let mut full_path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(Exception::InvalidPath),
            s => full_path.push(s),
        }
    }
    debug!("[ID{}]映射物理路径：{}", id, full_path.display());

    // 不存在、无权限、中间分量不是目录，一律按 404 处理
    let metadata = fs::metadata(&full_path).map_err(|_| Exception::FileNotFound)?;
    if !metadata.is_dir() {
        return Ok(Resolved::File(full_path));
    }

    if !parts.path.ends_with('/') {
        let mut location = format!("{}/", parts.path);
        if let Some(query) = parts.query.filter(|q| !q.is_empty()) {
            location.push('?');
            location.push_str(query);
        }
        return Ok(Resolved::Redirect(location));
    }

    for index in INDEX_FILES {
        let index_path = full_path.join(index);
        if index_path.is_file() {
            return Ok(Resolved::File(index_path));
        }
    }
    Ok(Resolved::Directory(full_path, decoded))
}
