// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 文件扫描
//!
//! 递归遍历服务目录，按确定的顺序产出可以生成别名的测试媒体文件。
//!
//! 入选条件：
//! 1. 是普通文件（符号链接按其指向判断）。
//! 2. 相对于根目录的任何一级路径都不以 `.` 开头。
//! 3. 扩展名（不区分大小写）在白名单内。
//!
//! 同级条目按文件名字节序排序，目录就地展开，因此结果与按路径分量逐级比较的
//! 字典序一致，目录内容不变时每次扫描得到的序号都相同。

use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// 一次扫描得到的文件，路径相对于服务目录，分隔符统一为 `/`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    relative: String,
    extension: Option<String>,
}

impl FileEntry {
    /// 由相对路径构造。扩展名会被转成小写
    pub fn new(relative: &str) -> Self {
        let extension = Path::new(relative)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .filter(|e| !e.is_empty());
        Self {
            relative: relative.to_string(),
            extension,
        }
    }

    pub fn relative_path(&self) -> &str {
        &self.relative
    }

    /// 小写扩展名，不含前导点
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

pub struct FileScanner {
    root: PathBuf,
    extensions: Vec<String>,
}

impl FileScanner {
    /// `root` 必须是已经校验过的目录；`extensions` 为小写、不含点的扩展名白名单
    pub fn new(root: &Path, extensions: &[String]) -> Self {
        Self {
            root: root.to_path_buf(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// 惰性扫描。遍历途中遇到的不可读目录只记录警告并跳过
    pub fn scan(&self) -> impl Iterator<Item = FileEntry> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("扫描目录时跳过无法访问的条目: {}", e);
                    None
                }
            })
            .filter_map(move |entry| self.accept(&entry))
    }

    fn accept(&self, entry: &DirEntry) -> Option<FileEntry> {
        let path = entry.path();
        if !path.is_file() {
            return None;
        }
        let extension = path.extension()?.to_str()?.to_lowercase();
        if !self.extensions.iter().any(|e| *e == extension) {
            return None;
        }
        let relative = match relative_posix(&self.root, path) {
            Some(r) => r,
            None => {
                warn!("文件路径不是合法的UTF-8，跳过: {}", path.display());
                return None;
            }
        };
        debug!("扫描到文件: {}", relative);
        Some(FileEntry::new(&relative))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// 相对路径，以 `/` 连接各级分量
fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    Some(parts.join("/"))
}
