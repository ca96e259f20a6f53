// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 别名表
//!
//! 第 i 个扫描到的文件（从 1 开始）得到别名 `/<i>.<小写扩展名>`，没有扩展名时使用 `bin`。
//! 序号本身互不相同，所以别名不会冲突。
//!
//! 别名表在启动时构建一次，之后只读，所有连接通过 `Arc` 共享，不需要加锁。

use std::collections::HashMap;

use crate::{param::FALLBACK_EXTENSION, scanner::FileEntry};

/// 一条别名记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    key: String,
    relative: String,
}

impl Alias {
    /// 别名路径，形如 `/3.mp4`
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 对应的真实相对路径
    pub fn relative_path(&self) -> &str {
        &self.relative
    }
}

/// 别名到相对路径的映射，保持扫描顺序
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<Alias>,
    index: HashMap<String, usize>,
}

impl AliasTable {
    pub fn build<I>(files: I) -> Self
    where
        I: IntoIterator<Item = FileEntry>,
    {
        let mut table = Self::default();
        for (i, file) in files.into_iter().enumerate() {
            let key = alias_key(i + 1, file.extension());
            table.index.insert(key.clone(), table.entries.len());
            table.entries.push(Alias {
                key,
                relative: file.relative_path().to_string(),
            });
        }
        table
    }

    /// 按解码后的请求路径精确查找
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.index
            .get(path)
            .map(|&i| self.entries[i].relative.as_str())
    }

    /// 按扫描顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn alias_key(index: usize, extension: Option<&str>) -> String {
    let ext = match extension {
        Some(e) if !e.is_empty() => e.to_lowercase(),
        _ => FALLBACK_EXTENSION.to_string(),
    };
    format!("/{}.{}", index, ext)
}
