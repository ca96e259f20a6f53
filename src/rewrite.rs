// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求改写
//!
//! 位于文件传输层之前：请求路径（百分号解码之后）命中别名时，把请求目标替换成
//! 真实相对路径的编码形式，并原样接回查询串和片段。未命中时请求保持不变。
//!
//! 改写只作用于当前请求，别名表始终只读。

use std::sync::Arc;

use crate::{
    alias::AliasTable,
    util::{quote_path, unquote_path},
};

/// 请求目标的三个组成部分，均为原始（未解码）文本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> RequestTarget<'a> {
    /// 先切分片段，再切分查询串
    pub fn split(target: &'a str) -> Self {
        let (rest, fragment) = match target.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (target, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        Self {
            path,
            query,
            fragment,
        }
    }

    /// 解码后的路径
    pub fn decoded_path(&self) -> String {
        unquote_path(self.path)
    }
}

#[derive(Debug, Clone)]
pub struct AliasRewriter {
    table: Arc<AliasTable>,
}

impl AliasRewriter {
    pub fn new(table: Arc<AliasTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    /// 命中别名时返回改写后的请求目标，否则返回 `None`
    pub fn rewrite(&self, target: &str) -> Option<String> {
        let parts = RequestTarget::split(target);
        let relative = self.table.resolve(&parts.decoded_path())?;

        let mut mapped = format!("/{}", quote_path(relative));
        if let Some(query) = parts.query.filter(|q| !q.is_empty()) {
            mapped.push('?');
            mapped.push_str(query);
        }
        if let Some(fragment) = parts.fragment.filter(|f| !f.is_empty()) {
            mapped.push('#');
            mapped.push_str(fragment);
        }
        Some(mapped)
    }
}
