// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::param::STATUS_CODES;

/// URL 路径中保持原样的字符：字母数字以及 `-_.~/`
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// 对路径做百分号编码，`/` 保持不变
pub fn quote_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_SAFE).to_string()
}

/// 百分号解码。非法的 UTF-8 序列替换为 U+FFFD
pub fn unquote_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// 展开路径开头的 `~`
pub fn expand_home(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME");
    match (path, home) {
        ("~", Some(home)) => PathBuf::from(home),
        (p, Some(home)) if p.starts_with("~/") => PathBuf::from(home).join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub struct HtmlBuilder {
    title: String,
    css: String,
    body: String,
}

impl HtmlBuilder {
    /// 状态码页面。`note` 为空时使用标准原因短语，未知状态码使用 "Unknown"
    pub fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let title = format!("{}", code);
        let css = r"
            body {
                width: 35em;
                margin: 0 auto;
                font-family: Tahoma, Verdana, Arial, sans-serif;
            }
            "
        .to_string();
        let description = match note {
            Some(n) => n,
            None => STATUS_CODES.get(&code).copied().unwrap_or("Unknown"),
        };
        let body = format!(
            r"
            <h1>{}</h1>
            <p>{}</p>
            ",
            code, description
        );
        Self { title, css, body }
    }

    /// 目录列表页面。`display_path` 是解码后的请求路径，仅用于展示
    pub fn from_dir(display_path: &str, dir_vec: &mut Vec<PathBuf>) -> Self {
        let mut body = String::new();
        sort_dir_entries(dir_vec);

        let shown = escape_html(display_path.trim_end_matches('/'));
        body.push_str(&format!("<h1>{}/的文件列表</h1><hr>", shown));
        body.push_str("<table>");
        body.push_str(
            r#"
            <tr>
                <td>文件名</td>
                <td>大小</td>
                <td>修改时间</td>
            </tr>
            <tr>
                <td><a href="../">..</a></td>
                <td></td>
                <td></td>
            </tr>
            "#,
        );
        for entry in dir_vec.iter() {
            let Some(filename) = entry.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            // 元数据读取失败（例如悬空的符号链接）时只展示名称
            let metadata = entry.metadata().ok();
            let formatted_time = metadata
                .as_ref()
                .and_then(|m| m.modified().ok())
                .map(|t| {
                    let local_time: DateTime<Local> = t.into();
                    local_time.format("%Y-%m-%d %H:%M:%S %Z").to_string()
                })
                .unwrap_or_default();

            let is_dir = metadata.as_ref().map_or(false, |m| m.is_dir());
            let (href, label, size) = if is_dir {
                (
                    format!("{}/", quote_path(&filename)),
                    format!("{}/", escape_html(&filename)),
                    "文件夹".to_string(),
                )
            } else {
                (
                    quote_path(&filename),
                    escape_html(&filename),
                    metadata
                        .as_ref()
                        .map(|m| format_file_size(m.len()))
                        .unwrap_or_default(),
                )
            };
            body.push_str(&format!(
                r#"
                <tr>
                    <td><a href="{}">{}</a></td>
                    <td>{}</td>
                    <td>{}</td>
                </tr>
                "#,
                href, label, size, formatted_time
            ));
        }
        body.push_str("</table>");
        let title = format!("{}/的文件列表", shown);
        let css = r"
            table {
                border-collapse: collapse;
                width: 100%;
            }

            td {
                padding: 8px;
                white-space: pre-wrap;
                border: none;
            }"
        .to_string();
        HtmlBuilder { title, css, body }
    }

    pub fn build(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
            <!-- 本文件由shaneyale的调试文件服务器自动生成 -->
            <html>
                <head>
                    <meta charset="utf-8">
                    <title>{}</title>
                    <style>{}</style>
                </head>
                <body>
                {}
                </body>
            </html>"##,
            self.title, self.css, self.body
        )
    }
}

pub fn format_file_size(size: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < units.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.1} {}", size, units[unit_index])
}

/// 目录在前，其余按名称排序
fn sort_dir_entries(vec: &mut Vec<PathBuf>) {
    vec.sort_by(|a, b| {
        let a_is_dir = a.is_dir();
        let b_is_dir = b.is_dir();

        if a_is_dir && !b_is_dir {
            std::cmp::Ordering::Less
        } else if !a_is_dir && b_is_dir {
            std::cmp::Ordering::Greater
        } else {
            a.cmp(b)
        }
    });
}
