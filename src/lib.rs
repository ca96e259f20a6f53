// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

pub mod address;    // 局域网地址探测与基础 URL
pub mod alias;      // 短别名表
pub mod cache;      // 小文件缓存
pub mod cli;        // 命令行参数
pub mod config;     // 配置解析与管理
pub mod exception;  // 自定义异常与错误处理
pub mod param;      // 全局常量与静态参数
pub mod report;     // 控制台 URL 清单
pub mod request;    // HTTP 请求报文解析器
pub mod response;   // HTTP 响应报文构建器
pub mod rewrite;    // 别名改写
pub mod route;      // 请求路径到服务目录的映射
pub mod scanner;    // 媒体文件扫描
pub mod server;     // 主事件循环与连接处理
pub mod util;       // 通用工具函数

pub use alias::AliasTable;
pub use cache::FileCache;
pub use config::ServerConfig;
pub use exception::Exception;
pub use param::{HttpEncoding, HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use response::Response;
pub use rewrite::AliasRewriter;
pub use scanner::{FileEntry, FileScanner};
pub use server::ServerContext;
pub use util::HtmlBuilder;
