// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use clap::Parser;

use crate::param::DEFAULT_LOG_CONFIG_FILE;

/// 为设备媒体测试提供带短别名的静态文件服务
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "dev-fileserver", version, about)]
pub struct Cli {
    /// 监听地址，默认 0.0.0.0
    #[arg(long)]
    pub host: Option<String>,

    /// 监听端口，默认 8788
    #[arg(long)]
    pub port: Option<u16>,

    /// 服务目录，默认为仓库内的 sample_files
    #[arg(long)]
    pub directory: Option<String>,

    /// 只打印 URL 列表，不启动服务器
    #[arg(long)]
    pub list_only: bool,

    /// TOML 配置文件路径
    #[arg(long)]
    pub config: Option<String>,

    /// log4rs YAML 配置文件路径
    #[arg(long, default_value = DEFAULT_LOG_CONFIG_FILE)]
    pub log_config: String,
}
