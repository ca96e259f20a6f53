// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{exception::Exception, param::*, util::expand_home};

/// 服务器运行参数。
///
/// 取值顺序：内置默认值 → TOML 配置文件 → 命令行参数。
/// `validate` 通过之后即视为不可变。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    host: String,
    port: u16,
    directory: String,
    #[serde(skip)]
    list_only: bool,
    /// 实际载入的配置文件，使用内置默认值时为空
    #[serde(skip)]
    source: Option<String>,
    extensions: Vec<String>,
    worker_threads: usize,
    cache_size: usize,
    streaming_threshold: u64,
    chunk_size: usize,
    enable_range_requests: bool,
}

fn default_streaming_threshold() -> u64 {
    10485760 // 10MB
}

fn default_chunk_size() -> usize {
    262144 // 256KB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            directory: DEFAULT_SAMPLE_DIR.to_string(),
            list_only: false,
            source: None,
            extensions: DEFAULT_MEDIA_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            worker_threads: 0,
            cache_size: 5,
            streaming_threshold: default_streaming_threshold(),
            chunk_size: default_chunk_size(),
            enable_range_requests: true,
        }
    }

    /// 载入配置。
    ///
    /// 显式指定的文件必须存在且能够解析；未指定时尝试默认位置，文件不存在则使用默认配置。
    pub fn load(explicit: Option<&str>) -> Result<Self, Exception> {
        match explicit {
            Some(filename) => Self::from_toml(filename),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_toml(DEFAULT_CONFIG_FILE),
            None => {
                info!("未找到默认配置文件{}，使用内置默认配置", DEFAULT_CONFIG_FILE);
                Ok(Self::new().normalized())
            }
        }
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let str_val = fs::read_to_string(filename)
            .map_err(|e| Exception::ConfigRead(filename.to_string(), e.to_string()))?;
        let mut config = Self::from_toml_str(&str_val, filename)?;
        config.source = Some(filename.to_string());
        info!("配置文件已载入: {}", filename);
        Ok(config)
    }

    pub fn from_toml_str(content: &str, filename: &str) -> Result<Self, Exception> {
        let raw_config: ServerConfig = toml::from_str(content)
            .map_err(|e| Exception::ConfigParse(filename.to_string(), e.to_string()))?;
        Ok(raw_config.normalized())
    }

    fn normalized(mut self) -> Self {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.cache_size == 0 {
            warn!("cache_size被设置为0，但目前尚不支持禁用缓存，因此该值将被改为5。");
            self.cache_size = 5;
        }
        if self.chunk_size == 0 {
            warn!("chunk_size不能为0，使用默认值{}", default_chunk_size());
            self.chunk_size = default_chunk_size();
        }
        self.extensions = self
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// 用命令行参数覆盖配置文件中的值。
    pub fn override_with(
        &mut self,
        host: Option<String>,
        port: Option<u16>,
        directory: Option<String>,
        list_only: bool,
    ) {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(directory) = directory {
            self.directory = directory;
        }
        self.list_only = self.list_only || list_only;
    }

    /// 校验服务目录，返回规范化后的绝对路径。
    ///
    /// 必须在扫描和绑定端口之前调用。
    pub fn validate(&self) -> Result<PathBuf, Exception> {
        let expanded = expand_home(&self.directory);
        match fs::canonicalize(&expanded) {
            Ok(root) if root.is_dir() => Ok(root),
            _ => Err(Exception::InvalidDirectory(expanded)),
        }
    }
}

impl ServerConfig {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn list_only(&self) -> bool {
        self.list_only
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    pub fn streaming_threshold(&self) -> u64 {
        self.streaming_threshold
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn enable_range_requests(&self) -> bool {
        self.enable_range_requests
    }
}
