// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 访问地址解析
//!
//! 根据监听地址生成打印给操作者的基础 URL。
//!
//! - 监听通配地址时，总是包含回环地址；另外尝试探测本机的局域网地址。
//!   探测顺序：UDP 路由探测 → 主机名解析（系统调用，不依赖外部命令）→ 放弃。
//! - 监听具体地址时，原样使用该地址，不做任何探测。
//!
//! 探测失败从不终止启动，只是少打印一个 URL。

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs, UdpSocket};

use log::debug;

use crate::param::ROUTE_PROBE_TARGET;

/// 本机地址探测能力
#[cfg_attr(test, mockall::automock)]
pub trait LocalAddrProbe {
    /// 通过无连接 UDP 套接字"连接"外部地址，读取系统为该路由选择的本地地址。不发送数据
    fn route_addr(&self) -> io::Result<IpAddr>;
    /// 解析本机主机名得到的地址
    fn hostname_addrs(&self) -> io::Result<Vec<IpAddr>>;
}

/// 基于操作系统套接字接口的实现
pub struct SystemProbe;

impl LocalAddrProbe for SystemProbe {
    fn route_addr(&self) -> io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(ROUTE_PROBE_TARGET)?;
        Ok(socket.local_addr()?.ip())
    }

    fn hostname_addrs(&self) -> io::Result<Vec<IpAddr>> {
        let name = gethostname::gethostname();
        let name = name
            .to_str()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "hostname is empty or not UTF-8"))?;
        Ok((name, 0).to_socket_addrs()?.map(|a| a.ip()).collect())
    }
}

fn usable_v4(ip: IpAddr) -> Option<Ipv4Addr> {
    match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
        _ => None,
    }
}

/// 最合适的本机非回环 IPv4 地址
pub fn best_lan_address(probe: &dyn LocalAddrProbe) -> Option<Ipv4Addr> {
    match probe.route_addr() {
        Ok(ip) => {
            if let Some(v4) = usable_v4(ip) {
                return Some(v4);
            }
            debug!("路由探测只得到{}，尝试主机名解析", ip);
        }
        Err(e) => debug!("路由探测失败: {}，尝试主机名解析", e),
    }

    match probe.hostname_addrs() {
        Ok(addrs) => addrs.into_iter().find_map(usable_v4),
        Err(e) => {
            debug!("主机名解析失败: {}", e);
            None
        }
    }
}

/// 基础 URL 列表（不带结尾斜杠）
pub fn base_urls(host: &str, port: u16, probe: &dyn LocalAddrProbe) -> Vec<String> {
    let loopback = match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Ok(IpAddr::V6(ip)) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        _ => return vec![format!("http://{}:{}", host, port)],
    };

    let mut urls = vec![format_url(loopback, port)];
    if let Some(lan) = best_lan_address(probe) {
        urls.push(format_url(IpAddr::V4(lan), port));
    }
    urls
}

fn format_url(ip: IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(v4) => format!("http://{}:{}", v4, port),
        IpAddr::V6(v6) => format!("http://[{}]:{}", v6, port),
    }
}
