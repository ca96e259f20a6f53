// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 调试文件服务器
//!
//! 启动流程：
//! - 初始化日志，载入配置并用命令行参数覆盖
//! - 校验服务目录，扫描媒体文件并建立别名表
//! - 打印访问 URL 清单；仅列表模式到此结束
//! - 绑定端口，启动管理控制台与主事件循环，直到 Ctrl+C 或 `stop`

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{info, LevelFilter};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use tokio::{io::BufReader, runtime::Builder, sync::Notify};

use dev_fileserver::{
    address::{base_urls, SystemProbe},
    alias::AliasTable,
    cli::Cli,
    config::ServerConfig,
    exception::Exception,
    report::{render_urls, RUNNING_NOTICE, SHUTDOWN_NOTICE},
    scanner::FileScanner,
    server::{self, ServerContext},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// 日志配置文件不存在时退回到输出到 stderr 的控制台日志，stdout 只留给 URL 清单
fn init_logger(log_config: &str) -> Result<(), Exception> {
    if Path::new(log_config).is_file() {
        return log4rs::init_file(log_config, Default::default())
            .map_err(|e| Exception::LoggerInit(e.to_string()));
    }

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {m}{n}",
        )))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Info))
        .map_err(|e| Exception::LoggerInit(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| Exception::LoggerInit(e.to_string()))?;
    info!("未找到日志配置文件{}，日志输出到标准错误", log_config);
    Ok(())
}

fn run(cli: Cli) -> Result<(), Exception> {
    init_logger(&cli.log_config)?;

    let mut config = ServerConfig::load(cli.config.as_deref())?;
    config.override_with(cli.host, cli.port, cli.directory, cli.list_only);

    // 目录不合法时在打开任何套接字之前退出
    let root = config.validate()?;
    info!("服务目录: {}", root.display());

    let scanner = FileScanner::new(&root, config.extensions());
    let table = Arc::new(AliasTable::build(scanner.scan()));
    info!("共建立{}个别名", table.len());

    let urls = base_urls(config.host(), config.port(), &SystemProbe);
    let report = render_urls(&root, &urls, &table);
    print!("{}", report);

    if config.list_only() {
        return Ok(());
    }

    let runtime = Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()?;

    let result = runtime.block_on(async move {
        let listener = server::bind(config.host(), config.port()).await?;
        println!("\n{}", RUNNING_NOTICE);

        let stop = Arc::new(Notify::new());
        let ctx = Arc::new(ServerContext::new(root, config, table));
        tokio::spawn(server::run_console(
            BufReader::new(tokio::io::stdin()),
            Arc::clone(&ctx),
            Arc::clone(&stop),
            report,
        ));

        server::serve(listener, ctx, server::shutdown_signal(stop)).await;
        println!("\n{}", SHUTDOWN_NOTICE);
        Ok::<(), Exception>(())
    });

    // 标准输入的读取占用阻塞线程，不等待它结束
    runtime.shutdown_background();
    result
}
