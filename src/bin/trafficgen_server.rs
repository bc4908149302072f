use clap::Parser;
use nix::sys::signal::{SigSet, Signal};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};
use trafficgen_rs::config::{MacSource, ServiceConfig, split_extra_opts};
use trafficgen_rs::rpc::RpcServer;
use trafficgen_rs::service::{ControlService, PortIntrospector, port_introspector};
use trafficgen_rs::supervisor::{ProcessHost, SystemHost};

#[derive(Debug, Parser)]
#[command(name = "trafficgen-server", about = "Trafficgen control server")]
struct Args {
    /// JSON config file; command line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// RPC listen address (without port)
    #[arg(long)]
    bind: Option<String>,

    /// RPC port
    #[arg(long)]
    port: Option<u16>,

    /// Extra options for binary search, e.g. "--max-retries=3 --one-shot=1"
    #[arg(long)]
    extra_opts: Option<String>,

    /// Directory containing binary-search.py; results are read from here too
    #[arg(long)]
    generator_dir: Option<PathBuf>,

    /// Where get-mac-list reads port addresses from
    #[arg(long, value_enum)]
    mac_source: Option<MacSource>,

    /// TRex JSON-RPC endpoint (host:port)
    #[arg(long)]
    trex_addr: Option<String>,

    /// Network interface of a generator port (repeat per port, in port order); used with --mac-source sysfs
    #[arg(long = "port-iface")]
    port_ifaces: Vec<String>,
}

/// 屏蔽 SIGINT/SIGTERM，之后创建的线程都继承该掩码，由专用线程同步等待
fn block_shutdown_signals() -> nix::Result<SigSet> {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTERM);
    set.thread_block()?;
    Ok(set)
}

/// 收到终止信号后先停掉生成器再退出
fn spawn_signal_watcher<H, P>(set: SigSet, service: Arc<ControlService<H, P>>)
where
    H: ProcessHost + 'static,
    P: PortIntrospector + 'static,
{
    thread::spawn(move || match set.wait() {
        Ok(signal) => {
            info!(?signal, "收到终止信号，停止生成器");
            if !service.stop() {
                warn!("退出前未能终止全部生成器进程");
            }
            std::process::exit(0);
        }
        Err(e) => error!(error = %e, "等待信号失败"),
    });
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let signals = match block_shutdown_signals() {
        Ok(set) => set,
        Err(e) => {
            eprintln!("failed to block shutdown signals: {e}");
            std::process::exit(1);
        }
    };

    let mut config = match &args.config {
        Some(path) => match ServiceConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(2);
            }
        },
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(raw) = args.extra_opts.as_deref() {
        config.extra_args = split_extra_opts(raw);
    }
    if let Some(dir) = args.generator_dir {
        config.generator_dir = dir;
    }
    if let Some(source) = args.mac_source {
        config.mac_source = source;
    }
    if let Some(addr) = args.trex_addr {
        config.trex_addr = addr;
    }
    if !args.port_ifaces.is_empty() {
        config.port_interfaces = args.port_ifaces;
    }

    info!(
        listen = %config.listen_addr(),
        generator_dir = %config.generator_dir.display(),
        process_name = %config.process_name,
        extra_args = ?config.extra_args,
        mac_source = ?config.mac_source,
        "配置已加载"
    );

    let host = SystemHost::with_work_dir(config.generator_dir.clone());
    let ports = port_introspector(&config);
    let service = Arc::new(ControlService::new(&config, host, ports));
    spawn_signal_watcher(signals, service.clone());

    let server = match RpcServer::bind(&config.listen_addr(), service.clone()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to listen on {}: {e}", config.listen_addr());
            std::process::exit(1);
        }
    };

    if let Err(e) = server.serve() {
        error!(error = %e, "RPC 服务异常退出");
    }
    // 退出前清理仍在运行的生成器
    service.stop();
    std::process::exit(1);
}
