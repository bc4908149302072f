use clap::{Parser, ValueEnum};
use std::time::Duration;
use trafficgen_rs::config::DEFAULT_RPC_PORT;
use trafficgen_rs::rpc::{RpcClient, RpcError};
use trafficgen_rs::service::{DestinationMode, StartParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    Start,
    Stop,
    Status,
    GetResult,
    GetMacList,
}

#[derive(Debug, Parser)]
#[command(name = "trafficgen-client", about = "Trafficgen client")]
struct Args {
    /// What the server should do
    #[arg(value_enum)]
    action: Action,

    /// L2 frame size in bytes
    #[arg(long, default_value_t = 64)]
    frame_size: u32,

    /// Number of unique network flows
    #[arg(long, default_value_t = 1)]
    num_flows: u32,

    /// Test duration in seconds for each search iteration
    #[arg(long, default_value_t = 10)]
    search_runtime: u32,

    /// Test duration in seconds during final validation
    #[arg(long, default_value_t = 30)]
    validation_runtime: u32,

    /// Test duration in seconds during sniff phase
    #[arg(long, default_value_t = 0)]
    sniff_runtime: u32,

    /// Maximum percentage of packet loss
    #[arg(long, default_value_t = 0.002)]
    max_loss_pct: f64,

    /// Search granularity in percent
    #[arg(long, default_value_t = 5.0)]
    search_granularity: f64,

    /// List of device pairs in the form A:B[,C:D][,E:F][,...]
    #[arg(long, default_value = "0:1")]
    device_pairs: String,

    /// Comma separated gateway MACs; switches the generator to explicit L2 destinations
    #[arg(long)]
    dst_macs: Option<String>,

    /// Trafficgen server address
    #[arg(long, default_value = "localhost")]
    server_addr: String,

    /// Trafficgen server port
    #[arg(long, default_value_t = DEFAULT_RPC_PORT)]
    server_port: u16,

    /// Socket timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Args {
    fn start_params(&self) -> StartParams {
        let destination = match &self.dst_macs {
            Some(list) => DestinationMode::Explicit {
                macs: list.split(',').map(|m| m.trim().to_string()).collect(),
            },
            None => DestinationMode::Ranged,
        };
        StartParams {
            device_pairs: self.device_pairs.clone(),
            search_runtime: self.search_runtime,
            validation_runtime: self.validation_runtime,
            num_flows: self.num_flows,
            frame_size: self.frame_size,
            max_loss_pct: self.max_loss_pct,
            sniff_runtime: self.sniff_runtime,
            search_granularity: self.search_granularity,
            destination,
        }
    }
}

fn run(args: &Args, client: &RpcClient) -> Result<(), RpcError> {
    match args.action {
        Action::Start => {
            let ok = client.start(args.start_params())?;
            println!("start trafficgen: {}", if ok { "success" } else { "fail" });
        }
        Action::Stop => {
            let ok = client.stop()?;
            println!("stop trafficgen: {}", if ok { "success" } else { "fail" });
        }
        Action::Status => {
            let status = client.status()?;
            println!(
                "trafficgen is currently {}running",
                if status.running { "" } else { "not " }
            );
            println!(
                "test result is available: {}",
                if status.result_available { "yes" } else { "no" }
            );
        }
        Action::GetResult => match client.get_result()? {
            None => println!("test result not available."),
            Some(result) => {
                for port in &result.stats {
                    println!("port {} rx_pps: {:.2}", port.port_id, port.rx_pps);
                }
            }
        },
        Action::GetMacList => {
            let macs = client.get_mac_list()?;
            println!("mac list: {}", macs.join(","));
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let args = Args::parse();
    let client = RpcClient::new(format!("{}:{}", args.server_addr, args.server_port))
        .with_timeout(Duration::from_secs(args.timeout_secs));

    if let Err(e) = run(&args, &client) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
