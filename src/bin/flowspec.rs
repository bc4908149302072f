use clap::Parser;
use trafficgen_rs::flow::FlowOptions;

#[derive(Debug, Parser)]
#[command(
    name = "flowspec",
    about = "Build a UDP flow description for the packet sender"
)]
struct Args {
    /// <base_ip>,<number> for a range of src ip address
    #[arg(long, default_value = "1.1.1.1")]
    src_ip: String,

    /// <base_ip>,<number> for a range of dst ip address
    #[arg(long, default_value = "1.1.1.2")]
    dst_ip: String,

    /// <base_mac>,<number> for a range of src mac address
    #[arg(long, default_value = "c6:0f:aa:aa:00:00")]
    src_mac: String,

    /// <base_mac>,<number> for a range of dst mac address
    #[arg(long, default_value = "c6:0f:bb:bb:00:00")]
    dst_mac: String,

    /// <base_port>,<number> for a range of src port
    #[arg(long, default_value = "10000")]
    src_port: String,

    /// <base_port>,<number> for a range of dst port
    #[arg(long, default_value = "20000")]
    dst_port: String,

    /// <vlan_tag>,<prio> 802.1Q vlan tag and priority
    #[arg(long)]
    dot1q: Option<String>,

    /// <outer_tag>,<inner_tag>,<prio> for QinQ tags and priority
    #[arg(long)]
    qinq: Option<String>,

    /// Packet size
    #[arg(long, default_value_t = 64)]
    size: u32,

    /// Interface to send out the packets
    #[arg(long)]
    interface: String,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
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
    let opts = FlowOptions {
        src_ip: args.src_ip,
        dst_ip: args.dst_ip,
        src_mac: args.src_mac,
        dst_mac: args.dst_mac,
        src_port: args.src_port,
        dst_port: args.dst_port,
        dot1q: args.dot1q,
        qinq: args.qinq,
        size: args.size,
        interface: args.interface,
    };

    let spec = match opts.build() {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&spec)
    } else {
        serde_json::to_string(&spec)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
