use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ironwall_config::{ConfigError, IronwallConfig};
use ironwall_prevention::{Firewall, PacketDescriptor};
use ironwall_telemetry::MetricsRecorder;
use tracing::info;

use crate::replay::{load_traffic, TrafficReplay};

#[derive(Parser)]
#[command(name = "ironwall", version, about)]
pub struct Cli {
    /// Configuration file; defaults to config/ironwall.yaml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn load_config(&self) -> Result<IronwallConfig, ConfigError> {
        match &self.config {
            Some(path) => IronwallConfig::load_from_path(path),
            None => IronwallConfig::load(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a single packet against the configured rules
    Check(CheckArgs),
    /// Print the configured rules in evaluation order
    Rules,
    /// Replay a traffic file through the firewall and the security monitor
    Replay(ReplayArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long)]
    pub source_ip: Option<String>,
    #[arg(long)]
    pub dest_ip: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub protocol: Option<String>,
}

impl CheckArgs {
    fn to_packet(&self) -> PacketDescriptor {
        PacketDescriptor {
            source_ip: self.source_ip.clone(),
            dest_ip: self.dest_ip.clone(),
            port: self.port,
            protocol: self.protocol.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// YAML list of packets with optional source_ip, dest_ip, port and protocol
    #[arg(short, long)]
    pub traffic: PathBuf,
    /// Print Prometheus metrics after the summary
    #[arg(long)]
    pub metrics: bool,
}

pub async fn run_command(command: Commands, config: &IronwallConfig) -> anyhow::Result<()> {
    let firewall = config.firewall.build_firewall()?;
    info!(
        rules = firewall.len(),
        default_action = %firewall.default_action(),
        "firewall loaded"
    );

    match command {
        Commands::Check(args) => {
            let decision = firewall.check_packet(&args.to_packet());
            match decision.rule {
                Some(rule) => println!("{} (rule: {})", decision.action, rule),
                None => println!("{} (default policy)", decision.action),
            }
            Ok(())
        }
        Commands::Rules => {
            print_rules(&firewall);
            Ok(())
        }
        Commands::Replay(args) => run_replay(args, &firewall, config).await,
    }
}

fn print_rules(firewall: &Firewall) {
    for rule in firewall.list_rules() {
        println!("{rule}");
    }
    println!("default: {}", firewall.default_action());
}

async fn run_replay(
    args: ReplayArgs,
    firewall: &Firewall,
    config: &IronwallConfig,
) -> anyhow::Result<()> {
    let monitor = config.monitor.build_monitor();
    let metrics = if config.telemetry.metrics || args.metrics {
        Some(MetricsRecorder::new()?)
    } else {
        None
    };
    let packets = load_traffic(&args.traffic)?;

    let mut replay = TrafficReplay::new(firewall, &monitor);
    if let Some(metrics) = &metrics {
        replay = replay.with_metrics(metrics);
    }
    let report = replay.run(&packets).await;

    for (idx, outcome) in report.outcomes.iter().enumerate() {
        let source = outcome.packet.source_ip.as_deref().unwrap_or("-");
        let port = outcome
            .packet
            .port
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        println!("#{:<3} {:<16} port {:<5} {}", idx + 1, source, port, outcome.disposition);
        if outcome.newly_blocked {
            println!("     {} auto-blocked after reaching the threat threshold", source);
        }
    }

    println!();
    println!("Packets processed:  {}", report.outcomes.len());
    println!("Security events:    {}", report.statistics.total_events);
    println!("Unique sources:     {}", report.statistics.unique_sources);
    println!("Blocked sources:    {}", report.statistics.blocked_ips);
    println!("Firewall rules:     {}", firewall.len());
    for (addr, count) in &report.blocked {
        println!("  {addr} ({count} events)");
    }

    if args.metrics {
        if let Some(metrics) = &metrics {
            println!();
            print!("{}", metrics.gather_metrics()?);
        }
    }
    Ok(())
}
