//! HostProbe CLI - Thread Affinity and GPU Capability Probing
//!
//! Pins the main thread to CPU cores and reports Vulkan device capabilities.

use clap::Parser;
use hostprobe::config::{AffinityAction, CliArgs, Commands, LogFormat, ProbeConfig};
use hostprobe::error::Result;
use hostprobe::gpu::DeviceProber;
use hostprobe::system::{AffinityController, CoreTopology};
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    init_logging(&args);

    // Handle result
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &CliArgs) {
    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match args.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn run(args: &CliArgs) -> Result<()> {
    // Build configuration
    let config = ProbeConfig::from_cli(args)?;

    match &args.command {
        Commands::Affinity { action } => cmd_affinity(action, &config),
        Commands::Cores => cmd_cores(&config),
        Commands::Probe { pretty, summary } => cmd_probe(&config, *pretty, *summary),
    }
}

fn cmd_affinity(action: &AffinityAction, config: &ProbeConfig) -> Result<()> {
    let controller = AffinityController::current_thread();

    match action {
        AffinityAction::Get => {
            let mask = controller.try_get_affinity()?;
            println!(
                "Thread {} may run on {} of {} cores: {:?}",
                controller.resolve_tid(),
                mask.len(),
                controller.total_cores(),
                mask.to_vec()
            );
        }
        AffinityAction::Set { core } => {
            controller.try_set_affinity(*core)?;
            println!("Pinned thread {} to core {}", controller.resolve_tid(), core);
        }
        AffinityAction::Reset => {
            let total = controller.try_reset_affinity()?;
            println!("Thread {} may run on all {} cores", controller.resolve_tid(), total);
        }
        AffinityAction::Pin { cores } => {
            controller.try_pin_to_cores(cores)?;
            println!("Pinned thread {} to cores {:?}", controller.resolve_tid(), cores);
        }
        AffinityAction::Big => {
            let topology = CoreTopology::detect(config);
            let big = topology.big_cores();
            if big.is_empty() {
                controller.try_reset_affinity()?;
                println!("No big cores detected; thread may run on all cores");
            } else {
                controller.try_pin_to_cores(&big)?;
                println!("Pinned thread {} to big cores {:?}", controller.resolve_tid(), big);
            }
        }
    }

    // Show the resulting mask
    if !matches!(action, AffinityAction::Get) {
        if let Some(mask) = controller.get_affinity() {
            println!("Current affinity: {:?}", mask.to_vec());
        }
    }

    Ok(())
}

fn cmd_cores(config: &ProbeConfig) -> Result<()> {
    let topology = CoreTopology::detect(config);
    topology.print_summary();
    Ok(())
}

fn cmd_probe(config: &ProbeConfig, pretty: bool, summary: bool) -> Result<()> {
    let response = DeviceProber::new(config.clone()).probe();

    if summary {
        match (&response.report, &response.error) {
            (Some(report), _) => report.print_summary(),
            (None, Some(error)) => println!("Vulkan supported: {} ({})", response.supported, error),
            (None, None) => println!("Vulkan supported: {}", response.supported),
        }
    } else if pretty {
        println!("{}", response.to_json_pretty());
    } else {
        println!("{}", response.to_json());
    }

    Ok(())
}
