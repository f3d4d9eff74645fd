use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::process;
use std::sync::Arc;

use pscan::{
    config::ScanConfig,
    output::{OutputFormat, Reporter},
    run_scan, ScanError, TargetResolver, TcpConnectProbe,
};

fn build_cli() -> Command {
    Command::new("pscan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Concurrent TCP connect port scanner with banner grabbing")
        .arg(
            Arg::new("host")
                .value_name("HOST")
                .help("Destination host (hostname or IPv4 address)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("ports")
                .short('p')
                .long("port")
                .visible_alias("ports")
                .value_name("PORT")
                .help("Destination port(s): one or more ports, or a single range like 1-1024")
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("concurrency")
                .short('c')
                .long("concurrency")
                .value_name("N")
                .help("Number of concurrent workers [default: 100]")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Connection and banner read timeout in seconds [default: 2.0]")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Load settings from a TOML file instead of ~/.pscan.toml"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Write a single JSON report when the scan completes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count),
        )
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Merge the config file with command-line overrides
fn load_config(matches: &ArgMatches) -> anyhow::Result<ScanConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ScanConfig::from_toml_file(path)
            .with_context(|| format!("loading config file {}", path))?,
        None => ScanConfig::load_default_config(),
    };

    if let Some(&concurrency) = matches.get_one::<usize>("concurrency") {
        config = config.with_concurrency(concurrency);
    }

    if let Some(&seconds) = matches.get_one::<f64>("timeout") {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ScanError::ConfigError(format!("Invalid timeout: {}", seconds)).into());
        }
        config = config.with_timeout((seconds * 1000.0).round().max(1.0) as u64);
    }

    if matches.get_flag("json") {
        config = config.with_output_format(OutputFormat::Json);
    }

    if matches.get_flag("no-color") {
        config = config.with_color(false);
    }

    config.validate()?;
    Ok(config)
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    let config = load_config(&matches)?;

    let host = matches
        .get_one::<String>("host")
        .context("missing host argument")?;
    let port_tokens: Vec<String> = matches
        .get_many::<String>("ports")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let resolver = TargetResolver::default();
    let probe = Arc::new(TcpConnectProbe::from_config(&config));
    let reporter = Reporter::stdout(config.output_format, config.color);

    let summary = run_scan(&config, host, &port_tokens, &resolver, probe, reporter).await?;
    log::info!("Scan of {} finished: {}", host, summary);

    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    if let Err(e) = run(matches).await {
        let code = e
            .downcast_ref::<ScanError>()
            .map(ScanError::exit_code)
            .unwrap_or(1);
        eprintln!("[!] {:#}", e);
        process::exit(code);
    }
}
