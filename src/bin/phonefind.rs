/**
 * Phone Finder Binary
 *
 * Walks the crawler toward a paired phone:
 * 1. Scans for the phone over Bluetooth
 * 2. Steers by RSSI, dodging obstacles seen by the sonar
 * 3. Shows a compass needle on the OLED and speaks each decision
 *
 * Usage: phonefind [--config FILE] [--phone MAC] [--port DEV] [--simulate]
 */

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use phonefind::bluetooth::BtmgmtInquiry;
use phonefind::display::Ssd1306;
use phonefind::sim::{SimCrawler, SimDisplay, SimInquiry, SimSonar};
use phonefind::speech::{Espeak, SilentSpeaker};
use phonefind::uart::SharedBridge;
use phonefind::{Config, CrawlerBridge, Display, Hardware, MacAddress, PhoneFinder, SearchPlanner, Speaker};

/// Find a paired phone by Bluetooth signal strength
#[derive(Parser, Debug)]
#[command(name = "phonefind")]
#[command(about = "Steer the crawler toward a paired phone by Bluetooth RSSI", long_about = None)]
#[command(version)]
struct Args{
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bluetooth address of the phone (overrides the config file)
    #[arg(long, value_name = "MAC")]
    phone: Option<String>,

    /// Serial device of the motion co-processor
    #[arg(long, value_name = "DEV")]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, value_name = "BAUD")]
    baud: Option<u32>,

    /// Run against simulated hardware
    #[arg(long)]
    simulate: bool,

    /// Stop after this many iterations
    #[arg(long, value_name = "COUNT")]
    iterations: Option<u64>,

    /// Do not speak, only log
    #[arg(long)]
    mute: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()>{
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let mut config = match &args.config{
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args);
    config.validate().context("invalid configuration")?;

    let phone = config.phone_address()?;

    log::info!("phonefind v{}", env!("CARGO_PKG_VERSION"));
    log::info!("  Phone: {}", phone);
    log::info!("  Mode:  {}", if args.simulate{ "simulated" }else{ "hardware" });
    if !args.simulate{
        log::info!("  Port:  {} @ {}", config.crawler.port, config.crawler.baud);
    }

    let hw = if args.simulate{
        simulated_hardware(&config, phone)
    }else{
        robot_hardware(&config)?
    };

    let planner = SearchPlanner::new(config.signal.window, config.signal.range());
    let mut finder = PhoneFinder::new(hw, config.phone.scan_passes, phone, planner, config.search.clone());
    if let Some(limit) = args.iterations{
        finder = finder.with_max_iterations(limit);
    }

    let summary = finder.run();
    log::info!(
        "done: {} iteration(s), {} error(s), heading {} deg",
        summary.iterations, summary.errors, summary.final_heading
    );
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool){
    use env_logger::{Builder, Env};
    use log::LevelFilter;

    let level = if quiet{
        LevelFilter::Error
    }else{
        match verbose{
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    //RUST_LOG wins over the flags when set
    Builder::from_env(Env::default().default_filter_or(level.as_str()))
        .format_timestamp_millis()
        .init();
}

fn apply_overrides(config: &mut Config, args: &Args){
    if let Some(phone) = &args.phone{
        config.phone.address = phone.clone();
    }
    if let Some(port) = &args.port{
        config.crawler.port = port.clone();
    }
    if let Some(baud) = args.baud{
        config.crawler.baud = baud;
    }
    if args.mute{
        config.speech.enabled = false;
    }
}

fn speaker(config: &Config) -> Box<dyn Speaker>{
    if !config.speech.enabled{
        return Box::new(SilentSpeaker);
    }
    Box::new(Espeak::new(&config.speech.command).with_args(&config.speech.args))
}

fn robot_hardware(config: &Config) -> Result<Hardware>{
    let inquiry = BtmgmtInquiry::new()
        .with_index(config.phone.hci_index)
        .with_timeout(Duration::from_millis(config.phone.scan_timeout_ms));

    let bridge = CrawlerBridge::open(&config.crawler.port, config.crawler.baud)
        .with_context(|| format!("failed to open {}", config.crawler.port))?
        .with_timeouts(
            Duration::from_millis(config.crawler.step_timeout_ms),
            Duration::from_millis(config.crawler.range_timeout_ms),
        );

    //the crawler and the sonar share the one serial link
    let crawler = SharedBridge::new(bridge);
    let sonar = crawler.clone();

    let display: Box<dyn Display> = if config.display.enabled{
        Box::new(Ssd1306::open(config.display.i2c_bus, config.display.address)
            .context("failed to open OLED")?)
    }else{
        Box::new(SimDisplay::new())
    };

    Ok(Hardware{
        inquiry: Box::new(inquiry),
        crawler: Box::new(crawler),
        sonar: Box::new(sonar),
        speaker: speaker(config),
        display,
    })
}

fn simulated_hardware(config: &Config, phone: MacAddress) -> Hardware{
    //phone drifting in and out of range while the robot closes in
    let script = [
        None, Some(-84.0), Some(-80.0), Some(-80.0), Some(-76.0), None,
        Some(-79.0), Some(-70.0), Some(-66.0), Some(-61.0), Some(-58.0), Some(-52.0),
    ];

    Hardware{
        inquiry: Box::new(SimInquiry::scripted(phone, &script)),
        crawler: Box::new(SimCrawler::new()),
        sonar: Box::new(SimSonar::new(&[60.0, 45.0, 30.0, 12.0, 80.0, 70.0, 9.0])),
        speaker: speaker(config),
        display: Box::new(SimDisplay::new()),
    }
}
