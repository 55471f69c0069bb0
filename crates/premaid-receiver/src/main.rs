//! PreMaid AI servo angle receiver CLI.
//!
//! Spawns the serial bridge, opens the robot's port and logs joint angles as
//! telemetry pages arrive, until Ctrl-C.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use crossbeam_channel::Receiver;
use premaid_protocol::Page;
use premaid_receiver::{
    describe_metrics, BridgeLink, PollLoop, ReceiverConfig, ReceiverError, ReceiverEvent,
    ReceiverResult, ServoAngleReceiver, ServoStore,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "premaid-receiver")]
#[command(about = "Read servo angles from a PreMaid AI over its serial bridge")]
#[command(version)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial bridge executable (overrides config)
    #[arg(short, long)]
    bridge: Option<PathBuf>,

    /// Serial port name (overrides config)
    #[arg(short, long)]
    port: Option<String>,

    /// Poll continuously instead of reading once
    #[arg(long)]
    continuous: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> ReceiverResult<ReceiverConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            ReceiverConfig::load(path)?
        }
        None => ReceiverConfig::default(),
    };

    if let Some(bridge) = &args.bridge {
        config = config.with_bridge_path(bridge);
    }
    if let Some(port) = &args.port {
        config = config.with_port(port);
    }
    if args.continuous {
        config = config.with_continuous(true);
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> ReceiverResult<()> {
    let config = load_config(&args)?;
    let bridge_path = config
        .bridge_path
        .clone()
        .ok_or_else(|| ReceiverError::InvalidConfig("no bridge executable configured".into()))?;
    let port = config
        .port
        .clone()
        .ok_or_else(|| ReceiverError::InvalidConfig("no serial port configured".into()))?;

    describe_metrics();

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::Relaxed);
    })?;

    let mut bridge = BridgeLink::spawn(&bridge_path)?;
    bridge.open_port(&port)?;
    let lines = bridge.lines();

    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    let receiver = ServoAngleReceiver::new(&config, bridge, events_tx);
    let mut poll = PollLoop::new(receiver, lines, config.tick_interval());

    if !config.continuous {
        poll.receiver_mut().request_single_read()?;
    }

    let result = poll.run_until(&stop, |receiver| {
        drain_events(&events_rx, receiver.store());
    });
    if let Err(e) = &result {
        warn!(error = %e, "poll loop failed");
    }

    let mut receiver = poll.into_receiver();
    let stats = receiver.stats();
    info!(
        lines = stats.lines_received,
        accepted = stats.frames_accepted,
        rejected = stats.frames_rejected,
        desyncs = stats.desyncs,
        requests = stats.requests_sent,
        "receiver stopped"
    );

    let bridge = receiver.sink_mut();
    if config.stop_servos_on_exit {
        if let Err(e) = bridge.force_all_servo_stop(true) {
            warn!(error = %e, "could not release servos");
        }
    } else {
        bridge.shutdown();
    }
    result
}

fn drain_events(events: &Receiver<ReceiverEvent>, store: &ServoStore) {
    for event in events.try_iter() {
        match event {
            ReceiverEvent::PageUpdated(page) => log_page(page, store),
            ReceiverEvent::ContinuousModeChanged(enabled) => {
                info!(enabled, "continuous polling changed");
            }
        }
    }
}

fn log_page(page: Page, store: &ServoStore) {
    for record in store.page(page) {
        if let (Some(joint), Some(angle)) = (record.joint(), record.angle_degrees()) {
            info!(
                %page,
                joint = %joint,
                id = %record.id(),
                angle,
                commanded = record.commanded(),
                "servo"
            );
        }
    }
}
