use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use torchkit::{
    init_logging, list_ports, validate_script, AppEvent, Config, Console, EventBus,
    EventCategory, EventFilter, InterpreterState, LinkParams, MockActuator, ScriptEvent,
    SerialLink,
};

const USAGE: &str = "usage: torchkit <script> [--config <file>] [--port <name>] [--baud <rate>]\n       torchkit --list-ports";

#[derive(Debug, Default)]
struct Args {
    script: Option<PathBuf>,
    config: Option<PathBuf>,
    port: Option<String>,
    baud: Option<u32>,
    list_ports: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context(USAGE)?.into()),
            "--port" => args.port = Some(iter.next().context(USAGE)?),
            "--baud" => {
                let baud = iter.next().context(USAGE)?;
                args.baud = Some(baud.parse().with_context(|| format!("Invalid baud rate '{}'", baud))?);
            }
            "--list-ports" => args.list_ports = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("Unknown option {}\n{}", other, USAGE),
            _ if args.script.is_none() => args.script = Some(arg.into()),
            _ => bail!("Unexpected argument {}\n{}", arg, USAGE),
        }
    }
    Ok(args)
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = parse_args()?;

    if args.list_ports {
        for port in list_ports()? {
            println!("{}\t{}", port.port_name, port.description);
        }
        return Ok(());
    }

    let script_path = args.script.context(USAGE)?;
    let script = std::fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read {}", script_path.display()))?;

    let diagnostics = validate_script(&script);
    if !diagnostics.is_empty() {
        for diagnostic in &diagnostics {
            tracing::error!("{}", diagnostic);
        }
        bail!("{} malformed line(s) in {}", diagnostics.len(), script_path.display());
    }

    let config_path = match args.config {
        Some(path) => path,
        None => torchkit::default_config_path()?,
    };
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(port) = args.port {
        config.connection.port = Some(port);
        config.connection.mock = false;
    }
    if let Some(baud) = args.baud {
        config.connection.baud_rate = baud;
    }

    let events = Arc::new(EventBus::new());
    events.subscribe(
        EventFilter::Categories(vec![EventCategory::Script]),
        |event| {
            if let AppEvent::Script(ScriptEvent::CommandStarted { .. }) = &event {
                tracing::info!("{}", event.description());
            }
        },
    );

    let mut link = match (&config.connection.port, config.connection.mock) {
        (Some(port), false) => {
            let params = LinkParams::new(port.clone())
                .with_baud_rate(config.connection.baud_rate)
                .with_timeout(Duration::from_millis(config.connection.timeout_ms));
            Some(SerialLink::open(&params, Arc::clone(&events))?)
        }
        _ => None,
    };
    let actuator: Box<dyn torchkit::Actuator> = match &link {
        Some(link) => Box::new(link.actuator()),
        None => Box::new(MockActuator::with_events(Arc::clone(&events))),
    };

    let mut console = Console::new(&config, actuator, Arc::clone(&events));
    let commands = console.run_script(&script)?;
    tracing::info!("Running {} ({} commands)", script_path.display(), commands);

    let dt = config.script.tick_period();
    while console.interpreter().state() == InterpreterState::Running {
        console.tick(dt);
        if let Some(link) = &link {
            for report in link.poll_reports() {
                console.handle_report(report);
            }
            // real hardware moves in real time
            std::thread::sleep(Duration::from_secs_f64(dt));
        }
    }

    if let Some(link) = link.as_mut() {
        link.close();
    }

    if let Some(failure) = console.interpreter().failure() {
        bail!("Script failed: {}", failure);
    }

    let position = console.controller().work_position();
    tracing::info!(
        "Finished in {:.2}s at ({:.1}, {:.1})",
        console.elapsed(),
        position.x,
        position.y
    );
    Ok(())
}
