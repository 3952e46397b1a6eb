//! eiscp CLI
//!
//! Command-line interface for finding and controlling receivers.
//!
//! Without `--host`, commands go to every receiver found by discovery.

use std::time::Duration;

use clap::{Parser, Subcommand};
use eiscp::{discover, AsyncClient, Client, ClientConfig, CommandTranslator, DiscoveryConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// eiscp CLI
#[derive(Parser, Debug)]
#[command(name = "eiscp-cli")]
#[command(about = "Discover and control eISCP AV receivers")]
#[command(version)]
struct Args {
    /// Receiver address; discover receivers when omitted
    #[arg(long, global = true)]
    host: Option<String>,

    /// Receiver port
    #[arg(short, long, global = true, default_value = "60128")]
    port: u16,

    /// Request and discovery timeout in seconds
    #[arg(short, long, global = true, default_value = "5")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List receivers on the local networks
    Discover {
        /// Print JSON instead of one line per receiver
        #[arg(long)]
        json: bool,
    },

    /// Send a raw message (e.g. PWRQSTN) and print the reply
    Raw {
        /// Message body
        message: String,
    },

    /// Send a pretty command (e.g. `volume 42`, `zone2.power=on`)
    Command {
        /// Command words
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Print messages as the receiver sends them
    Monitor {
        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Print the receiver's capability document as JSON
    Info,

    /// Print the multiroom group this receiver belongs to
    Groups,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,eiscp=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!("eiscp CLI v{}", eiscp::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> eiscp::Result<()> {
    let timeout = Duration::from_secs(args.timeout);
    let config = ClientConfig::builder()
        .port(args.port)
        .request_timeout(timeout)
        .build();
    let discovery_config = DiscoveryConfig::builder()
        .port(args.port)
        .timeout(timeout)
        .build();

    if let Commands::Discover { json } = args.command {
        let devices = discover(&discovery_config)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&devices)?);
        } else {
            for device in &devices {
                println!(
                    "{} {}:{} {}",
                    device.model_name(),
                    device.host,
                    device.port,
                    device.identifier()
                );
            }
        }
        return Ok(());
    }

    let clients: Vec<Client> = match &args.host {
        Some(host) => vec![Client::new(host.clone(), config.clone())],
        None => discover(&discovery_config)?
            .into_iter()
            .map(|device| device.into_client(config.clone()))
            .collect(),
    };

    if clients.is_empty() {
        tracing::warn!("No receivers found");
        return Ok(());
    }

    for mut client in clients {
        let label = format!("{}:{}", client.host(), client.port());
        match &args.command {
            Commands::Discover { .. } => {}
            Commands::Raw { message } => {
                let reply = client.request(message)?;
                println!("{}: {}", label, reply);
            }
            Commands::Command { words } => {
                let reply = client.command(&words.join(" "))?;
                println!("{}: {}.{} = {}", label, reply.zone, reply.command, reply.value);
            }
            Commands::Monitor { duration } => {
                monitor(client, *duration)?;
            }
            Commands::Info => {
                let capabilities = client.capabilities()?;
                println!("{}", serde_json::to_string_pretty(capabilities)?);
            }
            Commands::Groups => {
                let members = client.grouped_with(timeout)?;
                println!("{}", serde_json::to_string_pretty(&members)?);
            }
        }
    }

    Ok(())
}

fn monitor(client: Client, duration: Option<u64>) -> eiscp::Result<()> {
    let translator = CommandTranslator::default();
    let label = format!("{}:{}", client.host(), client.port());
    let mut receiver = AsyncClient::start(client)?;

    receiver.set_message_handler(move |message| match translator.from_protocol(message) {
        Ok(t) => println!("{}: {} ({}.{} = {})", label, message, t.zone, t.command, t.value),
        Err(_) => println!("{}: {}", label, message),
    });

    match duration {
        Some(secs) => std::thread::sleep(Duration::from_secs(secs)),
        None => loop {
            std::thread::park();
        },
    }

    receiver.close();
    Ok(())
}
