//! Console server example
//!
//! Connects to a device console exposed as a raw TCP port (the usual
//! terminal-server setup), walks it to a privilege level and runs a command
//! there.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example console_server -- --host ts1 --port 7001 \
//!     --platform arista_eos --secret enable-secret --level configuration \
//!     --command "show running-config section hostname"
//! ```

use std::env;
use std::time::Duration;

use privsh::platform::PlatformRegistry;
use privsh::{Driver, DriverBuilder, StreamTransport};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let registry = PlatformRegistry::with_builtins()?;
    let platforms: Vec<_> = registry.names().collect();
    println!("Known platforms: {platforms:?}");

    println!("Connecting to {}:{}...", args.host, args.port);
    let stream = TcpStream::connect((args.host.as_str(), args.port)).await?;

    let mut builder = DriverBuilder::new()
        .platform(&args.platform)
        .timeout(Duration::from_secs(args.timeout));
    if let Some(secret) = &args.secret {
        builder = builder.secret(secret);
    }
    let mut driver = builder.build(StreamTransport::new(stream).with_return_char("\r\n"))?;

    driver.open().await?;
    println!(
        "Session open at: {}",
        driver.current_privilege().unwrap_or("<unknown>")
    );

    // Ctrl-C abandons the acquisition; the level is re-read afterwards
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    driver
        .acquire_privilege_with_cancel(&args.level, &cancel)
        .await?;
    println!("Now at: {}", args.level);

    if let Some(command) = &args.command {
        let response = driver.send_command(command).await?;
        if response.is_success() {
            println!("{}", response.result);
        } else {
            eprintln!("Command failed: {:?}", response.failure_message);
        }
    }

    println!("Closing...");
    driver.close().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser
struct Args {
    host: String,
    port: u16,
    platform: String,
    secret: Option<String>,
    level: String,
    command: Option<String>,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Args {
            host: "localhost".to_string(),
            port: 23,
            platform: "linux".to_string(),
            secret: env::var("PRIVSH_SECRET").ok(),
            level: "root".to_string(),
            command: None,
            timeout: 30,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match (args[i].as_str(), value) {
                ("--host", Some(v)) => parsed.host = v,
                ("--port", Some(v)) => parsed.port = v.parse().unwrap_or(23),
                ("--platform", Some(v)) => parsed.platform = v,
                ("--secret", Some(v)) => parsed.secret = Some(v),
                ("--level", Some(v)) => parsed.level = v,
                ("--command", Some(v)) => parsed.command = Some(v),
                ("--timeout", Some(v)) => parsed.timeout = v.parse().unwrap_or(30),
                ("--help", _) => {
                    println!(
                        "Usage: console_server --host HOST --port PORT --platform NAME \
                         [--secret S] [--level LEVEL] [--command CMD] [--timeout SECS]"
                    );
                    std::process::exit(0);
                }
                (other, _) => {
                    eprintln!("Unknown or incomplete argument: {other}");
                    std::process::exit(1);
                }
            }
            i += 2;
        }

        parsed
    }
}
