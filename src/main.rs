mod config;
mod emitter;
mod engine;
mod gesture;
mod input;
mod logging;
mod pointer;
mod touch;

#[cfg(target_os = "linux")]
mod app;
#[cfg(target_os = "linux")]
mod clock;
#[cfg(target_os = "linux")]
mod dimensions;
#[cfg(target_os = "linux")]
mod discovery;
#[cfg(target_os = "linux")]
mod libinput_backend;
#[cfg(target_os = "linux")]
mod multitouch;
#[cfg(target_os = "linux")]
mod permissions;
#[cfg(target_os = "linux")]
mod setup;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "threefingers",
    version,
    about = "3-finger tap to middle click for Linux touchpads"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Touchpad or mouse event node to use instead of udev discovery
    #[arg(short, long, global = true)]
    device: Option<PathBuf>,

    /// Skip multitouch and detect 3 rapid clicks instead
    #[arg(long, global = true)]
    fallback: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run gesture detection (default)
    Run,
    /// Run as a background service
    #[command(alias = "service")]
    Daemon,
    /// Interactive setup (checks and waits for device permissions)
    Setup,
}

#[cfg(target_os = "linux")]
fn main() {
    use app::{App, StartOptions};

    let cli = Cli::parse();
    logging::init(cli.verbose);

    let options = StartOptions {
        device: cli.device,
        force_fallback: cli.fallback,
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Setup => {
            let (_, nodes) = App::new(options).devices();
            let granted = setup::run_setup(&permissions::Permissions::new(nodes));
            std::process::exit(if granted { 0 } else { 1 });
        }
        Command::Run | Command::Daemon => {
            println!("ThreeFingers v{}", env!("CARGO_PKG_VERSION"));
            println!("   3-finger tap to middle click");
            println!();

            if let Err(e) = App::new(options).start() {
                eprintln!("threefingers: {}", e);
                std::process::exit(e.exit_code());
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    eprintln!("threefingers: only Linux evdev touchpads are supported");
    std::process::exit(1);
}
