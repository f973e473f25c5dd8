mod clock;
mod console;
mod dates;
mod error;
mod filter;
mod paths;
mod report;
mod scanner;
mod session;
mod types;

use clap::Parser;
use colored::Colorize;
use std::io;

/// Lists directories filtered by their modification date.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Do not clear the screen before each search
    #[arg(long)]
    no_clear: bool,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = ctrlc::set_handler(|| {
        println!(
            "\n\n{}",
            "❌ Programa interrumpido por el usuario.".red()
        );
        std::process::exit(1);
    }) {
        log::warn!("could not install interrupt handler: {e}");
    }

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            println!("\n{}", format!("❌ Error inesperado: {e}").red());
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let console = console::Console::new(stdin.lock(), io::stdout());
    let mut session = session::Session::new(console, clock::SystemClock, cwd, !args.no_clear);

    if let Err(e) = session.run() {
        println!("\n{}", format!("❌ Error inesperado: {e}").red());
        std::process::exit(1);
    }
}
