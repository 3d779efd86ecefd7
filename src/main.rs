use clap::Parser;

use stuckat::cmd::{Cli, Commands};

fn main() {
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .unwrap();

    let cli = Cli::parse();
    match cli.command {
        Commands::Show(args) => args.run(),
        Commands::Test(args) => args.run(),
    }
}
