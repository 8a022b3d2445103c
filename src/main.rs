use std::{path::PathBuf, process};

use clap::{Args, Parser, Subcommand};

use streamlit_desktop::LaunchOverrides;

#[derive(Debug, Parser)]
#[command(
    name = "streamlit-desktop",
    version,
    about = "Launch Streamlit scripts as desktop apps"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Launch a Streamlit script in an app window
    Run(RunArgs),
    /// Close the active app window and terminate the launcher process
    Close,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Path to the Streamlit script
    script: PathBuf,

    /// Chromium browser hosting the app window
    #[arg(long)]
    browser: Option<String>,

    /// Open a regular browser session instead of an app window
    #[arg(long)]
    windowed: bool,

    /// Keep app windows left over from a previous run
    #[arg(long)]
    keep_windows: bool,

    /// Do not echo the executed command lines
    #[arg(long)]
    quiet: bool,

    /// Treat this as a debug session and skip launching
    #[arg(long)]
    debug: bool,

    /// Streamlit option override (repeatable), e.g. -o server_port=8600
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Arguments forwarded to the script, after `--`
    #[arg(last = true)]
    args: Vec<String>,
}

fn overrides_from(args: &RunArgs) -> Result<LaunchOverrides, String> {
    let mut options = Vec::new();
    for entry in &args.options {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(format!("Invalid option '{entry}'; expected KEY=VALUE."));
        };
        options.push((key.trim().to_string(), value.trim().to_string()));
    }

    Ok(LaunchOverrides {
        open_as_app: args.windowed.then_some(false),
        browser: args.browser.clone(),
        close_opened_window: args.keep_windows.then_some(false),
        print_command: args.quiet.then_some(false),
        debug: args.debug,
        options,
    })
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => overrides_from(&args)
            .and_then(|overrides| streamlit_desktop::run(&args.script, &args.args, &overrides)),
        Commands::Close => streamlit_desktop::close_app(),
    };

    if let Err(error) = result {
        eprintln!("streamlit-desktop: {error}");
        process::exit(1);
    }
}
