// File: ./src/cli.rs
//! Command-line parsing and text rendering for the `fetchlist` binary.
use crate::state::ViewState;
use simplelog::LevelFilter;
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub root: Option<PathBuf>,
    pub url: Option<String>,
    pub json: bool,
    pub log_level: LevelFilter,
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            root: None,
            url: None,
            json: false,
            log_level: LevelFilter::Warn,
            help: false,
        }
    }
}

impl CliArgs {
    /// Parses arguments, excluding the program name.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" | "help" => parsed.help = true,
                "-r" | "--root" => {
                    let root = args.next().ok_or("--root requires a path")?;
                    parsed.root = Some(PathBuf::from(root));
                }
                "-u" | "--url" => {
                    parsed.url = Some(args.next().ok_or("--url requires a value")?);
                }
                "--json" => parsed.json = true,
                "-v" | "--verbose" => {
                    parsed.log_level = match parsed.log_level {
                        LevelFilter::Warn => LevelFilter::Info,
                        _ => LevelFilter::Debug,
                    };
                }
                "-q" | "--quiet" => parsed.log_level = LevelFilter::Off,
                other => return Err(format!("Unknown argument: {}", other)),
            }
        }
        Ok(parsed)
    }
}

pub fn print_help(binary_name: &str) {
    println!(
        "Fetchlist v{} - Fetch, sort and group the hiring item feed",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] [--url <feed>] [--json] [-v]", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and logs.");
    println!("    -u, --url <feed>      Fetch this URL instead of the configured feed.");
    println!("    --json                Print the grouped result as JSON.");
    println!("    -v, --verbose         More log output on stderr (repeat for debug).");
    println!("    -q, --quiet           No log output on stderr.");
    println!("    -h, --help            Show this help message.");
}

/// Renders a settled state as plain text.
pub fn render(state: &ViewState) -> String {
    let mut out = String::new();
    match state {
        ViewState::Loading => {
            let _ = writeln!(out, "{}", state.status_line());
        }
        ViewState::Error { message, detail } => {
            let _ = writeln!(out, "{}", message);
            let _ = writeln!(out, "{}", detail);
        }
        ViewState::Empty => {
            let _ = writeln!(out, "{}", state.status_line());
        }
        ViewState::Populated { groups, status } => {
            let _ = writeln!(out, "{}", status);
            for (list_id, items) in groups {
                let _ = writeln!(out);
                let _ = writeln!(out, "List ID: {} ({} items)", list_id, items.len());
                for item in items {
                    let _ = writeln!(out, "  {}  ID: {}", item.name(), item.id());
                }
            }
        }
    }
    out
}
