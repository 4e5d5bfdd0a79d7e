//! Command-line argument parsing for the flowstream CLI.

/// Options for tailing the event stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TailOptions {
    /// Flow to follow; all flows when `None`
    pub flow_id: Option<String>,
    /// Event types to print; every type when empty
    pub event_types: Vec<String>,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Tail the event stream (default)
    Tail(TailOptions),
}

/// Parse command-line arguments and return the appropriate command.
///
/// Unknown flags are ignored. A flag missing its value yields `Help`.
///
/// # Examples
///
/// ```
/// use flowstream::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["flowstream".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut options = TailOptions::default();
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--flow" | "-f" => match args.next() {
                Some(id) => options.flow_id = Some(id),
                None => return CliCommand::Help,
            },
            "--type" | "-t" => match args.next() {
                Some(t) => options.event_types.push(t),
                None => return CliCommand::Help,
            },
            _ => {}
        }
    }

    CliCommand::Tail(options)
}

pub const USAGE: &str = "\
Usage: flowstream [--flow <id>] [--type <event_type>]...

Prints flow execution events as JSON lines until interrupted.

Options:
  -f, --flow <id>     Follow a single flow instead of all flows
  -t, --type <type>   Only print events of this type (repeatable)
  -V, --version       Print version
  -h, --help          Print this help

Environment:
  FLOWSTREAM_URL            Server origin (default http://127.0.0.1:8000)
  FLOWSTREAM_MAX_RETRIES    Reconnect attempts (default 5)
  FLOWSTREAM_RETRY_BASE_MS  Backoff unit in ms (default 1000)
  RUST_LOG                  Log filter (default info)";
