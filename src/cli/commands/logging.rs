use clap::{Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Repeatable `-v` flag. The service logs at INFO out of the box; `-v`
/// switches to DEBUG and `-vv` to TRACE. Per-crate filtering goes through
/// `RUST_LOG`.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Increase log verbosity (-v: debug, -vv: trace; default: info)")
            .global(true)
            .action(ArgAction::Count),
    )
}
