use anyhow::{bail, Context, Result};
use exprcalc::config::Config;
use exprcalc::{logging, server};

#[cfg(feature = "tui")]
mod render_help;
#[cfg(feature = "tui")]
mod tui_mode;

const USAGE: &str = "usage: exprcalc [serve|tui]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Serve,
    Tui,
    Help,
}

impl Mode {
    fn parse(arg: Option<&str>) -> Result<Self> {
        match arg {
            None | Some("serve") => Ok(Mode::Serve),
            Some("tui") => Ok(Mode::Tui),
            Some("-h" | "--help" | "help") => Ok(Mode::Help),
            Some(other) => bail!("unknown mode '{other}'\n{USAGE}"),
        }
    }

    /// Default log filter, or `None` when the mode owns the terminal and
    /// must not get log lines written over it.
    fn log_filter(self) -> Option<&'static str> {
        match self {
            Mode::Serve => Some("info"),
            Mode::Tui | Mode::Help => None,
        }
    }
}

fn main() -> Result<()> {
    let mode = Mode::parse(std::env::args().nth(1).as_deref())?;
    if let Some(filter) = mode.log_filter() {
        logging::init_tracing(filter);
    }

    match mode {
        Mode::Serve => serve(),
        Mode::Tui => tui(),
        Mode::Help => {
            println!("{USAGE}");
            Ok(())
        }
    }
}

fn serve() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(server::run(&config))
}

#[cfg(feature = "tui")]
fn tui() -> Result<()> {
    tui_mode::run_tui()
}

#[cfg(not(feature = "tui"))]
fn tui() -> Result<()> {
    bail!("exprcalc was built without the `tui` feature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_modes() {
        assert_eq!(Mode::parse(None).unwrap(), Mode::Serve);
        assert_eq!(Mode::parse(Some("serve")).unwrap(), Mode::Serve);
        assert_eq!(Mode::parse(Some("tui")).unwrap(), Mode::Tui);
        assert_eq!(Mode::parse(Some("--help")).unwrap(), Mode::Help);
        assert!(Mode::parse(Some("repl")).is_err());
    }

    #[test]
    fn only_server_mode_installs_logging() {
        assert_eq!(Mode::Serve.log_filter(), Some("info"));
        assert_eq!(Mode::Tui.log_filter(), None);
        assert_eq!(Mode::Help.log_filter(), None);
    }
}
