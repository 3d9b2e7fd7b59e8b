use clap::{Parser, Subcommand};

/// screenbeam: one-to-many screen sharing sessions over a PeerJS server.
#[derive(Parser, Debug)]
#[command(name = "screenbeam", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log filter override, e.g. `screenbeam=debug`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the viewer link and QR code for a sender identity.
    Link {
        /// Sender identity, e.g. `screen-abc123xyz`.
        id: String,
    },

    /// Run a sender and several viewers in-process and report the count.
    Demo {
        /// Number of viewers that join.
        #[arg(long, default_value_t = 3)]
        viewers: usize,

        /// Number of viewers that leave again before the sender stops.
        #[arg(long, default_value_t = 1)]
        drop: usize,
    },

    /// Register with the configured PeerJS server and report the outcome.
    Probe {
        /// Identity to register; a sender identity is generated if omitted.
        #[arg(long)]
        id: Option<String>,
    },

    /// Resolve the sender a viewer link points at.
    View {
        /// Viewer URL or query string (`?view=<id>`).
        input: String,
    },

    /// Print the effective configuration as JSON.
    Config,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_defaults() {
        let args = Args::try_parse_from(["screenbeam", "demo"]).unwrap();
        assert!(matches!(args.command, Command::Demo { viewers: 3, drop: 1 }));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::try_parse_from([
            "screenbeam",
            "probe",
            "--id",
            "screen-x",
            "--log-level",
            "screenbeam=debug",
        ])
        .unwrap();
        assert_eq!(args.log_level.as_deref(), Some("screenbeam=debug"));
        assert!(matches!(args.command, Command::Probe { id: Some(ref id) } if id == "screen-x"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["screenbeam"]).is_err());
    }
}
