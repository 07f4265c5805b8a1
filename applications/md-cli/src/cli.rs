/// Command line definition
use clap::{Parser, Subcommand};
use md_core::Wireformat;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "md")]
#[command(about = "Manage the contents of a disc recorder", long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ./md.toml when present)
    #[arg(short, long, global = true, env = "MD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Create a fresh device state file
    Init {
        /// Start with an empty disc instead of the demo disc
        #[arg(long)]
        blank: bool,
    },
    /// Show the disc contents
    List {
        /// Format used for the remaining time estimate
        #[arg(long, value_parser = parse_format)]
        format: Option<Wireformat>,
        /// Print the device snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the transport state
    Status,
    /// Rename the disc
    RenameDisc {
        title: String,
        #[arg(long)]
        full_width: Option<String>,
    },
    /// Rename a track
    RenameTrack {
        index: usize,
        title: String,
        #[arg(long)]
        full_width: Option<String>,
    },
    /// Rename a group
    RenameGroup {
        index: usize,
        title: String,
        #[arg(long)]
        full_width: Option<String>,
    },
    /// Move a track to another physical position
    Move { src: usize, dst: usize },
    /// Drag a row of the grouped listing onto another row
    Drag {
        from_list: usize,
        from_index: usize,
        to_list: usize,
        to_index: usize,
    },
    /// Put contiguous ungrouped tracks into a new group
    Group {
        name: String,
        #[arg(required = true)]
        tracks: Vec<usize>,
    },
    /// Delete groups, keeping their tracks
    Ungroup {
        #[arg(required = true)]
        groups: Vec<usize>,
    },
    /// Delete tracks
    Delete {
        #[arg(required = true)]
        tracks: Vec<usize>,
    },
    /// Erase the whole disc
    Wipe,
    /// Eject the disc
    Eject,
    Play,
    Pause,
    Stop,
    Next,
    Prev,
    /// Jump to a track
    Goto { track: usize },
    /// Jump to a position inside a track
    Seek { track: usize, seconds: f64 },
    /// Write audio files to the disc
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Recording format for files that need conversion
        #[arg(long, value_parser = parse_format)]
        format: Option<Wireformat>,
    },
    /// Run the destructive device self-test (erases the disc)
    SelfTest,
    /// Read tracks back from the disc (all tracks when none are given)
    Download {
        tracks: Vec<usize>,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

pub fn parse_format(value: &str) -> Result<Wireformat, String> {
    Wireformat::from_str(value).ok_or_else(|| {
        format!(
            "unknown format '{}' (expected one of SP, LP2, LP105, LP4)",
            value
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload() {
        let cli = Cli::try_parse_from(["md", "upload", "a.flac", "b.wav", "--format", "lp4"])
            .unwrap();
        assert_eq!(
            cli.command,
            Command::Upload {
                files: vec![PathBuf::from("a.flac"), PathBuf::from("b.wav")],
                format: Some(Wireformat::Lp4),
            }
        );
        assert!(!cli.yes);
    }

    #[test]
    fn test_parse_global_yes_after_subcommand() {
        let cli = Cli::try_parse_from(["md", "wipe", "--yes"]).unwrap();
        assert!(cli.yes);
        assert_eq!(cli.command, Command::Wipe);
    }

    #[test]
    fn test_parse_drag() {
        let cli = Cli::try_parse_from(["md", "drag", "0", "0", "1", "1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Drag {
                from_list: 0,
                from_index: 0,
                to_list: 1,
                to_index: 1
            }
        );
    }

    #[test]
    fn test_parse_self_test() {
        let cli = Cli::try_parse_from(["md", "self-test", "-y"]).unwrap();
        assert_eq!(cli.command, Command::SelfTest);
        assert!(cli.yes);
    }

    #[test]
    fn test_group_requires_tracks() {
        assert!(Cli::try_parse_from(["md", "group", "Album"]).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["md", "list", "--format", "hifi"]).is_err());
        assert!(parse_format("LP105").is_ok());
    }
}
