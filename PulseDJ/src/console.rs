//! Line-oriented console commands.
//!
//! The console stands in for the heart-rate sensor and the playback buttons:
//! each line typed on stdin becomes one [`Command`].

use anyhow::{Result, anyhow, bail};
use pulsecontrol::Zone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoPlay {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `None` simulates a lost sensor signal.
    HeartRate(Option<u32>),
    AutoPlay(AutoPlay),
    PlayPause,
    Skip,
    Playlist(Zone, String),
    Login(String),
    Logout,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  bpm <N>|none              feed a heart-rate reading
  auto on|off|toggle        enable or disable Auto DJ
  play                      play/pause
  skip                      skip to the next track
  playlist <zone> [<ref>]   set (or clear) the slow|medium|fast playlist
  login <token>             use a Spotify access token
  logout                    forget the access token
  status                    show the session state
  quit                      exit";

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| anyhow!("Empty command"))?
            .to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match (verb.as_str(), args.as_slice()) {
            ("bpm" | "hr", ["none" | "-"]) => Command::HeartRate(None),
            ("bpm" | "hr", [value]) => Command::HeartRate(Some(
                value
                    .parse()
                    .map_err(|_| anyhow!("Invalid heart rate '{}'", value))?,
            )),
            ("auto", []) | ("auto", ["toggle"]) => Command::AutoPlay(AutoPlay::Toggle),
            ("auto", ["on"]) => Command::AutoPlay(AutoPlay::On),
            ("auto", ["off"]) => Command::AutoPlay(AutoPlay::Off),
            ("play" | "pause", []) => Command::PlayPause,
            ("skip" | "next", []) => Command::Skip,
            ("playlist", [zone]) => Command::Playlist(zone.parse()?, String::new()),
            ("playlist", [zone, reference]) => {
                Command::Playlist(zone.parse()?, reference.to_string())
            }
            ("login", [token]) => Command::Login(token.to_string()),
            ("logout", []) => Command::Logout,
            ("status", []) => Command::Status,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => bail!("Unknown command '{}', type 'help'", line.trim()),
        };
        Ok(command)
    }
}
