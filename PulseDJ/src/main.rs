mod console;

use std::sync::Arc;
use std::thread;

use anyhow::Result;
use console::{AutoPlay, Command, HELP};
use crossbeam_channel::Receiver;
use pulseconfig::{Config, get_config};
use pulsecontrol::{
    NoticeLevel, Session, SessionEvent, SessionStatus, ZonePlaylists, spawn_poll_loop,
};
use pulsespotify::{ConfigTokenStore, NowPlaying, SpotifyClient, SpotifyConfigExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = get_config();
    init_tracing(&config);

    info!("💓 PulseDJ starting (config in {})", config.dir());

    let client = SpotifyClient::from_config(&config)?;
    let tokens = Arc::new(ConfigTokenStore::new(config.clone()));
    let session = Arc::new(
        Session::builder(Arc::new(client), tokens)
            .playlists(ZonePlaylists::from_config(&config))
            .skip_refresh_delay(config.get_spotify_skip_refresh_delay()?)
            .build(),
    );

    spawn_event_printer(session.subscribe());

    if !session.is_connected() {
        println!("Not connected to Spotify: use 'login <token>' first");
    }

    let poller = spawn_poll_loop(session.clone(), config.get_spotify_poll_interval()?);

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(e) = dispatch(&session, &config, command).await {
                    println!("✗ {e}");
                }
            }
            Err(e) => println!("✗ {e}"),
        }
    }

    session.shutdown();
    if let Err(e) = poller.await {
        warn!("Poller task ended abnormally: {}", e);
    }
    info!("👋 PulseDJ stopped");
    Ok(())
}

async fn dispatch(session: &Session, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::HeartRate(bpm) => {
            session.on_heart_rate(bpm).await;
        }
        Command::AutoPlay(mode) => {
            let enabled = match mode {
                AutoPlay::On => true,
                AutoPlay::Off => false,
                AutoPlay::Toggle => !session.auto_play(),
            };
            session.set_auto_play(enabled).await?;
        }
        Command::PlayPause => session.toggle_playback().await?,
        Command::Skip => session.skip().await?,
        // config.yaml is left untouched: edits last for this run only
        Command::Playlist(zone, reference) => session.set_playlist(zone, &reference)?,
        Command::Login(token) => {
            config.set_spotify_access_token(&token)?;
            println!("✓ Spotify token stored");
            session.poll().await;
        }
        Command::Logout => session.disconnect(),
        Command::Status => print_status(&session.status()),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

fn print_status(status: &SessionStatus) {
    if !status.connected {
        println!("Spotify: not connected");
    }
    println!(
        "Heart rate: {} | zone: {} | Auto DJ: {} ({:?})",
        status
            .heart_rate
            .map(|bpm| format!("{bpm} bpm"))
            .unwrap_or_else(|| "--".to_string()),
        status.zone.map(|z| z.as_str()).unwrap_or("none"),
        if status.auto_play { "on" } else { "off" },
        status.phase
    );

    if let Some(snapshot) = &status.now_playing {
        match &snapshot.current {
            NowPlaying::Nothing => println!("Now playing: nothing"),
            NowPlaying::Track(track) => println!(
                "Now playing: {} by {}{}",
                track.name,
                track.artist,
                if snapshot.is_playing { "" } else { " (paused)" }
            ),
        }
    }
    if let Some(pending) = &status.pending {
        println!(
            "Up next: {} by {} ({} zone)",
            pending.track.name, pending.track.artist, pending.zone
        );
    }

    for zone in pulsecontrol::Zone::ALL {
        println!(
            "Playlist {:<6} {}",
            zone.as_str(),
            status.playlists.get(zone).unwrap_or("(not set)")
        );
    }
}

/// Prints notices and queue changes as they happen.
fn spawn_event_printer(events: Receiver<SessionEvent>) {
    thread::spawn(move || {
        for event in events.iter() {
            match event {
                SessionEvent::Notice(notice) => {
                    let mark = match notice.level {
                        NoticeLevel::Success => "✓",
                        NoticeLevel::Info => "ℹ",
                        NoticeLevel::Warning => "⚠",
                        NoticeLevel::Error => "✗",
                    };
                    println!("{mark} {}", notice.message);
                }
                SessionEvent::ZoneChanged { transition, .. } => {
                    if let Some(zone) = transition.to {
                        println!("♥ zone: {zone}");
                    }
                }
                SessionEvent::Disconnected => {
                    println!("Spotify: not connected, use 'login <token>'")
                }
                _ => {}
            }
        }
    });
}

fn init_tracing(config: &Config) {
    let default_level = config
        .get_log_min_level()
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
