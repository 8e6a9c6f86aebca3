use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotsel::{
    cli::{self, TrackList},
    config, error, logging,
    types::RepeatMode,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Log debug diagnostics to stderr
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Show what is playing
    Status,

    /// Poll and print the playback state until Ctrl-C
    Watch,

    /// List available devices
    Devices,

    /// List playlists and configured sources
    Playlists,

    /// List the options of a track picker
    Tracks(TracksOptions),

    /// Transfer playback to the device and resume
    Play(DeviceOption),

    Pause(DeviceOption),

    /// Skip to the next track
    Next(DeviceOption),

    /// Skip to the previous track
    Previous(DeviceOption),

    Shuffle(ShuffleOptions),

    Repeat(RepeatOptions),

    /// Transfer playback to a device (label or id)
    Transfer(TargetOption),

    /// Check that a device label or id resolves
    SelectDevice(TargetOption),

    /// Start a configured source playlist by name
    Source(SourceOptions),

    /// Start a playlist, optionally at a track
    PlayPlaylist(PlayPlaylistOptions),

    /// Play a saved or recently played track
    PlayTrack(PlayTrackOptions),

    /// Add a track to the queue
    Queue(QueueOptions),

    /// Reload playlists and their tracks
    RefreshLibrary,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct DeviceOption {
    /// Device label or id, defaults to the selected device
    #[clap(long)]
    pub device: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    #[clap(value_enum, default_value = "saved")]
    pub list: TrackList,

    /// Playlist name or id, for `playlist`
    #[clap(long)]
    pub playlist: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ShuffleOptions {
    #[clap(action = clap::ArgAction::Set)]
    pub state: bool,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct RepeatOptions {
    #[clap(value_enum)]
    pub mode: RepeatMode,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct TargetOption {
    pub target: String,
}

#[derive(Parser, Debug, Clone)]
pub struct SourceOptions {
    pub name: String,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayPlaylistOptions {
    /// Playlist name or id
    pub playlist: String,

    /// Track uri or picker label inside the playlist
    #[clap(long)]
    pub track: Option<String>,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayTrackOptions {
    /// Track uri or picker label
    pub track: String,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct QueueOptions {
    pub uri: String,

    /// Skip to the queued track right away
    #[clap(long)]
    pub now: bool,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Status => cli::status().await,
        Command::Watch => cli::watch().await,
        Command::Devices => cli::devices().await,
        Command::Playlists => cli::playlists().await,
        Command::Tracks(opt) => cli::tracks(opt.list, opt.playlist).await,
        Command::Play(opt) => cli::play(opt.device).await,
        Command::Pause(opt) => cli::pause(opt.device).await,
        Command::Next(opt) => cli::next(opt.device).await,
        Command::Previous(opt) => cli::previous(opt.device).await,
        Command::Shuffle(opt) => cli::shuffle(opt.state, opt.device.device).await,
        Command::Repeat(opt) => cli::repeat(opt.mode, opt.device.device).await,
        Command::Transfer(opt) => cli::transfer(opt.target).await,
        Command::SelectDevice(opt) => cli::select_device(opt.target).await,
        Command::Source(opt) => cli::source(opt.name, opt.device.device).await,
        Command::PlayPlaylist(opt) => {
            cli::play_playlist(opt.playlist, opt.track, opt.device.device).await
        }
        Command::PlayTrack(opt) => cli::play_track(opt.track, opt.device.device).await,
        Command::Queue(opt) => cli::queue(opt.uri, opt.now, opt.device.device).await,
        Command::RefreshLibrary => cli::refresh_library().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
