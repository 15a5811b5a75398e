use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{Level, info};

use sticky_mic::audio::{AudioDeviceMonitor, InputSnapshot};
use sticky_mic::config::Config;
use sticky_mic::logging::{LoggingConfig, initialize_logging};
use sticky_mic::menu::{MenuEntry, build_menu};
use sticky_mic::prefs::{PreferenceStore, TomlPreferenceStore};
use sticky_mic::service::ServiceManager;
use sticky_mic::system::{AudioSystemInterface, LoggingPresenter, default_audio_system};

#[derive(Parser)]
#[command(name = "sticky-mic")]
#[command(about = "Keeps your preferred audio input device selected as the macOS default")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all available input devices
    ListDevices {
        /// Show device UIDs and ids
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show the current default input device
    ShowDefault,
    /// Show the pinned device and the menu state
    Status,
    /// Pin an input device (by name or UID) as the preferred default
    Prefer {
        /// Device name or UID
        device: String,
    },
    /// Clear the pinned device and allow automatic switching
    ClearPreference,
    /// Hide the menu bar icon (the daemon keeps running)
    HideIcon,
    /// Show the menu bar icon again
    ShowIcon,
    /// Test device monitoring (prints reconciliation decisions)
    TestMonitor,
    /// Run in daemon mode
    Daemon,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.general.log_level.parse().unwrap_or(Level::INFO)
    };

    // Only long-running modes write rotated log files
    let long_running = matches!(
        cli.command,
        None | Some(Commands::Daemon) | Some(Commands::TestMonitor)
    );

    let (_guard, log_dir) = initialize_logging(LoggingConfig {
        level,
        file_output: long_running,
        console_output: true,
        log_dir: None,
        json_format: false,
    })?;

    info!("Starting sticky-mic");

    match cli.command {
        Some(Commands::ListDevices { verbose }) => {
            let audio = default_audio_system()?;
            list_devices(audio.as_ref(), verbose)?;
        }
        Some(Commands::ShowDefault) => {
            let audio = default_audio_system()?;
            show_default(audio.as_ref())?;
        }
        Some(Commands::Status) => {
            let audio = default_audio_system()?;
            let prefs = TomlPreferenceStore::open_default()?;
            status(audio.as_ref(), &prefs)?;
        }
        Some(Commands::Prefer { device }) => {
            let audio = default_audio_system()?;
            let mut prefs = TomlPreferenceStore::open_default()?;
            prefer(audio.as_ref(), &mut prefs, &device)?;
        }
        Some(Commands::ClearPreference) => {
            let mut prefs = TomlPreferenceStore::open_default()?;
            prefs.set_preferred_device_uid(None)?;
            println!("✓ Cleared preferred input, automatic switching re-enabled");
        }
        Some(Commands::HideIcon) => {
            let mut prefs = TomlPreferenceStore::open_default()?;
            prefs.set_hide_status_icon(true)?;
            println!("✓ Menu bar icon hidden; run 'sticky-mic show-icon' to bring it back");
        }
        Some(Commands::ShowIcon) => {
            let mut prefs = TomlPreferenceStore::open_default()?;
            prefs.set_hide_status_icon(false)?;
            println!("✓ Menu bar icon visible");
        }
        Some(Commands::TestMonitor) => {
            test_monitor(config).await?;
        }
        Some(Commands::Daemon) | None => {
            if let Some(dir) = &log_dir {
                info!("Logging to: {}", dir.display());
            }
            run_daemon(config).await?;
        }
    }

    Ok(())
}

fn list_devices(audio: &dyn AudioSystemInterface, verbose: bool) -> Result<()> {
    let snapshot = InputSnapshot::capture(audio)?;

    println!("Available input devices:");
    if snapshot.devices.is_empty() {
        println!("  No input devices found!");
        return Ok(());
    }

    for (i, device) in snapshot.devices.iter().enumerate() {
        let marker = if Some(device.id) == snapshot.default_id {
            " (default)"
        } else {
            ""
        };

        if verbose {
            println!(
                "  {}. {} [uid: {}, id: {}]{}",
                i + 1,
                device.name,
                device.uid,
                device.id,
                marker
            );
        } else {
            println!("  {}. {}{}", i + 1, device.name, marker);
        }
    }

    Ok(())
}

fn show_default(audio: &dyn AudioSystemInterface) -> Result<()> {
    let snapshot = InputSnapshot::capture(audio)?;

    let default = snapshot
        .default_id
        .and_then(|id| snapshot.devices.iter().find(|d| d.id == id));

    match default {
        Some(device) => println!("Default input: {}", device.name),
        None => println!("Default input: None available"),
    }

    Ok(())
}

fn status(audio: &dyn AudioSystemInterface, prefs: &TomlPreferenceStore) -> Result<()> {
    let snapshot = InputSnapshot::capture(audio)?;
    let preferred = prefs.preferred_device_uid();

    match &preferred {
        Some(uid) => match snapshot.device_with_uid(uid) {
            Some(device) => println!("Preferred input: {} [connected]", device.name),
            None => println!("Preferred input: {} [not connected]", uid),
        },
        None => println!("Preferred input: none (automatic)"),
    }

    println!(
        "Menu bar icon: {}",
        if prefs.hide_status_icon() {
            "hidden"
        } else {
            "visible"
        }
    );

    let menu = build_menu(
        &snapshot.devices,
        preferred.as_deref(),
        snapshot.default_id,
        false,
    );

    println!();
    for entry in &menu.entries {
        match entry {
            MenuEntry::Header { title } => println!("{title}"),
            MenuEntry::Separator => println!("  --------"),
            MenuEntry::SelectNone { checked } => {
                println!("  [{}] None (allow automatic)", check_mark(*checked));
            }
            MenuEntry::Device {
                name,
                checked,
                is_default,
                ..
            } => {
                let default = if *is_default { " (default)" } else { "" };
                println!("  [{}] {}{}", check_mark(*checked), name, default);
            }
            MenuEntry::HideIcon => println!("  Hide Menu Bar Icon"),
            MenuEntry::LaunchAtLogin { enabled } => {
                println!("  [{}] Launch at Login", check_mark(*enabled));
            }
            MenuEntry::Quit => println!("  Quit"),
        }
    }

    Ok(())
}

fn check_mark(checked: bool) -> char {
    if checked { '*' } else { ' ' }
}

fn prefer(
    audio: &dyn AudioSystemInterface,
    prefs: &mut TomlPreferenceStore,
    query: &str,
) -> Result<()> {
    let snapshot = InputSnapshot::capture(audio)?;

    let Some(device) = snapshot
        .devices
        .iter()
        .find(|d| d.uid == query || d.name == query)
    else {
        return Err(anyhow::anyhow!("Input device '{}' not found", query));
    };

    prefs.set_preferred_device_uid(Some(&device.uid))?;
    audio.set_default_input_device(device.id)?;

    println!("✓ Preferred input set to: {}", device.name);
    Ok(())
}

async fn test_monitor(config: Config) -> Result<()> {
    info!("Starting device monitor test");

    println!("Testing device change reconciliation...");

    let audio = default_audio_system()?;
    let prefs = TomlPreferenceStore::open_default()?;
    let mut monitor = AudioDeviceMonitor::new(audio, prefs, LoggingPresenter, &config);

    monitor.start()?;

    println!("Device monitoring active - try plugging/unplugging audio devices");
    println!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    println!("Monitor test stopped");
    monitor.stop()?;

    Ok(())
}

async fn run_daemon(config: Config) -> Result<()> {
    info!("Starting daemon mode");

    let audio = default_audio_system()?;
    let prefs = TomlPreferenceStore::open_default()?;
    let monitor = AudioDeviceMonitor::new(audio, prefs, LoggingPresenter, &config);

    println!("sticky-mic daemon started");
    println!("  Keeping your preferred input device selected");
    println!("  Press Ctrl+C to stop");

    ServiceManager::new(monitor).run().await
}
