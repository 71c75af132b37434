// Entry point for the vaultgate launcher
// Resolves directories, migrates old savefiles, picks display and sound modules, then hands over

use clap::Parser;
use env_logger::Env;
use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

// Module declarations
mod vg_bootstrap; // Startup sequence and the frozen configuration it produces
mod vg_config;    // Settings file (TOML)
mod vg_display;   // Display module table and session hand-off
mod vg_error;     // Fatal and per-module error types
mod vg_module;    // Ordered candidate selection
mod vg_paths;     // Directory layout and -d overrides
mod vg_player;    // Owner uid, player name, savefile name
mod vg_save;      // Savefile migration and listing
mod vg_sound;     // Sound modules
mod vg_term;      // Terminal display module

use vg_bootstrap::{bootstrap, resolve_paths, StartupOptions, MULTIUSER};
use vg_config::{load_or_create_settings, Settings};
use vg_display::display_modules;
use vg_error::BootstrapError;
use vg_paths::{BasePaths, PathSlot};
use vg_player::{owner_id, owner_prefix};
use vg_save::{list_saves, print_saves};
use vg_sound::sound_modules;

/// Command-line options
#[derive(Parser, Debug)]
#[command(name = "vaultgate", version, about = "Start a vaultgate session")]
struct Cli {
    /// Redirect a game directory, e.g. -dsave=~/saves (apex, edit, file, help, info, pref, xtra, user, save)
    #[arg(short = 'd', value_name = "DIR=PATH")]
    dirs: Vec<String>,

    /// Use this display module
    #[arg(short = 'm', value_name = "MODULE")]
    display: Option<String>,

    /// Use this sound module
    #[arg(short = 's', value_name = "MODULE")]
    sound: Option<String>,

    /// Play as this character (selects the savefile)
    #[arg(short = 'u', value_name = "NAME")]
    player: Option<String>,

    /// List the savefiles you can use and exit
    #[arg(short = 'l')]
    list: bool,

    /// Show the available display and sound modules and exit
    #[arg(long)]
    modules: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    // Default permissions on files
    set_umask();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = io::stdout().flush();
            eprintln!("vaultgate: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BootstrapError> {
    if cli.modules {
        return print_modules(&mut io::stdout().lock()).map_err(BootstrapError::from);
    }

    let settings = load_or_create_settings();
    run_with(cli, settings, |key| env::var(key).ok(), &mut io::stdout())
}

/// Startup proper, with the settings and environment supplied by the caller
fn run_with(
    cli: Cli,
    settings: Settings,
    env: impl Fn(&str) -> Option<String>,
    out: &mut impl Write,
) -> Result<(), BootstrapError> {
    // Command-line options take precedence over the settings file
    let opts = StartupOptions {
        path_overrides: cli.dirs,
        display: cli.display.or(settings.display_module),
        sound: cli.sound.or(settings.sound_module),
        player_name: cli.player,
        owner_id: owner_id(),
        restricted: MULTIUSER,
    };

    let bases = BasePaths::default()
        .layer(
            settings.paths.config.as_deref(),
            settings.paths.library.as_deref(),
            settings.paths.data.as_deref(),
        )
        .layer_env(env);

    // -d may point anywhere, so overrides go in before anything touches the disk
    let paths = resolve_paths(&bases, &opts.path_overrides, opts.restricted)?;

    // Listing leaves the save directory exactly as it found it
    if cli.list {
        let prefix = opts.restricted.then(|| owner_prefix(opts.owner_id));
        let saves = list_saves(paths.dir(PathSlot::Save), prefix.as_deref())?;
        print_saves(saves, out)?;
        return Ok(());
    }

    let mut boot = bootstrap(paths, &opts, display_modules(), sound_modules())?;
    log::info!(
        "session: display={} sound={} savefile={}",
        boot.config.display_name,
        boot.config.sound_name,
        boot.config.savefile.display()
    );

    boot.display.run_session(&boot.config, boot.sound.as_mut())?;
    Ok(())
}

#[cfg(unix)]
fn set_umask() {
    // SAFETY: umask only swaps the process file-creation mask
    unsafe {
        libc::umask(0o022);
    }
}

#[cfg(not(unix))]
fn set_umask() {}

/// Print the compiled module tables in the order they are tried
fn print_modules(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Display modules:")?;
    for module in display_modules() {
        writeln!(out, "  {:<10} {}", module.name(), module.help())?;
    }
    writeln!(out, "Sound modules:")?;
    for module in sound_modules() {
        writeln!(out, "  {:<10} {}", module.name(), module.help())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_accepts_attached_dir_values() {
        let cli = Cli::try_parse_from(["vaultgate", "-dsave=/tmp/s", "-d", "user=/tmp/u", "-m", "term"]).unwrap();
        assert_eq!(cli.dirs, vec!["save=/tmp/s", "user=/tmp/u"]);
        assert_eq!(cli.display.as_deref(), Some("term"));
        assert!(!cli.list);
    }

    #[test]
    fn test_module_table_lists_none_last() {
        let mut out = Vec::new();
        print_modules(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  term "));
        assert!(text.trim_end().ends_with("No sound"));
    }

    #[test]
    fn test_list_leaves_legacy_names_alone() {
        let temp = tempfile::TempDir::new().unwrap();
        let save = temp.path().join("save");
        std::fs::create_dir_all(&save).unwrap();
        std::fs::write(save.join("7.hero"), b"old").unwrap();
        let data = temp.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from(["vaultgate", "-l"]).unwrap();
        let env = |key: &str| (key == vg_paths::ENV_DATA_PATH).then(|| data.clone());
        let mut out = Vec::new();
        run_with(cli, Settings::default(), env, &mut out).unwrap();

        assert!(save.join("7.hero").is_file());
        assert!(!save.join("hero").exists());
        assert!(String::from_utf8(out).unwrap().starts_with("Savefiles you can use are:"));
    }
}
