// Startup sequence
// Paths, savefile migration, display selection, player identity, sound selection, in that order

use log::Level;
use std::path::PathBuf;

use crate::vg_display::Display;
use crate::vg_error::BootstrapError;
use crate::vg_module::{select_module, ModuleContext};
use crate::vg_paths::{BasePaths, PathSet, PathSlot};
use crate::vg_player::{default_player_name, owner_prefix, savefile_name};
use crate::vg_save::migrate_legacy_names;
use crate::vg_sound::{NoSound, Sound};

/// Multi-user install: shared directories are fixed and savefiles are owner-scoped
pub const MULTIUSER: bool = cfg!(feature = "multiuser");

/// Inputs gathered from the command line and settings file
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub path_overrides: Vec<String>, // "<slot>=<path>" requests, applied in order
    pub display: Option<String>,     // Requested display module
    pub sound: Option<String>,       // Requested sound module
    pub player_name: Option<String>, // Overrides the login-derived name
    pub owner_id: u32,
    pub restricted: bool,
}

/// Everything the rest of the program needs from startup.
/// Handed out by reference; nothing changes it after `bootstrap` returns.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub paths: PathSet,
    pub display_name: &'static str,
    pub sound_name: &'static str,
    pub player_name: String,
    pub savefile: PathBuf,
    pub owner_id: u32,
    pub restricted: bool,
}

/// Startup result: the frozen configuration plus the modules that accepted
pub struct Bootstrap {
    pub config: BootstrapConfig,
    pub display: Box<dyn Display>,
    pub sound: Box<dyn Sound>,
}

/// Build the directory layout and apply every `-d` request in order
pub fn resolve_paths(
    bases: &BasePaths,
    overrides: &[String],
    restricted: bool,
) -> Result<PathSet, BootstrapError> {
    let mut paths = PathSet::new(bases);
    for request in overrides {
        paths.apply_override(request, restricted)?;
    }
    Ok(paths)
}

/// Run the rest of startup on resolved paths.
///
/// Fails only when no display module accepts or a needed directory cannot
/// be created. Sound always ends up with some module, `none` at worst.
pub fn bootstrap(
    paths: PathSet,
    opts: &StartupOptions,
    displays: Vec<Box<dyn Display>>,
    sounds: Vec<Box<dyn Sound>>,
) -> Result<Bootstrap, BootstrapError> {
    // Savefiles used to be named "<uid>.<name>" on single-user installs too
    if !opts.restricted {
        let moved = migrate_legacy_names(paths.dir(PathSlot::Save), &owner_prefix(opts.owner_id));
        if moved > 0 {
            log::info!("renamed {} legacy savefile(s)", moved);
        }
    }

    let ctx = ModuleContext { paths: &paths };

    let selected = select_module(displays, opts.display.as_deref(), &ctx, Level::Warn);
    let Some(display) = selected.module else {
        if let Some(last) = selected.system_name {
            log::warn!("last display module tried was '{}'", last);
        }
        return Err(BootstrapError::NoDisplay);
    };

    let player_name = opts
        .player_name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| default_player_name(opts.owner_id));
    let savefile = paths
        .dir(PathSlot::Save)
        .join(savefile_name(&player_name, opts.owner_id, opts.restricted));

    paths.create_needed_dirs()?;

    let selected = select_module(sounds, opts.sound.as_deref(), &ctx, Level::Info);
    let sound: Box<dyn Sound> = match selected.module {
        Some(sound) => sound,
        None => {
            log::warn!("no sound module accepted, continuing without sound");
            Box::new(NoSound)
        }
    };

    let config = BootstrapConfig {
        display_name: display.name(),
        sound_name: sound.name(),
        player_name,
        savefile,
        owner_id: opts.owner_id,
        restricted: opts.restricted,
        paths,
    };
    Ok(Bootstrap {
        config,
        display,
        sound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vg_error::ModuleError;
    use crate::vg_module::Module;
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    struct FakeDisplay {
        name: &'static str,
        works: bool,
    }

    impl Module for FakeDisplay {
        fn name(&self) -> &'static str {
            self.name
        }

        fn help(&self) -> &'static str {
            "fake display"
        }

        fn init(&mut self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
            if self.works {
                Ok(())
            } else {
                Err(ModuleError::NotATerminal)
            }
        }
    }

    impl Display for FakeDisplay {
        fn run_session(&mut self, _cfg: &BootstrapConfig, _sound: &mut dyn Sound) -> io::Result<()> {
            Ok(())
        }
    }

    fn displays(spec: &[(&'static str, bool)]) -> Vec<Box<dyn Display>> {
        spec.iter()
            .map(|&(name, works)| Box::new(FakeDisplay { name, works }) as Box<dyn Display>)
            .collect()
    }

    fn quiet() -> Vec<Box<dyn Sound>> {
        vec![Box::new(NoSound)]
    }

    fn paths_in(temp: &TempDir) -> PathSet {
        let root = temp.path().to_string_lossy().to_string();
        let base = Some(root.as_str());
        let bases = BasePaths::default().layer(base, base, base);
        PathSet::new(&bases)
    }

    fn opts(owner_id: u32, restricted: bool) -> StartupOptions {
        StartupOptions {
            player_name: Some("Hero".to_string()),
            owner_id,
            restricted,
            ..StartupOptions::default()
        }
    }

    #[test]
    fn test_no_display_is_fatal() {
        let temp = TempDir::new().unwrap();
        let result = bootstrap(
            paths_in(&temp),
            &opts(7, false),
            displays(&[("a", false), ("b", false)]),
            quiet(),
        );
        assert!(matches!(result, Err(BootstrapError::NoDisplay)));
    }

    #[test]
    fn test_happy_path() {
        let temp = TempDir::new().unwrap();
        let boot = bootstrap(
            paths_in(&temp),
            &opts(7, false),
            displays(&[("a", false), ("b", true), ("c", true)]),
            quiet(),
        )
        .unwrap();

        assert_eq!(boot.config.display_name, "b");
        assert_eq!(boot.config.sound_name, "none");
        assert_eq!(boot.config.player_name, "Hero");
        assert_eq!(boot.config.savefile, boot.config.paths.dir(PathSlot::Save).join("Hero"));
        assert!(boot.config.paths.dir(PathSlot::User).is_dir());
        assert!(boot.config.paths.dir(PathSlot::Save).is_dir());
    }

    #[test]
    fn test_requested_display_is_honoured() {
        let temp = TempDir::new().unwrap();
        let options = StartupOptions {
            display: Some("c".to_string()),
            ..opts(7, false)
        };
        let boot = bootstrap(
            paths_in(&temp),
            &options,
            displays(&[("a", true), ("b", true), ("c", true)]),
            quiet(),
        )
        .unwrap();
        assert_eq!(boot.display.name(), "c");
    }

    #[test]
    fn test_unknown_sound_request_falls_back_to_none() {
        let temp = TempDir::new().unwrap();
        let options = StartupOptions {
            sound: Some("sdl".to_string()),
            ..opts(7, false)
        };
        let boot = bootstrap(paths_in(&temp), &options, displays(&[("a", true)]), quiet()).unwrap();
        assert_eq!(boot.config.sound_name, "none");
    }

    #[test]
    fn test_migrates_legacy_savefiles_before_display() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        let save = paths.dir(PathSlot::Save).to_path_buf();
        fs::create_dir_all(&save).unwrap();
        fs::write(save.join("7.Hero"), b"old").unwrap();

        // migration happens even though startup then fails
        let result = bootstrap(paths, &opts(7, false), displays(&[("a", false)]), quiet());

        assert!(result.is_err());
        assert!(save.join("Hero").is_file());
        assert!(!save.join("7.Hero").exists());
    }

    #[test]
    fn test_restricted_keeps_uid_names() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        let save = paths.dir(PathSlot::Save).to_path_buf();
        fs::create_dir_all(&save).unwrap();
        fs::write(save.join("7.Hero"), b"old").unwrap();

        let boot = bootstrap(paths, &opts(7, true), displays(&[("a", true)]), quiet()).unwrap();

        assert!(save.join("7.Hero").is_file());
        assert!(!save.join("Hero").exists());
        assert_eq!(boot.config.savefile, save.join("7.Hero"));
    }

    #[test]
    fn test_resolve_paths_applies_overrides_in_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_string_lossy().to_string();
        let base = Some(root.as_str());
        let bases = BasePaths::default().layer(base, base, base);
        let overrides = vec![format!("user={}/one", root), format!("USER={}/two", root)];

        let paths = resolve_paths(&bases, &overrides, false).unwrap();

        assert_eq!(paths.get(PathSlot::User), format!("{}/two/", root));
        assert!(temp.path().join("one").is_dir());
    }

    #[test]
    fn test_resolve_paths_stops_at_first_bad_request() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_string_lossy().to_string();
        let base = Some(root.as_str());
        let bases = BasePaths::default().layer(base, base, base);
        let overrides = vec!["bogus=/x".to_string(), format!("user={}/later", root)];

        let err = resolve_paths(&bases, &overrides, false).unwrap_err();

        assert!(matches!(err, BootstrapError::UnknownSlot(_)));
        assert!(!temp.path().join("later").exists());
    }
}
