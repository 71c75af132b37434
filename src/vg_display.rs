// Display modules
// The table of candidates tried at startup and the session hand-off each module implements

use std::io;

use crate::vg_bootstrap::BootstrapConfig;
use crate::vg_module::Module;
use crate::vg_sound::Sound;
use crate::vg_term::TermDisplay;

/// A display module the session can run on once selected
pub trait Display: Module {
    /// Take over the screen for the session.
    /// Shows the resolved startup configuration and returns when the user is done.
    fn run_session(&mut self, cfg: &BootstrapConfig, sound: &mut dyn Sound) -> io::Result<()>;
}

/// Candidate display modules in the order they are tried
pub fn display_modules() -> Vec<Box<dyn Display>> {
    #[allow(unused_mut)]
    let mut modules: Vec<Box<dyn Display>> = vec![Box::new(TermDisplay::new())];

    #[cfg(feature = "headless")]
    modules.push(Box::new(headless::HeadlessDisplay::new()));

    modules
}

/// Summary lines shared by every display module
pub fn session_lines(cfg: &BootstrapConfig) -> Vec<(String, String)> {
    let mut lines = vec![
        ("display".to_string(), cfg.display_name.to_string()),
        ("sound".to_string(), cfg.sound_name.to_string()),
        ("player".to_string(), cfg.player_name.clone()),
        ("savefile".to_string(), cfg.savefile.display().to_string()),
    ];
    if cfg.restricted {
        lines.push(("owner".to_string(), cfg.owner_id.to_string()));
    }
    lines.extend(
        cfg.paths
            .rows()
            .into_iter()
            .map(|(label, path)| (label.to_string(), path.to_string())),
    );
    lines.extend(
        cfg.paths
            .xtra_dirs()
            .into_iter()
            .map(|(leaf, path)| (format!("xtra/{}", leaf), path.display().to_string())),
    );
    lines
}

#[cfg(feature = "headless")]
pub mod headless {
    // Transcript-only display for automated runs

    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::PathBuf;

    use super::{session_lines, Display};
    use crate::vg_bootstrap::BootstrapConfig;
    use crate::vg_error::ModuleError;
    use crate::vg_module::{Module, ModuleContext};
    use crate::vg_paths::PathSlot;
    use crate::vg_sound::Sound;

    pub const TRANSCRIPT_NAME: &str = "headless.txt";

    /// Writes what would have been shown to `<user>/headless.txt`
    pub struct HeadlessDisplay {
        transcript: Option<(PathBuf, BufWriter<File>)>,
    }

    impl HeadlessDisplay {
        pub fn new() -> Self {
            HeadlessDisplay { transcript: None }
        }
    }

    impl Module for HeadlessDisplay {
        fn name(&self) -> &'static str {
            "headless"
        }

        fn help(&self) -> &'static str {
            "Headless transcript module"
        }

        fn init(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
            let dir = ctx.paths.dir(PathSlot::User);
            let path = dir.join(TRANSCRIPT_NAME);
            let file = fs::create_dir_all(dir)
                .and_then(|_| File::create(&path))
                .map_err(|source| ModuleError::Resource {
                    path: path.clone(),
                    source,
                })?;
            self.transcript = Some((path, BufWriter::new(file)));
            Ok(())
        }
    }

    impl Display for HeadlessDisplay {
        fn run_session(&mut self, cfg: &BootstrapConfig, sound: &mut dyn Sound) -> io::Result<()> {
            let Some((path, out)) = self.transcript.as_mut() else {
                return Err(io::Error::other("headless display used before init"));
            };
            for (label, value) in session_lines(cfg) {
                writeln!(out, "{}: {}", label, value)?;
            }
            out.flush()?;
            sound.bell();
            log::info!("session transcript written to {}", path.display());
            Ok(())
        }
    }

}
