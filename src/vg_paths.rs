// Directory layout for game data
// Resolves the config/library/data bases, derives the per-purpose subdirectories and applies -d overrides

use directories::BaseDirs;
use std::fs;
use std::path::{is_separator, Path, PathBuf, MAIN_SEPARATOR_STR};

use crate::vg_error::BootstrapError;

/// Platform path separator appended to every resolved directory
pub const PATH_SEP: &str = MAIN_SEPARATOR_STR;

/// Size of a path buffer including its terminator; stored paths never exceed `PATH_BUF_LEN - 1` bytes
pub const PATH_BUF_LEN: usize = 512;

/// Compiled-in base paths, replaceable at build time
pub const DEFAULT_CONFIG_PATH: &str = match option_env!("VAULTGATE_DEFAULT_CONFIG_PATH") {
    Some(path) => path,
    None => "./lib/",
};
pub const DEFAULT_LIB_PATH: &str = match option_env!("VAULTGATE_DEFAULT_LIB_PATH") {
    Some(path) => path,
    None => "./lib/",
};
pub const DEFAULT_DATA_PATH: &str = match option_env!("VAULTGATE_DEFAULT_DATA_PATH") {
    Some(path) => path,
    None => "./lib/",
};

/// Environment variables that replace the bases at run time
pub const ENV_CONFIG_PATH: &str = "VAULTGATE_CONFIG_PATH";
pub const ENV_LIB_PATH: &str = "VAULTGATE_LIB_PATH";
pub const ENV_DATA_PATH: &str = "VAULTGATE_DATA_PATH";

/// Named subdirectories that can be redirected with `-d<slot>=<path>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathSlot {
    Apex, // High score files
    Edit, // Game data definitions
    File, // Misc text files
    Help, // Online help
    Info, // Spoilers
    Pref, // Default preference files
    Xtra, // Fonts, graphics, sounds, icons
    User, // Per-user preferences and dumps
    Save, // Savefiles
}

impl PathSlot {
    pub const ALL: [PathSlot; 9] = [
        PathSlot::Apex,
        PathSlot::Edit,
        PathSlot::File,
        PathSlot::Help,
        PathSlot::Info,
        PathSlot::Pref,
        PathSlot::Xtra,
        PathSlot::User,
        PathSlot::Save,
    ];

    /// Name used on the command line and in the directory tree
    pub fn name(self) -> &'static str {
        match self {
            PathSlot::Apex => "apex",
            PathSlot::Edit => "edit",
            PathSlot::File => "file",
            PathSlot::Help => "help",
            PathSlot::Info => "info",
            PathSlot::Pref => "pref",
            PathSlot::Xtra => "xtra",
            PathSlot::User => "user",
            PathSlot::Save => "save",
        }
    }

    /// Whether a user may still redirect this slot on a multi-user install.
    /// Game data and the shared savefile directory stay fixed.
    pub fn multiuser_ok(self) -> bool {
        !matches!(self, PathSlot::Edit | PathSlot::File | PathSlot::Save)
    }

    /// Case-insensitive lookup by slot name
    pub fn from_name(name: &str) -> Option<PathSlot> {
        PathSlot::ALL
            .into_iter()
            .find(|slot| slot.name().eq_ignore_ascii_case(name))
    }
}

/// The three top-level directories everything else hangs off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePaths {
    pub config: String,
    pub library: String,
    pub data: String,
}

impl Default for BasePaths {
    fn default() -> Self {
        BasePaths {
            config: DEFAULT_CONFIG_PATH.to_string(),
            library: DEFAULT_LIB_PATH.to_string(),
            data: DEFAULT_DATA_PATH.to_string(),
        }
    }
}

impl BasePaths {
    /// Replace any base for which a non-empty value is given
    pub fn layer(mut self, config: Option<&str>, library: Option<&str>, data: Option<&str>) -> Self {
        for (slot, value) in [
            (&mut self.config, config),
            (&mut self.library, library),
            (&mut self.data, data),
        ] {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                *slot = v.to_string();
            }
        }
        self
    }

    /// Layer `VAULTGATE_*_PATH` values from `lookup` (normally `env::var`); empty values are ignored
    pub fn layer_env(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config = lookup(ENV_CONFIG_PATH);
        let library = lookup(ENV_LIB_PATH);
        let data = lookup(ENV_DATA_PATH);
        self.layer(config.as_deref(), library.as_deref(), data.as_deref())
    }
}

/// Resolved directory paths for the session.
/// Every stored path ends with exactly one `PATH_SEP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSet {
    pub config: String,
    pub library: String,
    pub data: String,
    apex: String,
    edit: String,
    file: String,
    help: String,
    info: String,
    pref: String,
    xtra: String,
    user: String,
    save: String,
}

impl PathSet {
    /// Build the directory layout from the three bases.
    /// edit/pref live under config, file/help/info/xtra under library, user/apex/save under data.
    pub fn new(bases: &BasePaths) -> Self {
        let config = normalize_dir(&bases.config);
        let library = normalize_dir(&bases.library);
        let data = normalize_dir(&bases.data);
        let sub = |base: &str, leaf: &str| normalize_dir(&format!("{}{}", base, leaf));

        PathSet {
            edit: sub(&config, "edit"),
            pref: sub(&config, "pref"),
            file: sub(&library, "file"),
            help: sub(&library, "help"),
            info: sub(&library, "info"),
            xtra: sub(&library, "xtra"),
            user: sub(&data, "user"),
            apex: sub(&data, "apex"),
            save: sub(&data, "save"),
            config,
            library,
            data,
        }
    }

    pub fn get(&self, slot: PathSlot) -> &str {
        match slot {
            PathSlot::Apex => &self.apex,
            PathSlot::Edit => &self.edit,
            PathSlot::File => &self.file,
            PathSlot::Help => &self.help,
            PathSlot::Info => &self.info,
            PathSlot::Pref => &self.pref,
            PathSlot::Xtra => &self.xtra,
            PathSlot::User => &self.user,
            PathSlot::Save => &self.save,
        }
    }

    fn slot_mut(&mut self, slot: PathSlot) -> &mut String {
        match slot {
            PathSlot::Apex => &mut self.apex,
            PathSlot::Edit => &mut self.edit,
            PathSlot::File => &mut self.file,
            PathSlot::Help => &mut self.help,
            PathSlot::Info => &mut self.info,
            PathSlot::Pref => &mut self.pref,
            PathSlot::Xtra => &mut self.xtra,
            PathSlot::User => &mut self.user,
            PathSlot::Save => &mut self.save,
        }
    }

    /// Directory for a slot as a filesystem path
    pub fn dir(&self, slot: PathSlot) -> &Path {
        Path::new(self.get(slot))
    }

    /// Fixed subdirectories of xtra: font, graf, sound, icon
    pub fn xtra_dirs(&self) -> [(&'static str, PathBuf); 4] {
        let xtra = self.dir(PathSlot::Xtra);
        ["font", "graf", "sound", "icon"].map(|leaf| (leaf, xtra.join(leaf)))
    }

    /// Handle a `<slot>=<path>` request (the argument of `-d`).
    ///
    /// The slot name is matched case-insensitively, the target directory is
    /// created if missing and then replaces the slot's previous path.
    pub fn apply_override(&mut self, request: &str, restricted: bool) -> Result<PathSlot, BootstrapError> {
        if request.is_empty() {
            return Err(BootstrapError::Usage);
        }
        let (name, path) = request
            .split_once('=')
            .ok_or_else(|| BootstrapError::MalformedOverride(request.to_string()))?;

        let slot = PathSlot::from_name(name)
            .ok_or_else(|| BootstrapError::UnknownSlot(name.to_string()))?;

        if restricted && !slot.multiuser_ok() {
            return Err(BootstrapError::RestrictedSlot(slot.name().to_string()));
        }
        if path.is_empty() {
            return Err(BootstrapError::MalformedOverride(request.to_string()));
        }

        let dir = normalize_dir(path);
        create_dir(&dir)?;
        log::info!("{} directory set to {}", slot.name(), dir);
        *self.slot_mut(slot) = dir;
        Ok(slot)
    }

    /// Create the per-user directories the game writes into
    pub fn create_needed_dirs(&self) -> Result<(), BootstrapError> {
        create_dir(self.get(PathSlot::User))?;
        create_dir(self.get(PathSlot::Save))
    }

    /// Label/path rows in display order, used by the session screens
    pub fn rows(&self) -> Vec<(&'static str, &str)> {
        let mut rows = vec![
            ("config", self.config.as_str()),
            ("library", self.library.as_str()),
            ("data", self.data.as_str()),
        ];
        rows.extend(PathSlot::ALL.into_iter().map(|slot| (slot.name(), self.get(slot))));
        rows
    }
}

fn create_dir(dir: &str) -> Result<(), BootstrapError> {
    fs::create_dir_all(dir).map_err(|source| BootstrapError::CreateDir {
        path: PathBuf::from(dir),
        source,
    })?;
    log::debug!("ensured directory {}", dir);
    Ok(())
}

/// Expand a leading `~` to the user's home directory
fn expand_home(raw: &str) -> String {
    if raw == "~" || raw.starts_with("~/") {
        if let Some(base) = BaseDirs::new() {
            return format!("{}{}", base.home_dir().to_string_lossy(), &raw[1..]);
        }
    }
    raw.to_string()
}

/// Cut a string to at most `max` bytes without splitting a character
fn truncate_to(s: &mut String, max: usize) {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
}

/// Normalize a directory path so it ends with exactly one separator.
///
/// Idempotent. The result never exceeds `PATH_BUF_LEN - 1` bytes; longer
/// input is truncated before the separator is added. An empty path means
/// the current directory.
pub fn normalize_dir(raw: &str) -> String {
    let mut path = expand_home(raw);
    let rooted = path.starts_with(is_separator);
    while path.ends_with(is_separator) {
        path.pop();
    }
    if path.is_empty() && !rooted {
        path.push('.');
    }
    truncate_to(&mut path, PATH_BUF_LEN - 1 - PATH_SEP.len());
    path.push_str(PATH_SEP);
    path
}
