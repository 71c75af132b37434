// Player identity
// Owner uid, default player name from the password database, and the savefile name derived from it

/// Fallback when the system has no usable login name
pub const DEFAULT_PLAYER_NAME: &str = "PLAYER";

/// Real user id of the process
#[cfg(unix)]
pub fn owner_id() -> u32 {
    // SAFETY: getuid has no preconditions and cannot fail
    unsafe { libc::getuid() }
}

#[cfg(not(unix))]
pub fn owner_id() -> u32 {
    0
}

/// Login name for a uid, as recorded in the password database
#[cfg(unix)]
fn login_name(uid: u32) -> Option<String> {
    use std::ffi::CStr;

    // SAFETY: getpwuid returns null or a pointer to static storage that stays
    // valid until the next getpw* call; the name is copied out immediately.
    let name = unsafe {
        let pw = libc::getpwuid(uid as libc::uid_t);
        if pw.is_null() || (*pw).pw_name.is_null() {
            return None;
        }
        CStr::from_ptr((*pw).pw_name).to_string_lossy().into_owned()
    };
    (!name.is_empty()).then_some(name)
}

#[cfg(not(unix))]
fn login_name(_uid: u32) -> Option<String> {
    None
}

/// Default player name: the capitalised login name, or `PLAYER`
pub fn default_player_name(uid: u32) -> String {
    match login_name(uid) {
        Some(name) => capitalize(&name),
        None => DEFAULT_PLAYER_NAME.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Filesystem-safe form of a player name: anything but letters and digits becomes `_`
pub fn safe_name(player_name: &str) -> String {
    player_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Prefix that scopes savefiles to one user on multi-user installs (`<uid>.`)
pub fn owner_prefix(uid: u32) -> String {
    format!("{}.", uid)
}

/// Savefile name for a player; multi-user installs prefix the owner uid
pub fn savefile_name(player_name: &str, uid: u32, restricted: bool) -> String {
    let name = safe_name(player_name);
    if restricted {
        format!("{}{}", owner_prefix(uid), name)
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("frodo"), "Frodo");
        assert_eq!(capitalize("éowyn"), "Éowyn");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("Bilbo Baggins"), "Bilbo_Baggins");
        assert_eq!(safe_name("../etc/passwd"), "___etc_passwd");
    }

    #[test]
    fn test_savefile_name_scoping() {
        assert_eq!(savefile_name("Mage", 7, false), "Mage");
        assert_eq!(savefile_name("Mage", 7, true), "7.Mage");
        assert!(savefile_name("Mage", 42, true).starts_with(&owner_prefix(42)));
    }

    #[test]
    fn test_default_player_name_is_never_empty() {
        assert!(!default_player_name(owner_id()).is_empty());
    }
}
