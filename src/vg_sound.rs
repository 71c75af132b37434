// Sound modules
// The terminal bell when a real terminal is attached, otherwise silence

use crossterm::tty::IsTty;
use std::env;
use std::io::{self, Write};

use crate::vg_error::ModuleError;
use crate::vg_module::{Module, ModuleContext};

/// A sound module the session can use once selected
pub trait Sound: Module {
    /// Audible alert (invalid key, warnings)
    fn bell(&mut self);
}

/// Candidate sound modules in the order they are tried.
/// `none` is last and always accepts, so sound selection cannot fail.
pub fn sound_modules() -> Vec<Box<dyn Sound>> {
    vec![Box::new(BellSound), Box::new(NoSound)]
}

/// Rings the terminal bell
pub struct BellSound;

impl Module for BellSound {
    fn name(&self) -> &'static str {
        "bell"
    }

    fn help(&self) -> &'static str {
        "Terminal bell"
    }

    fn init(&mut self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
        if !io::stdout().is_tty() {
            return Err(ModuleError::NotATerminal);
        }
        if env::var("TERM").is_ok_and(|term| term == "dumb") {
            return Err(ModuleError::Unsupported("TERM=dumb has no bell"));
        }
        Ok(())
    }
}

impl Sound for BellSound {
    fn bell(&mut self) {
        let mut out = io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

/// No sound at all
pub struct NoSound;

impl Module for NoSound {
    fn name(&self) -> &'static str {
        "none"
    }

    fn help(&self) -> &'static str {
        "No sound"
    }

    fn init(&mut self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }
}

impl Sound for NoSound {
    fn bell(&mut self) {}
}
