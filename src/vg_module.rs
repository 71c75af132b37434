// Display and sound module selection
// Candidates are tried in declared order until one accepts; a requested name narrows the search

use log::Level;

use crate::vg_error::ModuleError;
use crate::vg_paths::PathSet;

/// What a module may look at while initializing
pub struct ModuleContext<'a> {
    #[cfg_attr(not(feature = "headless"), allow(dead_code))]
    pub paths: &'a PathSet,
}

/// A display or sound implementation that can be probed at startup
pub trait Module {
    /// Identifier used for `-m`/`-s` and reported as the active system
    fn name(&self) -> &'static str;

    /// One-line description for the module table
    fn help(&self) -> &'static str;

    /// Try to take responsibility for this session
    fn init(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError>;
}

/// Outcome of walking a candidate list
pub struct Selection<T: ?Sized> {
    /// The module that accepted, if any
    pub module: Option<Box<T>>,
    /// Name of the last candidate attempted; equals the active module's name on success
    pub system_name: Option<&'static str>,
}

/// Try each candidate in order, skipping those that do not match `requested`.
///
/// `system_name` is recorded before each attempt so a failing module is
/// still identifiable afterwards. Stops at the first successful `init`.
/// Each decline is logged at `decline_level`.
pub fn select_module<T>(
    candidates: Vec<Box<T>>,
    requested: Option<&str>,
    ctx: &ModuleContext,
    decline_level: Level,
) -> Selection<T>
where
    T: Module + ?Sized,
{
    let mut system_name = None;

    for mut candidate in candidates {
        if requested.is_some_and(|name| name != candidate.name()) {
            continue;
        }

        system_name = Some(candidate.name());
        match candidate.init(ctx) {
            Ok(()) => {
                log::info!("module '{}' ready", candidate.name());
                return Selection {
                    module: Some(candidate),
                    system_name,
                };
            }
            Err(e) => log::log!(decline_level, "module '{}' declined: {}", candidate.name(), e),
        }
    }

    Selection {
        module: None,
        system_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vg_paths::BasePaths;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Mutex;

    /// Keeps every record so a test can look for its own lines
    struct Capture(Mutex<Vec<(Level, String)>>);

    impl log::Log for Capture {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if let Ok(mut lines) = self.0.lock() {
                lines.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

    struct Fake {
        name: &'static str,
        works: bool,
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Module for Fake {
        fn name(&self) -> &'static str {
            self.name
        }

        fn help(&self) -> &'static str {
            "test double"
        }

        fn init(&mut self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
            self.calls.borrow_mut().push(self.name);
            if self.works {
                Ok(())
            } else {
                Err(ModuleError::Unsupported("fake"))
            }
        }
    }

    fn candidates(
        spec: &[(&'static str, bool)],
    ) -> (Vec<Box<dyn Module>>, Rc<RefCell<Vec<&'static str>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let list = spec
            .iter()
            .map(|&(name, works)| {
                Box::new(Fake {
                    name,
                    works,
                    calls: Rc::clone(&calls),
                }) as Box<dyn Module>
            })
            .collect();
        (list, calls)
    }

    #[test]
    fn test_first_success_wins() {
        let paths = PathSet::new(&BasePaths::default());
        let ctx = ModuleContext { paths: &paths };
        let (list, calls) = candidates(&[("a", false), ("b", true), ("c", true)]);

        let sel = select_module(list, None, &ctx, Level::Info);

        assert_eq!(sel.module.map(|m| m.name()), Some("b"));
        assert_eq!(sel.system_name, Some("b"));
        assert_eq!(*calls.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_requested_name_skips_earlier_candidates() {
        let paths = PathSet::new(&BasePaths::default());
        let ctx = ModuleContext { paths: &paths };
        let (list, calls) = candidates(&[("a", true), ("b", true), ("c", true)]);

        let sel = select_module(list, Some("c"), &ctx, Level::Info);

        assert_eq!(sel.module.map(|m| m.name()), Some("c"));
        assert_eq!(*calls.borrow(), vec!["c"]);
    }

    #[test]
    fn test_all_fail_keeps_last_attempted_name() {
        let paths = PathSet::new(&BasePaths::default());
        let ctx = ModuleContext { paths: &paths };
        let (list, calls) = candidates(&[("a", false), ("b", false)]);

        let sel = select_module(list, None, &ctx, Level::Info);

        assert!(sel.module.is_none());
        assert_eq!(sel.system_name, Some("b"));
        assert_eq!(*calls.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_request_attempts_nothing() {
        let paths = PathSet::new(&BasePaths::default());
        let ctx = ModuleContext { paths: &paths };
        let (list, calls) = candidates(&[("a", true)]);

        let sel = select_module(list, Some("x11"), &ctx, Level::Info);

        assert!(sel.module.is_none());
        assert_eq!(sel.system_name, None);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_declines_logged_at_given_level() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Trace);
        let paths = PathSet::new(&BasePaths::default());
        let ctx = ModuleContext { paths: &paths };
        let (list, _calls) = candidates(&[("gcu", false)]);

        select_module(list, None, &ctx, Level::Warn);

        let lines = CAPTURE.0.lock().unwrap();
        assert!(lines
            .iter()
            .any(|(level, msg)| *level == Level::Warn && msg.starts_with("module 'gcu' declined")));
    }
}
