use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::tty::IsTty;
use crossterm::execute;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Terminal;
use std::io;
use term_color_support::ColorSupport;
use unicode_width::UnicodeWidthStr;

use crate::vg_bootstrap::BootstrapConfig;
use crate::vg_display::{session_lines, Display};
use crate::vg_error::ModuleError;
use crate::vg_module::{Module, ModuleContext};
use crate::vg_sound::Sound;

/// Smallest terminal the game screens fit in
pub const MIN_WIDTH: u16 = 80;
pub const MIN_HEIGHT: u16 = 24;

/// Colour capability detected when the module starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    Basic,     // 16 ANSI colours
    Indexed,   // 256-colour palette
    TrueColor, // 24-bit RGB
}

impl ColorDepth {
    pub fn detect() -> Self {
        let support = ColorSupport::stdout();
        if support.has_16m {
            ColorDepth::TrueColor
        } else if support.has_256 {
            ColorDepth::Indexed
        } else {
            ColorDepth::Basic
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorDepth::Basic => "16 colours",
            ColorDepth::Indexed => "256 colours",
            ColorDepth::TrueColor => "true colour",
        }
    }

    /// Highlight colour for labels, the closest the terminal can show to a pale yellow
    pub fn accent(self) -> Color {
        match self {
            ColorDepth::TrueColor => Color::Rgb(249, 241, 165),
            ColorDepth::Indexed => Color::Indexed(229),
            ColorDepth::Basic => Color::LightYellow,
        }
    }
}

/// Full-screen terminal module on crossterm
pub struct TermDisplay {
    colors: ColorDepth,
}

impl TermDisplay {
    pub fn new() -> Self {
        TermDisplay {
            colors: ColorDepth::Basic,
        }
    }
}

impl Module for TermDisplay {
    fn name(&self) -> &'static str {
        "term"
    }

    fn help(&self) -> &'static str {
        "Terminal module (crossterm)"
    }

    fn init(&mut self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
        if !io::stdout().is_tty() {
            return Err(ModuleError::NotATerminal);
        }
        let (width, height) = terminal::size()?;
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            return Err(ModuleError::TooSmall {
                width,
                height,
                min_width: MIN_WIDTH,
                min_height: MIN_HEIGHT,
            });
        }
        self.colors = ColorDepth::detect();
        log::debug!("terminal {}x{}, {}", width, height, self.colors.label());
        Ok(())
    }
}

impl Display for TermDisplay {
    fn run_session(&mut self, cfg: &BootstrapConfig, sound: &mut dyn Sound) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let result = self.summary_loop(&mut terminal, cfg, sound);

        // Restore the terminal even when drawing failed; every step runs
        let teardown = first_error([
            disable_raw_mode(),
            execute!(terminal.backend_mut(), LeaveAlternateScreen),
            terminal.show_cursor(),
        ]);
        result.and(teardown)
    }
}

/// Keep the first failure out of a series of steps that must all run
fn first_error<const N: usize>(steps: [io::Result<()>; N]) -> io::Result<()> {
    steps.into_iter().find(Result::is_err).unwrap_or(Ok(()))
}

impl TermDisplay {
    /// Draw the startup summary until Esc/Enter/q; any other key rings the bell
    fn summary_loop(
        &self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        cfg: &BootstrapConfig,
        sound: &mut dyn Sound,
    ) -> io::Result<()> {
        let rows = session_lines(cfg);
        let label_w = rows.iter().map(|(l, _)| l.width()).max().unwrap_or(0);
        let value_w = rows.iter().map(|(_, v)| v.width()).max().unwrap_or(0);
        let accent = Style::default().fg(self.colors.accent()).add_modifier(Modifier::BOLD);
        let title = format!("vaultgate ready ({})", self.colors.label());

        loop {
            terminal.draw(|f| {
                let size = f.size();
                let mut lines: Vec<Spans> = rows
                    .iter()
                    .map(|(label, value)| {
                        let pad = " ".repeat(label_w - label.width());
                        Spans::from(vec![
                            Span::styled(format!("{}{}", label, pad), accent),
                            Span::raw("  "),
                            Span::raw(value.as_str()),
                        ])
                    })
                    .collect();
                lines.push(Spans::from(Span::raw("")));
                lines.push(Spans::from(Span::styled(
                    "Esc: continue",
                    Style::default().fg(Color::Gray),
                )));

                // borders + padding around the widest row
                let w = (label_w + value_w + 6).min(size.width as usize) as u16;
                let h = (lines.len() + 2).min(size.height as usize) as u16;
                let area = center_rect(w, h, size);
                let panel = Paragraph::new(Text::from(lines))
                    .block(Block::default().borders(Borders::ALL).title(title.as_str()))
                    .alignment(Alignment::Left);
                f.render_widget(Clear, size);
                f.render_widget(panel, area);
            })?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => return Ok(()),
                    _ => sound.bell(),
                }
            }
        }
    }
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
