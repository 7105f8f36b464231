//! Terminal output: labels, colours, tables, spinners.
//!
//! # No-color detection (in priority order):
//! 1. `--no-color` CLI flag (highest priority)
//! 2. `NO_COLOR` environment variable (any value)
//! 3. `TERM=dumb` environment variable
//! 4. Non-TTY stdout (detected via anstream)

use anstream::{eprintln, println};
use anstyle::{AnsiColor, Color, Style};
use clap::ValueEnum;
use comfy_table::{Cell, ContentArrangement, Table, presets};
use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::io::IsTerminal;
use std::time::Duration;

/// Color mode for output
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always emit ANSI colors
    Always,
    /// Emit colors only if TTY and not disabled
    #[default]
    Auto,
    /// Never emit ANSI colors
    Never,
}

/// UI context holding resolved display settings
#[derive(Debug, Clone)]
pub struct Ui {
    /// Whether colors are enabled
    pub color_enabled: bool,
    /// Whether spinners are enabled (requires TTY + color)
    pub spinner_enabled: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(ColorMode::Auto, false)
    }
}

impl Ui {
    pub fn new(mode: ColorMode, force_no_color: bool) -> Self {
        let color_enabled = Self::resolve_color(mode, force_no_color);
        let spinner_enabled = color_enabled && std::io::stderr().is_terminal();

        if !color_enabled {
            anstream::ColorChoice::write_global(anstream::ColorChoice::Never);
        }

        Self {
            color_enabled,
            spinner_enabled,
        }
    }

    fn resolve_color(mode: ColorMode, force_no_color: bool) -> bool {
        if force_no_color {
            return false;
        }

        // NO_COLOR env var (any value disables color)
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
            return false;
        }

        match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }

    // -------------------------------------------------------------------------
    // Styled label helpers
    // -------------------------------------------------------------------------

    fn style_label(&self, color: AnsiColor) -> Style {
        if self.color_enabled {
            Style::new().fg_color(Some(Color::Ansi(color))).bold()
        } else {
            Style::new()
        }
    }

    /// Print OK label (green) with message to stdout
    pub fn ok(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Green);
        println!("{label}OK{label:#} {}", msg.as_ref());
    }

    /// Print WARN label (yellow) with message to stderr
    pub fn warn(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Yellow);
        eprintln!("{label}WARN{label:#} {}", msg.as_ref());
    }

    /// Print ERROR label (red) with message to stderr
    pub fn err(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Red);
        eprintln!("{label}ERROR{label:#} {}", msg.as_ref());
    }

    /// Print INFO label (cyan) with message to stdout
    pub fn info(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Cyan);
        println!("{label}INFO{label:#} {}", msg.as_ref());
    }

    /// Print an error and its cause chain to stderr
    pub fn report(&self, error: &anyhow::Error) {
        self.err(error.to_string());
        for cause in error.chain().skip(1) {
            eprintln!("  {} {}", self.dim("caused by:"), cause);
        }
    }

    /// Return a styled string (dimmed/gray) - for inline use
    pub fn dim(&self, s: impl AsRef<str>) -> String {
        self.paint(s, Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
    }

    /// Return a styled string (bold) - for inline use
    pub fn bold(&self, s: impl AsRef<str>) -> String {
        self.paint(s, Style::new().bold())
    }

    /// Return a styled string with specific color - for inline use
    pub fn colored(&self, s: impl AsRef<str>, color: AnsiColor) -> String {
        self.paint(s, Style::new().fg_color(Some(Color::Ansi(color))))
    }

    fn paint(&self, s: impl AsRef<str>, style: Style) -> String {
        if self.color_enabled {
            format!("{style}{}{style:#}", s.as_ref())
        } else {
            s.as_ref().to_string()
        }
    }

    // -------------------------------------------------------------------------
    // Status icons (with fallback for no-color)
    // -------------------------------------------------------------------------

    pub fn icon_ok(&self) -> &'static str {
        if self.color_enabled { "✓" } else { "[OK]" }
    }

    pub fn icon_warn(&self) -> &'static str {
        if self.color_enabled { "⚠" } else { "[!]" }
    }

    pub fn icon_err(&self) -> &'static str {
        if self.color_enabled { "✗" } else { "[X]" }
    }

    pub fn icon_info(&self) -> &'static str {
        if self.color_enabled { "•" } else { "-" }
    }

    // -------------------------------------------------------------------------
    // Tables (comfy-table)
    // -------------------------------------------------------------------------

    /// Bordered table
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);

        if self.color_enabled {
            table.load_preset(presets::UTF8_FULL_CONDENSED);
        } else {
            table.load_preset(presets::ASCII_MARKDOWN);
        }

        table
    }

    /// Table without borders (for lists and key/value blocks)
    pub fn simple_table(&self) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.load_preset(presets::NOTHING);
        table
    }

    pub fn cell(&self, content: impl Into<String>) -> Cell {
        Cell::new(content.into())
    }

    /// Header cell (bold when color enabled)
    pub fn header_cell(&self, content: impl Into<String>) -> Cell {
        let cell = Cell::new(content.into());
        if self.color_enabled {
            cell.add_attribute(comfy_table::Attribute::Bold)
        } else {
            cell
        }
    }

    /// Colored cell using comfy-table's native styling
    /// This avoids ANSI width calculation issues
    pub fn colored_cell(&self, content: impl Into<String>, color: AnsiColor) -> Cell {
        let cell = Cell::new(content.into());
        if self.color_enabled {
            cell.fg(ansi_to_comfy_color(color))
        } else {
            cell
        }
    }

    // -------------------------------------------------------------------------
    // Spinners (indicatif)
    // -------------------------------------------------------------------------

    /// Spinner on stderr; a hidden no-op bar when disabled
    pub fn spinner(&self, message: impl Into<Cow<'static, str>>) -> ProgressBar {
        let pb = if self.spinner_enabled {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
            {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message);
        pb
    }

    /// Finish a spinner with a success message
    pub fn spinner_finish_ok(&self, pb: &ProgressBar, msg: impl Into<Cow<'static, str>>) {
        pb.finish_and_clear();
        self.ok(msg.into());
    }

    /// Clear a spinner without printing; the caller reports the failure
    pub fn spinner_abandon(&self, pb: &ProgressBar) {
        pb.finish_and_clear();
    }

    // -------------------------------------------------------------------------
    // Println helpers (using anstream for proper tty handling)
    // -------------------------------------------------------------------------

    pub fn println(&self, msg: impl AsRef<str>) {
        println!("{}", msg.as_ref());
    }

    pub fn newline(&self) {
        println!();
    }

    pub fn section(&self, title: impl AsRef<str>) {
        println!("{}", self.bold(title));
    }
}

fn ansi_to_comfy_color(color: AnsiColor) -> comfy_table::Color {
    match color {
        AnsiColor::Black => comfy_table::Color::Black,
        AnsiColor::Red | AnsiColor::BrightRed => comfy_table::Color::Red,
        AnsiColor::Green | AnsiColor::BrightGreen => comfy_table::Color::Green,
        AnsiColor::Yellow | AnsiColor::BrightYellow => comfy_table::Color::Yellow,
        AnsiColor::Blue | AnsiColor::BrightBlue => comfy_table::Color::Blue,
        AnsiColor::Magenta | AnsiColor::BrightMagenta => comfy_table::Color::Magenta,
        AnsiColor::Cyan | AnsiColor::BrightCyan => comfy_table::Color::Cyan,
        AnsiColor::White | AnsiColor::BrightWhite => comfy_table::Color::White,
        AnsiColor::BrightBlack => comfy_table::Color::DarkGrey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode_parse() {
        assert_eq!(ColorMode::from_str("always", true).unwrap(), ColorMode::Always);
        assert_eq!(ColorMode::from_str("auto", true).unwrap(), ColorMode::Auto);
        assert_eq!(ColorMode::from_str("NEVER", true).unwrap(), ColorMode::Never);
        assert!(ColorMode::from_str("sometimes", true).is_err());
    }

    #[test]
    fn test_ui_force_no_color() {
        let ui = Ui::new(ColorMode::Always, true);
        assert!(!ui.color_enabled);
        assert!(!ui.spinner_enabled);
    }

    #[test]
    fn test_plain_styling_without_color() {
        let ui = Ui::new(ColorMode::Never, false);
        assert_eq!(ui.dim("test"), "test");
        assert_eq!(ui.bold("test"), "test");
        assert_eq!(ui.colored("test", AnsiColor::Red), "test");
        assert_eq!(ui.icon_ok(), "[OK]");
        assert_eq!(ui.icon_err(), "[X]");
        assert_eq!(ui.icon_warn(), "[!]");
    }

    #[test]
    fn test_hidden_spinner_when_disabled() {
        let ui = Ui::new(ColorMode::Never, false);
        let pb = ui.spinner("switching");
        assert!(pb.is_hidden());
        ui.spinner_abandon(&pb);
    }
}
