//! Style roles for CLI output
//!
//! Output code asks for a role (`Header`, `Key`, ...) rather than a colour.
//! Colour is only applied when the caller passes `enabled`, so there is no
//! global colour switch to keep in sync.
//!
//! ```
//! use plugin_updater::core::styles::StyleRole;
//! assert_eq!(StyleRole::Header.paint("Versions", false), "Versions");
//! let painted = StyleRole::Header.paint("Versions", true);
//! assert!(painted.starts_with("\x1b[33m"));
//! assert!(painted.ends_with("\x1b[0m"));
//! ```

use clap::builder::styling::{AnsiColor, Color as ClapColor, Style};
use colored::Color;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StyleRole {
    Header,
    Literal,
    Placeholder,
    Valid,
    Invalid,
    Error,
    Key,
    Value,
    Dim,
}

/// One palette entry: colour, SGR foreground code, clap colour, prettytable letter
struct Swatch {
    color: Color,
    sgr: u8,
    clap: AnsiColor,
    table: char,
}

const fn swatch(color: Color, sgr: u8, clap: AnsiColor, table: char) -> Swatch {
    Swatch {
        color,
        sgr,
        clap,
        table,
    }
}

impl StyleRole {
    fn swatch(self) -> Option<Swatch> {
        Some(match self {
            StyleRole::Header => swatch(Color::Yellow, 33, AnsiColor::Yellow, 'y'),
            StyleRole::Literal => swatch(Color::Cyan, 36, AnsiColor::Cyan, 'c'),
            StyleRole::Placeholder | StyleRole::Valid => {
                swatch(Color::Green, 32, AnsiColor::Green, 'g')
            }
            StyleRole::Invalid => swatch(Color::Red, 31, AnsiColor::Red, 'r'),
            StyleRole::Error => swatch(Color::BrightRed, 91, AnsiColor::BrightRed, 'R'),
            StyleRole::Key => swatch(Color::BrightGreen, 92, AnsiColor::BrightGreen, 'G'),
            StyleRole::Dim => swatch(Color::BrightBlack, 90, AnsiColor::BrightBlack, 'K'),
            StyleRole::Value => return None,
        })
    }

    pub fn color(self) -> Option<Color> {
        self.swatch().map(|s| s.color)
    }

    pub fn ansi_code(self) -> Option<String> {
        self.swatch().map(|s| s.sgr.to_string())
    }

    pub fn paint(self, text: &str, enabled: bool) -> String {
        match self.swatch() {
            Some(s) if enabled => format!("\x1b[{}m{}\x1b[0m", s.sgr, text),
            _ => text.to_string(),
        }
    }

    /// prettytable `style_spec` for this role (foreground only)
    pub fn to_prettytable_spec(self) -> Option<String> {
        self.swatch().map(|s| format!("F{}", s.table))
    }

    fn clap_style(self, bold: bool) -> Style {
        let style = Style::new().fg_color(self.swatch().map(|s| ClapColor::Ansi(s.clap)));
        if bold {
            style.bold()
        } else {
            style
        }
    }
}

/// Build clap Styles for help output from the style roles
pub fn palette_to_clap(enabled: bool) -> clap::builder::Styles {
    if !enabled {
        return clap::builder::Styles::plain();
    }
    clap::builder::Styles::styled()
        .header(StyleRole::Header.clap_style(true))
        .usage(StyleRole::Header.clap_style(true))
        .literal(StyleRole::Literal.clap_style(false))
        .placeholder(StyleRole::Placeholder.clap_style(false))
        .valid(StyleRole::Valid.clap_style(false))
        .invalid(StyleRole::Invalid.clap_style(false))
        .error(StyleRole::Error.clap_style(true))
}
