//! Text rendering
//!
//! Formatting is a chain of small decorators around anything that renders to
//! text. `Code("dns").bold().list_item(1)` renders as `  - **`dns`**` in
//! Markdown and as an indented, bold, colored line on a terminal.

use std::fmt;
use std::str::FromStr;

use colored::Colorize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    Markdown,
    /// Terminal escape codes. Colors are dropped when stdout is not a terminal.
    Ansi,
    Plain,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Markdown => write!(f, "markdown"),
            Style::Ansi => write!(f, "ansi"),
            Style::Plain => write!(f, "plain"),
        }
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Style::Markdown),
            "ansi" | "color" => Ok(Style::Ansi),
            "plain" | "text" => Ok(Style::Plain),
            other => Err(format!("unknown report style '{}'", other)),
        }
    }
}

pub trait Render {
    fn render(&self, style: Style) -> String;
}

impl Render for str {
    fn render(&self, _style: Style) -> String {
        self.to_string()
    }
}

impl Render for String {
    fn render(&self, _style: Style) -> String {
        self.clone()
    }
}

impl<R: Render + ?Sized> Render for &R {
    fn render(&self, style: Style) -> String {
        (**self).render(style)
    }
}

#[derive(Debug, Clone)]
pub struct Bold<R>(pub R);

impl<R: Render> Render for Bold<R> {
    fn render(&self, style: Style) -> String {
        let inner = self.0.render(style);
        match style {
            Style::Markdown => format!("**{}**", inner),
            Style::Ansi => Colorize::bold(inner.as_str()).to_string(),
            Style::Plain => inner,
        }
    }
}

/// Inline code: a value, an identifier, a URL
#[derive(Debug, Clone)]
pub struct Code<R>(pub R);

impl<R: Render> Render for Code<R> {
    fn render(&self, style: Style) -> String {
        let inner = self.0.render(style);
        match style {
            Style::Markdown => format!("`{}`", inner),
            Style::Ansi => Colorize::cyan(inner.as_str()).to_string(),
            Style::Plain => inner,
        }
    }
}

/// Bullet indented two spaces per level
#[derive(Debug, Clone)]
pub struct ListItem<R> {
    pub inner: R,
    pub depth: usize,
}

impl<R: Render> Render for ListItem<R> {
    fn render(&self, style: Style) -> String {
        let indent = "  ".repeat(self.depth);
        let bullet = match style {
            Style::Ansi => "•",
            Style::Markdown | Style::Plain => "-",
        };
        format!("{}{} {}", indent, bullet, self.inner.render(style))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Bad,
    Notice,
}

/// Terminal-only color; other styles render the inner text unchanged
#[derive(Debug, Clone)]
pub struct Tinted<R> {
    pub inner: R,
    pub tone: Tone,
}

impl<R: Render> Render for Tinted<R> {
    fn render(&self, style: Style) -> String {
        let inner = self.inner.render(style);
        if style != Style::Ansi {
            return inner;
        }
        match self.tone {
            Tone::Good => Colorize::green(inner.as_str()).to_string(),
            Tone::Bad => Colorize::red(inner.as_str()).to_string(),
            Tone::Notice => Colorize::yellow(inner.as_str()).to_string(),
        }
    }
}

pub trait RenderExt: Render + Sized {
    fn bold(self) -> Bold<Self> {
        Bold(self)
    }

    fn code(self) -> Code<Self> {
        Code(self)
    }

    fn list_item(self, depth: usize) -> ListItem<Self> {
        ListItem { inner: self, depth }
    }

    fn tinted(self, tone: Tone) -> Tinted<Self> {
        Tinted { inner: self, tone }
    }
}

impl<R: Render> RenderExt for R {}

/// Render lines joined by newlines, with a trailing newline
pub fn render_lines<R: Render>(lines: &[R], style: Style) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.render(style));
        out.push('\n');
    }
    out
}
