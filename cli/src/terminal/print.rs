use std::fmt::Display;

use colored::*;
use tracing::info;

use crate::terminal::colors;
use crate::terminal::format::Detail;
use crate::terminal::logging::PRINT_TARGET;

pub const TOTAL_WIDTH: usize = 64;
const KEY_WIDTH: usize = 7;

/// Values that may already carry their own color.
pub trait WithDefaultColor {
    fn with_default(self, default_color: Color) -> ColoredString;
}

impl WithDefaultColor for &str {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for String {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for ColoredString {
    fn with_default(self, _default_color: Color) -> ColoredString {
        self
    }
}

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn blank() {
    print("");
}

/// `text` framed by `fill` on both sides, `text_width` visible columns wide.
fn framed(text: impl Display, text_width: usize, fill: &str) -> String {
    let pad = TOTAL_WIDTH.saturating_sub(text_width);
    let left = fill.repeat(pad / 2).bright_black();
    let right = fill.repeat(pad - pad / 2).bright_black();
    format!("{left}{text}{right}")
}

/// Key padded with dots up to `width`, followed by a colon.
fn dotted_key(key: &str, width: usize, key_color: Color) -> String {
    let dots = ".".repeat(width.saturating_sub(key.chars().count()));
    format!(
        "{}{}{}",
        key.color(key_color),
        dots.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR)
    )
}

pub fn banner(no_banner: bool) {
    if no_banner {
        return;
    }
    let text = format!("⟦ ASSETR v{} ⟧", env!("CARGO_PKG_VERSION"));
    let width = text.chars().count();
    print(&framed(text.bright_green().bold(), width, "═"));
}

pub fn header(msg: &str) {
    let text = format!("⟦ {} ⟧", msg.to_uppercase());
    let width = text.chars().count();
    print(&framed(text.bright_green(), width, "─"));
}

pub fn fat_separator() {
    print(&"═".repeat(TOTAL_WIDTH).bright_black().to_string());
}

pub fn aligned_line<V>(key: &str, value: V)
where
    V: Display + WithDefaultColor,
{
    let key = dotted_key(key, KEY_WIDTH + 1, colors::PRIMARY);
    let value = value.with_default(colors::TEXT_DEFAULT);
    print_status(format!("{key} {value}"));
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    print(&format!(
        "{} {}",
        ">".color(colors::SEPARATOR),
        msg.as_ref().color(colors::TEXT_DEFAULT)
    ));
}

pub fn tree_head(idx: usize, name: &str) {
    print(&format!(
        "{}{}{} {}",
        "[".color(colors::SEPARATOR),
        idx.to_string().color(colors::ACCENT),
        "]".color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    ));
}

pub fn as_tree_one_level(details: Vec<Detail>) {
    let last = details.len().saturating_sub(1);
    for (i, (key, value)) in details.into_iter().enumerate() {
        let branch = if i == last { "└─" } else { "├─" };
        let key = dotted_key(&key, KEY_WIDTH, colors::TEXT_DEFAULT);
        print(&format!(" {} {key} {value}", branch.bright_black()));
    }
}

/// Centers `msg`, whose visible width is `plain_width` columns.
pub fn centerln(msg: &str, plain_width: usize) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(plain_width) / 2);
    print(&format!("{space}{msg}"));
}

pub fn no_results() {
    print(&"no live hosts found".red().bold().to_string());
}
