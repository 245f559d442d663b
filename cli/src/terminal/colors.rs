use colored::Color;

pub const PRIMARY: Color = Color::TrueColor {
    r: 0x7d,
    g: 0xcf,
    b: 0xff,
};
pub const ACCENT: Color = Color::BrightGreen;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_ADDR: Color = Color::BrightBlue;
pub const IPV4_PREFIX: Color = Color::Blue;
pub const IPV6_ADDR: Color = Color::Cyan;
pub const MAC_ADDR: Color = Color::Yellow;
pub const PORT_OPEN: Color = Color::Green;
