use ratatui::style::Color;

/// A named color palette for the whole UI.
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub chip_fg: Color,
  pub chip_bg: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "slate",
    bg: Color::Rgb(24, 26, 32),
    fg: Color::Rgb(214, 219, 230),
    muted: Color::Rgb(120, 128, 144),
    accent: Color::Rgb(122, 162, 247),
    border: Color::Rgb(58, 63, 76),
    status: Color::Rgb(158, 206, 106),
    error: Color::Rgb(247, 118, 142),
    highlight_fg: Color::Rgb(24, 26, 32),
    highlight_bg: Color::Rgb(122, 162, 247),
    stripe_bg: Color::Rgb(30, 33, 41),
    chip_fg: Color::Rgb(24, 26, 32),
    chip_bg: Color::Rgb(125, 207, 255),
    key_fg: Color::Rgb(24, 26, 32),
    key_bg: Color::Rgb(120, 128, 144),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(250, 246, 237),
    fg: Color::Rgb(56, 52, 46),
    muted: Color::Rgb(146, 138, 125),
    accent: Color::Rgb(175, 82, 51),
    border: Color::Rgb(212, 203, 186),
    status: Color::Rgb(92, 128, 82),
    error: Color::Rgb(186, 57, 57),
    highlight_fg: Color::Rgb(250, 246, 237),
    highlight_bg: Color::Rgb(175, 82, 51),
    stripe_bg: Color::Rgb(243, 237, 225),
    chip_fg: Color::Rgb(250, 246, 237),
    chip_bg: Color::Rgb(122, 113, 166),
    key_fg: Color::Rgb(250, 246, 237),
    key_bg: Color::Rgb(146, 138, 125),
  },
  Theme {
    name: "mono",
    bg: Color::Black,
    fg: Color::Gray,
    muted: Color::DarkGray,
    accent: Color::White,
    border: Color::DarkGray,
    status: Color::Gray,
    error: Color::White,
    highlight_fg: Color::Black,
    highlight_bg: Color::Gray,
    stripe_bg: Color::Black,
    chip_fg: Color::Black,
    chip_bg: Color::Gray,
    key_fg: Color::Black,
    key_bg: Color::DarkGray,
  },
];
