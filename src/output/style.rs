//! Table style configuration
//!
//! A YAML style file describes box characters, colors, text case and layout
//! toggles. Tokens are validated when the file is loaded.

use crate::error::{Error, Result};
use comfy_table::presets::{ASCII_FULL_CONDENSED, UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::{Attribute, Cell, Color, Table, TableComponent};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

// ============================================================================
// YAML shape
// ============================================================================

/// Table style as read from a style file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub name: String,
    #[serde(rename = "box")]
    pub box_style: BoxStyle,
    pub color: ColorOptions,
    pub format: FormatOptions,
    pub options: StyleOptions,
    pub title: TitleOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BoxStyle {
    pub bottom_left: String,
    pub bottom_right: String,
    pub bottom_separator: String,
    pub left: String,
    pub left_separator: String,
    pub middle_horizontal: String,
    pub middle_separator: String,
    pub middle_vertical: String,
    pub right: String,
    pub right_separator: String,
    pub top_left: String,
    pub top_right: String,
    pub top_separator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ColorOptions {
    pub index_column: Vec<String>,
    pub footer: Vec<String>,
    pub header: Vec<String>,
    pub row: Vec<String>,
    pub row_alternate: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub footer: String,
    pub header: String,
    pub row: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StyleOptions {
    pub draw_border: bool,
    pub separate_columns: bool,
    pub separate_footer: bool,
    pub separate_header: bool,
    pub separate_rows: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleOptions {
    pub align: String,
    pub colors: Vec<String>,
    pub format: String,
}

// ============================================================================
// Tokens
// ============================================================================

/// One entry of a color list
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorToken {
    Reset,
    Attr(Attribute),
    Fg(Color),
    Bg(Color),
}

fn base_color(name: &str, bright: bool) -> Option<Color> {
    let color = match (name, bright) {
        ("black", false) => Color::Black,
        ("black", true) => Color::DarkGrey,
        ("red", false) => Color::DarkRed,
        ("red", true) => Color::Red,
        ("green", false) => Color::DarkGreen,
        ("green", true) => Color::Green,
        ("yellow", false) => Color::DarkYellow,
        ("yellow", true) => Color::Yellow,
        ("blue", false) => Color::DarkBlue,
        ("blue", true) => Color::Blue,
        ("magenta", false) => Color::DarkMagenta,
        ("magenta", true) => Color::Magenta,
        ("cyan", false) => Color::DarkCyan,
        ("cyan", true) => Color::Cyan,
        ("white", false) => Color::Grey,
        ("white", true) => Color::White,
        _ => return None,
    };
    Some(color)
}

impl FromStr for ColorToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim().to_ascii_lowercase();
        let parsed = match token.as_str() {
            "reset" => Some(Self::Reset),
            "bold" => Some(Self::Attr(Attribute::Bold)),
            "faint" => Some(Self::Attr(Attribute::Dim)),
            "italic" => Some(Self::Attr(Attribute::Italic)),
            "underline" => Some(Self::Attr(Attribute::Underlined)),
            "blink-slow" => Some(Self::Attr(Attribute::SlowBlink)),
            "blink-rapid" => Some(Self::Attr(Attribute::RapidBlink)),
            "reverse-video" => Some(Self::Attr(Attribute::Reverse)),
            "concealed" => Some(Self::Attr(Attribute::Hidden)),
            "crossed-out" => Some(Self::Attr(Attribute::CrossedOut)),
            t => {
                if let Some(name) = t.strip_prefix("fg-hi-") {
                    base_color(name, true).map(Self::Fg)
                } else if let Some(name) = t.strip_prefix("bg-hi-") {
                    base_color(name, true).map(Self::Bg)
                } else if let Some(name) = t.strip_prefix("fg-") {
                    base_color(name, false).map(Self::Fg)
                } else if let Some(name) = t.strip_prefix("bg-") {
                    base_color(name, false).map(Self::Bg)
                } else {
                    None
                }
            }
        };
        parsed.ok_or_else(|| Error::invalid_value("color", format!("unknown color '{s}'")))
    }
}

/// Text case transform for header, row or footer cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextCase {
    #[default]
    Default,
    Lower,
    Upper,
    Title,
}

impl FromStr for TextCase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "default" => Ok(Self::Default),
            "lower" => Ok(Self::Lower),
            "upper" => Ok(Self::Upper),
            "title" => Ok(Self::Title),
            other => Err(Error::invalid_value("format", format!("unknown format '{other}'"))),
        }
    }
}

impl TextCase {
    pub fn apply(self, s: &str) -> String {
        match self {
            Self::Default => s.to_string(),
            Self::Lower => s.to_lowercase(),
            Self::Upper => s.to_uppercase(),
            Self::Title => crate::template::title_case(s),
        }
    }
}

fn validate_align(align: &str) -> Result<()> {
    match align.trim() {
        "" | "default" | "left" | "right" | "center" | "justify" => Ok(()),
        other => Err(Error::invalid_value("title.align", format!("unknown align '{other}'"))),
    }
}

fn parse_colors(field: &str, tokens: &[String]) -> Result<Vec<ColorToken>> {
    tokens
        .iter()
        .map(|t| t.parse())
        .collect::<Result<Vec<_>>>()
        .map_err(|e| Error::invalid_value(format!("color.{field}"), e.to_string()))
}

// ============================================================================
// Resolved style
// ============================================================================

/// A validated style ready to apply to a `comfy_table::Table`
#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    preset: &'static str,
    round_corners: bool,
    custom: Option<StyleConfig>,
    header_colors: Vec<ColorToken>,
    row_colors: Vec<ColorToken>,
    row_alternate_colors: Vec<ColorToken>,
    index_column_colors: Vec<ColorToken>,
    header_case: TextCase,
    row_case: TextCase,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self::preset(ASCII_FULL_CONDENSED)
    }
}

impl TableStyle {
    fn preset(preset: &'static str) -> Self {
        Self {
            preset,
            round_corners: false,
            custom: None,
            header_colors: Vec::new(),
            row_colors: Vec::new(),
            row_alternate_colors: Vec::new(),
            index_column_colors: Vec::new(),
            header_case: TextCase::Default,
            row_case: TextCase::Default,
        }
    }

    /// Names accepted by [`TableStyle::named`]
    pub const NAMES: &'static [&'static str] = &["default", "ascii", "light", "rounded", "full"];

    /// A built-in style; unknown names fall back to the default with a warning
    pub fn named(name: &str) -> Self {
        match name {
            "" | "default" | "ascii" => Self::default(),
            "light" => Self::preset(UTF8_FULL_CONDENSED),
            "full" => Self::preset(UTF8_FULL),
            "rounded" => Self {
                round_corners: true,
                ..Self::preset(UTF8_FULL_CONDENSED)
            },
            other => {
                warn!(style = other, "Table style not found, using default");
                Self::default()
            }
        }
    }

    /// Build from a parsed style file
    pub fn from_config(config: StyleConfig) -> Result<Self> {
        let header_case: TextCase = config.format.header.parse()?;
        let row_case: TextCase = config.format.row.parse()?;
        let _footer_case: TextCase = config.format.footer.parse()?;
        let _title_case: TextCase = config.title.format.parse()?;
        validate_align(&config.title.align)?;
        parse_colors("footer", &config.color.footer)?;
        parse_colors("title", &config.title.colors)?;

        let mut style = Self::named(&config.name);
        style.header_colors = parse_colors("header", &config.color.header)?;
        style.row_colors = parse_colors("row", &config.color.row)?;
        style.row_alternate_colors = parse_colors("row-alternate", &config.color.row_alternate)?;
        style.index_column_colors = parse_colors("index-column", &config.color.index_column)?;
        style.header_case = header_case;
        style.row_case = row_case;
        style.custom = Some(config);
        Ok(style)
    }

    /// Parse a YAML style document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: StyleConfig = serde_yaml::from_str(content)?;
        Self::from_config(config)
    }

    /// Load a YAML style file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Whether any cell styling is configured
    pub fn has_colors(&self) -> bool {
        !(self.header_colors.is_empty()
            && self.row_colors.is_empty()
            && self.row_alternate_colors.is_empty()
            && self.index_column_colors.is_empty())
    }

    /// Apply box characters and layout toggles
    pub fn apply(&self, table: &mut Table) {
        table.load_preset(self.preset);
        if self.round_corners {
            table.apply_modifier(UTF8_ROUND_CORNERS);
        }
        if self.has_colors() {
            table.enforce_styling();
        } else {
            table.force_no_tty();
        }
        let Some(custom) = &self.custom else {
            return;
        };

        let b = &custom.box_style;
        let chars: [(&str, &[TableComponent]); 10] = [
            (&b.top_left, &[TableComponent::TopLeftCorner]),
            (&b.top_right, &[TableComponent::TopRightCorner]),
            (&b.bottom_left, &[TableComponent::BottomLeftCorner]),
            (&b.bottom_right, &[TableComponent::BottomRightCorner]),
            (&b.left, &[TableComponent::LeftBorder]),
            (&b.right, &[TableComponent::RightBorder]),
            (
                &b.middle_horizontal,
                &[
                    TableComponent::TopBorder,
                    TableComponent::BottomBorder,
                    TableComponent::HeaderLines,
                    TableComponent::HorizontalLines,
                ],
            ),
            (&b.middle_vertical, &[TableComponent::VerticalLines]),
            (
                &b.middle_separator,
                &[
                    TableComponent::MiddleIntersections,
                    TableComponent::MiddleHeaderIntersections,
                ],
            ),
            (
                &b.top_separator,
                &[TableComponent::TopBorderIntersections],
            ),
        ];
        for (value, components) in chars {
            if let Some(c) = value.chars().next() {
                for component in components {
                    table.set_style(*component, c);
                }
            }
        }
        for (value, components) in [
            (
                &b.left_separator,
                [
                    TableComponent::LeftBorderIntersections,
                    TableComponent::LeftHeaderIntersection,
                ],
            ),
            (
                &b.right_separator,
                [
                    TableComponent::RightBorderIntersections,
                    TableComponent::RightHeaderIntersection,
                ],
            ),
        ] {
            if let Some(c) = value.chars().next() {
                for component in components {
                    table.set_style(component, c);
                }
            }
        }
        if let Some(c) = b.bottom_separator.chars().next() {
            table.set_style(TableComponent::BottomBorderIntersections, c);
        }

        let o = &custom.options;
        if !o.draw_border {
            for component in [
                TableComponent::TopLeftCorner,
                TableComponent::TopRightCorner,
                TableComponent::BottomLeftCorner,
                TableComponent::BottomRightCorner,
                TableComponent::TopBorder,
                TableComponent::BottomBorder,
                TableComponent::LeftBorder,
                TableComponent::RightBorder,
                TableComponent::TopBorderIntersections,
                TableComponent::BottomBorderIntersections,
                TableComponent::LeftBorderIntersections,
                TableComponent::RightBorderIntersections,
                TableComponent::LeftHeaderIntersection,
                TableComponent::RightHeaderIntersection,
            ] {
                table.remove_style(component);
            }
        }
        if !o.separate_columns {
            for component in [
                TableComponent::VerticalLines,
                TableComponent::MiddleIntersections,
                TableComponent::MiddleHeaderIntersections,
                TableComponent::TopBorderIntersections,
                TableComponent::BottomBorderIntersections,
            ] {
                table.remove_style(component);
            }
        }
        if !o.separate_header {
            for component in [
                TableComponent::HeaderLines,
                TableComponent::MiddleHeaderIntersections,
                TableComponent::LeftHeaderIntersection,
                TableComponent::RightHeaderIntersection,
            ] {
                table.remove_style(component);
            }
        }
        if !o.separate_rows {
            for component in [
                TableComponent::HorizontalLines,
                TableComponent::MiddleIntersections,
                TableComponent::LeftBorderIntersections,
                TableComponent::RightBorderIntersections,
            ] {
                table.remove_style(component);
            }
        }
    }

    /// A header cell with case and colors applied
    pub fn header_cell(&self, text: &str) -> Cell {
        style_cell(Cell::new(self.header_case.apply(text)), &self.header_colors)
    }

    /// A body cell with case and colors applied
    pub fn row_cell(&self, text: &str, row_index: usize, column_index: usize) -> Cell {
        let colors = if column_index == 0 && !self.index_column_colors.is_empty() {
            &self.index_column_colors
        } else if row_index % 2 == 1 && !self.row_alternate_colors.is_empty() {
            &self.row_alternate_colors
        } else {
            &self.row_colors
        };
        style_cell(Cell::new(self.row_case.apply(text)), colors)
    }
}

fn style_cell(cell: Cell, colors: &[ColorToken]) -> Cell {
    colors.iter().fold(cell, |cell, token| match token {
        ColorToken::Reset => cell,
        ColorToken::Attr(attr) => cell.add_attribute(*attr),
        ColorToken::Fg(color) => cell.fg(*color),
        ColorToken::Bg(color) => cell.bg(*color),
    })
}
