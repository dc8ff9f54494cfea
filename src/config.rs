use ratatui::style::Color;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub colors: ColorConfig,
    pub layout: LayoutConfig,
    pub keybindings: KeybindingConfig,
}

#[derive(Debug, Clone)]
pub struct ColorConfig {
    pub active_border: Color,
    pub inactive_border: Color,
    pub focused_row: Color,
    pub directory: Color,
    pub compressed_object: Color,
    pub selected_marker: Color,
    pub warning: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Rows per display page of the object table.
    pub page_size: usize,
    pub file_panel_width: u16,
    pub show_savings_column: bool,
}

#[derive(Debug, Clone)]
pub struct KeybindingConfig {
    pub quit: char,
    pub search: char,
    pub refresh: char,
    pub toggle_selection: char,
    pub select_all: char,
    pub cycle_compression: char,
    pub sort_name: char,
    pub sort_size: char,
    pub sort_modified: char,
    pub previous_page: char,
    pub next_page: char,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            active_border: Color::Yellow,
            inactive_border: Color::White,
            focused_row: Color::DarkGray,
            directory: Color::Blue,
            compressed_object: Color::Cyan,
            selected_marker: Color::Green,
            warning: Color::Yellow,
            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            file_panel_width: 48,
            show_savings_column: true,
        }
    }
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            quit: 'q',
            search: '/',
            refresh: 'r',
            toggle_selection: 'x',
            select_all: 'a',
            cycle_compression: 'c',
            sort_name: 'n',
            sort_size: 's',
            sort_modified: 'm',
            previous_page: '[',
            next_page: ']',
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::default()
    }
}
