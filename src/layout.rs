use std::fmt;

pub const LAYOUT_MODE_KEY: &str = "trend_radar_layout_mode";

/// Windows narrower than this render the mobile presentation in `Auto` mode.
pub const DESKTOP_BREAKPOINT: f32 = 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Auto,
    Desktop,
    Mobile,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 3] = [LayoutMode::Auto, LayoutMode::Desktop, LayoutMode::Mobile];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Auto => "auto",
            LayoutMode::Desktop => "desktop",
            LayoutMode::Mobile => "mobile",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(LayoutMode::Auto),
            "desktop" => Some(LayoutMode::Desktop),
            "mobile" => Some(LayoutMode::Mobile),
            _ => None,
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LayoutMode::Auto => "自動",
            LayoutMode::Desktop => "桌面",
            LayoutMode::Mobile => "行動",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Desktop,
    Mobile,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPlan {
    pub presentation: Presentation,
    /// Input panel sits beside the report instead of above it.
    pub side_panel: bool,
    pub force_columns: usize,
    pub stock_columns: usize,
    pub title_size: f32,
    pub body_size: f32,
    pub padding: f32,
}

pub fn resolve(mode: LayoutMode, window_width: f32) -> RenderPlan {
    let presentation = match mode {
        LayoutMode::Desktop => Presentation::Desktop,
        LayoutMode::Mobile => Presentation::Mobile,
        LayoutMode::Auto if window_width >= DESKTOP_BREAKPOINT => Presentation::Desktop,
        LayoutMode::Auto => Presentation::Mobile,
    };

    match presentation {
        Presentation::Desktop => RenderPlan {
            presentation,
            side_panel: true,
            force_columns: 2,
            stock_columns: 2,
            title_size: 34.0,
            body_size: 16.0,
            padding: 24.0,
        },
        Presentation::Mobile => RenderPlan {
            presentation,
            side_panel: false,
            force_columns: 1,
            stock_columns: 1,
            title_size: 24.0,
            body_size: 15.0,
            padding: 12.0,
        },
    }
}
