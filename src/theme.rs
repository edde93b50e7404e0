use gpui::*;

#[cfg(target_os = "macos")]
use objc2::rc::Retained;
#[cfg(target_os = "macos")]
use objc2_app_kit::NSColor;

use crate::classify::Category;

pub struct Theme {
    pub text: Rgba,
    pub subtext1: Rgba,
    pub subtext0: Rgba,
    pub overlay1: Rgba,
    pub surface0: Rgba,
    pub base: Rgba,
    pub mantle: Rgba,
    pub crust: Rgba,
    pub accent: Rgba,
    pub error: Rgba,
}

impl Global for Theme {}

/// Get the system accent color on macOS
#[cfg(target_os = "macos")]
fn get_system_accent_color() -> Rgba {
    let accent_color: Retained<NSColor> = NSColor::controlAccentColor();
    if let Some(rgb_color) = accent_color.colorUsingColorSpace(objc2_app_kit::NSColorSpace::sRGBColorSpace().as_ref()) {
        let r = rgb_color.redComponent() as f32;
        let g = rgb_color.greenComponent() as f32;
        let b = rgb_color.blueComponent() as f32;
        let a = rgb_color.alphaComponent() as f32;
        return rgba(
            ((r * 255.0) as u32) << 24
                | ((g * 255.0) as u32) << 16
                | ((b * 255.0) as u32) << 8
                | (a * 255.0) as u32,
        );
    }
    gpui::blue().into()
}

#[cfg(not(target_os = "macos"))]
fn get_system_accent_color() -> Rgba {
    gpui::blue().into()
}

impl Theme {
    pub fn init(app: &mut App) {
        app.set_global(Theme::get_dark());
    }

    // Catppuccin Mocha
    pub fn get_dark() -> Theme {
        Theme {
            text: rgb(0xcdd6f4),
            subtext1: rgb(0xbac2de),
            subtext0: rgb(0xa6adc8),
            overlay1: rgb(0x7f849c),
            surface0: rgb(0x313244),
            base: rgb(0x1e1e2e),
            mantle: rgb(0x181825),
            crust: rgb(0x11111b),
            accent: get_system_accent_color(),
            error: rgb(0xf38ba8),
        }
    }

    /// Row background for a status category; `None` keeps the base color.
    pub fn row_fill(&self, category: Category) -> Option<Rgba> {
        category.fill().map(rgb)
    }

    /// Text color for a row. Filled rows are light, so they get dark text.
    pub fn row_text(&self, category: Category) -> Rgba {
        match category.fill() {
            Some(_) => self.crust,
            None => self.text,
        }
    }
}
