//! CJK font setup (egui's bundled fonts have no Chinese glyphs)

use egui::{FontData, FontDefinitions, FontFamily};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SYSTEM_CJK_FONTS: &[&str] = &[
    "C:\\Windows\\Fonts\\msjh.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Medium.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
];

/// Configured font first, then well-known system locations.
fn candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_CJK_FONTS.iter().map(PathBuf::from))
        .collect()
}

/// Register the first readable CJK font as a fallback for both families.
pub fn install_cjk_font(ctx: &egui::Context, configured: Option<&Path>) -> Option<PathBuf> {
    let (path, bytes) = candidates(configured)
        .into_iter()
        .find_map(|path| std::fs::read(&path).ok().map(|bytes| (path, bytes)))?;

    let mut fonts = FontDefinitions::default();
    fonts
        .font_data
        .insert("cjk".to_owned(), Arc::new(FontData::from_owned(bytes)));
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push("cjk".to_owned());
    }
    ctx.set_fonts(fonts);

    info!("Using CJK font {}", path.display());
    Some(path)
}

/// Install fonts, logging when none is found.
pub fn setup_fonts(ctx: &egui::Context, configured: Option<&Path>) {
    if install_cjk_font(ctx, configured).is_none() {
        warn!("No CJK font found; set `cjk_font` in the config to render Chinese text");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_font_is_tried_first() {
        let list = candidates(Some(Path::new("/fonts/custom.ttf")));
        assert_eq!(list[0], PathBuf::from("/fonts/custom.ttf"));
        assert_eq!(list.len(), SYSTEM_CJK_FONTS.len() + 1);
        assert_eq!(candidates(None).len(), SYSTEM_CJK_FONTS.len());
    }
}
