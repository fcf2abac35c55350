// src/label/layout.rs
//! Раскладка подписей: размер шрифта, отсев, разрешение пересечений.
//!
//! Размер шрифта масштабируется нормализованным отношением территории между
//! самой маленькой и самой большой страной и кривой зума: при отдалении
//! подписи подрастают (маленькие страны остаются читаемыми), при приближении
//! сжимаются (крупные не заслоняют карту). Мелкие страны при сильном
//! отдалении отсеиваются целиком. Оставшиеся кандидаты сортируются по
//! территории по убыванию и принимаются жадно, если рамка с отступом не
//! пересекает уже принятые: при борьбе за место побеждает большая страна.

use crate::camera::Camera;
use crate::config::LabelSettings;
use crate::country::CountryTable;
use crate::label::LabelAnchor;
use crate::political::CountryStats;

/// Подпись, прошедшая раскладку: экранная рамка с центром в якоре.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    /// Порядковый номер страны
    pub country: usize,
    pub text: String,
    /// Левый верхний угол рамки в экранных пикселях
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub font_px: f64,
}

impl PlacedLabel {
    fn overlaps(&self, other: &PlacedLabel, pad: f64) -> bool {
        self.x - pad < other.x + other.w + pad
            && other.x - pad < self.x + self.w + pad
            && self.y - pad < other.y + other.h + pad
            && other.y - pad < self.y + self.h + pad
    }
}

/// Порог видимости: чем дальше отъехала камера, тем большей должна быть
/// территория, чтобы подпись вообще рисовалась.
#[must_use]
pub fn visibility_threshold(zoom: f64) -> usize {
    if zoom < 0.25 {
        100
    } else if zoom < 0.5 {
        30
    } else if zoom < 1.0 {
        10
    } else {
        0
    }
}

/// Множитель зума: рост при отдалении, сжатие при приближении.
fn zoom_curve(zoom: f64) -> f64 {
    if zoom < 1.0 {
        1.0 + (1.0 - zoom) * 0.5
    } else {
        1.0 / zoom.sqrt()
    }
}

/// Размер шрифта страны в экранных пикселях.
#[must_use]
pub fn font_size_px(
    pixels: usize,
    min_pixels: usize,
    max_pixels: usize,
    zoom: f64,
    settings: &LabelSettings,
) -> f64 {
    let norm = if max_pixels > min_pixels {
        (pixels - min_pixels) as f64 / (max_pixels - min_pixels) as f64
    } else {
        1.0
    };
    let base = settings.min_font_px + (settings.max_font_px - settings.min_font_px) * norm;
    (base * zoom_curve(zoom)).clamp(settings.min_font_px, settings.max_font_px)
}

/// Раскладывает подписи по текущей камере.
#[must_use]
pub fn layout_labels(
    anchors: &[LabelAnchor],
    stats: &[CountryStats],
    countries: &CountryTable,
    camera: &Camera,
    settings: &LabelSettings,
) -> Vec<PlacedLabel> {
    let threshold = visibility_threshold(camera.zoom);
    let (viewport_w, viewport_h) = camera.viewport();

    let mut candidates: Vec<&LabelAnchor> = anchors
        .iter()
        .filter(|a| stats[a.country].pixels >= threshold.max(1))
        .collect();
    // большая территория — выше приоритет; при равенстве порядок стабилен
    candidates.sort_by(|a, b| {
        stats[b.country]
            .pixels
            .cmp(&stats[a.country].pixels)
            .then(a.country.cmp(&b.country))
    });

    let owned: Vec<usize> = candidates
        .iter()
        .map(|a| stats[a.country].pixels)
        .collect();
    let min_pixels = owned.iter().copied().min().unwrap_or(0);
    let max_pixels = owned.iter().copied().max().unwrap_or(0);

    let mut placed: Vec<PlacedLabel> = Vec::new();
    for anchor in candidates {
        let Some(display) = countries.by_ordinal(anchor.country) else {
            continue;
        };
        let font_px = font_size_px(
            stats[anchor.country].pixels,
            min_pixels,
            max_pixels,
            camera.zoom,
            settings,
        );
        let w = (display.name.chars().count() as f64) * font_px * settings.advance_ratio;
        let h = font_px * settings.line_height_ratio;
        let (cx, cy) = camera.map_to_screen(
            f64::from(anchor.x) + 0.5,
            f64::from(anchor.y) + 0.5,
        );
        let label = PlacedLabel {
            country: anchor.country,
            text: display.name.clone(),
            x: cx - w / 2.0,
            y: cy - h / 2.0,
            w,
            h,
            font_px,
        };
        // рамки целиком за экраном не участвуют в раскладке
        if label.x + label.w < 0.0
            || label.y + label.h < 0.0
            || label.x > f64::from(viewport_w)
            || label.y > f64::from(viewport_h)
        {
            continue;
        }
        if placed
            .iter()
            .all(|other| !label.overlaps(other, settings.padding_px))
        {
            placed.push(label);
        }
    }
    placed
}
