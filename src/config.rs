// src/config.rs
//! Конфигурация движка карты
//!
//! Этот модуль определяет все параметры, управляющие отрисовкой политической
//! карты:
//! - Размеры мастер-растра и пути к растровым ассетам
//! - Ограничения камеры (начальный/минимальный/максимальный зум)
//! - Непрозрачность слоёв композитинга
//! - Настройки подписей стран
//!
//! Все структуры поддерживают сериализацию в TOML для настройки через
//! конфигурационные файлы.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MapError;

/// Пути к входным ассетам карты.
///
/// Все растры обязаны совпадать по размеру с `width × height` из [`MapConfig`]:
/// пиксельная арифметика ниже по конвейеру опирается на это без повторных
/// проверок.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssetPaths {
    /// Базовый растр провинций (каждая провинция — уникальный цвет)
    pub provinces: PathBuf,

    /// Текстура рельефа
    pub terrain: PathBuf,

    /// Текстура воды
    pub water: PathBuf,

    /// Растр рек
    pub rivers: PathBuf,

    /// Таблица определений провинций (JSON: цвет, идентификатор, имя)
    pub province_defs: PathBuf,

    /// Таблица владения: провинция → страна (JSON)
    pub ownership: PathBuf,

    /// Таблица отображения стран: идентификатор, имя, цвет (JSON)
    pub countries: PathBuf,
}

/// Ограничения камеры.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraSettings {
    /// Начальный зум после `reset` (экранных пикселей на пиксель карты)
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: f64,

    /// Нижняя граница зума; эффективный минимум дополнительно поднимается
    /// так, чтобы карта всегда покрывала окно просмотра
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    /// Верхняя граница зума
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
}

fn default_initial_zoom() -> f64 {
    1.0
}
fn default_min_zoom() -> f64 {
    0.25
}
fn default_max_zoom() -> f64 {
    8.0
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            initial_zoom: 1.0,
            min_zoom: 0.25,
            max_zoom: 8.0,
        }
    }
}

/// Непрозрачность слоёв композитинга (0.0 — невидим, 1.0 — полностью).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LayerSettings {
    /// Рельеф приглушается, чтобы политическая раскраска читалась поверх
    #[serde(default = "default_terrain_opacity")]
    pub terrain_opacity: f32,

    /// Политическая раскраска — почти непрозрачная
    #[serde(default = "default_political_opacity")]
    pub political_opacity: f32,

    /// Реки — полупрозрачные
    #[serde(default = "default_rivers_opacity")]
    pub rivers_opacity: f32,
}

fn default_terrain_opacity() -> f32 {
    0.6
}
fn default_political_opacity() -> f32 {
    0.85
}
fn default_rivers_opacity() -> f32 {
    0.5
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            terrain_opacity: 0.6,
            political_opacity: 0.85,
            rivers_opacity: 0.5,
        }
    }
}

/// Настройки подписей стран.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LabelSettings {
    /// Минимальный размер шрифта в экранных пикселях
    #[serde(default = "default_min_font_px")]
    pub min_font_px: f64,

    /// Максимальный размер шрифта в экранных пикселях
    #[serde(default = "default_max_font_px")]
    pub max_font_px: f64,

    /// Отступ вокруг рамки подписи при разрешении пересечений
    #[serde(default = "default_padding_px")]
    pub padding_px: f64,

    /// Средняя ширина символа относительно размера шрифта
    #[serde(default = "default_advance_ratio")]
    pub advance_ratio: f64,

    /// Высота строки относительно размера шрифта
    #[serde(default = "default_line_height_ratio")]
    pub line_height_ratio: f64,
}

fn default_min_font_px() -> f64 {
    12.0
}
fn default_max_font_px() -> f64 {
    48.0
}
fn default_padding_px() -> f64 {
    4.0
}
fn default_advance_ratio() -> f64 {
    0.55
}
fn default_line_height_ratio() -> f64 {
    1.2
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            min_font_px: 12.0,
            max_font_px: 48.0,
            padding_px: 4.0,
            advance_ratio: 0.55,
            line_height_ratio: 1.2,
        }
    }
}

/// Полная конфигурация карты. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Ширина мастер-растра в пикселях (по умолчанию 5632)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Высота мастер-растра в пикселях (по умолчанию 2048)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Пути к ассетам
    #[serde(default)]
    pub assets: AssetPaths,

    /// Ограничения камеры
    #[serde(default)]
    pub camera: CameraSettings,

    /// Непрозрачность слоёв
    #[serde(default)]
    pub layers: LayerSettings,

    /// Настройки подписей
    #[serde(default)]
    pub labels: LabelSettings,
}

fn default_width() -> u32 {
    5632
}
fn default_height() -> u32 {
    2048
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 5632,
            height: 2048,
            assets: AssetPaths::default(),
            camera: CameraSettings::default(),
            layers: LayerSettings::default(),
            labels: LabelSettings::default(),
        }
    }
}

impl MapConfig {
    /// Загружает конфигурацию из TOML-файла и проверяет инварианты.
    pub fn from_toml_file(path: &Path) -> Result<Self, MapError> {
        let contents = fs::read_to_string(path).map_err(|source| MapError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| MapError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Проверяет согласованность параметров; вызывается при загрузке.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.width == 0 || self.height == 0 {
            return Err(MapError::ConfigInvalid {
                reason: format!("нулевой размер карты: {}×{}", self.width, self.height),
            });
        }
        if self.camera.min_zoom <= 0.0 || self.camera.initial_zoom <= 0.0 {
            return Err(MapError::ConfigInvalid {
                reason: "зум должен быть положительным".to_string(),
            });
        }
        if self.camera.min_zoom > self.camera.max_zoom {
            return Err(MapError::ConfigInvalid {
                reason: format!(
                    "min_zoom ({}) больше max_zoom ({})",
                    self.camera.min_zoom, self.camera.max_zoom
                ),
            });
        }
        for (name, value) in [
            ("terrain_opacity", self.layers.terrain_opacity),
            ("political_opacity", self.layers.political_opacity),
            ("rivers_opacity", self.layers.rivers_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MapError::ConfigInvalid {
                    reason: format!("{name} вне диапазона [0, 1]: {value}"),
                });
            }
        }
        if self.labels.min_font_px <= 0.0 || self.labels.min_font_px > self.labels.max_font_px {
            return Err(MapError::ConfigInvalid {
                reason: format!(
                    "некорректный диапазон шрифта: [{}, {}]",
                    self.labels.min_font_px, self.labels.max_font_px
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(MapConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_dimensions() {
        let config = MapConfig {
            width: 0,
            ..MapConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MapError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn rejects_inverted_zoom_range() {
        let mut config = MapConfig::default();
        config.camera.min_zoom = 4.0;
        config.camera.max_zoom = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_opacity_out_of_range() {
        let mut config = MapConfig::default();
        config.layers.rivers_opacity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_minimal_roundtrip() {
        let parsed: MapConfig = toml::from_str("width = 64\nheight = 32\n").unwrap();
        assert_eq!(parsed.width, 64);
        assert_eq!(parsed.height, 32);
        assert_eq!(parsed.camera.max_zoom, 8.0);
    }
}
