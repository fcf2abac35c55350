// src/assets.rs
//! Загрузка растровых ассетов карты.
//!
//! Каждый ассет загружается независимо и проверяется на точное совпадение
//! размеров с конфигурацией: вся пиксельная арифметика движка считает размеры
//! растров равными размерам карты. Ошибка загрузки фатальна для инициализации
//! и несёт имя ассета — никакой тихой подмены заглушкой.

use std::path::Path;

use crate::config::MapConfig;
use crate::error::MapError;
use crate::raster::PixelRaster;

/// Набор входных растров: провинции, рельеф, вода, реки.
#[derive(Debug, Clone)]
pub struct AssetSet {
    pub provinces: PixelRaster,
    pub terrain: PixelRaster,
    pub water: PixelRaster,
    pub rivers: PixelRaster,
}

impl AssetSet {
    /// Загружает все четыре растра; конвейер стартует только после того,
    /// как барьер отметит завершение всех загрузок.
    pub fn load(config: &MapConfig) -> Result<Self, MapError> {
        let expected = (config.width, config.height);
        let mut barrier = LoadBarrier::new(4);

        let provinces = load_raster("provinces", &config.assets.provinces, expected)?;
        barrier.complete_one();
        let terrain = load_raster("terrain", &config.assets.terrain, expected)?;
        barrier.complete_one();
        let water = load_raster("water", &config.assets.water, expected)?;
        barrier.complete_one();
        let rivers = load_raster("rivers", &config.assets.rivers, expected)?;
        let fired = barrier.complete_one();
        debug_assert!(fired && barrier.is_ready());

        tracing::info!(
            width = expected.0,
            height = expected.1,
            "ассеты карты загружены"
        );
        Ok(Self {
            provinces,
            terrain,
            water,
            rivers,
        })
    }
}

/// Загружает один RGBA-растр и сверяет его размер с ожидаемым.
pub fn load_raster(
    asset: &'static str,
    path: &Path,
    expected: (u32, u32),
) -> Result<PixelRaster, MapError> {
    let img = image::open(path)
        .map_err(|source| MapError::AssetLoad {
            asset,
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (actual_w, actual_h) = img.dimensions();
    if (actual_w, actual_h) != expected {
        return Err(MapError::AssetDimensions {
            asset,
            expected_w: expected.0,
            expected_h: expected.1,
            actual_w,
            actual_h,
        });
    }
    tracing::debug!(asset, ?path, "растр загружен");
    Ok(PixelRaster::from_image(img))
}

/// Барьер завершения N независимых загрузок.
///
/// Каждая загрузка отмечается ровно один раз через [`complete_one`];
/// переход "все готовы" срабатывает единожды, порядок завершения не важен.
/// Явное значение вместо замыкания над изменяемым счётчиком: барьер можно
/// передавать, опрашивать и тестировать.
///
/// [`complete_one`]: LoadBarrier::complete_one
#[derive(Debug, Clone)]
pub struct LoadBarrier {
    remaining: usize,
    fired: bool,
}

impl LoadBarrier {
    /// Барьер над `count` загрузками; при `count == 0` готов сразу.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            remaining: count,
            fired: count == 0,
        }
    }

    /// Отмечает завершение одной загрузки. Возвращает `true` ровно один
    /// раз — в момент, когда завершилась последняя; лишние вызовы
    /// игнорируются.
    pub fn complete_one(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
        }
        if self.remaining == 0 && !self.fired {
            self.fired = true;
            return true;
        }
        false
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barrier_fires_exactly_once() {
        let mut barrier = LoadBarrier::new(3);
        assert!(!barrier.complete_one());
        assert!(!barrier.is_ready());
        assert!(!barrier.complete_one());
        assert!(barrier.complete_one());
        assert!(barrier.is_ready());
        // лишний сигнал не перезапускает переход
        assert!(!barrier.complete_one());
    }

    #[test]
    fn barrier_order_independent() {
        // завершения неразличимы, важен только счётчик
        let mut barrier = LoadBarrier::new(2);
        assert!(!barrier.complete_one());
        assert!(barrier.complete_one());
    }

    #[test]
    fn empty_barrier_is_ready() {
        let barrier = LoadBarrier::new(0);
        assert!(barrier.is_ready());
    }

    #[test]
    fn missing_asset_is_distinct_error() {
        let err = load_raster("terrain", Path::new("/nonexistent/terrain.png"), (4, 4))
            .unwrap_err();
        match err {
            MapError::AssetLoad { asset, .. } => assert_eq!(asset, "terrain"),
            other => panic!("неожиданная ошибка: {other}"),
        }
    }
}
