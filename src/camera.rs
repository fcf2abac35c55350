// src/camera.rs
//! Камера: преобразование экран ↔ карта.
//!
//! Состояние — смещение карты в экранных пикселях плюс масштаб (`zoom`
//! экранных пикселей на один пиксель карты). Каждая мутация завершается
//! внутренним `clamp`: если масштабированная карта меньше окна по оси — она
//! центрируется по этой оси, иначе смещение ограничивается так, чтобы за
//! краем карты никогда не было видно пустоты.

use crate::config::CameraSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Смещение карты по X в экранных пикселях
    pub x: f64,
    /// Смещение карты по Y в экранных пикселях
    pub y: f64,
    /// Экранных пикселей на пиксель карты
    pub zoom: f64,
    initial_zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    viewport_w: f64,
    viewport_h: f64,
    map_w: f64,
    map_h: f64,
}

impl Camera {
    /// Создаёт камеру и сразу выполняет `reset`.
    #[must_use]
    pub fn new(
        settings: &CameraSettings,
        map_w: u32,
        map_h: u32,
        viewport_w: u32,
        viewport_h: u32,
    ) -> Self {
        let mut camera = Self {
            x: 0.0,
            y: 0.0,
            zoom: settings.initial_zoom,
            initial_zoom: settings.initial_zoom,
            min_zoom: settings.min_zoom,
            max_zoom: settings.max_zoom,
            viewport_w: f64::from(viewport_w),
            viewport_h: f64::from(viewport_h),
            map_w: f64::from(map_w),
            map_h: f64::from(map_h),
        };
        camera.reset();
        camera
    }

    /// Эффективный нижний предел зума: настроенный минимум, поднятый до
    /// масштаба, при котором карта покрывает окно целиком. Карту нельзя
    /// отдалить настолько, чтобы вокруг неё показался фон.
    #[must_use]
    pub fn effective_min_zoom(&self) -> f64 {
        if self.map_w <= 0.0 || self.map_h <= 0.0 {
            return self.min_zoom;
        }
        let cover = (self.viewport_w / self.map_w).max(self.viewport_h / self.map_h);
        self.min_zoom.max(cover)
    }

    /// Рабочий диапазон зума. Покрытие окна важнее настроенного максимума:
    /// если карта слишком мала, верхняя граница поднимается вместе с нижней.
    fn zoom_bounds(&self) -> (f64, f64) {
        let min = self.effective_min_zoom();
        (min, self.max_zoom.max(min))
    }

    /// Начальный зум, карта по центру окна.
    pub fn reset(&mut self) {
        let (min, max) = self.zoom_bounds();
        self.zoom = self.initial_zoom.clamp(min, max);
        self.x = (self.viewport_w - self.map_w * self.zoom) / 2.0;
        self.y = (self.viewport_h - self.map_h * self.zoom) / 2.0;
        self.clamp();
    }

    /// Сдвиг на экранную дельту.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        self.clamp();
    }

    /// Зум к точке: точка карты под курсором остаётся на месте.
    ///
    /// Возвращает `false`, если зум не изменился (уперся в границу
    /// диапазона) — сигнал перерисовки в этом случае не нужен.
    pub fn zoom_at(&mut self, pivot_x: f64, pivot_y: f64, factor: f64) -> bool {
        let (min, max) = self.zoom_bounds();
        let new_zoom = (self.zoom * factor).clamp(min, max);
        if (new_zoom - self.zoom).abs() < self.zoom * 1e-12 {
            return false;
        }
        let ratio = new_zoom / self.zoom;
        // смещение пересчитывается так, чтобы точка под курсором не уехала
        self.x = pivot_x - (pivot_x - self.x) * ratio;
        self.y = pivot_y - (pivot_y - self.y) * ratio;
        self.zoom = new_zoom;
        self.clamp();
        true
    }

    /// Смена размеров окна просмотра.
    pub fn resize(&mut self, viewport_w: u32, viewport_h: u32) {
        self.viewport_w = f64::from(viewport_w);
        self.viewport_h = f64::from(viewport_h);
        let (min, max) = self.zoom_bounds();
        self.zoom = self.zoom.clamp(min, max);
        self.clamp();
    }

    /// Прижимает смещение к допустимой области. Идемпотентна.
    pub fn clamp(&mut self) {
        self.x = clamp_axis(self.x, self.map_w * self.zoom, self.viewport_w);
        self.y = clamp_axis(self.y, self.map_h * self.zoom, self.viewport_h);
    }

    /// Экран → карта, с округлением вниз: выбор пикселя согласован с
    /// адресацией растра.
    #[inline]
    #[must_use]
    pub fn screen_to_map(&self, sx: f64, sy: f64) -> (i64, i64) {
        (
            ((sx - self.x) / self.zoom).floor() as i64,
            ((sy - self.y) / self.zoom).floor() as i64,
        )
    }

    /// Экран → точка карты в границах растра; иначе `None`.
    #[must_use]
    pub fn map_point(&self, sx: f64, sy: f64) -> Option<(u32, u32)> {
        let (mx, my) = self.screen_to_map(sx, sy);
        if mx >= 0 && my >= 0 && (mx as f64) < self.map_w && (my as f64) < self.map_h {
            Some((mx as u32, my as u32))
        } else {
            None
        }
    }

    /// Карта → экран.
    #[inline]
    #[must_use]
    pub fn map_to_screen(&self, mx: f64, my: f64) -> (f64, f64) {
        (mx * self.zoom + self.x, my * self.zoom + self.y)
    }

    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        (self.viewport_w as u32, self.viewport_h as u32)
    }
}

fn clamp_axis(offset: f64, scaled: f64, viewport: f64) -> f64 {
    if scaled <= viewport {
        // карта меньше окна — центрируем
        (viewport - scaled) / 2.0
    } else {
        offset.clamp(viewport - scaled, 0.0)
    }
}
