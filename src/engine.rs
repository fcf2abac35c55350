// src/engine.rs
//! Движок карты: связывает индекс провинций, владение, камеру, производные
//! слои и взаимодействие.
//!
//! Никаких глобальных синглтонов: всё состояние явно собрано в [`MapEngine`],
//! поэтому можно держать несколько независимых карт и детерминированно
//! тестировать. Один логический поток: указатель и камера — O(1) и никогда
//! не блокируют; полнорастровые пересчёты запускаются только мутацией
//! владения, причём якоря подписей считаются пакетно через [`tick`] с точкой
//! уступки, а устаревший пересчёт отбрасывается по номеру поколения.
//!
//! [`tick`]: MapEngine::tick

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::assets::AssetSet;
use crate::border::country::extract_country_borders;
use crate::border::province::ProvinceBorderCache;
use crate::border::BorderSet;
use crate::camera::Camera;
use crate::compose::{self, BlendMode, Layer};
use crate::config::MapConfig;
use crate::country::{CountryTable, OwnershipMap, OwnershipRow};
use crate::error::MapError;
use crate::label::placer::AnchorJob;
use crate::label::{layout_labels, LabelAnchor, PlacedLabel};
use crate::political::{render_political, PoliticalView};
use crate::province::{ProvinceDef, ProvinceIndex};
use crate::raster::{PixelRaster, TRANSPARENT};

/// Сдвиг указателя, после которого жест считается панорамированием.
pub const DRAG_THRESHOLD_PX: f64 = 4.0;

/// Период пульсации подсветки выбора, в секундах.
pub const PULSE_PERIOD_SECS: f64 = 1.2;

/// Цвет фона кадра за пределами карты.
pub const BACKGROUND: [u8; 4] = [10, 16, 28, 255];

const HOVER_COLOR: [u8; 4] = [255, 255, 255, 90];

const DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);

/// Альфа пульсирующей подсветки в момент времени `t` (секунды).
#[must_use]
pub fn pulse_alpha(t: f64) -> u8 {
    let phase = (t / PULSE_PERIOD_SECS) * std::f64::consts::TAU;
    let level = 0.6 + 0.3 * phase.sin();
    (level * 255.0).round().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
}

/// Итог завершённого жеста указателя.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerAction {
    /// Левый клик: выбранная провинция (`None` — клик мимо суши, выбор снят)
    Select(Option<String>),
    /// Правый клик (режим раскраски в редакторе): провинция под курсором
    Clear(Option<String>),
    /// Жест оказался панорамированием
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerPhase {
    Idle,
    Pressed {
        button: PointerButton,
        start: (f64, f64),
        last: (f64, f64),
        dragging: bool,
    },
}

/// Интерактивная политическая карта поверх статического растра провинций.
#[derive(Debug)]
pub struct MapEngine {
    config: MapConfig,
    index: ProvinceIndex,
    countries: CountryTable,
    ownership: OwnershipMap,

    terrain: PixelRaster,
    water: PixelRaster,
    rivers: PixelRaster,

    camera: Camera,
    political: PoliticalView,
    border_set: BorderSet,
    border_mask: PixelRaster,
    province_borders: ProvinceBorderCache,

    anchors: Vec<LabelAnchor>,
    anchor_job: Option<AnchorJob>,
    labels: Vec<PlacedLabel>,
    /// Номер поколения производных данных; растёт на каждой мутации владения
    seq: u64,

    selection: Option<String>,
    hover: Option<String>,
    pointer: PointerPhase,
    pulse: u8,
    overlay: PixelRaster,
    dirty: bool,
}

impl MapEngine {
    /// Собирает движок из конфигурации, загруженных ассетов и таблиц.
    pub fn new(
        config: MapConfig,
        assets: AssetSet,
        defs: &[ProvinceDef],
        countries: CountryTable,
    ) -> Result<Self, MapError> {
        let index = ProvinceIndex::build(defs, assets.provinces)?;
        let camera = Camera::new(
            &config.camera,
            config.width,
            config.height,
            DEFAULT_VIEWPORT.0,
            DEFAULT_VIEWPORT.1,
        );
        let ownership = OwnershipMap::default();
        let political = render_political(&index, &ownership, &countries);
        let (border_set, border_mask) = extract_country_borders(&political.raster);
        let overlay = PixelRaster::new(config.width, config.height);

        let mut engine = Self {
            config,
            index,
            countries,
            ownership,
            terrain: assets.terrain,
            water: assets.water,
            rivers: assets.rivers,
            camera,
            political,
            border_set,
            border_mask,
            province_borders: ProvinceBorderCache::default(),
            anchors: Vec::new(),
            anchor_job: None,
            labels: Vec::new(),
            seq: 0,
            selection: None,
            hover: None,
            pointer: PointerPhase::Idle,
            pulse: pulse_alpha(0.0),
            overlay,
            dirty: true,
        };
        engine.anchor_job = Some(AnchorJob::new(engine.seq, engine.countries.len()));
        Ok(engine)
    }

    // --- владение ---

    /// Назначает провинции владельца и пересчитывает производные слои.
    pub fn assign_owner(&mut self, province_id: &str, country_id: &str) -> Result<(), MapError> {
        let change =
            self.ownership
                .assign(&self.index, &self.countries, province_id, country_id)?;
        if change.affected.is_empty() {
            return Ok(());
        }
        self.province_borders.invalidate([change.province.as_str()]);
        tracing::debug!(
            province = province_id,
            country = country_id,
            "владение изменено"
        );
        self.rebuild_derived();
        Ok(())
    }

    /// Снимает владельца с провинции.
    pub fn clear_owner(&mut self, province_id: &str) -> Result<(), MapError> {
        let change = self.ownership.clear(&self.index, province_id)?;
        if change.affected.is_empty() {
            return Ok(());
        }
        self.province_borders.invalidate([change.province.as_str()]);
        self.rebuild_derived();
        Ok(())
    }

    /// Полная замена таблицы владения ("пересчитать всё").
    pub fn reload_ownership(&mut self, rows: &[OwnershipRow]) -> Result<(), MapError> {
        self.ownership
            .bulk_load(&self.index, &self.countries, rows)?;
        self.province_borders.clear();
        tracing::info!(rows = rows.len(), "владение загружено целиком");
        self.rebuild_derived();
        Ok(())
    }

    /// Пересчёт политического растра, границ стран и постановка свежей
    /// задачи якорей. Прежняя задача, если была, замещается: её результат
    /// устарел ещё до завершения.
    fn rebuild_derived(&mut self) {
        self.seq += 1;
        let view = render_political(&self.index, &self.ownership, &self.countries);
        let (set, mask) = extract_country_borders(&view.raster);
        self.political = view;
        self.border_set = set;
        self.border_mask = mask;
        self.anchor_job = Some(AnchorJob::new(self.seq, self.countries.len()));
        self.rebuild_overlay();
        self.dirty = true;
        tracing::debug!(
            seq = self.seq,
            borders = self.border_set.len(),
            "производные слои пересчитаны"
        );
    }

    // --- кооперативный пересчёт якорей ---

    /// Продвигает отложенное вычисление якорей не более чем на `batch`
    /// стран. Возвращает `true`, когда отложенной работы не осталось.
    pub fn tick(&mut self, batch: usize) -> bool {
        let Some(mut job) = self.anchor_job.take() else {
            return true;
        };
        let done = job.step(
            batch,
            &self.index,
            &self.ownership,
            &self.countries,
            &self.political.stats,
        );
        if done {
            self.apply_finished_job(job);
            true
        } else {
            self.anchor_job = Some(job);
            false
        }
    }

    /// Применяет завершённую задачу, если она всё ещё текущего поколения;
    /// устаревший результат молча отбрасывается.
    fn apply_finished_job(&mut self, job: AnchorJob) {
        if job.seq() == self.seq {
            self.anchors = job.into_anchors();
            self.dirty = true;
            tracing::debug!(anchors = self.anchors.len(), "якоря подписей обновлены");
        } else {
            tracing::debug!(
                job_seq = job.seq(),
                current_seq = self.seq,
                "устаревший пересчёт якорей отброшен"
            );
        }
    }

    #[must_use]
    pub fn anchors_ready(&self) -> bool {
        self.anchor_job.is_none()
    }

    // --- камера ---

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.camera.pan(dx, dy);
        self.dirty = true;
    }

    pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
        if self.camera.zoom_at(x, y, factor) {
            self.dirty = true;
        }
    }

    pub fn resize(&mut self, viewport_w: u32, viewport_h: u32) {
        self.camera.resize(viewport_w, viewport_h);
        self.dirty = true;
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
        self.dirty = true;
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Точка карты под экранной точкой; `None` за пределами карты.
    #[must_use]
    pub fn map_point_from_screen(&self, sx: f64, sy: f64) -> Option<(u32, u32)> {
        self.camera.map_point(sx, sy)
    }

    /// Провинция под экранной точкой. O(1): чтение пикселя + поиск по хэшу.
    #[must_use]
    pub fn province_at_screen(&self, sx: f64, sy: f64) -> Option<&crate::province::Province> {
        let (mx, my) = self.camera.screen_to_map(sx, sy);
        self.index.province_at(mx, my)
    }

    // --- указатель ---

    pub fn pointer_down(&mut self, sx: f64, sy: f64, button: PointerButton) {
        self.pointer = PointerPhase::Pressed {
            button,
            start: (sx, sy),
            last: (sx, sy),
            dragging: false,
        };
    }

    pub fn pointer_move(&mut self, sx: f64, sy: f64) {
        match self.pointer {
            PointerPhase::Pressed {
                button,
                start,
                last,
                dragging,
            } => {
                let dragging =
                    dragging || (sx - start.0).hypot(sy - start.1) > DRAG_THRESHOLD_PX;
                if dragging {
                    self.camera.pan(sx - last.0, sy - last.1);
                    self.dirty = true;
                }
                self.pointer = PointerPhase::Pressed {
                    button,
                    start,
                    last: (sx, sy),
                    dragging,
                };
            }
            PointerPhase::Idle => {
                let hovered = self.province_at_screen(sx, sy).map(|p| p.id.clone());
                if hovered != self.hover {
                    self.hover = hovered;
                    self.rebuild_overlay();
                    self.dirty = true;
                }
            }
        }
    }

    /// Завершает жест: клик выбирает/снимает, протяжка — панорама.
    pub fn pointer_up(&mut self, sx: f64, sy: f64) -> Option<PointerAction> {
        let PointerPhase::Pressed {
            button, dragging, ..
        } = self.pointer
        else {
            return None;
        };
        self.pointer = PointerPhase::Idle;
        if dragging {
            return Some(PointerAction::Pan);
        }
        let hit = self.province_at_screen(sx, sy).map(|p| p.id.clone());
        match button {
            PointerButton::Left => {
                self.set_selection(hit.clone());
                Some(PointerAction::Select(hit))
            }
            PointerButton::Right => {
                self.set_selection(None);
                Some(PointerAction::Clear(hit))
            }
        }
    }

    /// Программный выбор провинции (в том числе эфемерный/невалидный
    /// идентификатор: подсветка просто будет пустой).
    pub fn set_selection(&mut self, selection: Option<String>) {
        if self.selection != selection {
            self.selection = selection;
            self.rebuild_overlay();
            self.dirty = true;
        }
    }

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Тик анимации пульсации выбора.
    pub fn set_animation_time(&mut self, t: f64) {
        let pulse = pulse_alpha(t);
        if pulse != self.pulse {
            self.pulse = pulse;
            if self.selection.is_some() {
                self.rebuild_overlay();
                self.dirty = true;
            }
        }
    }

    // --- отрисовка ---

    /// Слой взаимодействия: подсветка наведения и пульсирующий контур выбора.
    fn rebuild_overlay(&mut self) {
        self.overlay.fill(TRANSPARENT);
        if let Some(id) = self.hover.clone() {
            let set = self.province_borders.border(&self.index, &id);
            let pixels: Vec<(u32, u32)> = set.pixels.clone();
            for (x, y) in pixels {
                self.overlay.set(x, y, HOVER_COLOR);
            }
        }
        if let Some(id) = self.selection.clone() {
            let pulse = self.pulse;
            let set = self.province_borders.border(&self.index, &id);
            let pixels: Vec<(u32, u32)> = set.pixels.clone();
            for (x, y) in pixels {
                self.overlay.set(x, y, [255, 255, 255, pulse]);
            }
        }
    }

    /// Был ли запрошен перерисовочный кадр; сбрасывает флаг.
    /// Несколько триггеров между кадрами схлопываются в одну отрисовку.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn request_redraw(&mut self) {
        self.dirty = true;
    }

    /// Подписи, прошедшие раскладку на последнем кадре.
    #[must_use]
    pub fn labels(&self) -> &[PlacedLabel] {
        &self.labels
    }

    #[must_use]
    pub fn country_border_set(&self) -> &BorderSet {
        &self.border_set
    }

    /// Контур провинции для подсветки (лениво, с кэшем).
    pub fn province_border(&mut self, id: &str) -> &BorderSet {
        self.province_borders.border(&self.index, id)
    }

    /// Собирает кадр: фиксированный порядок слоёв под активной камерой,
    /// подписи — поверх всего.
    pub fn render_frame(&mut self) -> RgbaImage {
        self.labels = layout_labels(
            &self.anchors,
            &self.political.stats,
            &self.countries,
            &self.camera,
            &self.config.labels,
        );

        let layers = [
            Layer {
                name: "terrain",
                raster: &self.terrain,
                blend: BlendMode::Normal,
                opacity: self.config.layers.terrain_opacity,
            },
            Layer {
                name: "political",
                raster: &self.political.raster,
                blend: BlendMode::Normal,
                opacity: self.config.layers.political_opacity,
            },
            Layer {
                name: "water",
                raster: &self.water,
                blend: BlendMode::Normal,
                opacity: 1.0,
            },
            Layer {
                name: "rivers",
                raster: &self.rivers,
                blend: BlendMode::Multiply,
                opacity: self.config.layers.rivers_opacity,
            },
            Layer {
                name: "borders",
                raster: &self.border_mask,
                blend: BlendMode::Normal,
                opacity: 1.0,
            },
            Layer {
                name: "overlay",
                raster: &self.overlay,
                blend: BlendMode::Normal,
                opacity: 1.0,
            },
        ];
        let frame = compose::render_frame(&layers, &self.camera, BACKGROUND);
        let mut img = frame.into_image();
        self.draw_label_markers(&mut img);
        img
    }

    /// Рамки подписей поверх кадра. Растеризация глифов — забота внешней
    /// оболочки со шрифтами; движок отдаёт геометрию и рисует маркеры.
    fn draw_label_markers(&self, img: &mut RgbaImage) {
        for label in &self.labels {
            let Some(display) = self.countries.by_ordinal(label.country) else {
                continue;
            };
            let w = label.w.round().max(1.0) as u32;
            let h = label.h.round().max(1.0) as u32;
            let rect = Rect::at(label.x.round() as i32, label.y.round() as i32).of_size(w, h);
            let color = Rgba([display.color[0], display.color[1], display.color[2], 255]);
            draw_hollow_rect_mut(img, rect, color);
        }
    }

    #[must_use]
    pub fn political_raster(&self) -> &PixelRaster {
        &self.political.raster
    }

    #[must_use]
    pub fn border_mask(&self) -> &PixelRaster {
        &self.border_mask
    }

    #[must_use]
    pub fn index(&self) -> &ProvinceIndex {
        &self.index
    }

    #[must_use]
    pub fn ownership(&self) -> &OwnershipMap {
        &self.ownership
    }

    #[must_use]
    pub fn countries(&self) -> &CountryTable {
        &self.countries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::CountryDef;

    /// Карта 8×8: провинция "north" — строки 0–3, "south" — строки 4–7.
    fn fixture() -> MapEngine {
        let mut provinces = PixelRaster::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                let color = if y < 4 { [10, 0, 0, 255] } else { [0, 20, 0, 255] };
                provinces.set(x, y, color);
            }
        }
        let assets = AssetSet {
            provinces,
            terrain: PixelRaster::filled(8, 8, [80, 80, 80, 255]),
            water: PixelRaster::new(8, 8),
            rivers: PixelRaster::new(8, 8),
        };
        let config = MapConfig {
            width: 8,
            height: 8,
            ..MapConfig::default()
        };
        let defs = vec![
            ProvinceDef {
                r: 10,
                g: 0,
                b: 0,
                id: "north".to_string(),
                name: "North".to_string(),
            },
            ProvinceDef {
                r: 0,
                g: 20,
                b: 0,
                id: "south".to_string(),
                name: "South".to_string(),
            },
        ];
        let countries = CountryTable::from_defs(&[
            CountryDef {
                id: "red".to_string(),
                name: "Redland".to_string(),
                color: "#c80000".to_string(),
            },
            CountryDef {
                id: "blue".to_string(),
                name: "Bluemark".to_string(),
                color: "#0000c8".to_string(),
            },
        ])
        .unwrap();
        let mut engine = MapEngine::new(config, assets, &defs, countries).unwrap();
        engine.resize(8, 8);
        engine.reset_camera();
        engine
    }

    #[test]
    fn two_country_seam_marks_rows_3_and_4() {
        let mut engine = fixture();
        engine.assign_owner("north", "red").unwrap();
        engine.assign_owner("south", "blue").unwrap();

        let mut pixels = engine.country_border_set().pixels.clone();
        pixels.sort_unstable_by_key(|&(x, y)| (y, x));
        let expected: Vec<(u32, u32)> = (3..5)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .collect();
        assert_eq!(pixels, expected);
    }

    #[test]
    fn ownership_change_supersedes_pending_anchors() {
        let mut engine = fixture();
        engine.assign_owner("north", "red").unwrap();
        // задача поставлена, но ещё не завершена
        assert!(!engine.anchors_ready());
        let seq_before = engine.seq;
        engine.assign_owner("south", "blue").unwrap();
        assert_eq!(engine.seq, seq_before + 1);
        // доводим свежую задачу до конца
        while !engine.tick(1) {}
        assert!(engine.anchors_ready());
        assert_eq!(engine.anchors.len(), 2);
    }

    #[test]
    fn stale_job_is_discarded() {
        let mut engine = fixture();
        engine.assign_owner("north", "red").unwrap();
        while !engine.tick(8) {}
        let applied = engine.anchors.clone();
        assert!(!applied.is_empty());

        // задача прошлого поколения не имеет права затирать результат
        let stale = AnchorJob::new(engine.seq.wrapping_sub(1), 0);
        engine.apply_finished_job(stale);
        assert_eq!(engine.anchors, applied);
    }

    #[test]
    fn click_selects_drag_pans() {
        let mut engine = fixture();
        engine.assign_owner("north", "red").unwrap();

        // короткий жест — выбор провинции под курсором
        engine.pointer_down(1.0, 1.0, PointerButton::Left);
        engine.pointer_move(2.0, 1.0);
        let action = engine.pointer_up(2.0, 1.0).unwrap();
        match action {
            PointerAction::Select(Some(id)) => assert_eq!(id, "north"),
            other => panic!("ожидался выбор, получено {other:?}"),
        }
        assert_eq!(engine.selection(), Some("north"));

        // длинная протяжка — панорама, выбор не меняется
        engine.pointer_down(1.0, 1.0, PointerButton::Left);
        engine.pointer_move(30.0, 30.0);
        let action = engine.pointer_up(30.0, 30.0).unwrap();
        assert_eq!(action, PointerAction::Pan);
        assert_eq!(engine.selection(), Some("north"));
    }

    #[test]
    fn right_click_clears_selection() {
        let mut engine = fixture();
        engine.pointer_down(1.0, 1.0, PointerButton::Left);
        engine.pointer_up(1.0, 1.0);
        assert!(engine.selection().is_some());

        engine.pointer_down(1.0, 1.0, PointerButton::Right);
        let action = engine.pointer_up(1.0, 1.0).unwrap();
        assert!(matches!(action, PointerAction::Clear(Some(_))));
        assert_eq!(engine.selection(), None);
    }

    #[test]
    fn redraw_requests_coalesce() {
        let mut engine = fixture();
        engine.request_redraw();
        engine.pan(1.0, 0.0);
        engine.zoom_at(4.0, 4.0, 1.5);
        assert!(engine.take_redraw());
        // флаг схлопнулся: без новых триггеров перерисовка не нужна
        assert!(!engine.take_redraw());
    }

    #[test]
    fn render_frame_produces_viewport_sized_image() {
        let mut engine = fixture();
        engine.assign_owner("north", "red").unwrap();
        while !engine.tick(8) {}
        let img = engine.render_frame();
        assert_eq!(img.dimensions(), (8, 8));
        // политическая раскраска просвечивает в кадре: верх краснее низа
        let top = img.get_pixel(4, 0);
        let bottom = img.get_pixel(4, 7);
        assert!(top[0] > bottom[0]);
    }

    #[test]
    fn invalid_mutation_leaves_state_unchanged() {
        let mut engine = fixture();
        engine.assign_owner("north", "red").unwrap();
        let seq_before = engine.seq;
        assert!(engine.assign_owner("ghost", "red").is_err());
        assert!(engine.assign_owner("south", "ghost").is_err());
        assert_eq!(engine.seq, seq_before);
        assert_eq!(
            engine.ownership().owner_of("north"),
            Some(&"red".to_string())
        );
    }

    #[test]
    fn hover_highlights_and_marks_dirty() {
        let mut engine = fixture();
        engine.take_redraw();
        engine.pointer_move(1.0, 1.0);
        assert!(engine.take_redraw());
        assert_eq!(engine.hover.as_deref(), Some("north"));
    }
}
