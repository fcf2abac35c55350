pub mod index;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

pub use index::ProvinceIndex;

/// Зарезервированный цвет "нет суши" (вода/фон базового растра).
/// Никогда не регистрируется как провинция.
pub const SENTINEL_COLOR: [u8; 3] = [0, 0, 0];

/// Провинция — минимальная адресуемая единица карты.
/// Идентифицируется уникальным цветом в базовом растре.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Province {
    pub id: String,
    pub name: String,
}

/// Строка таблицы определений провинций: цвет + идентификатор + имя.
///
/// Таблица поставляется извне (конвейер подготовки ассетов) и читается один
/// раз при построении индекса; палитра не извлекается из растра.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceDef {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub id: String,
    pub name: String,
}

impl ProvinceDef {
    #[must_use]
    pub fn color(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Загружает таблицу определений провинций из JSON-файла.
pub fn load_province_defs(path: &Path) -> Result<Vec<ProvinceDef>, MapError> {
    let contents = fs::read_to_string(path).map_err(|source| MapError::TableRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| MapError::TableParse {
        path: path.to_path_buf(),
        source,
    })
}
