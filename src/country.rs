// src/country.rs
//! Страны и карта владения.
//!
//! Таблица отображения стран (имя + цвет) поставляется извне и читается
//! движком только для выбора цветов пикселей. Карта владения
//! `провинция → страна` — единственное изменяемое состояние, которым внешний
//! слой (редактор/игра) управляет напрямую; каждая мутация проверяется на
//! границе и возвращает список затронутых стран для точечной инвалидации
//! производных слоёв.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::province::ProvinceIndex;

pub type CountryId = String;

/// Строка таблицы стран: цвет задан HEX-строкой вида `"#rrggbb"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryDef {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Отображаемые атрибуты страны с уже разобранным цветом.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryDisplay {
    pub id: CountryId,
    pub name: String,
    pub color: [u8; 3],
}

/// Разбирает цвет из HEX-строки `"#rrggbb"`.
///
/// Некорректный формат отвергается с описанием причины — состояние таблицы
/// при этом не меняется.
pub fn parse_hex_color(value: &str) -> Result<[u8; 3], MapError> {
    let hex = value.strip_prefix('#').ok_or(MapError::InvalidCountryColor {
        value: value.to_string(),
        reason: "ожидается префикс '#'",
    })?;
    if hex.len() != 6 {
        return Err(MapError::InvalidCountryColor {
            value: value.to_string(),
            reason: "ожидается ровно 6 шестнадцатеричных цифр",
        });
    }
    let parse = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| MapError::InvalidCountryColor {
            value: value.to_string(),
            reason: "недопустимая шестнадцатеричная цифра",
        })
    };
    Ok([parse(0..2)?, parse(2..4)?, parse(4..6)?])
}

/// Таблица стран с доступом по идентификатору и по порядковому номеру.
///
/// Порядковые номера плотные и стабильные — производные буферы (счётчики
/// пикселей, якоря подписей) индексируются ими, а не строками.
#[derive(Debug, Default)]
pub struct CountryTable {
    countries: Vec<CountryDisplay>,
    by_id: HashMap<CountryId, usize>,
}

impl CountryTable {
    pub fn from_defs(defs: &[CountryDef]) -> Result<Self, MapError> {
        let mut countries = Vec::with_capacity(defs.len());
        let mut by_id = HashMap::with_capacity(defs.len());
        for def in defs {
            let color = parse_hex_color(&def.color)?;
            if by_id.contains_key(&def.id) {
                return Err(MapError::DuplicateCountryId {
                    id: def.id.clone(),
                });
            }
            by_id.insert(def.id.clone(), countries.len());
            countries.push(CountryDisplay {
                id: def.id.clone(),
                name: def.name.clone(),
                color,
            });
        }
        Ok(Self { countries, by_id })
    }

    /// Загружает таблицу стран из JSON-файла.
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let contents = fs::read_to_string(path).map_err(|source| MapError::TableRead {
            path: path.to_path_buf(),
            source,
        })?;
        let defs: Vec<CountryDef> =
            serde_json::from_str(&contents).map_err(|source| MapError::TableParse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_defs(&defs)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CountryDisplay> {
        self.by_id.get(id).map(|&i| &self.countries[i])
    }

    #[must_use]
    pub fn ordinal(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    #[must_use]
    pub fn by_ordinal(&self, ordinal: usize) -> Option<&CountryDisplay> {
        self.countries.get(ordinal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryDisplay> {
        self.countries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

/// Строка таблицы владения.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipRow {
    pub province: String,
    pub country: String,
}

/// Загружает таблицу владения из JSON-файла.
pub fn load_ownership(path: &Path) -> Result<Vec<OwnershipRow>, MapError> {
    let contents = fs::read_to_string(path).map_err(|source| MapError::TableRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| MapError::TableParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Результат мутации владения: какие страны затронуты.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipChange {
    /// Провинция, у которой сменился владелец
    pub province: String,
    /// Старый и новый владельцы без повторов; пустой список — мутация
    /// ничего не изменила (повторное назначение того же владельца)
    pub affected: Vec<CountryId>,
}

/// Карта владения: `провинция → страна`. Частичная — отсутствие записи
/// означает "ничья".
#[derive(Debug, Default, Clone)]
pub struct OwnershipMap {
    owners: HashMap<String, CountryId>,
}

impl OwnershipMap {
    /// Назначает провинции владельца. Неизвестная провинция или страна
    /// отвергается, состояние не меняется.
    pub fn assign(
        &mut self,
        index: &ProvinceIndex,
        countries: &CountryTable,
        province_id: &str,
        country_id: &str,
    ) -> Result<OwnershipChange, MapError> {
        if index.get(province_id).is_none() {
            return Err(MapError::UnknownProvince {
                id: province_id.to_string(),
            });
        }
        if countries.get(country_id).is_none() {
            return Err(MapError::UnknownCountry {
                id: country_id.to_string(),
            });
        }
        let previous = self
            .owners
            .insert(province_id.to_string(), country_id.to_string());
        let mut affected = Vec::with_capacity(2);
        match previous {
            Some(old) if old == country_id => {}
            Some(old) => {
                affected.push(old);
                affected.push(country_id.to_string());
            }
            None => affected.push(country_id.to_string()),
        }
        Ok(OwnershipChange {
            province: province_id.to_string(),
            affected,
        })
    }

    /// Снимает владельца с провинции (правый клик в редакторе).
    pub fn clear(
        &mut self,
        index: &ProvinceIndex,
        province_id: &str,
    ) -> Result<OwnershipChange, MapError> {
        if index.get(province_id).is_none() {
            return Err(MapError::UnknownProvince {
                id: province_id.to_string(),
            });
        }
        let previous = self.owners.remove(province_id);
        Ok(OwnershipChange {
            province: province_id.to_string(),
            affected: previous.into_iter().collect(),
        })
    }

    /// Полная замена таблицы ("всё изменилось, пересчитать всё").
    ///
    /// Все строки проверяются до применения: одна битая строка отвергает
    /// таблицу целиком, текущее состояние остаётся нетронутым.
    pub fn bulk_load(
        &mut self,
        index: &ProvinceIndex,
        countries: &CountryTable,
        rows: &[OwnershipRow],
    ) -> Result<(), MapError> {
        let mut fresh = HashMap::with_capacity(rows.len());
        for row in rows {
            if index.get(&row.province).is_none() {
                return Err(MapError::UnknownProvince {
                    id: row.province.clone(),
                });
            }
            if countries.get(&row.country).is_none() {
                return Err(MapError::UnknownCountry {
                    id: row.country.clone(),
                });
            }
            fresh.insert(row.province.clone(), row.country.clone());
        }
        self.owners = fresh;
        Ok(())
    }

    #[must_use]
    pub fn owner_of(&self, province_id: &str) -> Option<&CountryId> {
        self.owners.get(province_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CountryId)> {
        self.owners.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::province::ProvinceDef;
    use crate::raster::PixelRaster;

    fn test_index() -> ProvinceIndex {
        let defs = vec![
            ProvinceDef {
                r: 10,
                g: 0,
                b: 0,
                id: "a".to_string(),
                name: "A".to_string(),
            },
            ProvinceDef {
                r: 0,
                g: 20,
                b: 0,
                id: "b".to_string(),
                name: "B".to_string(),
            },
        ];
        ProvinceIndex::build(&defs, PixelRaster::new(2, 2)).unwrap()
    }

    fn test_countries() -> CountryTable {
        CountryTable::from_defs(&[
            CountryDef {
                id: "red".to_string(),
                name: "Redland".to_string(),
                color: "#c83232".to_string(),
            },
            CountryDef {
                id: "blue".to_string(),
                name: "Bluemark".to_string(),
                color: "#3232c8".to_string(),
            },
        ])
        .unwrap()
    }

    #[test]
    fn parse_hex_color_ok() {
        assert_eq!(parse_hex_color("#a1b2c3").unwrap(), [0xa1, 0xb2, 0xc3]);
    }

    #[test]
    fn parse_hex_color_rejects_malformed() {
        assert!(parse_hex_color("a1b2c3").is_err());
        assert!(parse_hex_color("#a1b2").is_err());
        assert!(parse_hex_color("#zzzzzz").is_err());
    }

    #[test]
    fn assign_reports_affected_countries() {
        let index = test_index();
        let countries = test_countries();
        let mut ownership = OwnershipMap::default();

        let change = ownership.assign(&index, &countries, "a", "red").unwrap();
        assert_eq!(change.affected, vec!["red".to_string()]);

        // смена владельца затрагивает обе страны
        let change = ownership.assign(&index, &countries, "a", "blue").unwrap();
        assert_eq!(
            change.affected,
            vec!["red".to_string(), "blue".to_string()]
        );

        // повторное назначение никого не затрагивает
        let change = ownership.assign(&index, &countries, "a", "blue").unwrap();
        assert!(change.affected.is_empty());
    }

    #[test]
    fn assign_rejects_unknown_ids_without_mutation() {
        let index = test_index();
        let countries = test_countries();
        let mut ownership = OwnershipMap::default();

        assert!(matches!(
            ownership.assign(&index, &countries, "ghost", "red"),
            Err(MapError::UnknownProvince { .. })
        ));
        assert!(matches!(
            ownership.assign(&index, &countries, "a", "ghost"),
            Err(MapError::UnknownCountry { .. })
        ));
        assert!(ownership.is_empty());
    }

    #[test]
    fn clear_returns_previous_owner() {
        let index = test_index();
        let countries = test_countries();
        let mut ownership = OwnershipMap::default();
        ownership.assign(&index, &countries, "a", "red").unwrap();

        let change = ownership.clear(&index, "a").unwrap();
        assert_eq!(change.affected, vec!["red".to_string()]);
        assert!(ownership.owner_of("a").is_none());

        // повторная очистка — допустимый no-op
        let change = ownership.clear(&index, "a").unwrap();
        assert!(change.affected.is_empty());
    }

    #[test]
    fn bulk_load_rejects_bad_row_atomically() {
        let index = test_index();
        let countries = test_countries();
        let mut ownership = OwnershipMap::default();
        ownership.assign(&index, &countries, "a", "red").unwrap();

        let rows = vec![
            OwnershipRow {
                province: "b".to_string(),
                country: "blue".to_string(),
            },
            OwnershipRow {
                province: "ghost".to_string(),
                country: "red".to_string(),
            },
        ];
        assert!(ownership.bulk_load(&index, &countries, &rows).is_err());
        // таблица не изменилась
        assert_eq!(ownership.owner_of("a"), Some(&"red".to_string()));
        assert!(ownership.owner_of("b").is_none());
    }
}
