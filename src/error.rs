// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Ошибки движка карты.
///
/// Ошибки загрузки ассетов различимы по имени ассета: при падении
/// инициализации по журналу сразу видно, какой именно файл битый.
/// Промахи поиска (точка за картой, незарегистрированный цвет, страна без
/// якоря) ошибками не являются и возвращаются как `None`/пустой результат.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("не удалось загрузить ассет '{asset}' из {path:?}: {source}")]
    AssetLoad {
        asset: &'static str,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "ассет '{asset}': ожидался размер {expected_w}×{expected_h}, получен {actual_w}×{actual_h}"
    )]
    AssetDimensions {
        asset: &'static str,
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("не удалось прочитать файл конфигурации {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("некорректный TOML в {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("некорректная конфигурация: {reason}")]
    ConfigInvalid { reason: String },

    #[error("не удалось прочитать таблицу {path:?}: {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("некорректный JSON в {path:?}: {source}")]
    TableParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Нарушение инварианта таблицы определений: один цвет — одна провинция.
    #[error("цвет провинции '{second}' уже занят провинцией '{first}'")]
    DuplicateProvinceColor {
        color: [u8; 3],
        first: String,
        second: String,
    },

    #[error("идентификатор провинции '{id}' встречается в таблице дважды")]
    DuplicateProvinceId { id: String },

    /// Чёрный цвет зарезервирован под "нет суши" и не может быть провинцией.
    #[error("провинция '{id}' использует зарезервированный цвет фона")]
    ReservedProvinceColor { id: String },

    #[error("некорректный цвет страны '{value}': {reason}")]
    InvalidCountryColor { value: String, reason: &'static str },

    #[error("идентификатор страны '{id}' встречается в таблице дважды")]
    DuplicateCountryId { id: String },

    #[error("неизвестная провинция '{id}'")]
    UnknownProvince { id: String },

    #[error("неизвестная страна '{id}'")]
    UnknownCountry { id: String },
}
