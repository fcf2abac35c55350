pub mod country;
pub mod province;

pub use country::extract_country_borders;
pub use province::{extract_province_border, ProvinceBorderCache};

/// Вид границы: контур конкретной провинции или общий слой границ стран.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorderKind {
    Province(String),
    Country,
}

/// Неупорядоченный набор граничных пикселей.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderSet {
    pub kind: BorderKind,
    pub pixels: Vec<(u32, u32)>,
}

impl BorderSet {
    #[must_use]
    pub fn empty(kind: BorderKind) -> Self {
        Self {
            kind,
            pixels: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.pixels.iter().copied()
    }
}
