pub mod grid;
pub mod layout;
pub mod placer;
pub mod rect;

pub use layout::{layout_labels, PlacedLabel};
pub use placer::{anchor_for, AnchorJob};

/// Якорь подписи страны: центр наибольшего прямоугольника, вписанного в её
/// территорию. `country` — порядковый номер страны в таблице.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelAnchor {
    pub country: usize,
    pub x: u32,
    pub y: u32,
}
