use crate::color::ColorId;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum Cell {
    Terminus { color: ColorId },
    Path { color: ColorId },
    #[default]
    Empty,
}

impl Cell {
    /// The colour claiming this cell, if any.
    #[inline]
    pub(crate) fn owner(&self) -> Option<ColorId> {
        match self {
            Cell::Terminus { color } | Cell::Path { color } => Some(*color),
            Cell::Empty => None,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}
