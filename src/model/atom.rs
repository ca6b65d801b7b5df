use super::types::Element;

/// A single atom of a molecular topology.
///
/// Positions are not stored here: coordinates are conformer-relative and live
/// on [`Conformer`](super::conformer::Conformer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atom {
    pub element: Element,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self { element }
    }
}
