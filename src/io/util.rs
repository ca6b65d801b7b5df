use crate::model::types::{BondOrder, Element};

/// Infers an element from an SDF symbol token, tolerating case sloppiness
/// ("CL", "cl") seen in files exported by other tools.
pub fn guess_element_symbol(token: &str) -> Option<Element> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if let Ok(elem) = token.parse::<Element>() {
        return Some(elem);
    }

    let mut normalized = String::with_capacity(token.len());
    let mut chars = token.chars();
    normalized.extend(chars.next().map(|c| c.to_ascii_uppercase()));
    normalized.extend(chars.map(|c| c.to_ascii_lowercase()));
    normalized.parse::<Element>().ok()
}

/// Maps a ctfile (V2000) bond type value to a bond order.
pub fn bond_order_from_ctfile(value: i32) -> Option<BondOrder> {
    match value {
        1 => Some(BondOrder::Single),
        2 => Some(BondOrder::Double),
        3 => Some(BondOrder::Triple),
        4 => Some(BondOrder::Aromatic),
        _ => None,
    }
}

/// Maps a bond order back to its ctfile (V2000) bond type value.
pub fn bond_order_to_ctfile(order: BondOrder) -> i32 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
    }
}
