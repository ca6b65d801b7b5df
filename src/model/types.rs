use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid or unsupported element symbol: '{0}'")]
pub struct ParseElementError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid bond order string: '{0}'")]
pub struct ParseBondOrderError(pub String);

/// Chemical elements covered by the conformer pipeline.
///
/// The set is restricted to main-group elements (plus a few common metals)
/// that the embedding bounds and the empirical force fields can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Element {
    H = 1,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Na = 11,
    Mg = 12,
    Al = 13,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    K = 19,
    Ca = 20,
    Zn = 30,
    Ga = 31,
    Ge = 32,
    As = 33,
    Se = 34,
    Br = 35,
    Sn = 50,
    Sb = 51,
    Te = 52,
    I = 53,
}

impl Element {
    pub fn atomic_number(&self) -> u8 {
        *self as u8
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::Al => "Al",
            Element::Si => "Si",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Zn => "Zn",
            Element::Ga => "Ga",
            Element::Ge => "Ge",
            Element::As => "As",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::Sn => "Sn",
            Element::Sb => "Sb",
            Element::Te => "Te",
            Element::I => "I",
        }
    }

    /// Single-bond covalent radius in Ångströms (Cordero 2008).
    pub fn covalent_radius(&self) -> f64 {
        match self {
            Element::H => 0.31,
            Element::B => 0.84,
            Element::C => 0.76,
            Element::N => 0.71,
            Element::O => 0.66,
            Element::F => 0.57,
            Element::Na => 1.66,
            Element::Mg => 1.41,
            Element::Al => 1.21,
            Element::Si => 1.11,
            Element::P => 1.07,
            Element::S => 1.05,
            Element::Cl => 1.02,
            Element::K => 2.03,
            Element::Ca => 1.76,
            Element::Zn => 1.22,
            Element::Ga => 1.22,
            Element::Ge => 1.20,
            Element::As => 1.19,
            Element::Se => 1.20,
            Element::Br => 1.20,
            Element::Sn => 1.39,
            Element::Sb => 1.39,
            Element::Te => 1.38,
            Element::I => 1.39,
        }
    }

    /// Van der Waals radius in Ångströms (Bondi, with common extensions).
    pub fn vdw_radius(&self) -> f64 {
        match self {
            Element::H => 1.20,
            Element::B => 1.92,
            Element::C => 1.70,
            Element::N => 1.55,
            Element::O => 1.52,
            Element::F => 1.47,
            Element::Na => 2.27,
            Element::Mg => 1.73,
            Element::Al => 1.84,
            Element::Si => 2.10,
            Element::P => 1.80,
            Element::S => 1.80,
            Element::Cl => 1.75,
            Element::K => 2.75,
            Element::Ca => 2.31,
            Element::Zn => 1.39,
            Element::Ga => 1.87,
            Element::Ge => 2.11,
            Element::As => 1.85,
            Element::Se => 1.90,
            Element::Br => 1.85,
            Element::Sn => 2.17,
            Element::Sb => 2.06,
            Element::Te => 2.06,
            Element::I => 1.98,
        }
    }

    /// Pauling electronegativity.
    pub fn electronegativity(&self) -> f64 {
        match self {
            Element::H => 2.20,
            Element::B => 2.04,
            Element::C => 2.55,
            Element::N => 3.04,
            Element::O => 3.44,
            Element::F => 3.98,
            Element::Na => 0.93,
            Element::Mg => 1.31,
            Element::Al => 1.61,
            Element::Si => 1.90,
            Element::P => 2.19,
            Element::S => 2.58,
            Element::Cl => 3.16,
            Element::K => 0.82,
            Element::Ca => 1.00,
            Element::Zn => 1.65,
            Element::Ga => 1.81,
            Element::Ge => 2.01,
            Element::As => 2.18,
            Element::Se => 2.55,
            Element::Br => 2.96,
            Element::Sn => 1.96,
            Element::Sb => 2.05,
            Element::Te => 2.10,
            Element::I => 2.66,
        }
    }

    /// Typical neutral-atom valence used for implicit hydrogen counting.
    ///
    /// `None` for elements (alkali/alkaline-earth metals, zinc) that never
    /// receive implicit hydrogens.
    pub fn typical_valence(&self) -> Option<u8> {
        match self {
            Element::H | Element::F | Element::Cl | Element::Br | Element::I => Some(1),
            Element::O | Element::S | Element::Se | Element::Te => Some(2),
            Element::B
            | Element::N
            | Element::P
            | Element::As
            | Element::Sb
            | Element::Al
            | Element::Ga => Some(3),
            Element::C | Element::Si | Element::Ge | Element::Sn => Some(4),
            Element::Na | Element::Mg | Element::K | Element::Ca | Element::Zn => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" => Ok(Element::H),
            "B" => Ok(Element::B),
            "C" => Ok(Element::C),
            "N" => Ok(Element::N),
            "O" => Ok(Element::O),
            "F" => Ok(Element::F),
            "Na" => Ok(Element::Na),
            "Mg" => Ok(Element::Mg),
            "Al" => Ok(Element::Al),
            "Si" => Ok(Element::Si),
            "P" => Ok(Element::P),
            "S" => Ok(Element::S),
            "Cl" => Ok(Element::Cl),
            "K" => Ok(Element::K),
            "Ca" => Ok(Element::Ca),
            "Zn" => Ok(Element::Zn),
            "Ga" => Ok(Element::Ga),
            "Ge" => Ok(Element::Ge),
            "As" => Ok(Element::As),
            "Se" => Ok(Element::Se),
            "Br" => Ok(Element::Br),
            "Sn" => Ok(Element::Sn),
            "Sb" => Ok(Element::Sb),
            "Te" => Ok(Element::Te),
            "I" => Ok(Element::I),
            other => Err(ParseElementError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution of this bond to the valence of each endpoint.
    pub fn valence_contribution(&self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    /// Numeric order used by bond-length corrections (aromatic = 1.5).
    pub fn numeric(&self) -> f64 {
        self.valence_contribution()
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BondOrder::Single => write!(f, "single"),
            BondOrder::Double => write!(f, "double"),
            BondOrder::Triple => write!(f, "triple"),
            BondOrder::Aromatic => write!(f, "aromatic"),
        }
    }
}

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "single" => Ok(BondOrder::Single),
            "2" | "double" => Ok(BondOrder::Double),
            "3" | "triple" => Ok(BondOrder::Triple),
            "ar" | "aromatic" => Ok(BondOrder::Aromatic),
            other => Err(ParseBondOrderError(other.to_string())),
        }
    }
}
