use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Motherboard/case size classes, smallest to largest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormFactor {
    MiniItx,
    MicroAtx,
    Atx,
    EAtx,
    SsiEeb,
    /// Text that matched no known class, lower-cased and trimmed.
    Other(String),
}

static SSI_EEB_FITS: [FormFactor; 5] = [
    FormFactor::SsiEeb,
    FormFactor::EAtx,
    FormFactor::Atx,
    FormFactor::MicroAtx,
    FormFactor::MiniItx,
];
static E_ATX_FITS: [FormFactor; 4] = [
    FormFactor::EAtx,
    FormFactor::Atx,
    FormFactor::MicroAtx,
    FormFactor::MiniItx,
];
static ATX_FITS: [FormFactor; 3] = [FormFactor::Atx, FormFactor::MicroAtx, FormFactor::MiniItx];
static MICRO_ATX_FITS: [FormFactor; 2] = [FormFactor::MicroAtx, FormFactor::MiniItx];
static MINI_ITX_FITS: [FormFactor; 1] = [FormFactor::MiniItx];
static NO_FITS: [FormFactor; 0] = [];

impl FormFactor {
    pub fn label(&self) -> &str {
        match self {
            Self::MiniItx => "mini-itx",
            Self::MicroAtx => "micro-atx",
            Self::Atx => "atx",
            Self::EAtx => "e-atx",
            Self::SsiEeb => "ssi-eeb",
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Board form factors a case of this class accepts.
    pub fn accepted_boards(&self) -> &'static [FormFactor] {
        match self {
            Self::SsiEeb => &SSI_EEB_FITS,
            Self::EAtx => &E_ATX_FITS,
            Self::Atx => &ATX_FITS,
            Self::MicroAtx => &MICRO_ATX_FITS,
            Self::MiniItx => &MINI_ITX_FITS,
            Self::Other(_) => &NO_FITS,
        }
    }

    pub fn accepts(&self, board: &FormFactor) -> bool {
        self.accepted_boards().contains(board)
    }
}

impl fmt::Display for FormFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify free-form form factor text by keyword priority.
pub fn normalize_form_factor(raw: &str) -> FormFactor {
    let lowered = raw.trim().to_ascii_lowercase();

    if lowered.contains("itx") {
        FormFactor::MiniItx
    } else if lowered.contains("micro") || lowered.contains("matx") {
        FormFactor::MicroAtx
    } else if lowered.contains("extend") || lowered.contains("e-atx") || lowered.contains("eatx")
    {
        FormFactor::EAtx
    } else if lowered.contains("eeb") {
        FormFactor::SsiEeb
    } else if lowered.contains("atx") {
        FormFactor::Atx
    } else {
        warn!(form_factor = %raw, "unrecognized form factor");
        FormFactor::Other(lowered)
    }
}

/// Lower-case a socket string and drop a leading "socket" token.
pub fn normalize_socket(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let without_prefix = lowered.strip_prefix("socket").unwrap_or(&lowered);
    without_prefix
        .trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string()
}

fn compact_socket(raw: &str) -> String {
    normalize_socket(raw)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

fn am_family(socket: &str) -> Option<&'static str> {
    if socket.contains("am5") {
        Some("am5")
    } else if socket.contains("am4") {
        Some("am4")
    } else {
        None
    }
}

/// Socket compatibility with substring overlap, except for the families that
/// alias too easily: LGA1851 and AM4/AM5 must match exactly.
pub fn sockets_compatible(a: &str, b: &str) -> bool {
    let left = compact_socket(a);
    let right = compact_socket(b);
    if left.is_empty() || right.is_empty() {
        return false;
    }

    if left.contains("1851") || right.contains("1851") {
        return left.contains("1851") && right.contains("1851");
    }

    match (am_family(&left), am_family(&right)) {
        (None, None) => {}
        (Some(x), Some(y)) => return x == y,
        _ => return false,
    }

    left.contains(&right) || right.contains(&left)
}

/// Leading number in front of a unit token, e.g. `("12GB", "gb") -> 12.0`.
///
/// An empty unit parses the leading number of the whole string.
pub fn extract_quantity(raw: &str, unit: &str) -> Option<f64> {
    let lowered = raw.trim().to_ascii_lowercase();
    let unit = unit.trim().to_ascii_lowercase();

    let prefix = if unit.is_empty() {
        lowered.as_str()
    } else {
        match lowered.find(&unit) {
            Some(index) => &lowered[..index],
            None => lowered.as_str(),
        }
    };

    let parsed = leading_number(prefix.trim());
    if parsed.is_none() {
        debug!(value = %raw, unit = %unit, "unparseable attribute quantity");
    }
    parsed
}

/// Catalog prices arrive as "1 299 kr", "1,299.00" or plain numbers.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .to_ascii_lowercase()
        .trim_end_matches("kr")
        .trim_end_matches("sek")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '\u{a0}')
        .collect();

    let parsed = leading_number(&cleaned).filter(|price| *price >= 0.0);
    if parsed.is_none() {
        debug!(value = %raw, "unparseable price");
    }
    parsed
}

fn leading_number(value: &str) -> Option<f64> {
    let digits: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();

    if digits.is_empty() {
        return None;
    }

    digits.parse::<f64>().ok().filter(|number| number.is_finite())
}
