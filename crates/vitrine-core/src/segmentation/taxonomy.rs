//! Human parsing label sets and their display colors.

/// A fixed index → label naming for one parsing network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Taxonomy {
    pub name: &'static str,
    labels: &'static [&'static str],
}

impl Taxonomy {
    /// Label for a mask index, if the taxonomy defines one.
    pub fn label(&self, index: u8) -> Option<&'static str> {
        self.labels.get(index as usize).copied()
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }
}

/// Mask index of the background class in both taxonomies.
pub const BACKGROUND_INDEX: u8 = 0;

/// ATR: 18 classes.
pub const ATR: Taxonomy = Taxonomy {
    name: "atr",
    labels: &[
        "Background",
        "Hat",
        "Hair",
        "Sunglasses",
        "Upper-clothes",
        "Skirt",
        "Pants",
        "Dress",
        "Belt",
        "Left-shoe",
        "Right-shoe",
        "Face",
        "Left-leg",
        "Right-leg",
        "Left-arm",
        "Right-arm",
        "Bag",
        "Scarf",
    ],
};

/// LIP: 20 classes.
pub const LIP: Taxonomy = Taxonomy {
    name: "lip",
    labels: &[
        "Background",
        "Hat",
        "Hair",
        "Glove",
        "Sunglasses",
        "Upper-clothes",
        "Dress",
        "Coat",
        "Socks",
        "Pants",
        "Jumpsuits",
        "Scarf",
        "Skirt",
        "Face",
        "Left-arm",
        "Right-arm",
        "Left-leg",
        "Right-leg",
        "Left-shoe",
        "Right-shoe",
    ],
};

/// Color for labels missing from [`LABEL_COLORS`].
pub const FALLBACK_COLOR: &str = "#CCCCCC";

/// Display color per canonical label.
pub const LABEL_COLORS: &[(&str, &str)] = &[
    ("Background", "#222222"),
    ("Hat", "#FFB300"),
    ("Hair", "#803E75"),
    ("Glove", "#FF6800"),
    ("Sunglasses", "#A6BDD7"),
    ("Upper-clothes", "#C10020"),
    ("Dress", "#CEA262"),
    ("Coat", "#817066"),
    ("Socks", "#007D34"),
    ("Pants", "#F6768E"),
    ("Jumpsuits", "#00538A"),
    ("Scarf", "#FF7A5C"),
    ("Skirt", "#53377A"),
    ("Face", "#FF8E00"),
    ("Left-arm", "#B32851"),
    ("Right-arm", "#F4C800"),
    ("Left-leg", "#7F180D"),
    ("Right-leg", "#93AA00"),
    ("Left-shoe", "#593315"),
    ("Right-shoe", "#F13A13"),
    ("Belt", "#232C16"),
    ("Bag", "#B0B0B0"),
];

/// Hex color for a label, [`FALLBACK_COLOR`] when it has none.
pub fn label_color(label: &str) -> &'static str {
    LABEL_COLORS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, hex)| *hex)
        .unwrap_or(FALLBACK_COLOR)
}

/// Layering rank of a label: background 0, limbs/shoes/socks 1, garments and
/// face 2, accessories 3, hair 4. Unknown labels rank 0.
pub fn label_priority(label: &str) -> u8 {
    match label {
        "Left-arm" | "Right-arm" | "Left-leg" | "Right-leg" | "Left-shoe" | "Right-shoe"
        | "Socks" => 1,
        "Upper-clothes" | "Coat" | "Dress" | "Pants" | "Skirt" | "Jumpsuits" | "Face" => 2,
        "Belt" | "Scarf" | "Glove" | "Hat" | "Sunglasses" | "Bag" => 3,
        "Hair" => 4,
        _ => 0,
    }
}

/// Parse `#RRGGBB`.
pub fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_sizes() {
        assert_eq!(ATR.len(), 18);
        assert_eq!(LIP.len(), 20);
        assert_eq!(ATR.label(BACKGROUND_INDEX), Some("Background"));
        assert_eq!(LIP.label(BACKGROUND_INDEX), Some("Background"));
        assert_eq!(ATR.label(17), Some("Scarf"));
        assert_eq!(ATR.label(18), None);
        assert_eq!(LIP.label(19), Some("Right-shoe"));
    }

    #[test]
    fn test_every_taxonomy_label_has_a_color() {
        for label in ATR.labels().iter().chain(LIP.labels()) {
            assert_ne!(label_color(label), FALLBACK_COLOR, "{label}");
        }
        assert_eq!(label_color("Cape"), FALLBACK_COLOR);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#C10020"), Some([0xC1, 0x00, 0x20]));
        assert_eq!(parse_hex("#ccc"), None);
        assert_eq!(parse_hex("C10020"), None);
        assert_eq!(parse_hex("#GG0000"), None);
    }

    #[test]
    fn test_label_priority() {
        assert_eq!(label_priority("Background"), 0);
        assert_eq!(label_priority("Socks"), 1);
        assert_eq!(label_priority("Face"), 2);
        assert_eq!(label_priority("Bag"), 3);
        assert_eq!(label_priority("Hair"), 4);
    }
}
