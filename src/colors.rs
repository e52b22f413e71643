//! Deterministic category colors.

use crate::error::{OncoError, Result};
use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#RRGGBB` or `r,g,b`.
    pub fn parse(token: &str) -> Result<Rgb> {
        let token = token.trim();
        let invalid = || OncoError::InvalidColor(token.to_string());

        if let Some(hex) = token.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(invalid());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
            Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
        } else {
            let rgb_parts: Vec<u8> = token
                .split(',')
                .map(|s| s.trim().parse().map_err(|_| invalid()))
                .collect::<Result<_>>()?;
            match rgb_parts.as_slice() {
                [r, g, b] => Ok(Rgb(*r, *g, *b)),
                _ => Err(invalid()),
            }
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Label used for missing values
pub const NA_LABEL: &str = "NA";

/// Neutral grey for missing values
pub const NA_COLOR: Rgb = Rgb(179, 179, 179);

/// Background of unaltered matrix cells
pub const BACKGROUND_COLOR: Rgb = Rgb(204, 204, 204);

pub fn is_missing_label(label: &str) -> bool {
    let label = label.trim();
    label.is_empty() || label == NA_LABEL || label.eq_ignore_ascii_case("nan")
}

/// Built-in colors for well-known alteration classes
const VARIANT_PALETTE: [(&str, Rgb); 19] = [
    ("Nonstop_Mutation", Rgb(166, 206, 227)),
    ("Frame_Shift_Del", Rgb(31, 120, 180)),
    ("IGR", Rgb(178, 223, 138)),
    ("Missense_Mutation", Rgb(51, 160, 44)),
    ("Silent", Rgb(251, 154, 153)),
    ("Nonsense_Mutation", Rgb(227, 26, 28)),
    ("RNA", Rgb(253, 191, 111)),
    ("Splice_Site", Rgb(255, 127, 0)),
    ("Intron", Rgb(202, 178, 214)),
    ("Frame_Shift_Ins", Rgb(106, 61, 154)),
    ("In_Frame_Del", Rgb(177, 89, 40)),
    ("ITD", Rgb(158, 1, 66)),
    ("In_Frame_Ins", Rgb(213, 62, 79)),
    ("Translation_Start_Site", Rgb(244, 109, 67)),
    ("Multi_Hit", Rgb(0, 0, 0)),
    ("Amp", Rgb(238, 130, 238)),
    ("Del", Rgb(65, 105, 225)),
    ("Complex_Event", Rgb(123, 112, 96)),
    ("pathway", Rgb(83, 92, 104)),
];

/// Qualitative palettes (ColorBrewer Set1, Dark2, Set2, one Set3) used in order
const GENERATED_PALETTE: [Rgb; 25] = [
    Rgb(228, 26, 28),
    Rgb(55, 126, 184),
    Rgb(77, 175, 74),
    Rgb(152, 78, 163),
    Rgb(255, 127, 0),
    Rgb(255, 255, 51),
    Rgb(166, 86, 40),
    Rgb(247, 129, 191),
    Rgb(153, 153, 153),
    Rgb(27, 158, 119),
    Rgb(217, 95, 2),
    Rgb(117, 112, 179),
    Rgb(231, 41, 138),
    Rgb(102, 166, 30),
    Rgb(230, 171, 2),
    Rgb(166, 118, 29),
    Rgb(102, 102, 102),
    Rgb(102, 194, 165),
    Rgb(252, 141, 98),
    Rgb(141, 160, 203),
    Rgb(231, 138, 195),
    Rgb(166, 216, 84),
    Rgb(255, 217, 47),
    Rgb(229, 196, 148),
    Rgb(141, 211, 199),
];

pub fn builtin_variant_color(label: &str) -> Option<Rgb> {
    VARIANT_PALETTE.iter().find(|(name, _)| *name == label).map(|(_, c)| *c)
}

/// SHA-256 derived color for a label, brightened and normalised by sum.
///
/// `attempt` perturbs the hash input so that a claimed color can be skipped
/// without leaving the deterministic sequence.
pub fn hashed_color(label: &str, attempt: u32) -> Rgb {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    if attempt > 0 {
        hasher.update(attempt.to_le_bytes());
    }
    let result = hasher.finalize();

    let mut r = result[24] as f32 / 255.0;
    let mut g = result[8] as f32 / 255.0;
    let mut b = result[16] as f32 / 255.0;

    let sum = r + g + b;
    if sum > 0.0 {
        r /= sum;
        g /= sum;
        b /= sum;
    }

    let max_component = r.max(g).max(b);
    let f = if max_component > 0.0 { 1.5f32.min(1.0 / max_component) } else { 1.0 };

    Rgb(
        (255.0 * (r * f).min(1.0)).round() as u8,
        (255.0 * (g * f).min(1.0)).round() as u8,
        (255.0 * (b * f).min(1.0)).round() as u8,
    )
}

/// What a set of labels describes; decides whether built-in colors apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    Alteration,
    Annotation,
}

/// Total label → color mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    entries: Vec<(String, Rgb)>,
    index: FxHashMap<String, usize>,
    used: FxHashSet<Rgb>,
}

impl ColorTable {
    fn insert(&mut self, label: &str, color: Rgb) {
        self.index.insert(label.to_string(), self.entries.len());
        self.entries.push((label.to_string(), color));
        self.used.insert(color);
    }

    /// Color of a label. Missing values resolve to [`NA_COLOR`]; labels never
    /// assigned fall back to the first hashed color that is neither assigned
    /// in this table nor [`NA_COLOR`].
    pub fn get(&self, label: &str) -> Rgb {
        if is_missing_label(label) {
            return NA_COLOR;
        }
        if let Some(&i) = self.index.get(label) {
            return self.entries[i].1;
        }
        let mut attempt = 0;
        loop {
            let c = hashed_color(label, attempt);
            if c != NA_COLOR && !self.used.contains(&c) {
                return c;
            }
            attempt += 1;
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Assigned entries in assignment input order
    pub fn entries(&self) -> &[(String, Rgb)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps category labels to colors, honouring caller overrides.
#[derive(Debug, Clone, Default)]
pub struct ColorAssigner {
    overrides: FxHashMap<String, Rgb>,
}

impl ColorAssigner {
    pub fn new(overrides: FxHashMap<String, Rgb>) -> Self {
        ColorAssigner { overrides }
    }

    /// Parse `label -> color token` pairs.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let mut overrides = FxHashMap::default();
        for (label, token) in pairs {
            overrides.insert(label.clone(), Rgb::parse(token)?);
        }
        Ok(ColorAssigner { overrides })
    }

    /// Assign a color to every distinct label, in first-seen order.
    ///
    /// Order of precedence: missing values, caller overrides, built-in
    /// alteration colors (for [`PaletteKind::Alteration`]), then the generated
    /// palette. Built-in and generated colors are never reused.
    pub fn assign<S: AsRef<str>>(&self, labels: &[S], kind: PaletteKind) -> ColorTable {
        let mut distinct: Vec<&str> = Vec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for label in labels {
            let label = label.as_ref();
            if seen.insert(label) {
                distinct.push(label);
            }
        }

        let mut claimed: FxHashSet<Rgb> = self.overrides.values().copied().collect();
        claimed.insert(NA_COLOR);

        let mut colors: Vec<Option<Rgb>> = vec![None; distinct.len()];

        let mut override_owner: FxHashMap<Rgb, &str> = FxHashMap::default();
        for (i, label) in distinct.iter().enumerate() {
            if is_missing_label(label) {
                colors[i] = Some(NA_COLOR);
            } else if let Some(&color) = self.overrides.get(*label) {
                if let Some(other) = override_owner.insert(color, *label) {
                    warn!("Color override {} is shared by '{}' and '{}'", color, other, label);
                }
                colors[i] = Some(color);
            }
        }

        if kind == PaletteKind::Alteration {
            for (i, label) in distinct.iter().enumerate() {
                if colors[i].is_some() {
                    continue;
                }
                if let Some(color) = builtin_variant_color(label) {
                    if claimed.insert(color) {
                        colors[i] = Some(color);
                    }
                }
            }
        }

        let mut palette = GENERATED_PALETTE.iter().copied();
        for (i, label) in distinct.iter().enumerate() {
            if colors[i].is_some() {
                continue;
            }
            let color = palette
                .by_ref()
                .find(|c| !claimed.contains(c))
                .unwrap_or_else(|| {
                    let mut attempt = 0;
                    loop {
                        let c = hashed_color(label, attempt);
                        if !claimed.contains(&c) {
                            break c;
                        }
                        attempt += 1;
                    }
                });
            claimed.insert(color);
            colors[i] = Some(color);
        }

        let mut table = ColorTable::default();
        for (label, color) in distinct.iter().zip(colors) {
            table.insert(label, color.unwrap_or(NA_COLOR));
        }
        table
    }
}

/// Explicit categorical ↔ index encoding with reverse lookup.
///
/// Levels keep first-seen order; missing values are not levels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalEncoding {
    levels: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl CategoricalEncoding {
    pub fn from_labels<'a, I: IntoIterator<Item = &'a str>>(labels: I) -> Self {
        let mut encoding = CategoricalEncoding::default();
        for label in labels {
            if is_missing_label(label) || encoding.index.contains_key(label) {
                continue;
            }
            encoding.index.insert(label.to_string(), encoding.levels.len());
            encoding.levels.push(label.to_string());
        }
        encoding
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.levels.get(index).map(String::as_str)
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
