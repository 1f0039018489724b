//! Named color lists.

use crate::pipeline::{Stage, StageKernel};

/// Maximum number of device colorants of a named color.
pub const MAX_COLORANTS: usize = 15;

/// A single named color.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedColor {
    pub name: String,
    /// V4 Lab or XYZ, 16-bit encoded.
    pub pcs: [u16; 3],
    pub device_colorant: Vec<u16>,
}

/// A list of named colors with a common number of device colorants.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedColorList {
    pub prefix: String,
    pub suffix: String,
    colorants: usize,
    colors: Vec<NamedColor>,
}

impl NamedColorList {
    /// Creates an empty list. Returns None if there are too many colorants.
    pub fn new(colorants: usize, prefix: &str, suffix: &str) -> Option<Self> {
        if colorants > MAX_COLORANTS {
            return None;
        }
        Some(NamedColorList {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            colorants,
            colors: Vec::new(),
        })
    }

    /// Appends a color. Missing colorants are set to zero and extra ones are dropped.
    pub fn push(&mut self, name: &str, pcs: [u16; 3], colorant: &[u16]) {
        let mut device_colorant = vec![0; self.colorants];
        for (out, value) in device_colorant.iter_mut().zip(colorant) {
            *out = *value;
        }
        self.colors.push(NamedColor {
            name: name.to_string(),
            pcs,
            device_colorant,
        });
    }

    /// Number of device colorants per color.
    pub fn colorants(&self) -> usize {
        self.colorants
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NamedColor> {
        self.colors.get(index)
    }

    /// Finds a color by name, ignoring case.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.colors
            .iter()
            .position(|color| color.name.eq_ignore_ascii_case(name))
    }
}

impl Stage {
    /// Creates a stage that maps a color index (in 0..1, scaled by 65535) to its device
    /// colorants, or to its PCS value with `use_pcs`.
    pub fn new_named(list: NamedColorList, use_pcs: bool) -> Stage {
        Stage::new(StageKernel::NamedColor { list, use_pcs })
    }
}
