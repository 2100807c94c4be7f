//! Fixed species, baseline, and dietary-factor catalogs.

use serde::Serialize;

/// Number of tracked species; every abundance vector is index-aligned to [`SPECIES`].
pub const SPECIES_COUNT: usize = 8;

/// Relative abundances in percent, one entry per species.
pub type AbundanceVector = [f64; SPECIES_COUNT];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Species {
    pub name: &'static str,
    /// Display color as `(r, g, b)`; irrelevant to the simulation itself.
    pub color: (u8, u8, u8),
}

impl Species {
    pub fn hex_color(&self) -> String {
        let (r, g, b) = self.color;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

pub const SPECIES: [Species; SPECIES_COUNT] = [
    Species {
        name: "Bifidobacterium adolescentis",
        color: (0x58, 0xa6, 0xff),
    },
    Species {
        name: "Agathobacter sp.",
        color: (0x3f, 0xb9, 0x50),
    },
    Species {
        name: "Coprobacillus cateniformis",
        color: (0x79, 0xc0, 0xff),
    },
    Species {
        name: "Agathobaculum butyriciproducens",
        color: (0xa3, 0x71, 0xf7),
    },
    Species {
        name: "Faecalibacterium longum",
        color: (0xf0, 0x88, 0x3e),
    },
    Species {
        name: "Bilophila wadsworthia",
        color: (0xf8, 0x51, 0x49),
    },
    Species {
        name: "Ruminococcus gnavus",
        color: (0xff, 0xa6, 0x57),
    },
    Species {
        name: "Bacteroides vulgatus",
        color: (0xd1, 0x86, 0x16),
    },
];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Baseline {
    pub label: &'static str,
    pub abundances: AbundanceVector,
}

pub const BASELINES: [Baseline; 3] = [
    Baseline {
        label: "Balanced",
        abundances: [22.0, 18.0, 12.0, 15.0, 20.0, 4.0, 6.0, 3.0],
    },
    Baseline {
        label: "Dysbiotic",
        abundances: [18.0, 14.0, 10.0, 12.0, 17.0, 6.0, 12.0, 5.0],
    },
    Baseline {
        label: "Bifido-rich",
        abundances: [32.0, 16.0, 11.0, 14.0, 18.0, 3.0, 4.0, 2.0],
    },
];

pub fn baseline(index: usize) -> Option<&'static Baseline> {
    BASELINES.get(index)
}

/// A named dietary pressure applied once per simulated week.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DietaryFactor {
    pub key: &'static str,
    pub label: &'static str,
    pub deltas: [f64; SPECIES_COUNT],
}

pub const DIETARY_FACTORS: [DietaryFactor; 10] = [
    DietaryFactor {
        key: "redmeat",
        label: "Red meat",
        deltas: [-2.0, -3.0, -1.0, -4.0, -5.0, 4.0, 2.0, 3.0],
    },
    DietaryFactor {
        key: "fried",
        label: "Fried food",
        deltas: [-3.0, -2.0, -2.0, -3.0, -4.0, 3.0, 4.0, 2.0],
    },
    DietaryFactor {
        key: "soda",
        label: "Soda",
        deltas: [-4.0, -3.0, -1.0, -2.0, -3.0, 2.0, 1.0, 1.0],
    },
    DietaryFactor {
        key: "emulsifier",
        label: "Emulsifiers",
        deltas: [-5.0, -4.0, -6.0, -3.0, -4.0, 5.0, 6.0, 2.0],
    },
    DietaryFactor {
        key: "alcohol",
        label: "Alcohol",
        deltas: [-6.0, -2.0, -1.0, -2.0, -3.0, 3.0, 1.0, 1.0],
    },
    DietaryFactor {
        key: "dairy",
        label: "Dairy",
        deltas: [-5.0, -1.0, 0.0, -1.0, -2.0, 1.0, 1.0, 0.0],
    },
    DietaryFactor {
        key: "fiber",
        label: "Fiber",
        deltas: [6.0, 5.0, 4.0, 7.0, 8.0, -3.0, -4.0, -2.0],
    },
    DietaryFactor {
        key: "berries",
        label: "Berries",
        deltas: [4.0, 3.0, 2.0, 4.0, 5.0, -2.0, -2.0, -1.0],
    },
    DietaryFactor {
        key: "olive",
        label: "Olive oil",
        deltas: [3.0, 2.0, 2.0, 3.0, 4.0, -2.0, -1.0, -1.0],
    },
    DietaryFactor {
        key: "fermented",
        label: "Fermented food",
        deltas: [7.0, 3.0, 3.0, 4.0, 6.0, -2.0, -2.0, -1.0],
    },
];

/// Looks up a factor by its key. Unknown keys yield `None` and are treated as no-ops.
pub fn dietary_factor(key: &str) -> Option<&'static DietaryFactor> {
    DIETARY_FACTORS.iter().find(|factor| factor.key == key)
}

/// Sums the delta vectors of every known factor in `keys`.
pub fn combined_delta<S: AsRef<str>>(keys: &[S]) -> [f64; SPECIES_COUNT] {
    let mut delta = [0.0; SPECIES_COUNT];
    for factor in keys.iter().filter_map(|key| dietary_factor(key.as_ref())) {
        for (slot, d) in delta.iter_mut().zip(factor.deltas.iter()) {
            *slot += d;
        }
    }
    delta
}

/// Serializable view of every catalog, handed to API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub species: Vec<Species>,
    pub baselines: Vec<Baseline>,
    pub factors: Vec<DietaryFactor>,
}

impl CatalogView {
    pub fn current() -> Self {
        Self {
            species: SPECIES.to_vec(),
            baselines: BASELINES.to_vec(),
            factors: DIETARY_FACTORS.to_vec(),
        }
    }
}
