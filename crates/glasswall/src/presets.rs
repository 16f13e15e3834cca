use glassfield::GradientStops;

/// Named four-stop palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub colors: [&'static str; 4],
}

impl Preset {
    /// Lower-case, hyphenated form accepted on the command line.
    pub fn id(&self) -> String {
        self.name.to_ascii_lowercase().replace(' ', "-")
    }

    pub fn stops(&self) -> GradientStops {
        let [dark, mid, bright, accent] = self.colors;
        GradientStops::new(dark, mid, bright, accent)
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "Pink Neon",
        colors: ["#0a0515", "#581c87", "#ec4899", "#06b6d4"],
    },
    Preset {
        name: "Orange Flame",
        colors: ["#0c0a09", "#7c2d12", "#f97316", "#fbbf24"],
    },
    Preset {
        name: "Blue Ocean",
        colors: ["#020617", "#1e3a8a", "#3b82f6", "#67e8f9"],
    },
    Preset {
        name: "Gold Lux",
        colors: ["#0f0c06", "#78350f", "#f59e0b", "#fef3c7"],
    },
    Preset {
        name: "Aurora",
        colors: ["#022c22", "#065f46", "#10b981", "#a78bfa"],
    },
    Preset {
        name: "Magenta",
        colors: ["#1a0a1a", "#86198f", "#d946ef", "#f0abfc"],
    },
];

/// Looks up a preset by display name or id, ignoring case.
pub fn find(value: &str) -> Option<&'static Preset> {
    let wanted = value.trim().to_ascii_lowercase().replace([' ', '_'], "-");
    PRESETS.iter().find(|preset| preset.id() == wanted)
}

pub fn ids() -> Vec<String> {
    PRESETS.iter().map(Preset::id).collect()
}

/// Index of the preset after `current`, wrapping around.
pub fn next_index(current: usize) -> usize {
    (current + 1) % PRESETS.len()
}

/// Position of the preset whose colors match `stops`, if any.
pub fn position_of(stops: &GradientStops) -> Option<usize> {
    PRESETS.iter().position(|preset| preset.stops() == *stops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glassfield::MAGENTA_SENTINEL;

    #[test]
    fn every_preset_decodes_cleanly() {
        for preset in PRESETS {
            for rgb in preset.stops().decode() {
                assert_ne!(rgb, MAGENTA_SENTINEL, "{} has a malformed stop", preset.name);
            }
        }
    }

    #[test]
    fn lookup_accepts_names_and_ids() {
        assert_eq!(find("Gold Lux").map(|p| p.name), Some("Gold Lux"));
        assert_eq!(find("blue-ocean").map(|p| p.name), Some("Blue Ocean"));
        assert_eq!(find(" ORANGE_FLAME ").map(|p| p.name), Some("Orange Flame"));
        assert!(find("teal").is_none());
    }

    #[test]
    fn default_gradient_is_first_preset() {
        assert_eq!(position_of(&GradientStops::default()), Some(0));
        assert_eq!(next_index(0), 1);
        assert_eq!(next_index(PRESETS.len() - 1), 0);
    }
}
