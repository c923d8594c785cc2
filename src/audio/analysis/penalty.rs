use crate::audio::config;
use crate::audio::types::{PenaltyMap, PlatformTarget};

/// Reference loudness levels the major streaming platforms normalize to.
pub const PLATFORM_TARGETS: [PlatformTarget; 6] = [
    PlatformTarget {
        name: "Spotify",
        target_lufs: -14.0,
    },
    PlatformTarget {
        name: "YouTube",
        target_lufs: -14.0,
    },
    PlatformTarget {
        name: "Apple Music",
        target_lufs: -16.0,
    },
    PlatformTarget {
        name: "Tidal",
        target_lufs: -14.0,
    },
    PlatformTarget {
        name: "Amazon Music",
        target_lufs: -14.0,
    },
    PlatformTarget {
        name: "Deezer",
        target_lufs: -15.0,
    },
];

/// Maps an integrated loudness to the gain correction each platform would
/// apply. Pure and total: negative-infinity loudness yields positive-infinity
/// penalties, which the gain stage clamps at render time. The "Original"
/// entry always carries a correction of zero.
pub fn penalties(integrated_lufs: f64) -> PenaltyMap {
    let mut map: PenaltyMap = PLATFORM_TARGETS
        .iter()
        .map(|target| (target.name.to_string(), target.target_lufs - integrated_lufs))
        .collect();
    map.insert(config::DEFAULT_TARGET_NAME.to_string(), 0.0);
    map
}

/// Looks up one target's penalty, defaulting to the zero-correction
/// "Original" behavior for unknown names.
pub fn penalty_for(penalties: &PenaltyMap, target: &str) -> f64 {
    penalties.get(target).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_is_always_zero() {
        for lufs in [-60.0, -23.0, -14.0, 0.0, f64::NEG_INFINITY] {
            assert_eq!(penalties(lufs)["Original"], 0.0);
        }
    }

    #[test]
    fn penalty_is_target_minus_measured() {
        let map = penalties(-20.0);
        for target in &PLATFORM_TARGETS {
            assert_eq!(map[target.name], target.target_lufs + 20.0);
        }
        assert_eq!(map["Apple Music"], 4.0);
        assert_eq!(map["Spotify"], 6.0);
        assert_eq!(map["Deezer"], 5.0);
    }

    #[test]
    fn catalog_covers_all_platforms_plus_original() {
        let map = penalties(-14.0);
        assert_eq!(map.len(), PLATFORM_TARGETS.len() + 1);
    }

    #[test]
    fn silence_maps_to_infinite_penalty() {
        let map = penalties(f64::NEG_INFINITY);
        for target in &PLATFORM_TARGETS {
            assert_eq!(map[target.name], f64::INFINITY);
        }
        assert_eq!(map["Original"], 0.0);
    }

    #[test]
    fn unknown_target_falls_back_to_no_correction() {
        let map = penalties(-20.0);
        assert_eq!(penalty_for(&map, "MySpace"), 0.0);
    }
}
