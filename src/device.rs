//! Target e-reader display profiles.

/// Named target display for a specific e-reader model.
///
/// Dimensions are in the same unit space as page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub width: f64,
    pub height: f64,
}

/// Known Kindle display profiles.
pub const DEVICE_PROFILES: [DeviceProfile; 4] = [
    DeviceProfile {
        name: "paperwhite",
        width: 1236.0,
        height: 1648.0,
    },
    DeviceProfile {
        name: "oasis",
        width: 1264.0,
        height: 1680.0,
    },
    DeviceProfile {
        name: "basic",
        width: 1072.0,
        height: 1448.0,
    },
    DeviceProfile {
        name: "scribe",
        width: 1860.0,
        height: 2480.0,
    },
];

impl DeviceProfile {
    /// Look up a profile by name. Unknown names fall back to the default
    /// rather than failing.
    pub fn lookup(name: &str) -> DeviceProfile {
        DEVICE_PROFILES
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .copied()
            .unwrap_or_else(DeviceProfile::default_profile)
    }

    /// The default target (Kindle Paperwhite).
    pub fn default_profile() -> DeviceProfile {
        DEVICE_PROFILES[0]
    }
}
