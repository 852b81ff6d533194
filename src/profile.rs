//! Acquisition profiles.
//!
//! The LIDAR-Lite v3HP trades range, speed and sensitivity through four
//! registers. A [`Profile`] names one fixed combination of them.

use core::fmt;

/// Raw values of the four acquisition registers a [`Profile`] controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Maximum acquisition count (`SIG_COUNT_VAL`, `0x02`). Higher counts
    /// reach further at the cost of measurement rate.
    pub sig_count_max: u8,
    /// Acquisition mode flags (`ACQ_CONFIG_REG`, `0x04`).
    pub acq_config: u8,
    /// Reference integration count (`REF_COUNT_VAL`, `0x12`).
    pub ref_count_max: u8,
    /// Peak detection threshold bypass (`THRESHOLD_BYPASS`, `0x1c`).
    /// Zero uses the default detection algorithm.
    pub threshold_bypass: u8,
}

impl Settings {
    /// Register values after power-on.
    pub const POWER_ON: Self = Profile::Balanced.settings();
}

/// A configuration profile, see [`crate::LidarLite::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Profile {
    /// Default mode, balanced performance.
    #[default]
    Balanced = 0,
    /// Short range, high speed. Uses `0x1d` maximum acquisition count.
    ShortRangeFast = 1,
    /// Default range with quick termination detection, giving faster
    /// measurements at short range with decreased accuracy.
    QuickTermination = 2,
    /// Maximum range. Uses `0xff` maximum acquisition count.
    MaxRange = 3,
    /// High sensitivity detection, more erroneous measurements.
    ///
    /// Writes the same register values as [`Profile::Balanced`].
    HighSensitivity = 4,
    /// Low sensitivity detection, fewer erroneous measurements.
    LowSensitivity = 5,
    /// Short range, high speed, higher error. Not recommended.
    ShortRangeFastHighError = 6,
}

impl Profile {
    /// Every profile, ordered by id.
    pub const ALL: [Profile; 7] = [
        Profile::Balanced,
        Profile::ShortRangeFast,
        Profile::QuickTermination,
        Profile::MaxRange,
        Profile::HighSensitivity,
        Profile::LowSensitivity,
        Profile::ShortRangeFastHighError,
    ];

    /// Numeric id of this profile.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Register values written by this profile.
    pub const fn settings(self) -> Settings {
        let (sig_count_max, acq_config, ref_count_max, threshold_bypass) = match self {
            Profile::Balanced => (0x80, 0x08, 0x05, 0x00),
            Profile::ShortRangeFast => (0x1d, 0x08, 0x03, 0x03),
            Profile::QuickTermination => (0x80, 0x00, 0x03, 0x00),
            Profile::MaxRange => (0xff, 0x08, 0x05, 0x00),
            Profile::HighSensitivity => (0x80, 0x08, 0x05, 0x00),
            Profile::LowSensitivity => (0x80, 0x08, 0x05, 0xb0),
            Profile::ShortRangeFastHighError => (0x04, 0x01, 0x03, 0x00),
        };

        Settings {
            sig_count_max,
            acq_config,
            ref_count_max,
            threshold_bypass,
        }
    }
}

/// A profile id outside `0..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownProfile(pub u8);

impl fmt::Display for UnknownProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown profile id {}", self.0)
    }
}

impl TryFrom<u8> for Profile {
    type Error = UnknownProfile;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Profile::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(UnknownProfile(id))
    }
}

impl From<Profile> for u8 {
    fn from(profile: Profile) -> Self {
        profile.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for (id, profile) in Profile::ALL.iter().enumerate() {
            assert_eq!(usize::from(profile.id()), id);
            assert_eq!(Profile::try_from(profile.id()), Ok(*profile));
        }
    }

    #[test]
    fn rejects_unknown_ids() {
        assert_eq!(Profile::try_from(7), Err(UnknownProfile(7)));
        assert_eq!(Profile::try_from(0xff), Err(UnknownProfile(0xff)));
    }

    #[test]
    fn table() {
        let short = Profile::ShortRangeFast.settings();
        assert_eq!(short.sig_count_max, 0x1d);
        assert_eq!(short.threshold_bypass, 0x03);

        assert_eq!(Profile::QuickTermination.settings().acq_config, 0x00);
        assert_eq!(Profile::MaxRange.settings().sig_count_max, 0xff);
        assert_eq!(Profile::LowSensitivity.settings().threshold_bypass, 0xb0);
        assert_eq!(
            Profile::ShortRangeFastHighError.settings(),
            Settings {
                sig_count_max: 0x04,
                acq_config: 0x01,
                ref_count_max: 0x03,
                threshold_bypass: 0x00,
            }
        );
    }

    #[test]
    fn high_sensitivity_matches_balanced() {
        assert_eq!(
            Profile::HighSensitivity.settings(),
            Profile::Balanced.settings()
        );
        assert_eq!(Settings::POWER_ON, Profile::Balanced.settings());
    }
}
