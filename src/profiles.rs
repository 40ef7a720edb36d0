// src/profiles.rs
// DJ compatibility profiles: which audio containers a target player accepts

use crate::config::Config;
use std::fmt;

/// Containers/codecs the Pioneer CDJ-2000NXS2 plays, best first
const CDJ2000NXS2_COMPATIBLE_EXTENSIONS: [&str; 8] =
    ["aiff", "aif", "alac", "flac", "m4a", "aac", "mp3", "wav"];

/// The active DJ compatibility profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DjProfile {
    /// No profile: every format is accepted
    None,
    /// Pioneer CDJ-2000NXS2, optionally refusing WAV
    Cdj2000Nxs2 { deny_wav: bool },
    /// A profile name this build does not know; accepts everything
    Unknown(String),
}

impl DjProfile {
    /// Resolve a profile by its configured name (case-insensitive)
    pub fn from_name(name: &str, deny_wav: bool) -> Self {
        match name.trim().to_lowercase().as_str() {
            "" | "none" => DjProfile::None,
            "cdj2000nxs2" => DjProfile::Cdj2000Nxs2 { deny_wav },
            other => DjProfile::Unknown(other.to_string()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::from_name(&config.dj_compatibility_profile, config.deny_wav_completely)
    }

    /// Whether a file extension is playable under this profile
    pub fn is_ext_compatible(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_lowercase();
        match self {
            DjProfile::None | DjProfile::Unknown(_) => true,
            DjProfile::Cdj2000Nxs2 { deny_wav } => {
                if *deny_wav && ext == "wav" {
                    return false;
                }
                CDJ2000NXS2_COMPATIBLE_EXTENSIONS.contains(&ext.as_str())
            }
        }
    }

    /// True when the profile actually restricts formats
    pub fn is_restrictive(&self) -> bool {
        matches!(self, DjProfile::Cdj2000Nxs2 { .. })
    }
}

impl fmt::Display for DjProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DjProfile::None => write!(f, "none"),
            DjProfile::Cdj2000Nxs2 { .. } => write!(f, "cdj2000nxs2"),
            DjProfile::Unknown(name) => write!(f, "{} (unknown)", name),
        }
    }
}
