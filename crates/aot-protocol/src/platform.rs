//! Platform capabilities that change controller behavior.

use serde::{Deserialize, Serialize};

/// First Windows release with capture exclusion (Windows 10 version 2004).
/// Older releases only offer a black-box capture mode.
pub const CONTENT_PROTECTION_WINDOWS_RELEASE: &str = "10.0.19041";

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Microsoft Windows.
    Windows,
    /// macOS.
    MacOs,
    /// Linux and other Unix desktops.
    Linux,
}

/// Operating system plus its release string (e.g. `"10.0.22631"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
    /// Dotted OS release, e.g. `10.0.22631`.
    pub release: String,
}

impl Platform {
    /// Construct a platform description.
    pub fn new(os: Os, release: impl Into<String>) -> Self {
        Self {
            os,
            release: release.into(),
        }
    }

    /// Stored positions are clamped into the matching display's work area.
    /// Other platforms place restored windows correctly on their own.
    pub fn clamps_stored_position(&self) -> bool {
        self.os == Os::Windows
    }

    /// The window manager offers a usable aspect-ratio constraint.
    pub fn native_aspect_ratio(&self) -> bool {
        self.os == Os::MacOs
    }

    /// The floating window can be excluded from screen capture.
    pub fn supports_content_protection(&self) -> bool {
        self.os != Os::Windows || version_at_least(&self.release, CONTENT_PROTECTION_WINDOWS_RELEASE)
    }

    /// The floating window must implement drag itself (no native titlebar drag).
    pub fn should_implement_drag(&self) -> bool {
        self.os != Os::MacOs
    }
}

/// Compare dotted numeric versions; missing trailing parts count as zero.
///
/// Returns false when either version has a non-numeric part.
pub fn version_at_least(current: &str, minimum: &str) -> bool {
    fn parts(v: &str) -> Option<Vec<u64>> {
        v.split('.').map(|p| p.trim().parse::<u64>().ok()).collect()
    }
    let (Some(cur), Some(min)) = (parts(current), parts(minimum)) else {
        return false;
    };
    let n = cur.len().max(min.len());
    for i in 0..n {
        let a = cur.get(i).copied().unwrap_or(0);
        let b = min.get(i).copied().unwrap_or(0);
        if a != b {
            return a > b;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_comparison() {
        assert!(version_at_least("10.0.19041", "10.0.19041"));
        assert!(version_at_least("10.0.22631", "10.0.19041"));
        assert!(version_at_least("11", "10.0.19041"));
        assert!(version_at_least("10.0.19041.1", "10.0.19041"));
        assert!(!version_at_least("10.0.18363", "10.0.19041"));
        assert!(!version_at_least("6.1.7601", "10.0.19041"));
        assert!(!version_at_least("10.0", "10.0.19041"));
        assert!(!version_at_least("", "10.0.19041"));
        assert!(!version_at_least("10.x", "10.0.19041"));
    }

    #[test]
    fn capabilities_by_os() {
        let win_old = Platform::new(Os::Windows, "6.1.7601");
        let win_new = Platform::new(Os::Windows, "10.0.22000");
        let mac = Platform::new(Os::MacOs, "23.1.0");
        let linux = Platform::new(Os::Linux, "6.8.0");

        assert!(win_old.clamps_stored_position());
        assert!(!mac.clamps_stored_position());
        assert!(!win_old.supports_content_protection());
        assert!(win_new.supports_content_protection());
        assert!(linux.supports_content_protection());
        assert!(mac.native_aspect_ratio());
        assert!(!linux.native_aspect_ratio());
        assert!(!mac.should_implement_drag());
        assert!(win_new.should_implement_drag());
    }
}
