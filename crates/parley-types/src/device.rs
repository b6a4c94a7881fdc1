//! Device platform and metadata types

use serde::{Deserialize, Serialize};

/// Client platform reported at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePlatform {
    Ios,
    Android,
    Web,
    DesktopWindows,
    DesktopMac,
    DesktopLinux,
}

impl DevicePlatform {
    /// Parse a platform string, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        let all = [
            Self::Ios,
            Self::Android,
            Self::Web,
            Self::DesktopWindows,
            Self::DesktopMac,
            Self::DesktopLinux,
        ];
        all.into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Web => "web",
            Self::DesktopWindows => "desktop_windows",
            Self::DesktopMac => "desktop_mac",
            Self::DesktopLinux => "desktop_linux",
        }
    }
}

impl std::fmt::Display for DevicePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Device metadata captured when a session is created or refreshed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    /// Client platform
    pub platform: DevicePlatform,
    /// Human-readable device name (e.g. "Nga's iPhone")
    pub device_name: Option<String>,
    /// Hardware model identifier
    pub device_model: Option<String>,
    /// Operating system version
    pub os_version: Option<String>,
    /// Client application version
    pub app_version: Option<String>,
}

impl DeviceMetadata {
    /// Minimal metadata with only the platform set
    pub fn for_platform(platform: DevicePlatform) -> Self {
        Self {
            platform,
            device_name: None,
            device_model: None,
            os_version: None,
            app_version: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_case_insensitive() {
        assert_eq!(DevicePlatform::parse("IOS"), Some(DevicePlatform::Ios));
        assert_eq!(
            DevicePlatform::parse("Desktop_Mac"),
            Some(DevicePlatform::DesktopMac)
        );
        assert_eq!(DevicePlatform::parse("amiga"), None);
    }

    #[test]
    fn test_platform_serde_snake_case() {
        let json = serde_json::to_string(&DevicePlatform::DesktopLinux).unwrap();
        assert_eq!(json, "\"desktop_linux\"");
    }
}
