//! Supported driver kinds.
//!
//! A [`DriverKind`] decides whether a session needs a remote address,
//! whether its surfaces are browser windows or mobile contexts, and which
//! capabilities are sent by default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};

use super::capabilities::Capabilities;

// ============================================================================
// DriverKind
// ============================================================================

/// Automation driver flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// Local Firefox through geckodriver.
    Firefox,
    /// Local Chrome through chromedriver.
    Chrome,
    /// Local Safari through safaridriver.
    Safari,
    /// Browser on a remote Selenium-compatible grid.
    RemoteBrowser,
    /// Android app through an Appium server.
    Android,
    /// iOS app through an Appium server.
    Ios,
}

impl DriverKind {
    /// Returns `true` when the session cannot start without a remote address.
    #[inline]
    #[must_use]
    pub const fn requires_remote_address(self) -> bool {
        matches!(self, Self::RemoteBrowser | Self::Android | Self::Ios)
    }

    /// Returns `true` when a given remote address is honoured.
    #[inline]
    #[must_use]
    pub const fn starts_remotely(self) -> bool {
        self.requires_remote_address()
    }

    /// Returns `true` for browser sessions (surfaces are windows).
    #[inline]
    #[must_use]
    pub const fn is_browser(self) -> bool {
        !self.is_mobile()
    }

    /// Returns `true` for mobile sessions (surfaces are contexts).
    #[inline]
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Android | Self::Ios)
    }

    /// Returns the lowercase name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Firefox => "firefox",
            Self::Chrome => "chrome",
            Self::Safari => "safari",
            Self::RemoteBrowser => "remote_browser",
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }

    /// Capabilities sent when the configuration supplies none.
    #[must_use]
    pub fn default_capabilities(self) -> Capabilities {
        let mut caps = Capabilities::new();
        match self {
            Self::Firefox => caps.set("browserName", json!("firefox")),
            Self::Chrome => caps.set("browserName", json!("chrome")),
            Self::Safari => caps.set("browserName", json!("safari")),
            Self::RemoteBrowser => caps.set("browserName", json!("firefox")),
            Self::Android => {
                caps.set("platformName", json!("Android"));
                caps.set("appium:automationName", json!("UiAutomator2"));
            }
            Self::Ios => {
                caps.set("platformName", json!("iOS"));
                caps.set("appium:automationName", json!("XCUITest"));
            }
        }
        caps
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = Error;

    /// Parses a driver kind (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "firefox" | "gecko" => Ok(Self::Firefox),
            "chrome" | "chromium" => Ok(Self::Chrome),
            "safari" => Ok(Self::Safari),
            "remote" | "remote_browser" => Ok(Self::RemoteBrowser),
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            other => Err(Error::config(format!("Unsupported driver kind: {other}"))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_requirements() {
        assert!(DriverKind::Android.requires_remote_address());
        assert!(DriverKind::RemoteBrowser.requires_remote_address());
        assert!(!DriverKind::Firefox.requires_remote_address());
    }

    #[test]
    fn test_mobile_vs_browser() {
        assert!(DriverKind::Ios.is_mobile());
        assert!(!DriverKind::Ios.is_browser());
        assert!(DriverKind::Chrome.is_browser());
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("Chromium".parse::<DriverKind>().unwrap(), DriverKind::Chrome);
        assert!("netscape".parse::<DriverKind>().is_err());
    }

    #[test]
    fn test_default_capabilities() {
        let caps = DriverKind::Android.default_capabilities();
        assert_eq!(caps.get("platformName"), Some(&json!("Android")));
    }

    #[test]
    fn test_serde_snake_case() {
        let kind: DriverKind = serde_json::from_str("\"remote_browser\"").unwrap();
        assert_eq!(kind, DriverKind::RemoteBrowser);
    }
}
