//! Per-session token ("magic") and the window-naming convention built on it.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::WINDOW_NAME;

/// Opaque token minted once per host session.
///
/// The floating window is named `"<WINDOW_NAME>-<token>"`; open requests
/// carrying any other token are stale or foreign and get denied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Mint a fresh random token (UUID v4 with the dashes stripped).
    pub fn mint() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing token value.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrow the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Frame name of the floating window for this session.
    pub fn window_name(&self) -> String {
        window_name(&self.0)
    }

    /// True when `frame_name` names this session's floating window.
    pub fn matches_frame(&self, frame_name: &str) -> bool {
        magic_from_frame_name(frame_name) == Some(self.as_str())
    }
}

impl Display for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Build `"<WINDOW_NAME>-<magic>"`.
pub fn window_name(magic: &str) -> String {
    format!("{WINDOW_NAME}-{magic}")
}

/// True when `frame_name` claims to be a floating window, whatever its token.
pub fn is_aot_frame(frame_name: &str) -> bool {
    frame_name.starts_with(WINDOW_NAME)
}

/// Extract the token part of a floating-window frame name.
pub fn magic_from_frame_name(frame_name: &str) -> Option<&str> {
    frame_name
        .strip_prefix(WINDOW_NAME)
        .and_then(|rest| rest.strip_prefix('-'))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn minted_tokens_have_no_dashes_and_differ() {
        let a = SessionToken::mint();
        let b = SessionToken::mint();
        assert!(!a.as_str().contains('-'));
        assert_eq!(a.as_str().len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn window_name_layout() {
        let t = SessionToken::from_string("abc123");
        assert_eq!(t.window_name(), "AlwaysOnTop-abc123");
        assert!(t.matches_frame("AlwaysOnTop-abc123"));
        assert!(!t.matches_frame("AlwaysOnTop-abc1234"));
        assert!(!t.matches_frame("AlwaysOnTop"));
        assert!(is_aot_frame("AlwaysOnTop"));
        assert!(!is_aot_frame("popup-AlwaysOnTop-abc123"));
    }

    proptest! {
        #[test]
        fn distinct_tokens_never_match(a in "[a-z0-9-]{0,24}", b in "[a-z0-9-]{0,24}") {
            prop_assume!(a != b);
            let ta = SessionToken::from_string(a.clone());
            prop_assert!(!ta.matches_frame(&window_name(&b)));
            prop_assert!(ta.matches_frame(&window_name(&a)));
        }
    }
}
