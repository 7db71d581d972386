//! Shared channel protocol for the always-on-top floating window.
//!
//! Both controllers (the host side that owns the floating OS window and the
//! embedded client side that owns media and user interaction) speak the
//! closed vocabulary defined here:
//! - [`State`]: every lifecycle state exchanged over the channel
//! - [`EventName`] and [`ChannelMessage`]: the JSON envelope
//! - [`SessionToken`]: the per-session "magic" embedded in the window name
//! - [`geom`]: positions, sizes and rectangles shared by both sides
//! - [`platform`]: per-OS capabilities both sides consult
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

pub mod geom;
pub mod platform;
mod token;

pub use geom::{Position, Rect, Size};
pub use platform::{Os, Platform};
pub use token::{SessionToken, is_aot_frame, magic_from_frame_name, window_name};

/// Prefix of the floating window's frame name.
pub const WINDOW_NAME: &str = "AlwaysOnTop";

/// Name of the channel both controllers exchange messages on.
pub const EVENTS_CHANNEL: &str = "aot-events-channel";

/// Target width / height ratio of the floating window.
pub const ASPECT_RATIO: f64 = 16.0 / 9.0;

/// Size of a freshly opened floating window.
pub const DEFAULT_SIZE: Size = Size {
    width: 320,
    height: 180,
};

/// Store key holding the last persisted x coordinate.
pub const STORAGE_X: &str = "aot-x";

/// Store key holding the last persisted y coordinate.
pub const STORAGE_Y: &str = "aot-y";

/// Lifecycle states exchanged between the controllers.
///
/// Unknown names survive decoding as [`State::Unknown`] so that newer peers
/// can add states without breaking older ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum State {
    /// Ask the client to open the floating window.
    Open,
    /// The floating window was shown.
    Show,
    /// The floating window was hidden.
    Hide,
    /// End the session and close the window.
    Close,
    /// The user dismissed the window; it may reopen on the next blur.
    Dismiss,
    /// The conference was joined.
    ConferenceJoined,
    /// Bring the host window forward.
    ShowMainWindow,
    /// The conference surface is in view.
    IsIntersecting,
    /// The conference surface is out of view.
    IsNotIntersecting,
    /// A state name this build does not know about.
    Unknown(String),
}

impl State {
    /// Wire name of the state.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "aot-open",
            Self::Show => "aot-show",
            Self::Hide => "aot-hide",
            Self::Close => "aot-close",
            Self::Dismiss => "aot-dismiss",
            Self::ConferenceJoined => "aot-conference-joined",
            Self::ShowMainWindow => "aot-main-window-show",
            Self::IsIntersecting => "is-intersecting",
            Self::IsNotIntersecting => "is-not-intersecting",
            Self::Unknown(name) => name,
        }
    }

    /// Map an intersection observation onto its state.
    pub fn from_intersecting(intersecting: bool) -> Self {
        if intersecting {
            Self::IsIntersecting
        } else {
            Self::IsNotIntersecting
        }
    }
}

impl From<String> for State {
    fn from(name: String) -> Self {
        match name.as_str() {
            "aot-open" => Self::Open,
            "aot-show" => Self::Show,
            "aot-hide" => Self::Hide,
            "aot-close" => Self::Close,
            "aot-dismiss" => Self::Dismiss,
            "aot-conference-joined" => Self::ConferenceJoined,
            "aot-main-window-show" => Self::ShowMainWindow,
            "is-intersecting" => Self::IsIntersecting,
            "is-not-intersecting" => Self::IsNotIntersecting,
            _ => Self::Unknown(name),
        }
    }
}

impl From<State> for String {
    fn from(state: State) -> Self {
        match state {
            State::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Envelope names carried in [`ChannelMessage::name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventName {
    /// A [`State`] transition; the state travels in [`ChannelMessage::state`].
    UpdateState,
    /// Drag move of the floating window.
    Move,
    /// An envelope name this build does not know about.
    Unknown(String),
}

impl EventName {
    /// Wire name of the envelope.
    pub fn as_str(&self) -> &str {
        match self {
            Self::UpdateState => "aot-update-state",
            Self::Move => "aot-move",
            Self::Unknown(name) => name,
        }
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        match name.as_str() {
            "aot-update-state" => Self::UpdateState,
            "aot-move" => Self::Move,
            _ => Self::Unknown(name),
        }
    }
}

impl From<EventName> for String {
    fn from(name: EventName) -> Self {
        match name {
            EventName::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for EventName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Extra payload attached to state updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateData {
    /// Session token the client must embed in the window name on `OPEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aot_magic: Option<String>,
}

/// One message on the session channel, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessage {
    /// Envelope name.
    pub name: EventName,
    /// State carried by `aot-update-state` envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    /// Target window origin carried by `aot-move` envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Window size captured before the drag started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_size: Option<Size>,
    /// Optional state payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StateData>,
}

impl ChannelMessage {
    /// A bare state update.
    pub fn update_state(state: State) -> Self {
        Self {
            name: EventName::UpdateState,
            state: Some(state),
            position: None,
            initial_size: None,
            data: None,
        }
    }

    /// An `OPEN` update carrying the session token.
    pub fn open(magic: &SessionToken) -> Self {
        Self {
            data: Some(StateData {
                aot_magic: Some(magic.as_str().to_string()),
            }),
            ..Self::update_state(State::Open)
        }
    }

    /// A drag move to `position`, preserving `initial_size`.
    pub fn move_to(position: Position, initial_size: Size) -> Self {
        Self {
            name: EventName::Move,
            state: None,
            position: Some(position),
            initial_size: Some(initial_size),
            data: None,
        }
    }

    /// Session token carried in the payload, if any.
    pub fn magic(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.aot_magic.as_deref())
    }
}

/// Notifications the client raises towards the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExternalEvent {
    /// The user dismissed the floating window.
    Dismissed,
    /// The floating window is about to close.
    WillClose,
    /// The user double-clicked the floating window.
    DoubleClick,
}

impl ExternalEvent {
    /// Event name as seen by the embedding application.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dismissed => "dismissed",
            Self::WillClose => "will-close",
            Self::DoubleClick => "double-click",
        }
    }
}

/// Channel helpers: tokio channel aliases and the JSON codec.
pub mod ipc {
    use tokio::sync::mpsc;

    use super::ChannelMessage;

    /// Sending half of one direction of the session channel.
    pub type ChannelTx = mpsc::UnboundedSender<ChannelMessage>;
    /// Receiving half of one direction of the session channel.
    pub type ChannelRx = mpsc::UnboundedReceiver<ChannelMessage>;

    /// Create one direction of the channel.
    pub fn channel() -> (ChannelTx, ChannelRx) {
        mpsc::unbounded_channel::<ChannelMessage>()
    }

    /// One side's view of a session channel.
    pub struct Endpoint {
        /// Messages towards the peer.
        pub tx: ChannelTx,
        /// Messages from the peer.
        pub rx: ChannelRx,
    }

    /// Create a connected (host, client) endpoint pair.
    pub fn session_channel() -> (Endpoint, Endpoint) {
        let (to_client, from_host) = channel();
        let (to_host, from_client) = channel();
        (
            Endpoint {
                tx: to_client,
                rx: from_client,
            },
            Endpoint {
                tx: to_host,
                rx: from_host,
            },
        )
    }

    /// JSON codec for channel messages.
    pub mod codec;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn open_message_wire_shape() {
        let magic = SessionToken::from_string("abc123");
        let v = serde_json::to_value(ChannelMessage::open(&magic)).unwrap();
        assert_eq!(
            v,
            json!({"name": "aot-update-state", "state": "aot-open", "data": {"aotMagic": "abc123"}})
        );
    }

    #[test]
    fn move_message_uses_camel_case() {
        let msg = ChannelMessage::move_to(
            Position { x: 50, y: 30 },
            Size {
                width: 320,
                height: 180,
            },
        );
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            v,
            json!({
                "name": "aot-move",
                "position": {"x": 50, "y": 30},
                "initialSize": {"width": 320, "height": 180}
            })
        );
    }

    #[test]
    fn unknown_names_survive_decoding() {
        let msg: ChannelMessage =
            serde_json::from_value(json!({"name": "aot-resize", "state": "aot-minimize"})).unwrap();
        assert_eq!(msg.name, EventName::Unknown("aot-resize".into()));
        assert_eq!(msg.state, Some(State::Unknown("aot-minimize".into())));
        assert_eq!(String::from(msg.state.unwrap()), "aot-minimize");
    }

    #[test]
    fn every_known_state_maps_back_to_itself() {
        let all = [
            State::Open,
            State::Show,
            State::Hide,
            State::Close,
            State::Dismiss,
            State::ConferenceJoined,
            State::ShowMainWindow,
            State::IsIntersecting,
            State::IsNotIntersecting,
        ];
        for s in all {
            assert_eq!(State::from(s.as_str().to_string()), s);
        }
    }

    #[test]
    fn session_channel_is_cross_wired() {
        let (mut host, mut client) = ipc::session_channel();
        host.tx.send(ChannelMessage::update_state(State::Hide)).unwrap();
        client
            .tx
            .send(ChannelMessage::update_state(State::ConferenceJoined))
            .unwrap();
        assert_eq!(client.rx.try_recv().unwrap().state, Some(State::Hide));
        assert_eq!(
            host.rx.try_recv().unwrap().state,
            Some(State::ConferenceJoined)
        );
    }

    #[test]
    fn external_event_names() {
        assert_eq!(ExternalEvent::Dismissed.as_str(), "dismissed");
        assert_eq!(
            serde_json::to_value(ExternalEvent::DoubleClick).unwrap(),
            json!("double-click")
        );
    }
}
