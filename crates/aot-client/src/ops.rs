//! Collaborator capabilities consumed by the embedded client controller.

use std::sync::Arc;

use aot_protocol::Size;

use crate::{Result, handoff::Handoff};

/// The live video currently shown by the conference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    /// Identifier of the media stream behind the video element.
    pub stream_id: String,
    /// CSS transform applied to the source (e.g. mirroring).
    pub transform: String,
}

/// Read access to the conference's video elements.
pub trait Conference: Send + Sync {
    /// Main stage video, when one is playing.
    fn large_video(&self) -> Option<VideoSource>;
    /// Self-view shown on the pre-join screen.
    fn prejoin_video(&self) -> Option<VideoSource>;
}

/// Viewport intersection observation of the conference surface.
pub trait IntersectionObserver: Send + Sync {
    /// Start reporting intersection changes.
    fn observe(&self);
    /// Stop reporting intersection changes.
    fn unobserve(&self);
}

/// What the floating window's video element should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoAttachment {
    /// Hidden, with no source.
    Hidden,
    /// Visible and playing `stream_id`.
    Stream {
        /// Stream to play.
        stream_id: String,
        /// CSS transform applied to the video, e.g. a mirror.
        transform: String,
    },
}

impl From<Option<VideoSource>> for VideoAttachment {
    fn from(source: Option<VideoSource>) -> Self {
        match source {
            Some(VideoSource {
                stream_id,
                transform,
            }) => Self::Stream {
                stream_id,
                transform,
            },
            None => Self::Hidden,
        }
    }
}

/// Document the client injects into a freshly opened floating window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Markup of the page body.
    pub markup: &'static str,
    /// Script and style URLs loaded after the markup.
    pub resources: Vec<String>,
}

/// Markup of the floating window: a video element and a dismiss control.
pub const MARKUP: &str = r#"<div id="react"></div>
<video autoplay="" id="video" style="transform: none;" muted></video>
<div class="dismiss"></div>"#;

/// Handle to an opened floating window, as seen from the client.
pub trait FloatingView: Send + Sync {
    /// True once the window was closed by anyone.
    fn is_closed(&self) -> bool;
    /// Close the window.
    fn close(&self);
    /// Populate the window and hand it the callbacks it talks back through.
    fn install(&self, handoff: Handoff, page: &Page);
    /// Attach or clear the floating video.
    fn set_video(&self, video: VideoAttachment);
    /// Size of the window's viewport.
    fn inner_size(&self) -> Size;
}

/// Shared handle to a floating view.
pub type ViewRef = Arc<dyn FloatingView>;

/// Opens named windows (the `window.open` equivalent).
pub trait WindowOpener: Send + Sync {
    /// Open a window with frame name `name`.
    fn open(&self, name: &str) -> Result<ViewRef>;
}

/// Bundle of collaborators a client session needs.
#[derive(Clone)]
pub struct ClientDeps {
    /// The conference API.
    pub conference: Arc<dyn Conference>,
    /// Visibility observer for the conference surface.
    pub observer: Arc<dyn IntersectionObserver>,
    /// Opens floating windows.
    pub opener: Arc<dyn WindowOpener>,
}
