//! In-memory collaborators for tests and simulations (`test-utils` feature).

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use aot_protocol::Size;
use parking_lot::Mutex;

use crate::{
    Error, Result,
    content::FloatingContent,
    handoff::Handoff,
    ops::{
        ClientDeps, Conference, FloatingView, IntersectionObserver, Page, VideoAttachment,
        VideoSource, ViewRef, WindowOpener,
    },
};

/// Conference double with settable videos.
#[derive(Default)]
pub struct MockConference {
    large: Mutex<Option<VideoSource>>,
    prejoin: Mutex<Option<VideoSource>>,
}

impl MockConference {
    /// Conference with no videos.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the large video.
    pub fn set_large(&self, stream_id: Option<&str>) {
        *self.large.lock() = stream_id.map(|id| VideoSource {
            stream_id: id.to_string(),
            transform: "none".to_string(),
        });
    }

    /// Set or clear the mirrored pre-join preview.
    pub fn set_prejoin(&self, stream_id: Option<&str>) {
        *self.prejoin.lock() = stream_id.map(|id| VideoSource {
            stream_id: id.to_string(),
            transform: "scaleX(-1)".to_string(),
        });
    }
}

impl Conference for MockConference {
    fn large_video(&self) -> Option<VideoSource> {
        self.large.lock().clone()
    }

    fn prejoin_video(&self) -> Option<VideoSource> {
        self.prejoin.lock().clone()
    }
}

/// Intersection observer double counting subscriptions.
#[derive(Default)]
pub struct MockObserver {
    observes: AtomicUsize,
    unobserves: AtomicUsize,
}

impl MockObserver {
    /// Observer that has never observed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `observe` calls.
    pub fn observes(&self) -> usize {
        self.observes.load(Ordering::SeqCst)
    }

    /// Number of `unobserve` calls.
    pub fn unobserves(&self) -> usize {
        self.unobserves.load(Ordering::SeqCst)
    }

    /// Subscriptions currently active.
    pub fn active(&self) -> usize {
        self.observes().saturating_sub(self.unobserves())
    }
}

impl IntersectionObserver for MockObserver {
    fn observe(&self) {
        self.observes.fetch_add(1, Ordering::SeqCst);
    }

    fn unobserve(&self) {
        self.unobserves.fetch_add(1, Ordering::SeqCst);
    }
}

/// Floating view double.
pub struct MockView {
    name: String,
    closed: AtomicBool,
    size: Mutex<Size>,
    handoff: Mutex<Option<Handoff>>,
    page: Mutex<Option<Page>>,
    video: Mutex<Option<VideoAttachment>>,
    calls: Mutex<Vec<String>>,
}

impl MockView {
    /// Open view named `name` with inner size `size`.
    pub fn new(name: impl Into<String>, size: Size) -> Self {
        Self {
            name: name.into(),
            closed: AtomicBool::new(false),
            size: Mutex::new(size),
            handoff: Mutex::new(None),
            page: Mutex::new(None),
            video: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn note(&self, s: &str) {
        self.calls.lock().push(s.to_string());
    }

    /// Frame name the view was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every recorded call, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// True if any recorded call contains `s`.
    pub fn calls_contains(&self, s: &str) -> bool {
        self.calls.lock().iter().any(|x| x == s)
    }

    /// Number of recorded calls equal to `s`.
    pub fn count(&self, s: &str) -> usize {
        self.calls.lock().iter().filter(|x| *x == s).count()
    }

    /// Last attachment set on the video element.
    pub fn video(&self) -> Option<VideoAttachment> {
        self.video.lock().clone()
    }

    /// Installed page, if any.
    pub fn page(&self) -> Option<Page> {
        self.page.lock().clone()
    }

    /// Installed handoff, if any.
    pub fn handoff(&self) -> Option<Handoff> {
        self.handoff.lock().clone()
    }

    /// Content page running against the installed handoff.
    pub fn content(&self) -> Option<FloatingContent> {
        self.handoff().map(FloatingContent::new)
    }

    /// Simulate the user or OS closing the window.
    pub fn close_externally(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Simulate the window being resized.
    pub fn set_inner_size(&self, size: Size) {
        *self.size.lock() = size;
    }
}

impl FloatingView for MockView {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.note("close");
        self.closed.store(true, Ordering::SeqCst);
    }

    fn install(&self, handoff: Handoff, page: &Page) {
        self.note("install");
        *self.handoff.lock() = Some(handoff);
        *self.page.lock() = Some(page.clone());
    }

    fn set_video(&self, video: VideoAttachment) {
        self.note("set_video");
        *self.video.lock() = Some(video);
    }

    fn inner_size(&self) -> Size {
        *self.size.lock()
    }
}

/// Window opener double.
#[derive(Default)]
pub struct MockOpener {
    views: Mutex<Vec<Arc<MockView>>>,
    fail: AtomicBool,
}

impl MockOpener {
    /// Opener whose opens succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next opens fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every view opened so far.
    pub fn views(&self) -> Vec<Arc<MockView>> {
        self.views.lock().clone()
    }

    /// Most recently opened view.
    pub fn last(&self) -> Option<Arc<MockView>> {
        self.views.lock().last().cloned()
    }
}

impl WindowOpener for MockOpener {
    fn open(&self, name: &str) -> Result<ViewRef> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Open {
                name: name.to_string(),
                message: "opener failure".to_string(),
            });
        }
        let view = Arc::new(MockView::new(name, Size::new(320, 180)));
        self.views.lock().push(view.clone());
        Ok(view)
    }
}

/// Every mock collaborator a client session needs.
#[derive(Default)]
pub struct MockPage {
    /// Conference double.
    pub conference: Arc<MockConference>,
    /// Intersection observer double.
    pub observer: Arc<MockObserver>,
    /// Window opener double.
    pub opener: Arc<MockOpener>,
}

impl MockPage {
    /// Fresh doubles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collaborator bundle backed by these doubles.
    pub fn deps(&self) -> ClientDeps {
        ClientDeps {
            conference: self.conference.clone(),
            observer: self.observer.clone(),
            opener: self.opener.clone(),
        }
    }
}
