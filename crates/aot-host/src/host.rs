//! Host controller: the side that owns the floating OS window.
//!
//! [`Host`] is a reducer over [`HostEvent`]s. It never caches a handle to the
//! floating window; every operation re-resolves "the current floating window"
//! by frame name and treats a missing, destroyed or crashed window as absent.

use aot_config::HostConfig;
use aot_protocol::{
    ChannelMessage, EventName, Platform, Position, Rect, SessionToken, Size, State,
    ipc::ChannelTx, is_aot_frame,
};
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace, warn};

use crate::{
    Error, Result,
    ops::{
        HostDeps, OpenDecision, OpenHandler, OpenRequest, ResizeDecision,
        WindowId, WindowOptions, WindowRef,
    },
    placement::Placement,
    resize::ResizeGuard,
};

/// Events from the host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainWindowEvent {
    /// The host window gained focus.
    Focus,
    /// The host window lost focus.
    Blur,
    /// The host window is gone; the session ends.
    Closed,
}

/// Events from a floating window.
#[derive(Debug)]
pub enum FloatingEvent {
    /// First paint is ready.
    ReadyToShow,
    /// A user resize is about to be applied.
    WillResize {
        /// Bounds the window is about to take.
        new_bounds: Rect,
        /// Where to send the veto decision.
        reply: oneshot::Sender<ResizeDecision>,
    },
    /// The window size changed.
    Resize,
    /// The window was closed.
    Closed,
    /// The content process terminated.
    RenderProcessGone {
        /// Why the process went away.
        reason: String,
    },
    /// The content process reported an error.
    Error {
        /// What the content process reported.
        message: String,
    },
}

/// Everything the host controller reacts to.
#[derive(Debug)]
pub enum HostEvent {
    /// A message from the client.
    Channel(ChannelMessage),
    /// Focus, blur or close of the host window.
    MainWindow(MainWindowEvent),
    /// The shell asks whether a `window.open` may proceed.
    WindowOpen {
        /// The pending request.
        request: OpenRequest,
        /// Where to send the decision.
        reply: oneshot::Sender<OpenDecision>,
    },
    /// The shell created a window in response to an allowed open.
    WindowCreated {
        /// Id of the new window.
        window_id: WindowId,
    },
    /// An event from floating window `window_id`.
    Floating {
        /// Window the event came from.
        window_id: WindowId,
        /// What happened.
        event: FloatingEvent,
    },
}

/// Whether the session continues after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep handling events.
    Continue,
    /// The host window is gone; tear the session down.
    Teardown,
}

/// Host-side state machine for one conference session.
pub struct Host {
    /// Session token embedded in the floating window name.
    magic: SessionToken,
    cfg: HostConfig,
    platform: Platform,
    deps: HostDeps,
    /// Messages towards the client.
    to_client: ChannelTx,
    /// Pre-existing open handler for windows that are not ours.
    fallback: Option<OpenHandler>,
    placement: Placement,
    resize: ResizeGuard,
    /// Whether the conference surface is visible in the host window.
    is_intersecting: bool,
    /// Whether host-window focus/blur drive the floating window.
    main_handlers: bool,
    /// Floating window whose events we listen to.
    armed: Option<WindowId>,
    /// The armed window has not been shown yet.
    awaiting_ready: bool,
}

impl Host {
    /// Create a host controller with a freshly minted session token.
    pub fn new(deps: HostDeps, cfg: HostConfig, platform: Platform, to_client: ChannelTx) -> Self {
        let placement = Placement::new(
            deps.store.clone(),
            deps.displays.clone(),
            platform.clone(),
            cfg.default_size,
        );
        let resize = ResizeGuard::new(cfg.aspect_ratio, cfg.resize_corner_margin);
        let magic = SessionToken::mint();
        info!(os = ?platform.os, "setting up aot for main window");
        Self {
            magic,
            cfg,
            platform,
            deps,
            to_client,
            fallback: None,
            placement,
            resize,
            is_intersecting: false,
            main_handlers: false,
            armed: None,
            awaiting_ready: false,
        }
    }

    /// Use `magic` instead of a random token.
    pub fn with_token(mut self, magic: SessionToken) -> Self {
        self.magic = magic;
        self
    }

    /// Delegate foreign open requests to `handler` instead of denying them.
    pub fn with_open_handler(mut self, handler: OpenHandler) -> Self {
        self.fallback = Some(handler);
        self
    }

    /// Session token embedded in the floating window name.
    pub fn magic(&self) -> &SessionToken {
        &self.magic
    }

    /// Last intersection state reported by the client.
    pub fn is_intersecting(&self) -> bool {
        self.is_intersecting
    }

    /// True between `CONFERENCE_JOINED` and `CLOSE`.
    pub fn main_handlers_attached(&self) -> bool {
        self.main_handlers
    }

    /// Size the next floating window opens with.
    pub fn size(&self) -> Size {
        self.placement.size()
    }

    /// Window whose events are currently honored.
    pub fn armed_window(&self) -> Option<WindowId> {
        self.armed
    }

    /// Resolve the current floating window by name. While a reopen overlaps
    /// a dying window, the newest one (highest id) wins.
    pub fn aot_window(&self) -> Option<WindowRef> {
        self.named_windows().into_iter().max_by_key(|w| w.id())
    }

    /// Every live, uncrashed window carrying our frame name.
    fn named_windows(&self) -> Vec<WindowRef> {
        let name = self.magic.window_name();
        self.deps
            .windows
            .all_windows()
            .into_iter()
            .filter(|w| !w.is_destroyed() && !w.is_crashed() && w.frame_name() == name)
            .collect()
    }

    /// Resolve a not-yet-destroyed window by id, crashed or not.
    fn window_by_id(&self, id: WindowId) -> Option<WindowRef> {
        self.deps
            .windows
            .all_windows()
            .into_iter()
            .find(|w| w.id() == id && !w.is_destroyed())
    }

    /// Feed one event through the state machine.
    pub fn handle(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::Channel(msg) => self.on_channel(msg),
            HostEvent::MainWindow(MainWindowEvent::Closed) => return Flow::Teardown,
            HostEvent::MainWindow(ev) => self.on_main_window(ev),
            HostEvent::WindowOpen { request, reply } => {
                let decision = self.window_open_handler(&request);
                if reply.send(decision).is_err() {
                    debug!("open decision dropped by shell");
                }
            }
            HostEvent::WindowCreated { window_id } => self.on_window_created(window_id),
            HostEvent::Floating { window_id, event } => self.on_floating(window_id, event),
        }
        Flow::Continue
    }

    /// Dispatch a message from the client.
    pub fn on_channel(&mut self, msg: ChannelMessage) {
        debug!(name = %msg.name, "received aot event");
        match msg.name {
            EventName::UpdateState => match msg.state {
                Some(state) => self.on_state(state),
                None => warn!("state update without a state"),
            },
            EventName::Move => match msg.position {
                Some(position) => self.on_move(position, msg.initial_size),
                None => warn!("move without a position"),
            },
            EventName::Unknown(name) => debug!(%name, "unhandled aot event"),
        }
    }

    fn on_state(&mut self, state: State) {
        info!(%state, "handling state update from client");
        match state {
            State::Dismiss => self.close_window(),
            State::Close => {
                self.remove_main_window_handlers();
                if let Some(w) = self.aot_window() {
                    self.placement.save_position(w.as_ref());
                }
                self.placement.reset_size();
                self.close_window();
            }
            State::ConferenceJoined => self.add_main_window_handlers(),
            // Focusing the host window triggers its focus handler, which hides
            // the floating window when the conference is in view.
            State::ShowMainWindow => self.deps.main_window.show(),
            State::IsNotIntersecting => {
                self.is_intersecting = false;
                self.show_aot();
            }
            State::IsIntersecting => {
                self.is_intersecting = true;
                self.hide_aot();
            }
            other => debug!(state = %other, "unhandled state"),
        }
    }

    /// Move the floating window, keeping the size captured when the drag began.
    fn on_move(&self, position: Position, initial_size: Option<Size>) {
        let Some(w) = self.aot_window() else {
            trace!("move without an aot window");
            return;
        };
        let size = initial_size.unwrap_or_else(|| w.bounds().size());
        w.set_bounds(Rect::from_parts(position, size));
    }

    fn on_main_window(&mut self, event: MainWindowEvent) {
        if !self.main_handlers {
            trace!(?event, "main window handlers detached");
            return;
        }
        match event {
            MainWindowEvent::Blur => self.show_aot(),
            MainWindowEvent::Focus => self.hide_aot(),
            MainWindowEvent::Closed => {}
        }
    }

    /// Decide whether a `window.open` may proceed.
    pub fn window_open_handler(&self, request: &OpenRequest) -> OpenDecision {
        if is_aot_frame(&request.frame_name) {
            info!("handling new aot window request");
            if !self.magic.matches_frame(&request.frame_name) {
                info!(frame = %request.frame_name, "bad aot window magic");
                return OpenDecision::Deny;
            }
            return OpenDecision::Allow(Some(WindowOptions {
                chrome: self.cfg.chrome.clone(),
                bounds: self.placement.bounds(),
            }));
        }
        match &self.fallback {
            Some(handler) => handler(request),
            None => OpenDecision::Deny,
        }
    }

    fn on_window_created(&mut self, window_id: WindowId) {
        debug!(window_id, "received window created event");
        let (ours, others): (Vec<_>, Vec<_>) = self
            .named_windows()
            .into_iter()
            .partition(|w| w.id() == window_id);
        let Some(w) = ours.into_iter().next() else {
            trace!(window_id, "created window is not our floating window");
            return;
        };
        for old in others {
            info!(window_id = old.id(), "closing superseded aot window");
            old.close();
        }
        info!(window_id, "setting aot window options");
        w.set_always_on_top(true, self.cfg.always_on_top_level);
        if self.platform.supports_content_protection() {
            w.set_content_protection(true);
        }
        if self.platform.native_aspect_ratio() {
            w.set_aspect_ratio(self.cfg.aspect_ratio);
        }
        self.resize.reset();
        self.armed = Some(window_id);
        self.awaiting_ready = true;
    }

    fn on_floating(&mut self, window_id: WindowId, event: FloatingEvent) {
        if self.armed != Some(window_id) {
            trace!(window_id, "event for a window we do not listen to");
            if let FloatingEvent::WillResize { reply, .. } = event
                && reply.send(ResizeDecision::Allow).is_err()
            {
                trace!("resize decision dropped");
            }
            return;
        }
        match event {
            FloatingEvent::ReadyToShow => {
                if self.awaiting_ready {
                    self.awaiting_ready = false;
                    if let Some(w) = self.live(window_id) {
                        w.show();
                    }
                }
            }
            FloatingEvent::WillResize { new_bounds, reply } => {
                let decision = self.will_resize(window_id, new_bounds);
                if reply.send(decision).is_err() {
                    trace!("resize decision dropped");
                }
            }
            FloatingEvent::Resize => self.resized(window_id),
            FloatingEvent::Closed => {
                debug!(window_id, "aot window closed");
                self.disarm();
            }
            FloatingEvent::RenderProcessGone { reason } => {
                warn!(window_id, %reason, "closing aot window because its renderer is gone");
                if let Some(w) = self.window_by_id(window_id) {
                    w.close();
                }
                self.disarm();
            }
            FloatingEvent::Error { message } => error!(window_id, %message, "aot window error"),
        }
    }

    /// The armed window, if it is still the current floating window.
    fn live(&self, window_id: WindowId) -> Option<WindowRef> {
        self.aot_window().filter(|w| w.id() == window_id)
    }

    fn will_resize(&mut self, window_id: WindowId, new_bounds: Rect) -> ResizeDecision {
        if self.platform.native_aspect_ratio() {
            return ResizeDecision::Allow;
        }
        let Some(w) = self.live(window_id) else {
            return ResizeDecision::Allow;
        };
        let cursor = self.deps.displays.cursor_screen_point();
        self.resize.will_resize(w.bounds().size(), new_bounds, cursor)
    }

    fn resized(&mut self, window_id: WindowId) {
        let Some(w) = self.live(window_id) else {
            return;
        };
        let current = w.bounds().size();
        if self.platform.native_aspect_ratio() {
            self.placement.set_size(current);
            return;
        }
        if let Some(fixed) = self.resize.resized(current) {
            if fixed != current {
                w.set_size(fixed);
            }
            self.placement.set_size(fixed);
        }
    }

    fn disarm(&mut self) {
        self.armed = None;
        self.awaiting_ready = false;
        self.resize.reset();
    }

    /// Show the floating window if it exists, otherwise ask the client to
    /// open one.
    fn show_aot(&self) {
        debug!("show aot handler");
        match self.aot_window() {
            Some(w) => {
                w.show_inactive();
                self.send(ChannelMessage::update_state(State::Show));
            }
            None => self.send(ChannelMessage::open(&self.magic)),
        }
    }

    /// Hide the floating window while the conference is in view.
    fn hide_aot(&self) {
        debug!("hide aot handler");
        if self.is_intersecting {
            self.hide_window();
        }
    }

    fn hide_window(&self) {
        if let Some(w) = self.aot_window() {
            info!("hiding aot window");
            w.hide();
            self.send(ChannelMessage::update_state(State::Hide));
        }
    }

    fn close_window(&self) {
        if let Some(w) = self.aot_window() {
            info!("closing aot window");
            w.close();
        }
    }

    fn add_main_window_handlers(&mut self) {
        info!("adding main window event handlers");
        self.main_handlers = true;
    }

    fn remove_main_window_handlers(&mut self) {
        info!("removing main window event handlers");
        self.main_handlers = false;
    }

    /// Send `msg` to the client, logging instead of failing when it is gone.
    fn send(&self, msg: ChannelMessage) {
        if let Err(e) = self.try_send(msg) {
            warn!(error = %e, "dropping state update");
        }
    }

    /// Send `msg` to the client.
    pub fn try_send(&self, msg: ChannelMessage) -> Result<()> {
        if let Some(state) = &msg.state {
            info!(%state, "sending state update to client");
        }
        self.to_client.send(msg).map_err(|_| Error::ChannelClosed)
    }

    /// Stop reacting to host-window and floating-window events.
    pub(crate) fn teardown(&mut self) {
        self.main_handlers = false;
        self.disarm();
    }
}
