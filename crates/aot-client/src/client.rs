//! Embedded client controller: the side beside the conference that owns
//! media attachment and user interaction.
//!
//! Hiding the floating window only detaches its media. The application hears
//! `will-close` when the window closes or the client is disposed, never on
//! hide.

use std::sync::Arc;

use aot_config::ClientConfig;
use aot_protocol::{
    ChannelMessage, EventName, ExternalEvent, Platform, State, ipc::ChannelTx, window_name,
};
use tokio::{
    sync::{broadcast, mpsc},
    time::Instant,
};
use tracing::{debug, info, trace, warn};

use crate::{
    Error, Result,
    handoff::{Handoff, HandoffEvent},
    ops::{ClientDeps, MARKUP, Page, VideoAttachment, VideoSource, ViewRef},
};

/// Sender for client-local events.
pub type ClientEventTx = mpsc::UnboundedSender<ClientEvent>;
/// Receiver for client-local events.
pub type ClientEventRx = mpsc::UnboundedReceiver<ClientEvent>;

/// Create the channel local events reach a client through.
pub fn event_channel() -> (ClientEventTx, ClientEventRx) {
    mpsc::unbounded_channel()
}

/// Everything the client controller reacts to, apart from host messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// `videoConferenceJoined`.
    ConferenceJoined,
    /// The pre-join screen is up.
    PrejoinLoaded,
    /// `videoConferenceLeft`.
    ConferenceLeft,
    /// The conference API is being disposed.
    WillDispose,
    /// The host page is about to unload.
    ReadyToClose,
    /// The shown video, its mute state, or its source changed.
    MediaChanged,
    /// The conference surface entered or left the viewport.
    Intersection(bool),
    /// A call from the floating window numbered `window`.
    Handoff {
        /// Sequence number of the window that sent it.
        window: u64,
        /// The call.
        event: HandoffEvent,
    },
    /// The refresh deadline passed.
    RefreshDue,
}

/// Whether the client keeps running after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep handling events.
    Continue,
    /// The client was disposed and ignores further events.
    Disposed,
}

/// Which conference video the floating window mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// The large video of a running conference.
    Large,
    /// The pre-join preview.
    Prejoin,
}

/// Client-side state machine for one conference API instance.
pub struct Client {
    cfg: ClientConfig,
    platform: Platform,
    deps: ClientDeps,
    /// Messages towards the host.
    to_host: ChannelTx,
    /// Our own local event stream, handed to floating windows.
    local: ClientEventTx,
    external: broadcast::Sender<ExternalEvent>,
    joined: bool,
    /// Host messages are handled.
    listening: bool,
    observing: bool,
    /// Media-change events trigger refreshes.
    media_subscribed: bool,
    source: Source,
    view: Option<ViewRef>,
    /// Sequence number of the last opened window.
    window_seq: u64,
    refresh_at: Option<Instant>,
    disposed: bool,
}

impl Client {
    /// Client sending to `to_host` and handing `local` to its floating windows.
    pub fn new(
        deps: ClientDeps,
        cfg: ClientConfig,
        platform: Platform,
        to_host: ChannelTx,
        local: ClientEventTx,
    ) -> Self {
        let (external, _) = broadcast::channel(16);
        Self {
            cfg,
            platform,
            deps,
            to_host,
            local,
            external,
            joined: false,
            listening: false,
            observing: false,
            media_subscribed: false,
            source: Source::Large,
            view: None,
            window_seq: 0,
            refresh_at: None,
            disposed: false,
        }
    }

    /// Receive `dismissed`, `double-click` and `will-close` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ExternalEvent> {
        self.external.subscribe()
    }

    /// True between join and close.
    pub fn is_joined(&self) -> bool {
        self.joined
    }

    /// True while host messages are handled.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// True once the conference API is gone.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// True while media changes refresh the floating video.
    pub fn media_subscribed(&self) -> bool {
        self.media_subscribed
    }

    /// The floating window, if one is open and not closed.
    pub fn view(&self) -> Option<ViewRef> {
        self.view.as_ref().filter(|v| !v.is_closed()).cloned()
    }

    /// When a pending media refresh is due.
    pub fn refresh_deadline(&self) -> Option<Instant> {
        self.refresh_at
    }

    /// Feed one local event through the state machine.
    pub fn handle(&mut self, event: ClientEvent) -> Flow {
        if self.disposed {
            trace!(?event, "client disposed, ignoring event");
            return Flow::Disposed;
        }
        match event {
            ClientEvent::ConferenceJoined => {
                self.source = Source::Large;
                self.join();
                if self.media_subscribed {
                    self.refresh_now();
                }
            }
            ClientEvent::PrejoinLoaded => {
                if self.cfg.open_on_prejoin && !self.joined {
                    self.source = Source::Prejoin;
                    self.join();
                }
            }
            ClientEvent::ConferenceLeft => self.close(),
            ClientEvent::WillDispose | ClientEvent::ReadyToClose => {
                self.dispose();
                return Flow::Disposed;
            }
            ClientEvent::MediaChanged => self.on_media_changed(),
            ClientEvent::Intersection(intersecting) => self.on_intersection(intersecting),
            ClientEvent::Handoff { window, event } => self.on_handoff(window, event),
            ClientEvent::RefreshDue => {
                if self.refresh_at.take().is_some() {
                    self.refresh_now();
                }
            }
        }
        Flow::Continue
    }

    /// Start the session. Idempotent until the conference is left.
    fn join(&mut self) {
        if self.joined {
            debug!("already joined");
            return;
        }
        info!("conference joined, starting aot session");
        self.joined = true;
        self.listening = true;
        self.send(ChannelMessage::update_state(State::ConferenceJoined));
        self.deps.observer.observe();
        self.observing = true;
    }

    fn on_intersection(&self, intersecting: bool) {
        if !self.observing {
            trace!(intersecting, "not observing intersection");
            return;
        }
        self.send(ChannelMessage::update_state(State::from_intersecting(intersecting)));
    }

    /// Dispatch a message from the host.
    pub fn on_channel(&mut self, msg: ChannelMessage) {
        if !self.listening || self.disposed {
            trace!(name = %msg.name, "not listening, dropping host message");
            return;
        }
        if msg.name != EventName::UpdateState {
            debug!(name = %msg.name, "unhandled aot event");
            return;
        }
        let Some(state) = msg.state.clone() else {
            warn!("state update without a state");
            return;
        };
        info!(%state, "handling state update from host");
        match state {
            State::Open => match msg.magic() {
                Some(magic) => {
                    let name = window_name(magic);
                    if let Err(e) = self.open_window(&name) {
                        warn!(error = %e, "could not open aot window");
                    }
                }
                None => warn!("open without a session token"),
            },
            State::Hide => self.hide_window(),
            State::Show => self.show_window(),
            other => debug!(state = %other, "unhandled state"),
        }
    }

    fn open_window(&mut self, name: &str) -> Result<()> {
        if let Some(old) = self.view.take()
            && !old.is_closed()
        {
            debug!("closing previous aot window before reopening");
            old.close();
        }
        // Attached before opening, unwound on failure.
        self.media_subscribed = true;
        let view = match self.deps.opener.open(name) {
            Ok(view) => view,
            Err(e) => {
                self.media_subscribed = false;
                return Err(e);
            }
        };
        if view.is_closed() {
            self.media_subscribed = false;
            return Err(Error::Open {
                name: name.to_string(),
                message: "window closed while opening".to_string(),
            });
        }
        self.window_seq += 1;
        let handoff = Handoff::new(
            self.window_seq,
            self.local.clone(),
            self.platform.should_implement_drag(),
            Arc::downgrade(&view),
        );
        let page = Page {
            markup: MARKUP,
            resources: self.cfg.resources.clone(),
        };
        view.install(handoff, &page);
        info!(window = self.window_seq, %name, "opened aot window");
        self.view = Some(view);
        Ok(())
    }

    fn hide_window(&mut self) {
        self.media_subscribed = false;
        self.refresh_at = None;
        if let Some(view) = self.view() {
            view.set_video(VideoAttachment::Hidden);
        }
    }

    fn show_window(&mut self) {
        self.media_subscribed = true;
        self.refresh_now();
    }

    fn on_media_changed(&mut self) {
        if !self.media_subscribed {
            return;
        }
        // Changes arriving before the deadline fold into the pending refresh.
        if self.refresh_at.is_none() {
            self.refresh_at = Some(Instant::now() + self.cfg.refresh_delay());
        }
    }

    fn on_handoff(&mut self, window: u64, event: HandoffEvent) {
        if window != self.window_seq || self.view().is_none() {
            trace!(window, ?event, "handoff event from a stale window");
            return;
        }
        match event {
            HandoffEvent::Dismiss => {
                self.emit(ExternalEvent::Dismissed);
                self.send(ChannelMessage::update_state(State::Dismiss));
            }
            HandoffEvent::DoubleClick => {
                self.emit(ExternalEvent::DoubleClick);
                self.send(ChannelMessage::update_state(State::ShowMainWindow));
            }
            HandoffEvent::Move {
                position,
                initial_size,
            } => self.send(ChannelMessage::move_to(position, initial_size)),
            HandoffEvent::Load => self.refresh_now(),
        }
    }

    fn current_source(&self) -> Option<VideoSource> {
        match self.source {
            Source::Large => self.deps.conference.large_video(),
            Source::Prejoin => self.deps.conference.prejoin_video(),
        }
    }

    /// Mirror the current conference video into the floating window.
    fn refresh_now(&mut self) {
        self.refresh_at = None;
        let Some(view) = self.view() else {
            return;
        };
        let video = VideoAttachment::from(self.current_source());
        trace!(?video, "refreshing aot video");
        view.set_video(video);
    }

    /// Leave the session: stop observing, tell the host to close, and close
    /// the floating window. Safe to call repeatedly.
    pub fn close(&mut self) {
        if !self.joined && self.view.is_none() {
            trace!("aot session already closed");
            return;
        }
        info!("closing window and cleaning listeners");
        self.emit(ExternalEvent::WillClose);
        self.send(ChannelMessage::update_state(State::Close));
        if self.observing {
            self.deps.observer.unobserve();
            self.observing = false;
        }
        self.media_subscribed = false;
        self.refresh_at = None;
        self.listening = false;
        if let Some(view) = self.view.take()
            && !view.is_closed()
        {
            view.close();
        }
        self.joined = false;
        self.source = Source::Large;
    }

    /// Close and stop reacting to conference events for good.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.close();
        self.disposed = true;
        debug!("aot client disposed");
    }

    fn emit(&self, event: ExternalEvent) {
        if self.external.send(event).is_err() {
            trace!(event = event.as_str(), "no external listeners");
        }
    }

    /// Send `msg` to the host, logging instead of failing when it is gone.
    fn send(&self, msg: ChannelMessage) {
        if let Err(e) = self.try_send(msg) {
            warn!(error = %e, "dropping message to host");
        }
    }

    /// Send `msg` to the host.
    pub fn try_send(&self, msg: ChannelMessage) -> Result<()> {
        if let Some(state) = &msg.state {
            info!(%state, "sending state update to host");
        }
        self.to_host.send(msg).map_err(|_| Error::ChannelClosed)
    }
}
