//! Both controllers wired together over an in-process channel.
//!
//! The simulated shell plays the part of the window system: a `window.open`
//! from the client becomes an open request to the host, and an allowed
//! request becomes a host-side window paired with the client-side view.
//! Channel messages cross between the two sides as JSON text.

use std::{mem, sync::Arc};

use aot_client::{
    ClientEvent, ClientSession, FloatingContent,
    mock::{MockConference, MockObserver, MockView},
    ops::{ClientDeps, FloatingView as _, ViewRef, WindowOpener},
};
use aot_config::Config;
use aot_host::{
    FloatingEvent, Host, HostEvent, MainWindowEvent, Session,
    mock::{MockDisplays, MockFloatingWindow, MockShell},
    ops::{FloatingWindow as _, OpenDecision, OpenRequest, PositionStore},
};
use aot_protocol::{
    Os, Platform, Position, SessionToken,
    ipc::{ChannelRx, ChannelTx, Endpoint, codec, session_channel},
};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Opener that defers window creation to the simulated shell.
#[derive(Default)]
struct SimOpener {
    /// Views awaiting a host decision.
    pending: Mutex<Vec<Arc<MockView>>>,
}

impl WindowOpener for SimOpener {
    fn open(&self, name: &str) -> aot_client::Result<ViewRef> {
        let view = Arc::new(MockView::new(name, Default::default()));
        self.pending.lock().push(view.clone());
        Ok(view)
    }
}

/// One floating window as both sides see it.
pub struct SimWindow {
    /// Host side.
    pub window: Arc<MockFloatingWindow>,
    /// Client side.
    pub view: Arc<MockView>,
    /// The page loaded into the view.
    pub content: FloatingContent,
}

/// Setup for a [`World`].
pub struct Options {
    /// Operating system both sides believe they run on.
    pub os: Os,
    /// OS release string.
    pub release: &'static str,
    /// Session token for the host.
    pub magic: &'static str,
    /// Screen layout.
    pub displays: MockDisplays,
    /// Where positions persist.
    pub store: Arc<dyn PositionStore>,
    /// Settings for both controllers.
    pub cfg: Config,
}

/// Host session, client session and the shell between them.
pub struct World {
    /// Host-side window system doubles.
    pub shell: MockShell,
    /// Conference the client mirrors video from.
    pub conference: Arc<MockConference>,
    /// Intersection observer of the conference surface.
    pub observer: Arc<MockObserver>,
    /// Host controller session.
    pub host: Session,
    /// Client controller session.
    pub client: ClientSession,
    /// Opener handed to the client.
    opener: Arc<SimOpener>,
    /// Position store shared with the host.
    store: Arc<dyn PositionStore>,
    /// Resources each floating page loads.
    resources: Vec<String>,
    /// Live floating windows, oldest first.
    windows: Vec<SimWindow>,
    /// Shell side of the host's channel.
    to_host: Endpoint,
    /// Shell side of the client's channel.
    to_client: Endpoint,
}

/// Carry every queued message from `from` to `to` through its JSON text form.
/// Returns how many were carried.
fn relay(from: &mut ChannelRx, to: &ChannelTx) -> usize {
    let mut n = 0;
    while let Ok(msg) = from.try_recv() {
        n += 1;
        let text = match codec::encode(&msg) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "shell: dropping unencodable message");
                continue;
            }
        };
        match codec::decode(&text) {
            Ok(msg) => {
                if to.send(msg).is_err() {
                    debug!("shell: peer channel closed");
                }
            }
            Err(e) => warn!(error = %e, %text, "shell: dropping undecodable message"),
        }
    }
    n
}

impl World {
    /// Wire up both controllers; nothing has joined yet.
    pub fn new(opts: Options) -> Self {
        let platform = Platform::new(opts.os, opts.release);
        let shell = MockShell::with_displays(opts.displays);
        let mut host_deps = shell.deps();
        host_deps.store = opts.store.clone();

        let (host_end, to_host) = session_channel();
        let (to_client, client_end) = session_channel();
        let host = Host::new(host_deps, opts.cfg.host, platform.clone(), host_end.tx)
            .with_token(SessionToken::from_string(opts.magic));

        let conference = Arc::new(MockConference::new());
        let observer = Arc::new(MockObserver::new());
        let opener = Arc::new(SimOpener::default());
        let client_deps = ClientDeps {
            conference: conference.clone(),
            observer: observer.clone(),
            opener: opener.clone(),
        };
        let resources = opts.cfg.client.resources.clone();
        let client = aot_client::setup(client_deps, opts.cfg.client, platform, client_end);

        Self {
            shell,
            conference,
            observer,
            host: Session::new(host, host_end.rx),
            client,
            opener,
            store: opts.store,
            resources,
            windows: Vec::new(),
            to_host,
            to_client,
        }
    }

    /// The host's position store.
    pub fn store(&self) -> &dyn PositionStore {
        self.store.as_ref()
    }

    /// The live floating window, if any.
    pub fn current(&self) -> Option<&SimWindow> {
        self.windows.last()
    }

    /// Mutable access to the live floating window.
    pub fn current_mut(&mut self) -> Option<&mut SimWindow> {
        self.windows.last_mut()
    }

    /// Feed a conference-side event to the client and settle.
    pub fn client_event(&mut self, ev: ClientEvent) {
        self.client.client_mut().handle(ev);
        self.pump();
    }

    /// Feed a main window event to the host and settle.
    pub fn main_window(&mut self, ev: MainWindowEvent) {
        self.host.handle(HostEvent::MainWindow(ev));
        self.pump();
    }

    /// Drag the current window: press at page point `page`, move through
    /// `screen` points, release.
    pub fn drag(&mut self, page: Position, screen: &[Position]) {
        if let Some(w) = self.current_mut() {
            w.content.mouse_down(page);
            for p in screen {
                w.content.mouse_move(*p);
            }
            w.content.mouse_up();
        }
        self.pump();
    }

    /// Deliver everything in flight until both sides are quiet.
    pub fn pump(&mut self) {
        loop {
            let mut n = self.client.pump() + self.host.pump();
            n += relay(&mut self.to_client.rx, &self.to_host.tx);
            n += relay(&mut self.to_host.rx, &self.to_client.tx);
            let pending = mem::take(&mut *self.opener.pending.lock());
            for view in pending {
                self.create(view);
                n += 1;
            }
            n += self.reap();
            if n == 0 {
                break;
            }
        }
    }

    /// Ask the host about `view` and create its window when allowed.
    fn create(&mut self, view: Arc<MockView>) {
        let name = view.name().to_string();
        let (reply, mut rx) = oneshot::channel();
        self.host.handle(HostEvent::WindowOpen {
            request: OpenRequest::named(name.as_str()),
            reply,
        });
        let bounds = match rx.try_recv() {
            Ok(OpenDecision::Allow(opts)) => opts.map(|o| o.bounds).unwrap_or_default(),
            _ => {
                info!(%name, "shell: open denied");
                view.close_externally();
                return;
            }
        };
        let window = self.shell.windows.spawn(&name, bounds);
        view.set_inner_size(bounds.size());
        let id = window.id();
        self.host.handle(HostEvent::WindowCreated { window_id: id });
        self.host.handle(HostEvent::Floating {
            window_id: id,
            event: FloatingEvent::ReadyToShow,
        });
        let Some(mut content) = view.content() else {
            debug!(%name, "shell: view has no handoff");
            return;
        };
        let loaded = content.load(&self.resources);
        debug!(%name, window_id = id, resources = loaded.len(), "shell: window created");
        self.windows.push(SimWindow {
            window,
            view,
            content,
        });
    }

    /// Propagate closes across the pair and drop dead windows.
    fn reap(&mut self) -> usize {
        let mut n = 0;
        for w in &self.windows {
            let (host_dead, view_dead) = (w.window.is_destroyed(), w.view.is_closed());
            if !host_dead && !view_dead {
                continue;
            }
            if !host_dead {
                w.window.close();
            }
            if !view_dead {
                w.view.close_externally();
            }
            self.host.handle(HostEvent::Floating {
                window_id: w.window.id(),
                event: FloatingEvent::Closed,
            });
            n += 1;
        }
        self.windows
            .retain(|w| !w.window.is_destroyed() && !w.view.is_closed());
        self.shell.windows.reap();
        n
    }
}
