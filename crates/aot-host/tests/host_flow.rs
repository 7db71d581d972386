//! End-to-end host controller behavior against mock collaborators.

use std::sync::Arc;

use aot_config::{HostConfig, ZLevel};
use aot_host::{
    FloatingEvent, Flow, Host, HostEvent, MainWindowEvent, MemoryStore, Session,
    mock::{MockDisplays, MockFloatingWindow, MockShell},
    ops::{FloatingWindow as _, OpenDecision, OpenRequest, PositionStore as _, ResizeDecision},
    setup,
};
use aot_protocol::{
    ChannelMessage, EventName, Os, Platform, Position, Rect, STORAGE_X, STORAGE_Y, SessionToken,
    Size, State,
    ipc::{ChannelRx, ChannelTx, session_channel},
};
use tokio::{sync::oneshot, task::yield_now};

const MAGIC: &str = "abc123";

struct Rig {
    shell: MockShell,
    session: Session,
    /// Messages from the host.
    from_host: ChannelRx,
    /// Messages towards the host.
    to_host: ChannelTx,
}

fn rig_with(shell: MockShell, os: Os) -> Rig {
    let (host_end, client_end) = session_channel();
    let host = Host::new(
        shell.deps(),
        HostConfig::default(),
        Platform::new(os, "10.0.22631"),
        host_end.tx,
    )
    .with_token(SessionToken::from_string(MAGIC));
    Rig {
        shell,
        session: Session::new(host, host_end.rx),
        from_host: client_end.rx,
        to_host: client_end.tx,
    }
}

fn rig(os: Os) -> Rig {
    rig_with(MockShell::new(), os)
}

impl Rig {
    fn client_says(&mut self, state: State) {
        self.to_host
            .send(ChannelMessage::update_state(state))
            .unwrap();
        self.session.pump();
    }

    fn main_window(&mut self, ev: MainWindowEvent) -> Flow {
        self.session.handle(HostEvent::MainWindow(ev))
    }

    fn sent(&mut self) -> Vec<ChannelMessage> {
        let mut out = Vec::new();
        while let Ok(m) = self.from_host.try_recv() {
            out.push(m);
        }
        out
    }

    fn sent_states(&mut self) -> Vec<State> {
        self.sent().into_iter().filter_map(|m| m.state).collect()
    }

    fn open_request(&mut self, frame_name: &str) -> OpenDecision {
        let (reply, rx) = oneshot::channel();
        self.session.handle(HostEvent::WindowOpen {
            request: OpenRequest::named(frame_name),
            reply,
        });
        rx.blocking_recv().unwrap()
    }

    /// Allow and create the window without it becoming ready.
    fn create_window(&mut self) -> Arc<MockFloatingWindow> {
        let name = format!("AlwaysOnTop-{MAGIC}");
        let OpenDecision::Allow(Some(opts)) = self.open_request(&name) else {
            panic!("aot window denied");
        };
        let w = self.shell.windows.spawn(&name, opts.bounds);
        self.session
            .handle(HostEvent::WindowCreated { window_id: w.id() });
        w
    }

    /// Run the whole open handshake and return the created window.
    fn open_window(&mut self) -> Arc<MockFloatingWindow> {
        let w = self.create_window();
        self.floating(&w, FloatingEvent::ReadyToShow);
        w
    }

    fn floating(&mut self, w: &MockFloatingWindow, event: FloatingEvent) {
        self.session.handle(HostEvent::Floating {
            window_id: w.id(),
            event,
        });
    }
}

#[test]
fn blur_after_join_requests_open_with_magic() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    r.main_window(MainWindowEvent::Blur);
    let sent = r.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, EventName::UpdateState);
    assert_eq!(sent[0].state, Some(State::Open));
    assert_eq!(sent[0].magic(), Some(MAGIC));

    let decision = r.open_request("AlwaysOnTop-abc123");
    assert!(decision.is_allowed());
}

#[test]
fn blur_before_join_does_nothing() {
    let mut r = rig(Os::Linux);
    r.main_window(MainWindowEvent::Blur);
    assert!(r.sent().is_empty());
}

#[test]
fn open_options_carry_chrome_and_default_top_right_bounds() {
    let mut r = rig(Os::Linux);
    let OpenDecision::Allow(Some(opts)) = r.open_request("AlwaysOnTop-abc123") else {
        panic!("expected options");
    };
    assert!(opts.chrome.always_on_top);
    assert!(!opts.chrome.show);
    assert_eq!(opts.bounds, Rect::new(1920 - 320, 0, 320, 180));
}

#[test]
fn foreign_windows_are_denied_without_fallback_and_delegated_with_one() {
    let mut r = rig(Os::Linux);
    assert_eq!(r.open_request("settings"), OpenDecision::Deny);

    let shell = MockShell::new();
    let (host_end, _client) = session_channel();
    let host = Host::new(
        shell.deps(),
        HostConfig::default(),
        Platform::new(Os::Linux, ""),
        host_end.tx,
    )
    .with_open_handler(Box::new(|req| {
        if req.frame_name == "settings" {
            OpenDecision::Allow(None)
        } else {
            OpenDecision::Deny
        }
    }));
    assert_eq!(
        host.window_open_handler(&OpenRequest::named("settings")),
        OpenDecision::Allow(None)
    );
    assert_eq!(
        host.window_open_handler(&OpenRequest::named("other")),
        OpenDecision::Deny
    );
}

#[test]
fn created_window_is_configured_and_shown_when_ready() {
    let mut r = rig(Os::Linux);
    let w = r.open_window();
    assert_eq!(w.always_on_top(), Some((true, ZLevel::ScreenSaver)));
    assert_eq!(w.content_protection(), Some(true));
    assert_eq!(w.aspect_ratio(), None);
    assert_eq!(w.count("show"), 1);
    assert_eq!(r.session.host().armed_window(), Some(w.id()));
}

#[test]
fn old_windows_release_skips_content_protection() {
    let (host_end, _client) = session_channel();
    let shell = MockShell::new();
    let mut session = setup(
        shell.deps(),
        HostConfig::default(),
        Platform::new(Os::Windows, "10.0.17763"),
        host_end,
    );
    let magic = session.host().magic().clone();
    let w = shell
        .windows
        .spawn(&magic.window_name(), Rect::new(0, 0, 320, 180));
    session.handle(HostEvent::WindowCreated { window_id: w.id() });
    assert_eq!(w.content_protection(), None);
    assert!(w.always_on_top().is_some());
}

#[test]
fn macos_uses_native_aspect_ratio() {
    let mut r = rig(Os::MacOs);
    let w = r.open_window();
    let ratio = w.aspect_ratio().unwrap();
    assert!((ratio - 16.0 / 9.0).abs() < f64::EPSILON);

    // Resizes are recorded but never corrected.
    w.user_resize(Size::new(500, 200));
    r.floating(&w, FloatingEvent::Resize);
    assert!(!w.calls_contains("set_size"));
    assert_eq!(r.session.host().size(), Size::new(500, 200));
}

#[test]
fn ready_to_show_only_shows_once() {
    let mut r = rig(Os::Linux);
    let w = r.open_window();
    r.floating(&w, FloatingEvent::ReadyToShow);
    assert_eq!(w.count("show"), 1);
}

#[test]
fn intersection_hides_and_reveals() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    let w = r.open_window();
    r.sent();

    r.client_says(State::IsIntersecting);
    assert!(w.calls_contains("hide"));
    assert_eq!(r.sent_states(), vec![State::Hide]);

    r.client_says(State::IsNotIntersecting);
    assert!(w.calls_contains("show_inactive"));
    assert_eq!(r.sent_states(), vec![State::Show]);
}

#[test]
fn intersecting_without_window_sends_nothing() {
    let mut r = rig(Os::Linux);
    r.client_says(State::IsIntersecting);
    assert!(r.session.host().is_intersecting());
    assert!(r.sent().is_empty());
}

#[test]
fn focus_hides_only_while_intersecting() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    let w = r.open_window();
    r.session.host_mut().on_channel(ChannelMessage::update_state(State::IsNotIntersecting));
    r.sent();

    r.main_window(MainWindowEvent::Focus);
    assert!(!w.calls_contains("hide"));
    assert!(r.sent().is_empty());

    r.client_says(State::IsIntersecting);
    r.sent();
    r.main_window(MainWindowEvent::Blur);
    r.main_window(MainWindowEvent::Focus);
    assert_eq!(w.count("hide"), 2);
}

#[test]
fn show_main_window_focuses_host_window() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ShowMainWindow);
    assert_eq!(r.shell.main_window.shows(), 1);
}

#[test]
fn move_sets_bounds_once() {
    let mut r = rig(Os::Linux);
    let w = r.open_window();
    r.to_host
        .send(ChannelMessage::move_to(
            Position::new(50, 30),
            Size::new(320, 180),
        ))
        .unwrap();
    r.session.pump();
    assert_eq!(w.bounds_calls(), vec![Rect::new(50, 30, 320, 180)]);
}

#[test]
fn move_without_window_is_ignored() {
    let mut r = rig(Os::Linux);
    r.to_host
        .send(ChannelMessage::move_to(Position::new(1, 2), Size::new(320, 180)))
        .unwrap();
    assert_eq!(r.session.pump(), 1);
}

#[test]
fn dismiss_closes_window_without_persisting() {
    let mut r = rig(Os::Linux);
    let w = r.open_window();
    r.client_says(State::Dismiss);
    assert!(w.calls_contains("close"));
    assert_eq!(r.shell.store.writes(), 0);
}

#[test]
fn close_persists_once_and_resets_size() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    let w = r.open_window();
    r.client_says(State::IsIntersecting);

    w.user_resize(Size::new(480, 270));
    r.floating(
        &w,
        FloatingEvent::WillResize {
            new_bounds: w.bounds(),
            reply: oneshot::channel().0,
        },
    );
    r.floating(&w, FloatingEvent::Resize);
    w.user_move(Position::new(100, 200));

    r.client_says(State::Close);
    assert!(!r.session.host().main_handlers_attached());
    assert!(w.calls_contains("close"));
    assert_eq!(r.shell.store.writes(), 2);
    assert_eq!(r.shell.store.get(STORAGE_X), Some(100));
    assert_eq!(r.shell.store.get(STORAGE_Y), Some(200));
    assert_eq!(r.session.host().size(), Size::new(320, 180));

    // Handlers are gone: blur no longer asks for a window.
    r.sent();
    r.main_window(MainWindowEvent::Blur);
    assert!(r.sent().is_empty());
}

#[test]
fn close_without_window_is_a_no_op() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    r.client_says(State::Close);
    assert_eq!(r.shell.store.writes(), 0);
    assert!(r.sent().is_empty());
}

#[test]
fn stale_and_crashed_handles_are_treated_as_absent() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    let w = r.open_window();
    w.destroy();
    r.sent();
    r.main_window(MainWindowEvent::Blur);
    assert_eq!(r.sent_states(), vec![State::Open]);
    assert!(!w.calls_contains("show_inactive"));

    let w2 = r.open_window();
    w2.crash();
    assert!(r.session.host().aot_window().is_none());
    r.floating(
        &w2,
        FloatingEvent::RenderProcessGone {
            reason: "crashed".into(),
        },
    );
    assert!(w2.calls_contains("close"));
    assert_eq!(r.session.host().armed_window(), None);
}

#[test]
fn windows_named_for_another_session_are_not_ours() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    let other = r
        .shell
        .windows
        .spawn("AlwaysOnTop-zzz", Rect::new(0, 0, 320, 180));
    r.client_says(State::IsIntersecting);
    assert!(!other.calls_contains("hide"));
    assert!(r.session.host().aot_window().is_none());
}

#[test]
fn rapid_reopen_only_listens_to_the_newest_window() {
    let mut r = rig(Os::Linux);
    let first = r.open_window();
    r.client_says(State::Dismiss);
    r.shell.windows.reap();
    let second = r.open_window();
    assert_eq!(r.session.host().armed_window(), Some(second.id()));

    // A late event from the first window must not touch the second.
    r.floating(&first, FloatingEvent::Resize);
    assert!(!second.calls_contains("set_size"));
}

#[test]
fn reopen_while_the_old_window_lives_configures_the_new_one() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    let first = r.open_window();
    let second = r.open_window();

    assert!(first.is_destroyed());
    assert!(second.is_visible());
    assert_eq!(second.always_on_top(), Some((true, ZLevel::ScreenSaver)));
    assert_eq!(r.session.host().armed_window(), Some(second.id()));
    let resolved = r.session.host().aot_window().map(|w| w.id());
    assert_eq!(resolved, Some(second.id()));

    r.client_says(State::IsIntersecting);
    assert!(!second.is_visible());
}

#[test]
fn ready_after_close_does_not_show() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    let w = r.create_window();
    r.client_says(State::Close);
    r.floating(&w, FloatingEvent::ReadyToShow);
    assert!(w.is_destroyed());
    assert_eq!(w.count("show"), 0);
    assert!(!w.is_visible());
}

#[test]
fn ready_after_dismiss_does_not_show() {
    let mut r = rig(Os::Linux);
    r.client_says(State::ConferenceJoined);
    let w = r.create_window();
    r.client_says(State::Dismiss);
    r.floating(&w, FloatingEvent::ReadyToShow);
    assert_eq!(w.count("show"), 0);
    assert!(!w.is_visible());
}

#[test]
fn client_disconnect_detaches_window_listeners() {
    let Rig {
        mut session,
        mut from_host,
        to_host,
        ..
    } = rig(Os::Linux);
    to_host
        .send(ChannelMessage::update_state(State::ConferenceJoined))
        .unwrap();
    drop(to_host);
    assert_eq!(session.pump(), 1);
    assert!(!session.is_listening());
    assert!(!session.host().main_handlers_attached());

    session.handle(HostEvent::MainWindow(MainWindowEvent::Blur));
    assert!(from_host.try_recv().is_err());
}

#[test]
fn size_is_kept_across_reopen_within_a_conference() {
    let mut r = rig(Os::Linux);
    let w = r.open_window();
    let (reply, rx) = oneshot::channel();
    r.shell.displays.set_cursor(Position::new(0, 0));
    r.floating(
        &w,
        FloatingEvent::WillResize {
            new_bounds: Rect::new(1600, 0, 400, 180),
            reply,
        },
    );
    assert_eq!(rx.blocking_recv().unwrap(), ResizeDecision::Allow);
    w.user_resize(Size::new(400, 180));
    r.floating(&w, FloatingEvent::Resize);
    assert_eq!(w.bounds().size(), Size::new(400, 225));

    r.client_says(State::Dismiss);
    let OpenDecision::Allow(Some(opts)) = r.open_request("AlwaysOnTop-abc123") else {
        panic!("denied");
    };
    assert_eq!(opts.bounds.size(), Size::new(400, 225));
}

#[test]
fn corner_drag_is_vetoed() {
    let mut r = rig(Os::Windows);
    let w = r.open_window();
    let b = w.bounds();
    r.shell
        .displays
        .set_cursor(Position::new(b.right() - 2, b.bottom() - 2));
    let (reply, rx) = oneshot::channel();
    r.floating(&w, FloatingEvent::WillResize { new_bounds: b, reply });
    assert_eq!(rx.blocking_recv().unwrap(), ResizeDecision::Prevent);
}

#[test]
fn stored_position_is_clamped_on_windows() {
    let shell = MockShell::with_displays(MockDisplays::single(Rect::new(0, 0, 1280, 800)))
        .with_store(MemoryStore::with([(STORAGE_X, 1000), (STORAGE_Y, 50)]));
    let mut r = rig_with(shell, Os::Windows);
    let OpenDecision::Allow(Some(opts)) = r.open_request("AlwaysOnTop-abc123") else {
        panic!("denied");
    };
    assert_eq!(opts.bounds.position(), Position::new(960, 50));
}

#[test]
fn main_window_close_removes_the_listener() {
    let mut r = rig(Os::Linux);
    assert_eq!(r.main_window(MainWindowEvent::Closed), Flow::Teardown);
    assert!(!r.session.is_listening());
    r.to_host
        .send(ChannelMessage::update_state(State::ShowMainWindow))
        .ok();
    assert_eq!(r.session.pump(), 0);
    assert_eq!(r.shell.main_window.shows(), 0);
}

#[test]
fn unknown_messages_are_ignored() {
    let mut r = rig(Os::Linux);
    r.to_host
        .send(ChannelMessage {
            name: EventName::Unknown("aot-resize".into()),
            ..ChannelMessage::update_state(State::Unknown("aot-x".into()))
        })
        .unwrap();
    r.client_says(State::Unknown("aot-minimize".into()));
    assert!(r.sent().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn run_drives_channel_and_window_events() {
    let shell = MockShell::new();
    let (host_end, mut client) = session_channel();
    let session = setup(
        shell.deps(),
        HostConfig::default(),
        Platform::new(Os::Linux, ""),
        host_end,
    );
    let (events, rx) = aot_host::event_channel();
    let task = tokio::spawn(session.run(rx));

    client
        .tx
        .send(ChannelMessage::update_state(State::ConferenceJoined))
        .unwrap();
    // Let the driver drain the channel before the blur arrives.
    yield_now().await;
    yield_now().await;
    events
        .send(HostEvent::MainWindow(MainWindowEvent::Blur))
        .unwrap();
    let msg = client.rx.recv().await.unwrap();
    assert_eq!(msg.state, Some(State::Open));

    events
        .send(HostEvent::MainWindow(MainWindowEvent::Closed))
        .unwrap();
    let session = task.await.unwrap();
    assert!(!session.is_listening());
}
