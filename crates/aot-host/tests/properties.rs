//! Property tests for the open gate and focus-driven hiding.

use aot_config::HostConfig;
use aot_host::{
    FloatingEvent, Host, HostEvent, MainWindowEvent, Session,
    mock::MockShell,
    ops::{FloatingWindow as _, OpenDecision, OpenRequest},
};
use aot_protocol::{
    ChannelMessage, Os, Platform, Rect, SessionToken, State, ipc::session_channel, window_name,
};
use proptest::prelude::*;

fn host_with(magic: &str) -> (MockShell, Session) {
    let shell = MockShell::new();
    let (host_end, _client) = session_channel();
    let host = Host::new(
        shell.deps(),
        HostConfig::default(),
        Platform::new(Os::Linux, ""),
        host_end.tx,
    )
    .with_token(SessionToken::from_string(magic));
    (shell, Session::new(host, host_end.rx))
}

proptest! {
    #[test]
    fn foreign_magic_is_always_denied(ours in "[a-f0-9]{1,32}", theirs in "[a-f0-9-]{0,32}") {
        prop_assume!(ours != theirs);
        let (_shell, session) = host_with(&ours);
        let decision = session
            .host()
            .window_open_handler(&OpenRequest::named(window_name(&theirs)));
        prop_assert_eq!(decision, OpenDecision::Deny);
    }

    #[test]
    fn focus_hides_exactly_when_intersecting(flags in prop::collection::vec(any::<bool>(), 1..12)) {
        let (shell, mut session) = host_with("abc123");
        let host = session.host_mut();
        host.on_channel(ChannelMessage::update_state(State::ConferenceJoined));
        let w = shell
            .windows
            .spawn(&window_name("abc123"), Rect::new(0, 0, 320, 180));
        session.handle(HostEvent::WindowCreated { window_id: w.id() });
        session.handle(HostEvent::Floating { window_id: w.id(), event: FloatingEvent::ReadyToShow });

        for intersecting in flags {
            session
                .host_mut()
                .on_channel(ChannelMessage::update_state(State::from_intersecting(intersecting)));
            // Reveal the window again so a hide is observable.
            session.handle(HostEvent::MainWindow(MainWindowEvent::Blur));
            let before = w.count("hide");
            session.handle(HostEvent::MainWindow(MainWindowEvent::Focus));
            let hid = w.count("hide") > before;
            prop_assert_eq!(hid, intersecting);
        }
    }
}
