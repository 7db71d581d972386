//! Scripted end-to-end scenarios.

use std::{path::PathBuf, sync::Arc};

use aot_client::{ClientEvent, ops::VideoAttachment};
use aot_config::Config;
use aot_host::{
    JsonFileStore, MainWindowEvent, MemoryStore,
    mock::MockDisplays,
    ops::{FloatingWindow as _, OpenDecision, OpenRequest, PositionStore},
};
use aot_protocol::{Os, Position, Rect, STORAGE_X, STORAGE_Y, window_name};
use tracing::info;

use crate::{
    cli::ScenarioName,
    error::{Error, Result},
    world::{Options, World},
};

const MAGIC: &str = "abc123";

/// Inputs shared by every scenario.
pub struct Env {
    /// Settings for both controllers.
    pub cfg: Config,
    /// JSON store to persist positions in; memory when unset.
    pub store_path: Option<PathBuf>,
}

impl Env {
    /// Position store seeded with `entries`.
    fn store(&self, entries: &[(&str, i32)]) -> Result<Arc<dyn PositionStore>> {
        let Some(path) = &self.store_path else {
            return Ok(Arc::new(MemoryStore::with(entries.iter().copied())));
        };
        let store = JsonFileStore::open(path)?;
        for (k, v) in entries {
            store.set(k, *v)?;
        }
        Ok(Arc::new(store))
    }

    /// A fresh world on a single display.
    fn world(
        &self,
        os: Os,
        release: &'static str,
        display: Rect,
        store: Arc<dyn PositionStore>,
    ) -> World {
        World::new(Options {
            os,
            release,
            magic: MAGIC,
            displays: MockDisplays::single(display),
            store,
            cfg: self.cfg.clone(),
        })
    }
}

/// Every runnable scenario, in order.
pub const ALL: [ScenarioName; 4] = [
    ScenarioName::OpenOnBlur,
    ScenarioName::ClampStored,
    ScenarioName::Drag,
    ScenarioName::LeaveIntersecting,
];

impl ScenarioName {
    /// Name shown in output.
    pub fn label(self) -> &'static str {
        match self {
            Self::OpenOnBlur => "open-on-blur",
            Self::ClampStored => "clamp-stored",
            Self::Drag => "drag",
            Self::LeaveIntersecting => "leave-intersecting",
            Self::All => "all",
        }
    }
}

/// Run `name`, stopping at the first failed expectation.
pub fn run(name: ScenarioName, env: &Env) -> Result<()> {
    match name {
        ScenarioName::OpenOnBlur => open_on_blur(env),
        ScenarioName::ClampStored => clamp_stored_position(env),
        ScenarioName::Drag => drag(env),
        ScenarioName::LeaveIntersecting => leave_while_intersecting(env),
        ScenarioName::All => ALL.into_iter().try_for_each(|s| run(s, env)),
    }
}

/// Fail `scenario` with `msg` unless `cond` holds.
fn ensure(cond: bool, scenario: &'static str, msg: impl Into<String>) -> Result<()> {
    if cond { Ok(()) } else { Err(Error::check(scenario, msg)) }
}

/// A world whose client has joined and whose host window just lost focus.
fn joined(
    env: &Env,
    os: Os,
    release: &'static str,
    display: Rect,
    store: &[(&str, i32)],
) -> Result<World> {
    let mut w = env.world(os, release, display, env.store(store)?);
    w.client_event(ClientEvent::ConferenceJoined);
    w.main_window(MainWindowEvent::Blur);
    Ok(w)
}

/// Blur after join opens the window named with our token and mirrors the
/// large video into it; foreign tokens are refused.
fn open_on_blur(env: &Env) -> Result<()> {
    const S: &str = "open-on-blur";
    let mut w = env.world(Os::Linux, "", Rect::new(0, 0, 1920, 1080), env.store(&[])?);
    w.conference.set_large(Some("large-1"));
    w.client_event(ClientEvent::ConferenceJoined);
    w.main_window(MainWindowEvent::Blur);
    let cur = w
        .current()
        .ok_or_else(|| Error::check(S, "no floating window after blur"))?;
    let name = window_name(MAGIC);
    ensure(cur.view.name() == name, S, format!("window named {}", cur.view.name()))?;
    ensure(cur.window.is_visible(), S, "floating window not shown")?;
    ensure(
        cur.window.always_on_top().is_some_and(|(on, _)| on),
        S,
        "floating window not always on top",
    )?;
    let foreign = w
        .host
        .host()
        .window_open_handler(&OpenRequest::named(window_name("zzz")));
    ensure(foreign == OpenDecision::Deny, S, "foreign token was allowed")?;
    let video = cur.view.video();
    ensure(
        matches!(&video, Some(VideoAttachment::Stream { stream_id, .. }) if stream_id == "large-1"),
        S,
        format!("floating video is {video:?}"),
    )?;
    info!(%name, "{S} passed");
    Ok(())
}

/// A stored position off the right edge is pulled back onto the display.
fn clamp_stored_position(env: &Env) -> Result<()> {
    const S: &str = "clamp-stored";
    let display = Rect::new(0, 0, 1280, 800);
    let w = joined(
        env,
        Os::Windows,
        "10.0.22631",
        display,
        &[(STORAGE_X, 1000), (STORAGE_Y, 50)],
    )?;
    let cur = w
        .current()
        .ok_or_else(|| Error::check(S, "no floating window after blur"))?;
    let at = cur.window.bounds().position();
    let width = env.cfg.host.default_size.width;
    ensure(
        at == Position::new(display.right() - width, 50),
        S,
        format!("window opened at {at:?}"),
    )?;
    info!(?at, "{S} passed");
    Ok(())
}

/// A drag moves the window in one bounds call at its drag-start size.
fn drag(env: &Env) -> Result<()> {
    const S: &str = "drag";
    let mut w = joined(env, Os::Linux, "", Rect::new(0, 0, 1920, 1080), &[])?;
    w.drag(Position::new(100, 100), &[Position::new(150, 130)]);
    let cur = w
        .current()
        .ok_or_else(|| Error::check(S, "no floating window after drag"))?;
    let calls = cur.window.bounds_calls();
    let want = Rect::from_parts(Position::new(50, 30), env.cfg.host.default_size);
    ensure(
        calls == [want],
        S,
        format!("expected one bounds call to {want:?}, got {calls:?}"),
    )?;
    info!(bounds = ?want, "{S} passed");
    Ok(())
}

/// Leaving closes the hidden window, persists its position and resets state.
fn leave_while_intersecting(env: &Env) -> Result<()> {
    const S: &str = "leave-intersecting";
    let mut w = joined(env, Os::Linux, "", Rect::new(0, 0, 1920, 1080), &[])?;
    w.client_event(ClientEvent::Intersection(true));
    let window = w
        .current()
        .map(|c| c.window.clone())
        .ok_or_else(|| Error::check(S, "no floating window after blur"))?;
    ensure(!window.is_visible(), S, "window visible while intersecting")?;

    w.client_event(ClientEvent::ConferenceLeft);
    ensure(window.is_destroyed(), S, "window survived leaving")?;
    ensure(w.current().is_none(), S, "client view survived leaving")?;
    let at = window.bounds().position();
    let stored = (w.store().get(STORAGE_X), w.store().get(STORAGE_Y));
    ensure(
        stored == (Some(at.x), Some(at.y)),
        S,
        format!("stored {stored:?}, window was at {at:?}"),
    )?;
    ensure(
        w.host.host().size() == env.cfg.host.default_size,
        S,
        "size not reset",
    )?;
    ensure(w.observer.active() == 0, S, "still observing intersection")?;
    ensure(!w.client.client().is_joined(), S, "client still joined")?;
    info!(?at, "{S} passed");
    Ok(())
}
