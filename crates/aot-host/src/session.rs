//! Async driver for one host session.

use aot_config::HostConfig;
use aot_protocol::{
    Platform,
    ipc::{ChannelRx, Endpoint},
};
use tokio::{select, sync::mpsc};
use tracing::{debug, info, trace};

use crate::{
    host::{Flow, Host, HostEvent},
    ops::HostDeps,
};

/// Sender for shell-originated host events.
pub type HostEventTx = mpsc::UnboundedSender<HostEvent>;
/// Receiver for shell-originated host events.
pub type HostEventRx = mpsc::UnboundedReceiver<HostEvent>;

/// Create the channel a shell uses to feed window events into a session.
pub fn event_channel() -> (HostEventTx, HostEventRx) {
    mpsc::unbounded_channel()
}

/// A [`Host`] plus the inbound half of the session channel.
pub struct Session {
    host: Host,
    from_client: ChannelRx,
    listening: bool,
}

/// Wire a host controller to the host end of a session channel.
pub fn setup(deps: HostDeps, cfg: HostConfig, platform: Platform, endpoint: Endpoint) -> Session {
    let Endpoint { tx, rx } = endpoint;
    Session::new(Host::new(deps, cfg, platform, tx), rx)
}

impl Session {
    /// Pair `host` with the receiving half of the client channel.
    pub fn new(host: Host, from_client: ChannelRx) -> Self {
        Self {
            host,
            from_client,
            listening: true,
        }
    }

    /// The wrapped controller.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Mutable access to the wrapped controller.
    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    /// False once the channel listener has been removed.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Feed one shell event; tears the session down when the host window is
    /// gone.
    pub fn handle(&mut self, event: HostEvent) -> Flow {
        let flow = self.host.handle(event);
        if flow == Flow::Teardown {
            self.cleanup();
        }
        flow
    }

    /// Handle every client message already queued. Returns how many were
    /// handled.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        while self.listening {
            match self.from_client.try_recv() {
                Ok(msg) => {
                    self.host.on_channel(msg);
                    n += 1;
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    debug!("client channel disconnected");
                    self.cleanup();
                }
            }
        }
        n
    }

    /// Remove the channel listener and stop reacting to window events.
    /// Messages the client sends afterwards are never handled. Idempotent.
    pub fn cleanup(&mut self) {
        if !self.listening {
            return;
        }
        self.from_client.close();
        while self.from_client.try_recv().is_ok() {}
        self.listening = false;
        self.host.teardown();
        info!("removed aot channel listener");
    }

    /// Drive the session until the host window closes or the event source
    /// goes away.
    pub async fn run(mut self, mut events: HostEventRx) -> Self {
        loop {
            select! {
                ev = events.recv() => match ev {
                    Some(ev) => {
                        if self.handle(ev) == Flow::Teardown {
                            break;
                        }
                    }
                    None => {
                        debug!("host event source gone");
                        self.cleanup();
                        break;
                    }
                },
                msg = self.from_client.recv(), if self.listening => match msg {
                    Some(msg) => self.host.on_channel(msg),
                    None => {
                        trace!("client channel closed");
                        self.cleanup();
                    }
                },
            }
        }
        self
    }
}
