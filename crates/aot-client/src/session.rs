//! Async driver for one client session.

use aot_config::ClientConfig;
use aot_protocol::{
    Platform,
    ipc::{ChannelRx, Endpoint},
};
use tokio::{
    select,
    sync::mpsc::error::TryRecvError,
    time::{Instant, sleep_until},
};
use tracing::debug;

use crate::{
    client::{Client, ClientEvent, ClientEventRx, ClientEventTx, Flow, event_channel},
    ops::ClientDeps,
};

/// A [`Client`] plus its two inbound queues.
pub struct ClientSession {
    client: Client,
    from_host: ChannelRx,
    events: ClientEventRx,
    tx: ClientEventTx,
    host_open: bool,
}

/// Wire a client controller to the client end of a session channel.
pub fn setup(
    deps: ClientDeps,
    cfg: ClientConfig,
    platform: Platform,
    endpoint: Endpoint,
) -> ClientSession {
    let Endpoint { tx, rx } = endpoint;
    let (local, events) = event_channel();
    let client = Client::new(deps, cfg, platform, tx, local.clone());
    ClientSession {
        client,
        from_host: rx,
        events,
        tx: local,
        host_open: true,
    }
}

impl ClientSession {
    /// Sender for conference, intersection and media events.
    pub fn sender(&self) -> ClientEventTx {
        self.tx.clone()
    }

    /// The wrapped controller.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Mutable access to the wrapped controller.
    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Handle everything already queued on either side until both queues
    /// are empty. Pending refresh timers are left alone. Returns how many
    /// items were handled.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        loop {
            let before = n;
            while self.host_open {
                match self.from_host.try_recv() {
                    Ok(msg) => {
                        self.client.on_channel(msg);
                        n += 1;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => self.host_open = false,
                }
            }
            while let Ok(ev) = self.events.try_recv() {
                n += 1;
                if self.client.handle(ev) == Flow::Disposed {
                    return n;
                }
            }
            if n == before {
                return n;
            }
        }
    }

    /// Drive the client until it is disposed.
    pub async fn run(mut self) -> Self {
        loop {
            let deadline = self.client.refresh_deadline();
            select! {
                ev = self.events.recv() => match ev {
                    Some(ev) => {
                        if self.client.handle(ev) == Flow::Disposed {
                            break;
                        }
                    }
                    None => break,
                },
                msg = self.from_host.recv(), if self.host_open => match msg {
                    Some(msg) => self.client.on_channel(msg),
                    None => {
                        debug!("host channel closed");
                        self.host_open = false;
                    }
                },
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.client.handle(ClientEvent::RefreshDue);
                }
            }
        }
        self
    }
}
