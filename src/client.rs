#[cfg(test)]
mod client_test;

use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::{sleep_until, Instant};

use crate::agent::*;
use crate::error::*;
use crate::message::*;
use crate::transport::Transport;

// RetransmissionPolicy implements the STUN RFC's exponential-backoff
// retransmission timer: `rc - 1` retransmissions doubling the RTO each
// time, followed by one final wait of `rm * rto` before giving up.
//
// With the defaults (rto=500ms, rc=7, rm=16) total time to `Error::Timeout`
// is `rto * (2^(rc-1) - 1) + rm * rto` ~= 39.5s.
#[derive(Debug, Clone, Copy)]
pub struct RetransmissionPolicy {
    pub rto: Duration,
    pub rc: u32,
    pub rm: u32,
}

pub const DEFAULT_RTO: Duration = Duration::from_millis(500);
pub const DEFAULT_RC: u32 = 7;
pub const DEFAULT_RM: u32 = 16;

impl Default for RetransmissionPolicy {
    fn default() -> Self {
        RetransmissionPolicy {
            rto: DEFAULT_RTO,
            rc: DEFAULT_RC,
            rm: DEFAULT_RM,
        }
    }
}

impl RetransmissionPolicy {
    // no_retransmit sends the request exactly once and waits rto before
    // timing out. Useful for reliable (TCP-like) transports where the
    // transport layer already handles loss recovery.
    pub fn no_retransmit(rto: Duration) -> Self {
        RetransmissionPolicy { rto, rc: 1, rm: 1 }
    }
}

// Client correlates STUN requests with their responses over a Transport,
// retransmitting according to a RetransmissionPolicy. It owns a background
// task that reads datagrams off the transport and feeds them to the
// shared Agent, and is cheap to clone (Arc internally) so many calls can
// be in flight concurrently.
#[derive(Clone)]
pub struct Client {
    agent: Arc<Mutex<Agent>>,
    transport: Arc<dyn Transport>,
    policy: RetransmissionPolicy,
    close_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>, policy: RetransmissionPolicy) -> Self {
        let agent = Arc::new(Mutex::new(Agent::new()));
        let (close_tx, close_rx) = oneshot::channel();

        let client = Client {
            agent: Arc::clone(&agent),
            transport: Arc::clone(&transport),
            policy,
            close_tx: Arc::new(Mutex::new(Some(close_tx))),
        };

        tokio::spawn(Client::read_loop(agent, transport, close_rx));

        client
    }

    async fn read_loop(
        agent: Arc<Mutex<Agent>>,
        transport: Arc<dyn Transport>,
        mut close_rx: oneshot::Receiver<()>,
    ) {
        let mut buf = vec![0u8; 1500];
        loop {
            tokio::select! {
                _ = &mut close_rx => return,
                res = transport.recv(&mut buf) => {
                    let n = match res {
                        Ok(n) => n,
                        Err(_) => continue,
                    };
                    if !is_message(&buf[..n]) {
                        continue;
                    }
                    let mut msg = Message::new();
                    let mut reader = BufReader::new(&buf[..n]);
                    if msg.read_from(&mut reader).is_err() {
                        continue;
                    }
                    let mut agent = agent.lock().await;
                    let _ = agent.process(msg);
                }
            }
        }
    }

    // call sends request and awaits the matching response, retransmitting
    // per self.policy. If request's transaction id is the zero value, a
    // fresh random one is generated. cancel, if given, resolves the call
    // early with Error::Cancelled.
    pub async fn call(
        &self,
        request: &mut Message,
        cancel: Option<oneshot::Receiver<()>>,
    ) -> Result<Message> {
        if request.transaction_id == TransactionId::default() {
            request.new_transaction_id()?;
        }
        let id = request.transaction_id;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let mut interval = self.policy.rto;
        self.agent
            .lock()
            .await
            .start(id, start + interval, Some(tx))?;

        self.transport.send(&request.raw).await?;

        let mut cancel = cancel;
        let mut attempt = 0u32;
        let mut deadline = start + interval;

        let result = loop {
            let cancel_fut = async {
                match &mut cancel {
                    Some(c) => c.await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;
                _ = cancel_fut => {
                    let _ = self.agent.lock().await.stop_with_error(id, Error::Cancelled);
                    break Err(Error::Cancelled);
                }
                event = rx.recv() => {
                    match event {
                        Some(e) => break e.result,
                        None => break Err(Error::AgentClosed),
                    }
                }
                _ = sleep_until(deadline) => {
                    if attempt < self.policy.rc.saturating_sub(1) {
                        attempt += 1;
                        interval *= 2;
                        self.transport.send(&request.raw).await?;
                        deadline = Instant::now() + interval;
                        self.agent.lock().await.reschedule(id, deadline)?;
                    } else if attempt == self.policy.rc.saturating_sub(1) {
                        attempt += 1;
                        let final_wait = self.policy.rto * self.policy.rm;
                        deadline = Instant::now() + final_wait;
                        self.agent.lock().await.reschedule(id, deadline)?;
                    } else {
                        let _ = self.agent.lock().await.stop(id);
                        break Err(Error::Timeout);
                    }
                }
            }
        };

        result
    }

    // close stops the client's read loop and fails any transaction still
    // in progress with Error::ClientClosed.
    pub async fn close(&self) -> Result<()> {
        if let Some(tx) = self.close_tx.lock().await.take() {
            let _ = tx.send(());
        } else {
            return Err(Error::ClientClosed);
        }
        self.agent.lock().await.close()
    }
}
