
use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::*;
use crate::message::*;

// Handler receives the outcome of a single transaction: either the
// matching response Message or the error that ended it (timeout,
// cancellation, or the Agent closing).
pub type Handler = Option<mpsc::UnboundedSender<Event>>;

// noop_handler discards any event.
pub fn noop_handler() -> Handler {
    None
}

// Event is sent to a transaction's Handler exactly once.
#[derive(Debug)]
pub struct Event {
    pub transaction_id: TransactionId,
    pub result: Result<Message>,
}

// AgentTransaction represents a transaction in progress: a deadline past
// which it is garbage-collected by collect(), and the handler to notify
// on a matching response or on timeout.
pub(crate) struct AgentTransaction {
    handler: Handler,
    deadline: Instant,
}

// AGENT_COLLECT_CAP is initial capacity for Agent::collect's to-remove
// buffer, sufficient to make the common case allocation-free.
const AGENT_COLLECT_CAP: usize = 100;

// Agent is a low-level abstraction over a transaction table. It matches
// incoming messages to the transaction that is waiting for them by
// TransactionID and runs deadline-based garbage collection. It has no
// opinion on retransmission; that is the Client's job.
#[derive(Default)]
pub struct Agent {
    transactions: HashMap<TransactionId, AgentTransaction>,
    closed: bool,
}

impl Agent {
    pub fn new() -> Self {
        Agent::default()
    }

    // start registers a transaction with provided id, deadline and handler.
    // Returns Error::AgentClosed or Error::TransactionExists.
    pub fn start(&mut self, id: TransactionId, deadline: Instant, handler: Handler) -> Result<()> {
        if self.closed {
            return Err(Error::AgentClosed);
        }
        if self.transactions.contains_key(&id) {
            return Err(Error::TransactionExists);
        }
        self.transactions
            .insert(id, AgentTransaction { handler, deadline });
        Ok(())
    }

    // reschedule updates the deadline of an in-progress transaction, used by
    // the Client between retransmissions.
    pub fn reschedule(&mut self, id: TransactionId, deadline: Instant) -> Result<()> {
        if self.closed {
            return Err(Error::AgentClosed);
        }
        match self.transactions.get_mut(&id) {
            Some(t) => {
                t.deadline = deadline;
                Ok(())
            }
            None => Err(Error::TransactionNotExists),
        }
    }

    // stop cancels a transaction, delivering Error::TransactionStopped to
    // its handler.
    pub fn stop(&mut self, id: TransactionId) -> Result<()> {
        self.stop_with_error(id, Error::TransactionStopped)
    }

    // stop_with_error removes a transaction and notifies its handler with
    // the given error. Returns Error::TransactionNotExists if id is unknown.
    pub fn stop_with_error(&mut self, id: TransactionId, error: Error) -> Result<()> {
        if self.closed {
            return Err(Error::AgentClosed);
        }
        match self.transactions.remove(&id) {
            Some(t) => {
                if let Some(handler) = t.handler {
                    let _ = handler.send(Event {
                        transaction_id: id,
                        result: Err(error),
                    });
                }
                Ok(())
            }
            None => Err(Error::TransactionNotExists),
        }
    }

    // process matches an incoming message to its transaction by
    // TransactionID and notifies the handler. Messages with an unknown
    // (already resolved, cancelled, or never registered) TransactionID are
    // dropped silently, per the STUN requirement to ignore late or
    // duplicate responses.
    pub fn process(&mut self, message: Message) -> Result<()> {
        if self.closed {
            return Err(Error::AgentClosed);
        }
        if let Some(t) = self.transactions.remove(&message.transaction_id) {
            if let Some(handler) = t.handler {
                let _ = handler.send(Event {
                    transaction_id: message.transaction_id,
                    result: Ok(message),
                });
            }
        }
        Ok(())
    }

    // close terminates all in-progress transactions with Error::AgentClosed
    // and renders the Agent unusable.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::AgentClosed);
        }
        for (id, t) in self.transactions.drain() {
            if let Some(handler) = t.handler {
                let _ = handler.send(Event {
                    transaction_id: id,
                    result: Err(Error::AgentClosed),
                });
            }
        }
        self.closed = true;
        Ok(())
    }

    // collect terminates all transactions whose deadline is before gc_time
    // with Error::Timeout. Returns Error::AgentClosed if already closed.
    pub fn collect(&mut self, gc_time: Instant) -> Result<()> {
        if self.closed {
            return Err(Error::AgentClosed);
        }

        let mut to_remove: Vec<TransactionId> = Vec::with_capacity(AGENT_COLLECT_CAP);
        for (id, t) in &self.transactions {
            if t.deadline < gc_time {
                to_remove.push(*id);
            }
        }
        for id in to_remove {
            if let Some(t) = self.transactions.remove(&id) {
                if let Some(handler) = t.handler {
                    let _ = handler.send(Event {
                        transaction_id: id,
                        result: Err(Error::Timeout),
                    });
                }
            }
        }
        Ok(())
    }
}
