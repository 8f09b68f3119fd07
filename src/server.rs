
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::attributes::*;
use crate::error::*;
use crate::error_code::*;
use crate::fingerprint::FINGERPRINT;
use crate::message::*;
use crate::transport::Transport;
use crate::uattrs::UnknownAttributes;
use crate::xoraddr::XorMappedAddress;

// HandlerFn processes a single request message and returns the response to
// send back, if any.
pub type HandlerFn = Box<dyn Fn(&Message, SocketAddr) -> Result<Option<Message>> + Send + Sync>;

// Server is a minimal STUN dispatcher: it reads datagrams off a Transport,
// recognizes STUN messages, decodes them and dispatches by Method to a
// registered HandlerFn. Unregistered methods draw a 400 (Bad Request) error
// response; unknown comprehension-required attributes draw a 420 (Unknown
// Attribute) error response carrying UNKNOWN-ATTRIBUTES.
pub struct Server {
    transport: Arc<dyn Transport>,
    handlers: HashMap<Method, HandlerFn>,
    close_tx: Option<oneshot::Sender<()>>,
}

fn default_binding_handler(m: &Message, src: SocketAddr) -> Result<Option<Message>> {
    let mut resp = Message::new();
    resp.transaction_id = m.transaction_id;
    resp.set_type(BINDING_SUCCESS);

    let xor_addr = XorMappedAddress {
        ip: src.ip(),
        port: src.port(),
    };
    xor_addr.add_to(&mut resp)?;
    FINGERPRINT.add_to(&mut resp)?;

    Ok(Some(resp))
}

impl Server {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let mut handlers: HashMap<Method, HandlerFn> = HashMap::new();
        handlers.insert(METHOD_BINDING, Box::new(default_binding_handler));

        Server {
            transport,
            handlers,
            close_tx: None,
        }
    }

    // on registers handler for method, replacing the Server's default
    // handler for that method (if any).
    pub fn on(&mut self, method: Method, handler: HandlerFn) {
        self.handlers.insert(method, handler);
    }

    // serve runs the read-dispatch-respond loop until close() is called.
    // src is the peer address to report in responses (e.g. via
    // XOR-MAPPED-ADDRESS); callers whose Transport serves a single
    // connected peer can pass that peer's address.
    pub async fn serve(&mut self, src: SocketAddr) -> Result<()> {
        let (close_tx, mut close_rx) = oneshot::channel();
        self.close_tx = Some(close_tx);

        let mut buf = vec![0u8; 1500];
        loop {
            tokio::select! {
                _ = &mut close_rx => return Ok(()),
                res = self.transport.recv(&mut buf) => {
                    let n = res?;
                    if let Some(resp) = self.handle_datagram(&buf[..n], src)? {
                        self.transport.send(&resp.raw).await?;
                    }
                }
            }
        }
    }

    // handle_datagram decodes a single datagram and dispatches it.
    // Non-STUN datagrams are ignored.
    fn handle_datagram(&self, b: &[u8], src: SocketAddr) -> Result<Option<Message>> {
        if !is_message(b) {
            return Ok(None);
        }

        let mut m = Message::new();
        m.raw = b.to_vec();
        m.decode()?;

        self.dispatch(&m, src)
    }

    // dispatch runs m through its registered handler, or builds a 400 / 420
    // error response if no handler is registered or m carries an
    // unrecognized comprehension-required attribute.
    pub fn dispatch(&self, m: &Message, src: SocketAddr) -> Result<Option<Message>> {
        if m.typ.class != CLASS_REQUEST {
            return Ok(None);
        }

        if let Some(unknown) = self.unknown_comprehension_required(m) {
            return Ok(Some(self.unknown_attribute_response(m, unknown)?));
        }

        match self.handlers.get(&m.typ.method) {
            Some(handler) => handler(m, src),
            None => Ok(Some(self.bad_request_response(m)?)),
        }
    }

    fn unknown_comprehension_required(&self, m: &Message) -> Option<Vec<AttrType>> {
        let unknown: Vec<AttrType> = m
            .attributes
            .iter()
            .map(|a| a.typ)
            .filter(|t| t.required() && !is_recognized_attribute(*t))
            .collect();

        if unknown.is_empty() {
            None
        } else {
            Some(unknown)
        }
    }

    fn unknown_attribute_response(&self, m: &Message, unknown: Vec<AttrType>) -> Result<Message> {
        let mut resp = Message::new();
        resp.transaction_id = m.transaction_id;
        resp.set_type(MessageType::new(m.typ.method, CLASS_ERROR_RESPONSE));
        CODE_UNKNOWN_ATTRIBUTE.add_to(&mut resp)?;
        UnknownAttributes(unknown).add_to(&mut resp)?;
        Ok(resp)
    }

    fn bad_request_response(&self, m: &Message) -> Result<Message> {
        let mut resp = Message::new();
        resp.transaction_id = m.transaction_id;
        resp.set_type(MessageType::new(m.typ.method, CLASS_ERROR_RESPONSE));
        CODE_BAD_REQUEST.add_to(&mut resp)?;
        Ok(resp)
    }

    // close stops a running serve() loop.
    pub fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }
}

// RECOGNIZED_ATTRIBUTES lists the comprehension-required attribute types this
// dispatcher understands (directly, or because a handler is expected to
// process them itself) even though it has no per-attribute Setter/Getter
// wired into the Binding handler for all of them. Anything comprehension-
// required outside this set draws a 420 response instead of reaching a
// handler.
const RECOGNIZED_ATTRIBUTES: &[AttrType] = &[
    ATTR_MAPPED_ADDRESS,
    ATTR_USERNAME,
    ATTR_MESSAGE_INTEGRITY,
    ATTR_ERROR_CODE,
    ATTR_UNKNOWN_ATTRIBUTES,
    ATTR_REALM,
    ATTR_NONCE,
    ATTR_XORMAPPED_ADDRESS,
    ATTR_PRIORITY,
    ATTR_USE_CANDIDATE,
];

fn is_recognized_attribute(t: AttrType) -> bool {
    RECOGNIZED_ATTRIBUTES.contains(&t)
}
