use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::UdpSocket;

use stun::client::{Client, RetransmissionPolicy};
use stun::message::*;
use stun::server::Server;
use stun::uri::Uri;
use stun::xoraddr::XorMappedAddress;
use stun::Error;

const DEFAULT_PORT: u16 = 3478;

/// Sends a Binding request to a STUN server, or runs one.
#[derive(Debug, Parser)]
#[command(name = "stun", version)]
struct Args {
    /// stun: or stuns: URI of the server to query. Runs a Binding server on
    /// --port instead if omitted.
    uri: Option<String>,

    /// Port to bind when running as a server, or to query when the URI
    /// carries none.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Total time to wait for a response before giving up.
    #[arg(long, default_value_t = 500)]
    rto_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();

    match &args.uri {
        Some(uri) => run_client(uri, args.port, args.rto_ms).await,
        None => run_server(args.port).await,
    }
}

async fn run_client(uri: &str, default_port: u16, rto_ms: u64) -> Result<(), Error> {
    let parsed = Uri::parse_uri(uri)?;
    let port = parsed.port.unwrap_or(default_port);
    let addr = (parsed.host.as_str(), port)
        .to_socket_addrs()
        .map_err(Error::from)?
        .next()
        .ok_or(Error::Host)?;

    log::info!("binding request to {addr}");

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(addr).await?;
    let client = Client::new(
        Arc::new(socket),
        RetransmissionPolicy {
            rto: Duration::from_millis(rto_ms),
            ..RetransmissionPolicy::default()
        },
    );

    let mut request = Message::new();
    request.set_type(BINDING_REQUEST);
    request.new_transaction_id()?;
    request.encode();

    let response = client.call(&mut request, None).await?;
    if response.typ.class == CLASS_ERROR_RESPONSE {
        log::error!("server returned an error response");
        return Ok(());
    }

    let mut xor_addr = XorMappedAddress::default();
    xor_addr.get_from(&response)?;
    println!("{}:{}", xor_addr.ip, xor_addr.port);

    client.close().await?;
    Ok(())
}

async fn run_server(port: u16) -> Result<(), Error> {
    let addr = format!("0.0.0.0:{port}");
    let socket = Arc::new(UdpSocket::bind(&addr).await?);
    log::info!("listening on {addr}");

    let mut server = Server::new(socket.clone());

    // A bare UDP socket with no connect() sees datagrams from any peer, but
    // our Transport abstraction assumes a single logical peer per instance;
    // run one receive/dispatch/respond cycle by hand per datagram here
    // instead of delegating to Server::serve, so each response's
    // XOR-MAPPED-ADDRESS reflects the actual sender.
    let mut buf = vec![0u8; 1500];
    loop {
        let (n, src) = socket.recv_from(&mut buf).await?;
        if !is_message(&buf[..n]) {
            continue;
        }

        let mut m = Message::new();
        m.raw = buf[..n].to_vec();
        if m.decode().is_err() {
            continue;
        }

        match server.dispatch(&m, src) {
            Ok(Some(resp)) => {
                if let Err(err) = socket.send_to(&resp.raw, src).await {
                    log::warn!("send to {src} failed: {err}");
                }
            }
            Ok(None) => {}
            Err(err) => log::warn!("dispatch from {src} failed: {err}"),
        }
    }
}
