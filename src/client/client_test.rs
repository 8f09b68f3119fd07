use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;

use super::*;
use crate::message::*;

async fn loopback_pair() -> (Arc<UdpSocket>, Arc<UdpSocket>) {
    let a = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let b = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    a.connect(b.local_addr().unwrap()).await.unwrap();
    b.connect(a.local_addr().unwrap()).await.unwrap();
    (Arc::new(a), Arc::new(b))
}

#[tokio::test]
async fn test_client_call_roundtrip() -> Result<()> {
    let (client_sock, server_sock) = loopback_pair().await;
    let client = Client::new(client_sock, RetransmissionPolicy::default());

    tokio::spawn(async move {
        let mut buf = vec![0u8; 1500];
        let n = server_sock.recv(&mut buf).await.unwrap();
        let mut req = Message::new();
        req.raw = buf[..n].to_vec();
        req.decode().unwrap();

        let mut resp = Message::new();
        resp.transaction_id = req.transaction_id;
        resp.set_type(BINDING_SUCCESS);
        resp.encode();
        server_sock.send(&resp.raw).await.unwrap();
    });

    let mut request = Message::new();
    request.set_type(BINDING_REQUEST);
    request.encode();

    let response = client.call(&mut request, None).await?;
    assert_eq!(response.typ, BINDING_SUCCESS);
    assert_eq!(response.transaction_id, request.transaction_id);

    Ok(())
}

#[tokio::test]
async fn test_client_call_timeout() -> Result<()> {
    let (client_sock, _server_sock) = loopback_pair().await;
    let client = Client::new(
        client_sock,
        RetransmissionPolicy {
            rto: Duration::from_millis(5),
            rc: 2,
            rm: 2,
        },
    );

    let mut request = Message::new();
    request.set_type(BINDING_REQUEST);
    request.encode();

    let result = client.call(&mut request, None).await;
    assert!(matches!(result, Err(Error::Timeout)), "expected Timeout, got {result:?}");

    Ok(())
}

#[tokio::test]
async fn test_client_call_cancelled() -> Result<()> {
    let (client_sock, _server_sock) = loopback_pair().await;
    let client = Client::new(client_sock, RetransmissionPolicy::default());

    let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel();
    let mut request = Message::new();
    request.set_type(BINDING_REQUEST);
    request.encode();

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call(&mut request, Some(cancel_rx)).await }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let _ = cancel_tx.send(());

    let result = call.await.unwrap();
    assert!(matches!(result, Err(Error::Cancelled)), "expected Cancelled, got {result:?}");

    Ok(())
}

#[tokio::test]
async fn test_client_close() -> Result<()> {
    let (client_sock, _server_sock) = loopback_pair().await;
    let client = Client::new(client_sock, RetransmissionPolicy::default());
    client.close().await?;
    assert_eq!(client.close().await, Err(Error::ClientClosed));
    Ok(())
}
