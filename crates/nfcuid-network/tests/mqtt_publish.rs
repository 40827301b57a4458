//! Integration tests for MqttPublisher
//!
//! A minimal broker on a loopback listener answers CONNECT with a CONNACK
//! and then either reads the next packet or drops the session.

use nfcuid_core::MqttConfig;
use nfcuid_network::{MqttConnection, MqttError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const CONNACK_ACCEPTED: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

/// Read one MQTT control packet: fixed header byte and body.
async fn read_packet(stream: &mut TcpStream) -> (u8, Vec<u8>) {
    let header = stream.read_u8().await.unwrap();

    let mut len = 0usize;
    let mut shift = 0;
    loop {
        let byte = stream.read_u8().await.unwrap();
        len |= usize::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }

    let mut body = vec![0; len];
    stream.read_exact(&mut body).await.unwrap();
    (header, body)
}

/// Accept one client, acknowledge its CONNECT and hand the stream to `then`.
async fn spawn_broker<F, Fut, T>(then: F) -> (SocketAddr, JoinHandle<T>)
where
    F: FnOnce(TcpListener, TcpStream) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = T> + Send,
    T: Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let broker = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let (header, _) = read_packet(&mut stream).await;
        assert_eq!(header >> 4, 1, "expected CONNECT");
        stream.write_all(&CONNACK_ACCEPTED).await.unwrap();
        then(listener, stream).await
    });

    (addr, broker)
}

fn config(addr: SocketAddr) -> MqttConfig {
    let mut config = MqttConfig::new(addr.ip().to_string());
    config.port = addr.port();
    config
}

#[tokio::test]
async fn test_publish_reaches_broker() {
    let (addr, broker) = spawn_broker(|_listener, mut stream| async move {
        read_packet(&mut stream).await
    })
    .await;

    let connection = MqttConnection::connect(&config(addr), None).await.unwrap();
    let publisher = connection.publisher("nfcuid/out");
    publisher.publish("04AB\n").unwrap();

    let (header, body) = tokio::time::timeout(Duration::from_secs(2), broker)
        .await
        .expect("broker should receive the publish")
        .unwrap();

    // QoS 0, not retained
    assert_eq!(header, 0x30);
    let topic_len = usize::from(u16::from_be_bytes([body[0], body[1]]));
    assert_eq!(&body[2..2 + topic_len], b"nfcuid/out");
    assert_eq!(&body[2 + topic_len..], b"04AB\n");

    connection.disconnect(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_publish_never_blocks_when_broker_gone() {
    let (addr, broker) = spawn_broker(|listener, stream| async move {
        drop(stream);
        drop(listener);
    })
    .await;

    let connection = MqttConnection::connect(&config(addr), None).await.unwrap();
    broker.await.unwrap();
    // Let the event task see the hang-up and fall into its reconnect delay.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let publisher = connection.publisher("nfcuid/out");
    let mut rejected = 0;
    for i in 0..100 {
        match publisher.publish(&format!("{i:02X}")) {
            Ok(()) => {}
            Err(MqttError::Publish { topic, .. }) => {
                assert_eq!(topic, "nfcuid/out");
                rejected += 1;
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert!(rejected > 0, "a full request queue must be reported");

    tokio::time::timeout(
        Duration::from_secs(2),
        connection.disconnect(Duration::from_millis(100)),
    )
    .await
    .expect("disconnect should honour its grace period");
}
