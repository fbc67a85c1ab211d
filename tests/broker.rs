//! Dispatcher tests: subscriptions, fan-out, disconnect cleanup.

mod common;

use std::sync::Arc;
use std::thread;

use common::{disconnect_msg, publish_msg, subscribe_msg, Payload, TestConnection};
use hermes_mqtt::protocol::QoS;
use hermes_mqtt::{Connection, Encoder, MqttStream, Server};
use rstest::{fixture, rstest};

#[fixture]
fn server() -> Server<TestConnection> {
    Server::new()
}

#[rstest]
fn publish_reaches_only_subscribers(server: Server<TestConnection>) {
    let subscriber = TestConnection::new();
    let other = TestConnection::new();
    let publisher = TestConnection::new();

    server.handle_message(&subscriber, &subscribe_msg("top", 33)).unwrap();
    server.handle_message(&other, &subscribe_msg("bottom", 34)).unwrap();
    server.handle_message(&publisher, &publish_msg("top", b"payload")).unwrap();

    assert_eq!(subscriber.payloads(), vec![b"payload".to_vec()]);
    assert!(other.payloads().is_empty());
    assert!(publisher.payloads().is_empty());
}

#[rstest]
fn publish_without_subscribers_is_noop(server: Server<TestConnection>) {
    let publisher = TestConnection::new();

    assert!(server
        .handle_message(&publisher, &publish_msg("nobody/home", b"x"))
        .is_ok());
    assert_eq!(server.publish("nobody/home", b"x"), 0);
    assert!(publisher.payloads().is_empty());
}

#[rstest]
fn disconnect_removes_subscriptions(server: Server<TestConnection>) {
    let connection = TestConnection::connected();
    let publisher = TestConnection::new();

    server.handle_message(&connection, &subscribe_msg("a", 1)).unwrap();
    server.handle_message(&connection, &subscribe_msg("b", 2)).unwrap();
    server.handle_message(&connection, &disconnect_msg()).unwrap();

    assert!(!connection.is_connected());
    assert!(server.topics().is_empty());

    server.handle_message(&publisher, &publish_msg("a", b"late")).unwrap();
    assert!(connection.payloads().is_empty());
}

#[rstest]
fn resubscribe_replaces_message_id(server: Server<TestConnection>) {
    let connection = TestConnection::new();

    server.handle_message(&connection, &subscribe_msg("top", 33)).unwrap();
    server.handle_message(&connection, &subscribe_msg("top", 44)).unwrap();

    assert_eq!(server.subscriber_count("top"), 1);
    assert_eq!(
        server.subscription("top", connection.id()),
        Some((44, QoS::AtMostOnce))
    );

    // Tidak ada duplikasi delivery
    server.publish("top", b"once");
    assert_eq!(connection.payloads(), vec![b"once".to_vec()]);
}

#[rstest]
fn topics_match_exactly(server: Server<TestConnection>) {
    let connection = TestConnection::new();
    server.handle_message(&connection, &subscribe_msg("sport/#", 1)).unwrap();

    // Wildcard tidak diinterpretasikan
    assert_eq!(server.publish("sport/tennis", b"x"), 0);
    assert_eq!(server.publish("sport/#", b"y"), 1);
    assert_eq!(connection.payloads(), vec![b"y".to_vec()]);
}

#[rstest]
fn delivery_order_per_subscriber(server: Server<TestConnection>) {
    let connection = TestConnection::new();
    server.handle_message(&connection, &subscribe_msg("seq", 1)).unwrap();

    for i in 0..10u8 {
        server.publish("seq", &[i]);
    }

    let expected: Vec<Payload> = (0..10u8).map(|i| vec![i]).collect();
    assert_eq!(connection.payloads(), expected);
}

#[rstest]
fn dropped_connection_is_pruned(server: Server<TestConnection>) {
    let kept = TestConnection::new();
    let dropped = TestConnection::new();

    server.handle_message(&kept, &subscribe_msg("t", 1)).unwrap();
    server.handle_message(&dropped, &subscribe_msg("t", 1)).unwrap();
    drop(dropped);

    assert_eq!(server.subscriber_count("t"), 1);
    assert_eq!(server.publish("t", b"z"), 1);
    assert_eq!(server.subscriber_count("t"), 1);
}

#[rstest]
fn client_session_over_stream(server: Server<TestConnection>) {
    let connection = TestConnection::new();
    let mut stream = MqttStream::new(256);
    let mut encoder = Encoder::new(256);

    encoder.encode_connect("sensor-1", 30).unwrap();
    encoder
        .encode_subscribe(9, &[("a", QoS::AtMostOnce), ("b", QoS::AtLeastOnce)])
        .unwrap();
    encoder.encode_publish("b", QoS::AtLeastOnce, 10, b"hello").unwrap();
    encoder.encode_unsubscribe(11, &["b"]).unwrap();
    encoder.encode_publish("b", QoS::AtMostOnce, 0, b"ignored").unwrap();
    encoder.encode_pingreq().unwrap();

    stream.feed(encoder.as_bytes(), &server, &connection).unwrap();

    assert!(connection.is_connected());
    assert_eq!(connection.payloads(), vec![b"hello".to_vec()]);
    assert_eq!(server.subscription("b", connection.id()), None);
    assert_eq!(
        server.subscription("a", connection.id()),
        Some((9, QoS::AtMostOnce))
    );
    assert_eq!(
        connection.sent(),
        vec![
            vec![0x20, 2, 0, 0],
            vec![0x90, 4, 0x00, 9, 0, 0],
            vec![0xb0, 2, 0x00, 11],
            vec![0xd0, 0],
        ]
    );
}

#[rstest]
fn concurrent_connections_share_table(server: Server<TestConnection>) {
    let subscriber = TestConnection::new();
    server.handle_message(&subscriber, &subscribe_msg("fan/in", 1)).unwrap();

    let handles: Vec<_> = (0..4u8)
        .map(|worker| {
            let server = server.clone();
            thread::spawn(move || {
                let connection = TestConnection::new();
                let mut stream = MqttStream::new(64);
                let bytes: Vec<u8> = (0..25u8)
                    .flat_map(|i| publish_msg("fan/in", &[worker, i]))
                    .collect();

                for chunk in bytes.chunks(7) {
                    stream.feed(chunk, &server, &connection).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let payloads = subscriber.payloads();
    assert_eq!(payloads.len(), 100);

    // Urutan per publisher tetap terjaga
    for worker in 0..4u8 {
        let seq: Vec<u8> = payloads
            .iter()
            .filter(|p| p[0] == worker)
            .map(|p| p[1])
            .collect();
        assert_eq!(seq, (0..25u8).collect::<Vec<_>>());
    }
}

#[test]
fn server_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Server<TestConnection>>();
    let _ = Arc::new(Server::<TestConnection>::new());
}
