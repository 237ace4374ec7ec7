mod common;

use common::{
    answer, bind_monitor, closed_port_config, event, patterned_memory, read_request,
    sample_checkpoints, spawn_monitor,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use vicemon::command::{Command, Memspace, MonitorEvent};
use vicemon::frame::{FrameDecodeError, MalformedFrame};
use vicemon::{MonitorCallerInterface, MonitorError};
use vicemon_tokio_client::{Session, SessionState};

#[tokio::test]
async fn connect_to_closed_port_is_refused() {
    let result = Session::connect(closed_port_config().await).await;

    assert!(matches!(result, Err(MonitorError::ConnectionRefused(_))));
}

#[tokio::test]
async fn session_round_trips_requests() {
    let (listener, config) = bind_monitor().await;
    let _monitor = spawn_monitor(listener);

    let session = Session::connect(config).await.unwrap();
    assert_eq!(session.state(), SessionState::Connected);

    session.ping().await.unwrap();

    let info = session.get_info().await.unwrap();
    assert_eq!((info.major, info.minor, info.version.as_str()), (3, 9, "3.9"));

    let data = session
        .read_memory(0x0400, 0x0407, Memspace::MainMemory, 0, false)
        .await
        .unwrap();
    assert_eq!(data, vec![0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);

    session
        .write_memory(0x0400, vec![0xde, 0xad], Memspace::MainMemory, 0)
        .await
        .unwrap();
    let data = session
        .read_memory(0x03ff, 0x0402, Memspace::MainMemory, 0, false)
        .await
        .unwrap();
    assert_eq!(data, vec![0xff, 0xde, 0xad, 0x02]);
}

#[tokio::test]
async fn full_address_space_read_arrives_intact() {
    let (listener, config) = bind_monitor().await;
    let _monitor = spawn_monitor(listener);

    let session = Session::connect(config).await.unwrap();
    let data = session
        .read_memory(0x0000, 0xffff, Memspace::MainMemory, 0, false)
        .await
        .unwrap();

    assert_eq!(data, patterned_memory());
}

#[tokio::test]
async fn close_unblocks_a_pending_receive() {
    let (listener, config) = bind_monitor().await;
    // Accept but never answer.
    let _monitor = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        sleep(Duration::from_secs(10)).await;
        drop(stream);
    });

    let session = Arc::new(Session::connect(config).await.unwrap());
    let closer = session.closer();

    let receiver = {
        let session = session.clone();
        tokio::spawn(async move { session.receive_frame().await })
    };

    sleep(Duration::from_millis(50)).await;
    closer.close();

    let result = tokio::time::timeout(Duration::from_secs(1), receiver)
        .await
        .expect("receive did not unblock")
        .unwrap();

    assert_eq!(result, Err(MonitorError::ConnectionClosed));
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.ping().await, Err(MonitorError::ConnectionClosed));
}

#[tokio::test]
async fn reconnect_leaves_the_closed_state() {
    let (listener, config) = bind_monitor().await;
    let _monitor = spawn_monitor(listener);

    let session = Session::connect(config).await.unwrap();
    session.close().await;
    assert_eq!(session.ping().await, Err(MonitorError::ConnectionClosed));

    session.reconnect().await.unwrap();
    assert_eq!(session.state(), SessionState::Connected);
    session.ping().await.unwrap();
}

#[tokio::test]
async fn bad_start_marker_closes_the_session() {
    let (listener, config) = bind_monitor().await;
    let _monitor = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await.unwrap();
        let mut frame = common::reply(&request, &[]);
        frame[0] = 0x07;
        stream.write_all(&frame).await.unwrap();
        sleep(Duration::from_secs(1)).await;
    });

    let session = Session::connect(config).await.unwrap();

    assert_eq!(
        session.ping().await,
        Err(MonitorError::Frame(FrameDecodeError::MalformedFrame(
            MalformedFrame::BadStartMarker(0x07)
        )))
    );
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.ping().await, Err(MonitorError::ConnectionClosed));
}

#[tokio::test]
async fn events_read_during_a_call_are_queued() {
    let (listener, config) = bind_monitor().await;
    let _monitor = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut memory = patterned_memory();
        let request = read_request(&mut stream).await.unwrap();

        stream.write_all(&event(0x62, 0xc000)).await.unwrap();
        stream.write_all(&event(0x63, 0xc003)).await.unwrap();
        stream.write_all(&answer(&request, &mut memory)).await.unwrap();
        sleep(Duration::from_secs(1)).await;
    });

    let session = Session::connect(config).await.unwrap();
    session.ping().await.unwrap();

    assert_eq!(
        session.drain_events(),
        vec![
            MonitorEvent::Stopped { pc: 0xc000 },
            MonitorEvent::Resumed { pc: 0xc003 }
        ]
    );
    assert!(session.drain_events().is_empty());
}

#[tokio::test]
async fn timed_out_request_does_not_poison_the_next_one() {
    let (listener, config) = bind_monitor().await;
    let config = config.with_request_timeout(Duration::from_millis(100));

    let _monitor = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut memory = patterned_memory();

        let first = read_request(&mut stream).await.unwrap();
        sleep(Duration::from_millis(300)).await;
        stream.write_all(&answer(&first, &mut memory)).await.unwrap();

        let second = read_request(&mut stream).await.unwrap();
        stream.write_all(&answer(&second, &mut memory)).await.unwrap();
        sleep(Duration::from_secs(1)).await;
    });

    let session = Session::connect(config).await.unwrap();

    assert_eq!(
        session.ping().await,
        Err(MonitorError::Timeout(Duration::from_millis(100)))
    );
    assert_eq!(session.state(), SessionState::Connected);

    // Let the late answer land in the socket before the next request.
    sleep(Duration::from_millis(250)).await;

    // The late answer to the first ping arrives first and is discarded.
    session.call_empty(Command::Ping).await.unwrap();
}

#[tokio::test]
async fn checkpoint_list_spans_several_frames() {
    let (listener, config) = bind_monitor().await;
    let _monitor = spawn_monitor(listener);

    let session = Session::connect(config).await.unwrap();

    assert_eq!(session.checkpoint_list().await.unwrap(), sample_checkpoints());
    // The stream is still aligned on the next request.
    session.ping().await.unwrap();
}
