//! End-to-end tests for the ingest pipeline over loopback UDP.
//!
//! Each test binds its own fixed port in the 46xxx range so they can run in
//! parallel. Senders retry inside a deadline: UDP delivery on loopback is
//! effectively reliable, but nothing here should depend on a single
//! datagram arriving.

use std::net::{Ipv4Addr, UdpSocket};
use std::time::{Duration, Instant};

use hasta_io::config::{ListenerConfig, TrackConfig};
use hasta_io::{AppConfig, Error, MappingConfig, Session, TrackMode, Vec3};

/// Build a single-listener config with snap smoothing (factor 1), so one
/// `advance_all` makes positions equal their targets.
fn snap_config(port: u16, mode: TrackMode, tracks: Vec<TrackConfig>) -> AppConfig {
    let mut config = AppConfig::dual_hand_defaults();
    config.smoothing.factor = 1.0;
    config.listeners = vec![ListenerConfig {
        port,
        mode,
        tracks: tracks.iter().map(|t| t.id.clone()).collect(),
    }];
    config.tracks = tracks;
    config
}

fn identity_track(id: &str) -> TrackConfig {
    TrackConfig {
        id: id.to_string(),
        mapping: MappingConfig::default(),
        initial: Vec3::ZERO,
        smoothing: None,
    }
}

fn sender() -> UdpSocket {
    UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind sender socket")
}

/// Keep sending `payload` to `port` and ticking the session until `done`
/// returns true. Panics after five seconds.
fn send_until(
    sender: &UdpSocket,
    port: u16,
    payload: &[u8],
    session: &Session,
    done: impl Fn() -> bool,
) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        sender
            .send_to(payload, (Ipv4Addr::LOCALHOST, port))
            .expect("send datagram");
        std::thread::sleep(Duration::from_millis(10));
        session.advance_all();
        if done() {
            return;
        }
    }
    panic!("timed out waiting for {:?} to take effect", payload);
}

#[test]
fn test_single_point_end_to_end() {
    let port = 46011;
    let track = TrackConfig {
        id: "wand".to_string(),
        mapping: MappingConfig {
            scale: 2.0,
            offset: Vec3::new(5.0, 0.0, 0.0),
            ..Default::default()
        },
        initial: Vec3::ZERO,
        smoothing: None,
    };
    let session = Session::new(&snap_config(port, TrackMode::Single, vec![track])).unwrap();

    let tx = sender();
    send_until(&tx, port, b"1,0,0", &session, || {
        session.position_of("wand") == Some(Vec3::new(7.0, 0.0, 0.0))
    });
}

#[test]
fn test_dual_routing_is_positional() {
    let port = 46012;
    let tracks = vec![identity_track("left"), identity_track("right")];
    let session = Session::new(&snap_config(port, TrackMode::Dual, tracks)).unwrap();

    // First segment always feeds the first configured track, never the
    // reverse
    let tx = sender();
    send_until(&tx, port, b"1,1,1|2,2,2", &session, || {
        session.position_of("left") == Some(Vec3::new(1.0, 1.0, 1.0))
            && session.position_of("right") == Some(Vec3::new(2.0, 2.0, 2.0))
    });
}

#[test]
fn test_malformed_datagram_is_absorbed() {
    let port = 46013;
    let session =
        Session::new(&snap_config(port, TrackMode::Single, vec![identity_track("wand")])).unwrap();
    let stats = session.stats().remove(0).1;

    let tx = sender();

    send_until(&tx, port, b"1,0,0", &session, || {
        session.position_of("wand") == Some(Vec3::new(1.0, 0.0, 0.0))
    });

    // Garbage in between: counted, dropped, loop keeps running
    send_until(&tx, port, b"not,a,number", &session, || {
        stats.decode_errors() >= 1
    });
    session.advance_all();
    assert_eq!(session.position_of("wand"), Some(Vec3::new(1.0, 0.0, 0.0)));

    // Subsequent well-formed datagrams still apply
    send_until(&tx, port, b"3,0,0", &session, || {
        session.position_of("wand") == Some(Vec3::new(3.0, 0.0, 0.0))
    });

    assert!(session.is_healthy());
    assert!(stats.datagrams() >= 3);
}

#[test]
fn test_two_listeners_are_independent() {
    let port_a = 46014;
    let port_b = 46015;

    let mut config = snap_config(port_a, TrackMode::Single, vec![identity_track("left")]);
    config.tracks.push(identity_track("right"));
    config.listeners.push(ListenerConfig {
        port: port_b,
        mode: TrackMode::Single,
        tracks: vec!["right".to_string()],
    });
    let session = Session::new(&config).unwrap();

    let tx = sender();
    send_until(&tx, port_a, b"1,2,3", &session, || {
        session.position_of("left") == Some(Vec3::new(1.0, 2.0, 3.0))
    });
    send_until(&tx, port_b, b"4,5,6", &session, || {
        session.position_of("right") == Some(Vec3::new(4.0, 5.0, 6.0))
    });

    // Each port only feeds its own track
    assert_eq!(session.position_of("left"), Some(Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_initial_placement_holds_until_first_packet() {
    let port = 46016;
    let initial = Vec3::new(-0.5, 1.0, 0.0);
    let mut track = identity_track("left");
    track.initial = initial;
    let mut config = snap_config(port, TrackMode::Single, vec![track]);
    config.smoothing.factor = 0.5;

    let session = Session::new(&config).unwrap();

    // No datagram yet: ticking must not move the point
    for _ in 0..5 {
        session.advance_all();
    }
    assert_eq!(session.position_of("left"), Some(initial));
}

#[test]
fn test_shutdown_is_idempotent_and_releases_ports() {
    let port = 46017;
    let mut session =
        Session::new(&snap_config(port, TrackMode::Single, vec![identity_track("left")])).unwrap();

    session.shutdown();
    session.shutdown();
    assert!(!session.is_healthy());

    // The port must be immediately rebindable after teardown
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port)).expect("rebind released port");
}

#[test]
fn test_bind_conflict_fails_construction() {
    let port = 46018;
    let holder = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port)).unwrap();

    let result = Session::new(&snap_config(port, TrackMode::Single, vec![identity_track("left")]));
    match result {
        Err(Error::Bind { port: p, .. }) => assert_eq!(p, port),
        Err(other) => panic!("expected bind error, got {}", other),
        Ok(_) => panic!("expected bind error, got a session"),
    }
    drop(holder);
}

#[test]
fn test_unknown_track_id_reads_none() {
    let port = 46019;
    let session =
        Session::new(&snap_config(port, TrackMode::Single, vec![identity_track("left")])).unwrap();
    assert_eq!(session.position_of("nope"), None);
}
