//! End-to-end dispatch tests: real byte streams through a memory transport,
//! a loaded family, and the manager's per-frame pump.

use riftmere_core::{BeingId, ChatKind, PlayerStat};
use riftmere_net::transport::MemoryTransport;
use riftmere_net::{NetConfig, NetworkManager, ServerFamily, ServerFeatures, Transport};
use riftmere_testkit::{init_test_logging, NetEvent, RecordingWorld};

fn manager_on(family: ServerFamily) -> (NetworkManager, MemoryTransport) {
    init_test_logging();
    let mut manager = NetworkManager::new(NetConfig::default());
    manager.load(family);
    let (local, peer) = MemoryTransport::pair();
    manager.connect(Box::new(local)).unwrap();
    manager.game_started();
    (manager, peer)
}

/// Little-endian fixed frame: id then payload.
fn le_fixed(id: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = id.to_le_bytes().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

/// Little-endian variable frame: id, total length, payload.
fn le_variable(id: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = id.to_le_bytes().to_vec();
    bytes.extend_from_slice(&((4 + payload.len()) as u16).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// Big-endian length-first frame.
fn be_frame(id: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = ((4 + payload.len()) as u16).to_be_bytes().to_vec();
    bytes.extend_from_slice(&id.to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn vaelora_stream_dispatches_in_order_despite_ragged_delivery() {
    use riftmere_net::vael::protocol::*;

    let (mut manager, mut peer) = manager_on(ServerFamily::Vaelora);

    // Stat update, own chat line, then a warp.
    let mut stream = Vec::new();
    let mut stat = 5u16.to_le_bytes().to_vec();
    stat.extend_from_slice(&150u32.to_le_bytes());
    stream.extend_from_slice(&le_fixed(SMSG_PLAYER_STAT_1, &stat));
    stream.extend_from_slice(&le_variable(SMSG_PLAYER_CHAT, b"hello world"));
    let mut warp = Vec::new();
    let mut map = b"hollow.gat".to_vec();
    map.resize(16, 0);
    warp.extend_from_slice(&map);
    warp.extend_from_slice(&42u16.to_le_bytes());
    warp.extend_from_slice(&17u16.to_le_bytes());
    stream.extend_from_slice(&le_fixed(SMSG_PLAYER_WARP, &warp));

    // Deliver in awkward chunks; nothing dispatches until a frame is whole.
    let mut world = RecordingWorld::new();
    for chunk in stream.chunks(3) {
        peer.try_write(chunk).unwrap();
        let mut ctx = world.context();
        manager.flush_network(&mut ctx).unwrap();
    }

    assert_eq!(
        world.events(),
        [
            NetEvent::Stat {
                stat: PlayerStat::Hp,
                value: 150,
            },
            NetEvent::Chat {
                kind: ChatKind::Public,
                sender: None,
                text: "hello world".into(),
            },
            NetEvent::Warp {
                map: "hollow.gat".into(),
                x: 42,
                y: 17,
            },
        ]
    );
}

#[test]
fn vaelora_npc_conversation_drives_ui_and_replies() {
    use riftmere_net::vael::protocol::*;

    let (mut manager, mut peer) = manager_on(ServerFamily::Vaelora);
    let npc = BeingId(900);

    // A reply before any dialog is refused client-side.
    assert!(!manager.npc_choose(npc, 1));

    let mut text = npc.0.to_le_bytes().to_vec();
    text.extend_from_slice(b"Choose a door.");
    peer.try_write(&le_variable(SMSG_NPC_MESSAGE, &text)).unwrap();
    let mut menu = npc.0.to_le_bytes().to_vec();
    menu.extend_from_slice(b"left:right:");
    peer.try_write(&le_variable(SMSG_NPC_CHOICE, &menu)).unwrap();

    let mut world = RecordingWorld::new();
    let mut ctx = world.context();
    manager.flush_network(&mut ctx).unwrap();
    assert_eq!(
        world.events(),
        [
            NetEvent::NpcText {
                npc,
                text: "Choose a door.".into(),
            },
            NetEvent::NpcChoices {
                npc,
                choices: vec!["left".into(), "right".into()],
            },
        ]
    );

    // Now the choice goes out, exactly once.
    assert!(manager.npc_choose(npc, 2));
    assert!(!manager.npc_choose(npc, 2));

    let mut ctx = world.context();
    manager.flush_network(&mut ctx).unwrap();
    let mut buf = [0u8; 64];
    let mut sent = Vec::new();
    while let Ok(riftmere_net::ReadOutcome::Data(n)) = peer.try_read(&mut buf) {
        sent.extend_from_slice(&buf[..n]);
    }
    assert_eq!(u16::from_le_bytes([sent[0], sent[1]]), CMSG_NPC_CHOICE_RESPONSE);
    assert_eq!(u32::from_le_bytes([sent[2], sent[3], sent[4], sent[5]]), npc.0);
    assert_eq!(sent[6], 2);
}

#[test]
fn vaelheim_spawn_layout_follows_negotiated_version() {
    use riftmere_net::vael::protocol::SMSG_BEING_VISIBLE;
    use riftmere_net::vaelheim::protocol::{EPOCH_WIDE_SPAWN, SPAWN_LEN, SPAWN_LEN_WIDE};

    for (version, total) in [(EPOCH_WIDE_SPAWN - 1, SPAWN_LEN), (EPOCH_WIDE_SPAWN, SPAWN_LEN_WIDE)] {
        let (mut manager, mut peer) = manager_on(ServerFamily::Vaelheim);
        manager.set_version(version);

        // id, 10 flag bytes, job, appearance (+4 when wide), packed coords.
        let mut payload = 31u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&[0u8; 10]);
        payload.extend_from_slice(&7u16.to_le_bytes());
        payload.extend_from_slice(&vec![0u8; total - 54 + 32]);
        // x=200, y=100 in the 10-bit packing.
        let (x, y) = (200u16, 100u16);
        payload.push((x & 0xFF) as u8);
        payload.push((((x >> 8) & 0x03) as u8) | ((y & 0x3F) as u8) << 2);
        payload.push(((y >> 6) & 0x0F) as u8);
        let mut frame = le_fixed(SMSG_BEING_VISIBLE, &payload);
        frame.resize(total, 0);
        peer.try_write(&frame).unwrap();

        let mut world = RecordingWorld::new();
        let mut ctx = world.context();
        assert_eq!(manager.flush_network(&mut ctx).unwrap(), 1);
        assert_eq!(
            world.events(),
            [NetEvent::Spawn {
                id: BeingId(31),
                job: 7,
                x: 200,
                y: 100,
            }],
            "version {version}"
        );
    }
}

#[test]
fn solmara_skips_unknown_ids_and_stays_aligned() {
    use riftmere_net::solmara::protocol::*;

    let (mut manager, mut peer) = manager_on(ServerFamily::Solmara);

    // Unknown experimental id, then a despawn.
    peer.try_write(&be_frame(0x0777, &[1, 2, 3, 4, 5])).unwrap();
    peer.try_write(&be_frame(SMSG_BEING_LEAVE, &9u32.to_be_bytes()))
        .unwrap();

    let mut world = RecordingWorld::new();
    let mut ctx = world.context();
    assert_eq!(manager.flush_network(&mut ctx).unwrap(), 2);
    assert_eq!(world.events(), [NetEvent::Despawn { id: BeingId(9) }]);
}

#[test]
fn map_messages_wait_for_game_start() {
    use riftmere_net::vael::protocol::*;

    init_test_logging();
    let mut manager = NetworkManager::new(NetConfig::default());
    manager.load(ServerFamily::Vaelora);
    let (local, mut peer) = MemoryTransport::pair();
    manager.connect(Box::new(local)).unwrap();

    // Before the map session starts only the session-level group listens;
    // a chat line is skipped, a connection problem still gets through.
    let mut world = RecordingWorld::new();
    peer.try_write(&le_variable(SMSG_PLAYER_CHAT, b"early")).unwrap();
    peer.try_write(&le_fixed(SMSG_CONNECTION_PROBLEM, &[2])).unwrap();
    let mut ctx = world.context();
    assert_eq!(manager.flush_network(&mut ctx).unwrap(), 2);
    assert_eq!(
        world.events(),
        [NetEvent::ConnectionProblem {
            code: 2,
            message: "This account is already logged in.".into(),
        }]
    );

    manager.game_started();
    world.clear();
    peer.try_write(&le_variable(SMSG_PLAYER_CHAT, b"in game")).unwrap();
    let mut ctx = world.context();
    manager.flush_network(&mut ctx).unwrap();
    assert_eq!(
        world.events(),
        [NetEvent::Chat {
            kind: ChatKind::Public,
            sender: None,
            text: "in game".into(),
        }]
    );

    // Leaving the map disarms the in-game groups again.
    manager.game_ended();
    world.clear();
    peer.try_write(&le_variable(SMSG_PLAYER_CHAT, b"late")).unwrap();
    let mut ctx = world.context();
    manager.flush_network(&mut ctx).unwrap();
    assert!(world.events().is_empty());
}

#[test]
fn vaelora_id_without_length_rule_is_fatal() {
    let (mut manager, mut peer) = manager_on(ServerFamily::Vaelora);
    peer.try_write(&[0xFF, 0x7F]).unwrap();

    let mut world = RecordingWorld::new();
    let mut ctx = world.context();
    assert!(manager.flush_network(&mut ctx).is_err());
    assert!(!manager.is_connected());
    assert!(matches!(world.events()[0], NetEvent::Disconnected { .. }));
}

#[test]
fn reload_rebuilds_conversation_state() {
    use riftmere_net::vael::protocol::*;

    let (mut manager, mut peer) = manager_on(ServerFamily::Vaelora);
    let npc = BeingId(12);

    let mut text = npc.0.to_le_bytes().to_vec();
    text.extend_from_slice(b"Hello.");
    peer.try_write(&le_variable(SMSG_NPC_MESSAGE, &text)).unwrap();
    let mut world = RecordingWorld::new();
    let mut ctx = world.context();
    manager.flush_network(&mut ctx).unwrap();

    // Mid-conversation a second talk request is refused.
    assert!(!manager.npc_talk(npc));

    manager.reload();
    // The rebuilt module starts idle again.
    assert!(manager.npc_talk(npc));
}

#[test]
fn features_survive_reload() {
    use riftmere_net::vaelheim::protocol::{CMSG_PLAYER_MOVE_EXT, EPOCH_EXTENDED_MOVE};

    let (mut manager, mut peer) = manager_on(ServerFamily::Vaelheim);
    manager.apply_features(ServerFeatures::EXTENDED_MOVE);
    manager.set_version(EPOCH_EXTENDED_MOVE);
    manager.reload();
    assert!(manager.walk(3, 4, 1));

    let mut world = RecordingWorld::new();
    let mut ctx = world.context();
    manager.flush_network(&mut ctx).unwrap();
    let mut buf = [0u8; 16];
    let mut sent = Vec::new();
    while let Ok(riftmere_net::ReadOutcome::Data(n)) = peer.try_read(&mut buf) {
        sent.extend_from_slice(&buf[..n]);
    }
    // The extended move request is still selected after reload.
    assert_eq!(u16::from_le_bytes([sent[0], sent[1]]), CMSG_PLAYER_MOVE_EXT);
}

#[test]
fn whisper_receipts_resolve_in_send_order() {
    use riftmere_net::vael::protocol::SMSG_WHISPER_RESPONSE;

    let mut config = NetConfig::default();
    config.limits.whisper_ms = 0;
    init_test_logging();
    let mut manager = NetworkManager::new(config);
    manager.load(ServerFamily::Vaelora);
    let (local, mut peer) = MemoryTransport::pair();
    manager.connect(Box::new(local)).unwrap();
    manager.game_started();
    manager.apply_features(ServerFeatures::WHISPER_ACK);

    assert!(manager.whisper("Alice", "one"));
    assert!(manager.whisper("Bob", "two"));

    // Delivered, then bounced.
    peer.try_write(&le_fixed(SMSG_WHISPER_RESPONSE, &[0])).unwrap();
    peer.try_write(&le_fixed(SMSG_WHISPER_RESPONSE, &[1])).unwrap();

    let mut world = RecordingWorld::new();
    let mut ctx = world.context();
    manager.flush_network(&mut ctx).unwrap();
    assert_eq!(
        world.events(),
        [
            NetEvent::WhisperResult {
                nick: "Alice".into(),
                delivered: true,
            },
            NetEvent::WhisperResult {
                nick: "Bob".into(),
                delivered: false,
            },
        ]
    );
}
