use std::io::{Cursor, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use crate::config::{MacSource, ServiceConfig};
use crate::service::{
    ControlService, PortIntrospector, PortQueryError, TrexPortMacs, check_greeting, greeting,
    handshake, port_introspector, read_frame, read_message, write_frame,
};

use super::{FakeHost, unique_temp_dir};

/// 单连接的 REP 端点：按顺序处理请求，用 `reply` 生成每个应答
fn spawn_rep_endpoint<F>(reply: F) -> String
where
    F: Fn(&Value) -> Value + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub endpoint");
    let addr = listener.local_addr().expect("local addr").to_string();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        handshake(&mut stream, "REP").expect("handshake");
        while let Ok(parts) = read_message(&mut stream) {
            assert_eq!(parts.len(), 2, "REQ envelope plus one body");
            assert!(parts[0].is_empty());
            let request: Value = serde_json::from_slice(&parts[1]).expect("json request");
            let body = serde_json::to_vec(&reply(&request)).unwrap();
            write_frame(&mut stream, 0x01, &[]).unwrap();
            write_frame(&mut stream, 0, &body).unwrap();
            stream.flush().unwrap();
        }
    });
    addr
}

fn trex_reply(request: &Value) -> Value {
    let id = request["id"].clone();
    match request["method"].as_str() {
        Some("api_sync_v2") => {
            assert_eq!(request["params"]["name"], "STL");
            json!({"jsonrpc": "2.0", "id": id, "result": {"api_h": "h-1234"}})
        }
        Some("get_system_info") => {
            assert_eq!(request["params"]["api_h"], "h-1234");
            json!({"jsonrpc": "2.0", "id": id, "result": {
                "core_type": "STL",
                "port_count": 3,
                "ports": [
                    {"index": 1, "hw_macaddr": "3C:FD:FE:AA:00:02", "driver": "net_i40e"},
                    {"index": 0, "hw_macaddr": "3c:fd:fe:aa:00:01", "driver": "net_i40e"},
                    {"index": 2, "hw_macaddr": "3c:fd:fe:aa:00:03", "driver": "net_i40e"}
                ]
            }})
        }
        other => json!({"jsonrpc": "2.0", "id": id,
                        "error": {"code": -32601, "message": format!("unknown {other:?}")}}),
    }
}

#[test]
fn greeting_declares_null_mechanism_version_three() {
    let g = greeting();
    assert_eq!(g.len(), 64);
    assert_eq!((g[0], g[9], g[10], g[11]), (0xFF, 0x7F, 3, 0));
    assert_eq!(&g[12..16], b"NULL");
    assert!(check_greeting(&g).is_ok());

    let mut curve = g;
    curve[12..17].copy_from_slice(b"CURVE");
    assert!(check_greeting(&curve).is_err());
    let mut old = g;
    old[10] = 2;
    assert!(check_greeting(&old).is_err());
}

#[test]
fn frames_switch_to_long_size_above_255_bytes() {
    let mut buf = Vec::new();
    write_frame(&mut buf, 0x01, b"abc").unwrap();
    assert_eq!(buf, [0x01, 3, b'a', b'b', b'c']);

    let body = vec![7u8; 300];
    let mut long = Vec::new();
    write_frame(&mut long, 0, &body).unwrap();
    assert_eq!(long[0], 0x02);
    assert_eq!(&long[1..9], &300u64.to_be_bytes());

    let mut cursor = Cursor::new([buf, long].concat());
    let first = read_frame(&mut cursor).unwrap();
    assert!(first.has_more());
    assert_eq!(first.body, b"abc");
    let second = read_frame(&mut cursor).unwrap();
    assert!(!second.has_more());
    assert_eq!(second.body, body);
}

#[test]
fn oversized_frame_header_is_refused() {
    let mut raw = vec![0x02];
    raw.extend_from_slice(&u64::MAX.to_be_bytes());
    assert!(read_frame(&mut Cursor::new(raw)).is_err());
}

#[test]
fn trex_ports_are_reported_in_requested_order() {
    let addr = spawn_rep_endpoint(trex_reply);
    let ports = TrexPortMacs::new(addr, vec![0, 1]).with_timeout(Duration::from_secs(5));
    let macs = ports.port_macs().unwrap();
    assert_eq!(
        macs.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ["3c:fd:fe:aa:00:01", "3c:fd:fe:aa:00:02"]
    );
}

#[test]
fn unknown_trex_port_is_an_error() {
    let addr = spawn_rep_endpoint(trex_reply);
    let ports = TrexPortMacs::new(addr, vec![0, 7]).with_timeout(Duration::from_secs(5));
    assert!(matches!(ports.port_macs(), Err(PortQueryError::MissingPort(7))));
}

#[test]
fn trex_rpc_error_is_surfaced() {
    let addr = spawn_rep_endpoint(|request| {
        json!({"jsonrpc": "2.0", "id": request["id"],
               "error": {"code": -32000, "message": "API version mismatch"}})
    });
    let ports = TrexPortMacs::new(addr, vec![0, 1]).with_timeout(Duration::from_secs(5));
    match ports.port_macs() {
        Err(PortQueryError::Rpc { method, code, .. }) => {
            assert_eq!(method, "api_sync_v2");
            assert_eq!(code, -32000);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn peer_that_is_not_zmtp_is_rejected() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let _ = stream.write_all(&[b'H'; 64]);
        thread::sleep(Duration::from_millis(200));
    });
    let ports = TrexPortMacs::new(addr, vec![0]).with_timeout(Duration::from_secs(5));
    assert!(matches!(ports.port_macs(), Err(PortQueryError::Io(_))));
}

#[test]
fn unreachable_trex_yields_empty_mac_list() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let dir = unique_temp_dir("trex-unreachable");
    let config = ServiceConfig {
        generator_dir: dir.clone(),
        trex_addr: addr,
        ..ServiceConfig::default()
    };
    assert_eq!(config.mac_source, MacSource::Trex);
    let svc = ControlService::new(
        &config,
        FakeHost::new("binary-search"),
        port_introspector(&config),
    );
    assert!(svc.get_mac_list().is_empty());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn default_service_lists_trex_macs() {
    let addr = spawn_rep_endpoint(trex_reply);
    let dir = unique_temp_dir("trex-service");
    let config = ServiceConfig {
        generator_dir: dir.clone(),
        trex_addr: addr,
        ..ServiceConfig::default()
    };
    let svc = ControlService::new(
        &config,
        FakeHost::new("binary-search"),
        port_introspector(&config),
    );
    assert_eq!(
        svc.get_mac_list(),
        ["3c:fd:fe:aa:00:01", "3c:fd:fe:aa:00:02"]
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn sysfs_source_reads_configured_interfaces() {
    let root = unique_temp_dir("trex-sysfs-source");
    std::fs::create_dir_all(root.join("ens1f0")).unwrap();
    std::fs::write(root.join("ens1f0").join("address"), "00:11:22:33:44:55\n").unwrap();
    let config = ServiceConfig {
        mac_source: MacSource::Sysfs,
        sysfs_net_root: root.clone(),
        port_interfaces: vec!["ens1f0".into()],
        ..ServiceConfig::default()
    };
    let macs = port_introspector(&config).port_macs().unwrap();
    assert_eq!(macs[0].to_string(), "00:11:22:33:44:55");
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn each_query_opens_a_fresh_connection() {
    // 每次查询新建连接，前一次的连接不会阻塞下一次
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming().take(2) {
            let mut stream: TcpStream = stream.unwrap();
            handshake(&mut stream, "REP").unwrap();
            while let Ok(parts) = read_message(&mut stream) {
                let request: Value = serde_json::from_slice(&parts[1]).unwrap();
                let body = serde_json::to_vec(&trex_reply(&request)).unwrap();
                write_frame(&mut stream, 0x01, &[]).unwrap();
                write_frame(&mut stream, 0, &body).unwrap();
            }
        }
    });
    let ports = TrexPortMacs::new(addr.to_string(), vec![1]).with_timeout(Duration::from_secs(5));
    assert_eq!(ports.port_macs().unwrap()[0].to_string(), "3c:fd:fe:aa:00:02");
    assert_eq!(ports.port_macs().unwrap()[0].to_string(), "3c:fd:fe:aa:00:02");
}
