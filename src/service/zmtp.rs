//! 最小化的 ZMTP 3.0 REQ 客户端
//!
//! 只支持 NULL 安全机制与单帧消息体，足以和 TRex 的 JSON-RPC 端点对话。

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

const GREETING_LEN: usize = 64;
const FLAG_MORE: u8 = 0x01;
const FLAG_LONG: u8 = 0x02;
const FLAG_COMMAND: u8 = 0x04;

/// 单帧大小上限
pub const MAX_FRAME: u64 = 16 * 1024 * 1024;

fn protocol_error(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// 本端问候：签名、版本 3.0、NULL 机制、as-server = 0
pub(crate) fn greeting() -> [u8; GREETING_LEN] {
    let mut g = [0u8; GREETING_LEN];
    g[0] = 0xFF;
    g[9] = 0x7F;
    g[10] = 3;
    g[11] = 0;
    g[12..16].copy_from_slice(b"NULL");
    g
}

/// 校验对端问候的签名、主版本与安全机制
pub(crate) fn check_greeting(peer: &[u8; GREETING_LEN]) -> io::Result<()> {
    if peer[0] != 0xFF || peer[9] & 0x01 != 0x01 {
        return Err(protocol_error("peer is not a ZMTP endpoint"));
    }
    if peer[10] < 3 {
        return Err(protocol_error(format!("unsupported ZMTP version {}", peer[10])));
    }
    let mechanism = &peer[12..32];
    if !mechanism.starts_with(b"NULL") || mechanism[4..].iter().any(|&b| b != 0) {
        return Err(protocol_error("peer requires a security mechanism other than NULL"));
    }
    Ok(())
}

/// READY 命令体，带一个 Socket-Type 属性
pub(crate) fn ready_command(socket_type: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(32);
    body.push(5);
    body.extend_from_slice(b"READY");
    body.push(11);
    body.extend_from_slice(b"Socket-Type");
    body.extend_from_slice(&(socket_type.len() as u32).to_be_bytes());
    body.extend_from_slice(socket_type.as_bytes());
    body
}

/// 一帧：标志位与内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub flags: u8,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn is_command(&self) -> bool {
        self.flags & FLAG_COMMAND != 0
    }

    pub fn has_more(&self) -> bool {
        self.flags & FLAG_MORE != 0
    }
}

pub(crate) fn write_frame<W: Write>(w: &mut W, flags: u8, body: &[u8]) -> io::Result<()> {
    let flags = flags & (FLAG_MORE | FLAG_COMMAND);
    if body.len() > u8::MAX as usize {
        w.write_all(&[flags | FLAG_LONG])?;
        w.write_all(&(body.len() as u64).to_be_bytes())?;
    } else {
        w.write_all(&[flags, body.len() as u8])?;
    }
    w.write_all(body)
}

pub(crate) fn read_frame<R: Read>(r: &mut R) -> io::Result<Frame> {
    let mut flags = [0u8; 1];
    r.read_exact(&mut flags)?;
    let flags = flags[0];
    let size = if flags & FLAG_LONG != 0 {
        let mut size = [0u8; 8];
        r.read_exact(&mut size)?;
        u64::from_be_bytes(size)
    } else {
        let mut size = [0u8; 1];
        r.read_exact(&mut size)?;
        u64::from(size[0])
    };
    if size > MAX_FRAME {
        return Err(protocol_error(format!("frame of {size} bytes exceeds {MAX_FRAME}")));
    }
    let mut body = vec![0u8; size as usize];
    r.read_exact(&mut body)?;
    Ok(Frame { flags, body })
}

/// 握手：交换问候后发送 READY，并等待对端 READY
pub(crate) fn handshake<S: Read + Write>(stream: &mut S, socket_type: &str) -> io::Result<()> {
    stream.write_all(&greeting())?;
    let mut peer = [0u8; GREETING_LEN];
    stream.read_exact(&mut peer)?;
    check_greeting(&peer)?;

    write_frame(stream, FLAG_COMMAND, &ready_command(socket_type))?;
    let ready = read_frame(stream)?;
    if !ready.is_command() || !ready.body.starts_with(b"\x05READY") {
        if ready.body.starts_with(b"\x05ERROR") {
            let reason = String::from_utf8_lossy(ready.body.get(7..).unwrap_or_default());
            return Err(protocol_error(format!("peer rejected handshake: {reason}")));
        }
        return Err(protocol_error("expected READY from peer"));
    }
    Ok(())
}

/// 读出一条完整消息的所有数据帧，跳过命令帧
pub(crate) fn read_message<R: Read>(r: &mut R) -> io::Result<Vec<Vec<u8>>> {
    let mut parts = Vec::new();
    loop {
        let frame = read_frame(r)?;
        if frame.is_command() {
            continue;
        }
        let more = frame.has_more();
        parts.push(frame.body);
        if !more {
            return Ok(parts);
        }
    }
}

/// REQ 套接字：请求与应答严格交替
#[derive(Debug)]
pub struct ReqSocket {
    stream: TcpStream,
}

impl ReqSocket {
    /// 依次尝试解析出的地址，第一个连上的完成握手
    pub fn connect(addr: &str, timeout: Duration) -> io::Result<Self> {
        let mut last_err = None;
        for sock_addr in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&sock_addr, timeout) {
                Ok(mut stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    handshake(&mut stream, "REQ")?;
                    debug!(peer = %sock_addr, "ZMTP 握手完成");
                    return Ok(Self { stream });
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{addr} resolved to no address"))
        }))
    }

    /// 发送一条单帧请求并等待应答体
    pub fn request(&mut self, body: &[u8]) -> io::Result<Vec<u8>> {
        // REQ 信封：空分隔帧 + 消息体
        write_frame(&mut self.stream, FLAG_MORE, &[])?;
        write_frame(&mut self.stream, 0, body)?;
        self.stream.flush()?;

        let mut parts = read_message(&mut self.stream)?.into_iter();
        match parts.next() {
            Some(delim) if delim.is_empty() => {}
            _ => return Err(protocol_error("reply is missing the REQ envelope delimiter")),
        }
        parts
            .next()
            .ok_or_else(|| protocol_error("reply carries no body"))
    }
}
