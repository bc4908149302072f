//! 地址值类型
//!
//! 每种地址都是定宽无符号整数：IPv4 32 位、MAC 48 位、L4 端口 16 位。
//! 渲染（点分十进制 / 冒号十六进制 / 十进制）与解析互为逆运算。

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::FormatError;

/// 定宽地址值：加一按 `2^WIDTH_BITS` 取模
pub trait AddressValue: Copy + Eq + fmt::Debug + fmt::Display + FromStr<Err = FormatError> {
    /// 位宽
    const WIDTH_BITS: u32;

    /// 整数编码（低 `WIDTH_BITS` 位有效）
    fn to_bits(self) -> u64;

    /// 由整数编码构造，超出位宽的高位被截掉
    fn from_bits(bits: u64) -> Self;

    fn mask() -> u64 {
        (1u64 << Self::WIDTH_BITS) - 1
    }

    /// 后继值；最高字节进位溢出后回绕到零
    fn successor(self) -> Self {
        Self::from_bits(self.to_bits().wrapping_add(1) & Self::mask())
    }
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// IPv4 地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Value(u32);

impl Ipv4Value {
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn octets(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl AddressValue for Ipv4Value {
    const WIDTH_BITS: u32 = 32;

    fn to_bits(self) -> u64 {
        u64::from(self.0)
    }

    fn from_bits(bits: u64) -> Self {
        Self((bits & Self::mask()) as u32)
    }
}

impl FromStr for Ipv4Value {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 4];
        let mut parts = s.trim().split('.');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .filter(|p| is_decimal(p) && p.len() <= 3)
                .ok_or_else(|| FormatError::address("IPv4 address", s))?;
            *octet = part
                .parse()
                .map_err(|_| FormatError::address("IPv4 address", s))?;
        }
        if parts.next().is_some() {
            return Err(FormatError::address("IPv4 address", s));
        }
        Ok(Self(u32::from_be_bytes(octets)))
    }
}

impl fmt::Display for Ipv4Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets();
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

impl From<Ipv4Addr> for Ipv4Value {
    fn from(addr: Ipv4Addr) -> Self {
        Self(u32::from(addr))
    }
}

impl From<Ipv4Value> for Ipv4Addr {
    fn from(v: Ipv4Value) -> Self {
        Ipv4Addr::from(v.0)
    }
}

/// 48 位 MAC 地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacValue(u64);

impl MacValue {
    pub fn from_octets(octets: [u8; 6]) -> Self {
        let mut buf = [0u8; 8];
        buf[2..].copy_from_slice(&octets);
        Self(u64::from_be_bytes(buf))
    }

    pub fn octets(self) -> [u8; 6] {
        let bytes = self.0.to_be_bytes();
        let mut out = [0u8; 6];
        out.copy_from_slice(&bytes[2..]);
        out
    }
}

impl AddressValue for MacValue {
    const WIDTH_BITS: u32 = 48;

    fn to_bits(self) -> u64 {
        self.0
    }

    fn from_bits(bits: u64) -> Self {
        Self(bits & Self::mask())
    }
}

impl FromStr for MacValue {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.trim().split(':');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .filter(|p| (1..=2).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_hexdigit()))
                .ok_or_else(|| FormatError::address("MAC address", s))?;
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| FormatError::address("MAC address", s))?;
        }
        if parts.next().is_some() {
            return Err(FormatError::address("MAC address", s));
        }
        Ok(Self::from_octets(octets))
    }
}

impl fmt::Display for MacValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.octets();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

/// UDP/TCP 端口号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortValue(u16);

impl PortValue {
    pub const fn new(port: u16) -> Self {
        Self(port)
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl AddressValue for PortValue {
    const WIDTH_BITS: u32 = 16;

    fn to_bits(self) -> u64 {
        u64::from(self.0)
    }

    fn from_bits(bits: u64) -> Self {
        Self((bits & Self::mask()) as u16)
    }
}

impl FromStr for PortValue {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if !is_decimal(t) {
            return Err(FormatError::address("port", s));
        }
        t.parse()
            .map(Self)
            .map_err(|_| FormatError::address("port", s))
    }
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// IP/MAC 以规范字符串形式序列化，端口保持数字
impl Serialize for Ipv4Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for MacValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for PortValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.0)
    }
}
