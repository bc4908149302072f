//! 流描述构造
//!
//! 报文长度预算：以太网头 + FCS 18 字节，IPv4 20 字节，UDP 8 字节；
//! 802.1Q 额外 4 字节，QinQ 额外 8 字节，剩余部分作为负载。

use serde::Serialize;
use tracing::debug;

use crate::addr::{AddressRange, AddressValue, Ipv4Value, MacValue, PortValue};
use crate::error::ParamError;

use super::tag::TagSpec;

/// 无标签时 Ethernet + IPv4 + UDP 的固定开销
pub const BASE_HEADER_OVERHEAD: u32 = 18 + 20 + 8;

pub fn header_overhead(tag: &TagSpec) -> u32 {
    BASE_HEADER_OVERHEAD + tag.overhead()
}

/// 负载长度；帧长放不下报文头时返回校验错误
pub fn payload_len(frame_size: u32, tag: &TagSpec) -> Result<u32, ParamError> {
    let overhead = header_overhead(tag);
    frame_size.checked_sub(overhead).ok_or_else(|| {
        ParamError::Validation(format!(
            "frame size {frame_size} is smaller than the {overhead}-byte header overhead"
        ))
    })
}

/// 单个地址范围允许物化的最大值个数
pub const MAX_RANGE_VALUES: u32 = 1 << 20;

fn check_range_len<A: AddressValue>(
    field: &str,
    range: &AddressRange<A>,
) -> Result<(), ParamError> {
    if range.count() > MAX_RANGE_VALUES {
        return Err(ParamError::Validation(format!(
            "{field} range of {} values exceeds the limit of {MAX_RANGE_VALUES}",
            range.count()
        )));
    }
    Ok(())
}

/// 发送方式：外部发送工具持续循环发送且不打印逐包信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SendMode {
    #[serde(rename = "loop")]
    pub continuous: bool,
    pub verbose: bool,
}

impl Default for SendMode {
    fn default() -> Self {
        Self {
            continuous: true,
            verbose: false,
        }
    }
}

/// 一次构造、立即交给发送工具的流描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSpec {
    pub src_mac: Vec<MacValue>,
    pub dst_mac: Vec<MacValue>,
    pub src_ip: Vec<Ipv4Value>,
    pub dst_ip: Vec<Ipv4Value>,
    pub src_port: Vec<PortValue>,
    pub dst_port: Vec<PortValue>,
    pub frame_size: u32,
    pub payload_len: u32,
    pub tag: TagSpec,
    pub egress_interface: String,
    pub send: SendMode,
}

/// 类型化的流描述构造器
#[derive(Debug, Clone)]
pub struct FlowBuilder {
    src_mac: AddressRange<MacValue>,
    dst_mac: AddressRange<MacValue>,
    src_ip: AddressRange<Ipv4Value>,
    dst_ip: AddressRange<Ipv4Value>,
    src_port: AddressRange<PortValue>,
    dst_port: AddressRange<PortValue>,
    frame_size: u32,
    tag: TagSpec,
    interface: String,
}

impl FlowBuilder {
    /// 默认值：1.1.1.1 -> 1.1.1.2，c6:0f:aa:aa:00:00 -> c6:0f:bb:bb:00:00，
    /// 端口 10000 -> 20000，64 字节帧，无标签
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            src_mac: AddressRange::single(MacValue::from_octets([0xc6, 0x0f, 0xaa, 0xaa, 0, 0])),
            dst_mac: AddressRange::single(MacValue::from_octets([0xc6, 0x0f, 0xbb, 0xbb, 0, 0])),
            src_ip: AddressRange::single(Ipv4Value::new(0x0101_0101)),
            dst_ip: AddressRange::single(Ipv4Value::new(0x0101_0102)),
            src_port: AddressRange::single(PortValue::new(10000)),
            dst_port: AddressRange::single(PortValue::new(20000)),
            frame_size: 64,
            tag: TagSpec::None,
            interface: interface.into(),
        }
    }

    pub fn src_mac(mut self, range: AddressRange<MacValue>) -> Self {
        self.src_mac = range;
        self
    }

    pub fn dst_mac(mut self, range: AddressRange<MacValue>) -> Self {
        self.dst_mac = range;
        self
    }

    pub fn src_ip(mut self, range: AddressRange<Ipv4Value>) -> Self {
        self.src_ip = range;
        self
    }

    pub fn dst_ip(mut self, range: AddressRange<Ipv4Value>) -> Self {
        self.dst_ip = range;
        self
    }

    pub fn src_port(mut self, range: AddressRange<PortValue>) -> Self {
        self.src_port = range;
        self
    }

    pub fn dst_port(mut self, range: AddressRange<PortValue>) -> Self {
        self.dst_port = range;
        self
    }

    pub fn frame_size(mut self, frame_size: u32) -> Self {
        self.frame_size = frame_size;
        self
    }

    pub fn tag(mut self, tag: TagSpec) -> Self {
        self.tag = tag;
        self
    }

    pub fn build(self) -> Result<FlowSpec, ParamError> {
        let payload_len = payload_len(self.frame_size, &self.tag)?;
        check_range_len("src_mac", &self.src_mac)?;
        check_range_len("dst_mac", &self.dst_mac)?;
        check_range_len("src_ip", &self.src_ip)?;
        check_range_len("dst_ip", &self.dst_ip)?;
        check_range_len("src_port", &self.src_port)?;
        check_range_len("dst_port", &self.dst_port)?;
        let spec = FlowSpec {
            src_mac: self.src_mac.to_vec(),
            dst_mac: self.dst_mac.to_vec(),
            src_ip: self.src_ip.to_vec(),
            dst_ip: self.dst_ip.to_vec(),
            src_port: self.src_port.to_vec(),
            dst_port: self.dst_port.to_vec(),
            frame_size: self.frame_size,
            payload_len,
            tag: self.tag,
            egress_interface: self.interface,
            send: SendMode::default(),
        };
        debug!(
            interface = %spec.egress_interface,
            src_ips = spec.src_ip.len(),
            dst_ips = spec.dst_ip.len(),
            src_macs = spec.src_mac.len(),
            dst_macs = spec.dst_mac.len(),
            frame_size = spec.frame_size,
            payload_len = spec.payload_len,
            tag = ?spec.tag,
            "流描述已构造"
        );
        Ok(spec)
    }
}

/// 字符串形式的流选项（`<base>[,<count>]`），与命令行一一对应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOptions {
    pub src_ip: String,
    pub dst_ip: String,
    pub src_mac: String,
    pub dst_mac: String,
    pub src_port: String,
    pub dst_port: String,
    pub dot1q: Option<String>,
    pub qinq: Option<String>,
    pub size: u32,
    pub interface: String,
}

impl FlowOptions {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            src_ip: "1.1.1.1".into(),
            dst_ip: "1.1.1.2".into(),
            src_mac: "c6:0f:aa:aa:00:00".into(),
            dst_mac: "c6:0f:bb:bb:00:00".into(),
            src_port: "10000".into(),
            dst_port: "20000".into(),
            dot1q: None,
            qinq: None,
            size: 64,
            interface: interface.into(),
        }
    }

    pub fn build(&self) -> Result<FlowSpec, ParamError> {
        let tag = TagSpec::from_options(self.dot1q.as_deref(), self.qinq.as_deref())?;
        FlowBuilder::new(self.interface.clone())
            .src_ip(AddressRange::parse(&self.src_ip)?)
            .dst_ip(AddressRange::parse(&self.dst_ip)?)
            .src_mac(AddressRange::parse(&self.src_mac)?)
            .dst_mac(AddressRange::parse(&self.dst_mac)?)
            .src_port(AddressRange::parse(&self.src_port)?)
            .dst_port(AddressRange::parse(&self.dst_port)?)
            .frame_size(self.size)
            .tag(tag)
            .build()
    }
}
