//! VLAN 标签
//!
//! 无标签 / 802.1Q 单标签 / QinQ 双标签，三者由枚举互斥表达。

use serde::Serialize;

use crate::addr::FormatError;
use crate::error::ParamError;

pub const MAX_VLAN_ID: u16 = 4095;
pub const MAX_PRIORITY: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TagSpec {
    #[default]
    None,
    Dot1q {
        vlan: u16,
        priority: u8,
    },
    Qinq {
        outer_vlan: u16,
        inner_vlan: u16,
        priority: u8,
    },
}

impl TagSpec {
    pub fn dot1q(vlan: u16, priority: u8) -> Result<Self, ParamError> {
        check_vlan(vlan)?;
        check_priority(priority)?;
        Ok(Self::Dot1q { vlan, priority })
    }

    pub fn qinq(outer_vlan: u16, inner_vlan: u16, priority: u8) -> Result<Self, ParamError> {
        check_vlan(outer_vlan)?;
        check_vlan(inner_vlan)?;
        check_priority(priority)?;
        Ok(Self::Qinq {
            outer_vlan,
            inner_vlan,
            priority,
        })
    }

    /// 标签占用的额外字节数
    pub fn overhead(&self) -> u32 {
        match self {
            TagSpec::None => 0,
            TagSpec::Dot1q { .. } => 4,
            TagSpec::Qinq { .. } => 8,
        }
    }

    /// 由两个互斥的命令行选项得到标签
    ///
    /// `dot1q` 形如 `vlan[,prio]`，全零表示未启用；`qinq` 形如
    /// `outer[,inner[,prio]]`，单个值表示内外层相同，全零表示未启用。
    /// 两者同时带非默认值是配置错误；QinQ 启用时外层 VLAN 不能为零。
    pub fn from_options(dot1q: Option<&str>, qinq: Option<&str>) -> Result<Self, ParamError> {
        let (vlan, prio) = match dot1q {
            Some(s) => parse_dot1q(s)?,
            None => (0, 0),
        };
        let (outer, inner, qprio) = match qinq {
            Some(s) => parse_qinq(s)?,
            None => (0, 0, 0),
        };

        let dot1q_set = vlan != 0 || prio != 0;
        let qinq_set = outer != 0 || inner != 0 || qprio != 0;
        match (dot1q_set, qinq_set) {
            (true, true) => Err(ParamError::Configuration(format!(
                "802.1Q tag {vlan},{prio} and QinQ tags {outer},{inner},{qprio} are mutually exclusive"
            ))),
            (true, false) => Self::dot1q(vlan, prio),
            (false, true) if outer == 0 => Err(ParamError::Validation(format!(
                "QinQ tags {outer},{inner},{qprio} need a non-zero outer VLAN"
            ))),
            (false, true) => Self::qinq(outer, inner, qprio),
            (false, false) => Ok(TagSpec::None),
        }
    }
}

fn check_vlan(vlan: u16) -> Result<(), FormatError> {
    if vlan > MAX_VLAN_ID {
        return Err(FormatError::value("VLAN id", &vlan.to_string()));
    }
    Ok(())
}

fn check_priority(priority: u8) -> Result<(), FormatError> {
    if priority > MAX_PRIORITY {
        return Err(FormatError::value("VLAN priority", &priority.to_string()));
    }
    Ok(())
}

fn parse_field<T: std::str::FromStr>(what: &'static str, s: &str) -> Result<T, FormatError> {
    s.trim().parse().map_err(|_| FormatError::value(what, s))
}

fn parse_dot1q(s: &str) -> Result<(u16, u8), FormatError> {
    let parts: Vec<&str> = s.split(',').collect();
    match parts.as_slice() {
        [vlan] => Ok((parse_field("VLAN id", vlan)?, 0)),
        [vlan, prio] => Ok((
            parse_field("VLAN id", vlan)?,
            parse_field("VLAN priority", prio)?,
        )),
        _ => Err(FormatError::value("802.1Q tag", s)),
    }
}

fn parse_qinq(s: &str) -> Result<(u16, u16, u8), FormatError> {
    let parts: Vec<&str> = s.split(',').collect();
    match parts.as_slice() {
        [tag] => {
            let tag = parse_field("VLAN id", tag)?;
            Ok((tag, tag, 0))
        }
        [outer, inner] => Ok((
            parse_field("VLAN id", outer)?,
            parse_field("VLAN id", inner)?,
            0,
        )),
        [outer, inner, prio] => Ok((
            parse_field("VLAN id", outer)?,
            parse_field("VLAN id", inner)?,
            parse_field("VLAN priority", prio)?,
        )),
        _ => Err(FormatError::value("QinQ tags", s)),
    }
}
