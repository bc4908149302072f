//! 地址范围
//!
//! `AddressRange` = 基准值 + 正整数数量；迭代器惰性产出，每次调用 `iter()`
//! 都从基准值重新开始。

use std::iter::FusedIterator;
use std::num::NonZeroU32;

use super::value::AddressValue;
use super::{FormatError, RANGE_SEPARATOR};

/// 不可变的地址范围 `{base, count}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange<A> {
    base: A,
    count: NonZeroU32,
}

impl<A: AddressValue> AddressRange<A> {
    pub fn new(base: A, count: NonZeroU32) -> Self {
        Self { base, count }
    }

    /// 只含基准值本身的范围
    pub fn single(base: A) -> Self {
        Self {
            base,
            count: NonZeroU32::MIN,
        }
    }

    /// 解析 `<base>` 或 `<base>,<count>`
    ///
    /// 只在第一个分隔符处切分；数量必须是正整数。
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let Some((base, count)) = spec.split_once(RANGE_SEPARATOR) else {
            return Ok(Self::single(spec.parse()?));
        };
        let count = count
            .trim()
            .parse::<NonZeroU32>()
            .map_err(|_| FormatError::Count {
                input: count.to_string(),
            })?;
        Ok(Self::new(base.parse()?, count))
    }

    pub fn base(&self) -> A {
        self.base
    }

    pub fn count(&self) -> u32 {
        self.count.get()
    }

    /// 范围内最后一个值（可能已经回绕）
    pub fn last(&self) -> A {
        let offset = u64::from(self.count.get() - 1);
        A::from_bits(self.base.to_bits().wrapping_add(offset) & A::mask())
    }

    pub fn iter(&self) -> AddressIter<A> {
        generate(self.base, self.count.get())
    }

    pub fn to_vec(&self) -> Vec<A> {
        self.iter().collect()
    }
}

impl<'a, A: AddressValue> IntoIterator for &'a AddressRange<A> {
    type Item = A;
    type IntoIter = AddressIter<A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 惰性地址迭代器，恰好产出 `count` 个值
#[derive(Debug, Clone)]
pub struct AddressIter<A> {
    next: A,
    remaining: u32,
}

impl<A: AddressValue> Iterator for AddressIter<A> {
    type Item = A;

    fn next(&mut self) -> Option<A> {
        if self.remaining == 0 {
            return None;
        }
        let cur = self.next;
        self.remaining -= 1;
        self.next = cur.successor();
        Some(cur)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl<A: AddressValue> ExactSizeIterator for AddressIter<A> {}

impl<A: AddressValue> FusedIterator for AddressIter<A> {}

/// 从 `base` 开始生成 `count` 个连续值；`count == 0` 时为空序列
pub fn generate<A: AddressValue>(base: A, count: u32) -> AddressIter<A> {
    AddressIter {
        next: base,
        remaining: count,
    }
}

/// 解析范围描述并物化为有序列表
pub fn parse_list<A: AddressValue>(spec: &str) -> Result<Vec<A>, FormatError> {
    Ok(AddressRange::<A>::parse(spec)?.to_vec())
}
