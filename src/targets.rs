use ipnet::IpNet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ops::RangeInclusive;

/// Expand one input token into the addresses to look up.
///
/// A token that parses as CIDR notation yields every address of the block,
/// network and broadcast included, in ascending order. Anything else is
/// passed through unchanged as a single target; validation is left to the
/// lookup. Never fails.
pub fn expand(target: &str) -> Targets {
    let inner = match target.parse::<IpNet>() {
        Ok(IpNet::V4(net)) => {
            Inner::V4(u32::from(net.network())..=u32::from(net.broadcast()))
        }
        Ok(IpNet::V6(net)) => {
            Inner::V6(u128::from(net.network())..=u128::from(net.broadcast()))
        }
        Err(_) => Inner::Literal(Some(target.to_string())),
    };
    Targets { inner }
}

/// Lazy sequence of addresses produced by [`expand`].
#[derive(Debug, Clone)]
pub struct Targets {
    inner: Inner,
}

#[derive(Debug, Clone)]
enum Inner {
    Literal(Option<String>),
    V4(RangeInclusive<u32>),
    V6(RangeInclusive<u128>),
}

impl Targets {
    /// True when the token was expanded as a CIDR block.
    pub fn is_block(&self) -> bool {
        !matches!(self.inner, Inner::Literal(_))
    }
}

impl Iterator for Targets {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match &mut self.inner {
            Inner::Literal(token) => token.take(),
            Inner::V4(range) => range.next().map(|n| Ipv4Addr::from(n).to_string()),
            Inner::V6(range) => range.next().map(|n| Ipv6Addr::from(n).to_string()),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Inner::Literal(token) => {
                let n = usize::from(token.is_some());
                (n, Some(n))
            }
            Inner::V4(range) => range.size_hint(),
            Inner::V6(range) => range.size_hint(),
        }
    }
}
