use std::net::Ipv4Addr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid CIDR block '{0}'")]
pub struct CidrParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrBlock {
    network: u32,
    prefix_len: u8,
}

impl CidrBlock {
    pub fn parse(spec: &str) -> Result<Self, CidrParseError> {
        let (addr_part, prefix_part) = spec.split_once('/').ok_or_else(|| CidrParseError(spec.to_string()))?;
        let addr: Ipv4Addr = addr_part.parse().map_err(|_| CidrParseError(spec.to_string()))?;
        let prefix_len: u8 = prefix_part.parse().map_err(|_| CidrParseError(spec.to_string()))?;
        if prefix_len > 32 {
            return Err(CidrParseError(spec.to_string()));
        }
        Ok(CidrBlock { network: u32::from(addr), prefix_len })
    }

    fn mask(&self) -> u32 {
        if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - self.prefix_len)
        }
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let bits = u32::from(addr);
        (bits & self.mask()) == (self.network & self.mask())
    }
}

/// CIDR-based admission control: an address not covered by any configured
/// block is refused before it ever reaches the peer registry.
pub struct AllowList(Vec<CidrBlock>);

impl AllowList {
    pub fn parse_all<S: AsRef<str>>(specs: &[S]) -> Result<Self, CidrParseError> {
        let blocks = specs.iter().map(|s| CidrBlock::parse(s.as_ref())).collect::<Result<Vec<_>, _>>()?;
        Ok(AllowList(blocks))
    }

    pub fn loopback_only() -> Self {
        AllowList(vec![CidrBlock::parse("127.0.0.0/8").expect("valid literal")])
    }

    pub fn allows(&self, addr: Ipv4Addr) -> bool {
        self.0.iter().any(|b| b.contains(addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_eight_matches_whole_first_octet() {
        let block = CidrBlock::parse("127.0.0.0/8").unwrap();
        assert!(block.contains("127.0.0.1".parse().unwrap()));
        assert!(block.contains("127.255.255.255".parse().unwrap()));
        assert!(!block.contains("128.0.0.1".parse().unwrap()));
    }

    #[test]
    fn slash_thirtytwo_matches_only_exact_address() {
        let block = CidrBlock::parse("10.0.0.5/32").unwrap();
        assert!(block.contains("10.0.0.5".parse().unwrap()));
        assert!(!block.contains("10.0.0.6".parse().unwrap()));
    }

    #[test]
    fn slash_zero_matches_everything() {
        let block = CidrBlock::parse("0.0.0.0/0").unwrap();
        assert!(block.contains("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn malformed_spec_is_rejected() {
        assert!(CidrBlock::parse("not-an-address").is_err());
        assert!(CidrBlock::parse("10.0.0.0/33").is_err());
    }

    #[test]
    fn allow_list_rejects_addresses_outside_every_block() {
        let list = AllowList::parse_all(&["127.0.0.0/8", "192.168.0.0/16"]).unwrap();
        assert!(list.allows("127.0.0.1".parse().unwrap()));
        assert!(list.allows("192.168.1.1".parse().unwrap()));
        assert!(!list.allows("8.8.8.8".parse().unwrap()));
    }
}
