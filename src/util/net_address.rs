// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Stable hashing for IP addresses, used to key login-throttling buckets.
//!
//! Ported from `libs/utils/impl/NetAddress.cpp`'s `std::hash<boost::asio::ip::address>`
//! specialisation. IPv6 addresses are masked to their first 64 bits (the routed-prefix portion)
//! before hashing, per spec, so that distinct addresses inside one operator-assigned /64 throttle
//! together instead of each getting its own independent bucket.

use std::net::IpAddr;

/// A stable hash of a network address, suitable as a `HashMap` key for throttling state.
///
/// IPv4 addresses hash their full 32 bits. IPv6 addresses hash only the first 64 bits (the
/// network prefix), discarding the interface identifier.
#[must_use]
pub fn hash_address(addr: &IpAddr) -> u64 {
    match addr {
        IpAddr::V4(v4) => u64::from(u32::from_be_bytes(v4.octets())),
        IpAddr::V6(v6) => {
            let octets = v6.octets();
            let mut prefix = [0u8; 8];
            prefix.copy_from_slice(&octets[..8]);
            u64::from_be_bytes(prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn ipv4_hashes_differ_by_address() {
        let a: IpAddr = "192.168.1.1".parse().unwrap();
        let b: IpAddr = "192.168.1.2".parse().unwrap();
        assert_ne!(hash_address(&a), hash_address(&b));
    }

    #[test]
    fn ipv6_masks_to_first_64_bits() {
        let a = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 1, 2, 3, 4));
        let b = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 5, 6, 7, 8));
        assert_eq!(hash_address(&a), hash_address(&b));

        let c = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 1, 1, 2, 3, 4));
        assert_ne!(hash_address(&a), hash_address(&c));
    }
}
