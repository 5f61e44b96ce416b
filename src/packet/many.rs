use std::ops::RangeBounds;

use crate::packet::{KeyPacket, SignaturePacket, UserAttribute, UserId};
use crate::types::Tag;

/// The packet sum over the types the key model is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Packet {
    Key(KeyPacket),
    UserId(UserId),
    UserAttribute(UserAttribute),
    Signature(SignaturePacket),
}

impl Packet {
    pub fn tag(&self) -> Tag {
        match self {
            Packet::Key(k) => k.tag(),
            Packet::UserId(_) => Tag::UserId,
            Packet::UserAttribute(_) => Tag::UserAttribute,
            Packet::Signature(_) => Tag::Signature,
        }
    }
}

impl From<KeyPacket> for Packet {
    fn from(p: KeyPacket) -> Self {
        Packet::Key(p)
    }
}

impl From<UserId> for Packet {
    fn from(p: UserId) -> Self {
        Packet::UserId(p)
    }
}

impl From<UserAttribute> for Packet {
    fn from(p: UserAttribute) -> Self {
        Packet::UserAttribute(p)
    }
}

impl From<SignaturePacket> for Packet {
    fn from(p: SignaturePacket) -> Self {
        Packet::Signature(p)
    }
}

/// An ordered list of packets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketList(Vec<Packet>);

impl PacketList {
    pub fn new() -> Self {
        PacketList(Vec::new())
    }

    pub fn push(&mut self, packet: impl Into<Packet>) {
        self.0.push(packet.into());
    }

    /// Appends all packets of `other`, leaving it empty.
    pub fn append(&mut self, other: &mut PacketList) {
        self.0.append(&mut other.0);
    }

    /// The concatenation of the two lists.
    pub fn concat(mut self, mut other: PacketList) -> PacketList {
        self.0.append(&mut other.0);
        self
    }

    /// A copy of the given index range.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> PacketList {
        let start = match range.start_bound() {
            std::ops::Bound::Included(&s) => s,
            std::ops::Bound::Excluded(&s) => s + 1,
            std::ops::Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            std::ops::Bound::Included(&e) => e + 1,
            std::ops::Bound::Excluded(&e) => e,
            std::ops::Bound::Unbounded => self.0.len(),
        };
        PacketList(self.0[start..end].to_vec())
    }

    /// Positions of every packet whose tag is one of `tags`.
    pub fn index_of_tag(&self, tags: &[Tag]) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, p)| tags.contains(&p.tag()))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Packet> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Packet> {
        self.0.iter()
    }
}

impl From<Vec<Packet>> for PacketList {
    fn from(v: Vec<Packet>) -> Self {
        PacketList(v)
    }
}

impl IntoIterator for PacketList {
    type Item = Packet;
    type IntoIter = std::vec::IntoIter<Packet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PacketList {
    type Item = &'a Packet;
    type IntoIter = std::slice::Iter<'a, Packet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for PacketList {
    type Output = Packet;

    fn index(&self, index: usize) -> &Packet {
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_of_tag() {
        let mut list = PacketList::new();
        list.push(UserId::from_str("a"));
        list.push(UserId::from_str("b"));
        list.push(UserAttribute::from_bytes(vec![1, 2, 3]));

        assert_eq!(list.index_of_tag(&[Tag::UserId]), vec![0, 1]);
        assert_eq!(
            list.index_of_tag(&[Tag::UserId, Tag::UserAttribute]),
            vec![0, 1, 2]
        );
        assert!(list.index_of_tag(&[Tag::Signature]).is_empty());
    }

    #[test]
    fn test_slice_and_concat() {
        let mut a = PacketList::new();
        a.push(UserId::from_str("a"));
        a.push(UserId::from_str("b"));

        let mut b = PacketList::new();
        b.push(UserId::from_str("c"));

        let joined = a.clone().concat(b);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.slice(1..3).len(), 2);
        assert_eq!(joined.slice(..1), a.slice(..1));
    }
}
