mod key;
mod many;
mod signature;
mod user_attribute;
mod user_id;

pub use self::key::{KeyPacket, PlainSecretParams, SecretParams};
pub use self::many::{Packet, PacketList};
pub use self::signature::{KeyFlags, SignatureConfig, SignaturePacket, SignatureType};
pub use self::user_attribute::UserAttribute;
pub use self::user_id::UserId;
