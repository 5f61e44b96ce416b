mod generate;
mod key;
mod merge;
mod prefs;
mod select;
mod validate;

pub use self::generate::{generate, reformat, KeyOptions, KeyOptionsBuilder};
pub use self::key::{read, read_armored, Key, ReadResult, SubKey, User, UserBody};
pub use self::prefs::{preferred_hash_algo, preferred_hash_algo_for_packet, preferred_sym_algo};
pub use self::validate::PrimaryUser;
