use snafu::{Backtrace, Snafu};

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// Error types
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The packet sequence yielded no primary key or no users.
    #[snafu(display("invalid key: {message}"))]
    InvalidKey {
        message: String,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("armor block is not a public or private key"))]
    MalformedArmor { backtrace: Option<Backtrace> },
    #[snafu(display("unknown public key algorithm {alg}"))]
    UnknownAlgorithm { alg: u8 },
    #[snafu(display("unsupported key type for generation: {message}"))]
    UnsupportedKeyType { message: String },
    #[snafu(display("unsupported subkey type for generation: {message}"))]
    UnsupportedSubkeyType { message: String },
    #[snafu(display("unknown curve: {name}"))]
    UnknownCurve {
        name: String,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("secret key parameters are encrypted"))]
    NotDecrypted,
    #[snafu(display("primary key fingerprints do not match"))]
    FingerprintMismatch,
    #[snafu(display("subkey sets do not match"))]
    SubkeyMismatch,
    #[snafu(display("key is not private, nothing to encrypt"))]
    NothingToEncrypt,
    #[snafu(display("key is not private, nothing to decrypt"))]
    NothingToDecrypt,
    #[snafu(display("could not find a valid signing key packet"))]
    SigningKeyNotFound,
    #[snafu(display("could not find a primary user"))]
    PrimaryUserNotFound,
    #[snafu(display("invalid input"))]
    InvalidInput { backtrace: Option<Backtrace> },
    #[snafu(display("IO error: {}", source), context(false))]
    IO {
        source: std::io::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(transparent)]
    RsaError {
        source: rsa::errors::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(transparent)]
    EllipticCurve {
        source: p256::elliptic_curve::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(transparent)]
    SignatureError { source: signature::Error },
    #[snafu(display("Not yet implemented: {message}"))]
    Unimplemented { message: String },
    /// Signals algorithms and parameters we don't support, but can safely ignore
    #[snafu(display("Unsupported: {message}"))]
    Unsupported {
        message: String,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("{message}"))]
    Message {
        message: String,
        backtrace: Option<Backtrace>,
    },
}

impl From<String> for Error {
    fn from(message: String) -> Error {
        Error::Message {
            message,
            backtrace: Some(snafu::GenerateImplicitData::generate()),
        }
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Error {
        Error::Message {
            message: err.to_string(),
            backtrace: Some(snafu::GenerateImplicitData::generate()),
        }
    }
}

impl From<cipher::InvalidLength> for Error {
    fn from(_: cipher::InvalidLength) -> Error {
        Error::Message {
            message: "invalid key iv length".to_string(),
            backtrace: Some(snafu::GenerateImplicitData::generate()),
        }
    }
}

#[macro_export]
macro_rules! unimplemented_err {
    ($e:expr) => {
        return Err($crate::errors::Error::Unimplemented { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Unimplemented { message: format!($fmt, $($arg)+)})
    };
}

#[macro_export]
macro_rules! unsupported_err {
    ($e:expr) => {
        return Err($crate::errors::Error::Unsupported {
            message: $e.to_string(),
            backtrace: ::snafu::GenerateImplicitData::generate(),
        })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Unsupported {
            message: format!($fmt, $($arg)+),
            backtrace: ::snafu::GenerateImplicitData::generate(),
        })
    };
}

#[macro_export]
macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::Message {
            message: $e.to_string(),
            backtrace: ::snafu::GenerateImplicitData::generate(),
        })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Message {
            message: format!($fmt, $($arg)+),
            backtrace: ::snafu::GenerateImplicitData::generate(),
        })
    };
}

#[macro_export]
macro_rules! format_err {
    ($e:expr) => {
        $crate::errors::Error::Message {
            message: $e.to_string(),
            backtrace: ::snafu::GenerateImplicitData::generate(),
        }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::Message {
            message: format!($fmt, $($arg)+),
            backtrace: ::snafu::GenerateImplicitData::generate(),
        }
    };
}

#[macro_export(local_inner_macros)]
macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            bail!($e);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !($cond) {
            bail!($fmt, $($arg)+);
        }
    };
}

#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr) => ({
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`"#, left_val, right_val)
                }
            }
        }
    });
    ($left:expr, $right:expr,) => ({
        ensure_eq!($left, $right)
    });
    ($left:expr, $right:expr, $($arg:tt)+) => ({
        match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`: {}"#, left_val, right_val,
                           format_args!($($arg)+))
                }
            }
        }
    });
}
