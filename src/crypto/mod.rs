pub mod keys;
pub mod encryption;
pub mod password;

pub use keys::*;
pub use encryption::*;
pub use password::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed — wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Corrupted ciphertext")]
    CorruptedCiphertext,

    #[error("Field secret must not be empty")]
    EmptySecret,
}
