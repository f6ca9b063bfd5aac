//! Credential generation for the generate-or-accept prompts.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Generated password length.
pub const PASSWORD_LEN: usize = 24;

/// Fixed prefix for generated database usernames.
pub const USERNAME_PREFIX: &str = "valhalla_";

/// Length of the random username suffix.
const USERNAME_SUFFIX_LEN: usize = 8;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random alphanumeric password.
///
/// Drawn from the OS entropy source since these end up as MySQL
/// credentials.
pub fn random_password() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Generate a database username: fixed prefix plus a random
/// lowercase-alphanumeric suffix.
pub fn random_username() -> String {
    let mut rng = OsRng;
    let suffix: String = (0..USERNAME_SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("{USERNAME_PREFIX}{suffix}")
}
