//! HKDF/HMAC verification code deriver.
//!
//! The code binds a CR to a control number under a server-side secret:
//!
//! 1. salt = attendance id as 8 little-endian bytes;
//! 2. subkey = HKDF-SHA256(ikm = secret, salt, info = empty), 32 bytes;
//! 3. mac = HMAC-SHA256(subkey, "<id padded to 10 digits> <cr> <control>");
//! 4. code = Base58(mac), right-padded with `o` to 44 characters.
//!
//! The Base58 alphabet and the padding character are URL safe, so the code
//! can travel as a query parameter unescaped.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::domain::ControlNumber;
use crate::domain::ports::{VerificationCodeDeriver, VerificationCodeError};

/// Length every verification code is padded to.
pub const VERIFICATION_CODE_LEN: usize = 44;

const PADDING: char = 'o';
const SUBKEY_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Derive the verification code for `(cr, id, control)` under `secret`.
///
/// # Examples
/// ```
/// use frequencia::domain::derive_verification_code;
///
/// let code = derive_verification_code("380308", 1, 42, b"abc123").expect("secret present");
/// assert_eq!(code.len(), 44);
/// assert_eq!(code, derive_verification_code("380308", 1, 42, b"abc123").expect("secret present"));
/// ```
pub fn derive_verification_code(
    cr: &str,
    id: i64,
    control: i64,
    secret: &[u8],
) -> Result<String, VerificationCodeError> {
    if secret.is_empty() {
        return Err(VerificationCodeError::SecretMissing);
    }

    let salt = id.to_le_bytes();
    let hkdf = Hkdf::<Sha256>::new(Some(salt.as_slice()), secret);
    let mut subkey = Zeroizing::new([0_u8; SUBKEY_LEN]);
    hkdf.expand(&[], &mut *subkey)
        .map_err(|err| VerificationCodeError::Derivation {
            message: err.to_string(),
        })?;

    let mut mac = HmacSha256::new_from_slice(&subkey[..]).map_err(|err| {
        VerificationCodeError::Derivation {
            message: err.to_string(),
        }
    })?;
    mac.update(format!("{id:010} {cr} {control}").as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut code = bs58::encode(digest.as_slice()).into_string();
    while code.len() < VERIFICATION_CODE_LEN {
        code.push(PADDING);
    }
    Ok(code)
}

/// [`VerificationCodeDeriver`] holding the configured secret.
#[derive(Clone)]
pub struct HkdfVerificationCodeDeriver {
    secret: Zeroizing<Vec<u8>>,
}

impl HkdfVerificationCodeDeriver {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }
}

impl std::fmt::Debug for HkdfVerificationCodeDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HkdfVerificationCodeDeriver")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl VerificationCodeDeriver for HkdfVerificationCodeDeriver {
    fn derive(
        &self,
        cr: &str,
        control_number: ControlNumber,
    ) -> Result<String, VerificationCodeError> {
        derive_verification_code(
            cr,
            control_number.id(),
            control_number.control(),
            self.secret.as_slice(),
        )
    }
}
