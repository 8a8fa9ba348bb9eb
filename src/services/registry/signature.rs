use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// 共享密钥签名校验器
///
/// 期望签名为 `hex(HMAC-SHA1(secret, identity))`，小写十六进制。
#[derive(Clone)]
pub struct SignatureValidator {
    secret: Vec<u8>,
}

impl std::fmt::Debug for SignatureValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureValidator")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SignatureValidator {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// 计算身份字符串的签名
    pub fn sign(&self, identity: &str) -> Option<String> {
        // HMAC 接受任意长度密钥，这里不会失败
        let mut mac = HmacSha1::new_from_slice(&self.secret).ok()?;
        mac.update(identity.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    /// 缺少身份或签名均视为校验失败
    pub fn verify(&self, identity: Option<&str>, signature: Option<&str>) -> bool {
        let (Some(identity), Some(signature)) = (identity, signature) else {
            return false;
        };
        let Some(expected) = self.sign(identity) else {
            return false;
        };

        // 长度不同时 ct_eq 直接返回 false
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}
