use crate::domain::model::{ReservationId, TicketReference};
use crate::domain::port::TicketEncoder;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 署名の長さ（バイト数、16進数では16文字）
const SIGNATURE_BYTES: usize = 8;

/// 署名付きチケットエンコーダー
/// `予約ID:署名`をURLセーフなBase64にしたものをチケット参照とする
/// 署名は予約IDのHMAC-SHA256の先頭部分
#[derive(Clone)]
pub struct SignedTicketEncoder {
    mac: HmacSha256,
}

impl SignedTicketEncoder {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret.as_ref())?,
        })
    }

    fn keyed(&self, reservation_id: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(reservation_id.as_bytes());
        mac
    }

    fn sign(&self, reservation_id: &str) -> String {
        let tag = self.keyed(reservation_id).finalize().into_bytes();
        hex::encode(&tag[..SIGNATURE_BYTES])
    }
}

impl TicketEncoder for SignedTicketEncoder {
    fn encode(&self, reservation_id: ReservationId) -> TicketReference {
        let id = reservation_id.to_string();
        let payload = format!("{}:{}", id, self.sign(&id));
        TicketReference::new(URL_SAFE_NO_PAD.encode(payload))
    }

    fn decode(&self, reference: &TicketReference) -> Option<ReservationId> {
        let bytes = URL_SAFE_NO_PAD.decode(reference.as_str().trim()).ok()?;
        let payload = String::from_utf8(bytes).ok()?;
        let (id, signature) = payload.split_once(':')?;

        let signature = hex::decode(signature).ok()?;
        if signature.len() != SIGNATURE_BYTES {
            return None;
        }
        // 定数時間で比較する
        self.keyed(id).verify_truncated_left(&signature).ok()?;

        ReservationId::from_string(id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(secret: &str) -> SignedTicketEncoder {
        SignedTicketEncoder::new(secret).unwrap()
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = encoder("secret");
        let id = ReservationId::new();

        assert_eq!(encoder.encode(id), encoder.encode(id));
        assert_ne!(encoder.encode(id), encoder.encode(ReservationId::new()));
    }

    #[test]
    fn test_decode_returns_original_id() {
        let encoder = encoder("secret");
        let id = ReservationId::new();

        let reference = encoder.encode(id);
        assert_eq!(encoder.decode(&reference), Some(id));
    }

    #[test]
    fn test_decode_rejects_other_secret() {
        let id = ReservationId::new();
        let reference = encoder("secret").encode(id);

        assert_eq!(encoder("another").decode(&reference), None);
    }

    #[test]
    fn test_signature_is_truncated_hmac_sha256() {
        let encoder = encoder("secret");
        let id = ReservationId::new().to_string();

        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(id.as_bytes());
        let full = hex::encode(mac.finalize().into_bytes());

        assert_eq!(encoder.sign(&id), full[..16]);
    }

    #[test]
    fn test_decode_rejects_tampered_reference() {
        let encoder = encoder("secret");
        let id = ReservationId::new();

        // 署名をそのままに予約IDだけ差し替える
        let signature = encoder.sign(&id.to_string());
        let forged = format!("{}:{}", ReservationId::new(), signature);
        let forged = TicketReference::new(URL_SAFE_NO_PAD.encode(forged));
        assert_eq!(encoder.decode(&forged), None);

        // 署名を短くしたものは受け付けない
        let shortened = format!("{}:{}", id, &signature[..8]);
        let shortened = TicketReference::new(URL_SAFE_NO_PAD.encode(shortened));
        assert_eq!(encoder.decode(&shortened), None);

        assert_eq!(encoder.decode(&TicketReference::new("not base64!".to_string())), None);
        assert_eq!(
            encoder.decode(&TicketReference::new(URL_SAFE_NO_PAD.encode("no-separator"))),
            None
        );
    }
}
