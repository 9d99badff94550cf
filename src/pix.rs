//! PIX (BR Code) payload generation.
//!
//! The `pix` module assembles the Merchant Presented QR text payload a
//! wallet app scans to pay a parking fee.  The format is a flat
//! sequence of TLV fields (two-digit id, two-digit decimal length,
//! value) in an order mandated by the BR Code standard, terminated by
//! a CRC16/CCITT-FALSE checksum over everything before it, including
//! the checksum field's own `6304` header.  External wallets parse
//! this byte for byte, so the assembly and the checksum must be exact.

use crate::models::PixReceiver;
use chrono::{DateTime, Utc};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// GUI of the PIX arrangement inside the field-26 template.
const PIX_GUI: &str = "br.gov.bcb.pix";
/// ISO 4217 numeric code for the Brazilian Real.
const CURRENCY_BRL: &str = "986";

const MAX_HOLDER_NAME: usize = 25;
const MAX_HOLDER_CITY: usize = 15;

/// Errors raised by the payload encoder.  Both indicate a mandatory
/// protocol field is blank; callers should block the PIX method and
/// fall back to another payment method.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PixError {
    #[error("pix key is empty")]
    EmptyReceiverKey,
    #[error("transaction id is empty")]
    EmptyTransactionId,
}

/// A fully assembled BR Code payload.  Immutable once produced; fed
/// to a QR renderer and to a copy-paste text field, both external.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixPayload {
    text: String,
}

impl PixPayload {
    /// The complete payload text, checksum included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The trailing 4-hex-digit CRC16 checksum.
    pub fn crc(&self) -> &str {
        &self.text[self.text.len() - 4..]
    }
}

/// One TLV field: id, zero-padded two-digit decimal length, value.
fn tlv(id: &str, value: &str) -> String {
    format!("{}{:02}{}", id, value.len(), value)
}

/// Strips diacritics via canonical decomposition, keeps only ASCII
/// letters, digits and whitespace, and trims the result.
fn sanitize(input: &str) -> String {
    let kept: String = input
        .nfd()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace())
        .collect();
    kept.trim().to_string()
}

fn truncate(input: &str, max: usize) -> &str {
    // sanitized input is ASCII, so a byte index is a char boundary
    &input[..input.len().min(max)]
}

/// Builds the merchant transaction reference for one exit: the plate
/// reduced to its alphanumerics followed by the epoch milliseconds of
/// the moment the exit transaction opened.  Generate it once per exit
/// and reuse it for every payload encoding of that exit, so that the
/// copyable text and the rendered QR always carry the same id.
pub fn transaction_id(plate: &str, now: DateTime<Utc>) -> String {
    let compact: String = plate.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("{}{}", compact, now.timestamp_millis())
}

/// Encodes the BR Code payload for a charge of `amount` to `receiver`.
///
/// Field order is mandated by the standard and must not change:
/// payload format indicator, PIX account template, merchant category,
/// currency, amount, country, holder name, holder city, transaction
/// id, CRC.  Name and city are sanitised and truncated to the
/// standard's 25/15-character limits; key and transaction id go in
/// verbatim.
pub fn encode_payload(
    receiver: &PixReceiver,
    amount: f64,
    transaction_id: &str,
) -> Result<PixPayload, PixError> {
    let key = receiver.pix_key.trim();
    if key.is_empty() {
        return Err(PixError::EmptyReceiverKey);
    }
    let txid = transaction_id.trim();
    if txid.is_empty() {
        return Err(PixError::EmptyTransactionId);
    }

    let holder = sanitize(&receiver.pix_holder_name);
    let city = sanitize(&receiver.pix_holder_city);

    let mut payload = String::new();
    payload.push_str(&tlv("00", "01"));
    payload.push_str(&tlv(
        "26",
        &format!("{}{}", tlv("00", PIX_GUI), tlv("01", key)),
    ));
    payload.push_str(&tlv("52", "0000"));
    payload.push_str(&tlv("53", CURRENCY_BRL));
    payload.push_str(&tlv("54", &format!("{amount:.2}")));
    payload.push_str(&tlv("58", "BR"));
    payload.push_str(&tlv("59", truncate(&holder, MAX_HOLDER_NAME)));
    payload.push_str(&tlv("60", truncate(&city, MAX_HOLDER_CITY)));
    payload.push_str(&tlv("62", &tlv("05", txid)));
    // the CRC covers its own field header
    payload.push_str("6304");
    let crc = crc16(&payload);
    payload.push_str(&crc);

    Ok(PixPayload { text: payload })
}

/// CRC16/CCITT-FALSE: polynomial 0x1021, initial register 0xFFFF, no
/// reflection, no final xor.  Implemented as the direct bit loop so
/// the output matches the reference for every input, returned as four
/// uppercase hex digits.
pub fn crc16(data: &str) -> String {
    let mut crc: u16 = 0xFFFF;
    for &byte in data.as_bytes() {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    format!("{crc:04X}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn receiver() -> PixReceiver {
        PixReceiver {
            pix_key: "test@example.com".to_string(),
            pix_holder_name: "Fulano De Tal".to_string(),
            pix_holder_city: "Sao Paulo".to_string(),
        }
    }

    #[test]
    fn crc16_known_vectors() {
        // init 0xFFFF with no data processed
        assert_eq!(crc16(""), "FFFF");
        // the standard CCITT-FALSE check value
        assert_eq!(crc16("123456789"), "29B1");
    }

    #[test]
    fn encodes_reference_payload_byte_exact() {
        let payload = encode_payload(&receiver(), 10.0, "ABC123").unwrap();
        assert_eq!(
            payload.text(),
            "00020126380014br.gov.bcb.pix0116test@example.com52040000\
             5303986540510.005802BR5913Fulano De Tal6009Sao Paulo\
             62100506ABC1236304539B"
        );
        assert_eq!(payload.crc(), "539B");
    }

    #[test]
    fn crc_round_trips_over_its_own_payload() {
        let payload = encode_payload(&receiver(), 7.5, "XYZ9").unwrap();
        let text = payload.text();
        let (body, crc) = text.split_at(text.len() - 4);
        assert_eq!(crc16(body), crc);
    }

    #[test]
    fn amount_always_carries_two_decimals() {
        let payload = encode_payload(&receiver(), 15.0, "T1").unwrap();
        assert!(payload.text().contains("540515.00"));
        let payload = encode_payload(&receiver(), 12.5, "T1").unwrap();
        assert!(payload.text().contains("540512.50"));
    }

    #[test]
    fn holder_name_is_sanitised_and_truncated() {
        let accented = PixReceiver {
            pix_holder_name: "João Ñandú".to_string(),
            ..receiver()
        };
        let payload = encode_payload(&accented, 10.0, "T1").unwrap();
        assert!(payload.text().contains("5910Joao Nandu"));

        let long = PixReceiver {
            pix_holder_name: "Estacionamento Central do Centro da Cidade".to_string(),
            ..receiver()
        };
        let payload = encode_payload(&long, 10.0, "T1").unwrap();
        assert!(payload.text().contains("5925Estacionamento Central do"));
    }

    #[test]
    fn city_is_truncated_to_fifteen() {
        let long_city = PixReceiver {
            pix_holder_city: "Sao Jose dos Campos".to_string(),
            ..receiver()
        };
        let payload = encode_payload(&long_city, 10.0, "T1").unwrap();
        assert!(payload.text().contains("6015Sao Jose dos Ca"));
    }

    #[test]
    fn rejects_blank_mandatory_fields() {
        let no_key = PixReceiver {
            pix_key: "  ".to_string(),
            ..receiver()
        };
        assert_eq!(
            encode_payload(&no_key, 10.0, "T1"),
            Err(PixError::EmptyReceiverKey)
        );
        assert_eq!(
            encode_payload(&receiver(), 10.0, ""),
            Err(PixError::EmptyTransactionId)
        );
    }

    #[test]
    fn transaction_id_strips_plate_punctuation() {
        let now = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        assert_eq!(
            transaction_id("ABC-1234", now),
            format!("ABC1234{}", now.timestamp_millis())
        );
    }
}
