//! Query repair for text that was decoded as Latin-1 when it was really UTF-8.
//!
//! Clients sometimes send `SÃ³ng giÃ³` instead of `Sóng gió`: the UTF-8 bytes
//! were read one byte per character somewhere along the way. Re-encoding each
//! character as a single byte and decoding the result as UTF-8 undoes that.

/// Lowercase Vietnamese letters carrying a diacritic.
const VIETNAMESE_DIACRITICS: &str =
    "àáạảãâầấậẩẫăằắặẳẵèéẹẻẽêềếệểễìíịỉĩòóọỏõôồốộổỗơờớợởỡùúụủũưừứựửữỳýỵỷỹđ";

/// Repair a double-encoded query, or return it unchanged.
///
/// The repaired form is only accepted when it differs from the input and
/// contains at least one Vietnamese diacritic letter.
pub fn repair_mojibake(input: &str) -> String {
    match reinterpret_latin1(input) {
        Some(decoded) if decoded != input && has_vietnamese_diacritic(&decoded) => {
            tracing::info!(from = %input, to = %decoded, "repaired query encoding");
            decoded
        }
        _ => input.to_string(),
    }
}

/// True when `text` contains a Vietnamese diacritic letter, in either case.
pub fn has_vietnamese_diacritic(text: &str) -> bool {
    text.chars()
        .flat_map(char::to_lowercase)
        .any(|c| VIETNAMESE_DIACRITICS.contains(c))
}

/// Treat every char as one Latin-1 byte and decode the bytes as UTF-8.
/// `None` if a char is outside Latin-1 or the bytes are not valid UTF-8.
fn reinterpret_latin1(input: &str) -> Option<String> {
    let bytes = input
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}
