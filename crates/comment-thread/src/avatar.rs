const AVATAR_BASE: &str = "https://xsgames.co/randomusers/assets/avatars";
const AVATARS_PER_SET: u64 = 79;

/// Maps a display name to a stable avatar URL.
///
/// The name is hashed over its UTF-16 code units with the classic `h * 31 + c` string hash in
/// wrapping 32-bit arithmetic; the parity of the hash picks the avatar set and the remainder
/// picks the picture, so the same name always yields the same URL.
pub fn avatar_url(name: &str) -> String {
    let hash = name_hash(name);
    let magnitude = i64::from(hash).unsigned_abs();
    let set = if magnitude % 2 == 0 { "male" } else { "female" };
    let index = magnitude % AVATARS_PER_SET;
    format!("{AVATAR_BASE}/{set}/{index}.jpg")
}

fn name_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}
