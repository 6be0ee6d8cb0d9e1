//! Collision-resistant identifiers for audit rows and record sets.
//!
//! The 25-character layout: literal `c`, base-36 millisecond timestamp
//! padded to 8, base-36 counter padded to 4 (wrapping modulo 36⁴), 2-char
//! host fingerprint, 2-char pid fingerprint, two 4-char hex random blocks.

use parking_lot::Mutex;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

const COUNTER_MODULO: u64 = 36 * 36 * 36 * 36;
const CUID_LEN: usize = 25;

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let digits = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    while value > 0 {
        out.push(digits[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Left-pads with `0` to `width`, keeping the rightmost characters when the
/// input is longer.
fn pad36(value: &str, width: usize) -> String {
    if value.len() >= width {
        value[value.len() - width..].to_string()
    } else {
        let mut out = "0".repeat(width - value.len());
        out.push_str(value);
        out
    }
}

/// Generates cuid-format identifiers.
///
/// One generator per process is enough; the counter is shared and the
/// fingerprint is derived from the node name and pid at construction.
pub struct CuidGenerator {
    fingerprint: String,
    counter: Mutex<u64>,
}

impl CuidGenerator {
    /// Creates a generator fingerprinted with the given node name and the
    /// current process id.
    pub fn new(node: &str) -> Self {
        Self::with_pid(node, std::process::id())
    }

    /// Creates a generator with an explicit pid (deterministic tests).
    pub fn with_pid(node: &str, pid: u32) -> Self {
        let host_value =
            36 + node.len() as u64 + node.bytes().map(u64::from).sum::<u64>();
        let host_block = pad36(&to_base36(host_value % COUNTER_MODULO), 2);
        let pid_block = pad36(&to_base36(u64::from(pid)), 2);
        CuidGenerator {
            fingerprint: format!("{host_block}{pid_block}"),
            counter: Mutex::new(0),
        }
    }

    /// Produces the next identifier.
    pub fn next_id(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let count = {
            let mut counter = self.counter.lock();
            let current = *counter;
            *counter = (*counter + 1) % COUNTER_MODULO;
            current
        };

        let mut rng = rand::thread_rng();
        let rand_block_1: u16 = rng.gen();
        let rand_block_2: u16 = rng.gen();

        format!(
            "c{}{}{}{:04x}{:04x}",
            pad36(&to_base36(millis), 8),
            pad36(&to_base36(count), 4),
            self.fingerprint,
            rand_block_1,
            rand_block_2
        )
    }
}

impl std::fmt::Debug for CuidGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CuidGenerator")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Checks the shape of a generated identifier.
pub fn is_valid_cuid(value: &str) -> bool {
    value.len() == CUID_LEN
        && value.starts_with('c')
        && value.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn base36_digits() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn padding_keeps_rightmost() {
        assert_eq!(pad36("abc", 2), "bc");
        assert_eq!(pad36("a", 4), "000a");
    }

    #[test]
    fn generated_ids_have_the_layout() {
        let generator = CuidGenerator::with_pid("node-1", 4242);
        let id = generator.next_id();
        assert!(is_valid_cuid(&id), "bad cuid: {id}");
    }

    #[test]
    fn generated_ids_are_distinct() {
        let generator = CuidGenerator::with_pid("node-1", 4242);
        let ids: HashSet<String> = (0..500).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn counter_wraps() {
        let generator = CuidGenerator::with_pid("n", 1);
        *generator.counter.lock() = COUNTER_MODULO - 1;
        let id = generator.next_id();
        assert!(is_valid_cuid(&id));
        assert_eq!(*generator.counter.lock(), 0);
    }
}
