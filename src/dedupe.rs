use std::collections::HashMap;

use crate::event::EventRecord;

/// Strips a trailing occurrence stamp (`_YYYYMMDD` or `_YYYYMMDDTHHMMSS`) from `uid`.
pub fn base_uid(uid: &str) -> &str {
    fn all_digits(bytes: &[u8]) -> bool {
        bytes.iter().all(u8::is_ascii_digit)
    }

    let (prefix, stamp) = match uid.rfind('_') {
        Some(index) => (&uid[..index], uid[index + 1..].as_bytes()),
        None => return uid,
    };

    let is_stamp = match stamp.len() {
        8 => all_digits(stamp),
        15 => all_digits(&stamp[..8]) && stamp[8] == b'T' && all_digits(&stamp[9..]),
        _ => false,
    };

    if is_stamp {
        prefix
    } else {
        uid
    }
}

/// Keeps one event per base uid: the last one supplied. Groups are emitted in
/// the order their base uid was first seen.
pub fn dedupe(events: Vec<EventRecord>) -> Vec<EventRecord> {
    let mut order: Vec<EventRecord> = Vec::with_capacity(events.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for event in events {
        let base = base_uid(&event.uid).to_string();
        match positions.get(&base) {
            Some(&index) => {
                tracing::debug!(
                    base_uid = %base,
                    replaced = %order[index].uid,
                    by = %event.uid,
                    "Dropping duplicate event"
                );
                order[index] = event;
            }
            None => {
                positions.insert(base, order.len());
                order.push(event);
            }
        }
    }

    order
}
