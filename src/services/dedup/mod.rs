//! Duplicate removal at three levels: identical rows of one fetch,
//! occurrences of one recurring series, and equivalent entries across
//! providers in the merged list.

use std::collections::HashMap;

use crate::models::entry::WidgetEntry;
use crate::models::event::EventRecord;
use crate::utils::date::Clock;

/// Append `event` unless an equal record is already collected.
pub fn push_unique(events: &mut Vec<EventRecord>, event: EventRecord) -> bool {
    if events.contains(&event) {
        return false;
    }
    events.push(event);
    true
}

/// Keep only the occurrence of each series nearest to now.
///
/// Distance is whole minutes between now and the occurrence's closest time;
/// on a tie the occurrence seen first stays.
pub fn collapse_to_closest_instance(events: &mut Vec<EventRecord>, clock: &Clock) {
    let distance = |event: &EventRecord| clock.minutes_to(event.closest_time(clock.now())).abs();

    let mut closest: HashMap<i64, usize> = HashMap::new();
    let mut keep = vec![true; events.len()];

    for (index, event) in events.iter().enumerate() {
        match closest.get(&event.event_id).copied() {
            None => {
                closest.insert(event.event_id, index);
            }
            Some(other) if distance(event) < distance(&events[other]) => {
                keep[other] = false;
                closest.insert(event.event_id, index);
            }
            Some(_) => keep[index] = false,
        }
    }

    let before = events.len();
    let mut flags = keep.into_iter();
    events.retain(|_| flags.next().unwrap_or(true));
    if events.len() != before {
        log::debug!(
            "Collapsed {} recurring occurrences to the closest instance",
            before - events.len()
        );
    }
}

/// Drop every entry equivalent to an earlier one in list order.
pub fn filter_out_duplicates(entries: Vec<WidgetEntry>) -> Vec<WidgetEntry> {
    let mut hidden = vec![false; entries.len()];

    for first in 0..entries.len() {
        if hidden[first] {
            continue;
        }
        for second in first + 1..entries.len() {
            if !hidden[second] && entries[first].duplicates(&entries[second]) {
                hidden[second] = true;
            }
        }
    }

    entries
        .into_iter()
        .zip(hidden)
        .filter_map(|(entry, hidden)| (!hidden).then_some(entry))
        .collect()
}
