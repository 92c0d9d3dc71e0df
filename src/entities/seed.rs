//! Sample data for demo stores.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::entities::model::{NewContact, NewTask, SessionDetails};

const FIRST_NAMES: &[&str] = &["Ada", "Grace", "Linus", "Barbara", "Ken", "Margaret", "Dennis"];
const LAST_NAMES: &[&str] = &["Lovelace", "Hopper", "Torvalds", "Liskov", "Thompson", "Hamilton"];
const TOPICS: &[&str] = &["ownership", "async runtimes", "error handling", "macros", "FFI"];

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or("sample")
}

/// `from` moved forward by `hours`, or `from` itself when that is out of range.
fn hours_after(from: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    Duration::try_hours(hours)
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(from)
}

/// Generate `count` contacts owned by `owner`.
#[must_use]
pub fn contacts(count: usize, owner: &str) -> Vec<NewContact> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let first = pick(&mut rng, FIRST_NAMES);
            let last = pick(&mut rng, LAST_NAMES);
            NewContact {
                name: format!("{first} {last}"),
                email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
                phone_number: format!("555-{:04}", rng.gen_range(0..10_000)),
                contact_created_by: owner.to_string(),
            }
        })
        .collect()
}

/// Generate `count` one-hour sessions for `speaker`, starting at `from`.
#[must_use]
pub fn sessions(count: usize, speaker: &str, from: DateTime<Utc>) -> Vec<SessionDetails> {
    let mut rng = rand::thread_rng();
    let speaker_email = if speaker.contains('@') {
        speaker.to_string()
    } else {
        format!("{}@example.com", speaker.to_lowercase().replace(' ', "."))
    };
    (0..count)
        .map(|i| {
            let start = hours_after(from, i64::try_from(i).unwrap_or(i64::MAX));
            SessionDetails {
                name: format!("Session Number: {i}"),
                description: Some(format!("A deep dive into {}", pick(&mut rng, TOPICS))),
                start,
                end: hours_after(start, 1),
                location: Some(format!("Conference Room: {i}")),
                speaker: speaker.to_string(),
                speaker_email: speaker_email.clone(),
            }
        })
        .collect()
}

/// Generate `count` open tasks created by `owner`, due within the next week.
#[must_use]
pub fn tasks(count: usize, owner: &str, from: DateTime<Utc>) -> Vec<NewTask> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| NewTask {
            task_name: format!("Task {i}: review {}", pick(&mut rng, TOPICS)),
            task_created_by: owner.to_string(),
            task_due_date: hours_after(from, rng.gen_range(1..=168)),
            task_assigned_to: format!("{}@example.com", pick(&mut rng, FIRST_NAMES).to_lowercase()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::model::{Contact, Entity, Session, Task};

    #[test]
    fn test_seed_data_passes_boundary_validation() {
        let now = Utc::now();
        assert!(contacts(10, "u1").iter().all(|d| Contact::validate_draft(d).is_ok()));
        assert!(sessions(10, "Will Velida", now).iter().all(|d| Session::validate_draft(d).is_ok()));
        assert!(tasks(10, "u1", now).iter().all(|d| Task::validate_draft(d).is_ok()));
    }

    #[test]
    fn test_seed_counts_and_owner() {
        let drafts = contacts(4, "owner@example.com");
        assert_eq!(drafts.len(), 4);
        assert!(drafts.iter().all(|d| d.contact_created_by == "owner@example.com"));
        assert!(contacts(0, "u1").is_empty());
    }

    #[test]
    fn test_seed_times_never_overflow() {
        let edge = DateTime::<Utc>::MAX_UTC;
        let late = sessions(3, "u1", edge);
        assert_eq!(late.len(), 3);
        assert!(late.iter().all(|d| d.start == edge && d.end == edge));
        assert!(tasks(2, "u1", edge).iter().all(|d| d.task_due_date == edge));

        assert_eq!(hours_after(edge, i64::MAX), edge);
        let now = Utc::now();
        assert_eq!(hours_after(now, i64::MAX), now);
        assert_eq!(hours_after(now, 2), now + Duration::hours(2));
    }
}
