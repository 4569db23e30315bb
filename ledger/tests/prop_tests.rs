use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use meetpoll_crypto::{CredentialHasher, CredentialParams};
use meetpoll_ledger::{NewSession, PollError, PollService};
use meetpoll_nullables::{NullClock, NullStore, SequentialIds};
use meetpoll_store::{PollStore, ReadTxn};
use meetpoll_types::{SessionId, TimeslotId, VoteItem};

const SLOTS: usize = 6;

/// A session `s1` with slots `t1..=t6`, plus a second session `s2` whose
/// single slot is `t7`.
fn service() -> PollService<NullStore> {
    let service = PollService::new(
        Arc::new(NullStore::new()),
        CredentialHasher::new(CredentialParams::insecure_fast()).unwrap(),
        Arc::new(NullClock::at_new_year()),
        Arc::new(SequentialIds::new()),
    );
    let day = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
    service
        .create_session(NewSession {
            title: "Offsite".into(),
            creator_name: "Eli".into(),
            timeslots: (0..SLOTS as u32).map(|h| (day(h), day(h + 1))).collect(),
            ..NewSession::default()
        })
        .unwrap();
    service
        .create_session(NewSession {
            title: "Elsewhere".into(),
            creator_name: "Eli".into(),
            timeslots: vec![(day(0), day(1))],
            ..NewSession::default()
        })
        .unwrap();
    service
}

fn items(slots: &BTreeSet<usize>) -> Vec<VoteItem> {
    slots
        .iter()
        .map(|i| VoteItem::new(format!("t{}", i + 1)))
        .collect()
}

fn ballot(service: &PollService<NullStore>, voter: &str) -> BTreeSet<TimeslotId> {
    service
        .store()
        .read()
        .unwrap()
        .voter_votes(&SessionId::new("s1"), voter)
        .unwrap()
        .into_iter()
        .map(|v| v.timeslot_id)
        .collect()
}

fn slot_set() -> impl Strategy<Value = BTreeSet<usize>> {
    prop::collection::btree_set(0..SLOTS, 1..=SLOTS)
}

proptest! {
    /// A later submission replaces the earlier one; nothing is merged.
    #[test]
    fn resubmission_replaces(first in slot_set(), second in slot_set()) {
        let service = service();
        let s1 = SessionId::new("s1");
        service.submit_vote(&s1, "Ana", None, &items(&first)).unwrap();
        service.submit_vote(&s1, "Ana", None, &items(&second)).unwrap();

        let expected: BTreeSet<TimeslotId> = items(&second)
            .into_iter()
            .map(|i| i.timeslot_id)
            .collect();
        prop_assert_eq!(ballot(&service, "Ana"), expected);
    }

    /// One bad item anywhere in a batch leaves the previous ballot intact.
    #[test]
    fn bad_item_changes_nothing(
        before in slot_set(),
        attempt in slot_set(),
        bad_at in 0usize..=SLOTS,
        foreign in any::<bool>(),
    ) {
        let service = service();
        let s1 = SessionId::new("s1");
        service.submit_vote(&s1, "Ana", Some("pw"), &items(&before)).unwrap();
        let snapshot = ballot(&service, "Ana");

        let mut batch = items(&attempt);
        let bad = if foreign { "t7" } else { "missing" };
        batch.insert(bad_at.min(batch.len()), VoteItem::new(bad));

        let err = service.submit_vote(&s1, "Ana", Some("pw"), &batch).unwrap_err();
        prop_assert!(matches!(err, PollError::InvalidTimeslotReference(_)), "{err:?}");
        prop_assert_eq!(ballot(&service, "Ana"), snapshot);
    }
}
