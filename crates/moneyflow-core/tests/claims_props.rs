//! Property tests for the claim predicates and identifier checks.

use chrono::{DateTime, Duration, Utc};
use moneyflow_core::{check_id, generate_id, roles, Claims, ErrorKind};
use proptest::prelude::*;

fn subject() -> impl Strategy<Value = String> {
    "[a-z0-9-]{1,24}"
}

fn role_set() -> impl Strategy<Value = Vec<String>> {
    proptest::sample::subsequence(vec![roles::ADMIN, roles::USER, "AUDITOR"], 0..=3)
        .prop_map(|picked| picked.into_iter().map(String::from).collect())
}

fn issued_at() -> impl Strategy<Value = DateTime<Utc>> {
    (1_600_000_000_i64..1_900_000_000).prop_map(|secs| {
        DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    })
}

proptest! {
    #[test]
    fn authorizes_is_role_or_owner(
        sub in subject(),
        owner in subject(),
        granted in role_set(),
    ) {
        let claims = Claims::new(&sub, "moneyflow", granted.clone(), Utc::now(), Duration::hours(1));
        let is_admin = granted.iter().any(|r| r == roles::ADMIN);

        prop_assert_eq!(claims.has_role(roles::ADMIN), is_admin);
        prop_assert_eq!(claims.is_owner(&owner), sub == owner);
        prop_assert_eq!(claims.authorizes(roles::ADMIN, &owner), is_admin || sub == owner);
        prop_assert!(claims.authorizes(roles::ADMIN, &sub));
    }

    #[test]
    fn empty_subject_owns_nothing(owner in "[a-z0-9-]{0,24}") {
        let claims = Claims::new("", "moneyflow", [roles::USER], Utc::now(), Duration::hours(1));
        prop_assert!(!claims.is_owner(&owner));
    }

    #[test]
    fn validity_ends_at_expiry(
        sub in subject(),
        start in issued_at(),
        ttl in 1_i64..86_400,
        elapsed in 0_i64..172_800,
    ) {
        let claims = Claims::new(&sub, "moneyflow", [roles::USER], start, Duration::seconds(ttl));
        let now = start + Duration::seconds(elapsed);
        prop_assert_eq!(claims.validate(now).is_ok(), elapsed < ttl);
    }

    #[test]
    fn claims_survive_json(sub in subject(), granted in role_set(), start in issued_at()) {
        let claims = Claims::new(&sub, "moneyflow", granted, start, Duration::minutes(5));
        let json = serde_json::to_string(&claims).unwrap();
        let back: Claims = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, claims);
    }

    #[test]
    fn non_uuid_ids_are_invalid(id in "[g-z]{1,36}") {
        let err = check_id(&id).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidId);
    }
}

#[test]
fn generated_ids_pass_check_id() {
    for _ in 0..32 {
        assert!(check_id(&generate_id()).is_ok());
    }
}
