//! A user's full lifecycle through the business core.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use moneyflow_business::{BusinessError, NewUser, UpdateUser, UserCore};
use moneyflow_core::roles;
use moneyflow_store::MemoryDb;

#[tokio::test]
async fn test_user_lifecycle() {
    let core = UserCore::new(Arc::new(MemoryDb::new()));
    let now = Utc.with_ymd_and_hms(2018, 10, 1, 0, 0, 0).unwrap();

    let created = core
        .create(
            NewUser {
                name: "Kubanychbek Esenzhanov".into(),
                email: "gloompi@example.com".into(),
                roles: vec![roles::ADMIN.into()],
                password: "gophers".into(),
                password_confirm: "gophers".into(),
            },
            now,
        )
        .await
        .unwrap();

    let saved = core.query_by_id(&created.id).await.unwrap();
    assert_eq!(saved, created);

    core.update(
        &created.id,
        UpdateUser {
            name: Some("Jacob Walker".into()),
            email: Some("jacob@example.com".into()),
            ..UpdateUser::default()
        },
        now,
    )
    .await
    .unwrap();

    let by_email = core.query_by_email("jacob@example.com").await.unwrap();
    assert_eq!(
        core.authenticate("jacob@example.com", "gophers").await.unwrap().id,
        created.id
    );
    assert_eq!(by_email.id, created.id);
    assert_eq!(by_email.name, "Jacob Walker");
    assert_eq!(by_email.roles, vec![roles::ADMIN.to_string()]);

    core.delete(&created.id).await.unwrap();
    assert!(matches!(
        core.query_by_id(&created.id).await,
        Err(BusinessError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_invalid_input_never_reaches_the_store() {
    let db = MemoryDb::new();
    let core = UserCore::new(Arc::new(db.clone()));

    let err = core
        .create(
            NewUser {
                name: String::new(),
                email: "nope".into(),
                roles: vec!["SUPERUSER".into()],
                password: "gophers".into(),
                password_confirm: "gophers".into(),
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    let fields = match err {
        BusinessError::Validation(fields) => fields,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert_eq!(fields.len(), 3);
    assert_eq!(db.stats().begun, 0);
}
