//! Integration tests for snooze and reminder cadence rules.

use chrono::{Duration, TimeZone, Utc};

use alerthub_entity::alert::AudienceScope;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_snooze_lapses_next_day() {
    let app = TestApp::new();
    let user = app.create_user("u1", "acme", None).await;
    let alert = app
        .create_alert(AudienceScope::User {
            user_ids: vec![user.id],
        })
        .await;
    let preferences = &app.engine.preferences;

    let pref = preferences
        .snooze_until_end_of_day(user.id, alert.id)
        .await
        .unwrap();
    assert!(preferences.is_snoozed_now(&pref));

    app.clock.set(Utc.with_ymd_and_hms(2026, 5, 12, 0, 0, 0).unwrap());
    let pref = preferences.find(user.id, alert.id).await.unwrap().unwrap();
    assert!(!preferences.is_snoozed_now(&pref));

    let listed = app.engine.inbox.snoozed_alerts(user.id).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_snooze_boundary_is_exclusive() {
    let app = TestApp::new();
    let user = app.create_user("u1", "acme", None).await;
    let alert = app
        .create_alert(AudienceScope::User {
            user_ids: vec![user.id],
        })
        .await;
    let preferences = &app.engine.preferences;

    let pref = preferences
        .snooze_until_end_of_day(user.id, alert.id)
        .await
        .unwrap();
    let until = pref.snooze_until.unwrap();

    app.clock.set(until);
    assert!(!preferences.is_snoozed_now(&pref));
    app.clock.set(until - Duration::microseconds(1));
    assert!(preferences.is_snoozed_now(&pref));
}

#[tokio::test]
async fn test_reminder_cadence_boundary() {
    let app = TestApp::new();
    let user = app.create_user("u1", "acme", None).await;
    let alert = app
        .create_alert(AudienceScope::User {
            user_ids: vec![user.id],
        })
        .await;
    let preferences = &app.engine.preferences;

    let pref = preferences.get_or_create(user.id, alert.id).await.unwrap();
    assert!(preferences.should_receive_reminder(&pref, alert.reminder_frequency()));

    let pref = preferences.record_send(user.id, alert.id).await.unwrap();
    app.clock.advance(Duration::hours(2) - Duration::seconds(1));
    assert!(!preferences.should_receive_reminder(&pref, alert.reminder_frequency()));

    app.clock.advance(Duration::seconds(1));
    assert!(preferences.should_receive_reminder(&pref, alert.reminder_frequency()));
}
