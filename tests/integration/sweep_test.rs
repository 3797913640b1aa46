//! Integration tests for the periodic sweeps.

use chrono::Duration;
use uuid::Uuid;

use alerthub_entity::alert::AudienceScope;
use alerthub_entity::preference::DeliveryPreference;
use alerthub_worker::{GuardedSweep, SweepEntryOutcome, SweepOutcome};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_reset_clears_only_expired_snoozes() {
    let app = TestApp::new();
    let alert_id = Uuid::new_v4();
    let offsets = [Duration::hours(-5), Duration::minutes(-1), Duration::hours(3)];
    for offset in offsets {
        let mut pref = DeliveryPreference::new(Uuid::new_v4(), alert_id, app.now());
        pref.snooze(app.now() + offset, app.now() - Duration::hours(6));
        app.store.put_preference(pref).await;
    }

    let (_, snooze_reset) = app.sweeps();
    assert_eq!(snooze_reset.reset_expired_snoozes().await.unwrap(), 2);

    let prefs = app.store.preferences().await;
    let still_snoozed: Vec<_> = prefs.iter().filter(|p| p.is_snoozed).collect();
    assert_eq!(still_snoozed.len(), 1);
    assert!(still_snoozed[0].snooze_until.unwrap() > app.now());
}

#[tokio::test]
async fn test_reminder_sweep_respects_snooze_and_cadence() {
    let app = TestApp::new();
    let u1 = app.create_user("u1", "acme", None).await;
    app.create_user("u2", "acme", None).await;
    let alert = app
        .create_alert(AudienceScope::Organization {
            organization: "acme".to_string(),
        })
        .await;
    app.engine
        .preferences
        .snooze_until_end_of_day(u1.id, alert.id)
        .await
        .unwrap();

    let (reminders, _) = app.sweeps();
    let sweep = GuardedSweep::new(reminders);

    let outcome = sweep.tick().await.expect("tick should run").unwrap();
    let SweepOutcome::Reminders(report) = outcome else {
        panic!("expected a reminder report");
    };
    assert_eq!(report.entries.len(), 1);
    match &report.entries[0].outcome {
        SweepEntryOutcome::Processed(r) => {
            assert_eq!((r.total, r.sent, r.snoozed, r.failed), (2, 1, 1, 0));
            assert!(r.is_reminder);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let records = app.store.deliveries().await;
    assert_eq!(records.len(), 1);
    assert!(records[0].is_reminder);
}

#[tokio::test]
async fn test_archived_alert_leaves_the_sweep() {
    let app = TestApp::new();
    app.create_user("u1", "acme", None).await;
    let alert = app
        .create_alert(AudienceScope::Organization {
            organization: "acme".to_string(),
        })
        .await;
    app.engine.alerts.archive_alert(alert.id).await.unwrap();

    let (reminders, _) = app.sweeps();
    let report = reminders.process_reminders().await.unwrap();
    assert!(report.entries.is_empty());
    assert!(app.store.deliveries().await.is_empty());
}
