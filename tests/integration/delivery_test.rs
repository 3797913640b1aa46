//! Integration tests for audience resolution and alert sends.

use alerthub_entity::alert::AudienceScope;
use alerthub_entity::user::User;
use alerthub_service::{SendAlertResult, SendReason};

use crate::helpers::TestApp;

fn usernames(users: &[User]) -> Vec<&str> {
    let mut names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_organization_scope_ignores_teams_and_other_orgs() {
    let app = TestApp::new();
    let platform = app.create_team("Platform", "acme").await;
    app.create_user("u1", "acme", Some(&platform)).await;
    app.create_user("u2", "acme", None).await;
    app.create_user("u3", "globex", None).await;
    let mut inactive = app.create_user("u4", "acme", None).await;
    inactive.is_active = false;
    app.store.put_user(inactive).await;

    let alert = app
        .create_alert(AudienceScope::Organization {
            organization: "acme".to_string(),
        })
        .await;

    let audience = app.resolver().resolve(&alert).await.unwrap();
    assert_eq!(usernames(&audience), vec!["u1", "u2"]);
}

#[tokio::test]
async fn test_team_audience_is_a_snapshot() {
    let app = TestApp::new();
    let platform = app.create_team("Platform", "acme").await;
    let design = app.create_team("Design", "acme").await;
    let member = app.create_user("u1", "acme", Some(&platform)).await;
    app.create_user("u2", "acme", Some(&design)).await;

    let alert = app
        .create_alert(AudienceScope::Team {
            team_ids: vec![platform.id],
        })
        .await;
    let audience = app.resolver().resolve(&alert).await.unwrap();
    assert_eq!(usernames(&audience), vec!["u1"]);

    let mut moved = member.clone();
    moved.team_id = Some(design.id);
    app.store.put_user(moved).await;

    assert_eq!(usernames(&audience), vec!["u1"]);
    assert!(app.resolver().resolve(&alert).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_first_send_then_immediate_reminder() {
    let app = TestApp::new();
    let u1 = app.create_user("u1", "acme", None).await;
    let u2 = app.create_user("u2", "acme", None).await;
    let u3 = app.create_user("u3", "globex", None).await;
    let alert = app
        .create_alert(AudienceScope::Organization {
            organization: "acme".to_string(),
        })
        .await;
    let orchestrator = &app.engine.orchestrator;

    let result = orchestrator.send_alert(alert.id, false).await.unwrap();
    let report = result.report().expect("alert should be delivered");
    assert_eq!((report.total, report.sent, report.failed), (2, 2, 0));

    let records = app.store.deliveries().await;
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.user_id != u3.id));
    assert!(records.iter().any(|r| r.user_id == u1.id));
    assert!(records.iter().any(|r| r.user_id == u2.id));

    app.clock.advance(chrono::Duration::seconds(30));
    let result = orchestrator.send_alert(alert.id, true).await.unwrap();
    let SendAlertResult::Delivered(report) = result else {
        panic!("expected a delivered report, got {result:?}");
    };
    assert_eq!(report.total, 2);
    assert_eq!((report.sent, report.failed, report.snoozed), (0, 0, 0));
    assert!(
        report
            .details
            .iter()
            .all(|d| d.reason == Some(SendReason::TooSoon))
    );
    assert_eq!(app.store.deliveries().await.len(), 2);
}

#[tokio::test]
async fn test_snoozed_user_gets_no_record() {
    let app = TestApp::new();
    let user = app.create_user("u1", "acme", None).await;
    let alert = app
        .create_alert(AudienceScope::User {
            user_ids: vec![user.id],
        })
        .await;

    app.engine
        .preferences
        .snooze_until_end_of_day(user.id, alert.id)
        .await
        .unwrap();

    let outcome = app.engine.orchestrator.send_to_user(&alert, &user, true).await;
    assert!(!outcome.success);
    assert_eq!(outcome.reason, Some(SendReason::Snoozed));
    assert_eq!(outcome.reason.map(|r| r.as_str()), Some("snoozed"));
    assert!(app.store.deliveries().await.is_empty());
}

#[tokio::test]
async fn test_read_cascades_into_stats() {
    let app = TestApp::new();
    let u1 = app.create_user("u1", "acme", None).await;
    app.create_user("u2", "acme", None).await;
    let alert = app
        .create_alert(AudienceScope::Organization {
            organization: "acme".to_string(),
        })
        .await;

    app.engine.alerts.trigger_alert(alert.id).await.unwrap();
    app.engine.inbox.mark_read(u1.id, alert.id).await.unwrap();

    let stats = app.engine.alerts.alert_stats(alert.id).await.unwrap();
    assert_eq!(stats.total_deliveries, 2);
    assert_eq!(stats.read_count, 1);
    assert_eq!(stats.read_rate, 50.0);
}
