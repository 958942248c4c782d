//! Activity linkage rules, date rules and duration handling.

mod common;

use assert_matches::assert_matches;
use chrono::Duration;

use caseload_core::activities::ActivityStatus;
use caseload_core::error::CoreError;
use caseload_core::types::new_record_id;
use caseload_store::models::activity::{ActivityListParams, CreateActivity, UpdateActivity};

use common::{
    client, completed_activity, date, harness, new_activity, new_goal, stakeholder, time, today,
};

#[tokio::test]
async fn create_defaults_to_scheduled() {
    let h = harness().await;
    let jordan = client(&h, "Jordan Lee").await;
    let riley = stakeholder(&h, "Riley").await;

    let activity = h
        .services
        .activities
        .create_activity(new_activity(&jordan.id, &riley.id, today() + Duration::days(3)))
        .await
        .unwrap();
    assert_eq!(activity.status, ActivityStatus::Scheduled);
    assert_eq!(activity.duration_minutes, None);
}

#[tokio::test]
async fn goals_from_another_client_are_rejected() {
    let h = harness().await;
    let jordan = client(&h, "Jordan Lee").await;
    let sam = client(&h, "Sam Lee").await;
    let riley = stakeholder(&h, "Riley").await;
    let sams_goal = h
        .services
        .goals
        .create_goal(new_goal(&sam.id, "Catch the bus", today() + Duration::days(30)))
        .await
        .unwrap();

    let input = completed_activity(&jordan.id, &riley.id, today(), vec![sams_goal.id.clone()]);
    let err = h.services.activities.create_activity(input).await.unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    let unknown = completed_activity(&jordan.id, &riley.id, today(), vec![new_record_id()]);
    let err = h.services.activities.create_activity(unknown).await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "Goal", .. });
}

#[tokio::test]
async fn references_must_exist_and_be_active() {
    let h = harness().await;
    let jordan = client(&h, "Jordan Lee").await;
    let riley = stakeholder(&h, "Riley").await;

    let err = h
        .services
        .activities
        .create_activity(new_activity(&jordan.id, &new_record_id(), today()))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "Stakeholder", .. });

    let err = h
        .services
        .activities
        .create_activity(new_activity("not-an-id", &riley.id, today()))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("client_id"));

    h.services.stakeholders.deactivate_stakeholder(&riley.id).await.unwrap();
    let err = h
        .services
        .activities
        .create_activity(new_activity(&jordan.id, &riley.id, today()))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));
}

#[tokio::test]
async fn date_rules_depend_on_status() {
    let h = harness().await;
    let jordan = client(&h, "Jordan Lee").await;
    let riley = stakeholder(&h, "Riley").await;
    let tomorrow = today() + Duration::days(1);

    let err = h
        .services
        .activities
        .create_activity(completed_activity(&jordan.id, &riley.id, tomorrow, Vec::new()))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("activity_date"));

    let too_old = today() - Duration::days(366);
    let err = h
        .services
        .activities
        .create_activity(new_activity(&jordan.id, &riley.id, too_old))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("activity_date"));

    h.services
        .activities
        .create_activity(new_activity(&jordan.id, &riley.id, tomorrow))
        .await
        .unwrap();
}

#[tokio::test]
async fn duration_is_derived_or_cross_checked() {
    let h = harness().await;
    let jordan = client(&h, "Jordan Lee").await;
    let riley = stakeholder(&h, "Riley").await;

    let derived = h
        .services
        .activities
        .create_activity(completed_activity(&jordan.id, &riley.id, today(), Vec::new()))
        .await
        .unwrap();
    assert_eq!(derived.duration_minutes, Some(120));

    let within_tolerance = CreateActivity {
        duration_minutes: Some(125),
        ..completed_activity(&jordan.id, &riley.id, today(), Vec::new())
    };
    let activity = h
        .services
        .activities
        .create_activity(within_tolerance)
        .await
        .unwrap();
    assert_eq!(activity.duration_minutes, Some(125));

    let mismatch = CreateActivity {
        duration_minutes: Some(90),
        ..completed_activity(&jordan.id, &riley.id, today(), Vec::new())
    };
    let err = h.services.activities.create_activity(mismatch).await.unwrap_err();
    assert_eq!(err.field(), Some("duration_minutes"));

    let half_open = CreateActivity {
        start_time: Some(time(9, 0)),
        ..new_activity(&jordan.id, &riley.id, today())
    };
    let err = h.services.activities.create_activity(half_open).await.unwrap_err();
    assert_eq!(err.field(), Some("end_time"));
}

#[tokio::test]
async fn update_rechecks_goal_linkage_against_the_new_client() {
    let h = harness().await;
    let jordan = client(&h, "Jordan Lee").await;
    let sam = client(&h, "Sam Lee").await;
    let riley = stakeholder(&h, "Riley").await;
    let goal = h
        .services
        .goals
        .create_goal(new_goal(&jordan.id, "Cook a weekly meal", today() + Duration::days(30)))
        .await
        .unwrap();
    let activity = h
        .services
        .activities
        .create_activity(completed_activity(&jordan.id, &riley.id, today(), vec![goal.id.clone()]))
        .await
        .unwrap();

    let move_client = UpdateActivity {
        client_id: Some(sam.id.clone()),
        ..UpdateActivity::default()
    };
    let err = h
        .services
        .activities
        .update_activity(&activity.id, move_client)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    let move_and_unlink = UpdateActivity {
        client_id: Some(sam.id.clone()),
        goal_ids: Some(Vec::new()),
        ..UpdateActivity::default()
    };
    let moved = h
        .services
        .activities
        .update_activity(&activity.id, move_and_unlink)
        .await
        .unwrap();
    assert_eq!(moved.client_id, sam.id);
    assert!(moved.goal_ids.is_empty());
    assert!(moved.updated_at >= activity.updated_at);
}

#[tokio::test]
async fn update_rederives_duration_from_new_times() {
    let h = harness().await;
    let jordan = client(&h, "Jordan Lee").await;
    let riley = stakeholder(&h, "Riley").await;
    let activity = h
        .services
        .activities
        .create_activity(completed_activity(&jordan.id, &riley.id, today(), Vec::new()))
        .await
        .unwrap();

    let later_end = UpdateActivity {
        end_time: Some(time(12, 30)),
        ..UpdateActivity::default()
    };
    let updated = h
        .services
        .activities
        .update_activity(&activity.id, later_end)
        .await
        .unwrap();
    assert_eq!(updated.duration_minutes, Some(210));

    let to_future = UpdateActivity {
        activity_date: Some(today() + Duration::days(2)),
        ..UpdateActivity::default()
    };
    let err = h
        .services
        .activities
        .update_activity(&activity.id, to_future)
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("activity_date"));
}

#[tokio::test]
async fn get_and_list_join_names_and_filter() {
    let h = harness().await;
    let jordan = client(&h, "Jordan Lee").await;
    let sam = client(&h, "Sam Lee").await;
    let riley = stakeholder(&h, "Riley").await;
    let goal = h
        .services
        .goals
        .create_goal(new_goal(&jordan.id, "Cook a weekly meal", today() + Duration::days(30)))
        .await
        .unwrap();

    let older = h
        .services
        .activities
        .create_activity(completed_activity(&jordan.id, &riley.id, date(2024, 6, 3), vec![goal.id.clone()]))
        .await
        .unwrap();
    let newer = h
        .services
        .activities
        .create_activity(completed_activity(&jordan.id, &riley.id, date(2024, 6, 11), Vec::new()))
        .await
        .unwrap();
    h.services
        .activities
        .create_activity(completed_activity(&sam.id, &riley.id, date(2024, 6, 11), Vec::new()))
        .await
        .unwrap();

    let view = h.services.activities.get_activity(&older.id).await.unwrap();
    assert_eq!(view.client_name.as_deref(), Some("Jordan Lee"));
    assert_eq!(view.stakeholder_name.as_deref(), Some("Riley"));
    assert_eq!(view.goals.len(), 1);
    assert_eq!(view.goals[0].title, "Cook a weekly meal");

    let jordans = h
        .services
        .activities
        .list_activities(ActivityListParams {
            client_id: Some(jordan.id.clone()),
            ..ActivityListParams::default()
        })
        .await
        .unwrap();
    let ids: Vec<_> = jordans.iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids, vec![newer.id.clone(), older.id.clone()]);

    let linked = h
        .services
        .activities
        .list_activities(ActivityListParams {
            goal_id: Some(goal.id.clone()),
            ..ActivityListParams::default()
        })
        .await
        .unwrap();
    assert_eq!(linked.len(), 1);

    let this_week = h
        .services
        .activities
        .list_activities(ActivityListParams {
            date_from: Some(date(2024, 6, 10)),
            date_to: Some(date(2024, 6, 16)),
            ..ActivityListParams::default()
        })
        .await
        .unwrap();
    assert_eq!(this_week.len(), 2);

    let err = h
        .services
        .activities
        .list_activities(ActivityListParams {
            date_from: Some(date(2024, 6, 16)),
            date_to: Some(date(2024, 6, 10)),
            ..ActivityListParams::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("date_from"));
}

#[tokio::test]
async fn whitespace_only_titles_rejected() {
    let h = harness().await;
    let jordan = client(&h, "Jordan Lee").await;
    let riley = stakeholder(&h, "Riley").await;

    let input = CreateActivity {
        title: "   ".into(),
        ..new_activity(&jordan.id, &riley.id, today())
    };
    let err = h.services.activities.create_activity(input).await.unwrap_err();
    assert_eq!(err.field(), Some("title"));

    let activity = h
        .services
        .activities
        .create_activity(new_activity(&jordan.id, &riley.id, today()))
        .await
        .unwrap();
    let blank = UpdateActivity {
        title: Some("\n".into()),
        ..UpdateActivity::default()
    };
    let err = h
        .services
        .activities
        .update_activity(&activity.id, blank)
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("title"));
}
