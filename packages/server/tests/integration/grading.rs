use serde_json::json;

use crate::common::{TestApp, instructor_token, participant_token, routes, token_with_permissions};

#[tokio::test]
async fn grading_requires_permission() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Protected", json!({})).await;
    let tid = app.register_team(hid, &student, "Hopeful", &["a@x.com"]).await;
    app.submit_for_team(hid, tid, &student).await;

    let res = app
        .post_with_token(
            &routes::team_grade(hid, tid),
            &json!({"score": 100, "feedback": "I grade myself"}),
            &student,
        )
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.error_code(), "PERMISSION_DENIED");
}

#[tokio::test]
async fn grade_validates_score_and_feedback_together() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Validated", json!({})).await;
    let tid = app.register_team(hid, &student, "Checked", &["a@x.com"]).await;
    app.submit_for_team(hid, tid, &student).await;

    let res = app
        .post_with_token(
            &routes::team_grade(hid, tid),
            &json!({"score": 101, "feedback": "  "}),
            &instructor,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");
    assert_eq!(res.body["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn grade_records_score_feedback_and_grader() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("prof_ada");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Graded", json!({})).await;
    let tid = app.register_team(hid, &student, "Winners", &["a@x.com"]).await;
    app.submit_for_team(hid, tid, &student).await;

    let res = app
        .post_with_token(
            &routes::team_grade(hid, tid),
            &json!({"score": 87, "feedback": "Clean implementation"}),
            &instructor,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "graded");
    assert_eq!(res.body["score"], 87);
    assert_eq!(res.body["feedback"], "Clean implementation");
    assert_eq!(res.body["graded_by"], "prof_ada");
    assert!(res.body["graded_at"].is_string());
}

#[tokio::test]
async fn grading_an_unsubmitted_team_is_invalid_state() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Premature", json!({})).await;
    let tid = app.register_team(hid, &student, "Not ready", &["a@x.com"]).await;

    let res = app
        .post_with_token(
            &routes::team_grade(hid, tid),
            &json!({"score": 50, "feedback": "Nothing to grade"}),
            &instructor,
        )
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "INVALID_STATE");
}

#[tokio::test]
async fn duplicate_first_grade_loses_and_preserves_the_recorded_score() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Single shot", json!({})).await;
    let tid = app.register_team(hid, &student, "Contested", &["a@x.com"]).await;
    app.submit_for_team(hid, tid, &student).await;

    let res = app
        .post_with_token(
            &routes::team_grade(hid, tid),
            &json!({"score": 87, "feedback": "First grader"}),
            &instructor,
        )
        .await;
    assert_eq!(res.status, 200);

    // A second grader's late attempt is rejected without touching the row.
    let late = token_with_permissions(2, "second_grader", &["hackathon:grade"]);
    let res = app
        .post_with_token(
            &routes::team_grade(hid, tid),
            &json!({"score": 55, "feedback": "Second opinion"}),
            &late,
        )
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "INVALID_STATE");

    let got = app.get_with_token(&routes::hackathon(hid), &instructor).await;
    let team = &got.body["teams"].as_array().unwrap()[0];
    assert_eq!(team["score"], 87);
    assert_eq!(team["feedback"], "First grader");
    assert_eq!(team["graded_by"], "teacher");
}

#[tokio::test]
async fn regrade_overrides_a_recorded_grade() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Appealed", json!({})).await;
    let tid = app.register_team(hid, &student, "Appealers", &["a@x.com"]).await;
    app.submit_for_team(hid, tid, &student).await;

    app.post_with_token(
        &routes::team_grade(hid, tid),
        &json!({"score": 70, "feedback": "Initial pass"}),
        &instructor,
    )
    .await;

    let reviewer = token_with_permissions(3, "head_judge", &["hackathon:grade"]);
    let res = app
        .post_with_token(
            &routes::team_regrade(hid, tid),
            &json!({"score": 91, "feedback": "Appeal accepted"}),
            &reviewer,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "graded");
    assert_eq!(res.body["score"], 91);
    assert_eq!(res.body["graded_by"], "head_judge");
}

#[tokio::test]
async fn regrade_requires_an_existing_grade() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "No grade yet", json!({})).await;
    let tid = app.register_team(hid, &student, "Waiting", &["a@x.com"]).await;
    app.submit_for_team(hid, tid, &student).await;

    let res = app
        .post_with_token(
            &routes::team_regrade(hid, tid),
            &json!({"score": 90, "feedback": "Skipping ahead"}),
            &instructor,
        )
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "INVALID_STATE");
}

#[tokio::test]
async fn concurrent_grading_of_different_teams_does_not_interfere() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Parallel", json!({})).await;
    let alpha = app.register_team(hid, &student, "Alpha", &["a@x.com"]).await;
    let beta = app.register_team(hid, &student, "Beta", &["b@y.com"]).await;
    app.submit_for_team(hid, alpha, &student).await;
    app.submit_for_team(hid, beta, &student).await;

    let route_alpha = routes::team_grade(hid, alpha);
    let route_beta = routes::team_grade(hid, beta);
    let body_alpha = json!({"score": 81, "feedback": "Team alpha feedback"});
    let body_beta = json!({"score": 64, "feedback": "Team beta feedback"});
    let (res_a, res_b) = tokio::join!(
        app.post_with_token(&route_alpha, &body_alpha, &instructor),
        app.post_with_token(&route_beta, &body_beta, &instructor),
    );
    assert_eq!(res_a.status, 200, "{}", res_a.text);
    assert_eq!(res_b.status, 200, "{}", res_b.text);

    let got = app.get_with_token(&routes::hackathon_submissions(hid), &instructor).await;
    assert_eq!(got.body["summary"]["graded"], 2);
    let teams = got.body["teams"].as_array().unwrap();
    let score_of = |name: &str| {
        teams
            .iter()
            .find(|t| t["team_name"] == name)
            .and_then(|t| t["score"].as_i64())
            .unwrap()
    };
    assert_eq!(score_of("Alpha"), 81);
    assert_eq!(score_of("Beta"), 64);
}

#[tokio::test]
async fn submission_report_aggregates_team_state() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Reported", json!({})).await;
    let done = app.register_team(hid, &student, "Done", &["a@x.com"]).await;
    app.register_team(hid, &student, "Idle", &["b@y.com"]).await;
    app.submit_for_team(hid, done, &student).await;
    app.post_with_token(
        &routes::team_grade(hid, done),
        &json!({"score": 75, "feedback": "Fine"}),
        &instructor,
    )
    .await;

    let res = app.get_with_token(&routes::hackathon_submissions(hid), &instructor).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["summary"]["total_teams"], 2);
    assert_eq!(res.body["summary"]["submitted"], 1);
    assert_eq!(res.body["summary"]["graded"], 1);
    assert_eq!(res.body["summary"]["average_score"], 75.0);

    let teams = res.body["teams"].as_array().unwrap();
    let idle = teams.iter().find(|t| t["team_name"] == "Idle").unwrap();
    assert_eq!(idle["status"], "not_started");
    assert!(idle["score"].is_null());
}
