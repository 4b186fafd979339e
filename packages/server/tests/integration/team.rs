use serde_json::json;

use crate::common::{TestApp, instructor_token, participant_token, routes};

#[tokio::test]
async fn register_team_resolves_email_members() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Emails", json!({})).await;

    let res = app
        .post_with_token(
            &routes::teams(hid),
            &json!({
                "team_name": "Rustaceans",
                "member_emails": ["a@x.com", "b@y.com"],
            }),
            &student,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["status"], "not_started");
    assert_eq!(res.body["team_leader"], "a@x.com");

    let names: Vec<&str> = res.body["members"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["display_name"].as_str())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn register_team_resolves_identity_references() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Identities", json!({})).await;

    let ada = app
        .create_user("ada", Some("Ada Lovelace"), Some("ada@calc.org"))
        .await;
    let charles = app.create_user("charles", None, Some("charles@calc.org")).await;

    let res = app
        .post_with_token(
            &routes::teams(hid),
            &json!({
                "team_name": "Engines",
                // Unknown id and a legacy email token mixed in with real ids.
                "member_ids": [ada, charles, 999999, "ghost@nowhere.dev"],
                // Ignored: ids take precedence.
                "member_emails": ["ignored@x.com"],
            }),
            &student,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    let names: Vec<&str> = res.body["members"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["display_name"].as_str())
        .collect();
    assert_eq!(names, vec!["Ada Lovelace", "charles", "—", "ghost"]);
}

#[tokio::test]
async fn duplicate_team_name_is_conflict_case_insensitively() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Names", json!({})).await;

    app.register_team(hid, &student, "Night Owls", &["a@x.com"]).await;

    let res = app
        .post_with_token(
            &routes::teams(hid),
            &json!({"team_name": "NIGHT owls", "member_emails": ["b@y.com"]}),
            &student,
        )
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "CONFLICT");
}

#[tokio::test]
async fn concurrent_registrations_of_same_name_admit_exactly_one() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Race", json!({})).await;

    // Both requests can pass the pre-insert lookup; the unique index on
    // (hackathon_id, lower(team_name)) lets only one insert land.
    let body_a = json!({"team_name": "Photon", "member_emails": ["a@x.com"]});
    let body_b = json!({"team_name": "photon", "member_emails": ["b@y.com"]});
    let route = routes::teams(hid);
    let (res_a, res_b) = tokio::join!(
        app.post_with_token(&route, &body_a, &student),
        app.post_with_token(&route, &body_b, &student),
    );

    let mut statuses = [res_a.status, res_b.status];
    statuses.sort();
    assert_eq!(statuses, [201, 409], "{} / {}", res_a.text, res_b.text);
    for res in [&res_a, &res_b] {
        if res.status == 409 {
            assert_eq!(res.error_code(), "CONFLICT");
        }
    }
}

#[tokio::test]
async fn team_size_bounds_are_enforced() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app
        .create_hackathon(&instructor, "Sized", json!({"min_team_size": 2, "max_team_size": 3}))
        .await;

    let res = app
        .post_with_token(
            &routes::teams(hid),
            &json!({"team_name": "Solo", "member_emails": ["a@x.com"]}),
            &student,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");

    let res = app
        .post_with_token(
            &routes::teams(hid),
            &json!({
                "team_name": "Crowd",
                "member_emails": ["a@x.com", "b@x.com", "c@x.com", "d@x.com"],
            }),
            &student,
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn closed_registration_is_conflict() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Closing", json!({})).await;

    let res = app
        .patch_with_token(
            &routes::hackathon(hid),
            &json!({"accepting_submissions": false}),
            &instructor,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .post_with_token(
            &routes::teams(hid),
            &json!({"team_name": "Late", "member_emails": ["a@x.com"]}),
            &student,
        )
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "CONFLICT");
}

#[tokio::test]
async fn cancelled_hackathon_rejects_registration() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Cancelled", json!({})).await;
    app.patch_with_token(&routes::hackathon(hid), &json!({"status": "cancelled"}), &instructor)
        .await;

    let res = app
        .post_with_token(
            &routes::teams(hid),
            &json!({"team_name": "Too late", "member_emails": ["a@x.com"]}),
            &student,
        )
        .await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn update_team_before_submission() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Editable", json!({})).await;
    let tid = app.register_team(hid, &student, "Editors", &["a@x.com"]).await;

    let res = app
        .patch_with_token(
            &routes::team(hid, tid),
            &json!({
                "problem_statement": "We build a parser",
                "member_emails": ["a@x.com", "b@y.com"],
                "team_leader": "b@y.com",
            }),
            &student,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["problem_statement"], "We build a parser");
    assert_eq!(res.body["team_leader"], "b@y.com");
    assert_eq!(res.body["members"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_team_after_submission_is_conflict() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Frozen", json!({})).await;
    let tid = app.register_team(hid, &student, "Frozen team", &["a@x.com"]).await;
    app.submit_for_team(hid, tid, &student).await;

    let res = app
        .patch_with_token(
            &routes::team(hid, tid),
            &json!({"problem_statement": "Changed my mind"}),
            &student,
        )
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "CONFLICT");
}

#[tokio::test]
async fn membership_patch_revalidates_size_bounds() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app
        .create_hackathon(&instructor, "Tight", json!({"min_team_size": 1, "max_team_size": 2}))
        .await;
    let tid = app.register_team(hid, &student, "Growing", &["a@x.com"]).await;

    let res = app
        .patch_with_token(
            &routes::team(hid, tid),
            &json!({"member_emails": ["a@x.com", "b@y.com", "c@z.com"]}),
            &student,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn team_of_wrong_hackathon_is_404() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let first = app.create_hackathon(&instructor, "First", json!({})).await;
    let second = app.create_hackathon(&instructor, "Second", json!({})).await;
    let tid = app.register_team(first, &student, "Misfiled", &["a@x.com"]).await;

    let res = app
        .patch_with_token(&routes::team(second, tid), &json!({"team_name": "Nope"}), &student)
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn participant_limit_is_enforced() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app
        .create_hackathon(&instructor, "Capped", json!({"max_participants": 3}))
        .await;

    app.register_team(hid, &student, "Pair", &["a@x.com", "b@y.com"]).await;

    let res = app
        .post_with_token(
            &routes::teams(hid),
            &json!({"team_name": "Overflow", "member_emails": ["c@z.com", "d@w.com"]}),
            &student,
        )
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "CONFLICT");
}
