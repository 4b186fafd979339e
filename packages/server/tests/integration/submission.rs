use serde_json::json;

use crate::common::{TestApp, instructor_token, participant_token, routes};

#[tokio::test]
async fn start_work_moves_team_to_in_progress() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Working", json!({})).await;
    let tid = app.register_team(hid, &student, "Starters", &["a@x.com"]).await;

    let res = app
        .post_with_token(&routes::team_start(hid, tid), &json!({}), &student)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "in_progress");

    // Calling again is a no-op success.
    let res = app
        .post_with_token(&routes::team_start(hid, tid), &json!({}), &student)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "in_progress");
}

#[tokio::test]
async fn start_work_after_submission_is_rejected() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "No going back", json!({})).await;
    let tid = app.register_team(hid, &student, "Done", &["a@x.com"]).await;
    app.submit_for_team(hid, tid, &student).await;

    let res = app
        .post_with_token(&routes::team_start(hid, tid), &json!({}), &student)
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "INVALID_STATE");
}

#[tokio::test]
async fn submit_records_all_channels() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Channels", json!({})).await;
    let tid = app.register_team(hid, &student, "Multi", &["a@x.com"]).await;

    let res = app
        .post_with_token(
            &routes::team_submit(hid, tid),
            &json!({
                "submission_text": "We built a thing.",
                "submission_link": "https://github.com/team/thing",
                "files": [
                    {"file_name": "report.pdf", "file_url": "https://files.example.com/report.pdf"},
                ],
            }),
            &student,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "submitted");
    assert_eq!(res.body["submission_text"], "We built a thing.");
    assert_eq!(res.body["submission_link"], "https://github.com/team/thing");
    assert!(res.body["submitted_at"].is_string());
    let files = res.body["submitted_files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["file_name"], "report.pdf");
    assert_eq!(files[0]["uploaded_by"], "student");
}

#[tokio::test]
async fn empty_submission_is_rejected() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Empty", json!({})).await;
    let tid = app.register_team(hid, &student, "Silent", &["a@x.com"]).await;

    let res = app
        .post_with_token(&routes::team_submit(hid, tid), &json!({}), &student)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn unsupported_file_type_rejects_whole_submission() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app
        .create_hackathon(&instructor, "Strict types", json!({"allowed_file_types": ["pdf", "zip"]}))
        .await;
    let tid = app.register_team(hid, &student, "Sneaky", &["a@x.com"]).await;
    app.post_with_token(&routes::team_start(hid, tid), &json!({}), &student)
        .await;

    let res = app
        .post_with_token(
            &routes::team_submit(hid, tid),
            &json!({
                "files": [
                    {"file_name": "report.pdf", "file_url": "https://files.example.com/report.pdf"},
                    {"file_name": "x.exe", "file_url": "https://files.example.com/x.exe"},
                ],
            }),
            &student,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.error_code(), "UNSUPPORTED_FILE_TYPE");

    // Nothing was recorded: the team is still in progress with no files.
    let got = app.get_with_token(&routes::hackathon(hid), &student).await;
    let team = &got.body["teams"].as_array().unwrap()[0];
    assert_eq!(team["status"], "in_progress");
    assert_eq!(team["submitted_files"].as_array().unwrap().len(), 0);
    assert!(team["submitted_at"].is_null());
}

#[tokio::test]
async fn resubmission_overwrites_previous_content() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Redo", json!({})).await;
    let tid = app.register_team(hid, &student, "Revisers", &["a@x.com"]).await;

    let res = app
        .post_with_token(
            &routes::team_submit(hid, tid),
            &json!({"submission_text": "First draft"}),
            &student,
        )
        .await;
    assert_eq!(res.status, 200);
    let first_submitted_at = res.body["submitted_at"].as_str().unwrap().to_string();

    let res = app
        .post_with_token(
            &routes::team_submit(hid, tid),
            &json!({"submission_link": "https://github.com/team/final"}),
            &student,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "submitted");
    assert_eq!(res.body["submission_link"], "https://github.com/team/final");
    // The text channel was not re-sent, so it is gone.
    assert!(res.body["submission_text"].is_null());
    assert_ne!(res.body["submitted_at"].as_str().unwrap(), first_submitted_at);
}

#[tokio::test]
async fn deadline_blocks_submission_unless_window_kept_open() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Deadline", json!({})).await;
    let tid = app.register_team(hid, &student, "Late", &["a@x.com"]).await;

    // Deadline passes and the instructor closes the window.
    let res = app
        .patch_with_token(
            &routes::hackathon(hid),
            &json!({"deadline": "2020-01-01T00:00:00Z", "accepting_submissions": false}),
            &instructor,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .post_with_token(
            &routes::team_submit(hid, tid),
            &json!({"submission_text": "Too late"}),
            &student,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "DEADLINE_EXCEEDED");

    // Reopening the window permits the late submission.
    app.patch_with_token(
        &routes::hackathon(hid),
        &json!({"accepting_submissions": true}),
        &instructor,
    )
    .await;

    let res = app
        .post_with_token(
            &routes::team_submit(hid, tid),
            &json!({"submission_text": "Grace period"}),
            &student,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn graded_team_cannot_resubmit() {
    let app = TestApp::spawn().await;
    let instructor = instructor_token("teacher");
    let student = participant_token("student");
    let hid = app.create_hackathon(&instructor, "Sealed", json!({})).await;
    let tid = app.register_team(hid, &student, "Graded", &["a@x.com"]).await;
    app.submit_for_team(hid, tid, &student).await;

    let res = app
        .post_with_token(
            &routes::team_grade(hid, tid),
            &json!({"score": 80, "feedback": "Good"}),
            &instructor,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .post_with_token(
            &routes::team_submit(hid, tid),
            &json!({"submission_text": "One more thing"}),
            &student,
        )
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "CONFLICT");

    // The recorded grade is untouched.
    let got = app.get_with_token(&routes::hackathon(hid), &instructor).await;
    let team = &got.body["teams"].as_array().unwrap()[0];
    assert_eq!(team["status"], "graded");
    assert_eq!(team["score"], 80);
}
