use std::collections::BTreeMap;

use super::*;
use shared::{
    domain::{ContactKind, ContactSubmission},
    error::ApiError,
};

fn filled_form() -> FormController<ContactSubmission> {
    let mut form = FormController::<ContactSubmission>::new();
    *form.draft_mut() = ContactSubmission {
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        subject: "Analytical engine".into(),
        kind: ContactKind::Question,
        message: "Would you like to work on the engine?".into(),
    };
    form
}

#[test]
fn new_form_is_idle_and_enabled() {
    let form = FormController::<ContactSubmission>::new();
    assert_eq!(form.status(), FormStatus::Idle);
    assert!(form.submit_enabled());
    assert_eq!(form.draft().kind, ContactKind::Job);
}

#[test]
fn invalid_draft_is_refused_with_inline_errors() {
    let mut form = filled_form();
    form.draft_mut().email = "bad".into();
    form.draft_mut().message = "short".into();

    let refused = form.begin_submit().expect_err("refused");

    assert!(matches!(refused, SubmitRefused::Invalid(_)));
    assert_eq!(form.status(), FormStatus::Idle);
    assert_eq!(form.field_error("email"), Some("Invalid email"));
    assert!(form.field_error("message").is_some());
    assert!(form.field_error("name").is_none());
}

#[test]
fn second_submit_while_in_flight_is_refused() {
    let mut form = filled_form();
    form.begin_submit().expect("first submit");

    assert_eq!(form.status(), FormStatus::Submitting);
    assert!(!form.submit_enabled());
    assert_eq!(form.begin_submit(), Err(SubmitRefused::InFlight));
}

#[test]
fn accepted_result_resets_draft() {
    let mut form = filled_form();
    form.begin_submit().expect("submit");

    form.finish_submit(&SubmissionResult::Accepted);

    assert_eq!(form.status(), FormStatus::Success);
    assert_eq!(form.draft().name, "");
    assert!(form.field_errors().is_empty());
    assert!(form.submit_enabled());
}

#[test]
fn rejected_result_keeps_draft_and_shows_details() {
    let mut form = filled_form();
    form.begin_submit().expect("submit");
    let mut details = BTreeMap::new();
    details.insert("subject".to_string(), vec!["Required".to_string()]);

    form.finish_submit(&SubmissionResult::Rejected(ApiError::validation(details)));

    assert_eq!(form.status(), FormStatus::Error);
    assert_eq!(form.draft().name, "Ada Lovelace");
    assert_eq!(form.field_error("subject"), Some("Required"));
}

#[test]
fn server_error_keeps_draft_for_retry() {
    let mut form = filled_form();
    form.begin_submit().expect("submit");

    form.finish_submit(&SubmissionResult::ServerError);

    assert_eq!(form.status(), FormStatus::Error);
    assert_eq!(form.draft().email, "ada@example.com");
    assert!(form.begin_submit().is_ok());
}

#[tokio::test]
async fn submit_against_unreachable_server_ends_in_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = IntakeClient::new(&format!("http://{addr}")).expect("client");
    let mut form = filled_form();

    let result = form.submit(&client).await.expect("not refused");

    assert_eq!(result, SubmissionResult::ServerError);
    assert_eq!(form.status(), FormStatus::Error);
}
