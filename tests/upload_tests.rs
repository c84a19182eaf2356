// tests/upload_tests.rs

mod common;

use common::spawn_app;

#[tokio::test]
async fn upload_requires_a_token() {
    let Some(app) = spawn_app().await else { return };

    let form = reqwest::multipart::Form::new()
        .part("file", reqwest::multipart::Part::bytes(vec![1, 2, 3]).file_name("a.pdf"));

    let resp = app
        .client
        .post(format!("{}/api/upload", app.address))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn upload_rejects_a_body_without_a_file_part() {
    let Some(app) = spawn_app().await else { return };
    let (token, _, _) = common::register_verified_student(&app).await;

    let form = reqwest::multipart::Form::new().text("comment", "no file here");

    let resp = app
        .client
        .post(format!("{}/api/upload", app.address))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn upload_surfaces_a_missing_blob_store_as_bad_gateway() {
    // The test app runs without BLOB_STORE_URL, so a well-formed upload has
    // nowhere to go and must fail loudly rather than pretend success.
    let Some(app) = spawn_app().await else { return };
    let (token, _, _) = common::register_verified_student(&app).await;

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"answer sheet".to_vec())
            .file_name("answers.pdf")
            .mime_str("application/pdf")
            .unwrap(),
    );

    let resp = app
        .client
        .post(format!("{}/api/upload", app.address))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 502);
}

#[tokio::test]
async fn empty_files_are_rejected_before_forwarding() {
    let Some(app) = spawn_app().await else { return };
    let (token, _, _) = common::register_verified_student(&app).await;

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(Vec::new()).file_name("empty.pdf"),
    );

    let resp = app
        .client
        .post(format!("{}/api/upload", app.address))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}
