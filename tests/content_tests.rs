// tests/content_tests.rs

mod common;

use common::spawn_app;

#[tokio::test]
async fn public_reads_need_no_token() {
    let Some(app) = spawn_app().await else { return };

    for path in ["news", "activities", "gallery", "members", "branding"] {
        let resp = app
            .client
            .get(format!("{}/api/{}", app.address, path))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200, "GET /api/{} failed", path);
    }
}

#[tokio::test]
async fn students_cannot_write_content() {
    let Some(app) = spawn_app().await else { return };
    let (student_token, _, _) = common::register_verified_student(&app).await;

    let resp = app
        .client
        .post(format!("{}/api/admin/news", app.address))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({ "title": "Sneaky", "body": "text" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn moderators_can_manage_news_and_bodies_are_sanitized() {
    let Some(app) = spawn_app().await else { return };
    let mod_token = common::seed_moderator(&app).await;

    let resp = app
        .client
        .post(format!("{}/api/admin/news", app.address))
        .bearer_auth(&mod_token)
        .json(&serde_json::json!({
            "title": "Olympiad results announced",
            "body": "<p>Congratulations!</p><script>alert('xss')</script>",
            "cover_img": "https://files.test.local/covers/results.jpg"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let body = resp.json::<serde_json::Value>().await.unwrap();
    let id = body["id"].as_i64().unwrap();
    let stored = body["body"].as_str().unwrap();
    assert!(stored.contains("<p>Congratulations!</p>"));
    assert!(!stored.contains("<script>"));

    // Partial update touches only the title and answers with the full row
    let resp = app
        .client
        .put(format!("{}/api/admin/news/{}", app.address, id))
        .bearer_auth(&mod_token)
        .json(&serde_json::json!({ "title": "Olympiad results (updated)" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let updated = resp.json::<serde_json::Value>().await.unwrap();
    assert_eq!(updated["id"], id);
    assert_eq!(updated["title"], "Olympiad results (updated)");
    assert!(
        updated["body"]
            .as_str()
            .unwrap()
            .contains("Congratulations")
    );

    let resp = app
        .client
        .get(format!("{}/api/news/{}", app.address, id))
        .send()
        .await
        .unwrap();
    let fetched = resp.json::<serde_json::Value>().await.unwrap();
    assert_eq!(fetched["title"], "Olympiad results (updated)");
    assert!(
        fetched["body"]
            .as_str()
            .unwrap()
            .contains("Congratulations")
    );

    let resp = app
        .client
        .delete(format!("{}/api/admin/news/{}", app.address, id))
        .bearer_auth(&mod_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .client
        .get(format!("{}/api/news/{}", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn moderators_cannot_reach_admin_surfaces() {
    let Some(app) = spawn_app().await else { return };
    let mod_token = common::seed_moderator(&app).await;

    let resp = app
        .client
        .get(format!("{}/api/admin/users", app.address))
        .bearer_auth(&mod_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .client
        .get(format!("{}/api/admin/payments", app.address))
        .bearer_auth(&mod_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn member_directory_round_trip() {
    let Some(app) = spawn_app().await else { return };
    let mod_token = common::seed_moderator(&app).await;

    let resp = app
        .client
        .post(format!("{}/api/admin/members", app.address))
        .bearer_auth(&mod_token)
        .json(&serde_json::json!({
            "name": "Ada Byron",
            "position": "President",
            "batch": "2024",
            "display_order": 1
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let id = resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let resp = app
        .client
        .put(format!("{}/api/admin/members/{}", app.address, id))
        .bearer_auth(&mod_token)
        .json(&serde_json::json!({ "position": "General Secretary" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let updated = resp.json::<serde_json::Value>().await.unwrap();
    assert_eq!(updated["position"], "General Secretary");
    assert_eq!(updated["name"], "Ada Byron");

    let resp = app
        .client
        .get(format!("{}/api/members", app.address))
        .send()
        .await
        .unwrap();
    let body = resp.json::<serde_json::Value>().await.unwrap();
    let entry = body
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["id"] == id)
        .expect("member should be listed")
        .clone();
    assert_eq!(entry["position"], "General Secretary");

    let resp = app
        .client
        .delete(format!("{}/api/admin/members/{}", app.address, id))
        .bearer_auth(&mod_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);
}

#[tokio::test]
async fn branding_updates_merge_onto_the_single_row() {
    let Some(app) = spawn_app().await else { return };
    let mod_token = common::seed_moderator(&app).await;

    let before = app
        .client
        .get(format!("{}/api/branding", app.address))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();

    let resp = app
        .client
        .put(format!("{}/api/admin/branding", app.address))
        .bearer_auth(&mod_token)
        .json(&serde_json::json!({ "membership_fee": 750 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let after = resp.json::<serde_json::Value>().await.unwrap();

    assert_eq!(after["membership_fee"], 750);
    // Untouched fields survive the partial update
    assert_eq!(after["club_name"], before["club_name"]);
}

#[tokio::test]
async fn updating_missing_content_is_404() {
    let Some(app) = spawn_app().await else { return };
    let mod_token = common::seed_moderator(&app).await;

    let resp = app
        .client
        .put(format!("{}/api/admin/gallery/999999999", app.address))
        .bearer_auth(&mod_token)
        .json(&serde_json::json!({ "title": "Ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // An empty payload is still a lookup: unknown ids stay 404
    let resp = app
        .client
        .put(format!("{}/api/admin/gallery/999999999", app.address))
        .bearer_auth(&mod_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
