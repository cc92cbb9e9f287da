use crate::common::{TestApp, routes};

#[tokio::test]
async fn schema_describes_both_models() {
    let app = TestApp::spawn().await;
    let token = app.create_user_with_role("vi", "viewerpass", "viewer").await;

    let res = app.get_with_token(routes::ADMIN_SCHEMA, &token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let models = res.body["models"].as_array().unwrap();
    let names: Vec<&str> = models.iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["video", "tag"]);

    let video = &models[0];
    assert_eq!(video["display_field"], "title");
    let read_only: Vec<&str> = video["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["read_only"] == true)
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert!(read_only.contains(&"num_views"));
    assert!(read_only.contains(&"num_likes"));
    assert!(read_only.contains(&"published_at"));
}

#[tokio::test]
async fn schema_requires_authentication() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::ADMIN_SCHEMA).await;

    assert_eq!(res.status, 401);
}
